// src/assist/openai.rs
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{BoxFut, Draft, Provider};

const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const SYSTEM_PROMPT: &str = "You write concise cover letters for early-career job applicants. \
Plain text only, no markdown, no placeholders, at most 200 words. \
Use only facts from the candidate profile and the job description.";

/// OpenAI Chat Completions.
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: &str) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("job-scout/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            api_key,
            model: model.to_string(),
        }
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

impl Provider for OpenAiProvider {
    fn fetch<'a>(&'a self, prompt: &'a str) -> BoxFut<'a, Option<Draft>> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return None;
            }
            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    Msg {
                        role: "user",
                        content: prompt,
                    },
                ],
                temperature: 0.4,
                max_tokens: 400,
            };

            let resp = match self
                .http
                .post(ENDPOINT)
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(target: "assist", error = %e, "openai request failed");
                    return None;
                }
            };
            if !resp.status().is_success() {
                tracing::warn!(target: "assist", status = resp.status().as_u16(), "openai non-2xx");
                return None;
            }
            let body: Resp = resp.json().await.ok()?;
            let text = body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default();
            if text.trim().is_empty() {
                None
            } else {
                Some(Draft { text })
            }
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
