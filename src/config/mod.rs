// src/config/mod.rs
pub mod assist;
