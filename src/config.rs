// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub rust_log: String,
    pub question_bank_path: String,
    pub quiz_config_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let question_bank_path =
            env::var("QUESTION_BANK_PATH").unwrap_or_else(|_| "data/questions.json".to_string());

        let quiz_config_path =
            env::var("QUIZ_CONFIG_PATH").unwrap_or_else(|_| "data/quiz_configs.json".to_string());

        Self {
            bind_addr,
            rust_log,
            question_bank_path,
            quiz_config_path,
        }
    }
}
