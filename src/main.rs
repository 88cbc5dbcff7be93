// src/main.rs

use std::collections::HashMap;
use std::sync::Arc;

use dotenvy::dotenv;
use exam_engine::config::Config;
use exam_engine::engine::bank::QuestionBank;
use exam_engine::engine::service::SessionService;
use exam_engine::models::question::Question;
use exam_engine::models::quiz_config::QuizConfiguration;
use exam_engine::routes;
use exam_engine::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Seed the in-memory question bank and per-certification configurations.
    let questions = load_questions(&config.question_bank_path);
    let quiz_configs = load_quiz_configs(&config.quiz_config_path);

    let bank = QuestionBank::new(questions);
    tracing::info!(
        questions = bank.total(),
        certifications = quiz_configs.len(),
        "question bank loaded"
    );

    let service = Arc::new(SessionService::new(Arc::new(bank), quiz_configs));

    let state = AppState {
        service,
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listen address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}

fn load_questions(path: &str) -> Vec<Question> {
    let raw = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read question bank {}: {}", path, e));
    serde_json::from_str(&raw)
        .unwrap_or_else(|e| panic!("Failed to parse question bank {}: {}", path, e))
}

fn load_quiz_configs(path: &str) -> HashMap<i64, QuizConfiguration> {
    let raw = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read quiz configurations {}: {}", path, e));
    let configs: HashMap<i64, QuizConfiguration> = serde_json::from_str(&raw)
        .unwrap_or_else(|e| panic!("Failed to parse quiz configurations {}: {}", path, e));

    // Field-level sanity check at boot; cross-field checks (quota sums,
    // feasibility) are the planner's job at request time.
    for (certification_id, quiz_config) in &configs {
        if let Err(e) = quiz_config.validate() {
            tracing::warn!(
                certification_id,
                "quiz configuration fails field validation: {}",
                e
            );
        }
    }
    configs
}
