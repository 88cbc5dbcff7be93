// src/models/mod.rs

pub mod exam;
pub mod question;
pub mod quiz_config;
pub mod session;
