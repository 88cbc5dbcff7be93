// src/engine/mod.rs

pub mod bank;
pub mod generator;
pub mod planner;
pub mod scorer;
pub mod service;
