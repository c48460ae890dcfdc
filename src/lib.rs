// src/lib.rs

pub mod api;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod machine;
pub mod models;
pub mod monitor;
pub mod store;
pub mod timer;
pub mod ui;
pub mod utils;

// Entry point for front ends
pub use machine::SessionMachine;
