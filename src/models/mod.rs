// src/models/mod.rs

pub mod attempt;
pub mod auth;
pub mod question;
pub mod session;
pub mod submission;
