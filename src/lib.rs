// Yatube - a small social blogging service

// Shared state and settings
pub mod app_state;
pub mod config;

// Core types and primitives
pub mod core;

// Store, cache, media and viewer resolution
pub mod infrastructure;

// Blog records and submitted forms
pub mod forms;
pub mod models;

// Business logic
pub mod services;

// HTTP surface
pub mod web;

// Common utilities
pub mod data_seeder;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
