//! # Standup API Server Library
//!
//! HTTP API for daily stand-up notes: writing and browsing notes,
//! aggregating them across teammates, AI-written day summaries and a
//! per-user GitHub pull request view.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Session resolution and response hardening
//! - `routes`: API route handlers
//! - `github`: GitHub search and merge-status client
//! - `ai`: Summary prompt building and the chat-completion client

pub mod ai;
pub mod app;
pub mod config;
pub mod error;
pub mod github;
pub mod middleware;
pub mod routes;
