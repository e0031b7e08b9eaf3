//! # Template Share API Server Library
//!
//! This library provides the HTTP layer of Template Share: the Axum router,
//! handlers, configuration and error mapping. Data access and business rules
//! live in `tshare-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: JSON and query extractors with uniform rejections
//! - `middleware`: Authentication and security headers
//! - `oauth`: Runtime-editable OAuth provider settings
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod oauth;
pub mod routes;
