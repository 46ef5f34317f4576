//! HTTP handlers for the AI service.
//!
//! Handlers stay thin: they validate the request, hand it to the detection
//! or chatbot service and pick the status code.

pub mod chat;
pub mod detection;
pub mod health;
pub mod metrics;
