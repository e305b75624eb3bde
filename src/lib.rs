//! ClientInsight Churn API Library
//!
//! This library provides the core functionality for the ClientInsight
//! dashboard backend: customer profile encoding, churn prediction from a
//! pre-trained model artifact, per-session conversation state, and the
//! transcription/completion gateway (an OpenAI-compatible hosted API).
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `conversation`: Input arbitration and the chat interaction cycle.
//! - `encoder`: Customer profile to feature vector encoding.
//! - `errors`: Error handling types.
//! - `gateway_client`: Transcription and chat completion client.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `predictor`: Churn model loading and inference.
//! - `session`: Session state container and store.

pub mod config;
pub mod conversation;
pub mod encoder;
pub mod errors;
pub mod gateway_client;
pub mod handlers;
pub mod models;
pub mod predictor;
pub mod session;
