//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep CLI and other callers decoupled from storage details.
//!
//! Prediction has its own service in `crate::prediction`.

pub mod note_service;
