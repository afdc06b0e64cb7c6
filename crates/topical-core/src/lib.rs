//! # Topical Core
//!
//! Shared, runtime-free logic for Topical: document models, the
//! vocabulary/frequency builder, document-term matrix construction,
//! the topic-model adapter, and the text-generation trait.
//!
//! This crate contains no tokio, sqlx, HTTP, or other native-only
//! dependencies. Everything in here is pure computation over in-memory
//! data, so it can be exercised directly in unit tests with no fakes
//! beyond a [`explain::TextGenerator`] stub.

pub mod explain;
pub mod lda;
pub mod models;
pub mod vectorizer;
