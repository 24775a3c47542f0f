//! Headless CMS access
//!
//! - `queries`: named GROQ queries
//! - `client`: HTTP client for the query API
//! - `repository`: typed content repository used by the content service

pub mod client;
pub mod queries;
pub mod repository;

pub use client::SanityClient;
pub use repository::{ContentRepository, SanityContentRepository};

/// CMS access errors
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    #[error("CMS request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("CMS returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to decode CMS response: {0}")]
    Decode(#[from] serde_json::Error),
}
