//! Almas Enraizadas - a server-rendered wellness blog
//!
//! Content comes from the Sanity CMS and is rendered with Tera themes. The
//! crate also exposes a small JSON API for AI writing helpers and an image
//! download proxy.

pub mod api;
pub mod cache;
pub mod cms;
pub mod config;
pub mod models;
pub mod services;
pub mod theme;
