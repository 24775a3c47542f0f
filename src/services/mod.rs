//! Services layer
//!
//! Everything between the HTTP handlers and the outside world:
//! - cached content reads over the CMS repository
//! - Portable Text rendering, formatting and URL building for templates
//! - structured data for search engines
//! - the AI writing assistant and its image download proxy

pub mod ai;
pub mod content;
pub mod formatters;
pub mod image_proxy;
pub mod images;
pub mod portable_text;
pub mod routes;
pub mod seo;

pub use ai::{AiAction, AiError, AiProvider, AiRequest, AiService, GeneratedImage, ImageRequest, OpenAiProvider};
pub use content::{ContentError, ContentService};
pub use image_proxy::{ImageProxy, ProxiedImage, ProxyError};
pub use images::ImageUrlBuilder;
pub use portable_text::{markdown_to_blocks, PortableTextRenderer};
pub use routes::SiteUrls;
pub use seo::{Crumb, PageMeta, SchemaBuilder};
