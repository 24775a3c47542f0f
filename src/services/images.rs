//! CMS image URLs
//!
//! Turns image asset references (`image-<id>-<w>x<h>-<ext>`) into sized CDN
//! URLs.

use crate::config::CmsConfig;
use crate::models::SanityImage;

pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 800;

const CDN_BASE: &str = "https://cdn.sanity.io/images";

/// Builds CDN URLs for the configured project and dataset
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
}

impl ImageUrlBuilder {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    pub fn from_config(config: &CmsConfig) -> Self {
        Self::new(config.project_id.clone(), config.dataset.clone())
    }

    /// URL of an asset reference at the given size
    ///
    /// Returns an empty string when the project is not configured or the
    /// reference is not an image asset.
    pub fn url_for_ref(&self, asset_ref: &str, width: u32, height: u32) -> String {
        if self.project_id.is_empty() {
            return String::new();
        }
        let Some(file) = asset_file_name(asset_ref) else {
            return String::new();
        };
        format!(
            "{}/{}/{}/{}?w={}&h={}",
            CDN_BASE, self.project_id, self.dataset, file, width, height
        )
    }

    /// URL of an optional image field; missing images yield ""
    pub fn url(&self, image: Option<&SanityImage>, width: u32, height: u32) -> String {
        image
            .and_then(|i| i.asset_ref())
            .map(|r| self.url_for_ref(r, width, height))
            .unwrap_or_default()
    }

    /// URL at the default 1200x800 size
    pub fn default_url(&self, image: Option<&SanityImage>) -> String {
        self.url(image, DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

/// `image-abc123-800x600-jpg` becomes `abc123-800x600.jpg`
fn asset_file_name(asset_ref: &str) -> Option<String> {
    let rest = asset_ref.strip_prefix("image-")?;
    let (stem, ext) = rest.rsplit_once('-')?;
    let (id, dimensions) = stem.rsplit_once('-')?;
    let (w, h) = dimensions.split_once('x')?;

    let valid = !id.is_empty()
        && !ext.is_empty()
        && !w.is_empty()
        && w.chars().all(|c| c.is_ascii_digit())
        && !h.is_empty()
        && h.chars().all(|c| c.is_ascii_digit());
    if !valid {
        return None;
    }
    Some(format!("{}-{}.{}", id, dimensions, ext))
}
