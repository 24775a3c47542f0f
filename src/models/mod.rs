//! Data models
//!
//! Read-only shapes of the documents served by the headless CMS:
//! - Content documents (Post, Author, Section, Subcategory, Tag, SiteSettings)
//! - Portable Text rich-text blocks
//! - Slug enumerations used for sitemaps

mod content;
mod portable_text;

pub use content::{
    Author, AuthorWithPosts, Bio, ImageAsset, NavItem, Post, PostListItem, PostSlugs, SanityImage,
    Section, SectionRef, SectionWithPosts, SiteSettings, Slug, SocialLink, Subcategory,
    SubcategoryListItem, SubcategorySlugs, SubcategoryWithPosts, Tag,
};
pub use portable_text::{Block, BlockKind, MarkDef, PortableTextBlock, Span};

use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` like a missing field.
///
/// GROQ projections emit `null` for unset references and arrays, which plain
/// `#[serde(default)]` does not cover.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
