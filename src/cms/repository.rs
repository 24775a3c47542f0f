//! Content repository
//!
//! This module provides:
//! - `ContentRepository` trait, one method per content fetch the site needs
//! - `SanityContentRepository` implementing it over the GROQ query API
//!
//! Missing documents are `None` and empty collections are empty vectors,
//! never errors.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::queries;
use super::SanityClient;
use crate::models::{
    AuthorWithPosts, Author, Post, PostListItem, PostSlugs, Section, SectionWithPosts, SiteSettings,
    Slug, SubcategoryListItem, SubcategorySlugs, SubcategoryWithPosts, Tag,
};

/// Read access to published content
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// All posts, newest first
    async fn all_posts(&self) -> Result<Vec<PostListItem>>;

    /// Single post with body
    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    async fn posts_by_section(&self, section_slug: &str) -> Result<Vec<PostListItem>>;

    async fn posts_by_tag(&self, tag_slug: &str) -> Result<Vec<PostListItem>>;

    /// Latest `limit` posts
    async fn recent_posts(&self, limit: usize) -> Result<Vec<PostListItem>>;

    /// Posts in the same section or sharing a tag, excluding `post_id`
    async fn related_posts(
        &self,
        post_id: &str,
        section_id: &str,
        tag_ids: &[String],
        limit: usize,
    ) -> Result<Vec<PostListItem>>;

    /// Slug tuples of every post that has a section
    async fn all_post_slugs(&self) -> Result<Vec<PostSlugs>>;

    async fn all_profiles(&self) -> Result<Vec<Author>>;

    async fn profile_by_slug(&self, slug: &str) -> Result<Option<AuthorWithPosts>>;

    async fn all_profile_slugs(&self) -> Result<Vec<String>>;

    async fn all_sections(&self) -> Result<Vec<Section>>;

    /// Section with direct posts and subcategories
    async fn section_by_slug(&self, slug: &str) -> Result<Option<SectionWithPosts>>;

    async fn all_section_slugs(&self) -> Result<Vec<String>>;

    async fn subcategories_by_section(&self, section_slug: &str) -> Result<Vec<SubcategoryListItem>>;

    async fn subcategory_by_slug(
        &self,
        section_slug: &str,
        subcategory_slug: &str,
    ) -> Result<Option<SubcategoryWithPosts>>;

    /// Slug pairs of every subcategory that has a section
    async fn all_subcategory_slugs(&self) -> Result<Vec<SubcategorySlugs>>;

    async fn all_tags(&self) -> Result<Vec<Tag>>;

    async fn tag_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    async fn site_settings(&self) -> Result<Option<SiteSettings>>;
}

/// Reference to a document with only its slug projected
#[derive(Debug, Default, Deserialize)]
struct SlugOnly {
    #[serde(default)]
    slug: Option<Slug>,
}

impl SlugOnly {
    fn current(&self) -> Option<&str> {
        self.slug.as_ref().map(|s| s.as_str()).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
struct PostSlugRow {
    #[serde(default)]
    slug: Option<Slug>,
    #[serde(default)]
    section: Option<SlugOnly>,
    #[serde(default)]
    subcategory: Option<SlugOnly>,
}

#[derive(Debug, Default, Deserialize)]
struct SubcategorySlugRow {
    #[serde(default)]
    slug: Option<Slug>,
    #[serde(default)]
    section: Option<SlugOnly>,
}

/// Repository backed by the CMS query API
pub struct SanityContentRepository {
    client: SanityClient,
}

impl SanityContentRepository {
    pub fn new(client: SanityClient) -> Self {
        Self { client }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(client: SanityClient) -> Arc<dyn ContentRepository> {
        Arc::new(Self::new(client))
    }
}

#[async_trait]
impl ContentRepository for SanityContentRepository {
    async fn all_posts(&self) -> Result<Vec<PostListItem>> {
        self.client
            .fetch_as(queries::ALL_POSTS_QUERY, &[])
            .await
            .context("Failed to fetch posts")
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        self.client
            .fetch_as(queries::POST_BY_SLUG_QUERY, &[("slug", json!(slug))])
            .await
            .with_context(|| format!("Failed to fetch post '{}'", slug))
    }

    async fn posts_by_section(&self, section_slug: &str) -> Result<Vec<PostListItem>> {
        self.client
            .fetch_as(queries::POSTS_BY_SECTION_QUERY, &[("sectionSlug", json!(section_slug))])
            .await
            .with_context(|| format!("Failed to fetch posts of section '{}'", section_slug))
    }

    async fn posts_by_tag(&self, tag_slug: &str) -> Result<Vec<PostListItem>> {
        self.client
            .fetch_as(queries::POSTS_BY_TAG_QUERY, &[("tagSlug", json!(tag_slug))])
            .await
            .with_context(|| format!("Failed to fetch posts tagged '{}'", tag_slug))
    }

    async fn recent_posts(&self, limit: usize) -> Result<Vec<PostListItem>> {
        self.client
            .fetch_as(queries::RECENT_POSTS_QUERY, &[("limit", json!(limit))])
            .await
            .context("Failed to fetch recent posts")
    }

    async fn related_posts(
        &self,
        post_id: &str,
        section_id: &str,
        tag_ids: &[String],
        limit: usize,
    ) -> Result<Vec<PostListItem>> {
        let params = [
            ("postId", json!(post_id)),
            ("sectionId", json!(section_id)),
            ("tagIds", json!(tag_ids)),
            ("limit", json!(limit)),
        ];
        self.client
            .fetch_as(queries::RELATED_POSTS_QUERY, &params)
            .await
            .with_context(|| format!("Failed to fetch posts related to '{}'", post_id))
    }

    async fn all_post_slugs(&self) -> Result<Vec<PostSlugs>> {
        let rows: Vec<PostSlugRow> = self
            .client
            .fetch_as(queries::ALL_POST_SLUGS_QUERY, &[])
            .await
            .context("Failed to fetch post slugs")?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let section_slug = row.section.as_ref()?.current()?.to_string();
                let post_slug = row.slug.as_ref()?.as_str().to_string();
                let subcategory_slug = row
                    .subcategory
                    .as_ref()
                    .and_then(|s| s.current())
                    .map(str::to_string);
                Some(PostSlugs {
                    section_slug,
                    subcategory_slug,
                    post_slug,
                })
            })
            .collect())
    }

    async fn all_profiles(&self) -> Result<Vec<Author>> {
        self.client
            .fetch_as(queries::ALL_AUTHORS_QUERY, &[])
            .await
            .context("Failed to fetch profiles")
    }

    async fn profile_by_slug(&self, slug: &str) -> Result<Option<AuthorWithPosts>> {
        self.client
            .fetch_as(queries::AUTHOR_BY_SLUG_QUERY, &[("slug", json!(slug))])
            .await
            .with_context(|| format!("Failed to fetch profile '{}'", slug))
    }

    async fn all_profile_slugs(&self) -> Result<Vec<String>> {
        let rows: Vec<SlugOnly> = self
            .client
            .fetch_as(queries::ALL_AUTHOR_SLUGS_QUERY, &[])
            .await
            .context("Failed to fetch profile slugs")?;
        Ok(rows.iter().filter_map(|r| r.current()).map(str::to_string).collect())
    }

    async fn all_sections(&self) -> Result<Vec<Section>> {
        self.client
            .fetch_as(queries::ALL_SECTIONS_QUERY, &[])
            .await
            .context("Failed to fetch sections")
    }

    async fn section_by_slug(&self, slug: &str) -> Result<Option<SectionWithPosts>> {
        self.client
            .fetch_as(queries::SECTION_WITH_SUBCATEGORIES_QUERY, &[("slug", json!(slug))])
            .await
            .with_context(|| format!("Failed to fetch section '{}'", slug))
    }

    async fn all_section_slugs(&self) -> Result<Vec<String>> {
        let rows: Vec<SlugOnly> = self
            .client
            .fetch_as(queries::ALL_SECTION_SLUGS_QUERY, &[])
            .await
            .context("Failed to fetch section slugs")?;
        Ok(rows.iter().filter_map(|r| r.current()).map(str::to_string).collect())
    }

    async fn subcategories_by_section(&self, section_slug: &str) -> Result<Vec<SubcategoryListItem>> {
        self.client
            .fetch_as(
                queries::SUBCATEGORIES_BY_SECTION_QUERY,
                &[("sectionSlug", json!(section_slug))],
            )
            .await
            .with_context(|| format!("Failed to fetch subcategories of '{}'", section_slug))
    }

    async fn subcategory_by_slug(
        &self,
        section_slug: &str,
        subcategory_slug: &str,
    ) -> Result<Option<SubcategoryWithPosts>> {
        let params = [
            ("sectionSlug", json!(section_slug)),
            ("subcategorySlug", json!(subcategory_slug)),
        ];
        self.client
            .fetch_as(queries::SUBCATEGORY_BY_SLUG_QUERY, &params)
            .await
            .with_context(|| format!("Failed to fetch subcategory '{}/{}'", section_slug, subcategory_slug))
    }

    async fn all_subcategory_slugs(&self) -> Result<Vec<SubcategorySlugs>> {
        let rows: Vec<SubcategorySlugRow> = self
            .client
            .fetch_as(queries::ALL_SUBCATEGORY_SLUGS_QUERY, &[])
            .await
            .context("Failed to fetch subcategory slugs")?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                Some(SubcategorySlugs {
                    section_slug: row.section.as_ref()?.current()?.to_string(),
                    subcategory_slug: row.slug.as_ref()?.as_str().to_string(),
                })
            })
            .collect())
    }

    async fn all_tags(&self) -> Result<Vec<Tag>> {
        self.client
            .fetch_as(queries::ALL_TAGS_QUERY, &[])
            .await
            .context("Failed to fetch tags")
    }

    async fn tag_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        self.client
            .fetch_as(queries::TAG_BY_SLUG_QUERY, &[("slug", json!(slug))])
            .await
            .with_context(|| format!("Failed to fetch tag '{}'", slug))
    }

    async fn site_settings(&self) -> Result<Option<SiteSettings>> {
        self.client
            .fetch_as(queries::SITE_SETTINGS_QUERY, &[])
            .await
            .context("Failed to fetch site settings")
    }
}
