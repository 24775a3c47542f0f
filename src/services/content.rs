//! Content service
//!
//! Wraps the content repository with the cache. Every read is cached under
//! a key derived from the operation and its arguments for the cache's TTL,
//! so a burst of page views costs one CMS query.

use crate::cache::{CacheLayer, MemoryCache};
use crate::cms::ContentRepository;
use crate::models::{
    Author, AuthorWithPosts, Post, PostListItem, PostSlugs, Section, SectionWithPosts, SiteSettings,
    SubcategoryListItem, SubcategorySlugs, SubcategoryWithPosts, Tag,
};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;

const CACHE_KEY_POSTS: &str = "posts:all";
const CACHE_KEY_POST_BY_SLUG: &str = "post:slug:";
const CACHE_KEY_POSTS_BY_SECTION: &str = "posts:section:";
const CACHE_KEY_POSTS_BY_TAG: &str = "posts:tag:";
const CACHE_KEY_RECENT_POSTS: &str = "posts:recent:";
const CACHE_KEY_RELATED_POSTS: &str = "posts:related:";
const CACHE_KEY_POST_SLUGS: &str = "slugs:posts";
const CACHE_KEY_PROFILES: &str = "profiles:all";
const CACHE_KEY_PROFILE_BY_SLUG: &str = "profile:slug:";
const CACHE_KEY_PROFILE_SLUGS: &str = "slugs:profiles";
const CACHE_KEY_SECTIONS: &str = "sections:all";
const CACHE_KEY_SECTION_BY_SLUG: &str = "section:slug:";
const CACHE_KEY_SECTION_SLUGS: &str = "slugs:sections";
const CACHE_KEY_SUBCATEGORIES_BY_SECTION: &str = "subcategories:section:";
const CACHE_KEY_SUBCATEGORY_BY_SLUG: &str = "subcategory:slug:";
const CACHE_KEY_SUBCATEGORY_SLUGS: &str = "slugs:subcategories";
const CACHE_KEY_TAGS: &str = "tags:all";
const CACHE_KEY_TAG_BY_SLUG: &str = "tag:slug:";
const CACHE_KEY_SITE_SETTINGS: &str = "settings:site";

/// Error types for content reads
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The CMS could not be queried or returned malformed data
    #[error("Content unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

/// Cached read access to site content
pub struct ContentService {
    repo: Arc<dyn ContentRepository>,
    cache: Option<Arc<MemoryCache>>,
}

impl ContentService {
    /// Create a content service
    ///
    /// # Arguments
    /// * `repo` - Content repository
    /// * `cache` - Result cache, `None` to always query the repository.
    ///   Results stay fresh for the cache's default TTL.
    pub fn new(repo: Arc<dyn ContentRepository>, cache: Option<Arc<MemoryCache>>) -> Self {
        Self { repo, cache }
    }

    /// Return the cached value for `key`, or load, cache and return it
    async fn cached<T, F, Fut>(&self, key: String, load: F) -> Result<T, ContentError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(cache) = &self.cache {
            if let Some(value) = cache.get::<T>(&key).await.ok().flatten() {
                return Ok(value);
            }
        }

        let value = load().await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &value, cache.default_ttl()).await {
                tracing::warn!("Failed to cache '{}': {}", key, e);
            }
        }
        Ok(value)
    }

    pub async fn all_posts(&self) -> Result<Vec<PostListItem>, ContentError> {
        self.cached(CACHE_KEY_POSTS.to_string(), || self.repo.all_posts()).await
    }

    pub async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, ContentError> {
        self.cached(format!("{}{}", CACHE_KEY_POST_BY_SLUG, slug), || self.repo.post_by_slug(slug))
            .await
    }

    pub async fn posts_by_section(&self, section_slug: &str) -> Result<Vec<PostListItem>, ContentError> {
        self.cached(format!("{}{}", CACHE_KEY_POSTS_BY_SECTION, section_slug), || {
            self.repo.posts_by_section(section_slug)
        })
        .await
    }

    pub async fn posts_by_tag(&self, tag_slug: &str) -> Result<Vec<PostListItem>, ContentError> {
        self.cached(format!("{}{}", CACHE_KEY_POSTS_BY_TAG, tag_slug), || {
            self.repo.posts_by_tag(tag_slug)
        })
        .await
    }

    pub async fn recent_posts(&self, limit: usize) -> Result<Vec<PostListItem>, ContentError> {
        self.cached(format!("{}{}", CACHE_KEY_RECENT_POSTS, limit), || self.repo.recent_posts(limit))
            .await
    }

    /// Related posts for an article: same section or shared tags, excluding itself
    pub async fn related_posts(&self, post: &PostListItem, limit: usize) -> Result<Vec<PostListItem>, ContentError> {
        let tag_ids = post.tag_ids();
        let key = format!(
            "{}{}:{}:{}:{}",
            CACHE_KEY_RELATED_POSTS,
            post.id,
            post.section_id(),
            tag_ids.join(","),
            limit
        );
        self.cached(key, || {
            self.repo.related_posts(&post.id, post.section_id(), &tag_ids, limit)
        })
        .await
    }

    pub async fn all_post_slugs(&self) -> Result<Vec<PostSlugs>, ContentError> {
        self.cached(CACHE_KEY_POST_SLUGS.to_string(), || self.repo.all_post_slugs()).await
    }

    pub async fn all_profiles(&self) -> Result<Vec<Author>, ContentError> {
        self.cached(CACHE_KEY_PROFILES.to_string(), || self.repo.all_profiles()).await
    }

    pub async fn profile_by_slug(&self, slug: &str) -> Result<Option<AuthorWithPosts>, ContentError> {
        self.cached(format!("{}{}", CACHE_KEY_PROFILE_BY_SLUG, slug), || {
            self.repo.profile_by_slug(slug)
        })
        .await
    }

    pub async fn all_profile_slugs(&self) -> Result<Vec<String>, ContentError> {
        self.cached(CACHE_KEY_PROFILE_SLUGS.to_string(), || self.repo.all_profile_slugs()).await
    }

    pub async fn all_sections(&self) -> Result<Vec<Section>, ContentError> {
        self.cached(CACHE_KEY_SECTIONS.to_string(), || self.repo.all_sections()).await
    }

    pub async fn section_by_slug(&self, slug: &str) -> Result<Option<SectionWithPosts>, ContentError> {
        self.cached(format!("{}{}", CACHE_KEY_SECTION_BY_SLUG, slug), || {
            self.repo.section_by_slug(slug)
        })
        .await
    }

    pub async fn all_section_slugs(&self) -> Result<Vec<String>, ContentError> {
        self.cached(CACHE_KEY_SECTION_SLUGS.to_string(), || self.repo.all_section_slugs()).await
    }

    pub async fn subcategories_by_section(&self, section_slug: &str) -> Result<Vec<SubcategoryListItem>, ContentError> {
        self.cached(
            format!("{}{}", CACHE_KEY_SUBCATEGORIES_BY_SECTION, section_slug),
            || self.repo.subcategories_by_section(section_slug),
        )
        .await
    }

    pub async fn subcategory_by_slug(
        &self,
        section_slug: &str,
        subcategory_slug: &str,
    ) -> Result<Option<SubcategoryWithPosts>, ContentError> {
        self.cached(
            format!("{}{}/{}", CACHE_KEY_SUBCATEGORY_BY_SLUG, section_slug, subcategory_slug),
            || self.repo.subcategory_by_slug(section_slug, subcategory_slug),
        )
        .await
    }

    pub async fn all_subcategory_slugs(&self) -> Result<Vec<SubcategorySlugs>, ContentError> {
        self.cached(CACHE_KEY_SUBCATEGORY_SLUGS.to_string(), || {
            self.repo.all_subcategory_slugs()
        })
        .await
    }

    pub async fn all_tags(&self) -> Result<Vec<Tag>, ContentError> {
        self.cached(CACHE_KEY_TAGS.to_string(), || self.repo.all_tags()).await
    }

    pub async fn tag_by_slug(&self, slug: &str) -> Result<Option<Tag>, ContentError> {
        self.cached(format!("{}{}", CACHE_KEY_TAG_BY_SLUG, slug), || self.repo.tag_by_slug(slug))
            .await
    }

    pub async fn site_settings(&self) -> Result<Option<SiteSettings>, ContentError> {
        self.cached(CACHE_KEY_SITE_SETTINGS.to_string(), || self.repo.site_settings()).await
    }
}
