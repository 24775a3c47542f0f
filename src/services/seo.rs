//! Search engine metadata
//!
//! Builds schema.org JSON-LD documents and the per-page `<head>` metadata
//! (title, description, canonical link, Open Graph).

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::{Author, PostListItem};
use crate::services::formatters::{truncate_bio, DEFAULT_EXCERPT_LENGTH};
use crate::services::routes::{SiteUrls, HOME, SEARCH};

const SCHEMA_CONTEXT: &str = "https://schema.org";

/// Breadcrumb trail entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub name: String,
    /// Absolute URL
    pub url: String,
}

impl Crumb {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// JSON-LD builders bound to the site identity
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    site_name: String,
    urls: SiteUrls,
}

impl SchemaBuilder {
    pub fn new(site_name: impl Into<String>, urls: SiteUrls) -> Self {
        Self {
            site_name: site_name.into(),
            urls,
        }
    }

    /// WebSite with a sitelinks search action
    pub fn website(&self) -> Value {
        json!({
            "@context": SCHEMA_CONTEXT,
            "@type": "WebSite",
            "name": self.site_name,
            "url": self.urls.base(),
            "potentialAction": {
                "@type": "SearchAction",
                "target": {
                    "@type": "EntryPoint",
                    "urlTemplate": format!("{}?q={{search_term_string}}", self.urls.absolute(SEARCH)),
                },
                "query-input": "required name=search_term_string",
            },
        })
    }

    pub fn organization(&self, logo_url: Option<&str>) -> Value {
        let mut schema = json!({
            "@context": SCHEMA_CONTEXT,
            "@type": "Organization",
            "name": self.site_name,
            "url": self.urls.base(),
        });
        if let Some(logo) = logo_url.filter(|l| !l.is_empty()) {
            schema["logo"] = json!(logo);
        }
        schema
    }

    /// BlogPosting for an article page
    pub fn blog_post(&self, post: &PostListItem, image_url: Option<&str>, word_count: Option<usize>) -> Value {
        let mut schema = Map::new();
        schema.insert("@context".into(), json!(SCHEMA_CONTEXT));
        schema.insert("@type".into(), json!("BlogPosting"));
        schema.insert("headline".into(), json!(post.title));
        schema.insert(
            "url".into(),
            json!(self.urls.post(post.section_slug(), post.slug.as_str(), post.subcategory_slug())),
        );
        if let Some(published) = &post.published_at {
            schema.insert("datePublished".into(), json!(published));
        }
        if let Some(author) = &post.author {
            schema.insert(
                "author".into(),
                json!({
                    "@type": "Person",
                    "name": author.name,
                    "url": self.urls.profile(author.slug.as_str()),
                }),
            );
        }
        schema.insert("description".into(), json!(post.excerpt));
        if let Some(section) = &post.section {
            schema.insert("articleSection".into(), json!(section.title));
        }

        let keywords = post.tags.iter().map(|t| t.title.as_str()).collect::<Vec<_>>().join(", ");
        if !keywords.is_empty() {
            schema.insert("keywords".into(), json!(keywords));
        }
        if let Some(image) = image_url.filter(|i| !i.is_empty()) {
            schema.insert("image".into(), json!(image));
        }
        if let Some(count) = word_count.filter(|c| *c > 0) {
            schema.insert("wordCount".into(), json!(count));
        }
        if let Some(rating) = post.rating.filter(|r| *r != 0.0) {
            schema.insert(
                "aggregateRating".into(),
                json!({ "@type": "AggregateRating", "ratingValue": rating }),
            );
        }
        Value::Object(schema)
    }

    pub fn breadcrumb(&self, items: &[Crumb]) -> Value {
        let elements: Vec<Value> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                json!({
                    "@type": "ListItem",
                    "position": i + 1,
                    "name": item.name,
                    "item": item.url,
                })
            })
            .collect();

        json!({
            "@context": SCHEMA_CONTEXT,
            "@type": "BreadcrumbList",
            "itemListElement": elements,
        })
    }

    /// Person schema for an author profile
    pub fn profile(&self, author: &Author, image_url: Option<&str>) -> Value {
        let mut schema = json!({
            "@context": SCHEMA_CONTEXT,
            "@type": "Person",
            "name": author.name,
            "description": truncate_bio(author.bio.as_ref(), DEFAULT_EXCERPT_LENGTH),
            "url": self.urls.profile(author.slug.as_str()),
            "sameAs": author.social_links.iter().map(|s| s.url.clone()).collect::<Vec<_>>(),
        });
        if let Some(image) = image_url.filter(|i| !i.is_empty()) {
            schema["image"] = json!(image);
        }
        schema
    }

    /// ItemList of BlogPosting entries for listing pages
    pub fn article_list(&self, posts: &[PostListItem]) -> Value {
        let elements: Vec<Value> = posts
            .iter()
            .enumerate()
            .map(|(i, post)| {
                let mut item = json!({
                    "@type": "BlogPosting",
                    "position": i + 1,
                    "headline": post.title,
                    "url": self.urls.post(post.section_slug(), post.slug.as_str(), post.subcategory_slug()),
                });
                if let Some(published) = &post.published_at {
                    item["datePublished"] = json!(published);
                }
                if let Some(author) = &post.author {
                    item["author"] = json!({ "@type": "Person", "name": author.name });
                }
                item
            })
            .collect();

        json!({
            "@context": SCHEMA_CONTEXT,
            "@type": "ItemList",
            "itemListElement": elements,
        })
    }

    /// Breadcrumb rooted at the home page
    pub fn crumbs_from_home(&self, trail: &[(&str, String)]) -> Vec<Crumb> {
        let mut crumbs = vec![Crumb::new("Inicio", self.urls.absolute(HOME))];
        crumbs.extend(trail.iter().map(|(name, url)| Crumb::new(*name, url.clone())));
        crumbs
    }
}

/// Serialize a JSON-LD document for embedding in a `<script>` element
///
/// `</` is escaped so CMS text can never close the script element.
pub fn to_script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

/// Per-page `<head>` metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    /// Page title without the site suffix; `None` for the home page
    pub title: Option<String>,
    pub description: String,
    pub canonical: Option<String>,
    pub og_type: &'static str,
    pub og_image: Option<String>,
    pub published_time: Option<String>,
    pub authors: Vec<String>,
    pub twitter_card: &'static str,
}

impl PageMeta {
    pub fn new(title: Option<String>, description: impl Into<String>) -> Self {
        Self {
            title,
            description: description.into(),
            canonical: None,
            og_type: "website",
            og_image: None,
            published_time: None,
            authors: Vec::new(),
            twitter_card: "summary_large_image",
        }
    }

    pub fn with_canonical(mut self, url: impl Into<String>) -> Self {
        self.canonical = Some(url.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.og_image = if url.is_empty() { None } else { Some(url) };
        self
    }

    /// Mark the page as an article
    pub fn article(mut self, published_time: Option<String>, authors: Vec<String>) -> Self {
        self.og_type = "article";
        self.published_time = published_time;
        self.authors = authors;
        self
    }

    /// `<title>` text: "%s | {site}" or the site-wide default
    pub fn document_title(&self, site_name: &str) -> String {
        match &self.title {
            Some(title) => format!("{} | {}", title, site_name),
            None => default_title(site_name),
        }
    }
}

/// Title used when a page has none of its own
pub fn default_title(site_name: &str) -> String {
    format!("{} — Bienestar, Mindfulness y Crecimiento Personal", site_name)
}
