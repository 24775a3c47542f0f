//! Content document models
//!
//! Field names follow the CMS wire format (camelCase, `_id` system fields).
//! Every field tolerates absence or `null`, since editors may publish
//! documents with optional fields left empty.

use serde::{Deserialize, Serialize};

use super::null_as_default;
use super::portable_text::PortableTextBlock;

/// URL slug object (`{ "current": "..." }`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current: String,
}

impl Slug {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.current
    }
}

/// Asset reference inside an image field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    #[serde(rename = "_ref", default, deserialize_with = "null_as_default")]
    pub reference: String,
}

/// Image field with optional alt text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SanityImage {
    #[serde(default)]
    pub asset: Option<ImageAsset>,
    #[serde(default)]
    pub alt: Option<String>,
}

impl SanityImage {
    pub fn from_ref(reference: impl Into<String>) -> Self {
        Self {
            asset: Some(ImageAsset {
                reference: reference.into(),
            }),
            alt: None,
        }
    }

    /// Asset reference, if the image has one
    pub fn asset_ref(&self) -> Option<&str> {
        self.asset
            .as_ref()
            .map(|a| a.reference.as_str())
            .filter(|r| !r.is_empty())
    }
}

/// Social profile link
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    #[serde(default, deserialize_with = "null_as_default")]
    pub platform: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

/// Author biography: older documents store plain text, newer ones rich text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bio {
    Text(String),
    Blocks(Vec<PortableTextBlock>),
}

/// Author (shown on the site as a "profile")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: Slug,
    #[serde(default)]
    pub bio: Option<Bio>,
    #[serde(default)]
    pub image: Option<SanityImage>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub social_links: Vec<SocialLink>,
}

/// Tag for categorizing posts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: Slug,
    #[serde(default)]
    pub description: Option<String>,
}

/// Top-level content section (a "column" of the magazine)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: Slug,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub image: Option<SanityImage>,
    #[serde(default)]
    pub order: Option<f64>,
}

/// Minimal section projection embedded in subcategories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRef {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: Slug,
}

/// Subcategory within a section (e.g. "Guías", "Noticias")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: Slug,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub section: Option<SectionRef>,
    #[serde(default)]
    pub image: Option<SanityImage>,
    #[serde(default)]
    pub order: Option<f64>,
}

/// Subcategory with its post count, for listing cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryListItem {
    #[serde(flatten)]
    pub subcategory: Subcategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub post_count: u32,
}

/// Post fields used by cards and listings (no body)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListItem {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: Slug,
    #[serde(default, deserialize_with = "null_as_default")]
    pub excerpt: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub section: Option<Section>,
    #[serde(default)]
    pub subcategory: Option<Subcategory>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub main_image: Option<SanityImage>,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reading_time: Option<f64>,
}

impl PostListItem {
    /// Slug of the owning section ("" when the post has none)
    pub fn section_slug(&self) -> &str {
        self.section.as_ref().map(|s| s.slug.as_str()).unwrap_or("")
    }

    /// Slug of the subcategory, when the post belongs to one
    pub fn subcategory_slug(&self) -> Option<&str> {
        self.subcategory
            .as_ref()
            .map(|s| s.slug.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn section_id(&self) -> &str {
        self.section.as_ref().map(|s| s.id.as_str()).unwrap_or("")
    }

    pub fn tag_ids(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.id.clone()).collect()
    }
}

/// Full post with rich-text body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(flatten)]
    pub item: PostListItem,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<PortableTextBlock>,
}

/// Section with its direct posts (no subcategory) and subcategories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionWithPosts {
    #[serde(flatten)]
    pub section: Section,
    #[serde(default, deserialize_with = "null_as_default")]
    pub posts: Vec<PostListItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subcategories: Vec<SubcategoryListItem>,
}

/// Subcategory with its posts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryWithPosts {
    #[serde(flatten)]
    pub subcategory: Subcategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub posts: Vec<PostListItem>,
}

/// Author with their posts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorWithPosts {
    #[serde(flatten)]
    pub author: Author,
    #[serde(default, deserialize_with = "null_as_default")]
    pub posts: Vec<PostListItem>,
}

/// Navigation entry configured in the CMS
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub href: String,
}

/// Site-wide settings singleton
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub logo: Option<SanityImage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub social_links: Vec<SocialLink>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub navigation: Vec<NavItem>,
}

/// Slug tuple locating a post (section + optional subcategory + post)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSlugs {
    pub section_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory_slug: Option<String>,
    pub post_slug: String,
}

/// Slug pair locating a subcategory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategorySlugs {
    pub section_slug: String,
    pub subcategory_slug: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_list_item_tolerates_nulls() {
        let value = json!({
            "_id": "p1",
            "title": "Respirar",
            "slug": { "current": "respirar" },
            "excerpt": null,
            "publishedAt": "2025-02-12T10:00:00Z",
            "author": null,
            "section": { "_id": "s1", "title": "Mindfulness", "slug": { "current": "mindfulness" }, "description": null, "order": 1 },
            "subcategory": null,
            "tags": null,
            "mainImage": { "asset": { "_ref": "image-abc-800x600-jpg" }, "alt": "Bosque" },
            "aiSummary": null,
            "rating": 4.5,
            "readingTime": null
        });

        let post: PostListItem = serde_json::from_value(value).unwrap();
        assert_eq!(post.excerpt, "");
        assert!(post.tags.is_empty());
        assert_eq!(post.section_slug(), "mindfulness");
        assert_eq!(post.subcategory_slug(), None);
        assert_eq!(post.rating, Some(4.5));
        assert_eq!(
            post.main_image.as_ref().and_then(|i| i.asset_ref()),
            Some("image-abc-800x600-jpg")
        );
    }

    #[test]
    fn test_post_with_body_flattens_fields() {
        let value = json!({
            "_id": "p1",
            "title": "Respirar",
            "slug": { "current": "respirar" },
            "subcategory": { "_id": "sc1", "title": "Guías", "slug": { "current": "guias" } },
            "tags": [{ "_id": "t1", "title": "Calma", "slug": { "current": "calma" } }],
            "body": [
                { "_type": "block", "_key": "a1", "style": "normal", "markDefs": [], "children": [
                    { "_type": "span", "_key": "b1", "text": "Hola", "marks": [] }
                ]},
                { "_type": "image", "_key": "i1", "asset": { "_ref": "image-x-10x10-png" } }
            ]
        });

        let post: Post = serde_json::from_value(value).unwrap();
        assert_eq!(post.item.title, "Respirar");
        assert_eq!(post.item.subcategory_slug(), Some("guias"));
        assert_eq!(post.item.tag_ids(), vec!["t1".to_string()]);
        assert_eq!(post.body.len(), 2);
        assert!(matches!(post.body[0], PortableTextBlock::Block(_)));
        assert!(matches!(post.body[1], PortableTextBlock::Other(_)));
    }

    #[test]
    fn test_bio_string_or_blocks() {
        let text: Author = serde_json::from_value(json!({ "name": "Ana", "bio": "Profesora de yoga" })).unwrap();
        assert_eq!(text.bio, Some(Bio::Text("Profesora de yoga".to_string())));

        let blocks: Author = serde_json::from_value(json!({
            "name": "Ana",
            "bio": [{ "_type": "block", "children": [{ "_type": "span", "text": "Profesora" }] }]
        }))
        .unwrap();
        assert!(matches!(blocks.bio, Some(Bio::Blocks(ref b)) if b.len() == 1));
    }

    #[test]
    fn test_section_with_posts_and_subcategories() {
        let value = json!({
            "_id": "s1",
            "title": "Yoga",
            "slug": { "current": "yoga" },
            "description": "Posturas",
            "order": 2,
            "posts": null,
            "subcategories": [
                { "_id": "sc1", "title": "Guías", "slug": { "current": "guias" }, "postCount": 3 }
            ]
        });

        let section: SectionWithPosts = serde_json::from_value(value).unwrap();
        assert_eq!(section.section.slug.as_str(), "yoga");
        assert!(section.posts.is_empty());
        assert_eq!(section.subcategories[0].post_count, 3);
        assert_eq!(section.subcategories[0].subcategory.title, "Guías");
    }

    #[test]
    fn test_cache_roundtrip_preserves_post() {
        let post = Post {
            item: PostListItem {
                id: "p1".to_string(),
                title: "Respirar".to_string(),
                slug: Slug::new("respirar"),
                rating: Some(3.0),
                ..PostListItem::default()
            },
            body: Vec::new(),
        };

        let json = serde_json::to_string(&post).unwrap();
        let back: Post = serde_json::from_str(&json).unwrap();
        assert_eq!(back, post);
    }

    #[test]
    fn test_post_slugs_skip_missing_subcategory() {
        let slugs = PostSlugs {
            section_slug: "yoga".to_string(),
            subcategory_slug: None,
            post_slug: "saludo-al-sol".to_string(),
        };
        let json = serde_json::to_value(&slugs).unwrap();
        assert_eq!(json, json!({ "sectionSlug": "yoga", "postSlug": "saludo-al-sol" }));
    }
}
