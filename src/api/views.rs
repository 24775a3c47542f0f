//! Template view models
//!
//! CMS documents are turned into flat, display-ready structs here, so
//! templates only print strings and never compute URLs or format dates.

use serde::Serialize;

use crate::models::{Author, PostListItem, Section, SocialLink, SubcategoryListItem, Tag};
use crate::services::formatters::{
    build_share_url, format_date, format_reading_time, rating_stars, social_icon, truncate_bio,
    truncate_text,
};
use crate::services::routes::{post_path, profile_path, section_path, subcategory_path, tag_path};
use crate::services::ImageUrlBuilder;

const CARD_IMAGE_WIDTH: u32 = 600;
const CARD_IMAGE_HEIGHT: u32 = 400;
const AVATAR_SIZE: u32 = 200;
const CARD_EXCERPT_LENGTH: usize = 140;
const CARD_BIO_LENGTH: usize = 100;
const RATING_MAX: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagLink {
    pub title: String,
    pub href: String,
}

impl TagLink {
    /// Links for the tags that have a slug
    pub fn list(tags: &[Tag]) -> Vec<TagLink> {
        tags.iter()
            .filter(|t| !t.slug.as_str().is_empty())
            .map(|t| TagLink {
                title: t.title.clone(),
                href: tag_path(t.slug.as_str()),
            })
            .collect()
    }
}

/// Rating shown as stars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingView {
    pub value: f64,
    pub max: u32,
    pub stars: String,
    pub label: String,
}

impl RatingView {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            max: RATING_MAX,
            stars: rating_stars(value, RATING_MAX),
            label: format!("Puntuación: {} de {}", value, RATING_MAX),
        }
    }
}

/// Post card in grids and listings
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub id: String,
    pub title: String,
    pub href: String,
    pub excerpt: String,
    pub image_url: String,
    pub image_alt: String,
    pub published_at: String,
    pub date: String,
    pub author_name: String,
    pub tags: Vec<TagLink>,
    pub rating: Option<RatingView>,
    pub reading_time: Option<String>,
}

impl PostCard {
    pub fn new(post: &PostListItem, images: &ImageUrlBuilder) -> Self {
        let published_at = post.published_at.clone().unwrap_or_default();
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            href: post_path(post.section_slug(), post.slug.as_str(), post.subcategory_slug()),
            excerpt: truncate_text(&post.excerpt, CARD_EXCERPT_LENGTH),
            image_url: images.url(post.main_image.as_ref(), CARD_IMAGE_WIDTH, CARD_IMAGE_HEIGHT),
            image_alt: image_alt(post),
            date: format_date(&published_at),
            published_at,
            author_name: post
                .author
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_else(|| "Anónimo".to_string()),
            tags: TagLink::list(&post.tags),
            rating: post.rating.map(RatingView::new),
            reading_time: post.reading_time.map(format_reading_time),
        }
    }

    pub fn list(posts: &[PostListItem], images: &ImageUrlBuilder) -> Vec<PostCard> {
        posts.iter().map(|p| PostCard::new(p, images)).collect()
    }
}

fn image_alt(post: &PostListItem) -> String {
    post.main_image
        .as_ref()
        .and_then(|i| i.alt.clone())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| post.title.clone())
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionCard {
    pub title: String,
    pub href: String,
    pub description: String,
    pub image_url: String,
}

impl SectionCard {
    pub fn new(section: &Section, images: &ImageUrlBuilder) -> Self {
        Self {
            title: section.title.clone(),
            href: section_path(section.slug.as_str()),
            description: section.description.clone(),
            image_url: images.url(section.image.as_ref(), CARD_IMAGE_WIDTH, CARD_IMAGE_HEIGHT),
        }
    }

    pub fn list(sections: &[Section], images: &ImageUrlBuilder) -> Vec<SectionCard> {
        sections.iter().map(|s| SectionCard::new(s, images)).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubcategoryCard {
    pub title: String,
    pub href: String,
    pub description: String,
    pub count_label: String,
}

impl SubcategoryCard {
    pub fn new(section_slug: &str, item: &SubcategoryListItem) -> Self {
        let sub = &item.subcategory;
        let noun = if item.post_count == 1 { "artículo" } else { "artículos" };
        Self {
            title: sub.title.clone(),
            href: subcategory_path(section_slug, sub.slug.as_str()),
            description: sub.description.clone().unwrap_or_default(),
            count_label: format!("{} {}", item.post_count, noun),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SocialView {
    pub platform: String,
    pub url: String,
    pub icon: &'static str,
}

impl SocialView {
    fn list(links: &[SocialLink]) -> Vec<SocialView> {
        links
            .iter()
            .filter(|l| !l.url.is_empty())
            .map(|l| SocialView {
                platform: l.platform.clone(),
                url: l.url.clone(),
                icon: social_icon(&l.platform),
            })
            .collect()
    }
}

/// Author card and byline
#[derive(Debug, Clone, Serialize)]
pub struct ProfileCard {
    pub name: String,
    pub href: String,
    pub role: String,
    pub image_url: String,
    pub bio: String,
    pub social: Vec<SocialView>,
}

impl ProfileCard {
    pub fn new(author: &Author, images: &ImageUrlBuilder) -> Self {
        Self::with_bio_length(author, images, CARD_BIO_LENGTH)
    }

    pub fn with_bio_length(author: &Author, images: &ImageUrlBuilder, bio_length: usize) -> Self {
        Self {
            name: author.name.clone(),
            href: profile_path(author.slug.as_str()),
            role: author.role.clone().unwrap_or_default(),
            image_url: images.url(author.image.as_ref(), AVATAR_SIZE, AVATAR_SIZE),
            bio: truncate_bio(author.bio.as_ref(), bio_length),
            social: SocialView::list(&author.social_links),
        }
    }

    pub fn list(authors: &[Author], images: &ImageUrlBuilder) -> Vec<ProfileCard> {
        authors.iter().map(|a| ProfileCard::new(a, images)).collect()
    }
}

/// Visible breadcrumb entry; the last one is the current page
#[derive(Debug, Clone, Serialize)]
pub struct BreadcrumbItem {
    pub label: String,
    pub href: String,
    pub current: bool,
}

/// Visible breadcrumb from `(label, path)` pairs, starting at "Inicio"
pub fn breadcrumb(trail: &[(&str, String)]) -> Vec<BreadcrumbItem> {
    let mut items = vec![BreadcrumbItem {
        label: "Inicio".to_string(),
        href: "/".to_string(),
        current: false,
    }];
    items.extend(trail.iter().map(|(label, href)| BreadcrumbItem {
        label: label.to_string(),
        href: href.clone(),
        current: false,
    }));
    if let Some(last) = items.last_mut() {
        last.current = true;
    }
    items
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareLink {
    pub platform: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
    pub href: String,
}

const SHARE_PLATFORMS: &[(&str, &str, &str)] = &[
    ("x", "𝕏", "Compartir en X"),
    ("facebook", "f", "Compartir en Facebook"),
    ("whatsapp", "📱", "Compartir en WhatsApp"),
    ("linkedin", "in", "Compartir en LinkedIn"),
];

pub fn share_links(url: &str, title: &str) -> Vec<ShareLink> {
    SHARE_PLATFORMS
        .iter()
        .map(|&(platform, icon, label)| ShareLink {
            platform,
            icon,
            label,
            href: build_share_url(platform, url, title),
        })
        .collect()
}

/// Full article page
#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    pub title: String,
    pub excerpt: String,
    pub image_url: String,
    pub image_alt: String,
    pub published_at: String,
    pub date: String,
    pub author: Option<ProfileCard>,
    pub tags: Vec<TagLink>,
    pub rating: Option<RatingView>,
    pub reading_time: Option<String>,
    pub summary: Option<String>,
    pub body_html: String,
    pub share: Vec<ShareLink>,
}
