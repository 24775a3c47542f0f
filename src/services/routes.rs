//! Site URL structure
//!
//! Every path the site links to is built here:
//!
//! ```text
//! /secciones                              sections index
//! /{section}                              section detail
//! /{section}/{post}                       article directly in a section
//! /{section}/{subcategory}                subcategory listing
//! /{section}/{subcategory}/{post}         article in a subcategory
//! /perfiles, /perfiles/{slug}             profiles
//! /tags/{slug}                            tag listing
//! /sobre-nosotros                         about page
//! ```

use serde::Serialize;

pub const HOME: &str = "/";
pub const SECTIONS: &str = "/secciones";
pub const PROFILES: &str = "/perfiles";
pub const TAGS: &str = "/tags";
pub const ABOUT: &str = "/sobre-nosotros";
pub const STUDIO: &str = "/studio";
pub const SEARCH: &str = "/buscar";

/// Top-level path segments that can never be a section slug
pub const RESERVED_SEGMENTS: &[&str] = &[
    "secciones",
    "perfiles",
    "tags",
    "sobre-nosotros",
    "studio",
    "buscar",
    "api",
    "static",
    "blog",
    "categorias",
];

pub fn section_path(section_slug: &str) -> String {
    format!("/{}", section_slug)
}

pub fn subcategory_path(section_slug: &str, subcategory_slug: &str) -> String {
    format!("/{}/{}", section_slug, subcategory_slug)
}

/// Path to an article, nested under its subcategory when it has one
pub fn post_path(section_slug: &str, post_slug: &str, subcategory_slug: Option<&str>) -> String {
    match subcategory_slug.filter(|s| !s.is_empty()) {
        Some(sub) => format!("/{}/{}/{}", section_slug, sub, post_slug),
        None => format!("/{}/{}", section_slug, post_slug),
    }
}

pub fn profile_path(slug: &str) -> String {
    format!("{}/{}", PROFILES, slug)
}

pub fn tag_path(slug: &str) -> String {
    format!("{}/{}", TAGS, slug)
}

/// Main navigation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

/// Header and footer navigation
pub const NAV_ITEMS: &[NavLink] = &[
    NavLink { label: "Inicio", href: HOME },
    NavLink { label: "Secciones", href: SECTIONS },
    NavLink { label: "Perfiles", href: PROFILES },
    NavLink { label: "Sobre Nosotros", href: ABOUT },
];

/// Absolute URL builder for canonical links, structured data and sharing
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base: String,
}

impl SiteUrls {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Absolute URL of a site path
    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn section(&self, section_slug: &str) -> String {
        self.absolute(&section_path(section_slug))
    }

    pub fn subcategory(&self, section_slug: &str, subcategory_slug: &str) -> String {
        self.absolute(&subcategory_path(section_slug, subcategory_slug))
    }

    pub fn post(&self, section_slug: &str, post_slug: &str, subcategory_slug: Option<&str>) -> String {
        self.absolute(&post_path(section_slug, post_slug, subcategory_slug))
    }

    pub fn profile(&self, slug: &str) -> String {
        self.absolute(&profile_path(slug))
    }

    pub fn tag(&self, slug: &str) -> String {
        self.absolute(&tag_path(slug))
    }
}
