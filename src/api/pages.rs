//! Site pages
//!
//! Every handler loads its content, builds view models and hands them to the
//! theme. Missing documents render the themed 404 page; CMS failures render
//! the error page with a 500.

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Serialize;
use serde_json::Value;
use tera::Context as TeraContext;

use super::middleware::{cache_control_page, cache_header, AppState};
use super::views::{
    breadcrumb, share_links, ArticleView, PostCard, ProfileCard, RatingView, SectionCard,
    SubcategoryCard, TagLink,
};
use crate::models::Post;
use crate::services::formatters::{
    format_date, format_reading_time, slug_to_title, truncate_bio, DEFAULT_EXCERPT_LENGTH,
};
use crate::services::portable_text::extract_plain_text;
use crate::services::routes::{self, RESERVED_SEGMENTS};
use crate::services::seo::to_script_json;
use crate::services::{ContentError, PageMeta};
use crate::theme::StandardTemplateVars;

const HOME_RECENT_POSTS: usize = 6;
const RELATED_POSTS: usize = 3;
const HERO_WIDTH: u32 = 1200;
const HERO_HEIGHT: u32 = 630;
const PROFILE_IMAGE_SIZE: u32 = 400;
const PROFILE_BIO_LENGTH: usize = 500;

/// Why a page could not be produced
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Page not found")]
    NotFound,

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// A page ready to be rendered
struct Rendered {
    template: &'static str,
    context: TeraContext,
    meta: PageMeta,
    schemas: Vec<Value>,
}

impl Rendered {
    fn new(template: &'static str, meta: PageMeta) -> Self {
        Self {
            template,
            context: TeraContext::new(),
            meta,
            schemas: Vec::new(),
        }
    }

    fn insert<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }

    fn schema(mut self, schema: Value) -> Self {
        self.schemas.push(schema);
        self
    }
}

fn standard_vars(state: &AppState, path: &str) -> StandardTemplateVars {
    let site = &state.config.site;
    StandardTemplateVars::new(&site.name, &site.description, &site.url, path).with_schemas(vec![
        to_script_json(&state.schemas.website()),
        to_script_json(&state.schemas.organization(None)),
    ])
}

fn render(state: &AppState, path: &str, status: StatusCode, page: Rendered) -> Response {
    let mut context = page.context;
    context.insert("page_title", &page.meta.document_title(&state.config.site.name));
    context.insert("meta", &page.meta);
    let schemas: Vec<String> = page.schemas.iter().map(to_script_json).collect();
    context.insert("schemas", &schemas);

    let html = state
        .theme
        .render_page(page.template, &context, &standard_vars(state, path));
    let cache = if status.is_success() {
        cache_control_page(state.config.site.revalidate_seconds)
    } else {
        "no-store".to_string()
    };
    (status, [cache_header(cache)], Html(html)).into_response()
}

fn error_page(state: &AppState, path: &str, status: StatusCode, title: &str, message: &str) -> Response {
    let page = Rendered::new("error.html", PageMeta::new(Some(title.to_string()), message))
        .insert("status", &status.as_u16())
        .insert("error_message", message);
    render(state, path, status, page)
}

fn not_found_page(state: &AppState, path: &str) -> Response {
    error_page(
        state,
        path,
        StatusCode::NOT_FOUND,
        "Página no encontrada",
        "La página que buscas no existe o ha sido movida.",
    )
}

fn respond(state: &AppState, path: &str, result: Result<Rendered, PageError>) -> Response {
    match result {
        Ok(page) => render(state, path, StatusCode::OK, page),
        Err(PageError::NotFound) => not_found_page(state, path),
        Err(PageError::Content(e)) => {
            tracing::error!("Failed to load content for {}: {}", path, e);
            error_page(
                state,
                path,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error",
                "No pudimos cargar el contenido. Inténtalo de nuevo en unos minutos.",
            )
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn home(State(state): State<AppState>) -> Response {
    respond(&state, routes::HOME, home_page(&state).await)
}

pub async fn sections(State(state): State<AppState>) -> Response {
    respond(&state, routes::SECTIONS, sections_page(&state).await)
}

pub async fn profiles(State(state): State<AppState>) -> Response {
    respond(&state, routes::PROFILES, profiles_page(&state).await)
}

pub async fn profile(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let path = routes::profile_path(&slug);
    respond(&state, &path, profile_page(&state, &slug).await)
}

pub async fn about(State(state): State<AppState>) -> Response {
    respond(&state, routes::ABOUT, about_page(&state).await)
}

pub async fn tag(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let path = routes::tag_path(&slug);
    respond(&state, &path, tag_page(&state, &slug).await)
}

pub async fn section(State(state): State<AppState>, Path(section_slug): Path<String>) -> Response {
    let path = routes::section_path(&section_slug);
    respond(&state, &path, section_page(&state, &section_slug).await)
}

/// `/{section}/{slug}`: a subcategory listing, or an article directly in the section
pub async fn section_entry(
    State(state): State<AppState>,
    Path((section_slug, slug)): Path<(String, String)>,
) -> Response {
    let path = routes::subcategory_path(&section_slug, &slug);
    respond(&state, &path, section_entry_page(&state, &section_slug, &slug).await)
}

/// `/{section}/{subcategory}/{post}`
pub async fn subcategory_post(
    State(state): State<AppState>,
    Path((section_slug, subcategory_slug, post_slug)): Path<(String, String, String)>,
) -> Response {
    let path = routes::post_path(&section_slug, &post_slug, Some(&subcategory_slug));
    let result = match state.content.post_by_slug(&post_slug).await {
        Ok(Some(post)) => {
            article_page(&state, post, &section_slug, Some(&subcategory_slug), &post_slug).await
        }
        Ok(None) => Err(PageError::NotFound),
        Err(e) => Err(e.into()),
    };
    respond(&state, &path, result)
}

/// Old `/blog` and `/categorias` URLs moved to the sections index
pub async fn legacy_redirect() -> Redirect {
    Redirect::permanent(routes::SECTIONS)
}

pub async fn not_found(State(state): State<AppState>, uri: Uri) -> Response {
    not_found_page(&state, uri.path())
}

// ============================================================================
// Page builders
// ============================================================================

async fn home_page(state: &AppState) -> Result<Rendered, PageError> {
    let content = &state.content;
    let (recent, sections, profiles) = tokio::try_join!(
        content.recent_posts(HOME_RECENT_POSTS),
        content.all_sections(),
        content.all_profiles(),
    )?;

    let meta = PageMeta::new(None, state.config.site.description.clone())
        .with_canonical(state.urls.absolute(routes::HOME));
    Ok(Rendered::new("index.html", meta)
        .insert("posts", &PostCard::list(&recent, &state.images))
        .insert("sections", &SectionCard::list(&sections, &state.images))
        .insert("profiles", &ProfileCard::list(&profiles, &state.images)))
}

async fn sections_page(state: &AppState) -> Result<Rendered, PageError> {
    let sections = state.content.all_sections().await?;
    let site_name = &state.config.site.name;

    let trail = [("Secciones", state.urls.absolute(routes::SECTIONS))];
    let meta = PageMeta::new(
        Some("Secciones".to_string()),
        format!(
            "Explora los temas de bienestar, mindfulness y crecimiento personal en {}. Cada sección agrupa artículos sobre distintos aspectos de una vida plena.",
            site_name
        ),
    )
    .with_canonical(state.urls.absolute(routes::SECTIONS));

    Ok(Rendered::new("sections.html", meta)
        .insert("breadcrumb", &breadcrumb(&[("Secciones", routes::SECTIONS.to_string())]))
        .insert("sections", &SectionCard::list(&sections, &state.images))
        .schema(state.schemas.breadcrumb(&state.schemas.crumbs_from_home(&trail))))
}

async fn profiles_page(state: &AppState) -> Result<Rendered, PageError> {
    let profiles = state.content.all_profiles().await?;

    let trail = [("Perfiles", state.urls.absolute(routes::PROFILES))];
    let meta = PageMeta::new(
        Some("Perfiles".to_string()),
        format!(
            "Conoce a los autores y colaboradores de {}. Expertos en bienestar, mindfulness y crecimiento personal que comparten su sabiduría contigo.",
            state.config.site.name
        ),
    )
    .with_canonical(state.urls.absolute(routes::PROFILES));

    Ok(Rendered::new("profiles.html", meta)
        .insert("breadcrumb", &breadcrumb(&[("Perfiles", routes::PROFILES.to_string())]))
        .insert("profiles", &ProfileCard::list(&profiles, &state.images))
        .schema(state.schemas.breadcrumb(&state.schemas.crumbs_from_home(&trail))))
}

async fn profile_page(state: &AppState, slug: &str) -> Result<Rendered, PageError> {
    let profile = state
        .content
        .profile_by_slug(slug)
        .await?
        .ok_or(PageError::NotFound)?;
    let author = &profile.author;

    let image_url = state
        .images
        .url(author.image.as_ref(), PROFILE_IMAGE_SIZE, PROFILE_IMAGE_SIZE);
    let mut card = ProfileCard::with_bio_length(author, &state.images, PROFILE_BIO_LENGTH);
    card.image_url = image_url.clone();

    let canonical = state.urls.profile(author.slug.as_str());
    let description = match truncate_bio(author.bio.as_ref(), DEFAULT_EXCERPT_LENGTH) {
        bio if bio.is_empty() => format!("Perfil de {} en {}", author.name, state.config.site.name),
        bio => bio,
    };
    let meta = PageMeta::new(Some(author.name.clone()), description)
        .with_canonical(canonical.clone())
        .with_image(image_url.clone());

    let trail = [
        ("Perfiles", state.urls.absolute(routes::PROFILES)),
        (author.name.as_str(), canonical),
    ];
    let visible = [
        ("Perfiles", routes::PROFILES.to_string()),
        (author.name.as_str(), routes::profile_path(slug)),
    ];

    Ok(Rendered::new("profile.html", meta)
        .insert("breadcrumb", &breadcrumb(&visible))
        .insert("profile", &card)
        .insert("posts", &PostCard::list(&profile.posts, &state.images))
        .schema(state.schemas.breadcrumb(&state.schemas.crumbs_from_home(&trail)))
        .schema(state.schemas.profile(author, Some(&image_url))))
}

/// A value of the "Sobre Nosotros" page
#[derive(Debug, Clone, Serialize)]
pub struct ValueItem {
    pub title: &'static str,
    pub description: &'static str,
}

pub const VALUES: &[ValueItem] = &[
    ValueItem {
        title: "Bienestar",
        description: "Promovemos prácticas que nutren cuerpo, mente y espíritu para alcanzar una vida plena y equilibrada.",
    },
    ValueItem {
        title: "Conexión",
        description: "Fomentamos vínculos auténticos con uno mismo, con los demás y con la naturaleza que nos rodea.",
    },
    ValueItem {
        title: "Crecimiento",
        description: "Acompañamos procesos de transformación personal a través del autoconocimiento y la reflexión consciente.",
    },
    ValueItem {
        title: "Naturaleza",
        description: "Nos inspiramos en los ciclos naturales para encontrar armonía, enraizarnos y florecer desde la autenticidad.",
    },
];

async fn about_page(state: &AppState) -> Result<Rendered, PageError> {
    let profiles = state.content.all_profiles().await?;
    let site_name = &state.config.site.name;

    let trail = [("Sobre Nosotros", state.urls.absolute(routes::ABOUT))];
    let meta = PageMeta::new(
        Some("Sobre Nosotros".to_string()),
        format!(
            "Conoce la misión, valores y equipo de {}. Un espacio dedicado al bienestar, la conexión y el crecimiento personal.",
            site_name
        ),
    )
    .with_canonical(state.urls.absolute(routes::ABOUT));

    Ok(Rendered::new("about.html", meta)
        .insert("breadcrumb", &breadcrumb(&[("Sobre Nosotros", routes::ABOUT.to_string())]))
        .insert("values", VALUES)
        .insert("profiles", &ProfileCard::list(&profiles, &state.images))
        .schema(state.schemas.breadcrumb(&state.schemas.crumbs_from_home(&trail))))
}

async fn tag_page(state: &AppState, slug: &str) -> Result<Rendered, PageError> {
    let (tag, posts) = tokio::try_join!(state.content.tag_by_slug(slug), state.content.posts_by_tag(slug))?;
    let tag = tag.ok_or(PageError::NotFound)?;

    let canonical = state.urls.tag(slug);
    let description = tag
        .description
        .clone()
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("Artículos etiquetados con «{}» en {}", tag.title, state.config.site.name));
    let meta = PageMeta::new(Some(tag.title.clone()), description.clone()).with_canonical(canonical.clone());

    let trail = [(tag.title.as_str(), canonical)];
    let visible = [(tag.title.as_str(), routes::tag_path(slug))];

    Ok(Rendered::new("tag.html", meta)
        .insert("breadcrumb", &breadcrumb(&visible))
        .insert("tag", &TagLink { title: tag.title.clone(), href: routes::tag_path(slug) })
        .insert("description", &description)
        .insert("posts", &PostCard::list(&posts, &state.images))
        .schema(state.schemas.breadcrumb(&state.schemas.crumbs_from_home(&trail)))
        .schema(state.schemas.article_list(&posts)))
}

async fn section_page(state: &AppState, section_slug: &str) -> Result<Rendered, PageError> {
    if RESERVED_SEGMENTS.contains(&section_slug) {
        return Err(PageError::NotFound);
    }
    let section = state
        .content
        .section_by_slug(section_slug)
        .await?
        .ok_or(PageError::NotFound)?;
    let title = section.section.title.as_str();

    let canonical = state.urls.section(section_slug);
    let description = if section.section.description.is_empty() {
        format!("Artículos sobre {} en {}", title, state.config.site.name)
    } else {
        section.section.description.clone()
    };
    let meta = PageMeta::new(Some(title.to_string()), description)
        .with_canonical(canonical.clone())
        .with_image(state.images.default_url(section.section.image.as_ref()));

    let trail = [
        ("Secciones", state.urls.absolute(routes::SECTIONS)),
        (title, canonical),
    ];
    let visible = [
        ("Secciones", routes::SECTIONS.to_string()),
        (title, routes::section_path(section_slug)),
    ];
    let subcategories: Vec<SubcategoryCard> = section
        .subcategories
        .iter()
        .map(|sub| SubcategoryCard::new(section_slug, sub))
        .collect();

    Ok(Rendered::new("section.html", meta)
        .insert("breadcrumb", &breadcrumb(&visible))
        .insert("section", &SectionCard::new(&section.section, &state.images))
        .insert("subcategories", &subcategories)
        .insert("posts", &PostCard::list(&section.posts, &state.images))
        .schema(state.schemas.breadcrumb(&state.schemas.crumbs_from_home(&trail))))
}

async fn section_entry_page(state: &AppState, section_slug: &str, slug: &str) -> Result<Rendered, PageError> {
    if RESERVED_SEGMENTS.contains(&section_slug) {
        return Err(PageError::NotFound);
    }

    if let Some(subcategory) = state.content.subcategory_by_slug(section_slug, slug).await? {
        let sub = &subcategory.subcategory;
        let section_title = sub
            .section
            .as_ref()
            .map(|s| s.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| slug_to_title(section_slug));

        let canonical = state.urls.subcategory(section_slug, slug);
        let description = sub
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("{} en {}", sub.title, section_title));
        let meta = PageMeta::new(Some(format!("{} — {}", sub.title, section_title)), description.clone())
            .with_canonical(canonical.clone());

        let trail = [
            (section_title.as_str(), state.urls.section(section_slug)),
            (sub.title.as_str(), canonical),
        ];
        let visible = [
            (section_title.as_str(), routes::section_path(section_slug)),
            (sub.title.as_str(), routes::subcategory_path(section_slug, slug)),
        ];

        return Ok(Rendered::new("subcategory.html", meta)
            .insert("breadcrumb", &breadcrumb(&visible))
            .insert("subcategory", &TagLink { title: sub.title.clone(), href: routes::subcategory_path(section_slug, slug) })
            .insert("description", &sub.description.clone().unwrap_or_default())
            .insert("posts", &PostCard::list(&subcategory.posts, &state.images))
            .schema(state.schemas.breadcrumb(&state.schemas.crumbs_from_home(&trail))));
    }

    let post = state.content.post_by_slug(slug).await?.ok_or(PageError::NotFound)?;
    article_page(state, post, section_slug, None, slug).await
}

/// Article page; links are built from the requested slugs
async fn article_page(
    state: &AppState,
    post: Post,
    section_slug: &str,
    subcategory_slug: Option<&str>,
    post_slug: &str,
) -> Result<Rendered, PageError> {
    let related = state.content.related_posts(&post.item, RELATED_POSTS).await?;
    let item = &post.item;

    let hero_url = state.images.url(item.main_image.as_ref(), HERO_WIDTH, HERO_HEIGHT);
    let canonical = state.urls.post(section_slug, post_slug, subcategory_slug);
    let section_title = item
        .section
        .as_ref()
        .map(|s| s.title.clone())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| slug_to_title(section_slug));
    let subcategory_title = item
        .subcategory
        .as_ref()
        .map(|s| s.title.clone())
        .filter(|t| !t.is_empty());

    let mut trail = vec![(section_title.as_str(), state.urls.section(section_slug))];
    let mut visible = vec![(section_title.as_str(), routes::section_path(section_slug))];
    if let (Some(title), Some(sub_slug)) = (subcategory_title.as_deref(), subcategory_slug) {
        trail.push((title, state.urls.subcategory(section_slug, sub_slug)));
        visible.push((title, routes::subcategory_path(section_slug, sub_slug)));
    }
    trail.push((item.title.as_str(), canonical.clone()));
    visible.push((item.title.as_str(), routes::post_path(section_slug, post_slug, subcategory_slug)));

    let body_text = extract_plain_text(&post.body);
    let word_count = body_text.split_whitespace().count();
    let published_at = item.published_at.clone().unwrap_or_default();

    let article = ArticleView {
        title: item.title.clone(),
        excerpt: item.excerpt.clone(),
        image_url: hero_url.clone(),
        image_alt: item
            .main_image
            .as_ref()
            .and_then(|i| i.alt.clone())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| item.title.clone()),
        date: format_date(&published_at),
        published_at,
        author: item.author.as_ref().map(|a| ProfileCard::new(a, &state.images)),
        tags: TagLink::list(&item.tags),
        rating: item.rating.map(RatingView::new),
        reading_time: item.reading_time.map(format_reading_time),
        summary: item.ai_summary.clone().filter(|s| !s.trim().is_empty()),
        body_html: if post.body.is_empty() {
            String::new()
        } else {
            state.renderer.render(&post.body)
        },
        share: share_links(&canonical, &item.title),
    };

    let authors: Vec<String> = item.author.iter().map(|a| a.name.clone()).collect();
    let meta = PageMeta::new(Some(item.title.clone()), item.excerpt.clone())
        .with_canonical(canonical.clone())
        .with_image(state.images.default_url(item.main_image.as_ref()))
        .article(item.published_at.clone(), authors);

    let blog_post = state.schemas.blog_post(
        item,
        Some(hero_url.as_str()).filter(|u| !u.is_empty()),
        Some(word_count),
    );

    Ok(Rendered::new("post.html", meta)
        .insert("breadcrumb", &breadcrumb(&visible))
        .insert("article", &article)
        .insert("related", &PostCard::list(&related, &state.images))
        .schema(state.schemas.breadcrumb(&state.schemas.crumbs_from_home(&trail)))
        .schema(blog_post))
}
