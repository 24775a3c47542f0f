//! Tests for the theme engine

use super::*;
use crate::services::PageMeta;
use std::fs;
use tempfile::TempDir;
use tera::Context as TeraContext;

/// Create an override directory holding the given `(name, source)` templates
fn create_override_theme(themes_dir: &Path, theme_name: &str, templates: &[(&str, &str)]) -> PathBuf {
    let theme_path = themes_dir.join(theme_name);
    fs::create_dir_all(&theme_path).unwrap();
    for (name, source) in templates {
        let file = theme_path.join(name);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(file, source).unwrap();
    }
    theme_path
}

/// The variables every built-in page template expects
fn page_context(title: Option<&str>) -> TeraContext {
    let meta = PageMeta::new(title.map(str::to_string), "Descripción de prueba");
    let mut context = TeraContext::new();
    context.insert("page_title", &meta.document_title("Almas Enraizadas"));
    context.insert("meta", &meta);
    context.insert("schemas", &Vec::<String>::new());
    context
}

fn has_template(engine: &ThemeEngine, name: &str) -> bool {
    engine.tera.get_template_names().any(|t| t == name)
}

fn standard_vars(path: &str) -> StandardTemplateVars {
    StandardTemplateVars::new(
        "Almas Enraizadas",
        "Bienestar y crecimiento personal",
        "https://almazasenraizadas.com",
        path,
    )
}

#[test]
fn test_builtin_engine_has_page_templates() {
    let engine = ThemeEngine::builtin().unwrap();

    for name in [
        "base.html",
        "macros.html",
        "index.html",
        "post.html",
        "section.html",
        "subcategory.html",
        "sections.html",
        "profiles.html",
        "profile.html",
        "about.html",
        "tag.html",
        "error.html",
    ] {
        assert!(has_template(&engine, name), "missing built-in template {}", name);
    }
    assert_eq!(engine.get_current_theme(), "default");
}

#[test]
fn test_render_builtin_index() {
    let engine = ThemeEngine::builtin().unwrap();

    let html = engine.render_page("index.html", &page_context(None), &standard_vars("/"));

    assert!(html.contains("<title>Almas Enraizadas — Bienestar, Mindfulness y Crecimiento Personal</title>"));
    assert!(html.contains("Explorar Secciones"));
    assert!(html.contains("Bienestar y crecimiento personal"));
    assert!(html.contains(r#"href="/secciones""#));
}

#[test]
fn test_navigation_marks_current_page() {
    let engine = ThemeEngine::builtin().unwrap();

    let html = engine.render_page(
        "profiles.html",
        &{
            let mut context = page_context(Some("Perfiles"));
            context.insert("profiles", &Vec::<String>::new());
            context
        },
        &standard_vars("/perfiles"),
    );

    assert!(html.contains(r#"<a href="/perfiles" aria-current="page">Perfiles</a>"#));
    assert!(!html.contains(r#"<a href="/secciones" aria-current="page">"#));
    assert!(html.contains("No hay perfiles disponibles"));
}

#[test]
fn test_site_schemas_are_not_escaped() {
    let engine = ThemeEngine::builtin().unwrap();
    let vars = standard_vars("/").with_schemas(vec![r#"{"@type":"WebSite"}"#.to_string()]);

    let html = engine.render_page("index.html", &page_context(None), &vars);

    assert!(html.contains(r#"<script type="application/ld+json">{"@type":"WebSite"}</script>"#));
}

#[test]
fn test_missing_theme_directory_uses_builtins() {
    let temp_dir = TempDir::new().unwrap();
    let themes_path = temp_dir.path().join("themes");

    let engine = ThemeEngine::new(&themes_path, "sereno").unwrap();

    assert_eq!(engine.get_current_theme(), "sereno");
    assert_eq!(engine.theme_path(engine.get_current_theme()), themes_path.join("sereno"));
    assert!(has_template(&engine, "index.html"));
}

#[test]
fn test_override_replaces_builtin_template() {
    let temp_dir = TempDir::new().unwrap();
    let themes_path = temp_dir.path().join("themes");
    create_override_theme(
        &themes_path,
        "sereno",
        &[(
            "index.html",
            r#"{% extends "base.html" %}{% block content %}<p class="override">Portada propia</p>{% endblock content %}"#,
        )],
    );

    let engine = ThemeEngine::new(&themes_path, "sereno").unwrap();
    let html = engine.render_page("index.html", &page_context(None), &standard_vars("/"));

    assert!(html.contains("Portada propia"));
    assert!(!html.contains("Explorar Secciones"));
    // the built-in layout still wraps the override
    assert!(html.contains("Saltar al contenido"));
    assert!(has_template(&engine, "post.html"));
}

#[test]
fn test_override_in_subdirectory_keeps_relative_name() {
    let temp_dir = TempDir::new().unwrap();
    let themes_path = temp_dir.path().join("themes");
    create_override_theme(&themes_path, "sereno", &[("parciales/aviso.html", "<p>Aviso</p>")]);

    let engine = ThemeEngine::new(&themes_path, "sereno").unwrap();

    assert!(has_template(&engine, "parciales/aviso.html"));
    let html = engine.render("parciales/aviso.html", &TeraContext::new()).unwrap();
    assert_eq!(html, "<p>Aviso</p>");
}

#[test]
fn test_reload_templates_picks_up_changes() {
    let temp_dir = TempDir::new().unwrap();
    let themes_path = temp_dir.path().join("themes");
    let theme_path = create_override_theme(&themes_path, "sereno", &[("nota.html", "primera")]);

    let mut engine = ThemeEngine::new(&themes_path, "sereno").unwrap();
    assert_eq!(engine.render("nota.html", &TeraContext::new()).unwrap(), "primera");

    fs::write(theme_path.join("nota.html"), "segunda").unwrap();
    engine.reload_templates().unwrap();

    assert_eq!(engine.render("nota.html", &TeraContext::new()).unwrap(), "segunda");
}

#[test]
fn test_invalid_override_fails_to_load() {
    let temp_dir = TempDir::new().unwrap();
    let themes_path = temp_dir.path().join("themes");
    create_override_theme(&themes_path, "roto", &[("index.html", "{% if %}")]);

    assert!(ThemeEngine::new(&themes_path, "roto").is_err());
}

#[test]
fn test_render_missing_template_error() {
    let engine = ThemeEngine::builtin().unwrap();

    let err = engine.render("inexistente.html", &TeraContext::new()).unwrap_err();

    assert!(err.to_string().contains("inexistente.html"));
}

#[test]
fn test_render_with_fallback_uses_error_template() {
    let engine = ThemeEngine::builtin().unwrap();

    let html = engine.render_page("inexistente.html", &page_context(Some("Error")), &standard_vars("/x"));

    assert!(html.contains("Algo salió mal"));
    assert!(html.contains("500"));
    assert!(html.contains("inexistente.html"));
    assert!(html.contains("Volver al inicio"));
}

#[test]
fn test_render_with_fallback_uses_simple_page_when_error_template_fails() {
    let engine = ThemeEngine::builtin().unwrap();

    // without `meta` and `schemas` the layout cannot render either
    let html = engine.render_with_fallback("inexistente.html", &TeraContext::new());

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Algo salió mal"));
    assert!(html.contains("<code>inexistente.html</code>"));
}

#[test]
fn test_custom_error_template_override() {
    let temp_dir = TempDir::new().unwrap();
    let themes_path = temp_dir.path().join("themes");
    create_override_theme(
        &themes_path,
        "sereno",
        &[(
            "error.html",
            "<h1>Error propio</h1><p>{{ requested_template }}</p><p>{{ status }}</p>",
        )],
    );

    let engine = ThemeEngine::new(&themes_path, "sereno").unwrap();
    let html = engine.render_with_fallback("falta.html", &TeraContext::new());

    assert!(html.contains("Error propio"));
    assert!(html.contains("falta.html"));
    assert!(html.contains("500"));
}

#[test]
fn test_simple_error_page_escapes_input() {
    let html = ThemeEngine::simple_error_page("<pagina>.html", "<script>alert('x')</script>");

    assert!(html.contains("&lt;pagina&gt;.html"));
    assert!(html.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"));
    assert!(!html.contains("<script>"));
}

#[test]
fn test_autoescape_keeps_slashes() {
    let temp_dir = TempDir::new().unwrap();
    let themes_path = temp_dir.path().join("themes");
    create_override_theme(
        &themes_path,
        "sereno",
        &[("enlace.html", r#"<a href="{{ url }}">{{ label }}</a>"#)],
    );
    let engine = ThemeEngine::new(&themes_path, "sereno").unwrap();

    let mut context = TeraContext::new();
    context.insert("url", "https://cdn.sanity.io/images/p/d/a.jpg");
    context.insert("label", "<b>Yoga & calma</b>");
    let html = engine.render("enlace.html", &context).unwrap();

    assert_eq!(
        html,
        r#"<a href="https://cdn.sanity.io/images/p/d/a.jpg">&lt;b&gt;Yoga &amp; calma&lt;/b&gt;</a>"#
    );
}

#[test]
fn test_formatting_filters() {
    let temp_dir = TempDir::new().unwrap();
    let themes_path = temp_dir.path().join("themes");
    create_override_theme(
        &themes_path,
        "sereno",
        &[(
            "filtros.html",
            "{{ fecha | fecha }}|{{ minutos | lectura }}|{{ nota | estrellas }}|{{ nota | estrellas(max=3) }}|{{ texto | recortar(max=20) }}",
        )],
    );
    let engine = ThemeEngine::new(&themes_path, "sereno").unwrap();

    let mut context = TeraContext::new();
    context.insert("fecha", "2025-02-12T10:00:00Z");
    context.insert("minutos", &3.2);
    context.insert("nota", &4);
    context.insert("texto", "hola");
    let html = engine.render("filtros.html", &context).unwrap();

    assert_eq!(html, "12 de febrero de 2025|4 min de lectura|★★★★☆|★★★|hola");
}

#[test]
fn test_filters_tolerate_missing_values() {
    let temp_dir = TempDir::new().unwrap();
    let themes_path = temp_dir.path().join("themes");
    create_override_theme(
        &themes_path,
        "sereno",
        &[("vacio.html", "[{{ nada | fecha }}][{{ nada | lectura }}][{{ nada | estrellas }}]")],
    );
    let engine = ThemeEngine::new(&themes_path, "sereno").unwrap();

    let mut context = TeraContext::new();
    context.insert("nada", &serde_json::Value::Null);
    let html = engine.render("vacio.html", &context).unwrap();

    assert_eq!(html, "[][][]");
}

#[test]
fn test_standard_template_vars() {
    let vars = standard_vars("/yoga").with_schemas(vec!["{}".to_string()]);

    assert_eq!(vars.year, chrono::Utc::now().year());
    assert_eq!(vars.nav_items.len(), NAV_ITEMS.len());

    let mut context = TeraContext::new();
    vars.insert_into(&mut context);
    let json = context.into_json();
    assert_eq!(json["site_name"], "Almas Enraizadas");
    assert_eq!(json["request_path"], "/yoga");
    assert_eq!(json["site_url"], "https://almazasenraizadas.com");
    assert_eq!(json["nav_items"][1]["href"], "/secciones");
    assert_eq!(json["site_schemas"][0], "{}");
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn site_name_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{2,30}".prop_map(|s| s.trim().to_string())
    }

    fn request_path_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("/".to_string()),
            Just("/secciones".to_string()),
            "[a-z]{3,10}".prop_map(|s| format!("/{}", s)),
            "[a-z]{3,10}/[a-z]{3,10}".prop_map(|s| format!("/{}", s)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Every page receives the site-wide variables regardless of its own context
        #[test]
        fn standard_vars_reach_every_page(
            site_name in site_name_strategy(),
            request_path in request_path_strategy(),
        ) {
            let temp_dir = TempDir::new().unwrap();
            let themes_path = temp_dir.path().join("themes");
            create_override_theme(
                &themes_path,
                "vars",
                &[(
                    "vars.html",
                    "NAME:{{ site_name }}|PATH:{{ request_path }}|THEME:{{ theme_name }}|YEAR:{{ year }}",
                )],
            );
            let engine = ThemeEngine::new(&themes_path, "vars").unwrap();

            let vars = StandardTemplateVars::new(site_name.clone(), "", "https://example.com", request_path.clone());
            let html = engine.render_page("vars.html", &TeraContext::new(), &vars);

            let name = format!("NAME:{}", site_name);
            let path = format!("PATH:{}", request_path);
            let year = format!("YEAR:{}", chrono::Utc::now().year());
            prop_assert!(html.contains(&name), "missing {}", name);
            prop_assert!(html.contains(&path), "missing {}", path);
            prop_assert!(html.contains("THEME:vars"));
            prop_assert!(html.contains(&year), "missing {}", year);
        }

        /// A page never comes back empty, even for templates that do not exist
        #[test]
        fn render_page_always_returns_html(name in "falta-[a-z]{3,12}\\.html") {
            let engine = ThemeEngine::builtin().unwrap();

            let html = engine.render_page(&name, &TeraContext::new(), &standard_vars("/"));

            prop_assert!(html.contains("<!DOCTYPE html>"));
        }
    }
}
