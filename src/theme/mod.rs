//! Theme engine
//!
//! Page rendering with Tera. The built-in templates ship inside the binary;
//! a theme directory (`theme.path/theme.active`) may override any of them
//! by providing a file with the same relative name.

use anyhow::{Context, Result};
use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera, Value};

use crate::services::formatters;
use crate::services::portable_text::html_escape;
use crate::services::routes::{NavLink, NAV_ITEMS};

mod error;

pub use error::ThemeError;

/// Templates compiled into the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct BuiltinTemplates;

/// Theme engine for rendering templates
pub struct ThemeEngine {
    tera: Tera,
    themes_path: PathBuf,
    current_theme: String,
}

impl ThemeEngine {
    /// Create a new theme engine
    ///
    /// # Arguments
    /// * `themes_path` - Directory holding theme override directories
    /// * `active_theme` - Name of the override directory to apply; a missing
    ///   directory means the built-in templates are used as they are
    pub fn new(themes_path: &Path, active_theme: &str) -> Result<Self> {
        let mut engine = Self {
            tera: Tera::default(),
            themes_path: themes_path.to_path_buf(),
            current_theme: active_theme.to_string(),
        };
        engine.reload_templates()?;
        Ok(engine)
    }

    /// Engine with only the built-in templates
    pub fn builtin() -> Result<Self> {
        let mut engine = Self {
            tera: Tera::default(),
            themes_path: PathBuf::new(),
            current_theme: "default".to_string(),
        };
        engine.tera = build_tera(builtin_templates()?)?;
        Ok(engine)
    }

    /// Rebuild the template set from the built-ins and the active theme's overrides
    pub fn reload_templates(&mut self) -> Result<()> {
        let mut templates = builtin_templates()?;

        let theme_path = self.theme_path(&self.current_theme);
        if theme_path.is_dir() {
            let mut overrides = Vec::new();
            collect_templates_from_dir(&theme_path, &theme_path, &mut overrides)?;
            tracing::info!(
                "Theme '{}' overrides {} template(s)",
                self.current_theme,
                overrides.len()
            );
            templates.extend(overrides);
        } else {
            tracing::debug!(
                "Theme directory {:?} not found, using built-in templates",
                theme_path
            );
        }

        self.tera = build_tera(templates)?;
        Ok(())
    }

    /// Render a template
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            let mut error_msg = format!("Failed to render '{}': {}", template, e);
            let mut source = e.source();
            while let Some(s) = source {
                error_msg.push_str(&format!("\n  Caused by: {}", s));
                source = s.source();
            }
            ThemeError::TemplateError(error_msg).into()
        })
    }

    /// Render a page template with the site-wide variables added to `context`
    ///
    /// Falls back like [`ThemeEngine::render_with_fallback`], so a page always
    /// produces HTML.
    pub fn render_page(
        &self,
        template: &str,
        context: &TeraContext,
        standard_vars: &StandardTemplateVars,
    ) -> String {
        let mut full_context = context.clone();
        standard_vars.insert_into(&mut full_context);
        full_context.insert("theme_name", &self.current_theme);
        self.render_with_fallback(template, &full_context)
    }

    /// Render a template, degrading to `error.html` and then to a plain page
    ///
    /// Always returns HTML.
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext) -> String {
        match self.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(
                    "Failed to render template '{}': {}, trying error template",
                    template,
                    e
                );

                let mut error_context = context.clone();
                error_context.insert("error_message", &e.to_string());
                error_context.insert("requested_template", template);
                error_context.insert("status", &500);

                match self.render("error.html", &error_context) {
                    Ok(html) => html,
                    Err(error_template_err) => {
                        tracing::warn!(
                            "Failed to render error template: {}, returning simple HTML error page",
                            error_template_err
                        );
                        Self::simple_error_page(template, &e.to_string())
                    }
                }
            }
        }
    }

    /// Plain HTML page used when no template can be rendered
    pub fn simple_error_page(template: &str, error: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Error</title>
    <style>
        body {{ font-family: Georgia, serif; max-width: 600px; margin: 50px auto; padding: 20px; background: #f8f7f4; color: #4d4a49; }}
        .error-box {{ background: #fff; border-left: 4px solid #8d9788; padding: 20px; border-radius: 4px; }}
        code {{ background: #f1efeb; padding: 2px 6px; border-radius: 3px; }}
    </style>
</head>
<body>
    <div class="error-box">
        <h1>Algo salió mal</h1>
        <p>No se pudo mostrar la página <code>{}</code>.</p>
        <p>{}</p>
    </div>
</body>
</html>"#,
            html_escape(template),
            html_escape(error)
        )
    }

    pub fn get_current_theme(&self) -> &str {
        &self.current_theme
    }

    fn theme_path(&self, theme_name: &str) -> PathBuf {
        self.themes_path.join(theme_name)
    }
}

/// All embedded templates as `(name, source)` pairs
fn builtin_templates() -> Result<Vec<(String, String)>> {
    let mut templates = Vec::new();
    for name in BuiltinTemplates::iter() {
        let file = BuiltinTemplates::get(&name)
            .ok_or_else(|| ThemeError::NotFound(name.to_string()))?;
        let source = String::from_utf8(file.data.into_owned())
            .with_context(|| format!("Template {} is not valid UTF-8", name))?;
        templates.push((name.to_string(), source));
    }
    Ok(templates)
}

/// Build a Tera instance; later entries replace earlier ones with the same name
fn build_tera(templates: Vec<(String, String)>) -> Result<Tera> {
    let mut by_name: HashMap<String, String> = HashMap::new();
    for (name, source) in templates {
        by_name.insert(name, source);
    }

    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html"]);
    // Tera's default escaper also rewrites `/`, which mangles every URL attribute
    tera.set_escape_fn(html_escape);
    register_filters(&mut tera);
    tera.add_raw_templates(by_name)
        .map_err(|e| ThemeError::TemplateError(format!("Failed to add templates: {}", e)))?;
    Ok(tera)
}

/// Collect `.html` templates below `current_path`, named relative to `base_path`
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<()> {
    for entry in fs::read_dir(current_path)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError("Failed to get relative path".to_string()))?;
            let template_name = relative_path.to_string_lossy().replace('\\', "/");
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;
            templates.push((template_name, content));
        }
    }
    Ok(())
}

/// Formatting filters available to every template
fn register_filters(tera: &mut Tera) {
    tera.register_filter("fecha", |value: &Value, _: &HashMap<String, Value>| {
        Ok(Value::String(formatters::format_date(value.as_str().unwrap_or(""))))
    });
    tera.register_filter("lectura", |value: &Value, _: &HashMap<String, Value>| {
        Ok(Value::String(
            value.as_f64().map(formatters::format_reading_time).unwrap_or_default(),
        ))
    });
    tera.register_filter("estrellas", |value: &Value, args: &HashMap<String, Value>| {
        let max = args.get("max").and_then(Value::as_u64).unwrap_or(5) as u32;
        Ok(Value::String(
            value.as_f64().map(|v| formatters::rating_stars(v, max)).unwrap_or_default(),
        ))
    });
    tera.register_filter("recortar", |value: &Value, args: &HashMap<String, Value>| {
        let max = args.get("max").and_then(Value::as_u64).unwrap_or(160) as usize;
        Ok(Value::String(formatters::truncate_text(value.as_str().unwrap_or(""), max)))
    });
}

/// Variables every page receives
#[derive(Debug, Clone, Serialize)]
pub struct StandardTemplateVars {
    pub site_name: String,
    pub site_description: String,
    pub site_url: String,
    pub request_path: String,
    pub nav_items: Vec<NavLink>,
    pub year: i32,
    /// JSON-LD documents rendered in `<head>` on every page
    pub site_schemas: Vec<String>,
}

impl StandardTemplateVars {
    pub fn new(
        site_name: impl Into<String>,
        site_description: impl Into<String>,
        site_url: impl Into<String>,
        request_path: impl Into<String>,
    ) -> Self {
        Self {
            site_name: site_name.into(),
            site_description: site_description.into(),
            site_url: site_url.into(),
            request_path: request_path.into(),
            nav_items: NAV_ITEMS.to_vec(),
            year: chrono::Utc::now().year(),
            site_schemas: Vec::new(),
        }
    }

    pub fn with_schemas(mut self, schemas: Vec<String>) -> Self {
        self.site_schemas = schemas;
        self
    }

    pub fn insert_into(&self, context: &mut TeraContext) {
        context.insert("site_name", &self.site_name);
        context.insert("site_description", &self.site_description);
        context.insert("site_url", &self.site_url);
        context.insert("request_path", &self.request_path);
        context.insert("nav_items", &self.nav_items);
        context.insert("year", &self.year);
        context.insert("site_schemas", &self.site_schemas);
    }
}

#[cfg(test)]
mod tests;
