//! Text and display formatters
//!
//! Pure helpers shared by page rendering, structured data and the AI
//! endpoints: Spanish dates, reading time, truncation, share links.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Bio, PortableTextBlock};

/// Default excerpt length in characters
pub const DEFAULT_EXCERPT_LENGTH: usize = 160;

/// Average adult reading speed
pub const WORDS_PER_MINUTE: usize = 200;

const ELLIPSIS: char = '…';

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Parse the date shapes the CMS emits (RFC 3339 datetimes or bare dates)
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Format an ISO 8601 date as a long Spanish date, in UTC
///
/// `"2025-02-12T10:00:00Z"` becomes `"12 de febrero de 2025"`. Empty or
/// unparseable input yields an empty string.
pub fn format_date(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    match parse_date(value) {
        Some(date) => format!(
            "{} de {} de {}",
            date.day(),
            MONTHS_ES[date.month0() as usize],
            date.year()
        ),
        None => String::new(),
    }
}

/// Machine-readable date for `<time datetime>` (YYYY-MM-DD)
pub fn iso_date(value: &str) -> String {
    parse_date(value)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Human readable reading time ("5 min de lectura")
pub fn format_reading_time(minutes: f64) -> String {
    let rounded = minutes.ceil();
    if rounded <= 1.0 {
        "1 min de lectura".to_string()
    } else {
        format!("{} min de lectura", rounded as i64)
    }
}

/// Truncate text to at most `max_length` characters, ending with an ellipsis
///
/// The cut backs up to the last word boundary when that boundary lies in the
/// second half of the allowed length.
pub fn truncate_text(text: &str, max_length: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_length {
        return trimmed.to_string();
    }

    let cut: Vec<char> = trimmed.chars().take(max_length.saturating_sub(1)).collect();
    let last_space = cut.iter().rposition(|c| *c == ' ');
    let end = match last_space {
        Some(pos) if pos as f64 > max_length as f64 / 2.0 => pos,
        _ => cut.len(),
    };

    let mut result: String = cut[..end].iter().collect::<String>().trim_end().to_string();
    result.push(ELLIPSIS);
    result
}

/// Plain text of Portable Text blocks, one space between blocks
pub fn blocks_to_text(blocks: &[PortableTextBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| b.as_block())
        .map(|b| b.plain_text())
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`truncate_text`] over the text of Portable Text blocks
pub fn truncate_blocks(blocks: &[PortableTextBlock], max_length: usize) -> String {
    truncate_text(&blocks_to_text(blocks), max_length)
}

/// Truncate an author biography regardless of how it is stored
pub fn truncate_bio(bio: Option<&Bio>, max_length: usize) -> String {
    match bio {
        Some(Bio::Text(text)) => truncate_text(text, max_length),
        Some(Bio::Blocks(blocks)) => truncate_blocks(blocks, max_length),
        None => String::new(),
    }
}

/// `"bienestar-emocional"` becomes `"Bienestar Emocional"`
pub fn slug_to_title(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Percent-encode a URI component, leaving `A-Z a-z 0-9 - _ . ! ~ * ' ( )` as is
pub fn encode_uri_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%2A", "*")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
}

/// Share link for a social platform; unknown platforms get the page URL back
pub fn build_share_url(platform: &str, url: &str, title: &str) -> String {
    let encoded_url = encode_uri_component(url);
    let encoded_title = encode_uri_component(title);

    match platform.to_lowercase().as_str() {
        "twitter" | "x" => format!(
            "https://twitter.com/intent/tweet?url={}&text={}",
            encoded_url, encoded_title
        ),
        "facebook" => format!("https://www.facebook.com/sharer/sharer.php?u={}", encoded_url),
        "whatsapp" => format!("https://wa.me/?text={}%20{}", encoded_title, encoded_url),
        "linkedin" => format!(
            "https://www.linkedin.com/sharing/share-offsite/?url={}",
            encoded_url
        ),
        _ => url.to_string(),
    }
}

/// Strip markup and collapse whitespace
fn strip_markup(text: &str) -> String {
    let without_tags = TAG_RE.replace_all(text, " ");
    WHITESPACE_RE.replace_all(&without_tags, " ").trim().to_string()
}

/// Estimated reading time in whole minutes, never less than one
pub fn calculate_reading_time(text: &str) -> u32 {
    reading_minutes(strip_markup(text).split_whitespace().count())
}

/// Minutes needed to read `words` words
pub fn reading_minutes(words: usize) -> u32 {
    (words.div_ceil(WORDS_PER_MINUTE)).max(1) as u32
}

/// Excerpt of markup-free text
pub fn generate_excerpt(text: &str, max_length: usize) -> String {
    truncate_text(&strip_markup(text), max_length)
}

/// Glyph shown for a social profile link
pub fn social_icon(platform: &str) -> &'static str {
    match platform.to_lowercase().as_str() {
        "twitter" | "x" => "𝕏",
        "facebook" => "f",
        "instagram" => "◎",
        "linkedin" => "in",
        "youtube" => "▶",
        _ => "↗",
    }
}

/// Filled and empty stars for a rating, rounded and clamped to `max`
pub fn rating_stars(value: f64, max: u32) -> String {
    let filled = (value.round().max(0.0) as u32).min(max);
    let mut stars = "★".repeat(filled as usize);
    stars.push_str(&"☆".repeat((max - filled) as usize));
    stars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, Span};

    fn text_block(text: &str) -> PortableTextBlock {
        PortableTextBlock::Block(Block {
            children: vec![Span {
                text: text.to_string(),
                ..Span::default()
            }],
            ..Block::default()
        })
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2025-02-12T10:00:00Z"), "12 de febrero de 2025");
        assert_eq!(format_date("2024-12-31"), "31 de diciembre de 2024");
        assert_eq!(format_date("2025-01-01T00:30:00.000Z"), "1 de enero de 2025");
        assert_eq!(format_date("2025-03-01T01:00:00+02:00"), "28 de febrero de 2025");
    }

    #[test]
    fn test_format_date_empty_or_invalid() {
        assert_eq!(format_date(""), "");
        assert_eq!(format_date("ayer"), "");
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(iso_date("2025-02-12T10:00:00Z"), "2025-02-12");
        assert_eq!(iso_date("nope"), "");
    }

    #[test]
    fn test_format_reading_time() {
        assert_eq!(format_reading_time(0.0), "1 min de lectura");
        assert_eq!(format_reading_time(1.0), "1 min de lectura");
        assert_eq!(format_reading_time(1.2), "2 min de lectura");
        assert_eq!(format_reading_time(5.0), "5 min de lectura");
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_text("  Hola mundo  ", 20), "Hola mundo");
        assert_eq!(truncate_text("", 10), "");
    }

    #[test]
    fn test_truncate_backs_up_to_word() {
        let text = "La respiración consciente calma la mente";
        let result = truncate_text(text, 20);
        assert_eq!(result, "La respiración…");
        assert!(result.chars().count() <= 20);
    }

    #[test]
    fn test_truncate_hard_cut_when_space_too_early() {
        assert_eq!(truncate_text("ab cdefghijklmnop", 10), "ab cdefgh…");
    }

    #[test]
    fn test_truncate_blocks_and_bio() {
        let blocks = vec![text_block("Primera parte."), text_block("Segunda parte.")];
        assert_eq!(truncate_blocks(&blocks, 100), "Primera parte. Segunda parte.");
        assert_eq!(
            truncate_bio(Some(&Bio::Blocks(blocks)), 100),
            "Primera parte. Segunda parte."
        );
        assert_eq!(truncate_bio(Some(&Bio::Text("Hola".to_string())), 100), "Hola");
        assert_eq!(truncate_bio(None, 100), "");
    }

    #[test]
    fn test_slug_to_title() {
        assert_eq!(slug_to_title("bienestar-emocional"), "Bienestar Emocional");
        assert_eq!(slug_to_title("YOGA"), "Yoga");
        assert_eq!(slug_to_title("árbol-de-vida"), "Árbol De Vida");
    }

    #[test]
    fn test_build_share_url() {
        let url = "https://almazasenraizadas.com/yoga/saludo";
        let title = "Saludo al sol";

        assert_eq!(
            build_share_url("x", url, title),
            "https://twitter.com/intent/tweet?url=https%3A%2F%2Falmazasenraizadas.com%2Fyoga%2Fsaludo&text=Saludo%20al%20sol"
        );
        assert_eq!(build_share_url("Twitter", url, title), build_share_url("x", url, title));
        assert_eq!(
            build_share_url("facebook", url, title),
            "https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Falmazasenraizadas.com%2Fyoga%2Fsaludo"
        );
        assert_eq!(
            build_share_url("whatsapp", url, title),
            "https://wa.me/?text=Saludo%20al%20sol%20https%3A%2F%2Falmazasenraizadas.com%2Fyoga%2Fsaludo"
        );
        assert!(build_share_url("linkedin", url, title)
            .starts_with("https://www.linkedin.com/sharing/share-offsite/?url="));
        assert_eq!(build_share_url("myspace", url, title), url);
    }

    #[test]
    fn test_encode_uri_component_keeps_marks() {
        assert_eq!(encode_uri_component("¡Hola! (paz)*'"), "%C2%A1Hola!%20(paz)*'");
        assert_eq!(encode_uri_component("%28"), "%2528");
    }

    #[test]
    fn test_calculate_reading_time() {
        assert_eq!(calculate_reading_time(""), 1);
        assert_eq!(calculate_reading_time("<p>una dos tres</p>"), 1);
        let long = "palabra ".repeat(401);
        assert_eq!(calculate_reading_time(&long), 3);
        assert_eq!(reading_minutes(200), 1);
        assert_eq!(reading_minutes(201), 2);
    }

    #[test]
    fn test_generate_excerpt_strips_markup() {
        assert_eq!(
            generate_excerpt("<p>Respira   <strong>hondo</strong></p>", DEFAULT_EXCERPT_LENGTH),
            "Respira hondo"
        );
    }

    #[test]
    fn test_social_icon() {
        assert_eq!(social_icon("Instagram"), "◎");
        assert_eq!(social_icon("x"), "𝕏");
        assert_eq!(social_icon("tiktok"), "↗");
    }

    #[test]
    fn test_rating_stars() {
        assert_eq!(rating_stars(4.4, 5), "★★★★☆");
        assert_eq!(rating_stars(4.5, 5), "★★★★★");
        assert_eq!(rating_stars(9.0, 5), "★★★★★");
        assert_eq!(rating_stars(-2.0, 5), "☆☆☆☆☆");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(50))]

            #[test]
            fn truncate_never_exceeds_max(text in "[a-zñáé ]{0,300}", max in 2usize..200) {
                let result = truncate_text(&text, max);
                prop_assert!(result.chars().count() <= max);
            }

            #[test]
            fn truncated_text_is_prefix_plus_ellipsis(text in "[a-z ]{0,300}", max in 2usize..200) {
                let result = truncate_text(&text, max);
                let trimmed = text.trim();
                if trimmed.chars().count() > max {
                    prop_assert!(result.ends_with('…'));
                    let body = result.trim_end_matches('…');
                    prop_assert!(trimmed.starts_with(body));
                } else {
                    prop_assert_eq!(result, trimmed.to_string());
                }
            }

            #[test]
            fn reading_time_is_at_least_one(text in ".{0,500}") {
                prop_assert!(calculate_reading_time(&text) >= 1);
            }

            #[test]
            fn stars_always_total_max(value in -10.0f64..10.0, max in 1u32..10) {
                prop_assert_eq!(rating_stars(value, max).chars().count(), max as usize);
            }
        }
    }
}
