//! Image resolution cascade.
//!
//! Order: manual override, extracted primary image, curated player library. The first
//! qualifying hit wins; running out is a hard abort because visual quality gates publishing.

pub mod players;

use crate::error::PipelineError;

pub use players::{find_player, PlayerEntry, PLAYER_LIBRARY};

/// Substrings that mark logos, placeholders, tracking pixels and tiny thumbnails.
pub const JUNK_MARKERS: &[&str] = &[
    "logo",
    "placeholder",
    "icon",
    "avatar",
    "badge",
    "sprite",
    "espn_red",
    "pixel",
    "clear.gif",
    "tracking",
    "1x1",
    "16x16",
    "32x32",
    "50x50",
    "_thumb",
    "/thumb/",
];

pub const RASTER_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".avif"];

/// CDN resize/transform endpoints that serve rasters without a file extension.
pub const CDN_TRANSFORM_MARKERS: &[&str] = &[
    "/combiner/i?img=",
    "/image/upload/",
    "/image/fetch/",
    "/resize/",
    "?w=",
    "&w=",
    "width=",
    "im=resize",
    "format=jpg",
    "auto=format",
];

pub fn is_junk_image(url: &str) -> bool {
    let lower = url.to_lowercase();
    JUNK_MARKERS.iter().any(|m| lower.contains(m))
}

fn looks_like_raster(url: &str) -> bool {
    let lower = url.to_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    RASTER_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        || CDN_TRANSFORM_MARKERS.iter().any(|m| lower.contains(m))
}

/// Quality heuristic for a candidate image url. `strict` additionally requires a raster
/// extension or a known CDN transform pattern.
pub fn is_qualifying_image(url: &str, strict: bool) -> bool {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return false;
    }
    if is_junk_image(url) {
        return false;
    }
    !strict || looks_like_raster(url)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    ManualOverride,
    Extracted,
    PlayerLibrary { display_name: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
    pub source: ImageSource,
}

#[derive(Debug, Clone, Default)]
pub struct ImageRequest<'a> {
    pub manual_override: Option<&'a str>,
    /// Primary image from extraction (first of the extracted list).
    pub extracted_primary: Option<&'a str>,
    /// Titles tried against the player library, in order.
    pub titles: Vec<&'a str>,
    pub strict: bool,
}

pub fn resolve_image(req: &ImageRequest<'_>) -> Result<ResolvedImage, PipelineError> {
    if let Some(url) = req.manual_override {
        if is_qualifying_image(url, req.strict) {
            return Ok(ResolvedImage {
                url: url.trim().to_string(),
                source: ImageSource::ManualOverride,
            });
        }
        tracing::warn!(url, "manual image rejected by quality filter");
    }

    match req.extracted_primary {
        Some(url) if is_qualifying_image(url, req.strict) => {
            return Ok(ResolvedImage {
                url: url.trim().to_string(),
                source: ImageSource::Extracted,
            });
        }
        Some(url) => tracing::info!(url, "extracted image rejected, trying player library"),
        None => tracing::info!("no extracted image, trying player library"),
    }

    for title in &req.titles {
        if let Some(player) = find_player(title) {
            tracing::info!(player = player.display_name, "player library match");
            return Ok(ResolvedImage {
                url: player.image_url.to_string(),
                source: ImageSource::PlayerLibrary {
                    display_name: player.display_name,
                },
            });
        }
    }

    Err(PipelineError::NoQualifyingImage)
}
