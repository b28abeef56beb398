//! Tile URL templates with `{z}`, `{x}` and `{y}` placeholders.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::coord::TileId;

/// OpenStreetMap's public tile server.
pub const DEFAULT_TILE_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

const PLACEHOLDERS: [&str; 3] = ["{z}", "{x}", "{y}"];

/// Why a template was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("tile URL template {template:?} is missing the {placeholder} placeholder")]
    MissingPlaceholder {
        template: String,
        placeholder: &'static str,
    },

    #[error("tile URL template {template:?} does not render to a valid http(s) URL")]
    InvalidUrl { template: String },
}

/// A validated tile URL template.
///
/// ```
/// use tile_downloader::coord::TileId;
/// use tile_downloader::download::TileUrlTemplate;
///
/// let template: TileUrlTemplate = "https://tiles.example.com/{z}/{x}/{y}.png".parse().unwrap();
/// assert_eq!(
///     template.render(&TileId::new(6, 39, 24)),
///     "https://tiles.example.com/6/39/24.png"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUrlTemplate {
    template: String,
}

impl TileUrlTemplate {
    /// Validates `template`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if a placeholder is missing or the rendered URL
    /// is not an absolute http(s) URL.
    pub fn new(template: impl Into<String>) -> Result<Self, TemplateError> {
        let template = template.into();
        if let Some(placeholder) = PLACEHOLDERS.into_iter().find(|p| !template.contains(p)) {
            return Err(TemplateError::MissingPlaceholder {
                template,
                placeholder,
            });
        }

        let candidate = Self { template };
        let rendered = candidate.render(&TileId::new(0, 0, 0));
        match Url::parse(&rendered) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(candidate),
            _ => Err(TemplateError::InvalidUrl {
                template: candidate.template,
            }),
        }
    }

    /// URL of `tile`.
    #[must_use]
    pub fn render(&self, tile: &TileId) -> String {
        self.template
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

impl Default for TileUrlTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TILE_URL_TEMPLATE.to_string(),
        }
    }
}

impl FromStr for TileUrlTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for TileUrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_renders_osm_url() {
        let template = TileUrlTemplate::default();
        assert_eq!(
            template.render(&TileId::new(8, 158, 101)),
            "https://tile.openstreetmap.org/8/158/101.png"
        );
        assert_eq!(TileUrlTemplate::new(DEFAULT_TILE_URL_TEMPLATE).unwrap(), template);
    }

    #[test]
    fn test_placeholders_in_query_string() {
        let template = TileUrlTemplate::new("http://localhost:8080/tile?z={z}&x={x}&y={y}").unwrap();
        assert_eq!(
            template.render(&TileId::new(3, 4, 5)),
            "http://localhost:8080/tile?z=3&x=4&y=5"
        );
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let err = TileUrlTemplate::new("https://tiles.example.com/{z}/{x}.png").unwrap_err();
        assert!(matches!(
            err,
            TemplateError::MissingPlaceholder {
                placeholder: "{y}",
                ..
            }
        ));
    }

    #[test]
    fn test_non_http_template_rejected() {
        let err = TileUrlTemplate::new("file:///tmp/{z}/{x}/{y}.png").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidUrl { .. }));

        let err = TileUrlTemplate::new("tiles/{z}/{x}/{y}.png").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidUrl { .. }));
    }
}
