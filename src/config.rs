use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::api::TileLayer;
use crate::entities::{Coordinates, ValidationPolicy};
use crate::error::{config_error, Error};

pub const DEFAULT_STORAGE_KEY: &str = "places";
pub const DEFAULT_ZOOM: u8 = 13;
pub const DEFAULT_FORM_RESHOW: Duration = Duration::from_millis(1000);

#[derive(Clone, Debug)]
pub struct Config {
    pub storage_path: PathBuf,
    pub storage_key: String,
    pub zoom: u8,
    pub tile_layer: TileLayer,
    pub form_reshow_delay: Duration,
    pub validation: ValidationPolicy,
    /// Position reported by the geolocation provider. `None` behaves like a
    /// user who denied the location prompt.
    pub position: Option<Coordinates>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("placemark.json"),
            storage_key: DEFAULT_STORAGE_KEY.into(),
            zoom: DEFAULT_ZOOM,
            tile_layer: TileLayer::default(),
            form_reshow_delay: DEFAULT_FORM_RESHOW,
            validation: ValidationPolicy::default(),
            position: None,
        }
    }
}

impl Config {
    #[tracing::instrument(name = "Config::from_env")]
    pub fn from_env() -> Result<Self, Error> {
        if let Err(err) = dotenv::dotenv() {
            tracing::debug!("no .env file loaded: {}", err);
        }

        let defaults = Self::default();

        let tile_layer = TileLayer {
            url_template: optional_var("PLACEMARK_TILE_URL")?
                .unwrap_or(defaults.tile_layer.url_template),
            attribution: optional_var("PLACEMARK_TILE_ATTRIBUTION")?
                .unwrap_or(defaults.tile_layer.attribution),
        };

        let position = match optional_var("PLACEMARK_POSITION")? {
            Some(raw) => Some(parse_position(&raw).ok_or_else(|| config_error("PLACEMARK_POSITION"))?),
            None => None,
        };

        Ok(Self {
            storage_path: optional_var("PLACEMARK_STORAGE_PATH")?
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            storage_key: optional_var("PLACEMARK_STORAGE_KEY")?.unwrap_or(defaults.storage_key),
            zoom: parsed_var("PLACEMARK_ZOOM")?.unwrap_or(defaults.zoom),
            tile_layer,
            form_reshow_delay: parsed_var("PLACEMARK_FORM_RESHOW_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.form_reshow_delay),
            validation: ValidationPolicy {
                enforce_positive_height: parsed_var("PLACEMARK_ENFORCE_POSITIVE_HEIGHT")?
                    .unwrap_or(false),
            },
            position,
        })
    }
}

fn optional_var(name: &str) -> Result<Option<String>, Error> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn parsed_var<T: FromStr>(name: &str) -> Result<Option<T>, Error> {
    match optional_var(name)? {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| config_error(name)),
        None => Ok(None),
    }
}

/// Parses `"lat,lng"`.
pub fn parse_position(raw: &str) -> Option<Coordinates> {
    let (lat, lng) = raw.split_once(',')?;
    let latitude = lat.trim().parse().ok()?;
    let longitude = lng.trim().parse().ok()?;

    Some(Coordinates::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positions() {
        assert_eq!(
            parse_position("45.07, 7.68"),
            Some(Coordinates::new(45.07, 7.68))
        );
        assert_eq!(parse_position("45.07"), None);
        assert_eq!(parse_position("north,7"), None);
    }

    #[test]
    fn default_config() {
        let config = Config::default();

        assert_eq!(config.zoom, 13);
        assert_eq!(config.storage_key, "places");
        assert_eq!(config.form_reshow_delay, Duration::from_millis(1000));
        assert!(!config.validation.enforce_positive_height);
        assert!(config.position.is_none());
    }
}
