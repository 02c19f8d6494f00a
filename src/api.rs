use async_trait::async_trait;

use crate::entities::Coordinates;
use crate::error::Error;

/// Tile source handed to the map engine once at creation.
#[derive(Clone, Debug, PartialEq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub content: String,
    pub class_name: String,
    pub max_width: u32,
    pub min_width: u32,
    pub auto_close: bool,
    pub close_on_click: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewOptions {
    pub animate: bool,
}

/// The map rendering engine. The core only issues rendering requests; click
/// delivery happens through the event queue.
pub trait MapEngine {
    fn create_map(&mut self, center: Coordinates, zoom: u8) -> Result<(), Error>;
    fn add_tile_layer(&mut self, layer: &TileLayer) -> Result<(), Error>;
    /// Adds a marker bound to `popup` and opens the popup right away.
    fn add_marker(&mut self, coords: Coordinates, popup: Popup) -> Result<(), Error>;
    fn clear_search_results(&mut self) -> Result<(), Error>;
    fn add_search_result(&mut self, coords: Coordinates) -> Result<(), Error>;
    fn set_view(&mut self, center: Coordinates, zoom: u8, options: ViewOptions)
        -> Result<(), Error>;
    /// Tears the map down together with every layer on it.
    fn destroy(&mut self);
}

#[async_trait]
pub trait Geolocation {
    async fn current_position(&self) -> Result<Coordinates, Error>;
}

/// Browser style local key/value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;
    fn remove(&mut self, key: &str) -> Result<(), Error>;
}

/// Blocking, user-visible notification.
pub trait Notifier {
    fn alert(&self, message: &str);
}

pub type DynMapEngine = Box<dyn MapEngine + Send>;
pub type DynGeolocation = std::sync::Arc<dyn Geolocation + Send + Sync>;
pub type DynKeyValueStore = Box<dyn KeyValueStore + Send>;
pub type DynNotifier = Box<dyn Notifier + Send>;
