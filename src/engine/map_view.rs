use crate::api::{DynMapEngine, Popup, TileLayer, ViewOptions};
use crate::entities::{Coordinates, PlaceRecord};
use crate::error::Error;

use super::{FormController, PlaceStore};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
}

/// Owns the map collaborator and the current view. The map only exists once a
/// position is known; until then every request is dropped.
pub struct MapController {
    engine: DynMapEngine,
    zoom: u8,
    tile_layer: TileLayer,
    view: Option<MapView>,
}

impl MapController {
    pub fn new(engine: DynMapEngine, zoom: u8, tile_layer: TileLayer) -> Self {
        Self {
            engine,
            zoom,
            tile_layer,
            view: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.view.is_some()
    }

    pub fn view(&self) -> Option<MapView> {
        self.view
    }

    /// Creates the map around `position` and places a marker for every place
    /// restored before the map existed. A map that already exists is kept.
    #[tracing::instrument(skip(self, places))]
    pub fn init(&mut self, position: Coordinates, places: &[PlaceRecord]) -> Result<(), Error> {
        if self.is_ready() {
            tracing::warn!("map already initialized");
            return Ok(());
        }

        self.engine.create_map(position, self.zoom)?;
        self.engine.add_tile_layer(&self.tile_layer)?;
        self.view = Some(MapView {
            center: position,
            zoom: self.zoom,
        });

        for place in places {
            self.place_marker(place)?;
        }

        if !places.is_empty() {
            self.set_view(position, ViewOptions::default())?;
        }

        tracing::info!("map ready with {} restored marker(s)", places.len());
        Ok(())
    }

    /// Forwards a map click to the form. Returns false when there is no map to
    /// click on.
    #[tracing::instrument(skip(self, form))]
    pub fn on_click(&self, coords: Coordinates, form: &mut FormController) -> bool {
        if !self.is_ready() {
            tracing::warn!("ignoring click, map not initialized");
            return false;
        }

        form.show(coords);
        true
    }

    #[tracing::instrument(skip(self, record), fields(id = record.id()))]
    pub fn place_marker(&mut self, record: &PlaceRecord) -> Result<(), Error> {
        if !self.is_ready() {
            tracing::debug!("no map yet, marker not placed");
            return Ok(());
        }

        self.engine.add_marker(record.coords(), popup_for(record))
    }

    /// Pans to the place with `id`. Unknown ids and a missing map are ignored.
    #[tracing::instrument(skip(self, store))]
    pub fn select(&mut self, id: &str, store: &PlaceStore) -> Result<bool, Error> {
        if !self.is_ready() {
            return Ok(false);
        }

        let Some(place) = store.find(id) else {
            tracing::debug!("no place with that id");
            return Ok(false);
        };

        self.set_view(place.coords(), ViewOptions { animate: true })?;
        Ok(true)
    }

    /// Replaces the previous search markers with one per candidate.
    #[tracing::instrument(skip(self, candidates), fields(count = candidates.len()))]
    pub fn show_search_results(&mut self, candidates: &[Coordinates]) -> Result<(), Error> {
        if !self.is_ready() {
            return Ok(());
        }

        self.engine.clear_search_results()?;

        for candidate in candidates.iter().rev() {
            self.engine.add_search_result(*candidate)?;
        }

        Ok(())
    }

    pub fn teardown(&mut self) {
        if self.view.take().is_some() {
            self.engine.destroy();
        }
    }

    fn set_view(&mut self, center: Coordinates, options: ViewOptions) -> Result<(), Error> {
        self.engine.set_view(center, self.zoom, options)?;
        self.view = Some(MapView {
            center,
            zoom: self.zoom,
        });

        Ok(())
    }
}

pub fn popup_for(record: &PlaceRecord) -> Popup {
    let kind = record.kind();

    Popup {
        content: format!("{} {}", kind.icon(), record.description()),
        class_name: format!("{}-popup", kind),
        max_width: 250,
        min_width: 100,
        auto_close: false,
        close_on_click: false,
    }
}
