use std::sync::{Arc, Mutex, MutexGuard};

use geo_types::Point;

use crate::api::{MapEngine, Popup, TileLayer, ViewOptions};
use crate::entities::Coordinates;
use crate::error::{invalid_state_error, unexpected_error, Error};

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedMarker {
    pub coords: Coordinates,
    pub popup: Popup,
    pub popup_open: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapState {
    pub center: Option<Point<f64>>,
    pub zoom: Option<u8>,
    pub tile_layer: Option<TileLayer>,
    pub markers: Vec<PlacedMarker>,
    pub search_results: Vec<Coordinates>,
    pub last_view_animated: bool,
}

/// Map engine without a screen: it logs every request and keeps the resulting
/// state. Clones observe the same map.
#[derive(Clone, Debug, Default)]
pub struct HeadlessMap {
    state: Arc<Mutex<MapState>>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MapState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MapState>, Error> {
        self.state.lock().map_err(|_| unexpected_error())
    }

    fn created(&self) -> Result<MutexGuard<'_, MapState>, Error> {
        let state = self.state()?;
        if state.center.is_none() {
            return Err(invalid_state_error());
        }

        Ok(state)
    }
}

impl MapEngine for HeadlessMap {
    fn create_map(&mut self, center: Coordinates, zoom: u8) -> Result<(), Error> {
        let mut state = self.state()?;
        if state.center.is_some() {
            return Err(invalid_state_error());
        }

        tracing::info!("map created at {:?}, zoom {}", center, zoom);
        state.center = Some(center.into());
        state.zoom = Some(zoom);
        Ok(())
    }

    fn add_tile_layer(&mut self, layer: &TileLayer) -> Result<(), Error> {
        self.created()?.tile_layer = Some(layer.clone());
        Ok(())
    }

    fn add_marker(&mut self, coords: Coordinates, popup: Popup) -> Result<(), Error> {
        tracing::info!("marker at {:?}: {}", coords, popup.content);

        self.created()?.markers.push(PlacedMarker {
            coords,
            popup,
            popup_open: true,
        });
        Ok(())
    }

    fn clear_search_results(&mut self) -> Result<(), Error> {
        self.created()?.search_results.clear();
        Ok(())
    }

    fn add_search_result(&mut self, coords: Coordinates) -> Result<(), Error> {
        tracing::debug!("search result at {:?}", coords);
        self.created()?.search_results.push(coords);
        Ok(())
    }

    fn set_view(
        &mut self,
        center: Coordinates,
        zoom: u8,
        options: ViewOptions,
    ) -> Result<(), Error> {
        let mut state = self.created()?;

        tracing::info!("view set to {:?}, zoom {}", center, zoom);
        state.center = Some(center.into());
        state.zoom = Some(zoom);
        state.last_view_animated = options.animate;
        Ok(())
    }

    fn destroy(&mut self) {
        if let Ok(mut state) = self.state() {
            *state = MapState::default();
        }
    }
}
