mod form;
mod list;
mod map_view;
mod store;

pub use form::{FormController, FormState};
pub use list::{ClickTarget, Detail, Element, ListEntry, ListRenderer};
pub use map_view::{popup_for, MapController, MapView};
pub use store::PlaceStore;

use chrono::Utc;

use crate::api::{DynGeolocation, DynKeyValueStore, DynMapEngine, DynNotifier};
use crate::config::Config;
use crate::entities::{Coordinates, FormFields, PlaceRecord};
use crate::error::Error;
use crate::events::{Event, EventQueue};

/// Collaborators the app is wired to.
pub struct Collaborators {
    pub storage: DynKeyValueStore,
    pub map: DynMapEngine,
    pub geolocation: DynGeolocation,
    pub notifier: DynNotifier,
}

/// What the caller should do after an event was applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    Continue,
    /// Text for the user, e.g. the rendered place list.
    Output(String),
    Shutdown,
}

/// Composition root. Owns the place store and every controller, and is the
/// only consumer of the event queue.
pub struct App {
    store: PlaceStore,
    form: FormController,
    map: MapController,
    list: ListRenderer,
    geolocation: DynGeolocation,
    notifier: DynNotifier,
    queue: EventQueue,
    /// Bumped by every `start`; position answers from an earlier start are
    /// dropped.
    generation: u64,
}

impl App {
    #[tracing::instrument(name = "App::new", skip_all)]
    pub fn new(config: &Config, collaborators: Collaborators, queue: EventQueue) -> Self {
        let Collaborators {
            storage,
            map,
            geolocation,
            notifier,
        } = collaborators;

        Self {
            store: PlaceStore::new(storage, config.storage_key.clone()),
            form: FormController::new(config.form_reshow_delay, config.validation, queue.sender()),
            map: MapController::new(map, config.zoom, config.tile_layer.clone()),
            list: ListRenderer::new(),
            geolocation,
            notifier,
            queue,
            generation: 0,
        }
    }

    pub fn store(&self) -> &PlaceStore {
        &self.store
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn map(&self) -> &MapController {
        &self.map
    }

    pub fn list(&self) -> &ListRenderer {
        &self.list
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Restores and renders persisted places, then asks for the current
    /// position. The answer comes back as `Event::PositionResolved`. Without a
    /// tokio runtime there is nobody to ask and the app stays without a map.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self) {
        for place in self.store.restore() {
            self.list.render_one(place);
        }

        self.generation += 1;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no runtime to request the position, continuing without a map");
            return;
        };

        let generation = self.generation;
        let geolocation = self.geolocation.clone();
        let events = self.queue.sender();

        runtime.spawn(async move {
            let position = geolocation.current_position().await;
            let event = Event::PositionResolved {
                generation,
                position,
            };

            if events.send(event).await.is_err() {
                tracing::debug!("event queue closed before the position arrived");
            }
        });
    }

    /// Processes events until the queue closes or a shutdown is requested.
    /// Text meant for the user is handed to `output`.
    #[tracing::instrument(skip(self, output))]
    pub async fn run<F: FnMut(String)>(&mut self, mut output: F) {
        while let Some(event) = self.queue.next().await {
            match self.handle(event) {
                Flow::Continue => {}
                Flow::Output(text) => output(text),
                Flow::Shutdown => break,
            }
        }

        tracing::info!("event loop stopped");
    }

    /// Applies one event.
    pub fn handle(&mut self, event: Event) -> Flow {
        tracing::debug!("handling {:?}", event);

        match event {
            Event::PositionResolved {
                generation,
                position,
            } => self.on_position(generation, position),
            Event::MapClick(coords) => {
                self.map.on_click(coords, &mut self.form);
            }
            Event::Submit(fields) => {
                self.submit(fields);
            }
            Event::ListClick(target) => self.on_list_click(&target),
            Event::SelectRow(row) => match self.list.target_at(row) {
                Some(target) => self.on_list_click(&target),
                None => tracing::debug!("no list entry at row {}", row),
            },
            Event::SearchResults(candidates) => {
                if let Err(err) = self.map.show_search_results(&candidates) {
                    tracing::error!("failed to show search results: {}", err);
                }
            }
            Event::RestoreFormDisplay => self.form.restore_display(),
            Event::ShowList => return Flow::Output(self.list.to_string()),
            Event::Reset => self.reset(),
            Event::Shutdown => return Flow::Shutdown,
        }

        Flow::Continue
    }

    #[tracing::instrument(skip(self))]
    fn on_position(&mut self, generation: u64, position: Result<Coordinates, Error>) {
        if generation != self.generation {
            tracing::debug!("dropping position from an earlier start");
            return;
        }

        match position {
            Ok(position) => {
                if let Err(err) = self.map.init(position, self.store.places()) {
                    tracing::error!("failed to initialize the map: {}", err);
                }
            }
            Err(err) => {
                tracing::warn!("continuing without a map: {}", err);
                self.notifier.alert(&err.message);
            }
        }
    }

    /// Reads the form, stores the new place and shows it. Validation failures
    /// are reported to the user and leave everything untouched.
    #[tracing::instrument(skip(self, fields))]
    pub fn submit(&mut self, fields: FormFields) -> Option<PlaceRecord> {
        self.form.set_fields(fields);

        let place = match self.form.submit(Utc::now()) {
            Ok(place) => place,
            Err(err) => {
                if err.is_user_facing() {
                    self.notifier.alert(&err.message);
                }
                return None;
            }
        };

        tracing::info!("created place {}", place.id());

        if let Err(err) = self.store.add(place.clone()) {
            tracing::error!("place {} kept in memory only: {}", place.id(), err);
        }

        if let Err(err) = self.map.place_marker(&place) {
            tracing::error!("failed to place marker: {}", err);
        }

        self.list.render_one(&place);
        self.form.hide();

        Some(place)
    }

    #[tracing::instrument(skip(self))]
    pub fn on_list_click(&mut self, target: &ClickTarget) {
        let Some(id) = self.list.select_by_element(target) else {
            return;
        };

        if let Err(err) = self.map.select(&id, &self.store) {
            tracing::error!("failed to move to place {}: {}", id, err);
        }
    }

    /// Drops every place, persisted or not, and starts over as if the page had
    /// been reloaded.
    #[tracing::instrument(skip(self))]
    pub fn reset(&mut self) {
        if let Err(err) = self.store.clear() {
            tracing::error!("failed to clear persisted places: {}", err);
        }

        self.list.clear();
        self.map.teardown();
        self.form.reset();

        self.start();
    }
}
