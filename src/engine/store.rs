use crate::api::DynKeyValueStore;
use crate::entities::PlaceRecord;
use crate::error::Error;

/// Ordered places plus their persisted copy under a single key.
pub struct PlaceStore {
    key: String,
    storage: DynKeyValueStore,
    places: Vec<PlaceRecord>,
}

impl PlaceStore {
    pub fn new(storage: DynKeyValueStore, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            storage,
            places: Vec::new(),
        }
    }

    pub fn places(&self) -> &[PlaceRecord] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&PlaceRecord> {
        self.places.iter().find(|place| place.id() == id)
    }

    /// Appends and writes through. When the write fails the record stays in
    /// memory and the error is returned.
    #[tracing::instrument(skip(self, record), fields(id = record.id()))]
    pub fn add(&mut self, record: PlaceRecord) -> Result<(), Error> {
        self.places.push(record);
        self.persist()
    }

    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn persist(&mut self) -> Result<(), Error> {
        let value = serde_json::to_string(&self.places)?;

        self.storage.set(&self.key, &value).map_err(|err| {
            tracing::error!("failed to persist places: {}", err);
            err
        })?;

        tracing::debug!("persisted {} place(s)", self.places.len());
        Ok(())
    }

    /// Loads the persisted sequence, replacing whatever is in memory.
    ///
    /// A missing key or a stored `null` means no data yet. A value that cannot
    /// be read back as a list of places is reported and treated the same way,
    /// so startup goes on with an empty store.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn restore(&mut self) -> &[PlaceRecord] {
        self.places = match self.storage.get(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str::<Option<Vec<PlaceRecord>>>(&raw) {
                Ok(places) => places.unwrap_or_default(),
                Err(err) => {
                    tracing::error!("ignoring malformed persisted places: {}", err);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::error!("could not read persisted places: {}", err);
                Vec::new()
            }
        };

        tracing::info!("restored {} place(s)", self.places.len());
        &self.places
    }

    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn clear(&mut self) -> Result<(), Error> {
        self.places.clear();
        self.storage.remove(&self.key)
    }
}
