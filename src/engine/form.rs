use std::time::Duration;

use async_channel::Sender;
use chrono::{DateTime, Utc};

use crate::entities::{Coordinates, FormFields, PlaceRecord, ValidationPolicy};
use crate::error::{no_location_error, Error};
use crate::events::Event;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormState {
    Hidden,
    Visible,
}

/// Visibility of the input form and the conversion of its raw fields into a
/// validated place.
#[derive(Debug)]
pub struct FormController {
    state: FormState,
    fields: FormFields,
    pending: Option<Coordinates>,
    city_focused: bool,
    /// Layout level hiding applied on top of `Hidden`, lifted by the re-show
    /// timer.
    display_suppressed: bool,
    reshow_delay: Duration,
    policy: ValidationPolicy,
    events: Sender<Event>,
}

impl FormController {
    pub fn new(reshow_delay: Duration, policy: ValidationPolicy, events: Sender<Event>) -> Self {
        Self {
            state: FormState::Hidden,
            fields: FormFields::default(),
            pending: None,
            city_focused: false,
            display_suppressed: false,
            reshow_delay,
            policy,
            events,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn pending(&self) -> Option<Coordinates> {
        self.pending
    }

    pub fn is_city_focused(&self) -> bool {
        self.city_focused
    }

    pub fn is_display_suppressed(&self) -> bool {
        self.display_suppressed
    }

    /// Opens the form for a map click. Clicking again while it is open only
    /// moves the pending coordinates.
    #[tracing::instrument(skip(self))]
    pub fn show(&mut self, coords: Coordinates) {
        self.pending = Some(coords);
        self.state = FormState::Visible;
        self.city_focused = true;
    }

    pub fn set_fields(&mut self, fields: FormFields) {
        self.fields = fields;
    }

    /// Validates the current field values against the pending coordinates.
    /// Nothing changes on failure; the form stays open.
    #[tracing::instrument(skip(self))]
    pub fn submit(&self, now: DateTime<Utc>) -> Result<PlaceRecord, Error> {
        let coords = match (self.state, self.pending) {
            (FormState::Visible, Some(coords)) => coords,
            _ => {
                tracing::warn!("submit without a pending map click");
                return Err(no_location_error());
            }
        };

        PlaceRecord::create(&self.fields, coords, now, self.policy)
    }

    /// Clears the inputs and hides the form. The layout suppression is lifted
    /// later through `Event::RestoreFormDisplay`.
    #[tracing::instrument(skip(self))]
    pub fn hide(&mut self) {
        self.fields = FormFields::default();
        self.pending = None;
        self.state = FormState::Hidden;
        self.city_focused = false;
        self.display_suppressed = true;

        self.schedule_restore();
    }

    pub fn restore_display(&mut self) {
        self.display_suppressed = false;
    }

    pub fn reset(&mut self) {
        self.fields = FormFields::default();
        self.pending = None;
        self.state = FormState::Hidden;
        self.city_focused = false;
        self.display_suppressed = false;
    }

    fn schedule_restore(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no runtime to schedule the form re-show, restoring now");
            if let Err(err) = self.events.try_send(Event::RestoreFormDisplay) {
                tracing::warn!("could not queue form re-show: {}", err);
            }
            return;
        };

        let delay = self.reshow_delay;
        let events = self.events.clone();

        runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            if events.send(Event::RestoreFormDisplay).await.is_err() {
                tracing::debug!("event queue closed before the form re-show fired");
            }
        });
    }
}
