use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio_test::assert_ok;

use placemark::api::KeyValueStore;
use placemark::config::Config;
use placemark::db::MemoryStorage;
use placemark::engine::{App, ClickTarget, Collaborators, Element, Flow, FormState};
use placemark::entities::{Coordinates, FormFields, Kind, PlaceRecord, ValidationPolicy};
use placemark::events::{Event, EventQueue};
use placemark::external::{ConsoleNotifier, FixedPosition, HeadlessMap};

struct Harness {
    app: App,
    queue: EventQueue,
    storage: MemoryStorage,
    map: HeadlessMap,
    notifier: ConsoleNotifier,
}

fn config() -> Config {
    Config {
        form_reshow_delay: Duration::from_millis(5),
        ..Config::default()
    }
}

fn harness(storage: MemoryStorage, position: Option<Coordinates>) -> Harness {
    let map = HeadlessMap::new();
    let notifier = ConsoleNotifier::quiet();
    let queue = EventQueue::new();

    let collaborators = Collaborators {
        storage: Box::new(storage.clone()),
        map: Box::new(map.clone()),
        geolocation: Arc::new(FixedPosition::new(position)),
        notifier: Box::new(notifier.clone()),
    };

    Harness {
        app: App::new(&config(), collaborators, queue.clone()),
        queue,
        storage,
        map,
        notifier,
    }
}

impl Harness {
    /// Runs startup up to and including the geolocation answer.
    async fn boot(&mut self) {
        self.app.start();

        loop {
            let event = self.queue.next().await.expect("queue closed");
            let resolved = matches!(event, Event::PositionResolved { .. });
            self.app.handle(event);

            if resolved {
                break;
            }
        }
    }

    async fn create(&mut self, at: Coordinates, fields: FormFields) -> Option<PlaceRecord> {
        // keeps timestamp derived ids apart
        tokio::time::sleep(Duration::from_millis(2)).await;

        self.app.handle(Event::MapClick(at));
        self.app.submit(fields)
    }

    fn persisted(&self) -> Option<Vec<PlaceRecord>> {
        self.storage
            .get("places")
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    fn visible_cities(&self) -> Vec<String> {
        self.app
            .list()
            .entries()
            .iter()
            .map(|entry| entry.details[0].value.clone())
            .collect()
    }
}

fn fields(kind: &str, city: &str, name: &str, height: &str) -> FormFields {
    FormFields {
        kind: kind.into(),
        city: city.into(),
        name: name.into(),
        height: height.into(),
    }
}

fn seeded_storage(places: &[PlaceRecord]) -> MemoryStorage {
    let mut storage = MemoryStorage::new();
    storage
        .set("places", &serde_json::to_string(places).unwrap())
        .unwrap();
    storage
}

fn seeded_place(kind: &str, city: &str, millis: i64, coords: Coordinates) -> PlaceRecord {
    PlaceRecord::create(
        &fields(kind, city, "Seeded", "1000"),
        coords,
        Utc.timestamp_millis_opt(millis).unwrap(),
        ValidationPolicy::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn click_then_submit_creates_and_persists_one_place() {
    let mut h = harness(MemoryStorage::new(), Some(Coordinates::new(39.7, -105.0)));
    h.boot().await;

    let place = h
        .create(
            Coordinates::new(40.0, -75.0),
            fields("mountain", "Denver", "Rocky Ridge", "1400"),
        )
        .await
        .expect("place should be created");

    assert_eq!(place.coords(), Coordinates::new(40.0, -75.0));
    assert_eq!(place.kind(), Kind::Mountain);
    assert_eq!(place.height(), Some("1400"));
    assert!(place.description().contains("Mountain in Denver"));

    assert_eq!(h.persisted(), Some(vec![place.clone()]));
    assert_eq!(h.app.store().places(), &[place.clone()]);

    let markers = h.map.snapshot().markers;
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].coords, Coordinates::new(40.0, -75.0));
    assert!(markers[0].popup.content.starts_with("🏔️ Mountain in Denver"));
    assert!(markers[0].popup_open);

    assert_eq!(h.app.form().state(), FormState::Hidden);
    assert_eq!(h.app.form().fields(), &FormFields::default());
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn incomplete_mountain_is_rejected_without_mutation() {
    let mut h = harness(MemoryStorage::new(), Some(Coordinates::new(0.0, 0.0)));
    h.boot().await;

    let created = h
        .create(
            Coordinates::new(1.0, 1.0),
            fields("mountain", "Denver", "Rocky Ridge", ""),
        )
        .await;

    assert!(created.is_none());
    assert!(h.app.store().is_empty());
    assert_eq!(h.persisted(), None);
    assert!(h.app.list().entries().is_empty());
    assert_eq!(h.app.form().state(), FormState::Visible);
    assert_eq!(h.notifier.messages(), vec!["Complete all fields!".to_string()]);
}

#[tokio::test]
async fn other_is_accepted_whatever_the_height() {
    let mut h = harness(MemoryStorage::new(), Some(Coordinates::new(0.0, 0.0)));
    h.boot().await;

    for height in ["", "-40", "tall"] {
        let place = h
            .create(Coordinates::new(2.0, 2.0), fields("other", "Turin", "Mole", height))
            .await;
        assert_eq!(place.unwrap().height(), None);
    }

    assert_eq!(h.app.store().len(), 3);
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn newest_place_is_listed_first_live_and_after_restore() {
    let storage = MemoryStorage::new();
    let mut h = harness(storage.clone(), Some(Coordinates::new(0.0, 0.0)));
    h.boot().await;

    for city in ["A", "B", "C"] {
        assert!(h
            .create(Coordinates::new(1.0, 1.0), fields("other", city, "x", ""))
            .await
            .is_some());
    }
    assert_eq!(h.visible_cities(), vec!["C", "B", "A"]);

    let mut reopened = harness(storage, None);
    reopened.boot().await;
    assert_eq!(reopened.visible_cities(), vec!["C", "B", "A"]);
}

#[tokio::test]
async fn restore_reproduces_descriptions_verbatim() {
    let mut place = serde_json::to_value(seeded_place(
        "mountain",
        "Zermatt",
        1_600_000_000_000,
        Coordinates::new(46.0, 7.7),
    ))
    .unwrap();
    place["description"] = "hand written text".into();

    let mut storage = MemoryStorage::new();
    storage
        .set("places", &serde_json::Value::Array(vec![place]).to_string())
        .unwrap();

    let mut h = harness(storage, Some(Coordinates::new(46.0, 7.7)));
    h.boot().await;

    assert_eq!(h.app.store().places()[0].description(), "hand written text");
    assert_eq!(h.app.list().entries()[0].title, "hand written text");
    assert_eq!(h.map.snapshot().markers[0].popup.content, "🏔️ hand written text");
}

#[tokio::test]
async fn restored_markers_wait_for_the_map() {
    let places = vec![
        seeded_place("mountain", "Aosta", 1_600_000_000_000, Coordinates::new(45.7, 7.3)),
        seeded_place("other", "Turin", 1_600_000_000_001, Coordinates::new(45.0, 7.6)),
    ];
    let mut h = harness(seeded_storage(&places), Some(Coordinates::new(45.0, 7.0)));

    h.app.start();
    assert_eq!(h.app.list().entries().len(), 2);
    assert!(h.map.snapshot().markers.is_empty());

    let event = h.queue.next().await.unwrap();
    assert!(matches!(event, Event::PositionResolved { position: Ok(_), .. }));
    h.app.handle(event);

    let state = h.map.snapshot();
    assert_eq!(state.markers.len(), 2);
    assert_eq!(state.center, Some(Coordinates::new(45.0, 7.0).into()));
}

#[tokio::test]
async fn denied_location_leaves_list_without_map() {
    let places = vec![seeded_place(
        "other",
        "Turin",
        1_600_000_000_000,
        Coordinates::new(45.0, 7.6),
    )];
    let mut h = harness(seeded_storage(&places), None);
    h.boot().await;

    assert_eq!(h.notifier.messages(), vec!["Could not get your position".to_string()]);
    assert!(!h.app.map().is_ready());
    assert_eq!(h.app.list().entries().len(), 1);
    assert!(h.map.snapshot().markers.is_empty());

    h.app.handle(Event::MapClick(Coordinates::new(1.0, 1.0)));
    assert_eq!(h.app.form().state(), FormState::Hidden);

    h.app.handle(Event::SelectRow(0));
    assert!(h.app.map().view().is_none());
}

#[tokio::test]
async fn malformed_storage_starts_empty_and_quietly() {
    let mut storage = MemoryStorage::new();
    storage.set("places", "[{\"broken\": tru").unwrap();

    let mut h = harness(storage, Some(Coordinates::new(0.0, 0.0)));
    h.boot().await;

    assert!(h.app.store().is_empty());
    assert!(h.app.list().entries().is_empty());
    assert!(h.app.map().is_ready());
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn selecting_an_entry_recenters_the_map() {
    let places = vec![
        seeded_place("mountain", "Aosta", 1_234_567_890, Coordinates::new(45.0, 7.0)),
        seeded_place("other", "Rome", 1_234_567_999, Coordinates::new(41.9, 12.5)),
    ];
    let mut h = harness(seeded_storage(&places), Some(Coordinates::new(0.0, 0.0)));
    h.boot().await;

    let target = ClickTarget {
        path: vec![
            Element::with_class("place__value"),
            Element {
                classes: vec!["place".into(), "place--mountain".into()],
                data_id: Some("1234567890".into()),
            },
        ],
    };
    h.app.handle(Event::ListClick(target));

    let view = h.app.map().view().unwrap();
    assert_eq!(view.center, Coordinates::new(45.0, 7.0));
    assert_eq!(view.zoom, 13);
    assert!(h.map.snapshot().last_view_animated);

    // row 0 is the most recently created place
    h.app.handle(Event::SelectRow(0));
    assert_eq!(h.app.map().view().unwrap().center, Coordinates::new(41.9, 12.5));

    let stale = ClickTarget {
        path: vec![Element {
            classes: vec!["place".into()],
            data_id: Some("9999999999".into()),
        }],
    };
    h.app.handle(Event::ListClick(stale));
    h.app.handle(Event::ListClick(ClickTarget::default()));
    assert_eq!(h.app.map().view().unwrap().center, Coordinates::new(41.9, 12.5));
}

#[tokio::test]
async fn reset_clears_everything_and_reloads() {
    let mut h = harness(MemoryStorage::new(), Some(Coordinates::new(0.0, 0.0)));
    h.boot().await;
    assert!(h
        .create(Coordinates::new(1.0, 1.0), fields("other", "Turin", "Mole", ""))
        .await
        .is_some());

    h.app.handle(Event::Reset);

    assert_eq!(h.persisted(), None);
    assert!(h.app.store().is_empty());
    assert!(h.app.list().entries().is_empty());
    assert!(!h.app.map().is_ready());

    loop {
        let event = h.queue.next().await.unwrap();
        let resolved = matches!(event, Event::PositionResolved { .. });
        h.app.handle(event);
        if resolved {
            break;
        }
    }

    assert!(h.app.map().is_ready());
    assert!(h.map.snapshot().markers.is_empty());
}

#[tokio::test]
async fn form_display_comes_back_after_submit() {
    let mut h = harness(MemoryStorage::new(), Some(Coordinates::new(0.0, 0.0)));
    h.boot().await;
    assert!(h
        .create(Coordinates::new(1.0, 1.0), fields("other", "Turin", "Mole", ""))
        .await
        .is_some());
    assert!(h.app.form().is_display_suppressed());

    let event = h.queue.next().await.unwrap();
    assert!(matches!(event, Event::RestoreFormDisplay));
    h.app.handle(event);

    assert!(!h.app.form().is_display_suppressed());
    assert_eq!(h.app.form().state(), FormState::Hidden);
}

#[tokio::test]
async fn run_stops_on_shutdown() {
    let mut h = harness(MemoryStorage::new(), None);

    assert_ok!(h.queue.post(Event::MapClick(Coordinates::new(1.0, 1.0))));
    assert_ok!(h.queue.post(Event::Shutdown));
    assert_ok!(h.queue.post(Event::Reset));

    let mut printed = Vec::new();
    h.app.run(|text| printed.push(text)).await;

    assert!(printed.is_empty());
    assert!(matches!(h.queue.try_next(), Some(Event::Reset)));
}

#[tokio::test]
async fn run_hands_the_list_to_the_caller() {
    let places = vec![seeded_place(
        "other",
        "Turin",
        1_600_000_000_000,
        Coordinates::new(45.0, 7.6),
    )];
    let mut h = harness(seeded_storage(&places), None);
    h.app.start();

    assert_ok!(h.queue.post(Event::ShowList));
    assert_ok!(h.queue.post(Event::Shutdown));

    let mut printed = Vec::new();
    h.app.run(|text| printed.push(text)).await;

    assert_eq!(printed.len(), 1);
    assert!(printed[0].contains("Turin"));
    let flow = h.app.handle(Event::ShowList);
    assert_eq!(flow, Flow::Output(h.app.list().to_string()));
}

#[tokio::test]
async fn reset_before_the_position_arrives_builds_one_map() {
    let places = vec![seeded_place(
        "mountain",
        "Aosta",
        1_600_000_000_000,
        Coordinates::new(45.7, 7.3),
    )];
    let mut h = harness(seeded_storage(&places), Some(Coordinates::new(45.0, 7.0)));

    h.app.start();
    h.app.handle(Event::Reset);

    // the answer to the first start is outdated by now
    h.app.handle(Event::PositionResolved {
        generation: 1,
        position: Ok(Coordinates::new(10.0, 10.0)),
    });
    assert!(!h.app.map().is_ready());

    let mut resolved = 0;
    while resolved < 2 {
        let event = h.queue.next().await.unwrap();
        if matches!(event, Event::PositionResolved { .. }) {
            resolved += 1;
        }
        h.app.handle(event);
    }

    assert!(h.app.map().is_ready());
    assert_eq!(h.app.map().view().unwrap().center, Coordinates::new(45.0, 7.0));
    assert!(h.map.snapshot().markers.is_empty());

    let place = h
        .create(Coordinates::new(1.0, 1.0), fields("other", "Turin", "Mole", ""))
        .await
        .expect("place should be created");
    assert_eq!(h.map.snapshot().markers.len(), 1);
    assert_eq!(h.map.snapshot().markers[0].coords, place.coords());
}

#[test]
fn start_without_a_runtime_restores_the_list_only() {
    let places = vec![seeded_place(
        "other",
        "Turin",
        1_600_000_000_000,
        Coordinates::new(45.0, 7.6),
    )];
    let mut h = harness(seeded_storage(&places), Some(Coordinates::new(45.0, 7.0)));

    h.app.start();

    assert_eq!(h.visible_cities(), vec!["Turin"]);
    assert!(!h.app.map().is_ready());
    assert!(h.queue.try_next().is_none());
    assert!(h.notifier.messages().is_empty());
}
