use std::sync::Arc;

use placemark::config::Config;
use placemark::db::FileStorage;
use placemark::engine::{App, Collaborators};
use placemark::events::{parse_command, Event, EventQueue};
use placemark::external::{ConsoleNotifier, FixedPosition, HeadlessMap};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), placemark::error::Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let storage = FileStorage::open(&config.storage_path)?;

    let collaborators = Collaborators {
        storage: Box::new(storage),
        map: Box::new(HeadlessMap::new()),
        geolocation: Arc::new(FixedPosition::new(config.position)),
        notifier: Box::new(ConsoleNotifier::new()),
    };

    let queue = EventQueue::new();
    let mut app = App::new(&config, collaborators, queue.clone());

    tokio::spawn(read_commands(queue));

    app.start();
    app.run(|text| println!("{}", text)).await;

    Ok(())
}

/// Feeds stdin lines into the event queue until input ends.
async fn read_commands(queue: EventQueue) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::error!("failed to read input: {}", err);
                break;
            }
        };

        match parse_command(&line) {
            Ok(Some(event)) => {
                if queue.post(event).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(err) => eprintln!("!! {}", err.message),
        }
    }

    if queue.post(Event::Shutdown).is_err() {
        tracing::debug!("app already stopped");
    }
}
