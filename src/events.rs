use async_channel::{Receiver, Sender};

use crate::config::parse_position;
use crate::engine::ClickTarget;
use crate::entities::{Coordinates, FormFields};
use crate::error::{invalid_command_error, unexpected_error, Error};

#[derive(Debug)]
pub enum Event {
    /// Outcome of the geolocation request made by the `generation`-th start.
    PositionResolved {
        generation: u64,
        position: Result<Coordinates, Error>,
    },
    MapClick(Coordinates),
    Submit(FormFields),
    ListClick(ClickTarget),
    /// A click on the n-th visible list entry, counted from the top.
    SelectRow(usize),
    /// Candidate points emitted by the address search control.
    SearchResults(Vec<Coordinates>),
    RestoreFormDisplay,
    ShowList,
    Reset,
    Shutdown,
}

/// The single UI event queue. Every producer posts here and only the app loop
/// consumes, so state transitions never interleave.
#[derive(Clone, Debug)]
pub struct EventQueue {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (sender, receiver) = async_channel::unbounded();

        Self { sender, receiver }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.sender.clone()
    }

    pub fn post(&self, event: Event) -> Result<(), Error> {
        self.sender.try_send(event).map_err(|err| {
            tracing::error!("event queue rejected {:?}", err.into_inner());
            unexpected_error()
        })
    }

    /// Waits for the next event; `None` once every sender is gone.
    pub async fn next(&self) -> Option<Event> {
        self.receiver.recv().await.ok()
    }

    pub fn try_next(&self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }

    pub fn close(&self) {
        self.sender.close();
    }
}

/// Turns one line of terminal input into an event.
///
/// ```text
/// click <lat> <lng>
/// submit <kind> <city> <name> [height]
/// select <row>
/// search <lat>,<lng> [<lat>,<lng> ...]
/// list | reset | quit
/// ```
///
/// Words may be double quoted to include spaces. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Event>, Error> {
    let words = split_words(line);
    let Some((command, args)) = words.split_first() else {
        return Ok(None);
    };

    let event = match (command.as_str(), args) {
        ("click", [lat, lng]) => {
            let latitude = lat.parse().map_err(|_| invalid_command_error(line))?;
            let longitude = lng.parse().map_err(|_| invalid_command_error(line))?;
            Event::MapClick(Coordinates::new(latitude, longitude))
        }
        ("submit", [kind, city, name, rest @ ..]) if rest.len() <= 1 => Event::Submit(FormFields {
            kind: kind.clone(),
            city: city.clone(),
            name: name.clone(),
            height: rest.first().cloned().unwrap_or_default(),
        }),
        ("select", [row]) => Event::SelectRow(row.parse().map_err(|_| invalid_command_error(line))?),
        ("search", points) if !points.is_empty() => Event::SearchResults(
            points
                .iter()
                .map(|point| parse_position(point).ok_or_else(|| invalid_command_error(line)))
                .collect::<Result<_, _>>()?,
        ),
        ("list", []) => Event::ShowList,
        ("reset", []) => Event::Reset,
        ("quit", []) | ("exit", []) => Event::Shutdown,
        _ => return Err(invalid_command_error(line)),
    };

    Ok(Some(event))
}

fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    words.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }

    if pending {
        words.push(current);
    }

    words
}
