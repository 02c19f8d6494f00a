mod console;
mod geolocation;
mod headless_map;

pub use console::ConsoleNotifier;
pub use geolocation::FixedPosition;
pub use headless_map::{HeadlessMap, MapState, PlacedMarker};
