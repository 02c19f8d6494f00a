mod location;
mod place;

pub use location::Coordinates;
pub use place::{FormFields, Kind, PlaceRecord, ValidationPolicy, Variant};
