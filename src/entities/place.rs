use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinates;
use crate::error::{invalid_input_error, invalid_kind_error, Error};

const ID_DIGITS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Mountain,
    Other,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mountain => "mountain",
            Self::Other => "other",
        }
    }

    /// Icon shown in front of the description inside a marker popup.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Mountain => "🏔️",
            Self::Other => "🌄",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Mountain => "Mountain",
            Self::Other => "Other",
        }
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mountain" => Ok(Self::Mountain),
            "other" => Ok(Self::Other),
            _ => Err(invalid_kind_error(s)),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Variant specific data. The `kind` tag is the only discriminator that
/// survives persistence, so every dispatch goes through it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variant {
    Mountain { height: String },
    Other,
}

impl Variant {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Mountain { height: _ } => Kind::Mountain,
            Self::Other => Kind::Other,
        }
    }
}

/// Raw values of the four form inputs, exactly as typed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormFields {
    pub kind: String,
    pub city: String,
    pub name: String,
    pub height: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ValidationPolicy {
    /// Require mountain heights to be a positive number. Off by default: only
    /// presence is checked.
    pub enforce_positive_height: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    date: DateTime<Utc>,
    id: String,
    coords: Coordinates,
    city: String,
    name: String,
    #[serde(flatten)]
    variant: Variant,
    description: String,
}

impl PlaceRecord {
    #[tracing::instrument(skip(policy))]
    pub fn create(
        fields: &FormFields,
        coords: Coordinates,
        now: DateTime<Utc>,
        policy: ValidationPolicy,
    ) -> Result<Self, Error> {
        let kind: Kind = fields.kind.parse()?;

        let variant = match kind {
            Kind::Mountain => {
                if !all_present(&[&fields.city, &fields.name, &fields.height]) {
                    return Err(invalid_input_error());
                }

                if policy.enforce_positive_height && !is_positive(&fields.height) {
                    return Err(invalid_input_error());
                }

                Variant::Mountain {
                    height: fields.height.clone(),
                }
            }
            Kind::Other => {
                if !all_present(&[&fields.city, &fields.name]) {
                    return Err(invalid_input_error());
                }

                Variant::Other
            }
        };

        let id = derive_id(now);
        let description = describe(&variant, &fields.city, &id);

        Ok(Self {
            date: now,
            id,
            coords,
            city: fields.city.clone(),
            name: fields.name.clone(),
            variant,
            description,
        })
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn coords(&self) -> Coordinates {
        self.coords
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.variant.kind()
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn height(&self) -> Option<&str> {
        match &self.variant {
            Variant::Mountain { height } => Some(height),
            Variant::Other => None,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

fn all_present(values: &[&String]) -> bool {
    values.iter().all(|value| !value.is_empty())
}

fn is_positive(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .map(|number| number.is_finite() && number > 0.0)
        .unwrap_or(false)
}

/// Last ten digits of the creation time in milliseconds. Two records created
/// within the same millisecond share an id.
fn derive_id(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().to_string();
    let start = millis.len().saturating_sub(ID_DIGITS);

    millis[start..].to_string()
}

fn describe(variant: &Variant, city: &str, id: &str) -> String {
    let height = match variant {
        Variant::Mountain { height } => height.as_str(),
        Variant::Other => "n/a",
    };

    format!(
        "{} in {}<br>⬆️ Above mean sea level: {}, {}",
        variant.kind().title(),
        city,
        height,
        id
    )
}
