use async_trait::async_trait;

use crate::api::Geolocation;
use crate::entities::Coordinates;
use crate::error::{geolocation_error, Error};

/// Location service answering with a preconfigured position. Without one it
/// behaves like a denied permission prompt.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedPosition {
    position: Option<Coordinates>,
}

impl FixedPosition {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Geolocation for FixedPosition {
    #[tracing::instrument(skip(self))]
    async fn current_position(&self) -> Result<Coordinates, Error> {
        self.position.ok_or_else(|| {
            tracing::warn!("location unavailable");
            geolocation_error()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn answers_with_configured_position() {
        let position = Coordinates::new(45.07, 7.68);

        let found = assert_ok!(FixedPosition::new(Some(position)).current_position().await);
        assert_eq!(found, position);

        let err = assert_err!(FixedPosition::default().current_position().await);
        assert_eq!(err, geolocation_error());
    }
}
