pub mod auth;
pub mod comment;
pub mod interaction;
pub mod message;
pub mod notification;
pub mod post;
pub mod story;
pub mod user;

use crate::{
    model::{
        auth::InvalidAuthTokenHashError,
        post::{InvalidCaptionError, InvalidMediaError},
        user::InvalidUserHandleError,
    },
    snowflake::{Epoch, Snowflake, SnowflakeGenerator},
    util::NonPositiveDurationError,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData, str::FromStr};
use thiserror::Error;
use time::{OffsetDateTime, macros::datetime};

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    UserHandle(#[from] InvalidUserHandleError),
    #[error(transparent)]
    NonPositiveDuration(#[from] NonPositiveDurationError),
    #[error(transparent)]
    TokenHash(#[from] InvalidAuthTokenHashError),
    #[error(transparent)]
    Caption(#[from] InvalidCaptionError),
    #[error(transparent)]
    Media(#[from] InvalidMediaError),
    #[error("Unknown {kind} value: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PinholeEpoch;
impl Epoch for PinholeEpoch {
    const EPOCH_TIME: OffsetDateTime = datetime!(2025-01-01 00:00 UTC);
}

pub type PinholeSnowflake = Snowflake<PinholeEpoch>;
pub type PinholeSnowflakeGenerator = SnowflakeGenerator<PinholeEpoch>;

/// An entity id, tagged with the kind of entity it points at.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(PinholeSnowflake, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(snowflake: PinholeSnowflake) -> Self {
        Self(snowflake, PhantomData)
    }

    #[must_use]
    pub fn snowflake(self) -> PinholeSnowflake {
        self.0
    }

    /// The id as stored in a signed BIGINT column.
    #[must_use]
    pub fn to_db(self) -> i64 {
        self.0.get().cast_signed()
    }

    #[must_use]
    pub fn from_db(value: i64) -> Self {
        value.cast_unsigned().into()
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> FromStr for Id<Marker> {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str(s).map(Self::from)
    }
}

impl<Marker> From<PinholeSnowflake> for Id<Marker> {
    fn from(value: PinholeSnowflake) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for PinholeSnowflake {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Id::new(PinholeSnowflake::new(value))
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.snowflake().get()
    }
}

/// Converts a slice of ids into the representation bound to `= ANY($n)`.
#[must_use]
pub fn ids_to_db<Marker>(ids: &[Id<Marker>]) -> Vec<i64> {
    ids.iter().map(|id| id.0.get().cast_signed()).collect()
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, ids_to_db, user::UserMarker};

    #[test]
    fn id_round_trips_through_signed_column() {
        let id = Id::<UserMarker>::from(u64::MAX - 7);
        assert_eq!(Id::<UserMarker>::from_db(id.to_db()), id);
    }

    #[test]
    fn id_parses_from_path_segment() {
        assert_eq!("42".parse::<Id<UserMarker>>(), Ok(Id::from(42_u64)));
        assert!("abc".parse::<Id<UserMarker>>().is_err());
    }

    struct UncopyableMarker;

    #[test]
    fn id_slices_convert_for_any_marker() {
        let ids = [
            Id::<UncopyableMarker>::from(1_u64),
            Id::<UncopyableMarker>::from(u64::MAX),
        ];
        assert_eq!(ids_to_db(&ids), vec![1, -1]);
    }
}
