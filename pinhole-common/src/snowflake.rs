//! Snowflake ids: 42 bits of milliseconds since an epoch, 5 bits worker id,
//! 5 bits process id and a 12 bit rolling increment.
//!
//! See <https://discord.com/developers/docs/reference#snowflakes>

use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    marker::PhantomData,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

pub const TIMESTAMP_OFFSET: u32 = 22;
pub const TIMESTAMP_LENGTH: u32 = 42;
pub const WORKER_ID_OFFSET: u32 = 17;
pub const WORKER_ID_LENGTH: u32 = 5;
pub const PROCESS_ID_OFFSET: u32 = 12;
pub const PROCESS_ID_LENGTH: u32 = 5;
pub const INCREMENT_LENGTH: u32 = 12;

const fn mask(length: u32) -> u64 {
    (1 << length) - 1
}

pub trait Epoch {
    const EPOCH_TIME: OffsetDateTime;
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum SnowflakeTimestampError {
    #[error("Specified time was before the snowflake epoch.")]
    TimeBeforeEpoch,
    #[error("Resulting timestamp uses too many bits.")]
    TimestampTooLarge,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Snowflake part was out of range: {0}")]
pub struct SnowflakePartOutOfRangeError(u8);

/// Identifies the machine generating snowflakes.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct WorkerId(u8);

/// Identifies the process on a worker generating snowflakes.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct ProcessId(u8);

impl WorkerId {
    #[must_use]
    pub fn new(id: u8) -> Option<Self> {
        (u64::from(id) <= mask(WORKER_ID_LENGTH)).then_some(Self(id))
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl ProcessId {
    #[must_use]
    pub fn new(id: u8) -> Option<Self> {
        (u64::from(id) <= mask(PROCESS_ID_LENGTH)).then_some(Self(id))
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for WorkerId {
    type Error = SnowflakePartOutOfRangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(SnowflakePartOutOfRangeError(value))
    }
}

impl TryFrom<u8> for ProcessId {
    type Error = SnowflakePartOutOfRangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(SnowflakePartOutOfRangeError(value))
    }
}

impl From<WorkerId> for u8 {
    fn from(value: WorkerId) -> Self {
        value.0
    }
}

impl From<ProcessId> for u8 {
    fn from(value: ProcessId) -> Self {
        value.0
    }
}

#[derive_where(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Default,
    Hash,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct Snowflake<SnowflakeEpoch>(u64, #[serde(skip)] PhantomData<SnowflakeEpoch>);

impl<SnowflakeEpoch> Snowflake<SnowflakeEpoch> {
    #[must_use]
    pub fn new(inner: u64) -> Self {
        Self(inner, PhantomData)
    }

    #[must_use]
    pub fn from_parts(
        millis: u64,
        worker_id: WorkerId,
        process_id: ProcessId,
        increment: u16,
    ) -> Self {
        let snowflake = (millis & mask(TIMESTAMP_LENGTH)) << TIMESTAMP_OFFSET
            | u64::from(worker_id.get()) << WORKER_ID_OFFSET
            | u64::from(process_id.get()) << PROCESS_ID_OFFSET
            | u64::from(increment) & mask(INCREMENT_LENGTH);

        Self::new(snowflake)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Milliseconds since the epoch.
    #[must_use]
    pub fn millis(self) -> u64 {
        self.0 >> TIMESTAMP_OFFSET
    }

    #[must_use]
    pub fn worker_id(self) -> WorkerId {
        #[allow(clippy::cast_possible_truncation)]
        WorkerId(((self.0 >> WORKER_ID_OFFSET) & mask(WORKER_ID_LENGTH)) as u8)
    }

    #[must_use]
    pub fn process_id(self) -> ProcessId {
        #[allow(clippy::cast_possible_truncation)]
        ProcessId(((self.0 >> PROCESS_ID_OFFSET) & mask(PROCESS_ID_LENGTH)) as u8)
    }

    #[must_use]
    pub fn increment(self) -> u16 {
        #[allow(clippy::cast_possible_truncation)]
        let increment = (self.0 & mask(INCREMENT_LENGTH)) as u16;
        increment
    }

    #[must_use]
    pub fn created_at(self) -> OffsetDateTime
    where
        SnowflakeEpoch: Epoch,
    {
        #[allow(clippy::cast_possible_wrap)]
        let millis = self.millis() as i64;
        SnowflakeEpoch::EPOCH_TIME + Duration::milliseconds(millis)
    }
}

impl<SnowflakeEpoch> Display for Snowflake<SnowflakeEpoch> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<SnowflakeEpoch> From<u64> for Snowflake<SnowflakeEpoch> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<SnowflakeEpoch> From<Snowflake<SnowflakeEpoch>> for u64 {
    fn from(value: Snowflake<SnowflakeEpoch>) -> Self {
        value.get()
    }
}

pub fn millis_since_epoch<SnowflakeEpoch: Epoch>(
    time: OffsetDateTime,
) -> Result<u64, SnowflakeTimestampError> {
    let millis = (time - SnowflakeEpoch::EPOCH_TIME).whole_milliseconds();
    if millis < 0 {
        return Err(SnowflakeTimestampError::TimeBeforeEpoch);
    }
    u64::try_from(millis)
        .ok()
        .filter(|millis| *millis <= mask(TIMESTAMP_LENGTH))
        .ok_or(SnowflakeTimestampError::TimestampTooLarge)
}

#[derive_where(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct SnowflakeGenerator<SnowflakeEpoch> {
    worker_id: WorkerId,
    process_id: ProcessId,
    next_increment: u16,
    phantom_data: PhantomData<SnowflakeEpoch>,
}

impl<SnowflakeEpoch: Epoch> SnowflakeGenerator<SnowflakeEpoch> {
    #[must_use]
    pub fn new(worker_id: WorkerId, process_id: ProcessId) -> Self {
        Self {
            worker_id,
            process_id,
            next_increment: 0,
            phantom_data: PhantomData,
        }
    }

    /// Times before the epoch collapse onto the epoch itself.
    pub fn generate_at(&mut self, time: OffsetDateTime) -> Snowflake<SnowflakeEpoch> {
        let increment = self.next_increment;
        #[allow(clippy::cast_possible_truncation)]
        let next = ((u64::from(increment) + 1) & mask(INCREMENT_LENGTH)) as u16;
        self.next_increment = next;

        let millis = millis_since_epoch::<SnowflakeEpoch>(time).unwrap_or_default();
        Snowflake::from_parts(millis, self.worker_id, self.process_id, increment)
    }

    pub fn generate(&mut self) -> Snowflake<SnowflakeEpoch> {
        self.generate_at(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use crate::snowflake::{
        Epoch, ProcessId, Snowflake, SnowflakeGenerator, SnowflakeTimestampError, WorkerId,
        millis_since_epoch,
    };
    use time::{Duration, OffsetDateTime, macros::datetime};

    struct MillennialEpoch;
    impl Epoch for MillennialEpoch {
        const EPOCH_TIME: OffsetDateTime = datetime!(2000-01-01 00:00 UTC);
    }

    #[test]
    fn part_ranges() {
        for legal in [0, 0xD, 0x1F] {
            assert!(WorkerId::new(legal).is_some());
            assert!(ProcessId::new(legal).is_some());
        }
        for illegal in [0x20, 0xF0, u8::MAX] {
            assert!(WorkerId::new(illegal).is_none());
            assert!(ProcessId::new(illegal).is_none());
        }
    }

    #[test]
    fn timestamp_bounds() {
        assert_eq!(
            millis_since_epoch::<MillennialEpoch>(MillennialEpoch::EPOCH_TIME),
            Ok(0)
        );
        assert_eq!(
            millis_since_epoch::<MillennialEpoch>(
                MillennialEpoch::EPOCH_TIME - Duration::milliseconds(1)
            ),
            Err(SnowflakeTimestampError::TimeBeforeEpoch)
        );
        assert_eq!(
            millis_since_epoch::<MillennialEpoch>(
                MillennialEpoch::EPOCH_TIME + Duration::milliseconds(0x0400_0000_0000)
            ),
            Err(SnowflakeTimestampError::TimestampTooLarge)
        );
    }

    #[test]
    fn parts_survive_packing() {
        let worker_id = WorkerId::new(0b10101).unwrap();
        let process_id = ProcessId::new(0b10001).unwrap();
        let snowflake = Snowflake::<MillennialEpoch>::from_parts(123_456, worker_id, process_id, 100);

        assert_eq!(snowflake.millis(), 123_456);
        assert_eq!(snowflake.worker_id(), worker_id);
        assert_eq!(snowflake.process_id(), process_id);
        assert_eq!(snowflake.increment(), 100);
        assert_eq!(
            snowflake.created_at(),
            MillennialEpoch::EPOCH_TIME + Duration::milliseconds(123_456)
        );
    }

    #[test]
    fn generator_increments_and_wraps() {
        let time = datetime!(2025-10-24 10:55 UTC);
        let mut generator =
            SnowflakeGenerator::<MillennialEpoch>::new(WorkerId::new(10).unwrap(), ProcessId::default());

        let first = generator.generate_at(time);
        let second = generator.generate_at(time);
        assert_eq!(first.increment(), 0);
        assert_eq!(second.increment(), 1);
        assert!(second > first);

        for _ in 2..0x1000 {
            generator.generate_at(time);
        }
        assert_eq!(generator.generate_at(time).increment(), 0);
    }
}
