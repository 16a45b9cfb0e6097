// records/time.rs
use chrono::{NaiveDate, NaiveDateTime};

use super::common::{read_u16, validate_record_bytes};
use crate::{Error, Result};

/// Size of one time record in bytes: nine consecutive u16 fields.
pub const TIME_RECORD_SIZE: usize = 18;

/// The raw fields of an 18-byte SEA time record.
///
/// `max_sys_freq` is the number of clock ticks per second and
/// `fraction_of_second` the number of ticks elapsed in the current second;
/// together they give sub-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeaTime {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub fraction_of_second: u16,
    pub max_sys_freq: u16,
    pub buffer_life_span: u16,
}

impl SeaTime {
    /// Parse the time record starting at `offset` in `bytes`.
    pub fn read_at(bytes: &[u8], offset: usize) -> Result<Self> {
        validate_record_bytes(bytes, offset, TIME_RECORD_SIZE)?;

        Ok(Self {
            year: read_u16(bytes, offset),
            month: read_u16(bytes, offset + 2),
            day: read_u16(bytes, offset + 4),
            hour: read_u16(bytes, offset + 6),
            minute: read_u16(bytes, offset + 8),
            second: read_u16(bytes, offset + 10),
            fraction_of_second: read_u16(bytes, offset + 12),
            max_sys_freq: read_u16(bytes, offset + 14),
            buffer_life_span: read_u16(bytes, offset + 16),
        })
    }

    /// Parse a time record from the first 18 bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read_at(bytes, 0)
    }

    /// Serialize the record to its 18-byte wire form.
    pub fn to_bytes(&self) -> [u8; TIME_RECORD_SIZE] {
        let fields = [
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.fraction_of_second,
            self.max_sys_freq,
            self.buffer_life_span,
        ];
        let mut out = [0u8; TIME_RECORD_SIZE];
        for (i, field) in fields.iter().enumerate() {
            out[i * 2..i * 2 + 2].copy_from_slice(&field.to_le_bytes());
        }
        out
    }

    /// Sub-second part of the timestamp in microseconds:
    /// `floor(1_000_000 * fraction_of_second / max_sys_freq)`.
    ///
    /// A `max_sys_freq` of zero cannot describe a clock, and a
    /// `fraction_of_second` of at least `max_sys_freq` is not a sub-second
    /// fraction; both fail with [`Error::InvalidTimestamp`].
    pub fn microsecond(&self) -> Result<u32> {
        if self.max_sys_freq == 0 {
            return Err(Error::InvalidTimestamp {
                time: *self,
                microsecond: 0,
            });
        }
        let micros = 1_000_000u64 * u64::from(self.fraction_of_second) / u64::from(self.max_sys_freq);
        if micros >= 1_000_000 {
            return Err(Error::InvalidTimestamp {
                time: *self,
                microsecond: micros,
            });
        }
        Ok(micros as u32)
    }

    /// Convert to a calendar timestamp.
    ///
    /// Fails with [`Error::InvalidTimestamp`] carrying the raw fields when
    /// they do not form a valid date or time (month 0, day 32, ...), so the
    /// offending values can be diagnosed instead of a generic conversion
    /// failure.
    pub fn to_datetime(&self) -> Result<NaiveDateTime> {
        let microsecond = self.microsecond()?;
        let invalid = || Error::InvalidTimestamp {
            time: *self,
            microsecond: u64::from(microsecond),
        };

        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
        .and_then(|date| {
            date.and_hms_micro_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
                microsecond,
            )
        })
        .ok_or_else(invalid)
    }
}
