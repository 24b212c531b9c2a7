// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

//! Persisted form of [`ScaleConfig`]: `[period, scale_factor (LE u32), zero_offset (LE u32)]`.

use crate::weight::calibration::ScaleConfig;
use sequential_storage::map::{SerializationError, Value};

pub const CONFIG_RECORD_LEN: usize = 9;

pub fn encode(config: &ScaleConfig) -> [u8; CONFIG_RECORD_LEN] {
    let mut record = [0u8; CONFIG_RECORD_LEN];
    record[0] = config.publish_period_minutes;
    record[1..5].copy_from_slice(&config.scale_factor.to_le_bytes());
    record[5..9].copy_from_slice(&config.zero_offset.to_le_bytes());
    record
}

/// Anything other than exactly one record is rejected.
pub fn decode(record: &[u8]) -> Option<ScaleConfig> {
    let record: &[u8; CONFIG_RECORD_LEN] = record.try_into().ok()?;
    let word = |at: usize| {
        u32::from_le_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
    };
    Some(ScaleConfig {
        publish_period_minutes: record[0],
        scale_factor: word(1),
        zero_offset: word(5),
    })
}

impl Value<'_> for ScaleConfig {
    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        if buffer.len() < CONFIG_RECORD_LEN {
            return Err(SerializationError::BufferTooSmall);
        }
        buffer[..CONFIG_RECORD_LEN].copy_from_slice(&encode(self));
        Ok(CONFIG_RECORD_LEN)
    }

    fn deserialize_from(buffer: &[u8]) -> Result<Self, SerializationError>
    where
        Self: Sized,
    {
        decode(buffer).ok_or(SerializationError::InvalidFormat)
    }
}
