use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::shared::error::ProducerError;

/// Durability a send waits for before it counts as successful.
///
/// The names and numeric ids are persisted in configuration files and never
/// change: `unset` = 0, `no_response` = 1, `wait_for_local` = 2,
/// `wait_for_all` = 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum RequiredAcks {
    /// Replaced by [`RequiredAcks::WaitForAll`] during validation.
    #[default]
    Unset = 0,
    /// Fire and forget.
    NoResponse = 1,
    /// Wait for the partition leader.
    WaitForLocal = 2,
    /// Wait for all in-sync replicas.
    WaitForAll = 3,
}

impl RequiredAcks {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredAcks::Unset => "unset",
            RequiredAcks::NoResponse => "no_response",
            RequiredAcks::WaitForLocal => "wait_for_local",
            RequiredAcks::WaitForAll => "wait_for_all",
        }
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for RequiredAcks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for RequiredAcks {
    type Error = ProducerError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(RequiredAcks::Unset),
            1 => Ok(RequiredAcks::NoResponse),
            2 => Ok(RequiredAcks::WaitForLocal),
            3 => Ok(RequiredAcks::WaitForAll),
            other => Err(ProducerError::InvalidAcks(other.to_string())),
        }
    }
}

impl FromStr for RequiredAcks {
    type Err = ProducerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if let Ok(id) = value.parse::<i64>() {
            return Self::try_from(id);
        }
        match value.to_ascii_lowercase().as_str() {
            "unset" => Ok(RequiredAcks::Unset),
            "no_response" => Ok(RequiredAcks::NoResponse),
            "wait_for_local" => Ok(RequiredAcks::WaitForLocal),
            "wait_for_all" => Ok(RequiredAcks::WaitForAll),
            _ => Err(ProducerError::InvalidAcks(value.to_string())),
        }
    }
}

impl Serialize for RequiredAcks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AcksNumStr {
    Num(i64),
    Str(String),
}

impl<'de> Deserialize<'de> for RequiredAcks {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match AcksNumStr::deserialize(deserializer)? {
            AcksNumStr::Num(id) => Self::try_from(id).map_err(de::Error::custom),
            AcksNumStr::Str(name) => name.parse().map_err(de::Error::custom),
        }
    }
}

/// Maps an acknowledgement mode to the Kafka protocol value:
/// `NoResponse` → 0, `WaitForLocal` → 1, `WaitForAll` → -1.
pub fn native_acks(mode: RequiredAcks) -> Result<i16, ProducerError> {
    match mode {
        RequiredAcks::NoResponse => Ok(0),
        RequiredAcks::WaitForLocal => Ok(1),
        RequiredAcks::WaitForAll => Ok(-1),
        RequiredAcks::Unset => Err(ProducerError::InvalidAcks(mode.to_string())),
    }
}
