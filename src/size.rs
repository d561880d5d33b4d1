//! Byte quantities as they appear in configuration files.
//!
//! Sizes may be written either as plain integers or as strings with a binary
//! unit suffix. `MB` means 2^20 bytes, the same convention the simulation
//! engine uses for memory sizes:
//!
//! ```
//! use numa_topology::size::ByteSize;
//!
//! assert_eq!("512MB".parse::<ByteSize>().unwrap().bytes(), 512 << 20);
//! assert_eq!("1GiB".parse::<ByteSize>().unwrap().bytes(), 1 << 30);
//! assert_eq!("0x1000".parse::<ByteSize>().unwrap().bytes(), 4096);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

const UNITS: &[(&str, u32)] = &[("TB", 40), ("GB", 30), ("MB", 20), ("kB", 10)];

/// A non-negative quantity of bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

impl ByteSize {
    /// Creates a size from a raw byte count.
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Creates a size of `n` mebibytes.
    pub const fn mib(n: u64) -> Self {
        Self(n << 20)
    }

    /// Creates a size of `n` gibibytes.
    pub const fn gib(n: u64) -> Self {
        Self(n << 30)
    }

    /// Returns the size in bytes.
    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// Returns true if the size is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

fn unit_shift(unit: &str) -> Option<u32> {
    match unit.to_ascii_lowercase().as_str() {
        "" | "b" => Some(0),
        "k" | "kb" | "kib" => Some(10),
        "m" | "mb" | "mib" => Some(20),
        "g" | "gb" | "gib" => Some(30),
        "t" | "tb" | "tib" => Some(40),
        _ => None,
    }
}

impl FromStr for ByteSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || ConfigError::InvalidSize(s.to_string());

        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            return u64::from_str_radix(hex, 16).map(Self).map_err(|_| invalid());
        }

        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        let (digits, unit) = text.split_at(split);
        if digits.is_empty() {
            return Err(invalid());
        }

        let value: u64 = digits.parse().map_err(|_| invalid())?;
        let shift = unit_shift(unit.trim()).ok_or_else(invalid)?;
        value
            .checked_mul(1u64 << shift)
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 != 0 {
            for (suffix, shift) in UNITS {
                let unit = 1u64 << shift;
                if self.0 % unit == 0 {
                    return write!(f, "{}{}", self.0 / unit, suffix);
                }
            }
        }
        write!(f, "{}B", self.0)
    }
}

impl From<u64> for ByteSize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl From<ByteSize> for u64 {
    fn from(size: ByteSize) -> Self {
        size.0
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSize {
    Bytes(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawSize::deserialize(deserializer)? {
            RawSize::Bytes(bytes) => Ok(Self(bytes)),
            RawSize::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}
