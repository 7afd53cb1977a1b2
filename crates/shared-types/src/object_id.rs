//! # Store-Assigned Object Identifiers
//!
//! 12-byte ids assigned by the entity store to records that have no natural
//! chain identifier (rewards).
//!
//! Layout: 4-byte big-endian unix seconds, 5 random bytes fixed per process,
//! 3-byte big-endian counter. Rendered as 24 lowercase hex characters.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Length of the hex rendering.
pub const OBJECT_ID_HEX_LENGTH: usize = 24;

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// Errors from parsing an object id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectIdError {
    /// Input is not exactly 24 characters.
    #[error("object id must be {OBJECT_ID_HEX_LENGTH} hex characters, got {0}")]
    InvalidLength(usize),

    /// Input contains non-hex characters.
    #[error("object id is not valid hex")]
    InvalidHex,
}

/// 12-byte store-assigned identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generate a fresh id.
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        Self::with_timestamp(secs)
    }

    /// Generate a fresh id with an explicit timestamp component.
    pub fn with_timestamp(secs: u32) -> Self {
        let unique = PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().gen());
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..0x00FF_FFFF)))
            .fetch_add(1, Ordering::Relaxed)
            & 0x00FF_FFFF;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(unique);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Parse exactly 24 hex characters (either case).
    pub fn parse_hex(s: &str) -> Result<Self, ObjectIdError> {
        if s.len() != OBJECT_ID_HEX_LENGTH {
            return Err(ObjectIdError::InvalidLength(s.len()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ObjectIdError::InvalidHex)?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Unix seconds embedded in the id.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}
