use chrono::Utc;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::{
    fmt,
    str::FromStr,
    sync::{
        LazyLock,
        atomic::{AtomicU32, Ordering},
    },
};
use uuid::Uuid;

const OBJECT_ID_LEN: usize = 12;
const COUNTER_MASK: u32 = 0x00ff_ffff;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObjectIdError {
    #[error("expected 24 hex characters, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("object id must be written in lowercase hex")]
    NotCanonical,
}

/// 12-byte document identifier, written as 24 lowercase hex characters.
///
/// Layout: a 4-byte big-endian timestamp in seconds, 5 bytes drawn once per
/// process, then a 3-byte big-endian counter. Ids generated by one process
/// sort in generation order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(|| {
    let mut bytes = [0u8; 5];
    bytes.copy_from_slice(&Uuid::new_v4().as_bytes()[..5]);
    bytes
});

// Starts in the lower half of the 24-bit range so a fresh process does not
// wrap within its first second.
static COUNTER: LazyLock<AtomicU32> = LazyLock::new(|| {
    let seed = Uuid::new_v4().into_bytes();
    AtomicU32::new(u32::from_be_bytes([0, seed[0] & 0x7f, seed[1], seed[2]]))
});

impl ObjectId {
    #[must_use]
    pub fn generate() -> Self {
        let seconds = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst) & COUNTER_MASK;

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(PROCESS_UNIQUE.as_slice());
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses the canonical 24-character form. Uppercase hex is rejected
    /// because it would not round-trip through [`ObjectId::to_hex`].
    ///
    /// # Errors
    ///
    /// Returns an [`ObjectIdError`] when the input is not canonical hex of the
    /// right length.
    pub fn parse_str(input: &str) -> Result<Self, ObjectIdError> {
        if input.len() != OBJECT_ID_LEN * 2 {
            return Err(ObjectIdError::InvalidLength(input.len()));
        }

        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(input, &mut bytes)?;
        let parsed = Self(bytes);

        if parsed.to_hex() != input {
            return Err(ObjectIdError::NotCanonical);
        }
        Ok(parsed)
    }

    #[must_use]
    pub fn is_valid(input: &str) -> bool {
        Self::parse_str(input).is_ok()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}
