use crate::shortcode::ShortCode;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier assigned to a record when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(Uuid);

impl LinkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// One registered mapping from a short code to a destination.
///
/// Records are immutable once built. Whether a record is still active is
/// never stored; ask with [`ShortLinkRecord::is_expired_at`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord")]
pub struct ShortLinkRecord {
    id: LinkId,
    original_url: String,
    short_code: ShortCode,
    created_at: Timestamp,
    expires_at: Timestamp,
}

/// Unvalidated shape of a persisted record.
#[derive(Deserialize)]
struct StoredRecord {
    id: LinkId,
    original_url: String,
    short_code: ShortCode,
    created_at: Timestamp,
    expires_at: Timestamp,
}

impl TryFrom<StoredRecord> for ShortLinkRecord {
    type Error = String;

    fn try_from(value: StoredRecord) -> Result<Self, Self::Error> {
        if value.expires_at <= value.created_at {
            return Err(format!(
                "record '{}' expires at {} which is not after its creation at {}",
                value.short_code, value.expires_at, value.created_at
            ));
        }

        Ok(Self {
            id: value.id,
            original_url: value.original_url,
            short_code: value.short_code,
            created_at: value.created_at,
            expires_at: value.expires_at,
        })
    }
}

impl ShortLinkRecord {
    /// Builds a new record with a fresh id.
    ///
    /// Returns `None` unless `expires_at` is strictly after `created_at`.
    pub fn new(
        short_code: ShortCode,
        original_url: impl Into<String>,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> Option<Self> {
        if expires_at <= created_at {
            return None;
        }

        Some(Self {
            id: LinkId::new(),
            original_url: original_url.into(),
            short_code,
            created_at,
            expires_at,
        })
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn short_code(&self) -> &ShortCode {
        &self.short_code
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// A record stays active up to and including `expires_at`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    /// Time left before the record expires, `None` once it has.
    pub fn remaining(&self, now: Timestamp) -> Option<SignedDuration> {
        if self.is_expired_at(now) {
            None
        } else {
            Some(self.expires_at.duration_since(now))
        }
    }

    /// Time elapsed since the record was created.
    pub fn age(&self, now: Timestamp) -> SignedDuration {
        now.duration_since(self.created_at)
    }
}
