//! Cache Entry Module
//!
//! A stored value together with the instant it stops being served.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single cached value and its expiry deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that expires `ttl` from now.
    pub fn new(value: String, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches `expires_at`, so an
    /// entry written with a zero TTL is never served.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied clock,
    /// letting a sweep compare every entry to one instant.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
