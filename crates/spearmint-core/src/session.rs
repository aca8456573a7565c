use std::collections::HashMap;
use std::sync::Mutex;

use crate::util;
use crate::verifier::OwnedCharacter;

/// Output of a successful verification step: the corp-member characters plus
/// the credential pair that proved them. Held only until the visitor confirms
/// or the session expires; consuming it takes ownership, so a pending
/// registration cannot be confirmed twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRegistration {
    pub api_key_id: String,
    pub api_code: String,
    pub characters: Vec<OwnedCharacter>,
}

struct PendingEntry {
    pending: PendingRegistration,
    expires_at: i64,
}

/// In-memory, token-addressed holding area for pending registrations between
/// the verify and confirm steps. Entries are single-take and expire after the
/// configured TTL.
pub struct PendingRegistrations {
    ttl_secs: i64,
    entries: Mutex<HashMap<String, PendingEntry>>,
}

impl PendingRegistrations {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl_secs,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Park a pending registration and return the session key addressing it.
    pub fn insert(&self, pending: PendingRegistration) -> String {
        self.insert_at(pending, util::now_ts())
    }

    /// Remove and return the pending registration for `key`, if it exists and
    /// has not expired.
    pub fn take(&self, key: &str) -> Option<PendingRegistration> {
        self.take_at(key, util::now_ts())
    }

    fn insert_at(&self, pending: PendingRegistration, now: i64) -> String {
        let key = util::generate_session_key();
        let mut entries = self.entries.lock().expect("pending registry poisoned");

        // Opportunistic sweep; the map stays tiny for this member base.
        entries.retain(|_, entry| entry.expires_at > now);

        entries.insert(
            key.clone(),
            PendingEntry {
                pending,
                expires_at: now + self.ttl_secs,
            },
        );
        key
    }

    fn take_at(&self, key: &str, now: i64) -> Option<PendingRegistration> {
        let mut entries = self.entries.lock().expect("pending registry poisoned");
        let entry = entries.remove(key)?;
        if entry.expires_at <= now {
            return None;
        }
        Some(entry.pending)
    }
}
