//! Deterministic reviewer profile selection.
//!
//! `index = SHA-256(order_id)[0] mod N`. No state, no randomness: the same
//! order id maps to the same profile in every process, forever (for a given
//! roster).

use govgate_types::{OrderId, ReviewerProfile, Roster};
use sha2::{Digest, Sha256};

/// Maps order ids onto a fixed roster.
#[derive(Debug, Clone)]
pub struct ProfileSelector {
    roster: Roster,
}

impl ProfileSelector {
    /// Selector over `roster`. A [`Roster`] is never empty, so construction
    /// cannot fail here; emptiness is rejected when the roster is built.
    #[must_use]
    pub fn new(roster: Roster) -> Self {
        Self { roster }
    }

    /// Selector over the built-in roster.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(Roster::builtin().clone())
    }

    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Roster index for `order_id`.
    #[must_use]
    pub fn index_for(&self, order_id: &OrderId) -> usize {
        let digest = Sha256::digest(order_id.as_str().as_bytes());
        usize::from(digest[0]) % self.roster.len()
    }

    /// The profile for `order_id`.
    #[must_use]
    pub fn select(&self, order_id: &OrderId) -> &ReviewerProfile {
        &self.roster.profiles()[self.index_for(order_id)]
    }
}
