//! Reviewer / investor profiles and the fixed roster they are drawn from.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::{GatewayError, Result};

/// One roster entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewerProfile {
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category (DAO, Fintech, SME, ...). Exported as `type`.
    #[serde(rename = "type")]
    pub category: String,
    pub domicile: String,
    /// Wallet / account reference.
    pub wallet_address: String,
}

impl ReviewerProfile {
    fn new(id: &str, name: &str, category: &str, domicile: &str, wallet_address: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            domicile: domicile.to_string(),
            wallet_address: wallet_address.to_string(),
        }
    }
}

/// A non-empty, ordered, versioned list of profiles.
///
/// Order is part of the contract: selection indexes into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Roster {
    version: String,
    profiles: Vec<ReviewerProfile>,
}

static BUILTIN: LazyLock<Roster> = LazyLock::new(|| Roster {
    version: "2024-1".to_string(),
    profiles: vec![
        ReviewerProfile::new(
            "INV-DAO-001",
            "Atlas Treasury DAO",
            "DAO",
            "Cayman Islands",
            "0xA7D4f0a2b9C3D1e8F45a901234567890abcdef12",
        ),
        ReviewerProfile::new(
            "INV-FIN-002",
            "Stratus Fintech Holdings",
            "Fintech",
            "United Kingdom",
            "0xB3C7e4219dDFAb00123456789abcdef012345678",
        ),
        ReviewerProfile::new(
            "INV-SME-003",
            "Harborlight Trading SME",
            "SME",
            "Singapore",
            "0xF1e2234567890abcDEF1234567890abcdef12345",
        ),
        ReviewerProfile::new(
            "INV-FO-004",
            "North River Family Office",
            "FamilyOffice",
            "United States",
            "0xC0ffee2540B1eCafe001234567890abcdef98765",
        ),
    ],
});

impl Roster {
    /// Build a roster.
    ///
    /// # Errors
    /// Returns [`GatewayError::Configuration`] if `profiles` is empty or
    /// contains duplicate ids.
    pub fn new(version: impl Into<String>, profiles: Vec<ReviewerProfile>) -> Result<Self> {
        if profiles.is_empty() {
            return Err(GatewayError::Configuration(
                "reviewer roster must contain at least one profile".to_string(),
            ));
        }
        let mut ids: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(w) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(GatewayError::Configuration(format!(
                "duplicate reviewer profile id {}",
                w[0]
            )));
        }
        Ok(Self {
            version: version.into(),
            profiles,
        })
    }

    /// The process-wide built-in roster (4 entries).
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of profiles. Always at least 1.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ReviewerProfile> {
        self.profiles.get(index)
    }

    #[must_use]
    pub fn profiles(&self) -> &[ReviewerProfile] {
        &self.profiles
    }
}
