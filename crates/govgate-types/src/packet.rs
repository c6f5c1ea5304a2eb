//! Compliance packet model.
//!
//! A [`CompliancePacket`] is a [`PacketBody`] plus the two integrity fields
//! computed over the canonical encoding of that body. The body is the only
//! thing that is ever hashed or signed; `packet_hash` and `signature` are
//! never part of their own input.
//!
//! The check block is a **simulation**: every check passes and the decision
//! is always [`Decision::Approved`]. See [`crate::constants::SIMULATION_NOTICE`].

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::{OrderId, OrderRecord, ReviewerProfile, constants};

/// Timestamps inside a packet render as `YYYY-MM-DDTHH:MM:SSZ`.
mod utc_seconds {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Final decision. Only `APPROVED` exists in this simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "APPROVED"),
        }
    }
}

/// Order subset carried inside the packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketOrder {
    pub id: OrderId,
    pub uploaded_filename: String,
    pub mime: String,
    pub size_bytes: u64,
}

impl From<&OrderRecord> for PacketOrder {
    fn from(record: &OrderRecord) -> Self {
        Self {
            id: record.order_id.clone(),
            uploaded_filename: record.uploaded_filename.clone(),
            mime: record.mime.clone(),
            size_bytes: record.size_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RationaleCheck {
    pub pass: bool,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagCheck {
    pub pass: bool,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub approver: String,
    #[serde(with = "utc_seconds")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceCheck {
    pub pass: bool,
    pub approvals: Vec<Approval>,
}

/// The fixed set of named check results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checks {
    pub kyc_kyb: RationaleCheck,
    pub aml_sanctions: FlagCheck,
    pub ownership_pep: RationaleCheck,
    pub governance: GovernanceCheck,
}

impl Checks {
    /// The stubbed check block: everything passes, two approvals at `approved_at`.
    ///
    /// No rule is evaluated here.
    #[must_use]
    pub fn simulated(approved_at: DateTime<Utc>) -> Self {
        let approved_at = approved_at.trunc_subsecs(0);
        Self {
            kyc_kyb: RationaleCheck {
                pass: true,
                rationale: "Identity and entity records validated against internal registry."
                    .to_string(),
            },
            aml_sanctions: FlagCheck {
                pass: true,
                flags: Vec::new(),
            },
            ownership_pep: RationaleCheck {
                pass: true,
                rationale: "No PEP exposure detected across nested ownership layers.".to_string(),
            },
            governance: GovernanceCheck {
                pass: true,
                approvals: vec![
                    Approval {
                        approver: "OpRisk Desk".to_string(),
                        timestamp: approved_at,
                    },
                    Approval {
                        approver: "GS DAP Compliance".to_string(),
                        timestamp: approved_at,
                    },
                ],
            },
        }
    }

    /// Whether every check in the block passed.
    #[must_use]
    pub fn all_pass(&self) -> bool {
        self.kyc_kyb.pass && self.aml_sanctions.pass && self.ownership_pep.pass && self.governance.pass
    }
}

/// Everything that is hashed and signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketBody {
    pub packet_version: String,
    #[serde(with = "utc_seconds")]
    pub generated_at: DateTime<Utc>,
    pub order: PacketOrder,
    pub investor: ReviewerProfile,
    pub checks: Checks,
    pub decision: Decision,
}

impl PacketBody {
    /// Assemble the unsigned body for an order at `now`.
    #[must_use]
    pub fn assemble(record: &OrderRecord, investor: ReviewerProfile, now: DateTime<Utc>) -> Self {
        let now = now.trunc_subsecs(0);
        Self {
            packet_version: constants::PACKET_VERSION.to_string(),
            generated_at: now,
            order: PacketOrder::from(record),
            investor,
            checks: Checks::simulated(now),
            decision: Decision::Approved,
        }
    }
}

/// The signed, immutable packet. Field order is the export order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompliancePacket {
    #[serde(flatten)]
    pub body: PacketBody,
    pub packet_hash: String,
    pub signature: String,
}
