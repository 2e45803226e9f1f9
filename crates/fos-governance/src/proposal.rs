//! # Proposals
//!
//! Proposal records, their typed payloads, and the status state machine.

use serde::{Deserialize, Serialize};

use fos_core::{Address, FosError, FosResult, ProposalId, Timestamp, UnitAmount};

/// Width of an ABI-encoded word.
const WORD_LEN: usize = 32;

// ─── Kind & Payload ──────────────────────────────────────────────────

/// The kind of change a proposal requests.
///
/// Numeric codes follow the on-ledger enumeration used by existing clients.
/// Requests may name a kind either way: `"exit_sale"` or `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "ProposalKindRepr")]
pub enum ProposalKind {
    /// Approve the sale of the underlying asset and open the exit deposit.
    ExitSale,
    /// Suspend holder-to-holder transfers.
    EmergencyPause,
    /// Enable or disable holder-to-holder transfers.
    TransferAuthorization,
}

impl ProposalKind {
    pub fn code(&self) -> u8 {
        match self {
            Self::ExitSale => 0,
            Self::EmergencyPause => 1,
            Self::TransferAuthorization => 2,
        }
    }

    pub fn from_code(code: u8) -> FosResult<Self> {
        match code {
            0 => Ok(Self::ExitSale),
            1 => Ok(Self::EmergencyPause),
            2 => Ok(Self::TransferAuthorization),
            other => Err(FosError::InvalidPayload(format!(
                "unknown proposal type {other}"
            ))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProposalKindRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<ProposalKindRepr> for ProposalKind {
    type Error = FosError;

    fn try_from(repr: ProposalKindRepr) -> FosResult<Self> {
        match repr {
            ProposalKindRepr::Code(code) => Self::from_code(code),
            ProposalKindRepr::Name(name) => match name.as_str() {
                "exit_sale" => Ok(Self::ExitSale),
                "emergency_pause" => Ok(Self::EmergencyPause),
                "transfer_authorization" => Ok(Self::TransferAuthorization),
                other => Err(FosError::InvalidPayload(format!(
                    "unknown proposal type {other:?}"
                ))),
            },
        }
    }
}

impl std::fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ExitSale => "EXIT_SALE",
            Self::EmergencyPause => "EMERGENCY_PAUSE",
            Self::TransferAuthorization => "TRANSFER_AUTHORIZATION",
        };
        f.write_str(s)
    }
}

/// A decoded proposal payload, one shape per [`ProposalKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalPayload {
    ExitSale,
    EmergencyPause,
    TransferAuthorization { enabled: bool },
}

impl ProposalPayload {
    /// Decode raw payload bytes for `kind`.
    ///
    /// `TransferAuthorization` takes one ABI-encoded boolean word (31 zero
    /// bytes then `0x00` or `0x01`). The other kinds take no payload.
    pub fn decode(kind: ProposalKind, bytes: &[u8]) -> FosResult<Self> {
        match kind {
            ProposalKind::ExitSale | ProposalKind::EmergencyPause => {
                if !bytes.is_empty() {
                    return Err(FosError::InvalidPayload(format!(
                        "{kind} takes no payload, got {} bytes",
                        bytes.len()
                    )));
                }
                Ok(match kind {
                    ProposalKind::ExitSale => Self::ExitSale,
                    _ => Self::EmergencyPause,
                })
            }
            ProposalKind::TransferAuthorization => {
                let enabled = decode_bool_word(bytes)?;
                Ok(Self::TransferAuthorization { enabled })
            }
        }
    }

    /// Inverse of [`decode`](Self::decode).
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::ExitSale | Self::EmergencyPause => Vec::new(),
            Self::TransferAuthorization { enabled } => {
                let mut word = vec![0u8; WORD_LEN];
                word[WORD_LEN - 1] = u8::from(*enabled);
                word
            }
        }
    }

    pub fn kind(&self) -> ProposalKind {
        match self {
            Self::ExitSale => ProposalKind::ExitSale,
            Self::EmergencyPause => ProposalKind::EmergencyPause,
            Self::TransferAuthorization { .. } => ProposalKind::TransferAuthorization,
        }
    }
}

/// Parse a hex payload as submitted by clients. An optional `0x` prefix is
/// accepted; the empty string is an empty payload.
pub fn decode_hex_payload(s: &str) -> FosResult<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| FosError::InvalidPayload(format!("payload is not hex: {e}")))
}

fn decode_bool_word(bytes: &[u8]) -> FosResult<bool> {
    if bytes.len() != WORD_LEN {
        return Err(FosError::InvalidPayload(format!(
            "boolean payload must be {WORD_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    if bytes[..WORD_LEN - 1].iter().any(|b| *b != 0) {
        return Err(FosError::InvalidPayload(
            "boolean payload has non-zero high bytes".into(),
        ));
    }
    match bytes[WORD_LEN - 1] {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(FosError::InvalidPayload(format!(
            "boolean payload ends in {other:#04x}"
        ))),
    }
}

// ─── Status ──────────────────────────────────────────────────────────

/// Lifecycle status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Open for votes until `voting_ends`, then awaiting execution.
    Active,
    /// Effect applied (terminal).
    Executed,
    /// Tally failed at finalization (terminal).
    Rejected,
    /// Withdrawn by the proposer or the authority (terminal).
    Cancelled,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Executed => "EXECUTED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Record of a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: ProposalStatus,
    pub to: ProposalStatus,
    pub at: Timestamp,
    pub reason: String,
}

// ─── Proposal ────────────────────────────────────────────────────────

/// A governance proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub kind: ProposalKind,
    pub payload: ProposalPayload,
    pub description: String,
    pub proposer: Address,
    pub created_at: Timestamp,
    /// Last instant at which votes are accepted.
    pub voting_ends: Timestamp,
    pub votes_for: UnitAmount,
    pub votes_against: UnitAmount,
    pub status: ProposalStatus,
    /// Ordered log of status changes.
    pub transitions: Vec<StatusTransition>,
}

impl Proposal {
    /// Votes are accepted while `now ≤ voting_ends`.
    pub fn is_voting_open(&self, now: Timestamp) -> bool {
        now <= self.voting_ends
    }

    /// Strict majority of cast weight. Ties fail.
    pub fn tally_passes(&self) -> bool {
        self.votes_for > self.votes_against
    }

    /// Executed, or closed for voting with a passing tally.
    pub fn has_passed(&self, now: Timestamp) -> bool {
        match self.status {
            ProposalStatus::Executed => true,
            ProposalStatus::Active => !self.is_voting_open(now) && self.tally_passes(),
            ProposalStatus::Rejected | ProposalStatus::Cancelled => false,
        }
    }

    pub(crate) fn require_active(&self) -> FosResult<()> {
        if self.status.is_terminal() {
            return Err(FosError::ProposalNotActive {
                proposal_id: self.id,
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn do_transition(&mut self, to: ProposalStatus, at: Timestamp, reason: &str) {
        self.transitions.push(StatusTransition {
            from: self.status,
            to,
            at,
            reason: reason.to_string(),
        });
        self.status = to;
    }
}

/// A cast vote. At most one per (proposal, voter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal_id: ProposalId,
    pub voter: Address,
    pub support: bool,
    pub weight: UnitAmount,
    pub cast_at: Timestamp,
}

// ─── Tests ───────────────────────────────────────────────────────────
