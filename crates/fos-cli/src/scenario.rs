//! # Scenario Subcommand
//!
//! Replays a scripted sequence of platform commands on a manual clock.
//! Each step may name the error code it expects; a step without `expect`
//! must succeed. Any mismatch stops the replay with exit code 1.
//!
//! ```yaml
//! config: platform.yaml          # relative to this file
//! start: "2026-01-01T00:00:00Z"
//! steps:
//!   - action: add_identity
//!     caller: "0xa0"
//!     address: "0x01"
//!     expiry: "2030-01-01T00:00:00Z"
//!     country: US
//!   - action: buy
//!     caller: "0x01"
//!     units: "10000000000000000000"
//!   - action: advance_time
//!     secs: 604801
//!   - action: deposit
//!     caller: "0xa0"
//!     amount: "1"
//!     expect: PERMISSION_DENIED     # no exit sale approved yet
//! ```
//!
//! After the last step the final snapshot is printed as JSON and the
//! cross-component invariants are checked.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Deserialize;

use fos_core::{
    Address, CountryCode, FosResult, ManualClock, ProposalId, SettlementAmount, Timestamp,
    UnitAmount,
};
use fos_engine::{Platform, PlatformConfig, PlatformSnapshot};
use fos_governance::{decode_hex_payload, ProposalKind};

/// Arguments for the `fos scenario` subcommand.
#[derive(Args, Debug)]
pub struct ScenarioArgs {
    /// Path to the scenario YAML.
    pub path: PathBuf,

    /// Print the snapshot as compact JSON.
    #[arg(long)]
    pub compact: bool,
}

// ─── Scenario File ───────────────────────────────────────────────────

/// A scenario document.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Platform configuration, relative to the scenario file.
    pub config: PathBuf,
    /// Initial clock reading.
    pub start: Timestamp,
    pub steps: Vec<Step>,
}

/// One scripted command.
#[derive(Debug, Deserialize)]
pub struct Step {
    /// Acting account. Required by every action except `advance_time`.
    #[serde(default)]
    pub caller: Option<Address>,
    #[serde(flatten)]
    pub action: Action,
    /// Error code the step must fail with.
    #[serde(default)]
    pub expect: Option<String>,
}

/// Platform commands a scenario can issue.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    AdvanceTime {
        secs: u64,
    },
    AddIdentity {
        address: Address,
        expiry: Timestamp,
        country: CountryCode,
    },
    RemoveIdentity {
        address: Address,
    },
    RenewIdentity {
        address: Address,
        expiry: Timestamp,
    },
    Transfer {
        to: Address,
        units: UnitAmount,
    },
    Approve {
        spender: Address,
        units: UnitAmount,
    },
    TransferFrom {
        from: Address,
        to: Address,
        units: UnitAmount,
    },
    Buy {
        units: UnitAmount,
    },
    CloseSale,
    Withdraw {
        to: Address,
    },
    Deposit {
        amount: SettlementAmount,
    },
    Redeem {
        units: UnitAmount,
    },
    Propose {
        kind: ProposalKind,
        description: String,
        /// Hex payload, optionally `0x`-prefixed.
        #[serde(default)]
        payload: String,
    },
    Vote {
        proposal: ProposalId,
        support: bool,
    },
    Execute {
        proposal: ProposalId,
    },
    Finalize {
        proposal: ProposalId,
    },
    Cancel {
        proposal: ProposalId,
    },
    SettlementApprove {
        spender: Address,
        amount: SettlementAmount,
    },
    MintSettlement {
        to: Address,
        amount: SettlementAmount,
    },
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Self::AdvanceTime { .. } => "advance_time",
            Self::AddIdentity { .. } => "add_identity",
            Self::RemoveIdentity { .. } => "remove_identity",
            Self::RenewIdentity { .. } => "renew_identity",
            Self::Transfer { .. } => "transfer",
            Self::Approve { .. } => "approve",
            Self::TransferFrom { .. } => "transfer_from",
            Self::Buy { .. } => "buy",
            Self::CloseSale => "close_sale",
            Self::Withdraw { .. } => "withdraw",
            Self::Deposit { .. } => "deposit",
            Self::Redeem { .. } => "redeem",
            Self::Propose { .. } => "propose",
            Self::Vote { .. } => "vote",
            Self::Execute { .. } => "execute",
            Self::Finalize { .. } => "finalize",
            Self::Cancel { .. } => "cancel",
            Self::SettlementApprove { .. } => "settlement_approve",
            Self::MintSettlement { .. } => "mint_settlement",
        }
    }
}

// ─── Replay ──────────────────────────────────────────────────────────

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub index: usize,
    pub action: &'static str,
    /// `Ok(detail)` on success, `Err(code)` on rejection.
    pub result: Result<String, String>,
}

/// Result of a complete replay.
#[derive(Debug)]
pub struct ScenarioReport {
    pub outcomes: Vec<StepOutcome>,
    pub snapshot: PlatformSnapshot,
    pub violations: Vec<String>,
}

/// Load a scenario file and its platform configuration, then replay it.
pub fn replay_file(path: &Path) -> Result<ScenarioReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    let scenario: Scenario = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing scenario {}", path.display()))?;
    let config_path = crate::resolve_relative_to(path, &scenario.config);
    let config = PlatformConfig::from_yaml_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    replay(&config, &scenario)
}

/// Replay `scenario` against a fresh platform built from `config`.
///
/// Stops at the first step whose outcome differs from its expectation.
pub fn replay(config: &PlatformConfig, scenario: &Scenario) -> Result<ScenarioReport> {
    let clock = ManualClock::new(scenario.start);
    let mut platform = Platform::new(config, Arc::new(clock.clone()))?;
    let mut outcomes = Vec::with_capacity(scenario.steps.len());

    for (i, step) in scenario.steps.iter().enumerate() {
        let index = i + 1;
        let result = match &step.action {
            Action::AdvanceTime { secs } => clock
                .advance_secs(*secs)
                .map(|now| format!("clock at {now}"))
                .map_err(|e| e.kind().to_string()),
            action => {
                let Some(caller) = &step.caller else {
                    bail!("step {index} ({}): caller is required", action.name());
                };
                apply(&mut platform, caller, action).map_err(|e| {
                    tracing::debug!(step = index, error = %e, "step rejected");
                    e.kind().to_string()
                })
            }
        };

        match (&result, &step.expect) {
            (Ok(_), None) => {}
            (Err(code), Some(expected)) if code == expected => {}
            (Ok(detail), Some(expected)) => bail!(
                "step {index} ({}): expected {expected}, but it succeeded: {detail}",
                step.action.name()
            ),
            (Err(code), expected) => bail!(
                "step {index} ({}): failed with {code}, expected {}",
                step.action.name(),
                expected.as_deref().unwrap_or("success")
            ),
        }

        outcomes.push(StepOutcome {
            index,
            action: step.action.name(),
            result,
        });
    }

    Ok(ScenarioReport {
        outcomes,
        snapshot: platform.snapshot(),
        violations: platform.check_invariants(),
    })
}

fn apply(platform: &mut Platform, caller: &Address, action: &Action) -> FosResult<String> {
    match action {
        Action::AdvanceTime { .. } => Ok(String::new()),
        Action::AddIdentity {
            address,
            expiry,
            country,
        } => {
            let identity =
                platform.add_identity(caller, address.clone(), *expiry, country.clone())?;
            Ok(format!("{} verified until {}", identity.address, identity.expiry_date))
        }
        Action::RemoveIdentity { address } => {
            platform.remove_identity(caller, address)?;
            Ok(format!("{address} removed"))
        }
        Action::RenewIdentity { address, expiry } => {
            platform.renew_identity(caller, address, *expiry)?;
            Ok(format!("{address} renewed until {expiry}"))
        }
        Action::Transfer { to, units } => {
            platform.transfer(caller, to, *units)?;
            Ok(format!("{units} units to {to}"))
        }
        Action::Approve { spender, units } => {
            platform.approve(caller, spender, *units)?;
            Ok(format!("{spender} may spend {units} units"))
        }
        Action::TransferFrom { from, to, units } => {
            platform.transfer_from(caller, from, to, *units)?;
            Ok(format!("{units} units from {from} to {to}"))
        }
        Action::Buy { units } => {
            let cost = platform.buy_tokens(caller, *units)?;
            Ok(format!("{units} units for {cost}"))
        }
        Action::CloseSale => {
            platform.close_sale(caller)?;
            Ok("sale closed".to_string())
        }
        Action::Withdraw { to } => {
            let amount = platform.withdraw_funds(caller, to)?;
            Ok(format!("{amount} withdrawn to {to}"))
        }
        Action::Deposit { amount } => {
            let price = platform.deposit_proceeds(caller, *amount)?;
            Ok(format!("{amount} deposited, final price per unit {price}"))
        }
        Action::Redeem { units } => {
            let payout = platform.redeem(caller, *units)?;
            Ok(format!("{units} units redeemed for {payout}"))
        }
        Action::Propose {
            kind,
            description,
            payload,
        } => {
            let bytes = decode_hex_payload(payload)?;
            let proposal = platform.create_proposal(caller, *kind, description, &bytes)?;
            Ok(format!(
                "{} ({}) open until {}",
                proposal.id, proposal.kind, proposal.voting_ends
            ))
        }
        Action::Vote { proposal, support } => {
            let record = platform.vote(caller, *proposal, *support)?;
            let side = if record.support { "for" } else { "against" };
            Ok(format!("{} {side} {proposal}", record.weight))
        }
        Action::Execute { proposal } => {
            let p = platform.execute_proposal(caller, *proposal)?;
            Ok(format!("{} {}", p.id, p.status))
        }
        Action::Finalize { proposal } => {
            let p = platform.finalize_proposal(caller, *proposal)?;
            Ok(format!("{} {}", p.id, p.status))
        }
        Action::Cancel { proposal } => {
            let p = platform.cancel_proposal(caller, *proposal)?;
            Ok(format!("{} {}", p.id, p.status))
        }
        Action::SettlementApprove { spender, amount } => {
            platform.settlement_approve(caller, spender, *amount)?;
            Ok(format!("{spender} may spend {amount}"))
        }
        Action::MintSettlement { to, amount } => {
            platform.mint_settlement(caller, to, *amount)?;
            Ok(format!("{amount} minted to {to}"))
        }
    }
}

/// Execute the scenario subcommand.
pub fn run_scenario(args: &ScenarioArgs) -> Result<u8> {
    let report = replay_file(&args.path)?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(detail) => println!("[{:>3}] {:<18} ok        {detail}", outcome.index, outcome.action),
            Err(code) => println!("[{:>3}] {:<18} rejected  {code}", outcome.index, outcome.action),
        }
    }

    let json = if args.compact {
        serde_json::to_string(&report.snapshot)?
    } else {
        serde_json::to_string_pretty(&report.snapshot)?
    };
    println!("{json}");

    if report.violations.is_empty() {
        println!("OK: {} steps, invariants hold", report.outcomes.len());
        Ok(0)
    } else {
        for violation in &report.violations {
            println!("VIOLATION: {violation}");
        }
        Ok(1)
    }
}
