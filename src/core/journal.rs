use crate::core::arbiter::CargoArbiter;
use crate::domain::model::Mutation;
use crate::utils::error::{CargoError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};

/// Game journal events the monitor understands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event")]
pub enum JournalEvent {
    Docked {
        #[serde(rename = "StationType", default)]
        station_type: Option<String>,
        #[serde(rename = "StationName", default)]
        station_name: Option<String>,
    },
    Undocked,
    MarketBuy {
        #[serde(rename = "Type")]
        commodity: String,
        #[serde(rename = "Count")]
        count: u64,
    },
    MarketSell {
        #[serde(rename = "Type")]
        commodity: String,
        #[serde(rename = "Count")]
        count: u64,
    },
    CargoTransfer {
        #[serde(rename = "Transfers")]
        transfers: Vec<CargoTransferItem>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CargoTransferItem {
    #[serde(rename = "Type")]
    pub commodity: String,
    #[serde(rename = "Count")]
    pub count: u64,
    #[serde(rename = "Direction")]
    pub direction: TransferDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    ToCarrier,
    ToShip,
    #[serde(other)]
    Unknown,
}

impl JournalEvent {
    /// Entries without an `event` field are treated as [`JournalEvent::Other`].
    pub fn from_entry(entry: &Value) -> Result<Self> {
        if entry.get("event").and_then(|v| v.as_str()).is_none() {
            return Ok(JournalEvent::Other);
        }
        JournalEvent::deserialize(entry)
            .map_err(|e| CargoError::malformed(format!("journal entry: {}", e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalOutcome {
    Applied,
    Ignored,
    /// The caller should fetch a fresh payload from the companion API.
    RefreshRequested,
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    /// Age after which unrelated gameplay events ask for a refresh.
    pub refresh_interval: Duration,
    /// Age after which a commander login asks for a refresh.
    pub stale_after: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::seconds(7200),
            stale_after: Duration::seconds(12 * 3600),
        }
    }
}

#[derive(Debug, Default)]
struct CommanderState {
    commander: Option<String>,
    docked_on_own_carrier: bool,
}

/// Keeps the shared inventory in step with live journal events between
/// companion API syncs.
#[derive(Debug)]
pub struct CargoMonitor {
    arbiter: Arc<CargoArbiter>,
    settings: MonitorSettings,
    state: Mutex<CommanderState>,
}

impl CargoMonitor {
    pub fn new(arbiter: Arc<CargoArbiter>, settings: MonitorSettings) -> Self {
        Self {
            arbiter,
            settings,
            state: Mutex::new(CommanderState::default()),
        }
    }

    pub fn is_docked_on_own_carrier(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .docked_on_own_carrier
    }

    pub fn commander(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .commander
            .clone()
    }

    pub fn process(&self, cmdr: &str, station: Option<&str>, entry: &Value) -> Result<JournalOutcome> {
        self.process_at(cmdr, station, entry, Utc::now())
    }

    pub fn process_at(
        &self,
        cmdr: &str,
        station: Option<&str>,
        entry: &Value,
        now: DateTime<Utc>,
    ) -> Result<JournalOutcome> {
        // 狀態鎖只在決策時持有，寫入與通知在釋放後進行
        let (refresh, outcome, deltas) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let refresh = self.track_commander(&mut state, cmdr, now);
            let event = JournalEvent::from_entry(entry)?;
            let (outcome, deltas) = self.decide(&mut state, event, station, now);
            (refresh, outcome, deltas)
        };

        if !deltas.is_empty() {
            self.apply(&deltas);
        }

        Ok(if refresh {
            JournalOutcome::RefreshRequested
        } else {
            outcome
        })
    }

    fn decide(
        &self,
        state: &mut CommanderState,
        event: JournalEvent,
        station: Option<&str>,
        now: DateTime<Utc>,
    ) -> (JournalOutcome, Vec<(String, i64)>) {
        match event {
            JournalEvent::Docked {
                station_type,
                station_name,
            } => {
                let name = station_name.as_deref().or(station);
                let own = station_type.as_deref() == Some("FleetCarrier")
                    && name.is_some_and(|name| self.is_own_carrier(name));
                if own != state.docked_on_own_carrier {
                    tracing::info!(docked_on_own_carrier = own, "Docking state changed");
                }
                state.docked_on_own_carrier = own;
                (JournalOutcome::Applied, Vec::new())
            }
            JournalEvent::Undocked => {
                state.docked_on_own_carrier = false;
                (JournalOutcome::Applied, Vec::new())
            }
            JournalEvent::MarketBuy { commodity, count } => {
                if !state.docked_on_own_carrier {
                    (JournalOutcome::Ignored, Vec::new())
                } else {
                    (JournalOutcome::Applied, vec![(commodity, -signed(count))])
                }
            }
            JournalEvent::MarketSell { commodity, count } => {
                if !state.docked_on_own_carrier {
                    (JournalOutcome::Ignored, Vec::new())
                } else {
                    (JournalOutcome::Applied, vec![(commodity, signed(count))])
                }
            }
            JournalEvent::CargoTransfer { transfers } => {
                if !state.docked_on_own_carrier {
                    tracing::warn!(
                        "Received 'CargoTransfer' without being marked as docked on own carrier"
                    );
                    state.docked_on_own_carrier = true;
                }
                let deltas = transfers
                    .into_iter()
                    .filter_map(|t| match t.direction {
                        TransferDirection::ToCarrier => Some((t.commodity, signed(t.count))),
                        TransferDirection::ToShip => Some((t.commodity, -signed(t.count))),
                        TransferDirection::Unknown => None,
                    })
                    .collect();
                (JournalOutcome::Applied, deltas)
            }
            JournalEvent::Other => {
                if !state.docked_on_own_carrier
                    && self.arbiter.is_sync_stale(self.settings.refresh_interval, now)
                {
                    tracing::debug!("Requesting carrier refresh, last sync is too old");
                    (JournalOutcome::RefreshRequested, Vec::new())
                } else {
                    (JournalOutcome::Ignored, Vec::new())
                }
            }
        }
    }

    fn track_commander(&self, state: &mut CommanderState, cmdr: &str, now: DateTime<Utc>) -> bool {
        match state.commander.as_deref() {
            Some(known) if known == cmdr => false,
            Some(_) => {
                tracing::info!("New CMDR detected {}. Resetting fleet carrier data.", cmdr);
                state.commander = Some(cmdr.to_string());
                state.docked_on_own_carrier = false;
                true
            }
            None => {
                state.commander = Some(cmdr.to_string());
                self.arbiter.is_sync_stale(self.settings.stale_after, now)
            }
        }
    }

    fn is_own_carrier(&self, station: &str) -> bool {
        self.arbiter
            .read(|call_sign, _| call_sign.is_some_and(|own| own.eq_ignore_ascii_case(station)))
    }

    fn apply(&self, deltas: &[(String, i64)]) -> bool {
        let result = self.arbiter.read_modify_write(|_, tally| {
            let mut next = tally.clone();
            for (commodity, delta) in deltas {
                next.adjust(commodity, *delta);
            }
            Ok::<_, Infallible>(Mutation::Replace(next))
        });
        match result {
            Ok(changed) => changed,
            Err(never) => match never {},
        }
    }
}

fn signed(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
