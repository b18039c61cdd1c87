use crate::core::arbiter::CargoArbiter;
use crate::domain::model::{CargoTally, InventorySnapshot};
use crate::domain::ports::CarrierSource;
use crate::utils::error::{CargoError, Result};
use chrono::{SubsecRound, Utc};
use serde_json::Value;

/// Payload after normalization, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPayload {
    pub call_sign: Option<String>,
    pub tally: CargoTally,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub changed: bool,
    pub commodities: usize,
    pub skipped: usize,
}

/// Folds a list of commodity records into a tally.
///
/// Each record needs a name (`commodity` or `name`) and a non-negative
/// integer quantity (`qty` or `quantity`); anything else on the record is
/// ignored. Records missing either are skipped, duplicates are summed.
pub fn normalize_records(records: &Value) -> Result<(CargoTally, usize)> {
    let items = records
        .as_array()
        .ok_or_else(|| CargoError::malformed("cargo records must be a JSON array"))?;

    let mut tally = CargoTally::new();
    let mut skipped = 0;

    for (index, item) in items.iter().enumerate() {
        let name = item
            .get("commodity")
            .or_else(|| item.get("name"))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let qty = item
            .get("qty")
            .or_else(|| item.get("quantity"))
            .and_then(|v| v.as_u64());

        match (name, qty) {
            (Some(name), Some(qty)) => tally.add(name, qty),
            _ => {
                skipped += 1;
                tracing::warn!(index, record = %item, "Skipping malformed cargo record");
            }
        }
    }

    Ok((tally, skipped))
}

/// Normalizes a companion API fleet-carrier payload:
/// `{"name": {"callsign": ..}, "cargo": [..]}`.
///
/// A top-level `callsign` string is accepted as well.
pub fn normalize_payload(payload: &Value) -> Result<NormalizedPayload> {
    let object = payload
        .as_object()
        .ok_or_else(|| CargoError::malformed("fleet carrier payload must be a JSON object"))?;

    let call_sign = object
        .get("name")
        .and_then(|name| name.get("callsign"))
        .or_else(|| object.get("callsign"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let records = object
        .get("cargo")
        .ok_or_else(|| CargoError::malformed("fleet carrier payload has no cargo list"))?;
    let (tally, skipped) = normalize_records(records)?;

    Ok(NormalizedPayload {
        call_sign,
        tally,
        skipped,
    })
}

/// Commits a normalized payload as the new authoritative inventory and
/// records the sync time.
pub fn commit(arbiter: &CargoArbiter, payload: NormalizedPayload) -> IngestReport {
    let commodities = payload.tally.len();
    let snapshot = InventorySnapshot::new(payload.call_sign, payload.tally);

    let changed = arbiter.resync(snapshot, Utc::now().trunc_subsecs(0));

    tracing::info!(
        changed,
        commodities,
        skipped = payload.skipped,
        "Fleet carrier inventory synced"
    );

    IngestReport {
        changed,
        commodities,
        skipped: payload.skipped,
    }
}

/// Ingests records with a call sign known from elsewhere.
pub fn ingest_records(
    arbiter: &CargoArbiter,
    call_sign: Option<&str>,
    records: &Value,
) -> Result<IngestReport> {
    let (tally, skipped) = normalize_records(records)?;
    Ok(commit(
        arbiter,
        NormalizedPayload {
            call_sign: call_sign.map(str::to_string),
            tally,
            skipped,
        },
    ))
}

pub fn ingest_payload(arbiter: &CargoArbiter, payload: &Value) -> Result<IngestReport> {
    let normalized = normalize_payload(payload)?;
    Ok(commit(arbiter, normalized))
}

pub async fn ingest_from(arbiter: &CargoArbiter, source: &dyn CarrierSource) -> Result<IngestReport> {
    tracing::debug!("Fetching fleet carrier data from {}", source.describe());
    let payload = source.fetch().await?;
    ingest_payload(arbiter, &payload)
}
