use anyhow::Result;
use fleet_carrier_cargo::core::ingest::{ingest_payload, ingest_records, normalize_records};
use fleet_carrier_cargo::{CargoArbiter, CargoTally, FileCarrierSource};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn counting(arbiter: &CargoArbiter) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    arbiter.add_on_cargo_change_handler(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    calls
}

#[test]
fn test_ingest_records_with_call_sign() -> Result<()> {
    let arbiter = CargoArbiter::new();

    ingest_records(
        &arbiter,
        Some("CarrierOne"),
        &json!([{"commodity": "Tritium", "qty": 106}]),
    )?;

    let snapshot = arbiter.snapshot();
    assert_eq!(snapshot.call_sign(), Some("CarrierOne"));
    let expected: CargoTally = vec![("tritium".to_string(), 106)].into_iter().collect();
    assert_eq!(snapshot.tally(), &expected);
    Ok(())
}

#[test]
fn test_same_payload_twice_notifies_once() -> Result<()> {
    let arbiter = CargoArbiter::new();
    let calls = counting(&arbiter);
    let payload = json!({
        "name": {"callsign": "K7Q-BQL"},
        "cargo": [
            {"commodity": "Tritium", "qty": 106},
            {"commodity": "Steel", "qty": 40}
        ]
    });

    let first = ingest_payload(&arbiter, &payload)?;
    let second = ingest_payload(&arbiter, &payload)?;

    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_sequence_of_payloads_ends_at_last_payload() -> Result<()> {
    let arbiter = CargoArbiter::new();
    let payloads = [
        json!([{"commodity": "Tritium", "qty": 10}, {"commodity": "Gold", "qty": 5}]),
        json!([{"commodity": "TRITIUM", "qty": 3}, {"commodity": "tritium", "qty": 4}]),
        json!([{"commodity": "Silver", "qty": 0}, {"commodity": "Steel", "qty": 12}, {"bogus": true}]),
    ];

    for payload in &payloads {
        ingest_records(&arbiter, Some("CarrierOne"), payload)?;
        let (expected, _) = normalize_records(payload)?;
        assert_eq!(arbiter.snapshot().tally(), &expected);
    }

    let snapshot = arbiter.snapshot();
    assert_eq!(snapshot.tally().len(), 1);
    assert_eq!(snapshot.tally().get("steel"), 12);
    assert!(!snapshot.tally().contains("silver"));
    Ok(())
}

#[test]
fn test_failing_listener_does_not_block_others() -> Result<()> {
    let arbiter = CargoArbiter::new();
    arbiter.add_on_cargo_change_handler(|| panic!("H1 raises"));
    let calls = counting(&arbiter);

    let report = ingest_records(
        &arbiter,
        Some("CarrierOne"),
        &json!([{"commodity": "Tritium", "qty": 106}]),
    )?;

    assert!(report.changed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(arbiter.subscriber_count(), 2);
    Ok(())
}

#[test]
fn test_zeroing_commodity_notifies_and_removes_key() -> Result<()> {
    let arbiter = CargoArbiter::new();
    ingest_records(&arbiter, Some("CarrierOne"), &json!([{"commodity": "Tritium", "qty": 106}]))?;
    let calls = counting(&arbiter);

    arbiter.inventory(|_, tally| {
        tally.set("tritium", 0);
        true
    });

    assert!(!arbiter.snapshot().tally().contains("tritium"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    arbiter.inventory(|_, _| false);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_removed_handler_is_not_called() -> Result<()> {
    let arbiter = CargoArbiter::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = arbiter.add_on_cargo_change_handler(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(arbiter.remove_on_cargo_change_handler(id));
    ingest_records(&arbiter, None, &json!([{"commodity": "Gold", "qty": 1}]))?;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_ingest_from_file_source() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("fleetcarrier.json");
    tokio::fs::write(
        &path,
        serde_json::to_vec(&json!({
            "name": {"callsign": "K7Q-BQL", "vanityName": "ENDURANCE"},
            "cargo": [
                {"commodity": "Tritium", "qty": 60, "value": 0},
                {"commodity": "tritium", "qty": 46, "value": 0},
                {"commodity": "CMMComposite", "qty": 1200}
            ]
        }))?,
    )
    .await?;

    let arbiter = CargoArbiter::new();
    let source = FileCarrierSource::new(&path);
    let report = fleet_carrier_cargo::ingest_from(&arbiter, &source).await?;

    assert!(report.changed);
    assert_eq!(report.commodities, 2);
    let snapshot = arbiter.snapshot();
    assert_eq!(snapshot.call_sign(), Some("K7Q-BQL"));
    assert_eq!(snapshot.tally().get("tritium"), 106);
    assert_eq!(snapshot.tally().get("cmmcomposite"), 1200);
    Ok(())
}
