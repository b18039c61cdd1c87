use anyhow::Result;
use fleet_carrier_cargo::{ingest_payload, CargoArbiter, CargoMonitor, JournalOutcome, MonitorSettings};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const JOURNAL: &str = r#"
{"timestamp":"2025-03-01T10:00:00Z","event":"LoadGame","Commander":"Jameson"}
{"timestamp":"2025-03-01T10:05:00Z","event":"Docked","StationName":"K7Q-BQL","StationType":"FleetCarrier"}
{"timestamp":"2025-03-01T10:06:00Z","event":"MarketBuy","Type":"tritium","Type_Localised":"Tritium","Count":6,"BuyPrice":41000}
{"timestamp":"2025-03-01T10:07:00Z","event":"CargoTransfer","Transfers":[{"Type":"steel","Count":40,"Direction":"tocarrier"},{"Type":"gold","Count":2,"Direction":"toship"}]}
{"timestamp":"2025-03-01T10:08:00Z","event":"MarketSell","Type":"silver","Count":15,"SellPrice":4800}
{"timestamp":"2025-03-01T10:09:00Z","event":"Undocked","StationName":"K7Q-BQL"}
{"timestamp":"2025-03-01T10:10:00Z","event":"MarketBuy","Type":"tritium","Count":50,"BuyPrice":41000}
"#;

fn seeded_arbiter() -> Result<Arc<CargoArbiter>> {
    let arbiter = CargoArbiter::shared();
    ingest_payload(
        &arbiter,
        &json!({
            "name": {"callsign": "K7Q-BQL"},
            "cargo": [
                {"commodity": "Tritium", "qty": 106},
                {"commodity": "Gold", "qty": 2}
            ]
        }),
    )?;
    Ok(arbiter)
}

#[test]
fn test_replay_journal_against_shared_inventory() -> Result<()> {
    let arbiter = seeded_arbiter()?;
    let changes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&changes);
    arbiter.add_on_cargo_change_handler(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let monitor = CargoMonitor::new(Arc::clone(&arbiter), MonitorSettings::default());
    let mut outcomes = Vec::new();
    for line in JOURNAL.lines().filter(|l| !l.trim().is_empty()) {
        let entry: Value = serde_json::from_str(line)?;
        outcomes.push(monitor.process("Jameson", None, &entry)?);
    }

    assert_eq!(
        outcomes,
        vec![
            JournalOutcome::Ignored,
            JournalOutcome::Applied,
            JournalOutcome::Applied,
            JournalOutcome::Applied,
            JournalOutcome::Applied,
            JournalOutcome::Applied,
            JournalOutcome::Ignored,
        ]
    );

    let snapshot = arbiter.snapshot();
    assert_eq!(snapshot.tally().get("tritium"), 100);
    assert_eq!(snapshot.tally().get("steel"), 40);
    assert_eq!(snapshot.tally().get("silver"), 15);
    assert!(!snapshot.tally().contains("gold"));

    // MarketBuy, CargoTransfer, MarketSell
    assert_eq!(changes.load(Ordering::SeqCst), 3);
    Ok(())
}

#[test]
fn test_plugins_share_one_inventory() -> Result<()> {
    let arbiter = seeded_arbiter()?;

    let plugin_a = Arc::clone(&arbiter);
    let plugin_b = Arc::clone(&arbiter);

    plugin_a.inventory(|call_sign, tally| {
        assert_eq!(call_sign, Some("K7Q-BQL"));
        tally.add("bauxite", 300);
        true
    });

    let seen = plugin_b.read(|_, tally| tally.get("bauxite"));
    assert_eq!(seen, 300);
    Ok(())
}
