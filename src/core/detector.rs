use crate::domain::model::InventorySnapshot;

/// Structural comparison: same call sign and same quantities per commodity.
pub fn changed(old: &InventorySnapshot, new: &InventorySnapshot) -> bool {
    old.call_sign() != new.call_sign() || old.tally() != new.tally()
}
