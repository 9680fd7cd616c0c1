use std::collections::BTreeMap;

use common_types::Trade;

/// Trades keyed by the slot they executed in. Ordered by slot so every
/// downstream pass walks slots deterministically.
pub type SlotGroups = BTreeMap<u64, Vec<Trade>>;

/// Group trades by execution slot. Nothing is filtered or deduplicated; trades
/// keep their input order inside a slot.
pub fn group_by_slot<I>(trades: I) -> SlotGroups
where
    I: IntoIterator<Item = Trade>,
{
    let mut groups = SlotGroups::new();
    for trade in trades {
        groups.entry(trade.slot).or_default().push(trade);
    }
    groups
}
