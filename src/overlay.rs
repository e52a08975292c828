//! Transient completion overrides for a single habit's calendar, keyed by date.
//!
//! Never a durable store: overrides only bridge the gap between a tap and the
//! next authoritative list from the backend.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct OptimisticOverlay {
    overrides: BTreeMap<String, bool>,
    pending: BTreeSet<String>,
}

impl OptimisticOverlay {
    /// Records an override and marks the date in flight. Returns `false`, and
    /// changes nothing, while an earlier toggle for the same date is pending.
    pub fn begin(&mut self, date: &str, completed: bool) -> bool {
        if self.pending.contains(date) {
            return false;
        }
        self.pending.insert(date.to_string());
        self.overrides.insert(date.to_string(), completed);
        true
    }

    /// The call succeeded; the override stays until fresh data replaces it.
    pub fn settle(&mut self, date: &str) {
        self.pending.remove(date);
    }

    pub fn rollback(&mut self, date: &str) {
        self.pending.remove(date);
        self.overrides.remove(date);
    }

    /// Authoritative data arrived. Overrides still awaiting their call survive.
    pub fn reconcile(&mut self) {
        let pending = &self.pending;
        self.overrides.retain(|date, _| pending.contains(date));
    }

    pub fn get(&self, date: &str) -> Option<bool> {
        self.overrides.get(date).copied()
    }

    pub fn is_pending(&self, date: &str) -> bool {
        self.pending.contains(date)
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty() && self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_tap_is_refused_while_pending() {
        let mut overlay = OptimisticOverlay::default();
        assert!(overlay.begin("2026-10-17", true));
        assert!(!overlay.begin("2026-10-17", false));
        assert_eq!(overlay.get("2026-10-17"), Some(true));

        overlay.settle("2026-10-17");
        assert!(overlay.begin("2026-10-17", false));
        assert_eq!(overlay.get("2026-10-17"), Some(false));
    }

    #[test]
    fn rollback_drops_override() {
        let mut overlay = OptimisticOverlay::default();
        overlay.begin("2026-10-16", true);
        overlay.rollback("2026-10-16");
        assert_eq!(overlay.get("2026-10-16"), None);
        assert!(overlay.is_empty());
    }

    #[test]
    fn reconcile_keeps_only_in_flight_overrides() {
        let mut overlay = OptimisticOverlay::default();
        overlay.begin("2026-10-15", true);
        overlay.settle("2026-10-15");
        overlay.begin("2026-10-16", true);

        overlay.reconcile();
        assert_eq!(overlay.get("2026-10-15"), None);
        assert_eq!(overlay.get("2026-10-16"), Some(true));
        assert!(overlay.is_pending("2026-10-16"));
    }
}
