use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: String,
    pub waybill_number: String,
    pub name: String,
    pub parcels: u32,
    pub scanned_parcels: u32,
    pub scanned: bool,
    pub scan_time: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn new(
        id: impl Into<String>,
        waybill_number: impl Into<String>,
        name: impl Into<String>,
        parcels: u32,
    ) -> Self {
        let mut customer = Self {
            id: id.into(),
            waybill_number: waybill_number.into(),
            name: name.into(),
            parcels,
            scanned_parcels: 0,
            scanned: false,
            scan_time: None,
        };
        customer.refresh_scanned();
        customer
    }

    /// Re-derives `scanned` from the counters. Call after any counter change.
    pub fn refresh_scanned(&mut self) {
        self.scanned = self.scanned_parcels >= self.parcels;
    }

    pub fn remaining(&self) -> u32 {
        self.parcels.saturating_sub(self.scanned_parcels)
    }
}

/// Stat-card numbers, always recomputed from the customer list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total_customers: usize,
    pub total_parcels: u64,
    pub scanned_parcels: u64,
}

/// One imported delivery run. Customers keep spreadsheet row order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    pub customers: Vec<Customer>,
    pub totals: Totals,
}

impl Roster {
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Camera,
    KeyboardWedge,
    Manual,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Camera => "camera",
            Self::KeyboardWedge => "keyboard-wedge",
            Self::Manual => "manual",
        };
        f.write_str(label)
    }
}

/// A single opaque code handed over by a scan source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub source: SourceKind,
    pub code: String,
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub customer: Customer,
    pub complete: bool,
    pub remaining: u32,
    /// The customer was already complete; the scan did not move the counter.
    pub over_scan: bool,
}
