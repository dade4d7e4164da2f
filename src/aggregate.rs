use crate::models::{Customer, Totals};

/// Recomputes the roster totals from scratch.
pub fn totals(customers: &[Customer]) -> Totals {
    Totals {
        total_customers: customers.len(),
        total_parcels: customers.iter().map(|c| u64::from(c.parcels)).sum(),
        scanned_parcels: customers.iter().map(|c| u64::from(c.scanned_parcels)).sum(),
    }
}
