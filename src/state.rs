use chrono::Utc;
use tracing::{info, warn};

use crate::aggregate;
use crate::error::{DeliveryError, Result};
use crate::import::{self, ColumnAliases, Row};
use crate::models::{Customer, Roster, ScanEvent, ScanOutcome, Totals};
use crate::reconcile;

/// Roster state owned by whatever drives the display.
///
/// Every mutation goes through here so the totals are rebuilt from the
/// customer list each time.
#[derive(Debug, Clone, Default)]
pub struct DeliveryState {
    roster: Roster,
    aliases: ColumnAliases,
}

impl DeliveryState {
    pub fn new(aliases: ColumnAliases) -> Self {
        Self {
            roster: Roster::default(),
            aliases,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn customers(&self) -> &[Customer] {
        &self.roster.customers
    }

    pub fn totals(&self) -> Totals {
        self.roster.totals
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Replaces the roster with freshly imported rows.
    ///
    /// On `EmptyImport` the current roster stays as it was.
    pub fn import_rows(&mut self, rows: &[Row]) -> Result<Totals> {
        let customers = match import::normalize_rows(rows, &self.aliases) {
            Ok(customers) => customers,
            Err(err) => {
                warn!(error = %err, "import rejected, keeping current roster");
                return Err(err);
            }
        };

        self.roster = Roster {
            totals: aggregate::totals(&customers),
            customers,
        };
        info!(
            customers = self.roster.totals.total_customers,
            parcels = self.roster.totals.total_parcels,
            "roster loaded"
        );
        Ok(self.roster.totals)
    }

    pub fn apply_scan(&mut self, event: &ScanEvent) -> Result<ScanOutcome> {
        let outcome = reconcile::reconcile(&mut self.roster.customers, &event.code, Utc::now());
        if let Err(DeliveryError::CodeNotFound { code }) = &outcome {
            warn!(source = %event.source, %code, "scanned code matches no customer");
        }
        let outcome = outcome?;

        self.roster.totals = aggregate::totals(&self.roster.customers);
        info!(
            source = %event.source,
            customer = %outcome.customer.name,
            scanned = outcome.customer.scanned_parcels,
            parcels = outcome.customer.parcels,
            "scan applied"
        );
        Ok(outcome)
    }

    pub fn reset(&mut self) {
        info!("roster reset");
        self.roster = Roster::default();
    }
}
