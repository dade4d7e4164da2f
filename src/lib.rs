//! Delivery check-in: reconcile scanned parcels against an imported roster.
//!
//! The core is synchronous and in-memory. Spreadsheet reading, scanning
//! devices and rendering sit at the edges behind `sheet`, `scanner` and
//! `report`.

pub mod aggregate;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod reconcile;
pub mod report;
pub mod scanner;
pub mod session;
pub mod sheet;
pub mod state;

pub use error::DeliveryError;
pub use import::ColumnAliases;
pub use models::{Customer, Roster, ScanEvent, ScanOutcome, SourceKind, Totals};
pub use state::DeliveryState;
