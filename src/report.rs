use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{Customer, Roster, ScanOutcome, Totals};

pub fn stats_line(totals: &Totals) -> String {
    format!(
        "Customers: {}  Parcels: {}  Scanned: {}",
        totals.total_customers, totals.total_parcels, totals.scanned_parcels
    )
}

fn waybill_label(customer: &Customer) -> &str {
    if customer.waybill_number.is_empty() {
        "N/A"
    } else {
        &customer.waybill_number
    }
}

fn time_label(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn customer_list(customers: &[Customer]) -> String {
    let mut output = String::new();

    if customers.is_empty() {
        let _ = writeln!(output, "No customers loaded. Import a spreadsheet to start.");
        return output;
    }

    for customer in customers {
        let marker = if customer.scanned { "[x]" } else { "[ ]" };
        let _ = write!(
            output,
            "{} {} (waybill {}) {}/{} parcels",
            marker,
            customer.name,
            waybill_label(customer),
            customer.scanned_parcels,
            customer.parcels
        );
        if customer.remaining() > 0 {
            let _ = write!(output, ", {} missing", customer.remaining());
        }
        if let Some(time) = &customer.scan_time {
            let _ = write!(output, ", scanned at {}", time_label(time));
        }
        let _ = writeln!(output);
    }

    output
}

/// The card shown after a scan session closes on a customer.
pub fn scan_card(outcome: &ScanOutcome) -> String {
    let customer = &outcome.customer;
    let mut output = String::new();

    let status = if outcome.complete { "Complete" } else { "In progress" };
    let _ = writeln!(output, "Scan result: {status}");
    let _ = writeln!(output, "  Receiver:  {}", customer.name);
    let _ = writeln!(output, "  Waybill:   {}", waybill_label(customer));
    let _ = writeln!(output, "  Total:     {}", customer.parcels);
    let _ = writeln!(output, "  Scanned:   {}", customer.scanned_parcels);
    if outcome.remaining == 0 {
        let _ = writeln!(output, "  Missing:   0 (all parcels scanned)");
    } else {
        let _ = writeln!(output, "  Missing:   {} remaining", outcome.remaining);
    }
    if let Some(time) = &customer.scan_time {
        let _ = writeln!(output, "  Last scan: {}", time_label(time));
    }

    output
}

pub fn build_report(source_label: &str, roster: &Roster) -> String {
    let mut output = String::new();
    let totals = &roster.totals;

    let _ = writeln!(output, "# Delivery Check-in Report");
    let _ = writeln!(output, "Roster: {source_label}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Totals");
    let _ = writeln!(output, "- Customers: {}", totals.total_customers);
    let _ = writeln!(output, "- Parcels: {}", totals.total_parcels);
    let _ = writeln!(output, "- Scanned: {}", totals.scanned_parcels);

    let (complete, outstanding): (Vec<&Customer>, Vec<&Customer>) =
        roster.customers.iter().partition(|customer| customer.scanned);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Completed Customers");
    if complete.is_empty() {
        let _ = writeln!(output, "No customer fully scanned yet.");
    } else {
        for customer in &complete {
            let _ = writeln!(
                output,
                "- {} ({}): {} parcels",
                customer.name,
                waybill_label(customer),
                customer.parcels
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Outstanding Customers");
    if outstanding.is_empty() {
        let _ = writeln!(output, "Every parcel is accounted for.");
    } else {
        for customer in &outstanding {
            let _ = writeln!(
                output,
                "- {} ({}): {}/{} scanned, {} missing",
                customer.name,
                waybill_label(customer),
                customer.scanned_parcels,
                customer.parcels,
                customer.remaining()
            );
        }
    }

    let mut recent: Vec<&Customer> = roster
        .customers
        .iter()
        .filter(|customer| customer.scan_time.is_some())
        .collect();
    recent.sort_by(|a, b| b.scan_time.cmp(&a.scan_time));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Scans");
    if recent.is_empty() {
        let _ = writeln!(output, "No scans recorded.");
    } else {
        for customer in recent.iter().take(5) {
            if let Some(time) = &customer.scan_time {
                let _ = writeln!(output, "- {} at {}", customer.name, time_label(time));
            }
        }
    }

    output
}
