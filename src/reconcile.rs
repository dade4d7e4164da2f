use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{DeliveryError, Result};
use crate::models::{Customer, ScanOutcome};

/// Lowercases and drops whitespace plus the `-`, `_` and `/` separators.
pub fn normalize_code(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '_' | '/'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Index of the first customer the code matches, in roster order.
///
/// Waybill and id compare on normalized text. The name fallback is a plain
/// substring test against the trimmed, lowercased code, so a short code can
/// land on the wrong customer when names overlap.
pub fn find_customer(customers: &[Customer], raw_code: &str) -> Option<usize> {
    let code = normalize_code(raw_code);
    let needle = raw_code.trim().to_lowercase();
    if code.is_empty() && needle.is_empty() {
        return None;
    }

    customers.iter().position(|customer| {
        let waybill = normalize_code(&customer.waybill_number);
        (!code.is_empty() && !waybill.is_empty() && waybill == code)
            || (!code.is_empty() && normalize_code(&customer.id) == code)
            || (!needle.is_empty() && customer.name.trim().to_lowercase().contains(&needle))
    })
}

/// Counts one parcel against the matching customer.
///
/// The counter never passes `parcels`; extra scans of a complete customer are
/// absorbed and flagged as `over_scan`.
pub fn reconcile(
    customers: &mut [Customer],
    raw_code: &str,
    now: DateTime<Utc>,
) -> Result<ScanOutcome> {
    let index = find_customer(customers, raw_code).ok_or_else(|| DeliveryError::CodeNotFound {
        code: raw_code.trim().to_string(),
    })?;

    let customer = &mut customers[index];
    let over_scan = customer.scanned_parcels >= customer.parcels;
    customer.scanned_parcels = customer.scanned_parcels.saturating_add(1).min(customer.parcels);
    customer.refresh_scanned();
    customer.scan_time = Some(now);

    debug!(
        id = %customer.id,
        scanned = customer.scanned_parcels,
        parcels = customer.parcels,
        over_scan,
        "parcel reconciled"
    );

    Ok(ScanOutcome {
        complete: customer.scanned,
        remaining: customer.remaining(),
        over_scan,
        customer: customer.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Customer> {
        vec![
            Customer::new("1", "ABC123", "Boulangerie Dupont", 2),
            Customer::new("2", "AWB001", "Martin", 2),
            Customer::new("3", "", "Pharmacie Centrale", 1),
        ]
    }

    #[test]
    fn normalization_strips_case_spaces_and_separators() {
        assert_eq!(normalize_code("  ABC-123 "), "abc123");
        assert_eq!(normalize_code("abc 123"), "abc123");
        assert_eq!(normalize_code("ABC_123"), "abc123");
        assert_eq!(normalize_code("abc/123"), "abc123");
        assert_eq!(normalize_code("a\tb\nc"), "abc");
    }

    #[test]
    fn separator_variants_all_match_the_same_waybill() {
        let customers = roster();
        for code in ["ABC-123", "abc 123", "ABC_123", "abc/123"] {
            assert_eq!(find_customer(&customers, code), Some(0), "code {code}");
        }
    }

    #[test]
    fn matches_by_id() {
        assert_eq!(find_customer(&roster(), " 3 "), Some(2));
    }

    #[test]
    fn matches_by_name_substring() {
        assert_eq!(find_customer(&roster(), "Centrale"), Some(2));
    }

    #[test]
    fn name_fallback_keeps_separators() {
        // The name test uses the raw code, so a de-separated spelling misses.
        assert_eq!(find_customer(&roster(), "pharmacie-centrale"), None);
    }

    #[test]
    fn first_match_wins() {
        let customers = vec![
            Customer::new("1", "X1", "Martin Nord", 1),
            Customer::new("2", "X2", "Martin Sud", 1),
        ];
        assert_eq!(find_customer(&customers, "martin"), Some(0));
    }

    #[test]
    fn empty_waybill_does_not_match_separator_only_code() {
        let customers = vec![Customer::new("7", "", "Dupont", 1)];
        assert_eq!(find_customer(&customers, "--"), None);
        assert_eq!(find_customer(&customers, "   "), None);
    }

    #[test]
    fn scanning_to_completion() {
        let mut customers = roster();
        let now = Utc::now();

        let first = reconcile(&mut customers, "awb-001", now).unwrap();
        assert_eq!(first.customer.scanned_parcels, 1);
        assert!(!first.complete);
        assert!(!first.customer.scanned);
        assert_eq!(first.remaining, 1);
        assert_eq!(first.customer.scan_time, Some(now));

        let second = reconcile(&mut customers, "awb-001", now).unwrap();
        assert_eq!(second.customer.scanned_parcels, 2);
        assert!(second.complete);
        assert!(customers[1].scanned);
    }

    #[test]
    fn over_scan_is_clamped() {
        let mut customers = roster();
        let now = Utc::now();
        for _ in 0..5 {
            reconcile(&mut customers, "3", now).unwrap();
        }

        assert_eq!(customers[2].scanned_parcels, 1);
        assert!(customers[2].scanned);
        let again = reconcile(&mut customers, "3", now).unwrap();
        assert!(again.over_scan);
        assert_eq!(again.remaining, 0);
    }

    #[test]
    fn zero_parcel_customer_is_complete_on_first_scan() {
        let mut customers = vec![Customer::new("1", "EMPTY1", "Nobody", 0)];
        let outcome = reconcile(&mut customers, "empty1", Utc::now()).unwrap();
        assert_eq!(outcome.customer.scanned_parcels, 0);
        assert!(outcome.complete);
    }

    #[test]
    fn unknown_code_leaves_roster_untouched() {
        let mut customers = roster();
        let before = customers.clone();

        let err = reconcile(&mut customers, "zzz", Utc::now()).unwrap_err();

        assert!(matches!(err, DeliveryError::CodeNotFound { ref code } if code == "zzz"));
        assert_eq!(customers, before);
    }
}
