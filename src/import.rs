use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{DeliveryError, Result};
use crate::models::Customer;

/// A loosely typed spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(n) => !n.is_finite(),
        }
    }

    fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Column name to cell, exactly as the spreadsheet reader produced it.
pub type Row = HashMap<String, CellValue>;

/// Accepted header spellings, in priority order. Matching ignores case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAliases {
    pub name: Vec<String>,
    pub parcels: Vec<String>,
    pub waybill: Vec<String>,
    pub placeholder_name: String,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            name: to_owned(&["client", "nom", "name", "receiver name", "destinataire"]),
            parcels: to_owned(&["colis", "parcels", "nombre", "pieces", "pièces"]),
            waybill: to_owned(&[
                "waybill",
                "waybill number",
                "waybill_number",
                "awb",
                "numéro de lettre de transport",
                "ltr",
                "tracking",
            ]),
            placeholder_name: "Client sans nom".to_string(),
        }
    }
}

impl ColumnAliases {
    /// Puts caller-supplied spellings ahead of the built-in ones.
    pub fn with_extra(mut self, name: &[String], parcels: &[String], waybill: &[String]) -> Self {
        prepend(&mut self.name, name);
        prepend(&mut self.parcels, parcels);
        prepend(&mut self.waybill, waybill);
        self
    }
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn prepend(target: &mut Vec<String>, extra: &[String]) {
    let mut merged: Vec<String> = Vec::with_capacity(extra.len() + target.len());
    for alias in extra.iter().map(|value| value.trim().to_lowercase()).chain(target.drain(..)) {
        if !alias.is_empty() && !merged.contains(&alias) {
            merged.push(alias);
        }
    }
    *target = merged;
}

/// Turns spreadsheet rows into roster customers.
///
/// Ids are the 1-based row position. An empty input is `EmptyImport`.
pub fn normalize_rows(rows: &[Row], aliases: &ColumnAliases) -> Result<Vec<Customer>> {
    let customers: Vec<Customer> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| normalize_row(index + 1, row, aliases))
        .collect();

    if customers.is_empty() {
        return Err(DeliveryError::EmptyImport);
    }

    info!(customers = customers.len(), "normalized imported rows");
    Ok(customers)
}

fn normalize_row(position: usize, row: &Row, aliases: &ColumnAliases) -> Customer {
    let by_header: HashMap<String, &CellValue> = row
        .iter()
        .map(|(header, value)| (header.trim().to_lowercase(), value))
        .collect();

    let name = first_present(&by_header, &aliases.name)
        .map(CellValue::as_text)
        .unwrap_or_else(|| aliases.placeholder_name.clone());
    let parcels = first_present(&by_header, &aliases.parcels)
        .map(parse_parcels)
        .unwrap_or(0);
    let waybill = first_present(&by_header, &aliases.waybill)
        .map(CellValue::as_text)
        .unwrap_or_default();

    debug!(position, %name, parcels, %waybill, "row normalized");
    Customer::new(position.to_string(), waybill, name, parcels)
}

fn first_present<'a>(
    by_header: &HashMap<String, &'a CellValue>,
    aliases: &[String],
) -> Option<&'a CellValue> {
    aliases
        .iter()
        .filter_map(|alias| by_header.get(alias.as_str()).copied())
        .find(|value| !value.is_blank())
}

/// Integer parse that accepts a leading numeric prefix ("3 colis" is 3).
/// Negative, fractional remainder and garbage all collapse to a count >= 0.
pub fn parse_parcels(value: &CellValue) -> u32 {
    match value {
        CellValue::Number(n) if n.is_finite() && *n > 0.0 => n.trunc().min(u32::MAX as f64) as u32,
        CellValue::Number(_) => 0,
        CellValue::Text(text) => {
            let trimmed = text.trim();
            let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
            let prefix: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();
            if prefix.is_empty() {
                return 0;
            }
            prefix.parse::<u64>().map(|n| n.min(u32::MAX as u64) as u32).unwrap_or(u32::MAX)
        }
    }
}
