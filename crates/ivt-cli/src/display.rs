//! Terminal rendering for records and batch results

use crate::batch::{ProgressSnapshot, RowError};
use crate::error::Result;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use ivt_common::{FieldValue, NormalizedTable, Record, StoredRecord};

/// Rows shown in the import preview
pub const PREVIEW_ROWS: usize = 10;

const MAX_CELL_WIDTH: usize = 40;

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn cell(value: Option<&FieldValue>) -> String {
    match value {
        None | Some(FieldValue::Null) => "-".to_string(),
        Some(value) => truncate_string(&value.to_string(), MAX_CELL_WIDTH),
    }
}

fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}

/// First rows of a normalized file, with a leading row number column
pub fn preview_table(data: &NormalizedTable, limit: usize) -> Table {
    let mut header = vec!["#".to_string()];
    header.extend(data.headers.iter().cloned());
    let mut table = new_table(header);

    for (index, record) in data.records.iter().take(limit).enumerate() {
        let mut row = vec![(index + 1).to_string()];
        row.extend(data.headers.iter().map(|name| cell(record.get(name))));
        table.add_row(row);
    }

    table
}

pub fn error_table(errors: &[RowError]) -> Table {
    let mut table = new_table(vec!["Row".to_string(), "Error".to_string()]);
    for error in errors {
        table.add_row(vec![error.row.to_string(), error.message.clone()]);
    }
    table
}

/// Listing columns: identifier fields first, then every other field in
/// first-seen order. Fields starting with `_` are hidden unless they hold
/// the identifier.
pub fn listing_columns(records: &[StoredRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();

    for id_field in records.iter().filter_map(|r| r.id_field.as_deref()) {
        if !columns.iter().any(|c| c == id_field) {
            columns.push(id_field.to_string());
        }
    }

    for name in records.iter().flat_map(|r| r.record.field_names()) {
        if !name.starts_with('_') && !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    }

    columns
}

pub fn listing_table(records: &[StoredRecord], columns: &[String]) -> Table {
    let mut table = new_table(columns.to_vec());
    for stored in records {
        table.add_row(
            columns
                .iter()
                .map(|name| cell(stored.record.get(name)))
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// Listing as CSV; absent and null fields are empty cells
pub fn listing_csv(records: &[StoredRecord], columns: &[String]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for stored in records {
        writer.write_record(columns.iter().map(|name| match stored.record.get(name) {
            None | Some(FieldValue::Null) => String::new(),
            Some(value) => value.to_string(),
        }))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn listing_json(records: &[StoredRecord]) -> Result<String> {
    let rows: Vec<&Record> = records.iter().map(|stored| &stored.record).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Human-readable batch summary with the failure table
pub fn print_summary(snapshot: &ProgressSnapshot) {
    println!();
    if snapshot.failed == 0 {
        println!(
            "{} {} of {} item(s) succeeded",
            "✓".green(),
            snapshot.success,
            snapshot.total
        );
        return;
    }

    println!(
        "{} {} succeeded, {} failed (of {})",
        "✗".red(),
        snapshot.success.to_string().green(),
        snapshot.failed.to_string().red().bold(),
        snapshot.total
    );
    println!();
    println!("{}", error_table(&snapshot.errors));
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use ivt_common::IdentifierPolicy;
    use serde_json::json;

    fn stored(value: serde_json::Value) -> StoredRecord {
        StoredRecord::from_json(&value, &IdentifierPolicy::default()).unwrap()
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate_string("curto", 10), "curto");
        assert_eq!(truncate_string("ação ação ação", 8), "ação ...");
    }

    #[test]
    fn test_listing_columns_put_id_first() {
        let records = vec![
            stored(json!({"descricao": "A", "_rev": "1", "inventario_id": 7})),
            stored(json!({"codigo": "X1", "descricao": "B", "inventario_id": 8})),
        ];
        assert_eq!(
            listing_columns(&records),
            vec!["inventario_id", "descricao", "codigo"]
        );
    }

    #[test]
    fn test_underscore_id_field_stays_visible() {
        let records = vec![stored(json!({"_id": "abc", "_rev": "2", "nome": "C"}))];
        assert_eq!(listing_columns(&records), vec!["_id", "nome"]);
    }

    #[test]
    fn test_listing_csv() {
        let records = vec![
            stored(json!({"id": 1, "descricao": "Caneta, azul", "EAN": null})),
            stored(json!({"id": 2, "descricao": "Lápis"})),
        ];
        let columns = listing_columns(&records);
        let csv = listing_csv(&records, &columns).unwrap();
        assert_eq!(csv, "id,descricao,EAN\n1,\"Caneta, azul\",\n2,Lápis,\n");
    }

    #[test]
    fn test_preview_limits_rows() {
        let data = ivt_common::normalize::normalize_bytes(b"a,b\n1,x\n2,y\n3,z\n").unwrap();
        let table = preview_table(&data, 2);
        assert_eq!(table.row_iter().count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains('x') && !rendered.contains('z'));
    }
}
