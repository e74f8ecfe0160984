// =====================================================
// SQL UTILITIES MODULE
// Identifier quoting and COPY text-format encoding
// =====================================================

use crate::db_types::{SqlValue, TableIdentifier};
use std::fmt::Write;

pub fn quote_identifier_postgres(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn qualified_table_name(table: &TableIdentifier) -> String {
    format!(
        "{}.{}",
        quote_identifier_postgres(&table.schema),
        quote_identifier_postgres(&table.table)
    )
}

pub fn build_copy_statement(table: &TableIdentifier, columns: &[String]) -> String {
    let column_list = columns
        .iter()
        .map(|column| quote_identifier_postgres(column))
        .collect::<Vec<String>>()
        .join(", ");

    format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT text)",
        qualified_table_name(table),
        column_list
    )
}

/// Escapes backslash, tab, newline and carriage return for COPY text format.
pub fn escape_copy_text(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
}

fn write_float(value: f64, out: &mut String) {
    if value.is_nan() {
        out.push_str("NaN");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        let _ = write!(out, "{}", value);
    }
}

pub fn write_copy_value(value: &SqlValue, out: &mut String) {
    match value {
        SqlValue::Null => out.push_str("\\N"),
        SqlValue::Bool(v) => out.push(if *v { 't' } else { 'f' }),
        SqlValue::Int(v) => {
            let _ = write!(out, "{}", v);
        }
        SqlValue::Float(v) => write_float(*v, out),
        SqlValue::Numeric(v) => out.push_str(v),
        SqlValue::Text(v) => escape_copy_text(v, out),
        // bytea hex input; the backslash itself is escaped for the text format
        SqlValue::Bytes(v) => {
            out.push_str("\\\\x");
            out.push_str(&hex::encode(v));
        }
        SqlValue::Date(v) => {
            let _ = write!(out, "{}", v.format("%Y-%m-%d"));
        }
        SqlValue::Time(v) => {
            let _ = write!(out, "{}", v.format("%H:%M:%S%.f"));
        }
        SqlValue::Timestamp(v) => {
            let _ = write!(out, "{}", v.format("%Y-%m-%d %H:%M:%S%.f"));
        }
        SqlValue::TimestampTz(v) => {
            let _ = write!(out, "{}", v.format("%Y-%m-%d %H:%M:%S%.f+00"));
        }
        SqlValue::Uuid(v) => {
            let _ = write!(out, "{}", v);
        }
        SqlValue::Json(v) => escape_copy_text(v, out),
    }
}

/// Appends one tab-separated, newline-terminated COPY line.
pub fn write_copy_row(row: &[SqlValue], out: &mut String) {
    for (index, value) in row.iter().enumerate() {
        if index > 0 {
            out.push('\t');
        }
        write_copy_value(value, out);
    }
    out.push('\n');
}
