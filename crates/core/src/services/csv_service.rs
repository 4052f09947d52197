use chrono::NaiveDate;
use std::borrow::Cow;

use crate::errors::CoreError;
use crate::models::transaction::{NewTransaction, Transaction};

/// The only header accepted on import and always written on export.
pub const CSV_HEADER: &str = "date,note,category,amount";

/// MIME type of exported files.
pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8";

/// Result of decoding CSV text: the accepted transactions plus the number
/// of data rows that were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeOutcome {
    pub transactions: Vec<Transaction>,
    pub skipped: usize,
}

/// Encodes transactions to CSV and decodes CSV back into validated
/// transactions.
///
/// The grammar is a lenient RFC 4180 subset: a `"` opens a quoted section
/// at any position of a field, not only at its start, and `""` inside a
/// quoted section is one literal quote.
pub struct CsvCodec;

impl CsvCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encode transactions in the order given.
    ///
    /// The header is always followed by a newline; rows are joined with
    /// `\n` and the output has no trailing newline after the last row.
    pub fn encode(&self, transactions: &[Transaction]) -> String {
        let rows: Vec<String> = transactions.iter().map(encode_row).collect();
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        out.push_str(&rows.join("\n"));
        out
    }

    /// Decode CSV text.
    ///
    /// Only a missing or unexpected header is fatal. Data rows with the wrong
    /// field count, empty fields, an invalid date or a non-positive amount
    /// are skipped and counted. Every accepted row gets a fresh id.
    pub fn decode(&self, text: &str) -> Result<DecodeOutcome, CoreError> {
        let text = text.replace('\r', "");
        let records = split_records(&text);

        let (header, rows) = records
            .split_first()
            .ok_or_else(|| CoreError::FormatError("missing header".into()))?;

        let header = header.to_lowercase();
        let header = header.trim();
        if header != CSV_HEADER {
            tracing::warn!("Rejecting CSV with header \"{header}\"");
            return Err(CoreError::FormatError(format!(
                "unexpected header: expected \"{CSV_HEADER}\", got \"{header}\""
            )));
        }

        let mut outcome = DecodeOutcome::default();
        for (idx, record) in rows.iter().enumerate() {
            match parse_row(record) {
                Ok(transaction) => outcome.transactions.push(transaction),
                Err(reason) => {
                    // +2: one for the header, one for 1-based numbering
                    tracing::debug!("Skipping CSV row {}: {reason}", idx + 2);
                    outcome.skipped += 1;
                }
            }
        }

        Ok(outcome)
    }
}

impl Default for CsvCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// File name for an export made on `date`, e.g.
/// `myexpense-transactions-2024-01-15.csv`.
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}-transactions-{}.csv", date.format("%Y-%m-%d"))
}

/// Quote a field if it contains a comma, a quote or a newline.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains(&[',', '"', '\n'][..]) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Split text into non-empty records on newlines outside quoted sections.
///
/// Uses the same quote toggling as [`split_fields`]. A newline stays inside
/// its record only when the open quote started a field (`"...` right after
/// a comma or at the start of the record), as the encoder writes it. A stray
/// quote inside a field, or one never closed, ends the record at its own
/// line break.
pub fn split_records(text: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let end = record_end(rest).unwrap_or_else(|| rest.find('\n').unwrap_or(rest.len()));
        records.push(&rest[..end]);
        rest = rest.get(end + 1..).unwrap_or("");
    }

    records.retain(|r| !r.is_empty());
    records
}

/// Byte offset where the first record of `text` ends. `None` if a quote
/// opened at a field start is still open at the end of `text`.
fn record_end(text: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut spans_lines = false;
    let mut at_field_start = true;
    let mut chars = text.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some((_, '"'))) {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => {
                in_quotes = true;
                spans_lines = at_field_start;
                at_field_start = false;
            }
            '\n' if !in_quotes || !spans_lines => return Some(i),
            ',' if !in_quotes => at_field_start = true,
            _ if !in_quotes => at_field_start = false,
            _ => {}
        }
    }

    (!in_quotes).then_some(text.len())
}

/// Split one record into raw (untrimmed) fields.
pub fn split_fields(record: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = record.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current)),
                _ => current.push(ch),
            }
        }
    }
    fields.push(current);
    fields
}

fn encode_row(transaction: &Transaction) -> String {
    let date = transaction.date.format("%Y-%m-%d").to_string();
    let amount = format!("{:.2}", transaction.amount);
    [
        escape_field(&date),
        escape_field(&transaction.note),
        escape_field(&transaction.category),
        escape_field(&amount),
    ]
    .join(",")
}

fn parse_row(record: &str) -> Result<Transaction, String> {
    let fields = split_fields(record);
    let [date, note, category, amount] = fields.as_slice() else {
        return Err(format!("expected 4 fields, found {}", fields.len()));
    };
    let (date, note, category, amount) = (
        date.trim(),
        note.trim(),
        category.trim(),
        amount.trim(),
    );

    if date.is_empty() || note.is_empty() || category.is_empty() {
        return Err("empty date, note or category".into());
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{date}': {e}"))?;
    let amount: f64 = amount
        .parse()
        .map_err(|_| format!("invalid amount '{amount}'"))?;

    Transaction::from_candidate(NewTransaction::new(date, note, category, amount))
        .map_err(|e| e.to_string())
}
