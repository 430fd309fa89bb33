//! Bank statement ingestion.
//!
//! A statement is a CSV file with a header row and the columns `Fecha`,
//! `Descripción` (or its ASCII spelling `Descripcion`) and `Monto`. Every row
//! is turned into an [`ExternalRecord`] by [`normalize_row`]; rows with a
//! missing or unreadable date or amount are dropped and only counted, they
//! never fail the whole upload.

use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

pub const DATE_HEADER: &str = "Fecha";
pub const DESCRIPTION_HEADER: &str = "Descripción";
pub const AMOUNT_HEADER: &str = "Monto";

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// One line of a bank statement.
///
/// `amount` is signed: negative values left the account, positive values
/// entered it. `line` is the 1-based line of the statement file the record
/// was read from; records built by hand have none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub line: Option<u64>,
}

impl ExternalRecord {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
            line: None,
        }
    }

    #[must_use]
    pub fn at_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }
}

/// A statement row as read from the file, before validation.
///
/// `description_fallback` carries the value of an ASCII-spelled
/// `Descripcion` column, used only when `description` is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawStatementRow {
    pub date: Option<String>,
    pub description: Option<String>,
    pub description_fallback: Option<String>,
    pub amount: Option<String>,
}

/// Result of reading a whole statement file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedStatement {
    pub records: Vec<ExternalRecord>,
    /// Number of non-blank rows dropped because of a bad date or amount.
    pub rejected: usize,
}

/// Turns a raw row into an [`ExternalRecord`], or `None` if the row must be
/// excluded. `line` is where the row sits in the source file.
pub fn normalize_row(row: &RawStatementRow, line: u64) -> Option<ExternalRecord> {
    let date = non_empty(row.date.as_deref())?;
    let amount = non_empty(row.amount.as_deref())?;

    let amount = parse_amount(amount)?;
    let date = parse_date(date)?;
    let description = non_empty(row.description.as_deref())
        .or_else(|| non_empty(row.description_fallback.as_deref()))
        .unwrap_or_default()
        .to_string();

    Some(ExternalRecord {
        date,
        description,
        amount,
        line: Some(line),
    })
}

/// Parses a statement amount.
///
/// Everything but ASCII digits, `-` and `.` is stripped first (currency
/// symbols, thousands separators, spaces). The longest leading
/// `-?digits[.digits]` prefix of what remains is the amount, so
/// `"$ -1,234.50"` reads as `-1234.50` and `"abc"` is rejected.
///
/// A number outside the range of [`Decimal`] (more than 28 integer digits)
/// is rejected too, like any other unusable amount.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect();

    let mut chars = stripped.chars().peekable();
    let mut number = String::with_capacity(stripped.len() + 1);
    if chars.peek() == Some(&'-') {
        number.push('-');
        chars.next();
    }

    let mut integer = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        integer.push(c);
    }

    let mut fraction = String::new();
    if chars.next_if_eq(&'.').is_some() {
        while let Some(c) = chars.next_if(char::is_ascii_digit) {
            fraction.push(c);
        }
    }

    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    if integer.is_empty() {
        number.push('0');
    } else {
        number.push_str(&integer);
    }
    if !fraction.is_empty() {
        number.push('.');
        number.push_str(&fraction);
    }

    number.parse::<Decimal>().ok()
}

/// Parses a statement date, discarding any time of day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.date_naive());
    }
    if let Some(timestamp) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(timestamp.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Reads a CSV statement and normalizes every row.
///
/// Headers are matched ignoring case, accents and surrounding whitespace.
/// A file without `Fecha` or `Monto` columns is an
/// [`EngineError::InvalidStatement`]; anything wrong inside a single row only
/// increments [`ParsedStatement::rejected`].
pub fn parse_statement<R: Read>(reader: R) -> ResultEngine<ParsedStatement> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = StatementColumns::resolve(csv_reader.headers()?)?;

    let mut parsed = ParsedStatement::default();
    for (index, row) in csv_reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                tracing::debug!("dropping unreadable statement row {}: {err}", index + 2);
                parsed.rejected += 1;
                continue;
            }
        };
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let line = row.position().map_or(index as u64 + 2, |p| p.line());
        match normalize_row(&columns.extract(&row), line) {
            Some(record) => parsed.records.push(record),
            None => {
                tracing::debug!("dropping statement line {line}: invalid date or amount");
                parsed.rejected += 1;
            }
        }
    }

    tracing::debug!(
        "statement parsed: {} records, {} rejected",
        parsed.records.len(),
        parsed.rejected
    );
    Ok(parsed)
}

/// Column positions of a statement file.
#[derive(Debug)]
struct StatementColumns {
    date: usize,
    amount: usize,
    description: Option<usize>,
    description_fallback: Option<usize>,
}

impl StatementColumns {
    fn resolve(headers: &csv::StringRecord) -> ResultEngine<Self> {
        let date_key = header_key(DATE_HEADER);
        let amount_key = header_key(AMOUNT_HEADER);
        let description_key = header_key(DESCRIPTION_HEADER);

        let mut date = None;
        let mut amount = None;
        let mut description = None;
        let mut description_fallback = None;

        for (index, header) in headers.iter().enumerate() {
            let key = header_key(header);
            if key == date_key {
                date.get_or_insert(index);
            } else if key == amount_key {
                amount.get_or_insert(index);
            } else if key == description_key {
                // The accented spelling wins; a plain ASCII header is only a fallback.
                if header.trim().is_ascii() {
                    description_fallback.get_or_insert(index);
                } else {
                    description.get_or_insert(index);
                }
            }
        }

        let date = date.ok_or_else(|| {
            EngineError::InvalidStatement(format!("missing \"{DATE_HEADER}\" column"))
        })?;
        let amount = amount.ok_or_else(|| {
            EngineError::InvalidStatement(format!("missing \"{AMOUNT_HEADER}\" column"))
        })?;

        Ok(Self {
            date,
            amount,
            description,
            description_fallback,
        })
    }

    fn extract(&self, row: &csv::StringRecord) -> RawStatementRow {
        let field = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .map(ToString::to_string)
        };

        RawStatementRow {
            date: field(Some(self.date)),
            description: field(self.description),
            description_fallback: field(self.description_fallback),
            amount: field(Some(self.amount)),
        }
    }
}

/// Lowercase, accent-free form of a header used for column lookup.
fn header_key(header: &str) -> String {
    header
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
