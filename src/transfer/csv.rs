//! Minimal RFC 4180 reader and writer for credential files
//!
//! Fields may be quoted; quoted fields can contain commas, CR/LF and doubled
//! quotes. The header row must name `site` and `username` (any case);
//! `password` is optional and other columns are ignored.

use crate::api::types::Credential;
use crate::error::{Result, SecurepassError};

const BOM: char = '\u{feff}';

/// Parses CSV text into records.
fn parse_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            '"' => {
                return Err(SecurepassError::Parse(format!(
                    "line {}: unexpected quote inside unquoted field",
                    line
                ))
                .into())
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                line += 1;
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(SecurepassError::Parse(format!("line {}: unterminated quoted field", line)).into());
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    // Blank lines carry no data.
    records.retain(|r| !(r.len() == 1 && r[0].trim().is_empty()));
    Ok(records)
}

/// Reads credentials from CSV text. A leading byte-order mark is skipped.
///
/// # Errors
///
/// [`SecurepassError::Parse`] for malformed quoting, a missing header or
/// required column, or a row with fewer fields than the header needs.
pub fn parse(text: &str) -> Result<Vec<Credential>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut records = parse_records(text)?.into_iter();

    let header = records
        .next()
        .ok_or_else(|| SecurepassError::Parse("file is empty".to_string()))?;
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let site_col = column("site")
        .ok_or_else(|| SecurepassError::Parse("header is missing a 'site' column".to_string()))?;
    let user_col = column("username").ok_or_else(|| {
        SecurepassError::Parse("header is missing a 'username' column".to_string())
    })?;
    let pass_col = column("password");

    records
        .enumerate()
        .map(|(i, record)| -> Result<Credential> {
            // Row 1 is the header.
            let row = i + 2;
            let get = |col: usize| {
                record.get(col).cloned().ok_or_else(|| {
                    anyhow::anyhow!(SecurepassError::Parse(format!(
                        "row {}: expected at least {} fields, found {}",
                        row,
                        col + 1,
                        record.len()
                    )))
                })
            };
            let site = get(site_col)?;
            let username = get(user_col)?;
            let password = match pass_col {
                Some(col) => record.get(col).cloned().filter(|p| !p.is_empty()),
                None => None,
            };
            Ok(Credential::new(site, username, password))
        })
        .collect()
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Writes credentials as CSV: UTF-8 BOM, `site,username,password` header,
/// CRLF line endings.
pub fn write(credentials: &[Credential]) -> String {
    let mut out = String::new();
    out.push(BOM);
    out.push_str("site,username,password\r\n");
    for cred in credentials {
        out.push_str(&escape(&cred.site));
        out.push(',');
        out.push_str(&escape(&cred.username));
        out.push(',');
        out.push_str(&escape(cred.password.as_deref().unwrap_or_default()));
        out.push_str("\r\n");
    }
    out
}
