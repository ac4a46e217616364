//! Content normalization: exported Drive content to structured JSON.
//!
//! Two pure transforms, no I/O:
//!
//! - [`markdown_to_json`] turns a Markdown export (Google Docs) into a
//!   sectioned document, split on `#` headings.
//! - [`csv_to_json`] turns a CSV export (Google Sheets) into a row-oriented
//!   array keyed by the header row.
//!
//! Both accept arbitrary input, including empty text, and always produce a
//! well-formed document.

use serde::Serialize;
use serde_json::Value;

/// Section type within a normalized document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Heading,
    Body,
}

/// One section of a normalized document, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: SectionKind,

    /// Heading title, absent for body sections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Heading level (count of leading `#`), absent for body sections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,

    pub content: String,
}

/// Normalized Google Docs content.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentJson {
    pub file_name: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub format: String,
    pub sections: Vec<Section>,
    /// The untouched source text, regardless of sectioning.
    pub raw_content: String,
}

/// One sheet row: column name to cell value, in header order.
pub type Row = serde_json::Map<String, Value>;

/// Normalized Google Sheets content.
#[derive(Debug, Clone, Serialize)]
pub struct SheetJson {
    pub file_name: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub format: String,
    /// Count of data rows (header excluded). Always equals `data.len()`.
    pub rows: usize,
    /// Header columns, or empty when there are no data rows.
    pub columns: Vec<String>,
    pub data: Vec<Row>,
}

struct OpenSection {
    title: String,
    level: usize,
    lines: Vec<String>,
}

impl OpenSection {
    fn close(self) -> Section {
        Section {
            kind: SectionKind::Heading,
            title: Some(self.title),
            level: Some(self.level),
            content: self.lines.join("\n").trim().to_string(),
        }
    }
}

/// Convert Markdown text into a sectioned document.
///
/// A line is a heading iff it starts with one or more `#` characters. Each
/// heading opens a new section and closes the previous one; non-blank lines
/// accumulate into the open section. A document with no headings yields a
/// single body section holding the entire trimmed input.
pub fn markdown_to_json(content: &str, file_name: &str) -> DocumentJson {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<OpenSection> = None;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('#') {
            if let Some(open) = current.take() {
                sections.push(open.close());
            }

            let level = trimmed.chars().take_while(|&c| c == '#').count();
            let title = trimmed.trim_start_matches('#').trim().to_string();

            current = Some(OpenSection {
                title,
                level,
                lines: Vec::new(),
            });
        } else if !trimmed.is_empty() {
            // Lines before the first heading have no open section and are
            // never emitted on their own.
            if let Some(open) = &mut current {
                open.lines.push(line.to_string());
            }
        }
    }

    if let Some(open) = current.take() {
        sections.push(open.close());
    }

    if sections.is_empty() {
        sections.push(Section {
            kind: SectionKind::Body,
            title: None,
            level: None,
            content: content.trim().to_string(),
        });
    }

    DocumentJson {
        file_name: file_name.to_string(),
        doc_type: "google_docs".to_string(),
        format: "json".to_string(),
        sections,
        raw_content: content.to_string(),
    }
}

/// Convert CSV text into a row-oriented sheet document.
///
/// The first non-empty record is the header; every later record is a data
/// row mapped positionally onto the header columns. Short rows are padded
/// with empty strings; surplus fields are dropped.
pub fn csv_to_json(content: &str, file_name: &str) -> SheetJson {
    let mut records = parse_csv_records(content)
        .into_iter()
        .filter(|r| !(r.len() == 1 && r[0].trim().is_empty()));

    let header = match records.next() {
        Some(record) => record,
        None => {
            return SheetJson {
                file_name: file_name.to_string(),
                doc_type: "google_sheets".to_string(),
                format: "json".to_string(),
                rows: 0,
                columns: Vec::new(),
                data: Vec::new(),
            }
        }
    };

    let mut data: Vec<Row> = Vec::new();
    for fields in records {
        let mut row = Row::new();
        for (i, column) in header.iter().enumerate() {
            let value = fields.get(i).cloned().unwrap_or_default();
            row.insert(column.clone(), Value::String(value));
        }
        data.push(row);
    }

    // Columns come from the keys of the first parsed row, so a header with
    // no data rows yields an empty list.
    let columns = if data.is_empty() {
        Vec::new()
    } else {
        header
    };

    SheetJson {
        file_name: file_name.to_string(),
        doc_type: "google_sheets".to_string(),
        format: "json".to_string(),
        rows: data.len(),
        columns,
        data,
    }
}

/// Split CSV text into records: comma-delimited, double-quote aware, with
/// `""` as an escaped quote. A newline inside a quoted field is field
/// content; outside quotes it terminates the record, so one quoted cell may
/// span several physical lines.
fn parse_csv_records(text: &str) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => record.push(std::mem::take(&mut field)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}
