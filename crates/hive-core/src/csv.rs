//! Client CSV export and import.
//!
//! Nine fixed columns with one header row. Export quotes every data field;
//! import accepts quoted or bare fields and rejects the whole file on the
//! first malformed row, before anything is written.

use chrono::NaiveDate;
use thiserror::Error;

use hive_db::models::{Client, RecurrenceConfig, ShootStatus};

use crate::client::{ClientDraft, create_client, validate_draft};
use crate::dates::{DATE_FORMAT, parse_date, parse_optional_date};
use crate::error::{HiveError, ValidationError};
use crate::store::HiveStore;

pub const CSV_HEADERS: [&str; 9] = [
    "Client Name",
    "Contract Renewal Date",
    "Content Due Date",
    "Report Due Date",
    "Posts Per Month",
    "Package",
    "Monthly Reporting Canva Link",
    "Notes",
    "Reminders",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvError {
    #[error("missing header row (expected it to start with {:?})", CSV_HEADERS[0])]
    MissingHeader,

    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },

    #[error("line {line}: expected {} fields, found {found}", CSV_HEADERS.len())]
    TooFewFields { line: usize, found: usize },

    #[error("line {line}: invalid integer {value:?} for Posts Per Month")]
    InvalidInteger { line: usize, value: String },

    #[error("line {line}: {source}")]
    Invalid {
        line: usize,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] CsvError),

    /// The store rejected a row. Rows before it remain imported.
    #[error("line {line}: import stopped after {imported} clients: {source}")]
    Store {
        line: usize,
        imported: usize,
        #[source]
        source: HiveError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub clients: Vec<Client>,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.clients.len()
    }
}

/// Default download name, e.g. `hive-clients-2025-06-15.csv`.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("hive-clients-{}.csv", today.format(DATE_FORMAT))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Render clients as CSV: a bare header line, then one fully quoted line per
/// client, joined with `\n`.
pub fn export_clients(clients: &[Client]) -> String {
    let mut lines = Vec::with_capacity(clients.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for c in clients {
        let cells = [
            c.client_name.clone(),
            date_cell(c.contract_renewal_date),
            date_cell(c.content_due_date),
            date_cell(Some(c.due_date)),
            c.posts_per_month.map(|n| n.to_string()).unwrap_or_default(),
            c.package.clone().unwrap_or_default(),
            c.monthly_reporting_canva_link.clone().unwrap_or_default(),
            c.notes.clone().unwrap_or_default(),
            c.reminders.clone().unwrap_or_default(),
        ];
        let row: Vec<String> = cells.iter().map(|cell| quote(cell)).collect();
        lines.push(row.join(","));
    }

    lines.join("\n")
}

/// One parsed record and the 1-based line it started on.
struct Record {
    line: usize,
    fields: Vec<String>,
}

/// Split CSV text into records. Quoted fields may hold commas, doubled
/// quotes, and line breaks. Whitespace-only lines are dropped.
fn read_records(text: &str) -> Result<Vec<Record>, CsvError> {
    let mut records = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while chars.peek().is_some() {
        let start_line = line;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut quoted_any = false;

        loop {
            match chars.next() {
                None => break,
                Some('\n') => {
                    line += 1;
                    break;
                }
                Some('\r') if chars.peek() == Some(&'\n') => {}
                Some(',') => fields.push(std::mem::take(&mut field)),
                Some('"') if field.is_empty() => {
                    quoted_any = true;
                    loop {
                        match chars.next() {
                            None => return Err(CsvError::UnterminatedQuote { line: start_line }),
                            Some('"') if chars.peek() == Some(&'"') => {
                                chars.next();
                                field.push('"');
                            }
                            Some('"') => break,
                            Some(c) => {
                                if c == '\n' {
                                    line += 1;
                                }
                                field.push(c);
                            }
                        }
                    }
                }
                Some(c) => field.push(c),
            }
        }
        fields.push(field);

        let blank = !quoted_any && fields.iter().all(|f| f.trim().is_empty()) && fields.len() == 1;
        if !blank {
            records.push(Record {
                line: start_line,
                fields,
            });
        }
    }

    Ok(records)
}

fn optional_text(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_owned()) }
}

fn draft_from_record(record: &Record) -> Result<ClientDraft, CsvError> {
    let line = record.line;
    let f = &record.fields;
    if f.len() < CSV_HEADERS.len() {
        return Err(CsvError::TooFewFields {
            line,
            found: f.len(),
        });
    }
    let invalid = |source| CsvError::Invalid { line, source };

    let name = f[0].trim();
    if name.is_empty() {
        return Err(invalid(ValidationError::BlankClientName));
    }

    let posts = f[4].trim();
    let posts_per_month = if posts.is_empty() {
        None
    } else {
        Some(posts.parse::<i32>().map_err(|_| CsvError::InvalidInteger {
            line,
            value: posts.to_owned(),
        })?)
    };

    let draft = ClientDraft {
        client_name: name.to_owned(),
        contract_renewal_date: parse_optional_date(&f[1]).map_err(invalid)?,
        content_due_date: parse_optional_date(&f[2]).map_err(invalid)?,
        due_date: parse_date(&f[3]).map_err(invalid)?,
        posts_per_month,
        package: optional_text(&f[5]),
        monthly_reporting_canva_link: optional_text(&f[6]),
        notes: optional_text(&f[7]),
        reminders: optional_text(&f[8]),
        shoot_date: None,
        ads_per_month: None,
        recurrence: RecurrenceConfig::Disabled,
        shoot_status: ShootStatus::NotBooked,
        shoot_notes: None,
    };
    validate_draft(&draft).map_err(invalid)?;
    Ok(draft)
}

/// Parse a whole CSV file into client drafts, failing on the first bad row.
pub fn parse_clients(text: &str) -> Result<Vec<(usize, ClientDraft)>, CsvError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = read_records(text)?.into_iter();

    let header = records.next().ok_or(CsvError::MissingHeader)?;
    if header.fields.first().map(|f| f.trim()) != Some(CSV_HEADERS[0]) {
        return Err(CsvError::MissingHeader);
    }

    records
        .map(|record| draft_from_record(&record).map(|draft| (record.line, draft)))
        .collect()
}

/// Parse `text` and insert every client it describes, in file order.
///
/// Nothing is written unless the whole file parses.
pub async fn import_clients(store: &dyn HiveStore, text: &str) -> Result<ImportReport, ImportError> {
    let drafts = parse_clients(text)?;
    let mut clients = Vec::with_capacity(drafts.len());

    for (line, draft) in drafts {
        match create_client(store, &draft).await {
            Ok(client) => clients.push(client),
            Err(source) => {
                tracing::warn!(line, imported = clients.len(), error = %source, "client import stopped");
                return Err(ImportError::Store {
                    line,
                    imported: clients.len(),
                    source,
                });
            }
        }
    }

    tracing::info!(imported = clients.len(), "imported clients from CSV");
    Ok(ImportReport { clients })
}
