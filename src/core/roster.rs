//! Participant roster import from CSV
//!
//! The header row names the columns (`name,dni,age,size`, any order, case
//! insensitive; `size` optional). Cells are kept as text so identity numbers
//! with leading zeros survive until validation.

use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Read;
use thiserror::Error;

use crate::entities::registration::ParticipantDraft;

const REQUIRED: [&str; 3] = ["name", "dni", "age"];

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster is missing the '{0}' column (expected header: name,dni,age[,size])")]
    MissingColumn(&'static str),

    #[error("roster has no participant rows")]
    Empty,

    #[error("CSV parse error at row {row}: {source}")]
    Parse {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("cannot read roster header: {0}")]
    Header(#[source] csv::Error),
}

/// Read participant drafts from CSV; blank lines are skipped
pub fn read_roster<R: Read>(reader: R) -> Result<Vec<ParticipantDraft>, RosterError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(RosterError::Header)?.clone();
    let header_map = build_header_map(&headers);
    if let Some(missing) = REQUIRED.iter().find(|c| !header_map.contains_key(**c)) {
        return Err(RosterError::MissingColumn(*missing));
    }

    let mut drafts = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        // 1-indexed plus the header line
        let row = row_idx + 2;
        let record = result.map_err(|source| RosterError::Parse { row, source })?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let field = |name: &str| get_field(&record, &header_map, name);
        let mut draft = ParticipantDraft::new(
            field("name").unwrap_or_default(),
            field("dni").unwrap_or_default(),
            field("age").unwrap_or_default(),
        );
        if let Some(size) = field("size") {
            draft = draft.with_size(size);
        }
        drafts.push(draft);
    }

    if drafts.is_empty() {
        return Err(RosterError::Empty);
    }
    Ok(drafts)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect()
}

fn get_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
