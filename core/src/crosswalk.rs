//! County crosswalk: the in-memory reference table every stage reads.
//!
//! RULE: the table is built once per run and never mutated afterwards.
//! It is passed explicitly (`&CrosswalkTable`) to whatever needs it;
//! there is no process-wide instance.

use crate::{
    error::{FairLendError, FairLendResult},
    normalize,
    types::{CbsaCode, Geoid5, NO_CBSA},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ── Raw tabular row ──────────────────────────────────────────────────────────

/// One row of the reference dataset, under its original column headers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrosswalkRow {
    #[serde(rename = "County State")]
    pub county_state: String,
    #[serde(rename = "State Code", deserialize_with = "code_field")]
    pub state_code: String,
    #[serde(rename = "County Code", deserialize_with = "code_field")]
    pub county_code: String,
    #[serde(rename = "Cbsa Code", default, deserialize_with = "optional_code_field")]
    pub cbsa_code: Option<String>,
    #[serde(rename = "Cbsa", default)]
    pub cbsa_name: Option<String>,
}

impl CrosswalkRow {
    pub fn new(
        county_state: &str,
        state_code:   &str,
        county_code:  &str,
        cbsa_code:    &str,
        cbsa_name:    &str,
    ) -> Self {
        Self {
            county_state: county_state.to_string(),
            state_code:   state_code.to_string(),
            county_code:  county_code.to_string(),
            cbsa_code:    Some(cbsa_code.to_string()),
            cbsa_name:    Some(cbsa_name.to_string()),
        }
    }
}

/// Reference extracts carry codes as text, bare integers, or (from
/// spreadsheet exports) floats such as `1.0`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CodeField {
    Text(String),
    Number(u64),
    Float(f64),
}

impl From<CodeField> for String {
    fn from(field: CodeField) -> Self {
        match field {
            CodeField::Text(s)   => s,
            CodeField::Number(n) => n.to_string(),
            // Non-integral values keep their text and fail code validation.
            CodeField::Float(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
                (f as u64).to_string()
            }
            CodeField::Float(f) => f.to_string(),
        }
    }
}

fn code_field<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    CodeField::deserialize(d).map(String::from)
}

fn optional_code_field<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Option::<CodeField>::deserialize(d).map(|f| f.map(String::from))
}

// ── Canonical record ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CountyRecord {
    /// County name as stored, e.g. "Autauga County".
    pub county_name: String,
    /// State name as stored, e.g. "Alabama".
    pub state_name:  String,
    pub state_code:  String,
    pub county_code: String,
    pub geoid5:      Geoid5,
    pub cbsa_code:   CbsaCode,
    pub cbsa_name:   String,
    #[serde(skip)]
    pub(crate) normalized_state:  &'static str,
    #[serde(skip)]
    pub(crate) normalized_county: String,
}

impl CountyRecord {
    pub fn is_rural(&self) -> bool {
        self.cbsa_code == NO_CBSA
    }

    /// Normalised county name used for matching.
    pub fn match_name(&self) -> &str {
        &self.normalized_county
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrosswalkLoadSummary {
    pub loaded:                u64,
    pub skipped_unknown_state: u64,
}

// ── Table ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CrosswalkTable {
    records:  Vec<CountyRecord>,
    by_geoid: HashMap<Geoid5, usize>,
    by_state: HashMap<&'static str, Vec<usize>>,
    summary:  CrosswalkLoadSummary,
}

impl CrosswalkTable {
    /// Build the table from raw rows, preserving row order.
    ///
    /// Rows whose trailing state is not a known state are skipped and
    /// counted; malformed codes and duplicate GEOID5s are errors.
    pub fn from_rows<I>(rows: I) -> FairLendResult<Self>
    where
        I: IntoIterator<Item = CrosswalkRow>,
    {
        let mut table = Self::default();
        let mut state_codes: HashMap<&'static str, String> = HashMap::new();

        for (idx, row) in rows.into_iter().enumerate() {
            let line = idx + 1;
            let Some(record) = parse_row(line, &row)? else {
                log::warn!(
                    "crosswalk: skipping row {line} '{}' (state not recognised)",
                    row.county_state
                );
                table.summary.skipped_unknown_state += 1;
                continue;
            };

            if table.by_geoid.contains_key(&record.geoid5) {
                return Err(FairLendError::DuplicateGeoid { geoid5: record.geoid5 });
            }

            let first_code = state_codes
                .entry(record.normalized_state)
                .or_insert_with(|| record.state_code.clone());
            if *first_code != record.state_code {
                log::warn!(
                    "crosswalk: row {line} state '{}' has code {} (first seen {})",
                    record.state_name, record.state_code, first_code
                );
            }

            let pos = table.records.len();
            table.by_geoid.insert(record.geoid5.clone(), pos);
            table.by_state.entry(record.normalized_state).or_default().push(pos);
            table.records.push(record);
            table.summary.loaded += 1;
        }

        log::info!(
            "crosswalk: loaded {} counties across {} states ({} skipped)",
            table.summary.loaded,
            table.by_state.len(),
            table.summary.skipped_unknown_state
        );
        Ok(table)
    }

    /// Load from a JSON array of rows.
    pub fn load_json(path: impl AsRef<Path>) -> FairLendResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let rows: Vec<CrosswalkRow> = serde_json::from_str(&content)?;
        Self::from_rows(rows)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> &CrosswalkLoadSummary {
        &self.summary
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountyRecord> {
        self.records.iter()
    }

    pub fn by_geoid(&self, geoid5: &str) -> Option<&CountyRecord> {
        self.by_geoid.get(geoid5).map(|&i| &self.records[i])
    }

    pub fn cbsa_for(&self, geoid5: &str) -> Option<&str> {
        self.by_geoid(geoid5).map(|r| r.cbsa_code.as_str())
    }

    /// Rows for a normalised full state name, in crosswalk order.
    pub fn rows_in_state(&self, state_name: &str) -> Vec<&CountyRecord> {
        self.by_state
            .get(state_name)
            .map(|idxs| idxs.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    pub fn counties_in_cbsa(&self, cbsa_code: &str) -> Vec<&CountyRecord> {
        self.records
            .iter()
            .filter(|r| r.cbsa_code == cbsa_code)
            .collect()
    }
}

fn parse_row(line: usize, row: &CrosswalkRow) -> FairLendResult<Option<CountyRecord>> {
    let Some(state) = normalize::trailing_state_name(&row.county_state) else {
        return Ok(None);
    };

    // Split the original text so stored names keep their casing.
    let words: Vec<&str> = row.county_state.split_whitespace().collect();
    let state_words = state.split(' ').count();
    if words.len() <= state_words {
        return Err(FairLendError::InvalidCrosswalkRow {
            line,
            reason: format!("'{}' has no county part", row.county_state),
        });
    }
    let split = words.len() - state_words;
    let county_name = words[..split].join(" ");
    let state_name = words[split..].join(" ");

    let state_code = pad_code(line, "State Code", &row.state_code, 2)?;
    let county_code = pad_code(line, "County Code", &row.county_code, 3)?;
    let cbsa_code = match row.cbsa_code.as_deref().map(str::trim) {
        None | Some("") => NO_CBSA.to_string(),
        Some(code) => pad_code(line, "Cbsa Code", code, 5)?,
    };

    Ok(Some(CountyRecord {
        normalized_county: normalize::normalize_county(&county_name),
        normalized_state:  state,
        geoid5:            format!("{state_code}{county_code}"),
        county_name,
        state_name,
        state_code,
        county_code,
        cbsa_code,
        cbsa_name:         row.cbsa_name.clone().unwrap_or_default().trim().to_string(),
    }))
}

/// Zero-pad a numeric code to `width` digits.
fn pad_code(line: usize, field: &str, raw: &str, width: usize) -> FairLendResult<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.len() > width || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FairLendError::InvalidCrosswalkRow {
            line,
            reason: format!("{field} '{raw}' is not a code of at most {width} digits"),
        });
    }
    Ok(format!("{raw:0>width$}"))
}
