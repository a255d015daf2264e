use crate::error::ChoroplethError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Canonical identifier of a feature in the map layer (e.g. `"France"`, `"福建"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionKey(String);

impl RegionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RegionKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for RegionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One record of the statistics table (one row = one region observation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatRow {
    pub locality: String,
    pub country: String,
    /// `NaN` when the value column is empty or not numeric.
    pub value: f64,
}

/// Which column layout the payload used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowLayout {
    /// `{ "values": [[locality, country, ..., value], ...] }`
    Canonical,
    /// `[[header...], [value, id], ...]`; the header row is discarded.
    Legacy,
}

/// Wire shape of the statistics document. Either form is accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPayload {
    Canonical { values: Vec<Vec<Value>> },
    Legacy(Vec<Vec<Value>>),
}

/// Parsed statistics table.
#[derive(Debug, Clone, PartialEq)]
pub struct StatTable {
    pub layout: RowLayout,
    pub rows: Vec<StatRow>,
    /// Rows with too few cells to carry an identifier and a value.
    pub skipped: usize,
}

impl StatTable {
    /// Parse the JSON text of a statistics document.
    ///
    /// Fails with `MalformedPayload` when the text is not JSON or matches
    /// neither layout. Individual short rows are skipped, not fatal.
    pub fn parse(text: &str) -> Result<Self, ChoroplethError> {
        let raw: RawPayload = serde_json::from_str(text)
            .map_err(|e| ChoroplethError::MalformedPayload(e.to_string()))?;

        let (layout, raw_rows) = match raw {
            RawPayload::Canonical { values } => (RowLayout::Canonical, values),
            RawPayload::Legacy(mut values) => {
                if !values.is_empty() {
                    values.remove(0);
                }
                (RowLayout::Legacy, values)
            }
        };

        let mut rows = Vec::with_capacity(raw_rows.len());
        let mut skipped = 0usize;
        for cells in &raw_rows {
            match row_from_cells(cells, layout) {
                Some(row) => rows.push(row),
                None => {
                    log::warn!("skipping short statistics row: {:?}", cells);
                    skipped += 1;
                }
            }
        }

        Ok(Self {
            layout,
            rows,
            skipped,
        })
    }
}

fn row_from_cells(cells: &[Value], layout: RowLayout) -> Option<StatRow> {
    if cells.len() < 2 {
        return None;
    }
    match layout {
        RowLayout::Canonical => {
            let last = cells.len() - 1;
            let country = if last >= 2 {
                cell_text(&cells[1])
            } else {
                String::new()
            };
            Some(StatRow {
                locality: cell_text(&cells[0]),
                country,
                value: cell_number(&cells[last]),
            })
        }
        RowLayout::Legacy => Some(StatRow {
            locality: cell_text(&cells[1]),
            country: String::new(),
            value: cell_number(&cells[0]),
        }),
    }
}

/// Identifier cells may be strings or numbers (e.g. FIPS codes).
fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Value cells come as JSON numbers or numeric strings; anything else,
/// including `"inf"` and `"Infinity"`, is `NaN`.
pub fn cell_number(v: &Value) -> f64 {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|x| x.is_finite()).unwrap_or(f64::NAN)
}
