//! Two-pass schema inference over a [`CsvSource`].
//!
//! The first pass records the widest cell of every column across all data
//! rows. The second pass re-reads the source from the top, samples the first
//! `sample_rows` data rows and classifies each column. Widths must be final
//! before any column is typed, so the passes never overlap.

use std::collections::HashSet;

use clap::ValueEnum;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    classify::{ColumnType, DEFAULT_WIDTH_MARGIN, TypeClassifier, TypeVotes},
    error::{LoaderError, Result},
    io_utils::{CsvSource, RecordReader},
};

/// How rows whose field count differs from the header are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Reject the source with [`LoaderError::MalformedRow`].
    #[default]
    Strict,
    /// Treat missing trailing fields as empty and drop extra fields.
    Lenient,
}

impl RowPolicy {
    /// Returns `Ok(true)` when the row matched the header exactly.
    pub fn check(self, line: u64, expected: usize, found: usize) -> Result<bool> {
        if expected == found {
            return Ok(true);
        }
        match self {
            RowPolicy::Strict => Err(LoaderError::MalformedRow {
                line,
                expected,
                found,
            }),
            RowPolicy::Lenient => {
                debug!("Line {line}: {found} field(s), expected {expected}");
                Ok(false)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferOptions {
    /// Data rows used for type votes; `0` samples every row.
    pub sample_rows: usize,
    pub width_margin: usize,
    pub classifier: TypeClassifier,
    pub row_policy: RowPolicy,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            sample_rows: 1,
            width_margin: DEFAULT_WIDTH_MARGIN,
            classifier: TypeClassifier::default(),
            row_policy: RowPolicy::default(),
        }
    }
}

/// Running per-column maximum character count. Values only grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnWidths {
    widths: Vec<usize>,
}

impl ColumnWidths {
    pub fn new(columns: usize) -> Self {
        Self {
            widths: vec![0; columns],
        }
    }

    /// Fields past the header width are ignored; missing fields add nothing.
    pub fn observe(&mut self, row: &[String]) {
        for (width, cell) in self.widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    pub fn observed(&self) -> &[usize] {
        &self.widths
    }

    pub fn finalize(self, margin: usize) -> Vec<usize> {
        self.widths.into_iter().map(|w| w + margin).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Maximum observed width plus the safety margin.
    pub width: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<SchemaEntry>,
    pub data_rows: u64,
}

impl Schema {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn pairs(&self) -> Vec<(&str, ColumnType)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.column_type))
            .collect()
    }

    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(|c| c.column_type).collect()
    }
}

pub fn infer_schema(source: &CsvSource, options: &InferOptions) -> Result<Schema> {
    let (headers, widths, data_rows) = scan_widths(source, options.row_policy)?;
    let widths = widths.finalize(options.width_margin);
    debug!("Maximum length of column: {widths:?}");

    let (votes, samples) = sample_rows(source, headers.len(), options)?;

    let columns = headers
        .into_iter()
        .zip(widths)
        .zip(votes.iter().zip(samples))
        .map(|((name, width), (vote, sample))| {
            let column_type = vote.decide(&options.classifier, width);
            debug!("Column '{name}': sample {sample:?} regarded as {column_type}");
            SchemaEntry {
                name,
                column_type,
                width,
                sample,
            }
        })
        .collect::<Vec<_>>();

    let schema = Schema { columns, data_rows };
    info!(
        "CSV schema: [{}]",
        schema
            .columns
            .iter()
            .map(|c| format!("({}, {})", c.name, c.column_type))
            .join(", ")
    );
    Ok(schema)
}

fn read_headers(reader: &mut RecordReader) -> Result<Vec<String>> {
    let (_, headers) = reader.next_record()?.ok_or(LoaderError::EmptySource)?;
    let mut seen = HashSet::with_capacity(headers.len());
    if let Some(name) = headers.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(LoaderError::DuplicateColumn { name: name.clone() });
    }
    Ok(headers)
}

fn scan_widths(source: &CsvSource, policy: RowPolicy) -> Result<(Vec<String>, ColumnWidths, u64)> {
    debug!("Start to check maximum length string in {}", source.describe());
    let mut reader = source.open()?;
    let headers = read_headers(&mut reader)?;
    let mut widths = ColumnWidths::new(headers.len());
    let mut data_rows = 0u64;
    let mut mismatched = 0u64;
    while let Some((line, row)) = reader.next_record()? {
        if !policy.check(line, headers.len(), row.len())? {
            mismatched += 1;
        }
        widths.observe(&row);
        data_rows += 1;
    }
    if mismatched > 0 {
        warn!(
            "{mismatched} row(s) in {} do not match the {} header column(s)",
            source.describe(),
            headers.len()
        );
    }
    Ok((headers, widths, data_rows))
}

fn sample_rows(
    source: &CsvSource,
    columns: usize,
    options: &InferOptions,
) -> Result<(Vec<TypeVotes>, Vec<Option<String>>)> {
    let mut reader = source.open()?;
    reader.next_record()?.ok_or(LoaderError::EmptySource)?;

    let mut votes = vec![TypeVotes::default(); columns];
    let mut samples: Vec<Option<String>> = vec![None; columns];
    let mut taken = 0usize;
    while options.sample_rows == 0 || taken < options.sample_rows {
        let Some((line, row)) = reader.next_record()? else {
            break;
        };
        options.row_policy.check(line, columns, row.len())?;
        for (idx, vote) in votes.iter_mut().enumerate() {
            let token = row.get(idx).map(String::as_str).unwrap_or("");
            vote.record(token);
            if samples[idx].is_none() {
                samples[idx] = Some(token.to_string());
            }
        }
        taken += 1;
    }
    if taken == 0 {
        return Err(LoaderError::InsufficientData);
    }
    debug!("Sampled {taken} row(s) for type inspection");
    Ok((votes, samples))
}
