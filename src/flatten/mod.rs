//! Finds "the table" inside a decoded report and flattens it into display rows.
//!
//! Strategies run in order and the first that yields rows wins:
//! voucher extraction, parallel-list merge, deep longest-list search and
//! finally the whole payload as a single row.

pub mod columns;
pub mod locate;
pub mod row;
pub mod voucher;

pub use columns::{flatten_row, readable_name, select_columns, TALLY_MAP};
pub use locate::{find_longest_list, merge_parallel_lists};
pub use row::{Table, TableRow};
pub use voucher::{parse_vouchers, VoucherRecord, VOUCHER_COLUMNS};

use crate::error::{Result, TallyError};
use crate::payload::Payload;
use log::debug;

/// Upper bound on rows handed to the renderer.
pub const MAX_DISPLAY_ROWS: usize = 25;

/// Column of the single row produced when a payload has no tabular shape.
pub const DETAILS_COLUMN: &str = "Details";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    ParallelMerge,
    LongestList,
    WholePayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Ledger messages, already in final display shape.
    Vouchers(Vec<VoucherRecord>),
    /// Generic rows after flattening and column renaming.
    Rows { source: RowSource, rows: Vec<TableRow> },
}

impl Extraction {
    pub fn row_count(&self) -> usize {
        match self {
            Extraction::Vouchers(records) => records.len(),
            Extraction::Rows { rows, .. } => rows.len(),
        }
    }

    /// Every extracted row and column.
    pub fn table(&self) -> Table {
        match self {
            Extraction::Vouchers(records) => Table {
                columns: VOUCHER_COLUMNS.iter().map(|c| c.to_string()).collect(),
                rows: records.iter().map(VoucherRecord::to_row).collect(),
            },
            Extraction::Rows { rows, .. } => Table::from_rows(rows.clone()),
        }
    }

    /// The table as shown to the user: generic rows keep only meaningful columns
    /// (name-like first), and at most [`MAX_DISPLAY_ROWS`] rows are kept.
    pub fn display_table(&self) -> Table {
        let table = self.table();
        let columns = match self {
            Extraction::Vouchers(_) => table.columns.clone(),
            Extraction::Rows { .. } => select_columns(&table.columns),
        };
        table.project(&columns, MAX_DISPLAY_ROWS)
    }
}

pub struct Flattener;

impl Flattener {
    pub fn extract(payload: &Payload) -> Result<Extraction> {
        if let Some(records) = parse_vouchers(payload) {
            debug!("Extracted {} voucher records", records.len());
            return Ok(Extraction::Vouchers(records));
        }

        let (source, raw_rows) = Self::locate_rows(payload)?;
        let rows: Vec<TableRow> = raw_rows.iter().map(flatten_row).collect();
        if rows.iter().all(TableRow::is_empty) {
            return Err(TallyError::NoTabularData);
        }
        debug!("Located {} rows via {:?}", rows.len(), source);
        Ok(Extraction::Rows { source, rows })
    }

    fn locate_rows(payload: &Payload) -> Result<(RowSource, Vec<Payload>)> {
        let merged = merge_parallel_lists(payload);
        if !merged.is_empty() {
            return Ok((RowSource::ParallelMerge, merged));
        }
        let longest = find_longest_list(payload);
        if !longest.is_empty() {
            return Ok((RowSource::LongestList, longest));
        }
        match payload {
            Payload::Node(entries) if !entries.is_empty() => {
                Ok((RowSource::WholePayload, vec![payload.clone()]))
            }
            Payload::Node(_) | Payload::Leaf(_) | Payload::List(_) => Err(TallyError::NoTabularData),
        }
    }

    /// Display table, or a single informational row carrying the payload itself
    /// when nothing tabular can be found.
    pub fn display_table_or_details(payload: &Payload) -> Table {
        match Self::extract(payload) {
            Ok(extraction) => extraction.display_table(),
            Err(_) => Self::details_table(payload),
        }
    }

    pub fn details_table(payload: &Payload) -> Table {
        let mut row = TableRow::new();
        row.insert(DETAILS_COLUMN, payload.excerpt(1000));
        Table::from_rows(vec![row])
    }
}
