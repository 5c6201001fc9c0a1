//! # Tally Insight
//!
//! Answers plain-language questions about the books kept in a running Tally
//! instance.
//!
//! ## Core Concepts
//!
//! - **Report resolution**: a free-text query is matched to the exact Tally report
//!   name, first through a fixed alias table, then by embedding similarity over a
//!   small report catalog. Unmatched queries fall back to the Balance Sheet.
//! - **Wire codec**: requests are XML envelopes sent over HTTP; responses are
//!   decoded (UTF-8, UTF-16 or Latin-1), stripped of illegal character references
//!   and parsed into a generic [`Payload`] tree.
//! - **Table inference**: the payload's parallel display lists, voucher messages or
//!   longest repeated list become rows with readable column names.
//! - **Rendering**: bar charts, pie charts and table images are drawn
//!   deterministically to PNG files. Charts are described declaratively by a
//!   [`ChartSpec`]; nothing generated is ever executed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tally_insight::*;
//!
//! let config = TallyConfig::from_env()?;
//! let pipeline = ReportPipeline::from_config(&config, HashingEmbedder::default()).await?;
//!
//! for company in pipeline.companies().await {
//!     let analysis = pipeline.table(&company, "closing stock value").await?;
//!     println!("{}: {:?}", analysis.rationale, analysis.images);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod flatten;
pub mod payload;
pub mod pipeline;
pub mod render;
pub mod resolver;
pub mod utils;
pub mod wire;

#[cfg(feature = "gemini")]
pub mod llm;

pub use cache::ReportCache;
pub use config::{ReportPeriod, TallyConfig};
pub use error::{Result, TallyError};
pub use flatten::{Extraction, Flattener, RowSource, Table, TableRow, VoucherRecord};
pub use payload::Payload;
pub use pipeline::{Analysis, FetchedReport, ReportPipeline};
pub use render::{ChartKind, ChartPoint, ChartSeries, ChartSpec, Renderer};
pub use resolver::{
    canonical_report_name, default_catalog, Embedder, HashingEmbedder, ReportDescriptor,
    ReportIndex, ReportResolver, DEFAULT_REPORT,
};
pub use utils::*;
pub use wire::{HttpTransport, ReportRequest, StaticTransport, TallyClient, Transport};
