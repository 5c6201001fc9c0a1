//! Query → report name → fetch → table inference → rendering, with the
//! degradations callers rely on: flattening and rendering problems lower the
//! quality of the answer, wire problems fail the request.

use crate::cache::ReportCache;
use crate::config::TallyConfig;
use crate::error::{Result, TallyError};
use crate::flatten::{Flattener, Table};
use crate::payload::Payload;
use crate::render::{ChartSpec, Renderer};
use crate::resolver::{canonical_report_name, Embedder, ReportResolver};
use crate::wire::{HttpTransport, TallyClient, Transport};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;

/// Characters of raw report data handed on for narration.
pub const DATA_EXCERPT_CHARS: usize = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedReport {
    pub company: String,
    pub report_name: String,
    pub payload: Payload,
    pub cache_path: Option<PathBuf>,
}

/// Outcome of one query: rendered images (possibly none), the display table when
/// one was built, and the data excerpt for narration.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub report_name: String,
    pub images: Vec<PathBuf>,
    pub table: Option<Table>,
    pub rationale: String,
    pub data_excerpt: String,
    /// Set when a lesser output was produced than the one requested.
    pub degraded: Option<String>,
}

impl Analysis {
    fn new(report: &FetchedReport, rationale: impl Into<String>) -> Self {
        Self {
            report_name: report.report_name.clone(),
            images: Vec::new(),
            table: None,
            rationale: rationale.into(),
            data_excerpt: report.payload.excerpt(DATA_EXCERPT_CHARS),
            degraded: None,
        }
    }

    fn degrade(&mut self, reason: String) {
        warn!("Degrading answer for '{}': {}", self.report_name, reason);
        self.rationale = format!("{} ({})", self.rationale, reason);
        self.degraded = Some(reason);
    }
}

pub struct ReportPipeline<T: Transport, E: Embedder> {
    client: TallyClient<T>,
    resolver: ReportResolver<E>,
    renderer: Renderer,
    cache: Option<ReportCache>,
}

impl<E: Embedder> ReportPipeline<HttpTransport, E> {
    /// HTTP transport, cache and renderer from `config`; the resolver index is
    /// built over the default catalog with `embedder`.
    pub async fn from_config(config: &TallyConfig, embedder: E) -> Result<Self> {
        config.validate()?;
        let client = TallyClient::from_config(config)?;
        let resolver = ReportResolver::with_default_catalog(embedder).await?;
        Ok(Self::new(client, resolver, Renderer::from_config(config))
            .with_cache(ReportCache::from_config(config)))
    }
}

impl<T: Transport, E: Embedder> ReportPipeline<T, E> {
    pub fn new(client: TallyClient<T>, resolver: ReportResolver<E>, renderer: Renderer) -> Self {
        Self {
            client,
            resolver,
            renderer,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: ReportCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn client(&self) -> &TallyClient<T> {
        &self.client
    }

    pub fn resolver(&self) -> &ReportResolver<E> {
        &self.resolver
    }

    /// Company names open in Tally; empty when Tally cannot be reached.
    pub async fn companies(&self) -> Vec<String> {
        self.client.list_companies().await
    }

    /// A known report alias maps directly; anything else goes through semantic lookup.
    pub async fn resolve_report(&self, hint: &str) -> String {
        match canonical_report_name(hint) {
            Some(exact) => exact.to_string(),
            None => self.resolver.resolve(hint).await,
        }
    }

    pub async fn fetch(&self, company: &str, hint: &str) -> Result<FetchedReport> {
        let report_name = self.resolve_report(hint).await;
        info!("Fetching '{}' for '{}'", report_name, company);
        let payload = self.client.fetch_report(&report_name, company).await?;

        let cache_path = match &self.cache {
            Some(cache) => match cache.store(company, &report_name, &payload) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Could not cache '{}': {}", report_name, e);
                    None
                }
            },
            None => None,
        };

        Ok(FetchedReport {
            company: company.to_string(),
            report_name,
            payload,
            cache_path,
        })
    }

    /// The payload stored by the last fetch of this report; `None` without a cache
    /// or before the first fetch.
    pub async fn cached(&self, company: &str, hint: &str) -> Result<Option<Payload>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let report_name = self.resolve_report(hint).await;
        cache.load(company, &report_name)
    }

    fn display_table(payload: &Payload) -> (Table, Option<String>) {
        match Flattener::extract(payload) {
            Ok(extraction) => (extraction.display_table(), None),
            Err(TallyError::NoTabularData) => (
                Flattener::details_table(payload),
                Some("no tabular data found, showing the report as a single row".to_string()),
            ),
            Err(e) => (Flattener::details_table(payload), Some(e.to_string())),
        }
    }

    pub async fn table(&self, company: &str, query: &str) -> Result<Analysis> {
        let report = self.fetch(company, query).await?;
        let (table, note) = Self::display_table(&report.payload);

        let mut analysis = Analysis::new(&report, format!("Generated table with {} rows.", table.len()));
        if let Some(note) = note {
            analysis.degrade(note);
        }
        match self.renderer.table_image(&table, query) {
            Ok(path) => analysis.images.push(path),
            Err(e) => analysis.degrade(format!("table image unavailable: {}", e)),
        }
        analysis.table = Some(table);
        Ok(analysis)
    }

    /// Draws `spec` when given, otherwise a chart derived from the report's table.
    pub async fn chart(&self, company: &str, query: &str, spec: Option<ChartSpec>) -> Result<Analysis> {
        let report = self.fetch(company, query).await?;
        let mut analysis = Analysis::new(&report, "Chart generated.");

        let spec = match spec {
            Some(spec) => Some(spec),
            None => {
                let (table, note) = Self::display_table(&report.payload);
                if let Some(note) = note {
                    analysis.degrade(note);
                }
                let derived = ChartSpec::from_table(&table, query);
                analysis.table = Some(table);
                derived
            }
        };

        match spec {
            Some(spec) => match self.renderer.chart(&spec) {
                Ok(path) => analysis.images.push(path),
                Err(e) => analysis.degrade(format!("chart unavailable: {}", e)),
            },
            None => analysis.degrade("no numeric column to chart".to_string()),
        }
        Ok(analysis)
    }

    pub async fn text(&self, company: &str, query: &str) -> Result<Analysis> {
        let report = self.fetch(company, query).await?;
        Ok(Analysis::new(&report, "No charts needed."))
    }
}
