use crate::error::{Result, TallyError};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TALLY_URL: &str = "http://localhost:9000";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Reporting period sent as `SVFROMDATE`/`SVTODATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ReportPeriod {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if to < from {
            return Err(TallyError::Config(format!(
                "report period ends ({}) before it starts ({})",
                to, from
            )));
        }
        Ok(Self { from, to })
    }
}

impl Default for ReportPeriod {
    // Wide enough to cover whatever period Tally currently has open.
    fn default() -> Self {
        Self {
            from: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap_or_default(),
            to: NaiveDate::from_ymd_opt(2030, 3, 31).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Tally HTTP gateway, e.g. `http://localhost:9000`.
    pub tally_url: String,
    pub request_timeout_secs: u64,
    /// Shared directory for rendered charts and tables.
    pub output_dir: PathBuf,
    /// Directory for the per-(company, report) JSON cache files.
    pub cache_dir: PathBuf,
    pub period: Option<ReportPeriod>,
    /// TrueType font used for chart text. Without one, charts are drawn without labels.
    pub font_path: Option<PathBuf>,
    pub gemini_model: String,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            tally_url: DEFAULT_TALLY_URL.to_string(),
            request_timeout_secs: 30,
            output_dir: PathBuf::from("generated_plots"),
            cache_dir: PathBuf::from("."),
            period: Some(ReportPeriod::default()),
            font_path: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }
}

impl TallyConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `TALLY_*` and `GEMINI_MODEL` variables, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::default();

        if let Ok(url) = std::env::var("TALLY_HTTP_HOST") {
            config.tally_url = url;
        }
        if let Ok(raw) = std::env::var("TALLY_TIMEOUT_SECS") {
            config.request_timeout_secs = raw.trim().parse().map_err(|_| {
                TallyError::Config(format!("TALLY_TIMEOUT_SECS is not a number: '{}'", raw))
            })?;
        }
        if let Ok(dir) = std::env::var("TALLY_PLOTS_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("TALLY_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Ok(font) = std::env::var("TALLY_FONT_PATH") {
            config.font_path = Some(PathBuf::from(font));
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.gemini_model = model;
        }

        debug!("Loaded configuration for Tally endpoint {}", config.tally_url);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tally_url.starts_with("http://") || self.tally_url.starts_with("https://")) {
            return Err(TallyError::Config(format!(
                "tally_url must be an http(s) URL, got '{}'",
                self.tally_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(TallyError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if let Some(period) = self.period {
            ReportPeriod::new(period.from, period.to)?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = TallyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        let period = config.period.unwrap();
        assert_eq!(period.from, NaiveDate::from_ymd_opt(2020, 4, 1).unwrap());
    }

    #[test]
    fn test_rejects_inverted_period() {
        let from = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2023, 3, 31).unwrap();
        assert!(matches!(
            ReportPeriod::new(from, to),
            Err(TallyError::Config(_))
        ));
    }

    #[test]
    fn test_from_json_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tally_url": "http://tally.local:9000"}}"#).unwrap();

        let config = TallyConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.tally_url, "http://tally.local:9000");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.output_dir, PathBuf::from("generated_plots"));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = TallyConfig {
            tally_url: "localhost:9000".to_string(),
            ..TallyConfig::default()
        };
        assert!(matches!(config.validate(), Err(TallyError::Config(_))));
    }
}
