use crate::config::TallyConfig;
use crate::error::Result;
use crate::payload::Payload;
use crate::utils::sanitize_identifier;
use log::debug;
use std::path::{Path, PathBuf};

/// One JSON file per (company, report), overwritten on every fetch. Narration and
/// later table or chart requests read the decoded payload back from here.
#[derive(Debug, Clone)]
pub struct ReportCache {
    dir: PathBuf,
}

impl ReportCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &TallyConfig) -> Self {
        Self::new(config.cache_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `data_<company>_<report>.json` with both parts reduced to alphanumerics.
    pub fn path_for(&self, company: &str, report: &str) -> PathBuf {
        self.dir.join(format!(
            "data_{}_{}.json",
            sanitize_identifier(company),
            sanitize_identifier(report)
        ))
    }

    pub fn store(&self, company: &str, report: &str, payload: &Payload) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(company, report);
        std::fs::write(&path, serde_json::to_string_pretty(payload)?)?;
        debug!("Cached '{}' for '{}' at {}", report, company, path.display());
        Ok(path)
    }

    /// `None` when nothing has been cached for the pair yet.
    pub fn load(&self, company: &str, report: &str) -> Result<Option<Payload>> {
        let path = self.path_for(company, report);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_sanitized() {
        let cache = ReportCache::new("/tmp/cache");
        assert_eq!(
            cache.path_for("Acme & Sons (2024)", "Profit & Loss A/c"),
            PathBuf::from("/tmp/cache/data_AcmeSons2024_ProfitLossAc.json")
        );
    }

    #[test]
    fn test_store_overwrites_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ReportCache::new(dir.path().join("cache"));
        assert!(cache.load("Acme", "Day Book").unwrap().is_none());

        let first = Payload::Node(vec![("A".to_string(), Payload::Leaf("1".to_string()))]);
        let second = Payload::Node(vec![
            ("B".to_string(), Payload::Leaf("2".to_string())),
            ("A".to_string(), Payload::Leaf("3".to_string())),
        ]);
        cache.store("Acme", "Day Book", &first).unwrap();
        let path = cache.store("Acme", "Day Book", &second).unwrap();

        assert!(path.ends_with("data_Acme_DayBook.json"));
        assert_eq!(cache.load("Acme", "Day Book").unwrap(), Some(second));
    }
}
