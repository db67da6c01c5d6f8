use serde::{Deserialize, Serialize};

use liveref_types::RootKind;

use crate::error::{Result, ScanError};

/// Configuration for a live reference scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Start from static fields.
    pub static_roots: bool,
    /// Start from thread-stack locals.
    pub thread_roots: bool,
    /// Stop after this many objects have been visited.
    pub max_visited: Option<usize>,
    /// Report progress every this many dequeued objects.
    pub progress_interval: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            static_roots: true,
            thread_roots: true,
            max_visited: None,
            progress_interval: 1,
        }
    }
}

impl ScanConfig {
    /// Ignore runtime roots; only explicit hints start the scan.
    pub fn hints_only() -> Self {
        Self {
            static_roots: false,
            thread_roots: false,
            ..Default::default()
        }
    }

    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ScanError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values a scan cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(ScanError::InvalidArgument(
                "progress_interval must be at least 1".into(),
            ));
        }
        if self.max_visited == Some(0) {
            return Err(ScanError::InvalidArgument(
                "max_visited must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }

    /// Whether runtime roots of `kind` take part in the scan.
    pub fn includes(&self, kind: RootKind) -> bool {
        match kind {
            RootKind::StaticField => self.static_roots,
            RootKind::ThreadFrame => self.thread_roots,
            RootKind::ExplicitHint => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ScanConfig::default();
        assert!(c.static_roots);
        assert!(c.thread_roots);
        assert!(c.max_visited.is_none());
        assert_eq!(c.progress_interval, 1);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn hints_only_excludes_runtime_roots() {
        let c = ScanConfig::hints_only();
        assert!(!c.includes(RootKind::StaticField));
        assert!(!c.includes(RootKind::ThreadFrame));
        assert!(c.includes(RootKind::ExplicitHint));
    }

    #[test]
    fn parse_partial_toml() {
        let c = ScanConfig::from_toml_str("thread_roots = false\nmax_visited = 500\n").unwrap();
        assert!(c.static_roots);
        assert!(!c.thread_roots);
        assert_eq!(c.max_visited, Some(500));
        assert_eq!(c.progress_interval, 1);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ScanConfig::from_toml_str("progress_interval = 0"),
            Err(ScanError::InvalidArgument(_))
        ));
        assert!(matches!(
            ScanConfig::from_toml_str("max_visited = 0"),
            Err(ScanError::InvalidArgument(_))
        ));
        assert!(matches!(
            ScanConfig::from_toml_str("static_roots = \"yes\""),
            Err(ScanError::Config(_))
        ));
    }
}
