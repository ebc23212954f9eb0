//! Run configuration.
//!
//! A [`GrouperConfig`] is built once, checked, and then shared by reference
//! with every component for the rest of the run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::identity::{DATE_DISPLAY_FORMAT, DateWindow, TransferMode, parse_date_string};

/// Configuration for a grouping run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct GrouperConfig {
    /// Tree holding the files to process.
    pub source_root: PathBuf,

    /// Staging tree for files awaiting ingestion.
    pub pre_process_root: PathBuf,

    /// Canonical tree of ingested issues.
    pub post_process_root: PathBuf,

    /// Tree for files that need a person to look at them.
    pub for_review_root: PathBuf,

    /// Issue dates to process.
    #[builder(default)]
    #[serde(default)]
    pub window: DateWindow,

    /// Create missing target roots instead of failing.
    #[builder(default = "false")]
    #[serde(default)]
    pub create_targets: bool,

    /// Route non-PDF files to the review tree during pre-processing.
    #[builder(default = "false")]
    #[serde(default)]
    pub include_non_pdf_files: bool,

    /// Move or copy sources.
    #[builder(default)]
    #[serde(default)]
    pub transfer_mode: TransferMode,

    /// Log every transfer and decision.
    #[builder(default = "false")]
    #[serde(default)]
    pub verbose: bool,

    /// Promote unit entries whose names start with `.`.
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden_unit_entries: bool,

    /// Pause before each hashing attempt, in milliseconds.
    #[builder(default = "default_hash_retry_delays_ms()")]
    #[serde(default = "default_hash_retry_delays_ms")]
    pub hash_retry_delays_ms: Vec<u64>,

    /// Emit a status update after this many source files.
    #[builder(default = "5000")]
    #[serde(default = "default_status_interval_files")]
    pub status_interval_files: usize,

    /// Emit a status update after this many units.
    #[builder(default = "100")]
    #[serde(default = "default_status_interval_units")]
    pub status_interval_units: usize,

    /// Abort on the first per-file or per-unit failure.
    #[builder(default = "false")]
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_hash_retry_delays_ms() -> Vec<u64> {
    vec![0, 300, 900, 4_000, 60_000, 120_000]
}

fn default_status_interval_files() -> usize {
    5000
}

fn default_status_interval_units() -> usize {
    100
}

impl GrouperConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let roots = [
            ("source", &self.source_root),
            ("pre-process", &self.pre_process_root),
            ("post-process", &self.post_process_root),
            ("for-review", &self.for_review_root),
        ];
        for (role, root) in roots {
            if let Some(root) = root {
                if root.as_os_str().is_empty() {
                    return Err(format!("{role} root cannot be empty"));
                }
            }
        }
        if let Some(delays) = &self.hash_retry_delays_ms {
            if delays.is_empty() {
                return Err("hash retry schedule needs at least one attempt".to_string());
            }
        }
        Ok(())
    }
}

impl From<GrouperConfigBuilderError> for ConfigError {
    fn from(err: GrouperConfigBuilderError) -> Self {
        ConfigError::Invalid {
            message: err.to_string(),
        }
    }
}

impl GrouperConfig {
    /// Create a new config builder.
    pub fn builder() -> GrouperConfigBuilder {
        GrouperConfigBuilder::default()
    }

    /// Reject values that no run can use.
    pub fn check(&self) -> Result<(), ConfigError> {
        if !self.window.is_ordered() {
            return Err(ConfigError::InvalidDateRange {
                start: self.window.start,
                end: self.window.end,
            });
        }
        Ok(())
    }

    /// Verify the source root is an existing directory.
    pub fn prepare_source(&self) -> Result<(), ConfigError> {
        let path = &self.source_root;
        if path.is_dir() {
            Ok(())
        } else if path.exists() {
            Err(ConfigError::NotADirectory {
                role: "source",
                path: path.clone(),
            })
        } else {
            Err(ConfigError::MissingRoot {
                role: "source",
                path: path.clone(),
            })
        }
    }

    /// Verify, or create when allowed, every target root.
    pub fn prepare_targets(&self) -> Result<(), ConfigError> {
        let targets = [
            ("pre-process", &self.pre_process_root),
            ("post-process", &self.post_process_root),
            ("for-review", &self.for_review_root),
        ];
        for (role, path) in targets {
            ensure_directory(role, path, self.create_targets)?;
        }
        Ok(())
    }

    /// Run every check that must pass before any file is touched.
    pub fn prepare_roots(&self) -> Result<(), ConfigError> {
        self.check()?;
        self.prepare_source()?;
        self.prepare_targets()
    }

    /// One-line description of the date window.
    pub fn window_description(&self) -> String {
        format!(
            "{} ..= {}",
            self.window.start.format(DATE_DISPLAY_FORMAT),
            self.window.end.format(DATE_DISPLAY_FORMAT)
        )
    }
}

fn ensure_directory(role: &'static str, path: &Path, create: bool) -> Result<(), ConfigError> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(ConfigError::NotADirectory {
            role,
            path: path.to_path_buf(),
        });
    }
    if !create {
        return Err(ConfigError::MissingRoot {
            role,
            path: path.to_path_buf(),
        });
    }
    fs::create_dir_all(path).map_err(|source| ConfigError::CreateFailed {
        role,
        path: path.to_path_buf(),
        source,
    })
}

/// Values read from a TOML settings file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrouperSettings {
    pub source_root: Option<PathBuf>,
    pub pre_process_root: Option<PathBuf>,
    pub post_process_root: Option<PathBuf>,
    pub for_review_root: Option<PathBuf>,
    /// `yyyyMMdd`
    pub starting_date: Option<String>,
    /// `yyyyMMdd`
    pub ending_date: Option<String>,
    pub create_targets: Option<bool>,
    pub include_non_pdf_files: Option<bool>,
    pub transfer_mode: Option<TransferMode>,
    pub verbose: Option<bool>,
    pub include_hidden_unit_entries: Option<bool>,
    pub hash_retry_delays_ms: Option<Vec<u64>>,
    pub status_interval_files: Option<usize>,
    pub status_interval_units: Option<usize>,
    pub fail_fast: Option<bool>,
}

impl GrouperSettings {
    /// Read settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Parse settings from TOML text; `path` is only used in errors.
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Layer `overrides` on top of these settings.
    pub fn merge(self, overrides: GrouperSettings) -> GrouperSettings {
        GrouperSettings {
            source_root: overrides.source_root.or(self.source_root),
            pre_process_root: overrides.pre_process_root.or(self.pre_process_root),
            post_process_root: overrides.post_process_root.or(self.post_process_root),
            for_review_root: overrides.for_review_root.or(self.for_review_root),
            starting_date: overrides.starting_date.or(self.starting_date),
            ending_date: overrides.ending_date.or(self.ending_date),
            create_targets: overrides.create_targets.or(self.create_targets),
            include_non_pdf_files: overrides.include_non_pdf_files.or(self.include_non_pdf_files),
            transfer_mode: overrides.transfer_mode.or(self.transfer_mode),
            verbose: overrides.verbose.or(self.verbose),
            include_hidden_unit_entries: overrides
                .include_hidden_unit_entries
                .or(self.include_hidden_unit_entries),
            hash_retry_delays_ms: overrides.hash_retry_delays_ms.or(self.hash_retry_delays_ms),
            status_interval_files: overrides.status_interval_files.or(self.status_interval_files),
            status_interval_units: overrides.status_interval_units.or(self.status_interval_units),
            fail_fast: overrides.fail_fast.or(self.fail_fast),
        }
    }

    /// Copy every value that is set onto `builder`.
    pub fn apply(&self, builder: &mut GrouperConfigBuilder) -> Result<(), ConfigError> {
        if let Some(v) = &self.source_root {
            builder.source_root(v.clone());
        }
        if let Some(v) = &self.pre_process_root {
            builder.pre_process_root(v.clone());
        }
        if let Some(v) = &self.post_process_root {
            builder.post_process_root(v.clone());
        }
        if let Some(v) = &self.for_review_root {
            builder.for_review_root(v.clone());
        }
        if self.starting_date.is_some() || self.ending_date.is_some() {
            let current = builder.window.unwrap_or_default();
            let start = parse_setting_date(self.starting_date.as_deref(), current.start)?;
            let end = parse_setting_date(self.ending_date.as_deref(), current.end)?;
            builder.window(DateWindow::new(start, end));
        }
        if let Some(v) = self.create_targets {
            builder.create_targets(v);
        }
        if let Some(v) = self.include_non_pdf_files {
            builder.include_non_pdf_files(v);
        }
        if let Some(v) = self.transfer_mode {
            builder.transfer_mode(v);
        }
        if let Some(v) = self.verbose {
            builder.verbose(v);
        }
        if let Some(v) = self.include_hidden_unit_entries {
            builder.include_hidden_unit_entries(v);
        }
        if let Some(v) = &self.hash_retry_delays_ms {
            builder.hash_retry_delays_ms(v.clone());
        }
        if let Some(v) = self.status_interval_files {
            builder.status_interval_files(v);
        }
        if let Some(v) = self.status_interval_units {
            builder.status_interval_units(v);
        }
        if let Some(v) = self.fail_fast {
            builder.fail_fast(v);
        }
        Ok(())
    }
}

fn parse_setting_date(raw: Option<&str>, fallback: NaiveDate) -> Result<NaiveDate, ConfigError> {
    match raw {
        Some(raw) => parse_date_string(raw).map_err(|err| ConfigError::Invalid {
            message: err.to_string(),
        }),
        None => Ok(fallback),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn builder_with_roots(root: &Path) -> GrouperConfigBuilder {
        let mut builder = GrouperConfig::builder();
        builder
            .source_root(root.join("source"))
            .pre_process_root(root.join("pre"))
            .post_process_root(root.join("post"))
            .for_review_root(root.join("review"));
        builder
    }

    #[test]
    fn test_config_defaults() {
        let config = builder_with_roots(Path::new("/archive")).build().unwrap();

        assert_eq!(config.window, DateWindow::default());
        assert_eq!(config.transfer_mode, TransferMode::Copy);
        assert_eq!(config.hash_retry_delays_ms, vec![0, 300, 900, 4_000, 60_000, 120_000]);
        assert_eq!(config.status_interval_files, 5000);
        assert!(!config.create_targets);
        assert!(!config.include_hidden_unit_entries);
    }

    #[test]
    fn test_builder_requires_roots() {
        let err = GrouperConfig::builder()
            .source_root("/archive/source")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("pre_process_root"));
    }

    #[test]
    fn test_builder_rejects_empty_root() {
        let err = builder_with_roots(Path::new("/archive"))
            .source_root("")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("source root cannot be empty"));
    }

    #[test]
    fn test_check_rejects_inverted_window() {
        let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let config = builder_with_roots(Path::new("/archive"))
            .window(DateWindow::new(start, end))
            .build()
            .unwrap();

        assert!(matches!(config.check(), Err(ConfigError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_prepare_roots_missing_targets() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("source")).unwrap();
        let config = builder_with_roots(temp.path()).build().unwrap();

        let err = config.prepare_roots().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRoot { role: "pre-process", .. }));
        assert!(!temp.path().join("pre").exists());
    }

    #[test]
    fn test_prepare_roots_creates_targets() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("source")).unwrap();
        let config = builder_with_roots(temp.path())
            .create_targets(true)
            .build()
            .unwrap();

        config.prepare_roots().unwrap();
        assert!(temp.path().join("pre").is_dir());
        assert!(temp.path().join("post").is_dir());
        assert!(temp.path().join("review").is_dir());
    }

    #[test]
    fn test_prepare_source_must_exist() {
        let temp = TempDir::new().unwrap();
        let config = builder_with_roots(temp.path())
            .create_targets(true)
            .build()
            .unwrap();

        assert!(matches!(
            config.prepare_roots(),
            Err(ConfigError::MissingRoot { role: "source", .. })
        ));
    }

    #[test]
    fn test_settings_apply() {
        let text = r#"
            source_root = "/data/source"
            pre_process_root = "/data/pre"
            post_process_root = "/data/post"
            for_review_root = "/data/review"
            starting_date = "20180101"
            transfer_mode = "move"
            fail_fast = true
        "#;
        let settings = GrouperSettings::parse(Path::new("grouper.toml"), text).unwrap();
        let mut builder = GrouperConfig::builder();
        settings.apply(&mut builder).unwrap();
        let config = builder.build().unwrap();

        assert_eq!(config.source_root, PathBuf::from("/data/source"));
        assert_eq!(config.window.start, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(config.window.end, DateWindow::default().end);
        assert_eq!(config.transfer_mode, TransferMode::Move);
        assert!(config.fail_fast);
    }

    #[test]
    fn test_settings_merge_prefers_overrides() {
        let file = GrouperSettings::parse(
            Path::new("grouper.toml"),
            "source_root = \"/data/source\"\npre_process_root = \"/data/pre\"\nverbose = false",
        )
        .unwrap();
        let cli = GrouperSettings {
            pre_process_root: Some(PathBuf::from("/fast/pre")),
            verbose: Some(true),
            ..GrouperSettings::default()
        };

        let merged = file.merge(cli);
        assert_eq!(merged.source_root, Some(PathBuf::from("/data/source")));
        assert_eq!(merged.pre_process_root, Some(PathBuf::from("/fast/pre")));
        assert_eq!(merged.verbose, Some(true));
        assert_eq!(merged.post_process_root, None);
    }

    #[test]
    fn test_settings_reject_unknown_keys() {
        let err = GrouperSettings::parse(Path::new("grouper.toml"), "colour = \"blue\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_settings_reject_bad_date() {
        let settings =
            GrouperSettings::parse(Path::new("grouper.toml"), "ending_date = \"2019-06-30\"").unwrap();
        let mut builder = GrouperConfig::builder();
        assert!(settings.apply(&mut builder).is_err());
    }
}
