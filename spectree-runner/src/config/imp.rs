// Copyright (c) The spectree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{DiscoveryConfig, JunitConfig, WatchConfig};
use crate::errors::ConfigError;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde::Deserialize;
use std::{collections::BTreeSet, io, sync::LazyLock};
use tracing::{debug, warn};

/// The location of the config file within the project root, if `--config-file` isn't passed.
pub const CONFIG_PATH: &str = ".config/spectree.toml";

/// Overall spectree configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SpectreeConfig {
    /// Scanner settings.
    pub discovery: DiscoveryConfig,

    /// Change batching settings.
    pub watch: WatchConfig,

    /// JUnit settings.
    pub junit: JunitConfig,
}

/// Handles non-fatal problems found while loading the config.
trait ConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Logs warnings through `tracing`.
struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push_str("key: ");
            unknown_str.extend(unknown.iter().map(String::as_str));
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

static FUNCTION_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").expect("function name regex is valid"));

impl SpectreeConfig {
    /// Loads the config for the project at `root`.
    ///
    /// If `config_file` is given it must exist. Otherwise `root/.config/spectree.toml` is used
    /// if present, and built-in defaults if not.
    pub fn from_sources(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigError> {
        Self::from_sources_with_warnings(root, config_file, &mut DefaultConfigWarnings)
    }

    fn from_sources_with_warnings(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigError> {
        let (path, required): (Utf8PathBuf, _) = match config_file {
            Some(path) => (path.to_owned(), true),
            None => (root.join(CONFIG_PATH), false),
        };

        debug!("config: attempting to load from {path}");
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) if !required && error.kind() == io::ErrorKind::NotFound => {
                debug!("config: no file at {path}, using defaults");
                return Ok(Self::default());
            }
            Err(error) => return Err(ConfigError::Read { path, error }),
        };

        Self::from_str_with_warnings(&path, &contents, warnings)
    }

    /// Parses config from a TOML string. `path` is only used for error messages.
    pub fn from_toml(path: &Utf8Path, contents: &str) -> Result<Self, ConfigError> {
        Self::from_str_with_warnings(path, contents, &mut DefaultConfigWarnings)
    }

    fn from_str_with_warnings(
        path: &Utf8Path,
        contents: &str,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigError> {
        let deserializer = toml::Deserializer::parse(contents).map_err(|error| {
            ConfigError::Parse {
                path: path.to_owned(),
                error,
            }
        })?;
        let mut unknown = BTreeSet::new();
        let config: SpectreeConfig = serde_ignored::deserialize(deserializer, |key| {
            unknown.insert(key.to_string());
        })
        .map_err(|error| ConfigError::Parse {
            path: path.to_owned(),
            error,
        })?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(path, &unknown);
        }

        config.validate(path)?;
        debug!("config: loaded successfully from {path}");
        Ok(config)
    }

    fn validate(&self, path: &Utf8Path) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            path: path.to_owned(),
            message,
        };

        for (key, names) in [
            ("discovery.suite-functions", &self.discovery.suite_functions),
            ("discovery.test-functions", &self.discovery.test_functions),
        ] {
            if names.is_empty() {
                return Err(invalid(format!("{key} must not be empty")));
            }
            if let Some(name) = names.iter().find(|name| !FUNCTION_NAME_REGEX.is_match(name)) {
                return Err(invalid(format!(
                    "{key} contains `{name}`, which is not a valid function name"
                )));
            }
        }

        if self.discovery.tab_width == 0 {
            return Err(invalid("discovery.tab-width must be at least 1".to_owned()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use test_case::test_case;

    #[derive(Default)]
    struct TestConfigWarnings {
        unknown: Vec<(Utf8PathBuf, BTreeSet<String>)>,
    }

    impl ConfigWarnings for TestConfigWarnings {
        fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
            self.unknown
                .push((config_file.to_owned(), unknown.clone()));
        }
    }

    #[test]
    fn parse_full_config() {
        let contents = indoc! {r#"
            [discovery]
            suite-functions = ["describe"]
            test-functions = ["it", "scenario"]
            tab-width = 4

            [watch]
            debounce = "1s 500ms"

            [junit]
            report-name = "my-run"
        "#};

        let mut warnings = TestConfigWarnings::default();
        let config = SpectreeConfig::from_str_with_warnings(
            Utf8Path::new("spectree.toml"),
            contents,
            &mut warnings,
        )
        .expect("config is valid");

        assert_eq!(
            config,
            SpectreeConfig {
                discovery: DiscoveryConfig {
                    suite_functions: vec!["describe".to_owned()],
                    test_functions: vec!["it".to_owned(), "scenario".to_owned()],
                    tab_width: 4,
                },
                watch: WatchConfig {
                    debounce: Duration::from_millis(1500),
                },
                junit: JunitConfig {
                    report_name: "my-run".to_owned(),
                },
            }
        );
        assert!(warnings.unknown.is_empty());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config = SpectreeConfig::from_toml(
            Utf8Path::new("spectree.toml"),
            "[discovery]\ntab-width = 2\n",
        )
        .expect("config is valid");
        assert_eq!(config.discovery.tab_width, 2);
        assert_eq!(
            config.discovery.suite_functions,
            DiscoveryConfig::default().suite_functions
        );
        assert_eq!(config.watch, WatchConfig::default());
    }

    #[test]
    fn unknown_keys_are_reported() {
        let contents = indoc! {r#"
            unknown-top = 1

            [discovery]
            tab-width = 2
            typo-functions = ["it"]
        "#};

        let mut warnings = TestConfigWarnings::default();
        SpectreeConfig::from_str_with_warnings(
            Utf8Path::new("spectree.toml"),
            contents,
            &mut warnings,
        )
        .expect("config is valid");

        assert_eq!(warnings.unknown.len(), 1);
        assert_eq!(
            warnings.unknown[0].1,
            ["discovery.typo-functions", "unknown-top"]
                .into_iter()
                .map(String::from)
                .collect::<BTreeSet<_>>()
        );
    }

    #[test_case(
        "[discovery]\nsuite-functions = []\n",
        "discovery.suite-functions must not be empty" ; "empty suite functions"
    )]
    #[test_case(
        "[discovery]\ntest-functions = [\"it(\"]\n",
        "discovery.test-functions contains `it(`, which is not a valid function name" ; "bad test function"
    )]
    #[test_case(
        "[discovery]\ntab-width = 0\n",
        "discovery.tab-width must be at least 1" ; "zero tab width"
    )]
    fn invalid_config(contents: &str, expected_message: &str) {
        let error = SpectreeConfig::from_toml(Utf8Path::new("spectree.toml"), contents)
            .expect_err("config is invalid");
        match error {
            ConfigError::Invalid { message, .. } => assert_eq!(message, expected_message),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_error() {
        let error = SpectreeConfig::from_toml(
            Utf8Path::new("spectree.toml"),
            "[watch]\ndebounce = \"soon\"\n",
        )
        .expect_err("debounce is invalid");
        assert!(matches!(error, ConfigError::Parse { .. }), "{error:?}");
    }

    #[test]
    fn from_sources() {
        let dir = Utf8TempDir::new().expect("created temp dir");

        // No file at the default location: defaults.
        let config = SpectreeConfig::from_sources(dir.path(), None).expect("defaults");
        assert_eq!(config, SpectreeConfig::default());

        // An explicit file that doesn't exist is an error.
        let missing = dir.path().join("missing.toml");
        let error = SpectreeConfig::from_sources(dir.path(), Some(&missing))
            .expect_err("missing explicit file");
        assert!(matches!(error, ConfigError::Read { .. }), "{error:?}");

        // A file at the default location is picked up.
        std::fs::create_dir_all(dir.path().join(".config")).expect("created .config");
        std::fs::write(
            dir.path().join(CONFIG_PATH),
            "[junit]\nreport-name = \"from-file\"\n",
        )
        .expect("wrote config");
        let config = SpectreeConfig::from_sources(dir.path(), None).expect("valid config");
        assert_eq!(config.junit.report_name, "from-file");
    }
}
