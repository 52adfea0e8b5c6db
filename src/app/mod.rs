use crate::config::Config;
use crate::rules::RuleTable;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Resolved configuration and compiled rules for one invocation.
pub struct AppContext {
    pub config: Config,
    pub rules: RuleTable,
}

impl AppContext {
    /// Resolve config and rules; explicit paths win over the config file.
    pub fn bootstrap(config_path: Option<&Path>, rules_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        let rules_path = rules_path
            .map(Path::to_path_buf)
            .or_else(|| config.rules.path.clone());
        let rules = load_rules(rules_path.as_deref())?;

        info!(
            "Rule table ready: {} phrase rules, {} name rules, {} categories",
            rules.phrases().len(),
            rules.names().len(),
            rules.categories().len()
        );

        Ok(Self { config, rules })
    }

    /// The directory to scan: explicit argument, then config.
    pub fn data_dir(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| self.config.batch.data_dir.clone())
    }
}

fn load_rules(path: Option<&Path>) -> Result<RuleTable> {
    match path {
        Some(path) => RuleTable::from_file(path)
            .with_context(|| format!("Failed to load rule table {:?}", path)),
        None => RuleTable::builtin().context("Built-in rule table is invalid"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_rules_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let rules_path = dir.path().join("rules.toml");
        std::fs::write(
            &rules_path,
            "[[phrase]]\npattern = 'foo'\nreplacement = 'bar'\n",
        )
        .unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[batch]\ndata_dir = 'clips'\n").unwrap();

        let context = AppContext::bootstrap(Some(&config_path), Some(&rules_path)).unwrap();

        assert_eq!(context.rules.phrases().len(), 1);
        assert_eq!(context.data_dir(None), PathBuf::from("clips"));
        assert_eq!(
            context.data_dir(Some(PathBuf::from("other"))),
            PathBuf::from("other")
        );
    }

    #[test]
    fn test_config_rules_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let rules_path = dir.path().join("rules.toml");
        std::fs::write(&rules_path, "[[name]]\nalias = 'x'\ncanonical = 'y'\n").unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!("[rules]\npath = {:?}\n", rules_path.display().to_string()),
        )
        .unwrap();

        let context = AppContext::bootstrap(Some(&config_path), None).unwrap();

        assert_eq!(context.rules.names().len(), 1);
        assert!(context.rules.phrases().is_empty());
    }

    #[test]
    fn test_missing_rules_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "").unwrap();

        let result = AppContext::bootstrap(
            Some(&config_path),
            Some(Path::new("/nonexistent/rules.toml")),
        );
        assert!(result.is_err());
    }
}
