//! Workspace configuration read from `modgraph.toml`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::graph::GraphOptions;
use crate::target::TargetContext;
use crate::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "modgraph.toml";

/// Defaults for a workspace. Command line flags override these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    pub target: TargetContext,
    pub graph: GraphOptions,
}

impl WorkspaceConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| {
            Error::config_invalid(err.message().to_string())
                .with_operation("config::parse")
                .set_source(err)
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            Error::from(err)
                .with_operation("config::from_path")
                .with_context("path", path.display().to_string())
        })?;
        let config =
            Self::parse(&text).map_err(|err| err.with_context("path", path.display().to_string()))?;
        info!(path = %path.display(), "loaded workspace config");
        Ok(config)
    }

    /// Load `modgraph.toml` from `dir` if present.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }
        Self::from_path(path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{LinkType, Platform, TargetType};
    use modgraph_error::ErrorKind;

    #[test]
    fn test_parse_full_config() {
        let config = WorkspaceConfig::parse(
            r#"
            [target]
            platform = "Win64"
            target_type = "editor"
            link_type = "monolithic"
            build_editor = true
            features = ["with_tracing"]

            [graph]
            allow_unknown_modules = true
            circular_allow_list = [["Engine", "Landscape"]]
            "#,
        )
        .unwrap();

        assert_eq!(config.target.platform, Platform::Win64);
        assert_eq!(config.target.target_type, TargetType::Editor);
        assert_eq!(config.target.link_type, LinkType::Monolithic);
        assert!(config.target.compile_against_engine);
        assert!(config.graph.allow_unknown_modules);
        assert_eq!(
            config.graph.circular_allow_list,
            vec![("Engine".to_string(), "Landscape".to_string())]
        );
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(WorkspaceConfig::parse("").unwrap(), WorkspaceConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        let err = WorkspaceConfig::parse("[target]\nplatform = \"Amiga\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = WorkspaceConfig::parse("[targets]\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_unknown_keys_in_tables() {
        let err = WorkspaceConfig::parse("[target]\nbuild_editr = true\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.message().contains("build_editr"), "{}", err.message());

        let err = WorkspaceConfig::parse("[graph]\nallow_unknown = true\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.message().contains("allow_unknown"), "{}", err.message());
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WorkspaceConfig::discover(dir.path()).unwrap().is_none());

        fs::write(dir.path().join(CONFIG_FILE_NAME), "[target]\nplatform = \"Mac\"\n").unwrap();
        let config = WorkspaceConfig::discover(dir.path()).unwrap().unwrap();
        assert_eq!(config.target.platform, Platform::Mac);
    }
}
