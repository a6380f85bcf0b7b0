//! Serializable batch configuration.

use crate::batch::Target;
use crate::error::{RewriteError, Result};
use crate::transform::{InsertRule, Rule, SubstituteRule, Template, TransformSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A serializable rule definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RuleConfig {
    /// Insert a line after an anchor line unless a marker is present.
    #[serde(rename = "insert_after")]
    InsertAfter {
        name: String,
        anchor: String,
        line: Template,
        /// Defaults to the line without its trailing `;`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        marker: Option<Template>,
    },

    /// Replace a symbol, optionally turning its definition into a comment.
    #[serde(rename = "substitute")]
    Substitute {
        name: String,
        symbol: String,
        replacement: Template,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        definition: Option<Template>,
        /// Also rewrite occurrences inside comments and string literals.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        include_literals: bool,
    },
}

impl RuleConfig {
    /// Builds the rule.
    pub fn to_rule(&self) -> Box<dyn Rule> {
        match self {
            RuleConfig::InsertAfter {
                name,
                anchor,
                line,
                marker,
            } => {
                let rule = InsertRule::new(name.as_str(), anchor.as_str(), line.clone());
                match marker {
                    Some(marker) => Box::new(rule.marker(marker.clone())),
                    None => Box::new(rule),
                }
            }
            RuleConfig::Substitute {
                name,
                symbol,
                replacement,
                definition,
                include_literals,
            } => {
                let mut rule =
                    SubstituteRule::new(name.as_str(), symbol.as_str(), replacement.clone());
                if let Some(definition) = definition {
                    rule = rule.definition_comment(definition.clone());
                }
                if *include_literals {
                    rule = rule.include_literals();
                }
                Box::new(rule)
            }
        }
    }
}

/// A serializable batch: rules plus the ordered targets they apply to.
///
/// # Example YAML
///
/// ```yaml
/// name: tenant-paths
/// root: src/services
/// rules:
///   - type: insert_after
///     name: paths-import
///     anchor: "import { db } from '../config/firebaseConfig';"
///     line: "import paths from '../utils/firestorePaths';"
///   - type: substitute
///     name: collection-name
///     symbol: COLLECTION_NAME
///     replacement: "paths.{param}()"
///     definition: "// Multi-tenant: using paths.{param}()"
/// targets:
///   - path: noticesService.js
///     param: notices
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Base directory for relative target paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    pub rules: Vec<RuleConfig>,

    #[serde(default)]
    pub targets: Vec<Target>,
}

impl BatchConfig {
    /// Creates an empty config.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            root: None,
            rules: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Adds a rule.
    pub fn rule(mut self, rule: RuleConfig) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds a target.
    pub fn target(mut self, path: impl Into<PathBuf>, param: impl Into<String>) -> Self {
        self.targets.push(Target::new(path, param));
        self
    }

    /// Overrides the base directory for relative target paths.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Loads a config, choosing the format from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            _ => Err(RewriteError::InvalidConfig(format!(
                "unsupported config format: {} (expected .yaml, .yml or .json)",
                path.display()
            ))),
        }
    }

    /// Loads config from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Loads config from a JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Parses config from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            RewriteError::InvalidConfig(format!("Failed to parse YAML config: {}", e))
        })
    }

    /// Parses config from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            RewriteError::InvalidConfig(format!("Failed to parse JSON config: {}", e))
        })
    }

    /// Serializes to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds the validated spec.
    pub fn spec(&self) -> Result<TransformSpec> {
        TransformSpec::new(
            self.name.as_str(),
            self.rules.iter().map(RuleConfig::to_rule).collect(),
        )
    }

    /// Targets with relative paths resolved against `root`.
    pub fn resolved_targets(&self) -> Vec<Target> {
        match &self.root {
            Some(root) => self
                .targets
                .iter()
                .cloned()
                .map(|t| t.resolve(root))
                .collect(),
            None => self.targets.clone(),
        }
    }

    /// Builds the validated spec and the resolved targets.
    pub fn build(&self) -> Result<(TransformSpec, Vec<Target>)> {
        Ok((self.spec()?, self.resolved_targets()))
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        RewriteError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read config file {}: {}", path.display(), e),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const YAML: &str = r#"
name: tenant-paths
root: src/services
rules:
  - type: insert_after
    name: paths-import
    anchor: "import { db } from '../config/firebaseConfig';"
    line: "import paths from '../utils/firestorePaths';"
  - type: substitute
    name: collection-name
    symbol: COLLECTION_NAME
    replacement: "paths.{param}()"
    definition: "// Multi-tenant: using paths.{param}()"
targets:
  - path: noticesService.js
    param: notices
  - path: formsService.js
    param: forms
"#;

    #[test]
    fn test_parse_yaml() {
        let config = BatchConfig::from_yaml_str(YAML).unwrap();

        assert_eq!(config.name, "tenant-paths");
        assert_eq!(config.rules.len(), 2);
        assert!(matches!(
            &config.rules[1],
            RuleConfig::Substitute { symbol, include_literals: false, .. } if symbol == "COLLECTION_NAME"
        ));

        let (spec, targets) = config.build().unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(
            targets[0],
            Target::new("src/services/noticesService.js", "notices")
        );
        assert_eq!(targets[1].param, "forms");
    }

    #[test]
    fn test_json_and_yaml_agree() {
        let config = BatchConfig::from_yaml_str(YAML).unwrap();
        let json = config.to_json().unwrap();
        assert_eq!(BatchConfig::from_json_str(&json).unwrap(), config);

        let yaml = config.to_yaml().unwrap();
        assert_eq!(BatchConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_unknown_rule_type_rejected() {
        let yaml = "name: x\nrules:\n  - type: delete_line\n    name: d\n";
        let err = BatchConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, RewriteError::InvalidConfig(_)));
    }

    #[test]
    fn test_conflicting_rules_fail_at_build() {
        let config = BatchConfig::new("bad").rule(RuleConfig::Substitute {
            name: "loop".into(),
            symbol: "NAME".into(),
            replacement: Template::new("f(NAME)"),
            definition: None,
            include_literals: false,
        });
        assert!(matches!(config.build(), Err(RewriteError::SpecConflict(_))));
    }

    #[test]
    fn test_from_path_by_extension() {
        let dir = TempDir::new().unwrap();
        let yaml_path = dir.path().join("batch.yml");
        std::fs::write(&yaml_path, YAML).unwrap();
        assert!(BatchConfig::from_path(&yaml_path).is_ok());

        let toml_path = dir.path().join("batch.toml");
        std::fs::write(&toml_path, "name = 'x'").unwrap();
        assert!(matches!(
            BatchConfig::from_path(&toml_path),
            Err(RewriteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_with_root_override() {
        let config = BatchConfig::from_yaml_str(YAML)
            .unwrap()
            .with_root("/work/app/src/services");
        let targets = config.resolved_targets();
        assert_eq!(
            targets[1].path,
            PathBuf::from("/work/app/src/services/formsService.js")
        );
    }
}
