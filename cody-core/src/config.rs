use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::naming::NameFilterKind;
use crate::validator::{ConstraintChain, ConstraintKind, Validator};

/// File name looked up by [`CodyConfig::discover`].
pub const CONFIG_FILE: &str = ".cody.toml";

/// Top-level Cody configuration, matching `.cody.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodyConfig {
    #[serde(default)]
    pub naming: NamingSection,
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub validation: ValidationSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamingSection {
    #[serde(default)]
    pub filter: NameFilterKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// Parse node metadata into typed instances.
    pub parse_metadata: bool,
    /// Substitute `$ref` schema references with document schemas.
    pub resolve_references: bool,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            parse_metadata: true,
            resolve_references: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSection {
    #[serde(default)]
    pub constraints: Vec<ConstraintKind>,
}

impl CodyConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Read `dir/.cody.toml` when present, else defaults.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        let constraints = &self.validation.constraints;
        for (i, kind) in constraints.iter().enumerate() {
            if constraints[..i].contains(kind) {
                return Err(ConfigError::Invalid(format!(
                    "validation.constraints lists {kind:?} twice"
                )));
            }
        }
        Ok(())
    }

    pub fn validator(&self) -> Validator {
        let mut chain = ConstraintChain::new();
        for kind in &self.validation.constraints {
            chain.push(kind.build(self.naming.filter));
        }
        Validator::new(chain)
    }
}
