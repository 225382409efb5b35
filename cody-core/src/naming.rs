use serde::{Deserialize, Serialize};

use cody_graph::NameFilter;

/// Built-in label normalisations, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NameFilterKind {
    /// Strip surrounding whitespace.
    #[default]
    Trim,
    /// Trim, then fold every inner whitespace run (line breaks included) into one space.
    CollapseWhitespace,
    /// Keep labels as drawn.
    Identity,
}

impl NameFilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trim => "trim",
            Self::CollapseWhitespace => "collapse-whitespace",
            Self::Identity => "identity",
        }
    }
}

impl std::fmt::Display for NameFilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NameFilter for NameFilterKind {
    fn filter(&self, label: &str) -> String {
        match self {
            Self::Trim => label.trim().to_string(),
            Self::CollapseWhitespace => label.split_whitespace().collect::<Vec<_>>().join(" "),
            Self::Identity => label.to_string(),
        }
    }
}
