//! Serializable filter definition (TOML manifests, registry records)

use crate::error::FilterError;
use crate::filter::filter_set::FilterSet;
use crate::filter::path_filter::PathFilter;
use crate::filter::workspace::WorkspaceFilter;
use crate::import::ImportMode;
use crate::tree::NodePath;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDefinition {
    #[serde(default)]
    pub sets: Vec<FilterSetDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSetDefinition {
    pub root: String,
    #[serde(default)]
    pub mode: Option<ImportMode>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleDefinition {
    Include(String),
    Exclude(String),
}

impl FilterDefinition {
    pub fn build(&self) -> Result<WorkspaceFilter, FilterError> {
        let mut filter = WorkspaceFilter::new();
        for set_def in &self.sets {
            let mut set = FilterSet::new(NodePath::parse(&set_def.root)?);
            if let Some(mode) = set_def.mode {
                set = set.with_mode(mode);
            }
            for rule in &set_def.rules {
                set.add_rule(match rule {
                    RuleDefinition::Include(pattern) => PathFilter::include(pattern)?,
                    RuleDefinition::Exclude(pattern) => PathFilter::exclude(pattern)?,
                });
            }
            filter.add(set)?;
        }
        Ok(filter)
    }
}

impl From<&WorkspaceFilter> for FilterDefinition {
    fn from(filter: &WorkspaceFilter) -> Self {
        FilterDefinition {
            sets: filter
                .sets()
                .iter()
                .map(|set| FilterSetDefinition {
                    root: set.root().to_string(),
                    mode: set.mode(),
                    rules: set
                        .rules()
                        .iter()
                        .map(|rule| {
                            let pattern = rule.pattern().to_string();
                            if rule.is_include() {
                                RuleDefinition::Include(pattern)
                            } else {
                                RuleDefinition::Exclude(pattern)
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<WorkspaceFilter> for FilterDefinition {
    fn from(filter: WorkspaceFilter) -> Self {
        FilterDefinition::from(&filter)
    }
}

impl TryFrom<FilterDefinition> for WorkspaceFilter {
    type Error = FilterError;

    fn try_from(definition: FilterDefinition) -> Result<Self, Self::Error> {
        definition.build()
    }
}
