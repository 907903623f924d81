//! CLI configuration and input file formats.

use std::path::Path;

use bragdoc_workstream::{Achievement, ClusterOptions, EpsilonStrategy, Presets, WorkstreamCentroid};
use serde::{Deserialize, Serialize};

/// Config file format. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub presets: Presets,
    pub epsilon: EpsilonStrategy,
    pub name_prefix: Option<String>,
}

impl Config {
    pub fn cluster_options(&self) -> ClusterOptions {
        let mut opts = ClusterOptions {
            epsilon: self.epsilon,
            ..Default::default()
        };
        if let Some(prefix) = &self.name_prefix {
            opts.name_prefix = prefix.clone();
        }
        opts
    }
}

/// Loads the config at `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let cfg: Config = match path {
        Some(p) => load_file(p)?,
        None => Config::default(),
    };
    cfg.presets.validate()?;
    Ok(cfg)
}

/// A workstream that already exists on the caller's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingWorkstream {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub centroid: Option<Vec<f32>>,
}

/// Input file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub workstreams: Vec<ExistingWorkstream>,
}

impl Input {
    /// Workstreams that carry a centroid, in input order.
    pub fn centroids(&self) -> Vec<WorkstreamCentroid> {
        self.workstreams
            .iter()
            .filter_map(|w| {
                w.centroid.as_ref().map(|c| WorkstreamCentroid {
                    id: w.id.clone(),
                    centroid: c.clone(),
                })
            })
            .collect()
    }

    /// Ids of workstreams that have no centroid yet.
    pub fn missing_centroids(&self) -> Vec<&str> {
        self.workstreams
            .iter()
            .filter(|w| w.centroid.is_none())
            .map(|w| w.id.as_str())
            .collect()
    }
}

/// Loads a YAML or JSON file, chosen by extension (YAML by default).
pub fn load_file<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");

    let result = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };

    Ok(result)
}
