use std::{
    collections::BTreeMap,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    board::{Coord, Extent},
    region::OwnershipRegion,
};

pub const BUILTIN_PLANNER_CONFIG: &str = include_str!("data/planner_config.json");

/// Teleport letter to landing cell, as used by order tracing.
pub type TeleportTable = BTreeMap<String, Coord>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub home: Coord,
    pub horizon: u32,
    pub min_points: u32,
    /// Polygon corners; empty means the whole board.
    pub ownership_region: Vec<Coord>,
    pub teleports: TeleportTable,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            home: Coord::new(31, 7),
            horizon: 3,
            min_points: 5,
            ownership_region: Vec::new(),
            teleports: TeleportTable::new(),
        }
    }
}

impl PlannerConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_PLANNER_CONFIG)
                .expect("builtin planner config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, PlannerConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| PlannerConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let config = PlannerConfig::from_json_str(&contents)?;
        Ok(config)
    }

    /// Rasterize the configured polygon over `extent`.
    pub fn region(&self, extent: Extent) -> OwnershipRegion {
        OwnershipRegion::from_polygon(&self.ownership_region, extent)
    }

    pub fn teleport(&self, label: &str) -> Option<Coord> {
        self.teleports.get(label).copied()
    }
}

#[derive(Debug, Error)]
pub enum PlannerConfigError {
    #[error("failed to parse planner config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read planner config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct PlannerConfigMetadata {
    path: Option<PathBuf>,
}

impl PlannerConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Load the planner config from `PLANNER_CONFIG_PATH`, the crate's default
/// data file, or the builtin copy, in that order.
pub fn load_planner_config_from_env() -> (Arc<PlannerConfig>, PlannerConfigMetadata) {
    let override_path = env::var("PLANNER_CONFIG_PATH").ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/planner_config.json");

    let path = override_path.unwrap_or(default_path);
    match PlannerConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "realm_planner::config",
                path = %path.display(),
                horizon = config.horizon,
                min_points = config.min_points,
                "planner_config.loaded=file"
            );
            return (Arc::new(config), PlannerConfigMetadata::new(Some(path)));
        }
        Err(err) => {
            tracing::warn!(
                target: "realm_planner::config",
                path = %path.display(),
                error = %err,
                "planner_config.load_failed"
            );
        }
    }

    let config = PlannerConfig::builtin();
    tracing::info!(
        target: "realm_planner::config",
        "planner_config.loaded=builtin"
    );
    (config, PlannerConfigMetadata::new(None))
}
