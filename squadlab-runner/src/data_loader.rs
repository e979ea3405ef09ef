//! Reads projection, fixture and squad-state files named by a [`RunConfig`].

use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;

use squadlab_core::domain::SquadState;
use squadlab_core::projection::{
    read_fixtures, read_projections, Fixture, ProjectionError, ProjectionTable,
};

use crate::config::RunConfig;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Projection {
        path: PathBuf,
        #[source]
        source: ProjectionError,
    },

    #[error("{}: invalid JSON state: {source}", path.display())]
    StateJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: invalid TOML state: {source}", path.display())]
    StateToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Projection table (with fixtures attached) and squad state for one run.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub table: ProjectionTable,
    pub state: SquadState,
}

pub fn load_run_data(config: &RunConfig) -> Result<LoadedData, LoadError> {
    let mut table = load_projections(&config.projections)?;
    if let Some(path) = &config.fixtures {
        let fixtures = load_fixtures(path)?;
        table = table.with_fixtures(fixtures);
    }
    let state = load_state(&config.state)?;
    tracing::info!(
        event = "data_loaded",
        players = table.len(),
        fixtures = table.fixtures().len(),
        owned = state.owned.len(),
        preseason = state.is_preseason(),
    );
    Ok(LoadedData { table, state })
}

pub fn load_projections(path: &Path) -> Result<ProjectionTable, LoadError> {
    let file = open(path)?;
    read_projections(file).map_err(|source| LoadError::Projection {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_fixtures(path: &Path) -> Result<Vec<Fixture>, LoadError> {
    let file = open(path)?;
    read_fixtures(file).map_err(|source| LoadError::Projection {
        path: path.to_path_buf(),
        source,
    })
}

/// `.toml` files parse as TOML; anything else as JSON.
pub fn load_state(path: &Path) -> Result<SquadState, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        SquadState::from_toml(&content).map_err(|source| LoadError::StateToml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        SquadState::from_json(&content).map_err(|source| LoadError::StateJson {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
