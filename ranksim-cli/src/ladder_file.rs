use ranksim_game::{LadderConfig, LadderConfigError, LadderSource};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Ladder tables read from a JSON file.
#[derive(Debug, Clone)]
pub struct FileLadder {
    path: PathBuf,
}

impl FileLadder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Error)]
pub enum LadderFileError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: LadderConfigError,
    },
}

impl LadderSource for FileLadder {
    type Error = LadderFileError;

    fn load_ladder(&self) -> Result<LadderConfig, Self::Error> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| LadderFileError::Read {
            path: self.path.clone(),
            source,
        })?;
        LadderConfig::from_json_str(&text).map_err(|source| LadderFileError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}
