use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;
use tracing::info;

use crate::error::FreezeError;

/// Records the mutated configuration of a dataset as a new version.
pub trait DatasetSaver {
    fn save(&mut self, dataset: &Path, message: &str) -> Result<()>;
}

/// Saves through the `datalad` command line.
#[derive(Clone, Debug)]
pub struct DataladSave {
    program: PathBuf,
}

impl Default for DataladSave {
    fn default() -> Self {
        Self {
            program: PathBuf::from("datalad"),
        }
    }
}

impl DatasetSaver for DataladSave {
    fn save(&mut self, dataset: &Path, message: &str) -> Result<()> {
        let command = format!("{} save -d {}", self.program.display(), dataset.display());
        info!(dataset = %dataset.display(), "saving dataset");
        let status = Command::new(&self.program)
            .arg("save")
            .arg("-d")
            .arg(dataset)
            .arg("-m")
            .arg(message)
            .status()
            .map_err(|e| FreezeError::Collaborator {
                command: command.clone(),
                detail: e.to_string(),
            })?;
        if !status.success() {
            return Err(FreezeError::Collaborator {
                command,
                detail: format!("exit status {}", status),
            }
            .into());
        }
        Ok(())
    }
}

/// Remembers saves instead of performing them.
#[derive(Clone, Debug, Default)]
pub struct RecordingSaver {
    pub saves: Vec<(PathBuf, String)>,
}

impl DatasetSaver for RecordingSaver {
    fn save(&mut self, dataset: &Path, message: &str) -> Result<()> {
        self.saves.push((dataset.to_path_buf(), message.to_string()));
        Ok(())
    }
}
