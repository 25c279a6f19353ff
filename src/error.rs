use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop an invocation and map onto a dedicated exit status.
#[derive(Debug, Error)]
pub enum FreezeError {
    #[error(
        "{} is not a subdirectory of {} (relative path: {})",
        .source_root.display(),
        .save_dataset.display(),
        .relpath.display()
    )]
    NotSubdirectory {
        save_dataset: PathBuf,
        source_root: PathBuf,
        relpath: PathBuf,
    },

    #[error(
        "{} does not look like a dataset: {} is missing",
        .save_dataset.display(),
        .marker.display()
    )]
    MissingSuperdatasetMarker {
        save_dataset: PathBuf,
        marker: PathBuf,
    },

    #[error("no image found for {pattern}; available images:\n{}", list(.candidates))]
    NoImageFound {
        pattern: String,
        candidates: Vec<String>,
    },

    #[error(
        "multiple images match {pattern}; include the differentiating suffix in the version:\n{}",
        list(.matches)
    )]
    AmbiguousImage {
        pattern: String,
        matches: Vec<String>,
    },

    #[error("no config line in {} points at {image}; nothing was marked frozen", .config.display())]
    FreezeNoOp { image: String, config: PathBuf },

    #[error("no current value for {key}; pass an explicit version")]
    MissingImageConfig { key: String },

    #[error("{command} failed: {detail}")]
    Collaborator { command: String, detail: String },
}

impl FreezeError {
    pub fn exit_code(&self) -> i32 {
        match self {
            FreezeError::NoImageFound { .. } | FreezeError::AmbiguousImage { .. } => 1,
            FreezeError::NotSubdirectory { .. } => 2,
            FreezeError::MissingSuperdatasetMarker { .. } => 4,
            _ => 1,
        }
    }
}

/// Exit status for any error surfaced from the pipeline.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|e| e.downcast_ref::<FreezeError>())
        .map(FreezeError::exit_code)
        .unwrap_or(1)
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        return "  (none)".to_string();
    }
    items
        .iter()
        .map(|s| format!("  {}", s))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
