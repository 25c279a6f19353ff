use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::error::FreezeError;
use crate::model::CONFIG_RELPATH;

/// Which dataset gets mutated, and how paths translate into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    /// Dataset whose configuration is rewritten.
    pub target: PathBuf,
    /// Dataset the images live in.
    pub source: PathBuf,
    /// Location of `source` relative to `target`; `None` when they coincide.
    pub offset: Option<PathBuf>,
    /// Whether the caller named a dataset to save into.
    pub save: bool,
}

impl Target {
    pub fn in_place(root: &Path) -> Self {
        Self {
            target: root.to_path_buf(),
            source: root.to_path_buf(),
            offset: None,
            save: false,
        }
    }

    pub fn is_in_place(&self) -> bool {
        self.offset.is_none()
    }
}

/// Find the dataset containing `start`: the nearest ancestor holding a config store.
pub fn discover_dataset(start: &Path) -> Result<PathBuf> {
    let start = start
        .canonicalize()
        .with_context(|| format!("canonicalize {}", start.display()))?;
    for dir in start.ancestors() {
        if dir.join(CONFIG_RELPATH).is_file() {
            return Ok(dir.to_path_buf());
        }
    }
    Err(anyhow!(
        "no {} found in {} or any parent directory",
        CONFIG_RELPATH,
        start.display()
    ))
}

/// Resolve the target for an invocation, canonicalizing both roots first.
pub fn resolve_target(source_root: &Path, save_dataset: Option<&Path>) -> Result<Target> {
    let source = source_root
        .canonicalize()
        .with_context(|| format!("canonicalize {}", source_root.display()))?;
    let Some(save_dataset) = save_dataset else {
        return Ok(Target::in_place(&source));
    };
    let save = save_dataset
        .canonicalize()
        .with_context(|| format!("canonicalize {}", save_dataset.display()))?;
    resolve_target_paths(&source, &save)
}

/// Same as [`resolve_target`] over already-normalized absolute paths.
pub fn resolve_target_paths(source: &Path, save_dataset: &Path) -> Result<Target> {
    if source == save_dataset {
        return Ok(Target {
            save: true,
            ..Target::in_place(source)
        });
    }

    let relpath = relative_path(save_dataset, source);
    if matches!(relpath.components().next(), Some(Component::ParentDir) | None) {
        return Err(FreezeError::NotSubdirectory {
            save_dataset: save_dataset.to_path_buf(),
            source_root: source.to_path_buf(),
            relpath,
        }
        .into());
    }

    let marker = save_dataset.join(CONFIG_RELPATH);
    if !marker.is_file() {
        return Err(FreezeError::MissingSuperdatasetMarker {
            save_dataset: save_dataset.to_path_buf(),
            marker,
        }
        .into());
    }

    debug!(
        superdataset = %save_dataset.display(),
        source = %source.display(),
        offset = %relpath.display(),
        "freezing into super-dataset"
    );
    Ok(Target {
        target: save_dataset.to_path_buf(),
        source: source.to_path_buf(),
        offset: Some(relpath),
        save: true,
    })
}

/// Lexical path from `base` to `path`, using `..` where `path` is not below `base`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    let base: Vec<Component<'_>> = base.components().collect();
    let path: Vec<Component<'_>> = path.components().collect();
    let common = base
        .iter()
        .zip(path.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for c in &path[common..] {
        out.push(c.as_os_str());
    }
    out
}

#[cfg(test)]
#[path = "tests/target_tests.rs"]
mod tests;
