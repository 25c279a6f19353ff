use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use tracing::debug;

use crate::error::FreezeError;
use crate::model::{IMAGES_DIR, ImageSpec, image_key};
use crate::store::ConfigStore;

/// Resolve `spec` to exactly one image path, relative to `source_root`.
///
/// Without a version the currently configured image is returned as is.
pub fn locate_image(
    source_root: &Path,
    spec: &ImageSpec,
    store: &dyn ConfigStore,
) -> Result<String> {
    let Some(version) = spec.version.as_deref() else {
        let key = image_key(&spec.name);
        let current = store
            .get(&key)?
            .ok_or(FreezeError::MissingImageConfig { key })?;
        debug!(image = %spec.name, %current, "freezing current image");
        return Ok(current);
    };

    let app = spec.app();
    let stem = format!("{}--{}", spec.name, version);
    let rel_dir = format!("{}/{}", IMAGES_DIR, app);
    let exact = format!("{}/{}", rel_dir, stem);

    if source_root.join(&exact).symlink_metadata().is_ok() {
        debug!(%exact, "exact image match");
        return Ok(exact);
    }

    let dir = source_root.join(IMAGES_DIR).join(app);
    let names = list_names(&dir)?;

    let matcher = matcher_for(&format!("{}.*", globset::escape(&stem)))?;
    let matches = names
        .iter()
        .filter(|n| matcher.is_match(n.as_str()))
        .map(|n| format!("{}/{}", rel_dir, n))
        .collect::<Vec<_>>();
    let pattern = format!("{}.*", exact);

    match matches.as_slice() {
        [found] => {
            debug!(%pattern, %found, "single image match");
            Ok(found.clone())
        }
        [] => {
            let siblings = matcher_for(&format!("{}--*", globset::escape(&spec.name)))?;
            let candidates = names
                .iter()
                .filter(|n| siblings.is_match(n.as_str()))
                .map(|n| format!("{}/{}", rel_dir, n))
                .collect();
            Err(FreezeError::NoImageFound {
                pattern,
                candidates,
            }
            .into())
        }
        _ => Err(FreezeError::AmbiguousImage {
            pattern,
            matches: matches.clone(),
        }
        .into()),
    }
}

fn matcher_for(pattern: &str) -> Result<GlobMatcher> {
    Ok(Glob::new(pattern)
        .with_context(|| format!("invalid glob: {}", pattern))?
        .compile_matcher())
}

/// Sorted entry names of `dir`; a missing directory has none.
fn list_names(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry.context("read dir entry")?;
        out.push(entry.file_name().to_string_lossy().into_owned());
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
#[path = "tests/locate_tests.rs"]
mod tests;
