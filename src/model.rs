use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Dataset-relative location of the configuration store.
pub const CONFIG_RELPATH: &str = ".datalad/config";

/// Key namespace all container entries live under.
pub const CONTAINERS_NAMESPACE: &str = "datalad.containers";

/// Directory (relative to a dataset root) holding container images.
pub const IMAGES_DIR: &str = "images";

pub const IMAGE_FIELD: &str = "image";
pub const CMDEXEC_FIELD: &str = "cmdexec";

/// Placeholder the execution layer expands to the image's dataset path.
pub const IMG_DSPATH_PLACEHOLDER: &str = "{img_dspath}";

pub const FROZEN_COMMENT: &str = "# frozen";

/// A requested image, as given on the command line (`name` or `name=version`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub name: String,
    pub version: Option<String>,
}

impl ImageSpec {
    /// Application family of the image: the text before the first `-`.
    pub fn app(&self) -> &str {
        self.name.split('-').next().unwrap_or(&self.name)
    }
}

impl FromStr for ImageSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, version) = match s.split_once('=') {
            Some((name, version)) => {
                if version.is_empty() {
                    return Err(anyhow!("empty version in image spec '{}'", s));
                }
                (name, Some(version.to_string()))
            }
            None => (s, None),
        };
        if name.is_empty() {
            return Err(anyhow!("empty image name in image spec '{}'", s));
        }
        Ok(Self {
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for ImageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}={}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

/// `datalad.containers.<name>.`
pub fn name_prefix(name: &str) -> String {
    format!("{}.{}.", CONTAINERS_NAMESPACE, name)
}

pub fn field_key(name: &str, field: &str) -> String {
    format!("{}{}", name_prefix(name), field)
}

pub fn image_key(name: &str) -> String {
    field_key(name, IMAGE_FIELD)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopiedField {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenImage {
    pub spec: ImageSpec,
    pub image: String,
    /// Number of config lines annotated as frozen (in-place freezes only).
    pub annotated: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub copied: Vec<CopiedField>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FreezeWarning {
    MultipleFreezeMatches { image: String, lines: usize },
}

impl fmt::Display for FreezeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreezeWarning::MultipleFreezeMatches { image, lines } => write!(
                f,
                "{} config lines point at {}; all of them were marked frozen",
                lines, image
            ),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FreezeReport {
    pub target: PathBuf,
    pub source: PathBuf,
    pub offset: Option<PathBuf>,
    pub frozen: Vec<FrozenImage>,
    #[serde(default)]
    pub warnings: Vec<FreezeWarning>,
    #[serde(default)]
    pub saved: bool,
}

impl FreezeReport {
    pub fn save_message(&self) -> String {
        let specs = self
            .frozen
            .iter()
            .map(|f| f.spec.to_string())
            .collect::<Vec<_>>();
        format!("Freeze container versions: {}", specs.join(" "))
    }
}

#[cfg(test)]
#[path = "tests/model_tests.rs"]
mod tests;
