#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result};

pub const MRIQC_CONFIG: &str = "[datalad \"dataset\"]\n\
\tid = 5df8eb3a-95c5-11ea-b4b9-a0369f287950\n\
[datalad \"containers.bids-mriqc\"]\n\
\timage = images/bids/bids-mriqc--0.14.2.sif\n\
\tcmdexec = {img_dspath}/scripts/singularity_cmd run {img} {cmd}\n";

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Create a dataset at `root` with the given config text and empty image files.
pub fn make_dataset(root: &Path, config: &str, images: &[&str]) -> Result<()> {
    fs::create_dir_all(root.join(".datalad")).context("create .datalad")?;
    fs::write(root.join(".datalad/config"), config).context("write config")?;
    for image in images {
        let path = root.join(image);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, b"").with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

pub fn read_config(root: &Path) -> Result<String> {
    fs::read_to_string(root.join(".datalad/config")).context("read config")
}

pub fn run_freeze(args: &[&str]) -> Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_freeze-versions"))
        .args(args)
        .output()
        .with_context(|| format!("run freeze-versions {:?}", args))
}
