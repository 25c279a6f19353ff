use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::annotate::annotate_file;
use crate::error::FreezeError;
use crate::model::CONFIG_RELPATH;

/// Key/value access to a dataset's configuration store.
pub trait ConfigStore {
    /// Where the store lives, for diagnostics.
    fn location(&self) -> PathBuf;

    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set `key` to `value`, replacing every prior value of `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// All `(key, value)` pairs whose key matches `pattern`, in file order.
    fn get_regexp(&self, pattern: &str) -> Result<Vec<(String, String)>>;

    /// Mark every entry whose value equals `image` as frozen; returns how many.
    fn mark_frozen(&mut self, image: &str) -> Result<usize>;
}

/// The git-config file of a dataset, driven through `git config -f`.
#[derive(Clone, Debug)]
pub struct GitConfigFile {
    path: PathBuf,
}

impl GitConfigFile {
    pub fn config_path(dataset_root: &Path) -> PathBuf {
        dataset_root.join(CONFIG_RELPATH)
    }

    pub fn open(dataset_root: &Path) -> Result<Self> {
        let path = Self::config_path(dataset_root);
        if !path.is_file() {
            return Err(anyhow!(
                "no {} found in {}",
                CONFIG_RELPATH,
                dataset_root.display()
            ));
        }
        Ok(Self { path })
    }

    fn git_config(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new("git");
        cmd.arg("config").arg("-f").arg(&self.path).args(args);
        debug!(config = %self.path.display(), ?args, "git config");
        cmd.output().map_err(|e| {
            anyhow::Error::new(FreezeError::Collaborator {
                command: "git config".to_string(),
                detail: e.to_string(),
            })
        })
    }

    fn check(&self, args: &[&str], out: &Output) -> Result<()> {
        if out.status.success() {
            return Ok(());
        }
        Err(FreezeError::Collaborator {
            command: format!("git config -f {} {}", self.path.display(), args.join(" ")),
            detail: format!(
                "{} ({})",
                String::from_utf8_lossy(&out.stderr).trim(),
                out.status
            ),
        }
        .into())
    }
}

/// `git config` exits with 1 when the key or pattern matched nothing.
fn is_not_found(out: &Output) -> bool {
    out.status.code() == Some(1)
}

impl ConfigStore for GitConfigFile {
    fn location(&self) -> PathBuf {
        self.path.clone()
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let args = ["--get", key];
        let out = self.git_config(&args)?;
        if is_not_found(&out) {
            return Ok(None);
        }
        self.check(&args, &out)?;
        let value = String::from_utf8(out.stdout).context("decode git config output")?;
        Ok(Some(value.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let args = ["--replace-all", key, value];
        let out = self.git_config(&args)?;
        self.check(&args, &out)
    }

    fn get_regexp(&self, pattern: &str) -> Result<Vec<(String, String)>> {
        let args = ["--get-regexp", pattern];
        let out = self.git_config(&args)?;
        if is_not_found(&out) {
            return Ok(Vec::new());
        }
        self.check(&args, &out)?;
        let text = String::from_utf8(out.stdout).context("decode git config output")?;
        Ok(text
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| match l.split_once(' ') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (l.to_string(), String::new()),
            })
            .collect())
    }

    fn mark_frozen(&mut self, image: &str) -> Result<usize> {
        annotate_file(&self.path, image)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct MemoryEntry {
    key: String,
    value: String,
    frozen: bool,
}

/// In-memory store with the same semantics as [`GitConfigFile`].
#[derive(Clone, Debug, Default)]
pub struct MemoryConfig {
    name: String,
    entries: Vec<MemoryEntry>,
}

impl MemoryConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn with_entries<'a>(
        name: &str,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut store = Self::new(name);
        for (key, value) in entries {
            store.entries.push(MemoryEntry {
                key: key.to_string(),
                value: value.to_string(),
                frozen: false,
            });
        }
        store
    }

    pub fn is_frozen(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key && e.frozen)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigStore for MemoryConfig {
    fn location(&self) -> PathBuf {
        PathBuf::from(&self.name)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| e.value.clone()))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match self.entries.iter().position(|e| e.key == key) {
            Some(first) => {
                self.entries[first] = MemoryEntry {
                    key: key.to_string(),
                    value: value.to_string(),
                    frozen: false,
                };
                let mut idx = 0;
                self.entries.retain(|e| {
                    let keep = idx <= first || e.key != key;
                    idx += 1;
                    keep
                });
            }
            None => self.entries.push(MemoryEntry {
                key: key.to_string(),
                value: value.to_string(),
                frozen: false,
            }),
        }
        Ok(())
    }

    fn get_regexp(&self, pattern: &str) -> Result<Vec<(String, String)>> {
        let re = regex::Regex::new(pattern)
            .with_context(|| format!("invalid key pattern: {}", pattern))?;
        Ok(self
            .entries
            .iter()
            .filter(|e| re.is_match(&e.key))
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect())
    }

    fn mark_frozen(&mut self, image: &str) -> Result<usize> {
        let mut matched = 0;
        for e in self.entries.iter_mut().filter(|e| e.value == image) {
            e.frozen = true;
            matched += 1;
        }
        Ok(matched)
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
