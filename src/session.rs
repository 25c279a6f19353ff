use anyhow::{Result, anyhow};
use tracing::{info, warn};

use crate::error::FreezeError;
use crate::locate::locate_image;
use crate::model::{FreezeReport, FreezeWarning, FrozenImage, ImageSpec, image_key};
use crate::propagate::{join_offset, offset_str, propagate_fields};
use crate::save::DatasetSaver;
use crate::store::{ConfigStore, GitConfigFile};
use crate::target::Target;

/// State of one freeze invocation, threaded through every stage.
pub struct FreezeSession {
    target: Target,
    source_store: Box<dyn ConfigStore>,
    /// Only present when the target differs from the source dataset.
    target_store: Option<Box<dyn ConfigStore>>,
    report: FreezeReport,
}

impl FreezeSession {
    /// Open the git-config stores of the resolved datasets.
    pub fn open(target: Target) -> Result<Self> {
        let source_store: Box<dyn ConfigStore> = Box::new(GitConfigFile::open(&target.source)?);
        let target_store: Option<Box<dyn ConfigStore>> = match target.offset {
            Some(_) => Some(Box::new(GitConfigFile::open(&target.target)?)),
            None => None,
        };
        Ok(Self::with_stores(target, source_store, target_store))
    }

    pub fn with_stores(
        target: Target,
        source_store: Box<dyn ConfigStore>,
        target_store: Option<Box<dyn ConfigStore>>,
    ) -> Self {
        let report = FreezeReport {
            target: target.target.clone(),
            source: target.source.clone(),
            offset: target.offset.clone(),
            frozen: Vec::new(),
            warnings: Vec::new(),
            saved: false,
        };
        Self {
            target,
            source_store,
            target_store,
            report,
        }
    }

    pub fn report(&self) -> &FreezeReport {
        &self.report
    }

    pub fn source_store(&self) -> &dyn ConfigStore {
        self.source_store.as_ref()
    }

    pub fn target_store(&self) -> &dyn ConfigStore {
        self.target_store
            .as_deref()
            .unwrap_or(self.source_store.as_ref())
    }

    /// Locate, write and mark (or propagate) a single image.
    pub fn freeze(&mut self, spec: &ImageSpec) -> Result<&FrozenImage> {
        let image = locate_image(&self.target.source, spec, self.source_store.as_ref())?;
        let key = image_key(&spec.name);

        let frozen = match &self.target.offset {
            None => {
                self.source_store.set(&key, &image)?;
                let annotated = self.source_store.mark_frozen(&image)?;
                if annotated == 0 {
                    return Err(FreezeError::FreezeNoOp {
                        image,
                        config: self.source_store.location(),
                    }
                    .into());
                }
                if annotated > 1 {
                    let warning = FreezeWarning::MultipleFreezeMatches {
                        image: image.clone(),
                        lines: annotated,
                    };
                    warn!("{}", warning);
                    self.report.warnings.push(warning);
                }
                FrozenImage {
                    spec: spec.clone(),
                    image,
                    annotated,
                    copied: Vec::new(),
                }
            }
            Some(offset) => {
                let target_store = self.target_store.as_deref_mut().ok_or_else(|| {
                    anyhow!("no config store opened for {}", self.target.target.display())
                })?;
                let image = join_offset(&offset_str(offset), &image);
                target_store.set(&key, &image)?;
                let copied =
                    propagate_fields(&spec.name, self.source_store.as_ref(), target_store, offset)?;
                FrozenImage {
                    spec: spec.clone(),
                    image,
                    annotated: 0,
                    copied,
                }
            }
        };

        info!(spec = %spec, image = %frozen.image, "frozen");
        self.report.frozen.push(frozen);
        Ok(self
            .report
            .frozen
            .last()
            .ok_or_else(|| anyhow!("frozen image missing from report"))?)
    }

    /// Freeze every spec in order, stopping at the first failure.
    pub fn freeze_all(&mut self, specs: &[ImageSpec]) -> Result<()> {
        for spec in specs {
            self.freeze(spec)?;
        }
        Ok(())
    }

    /// Save the target dataset when requested and hand back the report.
    pub fn finish(mut self, saver: &mut dyn DatasetSaver) -> Result<FreezeReport> {
        if self.target.save && !self.report.frozen.is_empty() {
            let message = self.report.save_message();
            saver.save(&self.target.target, &message)?;
            self.report.saved = true;
        }
        Ok(self.report)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
