use super::*;

use std::path::PathBuf;

use crate::store::MemoryConfig;

#[test]
fn cmdexec_offset_goes_after_placeholder() {
    assert_eq!(
        offset_value("cmdexec", "{img_dspath}/run.sh", "code/containers"),
        "{img_dspath}/code/containers/run.sh"
    );
}

#[test]
fn cmdexec_without_placeholder_is_copied_verbatim() {
    assert_eq!(
        offset_value("cmdexec", "singularity exec {img} {cmd}", "code/containers"),
        "singularity exec {img} {cmd}"
    );
}

#[test]
fn other_fields_are_prefixed() {
    assert_eq!(
        offset_value("extra-input", "binds/licenses", "code/containers"),
        "code/containers/binds/licenses"
    );
    assert_eq!(
        offset_value("extra-input", "./binds", "code/containers"),
        "code/containers/binds"
    );
}

#[test]
fn fields_pattern_escapes_regex_metacharacters() {
    assert_eq!(
        fields_pattern("bids-mriqc"),
        r"^datalad\.containers\.bids-mriqc\."
    );
}

#[test]
fn propagate_copies_everything_but_image() {
    let source = MemoryConfig::with_entries(
        "source",
        [
            (
                "datalad.containers.bids-mriqc.image",
                "images/bids/bids-mriqc--0.15.0.sif",
            ),
            (
                "datalad.containers.bids-mriqc.cmdexec",
                "{img_dspath}/scripts/singularity_cmd run {img} {cmd}",
            ),
            ("datalad.containers.bids-mriqc.extra-input", "licenses/fs.txt"),
            ("datalad.containers.bids-mriqc2.cmdexec", "{img_dspath}/other"),
        ],
    );
    let mut target = MemoryConfig::new("target");

    let copied = propagate_fields(
        "bids-mriqc",
        &source,
        &mut target,
        &PathBuf::from("code/containers"),
    )
    .expect("propagate");

    assert_eq!(copied.len(), 2);
    assert_eq!(target.len(), 2);
    assert_eq!(
        target
            .get("datalad.containers.bids-mriqc.cmdexec")
            .expect("get")
            .as_deref(),
        Some("{img_dspath}/code/containers/scripts/singularity_cmd run {img} {cmd}")
    );
    assert_eq!(
        target
            .get("datalad.containers.bids-mriqc.extra-input")
            .expect("get")
            .as_deref(),
        Some("code/containers/licenses/fs.txt")
    );
    assert_eq!(
        target
            .get("datalad.containers.bids-mriqc.image")
            .expect("get"),
        None
    );
}
