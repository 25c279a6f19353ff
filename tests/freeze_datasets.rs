mod common;

use anyhow::Result;

use containers_freeze::model::ImageSpec;
use containers_freeze::save::RecordingSaver;
use containers_freeze::session::FreezeSession;
use containers_freeze::store::{ConfigStore, GitConfigFile};
use containers_freeze::target::resolve_target;

use common::{MRIQC_CONFIG, git_available, make_dataset, read_config};

fn specs(args: &[&str]) -> Result<Vec<ImageSpec>> {
    args.iter().map(|a| a.parse()).collect()
}

#[test]
fn freezing_in_place_twice_keeps_one_marker() -> Result<()> {
    if !git_available() {
        eprintln!("skipping: git not available");
        return Ok(());
    }
    let ds = tempfile::tempdir()?;
    make_dataset(ds.path(), MRIQC_CONFIG, &["images/bids/bids-mriqc--0.15.0.sif"])?;

    for _ in 0..2 {
        let target = resolve_target(ds.path(), None)?;
        let mut session = FreezeSession::open(target)?;
        session.freeze_all(&specs(&["bids-mriqc=0.15"])?)?;
        session.finish(&mut RecordingSaver::default())?;
    }

    let text = read_config(ds.path())?;
    assert_eq!(text.matches("# frozen").count(), 1, "{}", text);

    let store = GitConfigFile::open(ds.path())?;
    assert_eq!(
        store.get("datalad.containers.bids-mriqc.image")?.as_deref(),
        Some("images/bids/bids-mriqc--0.15.0.sif")
    );
    Ok(())
}

#[test]
fn freezing_current_image_only_marks_it() -> Result<()> {
    if !git_available() {
        eprintln!("skipping: git not available");
        return Ok(());
    }
    let ds = tempfile::tempdir()?;
    make_dataset(ds.path(), MRIQC_CONFIG, &[])?;

    let mut session = FreezeSession::open(resolve_target(ds.path(), None)?)?;
    let frozen = session.freeze(&"bids-mriqc".parse::<ImageSpec>()?)?;
    assert_eq!(frozen.image, "images/bids/bids-mriqc--0.14.2.sif");
    assert_eq!(frozen.annotated, 1);

    let text = read_config(ds.path())?;
    assert!(
        text.contains("image = images/bids/bids-mriqc--0.14.2.sif  # frozen\n"),
        "{}",
        text
    );
    Ok(())
}

#[test]
fn freezing_into_superdataset_copies_fields() -> Result<()> {
    if !git_available() {
        eprintln!("skipping: git not available");
        return Ok(());
    }
    let sup = tempfile::tempdir()?;
    let source = sup.path().join("code/containers");
    make_dataset(sup.path(), "[datalad \"dataset\"]\n\tid = super\n", &[])?;
    make_dataset(&source, MRIQC_CONFIG, &["images/bids/bids-mriqc--0.15.0.sif"])?;

    let target = resolve_target(&source, Some(sup.path()))?;
    let mut session = FreezeSession::open(target)?;
    session.freeze_all(&specs(&["bids-mriqc=0.15.0"])?)?;

    let mut saver = RecordingSaver::default();
    let report = session.finish(&mut saver)?;
    assert!(report.saved);
    assert_eq!(saver.saves.len(), 1);
    assert_eq!(
        saver.saves[0].1,
        "Freeze container versions: bids-mriqc=0.15.0"
    );

    let store = GitConfigFile::open(sup.path())?;
    assert_eq!(
        store.get("datalad.containers.bids-mriqc.image")?.as_deref(),
        Some("code/containers/images/bids/bids-mriqc--0.15.0.sif")
    );
    assert_eq!(
        store.get("datalad.containers.bids-mriqc.cmdexec")?.as_deref(),
        Some("{img_dspath}/code/containers/scripts/singularity_cmd run {img} {cmd}")
    );

    assert!(!read_config(sup.path())?.contains("# frozen"));
    assert_eq!(read_config(&source)?, MRIQC_CONFIG);
    Ok(())
}
