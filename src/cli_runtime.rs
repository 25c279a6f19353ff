use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use containers_freeze::model::ImageSpec;
use containers_freeze::save::DataladSave;
use containers_freeze::session::FreezeSession;
use containers_freeze::target::{discover_dataset, resolve_target};

const LOG_ENV: &str = "FREEZE_VERSIONS_LOG";

#[derive(Parser)]
#[command(name = "freeze-versions")]
#[command(
    about = "Pin container images to specific versions in a dataset configuration",
    long_about = None
)]
pub(crate) struct Cli {
    /// Images to freeze: NAME (current image) or NAME=VERSION (exact or prefix)
    #[arg(value_name = "IMAGE[=VERSION]")]
    pub(crate) images: Vec<ImageSpec>,

    /// Super-dataset to write the frozen configuration into (and save)
    #[arg(long, value_name = "PATH")]
    pub(crate) save_dataset: Option<PathBuf>,

    /// Dataset holding the images (defaults to the one containing the current directory)
    #[arg(short = 'd', long, value_name = "PATH")]
    pub(crate) dataset: Option<PathBuf>,

    /// Emit JSON
    #[arg(long)]
    pub(crate) json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,
}

pub(crate) fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => err.exit(),
            // Usage errors share exit status 1 with other failures.
            _ => return Err(anyhow::Error::new(err)),
        },
    };
    init_logging(cli.verbose);

    let source_root = match cli.dataset {
        Some(path) => path,
        None => discover_dataset(&std::env::current_dir().context("get current dir")?)?,
    };
    let target = resolve_target(&source_root, cli.save_dataset.as_deref())?;

    let mut session = FreezeSession::open(target)?;
    session.freeze_all(&cli.images)?;
    let report = session.finish(&mut DataladSave::default())?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize freeze report")?
        );
    } else {
        for frozen in &report.frozen {
            println!("{} -> {}", frozen.spec, frozen.image);
        }
        if report.saved {
            println!("Saved {}", report.target.display());
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}
