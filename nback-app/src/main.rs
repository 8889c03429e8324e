mod app;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;
use nback_core::RunMode;
use nback_render::load_font;
use nback_task::{TaskConfig, TaskDriver, TrialSequence};
use nback_timing::HighPrecisionTimer;

use app::App;

#[derive(Parser, Debug)]
#[command(name = "nback")]
#[command(about = "N-back working-memory task with CSV trial fixtures")]
struct Args {
    /// Participant identifier, baked into output filenames
    #[arg(short, long)]
    participant: String,

    /// Which session to run
    #[arg(short, long, value_enum, default_value_t = ModeArg::Practice)]
    run: ModeArg,

    /// Directory holding the per-mode fixture CSVs
    #[arg(long, default_value = "fixtures")]
    fixtures: PathBuf,

    /// Root directory for output tables
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Directory the fixture's image_name paths are relative to
    #[arg(long, default_value = ".")]
    assets: PathBuf,

    /// Font file for on-screen text (falls back to NBACK_FONT, then
    /// common system fonts)
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    Scanner,
    Practice,
    Backup,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Scanner => RunMode::Scanner,
            ModeArg::Practice => RunMode::Practice,
            ModeArg::Backup => RunMode::Backup,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = TaskConfig::new(
        args.participant,
        args.run.into(),
        args.fixtures,
        args.output,
    );
    info!(
        "session {} -> {}",
        config.session_date,
        config.trial_output_path().display()
    );

    let sequence = TrialSequence::load(&config.fixture_path())?;
    let font = load_font(args.font.as_deref())?;
    let driver = TaskDriver::new(config, sequence, HighPrecisionTimer::new());

    let app = App::new(driver, font, args.assets);
    app.run()
}
