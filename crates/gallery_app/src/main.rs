mod app;
mod config;
mod effects;
mod render;

use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use engine_logging::{engine_info, engine_warn};
use gallery_core::{FormState, RunResultKind};
use log::LevelFilter;

use config::{load_config, LogSetting, DEFAULT_CONFIG_FILE};
use effects::EffectRunner;

/// Download every image of a web article and bind them into a Word document
/// and/or a slide deck.
#[derive(Debug, Parser)]
#[command(name = "gallery", version)]
struct Cli {
    /// Article URL to harvest.
    #[arg(long)]
    url: String,
    /// Filename prefix for the generated documents.
    #[arg(long)]
    prefix: Option<String>,
    /// Base folder; each run creates a timestamped subfolder here.
    #[arg(long = "out")]
    base_dir: Option<PathBuf>,
    /// Generate the Word document.
    #[arg(long)]
    paged: bool,
    /// Generate the slide deck.
    #[arg(long)]
    slides: bool,
    /// Configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Log destination; overrides the config file.
    #[arg(long, value_enum)]
    log: Option<LogArg>,
    /// Verbose logging.
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LogArg {
    File,
    Terminal,
    Both,
    Off,
}

impl From<LogArg> for LogSetting {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::File => LogSetting::File,
            LogArg::Terminal => LogSetting::Terminal,
            LogArg::Both => LogSetting::Both,
            LogArg::Off => LogSetting::Off,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let loaded = load_config(&cli.config);
    let config = loaded.config;

    let level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_setting = cli.log.map(LogSetting::from).unwrap_or(config.log);
    engine_logging::initialize(log_setting.into(), level, config.log_file.as_deref());
    for warning in &loaded.warnings {
        engine_warn!("{}", warning);
        eprintln!("Warning: {warning}");
    }

    // Explicit flags pick exactly the requested kinds; otherwise the config decides.
    let (paged, slides) = if cli.paged || cli.slides {
        (cli.paged, cli.slides)
    } else {
        (config.paged, config.slides)
    };
    let form = FormState {
        url: cli.url,
        prefix: cli.prefix.or_else(|| config.prefix.clone()).unwrap_or_default(),
        base_dir: cli.base_dir.or_else(|| config.base_dir.clone()),
        paged,
        slides,
    };

    engine_info!("gallery starting, config {:?}", cli.config);
    let runner = EffectRunner::new(config.engine_settings());
    match app::run_app(form, runner) {
        None => bail!("run configuration rejected"),
        Some(RunResultKind::Failed) => bail!("run failed"),
        Some(RunResultKind::Completed)
        | Some(RunResultKind::NothingDownloaded)
        | Some(RunResultKind::Cancelled) => Ok(()),
    }
}
