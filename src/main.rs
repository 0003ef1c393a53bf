use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Error, Result};
use clap::{ArgAction, Parser, ValueEnum};

use gic::ascii_render::{RasterOptions, ResampleFilter};
use gic::compositor::CompositedAnimation;
use gic::decoding::load_animation;
use gic::error_codes::find_coded_error;
use gic::geometry::{
    block_ratio_is_valid, invalid_block_ratio, GeometryOptions, DEFAULT_BLOCK_RATIO,
};
use gic::palette::{GlyphPalette, DEFAULT_PALETTE_SIZE};
use gic::playback::{PlaybackOptions, PlaybackScheduler, ThreadClock};
use gic::terminal::CrosstermTerminal;

const GIT_HASH: &str = match option_env!("GIC_GIT_HASH") {
    Some(hash) => hash,
    None => "unknown",
};

#[derive(Debug, Parser)]
#[command(name = "gic", version)]
#[command(about = "Play an animated GIF as character art in the terminal")]
struct Cli {
    /// Show diagnostic logs and full error reports.
    #[arg(short, long)]
    verbose: bool,

    /// Pad the frame with blank rows above so it sits at the bottom.
    #[arg(
        short = 't',
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = true,
        default_missing_value = "true"
    )]
    top_empty_rows: bool,

    /// Keep the last terminal row free.
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = true,
        default_missing_value = "true"
    )]
    reserve_bottom_row: bool,

    /// Number of glyphs in the brightness ramp (10 or 16).
    #[arg(short = 's', long, visible_alias = "size", default_value_t = DEFAULT_PALETTE_SIZE)]
    palette_size: usize,

    /// Height / width ratio of one terminal cell.
    #[arg(short = 'r', long, visible_alias = "ratio", default_value_t = DEFAULT_BLOCK_RATIO)]
    block_ratio: f64,

    /// Resampling filter used when fitting frames to the terminal.
    #[arg(long, value_enum, default_value_t = FilterArg::Area)]
    filter: FilterArg,

    /// GIF file to play.
    filename: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FilterArg {
    Area,
    Nearest,
}

impl From<FilterArg> for ResampleFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::Area => Self::Area,
            FilterArg::Nearest => Self::Nearest,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    log::debug!("gic {} ({GIT_HASH})", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report_error(&error, cli.verbose),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "gic=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("GIC_LOG", default_filter))
        .format_timestamp(None)
        .init();
}

fn playback_options(cli: &Cli) -> Result<PlaybackOptions> {
    let palette = GlyphPalette::from_size(cli.palette_size)?;
    log::debug!("char palette with size {} loaded", palette.len());

    if !block_ratio_is_valid(cli.block_ratio) {
        return Err(anyhow!(invalid_block_ratio(cli.block_ratio)));
    }

    Ok(PlaybackOptions {
        geometry: GeometryOptions {
            block_ratio: cli.block_ratio,
            reserve_bottom_row: cli.reserve_bottom_row,
            top_padding: cli.top_empty_rows,
        },
        raster: RasterOptions {
            palette,
            filter: cli.filter.into(),
        },
    })
}

fn run(cli: &Cli) -> Result<()> {
    // Options are validated before the file is touched.
    let options = playback_options(cli)?;

    let decoded = load_animation(&cli.filename)?;
    let animation = CompositedAnimation::assemble(decoded)
        .with_context(|| format!("failed to assemble frames of {}", cli.filename.display()))?;

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;

    let mut terminal = CrosstermTerminal::stdout();
    let mut scheduler = PlaybackScheduler::new(&animation, options);
    scheduler.run(&mut terminal, &mut ThreadClock, &cancel)?;
    Ok(())
}

fn report_error(error: &Error, verbose: bool) -> ExitCode {
    let coded = find_coded_error(error);

    if verbose {
        eprintln!("gic: {error:?}");
        if let Some(coded) = coded {
            match serde_json::to_string_pretty(&coded.envelope()) {
                Ok(envelope) => eprintln!("{envelope}"),
                Err(serialize_error) => eprintln!("gic: failed to serialize error: {serialize_error}"),
            }
        }
    } else {
        match coded {
            Some(coded) => eprintln!("gic: {}", coded.message),
            None => eprintln!("gic: {error:#}"),
        }
    }

    ExitCode::from(coded.map_or(1, |coded| coded.kind.exit_code()))
}
