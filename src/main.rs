use clap::{CommandFactory, Parser};
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use tickr::config::{self, Config};
use tickr::runtime::{FrameLoop, StopReason};
use tickr::{FrameScheduler, HeadlessHost, Host, QueueKind};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tickr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("tickr.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => {
            Cli::command().print_help().context("Failed to print help")?;
            Ok(())
        }
        Some(Commands::Run {
            frames,
            fps,
            scroll_step,
            resize_every,
            paused,
        }) => handle_run_command(
            config,
            RunOptions {
                frames: *frames,
                fps: *fps,
                scroll_step: *scroll_step,
                resize_every: *resize_every,
                paused: *paused,
            },
            cli.is_verbose(),
        ),
        Some(Commands::Config) => handle_config_command(config),
    }
}

struct RunOptions {
    frames: Option<u64>,
    fps: Option<u32>,
    scroll_step: f64,
    resize_every: u64,
    paused: bool,
}

fn counting(count: &Rc<Cell<u64>>) -> impl Fn() + 'static {
    let count = Rc::clone(count);
    move || count.set(count.get() + 1)
}

fn handle_run_command(config: &Config, opts: RunOptions, verbose: bool) -> Result<()> {
    let mut config = config.clone();
    if let Some(fps) = opts.fps {
        config.runtime.target_fps = fps;
    }
    config.runtime.max_frames = opts.frames.or(config.runtime.max_frames).or(Some(300));
    config.validate().context("Invalid run options")?;

    info!(
        "Run: target_fps={} max_frames={:?} scroll_step={} resize_every={}",
        config.runtime.target_fps, config.runtime.max_frames, opts.scroll_step, opts.resize_every
    );

    let host = Rc::new(HeadlessHost::realtime());
    let scheduler = FrameScheduler::with_config(Rc::clone(&host), &config).context("Failed to create scheduler")?;

    let default_hits = Rc::new(Cell::new(0));
    let scroll_hits = Rc::new(Cell::new(0));
    let resize_hits = Rc::new(Cell::new(0));
    scheduler.add("frame-counter", counting(&default_hits), QueueKind::Default);
    scheduler.add("parallax", counting(&scroll_hits), QueueKind::Scroll);
    scheduler.add("layout", counting(&resize_hits), QueueKind::Resize);

    if opts.paused {
        scheduler.pause();
        println!("{}", "Scheduler paused: callbacks will not run".yellow());
    }

    let frame_loop = FrameLoop::new(&config.runtime);
    let fps_handle = scheduler.clone();
    let report = frame_loop.run(&host, |frame, host| {
        host.scroll_by(0.0, opts.scroll_step);
        if opts.resize_every > 0 && frame > 0 && frame % opts.resize_every == 0 {
            grow_viewport(host);
        }
        if verbose && frame > 0 && frame % 60 == 0 {
            println!("  frame {:>6}  fps {:>3}", frame, fps_handle.get_fps());
        }
    });
    scheduler.stop();

    let reason = match report.reason {
        StopReason::MaxFrames => "frame limit reached",
        StopReason::Idle => "scheduler stopped",
    };
    println!(
        "{} {} frames in {:.2?} ({})",
        "Ran".green(),
        report.frames,
        report.elapsed,
        reason
    );
    println!("  {:<8} {}", "default".cyan(), default_hits.get());
    println!("  {:<8} {}", "scroll".cyan(), scroll_hits.get());
    println!("  {:<8} {}", "resize".cyan(), resize_hits.get());
    println!("  {:<8} {}", "fps".cyan(), measured_fps(&report));
    if scheduler.callback_failures() > 0 {
        println!("  {} {}", "callback failures:".red(), scheduler.callback_failures());
    }
    Ok(())
}

/// Grow the viewport by one pixel so the resize queue sees a change.
fn grow_viewport(host: &HeadlessHost) {
    let size = host.viewport_size();
    host.set_viewport(size.width, size.height + 1);
}

fn measured_fps(report: &tickr::runtime::RunReport) -> u64 {
    let secs = report.elapsed.as_secs_f64();
    if secs > 0.0 {
        (report.frames as f64 / secs).floor() as u64
    } else {
        0
    }
}

fn handle_config_command(config: &Config) -> Result<()> {
    let yaml = config.to_yaml().context("Failed to render config")?;
    print!("{}", yaml);
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
