mod render;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use peakmark_lib::{
    io::{
        source::{write_subject, DirectorySource, SignalSource},
        synthetic::synthetic_subject,
    },
    plot::PlotBackend,
    AnnotatorConfig, Session, UiEvent,
};
use render::PngBackend;
use serde_json::{json, Value};
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "peakmark",
    version,
    about = "peakmark: window-by-window peak annotation for ECG, PPG and ABP recordings"
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Settings {
    /// Annotator settings (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the sampling rate used for window arithmetic
    #[arg(long, global = true)]
    fs: Option<f64>,
    #[arg(long, global = true)]
    window_seconds: Option<f64>,
    #[arg(long, global = true)]
    num_windows: Option<usize>,
    /// Log filter, e.g. `info` or `peakmark_lib=debug`; RUST_LOG wins when set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum WindowFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// List subject ids in a dataset directory
    Subjects {
        #[arg(long)]
        data: PathBuf,
    },
    /// Print a subject's static fields as JSON
    Metadata {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        subject: String,
    },
    /// Dump one window of samples
    Window {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        window: usize,
        #[arg(long, value_enum, default_value = "json")]
        format: WindowFormat,
    },
    /// Run newline-delimited UI events from --events or stdin and print the final state
    Replay {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        events: Option<PathBuf>,
        /// Include the figure of the final window
        #[arg(long)]
        figure: bool,
    },
    /// Render a window with its peak markers to a PNG via plotters
    Render {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        subject: String,
        /// Window to draw; defaults to wherever the events leave the session
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        events: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 1200)]
        width: u32,
        #[arg(long, default_value_t = 900)]
        height: u32,
    },
    /// Write a synthetic dataset in the on-disk subject layout
    Simulate {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 3)]
        subjects: usize,
        #[arg(long, default_value_t = 30.0)]
        minutes: f64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.settings.log_level.as_str()),
    )
    .init();
    let config = load_config(&cli.settings)?;
    match cli.command {
        Commands::Subjects { data } => cmd_subjects(&data)?,
        Commands::Metadata { data, subject } => cmd_metadata(&data, &subject, config)?,
        Commands::Window {
            data,
            subject,
            window,
            format,
        } => cmd_window(&data, &subject, window, format, &config)?,
        Commands::Replay {
            data,
            events,
            figure,
        } => cmd_replay(&data, events.as_deref(), figure, config)?,
        Commands::Render {
            data,
            subject,
            window,
            events,
            out,
            width,
            height,
        } => cmd_render(
            &data,
            &subject,
            window,
            events.as_deref(),
            &out,
            (width, height),
            config,
        )?,
        Commands::Simulate {
            out,
            subjects,
            minutes,
            seed,
        } => cmd_simulate(&out, subjects, minutes, seed, &config)?,
    }
    Ok(())
}

fn load_config(settings: &Settings) -> Result<AnnotatorConfig> {
    let mut config = match &settings.config {
        Some(path) => AnnotatorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnnotatorConfig::default(),
    };
    if let Some(fs) = settings.fs {
        config.fs = fs;
    }
    if let Some(seconds) = settings.window_seconds {
        config.window_seconds = seconds;
    }
    if let Some(n) = settings.num_windows {
        config.num_windows = n;
    }
    config.validate().context("invalid annotator settings")?;
    log::debug!("annotator config: {:?}", config);
    Ok(config)
}

fn open_dataset(data: &Path) -> Result<DirectorySource> {
    if !data.is_dir() {
        bail!("dataset directory {} does not exist", data.display());
    }
    Ok(DirectorySource::new(data))
}

fn cmd_subjects(data: &Path) -> Result<()> {
    let source = open_dataset(data)?;
    let ids = source.subject_ids()?;
    println!("{}", serde_json::to_string(&ids)?);
    Ok(())
}

fn cmd_metadata(data: &Path, subject: &str, config: AnnotatorConfig) -> Result<()> {
    let mut session = Session::new(open_dataset(data)?, config);
    let meta = session
        .subject_metadata(subject)
        .with_context(|| format!("reading metadata of '{}'", subject))?;
    println!("{}", serde_json::to_string(&meta)?);
    Ok(())
}

fn cmd_window(
    data: &Path,
    subject: &str,
    window: usize,
    format: WindowFormat,
    config: &AnnotatorConfig,
) -> Result<()> {
    let source = open_dataset(data)?;
    let slice = source
        .load_window(subject, window, &config.indexer())
        .with_context(|| format!("loading window {} of '{}'", window, subject))?;
    match format {
        WindowFormat::Json => println!("{}", serde_json::to_string(&slice)?),
        WindowFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record(["sample", "t", "ecg", "ppg", "abp"])?;
            for i in 0..slice.len() {
                writer.write_record([
                    (slice.start + i).to_string(),
                    slice.t[i].to_string(),
                    slice.ecg[i].to_string(),
                    slice.ppg[i].to_string(),
                    slice.abp[i].to_string(),
                ])?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn read_events(input: Option<&Path>) -> Result<Vec<UiEvent>> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let mut events = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: UiEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("line {} is not a UI event: {}", idx + 1, trimmed))?;
        events.push(event);
    }
    Ok(events)
}

fn run_events<S: SignalSource>(session: &mut Session<S>, events: Vec<UiEvent>) -> Result<Vec<Value>> {
    let mut outcomes = Vec::with_capacity(events.len());
    for (idx, event) in events.into_iter().enumerate() {
        let outcome = session
            .dispatch(event)
            .with_context(|| format!("event {} failed", idx + 1))?;
        outcomes.push(serde_json::to_value(&outcome)?);
    }
    Ok(outcomes)
}

fn cmd_replay(
    data: &Path,
    events: Option<&Path>,
    figure: bool,
    config: AnnotatorConfig,
) -> Result<()> {
    let events = read_events(events)?;
    let mut session = Session::new(open_dataset(data)?, config);
    let outcomes = run_events(&mut session, events)?;
    let snapshot = session.snapshot();
    let mut out = json!({
        "subject_id": snapshot.subject_id,
        "window_index": snapshot.window_index,
        "document": snapshot.document,
        "inspection": snapshot.inspection,
        "outcomes": outcomes,
    });
    if figure {
        out["figure"] = serde_json::to_value(session.figure()?)?;
    }
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}

fn cmd_render(
    data: &Path,
    subject: &str,
    window: Option<usize>,
    events: Option<&Path>,
    out: &Path,
    size: (u32, u32),
    config: AnnotatorConfig,
) -> Result<()> {
    let events = match events {
        Some(path) => read_events(Some(path))?,
        None => Vec::new(),
    };
    let mut session = Session::new(open_dataset(data)?, config);
    session
        .load_subject(subject)
        .with_context(|| format!("loading subject '{}'", subject))?;
    run_events(&mut session, events)?;
    if let Some(window) = window {
        session.go_to_window(window)?;
    }
    let Some(fig) = session.figure()? else {
        bail!("no subject selected after replaying events");
    };
    PngBackend::new(out, size).draw(&fig)?;
    log::info!("wrote {}", out.display());
    Ok(())
}

fn cmd_simulate(
    out: &Path,
    subjects: usize,
    minutes: f64,
    seed: u64,
    config: &AnnotatorConfig,
) -> Result<()> {
    if minutes.is_nan() || minutes <= 0.0 {
        bail!("--minutes must be positive");
    }
    let mut ids = Vec::with_capacity(subjects);
    for i in 0..subjects {
        let id = format!("subject_{:03}", i + 1);
        let recording = synthetic_subject(seed.wrapping_add(i as u64), minutes, config.fs);
        write_subject(out, &id, &recording)
            .with_context(|| format!("writing {} to {}", id, out.display()))?;
        ids.push(id);
    }
    println!(
        "{}",
        serde_json::to_string(&json!({ "out": out, "subjects": ids }))?
    );
    Ok(())
}
