mod app;
mod ui;

use std::{
    fs::File,
    io::{self, Stdout},
    path::PathBuf,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use peakmark_lib::{io::source::DirectorySource, AnnotatorConfig, Session};
use ratatui::{prelude::CrosstermBackend, Terminal};

use app::App;

#[derive(Parser)]
#[command(name = "peakmark-tui", version, about = "Terminal peak annotator")]
struct Args {
    /// Dataset root holding `subjects/<id>/...`
    #[arg(long)]
    data: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Subject to open on start
    #[arg(long)]
    subject: Option<String>,
    /// The terminal is busy drawing, so logs only go to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(args.log_level.as_str()),
        )
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    }

    let config = match &args.config {
        Some(path) => AnnotatorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnnotatorConfig::default(),
    };
    if !args.data.is_dir() {
        bail!("dataset directory {} does not exist", args.data.display());
    }
    let session = Session::new(DirectorySource::new(&args.data), config);
    let mut app = App::new(session)?;
    if let Some(subject) = &args.subject {
        app.select_subject(subject);
    }

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut app);
    restore_terminal()?;
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App<DirectorySource>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(150);
    while !app.should_quit {
        terminal.draw(|f| ui::draw(f, app))?;
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
                Event::Mouse(mouse) => app.on_mouse(mouse),
                _ => {}
            }
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("initializing terminal")
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
    Ok(())
}
