use clap::Parser;
use crossterm::{
    event::{Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use scm_tree::{
    app::App,
    cli::{Cli, Commands},
    command::Command,
    config::Config,
    diff::WorkingTreeOpener,
    error::Result,
    executor::Executor,
    git::GitProvider,
    main_lib,
    provider::Provider,
    screenshot, ui,
};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

fn init_logging(verbose: bool) -> Result<()> {
    // Initialize logger only if SCM_TREE_LOG environment variable is set
    if let Ok(log_file) = std::env::var("SCM_TREE_LOG") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        env_logger::Builder::new()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .filter_level(log::LevelFilter::Debug)
            .init();

        log::info!("scm-tree starting up");
    } else if verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Run {
        path: PathBuf::from("."),
    });
    // Stderr logging would draw over the TUI
    let headless = !matches!(command, Commands::Run { .. });
    init_logging(cli.verbose && headless)?;

    match command {
        Commands::Run { path } => {
            let config = main_lib::load_config(&cli.options)?;
            run_interactive(&path, config).await
        }
        Commands::Screenshot {
            config,
            output,
            width,
            height,
        } => screenshot::generate_screenshot(&config, output.as_deref(), width, height).await,
        Commands::Execute {
            config,
            command,
            output,
            screenshot,
            width,
            height,
        } => {
            main_lib::execute_command(
                &config,
                &command,
                output.as_deref(),
                screenshot,
                width,
                height,
            )
            .await
        }
        Commands::Status { path } => {
            let config = main_lib::load_config(&cli.options)?;
            main_lib::print_status(&path, &config)
        }
    }
}

async fn run_interactive(path: &Path, config: Config) -> Result<()> {
    let provider = GitProvider::discover(path)?;
    let opener = WorkingTreeOpener::new(provider.workdir().to_path_buf(), provider.root_uri());
    let refresh_every = Duration::from_millis(config.tree.refresh_interval_ms.max(100));
    let mut app = App::new(config, provider, opener);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, refresh_every).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<GitProvider, WorkingTreeOpener>,
    refresh_every: Duration,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_refresh = Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if crossterm::event::poll(tick_rate)? {
            if let Event::Key(key) = crossterm::event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(command) = Command::from_key(key, &app.config.keybindings) {
                        if command == Command::Refresh {
                            last_refresh = Instant::now();
                        }
                        Executor::execute(app, command).await;
                    }
                }
            }
        }

        if last_refresh.elapsed() >= refresh_every {
            last_refresh = Instant::now();
            if let Err(e) = app.view.refresh() {
                log::warn!("Background refresh failed: {}", e);
                app.status_message = format!("Refresh failed: {}", e);
            }
        } else {
            app.view.poll_changes();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
