//! Kiosk CLI - alarms and media playback for an embedded kiosk device
//!
//! Stand-in for the device's display layer:
//! - edits the persisted alarm list
//! - runs the periodic due check that fires alarms
//! - plays a media file through the supervised player

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{CommandFactory, Parser};
use crossbeam_channel::RecvTimeoutError;
use tokio::sync::mpsc;

use kiosk::cli::{AlarmCommand, Cli, Commands, Display, DueWatcher, PlayArgs, WatchArgs};
use kiosk::{
    AlarmService, ChannelPlaybackObserver, HelperSoundLauncher, KioskConfig, MediaKind,
    MediaPlayer, PlaybackEvent,
};

/// How often `play` refreshes position and length.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(&cli);

    match cli.command {
        Some(Commands::Alarm(command)) => run_alarm_command(&config, command)?,
        Some(Commands::Check) => {
            let fired = open_store(&config).check_due_now();
            Display::show_check_result(&fired);
        }
        Some(Commands::Watch(args)) => run_watch(&config, &args).await?,
        Some(Commands::Play(args)) => {
            tokio::task::spawn_blocking(move || run_play(&config, &args))
                .await
                .context("Playback task failed")??;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Loads the config file and applies command-line overrides.
fn load_config(cli: &Cli) -> KioskConfig {
    let mut config = KioskConfig::load_or_default(cli.config.as_deref());
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if cli.no_sound {
        config.sound_enabled = false;
    }
    tracing::debug!("configuration: {:?}", config);
    config
}

fn open_store(config: &KioskConfig) -> AlarmService {
    AlarmService::open(config.alarm_path()).with_sound_launcher(Arc::new(sound_launcher(config)))
}

fn sound_launcher(config: &KioskConfig) -> HelperSoundLauncher {
    HelperSoundLauncher::new(&config.sound_helper).muted(!config.sound_enabled)
}

// ============================================================================
// Alarm Commands
// ============================================================================

fn run_alarm_command(config: &KioskConfig, command: AlarmCommand) -> Result<()> {
    let store = open_store(config);
    match command {
        AlarmCommand::List { json } => {
            let alarms = store.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&alarms)?);
            } else {
                Display::show_alarm_list(&alarms);
            }
        }
        AlarmCommand::Add(args) => {
            let alarm = args.to_alarm();
            store
                .add(alarm.clone())
                .with_context(|| format!("Failed to add alarm {}", alarm.id))?;
            Display::show_alarm_added(&alarm);
        }
        AlarmCommand::Remove { id } => {
            if !store.remove(&id)? {
                bail!("no alarm with id '{}'", id);
            }
            Display::show_alarm_removed(&id);
        }
        AlarmCommand::Enable { id } => set_enabled(&store, &id, true)?,
        AlarmCommand::Disable { id } => set_enabled(&store, &id, false)?,
    }
    Ok(())
}

fn set_enabled(store: &AlarmService, id: &str, enabled: bool) -> Result<()> {
    if !store.set_enabled(id, enabled)? {
        bail!("no alarm with id '{}'", id);
    }
    Display::show_alarm_toggled(id, enabled);
    Ok(())
}

// ============================================================================
// Watch
// ============================================================================

async fn run_watch(config: &KioskConfig, args: &WatchArgs) -> Result<()> {
    let period = args
        .interval
        .map_or_else(|| config.poll_interval(), Duration::from_secs);
    let store = Arc::new(open_store(config));

    let (fired_tx, mut fired_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(alarm) = fired_rx.recv().await {
            Display::show_fired(&alarm);
        }
    });

    let mut watcher = DueWatcher::new(store, period, fired_tx);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    watcher.run(|| Local::now().naive_local(), shutdown).await?;

    // Closing the sender lets the printer drain and finish.
    drop(watcher);
    printer.await.context("Failed to flush fired alarms")?;
    Ok(())
}

// ============================================================================
// Play
// ============================================================================

fn run_play(config: &KioskConfig, args: &PlayArgs) -> Result<()> {
    let kind = if args.video {
        MediaKind::Video
    } else {
        MediaKind::Audio
    };
    let file: &Path = &args.file;
    if !file.exists() {
        bail!("media file not found: {}", file.display());
    }

    let mut settings = config.player(kind).clone();
    if let Some(player) = &args.player {
        settings.executable = player.clone();
    }
    if args.driver.is_some() {
        settings.driver = args.driver.clone();
    }

    let mut player = MediaPlayer::new(kind).with_quit_timeout(config.quit_timeout());
    player
        .start(settings.command(kind))
        .map_err(|e| anyhow::anyhow!("{} ({})", e, e.suggestion()))?;

    let (observer, events) = ChannelPlaybackObserver::new();
    player.set_observer(Arc::new(observer));
    player.play_file(file)?;
    player.query_length()?;

    let mut announced = false;
    let outcome = loop {
        match events.recv_timeout(PROGRESS_INTERVAL) {
            Ok(PlaybackEvent::EndOfTrack) => break Ok(()),
            Ok(PlaybackEvent::ProcessExited) => break Err(anyhow::anyhow!("player exited")),
            Err(RecvTimeoutError::Disconnected) => break Ok(()),
            Err(RecvTimeoutError::Timeout) => {
                let state = player.snapshot();
                if !announced && !state.title.is_empty() {
                    Display::show_now_playing(&state);
                    announced = true;
                }
                Display::show_progress(&state);
                if let Err(e) = player.query_position() {
                    break Err(e.into());
                }
            }
        }
    };

    player.clear_observer();
    player.quit()?;
    outcome
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
