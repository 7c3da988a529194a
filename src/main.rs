//! Input Replay - Desktop Input Recording and Replay Engine
//!
//! Records keyboard/mouse input into a timeline and compiles it into a
//! replayable script.

use input_replay::app::cli::{Cli, Commands, ConfigAction};
use input_replay::app::config::Config;
use input_replay::capture::NullHookService;
use input_replay::replay::{InjectionSink, ReplayExecutor, RunOutcome, TracingSink};
use input_replay::script::{Script, Synthesizer};
use input_replay::session::{SessionController, SessionOptions};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Record {
            duration,
            output,
            execute,
        } => {
            run_record(duration, output, execute, &config)?;
        }
        Commands::Replay { input, dry_run } => {
            run_replay(&input, dry_run, &config)?;
        }
        Commands::Init { force } => {
            run_init(force, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

fn session_options(config: &Config) -> SessionOptions {
    SessionOptions {
        ring_capacity: config.capture.ring_buffer_size,
        drain_interval: Duration::from_millis(config.capture.drain_interval_ms),
        synthesizer: Synthesizer::with_startup_delay(config.script.startup_delay_secs),
        cancel_poll: Duration::from_millis(config.replay.cancel_poll_ms),
    }
}

fn run_record(
    duration: u64,
    output: Option<String>,
    execute: bool,
    config: &Config,
) -> anyhow::Result<()> {
    if duration > 0 {
        info!("Starting recording for {} seconds", duration);
    } else {
        info!("Starting recording (Ctrl+C to stop)");
    }

    // No platform hook backend is wired in yet; the null service records
    // nothing but exercises the full pipeline
    let hook = NullHookService::new();
    let mut controller = SessionController::with_options(Box::new(hook), session_options(config));

    controller.start_recording()?;

    // Set up Ctrl+C handler
    let stop_flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let stop_flag_handler = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_handler.store(true, std::sync::atomic::Ordering::SeqCst);
    })?;

    let start_time = std::time::Instant::now();
    let mut printed = 0;

    // Recording loop: echo the timeline as it grows
    loop {
        if stop_flag.load(std::sync::atomic::Ordering::SeqCst) {
            break;
        }
        if duration > 0 && start_time.elapsed().as_secs() >= duration {
            break;
        }

        let lines = controller.timeline_log_lines();
        for line in &lines[printed..] {
            println!("{}", line);
        }
        printed = lines.len();

        std::thread::sleep(Duration::from_millis(100));
    }

    controller.stop_recording()?;

    let elapsed = start_time.elapsed();
    let events = controller.timeline_snapshot();
    info!("Recording stopped after {:.1}s", elapsed.as_secs_f64());
    info!("Captured {} events", events.len());

    let script = controller.synthesize();
    if script.skipped_events > 0 {
        warn!("{} malformed events skipped during synthesis", script.skipped_events);
    }

    // Save script and instruction file
    let output_name = output.unwrap_or_else(|| {
        chrono::Local::now()
            .format("rpa_script_%Y%m%d_%H%M%S")
            .to_string()
    });

    let scripts_dir = Cli::scripts_dir();
    std::fs::create_dir_all(&scripts_dir)?;

    let py_path = scripts_dir.join(format!("{}.py", output_name));
    std::fs::write(&py_path, script.render_python())?;
    info!("Saved script to {:?}", py_path);

    let json_path = scripts_dir.join(format!("{}.json", output_name));
    std::fs::write(&json_path, serde_json::to_string_pretty(&script)?)?;
    info!("Saved instructions to {:?}", json_path);

    println!("\nRecording Complete!");
    println!("  Events: {}", events.len());
    println!("  Instructions: {}", script.len());
    println!("  Script: {:?}", py_path);

    if execute {
        info!("Replaying recording");
        controller.execute(Box::new(TracingSink::new()))?;
        let outcome = controller.wait_for_execution()?;
        info!("Replay finished: {:?}", outcome);
    }

    Ok(())
}

fn run_replay(input: &Path, dry_run: bool, config: &Config) -> anyhow::Result<()> {
    if !input.exists() {
        anyhow::bail!("Instruction file not found: {:?}", input);
    }

    let content = std::fs::read_to_string(input)?;
    let script: Script = serde_json::from_str(&content)?;
    info!("Loaded {} instructions from {:?}", script.len(), input);

    let sink = replay_sink(dry_run)?;

    let executor =
        ReplayExecutor::with_cancel_poll(Duration::from_millis(config.replay.cancel_poll_ms));
    let handle = executor.spawn(script.instructions, sink)?;

    // Ctrl+C cancels the run cooperatively
    let cancel = handle.canceller();
    ctrlc::set_handler(move || {
        cancel.cancel();
    })?;

    match handle.wait()? {
        RunOutcome::Completed => {
            println!("Replay completed");
        }
        RunOutcome::Cancelled => {
            println!("Replay cancelled");
        }
    }

    Ok(())
}

/// Pick the injection sink for a standalone replay run.
///
/// No platform injection backend is wired in yet, so only dry runs are
/// possible: they log each injection instead of performing it.
fn replay_sink(dry_run: bool) -> anyhow::Result<Box<dyn InjectionSink>> {
    if !dry_run {
        anyhow::bail!(
            "no injection backend is available on this build; \
             re-run with --dry-run to log the replay instead"
        );
    }
    info!("Dry run: logging injections instead of performing them");
    Ok(Box::new(TracingSink::new()))
}

fn run_init(force: bool, config: &Config) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save_default()?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);

    std::fs::create_dir_all(Cli::scripts_dir())?;
    println!("\nCreated directories:");
    println!("  Scripts: {:?}", Cli::scripts_dir());

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = config.to_toml()?;
            println!("Configuration ({:?}):\n", Config::default_path());
            println!("{}", toml_str);
        }
        ConfigAction::Reset { force } => {
            let config_path = Config::default_path();

            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            let default_config = Config::default();
            default_config.save_default()?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_without_backend_requires_dry_run() {
        let err = replay_sink(false).err().unwrap();
        assert!(err.to_string().contains("--dry-run"));
        assert!(replay_sink(true).is_ok());
    }
}
