// The daemon half only exists on macOS; elsewhere just the CLI and core build.
#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

#[cfg(target_os = "macos")]
mod app;
mod core;
mod dispatch;
mod ipc;
#[cfg(target_os = "macos")]
mod macos;
mod platform;
mod tracker;
mod trigger;
mod watcher;

use anyhow::{bail, Result};
use argh::FromArgs;
use ipc::IpcClient;
use tracing_subscriber::EnvFilter;
use whichspace_ipc::{Command, Response};

use crate::core::{expand_home, Config, SpaceResolver};
use crate::platform::{FileDataSource, SpaceDataSource};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WhichSpace - shows the active macOS space number in the menu bar
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    Current(CurrentCmd),
    Refresh(RefreshCmd),
    Resolve(ResolveCmd),
    Snapshot(SnapshotCmd),
    Quit(QuitCmd),
}

/// Start the menu bar daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {
    /// identifier of the primary display (default: Main)
    #[argh(option)]
    main_display: Option<String>,
    /// file the window server rewrites on space changes
    #[argh(option)]
    spaces_file: Option<String>,
    /// text shown when the active space has no number (default: ?)
    #[argh(option)]
    unknown_label: Option<String>,
}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Print the space number shown by the running daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "current")]
struct CurrentCmd {}

/// Ask the running daemon to resolve the active space again
#[derive(FromArgs)]
#[argh(subcommand, name = "refresh")]
struct RefreshCmd {}

/// Resolve the active space once, without a daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "resolve")]
struct ResolveCmd {
    /// read a JSON snapshot (from `whichspace snapshot`) instead of the window server
    #[argh(option)]
    snapshot: Option<String>,
    /// identifier of the primary display (default: Main)
    #[argh(option)]
    main_display: Option<String>,
    /// print every display and the space numbering
    #[argh(switch, short = 'v')]
    verbose: bool,
}

/// Dump the window server's display spaces as JSON
#[derive(FromArgs)]
#[argh(subcommand, name = "snapshot")]
struct SnapshotCmd {}

/// Quit the whichspace daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["whichspace", "--help"];
            match Cli::from_args(&args[..1], &args[1..]) {
                Ok(_) => {}
                Err(e) => {
                    println!("{}", e.output);
                }
            }
            Ok(())
        }
        Some(SubCommand::Start(cmd)) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            let config = Config::new()
                .with_main_display(cmd.main_display)
                .with_spaces_file(cmd.spaces_file)
                .with_unknown_label(cmd.unknown_label);

            tracing::info!("whichspace {} starting", VERSION);
            tracing::debug!("{:?}", config);
            start(config)
        }
        Some(SubCommand::Version(_)) => {
            println!("whichspace {}", VERSION);
            Ok(())
        }
        Some(SubCommand::Resolve(cmd)) => run_resolve(cmd),
        Some(SubCommand::Snapshot(_)) => run_snapshot(),
        Some(subcmd) => run_cli(subcmd),
    }
}

#[cfg(target_os = "macos")]
fn start(config: Config) -> Result<()> {
    app::App::run(config)
}

#[cfg(not(target_os = "macos"))]
fn start(_config: Config) -> Result<()> {
    bail!("The whichspace daemon only runs on macOS")
}

#[cfg(target_os = "macos")]
fn live_data_source() -> Result<platform::MacOSSpaceDataSource> {
    Ok(platform::MacOSSpaceDataSource::new())
}

#[cfg(not(target_os = "macos"))]
fn live_data_source() -> Result<FileDataSource> {
    bail!("Live space queries are only available on macOS, use --snapshot")
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd)?;
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::Space { space } => {
            println!("{}", space.label);
            if !space.is_known() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn to_command(subcmd: SubCommand) -> Result<Command> {
    match subcmd {
        SubCommand::Current(_) => Ok(Command::GetSpace),
        SubCommand::Refresh(_) => Ok(Command::Refresh),
        SubCommand::Quit(_) => Ok(Command::Quit),
        SubCommand::Start(_)
        | SubCommand::Version(_)
        | SubCommand::Resolve(_)
        | SubCommand::Snapshot(_) => {
            unreachable!("handled in main")
        }
    }
}

fn run_resolve(cmd: ResolveCmd) -> Result<()> {
    let config = Config::new().with_main_display(cmd.main_display);
    let snapshot = match cmd.snapshot {
        Some(path) => FileDataSource::new(expand_home(&path)).query_snapshot()?,
        None => live_data_source()?.query_snapshot()?,
    };

    let resolver = SpaceResolver::new(config.main_display.as_str());
    let state = resolver.resolve(&snapshot);

    if cmd.verbose {
        println!(
            "Active display: {}",
            snapshot.active_display.as_deref().unwrap_or("-")
        );
        for display in &snapshot.displays {
            println!(
                "Display {} (current space {})",
                display.identifier, display.current_space_id
            );
        }
        let active_id = resolver.active_space_id(&snapshot);
        for (number, id) in resolver.numbering(&snapshot) {
            let marker = if Some(id) == active_id { " *" } else { "" };
            println!("{:>3}: {}{}", number, id, marker);
        }
    }

    println!("{}", state.label(&config.unknown_label));
    Ok(())
}

fn run_snapshot() -> Result<()> {
    let record = live_data_source()?.query_record()?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
