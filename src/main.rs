//! AppDriver - Main Entry Point
//!
//! Resolves the run configuration for the asked execution context, prints a
//! summary, and optionally dumps the derived capabilities or opens a smoke
//! session against the configured driver server.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use appdriver::{
    config::{DriverCapabilities, ExecutionContext, Settings},
    driver::DriverSession,
    NAME, VERSION,
};

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const BLUE: &str = "\x1b[34m";
    pub const GREEN: &str = "\x1b[32m";
}

/// Build the CLI command parser
fn build_cli() -> Command {
    Command::new(NAME)
        .version(VERSION)
        .about("Environment-aware Appium driver configuration for Android UI test runs")
        .arg(
            Arg::new("context")
                .short('c')
                .long("context")
                .value_name("CONTEXT")
                .help("Execution context (default: from environment, else browser)")
                .value_parser(["emulation", "real", "browser"]),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("DIR")
                .help("Project root holding the config.<context>.env files")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dump-caps")
                .long("dump-caps")
                .help("Print the derived driver capabilities as JSON and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("connect")
                .long("connect")
                .help("Open a driver session as a smoke check, then close it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress output except errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
}

/// Initialize the tracing/logging subsystem
fn init_tracing(verbosity: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().expect("static directive"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Print configuration summary, masking credentials
fn print_config_summary(settings: &Settings) {
    println!(
        "{bold}{blue}Configuration:{reset}",
        bold = colors::BOLD,
        blue = colors::BLUE,
        reset = colors::RESET
    );
    println!(
        "  {dim}Context:{reset}        {}",
        settings.context,
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Remote URL:{reset}     {}",
        settings.remote_url,
        dim = colors::DIM,
        reset = colors::RESET
    );
    if let Some(ref device) = settings.device_name {
        println!(
            "  {dim}Device:{reset}         {}",
            device,
            dim = colors::DIM,
            reset = colors::RESET
        );
    }
    if let Some(ref udid) = settings.udid {
        println!(
            "  {dim}UDID:{reset}           {}",
            udid,
            dim = colors::DIM,
            reset = colors::RESET
        );
    }
    if let Some(ref app) = settings.app {
        println!(
            "  {dim}App:{reset}            {}",
            app,
            dim = colors::DIM,
            reset = colors::RESET
        );
    }
    if settings.run_on_browserstack() {
        println!(
            "  {dim}BrowserStack:{reset}   {green}yes{reset} (user: {})",
            settings.user_login.as_deref().map(mask).unwrap_or_default(),
            dim = colors::DIM,
            green = colors::GREEN,
            reset = colors::RESET
        );
    }
    println!(
        "  {dim}Cmd Timeout:{reset}    {}s",
        settings.new_command_timeout,
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!();
}

/// Keeps the first two characters of a credential, masks the rest.
fn mask(value: &str) -> String {
    let visible: String = value.chars().take(2).collect();
    format!("{}***", visible)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let verbosity = matches.get_count("verbose");
    let quiet = matches.get_flag("quiet");
    init_tracing(verbosity, quiet);

    let context = matches
        .get_one::<String>("context")
        .map(|s| s.parse::<ExecutionContext>())
        .transpose()
        .context("Invalid execution context")?;

    let settings = match matches.get_one::<PathBuf>("root") {
        Some(root) => Settings::resolve_from(root, context),
        None => Settings::resolve(context),
    }
    .context("Failed to resolve configuration")?;

    if !quiet {
        print_config_summary(&settings);
    }

    if matches.get_flag("dump-caps") {
        let caps = DriverCapabilities::derive(&settings);
        println!("{}", serde_json::to_string_pretty(caps.as_map())?);
        return Ok(());
    }

    if matches.get_flag("connect") {
        let session = DriverSession::connect(&settings)
            .await
            .context("Failed to open driver session")?;
        info!("smoke session established, closing");
        session.quit().await.context("Failed to close session")?;
        println!(
            "{green}Driver session check passed.{reset}",
            green = colors::GREEN,
            reset = colors::RESET
        );
    }

    Ok(())
}
