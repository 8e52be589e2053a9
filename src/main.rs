//! check_dmesg binary
//!
//! Reports boot-time kernel errors to a Zabbix server, once per boot.
//! Meant to be started by init, cron or a Zabbix UserParameter.

use anyhow::Context;
use check_dmesg::{
    collect_records, BootGuard, DmesgSource, Outcome, Reporter, ReporterError, RunConfig,
    SenderMode, DEFAULT_BUFFER_DIR, DEFAULT_DMESG_EXEC, DEFAULT_MARKER_DIR, DEFAULT_SERVER_PORT,
};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "check_dmesg")]
#[command(about = "Send kernel messages of err level or worse on boot to a Zabbix server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Collects `dmesg` output of level emerg, alert, crit and err and sends it \
                  with zabbix_sender under the sys.kernel.dmesg item, at most once per boot"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Host name the item belongs to (defaults to this machine's host name)
    #[arg(long)]
    host: Option<String>,

    /// zabbix_sender executable (looked up with `which` when unset)
    #[arg(long, env = "ZBXSENDER_EXEC")]
    sender_exec: Option<PathBuf>,

    /// dmesg executable
    #[arg(long, env = "DMESG_EXEC", default_value = DEFAULT_DMESG_EXEC)]
    dmesg_exec: PathBuf,

    /// Zabbix agent configuration file; takes precedence over --server
    #[arg(short = 'c', long)]
    agent_config: Option<PathBuf>,

    /// Zabbix server address, used when no agent configuration is given
    #[arg(short = 'z', long)]
    server: Option<String>,

    /// Zabbix server trapper port
    #[arg(short, long, default_value_t = DEFAULT_SERVER_PORT)]
    port: u16,

    /// Directory holding the once-per-boot marker
    #[arg(long, default_value = DEFAULT_MARKER_DIR)]
    marker_dir: PathBuf,

    /// Directory holding the temporary buffer file
    #[arg(long, default_value = DEFAULT_BUFFER_DIR)]
    buffer_dir: PathBuf,

    /// Base name for the marker and buffer files (defaults to the executable name)
    #[arg(long)]
    name: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Collect and send kernel errors unless already done this boot (default)
    Run,

    /// Show whether this boot was already reported
    Status,

    /// Print the kernel errors that would be sent, without sending them
    Collect,

    /// Print the resolved configuration as JSON
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("{:#}", e);
        process::exit(1);
    }

    let config = build_config(&cli);
    debug!("{:#?}", config);

    let code = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_command(config).await,
        Commands::Status => report(status_command(&config)),
        Commands::Collect => report(collect_command(&config).await),
        Commands::Config => report(config_command(&config)),
    };

    process::exit(code);
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install the log subscriber")?;

    Ok(())
}

fn build_config(cli: &Cli) -> RunConfig {
    let mut config = RunConfig::default()
        .with_sender_exec(cli.sender_exec.clone())
        .with_dmesg_exec(cli.dmesg_exec.clone())
        .with_sender_mode(SenderMode::resolve(
            cli.agent_config.clone(),
            cli.server.clone(),
            cli.port,
        ))
        .with_marker_dir(cli.marker_dir.clone())
        .with_buffer_dir(cli.buffer_dir.clone());

    if let Some(host) = &cli.host {
        config = config.with_host(host.clone());
    }
    if let Some(name) = &cli.name {
        config = config.with_script_name(name.clone());
    }
    config
}

/// Exit code for an informational subcommand.
fn report(result: anyhow::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{:#}", e);
            e.downcast_ref::<ReporterError>()
                .map(ReporterError::exit_code)
                .unwrap_or(1)
        }
    }
}

async fn run_command(config: RunConfig) -> i32 {
    info!("Starting check_dmesg version {}...", env!("CARGO_PKG_VERSION"));

    let mut reporter = Reporter::from_config(config);
    match reporter.run().await {
        Ok(Outcome::AlreadyDone) => {
            println!("has already executed.");
            0
        }
        Ok(Outcome::Sent { records, status }) => {
            info!("Reported {} kernel messages", records);
            println!("{}", status);
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

fn status_command(config: &RunConfig) -> anyhow::Result<()> {
    let guard = BootGuard::from_config(config);

    match guard.marked_at()? {
        Some(at) => {
            let at: DateTime<Local> = at.into();
            println!(
                "Reported this boot at {} ({})",
                at.format("%Y-%m-%d %H:%M:%S %Z"),
                guard.marker_path().display()
            );
        }
        None => println!(
            "Not reported yet this boot ({} absent)",
            guard.marker_path().display()
        ),
    }

    if guard.buffer_path().exists() {
        println!(
            "Buffer left from an unsent run: {}",
            guard.buffer_path().display()
        );
    }

    Ok(())
}

async fn collect_command(config: &RunConfig) -> anyhow::Result<()> {
    config.validate()?;

    let mut source = DmesgSource::new(config.dmesg_exec.clone());
    let records = collect_records(&mut source, &config.host).await?;
    for record in &records {
        println!("{}", record);
    }
    info!("Collected {} kernel messages", records.len());

    Ok(())
}

fn config_command(config: &RunConfig) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    println!("{}", json);
    Ok(())
}
