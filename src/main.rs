mod compare;
mod config;
mod describe;
mod models;
mod ping;
mod report;
mod resolve;
mod search;
mod transport;
mod utils;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, TransportKind};
use resolve::Pipeline;

#[derive(Parser)]
#[command(
    name = "nxos-supercommand",
    version,
    about = "Trace an IP through ARP, MAC and CDP tables on a Nexus switch"
)]
struct Cli {
    #[arg(long, global = true, help = "Switch address (overrides SWITCH_HOST)")]
    host: Option<String>,

    #[arg(long, global = true, help = "Username (overrides SWITCH_USER)")]
    username: Option<String>,

    #[arg(long, global = true, help = "Password (overrides SWITCH_PASS)")]
    password: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        help = "How to reach the switch (overrides SWITCH_TRANSPORT)"
    )]
    transport: Option<TransportKind>,

    #[arg(long, global = true, help = "Log every query and skipped row to stderr")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an IP (or every ARP entry) to its port and CDP neighbor
    Lookup {
        #[arg(help = "IPv4 address to query. Use all for every IP in ARP")]
        target: String,
        #[arg(long, help = "Routing context (defaults to DEFAULT_VRF)")]
        vrf: Option<String>,
    },
    /// Generate interface descriptions from CDP neighbors
    Describe {
        #[arg(long, help = "Apply the descriptions instead of only printing them")]
        apply: bool,
    },
    /// Compare a command's output across the SWITCHES list
    Compare {
        #[arg(long, default_value = compare::DEFAULT_COMMAND)]
        command: String,
    },
    /// Ping every address of a range from the switch
    Ping {
        #[arg(help = "Addresses to ping; any octet may be a range, e.g. 10.0.1-2.1-254")]
        range: String,
        #[arg(long, short = 'o', default_value = ping::DEFAULT_OPTIONS, help = "Options passed to ping")]
        options: String,
    },
    /// Run a single show command
    Show {
        #[arg(required = true, num_args = 1.., help = "Command to run, e.g. show version")]
        command: Vec<String>,
        #[arg(long, help = "Print the structured rendering as JSON")]
        structured: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "nxos_supercommand=debug"
    } else {
        "nxos_supercommand=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut cfg = Config::load().context("Invalid configuration")?;
    if let Some(host) = cli.host {
        cfg.switch.host = host;
    }
    if let Some(username) = cli.username {
        cfg.switch.username = username;
    }
    if let Some(password) = cli.password {
        cfg.switch.password = password;
    }
    if let Some(transport) = cli.transport {
        cfg.transport = transport;
    }
    tracing::debug!("Using {:?} against {}", cfg.transport, cfg.switch.host);

    match cli.command {
        Commands::Lookup { target, vrf } => lookup(&cfg, &target, vrf.as_deref()).await,
        Commands::Describe { apply } => describe(&cfg, apply).await,
        Commands::Compare { command } => compare(&cfg, &command).await,
        Commands::Ping { range, options } => ping(&cfg, &range, &options).await,
        Commands::Show { command, structured } => show(&cfg, &command.join(" "), structured).await,
    }
}

async fn lookup(cfg: &Config, target: &str, vrf: Option<&str>) -> Result<ExitCode> {
    if target != resolve::ALL && !utils::is_valid_ipv4(target) {
        eprintln!("Invalid target {}: expected an IPv4 address or {}", target, resolve::ALL);
        return Ok(ExitCode::FAILURE);
    }

    let device = match transport::connect(&cfg.switch, cfg).await {
        Ok(device) => device,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let vrf = vrf.unwrap_or(&cfg.default_vrf);
    match Pipeline::new(device.as_ref()).resolve(target, vrf).await {
        Ok(results) => {
            print!("{}", report::render(&results));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn describe(cfg: &Config, apply: bool) -> Result<ExitCode> {
    let device = match transport::connect(&cfg.switch, cfg).await {
        Ok(device) => device,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let descriptions = describe::collect(device.as_ref())
        .await
        .context("Failed to read CDP neighbors")?;
    for description in &descriptions {
        println!("{}", description.command());
    }

    if apply {
        let applied = describe::apply(device.as_ref(), &descriptions).await;
        tracing::info!("Applied {} of {} descriptions", applied, descriptions.len());
        if applied < descriptions.len() {
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn compare(cfg: &Config, command: &str) -> Result<ExitCode> {
    if cfg.switches.is_empty() {
        bail!("SWITCHES is empty; nothing to compare");
    }

    let mut snapshots = Vec::with_capacity(cfg.switches.len());
    for switch in &cfg.switches {
        let device = match transport::connect(switch, cfg).await {
            Ok(device) => device,
            Err(e) => {
                eprintln!("{}: {}", switch.host, e);
                continue;
            }
        };
        match compare::snapshot(device.as_ref(), &switch.host, command).await {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => eprintln!("{}: {}", switch.host, e),
        }
    }

    let mismatches = compare::mismatches(&snapshots);
    print!("{}", compare::render_table(&snapshots, &mismatches));
    Ok(ExitCode::SUCCESS)
}

async fn ping(cfg: &Config, range: &str, options: &str) -> Result<ExitCode> {
    let ips = ping::expand_range(range)?;

    let device = match transport::connect(&cfg.switch, cfg).await {
        Ok(device) => device,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    for result in ping::sweep(device.as_ref(), &ips, options).await {
        println!("{}", result.line());
    }
    Ok(ExitCode::SUCCESS)
}

async fn show(cfg: &Config, command: &str, structured: bool) -> Result<ExitCode> {
    let device = match transport::connect(&cfg.switch, cfg).await {
        Ok(device) => device,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if structured {
        let doc = device.structured_query(command).await?;
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        print!("{}", device.text_query(command).await?);
    }
    Ok(ExitCode::SUCCESS)
}
