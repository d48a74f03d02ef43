//! Poll example: read (or set) the state of several controllers at once
//!
//! Hosts are given as `vendor@address`, optionally followed by `#SCN` for
//! UG405 controllers whose site control number is already known.
//!
//! # Secrets
//!
//! Communities and passwords come from the environment, never from the
//! command line:
//!
//! - `TRAFFICCTL_STCIP_READ`, `TRAFFICCTL_STCIP_WRITE`
//! - `TRAFFICCTL_UG405_READ`, `TRAFFICCTL_UG405_WRITE`
//! - `TRAFFICCTL_SSH_USER`, `TRAFFICCTL_SSH_PASSWORD`
//! - `TRAFFICCTL_TERMINAL_PASSWORD`
//!
//! # Usage
//!
//! ```bash
//! cargo run --example poll -- swarco@10.45.154.11 potok_p@10.45.154.19#CO1111 peek@10.45.154.20
//! cargo run --example poll -- --set 2 potok_s@10.45.154.16
//! ```

use std::env;
use std::sync::Arc;
use std::time::Duration;

use trafficctl::{
    Credentials, InboundCommand, NetTransport, Operation, RunOptions, StaticDirectory, Vendor,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.hosts.is_empty() {
        Args::print_help();
        std::process::exit(1);
    }

    let operation = match args.stage {
        Some(stage) => Operation::SetStage(stage),
        None => Operation::GetState,
    };

    let mut commands = Vec::with_capacity(args.hosts.len());
    for spec in &args.hosts {
        match parse_host(spec, operation) {
            Some(command) => commands.push(command),
            None => eprintln!("Skipping '{spec}': expected vendor@address[#SCN]"),
        }
    }

    let transport = Arc::new(
        NetTransport::builder()
            .http_timeout(Duration::from_secs(args.timeout))
            .build()?,
    );
    let options = RunOptions::default()
        .max_concurrency(args.concurrency)
        .operation_timeout(Duration::from_secs(args.timeout))
        .credentials(credentials_from_env());

    let results =
        trafficctl::dispatch(&commands, &StaticDirectory::new(), transport, &options).await;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn parse_host(spec: &str, operation: Operation) -> Option<InboundCommand> {
    let (vendor, rest) = spec.split_once('@')?;
    let vendor: Vendor = vendor.parse().ok()?;
    let (address, scn) = match rest.split_once('#') {
        Some((address, scn)) => (address, Some(scn)),
        None => (rest, None),
    };

    let command = InboundCommand::new(address, operation).with_host(vendor, address);
    Some(match scn {
        Some(scn) => command.with_scn(scn),
        None => command,
    })
}

fn credentials_from_env() -> Credentials {
    let var = |name: &str, default: &str| env::var(name).unwrap_or_else(|_| default.to_string());

    Credentials::new()
        .with_stcip(
            var("TRAFFICCTL_STCIP_READ", "public"),
            var("TRAFFICCTL_STCIP_WRITE", "private"),
        )
        .with_ug405(
            var("TRAFFICCTL_UG405_READ", "public"),
            var("TRAFFICCTL_UG405_WRITE", "private"),
        )
        .with_ssh(
            var("TRAFFICCTL_SSH_USER", "admin"),
            var("TRAFFICCTL_SSH_PASSWORD", ""),
        )
        .with_terminal_password(var("TRAFFICCTL_TERMINAL_PASSWORD", ""))
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    hosts: Vec<String>,
    stage: Option<u32>,
    concurrency: usize,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut hosts = Vec::new();
        let mut stage = None;
        let mut concurrency = 32usize;
        let mut timeout = 30u64;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--set" | "-s" => {
                    i += 1;
                    if i < args.len() {
                        stage = args[i].parse().ok();
                    }
                }
                "--concurrency" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        concurrency = args[i].parse().unwrap_or(32);
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(30);
                    }
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => hosts.push(other.to_string()),
            }
            i += 1;
        }

        Self {
            hosts,
            stage,
            concurrency,
            timeout,
        }
    }

    fn print_help() {
        println!(
            r#"trafficctl poll example

USAGE:
    cargo run --example poll -- [OPTIONS] <VENDOR@ADDRESS[#SCN]>...

VENDORS:
    swarco, potok_p, potok_s, peek

OPTIONS:
    -s, --set <STAGE>          Select a stage instead of reading state (0 releases)
    -c, --concurrency <N>      Hosts in flight at once [default: 32]
    -t, --timeout <SECS>       Per-host operation timeout [default: 30]
    --help                     Print this help message
"#
        );
    }
}
