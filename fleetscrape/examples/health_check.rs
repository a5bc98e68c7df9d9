//! Fleet health check example
//!
//! Runs a command batch against every device in an inventory file and prints
//! each device's output followed by a run summary.
//!
//! # Inventory format
//!
//! One device per line, `hostname,address,platform`. The platform column is
//! free text from the inventory sheet (`ASR9006`, `ISR4451`, `C9300-48P`, ...)
//! and is classified into an OS family. Blank lines and `#` comments are
//! skipped.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example health_check -- \
//!     --devices inventory.csv --commands commands.txt \
//!     --user netops --password secret --workers 10
//! ```
//!
//! Per-family command files override the default batch:
//! ```bash
//! cargo run --example health_check -- --devices inventory.csv \
//!     --commands commands.txt --xr-commands xr.txt --l2-commands switches.txt \
//!     --user netops --password secret --transcripts /tmp/fleetscrape
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fleetscrape::transport::HostKeyVerification;
use fleetscrape::{
    CollectorBuilder, CommandBatch, CommandCatalog, CommandFailurePolicy, DeviceProfile, OsFamily,
    SshClientConfig, TranscriptCapture,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("=== Fleetscrape Health Check ===\n");

    let devices = load_inventory(&args.devices)?;
    let mut catalog = CommandCatalog::new(CommandBatch::parse(&fs::read_to_string(&args.commands)?))?;
    for (family, path) in &args.family_commands {
        let batch = CommandBatch::parse(&fs::read_to_string(path)?);
        println!("Loaded {} {} commands from {}", batch.len(), family, path.display());
        catalog = catalog.with_family(*family, batch);
    }
    for family in OsFamily::ALL {
        if !catalog.has_family_batch(family) {
            println!("{} devices use the default batch", family);
        }
    }
    println!(
        "Loaded {} default commands, {} devices\n",
        catalog.default_batch().len(),
        devices.len()
    );

    let ssh = SshClientConfig {
        connect_timeout: Duration::from_secs(args.connect_timeout),
        host_key_verification: if args.strict_host_keys {
            HostKeyVerification::Strict
        } else {
            HostKeyVerification::AcceptNew
        },
        ..Default::default()
    };

    let mut builder = CollectorBuilder::new()
        .ssh_config(ssh)
        .username(&args.user)
        .port(args.port)
        .workers(args.workers)
        .session_timeout(Duration::from_secs(args.timeout));

    if let Some(password) = &args.password {
        builder = builder.password(password);
    } else if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }

    if args.abort_on_failure {
        builder = builder.on_command_failure(CommandFailurePolicy::AbortRemaining);
    }
    if let Some(dir) = &args.transcripts {
        builder = builder.transcripts(TranscriptCapture::OnFailure, dir);
    }

    let collector = builder.build()?;
    let mut run = collector.run(devices, &catalog);

    while let Some(result) = run.next().await {
        if args.json {
            println!("{}", serde_json::to_string(&result)?);
            continue;
        }

        let status = if result.success { "OK" } else { "FAILED" };
        println!(
            "=== {} [{}] {:.1}s ===",
            result.device,
            status,
            result.elapsed.as_secs_f64()
        );
        if let Some(message) = &result.error_message {
            println!("  {}\n", message);
            continue;
        }
        for command in &result.results {
            println!("--- {} ({:.1}s) ---", command.command, command.elapsed.as_secs_f64());
            if let Some(error) = &command.error {
                println!("[{}]", error);
            }
            println!("{}\n", command.display_output());
        }
    }

    println!("\n{} in {:.1}s", run.summary(), run.elapsed().as_secs_f64());
    println!("Peak concurrent sessions: {}", run.registry().peak());

    Ok(())
}

fn load_inventory(path: &Path) -> Result<Vec<DeviceProfile>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let mut devices = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        match fields.as_slice() {
            [hostname, address, platform, ..] => {
                let family = platform
                    .parse::<OsFamily>()
                    .unwrap_or_else(|_| OsFamily::classify(platform));
                devices.push(DeviceProfile::new(*hostname, *address, family));
            }
            _ => eprintln!("Skipping line {}: expected hostname,address,platform", line_no + 1),
        }
    }

    Ok(devices)
}

/// Simple argument parser
struct Args {
    devices: PathBuf,
    commands: PathBuf,
    family_commands: Vec<(OsFamily, PathBuf)>,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    workers: usize,
    timeout: u64,
    connect_timeout: u64,
    strict_host_keys: bool,
    transcripts: Option<PathBuf>,
    abort_on_failure: bool,
    json: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut devices = PathBuf::from("devices.csv");
        let mut commands = PathBuf::from("commands.txt");
        let mut family_commands = Vec::new();
        let mut port = 22u16;
        let mut user = env::var("USER").unwrap_or_else(|_| "admin".to_string());
        let mut password = env::var("FLEETSCRAPE_PASSWORD").ok();
        let mut key = None;
        let mut workers = 5usize;
        let mut timeout = 180u64;
        let mut connect_timeout = 30u64;
        let mut strict_host_keys = false;
        let mut transcripts = None;
        let mut abort_on_failure = false;
        let mut json = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--devices" | "-d" => {
                    i += 1;
                    if i < args.len() {
                        devices = PathBuf::from(&args[i]);
                    }
                }
                "--commands" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        commands = PathBuf::from(&args[i]);
                    }
                }
                flag @ ("--xr-commands" | "--xe-commands" | "--l2-commands") => {
                    let family = match flag {
                        "--xr-commands" => OsFamily::IosXr,
                        "--xe-commands" => OsFamily::IosXe,
                        _ => OsFamily::L2Switch,
                    };
                    i += 1;
                    if i < args.len() {
                        family_commands.push((family, PathBuf::from(&args[i])));
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].parse().unwrap_or(22);
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = Some(args[i].clone());
                    }
                }
                "--key" | "-k" => {
                    i += 1;
                    if i < args.len() {
                        key = Some(PathBuf::from(&args[i]));
                    }
                }
                "--workers" | "-w" => {
                    i += 1;
                    if i < args.len() {
                        workers = args[i].parse().unwrap_or(5);
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(180);
                    }
                }
                "--connect-timeout" => {
                    i += 1;
                    if i < args.len() {
                        connect_timeout = args[i].parse().unwrap_or(30);
                    }
                }
                "--strict-host-keys" => {
                    strict_host_keys = true;
                }
                "--transcripts" => {
                    i += 1;
                    if i < args.len() {
                        transcripts = Some(PathBuf::from(&args[i]));
                    }
                }
                "--abort-on-failure" => {
                    abort_on_failure = true;
                }
                "--json" => {
                    json = true;
                }
                "--help" | "-h" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            devices,
            commands,
            family_commands,
            port,
            user,
            password,
            key,
            workers,
            timeout,
            connect_timeout,
            strict_host_keys,
            transcripts,
            abort_on_failure,
            json,
        }
    }

    fn print_help() {
        println!("Fleet health check example");
        println!();
        println!("Usage: health_check [OPTIONS]");
        println!();
        println!("Options:");
        println!("  -d, --devices <FILE>      Inventory file: hostname,address,platform [default: devices.csv]");
        println!("  -c, --commands <FILE>     Default command batch [default: commands.txt]");
        println!("      --xr-commands <FILE>  Command batch for IOS-XR devices");
        println!("      --xe-commands <FILE>  Command batch for IOS-XE devices");
        println!("      --l2-commands <FILE>  Command batch for L2 switches");
        println!("  -p, --port <PORT>         SSH port [default: 22]");
        println!("  -u, --user <USER>         Username [default: $USER]");
        println!("  -P, --password <PASS>     Password [default: $FLEETSCRAPE_PASSWORD]");
        println!("  -k, --key <PATH>          Private key file");
        println!("  -w, --workers <N>         Concurrent sessions [default: 5]");
        println!("  -t, --timeout <SECS>      Per-device session timeout [default: 180]");
        println!("      --connect-timeout <SECS>  SSH connect timeout [default: 30]");
        println!("      --strict-host-keys    Reject hosts missing from known_hosts");
        println!("      --transcripts <DIR>   Write transcripts of failed sessions to DIR");
        println!("      --abort-on-failure    Skip the rest of a batch after a failed command");
        println!("      --json                Print one JSON object per device");
        println!("  -h, --help                Print help");
    }
}
