use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use statuswatch::data::format::{format_bytes, format_uptime};
use statuswatch::instance::DEMO_INSTANCE_ID;
use statuswatch::{
    source, InstanceDescriptor, InstanceHandle, InstanceId, Phase, RefreshInterval, Registry,
    Settings, StatusSnapshot,
};

/// Preferred id for the instance passed with `--url`. A numeric suffix is
/// added if a configured instance already uses it.
const CLI_INSTANCE_ID: &str = "cli";

/// How often the watch loop looks for new snapshots.
const WATCH_POLL: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(name = "statuswatch")]
#[command(about = "Poll server status endpoints and print normalized snapshots")]
struct Args {
    /// Settings file (TOML, JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Poll a single status endpoint instead of the configured instances
    #[arg(short, long, conflicts_with = "demo")]
    url: Option<String>,

    /// Basic-auth username for --url
    #[arg(long, requires = "url")]
    username: Option<String>,

    /// Basic-auth password for --url
    #[arg(long, requires = "username")]
    password: Option<String>,

    /// Poll the synthetic demo instance
    #[arg(short, long)]
    demo: bool,

    /// Refresh interval in seconds (1, 2, 5 or 10)
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Fetch once, print the snapshot as JSON and exit
    #[arg(long)]
    once: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(secs) = args.refresh {
        settings.refresh_interval = RefreshInterval::try_from(secs)?;
    }
    if args.demo {
        settings.demo_mode = true;
    }
    settings.validate()?;

    let target = target_instance(&args, &settings)?;

    let rt = tokio::runtime::Runtime::new()?;
    if args.once {
        return rt.block_on(fetch_once(&target, &settings));
    }
    rt.block_on(watch(target, settings))
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "statuswatch=debug"
    } else {
        "statuswatch=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Logs go to stderr so that --once output can be piped.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Work out which instance to poll from the flags and settings.
fn target_instance(args: &Args, settings: &Settings) -> Result<InstanceDescriptor> {
    if let Some(url) = &args.url {
        let mut descriptor = InstanceDescriptor::new(cli_instance_id(settings), url.as_str());
        descriptor.username = args.username.clone();
        descriptor.password = args.password.clone();
        return Ok(descriptor);
    }
    if args.demo {
        return Ok(InstanceDescriptor::demo());
    }

    if let Some(selected) = &settings.selected {
        if selected.as_str() == DEMO_INSTANCE_ID {
            return Ok(InstanceDescriptor::demo());
        }
        if let Some(descriptor) = settings.instances.iter().find(|d| &d.id == selected) {
            return Ok(descriptor.clone());
        }
    }
    if let Some(first) = settings.instances.first() {
        return Ok(first.clone());
    }
    if settings.demo_mode {
        return Ok(InstanceDescriptor::demo());
    }

    bail!("No instance to poll: pass --url, --demo or configure instances in a settings file")
}

/// First of `cli`, `cli-2`, `cli-3`, ... not taken by a configured instance.
fn cli_instance_id(settings: &Settings) -> String {
    let taken = |candidate: &str| settings.instances.iter().any(|d| d.id.as_str() == candidate);
    if !taken(CLI_INSTANCE_ID) {
        return CLI_INSTANCE_ID.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", CLI_INSTANCE_ID, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| CLI_INSTANCE_ID.to_string())
}

/// Single fetch, printed as pretty JSON.
async fn fetch_once(descriptor: &InstanceDescriptor, settings: &Settings) -> Result<()> {
    let source = source::for_descriptor(descriptor, settings.request_timeout())?;

    let snapshot = tokio::time::timeout(settings.request_timeout(), source.fetch())
        .await
        .map_err(|_| statuswatch::FetchError::Timeout)
        .and_then(|result| result)
        .with_context(|| format!("Failed to fetch status from {}", source.description()))?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Poll until Ctrl-C, printing a summary line for every new snapshot.
async fn watch(descriptor: InstanceDescriptor, settings: Settings) -> Result<()> {
    let mut registry = Registry::new(&settings);
    if !descriptor.is_demo() && registry.descriptor(&descriptor.id).is_none() {
        registry.add_instance(descriptor.clone())?;
    }

    let id: InstanceId = descriptor.id.clone();
    let handle = registry.select_instance(&id)?;
    info!(
        "Watching {} every {} (Ctrl-C to stop)",
        descriptor.display_name(),
        registry.interval(&id)
    );

    let mut last_seen = None;
    let mut last_phase = Phase::Idle;
    let mut ticker = tokio::time::interval(WATCH_POLL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                report(&handle, &mut last_seen, &mut last_phase);
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    registry.shutdown();
    Ok(())
}

/// Print a line when a new snapshot arrives or an error is surfaced.
fn report(handle: &InstanceHandle, last_seen: &mut Option<u64>, last_phase: &mut Phase) {
    let phase = handle.phase();
    if phase == Phase::Error && *last_phase != Phase::Error {
        if let Some(failure) = handle.error() {
            eprintln!("{}: {} ({})", handle.id(), failure.message, failure.category);
        }
    }
    *last_phase = phase;

    let line = handle.with_history(|history| {
        let current = history.current()?;
        if *last_seen == Some(current.captured_at_ms) {
            return None;
        }
        *last_seen = Some(current.captured_at_ms);

        let rx = history.throughput(2, |s| s.network.as_ref()?.rx);
        let tx = history.throughput(2, |s| s.network.as_ref()?.tx);
        Some(summary_line(
            current,
            rx.last().copied().unwrap_or(0.0),
            tx.last().copied().unwrap_or(0.0),
        ))
    });

    if let Some(line) = line {
        println!("{}", line);
    }
}

fn summary_line(snapshot: &StatusSnapshot, rx_kilo: f64, tx_kilo: f64) -> String {
    let percent = |v: Option<f64>| v.map_or("-".to_string(), |p| format!("{:.1}%", p));

    let host = snapshot.host.as_ref();
    let hostname = host.and_then(|h| h.hostname.as_deref()).unwrap_or("?");
    let uptime = host
        .and_then(|h| h.uptime)
        .map_or("-".to_string(), format_uptime);

    let cpu = percent(snapshot.cpu.as_ref().and_then(|c| c.utilisation_percent()));
    let memory = snapshot.memory.as_ref();
    let mem = percent(memory.and_then(|m| m.used_fraction()).map(|f| f * 100.0));
    let mem_total = memory
        .and_then(|m| m.total)
        .map_or("-".to_string(), format_bytes);

    format!(
        "[{}] cpu {} | mem {} of {} | rx {:.1}k tx {:.1}k | up {}",
        hostname, cpu, mem, mem_total, rx_kilo, tx_kilo, uptime
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use statuswatch_types::{Host, Memory};

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("statuswatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_url_takes_precedence() {
        let args = parse(&["--url", "http://nas:9100", "--username", "admin", "--password", "pw"]);
        let target = target_instance(&args, &Settings::default()).unwrap();
        assert_eq!(target.id.as_str(), CLI_INSTANCE_ID);
        assert_eq!(target.url, "http://nas:9100");
        assert_eq!(target.username.as_deref(), Some("admin"));
    }

    #[test]
    fn test_url_instance_avoids_configured_ids() {
        let settings = Settings {
            instances: vec![
                InstanceDescriptor::new("cli", "http://other"),
                InstanceDescriptor::new("nas", "http://nas"),
            ],
            ..Settings::default()
        };
        let args = parse(&["--url", "http://nas:9100"]);
        let target = target_instance(&args, &settings).unwrap();
        assert_eq!(target.id.as_str(), "cli-2");
        assert_eq!(target.url, "http://nas:9100");

        let mut registry = Registry::new(&settings);
        registry.add_instance(target).unwrap();
        assert_eq!(
            registry.descriptor(&InstanceId::from("cli")).unwrap().url,
            "http://other"
        );
    }

    #[test]
    fn test_url_conflicts_with_demo() {
        let result = Args::try_parse_from(["statuswatch", "--url", "http://nas", "--demo"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_selected_then_first_instance() {
        let mut settings = Settings {
            instances: vec![
                InstanceDescriptor::new("nas", "http://nas"),
                InstanceDescriptor::new("web", "http://web"),
            ],
            selected: Some(InstanceId::from("web")),
            ..Settings::default()
        };
        let args = parse(&[]);
        assert_eq!(target_instance(&args, &settings).unwrap().id.as_str(), "web");

        settings.selected = None;
        assert_eq!(target_instance(&args, &settings).unwrap().id.as_str(), "nas");
    }

    #[test]
    fn test_no_instance_is_an_error() {
        assert!(target_instance(&parse(&[]), &Settings::default()).is_err());

        let settings = Settings {
            demo_mode: true,
            ..Settings::default()
        };
        assert!(target_instance(&parse(&[]), &settings).unwrap().is_demo());
    }

    #[test]
    fn test_summary_line() {
        let snapshot = StatusSnapshot::builder()
            .memory(Memory {
                total: Some(16 * 1024 * 1024 * 1024),
                available: Some(4 * 1024 * 1024 * 1024),
                ..Default::default()
            })
            .host(Host {
                hostname: Some("nas".to_string()),
                uptime: Some(90_000.0),
                ..Default::default()
            })
            .build();

        let line = summary_line(&snapshot, 12.5, 0.0);
        assert_eq!(
            line,
            "[nas] cpu - | mem 75.0% of 16.00 GiB | rx 12.5k tx 0.0k | up 1d 1h 0m"
        );
    }
}
