//! `topomap` command line tool

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use topomap_config::FileConfigStore;
use topomap_core::{
    grid_cell, merge_scan_with_arp, parse_arp_table, AnnotatedNode, CanvasSize, TopologyEngine,
};
use topomap_monitor::{Monitor, MonitorConfig, ReplaySource, SnapshotSource};
use tracing_subscriber::EnvFilter;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("Topology file (.json, .yaml); defaults to $TOPOMAP_CONFIG or topomap.json")
}

fn cli() -> Command {
    Command::new("topomap")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live topology of monitored hosts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("render")
                .about("Lay out the topology and print every node")
                .arg(config_arg())
                .arg(
                    Arg::new("snapshot")
                        .long("snapshot")
                        .value_parser(value_parser!(PathBuf))
                        .help("Apply the first snapshot from this file before rendering"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("cell")
                .about("Grid cell label for a position")
                .arg(Arg::new("x").required(true).allow_negative_numbers(true).value_parser(value_parser!(f64)))
                .arg(Arg::new("y").required(true).allow_negative_numbers(true).value_parser(value_parser!(f64))),
        )
        .subcommand(
            Command::new("watch")
                .about("Replay snapshots and print host status on every tick")
                .arg(config_arg())
                .arg(
                    Arg::new("snapshots")
                        .long("snapshots")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of recorded snapshots"),
                )
                .arg(
                    Arg::new("interval-ms")
                        .long("interval-ms")
                        .default_value("2000")
                        .value_parser(value_parser!(u64))
                        .help("Polling interval in milliseconds"),
                )
                .arg(
                    Arg::new("ticks")
                        .long("ticks")
                        .value_parser(value_parser!(u64))
                        .help("Stop after this many snapshots"),
                ),
        )
        .subcommand(
            Command::new("discover")
                .about("Add hosts from a scan result that are not configured yet")
                .arg(config_arg())
                .arg(
                    Arg::new("scan")
                        .long("scan")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File with one responding IP per line"),
                )
                .arg(
                    Arg::new("arp")
                        .long("arp")
                        .value_parser(value_parser!(PathBuf))
                        .help("ARP table listing used to attach MAC addresses"),
                ),
        )
        .subcommand(
            Command::new("toggle-snap")
                .about("Flip the snap-to-grid setting")
                .arg(config_arg()),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("render", args)) => render(args).await,
        Some(("cell", args)) => {
            let x = args.get_one::<f64>("x").copied().unwrap_or_default();
            let y = args.get_one::<f64>("y").copied().unwrap_or_default();
            println!("{}", grid_cell(x, y));
            Ok(())
        }
        Some(("watch", args)) => watch(args).await,
        Some(("discover", args)) => discover(args),
        Some(("toggle-snap", args)) => {
            let mut engine = open_engine(args)?;
            let snap = engine.toggle_snap();
            println!("snap to grid: {}", if snap { "on" } else { "off" });
            Ok(())
        }
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    }
}

fn open_engine(args: &ArgMatches) -> Result<TopologyEngine> {
    let explicit = args.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let store = FileConfigStore::open(explicit).context("opening topology file")?;
    let path = store.path().display().to_string();
    TopologyEngine::load(Box::new(store), CanvasSize::default()).with_context(|| format!("loading {path}"))
}

async fn render(args: &ArgMatches) -> Result<()> {
    let mut engine = open_engine(args)?;
    let now = Utc::now();
    if let Some(path) = args.get_one::<PathBuf>("snapshot") {
        let source = ReplaySource::from_file(path).with_context(|| format!("reading {}", path.display()))?;
        let nodes: Vec<_> = engine.store().iter().cloned().collect();
        let snapshot = source.fetch(&nodes).await?;
        engine.apply_snapshot(&snapshot, now);
    }

    let nodes = engine.render(now);
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
    } else {
        print_table(&nodes);
    }
    Ok(())
}

fn print_table(nodes: &[AnnotatedNode]) {
    println!(
        "{:<20} {:<16} {:>5} {:>7} {:>7} {:<5} {:<8} {:<10} {}",
        "NAME", "ADDRESS", "LEVEL", "X", "Y", "CELL", "STATE", "UPTIME", "PARENT"
    );
    for node in nodes {
        let parent = match (&node.active_parent_id, node.failover) {
            (Some(parent), true) => format!("{parent} (failover)"),
            (Some(parent), false) => parent.to_string(),
            (None, _) => "-".to_string(),
        };
        println!(
            "{:<20} {:<16} {:>5} {:>7.2} {:>7.2} {:<5} {:<8} {:<10} {}",
            node.name,
            node.address,
            node.level,
            node.x,
            node.y,
            node.grid_cell.to_string(),
            node.link_state.to_string(),
            node.uptime.as_deref().unwrap_or("-"),
            parent,
        );
    }
}

async fn watch(args: &ArgMatches) -> Result<()> {
    let mut engine = open_engine(args)?;
    let path = args
        .get_one::<PathBuf>("snapshots")
        .context("--snapshots is required")?;
    let interval = args.get_one::<u64>("interval-ms").copied().unwrap_or(2000);
    let ticks = args.get_one::<u64>("ticks").copied();

    let source = ReplaySource::from_file(path).with_context(|| format!("reading {}", path.display()))?;
    let nodes = engine.store().iter().cloned().collect();
    let config = MonitorConfig::default().with_interval(Duration::from_millis(interval));
    let mut monitor = Monitor::spawn(Arc::new(source), nodes, config);

    let mut seen = 0u64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = monitor.changed() => {
                let snapshot = next?;
                let now = Utc::now();
                engine.apply_snapshot(&snapshot, now);
                print_hosts(&engine, &snapshot.updated, now);
                seen += 1;
                if ticks.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
        }
    }

    let stats = monitor.stop().await;
    tracing::info!(fetched = stats.fetched, failed = stats.failed, "watch finished");
    Ok(())
}

fn print_hosts(engine: &TopologyEngine, updated: &str, now: chrono::DateTime<Utc>) {
    println!("-- {updated}");
    for host in engine.host_list(now) {
        println!(
            "{:<8} {:<20} {:<16} {}",
            host.link_state.to_string(),
            host.name,
            host.address,
            host.uptime.as_deref().unwrap_or("-"),
        );
    }
}

fn discover(args: &ArgMatches) -> Result<()> {
    let mut engine = open_engine(args)?;
    let scan_path = args.get_one::<PathBuf>("scan").context("--scan is required")?;
    let responding: Vec<String> = read_text(scan_path)?.lines().map(str::to_owned).collect();
    let arp = match args.get_one::<PathBuf>("arp") {
        Some(path) => parse_arp_table(&read_text(path)?),
        None => Vec::new(),
    };

    let candidates = merge_scan_with_arp(&responding, &arp);
    let added = engine.add_discovered(&candidates);
    for id in &added {
        if let Some(node) = engine.store().get(id) {
            println!("added {} ({})", node.name, id);
        }
    }
    println!("{} of {} responding hosts added", added.len(), candidates.len());
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
