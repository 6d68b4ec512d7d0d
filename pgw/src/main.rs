//! main - starts a PDN gateway with the APNs from a file

use anyhow::{Result, ensure};
use async_std::channel::Sender;
use async_std::prelude::*;
use clap::Parser;
use pgw::{Config, DpTeid, ForwardingSink, Packet, Pgw};
use signal_hook::consts::signal::*;
use signal_hook_async_std::Signals;
use slog::{Drain, Logger, debug, o};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file listing the APNs and their gateway addresses, one `[apn-<name>]` table per APN.
    #[arg(long, default_value = "apns.toml")]
    apns_file: String,

    /// First octet of allocated UE IP addresses.  UEs get random addresses
    /// <prefix>.x.y.z with x, y and z in 1-254.
    #[arg(long, default_value_t = 10)]
    ue_subnet_prefix: u8,

    /// Interval in seconds between userplane stats logs.
    #[arg(long, default_value_t = 5)]
    stats_interval: u64,
}

/// Stand-in transport that logs forwarded packets.
struct LoggingSink(Logger);

impl ForwardingSink for LoggingSink {
    fn forward_packet_to_apn(&self, apn_gw: Ipv4Addr, packet: Packet) {
        debug!(self.0, "UL {} bytes -> APN gateway {apn_gw}", packet.len());
    }

    fn forward_packet_to_sgw(&self, sgw_addr: Ipv4Addr, sgw_dp_teid: DpTeid, packet: Packet) {
        debug!(
            self.0,
            "DL {} bytes -> SGW {sgw_addr} TEID {sgw_dp_teid}",
            packet.len()
        );
    }
}

#[async_std::main]
async fn main() -> Result<()> {
    exit_on_panic();
    let logger = init_logging();

    let args = Args::parse();
    check_ue_subnet_prefix(args.ue_subnet_prefix)?;
    ensure!(args.stats_interval > 0, "Stats interval must be non-zero");

    let apns = pgw::apns::load_apns_file(&args.apns_file, &logger)?;
    ensure!(!apns.is_empty(), "No APNs in {}", args.apns_file);

    let sink = Arc::new(LoggingSink(logger.new(o!("component" => "sink"))));
    let pgw = Pgw::start(
        Config {
            ue_subnet_prefix: args.ue_subnet_prefix,
            stats_interval: Duration::from_secs(args.stats_interval),
        },
        logger,
        &apns,
        sink,
    );

    wait_for_signal().await?;
    pgw.graceful_shutdown().await;

    Ok(())
}

fn init_logging() -> Logger {
    // Use info level logging by default
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info") }
    }
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}

fn check_ue_subnet_prefix(prefix: u8) -> Result<()> {
    ensure!(prefix != 0, "UE subnet prefix 0 not allowed");
    ensure!(prefix != 127, "UE subnet prefix 127 is the loopback network");
    ensure!(
        prefix < 224,
        "UE subnet prefix {prefix} is in the multicast / reserved range"
    );
    Ok(())
}

async fn wait_for_signal() -> Result<i32> {
    let signals = Signals::new([SIGTERM, SIGINT, SIGQUIT])?;
    let handle = signals.handle();
    let (sig_sender, sig_receiver) = async_std::channel::unbounded();
    let signals_task = async_std::task::spawn(handle_signals(signals, sig_sender));
    let signal = sig_receiver.recv().await;
    handle.close();
    signals_task.await;
    Ok(signal?)
}

async fn handle_signals(signals: Signals, sig_sender: Sender<i32>) {
    let mut signals = signals.fuse();
    while let Some(signal) = signals.next().await {
        let _ = sig_sender.send(signal).await;
    }
}
