//! Command-line argument parsing

use clap::Parser;
use parlor_common::DEFAULT_PORT;
use std::net::IpAddr;
use std::path::PathBuf;

/// Parlor chat server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// IP address to bind to (IPv4 or IPv6)
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Message archive database path (omit to run without an archive)
    #[arg(short, long)]
    pub archive: Option<PathBuf>,

    /// Enable debug logging (shows connect/disconnect and frame errors)
    #[arg(long, default_value = "false")]
    pub debug: bool,
}
