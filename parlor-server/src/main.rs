//! Parlor chat server daemon

use std::net::SocketAddr;

use clap::Parser;
use tokio::net::TcpListener;

use parlor_server::archive::Archive;
use parlor_server::args::Args;
use parlor_server::connection::ConnectionParams;
use parlor_server::rooms::Directory;
use parlor_server::users::Registry;
use parlor_server::websocket::handle_websocket_connection;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    println!("Parlor chat server v{}", env!("CARGO_PKG_VERSION"));

    // Optional fire-and-forget archive
    let archive = match args.archive {
        Some(ref path) => match Archive::open(path).await {
            Ok(archive) => {
                println!("Archiving to {}", path.display());
                Some(archive)
            }
            Err(e) => {
                eprintln!("Failed to open archive {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => None,
    };

    let bind_addr = SocketAddr::new(args.bind, args.port);
    let listener = match TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };
    println!("Listening on ws://{}", bind_addr);

    // The three core tables: connection registry (with derived presence),
    // room directory, and the per-session room index inside it.
    let registry = Registry::new();
    let rooms = Directory::new();

    let debug = args.debug;
    let shutdown_signal = setup_shutdown_signal();

    tokio::select! {
        _ = shutdown_signal => {
            println!("Shutdown signal received, exiting");
        }
        _ = async {
            loop {
                match listener.accept().await {
                    Ok((socket, peer_addr)) => {
                        if debug {
                            eprintln!("Connection from {}", peer_addr);
                        }

                        let params = ConnectionParams {
                            peer_addr,
                            registry: registry.clone(),
                            rooms: rooms.clone(),
                            archive: archive.clone(),
                            debug,
                        };

                        tokio::spawn(async move {
                            if let Err(e) = handle_websocket_connection(socket, params).await {
                                // Handshake failures from port scanners are
                                // routine; only surface them in debug mode
                                if debug {
                                    eprintln!("Connection error from {}: {}", peer_addr, e);
                                }
                            }
                        });
                    }
                    Err(e) => {
                        eprintln!("Accept failed: {}", e);
                    }
                }
            }
        } => {}
    }
}

/// Wait for ctrl-c
async fn setup_shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Failed to install shutdown handler: {}", e);
    }
}
