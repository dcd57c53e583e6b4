//! Bind a few paths on an in-memory fabric and print the pipe trees
//!
//! Run with: cargo run --example fabric_status [STORE_FILE] [CONTROL_IP]
//!
//! Examples:
//!   cargo run --example fabric_status                          # paths.json, 127.0.0.1
//!   cargo run --example fabric_status /tmp/paths.json          # custom store file
//!   cargo run --example fabric_status /tmp/paths.json 10.0.0.5 # custom control address
//!
//! Settings are persisted to STORE_FILE, so a second run restores the
//! bindings of the first before applying its own.

use std::net::IpAddr;
use std::sync::Arc;

use fabric_ctl::{
    FabricConfig, JsonFileStore, Params, PathRegistry, RegistryConfig, SimWorker, WorkerRegistry,
};

fn print_usage() {
    eprintln!("Usage: fabric_status [STORE_FILE] [CONTROL_IP]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  STORE_FILE   Path settings file (default: paths.json)");
    eprintln!("  CONTROL_IP   Address handed to push workers (default: 127.0.0.1)");
}

fn workers() -> WorkerRegistry {
    WorkerRegistry::new()
        .with_worker(Arc::new(SimWorker::decoder(1, "dec_1_0")))
        .with_worker(Arc::new(SimWorker::decoder(2, "dec_2_0")))
        .with_worker(Arc::new(SimWorker::decoder(3, "dec_3_0")))
        .with_worker(Arc::new(SimWorker::encoder(10, "enc_10_0")))
        .with_worker(Arc::new(SimWorker::encoder(254, "rtsp_254_0")))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let store_file = args.get(1).cloned().unwrap_or_else(|| "paths.json".into());
    let ip: IpAddr = match args.get(2) {
        Some(ip) => ip.parse()?,
        None => "127.0.0.1".parse()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fabric_ctl=debug".parse()?)
                .add_directive("fabric_status=debug".parse()?),
        )
        .init();

    let config = RegistryConfig::default().fabric(FabricConfig::with_ip(ip).prefix(100));
    let store = Arc::new(JsonFileStore::new(&store_file));
    let registry = PathRegistry::open(workers(), store, config).await?;

    println!("Workers: {}", registry.get_workers().await.join(", "));
    println!();

    // Encoder on path 0, decoders 1 and 2 on paths 1 and 2, decoder 3 fed by RTSP
    let requests = [
        (0, Params::new("enc_10_0", true)),
        (1, Params::new("dec_1_0", true)),
        (2, Params::new("dec_2_0", false)),
        (3, Params::new("dec_3_0", true).rtsp_in(true)),
        // Rejected: dec_1_0 is already on path 1
        (4, Params::new("dec_1_0", true)),
    ];

    for (id, params) in requests {
        let name = params.worker_name.clone();
        match registry.set(id, params).await {
            Ok(()) => println!("path {} -> {}", id, name),
            Err(e) => println!("path {} -> {} rejected: {}", id, name, e),
        }
    }

    println!();
    registry.get_pipe_info(&mut std::io::stdout()).await?;

    Ok(())
}
