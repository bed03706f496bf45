//! Notification server binary.
//!
use std::{
    net::{SocketAddr, TcpListener},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::TimestampPrecision;
use notify_server::{app::serve, pubsub::EventPubSub};

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Address to serve the dashboard, upload and event endpoints on
    #[clap(long, default_value = "0.0.0.0:5000")]
    address: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logger
    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    // Fan-out between the upload endpoint and connected event streams
    let pubsub = Arc::new(EventPubSub::new());

    let addr: SocketAddr = args.address.parse()?;
    let listener = TcpListener::bind(addr).with_context(|| format!("failed to bind {addr}"))?;

    serve(listener, pubsub).await
}
