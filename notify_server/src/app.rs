//! Router assembly and serving.
//!
use std::{net::TcpListener, sync::Arc};

use anyhow::Result;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use common::protocol::UPLOAD_PATH;

use crate::{
    endpoints::{events, healthcheck, index, upload},
    pubsub::EventPubSub,
};

/// Build the HTTP router around a shared Pub/Sub-Engine.
pub fn build_app(pubsub: Arc<EventPubSub>) -> Router {
    Router::new()
        .route("/", get(index))
        .route(UPLOAD_PATH, post(upload))
        .route("/events", get(events))
        .route("/healthcheck", get(healthcheck))
        .layer(Extension(pubsub))
}

/// Serve the router on an already bound listener until the process ends.
pub async fn serve(listener: TcpListener, pubsub: Arc<EventPubSub>) -> Result<()> {
    log::info!("Notification server listening on {}", listener.local_addr()?);
    listener.set_nonblocking(true)?;

    axum::Server::from_tcp(listener)?
        .serve(build_app(pubsub).into_make_service())
        .await?;

    Ok(())
}
