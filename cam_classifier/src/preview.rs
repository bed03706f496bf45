//! Live view of the annotated frames as MJPEG stream over HTTP.
//!
use std::{
    net::{SocketAddr, TcpListener},
    sync::Arc,
};

use anyhow::{Context, Result};
use axum::{
    body::StreamBody,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Extension, Router,
};
use bytes::Bytes;
use futures::StreamExt;
use image::RgbImage;
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_stream::wrappers::BroadcastStream;

/// Frames buffered per viewer before it starts dropping frames.
const CHANNEL_CAPACITY: usize = 4;

const JPEG_QUALITY: i32 = 80;

const PREVIEW_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Detección de Objeto</title></head>
<body>
    <h3>Detección de Objeto</h3>
    <img src="./stream" width="100%">
</body>
</html>
"#;

/// Fans out annotated frames to connected viewers.
pub struct PreviewPublisher {
    tx: broadcast::Sender<Bytes>,
}

impl PreviewPublisher {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Compress and send a frame to all viewers. Without viewers, nothing is done.
    pub fn publish(&self, frame: &RgbImage) -> Result<()> {
        if self.tx.receiver_count() == 0 {
            return Ok(());
        }

        let buf = turbojpeg::compress_image(frame, JPEG_QUALITY, turbojpeg::Subsamp::Sub2x2)?;
        if self.tx.send(as_jpeg_stream_item(&buf)).is_err() {
            log::debug!("Preview viewer left");
        }

        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Bytes> {
        self.tx.subscribe()
    }
}

impl Default for PreviewPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap JPEG data as one part of a `multipart/x-mixed-replace` body.
pub fn as_jpeg_stream_item(data: &[u8]) -> Bytes {
    Bytes::copy_from_slice(
        &[
            "--frame\r\nContent-Type: image/jpeg\r\n\r\n".as_bytes(),
            data,
            "\r\n\r\n".as_bytes(),
        ]
        .concat(),
    )
}

/// Health check endpoint.
pub async fn healthcheck() -> &'static str {
    "healthy"
}

pub async fn preview_page() -> Html<&'static str> {
    Html(PREVIEW_HTML)
}

/// Endpoint of the annotated image stream.
pub async fn preview_stream(
    Extension(publisher): Extension<Arc<PreviewPublisher>>,
) -> impl IntoResponse {
    log::info!("Preview stream requested");

    // Viewers that fall behind skip frames instead of ending the stream
    let stream = BroadcastStream::new(publisher.subscribe())
        .filter_map(|item| async move { item.ok().map(Ok::<_, std::io::Error>) });

    // Set body and headers for multipart streaming
    let body = StreamBody::new(stream);
    let headers = [(
        header::CONTENT_TYPE,
        "multipart/x-mixed-replace; boundary=frame",
    )];

    (headers, body)
}

pub fn build_preview_app(publisher: Arc<PreviewPublisher>) -> Router {
    Router::new()
        .route("/", get(preview_page))
        .route("/stream", get(preview_stream))
        .route("/healthcheck", get(healthcheck))
        .layer(Extension(publisher))
}

/// Bind the preview server and serve it on a separate task.
pub async fn spawn_preview_server(
    publisher: Arc<PreviewPublisher>,
    addr: &str,
) -> Result<JoinHandle<Result<()>>> {
    let socket: SocketAddr = addr.parse()?;
    let listener =
        TcpListener::bind(socket).with_context(|| format!("failed to bind preview {socket}"))?;
    listener.set_nonblocking(true)?;
    log::info!("Preview available at http://{}/", listener.local_addr()?);

    let server =
        axum::Server::from_tcp(listener)?.serve(build_preview_app(publisher).into_make_service());

    Ok(tokio::spawn(async move {
        server.await?;
        Ok(())
    }))
}
