//! Camera classifier binary.
//!
use std::sync::Arc;

use anyhow::Result;
use cam_classifier::{
    detector::Detector,
    keys::spawn_quit_listener,
    labels::ClassLabels,
    nn::{OnnxClassifier, TensorLayout, DEFAULT_INPUT_SIZE},
    notifier::{default_upload_url, Notifier},
    preview::{spawn_preview_server, PreviewPublisher},
    sensors::{parse_resolution, Webcam},
};
use clap::Parser;
use env_logger::TimestampPrecision;

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// Video device to capture from
    #[clap(long, default_value = "/dev/video0")]
    device: String,

    /// Capture resolution as WIDTHxHEIGHT, highest supported if omitted
    #[clap(long, value_parser = parse_resolution)]
    resolution: Option<(u32, u32)>,

    /// Capture frames per second, highest supported if omitted
    #[clap(long)]
    frame_rate: Option<u32>,

    /// ONNX image classifier
    #[clap(long, default_value = "model/model.onnx")]
    model: String,

    /// Class names, one per line in model output order (built-in farm animals if omitted)
    #[clap(long)]
    labels: Option<String>,

    /// Side length of the square model input
    #[clap(long, default_value_t = DEFAULT_INPUT_SIZE)]
    input_size: u32,

    /// Memory layout of the model input
    #[clap(long, value_enum, default_value = "nhwc")]
    layout: TensorLayout,

    /// Upload endpoint of the notification server
    #[clap(long, default_value_t = default_upload_url())]
    server_url: String,

    /// Address to serve the annotated live view on
    #[clap(long, default_value = "127.0.0.1:3001")]
    preview_address: String,

    /// Do not serve the annotated live view
    #[clap(long)]
    no_preview: bool,

    /// Line to enter on stdin to stop capturing
    #[clap(long, default_value = "q")]
    quit_key: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logger
    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let labels = match &args.labels {
        Some(path) => ClassLabels::from_file(path)?,
        None => ClassLabels::default(),
    };
    log::info!("Classifying into {} classes", labels.len());

    let classifier = OnnxClassifier::new(&args.model, args.input_size, args.layout)?;
    let notifier = Notifier::new(args.server_url.clone());
    log::info!("Sending notifications to {}", notifier.url());

    // Initialize webcam, released when the detector is dropped
    let webcam = Webcam::open(&args.device, args.resolution, args.frame_rate)?;
    let mut detector = Detector::new(webcam, classifier, labels, notifier);

    if !args.no_preview {
        let publisher = Arc::new(PreviewPublisher::new());
        spawn_preview_server(Arc::clone(&publisher), &args.preview_address).await?;
        detector = detector.with_preview(publisher);
    }

    let quit = spawn_quit_listener(args.quit_key.clone());
    log::info!("Enter '{}' to quit", &args.quit_key);

    let state = detector.run(&quit).await?;
    log::info!("Last notified class: {:?}", state.previous());

    drop(detector);

    Ok(())
}
