//! Capture, classify, annotate and notify loop.
//!
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{anyhow, Result};

use crate::{
    labels::ClassLabels,
    nn::{argmax, Classifier},
    notifier::Notifier,
    overlay::annotate,
    preview::PreviewPublisher,
    sensors::FrameSource,
    state::PredictionState,
};

/// Outcome of a single loop iteration.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    SourceEnded,
}

pub struct Detector<S, C> {
    source: S,
    classifier: C,
    labels: ClassLabels,
    notifier: Notifier,
    preview: Option<Arc<PreviewPublisher>>,
}

impl<S: FrameSource, C: Classifier> Detector<S, C> {
    pub fn new(source: S, classifier: C, labels: ClassLabels, notifier: Notifier) -> Self {
        Self {
            source,
            classifier,
            labels,
            notifier,
            preview: None,
        }
    }

    /// Also publish every annotated frame for live viewing.
    pub fn with_preview(mut self, preview: Arc<PreviewPublisher>) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Run until the frame source ends or `quit` is raised and return the final state.
    pub async fn run(&mut self, quit: &AtomicBool) -> Result<PredictionState> {
        let mut state = PredictionState::default();

        while !quit.load(Ordering::Relaxed) {
            if self.step(&mut state).await? == Step::SourceEnded {
                log::info!("Frame source ended");
                break;
            }
        }

        Ok(state)
    }

    /// Process one frame.
    ///
    /// A failed notification is logged and leaves `state` untouched. Classification errors
    /// are returned.
    pub async fn step(&mut self, state: &mut PredictionState) -> Result<Step> {
        let mut frame = match self.source.capture() {
            Some(frame) => frame,
            None => return Ok(Step::SourceEnded),
        };

        let scores = self.classifier.predict(&frame)?;
        let idx = argmax(&scores).ok_or_else(|| anyhow!("model returned no class scores"))?;
        let label = self.labels.get(idx).ok_or_else(|| {
            anyhow!(
                "predicted class {} but only {} labels are known",
                idx,
                self.labels.len()
            )
        })?;
        log::debug!("Predicted {} ({:?})", label, scores);

        annotate(&mut frame, label);

        if let Some(msg) = state.pending(label) {
            match self.notifier.notify(&msg).await {
                Ok(status) => {
                    if !status.is_success() {
                        log::warn!("Server answered {} to {:?}", status, msg.message);
                    }
                    log::info!("Notified {:?}", msg.message);
                    state.mark_sent(label);
                }
                Err(e) => log::error!("Error sending notification: {:#}", e),
            }
        }

        if let Some(preview) = &self.preview {
            if let Err(e) = preview.publish(&frame) {
                log::warn!("Failed to publish preview frame: {:#}", e);
            }
        }

        Ok(Step::Continue)
    }
}
