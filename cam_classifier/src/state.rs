//! Duplicate suppression for detection notifications.
//!
use common::protocol::DetectionMsg;

/// Last class that reached the server, threaded through the capture loop.
#[derive(Debug, Default)]
pub struct PredictionState {
    previous: Option<String>,
}

impl PredictionState {
    /// Notification to send for `label`, if it differs from the last one sent.
    pub fn pending(&self, label: &str) -> Option<DetectionMsg> {
        match self.previous.as_deref() {
            Some(previous) if previous == label => None,
            _ => Some(DetectionMsg::for_label(label)),
        }
    }

    /// Record `label` as delivered to the server.
    pub fn mark_sent(&mut self, label: &str) {
        self.previous = Some(label.to_owned());
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_only_changes_are_notified() {
        let mut state = PredictionState::default();
        let mut sent = Vec::new();

        for label in ["Vaca", "Vaca", "Gallina", "Gallina", "Gallina", "Vaca"] {
            if let Some(msg) = state.pending(label) {
                sent.push(msg.message);
                state.mark_sent(label);
            }
        }

        assert_eq!(
            sent,
            vec!["Se detectó: Vaca", "Se detectó: Gallina", "Se detectó: Vaca"]
        );
    }

    #[test]
    fn test_unsent_label_stays_pending() {
        let mut state = PredictionState::default();
        state.mark_sent("Vaca");

        assert!(state.pending("Caballo").is_some());
        // Delivery failed, so the same class is still a change next frame
        assert!(state.pending("Caballo").is_some());
        assert_eq!(state.previous(), Some("Vaca"));
    }
}
