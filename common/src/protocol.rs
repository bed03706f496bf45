//! Wire contract between the classifier, the notification server and browsers.
//!
use serde::{Deserialize, Serialize};

/// Name of the push event carrying a [`DetectionMsg`] to browser clients.
pub const OBJECT_DETECTED_EVENT: &str = "object_detected";

/// Path of the ingestion endpoint.
pub const UPLOAD_PATH: &str = "/upload";

/// Default port of the notification server.
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Plain-text body of an accepted upload.
pub const MSG_RECEIVED: &str = "Mensaje recibido";

/// Plain-text body of an upload without a message.
pub const MSG_MISSING: &str = "No se recibió ningún mensaje";

/// Detection event, sent as `{"message": "<text>"}`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DetectionMsg {
    pub message: String,
}

impl DetectionMsg {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Human-readable notification for a predicted class.
    pub fn for_label(label: &str) -> Self {
        Self::new(format!("Se detectó: {label}"))
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::Error;

    #[test]
    fn test_label_message_json() -> Result<(), Error> {
        let msg = DetectionMsg::for_label("Vaca");
        assert_eq!(msg.message, "Se detectó: Vaca");

        let serialized = serde_json::to_string(&msg)?;
        assert_eq!(serialized, r#"{"message":"Se detectó: Vaca"}"#);

        Ok(())
    }

    #[test]
    fn test_extra_fields_are_ignored() -> Result<(), Error> {
        let msg: DetectionMsg = serde_json::from_str(r#"{"message": "hola", "id": 3}"#)?;
        assert_eq!(msg, DetectionMsg::new("hola"));

        Ok(())
    }
}
