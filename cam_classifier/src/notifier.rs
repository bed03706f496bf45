//! HTTP notifications to the notification server.
//!
use anyhow::Result;
use common::protocol::{DetectionMsg, DEFAULT_SERVER_PORT, UPLOAD_PATH};
use reqwest::{Client, StatusCode};

/// Posts detection events to the upload endpoint of the server.
pub struct Notifier {
    client: Client,
    url: String,
}

impl Notifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one detection. Only transport failures are errors, any HTTP status is returned.
    pub async fn notify(&self, msg: &DetectionMsg) -> Result<StatusCode> {
        log::debug!("Posting {:?} to {}", msg.message, &self.url);
        let resp = self.client.post(&self.url).json(msg).send().await?;

        Ok(resp.status())
    }
}

/// Upload URL of a server running on this machine with default settings.
pub fn default_upload_url() -> String {
    format!("http://localhost:{DEFAULT_SERVER_PORT}{UPLOAD_PATH}")
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(default_upload_url())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_url() {
        assert_eq!(Notifier::default().url(), "http://localhost:5000/upload");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        // Bind and drop to get a port nobody listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .unwrap()
            .port();

        let notifier = Notifier::new(format!("http://127.0.0.1:{port}/upload"));
        let result = notifier.notify(&DetectionMsg::for_label("Vaca")).await;
        assert!(result.is_err());
    }
}
