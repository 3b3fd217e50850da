//! Fire-and-forget lead forwarding.
//!
//! Submitted leads are POSTed to the owning representative's webhook URL as a
//! URL-encoded form. Delivery is considered successful once the request is
//! dispatched without a network-level failure; the response body and status
//! are not interpreted, so a misconfigured webhook never blocks the caller's
//! confirmation flow.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::remote::RemoteError;

/// A contact-form lead destined for one representative.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub zip: String,
    /// Display name of the representative the lead was routed to.
    pub rep: String,
}

#[derive(Debug, Clone)]
pub struct LeadForwarder {
    client: reqwest::Client,
}

impl LeadForwarder {
    pub fn new(config: &SyncConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }

    /// Forward one lead. Returns `Err` only when the request could not be
    /// dispatched at all.
    pub async fn forward(&self, webhook_url: &str, lead: &Lead) -> Result<(), RemoteError> {
        let response = self.client.post(webhook_url).form(lead).send().await?;
        // Status is logged but deliberately not acted on.
        if response.status().is_success() {
            info!(webhook = webhook_url, rep = %lead.rep, "Lead forwarded");
        } else {
            warn!(
                webhook = webhook_url,
                status = response.status().as_u16(),
                "Lead webhook answered with a non-success status"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_serializes_with_camel_case_form_keys() {
        let lead = Lead {
            first_name: "Jamie".into(),
            last_name: "Soto".into(),
            email: "jamie@example.com".into(),
            zip: "97201".into(),
            rep: "Morgan Vale".into(),
        };
        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(value["firstName"], "Jamie");
        assert_eq!(value["lastName"], "Soto");
        assert_eq!(value["zip"], "97201");
        assert_eq!(value["rep"], "Morgan Vale");
    }

    #[tokio::test]
    async fn unreachable_webhook_is_a_transport_error() {
        let forwarder = LeadForwarder::new(&SyncConfig::new(
            "http://localhost:9",
            "/tmp/repatlas-lead-tests",
        ));
        let lead = Lead {
            first_name: "Jamie".into(),
            last_name: "Soto".into(),
            email: "jamie@example.com".into(),
            zip: "97201".into(),
            rep: "Morgan Vale".into(),
        };
        let result = forwarder.forward("http://127.0.0.1:9/hook", &lead).await;
        assert!(matches!(result, Err(RemoteError::Transport(_))));
    }
}
