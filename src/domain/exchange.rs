//! The input document written into a staged directory before the message
//! target runs (`exchange_config.json`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::endpoint::Endpoint;

/// Which direction the exchange runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeAction {
    Send,
    Receive,
}

/// Endpoint identity fields the protocol handler may need to reach the
/// device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointIdentity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// The operation-specific block: what to do and, when sending, the key
/// material needed to do it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeDirectives {
    pub action: ExchangeAction,
    /// When receiving, the request id the caller is listening for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_for_id: Option<Uuid>,
    /// Only present when sending; protocol handlers never see it on a
    /// receive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_private_key: Option<String>,
}

/// The full input document. The agent and protocol sections come straight
/// from the endpoint's stored configuration and are not interpreted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub agent_config: serde_json::Value,
    pub protocol_config: serde_json::Value,
    /// Prior protocol state, or null on the first exchange.
    #[serde(default)]
    pub protocol_state: Option<serde_json::Value>,
    pub endpoint: EndpointIdentity,
    pub exchange: ExchangeDirectives,
}

impl ExchangeConfig {
    /// Compose the document for one exchange against `endpoint`.
    #[must_use]
    pub fn for_endpoint(
        endpoint: &Endpoint,
        action: ExchangeAction,
        listen_for_id: Option<Uuid>,
        server_private_key: Option<String>,
    ) -> Self {
        Self {
            agent_config: serde_json::to_value(&endpoint.config.agent_config)
                .unwrap_or(serde_json::Value::Null),
            protocol_config: endpoint.config.protocol_config.clone(),
            protocol_state: endpoint.protocol_state.clone(),
            endpoint: EndpointIdentity {
                name: endpoint.name.clone(),
                hostname: endpoint.hostname.clone(),
                address: endpoint.address.clone(),
            },
            exchange: ExchangeDirectives {
                action,
                listen_for_id,
                server_private_key: match action {
                    ExchangeAction::Send => server_private_key,
                    ExchangeAction::Receive => None,
                },
            },
        }
    }
}
