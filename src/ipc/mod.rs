pub mod socket_client;
pub mod socket_server;

use serde::{Deserialize, Serialize};

use crate::proxy::{ChatExchange, ChatProxy, HealthStatus};

/// Upper bound on one request line, newline included.
pub const MAX_REQUEST_BYTES: usize = 1_048_576;

/// Upper bound on one response line, newline included. An exchange carries the
/// query up to three times, so this leaves room beyond a maximal request. The
/// server replaces anything larger with an error response.
pub const MAX_RESPONSE_BYTES: usize = 8 * MAX_REQUEST_BYTES;

/// Request sent to the proxy service over its Unix socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProxyRequest {
    Query { user_query: String },
    Health,
}

/// Response from the proxy service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProxyResponse {
    Exchange(ChatExchange),
    Health(HealthStatus),
    Error { message: String },
}

/// Answer one request with the given proxy. Failures become
/// `ProxyResponse::Error`; the caller never receives partially masked text.
pub async fn handle_request(proxy: &ChatProxy, request: ProxyRequest) -> ProxyResponse {
    match request {
        ProxyRequest::Health => ProxyResponse::Health(proxy.health()),
        ProxyRequest::Query { user_query } => match proxy.query(&user_query).await {
            Ok(exchange) => ProxyResponse::Exchange(exchange),
            Err(e) => {
                tracing::warn!(error = %e, "query failed");
                ProxyResponse::Error {
                    message: e.to_string(),
                }
            }
        },
    }
}
