//! Lightweight Solana JSON-RPC client
//!
//! Implements only the read-side methods the suite needs to check ledger
//! state between steps. Transaction building stays with the collaborator
//! scripts.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, trace};

use crate::common::config::{Commitment, LedgerConfig};
use crate::common::{Error, Result};

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// `{ context, value }` wrapper used by account queries
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

/// The parts of an account the suite looks at
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AccountSummary {
    pub lamports: u64,
    pub owner: String,
    pub executable: bool,
    #[serde(default)]
    pub space: Option<u64>,
}

/// Async client for a single RPC endpoint
#[derive(Debug, Clone)]
pub struct LedgerClient {
    url: String,
    commitment: Commitment,
    http: reqwest::Client,
}

impl LedgerClient {
    pub fn new(config: &LedgerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("onesol-suite")
            .build()?;
        Ok(Self {
            url: config.rpc_url.clone(),
            commitment: config.commitment,
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    /// Send a JSON-RPC request and decode its `result`
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        trace!(method, url = %self.url, "RPC request");

        let response = self.http.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "{} returned HTTP {}",
                self.url,
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let envelope: RpcResponse<T> = serde_json::from_slice(&bytes)?;
        if let Some(err) = envelope.error {
            debug!(method, code = err.code, message = %err.message, "RPC error");
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        match envelope.result {
            Some(result) => Ok(result),
            // `result: null` is a valid answer for some methods
            None => serde_json::from_value(Value::Null).map_err(|_| {
                Error::Transport(format!("'{}' response has no result", method))
            }),
        }
    }

    /// `getHealth`; the node answers `"ok"` when it is caught up
    pub async fn get_health(&self) -> Result<String> {
        self.call("getHealth", json!([])).await
    }

    pub async fn get_slot(&self) -> Result<u64> {
        self.call(
            "getSlot",
            json!([{ "commitment": self.commitment.as_str() }]),
        )
        .await
    }

    /// Fetch an account, `None` when it does not exist at this commitment
    pub async fn get_account_info(&self, pubkey: &str) -> Result<Option<AccountSummary>> {
        let response: WithContext<Option<AccountSummary>> = self
            .call(
                "getAccountInfo",
                json!([pubkey, {
                    "encoding": "base64",
                    "commitment": self.commitment.as_str(),
                }]),
            )
            .await?;
        Ok(response.value)
    }

    /// Poll until `pubkey` exists, or fail once `deadline` elapses
    ///
    /// The deadline also bounds an in-flight request.
    pub async fn wait_for_account(
        &self,
        pubkey: &str,
        deadline: Duration,
        poll_interval: Duration,
    ) -> Result<AccountSummary> {
        let start = Instant::now();
        match timeout(deadline, self.poll_account(pubkey, poll_interval)).await {
            Ok(Ok(account)) => {
                debug!(
                    pubkey,
                    owner = %account.owner,
                    waited_ms = start.elapsed().as_millis() as u64,
                    "Account found"
                );
                Ok(account)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::AccountTimeout {
                pubkey: pubkey.to_string(),
                waited: deadline,
            }),
        }
    }

    async fn poll_account(&self, pubkey: &str, poll_interval: Duration) -> Result<AccountSummary> {
        loop {
            if let Some(account) = self.get_account_info(pubkey).await? {
                return Ok(account);
            }
            sleep(poll_interval).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve canned JSON-RPC bodies, one per connection, in order
    pub(crate) async fn serve(bodies: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for body in bodies {
                let (mut socket, _) = listener.accept().await.unwrap();
                read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });
        format!("http://{}", addr)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    pub(crate) fn client_for(url: String) -> LedgerClient {
        LedgerClient::new(&LedgerConfig {
            rpc_url: url,
            commitment: Commitment::Confirmed,
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_health_ok() {
        let url = serve(vec![r#"{"jsonrpc":"2.0","result":"ok","id":1}"#.to_string()]).await;
        let client = client_for(url);
        assert_eq!(client.get_health().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_rpc_error_is_mapped() {
        let url = serve(vec![
            r#"{"jsonrpc":"2.0","error":{"code":-32005,"message":"Node is behind by 42 slots"},"id":1}"#
                .to_string(),
        ])
        .await;
        let client = client_for(url);
        match client.get_health().await.unwrap_err() {
            Error::Rpc { code, message } => {
                assert_eq!(code, -32005);
                assert_eq!(message, "Node is behind by 42 slots");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_account_is_none() {
        let url = serve(vec![
            r#"{"jsonrpc":"2.0","result":{"context":{"slot":7},"value":null},"id":1}"#.to_string(),
        ])
        .await;
        let client = client_for(url);
        assert_eq!(client.get_account_info("Pool111").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wait_for_account_polls_until_present() {
        let url = serve(vec![
            r#"{"jsonrpc":"2.0","result":{"context":{"slot":7},"value":null},"id":1}"#.to_string(),
            r#"{"jsonrpc":"2.0","result":{"context":{"slot":8},"value":{"lamports":1461600,"owner":"SwaP1111","executable":false,"rentEpoch":0,"data":["","base64"],"space":82}},"id":1}"#
                .to_string(),
        ])
        .await;
        let client = client_for(url);
        let account = client
            .wait_for_account("Pool111", Duration::from_secs(5), Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(account.owner, "SwaP1111");
        assert_eq!(account.space, Some(82));
    }

    #[tokio::test]
    async fn test_wait_for_account_deadline_bounds_slow_request() {
        // Accepts connections but never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = client_for(format!("http://{}", listener.local_addr().unwrap()));

        let start = std::time::Instant::now();
        let err = client
            .wait_for_account("Pool111", Duration::from_millis(300), Duration::from_millis(10))
            .await
            .unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(
            err.to_string(),
            "Account Pool111 did not appear within 300ms"
        );
        drop(listener);
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let url = serve(vec!["<html>bad gateway</html>".to_string()]).await;
        let client = client_for(url);
        assert!(matches!(client.get_health().await.unwrap_err(), Error::Json(_)));
    }

    #[tokio::test]
    async fn test_transport_error_when_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(format!("http://{}", addr));
        assert!(matches!(
            client.get_health().await.unwrap_err(),
            Error::Transport(_)
        ));
    }
}
