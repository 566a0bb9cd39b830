/**
 * Client Transport
 *
 * A participant publishes envelopes to the session's router and receives
 * the envelopes addressed to it. Publishing never retries: when the
 * transport is not connected the envelope is dropped and logged, and the
 * caller carries on. Document state recovers through the CRDT and the
 * periodic checkpoint; chat recovers through the archive.
 *
 * `HttpTransport` posts envelopes to the realtime endpoints and reads the
 * subscriber's Server-Sent Events stream in one background task, which
 * reconnects with exponential backoff and forwards decoded envelopes into
 * an mpsc channel. The reader never touches document state. Every
 * (re)connect starts with the peer's presence, which the session answers
 * with a document sync request.
 */
use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::client::endpoint::{endpoint, parse_base};
use crate::client::error::ClientError;
use crate::shared::{ClientConfig, Envelope};

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_millis(1000);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);
const INBOUND_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Sent,
    Dropped,
}

/// State of the inbound stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Retrying,
    Disconnected,
    Error(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Hand an envelope to the router; never retried
    async fn publish(&self, envelope: Envelope) -> PublishOutcome;
}

/// Incremental Server-Sent Events parser
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across chunks decode correctly. `data:` lines are joined
/// until a blank line ends the event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the envelopes completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Envelope> {
        self.buffer.extend_from_slice(chunk);
        let mut envelopes = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line.trim_end_matches(['\n', '\r']),
                Err(e) => {
                    tracing::warn!("[Transport] Invalid UTF-8 in SSE stream: {}", e);
                    continue;
                }
            };

            if line.is_empty() {
                if let Some(envelope) = self.dispatch() {
                    envelopes.push(envelope);
                }
                continue;
            }

            // comments carry keep-alives
            if line.starts_with(':') {
                continue;
            }

            if let Some(content) = line.strip_prefix("data:") {
                self.data.push(content.strip_prefix(' ').unwrap_or(content).to_string());
            }
        }

        envelopes
    }

    fn dispatch(&mut self) -> Option<Envelope> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();

        match serde_json::from_str::<Envelope>(&payload) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::warn!("[Transport] Failed to parse SSE data as envelope: {} | {}", e, payload);
                None
            }
        }
    }
}

/// Transport over the server's HTTP realtime endpoints
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: reqwest::Url,
    connected: Arc<AtomicBool>,
    status: watch::Receiver<ConnectionStatus>,
    reader: JoinHandle<()>,
}

impl HttpTransport {
    /// Start the subscription reader; returns the transport and the inbound envelopes
    pub fn connect(
        config: &ClientConfig,
        session_id: &str,
        user_id: &str,
    ) -> Result<(Self, mpsc::Receiver<Envelope>), ClientError> {
        let client = reqwest::Client::new();
        let base_url = parse_base(config.base_url())?;
        let url = endpoint(&base_url, &["realtime", session_id, user_id])?;
        let connected = Arc::new(AtomicBool::new(false));
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);

        let reader = tokio::spawn(read_subscription(
            client.clone(),
            url,
            connected.clone(),
            status_tx,
            inbound_tx,
        ));

        let transport = Self {
            client,
            base_url,
            connected,
            status: status_rx,
            reader,
        };
        Ok((transport, inbound_rx))
    }

    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn publish(&self, envelope: Envelope) -> PublishOutcome {
        if !self.is_connected() {
            tracing::error!(
                "[Transport] Not connected, dropping {} for {}",
                envelope.category().as_str(),
                envelope.session_id()
            );
            return PublishOutcome::Dropped;
        }

        let category = envelope.category();
        let url = match endpoint(
            &self.base_url,
            &["realtime", envelope.session_id(), category.path_segment()],
        ) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("[Transport] Cannot address {}: {}", category.as_str(), e);
                return PublishOutcome::Dropped;
            }
        };
        match self.client.post(url).json(&envelope).send().await {
            Ok(response) if response.status().is_success() => PublishOutcome::Sent,
            Ok(response) => {
                tracing::error!(
                    "[Transport] Publish of {} rejected with status {}",
                    category.as_str(),
                    response.status()
                );
                PublishOutcome::Dropped
            }
            Err(e) => {
                tracing::error!("[Transport] Publish of {} failed: {}", category.as_str(), e);
                PublishOutcome::Dropped
            }
        }
    }
}

async fn read_subscription(
    client: reqwest::Client,
    url: reqwest::Url,
    connected: Arc<AtomicBool>,
    status: watch::Sender<ConnectionStatus>,
    inbound: mpsc::Sender<Envelope>,
) {
    let mut reconnect_delay = INITIAL_RECONNECT_DELAY;

    loop {
        let _ = status.send(ConnectionStatus::Connecting);
        let request = client
            .get(url.clone())
            .header("Subscribe", "true")
            .header("Accept", "text/event-stream");

        let response = match request.send().await {
            Ok(response) if response.status().is_success() => Some(response),
            Ok(response) => {
                tracing::error!("[Transport] Subscription failed with status {} (will retry)", response.status());
                let _ = status.send(ConnectionStatus::Error(format!("http: {}", response.status())));
                None
            }
            Err(e) => {
                tracing::warn!("[Transport] Subscription request failed (will retry): {}", e);
                let _ = status.send(ConnectionStatus::Error(format!("network: {}", e)));
                None
            }
        };

        let Some(response) = response else {
            let _ = status.send(ConnectionStatus::Retrying);
            tokio::time::sleep(reconnect_delay).await;
            reconnect_delay = std::cmp::min(reconnect_delay * 2, MAX_RECONNECT_DELAY);
            continue;
        };

        tracing::info!("[Transport] Subscribed to {}", url);
        connected.store(true, Ordering::Release);
        let _ = status.send(ConnectionStatus::Connected);
        reconnect_delay = INITIAL_RECONNECT_DELAY;

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut connection_lost = false;

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => {
                    for envelope in decoder.feed(&chunk) {
                        if inbound.send(envelope).await.is_err() {
                            tracing::debug!("[Transport] Inbound receiver dropped, stopping reader");
                            connected.store(false, Ordering::Release);
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("[Transport] Error reading from SSE stream: {}", e);
                    let _ = status.send(ConnectionStatus::Error(format!("stream: {}", e)));
                    connection_lost = true;
                    break;
                }
            }
        }

        connected.store(false, Ordering::Release);
        if !connection_lost {
            tracing::info!("[Transport] Stream closed by server");
            let _ = status.send(ConnectionStatus::Disconnected);
            return;
        }

        tracing::warn!("[Transport] Connection lost, reconnecting in {:?}", reconnect_delay);
        let _ = status.send(ConnectionStatus::Retrying);
        tokio::time::sleep(reconnect_delay).await;
        reconnect_delay = std::cmp::min(reconnect_delay * 2, MAX_RECONNECT_DELAY);
    }
}
