use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, unbounded};
use futures_util::{SinkExt, StreamExt};
use rovercon_core::CommandSink;
use rovercon_core::protocol::{InboundEvent, OutboundEvent, StatusReport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{info, warn};

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:5000/ws";

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Frame format on the wire: event name plus JSON payload.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Handle to the server connection. The socket lives on a background thread
/// with its own single-threaded runtime; the render loop talks to it through
/// channels only, so neither side ever blocks the other.
pub struct ServerLink {
    outbound: UnboundedSender<OutboundEvent>,
    inbound: Receiver<InboundEvent>,
}

impl ServerLink {
    pub fn connect(url: String) -> Self {
        let (outbound, outbound_rx) = unbounded_channel();
        let (inbound_tx, inbound) = unbounded();

        thread::Builder::new()
            .name("server-link".to_string())
            .spawn(move || run_link(url, outbound_rx, inbound_tx))
            .unwrap_or_else(|err| panic!("failed to spawn server link thread: {err}"));

        Self { outbound, inbound }
    }

    /// Events pushed by the link thread since the last frame.
    pub fn drain(&self) -> Vec<InboundEvent> {
        self.inbound.try_iter().collect()
    }
}

impl CommandSink for ServerLink {
    fn send(&mut self, event: OutboundEvent) {
        if self.outbound.send(event).is_err() {
            warn!("server link thread is gone, dropping outbound event");
        }
    }
}

fn run_link(
    url: String,
    outbound: UnboundedReceiver<OutboundEvent>,
    inbound: Sender<InboundEvent>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building the server link runtime")
    {
        Ok(runtime) => runtime,
        Err(err) => {
            warn!(%err, "server link unavailable");
            return;
        }
    };

    runtime.block_on(link_loop(url, outbound, inbound));
}

async fn link_loop(
    url: String,
    mut outbound: UnboundedReceiver<OutboundEvent>,
    inbound: Sender<InboundEvent>,
) {
    bootstrap_status(&url, &inbound).await;

    // Reconnection lives here; the coordinator never retries anything.
    loop {
        match connect_async(url.as_str()).await {
            Ok((mut socket, _)) => {
                info!(%url, "connected to server");
                if inbound.send(InboundEvent::Connected).is_err() {
                    return;
                }
                exchange(&mut socket, &mut outbound, &inbound).await;
                if inbound.send(InboundEvent::Disconnected).is_err() {
                    return;
                }
            }
            Err(err) => {
                warn!(%err, %url, "connection attempt failed");
            }
        }

        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// Pump frames both ways until the socket drops. Outbound ordering follows
/// call order; there is no batching and no way to withdraw an in-flight send.
async fn exchange(
    socket: &mut WsStream,
    outbound: &mut UnboundedReceiver<OutboundEvent>,
    inbound: &Sender<InboundEvent>,
) {
    loop {
        tokio::select! {
            incoming = socket.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if !forward_inbound(text.as_str(), inbound) {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(%err, "socket read failed");
                        return;
                    }
                }
            }
            command = outbound.recv() => {
                let Some(event) = command else { return };
                let envelope = Envelope {
                    event: event.name().to_string(),
                    data: event.payload(),
                };
                let text = match serde_json::to_string(&envelope) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(%err, "failed to encode outbound event");
                        continue;
                    }
                };
                if let Err(err) = socket.send(Message::text(text)).await {
                    warn!(%err, "socket write failed");
                    return;
                }
            }
        }
    }
}

/// Returns false when the console side hung up.
fn forward_inbound(text: &str, inbound: &Sender<InboundEvent>) -> bool {
    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(%err, "malformed server frame");
            return true;
        }
    };

    match InboundEvent::parse(&envelope.event, envelope.data) {
        Ok(event) => inbound.send(event).is_ok(),
        Err(err) => {
            // Dropped, so the display keeps its previous values.
            warn!(%err, "dropping server event");
            true
        }
    }
}

/// One-shot status fetch that seeds the display before the first push event.
async fn bootstrap_status(ws_url: &str, inbound: &Sender<InboundEvent>) {
    let url = status_url(ws_url);
    match fetch_status(&url).await {
        Ok(report) => {
            let _ = inbound.send(InboundEvent::Status(report));
        }
        Err(err) => {
            warn!(%err, %url, "status bootstrap failed");
        }
    }
}

async fn fetch_status(url: &str) -> anyhow::Result<StatusReport> {
    let report = reqwest::get(url)
        .await
        .context("requesting status")?
        .error_for_status()
        .context("status endpoint")?
        .json::<StatusReport>()
        .await
        .context("decoding status")?;
    Ok(report)
}

/// Derive the HTTP status endpoint from the WebSocket URL: same authority,
/// matching scheme, fixed `/api/status` path.
fn status_url(ws_url: &str) -> String {
    let http = if let Some(rest) = ws_url.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = ws_url.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        ws_url.to_string()
    };

    let path_start = http
        .find("://")
        .and_then(|scheme_end| {
            http[scheme_end + 3..]
                .find('/')
                .map(|offset| scheme_end + 3 + offset)
        });

    match path_start {
        Some(index) => format!("{}/api/status", &http[..index]),
        None => format!("{http}/api/status"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_url_replaces_scheme_and_path() {
        assert_eq!(
            status_url("ws://127.0.0.1:5000/ws"),
            "http://127.0.0.1:5000/api/status"
        );
        assert_eq!(
            status_url("wss://rover.local/socket/v1"),
            "https://rover.local/api/status"
        );
    }

    #[test]
    fn status_url_handles_bare_authority() {
        assert_eq!(status_url("ws://rover:5000"), "http://rover:5000/api/status");
    }

    #[test]
    fn envelope_round_trips_event_name_and_payload() {
        let event = OutboundEvent::GimbalReset;
        let envelope = Envelope {
            event: event.name().to_string(),
            data: event.payload(),
        };
        let text = serde_json::to_string(&envelope).unwrap();
        let parsed: Envelope = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.event, "gimbal_control");
        assert_eq!(parsed.data, json!({ "action": "reset" }));
    }

    #[test]
    fn envelope_without_data_defaults_to_null() {
        let parsed: Envelope = serde_json::from_str(r#"{"event":"status"}"#).unwrap();
        assert_eq!(parsed.event, "status");
        assert!(parsed.data.is_null());
    }
}
