//! Supabase Realtime client.
//!
//! The websocket runs on its own thread with a single-threaded tokio runtime.
//! Outgoing throws are queued to it over a channel; incoming throws land in a
//! shared inbox that [`RealtimeChannel::poll`] drains from the Bevy side.
//! Frames follow the Phoenix v1 JSON protocol.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use bevy::log::{debug, info, warn};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::Message;

use crate::dice3d::types::RealtimeSettings;

use super::channel::{ChannelConfig, ConnectionStatus, RealtimeChannel, RealtimeError};
use super::protocol::{decode_throw, BroadcastEnvelope, ThrowEvent, THROW_EVENT};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// One Phoenix frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoenixFrame {
    pub topic: String,
    pub event: String,
    pub payload: JsonValue,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl PhoenixFrame {
    fn new(topic: &str, event: &str, payload: JsonValue, reference: u64) -> Self {
        Self {
            topic: topic.to_string(),
            event: event.to_string(),
            payload,
            reference: Some(reference.to_string()),
        }
    }

    fn to_message(&self) -> Result<Message, RealtimeError> {
        Ok(Message::Text(serde_json::to_string(self)?.into()))
    }
}

/// Websocket endpoint for a project URL.
pub fn websocket_url(base_url: &str, api_key: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/realtime/v1/websocket?apikey={}&vsn=1.0.0", base, api_key)
}

/// Phoenix topic for a channel name.
pub fn phoenix_topic(channel: &str) -> String {
    format!("realtime:{}", channel)
}

fn join_payload(config: ChannelConfig, api_key: &str) -> JsonValue {
    json!({
        "config": {
            "broadcast": { "self": config.broadcast_self, "ack": false },
            "presence": { "key": "" },
            "private": false
        },
        "access_token": api_key
    })
}

/// Broadcast a throw over the REST endpoint, without holding a socket open.
pub fn broadcast_rest(
    settings: &RealtimeSettings,
    channel: &str,
    event: &ThrowEvent,
) -> Result<(), RealtimeError> {
    let (Some(url), Some(key)) = (settings.url.as_deref(), settings.api_key.as_deref()) else {
        return Err(RealtimeError::NotConfigured);
    };

    let body = serde_json::to_string(&json!({
        "messages": [{
            "topic": channel,
            "event": THROW_EVENT,
            "payload": event,
        }]
    }))?;

    let endpoint = format!("{}/realtime/v1/api/broadcast", url.trim().trim_end_matches('/'));
    let response = reqwest::blocking::Client::new()
        .post(&endpoint)
        .header("apikey", key)
        .header("Authorization", format!("Bearer {}", key))
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .map_err(|e| RealtimeError::Http(e.to_string()))?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(RealtimeError::Http(format!(
            "{} returned {}",
            endpoint,
            response.status()
        )))
    }
}

enum Outbound {
    Throw(ThrowEvent),
    Leave,
}

struct Connection {
    outbound: UnboundedSender<Outbound>,
    /// Detached on drop; the worker exits once it has sent phx_leave.
    _worker: JoinHandle<()>,
}

pub struct SupabaseChannel {
    settings: RealtimeSettings,
    config: ChannelConfig,
    topic: Option<String>,
    inbox: Arc<Mutex<Vec<ThrowEvent>>>,
    status: Arc<Mutex<ConnectionStatus>>,
    connection: Option<Connection>,
}

impl SupabaseChannel {
    pub fn new(settings: RealtimeSettings, config: ChannelConfig) -> Result<Self, RealtimeError> {
        if !settings.is_configured() {
            return Err(RealtimeError::NotConfigured);
        }
        Ok(Self {
            settings,
            config,
            topic: None,
            inbox: Arc::new(Mutex::new(Vec::new())),
            status: Arc::new(Mutex::new(ConnectionStatus::Disconnected)),
            connection: None,
        })
    }

    fn set_status(status: &Mutex<ConnectionStatus>, value: ConnectionStatus) {
        if let Ok(mut status) = status.lock() {
            *status = value;
        }
    }
}

impl RealtimeChannel for SupabaseChannel {
    fn subscribe(&mut self, topic: &str) -> Result<(), RealtimeError> {
        self.unsubscribe();

        let (Some(url), Some(key)) = (self.settings.url.clone(), self.settings.api_key.clone())
        else {
            return Err(RealtimeError::NotConfigured);
        };

        let (outbound, outbound_rx) = unbounded_channel();
        let socket_url = websocket_url(&url, &key);
        let phoenix = phoenix_topic(topic);
        let config = self.config;
        // Each subscription gets its own inbox and status, so a worker that
        // is still leaving cannot write into the next one.
        self.inbox = Arc::new(Mutex::new(Vec::new()));
        self.status = Arc::new(Mutex::new(ConnectionStatus::Connecting));
        let inbox = self.inbox.clone();
        let status = self.status.clone();

        let worker = std::thread::Builder::new()
            .name(format!("realtime-{}", topic))
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        warn!("Failed to start realtime runtime: {}", e);
                        Self::set_status(&status, ConnectionStatus::Disconnected);
                        return;
                    }
                };

                rt.block_on(run_connection(
                    socket_url,
                    phoenix,
                    join_payload(config, &key),
                    outbound_rx,
                    inbox,
                    status.clone(),
                ));
                Self::set_status(&status, ConnectionStatus::Disconnected);
            })
            .map_err(|e| RealtimeError::Connection(e.to_string()))?;

        self.connection = Some(Connection {
            outbound,
            _worker: worker,
        });
        self.topic = Some(topic.to_string());
        info!("Joining realtime channel {}", topic);
        Ok(())
    }

    fn send(&mut self, event: &ThrowEvent) -> Result<(), RealtimeError> {
        let connection = self.connection.as_ref().ok_or(RealtimeError::NotSubscribed)?;
        connection
            .outbound
            .send(Outbound::Throw(event.clone()))
            .map_err(|_| RealtimeError::Closed)
    }

    fn poll(&mut self) -> Vec<ThrowEvent> {
        match self.inbox.lock() {
            Ok(mut inbox) => std::mem::take(&mut *inbox),
            Err(_) => Vec::new(),
        }
    }

    fn unsubscribe(&mut self) {
        self.topic = None;
        if let Some(connection) = self.connection.take() {
            let _ = connection.outbound.send(Outbound::Leave);
            self.status = Arc::new(Mutex::new(ConnectionStatus::Disconnected));
        }
        if let Ok(mut inbox) = self.inbox.lock() {
            inbox.clear();
        }
    }

    fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    fn status(&self) -> ConnectionStatus {
        self.status.lock().map(|s| *s).unwrap_or_default()
    }
}

impl Drop for SupabaseChannel {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

enum SessionEnd {
    Left,
    Dropped,
}

/// Keep a joined socket alive, reconnecting with backoff until asked to leave.
async fn run_connection(
    url: String,
    topic: String,
    join: JsonValue,
    mut outbound: UnboundedReceiver<Outbound>,
    inbox: Arc<Mutex<Vec<ThrowEvent>>>,
    status: Arc<Mutex<ConnectionStatus>>,
) {
    let mut backoff = Duration::from_secs(1);

    loop {
        SupabaseChannel::set_status(&status, ConnectionStatus::Connecting);

        match run_session(&url, &topic, &join, &mut outbound, &inbox, &status).await {
            Ok(SessionEnd::Left) => return,
            Ok(SessionEnd::Dropped) => {
                warn!("Realtime connection to {} dropped", topic);
                backoff = Duration::from_secs(1);
            }
            Err(e) => warn!("Realtime connection to {} failed: {}", topic, e),
        }

        SupabaseChannel::set_status(&status, ConnectionStatus::Disconnected);

        // Wait out the backoff, but still notice a leave request.
        tokio::select! {
            _ = tokio::time::sleep(backoff) => {}
            message = outbound.recv() => match message {
                None | Some(Outbound::Leave) => return,
                Some(Outbound::Throw(_)) => {
                    warn!("Dropping throw while disconnected from {}", topic);
                }
            }
        }
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

async fn run_session(
    url: &str,
    topic: &str,
    join: &JsonValue,
    outbound: &mut UnboundedReceiver<Outbound>,
    inbox: &Arc<Mutex<Vec<ThrowEvent>>>,
    status: &Arc<Mutex<ConnectionStatus>>,
) -> Result<SessionEnd, RealtimeError> {
    let (socket, _) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| RealtimeError::Connection(e.to_string()))?;
    let (mut sink, mut stream) = socket.split();

    let mut next_ref: u64 = 1;

    sink.send(PhoenixFrame::new(topic, "phx_join", join.clone(), next_ref).to_message()?)
        .await
        .map_err(|e| RealtimeError::Connection(e.to_string()))?;
    let join_ref = next_ref.to_string();

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                next_ref += 1;
                let frame = PhoenixFrame::new("phoenix", "heartbeat", json!({}), next_ref);
                sink.send(frame.to_message()?)
                    .await
                    .map_err(|e| RealtimeError::Connection(e.to_string()))?;
            }
            message = outbound.recv() => {
                next_ref += 1;
                match message {
                    Some(Outbound::Throw(event)) => {
                        let payload = serde_json::to_value(BroadcastEnvelope::throw(event))?;
                        let frame = PhoenixFrame::new(topic, "broadcast", payload, next_ref);
                        sink.send(frame.to_message()?)
                            .await
                            .map_err(|e| RealtimeError::Connection(e.to_string()))?;
                    }
                    None | Some(Outbound::Leave) => {
                        let frame = PhoenixFrame::new(topic, "phx_leave", json!({}), next_ref);
                        let _ = sink.send(frame.to_message()?).await;
                        let _ = sink.close().await;
                        return Ok(SessionEnd::Left);
                    }
                }
            }
            incoming = stream.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text.to_string(),
                    Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::Dropped),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(RealtimeError::Connection(e.to_string())),
                };

                let frame: PhoenixFrame = match serde_json::from_str(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Ignoring malformed realtime frame: {}", e);
                        continue;
                    }
                };

                match frame.event.as_str() {
                    "phx_reply" if frame.reference.as_deref() == Some(join_ref.as_str()) => {
                        if frame.payload["status"] == "ok" {
                            info!("Joined realtime channel {}", topic);
                            SupabaseChannel::set_status(status, ConnectionStatus::Connected);
                        } else {
                            return Err(RealtimeError::Connection(format!(
                                "join rejected: {}",
                                frame.payload
                            )));
                        }
                    }
                    "broadcast" if frame.topic == topic => {
                        match decode_throw(&frame.payload.to_string()) {
                            Ok(Some(event)) => {
                                if let Ok(mut inbox) = inbox.lock() {
                                    inbox.push(event);
                                }
                            }
                            Ok(None) => {}
                            Err(e) => warn!("Dropping malformed throw: {}", e),
                        }
                    }
                    "phx_error" | "phx_close" if frame.topic == topic => {
                        return Ok(SessionEnd::Dropped);
                    }
                    other => debug!("Realtime frame {} on {}", other, frame.topic),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url() {
        assert_eq!(
            websocket_url("https://abc.supabase.co/", "key"),
            "wss://abc.supabase.co/realtime/v1/websocket?apikey=key&vsn=1.0.0"
        );
        assert_eq!(
            websocket_url("http://localhost:54321", "k"),
            "ws://localhost:54321/realtime/v1/websocket?apikey=k&vsn=1.0.0"
        );
    }

    #[test]
    fn test_join_frame_shape() {
        let frame = PhoenixFrame::new(
            &phoenix_topic("table-throws"),
            "phx_join",
            join_payload(ChannelConfig::default(), "key"),
            1,
        );
        let json: JsonValue = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["topic"], "realtime:table-throws");
        assert_eq!(json["event"], "phx_join");
        assert_eq!(json["ref"], "1");
        assert_eq!(json["payload"]["config"]["broadcast"]["self"], false);
    }

    #[test]
    fn test_unconfigured_channel_is_rejected() {
        let settings = RealtimeSettings::default();
        assert!(matches!(
            SupabaseChannel::new(settings.clone(), ChannelConfig::default()),
            Err(RealtimeError::NotConfigured)
        ));

        let event = ThrowEvent {
            roll: vec![],
            name: "x".to_string(),
            dice_color: None,
        };
        assert!(matches!(
            broadcast_rest(&settings, "throws", &event),
            Err(RealtimeError::NotConfigured)
        ));
    }

    #[test]
    fn test_resubscribe_gets_fresh_status() {
        let settings = RealtimeSettings {
            url: Some("http://127.0.0.1:1".to_string()),
            api_key: Some("key".to_string()),
        };
        let mut channel = SupabaseChannel::new(settings, ChannelConfig::default()).unwrap();
        assert_eq!(channel.status(), ConnectionStatus::Disconnected);

        channel.subscribe("a-throws").unwrap();
        let first = channel.status.clone();

        channel.subscribe("b-throws").unwrap();
        assert!(!Arc::ptr_eq(&first, &channel.status));

        // A late write from the first worker lands in its own cell.
        *first.lock().unwrap() = ConnectionStatus::Connected;
        assert_ne!(channel.status(), ConnectionStatus::Connected);

        channel.unsubscribe();
        assert_eq!(channel.status(), ConnectionStatus::Disconnected);
        assert_eq!(channel.topic(), None);
    }
}
