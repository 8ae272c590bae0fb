//! Pub/sub channel abstraction.
//!
//! The relay talks to a [`RealtimeChannel`]: join a topic, broadcast throws,
//! and poll for throws from other clients. [`LoopbackHub`] connects channels
//! in process and is what `--offline` runs and the tests use.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bevy::log::warn;
use thiserror::Error;

use super::protocol::{decode_throw, encode_throw, ThrowEvent};

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("not subscribed to a channel")]
    NotSubscribed,
    #[error("failed to encode throw: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("request failed: {0}")]
    Http(String),
    #[error("realtime is not configured")]
    NotConfigured,
    #[error("channel closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "offline",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "online",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelConfig {
    /// Deliver our own broadcasts back to us.
    pub broadcast_self: bool,
}

pub trait RealtimeChannel: Send + Sync {
    /// Join `topic`, leaving the current one first.
    fn subscribe(&mut self, topic: &str) -> Result<(), RealtimeError>;

    /// Broadcast a throw to the other subscribers of the current topic.
    fn send(&mut self, event: &ThrowEvent) -> Result<(), RealtimeError>;

    /// Throws received since the last poll, oldest first.
    fn poll(&mut self) -> Vec<ThrowEvent>;

    fn unsubscribe(&mut self);

    fn topic(&self) -> Option<&str>;

    fn status(&self) -> ConnectionStatus;
}

struct Subscriber {
    client: u64,
    topic: String,
    inbox: Arc<Mutex<VecDeque<String>>>,
}

#[derive(Default)]
struct HubState {
    next_client: u64,
    subscribers: Vec<Subscriber>,
    delivered: usize,
}

/// In-process broker. Clones share the same subscribers.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self, config: ChannelConfig) -> LoopbackChannel {
        let client = match self.state.lock() {
            Ok(mut state) => {
                state.next_client += 1;
                state.next_client
            }
            Err(_) => 0,
        };

        LoopbackChannel {
            hub: self.clone(),
            client,
            config,
            topic: None,
            inbox: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Total frames delivered to any subscriber.
    pub fn delivered(&self) -> usize {
        self.state.lock().map(|s| s.delivered).unwrap_or(0)
    }
}

pub struct LoopbackChannel {
    hub: LoopbackHub,
    client: u64,
    config: ChannelConfig,
    topic: Option<String>,
    inbox: Arc<Mutex<VecDeque<String>>>,
}

impl RealtimeChannel for LoopbackChannel {
    fn subscribe(&mut self, topic: &str) -> Result<(), RealtimeError> {
        self.unsubscribe();

        let mut state = self.hub.state.lock().map_err(|_| RealtimeError::Closed)?;
        state.subscribers.push(Subscriber {
            client: self.client,
            topic: topic.to_string(),
            inbox: self.inbox.clone(),
        });
        self.topic = Some(topic.to_string());
        Ok(())
    }

    fn send(&mut self, event: &ThrowEvent) -> Result<(), RealtimeError> {
        let topic = self.topic.as_deref().ok_or(RealtimeError::NotSubscribed)?;
        let frame = encode_throw(event)?;

        let mut state = self.hub.state.lock().map_err(|_| RealtimeError::Closed)?;
        let mut delivered = 0;
        for subscriber in state.subscribers.iter() {
            if subscriber.topic != topic {
                continue;
            }
            if subscriber.client == self.client && !self.config.broadcast_self {
                continue;
            }
            if let Ok(mut inbox) = subscriber.inbox.lock() {
                inbox.push_back(frame.clone());
                delivered += 1;
            }
        }
        state.delivered += delivered;
        Ok(())
    }

    fn poll(&mut self) -> Vec<ThrowEvent> {
        let frames: Vec<String> = match self.inbox.lock() {
            Ok(mut inbox) => inbox.drain(..).collect(),
            Err(_) => return Vec::new(),
        };

        frames
            .iter()
            .filter_map(|frame| match decode_throw(frame) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Dropping malformed broadcast: {}", e);
                    None
                }
            })
            .collect()
    }

    fn unsubscribe(&mut self) {
        if self.topic.take().is_none() {
            return;
        }
        if let Ok(mut state) = self.hub.state.lock() {
            state.subscribers.retain(|s| s.client != self.client);
        }
        if let Ok(mut inbox) = self.inbox.lock() {
            inbox.clear();
        }
    }

    fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    fn status(&self) -> ConnectionStatus {
        if self.topic.is_some() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }
}

impl Drop for LoopbackChannel {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice3d::types::Roll;

    fn throw(name: &str) -> ThrowEvent {
        ThrowEvent {
            roll: vec![Roll::new(6, 4)],
            name: name.to_string(),
            dice_color: None,
        }
    }

    #[test]
    fn test_send_reaches_other_subscribers_only() {
        let hub = LoopbackHub::new();
        let mut alice = hub.channel(ChannelConfig::default());
        let mut bob = hub.channel(ChannelConfig::default());
        alice.subscribe("table-throws").unwrap();
        bob.subscribe("table-throws").unwrap();

        alice.send(&throw("alice")).unwrap();

        assert!(alice.poll().is_empty());
        assert_eq!(bob.poll(), vec![throw("alice")]);
        assert_eq!(hub.delivered(), 1);
    }

    #[test]
    fn test_broadcast_self_echoes() {
        let hub = LoopbackHub::new();
        let mut alice = hub.channel(ChannelConfig {
            broadcast_self: true,
        });
        alice.subscribe("throws").unwrap();
        alice.send(&throw("alice")).unwrap();
        assert_eq!(alice.poll().len(), 1);
    }

    #[test]
    fn test_topics_are_isolated() {
        let hub = LoopbackHub::new();
        let mut alice = hub.channel(ChannelConfig::default());
        let mut bob = hub.channel(ChannelConfig::default());
        alice.subscribe("a-throws").unwrap();
        bob.subscribe("b-throws").unwrap();

        alice.send(&throw("alice")).unwrap();
        assert!(bob.poll().is_empty());

        bob.subscribe("a-throws").unwrap();
        alice.send(&throw("alice")).unwrap();
        assert_eq!(bob.poll().len(), 1);
    }

    #[test]
    fn test_send_requires_subscription() {
        let hub = LoopbackHub::new();
        let mut alice = hub.channel(ChannelConfig::default());
        assert!(matches!(
            alice.send(&throw("alice")),
            Err(RealtimeError::NotSubscribed)
        ));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let hub = LoopbackHub::new();
        let mut alice = hub.channel(ChannelConfig::default());
        let mut bob = hub.channel(ChannelConfig::default());
        alice.subscribe("throws").unwrap();
        bob.subscribe("throws").unwrap();
        bob.unsubscribe();

        alice.send(&throw("alice")).unwrap();
        assert!(bob.poll().is_empty());
        assert_eq!(bob.status(), ConnectionStatus::Disconnected);
    }
}
