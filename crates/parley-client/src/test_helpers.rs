//! Shared test fixtures: builders for users and messages, and a harness
//! that drives a [`SessionController`] over a [`ChannelTransport`].

use std::time::Duration;

use chrono::{TimeZone, Utc};
use parley_shared::protocol::{JoinAck, TypingPulse};
use parley_shared::{InboundEvent, Message, MessageKind, OutboundEvent, User, UserId};
use tokio::sync::mpsc;

use crate::config::ClientConfig;
use crate::events::Notice;
use crate::session::{SessionController, SessionReceivers};
use crate::transport::{ChannelTransport, InboundSink, TransportCommand};

pub fn user(id: &str, username: &str) -> User {
    User {
        id: UserId::from(id),
        username: username.to_string(),
        avatar: "👤".to_string(),
        is_online: true,
        last_seen: None,
        created_at: None,
        socket_id: None,
    }
}

pub fn message_at(id: &str, author: &User, content: &str, millis: i64) -> Message {
    Message {
        id: id.to_string(),
        content: content.to_string(),
        kind: MessageKind::Text,
        user_id: Some(author.id.clone()),
        user: author.clone(),
        file_url: None,
        file_name: None,
        file_size: None,
        file_mime_type: None,
        created_at: Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now),
    }
}

pub type BoxedFactory = Box<dyn FnMut(&ClientConfig) -> ChannelTransport + Send>;

/// A controller wired to in-memory channels. Transport commands are
/// collected as they are issued; inbound events are delivered through the
/// sink of the most recent connection.
pub struct Harness {
    pub controller: SessionController<BoxedFactory>,
    pub receivers: SessionReceivers,
    transport_rx: mpsc::Receiver<TransportCommand>,
    sinks: Vec<InboundSink>,
    pub emitted: Vec<OutboundEvent>,
    pub connects: usize,
    pub disconnects: usize,
}

impl Harness {
    /// A started controller, still `connecting`.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let factory: BoxedFactory = Box::new(move |cfg: &ClientConfig| {
            ChannelTransport::new(cfg, transport_tx.clone())
        });

        let (mut controller, receivers) = SessionController::new(config, factory);
        controller.start();

        let mut harness = Self {
            controller,
            receivers,
            transport_rx,
            sinks: Vec::new(),
            emitted: Vec::new(),
            connects: 0,
            disconnects: 0,
        };
        harness.sync();
        harness
    }

    /// A controller whose first connection is established.
    pub fn connected() -> Self {
        let mut harness = Self::new();
        harness.deliver(InboundEvent::Connected);
        harness
    }

    /// Connected, joined as `username`, listeners attached, and the join
    /// acknowledged with the local user registered as `self-id`.
    pub fn joined(username: &str) -> Self {
        let mut harness = Self::connected();
        harness.controller.join(username, "🚀").unwrap();
        harness.controller.attach_listeners().unwrap();
        harness.sync();

        let me = user("self-id", username);
        harness.deliver(InboundEvent::JoinSuccess(JoinAck {
            user: me.clone(),
            online_users: vec![me],
            recent_messages: Vec::new(),
        }));
        harness.emitted.clear();
        harness.drain_notices();
        harness
    }

    /// Collect transport commands issued so far.
    pub fn sync(&mut self) {
        while let Ok(cmd) = self.transport_rx.try_recv() {
            match cmd {
                TransportCommand::Connect { sink, .. } => {
                    self.connects += 1;
                    self.sinks.push(sink);
                }
                TransportCommand::Emit(event) => self.emitted.push(event),
                TransportCommand::Disconnect => self.disconnects += 1,
            }
        }
    }

    /// Sink of the most recent connection.
    pub fn sink(&self) -> InboundSink {
        self.sinks
            .last()
            .cloned()
            .expect("controller never connected")
    }

    pub fn deliver(&mut self, event: InboundEvent) {
        self.sink().deliver(event);
        self.pump();
    }

    /// Feed queued deliveries and timer firings to the controller until
    /// none are left.
    pub fn pump(&mut self) {
        loop {
            let mut progressed = false;
            while let Ok(delivery) = self.receivers.inbound.try_recv() {
                self.controller.handle_delivery(delivery);
                progressed = true;
            }
            while let Ok(fired) = self.receivers.timers.try_recv() {
                self.controller.handle_timer(fired);
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
        self.sync();
    }

    /// Let `ms` of (paused) time pass, then process whatever fired.
    pub async fn advance(&mut self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        self.pump();
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.receivers.notices.try_recv() {
            notices.push(notice);
        }
        notices
    }

    /// The `is_typing` flags of every typing event emitted so far.
    pub fn typing_emissions(&self) -> Vec<bool> {
        self.emitted
            .iter()
            .filter_map(|e| match e {
                OutboundEvent::Typing(TypingPulse { is_typing, .. }) => Some(*is_typing),
                _ => None,
            })
            .collect()
    }
}
