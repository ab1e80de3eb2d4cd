//! Session controller.
//!
//! Owns the presence set, typing tracker, message log and connection state
//! machine, and is the only writer of any of them. Inbound events, timer
//! firings and user operations each run to completion, one at a time;
//! the [`driver`](crate::driver) module feeds them in from a single task.

use chrono::Utc;
use parley_shared::constants::DEFAULT_AVATAR;
use parley_shared::protocol::TypingPulse;
use parley_shared::{
    Attachment, InboundEvent, LocalIdentity, OutboundEvent, OutgoingMessage, User,
    ValidationError,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::connection::{ConnectionMachine, ConnectionStatus};
use crate::error::SessionError;
use crate::events::{Notice, SessionSnapshot};
use crate::log::MessageLog;
use crate::presence::PresenceSet;
use crate::subscriptions::Subscriptions;
use crate::timers::{TimerFired, TimerKind, Timers};
use crate::transport::{Delivery, TransportFactory, TransportHandle};
use crate::typing::TypingTracker;

const WAVE: &str = "👋";

/// Receiving ends of the channels a controller feeds.
pub struct SessionReceivers {
    pub inbound: mpsc::UnboundedReceiver<Delivery>,
    pub timers: mpsc::UnboundedReceiver<TimerFired>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

pub struct SessionController<F: TransportFactory> {
    config: ClientConfig,
    transport: TransportHandle<F>,
    inbound_tx: mpsc::UnboundedSender<Delivery>,
    notices: mpsc::UnboundedSender<Notice>,
    timers: Timers,
    subscriptions: Subscriptions,

    connection: ConnectionMachine,
    presence: PresenceSet,
    typing: TypingTracker,
    log: MessageLog,

    /// Name and avatar the user joined with. `Some` means logged in.
    identity: Option<LocalIdentity>,
    /// The server's record of the local user, known once the join is acknowledged.
    local_user: Option<User>,
    /// The join event is held back until the chat listeners are attached.
    join_pending: bool,
    /// Whether "typing" has been sent without a matching "stopped typing".
    local_typing: bool,
}

impl<F: TransportFactory> SessionController<F> {
    pub fn new(config: ClientConfig, factory: F) -> (Self, SessionReceivers) {
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let (timer_tx, timers) = mpsc::unbounded_channel();
        let (notice_tx, notices) = mpsc::unbounded_channel();

        let controller = Self {
            config,
            transport: TransportHandle::new(factory),
            inbound_tx,
            notices: notice_tx,
            timers: Timers::new(timer_tx),
            subscriptions: Subscriptions::new(),
            connection: ConnectionMachine::new(),
            presence: PresenceSet::new(),
            typing: TypingTracker::new(),
            log: MessageLog::new(),
            identity: None,
            local_user: None,
            join_pending: false,
            local_typing: false,
        };

        (
            controller,
            SessionReceivers {
                inbound,
                timers,
                notices,
            },
        )
    }

    /// Open the first transport. Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        info!(server = %self.config.server_url, "Starting chat session");
        self.open_transport();
    }

    // -----------------------------------------------------------------------
    // User operations
    // -----------------------------------------------------------------------

    /// Record the local identity. The join event itself is emitted by
    /// [`attach_listeners`](Self::attach_listeners).
    pub fn join(&mut self, username: &str, avatar: &str) -> Result<(), SessionError> {
        if !self.connection.is_connected() {
            return Err(SessionError::NotConnected);
        }
        if let Some(identity) = &self.identity {
            return Err(SessionError::AlreadyJoined(identity.username.clone()));
        }

        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername.into());
        }
        let len = username.chars().count();
        if len > self.config.max_username_len {
            return Err(ValidationError::UsernameTooLong {
                len,
                max: self.config.max_username_len,
            }
            .into());
        }

        let avatar = match avatar.trim() {
            "" => DEFAULT_AVATAR,
            a => a,
        };

        self.identity = Some(LocalIdentity {
            username: username.to_string(),
            avatar: avatar.to_string(),
        });
        self.join_pending = true;

        info!(username, avatar, "Identity stored, join deferred until listeners attach");
        Ok(())
    }

    /// Wire the chat listeners, then emit the deferred join.
    pub fn attach_listeners(&mut self) -> Result<(), SessionError> {
        let identity = self.identity.clone().ok_or(SessionError::NotJoined)?;

        self.subscriptions.attach_chat();

        if self.join_pending {
            self.transport.emit(OutboundEvent::Join(identity.clone()))?;
            self.join_pending = false;
            info!(username = %identity.username, "Join emitted");
        }
        Ok(())
    }

    /// Hand a message to the transport. The log is not touched: the
    /// message appears once the server echoes it back.
    pub fn send_message(
        &mut self,
        text: &str,
        file: Option<Attachment>,
    ) -> Result<(), SessionError> {
        let identity = self.require_session()?;

        let text = text.trim();
        if text.is_empty() {
            return Err(self.reject(ValidationError::EmptyMessage));
        }

        let file = match file {
            Some(attachment) => {
                let policy = self.config.upload_policy();
                if let Err(e) = policy.validate(&attachment) {
                    return Err(self.reject(e));
                }
                Some(attachment.to_file_info())
            }
            None => None,
        };

        let message = OutgoingMessage::new(text, identity, Utc::now(), file);
        info!(
            msg_id = %message.id,
            has_file = message.file.is_some(),
            "Sending message"
        );
        self.transport.emit(OutboundEvent::SendMessage(message))?;

        // Every send clears the indicator, whether or not a pulse went out.
        self.timers.cancel(TimerKind::TypingDebounce);
        self.send_stopped_typing();
        Ok(())
    }

    /// Send an attachment with a generated caption.
    pub fn share_file(&mut self, attachment: Attachment) -> Result<(), SessionError> {
        let caption = format!("Shared file: {}", attachment.name);
        self.send_message(&caption, Some(attachment))?;
        self.notify(Notice::success("File sent"));
        Ok(())
    }

    /// The local user pressed a key in the message box.
    pub fn keystroke(&mut self) -> Result<(), SessionError> {
        let identity = self.require_session()?;

        if !self.local_typing {
            self.transport.emit(OutboundEvent::Typing(TypingPulse {
                user: identity,
                is_typing: true,
            }))?;
            self.local_typing = true;
        }

        self.timers
            .schedule(TimerKind::TypingDebounce, self.config.typing_debounce);
        Ok(())
    }

    /// End the session and rebuild the client shortly after.
    pub fn leave(&mut self) {
        info!(
            username = self.identity.as_ref().map(|i| i.username.as_str()),
            "Leaving session"
        );
        self.teardown();
        self.timers
            .schedule(TimerKind::Reload, self.config.reload_delay);
    }

    /// Start over with a fresh transport. Refused while connected.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        self.connection.retry()?;
        info!("Retrying connection");
        self.teardown();
        self.open_transport();
        Ok(())
    }

    /// Release everything. The controller is unusable afterwards.
    pub fn shutdown(&mut self) {
        self.timers.cancel_all();
        self.subscriptions.release();
        self.transport.dispose();
    }

    // -----------------------------------------------------------------------
    // Inbound events
    // -----------------------------------------------------------------------

    pub fn handle_delivery(&mut self, delivery: Delivery) {
        let kind = delivery.event.kind();

        if self.transport.live_generation() != Some(delivery.generation) {
            debug!(
                event = %kind,
                generation = delivery.generation,
                "Dropping event from disposed transport"
            );
            return;
        }
        if !self.subscriptions.accepts(kind) {
            debug!(event = %kind, "No listener attached, dropping event");
            return;
        }

        match delivery.event {
            InboundEvent::Connected => self.on_connected(),

            InboundEvent::Disconnected(reason) => self.on_disconnected(&reason),

            InboundEvent::ConnectError(err) => {
                self.connection.failed(&err.message);
                self.timers.cancel(TimerKind::ConnectTimeout);
            }

            InboundEvent::RecentMessages(messages) => {
                self.log.replace_all(messages);
                self.notify(Notice::success("Welcome to the chat!"));
            }

            InboundEvent::JoinSuccess(ack) => {
                info!(
                    user = %ack.user.id,
                    online = ack.online_users.len(),
                    history = ack.recent_messages.len(),
                    "Join acknowledged"
                );
                self.local_user = Some(ack.user);
                self.presence.replace(ack.online_users);
                self.log.replace_all(ack.recent_messages);
                self.notify(Notice::success("Joined the chat"));
            }

            InboundEvent::OnlineUsers(users) | InboundEvent::UsersUpdate(users) => {
                self.presence.replace(users);
            }

            InboundEvent::NewMessage(message) => self.log.append(message),

            InboundEvent::UserJoined(change) => {
                self.presence.replace(change.online_users);
                if !self.is_self(&change.user) {
                    self.notify(
                        Notice::success(format!("{} joined the chat", change.user.username))
                            .with_icon(WAVE),
                    );
                }
            }

            InboundEvent::UserLeft(change) => {
                self.presence.replace(change.online_users);
                if !self.is_self(&change.user) {
                    self.notify(
                        Notice::info(format!("{} left the chat", change.user.username))
                            .with_icon(WAVE),
                    );
                }
            }

            InboundEvent::UserTyping(notice) => {
                self.typing.set_typing(notice.user, notice.is_typing);
            }

            InboundEvent::Error(err) => {
                warn!(message = %err.message, "Server reported an error");
                self.notify(Notice::error(err.message));
            }
        }
    }

    fn on_connected(&mut self) {
        let recovered = self.connection.status() == ConnectionStatus::Disconnected;

        self.connection.established();
        self.timers.cancel(TimerKind::ConnectTimeout);
        if self.timers.cancel(TimerKind::DisconnectGrace) {
            info!("Connection recovered within grace period");
        }

        if recovered && self.identity.is_some() {
            self.notify(Notice::success("Connected to server"));
            self.rejoin();
        }
    }

    /// A fresh connection is unknown to the server; announce the session again.
    fn rejoin(&mut self) {
        if self.join_pending || !self.subscriptions.is_attached() {
            return;
        }
        let Some(identity) = self.identity.clone() else {
            return;
        };

        // The new connection gets a new id; compare by name until the ack.
        self.local_user = None;

        info!(username = %identity.username, "Rejoining after reconnect");
        if let Err(e) = self.transport.emit(OutboundEvent::Join(identity)) {
            warn!(error = %e, "Failed to rejoin");
        }
    }

    fn on_disconnected(&mut self, reason: &str) {
        self.connection.lost(reason);
        self.timers.cancel(TimerKind::ConnectTimeout);

        // Nothing can be sent until the connection is back.
        self.timers.cancel(TimerKind::TypingDebounce);
        self.local_typing = false;

        if self.identity.is_some() {
            self.notify(Notice::error("Disconnected from server"));
            self.timers
                .schedule(TimerKind::DisconnectGrace, self.config.disconnect_grace);
        }
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    pub fn handle_timer(&mut self, fired: TimerFired) {
        if !self.timers.accept(fired) {
            return;
        }

        match fired.kind {
            TimerKind::ConnectTimeout => {
                self.connection.timed_out();
            }
            TimerKind::TypingDebounce => self.stop_typing(),
            TimerKind::DisconnectGrace => {
                if self.connection.is_connected() {
                    return;
                }
                warn!(
                    grace_ms = self.config.disconnect_grace.as_millis() as u64,
                    "Connection did not recover, ending session"
                );
                self.leave();
            }
            TimerKind::Reload => {
                info!("Reloading client state");
                self.open_transport();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn connection_error(&self) -> Option<&str> {
        self.connection.error()
    }

    pub fn identity(&self) -> Option<&LocalIdentity> {
        self.identity.as_ref()
    }

    pub fn local_user(&self) -> Option<&User> {
        self.local_user.as_ref()
    }

    pub fn presence(&self) -> &PresenceSet {
        &self.presence
    }

    pub fn typing(&self) -> &TypingTracker {
        &self.typing
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.connection.status(),
            error: self.connection.error().map(str::to_string),
            identity: self.identity.clone(),
            local_user: self.local_user.clone(),
            online_users: self.presence.users().to_vec(),
            typing_users: self.typing.users().to_vec(),
            typing_summary: self.typing.summary(),
            messages: self.log.messages().to_vec(),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn open_transport(&mut self) {
        self.transport.open(&self.config, &self.inbound_tx);
        self.timers
            .schedule(TimerKind::ConnectTimeout, self.config.connect_timeout);
    }

    /// Drop the transport, listeners, timers and all session data, and
    /// return to `connecting`.
    fn teardown(&mut self) {
        self.transport.dispose();
        self.subscriptions.release();
        self.timers.cancel_all();

        self.identity = None;
        self.local_user = None;
        self.join_pending = false;
        self.local_typing = false;
        self.presence.clear();
        self.typing.clear();
        self.log.clear();

        self.connection.reset();
    }

    fn stop_typing(&mut self) {
        self.timers.cancel(TimerKind::TypingDebounce);
        if self.local_typing {
            self.send_stopped_typing();
        }
    }

    fn send_stopped_typing(&mut self) {
        self.local_typing = false;

        let Some(identity) = self.identity.clone() else {
            return;
        };
        if let Err(e) = self.transport.emit(OutboundEvent::Typing(TypingPulse {
            user: identity,
            is_typing: false,
        })) {
            warn!(error = %e, "Failed to send stopped-typing");
        }
    }

    fn require_session(&self) -> Result<LocalIdentity, SessionError> {
        if !self.connection.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.identity.clone().ok_or(SessionError::NotJoined)
    }

    /// Whether `user` is the local user. Compares ids once the server has
    /// acknowledged the join, usernames before that.
    fn is_self(&self, user: &User) -> bool {
        match (&self.local_user, &self.identity) {
            (Some(local), _) => local.id == user.id,
            (None, Some(identity)) => identity.username == user.username,
            (None, None) => false,
        }
    }

    fn reject(&self, err: ValidationError) -> SessionError {
        debug!(error = %err, "Input rejected");
        if err.is_attachment_error() {
            self.notify(Notice::error(err.to_string()));
        }
        SessionError::Validation(err)
    }

    fn notify(&self, notice: Notice) {
        if self.notices.send(notice).is_err() {
            debug!("Notice receiver dropped");
        }
    }
}
