//! Transport seam.
//!
//! The session core never touches a socket. It drives a [`Transport`] with
//! fire-and-forget calls and receives everything back as [`InboundEvent`]s
//! through an [`InboundSink`]. Every transport the core constructs gets a
//! fresh generation number, and its sink stamps deliveries with it; the
//! controller drops deliveries from any generation other than the live
//! one, so a disposed transport cannot reach session state.

use parley_shared::{InboundEvent, OutboundEvent};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::TransportError;

/// An inbound event tagged with the generation of the transport that produced it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub generation: u64,
    pub event: InboundEvent,
}

/// Where a transport delivers its events.
#[derive(Debug, Clone)]
pub struct InboundSink {
    generation: u64,
    tx: mpsc::UnboundedSender<Delivery>,
}

impl InboundSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<Delivery>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Hand an event to the session. Returns `false` once the session is gone.
    pub fn deliver(&self, event: InboundEvent) -> bool {
        self.tx
            .send(Delivery {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// A connection to the chat server. Calls must not block.
pub trait Transport: Send + 'static {
    /// Start connecting. Lifecycle signals and server events go to `sink`.
    fn connect(&mut self, sink: InboundSink);

    fn emit(&mut self, event: OutboundEvent) -> Result<(), TransportError>;

    fn disconnect(&mut self);
}

/// Builds transports on demand.
pub trait TransportFactory: Send + 'static {
    type Transport: Transport;

    fn create(&mut self, config: &ClientConfig) -> Self::Transport;
}

impl<T, F> TransportFactory for F
where
    T: Transport,
    F: FnMut(&ClientConfig) -> T + Send + 'static,
{
    type Transport = T;

    fn create(&mut self, config: &ClientConfig) -> T {
        self(config)
    }
}

// ---------------------------------------------------------------------------
// Channel-backed transport
// ---------------------------------------------------------------------------

/// Commands forwarded by [`ChannelTransport`] to the task owning the socket.
#[derive(Debug)]
pub enum TransportCommand {
    /// Open the connection to `server_url`, retrying up to
    /// `reconnect_attempts` times after a drop, and report to `sink`.
    Connect {
        server_url: String,
        reconnect_attempts: u32,
        reconnect_delay: std::time::Duration,
        sink: InboundSink,
    },
    Emit(OutboundEvent),
    Disconnect,
}

/// A [`Transport`] that forwards every call over a bounded channel to a
/// host task which owns the real socket.
pub struct ChannelTransport {
    config: ClientConfig,
    tx: mpsc::Sender<TransportCommand>,
}

impl ChannelTransport {
    pub fn new(config: &ClientConfig, tx: mpsc::Sender<TransportCommand>) -> Self {
        Self {
            config: config.clone(),
            tx,
        }
    }

    fn send(&self, cmd: TransportCommand) -> Result<(), TransportError> {
        self.tx.try_send(cmd).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Backpressure,
            TrySendError::Closed(_) => TransportError::ChannelClosed,
        })
    }
}

impl Transport for ChannelTransport {
    fn connect(&mut self, sink: InboundSink) {
        let cmd = TransportCommand::Connect {
            server_url: self.config.server_url.clone(),
            reconnect_attempts: self.config.reconnect_attempts,
            reconnect_delay: self.config.reconnect_delay,
            sink,
        };
        if let Err(e) = self.send(cmd) {
            warn!(error = %e, "Failed to request connection");
        }
    }

    fn emit(&mut self, event: OutboundEvent) -> Result<(), TransportError> {
        debug!(event = event.name(), "Emitting event");
        self.send(TransportCommand::Emit(event))
    }

    fn disconnect(&mut self) {
        if let Err(e) = self.send(TransportCommand::Disconnect) {
            debug!(error = %e, "Disconnect not delivered");
        }
    }
}

// ---------------------------------------------------------------------------
// Lazy handle
// ---------------------------------------------------------------------------

/// Owns at most one transport at a time.
///
/// The transport is constructed by [`open`](Self::open) and torn down by
/// [`dispose`](Self::dispose); a new one is built on the next `open`.
pub struct TransportHandle<F: TransportFactory> {
    factory: F,
    live: Option<F::Transport>,
    generation: u64,
}

impl<F: TransportFactory> TransportHandle<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            live: None,
            generation: 0,
        }
    }

    /// Dispose any live transport, construct a new one, and start connecting.
    /// Returns the new generation.
    pub fn open(
        &mut self,
        config: &ClientConfig,
        inbound: &mpsc::UnboundedSender<Delivery>,
    ) -> u64 {
        self.dispose();

        self.generation += 1;
        let mut transport = self.factory.create(config);
        transport.connect(InboundSink::new(self.generation, inbound.clone()));
        self.live = Some(transport);

        info!(
            generation = self.generation,
            server = %config.server_url,
            "Transport opened"
        );
        self.generation
    }

    pub fn emit(&mut self, event: OutboundEvent) -> Result<(), TransportError> {
        match self.live.as_mut() {
            Some(transport) => transport.emit(event),
            None => Err(TransportError::NotOpen),
        }
    }

    /// Disconnect and drop the live transport, if any.
    pub fn dispose(&mut self) {
        if let Some(mut transport) = self.live.take() {
            transport.disconnect();
            info!(generation = self.generation, "Transport disposed");
        }
    }

    /// Generation of the live transport, `None` when none is open.
    pub fn live_generation(&self) -> Option<u64> {
        self.live.as_ref().map(|_| self.generation)
    }

    pub fn is_open(&self) -> bool {
        self.live.is_some()
    }
}

impl<F: TransportFactory> Drop for TransportHandle<F> {
    fn drop(&mut self) {
        self.dispose();
    }
}
