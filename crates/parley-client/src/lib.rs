pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod events;
pub mod log;
pub mod presence;
pub mod session;
pub mod subscriptions;
pub mod timers;
pub mod transport;
pub mod typing;

#[cfg(test)]
mod test_helpers;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use connection::ConnectionStatus;
pub use driver::{spawn_session, SessionHandle};
pub use error::{SessionError, TransportError};
pub use events::{Notice, NoticeLevel, SessionSnapshot};
pub use session::{SessionController, SessionReceivers};
pub use transport::{ChannelTransport, InboundSink, Transport, TransportCommand, TransportFactory};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parley_client=debug,parley_shared=info,warn"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Parley client logging initialised");
    }
}
