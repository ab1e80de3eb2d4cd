//! Runs a [`SessionController`] on its own tokio task.
//!
//! Commands go *into* the task over a bounded channel and are answered over
//! oneshot replies. Snapshots of the session come *out* on a watch channel
//! after every handled command, delivery or timer firing; notices come out
//! on their own channel.

use parley_shared::Attachment;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::events::{Notice, SessionSnapshot};
use crate::session::SessionController;
use crate::transport::TransportFactory;

const COMMAND_CHANNEL_SIZE: usize = 64;

type Reply = oneshot::Sender<Result<(), SessionError>>;

/// Commands sent *into* the session task.
#[derive(Debug)]
pub enum SessionCommand {
    Join {
        username: String,
        avatar: String,
        reply: Reply,
    },
    SendMessage {
        text: String,
        file: Option<Attachment>,
        reply: Reply,
    },
    ShareFile {
        file: Attachment,
        reply: Reply,
    },
    Keystroke(Reply),
    Leave(Reply),
    Retry(Reply),
    /// Release the transport and stop the task.
    Shutdown,
}

/// Client side of a running session.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    pub snapshots: watch::Receiver<SessionSnapshot>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

impl SessionHandle {
    /// Store the identity and announce it to the server.
    pub async fn join(&self, username: &str, avatar: &str) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Join {
            username: username.to_string(),
            avatar: avatar.to_string(),
            reply,
        })
        .await
    }

    pub async fn send_message(
        &self,
        text: &str,
        file: Option<Attachment>,
    ) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::SendMessage {
            text: text.to_string(),
            file,
            reply,
        })
        .await
    }

    pub async fn share_file(&self, file: Attachment) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::ShareFile { file, reply })
            .await
    }

    pub async fn keystroke(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Keystroke).await
    }

    pub async fn leave(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Leave).await
    }

    pub async fn retry(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Retry).await
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Stop the session task. Further requests fail with [`SessionError::Closed`].
    pub async fn shutdown(&self) {
        if self.commands.send(SessionCommand::Shutdown).await.is_err() {
            debug!("Session task already stopped");
        }
    }

    async fn request(
        &self,
        build: impl FnOnce(Reply) -> SessionCommand,
    ) -> Result<(), SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(build(reply_tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        reply_rx.await.map_err(|_| SessionError::Closed)?
    }
}

/// Spawn the session task and start connecting.
///
/// Must be called inside a tokio runtime.
pub fn spawn_session<F>(config: ClientConfig, factory: F) -> SessionHandle
where
    F: TransportFactory,
{
    let (controller, receivers) = SessionController::new(config, factory);
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    let (snap_tx, snap_rx) = watch::channel(controller.snapshot());

    tokio::spawn(run_session(
        controller,
        cmd_rx,
        receivers.inbound,
        receivers.timers,
        snap_tx,
    ));

    SessionHandle {
        commands: cmd_tx,
        snapshots: snap_rx,
        notices: receivers.notices,
    }
}

async fn run_session<F: TransportFactory>(
    mut controller: SessionController<F>,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut inbound: mpsc::UnboundedReceiver<crate::transport::Delivery>,
    mut timers: mpsc::UnboundedReceiver<crate::timers::TimerFired>,
    snapshots: watch::Sender<SessionSnapshot>,
) {
    controller.start();
    snapshots.send_replace(controller.snapshot());

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(SessionCommand::Shutdown) | None => break,
                Some(cmd) => handle_command(&mut controller, cmd),
            },
            Some(delivery) = inbound.recv() => controller.handle_delivery(delivery),
            Some(fired) = timers.recv() => controller.handle_timer(fired),
        }
        snapshots.send_replace(controller.snapshot());
    }

    controller.shutdown();
    snapshots.send_replace(controller.snapshot());
    info!("Session task stopped");
}

fn handle_command<F: TransportFactory>(controller: &mut SessionController<F>, cmd: SessionCommand) {
    match cmd {
        SessionCommand::Join {
            username,
            avatar,
            reply,
        } => {
            let result = controller.join(&username, &avatar);
            let joined = result.is_ok();
            let _ = reply.send(result);
            // The chat view mounts after the join succeeds and only then
            // attaches its listeners.
            if joined {
                if let Err(e) = controller.attach_listeners() {
                    debug!(error = %e, "Failed to attach chat listeners");
                }
            }
        }
        SessionCommand::SendMessage { text, file, reply } => {
            let _ = reply.send(controller.send_message(&text, file));
        }
        SessionCommand::ShareFile { file, reply } => {
            let _ = reply.send(controller.share_file(file));
        }
        SessionCommand::Keystroke(reply) => {
            let _ = reply.send(controller.keystroke());
        }
        SessionCommand::Leave(reply) => {
            controller.leave();
            let _ = reply.send(Ok(()));
        }
        SessionCommand::Retry(reply) => {
            let _ = reply.send(controller.retry());
        }
        SessionCommand::Shutdown => {}
    }
}
