//! Runtime — runs each coordinator on its own task behind a mailbox.

use motionlights_domain::config::LightGroupConfig;
use motionlights_domain::error::MotionLightsError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, interval_at};
use tracing::Instrument;

use crate::attribution::TOKEN_PRUNE_INTERVAL;
use crate::coordinator::{Coordinator, ExternalEvent, Inbound, Mailbox};
use crate::ports::{EntityStates, LightCommander, Scheduler};
use crate::status::CoordinatorStatus;

/// Set up a coordinator and start processing its mailbox.
///
/// The task runs until [`CoordinatorHandle::shutdown`] is called.
///
/// # Errors
///
/// Returns the setup failure; any subscription made before it is released.
pub async fn spawn<H, S>(
    name: impl Into<String>,
    config: LightGroupConfig,
    host: H,
    scheduler: S,
) -> Result<CoordinatorHandle, MotionLightsError>
where
    H: EntityStates + LightCommander + Clone + Send + Sync + 'static,
    S: Scheduler + Clone + Send + Sync + 'static,
{
    let name = name.into();
    let (mailbox, inbox) = mpsc::unbounded_channel();
    let mut coordinator = Coordinator::new(name.clone(), config, host, scheduler, mailbox.clone());
    if let Err(err) = coordinator.setup().await {
        tracing::error!(group = %name, %err, "light group setup failed");
        coordinator.shutdown().await;
        return Err(err);
    }

    let (status_tx, status_rx) = watch::channel(coordinator.status());
    let span = tracing::info_span!("light_group", group = %name);
    tokio::spawn(run(coordinator, inbox, status_tx).instrument(span));

    Ok(CoordinatorHandle {
        name,
        mailbox,
        status: status_rx,
    })
}

async fn run<H, S>(
    mut coordinator: Coordinator<H, S>,
    mut inbox: mpsc::UnboundedReceiver<Inbound>,
    status: watch::Sender<CoordinatorStatus>,
) where
    H: EntityStates + LightCommander + Clone + Send + Sync + 'static,
    S: Scheduler + Clone + Send + Sync + 'static,
{
    let mut prune = interval_at(Instant::now() + TOKEN_PRUNE_INTERVAL, TOKEN_PRUNE_INTERVAL);
    loop {
        tokio::select! {
            inbound = inbox.recv() => {
                let Some(inbound) = inbound else {
                    break;
                };
                let flow = coordinator.handle(inbound).await;
                status.send_replace(coordinator.status());
                if flow.is_break() {
                    break;
                }
            }
            _ = prune.tick() => {
                coordinator.prune_tokens();
            }
        }
    }
}

/// Cheap, cloneable access to a running coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    name: String,
    mailbox: Mailbox,
    status: watch::Receiver<CoordinatorStatus>,
}

impl CoordinatorHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, inbound: Inbound) -> Result<(), MotionLightsError> {
        self.mailbox
            .send(inbound)
            .map_err(|_| MotionLightsError::Stopped)
    }

    /// Queue an event for the coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`MotionLightsError::Stopped`] once the coordinator shut down.
    pub fn process_external_event(&self, event: ExternalEvent) -> Result<(), MotionLightsError> {
        self.send(Inbound::External(event))
    }

    /// Ask the coordinator to re-read its lights.
    ///
    /// # Errors
    ///
    /// Returns [`MotionLightsError::Stopped`] once the coordinator shut down.
    pub fn refresh_lights(&self) -> Result<(), MotionLightsError> {
        self.send(Inbound::RefreshLights)
    }

    /// Current status, computed after every event queued before this call.
    ///
    /// # Errors
    ///
    /// Returns [`MotionLightsError::Stopped`] once the coordinator shut down.
    pub async fn status(&self) -> Result<CoordinatorStatus, MotionLightsError> {
        let (reply, response) = oneshot::channel();
        self.send(Inbound::Status(reply))?;
        response.await.map_err(|_| MotionLightsError::Stopped)
    }

    /// Status published after the last processed message.
    #[must_use]
    pub fn latest_status(&self) -> CoordinatorStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified after every processed message.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<CoordinatorStatus> {
        self.status.clone()
    }

    /// Replace the configuration.
    ///
    /// # Errors
    ///
    /// Returns the validation or subscription error of the coordinator, or
    /// [`MotionLightsError::Stopped`] once it shut down.
    pub async fn reconfigure(&self, config: LightGroupConfig) -> Result<(), MotionLightsError> {
        let (reply, response) = oneshot::channel();
        self.send(Inbound::Reconfigure { config, reply })?;
        response.await.map_err(|_| MotionLightsError::Stopped)?
    }

    /// Stop the coordinator and wait for it to release its subscriptions.
    /// Does nothing when it already stopped.
    pub async fn shutdown(&self) {
        let (reply, done) = oneshot::channel();
        if self.send(Inbound::Shutdown(reply)).is_ok() {
            let _ = done.await;
        }
    }
}
