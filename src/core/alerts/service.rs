//! Runs an `AlertEngine` on a tokio task.
//!
//! Callers talk to it through `AlertHandle`, which only enqueues commands, so
//! every call is non-blocking and callbacks may call back in re-entrantly:
//! their commands are processed after the one currently running.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::command::Command;
use super::engine::{AdmissionMode, AlertEngine, EngineSnapshot, Timers};
use super::error::AlertError;
use super::facade::{self, FacadeBinding};
use super::model::{AlertRequest, AlertTypes, ShowId};
use super::slot::AlertRenderer;
use crate::core::config::{AlertSettings, DEFAULT_REQUEUE_DELAY_MS};

/// Timers backed by `tokio::time::sleep`, delivering into the engine inbox.
pub struct TokioTimers {
    inbox: mpsc::UnboundedSender<Command>,
    dismiss: Option<JoinHandle<()>>,
    deferred: Vec<JoinHandle<()>>,
}

impl TokioTimers {
    pub fn new(inbox: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            inbox,
            dismiss: None,
            deferred: Vec::new(),
        }
    }

    fn deliver_after(&self, after: Duration, command: Command) -> JoinHandle<()> {
        let inbox = self.inbox.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // Receiver is gone once the service stopped
            let _ = inbox.send(command);
        })
    }
}

impl Timers for TokioTimers {
    fn arm_dismiss(&mut self, id: ShowId, after: Duration) {
        self.cancel_dismiss();
        self.dismiss = Some(self.deliver_after(after, Command::Expire(id)));
    }

    fn cancel_dismiss(&mut self) {
        if let Some(handle) = self.dismiss.take() {
            handle.abort();
        }
    }

    fn schedule_process(&mut self, after: Duration) {
        self.deferred.retain(|handle| !handle.is_finished());
        let handle = self.deliver_after(after, Command::ProcessQueue);
        self.deferred.push(handle);
    }

    fn cancel_all(&mut self) {
        self.cancel_dismiss();
        for handle in self.deferred.drain(..) {
            handle.abort();
        }
    }
}

/// Cheap, cloneable sender side of a running alert service.
#[derive(Debug, Clone)]
pub struct AlertHandle {
    inbox: mpsc::UnboundedSender<Command>,
}

impl AlertHandle {
    fn send(&self, command: Command) {
        if let Err(err) = self.inbox.send(command) {
            log::error!("Alert service stopped; dropping {:?}", err.0);
        }
    }

    pub fn show(&self, request: AlertRequest) {
        self.send(Command::Show(request));
    }

    pub fn show_multiple(&self, requests: impl IntoIterator<Item = AlertRequest>) {
        let requests: Vec<AlertRequest> = requests.into_iter().collect();
        if requests.is_empty() {
            return;
        }
        self.send(Command::ShowMultiple(requests));
    }

    /// Dismiss the visible alert without running its `on_close`.
    pub fn hide(&self) {
        self.send(Command::Hide);
    }

    pub fn clear_all(&self) {
        self.send(Command::ClearAll);
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, AlertError> {
        let (tx, rx) = oneshot::channel();
        self.inbox
            .send(Command::Snapshot(tx))
            .map_err(|_| AlertError::ServiceStopped)?;
        rx.await.map_err(|_| AlertError::ServiceStopped)
    }

    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }
}

/// Configures and spawns an `AlertService`.
pub struct AlertServiceBuilder {
    renderer: Option<Box<dyn AlertRenderer>>,
    mode: AdmissionMode,
    types: AlertTypes,
    requeue_delay: Duration,
    bind_global: bool,
}

impl AlertServiceBuilder {
    fn new() -> Self {
        Self {
            renderer: None,
            mode: AdmissionMode::default(),
            types: AlertTypes::default(),
            requeue_delay: Duration::from_millis(DEFAULT_REQUEUE_DELAY_MS),
            bind_global: true,
        }
    }

    /// Required. Receives every change of the presentation slot.
    #[must_use]
    pub fn renderer(mut self, renderer: impl AlertRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    #[must_use]
    pub fn ignore_priority(mut self, ignore_priority: bool) -> Self {
        self.mode = AdmissionMode::from_ignore_priority(ignore_priority);
        self
    }

    /// Caller-defined type tags, merged over the built-in ones.
    #[must_use]
    pub fn types<K, V>(mut self, types: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.types = AlertTypes::with_custom(types);
        self
    }

    #[must_use]
    pub fn requeue_delay(mut self, delay: Duration) -> Self {
        self.requeue_delay = delay;
        self
    }

    /// Apply persisted settings.
    #[must_use]
    pub fn settings(self, settings: &AlertSettings) -> Self {
        self.ignore_priority(settings.ignore_priority)
            .requeue_delay(settings.requeue_delay())
            .types(settings.types.clone())
    }

    /// Do not bind `GlobalAlert` to this service.
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.bind_global = false;
        self
    }

    /// Start the service on the current tokio runtime.
    pub fn spawn(self) -> Result<AlertService, AlertError> {
        let renderer = self.renderer.ok_or(AlertError::MissingRenderer)?;
        let runtime = Handle::try_current().map_err(|_| AlertError::NoRuntime)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let timers = TokioTimers::new(tx.clone());
        let engine = AlertEngine::new(self.mode, renderer, timers, tx.clone())
            .with_requeue_delay(self.requeue_delay);
        let task = runtime.spawn(run_loop(engine, rx));

        let handle = AlertHandle { inbox: tx };
        let binding = self
            .bind_global
            .then(|| facade::bind(handle.clone(), self.types.clone()));
        log::info!(
            "Alert service started ({:?}, {} types{})",
            self.mode,
            self.types.len(),
            if binding.is_some() { ", global" } else { "" }
        );

        Ok(AlertService {
            handle,
            types: self.types,
            task: Some(task),
            binding,
        })
    }
}

async fn run_loop(mut engine: AlertEngine<TokioTimers>, mut inbox: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = inbox.recv().await {
        if matches!(command, Command::Shutdown) {
            break;
        }
        engine.dispatch(command);
    }
    engine.teardown();
    log::info!("Alert service stopped");
}

/// A live alert controller. Dropping it stops the service.
pub struct AlertService {
    handle: AlertHandle,
    types: AlertTypes,
    task: Option<JoinHandle<()>>,
    binding: Option<FacadeBinding>,
}

impl AlertService {
    pub fn builder() -> AlertServiceBuilder {
        AlertServiceBuilder::new()
    }

    pub fn handle(&self) -> AlertHandle {
        self.handle.clone()
    }

    pub fn types(&self) -> &AlertTypes {
        &self.types
    }

    pub fn is_global(&self) -> bool {
        self.binding.is_some()
    }

    /// Stop the service and wait for its teardown. Queued and visible alerts
    /// are dropped without running their `on_close`.
    pub async fn shutdown(mut self) {
        self.binding.take();
        self.handle.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Alert service task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for AlertService {
    fn drop(&mut self) {
        self.binding.take();
        if self.task.is_some() {
            let _ = self.handle.inbox.send(Command::Shutdown);
        }
    }
}
