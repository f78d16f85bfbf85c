// Alert engine - the admission controller.
//
// Owns the pending queue and the presentation slot, decides which request is
// visible, and drives the auto-dismiss timer. At most one request occupies the
// slot at any instant.

use std::time::Duration;

use tokio::sync::mpsc;

use super::command::Command;
use super::error::AlertError;
use super::model::{AlertRequest, Priority, ShowId};
use super::queue::PendingQueue;
use super::slot::{AlertRenderer, AlertView, CloseHandle, PresentationSlot};
use crate::core::config::DEFAULT_REQUEUE_DELAY_MS;

/// How submissions are arbitrated. Chosen once per engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdmissionMode {
    /// New submissions supersede queued LOW requests; a preempted HIGH
    /// request goes back on the queue, a preempted LOW one is dropped.
    #[default]
    PriorityAware,
    /// Every submission preempts and shows immediately; the preempted
    /// request always goes back on the queue.
    IgnorePriority,
}

impl AdmissionMode {
    pub fn from_ignore_priority(ignore_priority: bool) -> Self {
        if ignore_priority {
            Self::IgnorePriority
        } else {
            Self::PriorityAware
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Showing,
    /// Mid-swap between hiding the current request and showing the next
    Preempting,
}

/// Timer side effects requested by the engine.
pub trait Timers {
    /// Arm the single auto-dismiss timer for `id`, replacing any armed one.
    fn arm_dismiss(&mut self, id: ShowId, after: Duration);
    fn cancel_dismiss(&mut self);
    /// Deliver `Command::ProcessQueue` after `after`.
    fn schedule_process(&mut self, after: Duration);
    fn cancel_all(&mut self) {
        self.cancel_dismiss();
    }
}

/// Point-in-time view of the engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub phase: Phase,
    pub current: Option<ShowId>,
    pub current_title: Option<String>,
    /// Queued labels, bottom of the stack first
    pub queued: Vec<String>,
}

impl EngineSnapshot {
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle && self.current.is_none()
    }
}

struct Presented {
    id: ShowId,
    request: AlertRequest,
}

pub struct AlertEngine<T: Timers> {
    mode: AdmissionMode,
    phase: Phase,
    queue: PendingQueue,
    slot: PresentationSlot,
    current: Option<Presented>,
    timers: T,
    inbox: mpsc::UnboundedSender<Command>,
    requeue_delay: Duration,
    next_id: u64,
}

impl<T: Timers> AlertEngine<T> {
    /// `inbox` is where close handles handed to the renderer deliver their
    /// `Command::Close`.
    pub fn new(
        mode: AdmissionMode,
        renderer: Box<dyn AlertRenderer>,
        timers: T,
        inbox: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            mode,
            phase: Phase::Idle,
            queue: PendingQueue::new(),
            slot: PresentationSlot::new(renderer),
            current: None,
            timers,
            inbox,
            requeue_delay: Duration::from_millis(DEFAULT_REQUEUE_DELAY_MS),
            next_id: 0,
        }
    }

    #[must_use]
    pub fn with_requeue_delay(mut self, delay: Duration) -> Self {
        self.requeue_delay = delay;
        self
    }

    pub fn mode(&self) -> AdmissionMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_showing(&self) -> bool {
        self.phase == Phase::Showing
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn current_id(&self) -> Option<ShowId> {
        self.current.as_ref().map(|presented| presented.id)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase,
            current: self.current_id(),
            current_title: self
                .current
                .as_ref()
                .map(|presented| presented.request.label().to_string()),
            queued: self
                .queue
                .iter()
                .map(|request| request.label().to_string())
                .collect(),
        }
    }

    /// Apply one command from the event loop. `Shutdown` is handled by the loop.
    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::Show(request) => self.submit(request),
            Command::ShowMultiple(requests) => self.submit_batch(requests),
            Command::Hide => self.dismiss_current(),
            Command::ClearAll => self.clear_all(),
            Command::Close { id, reply } => {
                let outcome = self.close(id);
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            }
            Command::Expire(id) => self.expire(id),
            Command::ProcessQueue => self.process_queue(),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown => self.teardown(),
        }
    }

    pub fn submit(&mut self, request: AlertRequest) {
        log::debug!(
            "Submit {:?} alert '{}' ({:?})",
            request.priority,
            request.label(),
            self.mode
        );
        match self.mode {
            AdmissionMode::PriorityAware => {
                let superseded = self.queue.retain_high();
                if superseded > 0 {
                    log::debug!("Superseded {} queued LOW alert(s)", superseded);
                }
                if let Some(preempted) = self.preempt() {
                    if preempted.request.priority == Priority::High {
                        self.queue.push(preempted.request);
                    } else {
                        log::debug!("Dropped preempted LOW alert '{}'", preempted.request.label());
                    }
                }
                self.queue.push(request);
                self.process_queue();
            }
            AdmissionMode::IgnorePriority => {
                if let Some(preempted) = self.preempt() {
                    self.queue.push(preempted.request);
                }
                self.present(request);
            }
        }
    }

    /// Submit each request in order. Not atomic: every element goes through
    /// the full `submit` protocol.
    pub fn submit_batch(&mut self, requests: Vec<AlertRequest>) {
        if requests.is_empty() {
            log::debug!("Ignoring empty alert batch");
            return;
        }
        for request in requests {
            self.submit(request);
        }
    }

    /// Show the next queued request if nothing is showing.
    pub fn process_queue(&mut self) {
        if self.is_showing() {
            return;
        }
        if let Some(next) = self.queue.pop() {
            self.present(next);
        }
    }

    /// Close presentation `id`: the request's `on_close` runs first, then the
    /// slot is freed and the queue re-processed after the requeue delay,
    /// whether or not the callback panicked. Stale ids are ignored.
    pub fn close(&mut self, id: ShowId) -> Result<(), AlertError> {
        let on_close = match self.current.as_mut() {
            Some(presented) if presented.id == id => presented.request.take_on_close(),
            _ => {
                log::debug!("Ignoring close for stale alert {}", id);
                return Ok(());
            }
        };

        let outcome = match on_close {
            Some(callback) => super::model::run_guarded("on_close", callback),
            None => Ok(()),
        };
        self.release();
        outcome
    }

    /// Auto-dismiss timer fired for `id`.
    pub fn expire(&mut self, id: ShowId) {
        if self.current_id() != Some(id) {
            log::debug!("Ignoring stale dismiss timer for alert {}", id);
            return;
        }
        log::debug!("Auto-dismissing alert {}", id);
        // Panic already logged by run_guarded; nobody else observes a timer close.
        let _ = self.close(id);
    }

    /// Cleanup path of a close, without running the request's `on_close`.
    pub fn dismiss_current(&mut self) {
        if let Some(presented) = &self.current {
            log::debug!("Dismissing alert {}", presented.id);
        }
        self.release();
    }

    /// Hard abort: empties the queue and the slot. No `on_close` runs.
    pub fn clear_all(&mut self) {
        let dropped = self.queue.clear();
        self.timers.cancel_dismiss();
        let had_current = self.current.take().is_some();
        self.slot.clear_all();
        self.phase = Phase::Idle;
        log::debug!(
            "Cleared {} queued alert(s){}",
            dropped,
            if had_current { " and the visible one" } else { "" }
        );
    }

    /// Forced return to idle when the owning service stops.
    pub fn teardown(&mut self) {
        self.queue.clear();
        self.timers.cancel_all();
        self.current = None;
        self.slot.clear_all();
        self.phase = Phase::Idle;
    }

    fn present(&mut self, request: AlertRequest) {
        self.next_id += 1;
        let id = ShowId(self.next_id);
        let view = AlertView::from_request(&request, CloseHandle::new(id, self.inbox.clone()));

        self.timers.cancel_dismiss();
        if let Some(after) = request.auto_dismiss() {
            self.timers.arm_dismiss(id, after);
        }

        log::debug!("Showing alert {} '{}'", id, request.label());
        self.phase = Phase::Showing;
        self.current = Some(Presented { id, request });
        self.slot.show(view);
    }

    /// Hide whatever is showing and hand it back to the caller.
    fn preempt(&mut self) -> Option<Presented> {
        let preempted = self.current.take()?;
        log::debug!("Preempting alert {}", preempted.id);
        self.phase = Phase::Preempting;
        self.timers.cancel_dismiss();
        self.slot.hide();
        self.phase = Phase::Idle;
        Some(preempted)
    }

    fn release(&mut self) {
        self.timers.cancel_dismiss();
        self.current = None;
        self.slot.hide();
        self.phase = Phase::Idle;
        self.timers.schedule_process(self.requeue_delay);
    }
}
