// Test doubles shared by the alert unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use super::command::Command;
use super::engine::{AdmissionMode, AlertEngine, Timers};
use super::model::ShowId;
use super::slot::{AlertModalProps, AlertRenderer, AlertView};

/// Renderer that records every frame it is handed.
#[derive(Clone, Default)]
pub struct Recorder {
    frames: Arc<Mutex<Vec<AlertModalProps>>>,
}

impl Recorder {
    pub fn renderer(&self) -> impl AlertRenderer + 'static {
        let frames = self.frames.clone();
        move |props: AlertModalProps| frames.lock().unwrap().push(props)
    }

    pub fn frames(&self) -> Vec<AlertModalProps> {
        self.frames.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<AlertModalProps> {
        self.frames.lock().unwrap().last().cloned()
    }

    /// Title of each frame, `None` for hidden frames.
    pub fn titles(&self) -> Vec<Option<String>> {
        self.frames()
            .into_iter()
            .map(|props| props.data.and_then(|view| view.title))
            .collect()
    }

    /// Titles of visible frames, in the order they were drawn.
    pub fn shown_titles(&self) -> Vec<String> {
        self.frames()
            .into_iter()
            .filter(|props| props.visible)
            .filter_map(|props| props.data.and_then(|view| view.title))
            .collect()
    }

    pub fn current_view(&self) -> Option<AlertView> {
        self.last().filter(|props| props.visible).and_then(|props| props.data)
    }
}

#[derive(Debug, Default)]
struct TimerLog {
    armed: Option<(ShowId, Duration)>,
    pending_process: usize,
    scheduled: usize,
    last_delay: Option<Duration>,
}

/// Timers that record requests; tests fire them by hand.
#[derive(Clone, Default)]
pub struct ManualTimers {
    log: Arc<Mutex<TimerLog>>,
}

impl ManualTimers {
    pub fn armed(&self) -> Option<(ShowId, Duration)> {
        self.log.lock().unwrap().armed
    }

    pub fn scheduled(&self) -> usize {
        self.log.lock().unwrap().scheduled
    }

    pub fn last_delay(&self) -> Option<Duration> {
        self.log.lock().unwrap().last_delay
    }

    fn take_pending(&self) -> usize {
        std::mem::take(&mut self.log.lock().unwrap().pending_process)
    }
}

impl Timers for ManualTimers {
    fn arm_dismiss(&mut self, id: ShowId, after: Duration) {
        self.log.lock().unwrap().armed = Some((id, after));
    }

    fn cancel_dismiss(&mut self) {
        self.log.lock().unwrap().armed = None;
    }

    fn schedule_process(&mut self, after: Duration) {
        let mut log = self.log.lock().unwrap();
        log.pending_process += 1;
        log.scheduled += 1;
        log.last_delay = Some(after);
    }
}

/// An engine wired to a recorder, manual timers and its own inbox.
pub struct Harness {
    pub engine: AlertEngine<ManualTimers>,
    pub recorder: Recorder,
    pub timers: ManualTimers,
    inbox: mpsc::UnboundedReceiver<Command>,
}

impl Harness {
    pub fn new(mode: AdmissionMode) -> Self {
        Self::with_timers(mode, ManualTimers::default())
    }

    pub fn with_timers(mode: AdmissionMode, timers: ManualTimers) -> Self {
        let recorder = Recorder::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = AlertEngine::new(mode, Box::new(recorder.renderer()), timers.clone(), tx);
        Self {
            engine,
            recorder,
            timers,
            inbox: rx,
        }
    }

    /// Deliver everything close handles have sent so far.
    pub fn pump(&mut self) {
        while let Ok(command) = self.inbox.try_recv() {
            self.engine.dispatch(command);
        }
    }

    pub fn visible_title(&self) -> Option<String> {
        self.recorder.current_view().and_then(|view| view.title)
    }

    /// Close the visible alert the way a renderer would.
    pub fn close_visible(&mut self) {
        if let Some(view) = self.recorder.current_view() {
            view.close();
            self.pump();
        }
    }

    /// Let the requeue deferral elapse.
    pub fn run_deferred(&mut self) {
        if self.timers.take_pending() > 0 {
            self.engine.dispatch(Command::ProcessQueue);
        }
    }
}
