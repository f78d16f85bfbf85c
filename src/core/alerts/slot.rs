//! Presentation slot and render bridge.
//!
//! The slot is the single place the visible alert lives. It forwards
//! visibility and data to an externally supplied renderer, which draws
//! whatever box, buttons and styling it wants.

use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};

use super::command::Command;
use super::error::AlertError;
use super::model::{AlertButton, AlertRequest, AlertTypes, Priority, ShowId};

/// Render collaborator. Receives every visibility/data change of the slot.
///
/// Implementations must eventually call the provided close handle (directly,
/// or through `AlertView::press`), otherwise the controller never gets back
/// to idle.
pub trait AlertRenderer: Send {
    fn render(&mut self, props: AlertModalProps);
}

impl<F> AlertRenderer for F
where
    F: FnMut(AlertModalProps) + Send,
{
    fn render(&mut self, props: AlertModalProps) {
        self(props);
    }
}

/// What the renderer receives.
#[derive(Debug, Clone)]
pub struct AlertModalProps {
    pub visible: bool,
    pub data: Option<AlertView>,
    pub on_close: Option<CloseHandle>,
}

impl AlertModalProps {
    fn hidden() -> Self {
        Self {
            visible: false,
            data: None,
            on_close: None,
        }
    }
}

/// Closes one presentation of an alert.
#[derive(Clone)]
pub struct CloseHandle {
    id: ShowId,
    inbox: mpsc::UnboundedSender<Command>,
}

impl CloseHandle {
    pub(crate) fn new(id: ShowId, inbox: mpsc::UnboundedSender<Command>) -> Self {
        Self { id, inbox }
    }

    pub fn id(&self) -> ShowId {
        self.id
    }

    /// Request the close. Runs the alert's `on_close`, then frees the slot.
    pub fn close(&self) {
        let command = Command::Close {
            id: self.id,
            reply: None,
        };
        if self.inbox.send(command).is_err() {
            log::warn!("Close for alert {} dropped: service stopped", self.id);
        }
    }

    /// Like `close`, but reports a panic raised by the alert's `on_close`.
    pub async fn close_and_wait(&self) -> Result<(), AlertError> {
        let (tx, rx) = oneshot::channel();
        let command = Command::Close {
            id: self.id,
            reply: Some(tx),
        };
        self.inbox
            .send(command)
            .map_err(|_| AlertError::ServiceStopped)?;
        rx.await.map_err(|_| AlertError::ServiceStopped)?
    }
}

impl fmt::Debug for CloseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CloseHandle").field(&self.id).finish()
    }
}

/// Renderer-facing copy of a presented request, with its close handle resolved.
#[derive(Debug, Clone)]
pub struct AlertView {
    pub id: ShowId,
    pub title: Option<String>,
    pub message: Option<String>,
    pub variant: Option<String>,
    pub kind: Option<String>,
    pub priority: Priority,
    pub buttons: Vec<AlertButton>,
    pub dismiss_after: Option<Duration>,
    pub backdrop_dismiss: bool,
    pub extras: Map<String, Value>,
    pub close: CloseHandle,
}

impl AlertView {
    pub(crate) fn from_request(request: &AlertRequest, close: CloseHandle) -> Self {
        Self {
            id: close.id(),
            title: request.title.clone(),
            message: request.message.clone(),
            variant: request.variant.clone(),
            kind: request.kind.clone(),
            priority: request.priority,
            buttons: request.buttons.clone(),
            dismiss_after: request.auto_dismiss(),
            backdrop_dismiss: request.backdrop_dismiss,
            extras: request.extras.clone(),
            close,
        }
    }

    /// Buttons to draw: the declared ones, or a single "OK" that closes.
    pub fn effective_buttons(&self) -> Vec<AlertButton> {
        if self.buttons.is_empty() {
            let variant = self.variant.as_deref().unwrap_or(AlertTypes::INFO);
            vec![AlertButton::new("OK").variant(variant)]
        } else {
            self.buttons.clone()
        }
    }

    /// Press a button: its handler runs, then the alert closes unless the
    /// button keeps it open. A panicking handler still closes the alert.
    pub fn press(&self, index: usize) -> Result<(), AlertError> {
        let buttons = self.effective_buttons();
        let button = buttons.get(index).ok_or(AlertError::NoSuchButton(index))?;
        let outcome = button.press();
        if button.close_on_press {
            self.close.close();
        }
        outcome
    }

    pub fn close(&self) {
        self.close.close();
    }
}

/// Single-occupancy holder of the alert currently on screen.
pub struct PresentationSlot {
    renderer: Box<dyn AlertRenderer>,
    visible: bool,
    data: Option<AlertView>,
}

impl PresentationSlot {
    pub fn new(renderer: Box<dyn AlertRenderer>) -> Self {
        Self {
            renderer,
            visible: false,
            data: None,
        }
    }

    /// Display `view`. Replaces whatever was displayed before.
    pub fn show(&mut self, view: AlertView) {
        self.visible = true;
        self.data = Some(view.clone());
        let on_close = Some(view.close.clone());
        self.renderer.render(AlertModalProps {
            visible: true,
            data: Some(view),
            on_close,
        });
    }

    pub fn hide(&mut self) {
        if !self.visible && self.data.is_none() {
            return;
        }
        self.reset();
    }

    /// Forced reset, always re-renders the empty state.
    pub fn clear_all(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.visible = false;
        self.data = None;
        self.renderer.render(AlertModalProps::hidden());
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn current(&self) -> Option<&AlertView> {
        self.data.as_ref()
    }
}

impl fmt::Debug for PresentationSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentationSlot")
            .field("visible", &self.visible)
            .field("data", &self.data.as_ref().map(|view| view.id))
            .finish_non_exhaustive()
    }
}
