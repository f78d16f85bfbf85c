// Alert model types: what callers submit and what the controller orders on.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::AlertError;

/// Two-level arbitration order for the pending queue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Priority {
    #[default]
    Low = 0,
    High = 1,
}

impl Priority {
    pub const L: Self = Self::Low;
    pub const H: Self = Self::High;

    pub fn is_high(self) -> bool {
        self == Self::High
    }
}

/// Registry of caller-facing type tags (ERROR, WARNING, ...).
///
/// Purely decorative: the controller passes `kind`/`variant` through to the
/// renderer and never looks them up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertTypes {
    entries: BTreeMap<String, String>,
}

impl AlertTypes {
    pub const ERROR: &'static str = "ERROR";
    pub const WARNING: &'static str = "WARNING";
    pub const SUCCESS: &'static str = "SUCCESS";
    pub const INFO: &'static str = "INFO";
    pub const NOTICE: &'static str = "NOTICE";
    pub const QUESTION: &'static str = "QUESTION";
    pub const LOADING: &'static str = "LOADING";
    pub const TIP: &'static str = "TIP";

    /// Get all built-in tags
    pub fn builtin() -> &'static [&'static str] {
        &[
            Self::ERROR,
            Self::WARNING,
            Self::SUCCESS,
            Self::INFO,
            Self::NOTICE,
            Self::QUESTION,
            Self::LOADING,
            Self::TIP,
        ]
    }

    /// Merge caller-defined tags over the built-in ones. Caller entries win.
    pub fn with_custom<I, K, V>(custom: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut types = Self::default();
        for (key, value) in custom {
            types.entries.insert(key.into(), value.into());
        }
        types
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AlertTypes {
    fn default() -> Self {
        Self {
            entries: Self::builtin()
                .iter()
                .map(|tag| ((*tag).to_string(), (*tag).to_string()))
                .collect(),
        }
    }
}

/// Identifies one presentation of a request in the slot.
///
/// A request that is preempted and later re-shown gets a fresh id, so close
/// and timer events addressed to the earlier presentation are recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShowId(pub(crate) u64);

impl ShowId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type PressCallback = Arc<dyn Fn() + Send + Sync>;
pub type CloseCallback = Box<dyn FnOnce() + Send>;

/// Runs a caller callback, turning a panic into an `AlertError`.
pub(crate) fn run_guarded(callback: &'static str, f: impl FnOnce()) -> Result<(), AlertError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let err = AlertError::from_panic(callback, payload.as_ref());
        log::error!("{}", err);
        err
    })
}

/// A button rendered on an alert.
#[derive(Clone)]
pub struct AlertButton {
    pub title: Option<String>,
    pub variant: Option<String>,
    /// Close the alert after `on_press` runs (default: true)
    pub close_on_press: bool,
    on_press: Option<PressCallback>,
}

impl AlertButton {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Keep the alert open after this button is pressed.
    #[must_use]
    pub fn keep_open(mut self) -> Self {
        self.close_on_press = false;
        self
    }

    #[must_use]
    pub fn on_press(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_press = Some(Arc::new(f));
        self
    }

    pub fn has_handler(&self) -> bool {
        self.on_press.is_some()
    }

    /// Runs the press handler, if any.
    pub fn press(&self) -> Result<(), AlertError> {
        match &self.on_press {
            Some(handler) => run_guarded("on_press", || handler()),
            None => Ok(()),
        }
    }
}

impl Default for AlertButton {
    fn default() -> Self {
        Self {
            title: None,
            variant: None,
            close_on_press: true,
            on_press: None,
        }
    }
}

impl fmt::Debug for AlertButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertButton")
            .field("title", &self.title)
            .field("variant", &self.variant)
            .field("close_on_press", &self.close_on_press)
            .field("on_press", &self.on_press.is_some())
            .finish()
    }
}

/// An alert submitted by a caller.
///
/// Built with chained setters; `priority` defaults to `Low`. Once submitted the
/// controller owns it, and its `on_close` runs at most once.
#[derive(Default)]
pub struct AlertRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    /// Semantic tag, opaque to the controller
    pub variant: Option<String>,
    /// Caller type tag (see `AlertTypes`)
    pub kind: Option<String>,
    pub priority: Priority,
    pub buttons: Vec<AlertButton>,
    /// Close automatically after this long. Zero means never.
    pub dismiss_after: Option<Duration>,
    /// Hint for renderers: tapping outside the box may close it
    pub backdrop_dismiss: bool,
    /// Caller-defined fields passed through to the renderer unchanged
    pub extras: Map<String, Value>,
    on_close: Option<CloseCallback>,
}

impl AlertRequest {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn high(self) -> Self {
        self.priority(Priority::High)
    }

    #[must_use]
    pub fn button(mut self, button: AlertButton) -> Self {
        self.buttons.push(button);
        self
    }

    #[must_use]
    pub fn dismiss_after(mut self, after: Duration) -> Self {
        self.dismiss_after = Some(after);
        self
    }

    #[must_use]
    pub fn backdrop_dismiss(mut self, enabled: bool) -> Self {
        self.backdrop_dismiss = enabled;
        self
    }

    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn on_close(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }

    pub fn has_on_close(&self) -> bool {
        self.on_close.is_some()
    }

    /// Auto-dismiss delay, if one is armed for this request.
    pub fn auto_dismiss(&self) -> Option<Duration> {
        self.dismiss_after.filter(|d| !d.is_zero())
    }

    pub(crate) fn take_on_close(&mut self) -> Option<CloseCallback> {
        self.on_close.take()
    }

    /// Label used in logs and snapshots.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("<untitled>")
    }
}

impl fmt::Debug for AlertRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertRequest")
            .field("title", &self.title)
            .field("message", &self.message)
            .field("variant", &self.variant)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("buttons", &self.buttons)
            .field("dismiss_after", &self.dismiss_after)
            .field("backdrop_dismiss", &self.backdrop_dismiss)
            .field("extras", &self.extras)
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}
