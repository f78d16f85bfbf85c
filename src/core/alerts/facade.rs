// Process-wide entry point to the live alert service.
//
// The binding is installed when a service spawns and reset when it stops.
// Last binder wins; running two bound services at once is not supported, and
// stopping either one unbinds the facade.

use std::sync::{PoisonError, RwLock};

use lazy_static::lazy_static;

use super::error::AlertError;
use super::model::{AlertRequest, AlertTypes, Priority};
use super::service::AlertHandle;

/// Short alias for `Priority`: `P::H`, `P::L`.
pub type P = Priority;

struct Binding {
    handle: Option<AlertHandle>,
    types: AlertTypes,
}

impl Binding {
    fn unbound() -> Self {
        Self {
            handle: None,
            types: AlertTypes::default(),
        }
    }
}

lazy_static! {
    static ref GLOBAL_BINDING: RwLock<Binding> = RwLock::new(Binding::unbound());
}

/// Resets the facade when dropped.
pub struct FacadeBinding {
    _private: (),
}

impl Drop for FacadeBinding {
    fn drop(&mut self) {
        let mut binding = GLOBAL_BINDING
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *binding = Binding::unbound();
        log::debug!("GlobalAlert unbound");
    }
}

pub(crate) fn bind(handle: AlertHandle, types: AlertTypes) -> FacadeBinding {
    let mut binding = GLOBAL_BINDING
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if binding.handle.is_some() {
        log::warn!("GlobalAlert was already bound; the newest alert service takes over");
    }
    *binding = Binding {
        handle: Some(handle),
        types,
    };
    FacadeBinding { _private: () }
}

fn live_handle() -> Option<AlertHandle> {
    GLOBAL_BINDING
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .handle
        .clone()
}

/// Show alerts from anywhere without holding a handle.
///
/// Calls made while no service is running are logged and ignored.
pub struct GlobalAlert;

impl GlobalAlert {
    pub fn show(request: AlertRequest) {
        match live_handle() {
            Some(handle) => handle.show(request),
            None => log::error!(
                "GlobalAlert::show called before an alert service was started: {:?}",
                request
            ),
        }
    }

    pub fn show_multiple(requests: impl IntoIterator<Item = AlertRequest>) {
        match live_handle() {
            Some(handle) => handle.show_multiple(requests),
            None => {
                let requests: Vec<AlertRequest> = requests.into_iter().collect();
                log::error!(
                    "GlobalAlert::show_multiple called before an alert service was started: {:?}",
                    requests
                );
            }
        }
    }

    pub fn hide() {
        match live_handle() {
            Some(handle) => handle.hide(),
            None => log::error!("GlobalAlert::hide called before an alert service was started"),
        }
    }

    pub fn clear_all() {
        match live_handle() {
            Some(handle) => handle.clear_all(),
            None => {
                log::error!("GlobalAlert::clear_all called before an alert service was started")
            }
        }
    }

    /// Type tags of the bound service, or the built-in ones when unbound.
    pub fn types() -> AlertTypes {
        GLOBAL_BINDING
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .types
            .clone()
    }

    pub fn type_name(key: &str) -> Option<String> {
        GLOBAL_BINDING
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .types
            .get(key)
            .map(str::to_string)
    }

    /// The bound service's handle, for callers that want to hold one.
    pub fn handle() -> Result<AlertHandle, AlertError> {
        live_handle().ok_or(AlertError::NotMounted)
    }

    pub fn is_live() -> bool {
        live_handle().is_some()
    }
}
