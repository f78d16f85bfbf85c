// Global alert subsystem: queues modal alert requests from anywhere in the
// program and presents exactly one at a time.
//
// Architecture:
// - model.rs: Request, button and priority types
// - queue.rs: Pending request stack
// - slot.rs: Presentation slot and the render bridge
// - command.rs: Messages delivered into the controller's event loop
// - engine.rs: Admission/ordering/lifecycle state machine
// - service.rs: Runs an engine on a tokio task, owns its timers
// - facade.rs: Process-wide entry point bound to the live service

pub mod command;
pub mod engine;
pub mod error;
pub mod facade;
pub mod model;
pub mod queue;
pub mod service;
pub mod slot;

pub use engine::{AdmissionMode, AlertEngine, EngineSnapshot, Phase, Timers};
pub use error::AlertError;
pub use facade::{GlobalAlert, P};
pub use model::{AlertButton, AlertRequest, AlertTypes, Priority, ShowId};
pub use service::{AlertHandle, AlertService, AlertServiceBuilder};
pub use slot::{AlertModalProps, AlertRenderer, AlertView, CloseHandle, PresentationSlot};

#[cfg(test)]
mod testing;
#[cfg(test)]
mod sim_test;
