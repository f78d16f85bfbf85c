// Messages delivered into the controller's event loop.
//
// Every mutation of the queue or the presentation slot arrives as one of these,
// including re-entrant calls made from inside alert callbacks.

use std::fmt;

use tokio::sync::oneshot;

use super::engine::EngineSnapshot;
use super::error::AlertError;
use super::model::{AlertRequest, ShowId};

pub type CloseReply = oneshot::Sender<Result<(), AlertError>>;

pub enum Command {
    Show(AlertRequest),
    ShowMultiple(Vec<AlertRequest>),
    /// Dismiss whatever is showing without running its `on_close`
    Hide,
    ClearAll,
    /// Close a presentation: caller `on_close` first, then controller cleanup
    Close {
        id: ShowId,
        reply: Option<CloseReply>,
    },
    /// Auto-dismiss timer fired
    Expire(ShowId),
    /// Deferred queue processing after a close
    ProcessQueue,
    Snapshot(oneshot::Sender<EngineSnapshot>),
    Shutdown,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Show(request) => f.debug_tuple("Show").field(request).finish(),
            Self::ShowMultiple(requests) => {
                f.debug_tuple("ShowMultiple").field(&requests.len()).finish()
            }
            Self::Hide => f.write_str("Hide"),
            Self::ClearAll => f.write_str("ClearAll"),
            Self::Close { id, reply } => f
                .debug_struct("Close")
                .field("id", id)
                .field("awaited", &reply.is_some())
                .finish(),
            Self::Expire(id) => f.debug_tuple("Expire").field(id).finish(),
            Self::ProcessQueue => f.write_str("ProcessQueue"),
            Self::Snapshot(_) => f.write_str("Snapshot"),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}
