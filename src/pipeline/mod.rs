//! Pipeline entry points for watch operations.
//!
//! - `run_watch`: one full detection run over the registry listing
//! - `run_purge`: delete recent announcements for an operational reset

pub mod publish;
pub mod purge;
pub mod thread;
pub mod watch;

pub use publish::{PublishOutcome, Publisher, update_identifier};
pub use purge::run_purge;
pub use thread::ThreadChain;
pub use watch::{WatchOutcome, run_watch};
