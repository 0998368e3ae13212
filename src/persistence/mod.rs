//! Persistence primitives: append-only mutation log and document store snapshot.

mod mutation_log;
mod snapshot;

pub use mutation_log::MutationLog;
pub use snapshot::{StoreSnapshot, SNAPSHOT_VERSION};
