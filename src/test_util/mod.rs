//! Fakes for exercising a reporter without a real storage backend.

mod fake_storage;
mod recording_observer;
mod test_collection;

pub use fake_storage::*;
pub use recording_observer::*;
pub use test_collection::*;
