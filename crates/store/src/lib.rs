pub mod entry;
pub mod error;
pub mod store;

pub use entry::{Entry, Status, StoredAnnounce};
pub use error::Error;
pub use store::EntryStore;
