mod space_store;
mod sweep_lock;

pub use space_store::{ChildStream, DeleteReport, SpaceStore, SpaceStream};
pub use sweep_lock::SweepLock;
