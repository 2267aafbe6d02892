pub mod memory;
pub mod store;
pub mod sweeper;
pub mod valkey;

pub use memory::MemoryRevocationStore;
pub use store::{
    RevocationEntry, RevocationError, RevocationStore, TokenFingerprint, saturating_add,
};
pub use valkey::ValkeyRevocationStore;
