/// Ifaces for spinning lock primitives
pub mod ifaces;

/// Machine word atomics used as lock state
pub mod atomics;
/// Tuning defaults
pub mod constants;
/// Pointer-packed lock payload operations
pub mod lockable;
/// Back-off policies for contended locks
pub mod policy;
/// Lock state representations
pub mod repr;
/// Reader-writer spinlock
pub mod shared;
/// Configurable spinlock and scoped guard
pub mod spinlock;

///
/// Prelude for the synchronization primitives
pub mod prelude {
    pub use super::ifaces::*;
    pub use super::policy::*;
    pub use super::repr::{Binary, LockRepr, Packed, Tristate};
    pub use super::shared::*;
    pub use super::spinlock::*;
}
