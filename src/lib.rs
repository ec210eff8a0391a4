#![cfg_attr(
    all(any(target_arch = "x86", target_arch = "x86_64"), feature = "hw"),
    feature(stdarch_x86_rtm)
)]

/// Hardware transactional memory and lock elision
pub mod htm;
/// Three-valued logic
pub mod logic;
/// Synchronization primitives exposed by confspin
pub mod sync;

pub use htm::transact::{
    abort_transaction, run_transacted, run_transacted_nested, run_transacted_unless, Transactor,
};
pub use logic::errors::{LogicError, LogicResult};
pub use logic::tribool::Tribool;
pub use sync::ifaces::{LockIface, RwLockIface};
pub use sync::shared::{ReadGuard, SharedSpinLock, SpinRwLock};
pub use sync::spinlock::{
    BinarySpinLock, LockGuard, LockablePtr, SpinLock, SpinMutex, SpinMutexGuard,
    TristateSpinLock,
};
