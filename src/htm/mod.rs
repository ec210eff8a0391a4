#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "hw"))]
mod x86_64;

/// Transactional memory capabilities
pub mod ops;
/// Transacted critical sections with lock fallback
pub mod transact;

/// Prelude of the transactional memory layer
pub mod prelude {
    pub use super::ops::*;
    pub use super::transact::*;

    #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "hw"))]
    pub use super::x86_64::Rtm;
}
