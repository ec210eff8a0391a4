use lazy_static::*;
use log::*;

// Intel RTM
#[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "hw"))]
type Hardware = super::x86_64::Rtm;

#[cfg(not(all(any(target_arch = "x86", target_arch = "x86_64"), feature = "hw")))]
type Hardware = AlwaysFallback;

lazy_static! {
    static ref HW_SUPPORTED: bool = {
        let supported = Hardware::default().supported();
        debug!("htm::detect::hardware_transactions::{}", supported);
        supported
    };
}

/// Outcome of beginning a transactional region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStatus {
    /// Execution is now transactional
    Started,
    /// The region aborted and execution resumed at `begin`
    Aborted(AbortCause),
    /// No transactional hardware behind this capability
    Unsupported,
}

/// Why a transactional region aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortCause {
    Explicit(u8),
    Conflict,
    Capacity,
    Retry,
    Debug,
    Nested,
    Unknown,
}

impl AbortCause {
    ///
    /// Transient causes worth another hardware attempt. Capacity overflows,
    /// user aborts and unwinding bodies would fail the same way again.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        match self {
            AbortCause::Conflict | AbortCause::Retry | AbortCause::Unknown => true,
            AbortCause::Explicit(code) => *code == AbortCode::LockHeld as u8,
            AbortCause::Capacity | AbortCause::Debug | AbortCause::Nested => false,
        }
    }
}

/// Explicit abort codes raised by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortCode {
    /// Raised through [`abort_transaction`](super::transact::abort_transaction)
    User = 0x01,
    /// The body unwound out of the transaction
    Unwind = 0x02,
    /// The elided lock was observed held inside the transaction
    LockHeld = 0xff,
}

///
/// Unified interface for transactional memory at hardware level.
///
/// # Safety
/// [`TxnStatus::Started`] must only be reported when every memory access up
/// to [`TxnCapability::commit`] becomes visible atomically, or not at all.
pub unsafe trait TxnCapability {
    ///
    /// Runtime: TM hw feature existence
    fn supported(&self) -> bool;

    ///
    /// Begin transactional region
    fn begin(&self) -> TxnStatus;

    ///
    /// Commit or end the transactional region
    fn commit(&self);

    ///
    /// Abort the transactional region, resuming at `begin`. No-op outside of one.
    fn abort(&self, code: AbortCode);

    ///
    /// Test if we're in txn region
    fn in_txn(&self) -> bool;
}

/// Capability without hardware, every critical section takes the lock.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysFallback;

unsafe impl TxnCapability for AlwaysFallback {
    #[inline]
    fn supported(&self) -> bool {
        false
    }

    #[inline]
    fn begin(&self) -> TxnStatus {
        TxnStatus::Unsupported
    }

    #[inline]
    fn commit(&self) {}

    #[inline]
    fn abort(&self, _code: AbortCode) {}

    #[inline]
    fn in_txn(&self) -> bool {
        false
    }
}

///
/// Capability picked once per process: hardware transactions when the crate is
/// built with the `hw` feature and the CPU has them, lock fallback otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detected;

unsafe impl TxnCapability for Detected {
    #[inline]
    fn supported(&self) -> bool {
        *HW_SUPPORTED
    }

    #[inline]
    fn begin(&self) -> TxnStatus {
        if *HW_SUPPORTED {
            Hardware::default().begin()
        } else {
            TxnStatus::Unsupported
        }
    }

    #[inline]
    fn commit(&self) {
        if *HW_SUPPORTED {
            Hardware::default().commit()
        }
    }

    #[inline]
    fn abort(&self, code: AbortCode) {
        if *HW_SUPPORTED {
            Hardware::default().abort(code)
        }
    }

    #[inline]
    fn in_txn(&self) -> bool {
        *HW_SUPPORTED && Hardware::default().in_txn()
    }
}
