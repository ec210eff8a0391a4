use super::ops::*;

#[cfg(target_arch = "x86")]
use std::arch::x86::{
    _xabort, _xabort_code, _xbegin, _xend, _xtest, _XABORT_CAPACITY, _XABORT_CONFLICT,
    _XABORT_DEBUG, _XABORT_EXPLICIT, _XABORT_NESTED, _XABORT_RETRY, _XBEGIN_STARTED,
};
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    _xabort, _xabort_code, _xbegin, _xend, _xtest, _XABORT_CAPACITY, _XABORT_CONFLICT,
    _XABORT_DEBUG, _XABORT_EXPLICIT, _XABORT_NESTED, _XABORT_RETRY, _XBEGIN_STARTED,
};

/// Return code from _xbegin()
struct HwTxBeginCode(u32);

impl HwTxBeginCode {
    #[inline]
    fn started(&self) -> bool {
        self.0 == _XBEGIN_STARTED
    }

    #[inline]
    fn status(&self) -> TxnStatus {
        if self.started() {
            return TxnStatus::Started;
        }
        let cause = if self.0 & _XABORT_EXPLICIT != 0 {
            AbortCause::Explicit(_xabort_code(self.0) as u8)
        } else if self.0 & _XABORT_CONFLICT != 0 {
            AbortCause::Conflict
        } else if self.0 & _XABORT_CAPACITY != 0 {
            AbortCause::Capacity
        } else if self.0 & _XABORT_DEBUG != 0 {
            AbortCause::Debug
        } else if self.0 & _XABORT_NESTED != 0 {
            AbortCause::Nested
        } else if self.0 & _XABORT_RETRY != 0 {
            AbortCause::Retry
        } else {
            AbortCause::Unknown
        };
        TxnStatus::Aborted(cause)
    }
}

/// Intel RTM capability
#[derive(Debug, Default, Clone, Copy)]
pub struct Rtm;

unsafe impl TxnCapability for Rtm {
    fn supported(&self) -> bool {
        std::is_x86_feature_detected!("rtm")
    }

    #[inline]
    fn begin(&self) -> TxnStatus {
        unsafe { HwTxBeginCode(_xbegin()) }.status()
    }

    #[inline]
    fn commit(&self) {
        unsafe { _xend() }
    }

    #[inline]
    fn abort(&self, code: AbortCode) {
        // Outside of a transaction xabort is a no-op.
        unsafe {
            match code {
                AbortCode::User => _xabort(0x01),
                AbortCode::Unwind => _xabort(0x02),
                AbortCode::LockHeld => _xabort(0xff),
            }
        }
    }

    #[inline]
    fn in_txn(&self) -> bool {
        unsafe { _xtest() != 0 }
    }
}
