use log::*;

use super::ops::*;
use crate::sync::constants::DEFAULT_TXN_RETRIES;
use crate::sync::ifaces::LockIface;
use crate::sync::spinlock::LockGuard;
use std::hint::spin_loop;
use std::{mem, ptr};

/// Aborts the enclosing hardware transaction when dropped, i.e. when the body
/// unwinds out of it. Forgotten on the normal path.
struct AbortOnUnwind<'a, C: TxnCapability>(&'a C);

impl<'a, C: TxnCapability> Drop for AbortOnUnwind<'a, C> {
    fn drop(&mut self) {
        self.0.abort(AbortCode::Unwind);
    }
}

///
/// Lock elision driver.
///
/// Runs critical sections as hardware transactions through its capability and
/// falls back to taking the lock. Both paths give the same exclusion to the
/// body and hand back whatever the body returned.
#[derive(Debug, Clone)]
pub struct Transactor<C: TxnCapability = Detected> {
    capability: C,
    retries: usize,
}

impl<C: TxnCapability + Default> Default for Transactor<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: TxnCapability> Transactor<C> {
    pub fn new(capability: C) -> Self {
        Self {
            capability,
            retries: DEFAULT_TXN_RETRIES,
        }
    }

    ///
    /// Hardware attempts made after the first transient abort before the lock
    /// is taken instead.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn retries(&self) -> usize {
        self.retries
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }

    ///
    /// Run `body` elided over `lock`.
    ///
    /// Inside a transaction the lock word is read, so it joins the read set
    /// and any thread taking the lock aborts us. A transaction which finds the
    /// lock held aborts itself, waits for the release and tries again.
    ///
    /// `body` may be started more than once but only completes once: aborted
    /// attempts leave no effects behind. A panic or error from `body` reaches
    /// the caller exactly as it would under the plain lock. A panic inside a
    /// transaction aborts it, and the panic then comes from the lock path.
    pub fn run<L, F, R>(&self, lock: &L, mut body: F) -> R
    where
        L: LockIface + ?Sized,
        F: FnMut() -> R,
    {
        if self.capability.supported() {
            let mut attempts = 0_usize;
            while attempts <= self.retries {
                attempts += 1;
                match self.capability.begin() {
                    TxnStatus::Started => {
                        if !lock.is_locked() {
                            let unwind = AbortOnUnwind(&self.capability);
                            let r = body();
                            mem::forget(unwind);
                            self.capability.commit();
                            return r;
                        }
                        self.capability.abort(AbortCode::LockHeld);
                        // Only reachable with a capability whose abort returns.
                        break;
                    }
                    TxnStatus::Aborted(cause) => {
                        trace!("txn::abort::{:?}::attempt::{}", cause, attempts);
                        if !cause.is_retryable() {
                            break;
                        }
                        if cause == AbortCause::Explicit(AbortCode::LockHeld as u8) {
                            while lock.is_locked() {
                                spin_loop();
                            }
                        }
                    }
                    TxnStatus::Unsupported => break,
                }
            }
            debug!("txn::fallback::lock::after_attempts::{}", attempts);
        }

        let _guard = LockGuard::new(lock);
        body()
    }

    ///
    /// [`run`](Self::run), unless `held` is `lock` itself.
    ///
    /// For code reachable both with and without the caller already holding
    /// `lock`: when it is held the body runs directly, inside whatever
    /// exclusion the caller has, instead of spinning on its own lock forever.
    pub fn run_unless<L, F, R>(&self, lock: &L, held: Option<&L>, mut body: F) -> R
    where
        L: LockIface + ?Sized,
        F: FnMut() -> R,
    {
        match held {
            Some(held) if ptr::eq(held, lock) => body(),
            _ => self.run(lock, body),
        }
    }

    ///
    /// Transacted section which may sit inside another transacted section.
    ///
    /// Inside a running hardware transaction the section is flattened into
    /// the enclosing one: `lock` only joins the read set, and a held `lock`
    /// aborts the whole enclosing transaction. Anywhere else, including the
    /// lock path of the enclosing section, it behaves as [`run`](Self::run).
    pub fn run_nested<L, F, R>(&self, lock: &L, mut body: F) -> R
    where
        L: LockIface + ?Sized,
        F: FnMut() -> R,
    {
        if self.capability.in_txn() {
            if !lock.is_locked() {
                return body();
            }
            self.capability.abort(AbortCode::LockHeld);
        }
        self.run(lock, body)
    }
}

///
/// Run `body` as a transacted critical section over `lock`, using the
/// process wide [`Detected`] capability and default retries.
#[inline]
pub fn run_transacted<L, F, R>(lock: &L, body: F) -> R
where
    L: LockIface + ?Sized,
    F: FnMut() -> R,
{
    Transactor::<Detected>::default().run(lock, body)
}

/// [`Transactor::run_unless`] with the process wide capability.
#[inline]
pub fn run_transacted_unless<L, F, R>(lock: &L, held: Option<&L>, body: F) -> R
where
    L: LockIface + ?Sized,
    F: FnMut() -> R,
{
    Transactor::<Detected>::default().run_unless(lock, held, body)
}

/// [`Transactor::run_nested`] with the process wide capability.
#[inline]
pub fn run_transacted_nested<L, F, R>(lock: &L, body: F) -> R
where
    L: LockIface + ?Sized,
    F: FnMut() -> R,
{
    Transactor::<Detected>::default().run_nested(lock, body)
}

///
/// Explicitly abort the running hardware transaction.
///
/// The transacted section then re-runs its body under the lock. Outside of a
/// hardware transaction, which includes every fallback run, this does nothing.
#[inline]
pub fn abort_transaction() {
    Detected.abort(AbortCode::User)
}

///
/// Transacted block over a lock.
///
/// ```
/// use confspin::transacted;
/// use confspin::sync::prelude::*;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let lock: BinarySpinLock = SpinLock::new();
/// let hits = AtomicUsize::new(0);
/// let n = transacted!(lock => {
///     hits.fetch_add(1, Ordering::Relaxed) + 1
/// });
/// assert_eq!(n, 1);
///
/// // Already inside `lock`: runs without taking it again.
/// let guard = lock.guard();
/// transacted!(lock, unless Some(&lock) => {
///     hits.fetch_add(1, Ordering::Relaxed);
/// });
/// drop(guard);
///
/// let inner: BinarySpinLock = SpinLock::new();
/// transacted!(lock => {
///     transacted!(nested inner => {
///         hits.fetch_add(1, Ordering::Relaxed);
///     })
/// });
/// assert_eq!(hits.load(Ordering::Relaxed), 3);
/// ```
#[macro_export]
macro_rules! transacted {
    (nested $lock:expr => $body:block) => {
        $crate::htm::transact::run_transacted_nested(&$lock, || $body)
    };
    ($lock:expr, unless $held:expr => $body:block) => {
        $crate::htm::transact::run_transacted_unless(&$lock, $held, || $body)
    };
    ($lock:expr => $body:block) => {
        $crate::htm::transact::run_transacted(&$lock, || $body)
    };
}
