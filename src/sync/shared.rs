use super::atomics::AtomicWord;
use super::ifaces::{LockIface, RwLockIface};
use super::policy::{DefaultSpin, SpinPolicy};
use super::spinlock::LockGuard;
use lock_api::{GuardSend, RawRwLock};
use std::fmt;
use std::marker::PhantomData as marker;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Writer flag, the remaining bits count readers.
const WRITER: usize = isize::MIN as usize;
const READERS: usize = !WRITER;

///
/// Reader-writer spinlock.
///
/// The state is one word: the top bit marks a writer, the bits below it count
/// the readers inside. A spinning writer claims the writer bit first, so
/// readers arriving after it back off, and then waits for the readers already
/// inside to leave. Nobody is served in any order beyond that.
///
/// Exclusive access goes through [`LockIface`], so the write side works with
/// [`LockGuard`] and transacted sections like every other lock in the crate.
pub struct SharedSpinLock<P: SpinPolicy = DefaultSpin> {
    word: AtomicUsize,
    marker: marker<fn() -> P>,
}

/// Data carrying reader-writer lock on top of [`SharedSpinLock`].
pub type SpinRwLock<T> = lock_api::RwLock<SharedSpinLock, T>;
pub type SpinRwLockReadGuard<'a, T> = lock_api::RwLockReadGuard<'a, SharedSpinLock, T>;
pub type SpinRwLockWriteGuard<'a, T> = lock_api::RwLockWriteGuard<'a, SharedSpinLock, T>;

impl<P: SpinPolicy> SharedSpinLock<P> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            word: AtomicUsize::new(0),
            marker,
        }
    }

    /// Joins the readers unless a writer holds or waits for the lock.
    #[inline]
    pub fn try_lock_read(&self) -> bool {
        let mut cur = AtomicWord::load(&self.word, Ordering::Relaxed);
        loop {
            if cur & WRITER != 0 {
                return false;
            }
            debug_assert_ne!(cur & READERS, READERS, "shared spinlock reader overflow");
            match AtomicWord::compare_exchange_weak(
                &self.word,
                cur,
                cur + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(seen) => cur = seen,
            }
        }
    }

    pub fn lock_read(&self) {
        let mut spins = 0_usize;
        while !self.try_lock_read() {
            while AtomicWord::load(&self.word, Ordering::Relaxed) & WRITER != 0 {
                P::pause(spins);
                spins = spins.wrapping_add(1);
            }
        }
    }

    /// Leaves the readers. `false` when no reader is inside.
    #[inline]
    pub fn try_release_read(&self) -> bool {
        let mut cur = AtomicWord::load(&self.word, Ordering::Relaxed);
        loop {
            if cur & READERS == 0 {
                return false;
            }
            match AtomicWord::compare_exchange_weak(
                &self.word,
                cur,
                cur - 1,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(seen) => cur = seen,
            }
        }
    }

    #[inline]
    pub fn unlock_read(&self) {
        let released = self.try_release_read();
        debug_assert!(released, "read unlock of a shared spinlock without readers");
    }

    /// Takes the lock exclusively, only when nobody holds it in any mode.
    #[inline]
    pub fn try_lock_write(&self) -> bool {
        AtomicWord::compare_exchange(&self.word, 0, WRITER, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub fn lock_write(&self) {
        if self.try_lock_write() {
            return;
        }

        let mut spins = 0_usize;
        let mut cur = AtomicWord::load(&self.word, Ordering::Relaxed);
        loop {
            if cur & WRITER == 0 {
                match AtomicWord::compare_exchange_weak(
                    &self.word,
                    cur,
                    cur | WRITER,
                    Ordering::Acquire,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break,
                    Err(seen) => {
                        cur = seen;
                        continue;
                    }
                }
            }
            P::pause(spins);
            spins = spins.wrapping_add(1);
            cur = AtomicWord::load(&self.word, Ordering::Relaxed);
        }

        // Readers admitted before the writer bit went up drain out.
        while AtomicWord::load(&self.word, Ordering::Acquire) != WRITER {
            P::pause(spins);
            spins = spins.wrapping_add(1);
        }
    }

    /// Releases exclusive ownership. `false` when no writer holds the lock
    /// or a claiming writer still waits for readers.
    #[inline]
    pub fn try_release_write(&self) -> bool {
        AtomicWord::compare_exchange(&self.word, WRITER, 0, Ordering::Release, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    pub fn unlock_write(&self) {
        let prev = AtomicWord::swap(&self.word, 0, Ordering::Release);
        debug_assert_eq!(prev, WRITER, "write unlock of a shared spinlock not held for writing");
    }

    /// Held in any mode, or claimed by a waiting writer.
    #[inline]
    pub fn is_locked(&self) -> bool {
        AtomicWord::load(&self.word, Ordering::Relaxed) != 0
    }

    #[inline]
    pub fn is_write_locked(&self) -> bool {
        AtomicWord::load(&self.word, Ordering::Relaxed) & WRITER != 0
    }

    /// Readers inside at the moment of the load.
    #[inline]
    pub fn readers(&self) -> usize {
        AtomicWord::load(&self.word, Ordering::Relaxed) & READERS
    }

    #[inline]
    pub fn read(&self) -> ReadGuard<'_, P> {
        ReadGuard::new(self)
    }

    #[inline]
    pub fn try_read(&self) -> Option<ReadGuard<'_, P>> {
        ReadGuard::try_new(self)
    }

    #[inline]
    pub fn write(&self) -> LockGuard<'_, Self> {
        LockGuard::new(self)
    }

    #[inline]
    pub fn try_write(&self) -> Option<LockGuard<'_, Self>> {
        LockGuard::try_new(self)
    }
}

impl<P: SpinPolicy> Default for SharedSpinLock<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SpinPolicy> fmt::Debug for SharedSpinLock<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSpinLock")
            .field("writer", &self.is_write_locked())
            .field("readers", &self.readers())
            .finish()
    }
}

unsafe impl<P: SpinPolicy> RwLockIface for SharedSpinLock<P> {
    #[inline]
    fn try_lock_read(&self) -> bool {
        SharedSpinLock::try_lock_read(self)
    }

    #[inline]
    fn try_release_read(&self) -> bool {
        SharedSpinLock::try_release_read(self)
    }

    #[inline]
    fn try_lock_write(&self) -> bool {
        SharedSpinLock::try_lock_write(self)
    }

    #[inline]
    fn try_release_write(&self) -> bool {
        SharedSpinLock::try_release_write(self)
    }
}

unsafe impl<P: SpinPolicy> LockIface for SharedSpinLock<P> {
    #[inline]
    fn lock(&self) {
        self.lock_write()
    }

    #[inline]
    fn try_lock(&self) -> bool {
        self.try_lock_write()
    }

    #[inline]
    fn is_locked(&self) -> bool {
        SharedSpinLock::is_locked(self)
    }

    #[inline]
    fn unlock(&self) {
        self.unlock_write()
    }

    #[inline]
    fn try_unlock(&self) -> bool {
        self.try_release_write()
    }
}

unsafe impl<P: SpinPolicy> RawRwLock for SharedSpinLock<P> {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self::new();

    type GuardMarker = GuardSend;

    #[inline]
    fn lock_shared(&self) {
        self.lock_read()
    }

    #[inline]
    fn try_lock_shared(&self) -> bool {
        SharedSpinLock::try_lock_read(self)
    }

    #[inline]
    unsafe fn unlock_shared(&self) {
        self.unlock_read()
    }

    #[inline]
    fn lock_exclusive(&self) {
        self.lock_write()
    }

    #[inline]
    fn try_lock_exclusive(&self) -> bool {
        SharedSpinLock::try_lock_write(self)
    }

    #[inline]
    unsafe fn unlock_exclusive(&self) {
        self.unlock_write()
    }
}

/// Shared acquisition of a [`SharedSpinLock`], left when dropped.
pub struct ReadGuard<'a, P: SpinPolicy = DefaultSpin> {
    lock: &'a SharedSpinLock<P>,
}

impl<'a, P: SpinPolicy> ReadGuard<'a, P> {
    #[inline]
    pub fn new(lock: &'a SharedSpinLock<P>) -> Self {
        lock.lock_read();
        Self { lock }
    }

    #[inline]
    pub fn try_new(lock: &'a SharedSpinLock<P>) -> Option<Self> {
        if lock.try_lock_read() {
            Some(Self { lock })
        } else {
            None
        }
    }
}

impl<'a, P: SpinPolicy> Drop for ReadGuard<'a, P> {
    #[inline]
    fn drop(&mut self) {
        self.lock.unlock_read();
    }
}

impl<'a, P: SpinPolicy> fmt::Debug for ReadGuard<'a, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadGuard").finish()
    }
}
