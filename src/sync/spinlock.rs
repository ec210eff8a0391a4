use super::ifaces::LockIface;
use super::policy::{DefaultSpin, SpinPolicy};
use super::repr::{Binary, LockRepr, Packed, Tristate};
use crate::logic::tribool::Tribool;
use lock_api::{GuardSend, RawMutex};
use std::fmt;
use std::marker::PhantomData as marker;

///
/// Spinlock generic over the representation of its state word.
///
/// * [`Binary`]: `AtomicBool`, unlocked or locked.
/// * [`Tristate`]: [`Tribool`] state with a transitioning step on both edges.
/// * [`Packed<T>`]: lock bit packed beside a pointer payload, see [`LockablePtr`].
///
/// The lock word is the whole state; there is no owner. Locking is not
/// reentrant and any thread may unlock. Waiters are not served in any order.
pub struct SpinLock<R: LockRepr, P: SpinPolicy = DefaultSpin> {
    pub(crate) word: R::Word,
    marker: marker<fn() -> (R, P)>,
}

pub type BinarySpinLock<P = DefaultSpin> = SpinLock<Binary, P>;
pub type TristateSpinLock<P = DefaultSpin> = SpinLock<Tristate, P>;
pub type LockablePtr<T, P = DefaultSpin> = SpinLock<Packed<T>, P>;

/// Data carrying mutex on top of the binary spinlock.
pub type SpinMutex<T> = lock_api::Mutex<BinarySpinLock, T>;
pub type SpinMutexGuard<'a, T> = lock_api::MutexGuard<'a, BinarySpinLock, T>;

impl<R: LockRepr, P: SpinPolicy> SpinLock<R, P> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            word: R::INIT,
            marker,
        }
    }

    /// Single acquisition attempt, never spins and never fails spuriously.
    #[inline]
    pub fn try_lock(&self) -> bool {
        R::try_acquire(&self.word)
    }

    ///
    /// Test-and-test-and-set acquisition.
    ///
    /// While the lock is busy the word is only read, with the spin policy
    /// pausing between reads. There is no bound on the wait.
    #[inline]
    pub fn lock(&self) {
        if !R::try_acquire(&self.word) {
            self.lock_contended();
        }
    }

    /// Releases the lock. Calling this on a lock which is not held is a
    /// contract violation that goes unchecked.
    #[inline]
    pub fn unlock(&self) {
        R::release(&self.word)
    }

    /// Releases the lock only if it is held.
    #[inline]
    pub fn try_unlock(&self) -> bool {
        R::try_release(&self.word)
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        R::is_locked(&self.word)
    }

    /// Spins until the lock is acquired and returns a guard releasing it on drop.
    #[inline]
    pub fn guard(&self) -> LockGuard<'_, Self> {
        LockGuard::new(self)
    }

    #[inline]
    pub fn try_guard(&self) -> Option<LockGuard<'_, Self>> {
        LockGuard::try_new(self)
    }

    #[cold]
    fn lock_contended(&self) {
        let mut spins = 0_usize;
        loop {
            while R::is_locked(&self.word) {
                P::pause(spins);
                spins = spins.wrapping_add(1);
            }
            if R::try_acquire(&self.word) {
                break;
            }
        }
    }
}

impl<P: SpinPolicy> SpinLock<Tristate, P> {
    ///
    /// Snapshot of the tristate word.
    ///
    /// `Tribool::Other` means somebody is between states and the lock must
    /// not be assumed to be exclusively held yet.
    #[inline]
    pub fn state(&self) -> Tribool {
        Tristate::state(&self.word)
    }
}

impl<R: LockRepr, P: SpinPolicy> Default for SpinLock<R, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: LockRepr, P: SpinPolicy> fmt::Debug for SpinLock<R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLock")
            .field("locked", &R::is_locked(&self.word))
            .finish()
    }
}

unsafe impl<R: LockRepr, P: SpinPolicy> LockIface for SpinLock<R, P> {
    #[inline]
    fn lock(&self) {
        SpinLock::lock(self)
    }

    #[inline]
    fn try_lock(&self) -> bool {
        SpinLock::try_lock(self)
    }

    #[inline]
    fn is_locked(&self) -> bool {
        SpinLock::is_locked(self)
    }

    #[inline]
    fn unlock(&self) {
        SpinLock::unlock(self)
    }

    #[inline]
    fn try_unlock(&self) -> bool {
        SpinLock::try_unlock(self)
    }
}

unsafe impl<R: LockRepr, P: SpinPolicy> RawMutex for SpinLock<R, P> {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self::new();

    type GuardMarker = GuardSend;

    #[inline]
    fn lock(&self) {
        SpinLock::lock(self)
    }

    #[inline]
    fn try_lock(&self) -> bool {
        SpinLock::try_lock(self)
    }

    #[inline]
    unsafe fn unlock(&self) {
        SpinLock::unlock(self)
    }

    #[inline]
    fn is_locked(&self) -> bool {
        SpinLock::is_locked(self)
    }
}

///
/// Scoped acquisition of any [`LockIface`].
///
/// Acquired on construction, released exactly once when dropped, including
/// while unwinding.
pub struct LockGuard<'a, L: LockIface + ?Sized> {
    lock: &'a L,
}

impl<'a, L: LockIface + ?Sized> LockGuard<'a, L> {
    #[inline]
    pub fn new(lock: &'a L) -> Self {
        lock.lock();
        Self { lock }
    }

    #[inline]
    pub fn try_new(lock: &'a L) -> Option<Self> {
        if lock.try_lock() {
            Some(Self { lock })
        } else {
            None
        }
    }
}

impl<'a, L: LockIface + ?Sized> Drop for LockGuard<'a, L> {
    #[inline]
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

impl<'a, L: LockIface + ?Sized> fmt::Debug for LockGuard<'a, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").finish()
    }
}

#[cfg(test)]
mod test_spinlock {
    use super::*;
    use crate::sync::policy::{NullSpin, SpinsToYield};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn alternates<L: LockIface>(lock: &L) {
        for _ in 0..10 {
            assert!(lock.try_lock());
            assert!(lock.is_locked());
            assert!(!lock.try_lock());
            lock.unlock();
            assert!(!lock.is_locked());
        }
    }

    #[test]
    fn spinlock_create_and_lock() {
        let lock: BinarySpinLock = SpinLock::new();
        assert!(lock.try_lock());
        assert!(!lock.try_lock());
        lock.unlock();

        let _g = lock.guard();
        assert!(!lock.try_lock());
    }

    #[test]
    fn single_thread_alternation() {
        alternates(&BinarySpinLock::<NullSpin>::new());
        alternates(&TristateSpinLock::<SpinsToYield<8>>::new());
        alternates(&LockablePtr::<u32, NullSpin>::new());
    }

    #[test]
    fn guard_releases_on_scope_exit() {
        let lock = TristateSpinLock::<NullSpin>::new();
        {
            let _g = lock.guard();
            assert_eq!(lock.state(), Tribool::True);
            assert!(lock.try_guard().is_none());
        }
        assert_eq!(lock.state(), Tribool::False);
        assert!(lock.try_guard().is_some());
        assert!(!lock.is_locked());
    }

    #[test]
    fn guard_releases_on_early_return() {
        fn bail(lock: &BinarySpinLock, early: bool) -> Option<u8> {
            let _g = lock.guard();
            if early {
                return None;
            }
            Some(1)
        }

        let lock = BinarySpinLock::<DefaultSpin>::new();
        assert_eq!(bail(&lock, true), None);
        assert!(!lock.is_locked());
        assert_eq!(bail(&lock, false), Some(1));
        assert!(!lock.is_locked());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn guard_releases_on_unwind() {
        let lock = Arc::new(BinarySpinLock::<NullSpin>::new());
        let l = lock.clone();
        let res = thread::spawn(move || {
            let _g = l.guard();
            panic!("critical section failed");
        })
        .join();

        assert!(res.is_err());
        assert!(lock.try_lock());
    }

    #[test]
    fn try_unlock_only_from_locked() {
        let lock = TristateSpinLock::<NullSpin>::new();
        assert!(!lock.try_unlock());
        lock.lock();
        assert!(lock.try_unlock());
        assert!(!lock.try_unlock());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn unlock_from_another_thread() {
        let lock = Arc::new(BinarySpinLock::<NullSpin>::new());
        lock.lock();

        let l = lock.clone();
        thread::spawn(move || l.unlock()).join().unwrap();

        assert!(lock.try_lock());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn lock_waits_for_release() {
        let lock = Arc::new(TristateSpinLock::<SpinsToYield<16>>::new());
        let barrier = Arc::new(Barrier::new(2));
        lock.lock();

        let (l, b) = (lock.clone(), barrier.clone());
        let waiter = thread::spawn(move || {
            b.wait();
            l.lock();
            let seen = l.state();
            l.unlock();
            seen
        });

        barrier.wait();
        thread::sleep(std::time::Duration::from_millis(10));
        assert!(lock.is_locked());
        lock.unlock();

        assert_eq!(waiter.join().unwrap(), Tribool::True);
        assert!(!lock.is_locked());
    }

    #[test]
    fn three_locks() {
        let l1 = BinarySpinLock::<NullSpin>::new();
        let l2 = TristateSpinLock::<NullSpin>::new();
        let l3 = LockablePtr::<u64, NullSpin>::new();

        let g1 = l1.try_guard();
        let g2 = l2.try_guard();
        let g3 = l3.try_guard();

        assert!(g1.is_some());
        assert!(g2.is_some());
        assert!(g3.is_some());

        assert!(l1.try_guard().is_none());
        assert!(l2.try_guard().is_none());
        assert!(l3.try_guard().is_none());

        core::mem::drop(g3);

        assert!(l3.try_guard().is_some());
        assert!(l1.is_locked());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn spin_mutex_counter() {
        let m = Arc::new(SpinMutex::new(0_usize));
        let mut guards = Vec::new();

        for _ in 0..8 {
            let m = m.clone();
            guards.push(thread::spawn(move || {
                for _ in 0..1000 {
                    *m.lock() += 1;
                }
            }));
        }

        for g in guards {
            g.join().unwrap();
        }

        assert_eq!(*m.lock(), 8000);
    }
}
