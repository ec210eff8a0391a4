use super::atomics::AtomicWord;
use super::constants::LOCK_BIT;
use crate::logic::tribool::Tribool;
use std::marker::PhantomData as marker;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicI8, AtomicUsize, Ordering};

///
/// Representation of a spinlock's state word.
///
/// # Safety
/// `try_acquire` must succeed for at most one caller between two `release`
/// calls, with `Acquire` ordering on success, and `release` must publish with
/// `Release` ordering.
pub unsafe trait LockRepr {
    type Word: AtomicWord;

    /// Unlocked state word.
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self::Word;

    fn try_acquire(word: &Self::Word) -> bool;

    fn release(word: &Self::Word);

    fn try_release(word: &Self::Word) -> bool;

    /// Relaxed probe used by the spinning side of `lock()`.
    fn is_locked(word: &Self::Word) -> bool;
}

/// Two states: unlocked, locked.
#[derive(Debug, Clone, Copy)]
pub enum Binary {}

unsafe impl LockRepr for Binary {
    type Word = AtomicBool;

    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: AtomicBool = AtomicBool::new(false);

    #[inline]
    fn try_acquire(word: &AtomicBool) -> bool {
        AtomicWord::compare_exchange(word, false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn release(word: &AtomicBool) {
        AtomicWord::store(word, false, Ordering::Release);
    }

    #[inline]
    fn try_release(word: &AtomicBool) -> bool {
        AtomicWord::compare_exchange(word, true, false, Ordering::Release, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn is_locked(word: &AtomicBool) -> bool {
        AtomicWord::load(word, Ordering::Relaxed)
    }
}

///
/// Three states carried as a [`Tribool`]: unlocked is `False`, locked is
/// `True` and `Other` marks an acquisition or release in progress.
///
/// Only `True` means the lock is exclusively held. `Other` counts as busy for
/// everybody else.
#[derive(Debug, Clone, Copy)]
pub enum Tristate {}

impl Tristate {
    const UNLOCKED: i8 = Tribool::False.as_repr();
    const LOCKED: i8 = Tribool::True.as_repr();
    const TRANSITIONING: i8 = Tribool::Other.as_repr();

    #[inline]
    pub(crate) fn state(word: &AtomicI8) -> Tribool {
        Tribool::from_repr(AtomicWord::load(word, Ordering::Acquire))
    }
}

unsafe impl LockRepr for Tristate {
    type Word = AtomicI8;

    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: AtomicI8 = AtomicI8::new(Tristate::UNLOCKED);

    #[inline]
    fn try_acquire(word: &AtomicI8) -> bool {
        if AtomicWord::compare_exchange(
            word,
            Tristate::UNLOCKED,
            Tristate::TRANSITIONING,
            Ordering::Acquire,
            Ordering::Relaxed,
        )
        .is_err()
        {
            return false;
        }
        AtomicWord::store(word, Tristate::LOCKED, Ordering::Relaxed);
        true
    }

    #[inline]
    fn release(word: &AtomicI8) {
        AtomicWord::store(word, Tristate::TRANSITIONING, Ordering::Relaxed);
        AtomicWord::store(word, Tristate::UNLOCKED, Ordering::Release);
    }

    #[inline]
    fn try_release(word: &AtomicI8) -> bool {
        if AtomicWord::compare_exchange(
            word,
            Tristate::LOCKED,
            Tristate::TRANSITIONING,
            Ordering::Relaxed,
            Ordering::Relaxed,
        )
        .is_err()
        {
            return false;
        }
        AtomicWord::store(word, Tristate::UNLOCKED, Ordering::Release);
        true
    }

    #[inline]
    fn is_locked(word: &AtomicI8) -> bool {
        AtomicWord::load(word, Ordering::Relaxed) != Tristate::UNLOCKED
    }
}

///
/// Lock flag packed into bit 0 of a word that also carries a `*mut T` payload.
///
/// `T` must be at least 2-byte aligned, which is checked at compile time.
/// A pointer whose low bit is set (e.g. a byte offset into a `T`) must never
/// be stored; that is only checked in debug builds.
pub struct Packed<T> {
    _payload: marker<fn() -> *mut T>,
}

impl<T> Packed<T> {
    pub(crate) const ALIGNED: () = assert!(
        mem::align_of::<T>() > LOCK_BIT,
        "lockable pointer payload needs an alignment of at least 2"
    );

    /// Only place a payload leaves the word as a pointer.
    #[inline]
    pub(crate) fn unpack(word: usize) -> *mut T {
        (word & !LOCK_BIT) as *mut T
    }

    /// Only place a payload enters the word.
    #[inline]
    pub(crate) fn pack(ptr: *mut T, locked: bool) -> usize {
        let bits = ptr as usize;
        debug_assert_eq!(bits & LOCK_BIT, 0, "misaligned lockable pointer payload");
        bits | if locked { LOCK_BIT } else { 0 }
    }
}

unsafe impl<T> LockRepr for Packed<T> {
    type Word = AtomicUsize;

    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: AtomicUsize = AtomicUsize::new(0);

    #[inline]
    fn try_acquire(word: &AtomicUsize) -> bool {
        AtomicWord::fetch_or(word, LOCK_BIT, Ordering::Acquire) & LOCK_BIT == 0
    }

    #[inline]
    fn release(word: &AtomicUsize) {
        AtomicWord::fetch_and(word, !LOCK_BIT, Ordering::Release);
    }

    #[inline]
    fn try_release(word: &AtomicUsize) -> bool {
        AtomicWord::fetch_and(word, !LOCK_BIT, Ordering::Release) & LOCK_BIT != 0
    }

    #[inline]
    fn is_locked(word: &AtomicUsize) -> bool {
        AtomicWord::load(word, Ordering::Relaxed) & LOCK_BIT != 0
    }
}
