use super::atomics::AtomicWord;
use super::constants::LOCK_BIT;
use super::policy::SpinPolicy;
use super::repr::Packed;
use super::spinlock::SpinLock;
use std::sync::atomic::Ordering;

///
/// Payload side of the pointer-packed spinlock.
///
/// The payload is stored and handed back as a bit pattern, it is never
/// dereferenced here. Whatever the pointer refers to stays owned by the
/// caller, and the lock bit only serializes callers that take the lock.
impl<T, P: SpinPolicy> SpinLock<Packed<T>, P> {
    /// Unlocked lock carrying `payload`.
    #[inline]
    pub fn new_with_payload(payload: *mut T) -> Self {
        let () = Packed::<T>::ALIGNED;
        let lock = Self::new();
        AtomicWord::store(&lock.word, Packed::pack(payload, false), Ordering::Relaxed);
        lock
    }

    /// Current payload with the lock bit masked off.
    #[inline]
    pub fn load_payload(&self) -> *mut T {
        let () = Packed::<T>::ALIGNED;
        Packed::unpack(AtomicWord::load(&self.word, Ordering::Acquire))
    }

    /// Replaces the payload, leaving the lock bit as it currently is.
    #[inline]
    pub fn store_payload(&self, payload: *mut T) {
        let () = Packed::<T>::ALIGNED;
        let bits = Packed::pack(payload, false);
        let mut cur = AtomicWord::load(&self.word, Ordering::Relaxed);
        while let Err(seen) = AtomicWord::compare_exchange_weak(
            &self.word,
            cur,
            (cur & LOCK_BIT) | bits,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            cur = seen;
        }
    }

    ///
    /// Acquires the lock and installs `payload` in the same atomic step.
    ///
    /// Returns the previous payload. The lock stays held on return; release it
    /// with [`SpinLock::unlock`] (or [`SpinLock::try_unlock`]).
    pub fn lock_and_swap_payload(&self, payload: *mut T) -> *mut T {
        let () = Packed::<T>::ALIGNED;
        let locked = Packed::pack(payload, true);
        let mut spins = 0_usize;
        loop {
            let cur = AtomicWord::load(&self.word, Ordering::Relaxed);
            if cur & LOCK_BIT != 0 {
                P::pause(spins);
                spins = spins.wrapping_add(1);
                continue;
            }
            if AtomicWord::compare_exchange_weak(
                &self.word,
                cur,
                locked,
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
            {
                break Packed::unpack(cur);
            }
        }
    }

    ///
    /// One attempt of [`lock_and_swap_payload`](Self::lock_and_swap_payload).
    ///
    /// `None` when the lock is held by somebody; the payload is then untouched.
    pub fn try_lock_and_swap_payload(&self, payload: *mut T) -> Option<*mut T> {
        let () = Packed::<T>::ALIGNED;
        let locked = Packed::pack(payload, true);
        let mut cur = AtomicWord::load(&self.word, Ordering::Relaxed);
        loop {
            if cur & LOCK_BIT != 0 {
                return None;
            }
            // Retried only while the word is free, a payload store may race us.
            match AtomicWord::compare_exchange_weak(
                &self.word,
                cur,
                locked,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(prev) => return Some(Packed::unpack(prev)),
                Err(seen) => cur = seen,
            }
        }
    }
}

#[cfg(test)]
mod test_lockable {
    use crate::sync::policy::NullSpin;
    use crate::sync::spinlock::LockablePtr;
    use std::ptr;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lockable_starts_null_and_unlocked() {
        let lp = LockablePtr::<u64, NullSpin>::new();
        assert!(lp.load_payload().is_null());
        assert!(!lp.is_locked());
    }

    #[test]
    fn store_then_load_payload() {
        let mut a = 1_u64;
        let pa: *mut u64 = &mut a;
        let lp = LockablePtr::<u64, NullSpin>::new();

        lp.store_payload(pa);
        assert_eq!(lp.load_payload(), pa);
        assert!(!lp.is_locked());
    }

    #[test]
    fn store_payload_keeps_lock_bit() {
        let (mut a, mut b) = (1_u32, 2_u32);
        let (pa, pb): (*mut u32, *mut u32) = (&mut a, &mut b);
        let lp = LockablePtr::<u32, NullSpin>::new_with_payload(pa);

        lp.lock();
        lp.store_payload(pb);
        assert!(lp.is_locked());
        assert_eq!(lp.load_payload(), pb);
        lp.unlock();
        assert!(!lp.is_locked());
        assert_eq!(lp.load_payload(), pb);
    }

    #[test]
    fn lock_and_swap_returns_previous() {
        let (mut a, mut b) = (1_u64, 2_u64);
        let (pa, pb): (*mut u64, *mut u64) = (&mut a, &mut b);
        let lp = LockablePtr::<u64, NullSpin>::new_with_payload(pa);

        assert_eq!(lp.lock_and_swap_payload(pb), pa);
        assert!(lp.is_locked());
        assert!(!lp.try_lock());
        lp.unlock();

        assert!(!lp.is_locked());
        assert_eq!(lp.load_payload(), pb);
    }

    #[test]
    fn try_lock_and_swap_fails_while_held() {
        let (mut a, mut b) = (1_u64, 2_u64);
        let (pa, pb): (*mut u64, *mut u64) = (&mut a, &mut b);
        let lp = LockablePtr::<u64, NullSpin>::new_with_payload(pa);

        lp.lock();
        assert_eq!(lp.try_lock_and_swap_payload(pb), None);
        assert_eq!(lp.load_payload(), pa);
        lp.unlock();

        assert_eq!(lp.try_lock_and_swap_payload(pb), Some(pa));
        assert!(lp.is_locked());
        lp.unlock();
        assert_eq!(lp.load_payload(), pb);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn threaded_swaps_see_every_payload_once() {
        // Payloads are distinct aligned addresses; only their bit patterns matter.
        let slots: Vec<u64> = vec![0; 9];
        let base = slots.as_ptr() as usize;
        let lp = Arc::new(LockablePtr::<u64, NullSpin>::new_with_payload(base as *mut u64));
        let mut guards = Vec::new();

        for i in 1..9_usize {
            let lp = lp.clone();
            let addr = base + i * 8;
            guards.push(thread::spawn(move || {
                let prev = lp.lock_and_swap_payload(addr as *mut u64) as usize;
                lp.unlock();
                prev
            }));
        }

        let mut seen: Vec<usize> = guards
            .into_iter()
            .map(|g| g.join().unwrap())
            .collect();
        seen.push(lp.load_payload() as usize);
        seen.sort_unstable();

        let expected: Vec<usize> = (0..9).map(|i| base + i * 8).collect();
        assert_eq!(seen, expected);
        assert!(!lp.is_locked());
        assert_ne!(lp.load_payload(), ptr::null_mut());
    }
}
