use std::sync::atomic::{AtomicBool, AtomicI8, AtomicUsize, Ordering};

///
/// Thin wrapper over a machine word atomic.
///
/// Compare-exchange takes both orderings. Every lock in this crate treats a
/// failed exchange as a plain probe, so failures are `Relaxed` at call sites.
pub trait AtomicWord: Send + Sync {
    type Value: Copy + Eq;

    fn load(&self, order: Ordering) -> Self::Value;

    fn store(&self, v: Self::Value, order: Ordering);

    fn swap(&self, v: Self::Value, order: Ordering) -> Self::Value;

    fn compare_exchange(
        &self,
        current: Self::Value,
        new: Self::Value,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self::Value, Self::Value>;

    fn compare_exchange_weak(
        &self,
        current: Self::Value,
        new: Self::Value,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self::Value, Self::Value>;

    fn fetch_or(&self, v: Self::Value, order: Ordering) -> Self::Value;

    fn fetch_and(&self, v: Self::Value, order: Ordering) -> Self::Value;
}

macro_rules! impl_atomic_word {
    ($($atomic:ty => $value:ty),* $(,)?) => {
        $(
            impl AtomicWord for $atomic {
                type Value = $value;

                #[inline]
                fn load(&self, order: Ordering) -> $value {
                    <$atomic>::load(self, order)
                }

                #[inline]
                fn store(&self, v: $value, order: Ordering) {
                    <$atomic>::store(self, v, order)
                }

                #[inline]
                fn swap(&self, v: $value, order: Ordering) -> $value {
                    <$atomic>::swap(self, v, order)
                }

                #[inline]
                fn compare_exchange(
                    &self,
                    current: $value,
                    new: $value,
                    success: Ordering,
                    failure: Ordering,
                ) -> Result<$value, $value> {
                    <$atomic>::compare_exchange(
                        self,
                        current,
                        new,
                        success,
                        failure,
                    )
                }

                #[inline]
                fn compare_exchange_weak(
                    &self,
                    current: $value,
                    new: $value,
                    success: Ordering,
                    failure: Ordering,
                ) -> Result<$value, $value> {
                    <$atomic>::compare_exchange_weak(
                        self,
                        current,
                        new,
                        success,
                        failure,
                    )
                }

                #[inline]
                fn fetch_or(&self, v: $value, order: Ordering) -> $value {
                    <$atomic>::fetch_or(self, v, order)
                }

                #[inline]
                fn fetch_and(&self, v: $value, order: Ordering) -> $value {
                    <$atomic>::fetch_and(self, v, order)
                }
            }
        )*
    };
}

impl_atomic_word! {
    AtomicBool => bool,
    AtomicI8 => i8,
    AtomicUsize => usize,
}

#[cfg(test)]
mod test_atomics {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn word_compare_exchange_reports_current() {
        let w = AtomicUsize::new(4);
        assert_eq!(AtomicWord::compare_exchange(&w, 3, 8, Ordering::AcqRel, Ordering::Relaxed), Err(4));
        assert_eq!(AtomicWord::compare_exchange(&w, 4, 8, Ordering::AcqRel, Ordering::Relaxed), Ok(4));
        assert_eq!(AtomicWord::load(&w, Ordering::Acquire), 8);
    }

    #[test]
    fn word_bit_ops() {
        let w = AtomicUsize::new(0b100);
        assert_eq!(AtomicWord::fetch_or(&w, 1, Ordering::AcqRel), 0b100);
        assert_eq!(AtomicWord::fetch_and(&w, !1, Ordering::AcqRel), 0b101);
        assert_eq!(AtomicWord::load(&w, Ordering::Relaxed), 0b100);

        let b = AtomicBool::new(false);
        assert!(!AtomicWord::swap(&b, true, Ordering::AcqRel));
        assert!(AtomicWord::load(&b, Ordering::Relaxed));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn word_threaded_gate() {
        let thread_num = 8;
        let gate = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(thread_num));
        let mut guards = Vec::new();

        for _ in 0..thread_num {
            let g = gate.clone();
            let b = barrier.clone();
            guards.push(thread::spawn(move || {
                b.wait();
                for _ in 0..1000 {
                    let mut cur = AtomicWord::load(&*g, Ordering::Relaxed);
                    while let Err(seen) = AtomicWord::compare_exchange_weak(
                        &*g,
                        cur,
                        cur + 1,
                        Ordering::AcqRel,
                        Ordering::Relaxed,
                    ) {
                        cur = seen;
                    }
                }
            }));
        }

        for g in guards {
            g.join().unwrap();
        }

        assert_eq!(AtomicWord::load(&*gate, Ordering::Acquire), thread_num * 1000);
    }
}
