use super::constants::*;
use std::hint::spin_loop;
use std::thread;

/// Single step of back-off a spin policy asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Processor pause hint, the thread keeps running
    Pause,
    /// Give the rest of the time slice to the scheduler
    Yield,
    /// Suspend the thread for a microsecond quantum
    Sleep,
}

///
/// Back-off taken between failed acquisition attempts.
///
/// `spins` counts the pauses already taken by the current `lock()` call.
pub trait SpinPolicy {
    fn backoff(spins: usize) -> Backoff;

    #[inline]
    fn pause(spins: usize) {
        match Self::backoff(spins) {
            Backoff::Pause => spin_loop(),
            Backoff::Yield => thread::yield_now(),
            Backoff::Sleep => thread::sleep(SPIN_SLEEP),
        }
    }
}

/// Plain busy-wait, one processor pause hint per spin.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSpin;

impl SpinPolicy for NullSpin {
    #[inline]
    fn backoff(_spins: usize) -> Backoff {
        Backoff::Pause
    }
}

/// Pause hints for the first `LOOP` spins, then yield the time slice.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinsToYield<const LOOP: usize>;

impl<const LOOP: usize> SpinPolicy for SpinsToYield<LOOP> {
    #[inline]
    fn backoff(spins: usize) -> Backoff {
        if spins < LOOP {
            Backoff::Pause
        } else {
            Backoff::Yield
        }
    }
}

///
/// Pause hints for `LOOP` spins, yields for the next `YIELD`, then short sleeps.
///
/// Opt-in only. Once it sleeps, `lock()` really suspends the waiting thread
/// and the scheduler usually rounds the quantum up to tens of microseconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinsToSleep<const LOOP: usize, const YIELD: usize>;

impl<const LOOP: usize, const YIELD: usize> SpinPolicy for SpinsToSleep<LOOP, YIELD> {
    #[inline]
    fn backoff(spins: usize) -> Backoff {
        if spins < LOOP {
            Backoff::Pause
        } else if spins < LOOP.saturating_add(YIELD) {
            Backoff::Yield
        } else {
            Backoff::Sleep
        }
    }
}

/// Spin then yield. Never suspends the thread beyond a yield.
pub type DefaultSpin = SpinsToYield<DEFAULT_SPINS_TO_LOOP>;

/// Spin, yield, then sleep, for waits known to be long.
pub type SleepySpin = SpinsToSleep<DEFAULT_SPINS_TO_LOOP, DEFAULT_SPINS_TO_YIELD>;
