use std::time::Duration;

pub const DEFAULT_SPINS_TO_LOOP: usize = 125_usize;
pub const DEFAULT_SPINS_TO_YIELD: usize = 250_usize;
pub(crate) const SPIN_SLEEP: Duration = Duration::from_micros(1);

pub const DEFAULT_TXN_RETRIES: usize = 3_usize;

/// Lock flag of the pointer-packed lock word.
pub(crate) const LOCK_BIT: usize = 1_usize;
