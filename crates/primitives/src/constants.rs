//! Default fee market parameters.
use crate::Dec;

/// Desired total gas wanted per block. The base fee steers block usage toward it.
pub const TARGET_GAS: u64 = 70_000_000;

/// Maximum fractional change of the base fee in a single block (`0.1`).
pub const MAX_BLOCK_CHANGE_RATE: Dec = Dec::from_raw(100_000_000_000_000_000);

/// Floor of the base fee (`0.0025`).
pub const MIN_BASE_FEE: Dec = Dec::from_raw(2_500_000_000_000_000);

/// Ceiling of the base fee (`10`).
pub const MAX_BASE_FEE: Dec = Dec::from_int(10);

/// Base fee used when no persisted value exists (`0.006`).
pub const DEFAULT_BASE_FEE: Dec = Dec::from_raw(6_000_000_000_000_000);

/// Divisor applied to the base fee when re-checking transactions already in the mempool.
pub const RECHECK_FEE_DIVISOR: u64 = 4;
