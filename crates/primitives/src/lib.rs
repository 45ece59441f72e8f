//! Primitive types for the base fee market.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

pub mod constants;
pub mod decimal;

pub use constants::*;
pub use decimal::{Dec, ParseDecError, DEC_PRECISION};
