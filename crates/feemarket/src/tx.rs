//! What the fee market needs to know about blocks and transactions.
use auto_impl::auto_impl;
use primitives::Dec;

/// Per-block context handed to [`EipState::deliver_tx`](crate::EipState::deliver_tx).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockContext {
    /// Height of the block being processed.
    pub height: u64,
}

impl BlockContext {
    /// Context for the block at `height`.
    pub const fn new(height: u64) -> Self {
        Self { height }
    }
}

/// A transaction as seen by the fee market.
#[auto_impl(&, Box, Arc)]
pub trait FeeTx {
    /// Gas the transaction declares it will consume.
    fn gas_wanted(&self) -> u64;

    /// Price the transaction offers per unit of gas.
    fn gas_price(&self) -> Dec;
}

/// Plain [FeeTx] carrying just the two fee fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxFee {
    /// Declared gas.
    pub gas_wanted: u64,
    /// Offered price per gas unit.
    pub gas_price: Dec,
}

impl TxFee {
    /// Creates a new transaction fee description.
    pub const fn new(gas_wanted: u64, gas_price: Dec) -> Self {
        Self {
            gas_wanted,
            gas_price,
        }
    }
}

impl FeeTx for TxFee {
    fn gas_wanted(&self) -> u64 {
        self.gas_wanted
    }

    fn gas_price(&self) -> Dec {
        self.gas_price
    }
}
