//! Mempool admission against the base fee.
use crate::{BaseFeeReader, FeeTx};
use primitives::Dec;

/// Which fee a transaction has to meet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CheckMode {
    /// First time the transaction enters the mempool.
    #[default]
    New,
    /// Re-validation of a transaction already in the mempool after a block was committed.
    Recheck,
}

/// The transaction offers less than the required gas price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("insufficient fee: offered gas price {offered}, required {required}")]
pub struct InsufficientFee {
    /// Gas price offered by the transaction.
    pub offered: Dec,
    /// Base fee in effect for the check.
    pub required: Dec,
}

/// Rejects mempool transactions that pay less than the current base fee.
///
/// Rechecks use the lower recheck base fee so a spike in the base fee does not evict
/// everything that was admitted just before it.
#[derive(Clone, Debug)]
pub struct MempoolFeeChecker {
    reader: BaseFeeReader,
}

impl MempoolFeeChecker {
    /// Creates a checker reading fees from `reader`.
    pub fn new(reader: BaseFeeReader) -> Self {
        Self { reader }
    }

    /// The fee `mode` requires right now.
    pub fn required_fee(&self, mode: CheckMode) -> Dec {
        match mode {
            CheckMode::New => self.reader.current(),
            CheckMode::Recheck => self.reader.current_recheck(),
        }
    }

    /// Checks that `tx` offers at least the fee `mode` requires.
    pub fn check<T: FeeTx + ?Sized>(&self, tx: &T, mode: CheckMode) -> Result<(), InsufficientFee> {
        let required = self.required_fee(mode);
        let offered = tx.gas_price();
        if offered < required {
            return Err(InsufficientFee { offered, required });
        }
        Ok(())
    }
}
