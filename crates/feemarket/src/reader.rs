//! Read-only access to the base fee from outside the block-processing path.
use crate::state::recheck_base_fee;
use primitives::Dec;
use tokio::sync::watch;

/// Cloneable snapshot reader of the current base fee.
///
/// Every read returns a copy of the value published by the last completed
/// [`update_base_fee`](crate::EipState::update_base_fee) (or reset), never a value in the
/// middle of being computed.
#[derive(Clone, Debug)]
pub struct BaseFeeReader {
    fee: watch::Receiver<Dec>,
    recheck_fee_divisor: u64,
}

impl BaseFeeReader {
    pub(crate) fn new(fee: watch::Receiver<Dec>, recheck_fee_divisor: u64) -> Self {
        Self {
            fee,
            recheck_fee_divisor,
        }
    }

    /// Current base fee.
    pub fn current(&self) -> Dec {
        *self.fee.borrow()
    }

    /// Current recheck base fee.
    pub fn current_recheck(&self) -> Dec {
        recheck_base_fee(self.current(), self.recheck_fee_divisor)
    }

    /// Waits for the next published fee. Returns `None` once the fee state is dropped.
    pub async fn changed(&mut self) -> Option<Dec> {
        self.fee.changed().await.ok()?;
        Some(*self.fee.borrow_and_update())
    }
}
