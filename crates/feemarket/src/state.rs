//! The base fee state machine.
use crate::{
    persist::{BaseFeePersister, WriteProgress},
    BaseFeeReader, BlockContext, FeeMarketConfig, FeeMarketError, FeeTx,
};
use primitives::Dec;
use std::sync::Arc;
use store::{FeeStore, FeeStoreError, KeyValueStore};
use tokio::{runtime::Handle, sync::watch};
use tracing::{debug, warn};

/// Computes the base fee that follows a block in which `gas_wanted` gas was declared.
///
/// ```text
/// gas_diff   = gas_wanted - target_gas
/// multiplier = 1 + (gas_diff / target_gas) * max_block_change_rate
/// next       = clamp(base_fee * multiplier, min_base_fee, max_base_fee)
/// ```
///
/// Every step rounds at 18 decimal places, so the order above is part of the result.
pub fn compute_next_base_fee(config: &FeeMarketConfig, base_fee: Dec, gas_wanted: u64) -> Dec {
    let gas_diff = i128::from(gas_wanted) - i128::from(config.target_gas);
    let next = Dec::checked_from_int(gas_diff)
        .and_then(|diff| diff.checked_quo(Dec::from_u64(config.target_gas)))
        .and_then(|ratio| ratio.checked_mul(config.max_block_change_rate))
        .and_then(|increment| Dec::ONE.checked_add(increment))
        .and_then(|multiplier| base_fee.checked_mul(multiplier));
    // gas_diff >= -target_gas bounds the downward side, so overflow can only mean too high.
    next.map_or(config.max_base_fee, |fee| config.clamp(fee))
}

pub(crate) fn recheck_base_fee(base_fee: Dec, divisor: u64) -> Dec {
    base_fee
        .checked_quo(Dec::from_u64(divisor))
        .unwrap_or(base_fee)
}

/// EIP-1559 style base fee for the mempool.
///
/// Driven once per block by the block executor:
/// [`start_block`](Self::start_block), any number of [`deliver_tx`](Self::deliver_tx),
/// then [`update_base_fee`](Self::update_base_fee), with strictly increasing heights.
/// Calls outside that order are bugs in the driver and panic: every node has to agree on
/// the fee, so guessing a recovery would be worse than stopping.
///
/// Each new fee is published to [BaseFeeReader]s and handed to a background writer. The
/// store catches up eventually; [`try_load`](Self::try_load) may briefly return an older
/// fee than [`current_base_fee`](Self::current_base_fee).
#[derive(Debug)]
pub struct EipState<KV> {
    config: FeeMarketConfig,
    last_block_height: Option<u64>,
    total_gas_wanted_this_block: u64,
    cur_base_fee: Dec,
    /// `true` between `start_block` and `update_base_fee`.
    block_open: bool,
    store: Arc<FeeStore<KV>>,
    persister: BaseFeePersister,
    published: watch::Sender<Dec>,
}

impl<KV> EipState<KV>
where
    KV: KeyValueStore + Send + Sync + 'static,
{
    /// Creates the fee state, seeding the fee from `store`.
    ///
    /// The writer runs on the current multi-thread tokio runtime, or on an owned one when
    /// there is none or the current one is single-threaded.
    pub fn new(config: FeeMarketConfig, store: FeeStore<KV>) -> Result<Self, FeeMarketError> {
        config.validate()?;
        let store = Arc::new(store);
        let persister = BaseFeePersister::spawn(Arc::clone(&store))?;
        Ok(Self::with_persister(config, store, persister))
    }

    /// Like [`new`](Self::new), with the writer spawned on `handle`.
    pub fn new_with_handle(
        config: FeeMarketConfig,
        store: FeeStore<KV>,
        handle: &Handle,
    ) -> Result<Self, FeeMarketError> {
        config.validate()?;
        let store = Arc::new(store);
        let persister = BaseFeePersister::spawn_on(Arc::clone(&store), handle);
        Ok(Self::with_persister(config, store, persister))
    }

    fn with_persister(
        config: FeeMarketConfig,
        store: Arc<FeeStore<KV>>,
        persister: BaseFeePersister,
    ) -> Self {
        let cur_base_fee = initial_base_fee(&config, &store);
        let (published, _) = watch::channel(cur_base_fee);
        Self {
            config,
            last_block_height: None,
            total_gas_wanted_this_block: 0,
            cur_base_fee,
            block_open: false,
            store,
            persister,
            published,
        }
    }
}

impl<KV: KeyValueStore> EipState<KV> {
    /// Opens the block at `height` and zeroes the gas accumulator.
    ///
    /// If a reset interval is configured and divides `height`, the fee goes back to the
    /// default first.
    ///
    /// # Panics
    ///
    /// If the previous block is still open or `height` does not exceed the last height.
    pub fn start_block(&mut self, height: u64) {
        assert!(
            !self.block_open,
            "start_block({height}) while block {:?} is still open",
            self.last_block_height
        );
        if let Some(last) = self.last_block_height {
            assert!(
                height > last,
                "start_block({height}) after block {last}: heights must strictly increase"
            );
        }

        self.last_block_height = Some(height);
        self.total_gas_wanted_this_block = 0;
        self.block_open = true;

        if self
            .config
            .reset_interval
            .is_some_and(|interval| height % interval == 0)
        {
            self.cur_base_fee = self.config.default_base_fee;
            self.published.send_replace(self.cur_base_fee);
            debug!(height, base_fee = %self.cur_base_fee, "reset base fee to default");
        }
    }

    /// Accounts the gas wanted by a transaction included in the open block.
    ///
    /// # Panics
    ///
    /// If `ctx` is not the open block.
    pub fn deliver_tx<T: FeeTx + ?Sized>(&mut self, ctx: &BlockContext, tx: &T) {
        self.assert_open("deliver_tx", ctx.height);
        self.total_gas_wanted_this_block = self
            .total_gas_wanted_this_block
            .saturating_add(tx.gas_wanted());
    }

    /// Closes the block at `height`, computes the next base fee and queues it for
    /// persistence without waiting for the write.
    ///
    /// # Panics
    ///
    /// If `height` is not the open block.
    pub fn update_base_fee(&mut self, height: u64) {
        self.assert_open("update_base_fee", height);

        let previous = self.cur_base_fee;
        self.cur_base_fee =
            compute_next_base_fee(&self.config, previous, self.total_gas_wanted_this_block);
        self.block_open = false;

        self.published.send_replace(self.cur_base_fee);
        let seq = self.persister.dispatch(self.cur_base_fee);
        debug!(
            height,
            gas_wanted = self.total_gas_wanted_this_block,
            %previous,
            base_fee = %self.cur_base_fee,
            seq,
            "updated base fee"
        );
    }

    fn assert_open(&self, op: &str, height: u64) {
        assert!(
            self.block_open && self.last_block_height == Some(height),
            "{op}({height}) but the open block is {:?}",
            self.last_block_height.filter(|_| self.block_open)
        );
    }

    /// Reads the persisted base fee back from the store.
    ///
    /// Writes are asynchronous, so right after an update this can still return the
    /// previous fee.
    pub fn try_load(&self) -> Result<Option<Dec>, FeeStoreError<KV::Error>> {
        self.store.load()
    }

    /// Copy of the current base fee.
    pub fn current_base_fee(&self) -> Dec {
        self.cur_base_fee
    }

    /// Base fee applied when re-checking transactions already in the mempool.
    pub fn current_recheck_base_fee(&self) -> Dec {
        recheck_base_fee(self.cur_base_fee, self.config.recheck_fee_divisor)
    }

    /// Reader handle for code outside the block-processing path.
    pub fn reader(&self) -> BaseFeeReader {
        BaseFeeReader::new(self.published.subscribe(), self.config.recheck_fee_divisor)
    }

    /// Height of the last started block.
    pub fn last_block_height(&self) -> Option<u64> {
        self.last_block_height
    }

    /// Gas wanted so far in the last started block.
    pub fn total_gas_wanted_this_block(&self) -> u64 {
        self.total_gas_wanted_this_block
    }

    /// The parameters this state runs with.
    pub fn config(&self) -> &FeeMarketConfig {
        &self.config
    }

    /// Background writer progress.
    pub fn write_progress(&self) -> WriteProgress {
        self.persister.progress()
    }

    /// Waits until the writer has attempted the latest fee.
    pub async fn persisted(&self) -> WriteProgress {
        self.persister.flushed().await
    }
}

fn initial_base_fee<KV: KeyValueStore>(config: &FeeMarketConfig, store: &FeeStore<KV>) -> Dec {
    match store.load() {
        Ok(Some(persisted)) => {
            let fee = config.clamp(persisted);
            if fee != persisted {
                warn!(%persisted, base_fee = %fee, "persisted base fee outside bounds, clamped");
            } else {
                debug!(base_fee = %fee, "loaded persisted base fee");
            }
            fee
        }
        Ok(None) => {
            debug!(base_fee = %config.default_base_fee, "no persisted base fee, using default");
            config.default_base_fee
        }
        Err(err) => {
            warn!(%err, base_fee = %config.default_base_fee, "failed to load base fee, using default");
            config.default_base_fee
        }
    }
}
