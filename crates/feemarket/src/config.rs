//! Fee market parameters.
use primitives::{
    Dec, DEFAULT_BASE_FEE, MAX_BASE_FEE, MAX_BLOCK_CHANGE_RATE, MIN_BASE_FEE,
    RECHECK_FEE_DIVISOR, TARGET_GAS,
};

/// Parameters of the base fee market.
///
/// Handed to [`EipState`](crate::EipState) at construction and never changed afterwards,
/// so independent chains (or tests) can run with their own parameters side by side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeeMarketConfig {
    /// Desired gas wanted per block.
    pub target_gas: u64,
    /// Largest fractional fee change a single block can cause. Must be in `(0, 1]`.
    pub max_block_change_rate: Dec,
    /// Lower bound of the base fee.
    pub min_base_fee: Dec,
    /// Upper bound of the base fee.
    pub max_base_fee: Dec,
    /// Fee used when nothing was persisted, and after every reset.
    pub default_base_fee: Dec,
    /// If set, the fee is reset to `default_base_fee` at every height divisible by it.
    pub reset_interval: Option<u64>,
    /// The recheck base fee is the base fee divided by this.
    pub recheck_fee_divisor: u64,
}

impl Default for FeeMarketConfig {
    fn default() -> Self {
        Self {
            target_gas: TARGET_GAS,
            max_block_change_rate: MAX_BLOCK_CHANGE_RATE,
            min_base_fee: MIN_BASE_FEE,
            max_base_fee: MAX_BASE_FEE,
            default_base_fee: DEFAULT_BASE_FEE,
            reset_interval: None,
            recheck_fee_divisor: RECHECK_FEE_DIVISOR,
        }
    }
}

impl FeeMarketConfig {
    /// Sets the target gas.
    pub fn with_target_gas(mut self, target_gas: u64) -> Self {
        self.target_gas = target_gas;
        self
    }

    /// Sets the maximum per-block change rate.
    pub fn with_max_block_change_rate(mut self, rate: Dec) -> Self {
        self.max_block_change_rate = rate;
        self
    }

    /// Sets both fee bounds.
    pub fn with_bounds(mut self, min_base_fee: Dec, max_base_fee: Dec) -> Self {
        self.min_base_fee = min_base_fee;
        self.max_base_fee = max_base_fee;
        self
    }

    /// Sets the default base fee.
    pub fn with_default_base_fee(mut self, fee: Dec) -> Self {
        self.default_base_fee = fee;
        self
    }

    /// Sets the reset interval.
    pub fn with_reset_interval(mut self, interval: Option<u64>) -> Self {
        self.reset_interval = interval;
        self
    }

    /// Sets the recheck divisor.
    pub fn with_recheck_fee_divisor(mut self, divisor: u64) -> Self {
        self.recheck_fee_divisor = divisor;
        self
    }

    /// Clamps `fee` into `[min_base_fee, max_base_fee]`.
    ///
    /// Only meaningful on a validated config.
    #[inline]
    pub fn clamp(&self, fee: Dec) -> Dec {
        fee.clamp(self.min_base_fee, self.max_base_fee)
    }

    /// Checks that the parameters describe a usable fee market.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_gas == 0 {
            return Err(ConfigError::ZeroTargetGas);
        }
        let rate = self.max_block_change_rate;
        if rate <= Dec::ZERO || rate > Dec::ONE {
            return Err(ConfigError::InvalidChangeRate(rate));
        }
        if self.min_base_fee.is_negative() {
            return Err(ConfigError::NegativeMinBaseFee(self.min_base_fee));
        }
        if self.min_base_fee > self.max_base_fee {
            return Err(ConfigError::InvertedBounds {
                min: self.min_base_fee,
                max: self.max_base_fee,
            });
        }
        if self.clamp(self.default_base_fee) != self.default_base_fee {
            return Err(ConfigError::DefaultOutOfBounds {
                default: self.default_base_fee,
                min: self.min_base_fee,
                max: self.max_base_fee,
            });
        }
        if self.reset_interval == Some(0) {
            return Err(ConfigError::ZeroResetInterval);
        }
        if self.recheck_fee_divisor == 0 {
            return Err(ConfigError::ZeroRecheckDivisor);
        }
        Ok(())
    }
}

/// Invalid [FeeMarketConfig].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Target gas of zero makes the fee formula divide by zero.
    #[error("target gas must be non-zero")]
    ZeroTargetGas,
    /// Change rate outside `(0, 1]`.
    #[error("max block change rate {0} is outside (0, 1]")]
    InvalidChangeRate(Dec),
    /// Negative floor.
    #[error("min base fee {0} is negative")]
    NegativeMinBaseFee(Dec),
    /// `min_base_fee > max_base_fee`.
    #[error("min base fee {min} is above max base fee {max}")]
    InvertedBounds {
        /// Configured floor.
        min: Dec,
        /// Configured ceiling.
        max: Dec,
    },
    /// Default fee outside the bounds.
    #[error("default base fee {default} is outside [{min}, {max}]")]
    DefaultOutOfBounds {
        /// Configured default.
        default: Dec,
        /// Configured floor.
        min: Dec,
        /// Configured ceiling.
        max: Dec,
    },
    /// Reset interval of zero.
    #[error("reset interval must be non-zero")]
    ZeroResetInterval,
    /// Recheck divisor of zero.
    #[error("recheck fee divisor must be non-zero")]
    ZeroRecheckDivisor,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dec(s: &str) -> Dec {
        s.parse().unwrap()
    }

    #[test]
    fn default_is_valid() {
        assert_eq!(FeeMarketConfig::default().validate(), Ok(()));
    }

    #[rstest]
    #[case::zero_target(FeeMarketConfig::default().with_target_gas(0), ConfigError::ZeroTargetGas)]
    #[case::zero_rate(
        FeeMarketConfig::default().with_max_block_change_rate(Dec::ZERO),
        ConfigError::InvalidChangeRate(Dec::ZERO)
    )]
    #[case::rate_above_one(
        FeeMarketConfig::default().with_max_block_change_rate(dec("1.5")),
        ConfigError::InvalidChangeRate(dec("1.5"))
    )]
    #[case::negative_min(
        FeeMarketConfig::default().with_bounds(dec("-1"), dec("10")),
        ConfigError::NegativeMinBaseFee(dec("-1"))
    )]
    #[case::inverted(
        FeeMarketConfig::default().with_bounds(dec("2"), dec("1")),
        ConfigError::InvertedBounds { min: dec("2"), max: dec("1") }
    )]
    #[case::default_above_max(
        FeeMarketConfig::default().with_default_base_fee(dec("11")),
        ConfigError::DefaultOutOfBounds { default: dec("11"), min: dec("0.0025"), max: dec("10") }
    )]
    #[case::zero_reset(
        FeeMarketConfig::default().with_reset_interval(Some(0)),
        ConfigError::ZeroResetInterval
    )]
    #[case::zero_recheck(
        FeeMarketConfig::default().with_recheck_fee_divisor(0),
        ConfigError::ZeroRecheckDivisor
    )]
    fn rejects_invalid(#[case] config: FeeMarketConfig, #[case] err: ConfigError) {
        assert_eq!(config.validate(), Err(err));
    }

    #[test]
    fn full_change_rate_is_valid() {
        let config = FeeMarketConfig::default().with_max_block_change_rate(Dec::ONE);
        assert_eq!(config.validate(), Ok(()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_with_defaults() {
        let config: FeeMarketConfig =
            serde_json::from_str(r#"{"target_gas":1000000,"reset_interval":1000}"#).unwrap();
        assert_eq!(config.target_gas, 1_000_000);
        assert_eq!(config.reset_interval, Some(1000));
        assert_eq!(config.min_base_fee, MIN_BASE_FEE);
        assert_eq!(config.validate(), Ok(()));
    }
}
