//! Configuration types for the scheduling system.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SchedulingError};
use crate::logging::VERBOSITY_SILENT;

/// Ranking strategy, which also selects the machine-selection rule.
///
/// - `Heft`: upward rank, machine minimising EFT.
/// - `Pheft`: Optimistic Cost Table rank, machine minimising EFT + OCT.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RankStrategy {
    #[default]
    Heft,
    Pheft,
}

impl RankStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heft => "heft",
            Self::Pheft => "pheft",
        }
    }
}

impl fmt::Display for RankStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankStrategy {
    type Err = SchedulingError;

    /// Accepts the algorithm names as well as the rank names used by the
    /// shadow tooling (`"up"`, `"oct"`).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heft" | "up" | "upward" => Ok(Self::Heft),
            "pheft" | "oct" => Ok(Self::Pheft),
            _ => Err(SchedulingError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Configuration for a scheduling run.
#[derive(Clone, Debug)]
pub struct SchedulingConfig {
    /// Ranking and machine-selection strategy
    pub strategy: RankStrategy,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug
    pub verbosity: u8,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            strategy: RankStrategy::Heft,
            verbosity: VERBOSITY_SILENT,
        }
    }
}

impl SchedulingConfig {
    pub fn new(strategy: RankStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Build a config from a strategy name such as `"heft"` or `"oct"`.
    pub fn from_strategy_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SchedulingConfig::default();
        assert_eq!(config.strategy, RankStrategy::Heft);
        assert_eq!(config.verbosity, VERBOSITY_SILENT);
    }

    #[test]
    fn test_strategy_aliases() {
        assert_eq!("heft".parse::<RankStrategy>().unwrap(), RankStrategy::Heft);
        assert_eq!("up".parse::<RankStrategy>().unwrap(), RankStrategy::Heft);
        assert_eq!(" OCT ".parse::<RankStrategy>().unwrap(), RankStrategy::Pheft);
        assert_eq!("pheft".parse::<RankStrategy>().unwrap(), RankStrategy::Pheft);
    }

    #[test]
    fn test_unknown_strategy() {
        let err = SchedulingConfig::from_strategy_name("random").unwrap_err();
        assert_eq!(err, SchedulingError::UnknownStrategy("random".to_string()));
    }

    #[test]
    fn test_strategy_display_round_trips() {
        for strategy in [RankStrategy::Heft, RankStrategy::Pheft] {
            assert_eq!(strategy.to_string().parse::<RankStrategy>().unwrap(), strategy);
        }
    }
}
