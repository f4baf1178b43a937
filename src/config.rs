//! Configuration management with validation and defaults
//!
//! Amounts are in the ledger's smallest unit. Every section has defaults, so a
//! TOML file only needs to name what it changes.

use crate::errors::{CasinoResult, ConfigurationError};
use crate::games::slot::{Combination, SlotMachine, SpecialCombination};
use crate::games::types::PayoutSchedule;
use crate::jackpot::{self, DEFAULT_JACKPOT_MAGIC};
use crate::ledger::DEFAULT_LOOKBACK_WINDOW;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Added on top of the computed minimum-bet floor
pub const MIN_BET_MARGIN: u64 = 10;

/// Engine configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CasinoConfig {
    pub roll: RollConfig,
    pub slot: SlotConfig,
    pub jackpot: JackpotConfig,
    pub ledger: LedgerConfig,
}

/// Roll game economics
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollConfig {
    pub house_edge_percent: u64,
    pub jackpot_percent: u64,
    pub settlement_cost: u64,
    pub min_bet: u64,
    pub max_bet: u64,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            house_edge_percent: 1,
            jackpot_percent: 1,
            settlement_cost: 500_000,
            min_bet: 1_000_000,
            max_bet: 1_000_000_000,
        }
    }
}

impl RollConfig {
    pub fn schedule(&self) -> PayoutSchedule {
        PayoutSchedule {
            house_edge_percent: self.house_edge_percent,
            jackpot_percent: self.jackpot_percent,
            settlement_cost: self.settlement_cost,
        }
    }

    /// Smallest stake whose even-odds win still covers the settlement cost
    pub fn min_bet_floor(&self) -> u64 {
        let retained = retained_percent(self.house_edge_percent, self.jackpot_percent);
        let floor = self.settlement_cost as u128 * 100 / retained as u128;
        saturate(floor) + MIN_BET_MARGIN
    }
}

/// One ordinary pay line as written in TOML
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayLineConfig {
    pub symbols: String,
    pub num: u64,
    pub den: u64,
}

/// One special pay line as written in TOML
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialPayLineConfig {
    pub symbol: String,
    pub num: u64,
    pub den: u64,
    pub positions: Vec<usize>,
}

/// Slot game economics and machine layout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub house_edge_percent: u64,
    pub jackpot_percent: u64,
    pub settlement_cost: u64,
    pub min_win_percent: u64,
    pub min_bet: u64,
    pub max_bet: u64,
    pub big_combination_len: usize,
    pub reels: Vec<String>,
    pub pay_table: Vec<PayLineConfig>,
    pub special_pay_table: Vec<SpecialPayLineConfig>,
}

impl Default for SlotConfig {
    fn default() -> Self {
        let machine = SlotMachine::default();
        Self {
            house_edge_percent: 1,
            jackpot_percent: 1,
            settlement_cost: 1_000_000,
            min_win_percent: 30,
            min_bet: 5_000_000,
            max_bet: 1_000_000_000,
            big_combination_len: machine.big_combination_len(),
            reels: machine
                .reels()
                .iter()
                .map(|reel| String::from_utf8_lossy(reel).into_owned())
                .collect(),
            pay_table: machine
                .pay_table()
                .iter()
                .map(|line| PayLineConfig {
                    symbols: String::from_utf8_lossy(&line.symbols).into_owned(),
                    num: line.num,
                    den: line.den,
                })
                .collect(),
            special_pay_table: machine
                .special_pay_table()
                .iter()
                .map(|line| SpecialPayLineConfig {
                    symbol: (line.symbol as char).to_string(),
                    num: line.num,
                    den: line.den,
                    positions: line.positions.clone(),
                })
                .collect(),
        }
    }
}

impl SlotConfig {
    pub fn schedule(&self) -> PayoutSchedule {
        PayoutSchedule {
            house_edge_percent: self.house_edge_percent,
            jackpot_percent: self.jackpot_percent,
            settlement_cost: self.settlement_cost,
        }
    }

    /// Smallest stake whose weakest configured win still covers the settlement cost
    pub fn min_bet_floor(&self) -> u64 {
        let retained = retained_percent(self.house_edge_percent, self.jackpot_percent);
        let min_win = self.min_win_percent.max(1) as u128;
        let floor = self.settlement_cost as u128 * 100 / min_win * 100 / retained as u128;
        saturate(floor) + MIN_BET_MARGIN
    }

    /// Build the slot machine described by this section
    pub fn machine(&self) -> Result<SlotMachine, ConfigurationError> {
        let reels = self.reels.iter().map(|reel| reel.as_bytes().to_vec()).collect();
        let pay_table = self
            .pay_table
            .iter()
            .map(|line| Combination::new(line.symbols.as_bytes(), line.num, line.den))
            .collect();
        let special_pay_table = self
            .special_pay_table
            .iter()
            .map(|line| {
                let symbol = match line.symbol.as_bytes() {
                    [symbol] => Ok(*symbol),
                    _ => Err(ConfigurationError::InvalidSpecialSymbol),
                }?;
                Ok(SpecialCombination::new(symbol, line.num, line.den, &line.positions))
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        SlotMachine::new(reels, pay_table, special_pay_table, self.big_combination_len)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JackpotConfig {
    pub magic: u64,
}

impl Default for JackpotConfig {
    fn default() -> Self {
        Self { magic: DEFAULT_JACKPOT_MAGIC }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub lookback_window: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { lookback_window: DEFAULT_LOOKBACK_WINDOW }
    }
}

impl CasinoConfig {
    /// Larger stakes and rarer jackpots
    pub fn high_stakes() -> Self {
        let mut config = Self::default();
        config.roll.min_bet = 100_000_000;
        config.roll.max_bet = 100_000_000_000;
        config.slot.min_bet = 100_000_000;
        config.slot.max_bet = 100_000_000_000;
        config.jackpot.magic = 3_333_333;
        config
    }

    /// Cheap settlement and the most frequent jackpot the band allows
    pub fn testing() -> Self {
        let mut config = Self::default();
        config.roll.settlement_cost = 0;
        config.roll.min_bet = MIN_BET_MARGIN;
        config.slot.settlement_cost = 0;
        config.slot.min_bet = MIN_BET_MARGIN;
        config.jackpot.magic = jackpot::MIN_JACKPOT_MAGIC;
        config
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigurationError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to serialize TOML: {}", e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_percentages("roll", self.roll.house_edge_percent, self.roll.jackpot_percent)?;
        validate_percentages("slot", self.slot.house_edge_percent, self.slot.jackpot_percent)?;

        if self.slot.min_win_percent == 0 || self.slot.min_win_percent > 100 {
            return Err(ConfigurationError::ValidationFailed(
                "slot.min_win_percent must be within 1..=100".to_string(),
            ));
        }

        validate_bet_range(self.roll.min_bet, self.roll.max_bet, self.roll.min_bet_floor())?;
        validate_bet_range(self.slot.min_bet, self.slot.max_bet, self.slot.min_bet_floor())?;

        jackpot::validate_magic(self.jackpot.magic)?;

        if self.ledger.lookback_window == 0 {
            return Err(ConfigurationError::ValidationFailed(
                "ledger.lookback_window must be > 0".to_string(),
            ));
        }

        self.slot.machine()?;
        Ok(())
    }
}

/// Check a bet range against its floor
pub fn validate_bet_range(min: u64, max: u64, floor: u64) -> Result<(), ConfigurationError> {
    if min < floor {
        return Err(ConfigurationError::InvalidMinBet { min, floor });
    }
    if min > max {
        return Err(ConfigurationError::InvalidBetRange { min, max });
    }
    Ok(())
}

fn validate_percentages(game: &str, house_edge: u64, jackpot: u64) -> Result<(), ConfigurationError> {
    if house_edge.checked_add(jackpot).map_or(true, |sum| sum >= 100) {
        return Err(ConfigurationError::ValidationFailed(format!(
            "{}.house_edge_percent + {}.jackpot_percent must be < 100",
            game, game
        )));
    }
    Ok(())
}

fn retained_percent(house_edge: u64, jackpot: u64) -> u64 {
    100u64.saturating_sub(house_edge.saturating_add(jackpot)).max(1)
}

fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX - MIN_BET_MARGIN)
}

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load from file (or defaults), apply `FAIRWAGER_*` overrides, then validate
    pub fn load(&self) -> CasinoResult<CasinoConfig> {
        let mut config = match &self.config_path {
            Some(path) => load_from_file(path)?,
            None => CasinoConfig::default(),
        };

        apply_env_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }
}

/// Load configuration from a TOML file without validating it
pub fn load_from_file(path: &Path) -> Result<CasinoConfig, ConfigurationError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path.display(), e))
    })?;
    CasinoConfig::from_toml_str(&content)
}

/// Apply overrides resolved through `lookup`
pub fn apply_env_overrides<F>(config: &mut CasinoConfig, lookup: F) -> Result<(), ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| -> Result<Option<u64>, ConfigurationError> {
        match lookup(key) {
            Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|e| {
                ConfigurationError::LoadFailed(format!("Invalid {}: {}", key, e))
            }),
            None => Ok(None),
        }
    };

    if let Some(magic) = read("FAIRWAGER_JACKPOT_MAGIC")? {
        config.jackpot.magic = magic;
    }
    if let Some(window) = read("FAIRWAGER_LOOKBACK_WINDOW")? {
        config.ledger.lookback_window = window;
    }
    if let Some(min) = read("FAIRWAGER_ROLL_MIN_BET")? {
        config.roll.min_bet = min;
    }
    if let Some(max) = read("FAIRWAGER_ROLL_MAX_BET")? {
        config.roll.max_bet = max;
    }
    if let Some(min) = read("FAIRWAGER_SLOT_MIN_BET")? {
        config.slot.min_bet = min;
    }
    if let Some(max) = read("FAIRWAGER_SLOT_MAX_BET")? {
        config.slot.max_bet = max;
    }
    Ok(())
}
