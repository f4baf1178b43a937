//! Slot machine: reel spin and combination matching
//!
//! Each reel contributes one symbol drawn with the reel index as nonce.
//! Ordinary combinations are matched in pay table order and claim the
//! positions they cover; special combinations pay when one symbol sits at
//! every listed position of the spun line.

use crate::errors::{ConfigurationError, PayoutError};
use crate::games::types::Multiplier;
use crate::rng;
use serde::{Deserialize, Serialize};

/// Reserved byte never allowed on reels or in patterns
pub const SENTINEL_SYMBOL: u8 = 0xff;

/// Combinations at least this long end matching on the spot
pub const DEFAULT_BIG_COMBINATION_LEN: usize = 8;

/// Reel index is used as a one-byte nonce
pub const MAX_REELS: usize = 255;

const DEFAULT_REELS: [&str; 9] = [
    "30030030030030000300",
    "030003030003000300300",
    "00333000300003030000",
    "0003003000300030030300",
    "03003003000300003030",
    "03000300300300300300",
    "30030030003000003003",
    "300300003003003000003",
    "00300030300030003003",
];

const DEFAULT_PAY_TABLE: [(&str, u64, u64); 8] = [
    ("333333333", 333, 1),
    ("33333333", 240, 1),
    ("3333333", 150, 1),
    ("333333", 75, 1),
    ("33333", 25, 1),
    ("3333", 5, 1),
    ("333", 6, 10),
    ("33", 3, 10),
];

const DEFAULT_SPECIAL_PAY_TABLE: [(u8, u64, u64, [usize; 3]); 5] = [
    (b'3', 25, 10, [0, 3, 6]),
    (b'3', 25, 10, [1, 4, 7]),
    (b'3', 25, 10, [2, 5, 8]),
    (b'3', 30, 10, [0, 4, 8]),
    (b'3', 30, 10, [2, 4, 6]),
];

/// Pattern paying `num/den` per non-overlapping occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    pub symbols: Vec<u8>,
    pub num: u64,
    pub den: u64,
}

impl Combination {
    pub fn new(symbols: &[u8], num: u64, den: u64) -> Self {
        Self { symbols: symbols.to_vec(), num, den }
    }

    pub fn multiplier(&self) -> Multiplier {
        Multiplier::new(self.num, self.den)
    }
}

/// Positional combination: `symbol` at every index in `positions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialCombination {
    pub symbol: u8,
    pub num: u64,
    pub den: u64,
    pub positions: Vec<usize>,
}

impl SpecialCombination {
    pub fn new(symbol: u8, num: u64, den: u64, positions: &[usize]) -> Self {
        Self { symbol, num, den, positions: positions.to_vec() }
    }

    pub fn multiplier(&self) -> Multiplier {
        Multiplier::new(self.num, self.den)
    }

    fn matches(&self, symbols: &[u8]) -> bool {
        self.positions
            .iter()
            .all(|&position| symbols.get(position) == Some(&self.symbol))
    }
}

/// Spun line with its accumulated multiplier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinOutcome {
    pub symbols: Vec<u8>,
    pub multiplier: Multiplier,
    pub big_combination: bool,
}

impl SpinOutcome {
    pub fn symbols_string(&self) -> String {
        String::from_utf8_lossy(&self.symbols).into_owned()
    }
}

/// Reels and pay tables of the slot game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMachine {
    reels: Vec<Vec<u8>>,
    pay_table: Vec<Combination>,
    special_pay_table: Vec<SpecialCombination>,
    big_combination_len: usize,
}

impl Default for SlotMachine {
    fn default() -> Self {
        Self {
            reels: DEFAULT_REELS.iter().map(|reel| reel.as_bytes().to_vec()).collect(),
            pay_table: DEFAULT_PAY_TABLE
                .iter()
                .map(|(symbols, num, den)| Combination::new(symbols.as_bytes(), *num, *den))
                .collect(),
            special_pay_table: DEFAULT_SPECIAL_PAY_TABLE
                .iter()
                .map(|(symbol, num, den, positions)| {
                    SpecialCombination::new(*symbol, *num, *den, positions)
                })
                .collect(),
            big_combination_len: DEFAULT_BIG_COMBINATION_LEN,
        }
    }
}

impl SlotMachine {
    /// Build a machine, validating every reel and pay line
    pub fn new(
        reels: Vec<Vec<u8>>,
        pay_table: Vec<Combination>,
        special_pay_table: Vec<SpecialCombination>,
        big_combination_len: usize,
    ) -> Result<Self, ConfigurationError> {
        if reels.is_empty() || reels.len() > MAX_REELS {
            return Err(ConfigurationError::ValidationFailed(format!(
                "slot machine needs between 1 and {} reels, got {}",
                MAX_REELS,
                reels.len()
            )));
        }
        if big_combination_len == 0 {
            return Err(ConfigurationError::ValidationFailed(
                "big_combination_len must be > 0".to_string(),
            ));
        }
        for reel in &reels {
            validate_reel(reel)?;
        }
        for combination in &pay_table {
            validate_combination(combination)?;
        }
        for special in &special_pay_table {
            validate_special(special, reels.len())?;
        }

        Ok(Self { reels, pay_table, special_pay_table, big_combination_len })
    }

    pub fn reel_count(&self) -> usize {
        self.reels.len()
    }

    pub fn reels(&self) -> &[Vec<u8>] {
        &self.reels
    }

    pub fn pay_table(&self) -> &[Combination] {
        &self.pay_table
    }

    pub fn special_pay_table(&self) -> &[SpecialCombination] {
        &self.special_pay_table
    }

    pub fn big_combination_len(&self) -> usize {
        self.big_combination_len
    }

    /// Replace the symbols of reel `n`
    pub fn set_reel(&mut self, n: usize, symbols: &[u8]) -> Result<(), ConfigurationError> {
        if n >= self.reels.len() {
            return Err(ConfigurationError::InvalidReelNumber(n));
        }
        validate_reel(symbols)?;
        self.reels[n] = symbols.to_vec();
        Ok(())
    }

    /// Edit pay line `n`.
    ///
    /// `n == len` appends, empty `symbols` at the last index removes it.
    pub fn set_pay_line(
        &mut self,
        n: usize,
        symbols: &[u8],
        num: u64,
        den: u64,
    ) -> Result<(), ConfigurationError> {
        let len = self.pay_table.len();
        if n > len {
            return Err(ConfigurationError::InvalidPayLineNumber(n));
        }
        if symbols.is_empty() {
            if len > 0 && n == len - 1 {
                self.pay_table.pop();
                return Ok(());
            }
            return Err(ConfigurationError::InvalidCombinationLength);
        }

        let combination = Combination::new(symbols, num, den);
        validate_combination(&combination)?;
        if n == len {
            self.pay_table.push(combination);
        } else {
            self.pay_table[n] = combination;
        }
        Ok(())
    }

    /// Edit special pay line `n`, same indexing rules as [`SlotMachine::set_pay_line`]
    /// with empty `positions` as the removal marker
    pub fn set_special_pay_line(
        &mut self,
        n: usize,
        symbol: u8,
        num: u64,
        den: u64,
        positions: &[usize],
    ) -> Result<(), ConfigurationError> {
        let len = self.special_pay_table.len();
        if n > len {
            return Err(ConfigurationError::InvalidPayLineNumber(n));
        }
        if positions.is_empty() {
            if len > 0 && n == len - 1 {
                self.special_pay_table.pop();
                return Ok(());
            }
            return Err(ConfigurationError::InvalidSpecialPositions);
        }

        let special = SpecialCombination::new(symbol, num, den, positions);
        validate_special(&special, self.reels.len())?;
        if n == len {
            self.special_pay_table.push(special);
        } else {
            self.special_pay_table[n] = special;
        }
        Ok(())
    }

    /// One symbol per reel, drawn with the reel index as nonce
    pub fn draw_symbols(&self, hidden_seed: &[u8; 32], public_seed: &[u8; 32]) -> Vec<u8> {
        self.reels
            .iter()
            .enumerate()
            .map(|(i, reel)| {
                let index = rng::derive_with_nonce(hidden_seed, public_seed, reel.len() as u64, &[i as u8]);
                reel[index as usize]
            })
            .collect()
    }

    /// Accumulated multiplier of a spun line, plus whether a big combination ended matching
    pub fn evaluate(&self, symbols: &[u8]) -> Result<(Multiplier, bool), PayoutError> {
        let mut claimed = vec![false; symbols.len()];
        let mut total = Multiplier::ZERO;

        for combination in &self.pay_table {
            let count = claim_occurrences(symbols, &mut claimed, &combination.symbols);
            if count == 0 {
                continue;
            }
            total = total.checked_add(combination.multiplier().scaled(count)?)?;
            if combination.symbols.len() >= self.big_combination_len {
                return Ok((total, true));
            }
        }

        for special in &self.special_pay_table {
            if special.matches(symbols) {
                total = total.checked_add(special.multiplier())?;
            }
        }

        Ok((total, false))
    }

    /// Draw a line from the seed pair and price it
    pub fn spin(&self, hidden_seed: &[u8; 32], public_seed: &[u8; 32]) -> Result<SpinOutcome, PayoutError> {
        let symbols = self.draw_symbols(hidden_seed, public_seed);
        let (multiplier, big_combination) = self.evaluate(&symbols)?;
        tracing::debug!(
            symbols = %String::from_utf8_lossy(&symbols),
            multiplier = %multiplier,
            big_combination,
            "Slot spun"
        );
        Ok(SpinOutcome { symbols, multiplier, big_combination })
    }
}

/// Count non-overlapping occurrences of `pattern` over unclaimed positions,
/// claiming each match
fn claim_occurrences(symbols: &[u8], claimed: &mut [bool], pattern: &[u8]) -> u64 {
    let width = pattern.len();
    if width == 0 {
        return 0;
    }

    let mut count = 0;
    let mut i = 0;
    while i + width <= symbols.len() {
        let window = i..i + width;
        if &symbols[window.clone()] == pattern && claimed[window.clone()].iter().all(|c| !c) {
            claimed[window].fill(true);
            count += 1;
            i += width;
        } else {
            i += 1;
        }
    }
    count
}

fn validate_reel(symbols: &[u8]) -> Result<(), ConfigurationError> {
    if symbols.is_empty() {
        return Err(ConfigurationError::InvalidReelLength);
    }
    if symbols.contains(&SENTINEL_SYMBOL) {
        return Err(ConfigurationError::InvalidReelSymbol);
    }
    Ok(())
}

fn validate_combination(combination: &Combination) -> Result<(), ConfigurationError> {
    if combination.symbols.is_empty() {
        return Err(ConfigurationError::InvalidCombinationLength);
    }
    if combination.symbols.contains(&SENTINEL_SYMBOL) {
        return Err(ConfigurationError::InvalidCombinationSymbol);
    }
    if combination.den == 0 {
        return Err(ConfigurationError::InvalidMultiplier);
    }
    Ok(())
}

fn validate_special(special: &SpecialCombination, reel_count: usize) -> Result<(), ConfigurationError> {
    if special.symbol == SENTINEL_SYMBOL {
        return Err(ConfigurationError::InvalidSpecialSymbol);
    }
    if special.positions.is_empty() || special.positions.iter().any(|&p| p >= reel_count) {
        return Err(ConfigurationError::InvalidSpecialPositions);
    }
    if special.den == 0 {
        return Err(ConfigurationError::InvalidMultiplier);
    }
    Ok(())
}
