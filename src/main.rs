//! fairwager CLI
//!
//! Runs simulated betting sessions against an in-memory ledger and recomputes
//! outcomes from revealed seeds for independent audits.

use clap::{Parser, Subcommand};
use ed25519_dalek::SigningKey;
use fairwager::{
    commitment::CommitmentSigner,
    config::{CasinoConfig, ConfigLoader},
    errors::CasinoResult,
    games::{roll, BetShape, GameKind, GameType, Identity, RollSpec},
    ledger::{InMemoryLedger, Ledger},
    logging, Casino, CasinoEvent, OwnerAccess,
};
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// fairwager provably-fair wagering engine
#[derive(Parser)]
#[command(name = "fairwager")]
#[command(about = "Provably-fair roll and slot wagering engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play simulated bets end to end against an in-memory ledger
    Simulate {
        /// Number of bets to place and settle
        #[arg(short, long, default_value = "100")]
        rounds: u64,

        /// Seed for reproducible sessions
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Stake per bet
        #[arg(short, long, default_value = "10000000")]
        amount: u64,

        /// House bankroll funded before the session
        #[arg(short, long, default_value = "100000000000")]
        bankroll: u64,

        /// Print every emitted event as a JSON line
        #[arg(long)]
        events: bool,
    },

    /// Recompute a roll outcome from revealed seeds
    VerifyRoll {
        /// coin, grid3x3 or percent
        #[arg(short, long)]
        game_type: GameType,

        /// Winning-outcome bitmask (coin, grid3x3)
        #[arg(short, long, conflicts_with = "threshold")]
        mask: Option<u64>,

        /// Winning threshold (percent)
        #[arg(short, long)]
        threshold: Option<u64>,

        /// Hidden seed, 32 bytes hex
        #[arg(long, value_parser = parse_seed)]
        hidden: [u8; 32],

        /// Public seed, 32 bytes hex
        #[arg(long, value_parser = parse_seed)]
        public: [u8; 32],
    },

    /// Recompute a slot spin from revealed seeds
    VerifySpin {
        /// Hidden seed, 32 bytes hex
        #[arg(long, value_parser = parse_seed)]
        hidden: [u8; 32],

        /// Public seed, 32 bytes hex
        #[arg(long, value_parser = parse_seed)]
        public: [u8; 32],
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(Debug, Default, Serialize)]
struct SessionSummary {
    rounds: u64,
    staked: u64,
    paid: u64,
    wins: u64,
    jackpots: u64,
    failed_payments: u64,
    final_balance: u64,
    final_free_funds: u64,
    final_jackpot_pool: u64,
}

impl SessionSummary {
    /// Count transfers that left custody; failed ones stay as free funds
    fn tally_payments(&mut self, events: &[CasinoEvent]) {
        for event in events {
            match event {
                CasinoEvent::Payment { amount, .. } => self.paid = self.paid.saturating_add(*amount),
                CasinoEvent::FailedPayment { .. } => self.failed_payments += 1,
                _ => {}
            }
        }
    }
}

fn main() -> CasinoResult<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let config = loader.load()?;

    match cli.command {
        Commands::Simulate { rounds, seed, amount, bankroll, events } => {
            let summary = simulate(&config, rounds, seed, amount, bankroll, events)?;
            print_json(&summary);
        }
        Commands::VerifyRoll { game_type, mask, threshold, hidden, public } => {
            let shape = match (mask, threshold) {
                (Some(mask), _) => BetShape::Mask(mask),
                (None, Some(threshold)) => BetShape::Threshold(threshold),
                (None, None) => BetShape::Mask(0),
            };
            let spec = RollSpec { game_type, shape };
            spec.validate()?;
            let outcome = roll::roll(&spec, &hidden, &public);
            print_json(&outcome);
        }
        Commands::VerifySpin { hidden, public } => {
            let machine = config.slot.machine()?;
            let outcome = machine.spin(&hidden, &public)?;
            println!("symbols:    {}", outcome.symbols_string());
            println!("multiplier: {} (~{:.4})", outcome.multiplier, outcome.multiplier.as_f64());
            println!("big:        {}", outcome.big_combination);
        }
        Commands::ShowConfig => {
            println!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn simulate(
    config: &CasinoConfig,
    rounds: u64,
    seed: u64,
    amount: u64,
    bankroll: u64,
    print_events: bool,
) -> CasinoResult<SessionSummary> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut genesis = [0u8; 32];
    rng.fill_bytes(&mut genesis);

    let operator = Identity::from_label("operator");
    let player = Identity::from_label("player");
    let roll_signer = CommitmentSigner::new(SigningKey::generate(&mut rng));
    let slot_signer = CommitmentSigner::new(SigningKey::generate(&mut rng));

    let mut ledger = InMemoryLedger::new(genesis, config.ledger.lookback_window);
    ledger.fund(bankroll);
    let mut casino = Casino::new(config, ledger, Box::new(OwnerAccess::new(operator)))?;
    casino.set_signer(&operator, GameKind::Roll, &roll_signer.verifying_key().to_bytes())?;
    casino.set_signer(&operator, GameKind::Slot, &slot_signer.verifying_key().to_bytes())?;

    info!(rounds, seed, amount, "Starting simulation");
    let mut summary = SessionSummary { rounds, ..Default::default() };

    for round in 0..rounds {
        let mut hidden = [0u8; 32];
        rng.fill_bytes(&mut hidden);
        let expiry = casino.ledger().current_position() + 10;
        let anchor = casino.ledger().current_position();

        let (won, jackpot) = if round % 2 == 0 {
            let spec = random_roll_spec(&mut rng);
            let commitment = roll_signer.commit(&hidden, expiry);
            casino.place_roll_bet(&player, amount, spec, &commitment, None)?;
            let public = casino.ledger_mut().seal();
            let settlement = casino.handle_roll_bet(&operator, &hidden, &public)?;
            (settlement.outcome.is_win(), settlement.jackpot)
        } else {
            let commitment = slot_signer.commit(&hidden, expiry);
            casino.place_slot_bet(&player, amount, &commitment, None)?;
            let public = casino.ledger_mut().seal();
            let settlement = casino.handle_slot_bet(&operator, &hidden, &public)?;
            (!settlement.outcome.multiplier.is_zero(), settlement.jackpot)
        };
        tracing::debug!(round, anchor, "Round settled");

        summary.staked = summary.staked.saturating_add(amount);
        if won {
            summary.wins += 1;
        }
        if jackpot.is_some() {
            summary.jackpots += 1;
        }

        let events = casino.drain_events();
        summary.tally_payments(&events);
        if print_events {
            events.iter().for_each(print_json);
        }
    }

    let snapshot = casino.snapshot();
    summary.final_balance = snapshot.balance;
    summary.final_free_funds = snapshot.free_funds;
    summary.final_jackpot_pool = casino.pool().jackpot_pool();
    info!(wins = summary.wins, jackpots = summary.jackpots, "Simulation finished");
    Ok(summary)
}

fn random_roll_spec(rng: &mut StdRng) -> RollSpec {
    match rng.gen_range(0..3) {
        0 => RollSpec::coin(rng.gen_range(1..=2)),
        1 => RollSpec::grid(rng.gen_range(1..=510)),
        _ => RollSpec::percent(rng.gen_range(1..=99)),
    }
}

fn parse_seed(s: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|e| e.to_string())?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| format!("expected 32 bytes, got {}", bytes.len()))
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to encode output: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed(&"ab".repeat(32)), Ok([0xab; 32]));
        assert_eq!(parse_seed(&format!("0x{}", "01".repeat(32))), Ok([1u8; 32]));
        assert!(parse_seed("abcd").is_err());
        assert!(parse_seed("zz").is_err());
    }

    #[test]
    fn test_simulation_keeps_custody_consistent() {
        let summary = simulate(&CasinoConfig::default(), 40, 7, 10_000_000, 10_000_000_000, false).unwrap();
        assert_eq!(summary.rounds, 40);
        assert_eq!(summary.staked, 400_000_000);
        assert_eq!(summary.failed_payments, 0);
        assert!(summary.final_free_funds <= summary.final_balance);
    }

    #[test]
    fn test_paid_counts_only_sent_payments() {
        let beneficiary = Identity::from_label("player");
        let mut summary = SessionSummary::default();
        summary.tally_payments(&[
            CasinoEvent::Payment { beneficiary, amount: 7, tag: "roll".to_string() },
            CasinoEvent::FailedPayment { beneficiary, amount: 1_000, tag: "slot".to_string() },
            CasinoEvent::Payment { beneficiary, amount: u64::MAX, tag: "casino.jackpot".to_string() },
        ]);
        assert_eq!(summary.paid, u64::MAX);
        assert_eq!(summary.failed_payments, 1);
    }

    #[test]
    fn test_simulation_is_reproducible() {
        let first = simulate(&CasinoConfig::default(), 10, 3, 10_000_000, 10_000_000_000, false).unwrap();
        let second = simulate(&CasinoConfig::default(), 10, 3, 10_000_000, 10_000_000_000, false).unwrap();
        assert_eq!(first.paid, second.paid);
        assert_eq!(first.final_balance, second.final_balance);
    }
}
