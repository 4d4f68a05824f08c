//! Debug script for Kuhn Poker CFR
//!
//! Usage: `cargo run --release --example debug_kuhn [config.json]`

use std::error::Error;

use cfr_solver::cfr::tree::expected_value;
use cfr_solver::cfr::{SolverConfig, Trainer};
use cfr_solver::games::kuhn::KuhnNode;
use indicatif::{ProgressBar, ProgressStyle};

const ROUNDS: u64 = 10;
const ITERATIONS_PER_ROUND: u64 = 10_000;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SolverConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => SolverConfig::default().with_seed(42),
    };
    println!("Config: {}", config.to_json()?);

    let mut trainer = Trainer::new(KuhnNode::new(), config)?;

    let bar = ProgressBar::new(ROUNDS * ITERATIONS_PER_ROUND);
    bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {per_sec} {msg}")?);

    for _ in 0..ROUNDS {
        trainer.train_with_callback(ITERATIONS_PER_ROUND, 1_000, |stats| {
            bar.set_position(stats.iterations);
            bar.set_message(format!("root value {:.4}", stats.mean_root_value));
        });

        let jack = trainer.average_strategy(0, b"0:", 2);
        let queen = trainer.average_strategy(0, b"1:", 2);
        let king = trainer.average_strategy(0, b"2:", 2);

        bar.println(format!("After {} iterations:", trainer.stats().iterations));
        bar.println(format!("  Jack  (P1 root): Pass={:.3}, Bet={:.3}", jack[0], jack[1]));
        bar.println(format!("  Queen (P1 root): Pass={:.3}, Bet={:.3}", queen[0], queen[1]));
        bar.println(format!("  King  (P1 root): Pass={:.3}, Bet={:.3}", king[0], king[1]));

        // Also check P2's strategies facing bet
        let jack_vs_bet = trainer.average_strategy(1, b"0:b", 2);
        let queen_vs_bet = trainer.average_strategy(1, b"1:b", 2);
        let king_vs_bet = trainer.average_strategy(1, b"2:b", 2);

        bar.println(format!("  P2 Jack facing bet:  Pass(fold)={:.3}, Bet(call)={:.3}", jack_vs_bet[0], jack_vs_bet[1]));
        bar.println(format!("  P2 Queen facing bet: Pass(fold)={:.3}, Bet(call)={:.3}", queen_vs_bet[0], queen_vs_bet[1]));
        bar.println(format!("  P2 King facing bet:  Pass(fold)={:.3}, Bet(call)={:.3}", king_vs_bet[0], king_vs_bet[1]));
        bar.println("");
    }
    bar.finish_and_clear();

    let value = expected_value(&KuhnNode::new(), |node: &KuhnNode| trainer.profile().average_strategy(node));
    println!("Average strategy value for P1: {:.4} (game value {:.4})", value, -1.0 / 18.0);
    println!("Total info sets: {}", trainer.num_info_sets());
    println!("Table size: {} bytes", trainer.profile().memory_usage());

    // Expected Nash equilibrium (one member of the family, alpha = 1/3):
    println!("\nExpected Nash Equilibrium:");
    println!("  P1 Jack:  Pass=1-a, Bet=a (a in [0, 1/3])");
    println!("  P1 Queen: Pass=1.000, Bet=0.000");
    println!("  P1 King:  Pass=1-3a, Bet=3a");
    println!("  P2 Jack vs bet:  Fold=1.000, Call=0.000");
    println!("  P2 Queen vs bet: Fold=0.667, Call=0.333");
    println!("  P2 King vs bet:  Fold=0.000, Call=1.000");

    Ok(())
}
