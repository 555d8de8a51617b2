//! Evolves an approximation of `f(x) = x^4 - 4x^3` and prints the winning
//! expression in algebraic form, along with its error margin against a
//! validation coordinate file.
//!
//! An alternative validation file may be passed as the first argument:
//!
//! ```sh
//! RUST_LOG=debug cargo run --release --example symbreg [validation-file]
//! ```

use symreg::{dataset, error_margin, grammar, run, Config};

const RANDOM_SEED: u64 = 318;
const VALIDATION_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/x4-4x3.txt");

fn target(x: f64) -> f64 {
    x.powi(4) - 4.0 * x.powi(3)
}

fn main() {
    env_logger::init();

    let validation_file = std::env::args()
        .nth(1)
        .unwrap_or_else(|| VALIDATION_FILE.to_string());

    let config = Config {
        seed: Some(RANDOM_SEED),
        ..Config::default()
    };

    println!("Running tournament. This may take awhile.");
    let outcome = match run(&config, target) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("run failed: {}", err);
            std::process::exit(1);
        }
    };

    let winner = grammar::to_algebraic(&outcome.elite.tree);
    println!("Complete.\n\nThe winning function is:\n\n{}\n", winner);
    println!(
        "Mean squared error over the sample grid: {:.6} (found in generation {})",
        outcome.elite.fitness, outcome.elite.generation,
    );

    // Compare the winner against the independently sourced coordinates.
    match dataset::load_coordinates(&validation_file) {
        Ok(coordinates) => match error_margin(&outcome.elite.tree, &coordinates) {
            Ok(margin) => println!("Margin of error against {}: {:.4}", validation_file, margin),
            Err(err) => eprintln!("could not evaluate the winner: {}", err),
        },
        Err(err) => eprintln!("could not load {}: {}", validation_file, err),
    }

    // Simplification and expansion of the printed form is left to an
    // external computer-algebra system.
}
