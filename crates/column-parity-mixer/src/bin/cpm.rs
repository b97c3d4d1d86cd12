// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Column Parity Mixer CLI
//!
//! Standalone command-line tool for analysing a column parity mixer: order,
//! invertibility, inverse, and its action on an optional state matrix.

use clap::Parser;
use column_parity_mixer::utils::{format_indices, parse_matrix, print_matrix};
use column_parity_mixer::{
    column_parity, odd_columns, BitMatrix, ColumnParityMixer, CpmError, OrderConfig,
    DEFAULT_MAX_ORDER_ITERATIONS,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FOLDING: &str =
    "10000001,11000000,01100000,00110000,00011000,00001100,00000110,00000011";

#[derive(Parser, Debug, Clone)]
#[command(
    version,
    about = "Analyse a column parity mixer acting on m x n binary states: order, invertibility, inverse and its effect on a state."
)]
struct Args {
    /// Number of rows m of the states
    #[arg(long, default_value_t = 5usize)]
    rows: usize,

    /// Parity folding matrix Z as comma-separated rows of binary digits
    #[arg(long, default_value = DEFAULT_FOLDING)]
    folding: String,

    /// Optional state matrix to apply the mixer to, same syntax as --folding
    #[arg(long)]
    state: Option<String>,

    /// Maximum number of matrix products spent computing the order
    #[arg(long, default_value_t = DEFAULT_MAX_ORDER_ITERATIONS)]
    max_order_iterations: u64,

    /// Print the mixer as JSON and exit
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Print intermediate matrices and enable debug logging
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn setup_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let args = Args::parse();
    setup_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let theta = ColumnParityMixer::new(args.rows, parse_matrix(&args.folding)?)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&theta)?);
        return Ok(());
    }

    println!("=== {} ===", theta);
    print_matrix("Parity folding matrix Z", theta.parity_folding_matrix());

    if args.verbose {
        print_matrix("Associated matrix Z + I", &theta.associated_matrix());
    }

    println!("Invertible: {}", theta.is_invertible());
    println!("Involution: {}", theta.is_involution());
    println!("Identity:   {}", theta.is_identity());

    let config = OrderConfig {
        max_iterations: args.max_order_iterations,
    };
    match theta.order_with(&config) {
        Ok(order) => println!("Order:      {}", order),
        Err(e @ CpmError::ComputationLimitExceeded { .. }) => {
            println!("Order:      unknown ({e})")
        }
        Err(CpmError::NotInvertible { .. }) => println!("Order:      none (not invertible)"),
        Err(e) => return Err(e.into()),
    }
    println!();

    if theta.is_invertible() {
        let inverse = theta.inverse()?;
        print_matrix("Inverse parity folding matrix", inverse.parity_folding_matrix());
        if args.verbose {
            let check = theta.compose(&inverse)?;
            if check.is_identity() {
                println!("✓ Verification passed: θ ∘ θ⁻¹ is the identity\n");
            } else {
                println!("✗ Verification FAILED: θ ∘ θ⁻¹ is not the identity\n");
            }
        }
    }

    if let Some(state) = &args.state {
        let a = parse_matrix(state)?;
        describe_state(&theta, &a, args.verbose)?;
    }

    Ok(())
}

fn describe_state(theta: &ColumnParityMixer, a: &BitMatrix, verbose: bool) -> Result<(), CpmError> {
    if a.rows() != theta.nrows() {
        tracing::warn!(
            state_rows = a.rows(),
            mixer_rows = theta.nrows(),
            "state row count differs from the mixer's"
        );
    }

    println!("=== State ===");
    print_matrix("State A", a);
    if verbose {
        print_matrix("Column parity", &column_parity(a));
        println!("Odd columns:        {}", format_indices(&odd_columns(a)));
    }
    print_matrix("Effect", &theta.effect(a)?);
    println!(
        "Affected columns:   {}",
        format_indices(&theta.affected_columns(a)?)
    );
    println!(
        "Unaffected columns: {}\n",
        format_indices(&theta.unaffected_columns(a)?)
    );
    print_matrix("θ(A)", &theta.apply(a)?);

    Ok(())
}
