//! Price LSTM CLI
//!
//! Trains a single LSTM cell on a CSV of closing prices and prints the
//! actual and predicted price for every window.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use price_lstm::{load_closing_prices, run, GateDerivative, TrainingConfig};

#[derive(Parser)]
#[command(name = "price-lstm")]
#[command(about = "Next-day price prediction with a hand-derived LSTM cell", long_about = None)]
struct Cli {
    /// CSV file with a header row and the closing price in column index 4
    #[arg(short, long)]
    data: PathBuf,

    /// JSON file with training settings; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of past prices fed to the cell
    #[arg(long)]
    sequence_length: Option<usize>,

    /// Width of the hidden state
    #[arg(long)]
    hidden_size: Option<usize>,

    /// Gradient descent step size
    #[arg(short, long)]
    learning_rate: Option<f64>,

    /// Number of passes over the data
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Seed for weight initialization
    #[arg(long)]
    seed: Option<u64>,

    /// Gate derivative used by the backward pass
    #[arg(long, value_enum)]
    gate_derivative: Option<GateDerivativeArg>,

    /// Keep hidden and cell state from one window to the next
    #[arg(long)]
    carry_state: bool,

    /// Verbosity level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum GateDerivativeArg {
    Standard,
    Reference,
}

impl From<GateDerivativeArg> for GateDerivative {
    fn from(arg: GateDerivativeArg) -> Self {
        match arg {
            GateDerivativeArg::Standard => GateDerivative::Standard,
            GateDerivativeArg::Reference => GateDerivative::Reference,
        }
    }
}

impl Cli {
    fn training_config(&self) -> Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config: {:?}", path))?,
            None => TrainingConfig::default(),
        };

        if let Some(sequence_length) = self.sequence_length {
            config.sequence_length = sequence_length;
        }
        if let Some(hidden_size) = self.hidden_size {
            config.hidden_size = hidden_size;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.learning_rate = learning_rate;
        }
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(gate_derivative) = self.gate_derivative {
            config.gate_derivative = gate_derivative.into();
        }
        if self.carry_state {
            config.carry_state = true;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.training_config()?;

    let prices = load_closing_prices(&cli.data)
        .with_context(|| format!("Failed to read prices from {:?}", cli.data))?;
    if prices.is_empty() {
        warn!("No data found in the CSV file.");
        return Ok(());
    }
    info!("Loaded {} closing prices from {:?}", prices.len(), cli.data);

    let report = run(&config, &prices)?;

    for prediction in &report.predictions {
        println!(
            "Actual: {:.2}, Predicted: {:.2}",
            prediction.actual, prediction.predicted
        );
    }
    if let Some(mae) = report.mean_absolute_error() {
        println!("Mean absolute error: {:.2}", mae);
    }

    Ok(())
}
