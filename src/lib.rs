//! # Price LSTM
//!
//! Next-day price prediction with a single LSTM cell whose gradients are
//! derived by hand and applied with plain gradient descent.
//!
//! ## Core Components
//!
//! - **LSTM Cell**: stateful cell with `forward`, single-step `backward` and in-place `update`
//! - **Data Preparation**: min-max scaling and fixed-window sequence extraction
//! - **Ingestion**: closing prices from CSV exports
//! - **Training**: epoch loop, per-epoch metrics and the prediction pass
//!
//! ## Quick Start
//!
//! ```rust
//! use price_lstm::data::{make_sequences, normalize};
//! use price_lstm::training::{create_basic_trainer, TrainingConfig};
//!
//! let prices: Vec<f64> = (1..=8).map(f64::from).collect();
//! let normalized = normalize(&prices).unwrap();
//! let sequences = make_sequences(&normalized.values, 3);
//! assert_eq!(sequences.len(), 5);
//!
//! let config = TrainingConfig { sequence_length: 3, epochs: 2, seed: Some(1), ..Default::default() };
//! let mut trainer = create_basic_trainer(config).unwrap();
//! trainer.train(&sequences).unwrap();
//! ```

pub mod error;
pub mod utils;
pub mod data;
pub mod ingest;
pub mod layers;
pub mod loss;
pub mod training;

// Re-export commonly used items
pub use error::{Error, Result};
pub use data::{denormalize, make_sequences, normalize, NormalizationParams, NormalizedSeries, Sequences};
pub use ingest::{load_closing_prices, read_closing_prices};
pub use layers::lstm_cell::{CellParameters, CellPhase, GateDerivative, LSTMCell, LSTMCellCache, LSTMCellGradients};
pub use loss::{LossFunction, MSELoss};
pub use training::{create_basic_trainer, run, Prediction, Trainer, TrainingConfig, TrainingMetrics, TrainingReport};
