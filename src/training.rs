use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::{make_sequences, normalize, NormalizationParams, Sequences};
use crate::error::{Error, Result};
use crate::layers::lstm_cell::{GateDerivative, LSTMCell};
use crate::loss::{LossFunction, MSELoss};

/// Configuration for the model and its training loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    /// Window length, which is also the cell's input size
    pub sequence_length: usize,
    pub hidden_size: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    pub print_every: usize,
    pub gate_derivative: GateDerivative,
    /// Keep `h`/`c` from one window to the next instead of starting each window from zero
    pub carry_state: bool,
    /// Seed for weight initialization; random when absent
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            sequence_length: 5,
            hidden_size: 10,
            learning_rate: 0.01,
            epochs: 100,
            print_every: 10,
            gate_derivative: GateDerivative::Standard,
            carry_state: false,
            seed: None,
        }
    }
}

impl TrainingConfig {
    /// Load a config from JSON. Missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: TrainingConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sequence_length == 0 {
            return Err(Error::InvalidConfig("sequence_length must be positive".into()));
        }
        if self.hidden_size == 0 {
            return Err(Error::InvalidConfig("hidden_size must be positive".into()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be positive".into()));
        }
        if self.print_every == 0 {
            return Err(Error::InvalidConfig("print_every must be positive".into()));
        }
        Ok(())
    }
}

/// Training metrics tracked during training
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub time_elapsed: f64,
}

/// Actual and predicted price for one window, on the original price scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub actual: f64,
    pub predicted: f64,
}

impl Prediction {
    pub fn absolute_error(&self) -> f64 {
        (self.predicted - self.actual).abs()
    }
}

/// Everything [`run`] produces
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub normalization: NormalizationParams,
    pub metrics: Vec<TrainingMetrics>,
    pub predictions: Vec<Prediction>,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.metrics.last().map(|m| m.train_loss)
    }

    pub fn mean_absolute_error(&self) -> Option<f64> {
        if self.predictions.is_empty() {
            return None;
        }
        let total: f64 = self.predictions.iter().map(Prediction::absolute_error).sum();
        Some(total / self.predictions.len() as f64)
    }
}

/// Drives one LSTM cell through forward, loss, backward and update.
///
/// The prediction for a window is `h[0]` after a single forward step that
/// takes the whole window as its input vector.
pub struct Trainer<L: LossFunction> {
    cell: LSTMCell,
    loss_function: L,
    config: TrainingConfig,
    metrics_history: Vec<TrainingMetrics>,
}

impl<L: LossFunction> Trainer<L> {
    pub fn new(config: TrainingConfig, loss_function: L) -> Result<Self> {
        config.validate()?;

        let cell = match config.seed {
            Some(seed) => LSTMCell::with_seed(config.sequence_length, config.hidden_size, seed),
            None => LSTMCell::new(config.sequence_length, config.hidden_size),
        }
        .with_gate_derivative(config.gate_derivative);

        Ok(Trainer {
            cell,
            loss_function,
            config,
            metrics_history: Vec::new(),
        })
    }

    pub fn cell(&self) -> &LSTMCell {
        &self.cell
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Swap in a zero-state cell with the current weights unless state is carried
    fn begin_window(&mut self) -> Result<()> {
        if !self.config.carry_state {
            self.cell = LSTMCell::from_parameters(self.cell.parameters().clone())?
                .with_gate_derivative(self.config.gate_derivative);
        }
        Ok(())
    }

    /// One gradient step on a single window. Returns the loss before the step.
    pub fn train_sample(&mut self, window: &[f64], label: f64) -> Result<f64> {
        self.begin_window()?;

        let input = Array1::from(window.to_vec());
        let prediction = self.cell.forward(&input)?[0];

        let loss = self.loss_function.compute_loss(prediction, label);

        let hidden_size = self.cell.hidden_size();
        let mut dloss_dh = Array1::<f64>::zeros(hidden_size);
        dloss_dh[0] = self.loss_function.compute_gradient(prediction, label);
        let dloss_dc_next = Array1::<f64>::zeros(hidden_size);

        let gradients = self.cell.backward(&dloss_dh, &dloss_dc_next)?;
        self.cell.update(&gradients, self.config.learning_rate)?;

        Ok(loss)
    }

    /// Train for `config.epochs` passes over every window, in series order
    pub fn train(&mut self, sequences: &Sequences) -> Result<()> {
        if sequences.is_empty() {
            return Err(Error::InsufficientData {
                len: 0,
                sequence_length: self.config.sequence_length,
            });
        }

        info!("Starting training for {} epochs...", self.config.epochs);

        for epoch in 0..self.config.epochs {
            let start_time = Instant::now();
            let mut epoch_loss = 0.0;

            for (window, label) in sequences.iter() {
                epoch_loss += self.train_sample(window, label)?;
            }
            epoch_loss /= sequences.len() as f64;

            let time_elapsed = start_time.elapsed().as_secs_f64();

            self.metrics_history.push(TrainingMetrics {
                epoch,
                train_loss: epoch_loss,
                time_elapsed,
            });

            if epoch % self.config.print_every == 0 || epoch + 1 == self.config.epochs {
                info!("Epoch {}: Train Loss: {:.6}, Time: {:.2}s", epoch, epoch_loss, time_elapsed);
            } else {
                debug!("Epoch {}: Train Loss: {:.6}", epoch, epoch_loss);
            }
        }

        info!("Training completed!");
        Ok(())
    }

    /// Normalized prediction for one window
    pub fn predict(&mut self, window: &[f64]) -> Result<f64> {
        self.begin_window()?;
        let input = Array1::from(window.to_vec());
        Ok(self.cell.forward(&input)?[0])
    }

    /// Predict every window and map actual and predicted values back to prices
    pub fn evaluate(
        &mut self,
        sequences: &Sequences,
        params: &NormalizationParams,
    ) -> Result<Vec<Prediction>> {
        let mut predictions = Vec::with_capacity(sequences.len());
        for (window, label) in sequences.iter() {
            let predicted = self.predict(window)?;
            predictions.push(Prediction {
                actual: params.denormalize(label),
                predicted: params.denormalize(predicted),
            });
        }
        Ok(predictions)
    }

    pub fn get_latest_metrics(&self) -> Option<&TrainingMetrics> {
        self.metrics_history.last()
    }

    pub fn get_metrics_history(&self) -> &[TrainingMetrics] {
        &self.metrics_history
    }
}

/// Create a trainer with squared-error loss
pub fn create_basic_trainer(config: TrainingConfig) -> Result<Trainer<MSELoss>> {
    Trainer::new(config, MSELoss)
}

/// Normalize `prices`, train on every window, then predict every window.
pub fn run(config: &TrainingConfig, prices: &[f64]) -> Result<TrainingReport> {
    config.validate()?;

    let normalized = normalize(prices)?;
    let sequences = make_sequences(&normalized.values, config.sequence_length);
    if sequences.is_empty() {
        return Err(Error::InsufficientData {
            len: prices.len(),
            sequence_length: config.sequence_length,
        });
    }
    info!(
        "Normalized {} prices to [0, 1] (min {:.2}, max {:.2}); {} windows",
        prices.len(),
        normalized.params.min,
        normalized.params.max,
        sequences.len()
    );

    let mut trainer = create_basic_trainer(config.clone())?;
    trainer.train(&sequences)?;
    let predictions = trainer.evaluate(&sequences, &normalized.params)?;

    Ok(TrainingReport {
        normalization: normalized.params,
        metrics: trainer.metrics_history,
        predictions,
    })
}
