use ndarray::{s, Array1, Array2, Axis, Zip};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::{sigmoid, sigmoid_derivative, sigmoid_vec, tanh_derivative, tanh_vec};

/// How the backward pass differentiates the sigmoid gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateDerivative {
    /// σ'(z) = s(1 - s) on the cached activation, forget gate scaled by c_{t-1}
    #[default]
    Standard,
    /// σ applied a second time to the cached activation, forget gate scaled by c_t.
    /// Not a true derivative; kept so weights from trainers using this formula can be reproduced.
    Reference,
}

impl GateDerivative {
    fn gate_slope(self, activated: &Array1<f64>) -> Array1<f64> {
        match self {
            GateDerivative::Standard => activated.mapv(sigmoid_derivative),
            GateDerivative::Reference => activated.mapv(sigmoid),
        }
    }
}

/// Trainable parameters of one cell.
///
/// Every matrix is `(hidden_size, hidden_size + input_size)` and multiplies
/// the concatenation `[h_{t-1}, x_t]`; every bias has `hidden_size` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct CellParameters {
    pub w_forget: Array2<f64>,
    pub w_input: Array2<f64>,
    pub w_candidate: Array2<f64>,
    pub w_output: Array2<f64>,
    pub b_forget: Array1<f64>,
    pub b_input: Array1<f64>,
    pub b_candidate: Array1<f64>,
    pub b_output: Array1<f64>,
}

impl CellParameters {
    /// Weights uniform in [-1, 1], biases zero
    pub fn random<R: Rng + ?Sized>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let shape = (hidden_size, hidden_size + input_size);
        let dist = Uniform::new_inclusive(-1.0, 1.0);

        CellParameters {
            w_forget: Array2::random_using(shape, dist, rng),
            w_input: Array2::random_using(shape, dist, rng),
            w_candidate: Array2::random_using(shape, dist, rng),
            w_output: Array2::random_using(shape, dist, rng),
            b_forget: Array1::zeros(hidden_size),
            b_input: Array1::zeros(hidden_size),
            b_candidate: Array1::zeros(hidden_size),
            b_output: Array1::zeros(hidden_size),
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.w_forget.nrows()
    }

    pub fn input_size(&self) -> usize {
        self.w_forget.ncols().saturating_sub(self.hidden_size())
    }

    fn matrices(&self) -> [(&'static str, &Array2<f64>); 4] {
        [
            ("w_forget", &self.w_forget),
            ("w_input", &self.w_input),
            ("w_candidate", &self.w_candidate),
            ("w_output", &self.w_output),
        ]
    }

    fn biases(&self) -> [(&'static str, &Array1<f64>); 4] {
        [
            ("b_forget", &self.b_forget),
            ("b_input", &self.b_input),
            ("b_candidate", &self.b_candidate),
            ("b_output", &self.b_output),
        ]
    }

    /// Check that all eight tensors agree on one (hidden, input) layout
    fn validate(&self) -> Result<()> {
        let hidden_size = self.hidden_size();
        let cols = self.w_forget.ncols();
        if hidden_size == 0 || cols <= hidden_size {
            return Err(Error::shape_mismatch(
                "w_forget",
                &[hidden_size.max(1), hidden_size + 1],
                self.w_forget.shape(),
            ));
        }

        for (name, matrix) in self.matrices() {
            if matrix.dim() != (hidden_size, cols) {
                return Err(Error::shape_mismatch(name, &[hidden_size, cols], matrix.shape()));
            }
        }
        for (name, bias) in self.biases() {
            if bias.len() != hidden_size {
                return Err(Error::length_mismatch(name, hidden_size, bias.len()));
            }
        }
        Ok(())
    }
}

/// Gradients of the loss with respect to every cell parameter
#[derive(Debug, Clone, PartialEq)]
pub struct LSTMCellGradients {
    pub w_forget: Array2<f64>,
    pub w_input: Array2<f64>,
    pub w_candidate: Array2<f64>,
    pub w_output: Array2<f64>,
    pub b_forget: Array1<f64>,
    pub b_input: Array1<f64>,
    pub b_candidate: Array1<f64>,
    pub b_output: Array1<f64>,
}

impl LSTMCellGradients {
    fn matrices(&self) -> [(&'static str, &Array2<f64>); 4] {
        [
            ("dw_forget", &self.w_forget),
            ("dw_input", &self.w_input),
            ("dw_candidate", &self.w_candidate),
            ("dw_output", &self.w_output),
        ]
    }

    fn biases(&self) -> [(&'static str, &Array1<f64>); 4] {
        [
            ("db_forget", &self.b_forget),
            ("db_input", &self.b_input),
            ("db_candidate", &self.b_candidate),
            ("db_output", &self.b_output),
        ]
    }

    fn check_against(&self, params: &CellParameters) -> Result<()> {
        let expected = params.w_forget.shape();
        for (name, matrix) in self.matrices() {
            if matrix.shape() != expected {
                return Err(Error::shape_mismatch(name, expected, matrix.shape()));
            }
        }
        for (name, bias) in self.biases() {
            if bias.len() != params.hidden_size() {
                return Err(Error::length_mismatch(name, params.hidden_size(), bias.len()));
            }
        }
        Ok(())
    }
}

/// Values saved by `forward` for the following `backward`
#[derive(Debug, Clone)]
pub struct LSTMCellCache {
    pub concat: Array1<f64>,
    pub forget_gate: Array1<f64>,
    pub input_gate: Array1<f64>,
    pub candidate: Array1<f64>,
    pub output_gate: Array1<f64>,
    pub c_prev: Array1<f64>,
    pub c: Array1<f64>,
}

/// Where the cell is in the forward/backward protocol
#[derive(Debug, Clone)]
pub enum CellPhase {
    /// No forward pass is waiting to be differentiated
    Ready,
    /// A forward pass has run; its cache is consumed by the next `backward`
    AwaitingBackward(LSTMCellCache),
}

/// Single LSTM cell that owns its recurrent state.
///
/// Implements, with `z = [h_{t-1}, x_t]`:
/// - f_t = σ(W_f z + b_f)
/// - i_t = σ(W_i z + b_i)
/// - g_t = tanh(W_g z + b_g)
/// - o_t = σ(W_o z + b_o)
/// - c_t = f_t ⊙ c_{t-1} + i_t ⊙ g_t
/// - h_t = o_t ⊙ tanh(c_t)
///
/// `h` and `c` start at zero and carry over between `forward` calls for the
/// lifetime of the instance. To start from a clean state, build a new cell
/// with [`LSTMCell::from_parameters`].
#[derive(Debug, Clone)]
pub struct LSTMCell {
    params: CellParameters,
    h: Array1<f64>,
    c: Array1<f64>,
    input_size: usize,
    hidden_size: usize,
    gate_derivative: GateDerivative,
    phase: CellPhase,
}

impl LSTMCell {
    /// Creates a cell with weights drawn from the thread RNG.
    ///
    /// # Panics
    ///
    /// If either size is zero.
    pub fn new(input_size: usize, hidden_size: usize) -> Self {
        Self::with_rng(input_size, hidden_size, &mut rand::thread_rng())
    }

    /// Same as [`LSTMCell::new`] but reproducible
    pub fn with_seed(input_size: usize, hidden_size: usize, seed: u64) -> Self {
        Self::with_rng(input_size, hidden_size, &mut StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: Rng + ?Sized>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        assert!(input_size > 0, "input_size must be positive");
        assert!(hidden_size > 0, "hidden_size must be positive");

        Self::fresh(CellParameters::random(input_size, hidden_size, rng))
    }

    /// Builds a cell with zero state around existing parameters
    pub fn from_parameters(params: CellParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self::fresh(params))
    }

    fn fresh(params: CellParameters) -> Self {
        let hidden_size = params.hidden_size();
        let input_size = params.input_size();

        LSTMCell {
            params,
            h: Array1::zeros(hidden_size),
            c: Array1::zeros(hidden_size),
            input_size,
            hidden_size,
            gate_derivative: GateDerivative::default(),
            phase: CellPhase::Ready,
        }
    }

    pub fn with_gate_derivative(mut self, gate_derivative: GateDerivative) -> Self {
        self.gate_derivative = gate_derivative;
        self
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn gate_derivative(&self) -> GateDerivative {
        self.gate_derivative
    }

    pub fn hidden_state(&self) -> &Array1<f64> {
        &self.h
    }

    pub fn cell_state(&self) -> &Array1<f64> {
        &self.c
    }

    pub fn parameters(&self) -> &CellParameters {
        &self.params
    }

    pub fn into_parameters(self) -> CellParameters {
        self.params
    }

    pub fn phase(&self) -> &CellPhase {
        &self.phase
    }

    /// Advances the cell by one step and returns the new hidden state.
    ///
    /// The returned reference is the cell's own `h`, so it changes on the next call.
    /// Leaves the cell awaiting `backward`; running `forward` again replaces the cache.
    pub fn forward(&mut self, input: &Array1<f64>) -> Result<&Array1<f64>> {
        if input.len() != self.input_size {
            return Err(Error::length_mismatch("forward input", self.input_size, input.len()));
        }

        // Hidden state first, then input
        let mut concat = Array1::<f64>::zeros(self.hidden_size + self.input_size);
        concat.slice_mut(s![..self.hidden_size]).assign(&self.h);
        concat.slice_mut(s![self.hidden_size..]).assign(input);

        let p = &self.params;
        let forget_gate = sigmoid_vec(&(p.w_forget.dot(&concat) + &p.b_forget));
        let input_gate = sigmoid_vec(&(p.w_input.dot(&concat) + &p.b_input));
        let candidate = tanh_vec(&(p.w_candidate.dot(&concat) + &p.b_candidate));
        let output_gate = sigmoid_vec(&(p.w_output.dot(&concat) + &p.b_output));

        let c_prev = self.c.clone();

        Zip::from(&mut self.c)
            .and(&forget_gate)
            .and(&input_gate)
            .and(&candidate)
            .for_each(|c, &f, &i, &g| *c = f * *c + i * g);

        Zip::from(&mut self.h)
            .and(&output_gate)
            .and(&self.c)
            .for_each(|h, &o, &c| *h = o * c.tanh());

        self.phase = CellPhase::AwaitingBackward(LSTMCellCache {
            concat,
            forget_gate,
            input_gate,
            candidate,
            output_gate,
            c_prev,
            c: self.c.clone(),
        });

        Ok(&self.h)
    }

    /// Single-step gradients of the loss for the most recent `forward`.
    ///
    /// `dloss_dc_next` is the gradient arriving from the next step's memory and
    /// is all zeros for the last step. Nothing is propagated to earlier steps.
    pub fn backward(
        &mut self,
        dloss_dh: &Array1<f64>,
        dloss_dc_next: &Array1<f64>,
    ) -> Result<LSTMCellGradients> {
        if matches!(self.phase, CellPhase::Ready) {
            return Err(Error::BackwardWithoutForward);
        }
        if dloss_dh.len() != self.hidden_size {
            return Err(Error::length_mismatch("dloss_dh", self.hidden_size, dloss_dh.len()));
        }
        if dloss_dc_next.len() != self.hidden_size {
            return Err(Error::length_mismatch(
                "dloss_dc_next",
                self.hidden_size,
                dloss_dc_next.len(),
            ));
        }

        let cache = match std::mem::replace(&mut self.phase, CellPhase::Ready) {
            CellPhase::AwaitingBackward(cache) => cache,
            CellPhase::Ready => return Err(Error::BackwardWithoutForward),
        };

        let mode = self.gate_derivative;
        let tanh_c = tanh_vec(&cache.c);
        let forget_scale = match mode {
            GateDerivative::Standard => &cache.c_prev,
            GateDerivative::Reference => &cache.c,
        };

        let d_output = dloss_dh * &tanh_c * &mode.gate_slope(&cache.output_gate);
        let d_c = dloss_dh * &cache.output_gate * &tanh_c.mapv(tanh_derivative) + dloss_dc_next;
        let d_input = &d_c * &cache.candidate * &mode.gate_slope(&cache.input_gate);
        let d_forget = &d_c * forget_scale * &mode.gate_slope(&cache.forget_gate);
        let d_candidate = &d_c * &cache.input_gate * &cache.candidate.mapv(tanh_derivative);

        Ok(LSTMCellGradients {
            w_forget: outer(&d_forget, &cache.concat),
            w_input: outer(&d_input, &cache.concat),
            w_candidate: outer(&d_candidate, &cache.concat),
            w_output: outer(&d_output, &cache.concat),
            b_forget: d_forget,
            b_input: d_input,
            b_candidate: d_candidate,
            b_output: d_output,
        })
    }

    /// Plain gradient descent step: θ = θ - η∇θ
    pub fn update(&mut self, gradients: &LSTMCellGradients, learning_rate: f64) -> Result<()> {
        gradients.check_against(&self.params)?;

        let p = &mut self.params;
        p.w_forget.scaled_add(-learning_rate, &gradients.w_forget);
        p.w_input.scaled_add(-learning_rate, &gradients.w_input);
        p.w_candidate.scaled_add(-learning_rate, &gradients.w_candidate);
        p.w_output.scaled_add(-learning_rate, &gradients.w_output);

        p.b_forget.scaled_add(-learning_rate, &gradients.b_forget);
        p.b_input.scaled_add(-learning_rate, &gradients.b_input);
        p.b_candidate.scaled_add(-learning_rate, &gradients.b_candidate);
        p.b_output.scaled_add(-learning_rate, &gradients.b_output);

        Ok(())
    }
}

/// a ⊗ b as an (a.len(), b.len()) matrix
fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    a.view()
        .insert_axis(Axis(1))
        .dot(&b.view().insert_axis(Axis(0)))
}
