//! Elementwise activation functions used by the LSTM cell.

use ndarray::Array1;

/// Sigmoid activation function: σ(x) = 1 / (1 + e^(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Hyperbolic tangent activation: tanh(x) = (e^x - e^(-x)) / (e^x + e^(-x))
pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// Sigmoid applied to every element of `x`
pub fn sigmoid_vec(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(sigmoid)
}

/// Tanh applied to every element of `x`
pub fn tanh_vec(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(tanh)
}

/// Derivative of the sigmoid expressed through its output: σ'(x) = s(1 - s) where s = σ(x)
pub fn sigmoid_derivative(s: f64) -> f64 {
    s * (1.0 - s)
}

/// Derivative of tanh expressed through its output: tanh'(x) = 1 - t² where t = tanh(x)
pub fn tanh_derivative(t: f64) -> f64 {
    1.0 - t * t
}
