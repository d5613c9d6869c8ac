/// Loss function trait for training on a scalar readout
pub trait LossFunction {
    /// Compute the loss between a prediction and its target
    fn compute_loss(&self, prediction: f64, target: f64) -> f64;

    /// Compute the gradient of the loss with respect to the prediction
    fn compute_gradient(&self, prediction: f64, target: f64) -> f64;
}

/// Squared error loss: (p - t)²
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss;

impl LossFunction for MSELoss {
    fn compute_loss(&self, prediction: f64, target: f64) -> f64 {
        let diff = prediction - target;
        diff * diff
    }

    fn compute_gradient(&self, prediction: f64, target: f64) -> f64 {
        2.0 * (prediction - target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mse_loss() {
        let loss_fn = MSELoss;

        assert!((loss_fn.compute_loss(0.75, 0.25) - 0.25).abs() < 1e-12);
        assert!((loss_fn.compute_loss(0.25, 0.75) - 0.25).abs() < 1e-12);
        assert_eq!(loss_fn.compute_loss(0.4, 0.4), 0.0);
    }

    #[test]
    fn test_mse_gradient_matches_finite_difference() {
        let loss_fn = MSELoss;
        let eps = 1e-6;
        let (p, t) = (0.3, 0.8);

        let numeric = (loss_fn.compute_loss(p + eps, t) - loss_fn.compute_loss(p - eps, t)) / (2.0 * eps);
        assert!((loss_fn.compute_gradient(p, t) - numeric).abs() < 1e-6);
    }
}
