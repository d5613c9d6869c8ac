use ndarray::Array1;
use price_lstm::*;

fn ramp_config(gate_derivative: GateDerivative) -> TrainingConfig {
    TrainingConfig {
        sequence_length: 3,
        hidden_size: 6,
        learning_rate: 0.05,
        epochs: 60,
        print_every: 20,
        gate_derivative,
        carry_state: false,
        seed: Some(3),
    }
}

#[test]
fn test_sequences_from_normalized_series() {
    let series: Vec<f64> = (1..=8).map(f64::from).collect();
    let normalized = normalize(&series).unwrap();

    assert_eq!(normalized.values[0], 0.0);
    assert_eq!(normalized.values[7], 1.0);

    let sequences = make_sequences(&series, 3);
    let expected = [
        (vec![1.0, 2.0, 3.0], 4.0),
        (vec![2.0, 3.0, 4.0], 5.0),
        (vec![3.0, 4.0, 5.0], 6.0),
        (vec![4.0, 5.0, 6.0], 7.0),
        (vec![5.0, 6.0, 7.0], 8.0),
    ];
    assert_eq!(sequences.len(), expected.len());
    for ((window, label), (expected_window, expected_label)) in sequences.iter().zip(expected.iter()) {
        assert_eq!(window, expected_window.as_slice());
        assert_eq!(label, *expected_label);
    }
}

#[test]
fn test_cell_protocol() {
    let hidden_size = 4;
    let mut cell = LSTMCell::with_seed(3, hidden_size, 21);
    let input = Array1::from(vec![0.1, 0.5, 0.9]);
    let zeros = Array1::zeros(hidden_size);

    assert!(matches!(cell.backward(&zeros, &zeros), Err(Error::BackwardWithoutForward)));

    let hy = cell.forward(&input).unwrap().clone();
    assert_eq!(hy.len(), hidden_size);

    let grads = cell.backward(&Array1::ones(hidden_size), &zeros).unwrap();
    assert!(matches!(cell.phase(), CellPhase::Ready));

    let before = cell.parameters().clone();
    cell.update(&grads, 0.1).unwrap();
    assert_ne!(cell.parameters().w_output, before.w_output);
    assert_ne!(cell.parameters().w_candidate, before.w_candidate);

    // State was carried: same input, different output
    let again = cell.forward(&input).unwrap().clone();
    assert_ne!(hy, again);
}

#[test]
fn test_training_reduces_loss() {
    let prices: Vec<f64> = (0..30)
        .map(|i| 100.0 + 2.0 * i as f64 + if i % 2 == 0 { 0.5 } else { -0.5 })
        .collect();
    let normalized = normalize(&prices).unwrap();
    let sequences = make_sequences(&normalized.values, 3);

    let mut trainer = create_basic_trainer(ramp_config(GateDerivative::Standard)).unwrap();
    trainer.train(&sequences).unwrap();

    let history = trainer.get_metrics_history();
    let first = history.first().unwrap().train_loss;
    let last = history.last().unwrap().train_loss;
    assert!(last < first, "loss did not decrease: {} -> {}", first, last);
}

#[test]
fn test_gate_derivative_modes_train_differently() {
    let prices: Vec<f64> = (0..20).map(|i| 50.0 + (i as f64 * 0.7).sin() * 5.0).collect();

    let standard = run(&ramp_config(GateDerivative::Standard), &prices).unwrap();
    let reference = run(&ramp_config(GateDerivative::Reference), &prices).unwrap();

    assert_eq!(standard.predictions.len(), 17);
    assert_eq!(reference.predictions.len(), 17);
    assert_ne!(standard.final_loss(), reference.final_loss());
    assert!(reference.predictions.iter().all(|p| p.predicted.is_finite()));
}

#[test]
fn test_run_is_deterministic_with_seed() {
    let prices: Vec<f64> = (0..15).map(|i| 20.0 + (i * i % 7) as f64).collect();
    let config = ramp_config(GateDerivative::Standard);

    let a = run(&config, &prices).unwrap();
    let b = run(&config, &prices).unwrap();

    assert_eq!(a.predictions, b.predictions);
}
