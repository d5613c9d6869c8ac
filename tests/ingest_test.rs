use std::io::Write;

use price_lstm::*;
use tempfile::NamedTempFile;

fn write_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_load_closing_prices_from_file() {
    let file = write_csv(&[
        "2024-01-02,187.15,188.44,183.89,185.64,184.73,82488700",
        "\"2024-01-03\",\"184.22\",\"185.88\",\"183.43\",\"184.25\",\"183.35\",\"58414500\"",
        "2024-01-04,182.15,183.09,180.88,181.91,181.02,71983600",
    ]);

    let prices = load_closing_prices(file.path()).unwrap();
    assert_eq!(prices, vec![185.64, 184.25, 181.91]);
}

#[test]
fn test_header_only_file_is_empty() {
    let file = write_csv(&[]);

    assert!(load_closing_prices(file.path()).unwrap().is_empty());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = load_closing_prices(dir.path().join("missing.csv")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_bad_row_is_reported() {
    let file = write_csv(&[
        "2024-01-02,1,2,3,185.64,5,6",
        "2024-01-03,1,2,3,n/a,5,6",
    ]);

    match load_closing_prices(file.path()) {
        Err(Error::InvalidPrice { row, value }) => {
            assert_eq!(row, 3);
            assert_eq!(value, "n/a");
        }
        other => panic!("expected InvalidPrice, got {:?}", other),
    }
}

#[test]
fn test_csv_to_predictions() {
    let rows: Vec<String> = (0..12)
        .map(|i| format!("2024-02-{:02},0,0,0,{:.2},0,0", i + 1, 150.0 + i as f64 * 1.25))
        .collect();
    let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = write_csv(&row_refs);

    let prices = load_closing_prices(file.path()).unwrap();
    let config = TrainingConfig {
        epochs: 3,
        seed: Some(9),
        ..TrainingConfig::default()
    };
    let report = run(&config, &prices).unwrap();

    assert_eq!(report.predictions.len(), prices.len() - config.sequence_length);
    assert!((report.predictions[0].actual - prices[5]).abs() < 1e-9);
}

#[test]
fn test_config_from_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"epochs": 3, "gate_derivative": "reference", "carry_state": true}}"#).unwrap();
    file.flush().unwrap();

    let config = TrainingConfig::from_json_file(file.path()).unwrap();

    assert_eq!(config.epochs, 3);
    assert_eq!(config.gate_derivative, GateDerivative::Reference);
    assert!(config.carry_state);
    assert_eq!(config.sequence_length, TrainingConfig::default().sequence_length);
}

#[test]
fn test_config_rejects_unknown_and_invalid_fields() {
    let mut unknown = NamedTempFile::new().unwrap();
    write!(unknown, r#"{{"epoch": 3}}"#).unwrap();
    unknown.flush().unwrap();
    assert!(matches!(TrainingConfig::from_json_file(unknown.path()), Err(Error::Json(_))));

    let mut invalid = NamedTempFile::new().unwrap();
    write!(invalid, r#"{{"learning_rate": -1.0}}"#).unwrap();
    invalid.flush().unwrap();
    assert!(matches!(
        TrainingConfig::from_json_file(invalid.path()),
        Err(Error::InvalidConfig(_))
    ));
}
