/// Module for the single-step LSTM cell.
pub mod lstm_cell;
