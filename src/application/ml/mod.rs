pub mod predictor;
pub mod smartcore_predictor;
