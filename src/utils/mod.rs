pub mod messages;
pub mod sources;
pub mod token_estimator;
