//! Intent classification for contract queries.
//!
//! [`IntentClassifier`] turns a raw utterance into a [`QueryResult`]:
//! normalized text, query type and action, typed filters, display columns
//! and a confidence breakdown. [`Enhancer`] then adds contextual filters,
//! field groups and the feedback-weighted feature score.

pub mod classifier;
pub mod confidence;
pub mod enhancer;
pub mod fields;
pub mod rules;
pub mod signals;

pub use classifier::{CreationIntent, IntentClassifier, QueryResult, Route};
pub use confidence::{ConfidenceBreakdown, ConfidenceCalculator, Interpretation};
pub use enhancer::{Enhancer, Feature, TrainingExample};
pub use rules::{Rule, RuleTable};
pub use signals::Signals;
