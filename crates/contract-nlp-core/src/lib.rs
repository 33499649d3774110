//! Core types, column registry, attribute table, configuration and text normalisation.

pub mod attributes;
pub mod columns;
pub mod config;
pub mod entity;
pub mod error;
pub mod normalize;
pub mod query;

pub use attributes::{AttributeConfig, AttributeSummary, AttributeTable, DataType};
pub use columns::{ColumnRegistry, StaticColumnRegistry, Table};
pub use config::{EngineConfig, FeedbackConfig};
pub use entity::{EntitySource, ExtractedEntity, Header, Operation, merge_entities};
pub use error::{ConfigError, ValidationFailure};
pub use normalize::{Correction, Lemmatizer, NormalizedText, SpellCorrector, TextNormalizer};
pub use query::{
    ActionModifier, ActionType, BaseAction, IssueSeverity, QueryClassification, QueryType,
    ValidationIssue,
};
