//! Query taxonomy: query type, structured action type, classification result.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which business table family a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    Contracts,
    Parts,
    FailedParts,
    Customers,
    Help,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contracts => "CONTRACTS",
            Self::Parts => "PARTS",
            Self::FailedParts => "FAILED_PARTS",
            Self::Customers => "CUSTOMERS",
            Self::Help => "HELP",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base action selected by the classifier's cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseAction {
    #[serde(rename = "contracts_by_user")]
    ContractsByUser,
    #[serde(rename = "contracts_by_contractnumber")]
    ContractsByContractNumber,
    #[serde(rename = "contracts_by_filter")]
    ContractsByFilter,
    #[serde(rename = "create_contract")]
    CreateContract,
    #[serde(rename = "HELP_CONTRACT_CREATE_USER")]
    HelpCreateUser,
    #[serde(rename = "HELP_CONTRACT_CREATE_BOT")]
    HelpCreateBot,
    #[serde(rename = "parts_by_part_number")]
    PartsByPartNumber,
    #[serde(rename = "parts_by_contract_number")]
    PartsByContractNumber,
    #[serde(rename = "parts_by_filter")]
    PartsByFilter,
    #[serde(rename = "failed_parts_by_part_number")]
    FailedPartsByPartNumber,
    #[serde(rename = "parts_failed_by_contract_number")]
    FailedPartsByContractNumber,
    #[serde(rename = "customers_by_number")]
    CustomersByNumber,
    #[serde(rename = "customers_by_name")]
    CustomersByName,
    #[serde(rename = "customers_by_filter")]
    CustomersByFilter,
}

impl BaseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContractsByUser => "contracts_by_user",
            Self::ContractsByContractNumber => "contracts_by_contractnumber",
            Self::ContractsByFilter => "contracts_by_filter",
            Self::CreateContract => "create_contract",
            Self::HelpCreateUser => "HELP_CONTRACT_CREATE_USER",
            Self::HelpCreateBot => "HELP_CONTRACT_CREATE_BOT",
            Self::PartsByPartNumber => "parts_by_part_number",
            Self::PartsByContractNumber => "parts_by_contract_number",
            Self::PartsByFilter => "parts_by_filter",
            Self::FailedPartsByPartNumber => "failed_parts_by_part_number",
            Self::FailedPartsByContractNumber => "parts_failed_by_contract_number",
            Self::CustomersByNumber => "customers_by_number",
            Self::CustomersByName => "customers_by_name",
            Self::CustomersByFilter => "customers_by_filter",
        }
    }

    /// Actions belonging to the contract-creation family.
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            Self::CreateContract | Self::HelpCreateUser | Self::HelpCreateBot
        )
    }
}

/// Orthogonal suffixes appended after the base action.
///
/// Declaration order is the rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionModifier {
    Metadata,
    Detailed,
    Summary,
}

impl ActionModifier {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Metadata => "_metadata",
            Self::Detailed => "_detailed",
            Self::Summary => "_summary",
        }
    }
}

/// Base action plus modifiers. Renders as `base[_metadata][_detailed][_summary]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionType {
    pub base: BaseAction,
    pub modifiers: BTreeSet<ActionModifier>,
}

impl ActionType {
    pub fn new(base: BaseAction) -> Self {
        Self {
            base,
            modifiers: BTreeSet::new(),
        }
    }

    pub fn with_modifier(mut self, modifier: ActionModifier) -> Self {
        self.modifiers.insert(modifier);
        self
    }

    pub fn has(&self, modifier: ActionModifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.as_str())?;
        for m in &self.modifiers {
            f.write_str(m.suffix())?;
        }
        Ok(())
    }
}

/// Final label for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryClassification {
    pub query_type: QueryType,
    pub action_type: ActionType,
    /// Always in `[0, 1]`.
    pub confidence: f64,
}

impl QueryClassification {
    pub fn new(query_type: QueryType, action_type: ActionType, confidence: f64) -> Self {
        Self {
            query_type,
            action_type,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueSeverity {
    Warning,
    Error,
}

/// A warning or error attached to an interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub message: String,
    pub severity: IssueSeverity,
}

impl ValidationIssue {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: IssueSeverity::Warning,
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: IssueSeverity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_type_renders_modifiers_in_fixed_order() {
        let action = ActionType::new(BaseAction::ContractsByContractNumber)
            .with_modifier(ActionModifier::Summary)
            .with_modifier(ActionModifier::Metadata)
            .with_modifier(ActionModifier::Detailed);
        assert_eq!(
            action.to_string(),
            "contracts_by_contractnumber_metadata_detailed_summary"
        );
    }

    #[test]
    fn plain_action_type_is_base_name() {
        assert_eq!(
            ActionType::new(BaseAction::HelpCreateBot).to_string(),
            "HELP_CONTRACT_CREATE_BOT"
        );
        assert_eq!(
            ActionType::new(BaseAction::FailedPartsByContractNumber).to_string(),
            "parts_failed_by_contract_number"
        );
    }

    #[test]
    fn confidence_is_clamped() {
        let c = QueryClassification::new(
            QueryType::Contracts,
            ActionType::new(BaseAction::ContractsByFilter),
            1.7,
        );
        assert_eq!(c.confidence, 1.0);
        let c = QueryClassification::new(QueryType::Help, ActionType::new(BaseAction::HelpCreateUser), -0.2);
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn query_type_serialises_screaming_case() {
        assert_eq!(
            serde_json::to_string(&QueryType::FailedParts).unwrap(),
            "\"FAILED_PARTS\""
        );
        assert_eq!(QueryType::Help.to_string(), "HELP");
    }

    #[test]
    fn creation_family() {
        assert!(BaseAction::CreateContract.is_creation());
        assert!(BaseAction::HelpCreateUser.is_creation());
        assert!(!BaseAction::ContractsByUser.is_creation());
    }
}
