//! Extracted filter entities and the primary-identifier header.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison carried by an extracted filter.
///
/// The date-shaped operations (`IN_YEAR` … `MONTH_RANGE`) keep the shape of
/// the temporal expression so a downstream SQL builder can expand them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "BETWEEN")]
    Between,
    #[serde(rename = "IN_YEAR")]
    InYear,
    #[serde(rename = "AFTER_YEAR")]
    AfterYear,
    #[serde(rename = "BEFORE_YEAR")]
    BeforeYear,
    #[serde(rename = "YEAR_RANGE")]
    YearRange,
    #[serde(rename = "MONTH_RANGE")]
    MonthRange,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Between => "BETWEEN",
            Self::InYear => "IN_YEAR",
            Self::AfterYear => "AFTER_YEAR",
            Self::BeforeYear => "BEFORE_YEAR",
            Self::YearRange => "YEAR_RANGE",
            Self::MonthRange => "MONTH_RANGE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an entity came from. Used to break ties during de-duplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitySource {
    BusinessRule,
    Pattern,
    Contextual,
    MlEnhancement,
    PosAnalysis,
    NerAnalysis,
}

impl EntitySource {
    pub fn priority(&self) -> u8 {
        match self {
            Self::BusinessRule => 4,
            Self::Pattern => 3,
            Self::Contextual | Self::MlEnhancement => 2,
            Self::PosAnalysis | Self::NerAnalysis => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BusinessRule => "business_rule",
            Self::Pattern => "pattern",
            Self::Contextual => "contextual",
            Self::MlEnhancement => "ml_enhancement",
            Self::PosAnalysis => "pos_analysis",
            Self::NerAnalysis => "ner_analysis",
        }
    }
}

/// A single typed filter: `attribute operation value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Column name, e.g. `AWARD_NUMBER`, `CREATE_DATE`.
    pub attribute: String,
    pub operation: Operation,
    pub value: String,
    pub source: EntitySource,
}

impl ExtractedEntity {
    pub fn new(
        attribute: impl Into<String>,
        operation: Operation,
        value: impl Into<String>,
        source: EntitySource,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            operation,
            value: value.into(),
            source,
        }
    }

    /// Identity used for de-duplication; the source is not part of it.
    pub fn dedup_key(&self) -> (String, Operation, String) {
        (
            self.attribute.to_ascii_uppercase(),
            self.operation,
            self.value.to_ascii_lowercase(),
        )
    }
}

impl fmt::Display for ExtractedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.operation, self.value)
    }
}

/// Merge `additional` into `base`, keeping one entity per
/// (attribute, operation, value) and preferring the higher-priority source.
///
/// First-seen position is kept, so the output order is stable.
pub fn merge_entities(
    base: Vec<ExtractedEntity>,
    additional: Vec<ExtractedEntity>,
) -> Vec<ExtractedEntity> {
    let mut merged: Vec<ExtractedEntity> = Vec::with_capacity(base.len() + additional.len());
    for entity in base.into_iter().chain(additional) {
        let key = entity.dedup_key();
        match merged.iter_mut().find(|e| e.dedup_key() == key) {
            Some(existing) => {
                if entity.source.priority() > existing.source.priority() {
                    existing.source = entity.source;
                }
            }
            None => merged.push(entity),
        }
    }
    merged
}

/// Primary identifiers found in a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub contract_number: Option<String>,
    pub part_number: Option<String>,
    pub customer_number: Option<String>,
    pub customer_name: Option<String>,
    pub created_by: Option<String>,
}

impl Header {
    pub fn has_identifier(&self) -> bool {
        self.contract_number.is_some()
            || self.part_number.is_some()
            || self.customer_number.is_some()
            || self.customer_name.is_some()
            || self.created_by.is_some()
    }

    /// Fill empty slots from `other`; existing values win.
    pub fn fill_from(&mut self, other: &Header) {
        fn fill(slot: &mut Option<String>, value: &Option<String>) {
            if slot.is_none() {
                slot.clone_from(value);
            }
        }
        fill(&mut self.contract_number, &other.contract_number);
        fill(&mut self.part_number, &other.part_number);
        fill(&mut self.customer_number, &other.customer_number);
        fill(&mut self.customer_name, &other.customer_name);
        fill(&mut self.created_by, &other.created_by);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entity(attr: &str, value: &str, source: EntitySource) -> ExtractedEntity {
        ExtractedEntity::new(attr, Operation::Eq, value, source)
    }

    #[test]
    fn source_priorities_are_ordered() {
        assert!(EntitySource::BusinessRule.priority() > EntitySource::Pattern.priority());
        assert!(EntitySource::Pattern.priority() > EntitySource::Contextual.priority());
        assert_eq!(
            EntitySource::Contextual.priority(),
            EntitySource::MlEnhancement.priority()
        );
        assert!(EntitySource::MlEnhancement.priority() > EntitySource::NerAnalysis.priority());
        assert_eq!(
            EntitySource::PosAnalysis.priority(),
            EntitySource::NerAnalysis.priority()
        );
    }

    #[test]
    fn merge_keeps_highest_priority_source() {
        let base = vec![entity("STATUS", "EXPIRED", EntitySource::MlEnhancement)];
        let extra = vec![entity("STATUS", "expired", EntitySource::BusinessRule)];
        let merged = merge_entities(base, extra);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, EntitySource::BusinessRule);
        assert_eq!(merged[0].value, "EXPIRED");
    }

    #[test]
    fn merge_preserves_first_seen_order() {
        let base = vec![
            entity("AWARD_NUMBER", "123456", EntitySource::Pattern),
            entity("STATUS", "ACTIVE", EntitySource::Pattern),
        ];
        let extra = vec![
            entity("CREATED_BY", "Vinod", EntitySource::Pattern),
            entity("AWARD_NUMBER", "123456", EntitySource::NerAnalysis),
        ];
        let merged = merge_entities(base, extra);
        let attrs: Vec<&str> = merged.iter().map(|e| e.attribute.as_str()).collect();
        assert_eq!(attrs, vec!["AWARD_NUMBER", "STATUS", "CREATED_BY"]);
        assert_eq!(merged[0].source, EntitySource::Pattern);
    }

    #[test]
    fn operations_serialise_as_wire_symbols() {
        let e = ExtractedEntity::new("CREATE_DATE", Operation::InYear, "2025", EntitySource::Pattern);
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"operation\":\"IN_YEAR\""));
        assert!(json.contains("\"source\":\"pattern\""));
        let eq = serde_json::to_string(&Operation::Gte).unwrap();
        assert_eq!(eq, "\">=\"");
    }

    #[test]
    fn header_fill_keeps_existing_values() {
        let mut header = Header {
            contract_number: Some("100476".into()),
            ..Header::default()
        };
        let other = Header {
            contract_number: Some("999999".into()),
            created_by: Some("Vinod".into()),
            ..Header::default()
        };
        header.fill_from(&other);
        assert_eq!(header.contract_number.as_deref(), Some("100476"));
        assert_eq!(header.created_by.as_deref(), Some("Vinod"));
        assert!(header.has_identifier());
        assert!(!Header::default().has_identifier());
    }
}
