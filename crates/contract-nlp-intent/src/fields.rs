//! Display columns per query type and the named field groups.

use contract_nlp_core::{QueryType, Table};

/// Table a query type reads from. Customer and help queries use the
/// contracts table.
pub fn table_for(query_type: QueryType) -> Table {
    match query_type {
        QueryType::Parts => Table::Parts,
        QueryType::FailedParts => Table::FailedParts,
        QueryType::Contracts | QueryType::Customers | QueryType::Help => Table::Contracts,
    }
}

/// Column that identifies a row of the query type's result.
pub fn primary_identifier(query_type: QueryType) -> Option<&'static str> {
    match query_type {
        QueryType::Contracts => Some("AWARD_NUMBER"),
        QueryType::Parts => Some("INVOICE_PART_NUMBER"),
        QueryType::FailedParts => Some("PART_NUMBER"),
        QueryType::Customers => Some("CUSTOMER_NUMBER"),
        QueryType::Help => None,
    }
}

pub fn default_fields(query_type: QueryType) -> &'static [&'static str] {
    match query_type {
        QueryType::Contracts => &[
            "CONTRACT_NAME",
            "CUSTOMER_NAME",
            "CUSTOMER_NUMBER",
            "CREATE_DATE",
            "EXPIRATION_DATE",
            "STATUS",
        ],
        QueryType::Parts => &[
            "INVOICE_PART_NUMBER",
            "LOADED_CP_NUMBER",
            "PRICE",
            "LEAD_TIME",
            "STATUS",
        ],
        QueryType::FailedParts => &["PART_NUMBER", "REASON", "ERROR_COLUMN", "CONTRACT_NO"],
        QueryType::Customers => &["CUSTOMER_NUMBER", "CUSTOMER_NAME"],
        QueryType::Help => &[
            "CONTRACT_NAME",
            "CUSTOMER_NAME",
            "ACCOUNT_NUMBER",
            "DESCRIPTION",
            "COMMENTS",
            "TITLE",
            "IS_PRICELIST",
        ],
    }
}

/// A named bundle of columns pulled in when its trigger word appears.
pub struct FieldGroup {
    pub name: &'static str,
    /// Lemmas that switch the group on.
    pub triggers: &'static [&'static str],
    pub fields: &'static [&'static str],
}

/// Tried in this order; only the first matching group applies.
pub const FIELD_GROUPS: &[FieldGroup] = &[
    FieldGroup {
        name: "summary",
        triggers: &["summary", "overview"],
        fields: &["AWARD_NUMBER", "CUSTOMER_NAME", "STATUS", "CREATE_DATE"],
    },
    FieldGroup {
        name: "details",
        triggers: &["detail"],
        fields: &[
            "AWARD_NUMBER",
            "CUSTOMER_NAME",
            "EFFECTIVE_DATE",
            "EXPIRATION_DATE",
            "STATUS",
            "PROJECT_TYPE",
        ],
    },
    FieldGroup {
        name: "metadata",
        triggers: &["metadata"],
        fields: &[
            "AWARD_NUMBER",
            "CUSTOMER_NAME",
            "CREATE_DATE",
            "EFFECTIVE_DATE",
            "STATUS",
            "PROJECT_TYPE",
            "PRICE_LIST",
            "CREATED_BY",
        ],
    },
    FieldGroup {
        name: "customer",
        triggers: &["customer", "account", "client"],
        fields: &["CUSTOMER_NAME", "CUSTOMER_NUMBER", "AWARD_NUMBER"],
    },
    FieldGroup {
        name: "financial",
        triggers: &["financial", "price", "cost"],
        fields: &["AWARD_NUMBER", "PRICE_LIST", "EFFECTIVE_DATE", "CUSTOMER_NAME", "PRICE"],
    },
    FieldGroup {
        name: "status",
        triggers: &["status"],
        fields: &["AWARD_NUMBER", "STATUS", "EFFECTIVE_DATE", "EXPIRATION_DATE"],
    },
    FieldGroup {
        name: "parts",
        triggers: &["part", "component"],
        fields: &["INVOICE_PART_NUMBER", "STATUS", "LOADED_CP_NUMBER"],
    },
];

/// First group whose trigger is among `lemmas`.
pub fn matching_group(lemmas: &[String]) -> Option<&'static FieldGroup> {
    FIELD_GROUPS
        .iter()
        .find(|g| lemmas.iter().any(|l| g.triggers.contains(&l.as_str())))
}

/// Append `field` unless already present.
pub(crate) fn push_unique(fields: &mut Vec<String>, field: &str) {
    if !fields.iter().any(|f| f == field) {
        fields.push(field.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_nlp_core::{ColumnRegistry, StaticColumnRegistry};

    #[test]
    fn every_default_field_is_a_known_column() {
        let registry = StaticColumnRegistry;
        for qt in [
            QueryType::Contracts,
            QueryType::Parts,
            QueryType::FailedParts,
            QueryType::Customers,
            QueryType::Help,
        ] {
            for field in default_fields(qt) {
                assert!(
                    registry.is_valid_column(table_for(qt), field),
                    "{field} missing from {}",
                    table_for(qt).name()
                );
            }
        }
    }

    #[test]
    fn groups_are_tried_in_order() {
        let lemmas = vec!["customer".to_string(), "summary".to_string()];
        assert_eq!(matching_group(&lemmas).map(|g| g.name), Some("summary"));
        let lemmas = vec!["show".to_string(), "part".to_string()];
        assert_eq!(matching_group(&lemmas).map(|g| g.name), Some("parts"));
        assert!(matching_group(&["show".to_string()]).is_none());
    }

    #[test]
    fn push_unique_keeps_first_position() {
        let mut fields = vec!["A".to_string(), "B".to_string()];
        push_unique(&mut fields, "A");
        push_unique(&mut fields, "C");
        assert_eq!(fields, ["A", "B", "C"]);
    }
}
