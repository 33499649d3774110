//! Column metadata for the contracts, parts and failed-parts tables.
//!
//! The [`ColumnRegistry`] trait is the seam to the host application's schema.
//! [`StaticColumnRegistry`] ships the built-in column lists and the business
//! synonyms users type ("lead time", "unit price", "client name").

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// The three business tables a query can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Contracts,
    Parts,
    FailedParts,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Contracts, Table::Parts, Table::FailedParts];

    /// Physical table name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Contracts => "HR.CCT_CONTRACTS_TMG",
            Self::Parts => "HR.CCT_PARTS_TMG",
            Self::FailedParts => "HR.CCT_FAILED_PARTS_TMG",
        }
    }

    /// Map an extractor-level attribute onto this table's column.
    ///
    /// The extractor emits `AWARD_NUMBER` for contract numbers and
    /// `PART_NUMBER` for part numbers; the parts tables store them under
    /// different names. Parts also keep their creation date in
    /// `CREATION_DATE` rather than `CREATE_DATE`.
    pub fn filter_column<'a>(&self, attribute: &'a str) -> &'a str {
        match (self, attribute) {
            (Self::Parts, "AWARD_NUMBER") => "LOADED_CP_NUMBER",
            (Self::Parts, "PART_NUMBER") => "INVOICE_PART_NUMBER",
            (Self::Parts, "CREATE_DATE") => "CREATION_DATE",
            (Self::FailedParts, "AWARD_NUMBER") => "CONTRACT_NO",
            _ => attribute,
        }
    }
}

/// Schema metadata supplied by the host application.
pub trait ColumnRegistry: Send + Sync {
    /// Physical column names of `table`.
    fn columns(&self, table: Table) -> Vec<String>;

    /// `(term, column)` pairs; terms are lowercase and space separated.
    fn synonyms(&self, table: Table) -> Vec<(String, String)>;

    fn is_valid_column(&self, table: Table, column: &str) -> bool {
        let column = column.to_ascii_uppercase();
        self.columns(table).iter().any(|c| *c == column)
    }

    /// Resolve a user term ("lead time", "unit_price", "PRICE") to a column.
    fn column_for_synonym(&self, table: Table, term: &str) -> Option<String> {
        let key = normalize_term(term);
        if key.is_empty() {
            return None;
        }
        if let Some((_, column)) = self.synonyms(table).into_iter().find(|(t, _)| *t == key) {
            return Some(column);
        }
        let as_column = key.replace(' ', "_").to_ascii_uppercase();
        self.is_valid_column(table, &as_column).then_some(as_column)
    }

    /// Columns named anywhere in `text`, in order of appearance.
    ///
    /// Longer terms win over terms they contain, so "future price" yields
    /// `FUTURE_PRICE` and not also `PRICE`.
    fn columns_mentioned(&self, table: Table, text: &str) -> Vec<String> {
        let haystack = format!(" {} ", normalize_term(text));
        let mut terms: Vec<(String, String)> = self.synonyms(table);
        for column in self.columns(table) {
            terms.push((column.to_ascii_lowercase().replace('_', " "), column));
        }
        terms.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut spans: Vec<(usize, usize, String)> = Vec::new();
        for (term, column) in terms {
            let needle = format!(" {term} ");
            let mut from = 0;
            while let Some(pos) = haystack[from..].find(&needle) {
                let start = from + pos;
                let end = start + needle.len();
                let overlaps = spans.iter().any(|(s, e, _)| start < *e && *s < end - 1);
                if !overlaps {
                    spans.push((start, end - 1, column.clone()));
                }
                from = start + 1;
            }
        }
        spans.sort_by_key(|(start, _, _)| *start);

        let mut found: Vec<String> = Vec::new();
        for (_, _, column) in spans {
            if !found.contains(&column) {
                found.push(column);
            }
        }
        found
    }
}

/// Lowercase, treat `_`/`-` as spaces, collapse whitespace.
pub fn normalize_term(term: &str) -> String {
    term.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Built-in schema ──

const CONTRACT_COLUMNS: &[&str] = &[
    "AWARD_NUMBER",
    "CONTRACT_NAME",
    "CUSTOMER_NAME",
    "CUSTOMER_NUMBER",
    "ALTERNATE_CUSTOMERS",
    "EFFECTIVE_DATE",
    "EXPIRATION_DATE",
    "PRICE_EXPIRATION_DATE",
    "DATE_OF_SIGNATURE",
    "CONTRACT_LENGTH",
    "PAYMENT_TERMS",
    "INCOTERMS",
    "CURRENCY",
    "CREATE_DATE",
    "CREATED_BY",
    "UPDATED_BY",
    "UPDATED_DATE",
    "OPPORTUNITY_NUMBER",
    "CONTRACT_TYPE",
    "PROJECT_TYPE",
    "PRICE_LIST",
    "IS_PRICELIST",
    "ACCOUNT_NUMBER",
    "TITLE",
    "DESCRIPTION",
    "COMMENTS",
    "STATUS",
    "SUMMARY",
    "IS_PROGRAM",
    "REBATE",
    "LINE_MIN",
    "ORDER_MIN",
    "MIN_MAX",
    "KITTING",
    "BAILMENT",
    "CONSIGNMENT",
    "STOCKING_STRATEGY",
    "TARGET_MARGIN",
    "TOTAL_PART_COUNT",
    "EXTERNAL_CONTRACT_NUMBER",
    "ACCOUNT_TYPE",
];

const PARTS_COLUMNS: &[&str] = &[
    "INVOICE_PART_NUMBER",
    "LOADED_CP_NUMBER",
    "AWARD_ID",
    "LINE_NO",
    "PRICE",
    "FUTURE_PRICE",
    "PREV_PRICE",
    "QUOTE_COST",
    "LEAD_TIME",
    "MOQ",
    "UOM",
    "EAU",
    "STATUS",
    "ITEM_CLASSIFICATION",
    "EFFECTIVE_DATE",
    "PART_EXPIRATION_DATE",
    "COMMENTS",
    "CREATION_DATE",
    "CREATED_BY",
    "LAST_UPDATE_DATE",
    "LAST_UPDATED_BY",
    "PLANT",
    "SAP_NUMBER",
    "NSN_PART_NUMBER",
    "OPPORTUNITY_NUMBER",
    "INCOTERMS",
];

const FAILED_PARTS_COLUMNS: &[&str] = &[
    "PART_NUMBER",
    "CONTRACT_NO",
    "LINE_NO",
    "REASON",
    "ERROR_COLUMN",
    "BUSINESS_RULE_VIOLATION",
    "LOADING_ERROR",
    "PROCESSING_ERROR",
    "VALIDATION_ERROR",
];

const CONTRACT_SYNONYMS: &[(&str, &str)] = &[
    ("contract number", "AWARD_NUMBER"),
    ("contract id", "AWARD_NUMBER"),
    ("award id", "AWARD_NUMBER"),
    ("contract name", "CONTRACT_NAME"),
    ("contract title", "CONTRACT_NAME"),
    ("agreement name", "CONTRACT_NAME"),
    ("deal name", "CONTRACT_NAME"),
    ("client name", "CUSTOMER_NAME"),
    ("account name", "CUSTOMER_NAME"),
    ("buyer name", "CUSTOMER_NAME"),
    ("customer id", "CUSTOMER_NUMBER"),
    ("customer no", "CUSTOMER_NUMBER"),
    ("start date", "EFFECTIVE_DATE"),
    ("begin date", "EFFECTIVE_DATE"),
    ("commencement date", "EFFECTIVE_DATE"),
    ("end date", "EXPIRATION_DATE"),
    ("expiry date", "EXPIRATION_DATE"),
    ("finish date", "EXPIRATION_DATE"),
    ("termination date", "EXPIRATION_DATE"),
    ("creation date", "CREATE_DATE"),
    ("created date", "CREATE_DATE"),
    ("created by", "CREATED_BY"),
    ("author", "CREATED_BY"),
    ("state", "STATUS"),
    ("price list", "PRICE_LIST"),
    ("pricelist", "PRICE_LIST"),
    ("payment term", "PAYMENT_TERMS"),
    ("remarks", "COMMENTS"),
    ("notes", "COMMENTS"),
];

const PARTS_SYNONYMS: &[(&str, &str)] = &[
    ("part number", "INVOICE_PART_NUMBER"),
    ("part id", "INVOICE_PART_NUMBER"),
    ("part code", "INVOICE_PART_NUMBER"),
    ("item number", "INVOICE_PART_NUMBER"),
    ("product number", "INVOICE_PART_NUMBER"),
    ("component number", "INVOICE_PART_NUMBER"),
    ("contract number", "LOADED_CP_NUMBER"),
    ("pricing", "PRICE"),
    ("cost", "PRICE"),
    ("unit price", "PRICE"),
    ("list price", "PRICE"),
    ("selling price", "PRICE"),
    ("minimum order", "MOQ"),
    ("min order", "MOQ"),
    ("min order qty", "MOQ"),
    ("minimum order quantity", "MOQ"),
    ("min qty", "MOQ"),
    ("unit of measure", "UOM"),
    ("unit measure", "UOM"),
    ("measurement unit", "UOM"),
    ("leadtime", "LEAD_TIME"),
    ("delivery time", "LEAD_TIME"),
    ("shipping time", "LEAD_TIME"),
    ("classification", "ITEM_CLASSIFICATION"),
    ("expiration date", "PART_EXPIRATION_DATE"),
    ("state", "STATUS"),
];

const FAILED_PARTS_SYNONYMS: &[(&str, &str)] = &[
    ("part", "PART_NUMBER"),
    ("contract number", "CONTRACT_NO"),
    ("line number", "LINE_NO"),
    ("error column", "ERROR_COLUMN"),
    ("column", "ERROR_COLUMN"),
    ("cause", "REASON"),
    ("error reason", "REASON"),
    ("business rule", "BUSINESS_RULE_VIOLATION"),
    ("rule violation", "BUSINESS_RULE_VIOLATION"),
    ("load error", "LOADING_ERROR"),
    ("validation", "VALIDATION_ERROR"),
];

struct TableSchema {
    columns: Vec<String>,
    synonyms: Vec<(String, String)>,
}

fn schema(columns: &[&str], synonyms: &[(&str, &str)]) -> TableSchema {
    TableSchema {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        synonyms: synonyms
            .iter()
            .map(|(t, c)| (normalize_term(t), c.to_string()))
            .collect(),
    }
}

static BUILT_IN: LazyLock<HashMap<Table, TableSchema>> = LazyLock::new(|| {
    HashMap::from([
        (Table::Contracts, schema(CONTRACT_COLUMNS, CONTRACT_SYNONYMS)),
        (Table::Parts, schema(PARTS_COLUMNS, PARTS_SYNONYMS)),
        (
            Table::FailedParts,
            schema(FAILED_PARTS_COLUMNS, FAILED_PARTS_SYNONYMS),
        ),
    ])
});

/// Registry backed by the built-in column lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticColumnRegistry;

impl ColumnRegistry for StaticColumnRegistry {
    fn columns(&self, table: Table) -> Vec<String> {
        BUILT_IN
            .get(&table)
            .map(|s| s.columns.clone())
            .unwrap_or_default()
    }

    fn synonyms(&self, table: Table) -> Vec<(String, String)> {
        BUILT_IN
            .get(&table)
            .map(|s| s.synonyms.clone())
            .unwrap_or_default()
    }
}

/// Every column term across all tables, lowercase with underscores.
///
/// Seeds the spell corrector's typo variants.
pub fn all_column_terms() -> Vec<String> {
    let mut terms: Vec<String> = CONTRACT_COLUMNS
        .iter()
        .chain(PARTS_COLUMNS)
        .chain(FAILED_PARTS_COLUMNS)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn synonyms_resolve_per_table() {
        let reg = StaticColumnRegistry;
        assert_eq!(
            reg.column_for_synonym(Table::Parts, "lead time").as_deref(),
            Some("LEAD_TIME")
        );
        assert_eq!(
            reg.column_for_synonym(Table::Parts, "Unit_Price").as_deref(),
            Some("PRICE")
        );
        assert_eq!(
            reg.column_for_synonym(Table::Contracts, "start date").as_deref(),
            Some("EFFECTIVE_DATE")
        );
        assert_eq!(
            reg.column_for_synonym(Table::Contracts, "contract number").as_deref(),
            Some("AWARD_NUMBER")
        );
        assert_eq!(
            reg.column_for_synonym(Table::Parts, "contract number").as_deref(),
            Some("LOADED_CP_NUMBER")
        );
    }

    #[test]
    fn column_names_resolve_to_themselves() {
        let reg = StaticColumnRegistry;
        assert_eq!(
            reg.column_for_synonym(Table::Contracts, "payment_terms").as_deref(),
            Some("PAYMENT_TERMS")
        );
        assert!(reg.is_valid_column(Table::FailedParts, "reason"));
        assert!(!reg.is_valid_column(Table::FailedParts, "PRICE"));
        assert_eq!(reg.column_for_synonym(Table::Contracts, "banana"), None);
        assert_eq!(reg.column_for_synonym(Table::Contracts, "  "), None);
    }

    #[test]
    fn mentioned_columns_prefer_longest_term() {
        let reg = StaticColumnRegistry;
        let found = reg.columns_mentioned(Table::Parts, "show future price and lead time for AB12345");
        assert_eq!(found, vec!["FUTURE_PRICE", "LEAD_TIME"]);
    }

    #[test]
    fn mentioned_columns_in_order_without_duplicates() {
        let reg = StaticColumnRegistry;
        let found = reg.columns_mentioned(
            Table::Contracts,
            "status and effective date and status of 123456",
        );
        assert_eq!(found, vec!["STATUS", "EFFECTIVE_DATE"]);
    }

    #[test]
    fn filter_columns_remap_for_parts_tables() {
        assert_eq!(Table::Parts.filter_column("AWARD_NUMBER"), "LOADED_CP_NUMBER");
        assert_eq!(Table::Parts.filter_column("PART_NUMBER"), "INVOICE_PART_NUMBER");
        assert_eq!(Table::FailedParts.filter_column("AWARD_NUMBER"), "CONTRACT_NO");
        assert_eq!(Table::Contracts.filter_column("AWARD_NUMBER"), "AWARD_NUMBER");
    }

    #[test]
    fn remapped_filter_columns_exist_on_their_table() {
        let reg = StaticColumnRegistry;
        assert_eq!(Table::Parts.filter_column("CREATE_DATE"), "CREATION_DATE");
        assert_eq!(Table::Contracts.filter_column("CREATE_DATE"), "CREATE_DATE");
        for table in [Table::Contracts, Table::Parts] {
            for attribute in ["AWARD_NUMBER", "CREATE_DATE"] {
                let column = table.filter_column(attribute);
                assert!(reg.is_valid_column(table, column), "{table:?} {column}");
            }
        }
        let column = Table::Parts.filter_column("PART_NUMBER");
        assert!(reg.is_valid_column(Table::Parts, column));
    }

    #[test]
    fn column_terms_are_lowercase_and_unique() {
        let terms = all_column_terms();
        assert!(terms.contains(&"lead_time".to_string()));
        assert!(terms.iter().all(|t| t.chars().all(|c| !c.is_ascii_uppercase())));
        let mut sorted = terms.clone();
        sorted.dedup();
        assert_eq!(sorted.len(), terms.len());
    }
}
