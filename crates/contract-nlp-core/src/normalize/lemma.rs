//! Rule-table lemmatizer for business queries.
//!
//! Tables are consulted in strict order: runtime business rules, built-in
//! business rules, irregular verbs, business plurals, common verb forms,
//! then guarded suffix stripping. The first table that knows a word wins.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

const BUSINESS_RULES: &[(&str, &[&str])] = &[
    ("process", &["processing", "processed", "processes"]),
    ("error", &["errors"]),
    ("failure", &["failures"]),
    ("fail", &["failed", "failing", "fails"]),
    ("validation", &["validations"]),
    ("validate", &["validated", "validating", "validates"]),
    ("violation", &["violations"]),
    ("violate", &["violated", "violating", "violates"]),
    ("load", &["loading", "loaded", "loads"]),
    ("part", &["parts", "parting", "parted"]),
    ("contract", &["contracts", "contracting", "contracted"]),
    ("customer", &["customers"]),
    ("price", &["pricing", "priced", "prices"]),
    ("status", &["statuses"]),
    ("information", &["informations"]),
    ("detail", &["detailing", "detailed", "details"]),
    ("issue", &["issues", "issuing", "issued"]),
    ("problem", &["problems"]),
    ("reason", &["reasons"]),
    ("cause", &["causes"]),
    ("line", &["lines"]),
    ("column", &["columns"]),
    ("order", &["orders"]),
    ("quantity", &["quantities"]),
    ("lead", &["leading", "led", "leads"]),
    ("minimize", &["minimizing", "minimized", "minimizes"]),
    ("maximize", &["maximizing", "maximized", "maximizes"]),
];

const IRREGULAR_VERBS: &[(&str, &[&str])] = &[
    ("go", &["went", "gone", "going", "goes"]),
    ("come", &["came", "coming", "comes"]),
    ("see", &["saw", "seen", "seeing", "sees"]),
    ("do", &["did", "done", "doing", "does"]),
    ("have", &["had", "has", "having"]),
    ("be", &["was", "were", "been", "being", "am", "is", "are"]),
    ("make", &["made", "making", "makes"]),
    ("give", &["gave", "given", "giving", "gives"]),
    ("take", &["took", "taken", "taking", "takes"]),
    ("write", &["wrote", "written", "writing", "writes"]),
    ("run", &["ran", "running", "runs"]),
    ("build", &["built", "building", "builds"]),
    ("send", &["sent", "sending", "sends"]),
    ("bring", &["brought", "bringing", "brings"]),
    ("buy", &["bought", "buying", "buys"]),
];

const BUSINESS_PLURALS: &[(&str, &str)] = &[
    ("specifications", "specification"),
    ("descriptions", "description"),
    ("summaries", "summary"),
    ("categories", "category"),
    ("classifications", "classification"),
    ("suppliers", "supplier"),
    ("invoices", "invoice"),
    ("deliveries", "delivery"),
    ("shipments", "shipment"),
    ("inventories", "inventory"),
    ("warranties", "warranty"),
    ("requirements", "requirement"),
    ("performances", "performance"),
    ("maintenances", "maintenance"),
    ("managements", "management"),
    ("businesses", "business"),
    ("opportunities", "opportunity"),
    ("accounts", "account"),
    ("awards", "award"),
];

const COMMON_VERBS: &[(&str, &[&str])] = &[
    ("show", &["shows", "showing", "showed", "shown"]),
    ("list", &["lists", "listing", "listed"]),
    ("get", &["gets", "getting", "got", "gotten"]),
    ("find", &["finds", "finding", "found"]),
    ("search", &["searches", "searching", "searched"]),
    ("display", &["displays", "displaying", "displayed"]),
    ("retrieve", &["retrieves", "retrieving", "retrieved"]),
    ("fetch", &["fetches", "fetching", "fetched"]),
    ("check", &["checks", "checking", "checked"]),
    ("verify", &["verifies", "verifying", "verified"]),
    ("update", &["updates", "updating", "updated"]),
    ("create", &["creates", "creating", "created"]),
    ("delete", &["deletes", "deleting", "deleted"]),
    ("modify", &["modifies", "modifying", "modified"]),
    ("edit", &["edits", "editing", "edited"]),
    ("add", &["adds", "adding", "added"]),
    ("remove", &["removes", "removing", "removed"]),
    ("filter", &["filters", "filtering", "filtered"]),
    ("sort", &["sorts", "sorting", "sorted"]),
    ("group", &["groups", "grouping", "grouped"]),
    ("count", &["counts", "counting", "counted"]),
    ("calculate", &["calculates", "calculating", "calculated"]),
    ("compute", &["computes", "computing", "computed"]),
    ("generate", &["generates", "generating", "generated"]),
    ("expire", &["expires", "expiring", "expired"]),
];

fn build(rules: &[(&'static str, &'static [&'static str])]) -> HashMap<&'static str, &'static str> {
    let mut map = HashMap::new();
    for (lemma, forms) in rules {
        for form in *forms {
            map.insert(*form, *lemma);
        }
    }
    map
}

static BUSINESS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| build(BUSINESS_RULES));
static IRREGULAR: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| build(IRREGULAR_VERBS));
static PLURALS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| BUSINESS_PLURALS.iter().copied().collect());
static COMMON: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| build(COMMON_VERBS));

/// Irregular past-tense forms recognised by [`Lemmatizer::is_past_tense`].
const IRREGULAR_PAST: &[&str] = &[
    "went", "came", "saw", "did", "had", "was", "were", "made", "gave", "took", "got", "wrote",
    "ran", "built", "sent", "brought", "bought", "found", "led", "done", "seen", "been",
];

/// Token that must survive tense-preserving lemmatization.
const PRESERVED: &str = "created";

/// Table sizes reported by [`Lemmatizer::statistics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LemmaStats {
    pub business_rules: usize,
    pub irregular_verbs: usize,
    pub business_plurals: usize,
    pub common_rules: usize,
    pub custom_rules: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Lemmatizer {
    custom: HashMap<String, String>,
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extra word → lemma rule. Consulted before every built-in table.
    pub fn add_business_rule(&mut self, word: &str, lemma: &str) {
        self.custom
            .insert(word.trim().to_lowercase(), lemma.trim().to_lowercase());
    }

    /// Lemma of a single word, lowercase. Unknown words come back lowercased.
    pub fn lemmatize(&self, word: &str) -> String {
        let w = word.trim().to_lowercase();
        if w.is_empty() {
            return w;
        }
        if let Some(lemma) = self.custom.get(&w) {
            return lemma.clone();
        }
        for table in [&*BUSINESS, &*IRREGULAR, &*PLURALS, &*COMMON] {
            if let Some(lemma) = table.get(w.as_str()) {
                return (*lemma).to_string();
            }
        }
        strip_suffix(&w).unwrap_or(w)
    }

    /// Lemmatize every word; punctuation around words is kept.
    pub fn lemmatize_text(&self, text: &str) -> String {
        map_words(text, |core| self.lemmatize(core))
    }

    /// Like [`lemmatize_text`](Self::lemmatize_text) but keeps "created".
    ///
    /// "contracts created by X" is a lookup; "create contract" is a command.
    /// Collapsing the two would erase that difference.
    pub fn lemmatize_text_preserve_tense(&self, text: &str) -> String {
        map_words(text, |core| {
            if core.eq_ignore_ascii_case(PRESERVED) {
                PRESERVED.to_string()
            } else {
                self.lemmatize(core)
            }
        })
    }

    pub fn is_past_tense(&self, word: &str) -> bool {
        let w = word.trim().to_lowercase();
        IRREGULAR_PAST.contains(&w.as_str())
            || (w.len() > 3 && w.ends_with("ed") && w.chars().all(|c| c.is_ascii_alphabetic()))
    }

    pub fn statistics(&self) -> LemmaStats {
        LemmaStats {
            business_rules: BUSINESS.len(),
            irregular_verbs: IRREGULAR.len(),
            business_plurals: PLURALS.len(),
            common_rules: COMMON.len(),
            custom_rules: self.custom.len(),
        }
    }
}

/// Every word the built-in tables know, as surface form or lemma.
pub(crate) fn known_words() -> impl Iterator<Item = &'static str> {
    [&*BUSINESS, &*IRREGULAR, &*PLURALS, &*COMMON]
        .into_iter()
        .flat_map(|t| t.iter().flat_map(|(k, v)| [*k, *v]))
}

/// Apply `f` to the alphanumeric core of each whitespace token.
fn map_words(text: &str, f: impl Fn(&str) -> String) -> String {
    text.split_whitespace()
        .map(|token| {
            let (prefix, core, suffix) = split_token(token);
            if core.is_empty() {
                token.to_string()
            } else {
                format!("{prefix}{}{suffix}", f(core))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a token into leading punctuation, word core and trailing punctuation.
pub(crate) fn split_token(token: &str) -> (&str, &str, &str) {
    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '\'';
    let start = token.find(is_word).unwrap_or(token.len());
    let end = token
        .rfind(is_word)
        .map(|i| i + token[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(start);
    (&token[..start], &token[start..end], &token[end..])
}

fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// Guarded suffix stripping for words no table knows.
///
/// Skips anything with digits, words ending in `ss`/`us`/`is`, and any
/// strip that would leave fewer than three characters.
fn strip_suffix(word: &str) -> Option<String> {
    if !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if ["ss", "us", "is"].iter().any(|s| word.ends_with(s)) {
        return None;
    }
    let undouble = |stem: &str| -> String {
        let b = stem.as_bytes();
        let n = b.len();
        if n >= 2 && b[n - 1] == b[n - 2] && !is_vowel(b[n - 1]) && !matches!(b[n - 1], b'l' | b's' | b'z') {
            stem[..n - 1].to_string()
        } else {
            stem.to_string()
        }
    };

    if let Some(stem) = word.strip_suffix("ies")
        && stem.len() >= 2
    {
        return Some(format!("{stem}y"));
    }
    if let Some(stem) = word.strip_suffix("ing")
        && stem.len() >= 3
        && stem.bytes().any(is_vowel)
    {
        return Some(undouble(stem));
    }
    if let Some(stem) = word.strip_suffix("ied")
        && stem.len() >= 2
    {
        return Some(format!("{stem}y"));
    }
    if let Some(stem) = word.strip_suffix("ed")
        && stem.len() >= 3
        && stem.bytes().any(is_vowel)
    {
        return Some(undouble(stem));
    }
    if let Some(stem) = word.strip_suffix("es")
        && stem.len() >= 3
        && ["s", "x", "z", "ch", "sh"].iter().any(|s| stem.ends_with(s))
    {
        return Some(stem.to_string());
    }
    if let Some(stem) = word.strip_suffix('s')
        && stem.len() >= 3
    {
        return Some(stem.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemma(w: &str) -> String {
        Lemmatizer::new().lemmatize(w)
    }

    #[test]
    fn business_rules_take_priority() {
        assert_eq!(lemma("contracts"), "contract");
        assert_eq!(lemma("Failed"), "fail");
        assert_eq!(lemma("pricing"), "price");
        assert_eq!(lemma("led"), "lead");
    }

    #[test]
    fn irregular_and_common_forms() {
        assert_eq!(lemma("went"), "go");
        assert_eq!(lemma("were"), "be");
        assert_eq!(lemma("showing"), "show");
        assert_eq!(lemma("created"), "create");
        assert_eq!(lemma("summaries"), "summary");
    }

    #[test]
    fn suffix_rules_are_guarded() {
        assert_eq!(lemma("requested"), "request");
        assert_eq!(lemma("boxes"), "box");
        assert_eq!(lemma("planning"), "plan");
        assert_eq!(lemma("agencies"), "agency");
        assert_eq!(lemma("vendors"), "vendor");
        // guarded: never mangled
        assert_eq!(lemma("status"), "status");
        assert_eq!(lemma("business"), "business");
        assert_eq!(lemma("analysis"), "analysis");
        assert_eq!(lemma("2025s"), "2025s");
        assert_eq!(lemma("bed"), "bed");
        assert_eq!(lemma("gas"), "gas");
        assert_eq!(lemma("active"), "active");
    }

    #[test]
    fn preserve_tense_keeps_created() {
        let l = Lemmatizer::new();
        assert_eq!(
            l.lemmatize_text_preserve_tense("contracts created by vinod"),
            "contract created by vinod"
        );
        assert_eq!(l.lemmatize_text("contracts created by vinod"), "contract create by vinod");
        assert_eq!(
            l.lemmatize_text_preserve_tense("Show contracts CREATED in 2024?"),
            "show contract created in 2024?"
        );
    }

    #[test]
    fn punctuation_survives_lemmatization() {
        let l = Lemmatizer::new();
        assert_eq!(l.lemmatize_text("(parts), errors!"), "(part), error!");
    }

    #[test]
    fn custom_rules_win() {
        let mut l = Lemmatizer::new();
        l.add_business_rule("Awards", "contract");
        assert_eq!(l.lemmatize("awards"), "contract");
        assert_eq!(l.statistics().custom_rules, 1);
    }

    #[test]
    fn past_tense_detection() {
        let l = Lemmatizer::new();
        assert!(l.is_past_tense("created"));
        assert!(l.is_past_tense("made"));
        assert!(l.is_past_tense("built"));
        assert!(!l.is_past_tense("create"));
        assert!(!l.is_past_tense("bed"));
    }

    #[test]
    fn statistics_reports_table_sizes() {
        let stats = Lemmatizer::new().statistics();
        assert!(stats.business_rules > 40);
        assert!(stats.irregular_verbs > 30);
        assert_eq!(stats.business_plurals, BUSINESS_PLURALS.len());
        assert_eq!(stats.custom_rules, 0);
    }

    #[test]
    fn split_token_handles_edges() {
        assert_eq!(split_token("(parts),"), ("(", "parts", "),"));
        assert_eq!(split_token("???"), ("???", "", ""));
        assert_eq!(split_token("aren't"), ("", "aren't", ""));
    }
}
