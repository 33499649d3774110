//! Dictionary spell correction.
//!
//! Correction is a single hash lookup per token. The dictionary is a curated
//! list of common misspellings, extended at construction with generated typo
//! variants of every column term:
//!
//! - underscore removed (`leadtime`)
//! - vowels stripped after the first letter (`ldtm`)
//! - every adjacent-letter swap (`eladtime`)
//! - every single-letter deletion (`leadtme`)
//!
//! Edit distance is only used afterwards, to score how far a correction moved
//! the word.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::lemma::{known_words, split_token};
use crate::columns::all_column_terms;

const CURATED: &[(&str, &str)] = &[
    ("contrct", "contract"),
    ("contarct", "contract"),
    ("contarcts", "contracts"),
    ("contracs", "contracts"),
    ("contrcts", "contracts"),
    ("kontrakt", "contract"),
    ("kontract", "contract"),
    ("ctrct", "contract"),
    ("contrat", "contract"),
    ("conract", "contract"),
    ("cntrct", "contract"),
    ("contrato", "contract"),
    ("creat", "create"),
    ("creatd", "created"),
    ("mak", "make"),
    ("maek", "make"),
    ("makeing", "making"),
    ("genrate", "generate"),
    ("genert", "generate"),
    ("shwo", "show"),
    ("shw", "show"),
    ("infro", "info"),
    ("detials", "details"),
    ("detalis", "details"),
    ("summry", "summary"),
    ("informaton", "information"),
    ("custmor", "customer"),
    ("cstomer", "customer"),
    ("custmer", "customer"),
    ("custommer", "customer"),
    ("costumer", "customer"),
    ("cust", "customer"),
    ("cstmr", "customer"),
    ("cstm", "customer"),
    ("customername", "customer name"),
    ("custname", "customer name"),
    ("clientname", "customer name"),
    ("buyername", "customer name"),
    ("cust_no", "customer number"),
    ("accountnumber", "account number"),
    ("account_no", "account number"),
    ("accountid", "account id"),
    ("numer", "number"),
    ("numbr", "number"),
    ("statuz", "status"),
    ("statuss", "status"),
    ("staus", "status"),
    ("aftr", "after"),
    ("btwn", "between"),
    ("mnth", "month"),
    ("lst", "last"),
    ("efective", "effective"),
    ("tim", "time"),
    ("prts", "parts"),
    ("parst", "parts"),
    ("partz", "parts"),
    ("prduct", "product"),
    ("accunt", "account"),
    ("acount", "account"),
    ("acc", "account"),
    ("provid", "provide"),
    ("avalable", "available"),
    ("actve", "active"),
    ("activ", "active"),
    ("discontnud", "discontinued"),
    ("discntinued", "discontinued"),
    ("exipred", "expired"),
    ("pric", "price"),
    ("prise", "price"),
    ("pricng", "pricing"),
    ("leed", "lead"),
    ("lede", "lead"),
    ("invoce", "invoice"),
    ("invoic", "invoice"),
    ("expir", "expire"),
    ("expiry", "expiration"),
    ("experation", "expiration"),
    ("paymet", "payment"),
    ("lenght", "length"),
    ("typ", "type"),
    ("faild", "failed"),
    ("filde", "failed"),
    ("faield", "failed"),
    ("pls", "please"),
    ("plz", "please"),
    ("thx", "thanks"),
    ("tnx", "thanks"),
    ("u", "you"),
    ("ur", "your"),
    ("yr", "your"),
    ("yu", "you"),
    ("hw", "how"),
    ("wat", "what"),
    ("mee", "me"),
    ("chek", "check"),
    ("warrenty", "warranty"),
    ("priod", "period"),
    ("isses", "issues"),
    ("manufacterer", "manufacturer"),
    ("specificatons", "specifications"),
    ("compatble", "compatible"),
    ("stok", "stock"),
    ("validdation", "validation"),
    ("loadded", "loaded"),
    ("loadding", "loading"),
    ("misssing", "missing"),
    ("addedd", "added"),
    ("mastr", "master"),
    ("successfull", "successful"),
    ("passd", "passed"),
    ("pasd", "passed"),
    ("becasue", "because"),
    ("becuase", "because"),
    ("arnt", "aren't"),
    ("oppurtunity", "opportunity"),
    ("opportnity", "opportunity"),
    ("opportuntiy", "opportunity"),
    ("opportinity", "opportunity"),
    ("opportuity", "opportunity"),
    ("oppty", "opportunity"),
    ("flieds", "fields"),
    ("boieng", "boeing"),
    ("corprate", "corporate"),
    ("tomorr", "tomorrow"),
    ("tmrw", "tomorrow"),
    ("todai", "today"),
    ("ystrday", "yesterday"),
    ("recieve", "receive"),
    ("adress", "address"),
    ("definately", "definitely"),
    ("seperately", "separately"),
    ("occured", "occurred"),
    ("teh", "the"),
    ("thier", "their"),
    ("enviroment", "environment"),
];

/// Real words that a generated typo variant must never shadow.
const PROTECTED: &[&str] = &[
    "the", "and", "for", "with", "from", "show", "list", "find", "date", "time", "name", "type",
    "part", "line", "cost", "term", "terms", "order", "count", "total", "last", "plan", "plat",
    "pant", "tile", "rice", "linen", "kiting", "lead", "stats", "item", "items", "rate", "note",
    "notes", "comment", "title", "price", "status", "summary", "reason", "created", "create",
    "update", "updated", "contract", "contracts", "customer", "account", "number", "numbers",
    "error", "errors", "failed", "active", "expired", "month", "year", "today", "between",
];

/// Token that is never corrected.
const PRESERVED: &str = "created";

/// One applied correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub from: String,
    pub to: String,
    /// `1 - levenshtein / max_len`, in `[0, 1]`.
    pub confidence: f64,
}

/// Confidence that `corrected` is what the user meant by `original`.
pub fn correction_confidence(original: &str, corrected: &str) -> f64 {
    let max_len = original.chars().count().max(corrected.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(original, corrected);
    (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct SpellCorrector {
    dictionary: HashMap<String, String>,
}

impl Default for SpellCorrector {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellCorrector {
    /// Curated corrections plus variants of every built-in column term.
    pub fn new() -> Self {
        Self::with_terms(&all_column_terms())
    }

    /// Curated corrections plus variants of `terms` (lowercase, `_`-separated).
    pub fn with_terms(terms: &[String]) -> Self {
        let mut dictionary: HashMap<String, String> = CURATED
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let protected: HashSet<&str> = PROTECTED
            .iter()
            .copied()
            .chain(known_words())
            .chain(CURATED.iter().map(|(_, v)| *v))
            .collect();

        let mut generated = 0usize;
        for term in terms {
            let canonical = term.replace('_', " ");
            for variant in typo_variants(term) {
                if variant.chars().count() < 4
                    || variant == canonical
                    || protected.contains(variant.as_str())
                    || dictionary.contains_key(&variant)
                {
                    continue;
                }
                dictionary.insert(variant, canonical.clone());
                generated += 1;
            }
        }
        tracing::debug!(
            curated = CURATED.len(),
            generated,
            "spell dictionary built"
        );

        Self { dictionary }
    }

    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    /// Canonical form for a single word, if the dictionary knows it.
    pub fn lookup(&self, word: &str) -> Option<&str> {
        let key = word.to_lowercase();
        if key == PRESERVED {
            return None;
        }
        self.dictionary.get(&key).map(String::as_str)
    }

    pub fn correct(&self, text: &str) -> String {
        self.correct_with_report(text).0
    }

    /// Corrected text plus every correction applied, in order.
    ///
    /// Tokens keep their surrounding punctuation; untouched tokens keep their case.
    pub fn correct_with_report(&self, text: &str) -> (String, Vec<Correction>) {
        let mut corrections = Vec::new();
        let words: Vec<String> = text
            .split_whitespace()
            .map(|token| {
                let (prefix, core, suffix) = split_token(token);
                match self.lookup(core) {
                    Some(fixed) if !fixed.eq_ignore_ascii_case(core) => {
                        corrections.push(Correction {
                            from: core.to_string(),
                            to: fixed.to_string(),
                            confidence: correction_confidence(&core.to_lowercase(), fixed),
                        });
                        format!("{prefix}{fixed}{suffix}")
                    }
                    _ => token.to_string(),
                }
            })
            .collect();
        (words.join(" "), corrections)
    }
}

/// Typo variants of a lowercase `_`-separated term.
fn typo_variants(term: &str) -> Vec<String> {
    let compact: String = term.chars().filter(|c| *c != '_').collect();
    let mut out = Vec::new();
    if compact != term {
        out.push(term.to_string());
        out.push(compact.clone());
    }

    let chars: Vec<char> = compact.chars().collect();
    if let Some((first, rest)) = chars.split_first() {
        let stripped: String = std::iter::once(*first)
            .chain(rest.iter().copied().filter(|c| !"aeiou".contains(*c)))
            .collect();
        out.push(stripped);
    }
    for i in 0..chars.len().saturating_sub(1) {
        if chars[i] == chars[i + 1] {
            continue;
        }
        let mut swapped = chars.clone();
        swapped.swap(i, i + 1);
        out.push(swapped.into_iter().collect());
    }
    for i in 0..chars.len() {
        let mut deleted = chars.clone();
        deleted.remove(i);
        out.push(deleted.into_iter().collect());
    }
    out
}
