//! Lexical signals read off a normalized utterance.
//!
//! [`Signals`] is the input every rule table sees. It is built once per
//! query from the spell-corrected text, its per-word lemmas and the
//! extractor's header, so predicates stay simple boolean lookups.

use contract_nlp_core::{Header, Lemmatizer};
use contract_nlp_extract::Extraction;

const CREATION_VERBS: &[&str] = &[
    "create", "make", "generate", "build", "draft", "initiate", "start", "establish", "prepare",
    "setup", "new",
];
const CREATION_GERUNDS: &[&str] = &[
    "creating", "making", "generating", "building", "drafting", "initiating", "starting",
    "establishing", "preparing",
];
/// Read-only verbs; an utterance that opens with one is a lookup.
const QUERY_VERBS: &[&str] = &[
    "show", "list", "get", "find", "display", "retrieve", "fetch", "search", "count", "give",
];
const QUESTION_WORDS: &[&str] = &["how", "what", "which", "where", "why"];
const HELP_WORDS: &[&str] = &[
    "help", "step", "steps", "guide", "guidance", "instruction", "instructions", "explain", "process",
    "procedure",
];
const HELP_PHRASES: &[&str] = &[
    "how to", "how do", "how can", "how should", "walk me through", "tell me how", "show me how",
    "help me", "need help",
];
const POLITE_LEADS: &[&str] = &["please", "kindly", "pls", "just"];
const URGENCY_WORDS: &[&str] = &["asap", "now", "immediately", "urgent", "urgently", "quickly"];
const REQUEST_PHRASES: &[&str] = &[
    "for me", "can you", "could you", "would you", "will you", "please", "need you to",
    "want you to", "i want", "i need", "i'd like", "i would like",
];
/// Single words that on their own ask for creation help. Checked before
/// the creation verbs, so a bare "new" is a question, not a command.
const AMBIGUOUS_SINGLE: &[&str] = &["help", "how", "what", "steps", "guide", "new", "start", "setup"];
/// Nouns that name the act of creating, as in "contract creation".
const CREATION_NOUNS: &[&str] = &["creation", "creations"];

/// Cues gathered for an utterance that asks about creating a contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreationCues {
    pub help: bool,
    pub imperative: bool,
    pub single_verb: bool,
    pub single_ambiguous: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Signals {
    /// Corrected text, lowercased.
    pub lower: String,
    pub words: Vec<String>,
    /// One lemma per entry of `words`; "created" is kept verbatim.
    pub lemmas: Vec<String>,
    pub header: Header,
    pub has_filters: bool,
    pub created_by: bool,
    pub created_without_by: bool,
    pub contract_term: bool,
    pub part_term: bool,
    pub failed_term: bool,
    pub customer_term: bool,
    pub creation: Option<CreationCues>,
}

fn split_words(lower: &str) -> Vec<String> {
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

impl Signals {
    pub fn build(corrected: &str, extraction: &Extraction, lemmatizer: &Lemmatizer) -> Self {
        let lower = corrected.to_lowercase();
        let words = split_words(&lower);
        let lemmas = words
            .iter()
            .map(|w| {
                if w == "created" {
                    w.clone()
                } else {
                    lemmatizer.lemmatize(w)
                }
            })
            .collect();

        let mut signals = Self {
            lower,
            words,
            lemmas,
            header: extraction.header.clone(),
            has_filters: !extraction.entities.is_empty(),
            ..Default::default()
        };
        signals.created_by =
            signals.has_phrase("created by") || signals.header.created_by.is_some();
        signals.created_without_by = signals.has_word("created") && !signals.created_by;
        signals.contract_term = signals.has_lemma(&["contract", "award", "agreement"]);
        signals.part_term = signals.has_lemma(&["part", "component"]);
        signals.failed_term = signals.has_lemma(&["fail", "failure", "error"]);
        signals.customer_term = signals.has_lemma(&["customer", "account", "client"]);
        signals.creation = signals.creation_cues(lemmatizer);
        signals
    }

    pub fn has_word(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn has_lemma(&self, lemmas: &[&str]) -> bool {
        self.lemmas.iter().any(|l| lemmas.contains(&l.as_str()))
    }

    /// Word-bounded phrase match.
    pub fn has_phrase(&self, phrase: &str) -> bool {
        let joined = format!(" {} ", self.words.join(" "));
        joined.contains(&format!(" {phrase} "))
    }

    pub fn is_single_word(&self) -> bool {
        self.words.len() == 1
    }

    pub fn has_contract_number(&self) -> bool {
        self.header.contract_number.is_some()
    }

    pub fn has_part_number(&self) -> bool {
        self.header.part_number.is_some()
    }

    pub fn has_customer_number(&self) -> bool {
        self.header.customer_number.is_some()
    }

    pub fn has_customer_name(&self) -> bool {
        self.header.customer_name.is_some()
    }

    pub fn is_creation(&self) -> bool {
        self.creation.is_some()
    }

    fn is_creation_verb(&self, i: usize, lemmatizer: &Lemmatizer) -> bool {
        let word = self.words[i].as_str();
        if lemmatizer.is_past_tense(word) {
            return false;
        }
        let lemma = self.lemmas[i].as_str();
        CREATION_VERBS.contains(&lemma)
            || CREATION_VERBS.contains(&word)
            || CREATION_GERUNDS.contains(&word)
    }

    fn asks_for_help(&self) -> bool {
        self.has_word("help") || self.has_phrase("help me") || self.has_phrase("need help")
    }

    /// Index of the first word after any polite lead-in.
    fn lead_index(&self) -> usize {
        self.words
            .iter()
            .take_while(|w| POLITE_LEADS.contains(&w.as_str()))
            .count()
    }

    fn creation_cues(&self, lemmatizer: &Lemmatizer) -> Option<CreationCues> {
        if self.words.is_empty() {
            return None;
        }

        if self.is_single_word() {
            let single_ambiguous = AMBIGUOUS_SINGLE.contains(&self.words[0].as_str());
            let single_verb = !single_ambiguous && self.is_creation_verb(0, lemmatizer);
            return (single_verb || single_ambiguous).then_some(CreationCues {
                help: single_ambiguous,
                imperative: single_verb,
                single_verb,
                single_ambiguous,
            });
        }

        let lead = self.lead_index();
        let opens_with_lookup = self
            .lemmas
            .get(lead)
            .is_some_and(|l| QUERY_VERBS.contains(&l.as_str()));
        if opens_with_lookup && !self.has_phrase("me how") {
            return None;
        }

        // a creation verb followed, somewhere later, by a contract term
        let verb_then_contract = (0..self.words.len()).any(|i| {
            self.is_creation_verb(i, lemmatizer)
                && self.words.get(i + 1).is_none_or(|next| next != "date")
                && self.lemmas[i + 1..]
                    .iter()
                    .any(|l| matches!(l.as_str(), "contract" | "agreement"))
        });
        // "need help understanding contract creation" names the act, not the verb
        let asks_help_creating = self.asks_for_help()
            && self.contract_term
            && (self.words.iter().any(|w| CREATION_NOUNS.contains(&w.as_str()))
                || self.lemmas.iter().any(|l| l == "create"));
        if !verb_then_contract && !asks_help_creating {
            return None;
        }

        let help = self
            .words
            .first()
            .is_some_and(|w| QUESTION_WORDS.contains(&w.as_str()))
            || HELP_PHRASES.iter().any(|p| self.has_phrase(p))
            || self.words.iter().any(|w| HELP_WORDS.contains(&w.as_str()));
        let imperative = (lead < self.words.len() && self.is_creation_verb(lead, lemmatizer))
            || self.words.iter().any(|w| URGENCY_WORDS.contains(&w.as_str()))
            || REQUEST_PHRASES.iter().any(|p| self.has_phrase(p));

        Some(CreationCues {
            help,
            imperative,
            single_verb: false,
            single_ambiguous: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contract_nlp_extract::extract_at;

    fn signals(text: &str) -> Signals {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        Signals::build(text, &extract_at(text, today), &Lemmatizer::new())
    }

    #[test]
    fn lemmas_align_with_words() {
        let s = signals("Show contracts created by vinod");
        assert_eq!(s.words, ["show", "contracts", "created", "by", "vinod"]);
        assert_eq!(s.lemmas, ["show", "contract", "created", "by", "vinod"]);
        assert!(s.created_by);
        assert!(!s.created_without_by);
        assert!(s.contract_term);
    }

    #[test]
    fn created_without_by() {
        let s = signals("contracts created in 2024");
        assert!(s.created_without_by);
        assert!(!s.is_creation());
    }

    #[test]
    fn question_about_creating_is_help() {
        let cues = signals("How do I create a contract?").creation.unwrap();
        assert!(cues.help);
        assert!(!cues.imperative);
    }

    #[test]
    fn command_to_create_is_imperative() {
        let cues = signals("please create a new contract").creation.unwrap();
        assert!(cues.imperative);
        assert!(!cues.help);
    }

    #[test]
    fn single_words() {
        let cues = signals("create").creation.unwrap();
        assert!(cues.single_verb);
        let cues = signals("help").creation.unwrap();
        assert!(cues.single_ambiguous);
        assert!(signals("contracts").creation.is_none());
    }

    #[test]
    fn bare_new_start_setup_are_ambiguous() {
        for word in ["new", "start", "setup"] {
            let cues = signals(word).creation.unwrap();
            assert!(cues.single_ambiguous, "{word}");
            assert!(!cues.single_verb, "{word}");
        }
    }

    #[test]
    fn help_phrasing_is_a_help_cue() {
        for text in [
            "I need help creating a contract",
            "please help me with a new contract",
            "need help understanding contract creation",
        ] {
            let cues = signals(text).creation.unwrap();
            assert!(cues.help, "{text}");
        }
        assert!(signals("need help with contract 123456").creation.is_none());
    }

    #[test]
    fn lookups_are_not_creation() {
        assert!(signals("show contracts created by vinod").creation.is_none());
        assert!(signals("list new contracts for customer 12345").creation.is_none());
        assert!(signals("contracts with start date in 2024").creation.is_none());
        assert!(signals("show me how to create a contract").creation.is_some());
    }

    #[test]
    fn failed_and_part_terms() {
        let s = signals("failed parts for 123456");
        assert!(s.failed_term);
        assert!(s.part_term);
        assert!(s.has_contract_number());
    }
}
