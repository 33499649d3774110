//! Text normalisation: spelling correction followed by lemmatization.

pub mod lemma;
pub mod spell;

use serde::Serialize;

pub use lemma::{LemmaStats, Lemmatizer};
pub use spell::{Correction, SpellCorrector, correction_confidence};

/// Output of [`TextNormalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedText {
    pub original: String,
    /// Spell-corrected, case preserved.
    pub corrected: String,
    /// Lowercased lemmas of `corrected`; "created" kept as-is.
    pub lemmatized: String,
    pub corrections: Vec<Correction>,
}

impl NormalizedText {
    pub fn was_corrected(&self) -> bool {
        !self.corrections.is_empty()
    }
}

/// Stateless after construction; share it freely across threads.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    spell: SpellCorrector,
    lemmatizer: Lemmatizer,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parts(spell: SpellCorrector, lemmatizer: Lemmatizer) -> Self {
        Self { spell, lemmatizer }
    }

    pub fn spell(&self) -> &SpellCorrector {
        &self.spell
    }

    pub fn lemmatizer(&self) -> &Lemmatizer {
        &self.lemmatizer
    }

    pub fn normalize(&self, text: &str) -> NormalizedText {
        let (corrected, corrections) = self.spell.correct_with_report(text);
        let lemmatized = self.lemmatizer.lemmatize_text_preserve_tense(&corrected);
        NormalizedText {
            original: text.to_string(),
            corrected,
            lemmatized,
            corrections,
        }
    }
}
