//! Comparison lenses for text.
//!
//! Both sides of an alignment are viewed through a [`ScriptLens`] before they
//! are compared: case folding, diacritic folding and Cyrillic/Latin
//! transliteration. Lenses are strictly char-for-char, and their output is
//! never written anywhere.

pub mod normalizer;
pub mod script;

pub use normalizer::{
    EquivalenceTable, LanguageHint, NormalizerConfig, ScriptLens, ScriptNormalizer, UnitLanguage,
};
pub use script::Script;
