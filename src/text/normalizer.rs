//! Comparison lenses over text.
//!
//! A [`ScriptLens`] maps every character to exactly one character, so an
//! offset into normalized text is also an offset into the original text.
//! Normalized text is only ever compared, never written back.

use super::script::{fold_diacritic, Script};
use crate::structure::{NodeId, TextTree, TextUnit, UnitKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Character pairs that compare as equal during alignment.
///
/// The relation is symmetric: adding `(a, b)` also makes `b` equal to `a`.
/// Lookups happen after normalization, so pairs must be stated in the form
/// the lens produces (e.g. lowercase when case folding is on).
#[derive(Debug, Clone, Default)]
pub struct EquivalenceTable {
    pairs: HashSet<(char, char)>,
}

impl EquivalenceTable {
    /// Create an empty table (plain Levenshtein).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a list of pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_anchor::text::EquivalenceTable;
    ///
    /// let table = EquivalenceTable::from_pairs(&[('m', 'n'), ('—', '-')]);
    /// assert!(table.equivalent('n', 'm'));
    /// assert!(table.equivalent('-', '—'));
    /// assert!(!table.equivalent('m', 'x'));
    /// ```
    pub fn from_pairs(pairs: &[(char, char)]) -> Self {
        let mut table = Self::new();
        for &(a, b) in pairs {
            table.insert(a, b);
        }
        table
    }

    /// Declare two characters equivalent.
    pub fn insert(&mut self, a: char, b: char) {
        self.pairs.insert((a, b));
        self.pairs.insert((b, a));
    }

    /// Whether two characters match, either literally or through the table.
    #[inline]
    pub fn equivalent(&self, a: char, b: char) -> bool {
        a == b || (!self.pairs.is_empty() && self.pairs.contains(&(a, b)))
    }

    /// Number of distinct unordered pairs.
    pub fn len(&self) -> usize {
        let reflexive = self.pairs.iter().filter(|(a, b)| a == b).count();
        (self.pairs.len() + reflexive) / 2
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A char-for-char transform applied to both sides before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScriptLens {
    /// Script to transliterate into (None = keep the original script)
    pub script: Option<Script>,
    /// Lowercase before comparing
    pub case_fold: bool,
    /// Strip diacritics from Latin letters
    pub fold_diacritics: bool,
}

impl ScriptLens {
    /// The identity lens.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Apply the lens to a single character.
    #[inline]
    pub fn apply(&self, c: char) -> char {
        let mut c = c;
        if self.case_fold {
            // Keep the mapping 1:1; multi-char lowercase forms keep their head.
            c = c.to_lowercase().next().unwrap_or(c);
        }
        if let Some(script) = self.script {
            c = script.transliterate(c);
        }
        if self.fold_diacritics {
            c = fold_diacritic(c);
        }
        c
    }

    /// Apply the lens to a run of characters.
    pub fn apply_all<I: IntoIterator<Item = char>>(&self, chars: I) -> Vec<char> {
        chars.into_iter().map(|c| self.apply(c)).collect()
    }

    /// Apply the lens to a string.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_anchor::text::{Script, ScriptLens};
    ///
    /// let lens = ScriptLens { script: Some(Script::Latin), case_fold: true, fold_diacritics: false };
    /// assert_eq!(lens.normalize("Раде"), "rade");
    /// ```
    pub fn normalize(&self, text: &str) -> String {
        text.chars().map(|c| self.apply(c)).collect()
    }
}

/// Reports the language tag of a unit.
///
/// `None` means "unknown"; the normalizer then falls back to voting or
/// inheritance.
pub trait LanguageHint: Send + Sync {
    /// Language tag of `unit`, if known.
    fn language_of<'a>(&self, unit: &'a TextUnit) -> Option<&'a str>;
}

/// Reads the `xml:lang` tag recorded on the unit itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitLanguage;

impl LanguageHint for UnitLanguage {
    fn language_of<'a>(&self, unit: &'a TextUnit) -> Option<&'a str> {
        unit.lang.as_deref().filter(|tag| !tag.is_empty())
    }
}

/// Settings the normalizer is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Transliterate between scripts before comparing
    pub transliterate: bool,
    /// Lowercase before comparing
    pub case_fold: bool,
    /// Strip diacritics before comparing
    pub fold_diacritics: bool,
    /// Primary language subtags written in Cyrillic; everything else is Latin
    pub cyrillic_languages: Vec<String>,
    /// Script used when a vote is tied or no tags are present
    pub fallback_script: Script,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            transliterate: false,
            case_fold: false,
            fold_diacritics: false,
            cyrillic_languages: vec![
                "sr".to_string(),
                "mk".to_string(),
                "ru".to_string(),
                "bg".to_string(),
                "uk".to_string(),
            ],
            fallback_script: Script::Latin,
        }
    }
}

/// Chooses and applies comparison lenses for units of a reference tree.
#[derive(Debug, Clone)]
pub struct ScriptNormalizer {
    config: NormalizerConfig,
}

impl ScriptNormalizer {
    /// Create a normalizer.
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// The settings this normalizer was built from.
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize text for comparison under a locale hint.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_anchor::text::{NormalizerConfig, ScriptNormalizer};
    ///
    /// let normalizer = ScriptNormalizer::new(NormalizerConfig {
    ///     transliterate: true,
    ///     ..Default::default()
    /// });
    /// assert_eq!(normalizer.normalize("Rade", Some("sr")), "Раде");
    /// assert_eq!(normalizer.normalize("Раде", Some("hr")), "Rade");
    /// ```
    pub fn normalize(&self, text: &str, locale_hint: Option<&str>) -> String {
        self.lens_for_language(locale_hint).normalize(text)
    }

    /// Lens used when nothing is known about a unit's language.
    pub fn fallback_lens(&self) -> ScriptLens {
        self.lens_with_script(Some(self.config.fallback_script))
    }

    /// Lens for an explicit language tag (None = fallback script).
    pub fn lens_for_language(&self, tag: Option<&str>) -> ScriptLens {
        match tag {
            Some(tag) => self.lens_with_script(Some(self.script_of_tag(tag))),
            None => self.fallback_lens(),
        }
    }

    /// Script a language tag is written in.
    pub fn script_of_tag(&self, tag: &str) -> Script {
        if let Some(script) = Script::from_subtag(tag) {
            return script;
        }
        let primary = tag.split(['-', '_']).next().unwrap_or(tag);
        if self
            .config
            .cyrillic_languages
            .iter()
            .any(|lang| lang.eq_ignore_ascii_case(primary))
        {
            Script::Cyrillic
        } else {
            Script::Latin
        }
    }

    /// Lens chosen by majority vote over a set of language tags.
    ///
    /// Ties (including an empty vote) resolve to the fallback script.
    pub fn lens_by_vote<'a, I>(&self, tags: I) -> ScriptLens
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (mut latin, mut cyrillic) = (0usize, 0usize);
        for tag in tags {
            match self.script_of_tag(tag) {
                Script::Latin => latin += 1,
                Script::Cyrillic => cyrillic += 1,
            }
        }
        let script = if latin > cyrillic {
            Script::Latin
        } else if cyrillic > latin {
            Script::Cyrillic
        } else {
            self.config.fallback_script
        };
        self.lens_with_script(Some(script))
    }

    /// Lens for a unit of a reference tree.
    ///
    /// An explicit language tag wins. Containers without one take the
    /// majority script of their descendant sentences; leaves and notes
    /// without one inherit `inherited`.
    pub fn lens_for_unit(
        &self,
        tree: &TextTree,
        id: NodeId,
        hint: &dyn LanguageHint,
        inherited: ScriptLens,
    ) -> ScriptLens {
        let unit = tree.unit(id);
        if let Some(tag) = hint.language_of(unit) {
            return self.lens_for_language(Some(tag));
        }
        if !unit.kind.is_container() {
            return inherited;
        }

        let tags: Vec<&str> = tree
            .descendants(id)
            .map(|d| tree.unit(d))
            .filter(|u| u.kind == UnitKind::Sentence)
            .filter_map(|u| hint.language_of(u))
            .collect();
        self.lens_by_vote(tags)
    }

    fn lens_with_script(&self, script: Option<Script>) -> ScriptLens {
        ScriptLens {
            script: if self.config.transliterate { script } else { None },
            case_fold: self.config.case_fold,
            fold_diacritics: self.config.fold_diacritics,
        }
    }
}

impl Default for ScriptNormalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transliterating() -> ScriptNormalizer {
        ScriptNormalizer::new(NormalizerConfig {
            transliterate: true,
            fallback_script: Script::Cyrillic,
            ..Default::default()
        })
    }

    #[test]
    fn test_lens_is_char_for_char() {
        let lens = ScriptLens {
            script: Some(Script::Latin),
            case_fold: true,
            fold_diacritics: true,
        };
        let input = "Љубав İstanbul ČAŠA";
        let out = lens.apply_all(input.chars());
        assert_eq!(out.len(), input.chars().count());
        assert_eq!(out.iter().collect::<String>(), "lubav istanbul casa");
    }

    #[test]
    fn test_identity_lens() {
        assert_eq!(ScriptLens::identity().normalize("Ab—c"), "Ab—c");
    }

    #[test]
    fn test_equivalence_table_symmetry() {
        let mut table = EquivalenceTable::new();
        assert!(table.is_empty());
        table.insert('\'', '’');
        assert!(table.equivalent('’', '\''));
        assert!(table.equivalent('x', 'x'));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_vote_majority_and_ties() {
        let n = transliterating();
        assert_eq!(n.lens_by_vote(["sr", "sr", "de"]).script, Some(Script::Cyrillic));
        assert_eq!(n.lens_by_vote(["hr", "de", "sr"]).script, Some(Script::Latin));
        assert_eq!(n.lens_by_vote(["hr", "sr"]).script, Some(Script::Cyrillic));
        assert_eq!(n.lens_by_vote(Vec::<&str>::new()).script, Some(Script::Cyrillic));
    }

    #[test]
    fn test_transliteration_disabled_keeps_script() {
        let n = ScriptNormalizer::default();
        assert_eq!(n.lens_for_language(Some("sr")).script, None);
        assert_eq!(n.normalize("Раде", Some("sr")), "Раде");
    }

    #[test]
    fn test_script_of_tag() {
        let n = transliterating();
        assert_eq!(n.script_of_tag("sr"), Script::Cyrillic);
        assert_eq!(n.script_of_tag("SR"), Script::Cyrillic);
        assert_eq!(n.script_of_tag("sr-Latn"), Script::Latin);
        assert_eq!(n.script_of_tag("sl"), Script::Latin);
    }
}
