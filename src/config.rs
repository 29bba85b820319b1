//! Configuration for document alignment.
//!
//! Every constant the aligner uses (window buffers, acceptance thresholds,
//! slop widths, the break threshold) lives here. [`CorpusProfile`] provides
//! presets for the corpora the aligner was tuned on; anything else starts
//! from [`AlignerConfig::default`] and adjusts with the `with_*` builders or
//! a JSON file.

use crate::error::{Error, Result};
use crate::structure::UnitKind;
use crate::text::{NormalizerConfig, Script};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Alignment level a unit is searched at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Sections (`div`)
    Section,
    /// Segments (`seg`)
    Segment,
    /// Sentences (`s`)
    Sentence,
    /// Words and punctuation (`w`, `pc`)
    Word,
}

impl Level {
    /// Level a unit of `kind` is searched at, given the kind of its parent
    /// (`None` at the top of the tree).
    ///
    /// Notes are searched at the level of the units they sit between.
    pub fn of(kind: UnitKind, parent: Option<UnitKind>) -> Level {
        match kind {
            UnitKind::Section => Level::Section,
            UnitKind::Segment => Level::Segment,
            UnitKind::Sentence => Level::Sentence,
            UnitKind::Word | UnitKind::Punctuation => Level::Word,
            UnitKind::Note => match parent {
                None | Some(UnitKind::Section) => Level::Segment,
                Some(UnitKind::Segment) => Level::Sentence,
                Some(_) => Level::Word,
            },
        }
    }
}

/// Search parameters of one level.
///
/// In configuration files a level is always given in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Search units of this level; when false their children are searched
    /// in the enclosing scope with the enclosing cursor
    pub searched: bool,
    /// Minimum similarity for a match to be accepted
    pub min_similarity: f64,
    /// Initial buffer is `len(target) / buffer_divisor` (0 = no length term)
    pub buffer_divisor: usize,
    /// Lower bound of the initial buffer
    pub buffer_min: usize,
    /// Upper bound of the initial buffer
    pub buffer_max: Option<usize>,
    /// Extra buffer for the first unit searched in a scope
    pub first_child_bonus: usize,
    /// Widen the matched range by `min(cap, len(target) / 2)` on both sides
    /// when the match is not exact
    pub exact_slop_cap: Option<usize>,
    /// Widen the matched range by the final window buffer plus this amount
    /// when it crosses a page boundary
    pub page_break_slop: Option<usize>,
    /// Strip unconfirmed insertion runs from the range before descending
    pub noise_filter: bool,
}

impl LevelConfig {
    /// Initial window buffer for a target.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_anchor::config::LevelConfig;
    ///
    /// let sentence = LevelConfig::sentence();
    /// assert_eq!(sentence.initial_buffer(30, false), 10);
    /// assert_eq!(sentence.initial_buffer(3, false), 2);
    /// assert_eq!(sentence.initial_buffer(300, true), 80);
    /// ```
    pub fn initial_buffer(&self, target_len: usize, first_in_scope: bool) -> usize {
        let scaled = if self.buffer_divisor == 0 {
            0
        } else {
            target_len / self.buffer_divisor
        };
        let mut buffer = scaled.max(self.buffer_min);
        if let Some(max) = self.buffer_max {
            buffer = buffer.min(max);
        }
        if first_in_scope {
            buffer += self.first_child_bonus;
        }
        buffer
    }

    /// Sections are structural only: their children share the parent scope.
    pub fn section() -> Self {
        Self {
            searched: false,
            ..Self::segment()
        }
    }

    /// Segment defaults: `max(len / 2, 40)` buffer, 0.7 acceptance, slop of
    /// up to 41 around inexact matches.
    pub fn segment() -> Self {
        Self {
            searched: true,
            min_similarity: 0.7,
            buffer_divisor: 2,
            buffer_min: 40,
            buffer_max: None,
            first_child_bonus: 0,
            exact_slop_cap: Some(41),
            page_break_slop: None,
            noise_filter: false,
        }
    }

    /// Sentence defaults: `min(max(len / 3, 2), 40)` buffer, 40 extra for the
    /// first sentence, 0.7 acceptance, widened and filtered across pages.
    pub fn sentence() -> Self {
        Self {
            searched: true,
            min_similarity: 0.7,
            buffer_divisor: 3,
            buffer_min: 2,
            buffer_max: Some(40),
            first_child_bonus: 40,
            exact_slop_cap: None,
            page_break_slop: Some(35),
            noise_filter: true,
        }
    }

    /// Word defaults: `max(len, 1)` buffer, 5 extra for the first word, 0.5
    /// acceptance.
    pub fn word() -> Self {
        Self {
            searched: true,
            min_similarity: 0.5,
            buffer_divisor: 1,
            buffer_min: 1,
            buffer_max: None,
            first_child_bonus: 5,
            exact_slop_cap: None,
            page_break_slop: None,
            noise_filter: false,
        }
    }

    /// Set the acceptance threshold.
    pub fn with_min_similarity(mut self, value: f64) -> Self {
        self.min_similarity = value;
        self
    }

    /// Set whether units of this level are searched.
    pub fn with_searched(mut self, searched: bool) -> Self {
        self.searched = searched;
        self
    }

    /// Use a fixed initial buffer.
    pub fn with_fixed_buffer(mut self, buffer: usize) -> Self {
        self.buffer_divisor = 0;
        self.buffer_min = buffer;
        self.buffer_max = None;
        self
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(Error::Config(format!(
                "{}.min_similarity must be within 0..=1, got {}",
                name, self.min_similarity
            )));
        }
        if let Some(max) = self.buffer_max {
            if max < self.buffer_min {
                return Err(Error::Config(format!(
                    "{}.buffer_max ({}) is below buffer_min ({})",
                    name, max, self.buffer_min
                )));
            }
        }
        Ok(())
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self::segment()
    }
}

/// Complete aligner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    /// Section level
    pub section: LevelConfig,
    /// Segment level
    pub segment: LevelConfig,
    /// Sentence level
    pub sentence: LevelConfig,
    /// Word and punctuation level
    pub word: LevelConfig,
    /// Similarity at or above which a container match counts as exact
    pub exact_threshold: f64,
    /// Vertical distance between glyph bottoms that marks a line break
    pub break_threshold: f32,
    /// Number of leading top-level units searched against the whole stream
    pub leading_resync: usize,
    /// Upper bound on the matches confirming an insertion run
    pub noise_tolerance_cap: usize,
    /// Characters whose glyphs are dropped before alignment
    pub noise_chars: Vec<char>,
    /// Characters whose immediate repeats collapse to one glyph
    pub collapse_chars: Vec<char>,
    /// Character pairs that compare as equal
    pub equivalences: Vec<(char, char)>,
    /// Comparison lens settings
    pub normalizer: NormalizerConfig,
    /// Note subtypes that are never searched (duplicate transcriptions)
    pub ignored_note_subtypes: Vec<String>,
    /// Crop the glyph stream to the session delimited by the first and last
    /// notes of the reference
    pub crop_to_session: bool,
    /// Margin kept above the session start marker
    pub session_top_margin: f32,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AlignerConfig {
    /// Create the generic configuration.
    pub fn new() -> Self {
        Self {
            section: LevelConfig::section(),
            segment: LevelConfig::segment(),
            sentence: LevelConfig::sentence(),
            word: LevelConfig::word(),
            exact_threshold: 0.99,
            break_threshold: crate::coordinates::DEFAULT_BREAK_THRESHOLD,
            leading_resync: 3,
            noise_tolerance_cap: crate::align::noise::DEFAULT_TOLERANCE_CAP,
            noise_chars: Vec::new(),
            collapse_chars: Vec::new(),
            equivalences: Vec::new(),
            normalizer: NormalizerConfig::default(),
            ignored_note_subtypes: Vec::new(),
            crop_to_session: false,
            session_top_margin: crate::glyph::preprocess::DEFAULT_SESSION_TOP_MARGIN,
        }
    }

    /// Load a configuration from a JSON file. Missing top-level fields take
    /// their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: AlignerConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        self.section.validate("section")?;
        self.segment.validate("segment")?;
        self.sentence.validate("sentence")?;
        self.word.validate("word")?;
        if !(0.0..=1.0).contains(&self.exact_threshold) {
            return Err(Error::Config(format!(
                "exact_threshold must be within 0..=1, got {}",
                self.exact_threshold
            )));
        }
        if self.break_threshold <= 0.0 {
            return Err(Error::Config(format!(
                "break_threshold must be positive, got {}",
                self.break_threshold
            )));
        }
        if self.noise_tolerance_cap == 0 {
            return Err(Error::Config("noise_tolerance_cap must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Parameters of a level.
    pub fn level(&self, level: Level) -> &LevelConfig {
        match level {
            Level::Section => &self.section,
            Level::Segment => &self.segment,
            Level::Sentence => &self.sentence,
            Level::Word => &self.word,
        }
    }

    /// Mutable parameters of a level.
    pub fn level_mut(&mut self, level: Level) -> &mut LevelConfig {
        match level {
            Level::Section => &mut self.section,
            Level::Segment => &mut self.segment,
            Level::Sentence => &mut self.sentence,
            Level::Word => &mut self.word,
        }
    }

    /// Replace the parameters of a level.
    pub fn with_level(mut self, level: Level, config: LevelConfig) -> Self {
        *self.level_mut(level) = config;
        self
    }

    /// Set the characters dropped before alignment.
    pub fn with_noise_chars<I: IntoIterator<Item = char>>(mut self, chars: I) -> Self {
        self.noise_chars = chars.into_iter().collect();
        self
    }

    /// Set the characters whose repeats collapse.
    pub fn with_collapse_chars<I: IntoIterator<Item = char>>(mut self, chars: I) -> Self {
        self.collapse_chars = chars.into_iter().collect();
        self
    }

    /// Set the character equivalences.
    pub fn with_equivalences(mut self, pairs: &[(char, char)]) -> Self {
        self.equivalences = pairs.to_vec();
        self
    }

    /// Enable or disable transliteration.
    pub fn with_transliteration(mut self, enable: bool) -> Self {
        self.normalizer.transliterate = enable;
        self
    }

    /// Enable or disable case folding.
    pub fn with_case_folding(mut self, enable: bool) -> Self {
        self.normalizer.case_fold = enable;
        self
    }

    /// Enable or disable diacritic folding.
    pub fn with_diacritic_folding(mut self, enable: bool) -> Self {
        self.normalizer.fold_diacritics = enable;
        self
    }

    /// Set the script used when language votes tie.
    pub fn with_fallback_script(mut self, script: Script) -> Self {
        self.normalizer.fallback_script = script;
        self
    }

    /// Set the number of leading units searched against the whole stream.
    pub fn with_leading_resync(mut self, count: usize) -> Self {
        self.leading_resync = count;
        self
    }

    /// Skip notes with this subtype.
    pub fn with_ignored_note_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.ignored_note_subtypes.push(subtype.into());
        self
    }

    /// Enable or disable session cropping.
    pub fn with_session_crop(mut self, enable: bool) -> Self {
        self.crop_to_session = enable;
        self
    }

    /// Set the break threshold.
    pub fn with_break_threshold(mut self, threshold: f32) -> Self {
        self.break_threshold = threshold;
        self
    }
}

/// Presets for known corpora.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusProfile {
    /// Balanced defaults, no corpus-specific cleanup
    Generic,

    /// Yugoslav parliamentary records
    /// Characteristics: mixed Cyrillic and Latin text, filler dot leaders,
    /// duplicate Latin transcriptions of Cyrillic notes
    /// Settings: transliteration with a Cyrillic fallback, noise and filler
    /// cleanup, `latin` notes skipped
    Yugoslav,

    /// Carniolan diet records
    /// Characteristics: Gothic-type OCR with systematic look-alike errors,
    /// front matter before the session
    /// Settings: look-alike equivalences, session cropping, flat sentence
    /// search
    Carniolan,
}

impl CorpusProfile {
    /// Create the configuration for this profile.
    pub fn create_config(&self) -> AlignerConfig {
        match self {
            Self::Generic => AlignerConfig::default(),
            Self::Yugoslav => Self::yugoslav_config(),
            Self::Carniolan => Self::carniolan_config(),
        }
    }

    /// Name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Yugoslav => "yugoslav",
            Self::Carniolan => "carniolan",
        }
    }

    fn yugoslav_config() -> AlignerConfig {
        AlignerConfig::new()
            .with_noise_chars(['@', '#', '$', '^', '&', '*', '<', '>', '\u{ad}'])
            .with_collapse_chars(['.', '-', '_'])
            .with_transliteration(true)
            .with_fallback_script(Script::Cyrillic)
            .with_ignored_note_subtype("latin")
    }

    fn carniolan_config() -> AlignerConfig {
        AlignerConfig::new()
            .with_noise_chars(['@', '#', '$', '^', '&', '*', '<', '>', '\u{ad}', '-'])
            .with_equivalences(&[
                ('m', 'n'),
                ('>', 'i'),
                ('U', 'a'),
                ('A', 'a'),
                ('—', '-'),
                ('\'', '’'),
                ('"', '“'),
            ])
            .with_session_crop(true)
            .with_leading_resync(0)
            .with_level(Level::Segment, LevelConfig::segment().with_searched(false))
            .with_level(
                Level::Sentence,
                LevelConfig {
                    min_similarity: 0.5,
                    first_child_bonus: 0,
                    page_break_slop: None,
                    noise_filter: false,
                    ..LevelConfig::sentence()
                }
                .with_fixed_buffer(1),
            )
            .with_level(
                Level::Word,
                LevelConfig {
                    first_child_bonus: 0,
                    ..LevelConfig::word()
                }
                .with_fixed_buffer(2),
            )
    }
}

impl FromStr for CorpusProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(Self::Generic),
            "yugoslav" | "yuparl" => Ok(Self::Yugoslav),
            "carniolan" | "dzk" => Ok(Self::Carniolan),
            other => Err(Error::Config(format!("unknown corpus profile '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_of_units() {
        assert_eq!(Level::of(UnitKind::Segment, None), Level::Segment);
        assert_eq!(Level::of(UnitKind::Punctuation, Some(UnitKind::Sentence)), Level::Word);
        assert_eq!(Level::of(UnitKind::Note, None), Level::Segment);
        assert_eq!(Level::of(UnitKind::Note, Some(UnitKind::Section)), Level::Segment);
        assert_eq!(Level::of(UnitKind::Note, Some(UnitKind::Segment)), Level::Sentence);
        assert_eq!(Level::of(UnitKind::Note, Some(UnitKind::Sentence)), Level::Word);
    }

    #[test]
    fn test_initial_buffers() {
        let segment = LevelConfig::segment();
        assert_eq!(segment.initial_buffer(10, false), 40);
        assert_eq!(segment.initial_buffer(200, false), 100);

        let word = LevelConfig::word();
        assert_eq!(word.initial_buffer(0, false), 1);
        assert_eq!(word.initial_buffer(4, true), 9);

        let fixed = LevelConfig::word().with_fixed_buffer(2);
        assert_eq!(fixed.initial_buffer(50, false), 2);
    }

    #[test]
    fn test_default_thresholds() {
        let config = AlignerConfig::default();
        assert_eq!(config.exact_threshold, 0.99);
        assert_eq!(config.break_threshold, 4.0);
        assert_eq!(config.segment.min_similarity, 0.7);
        assert_eq!(config.sentence.min_similarity, 0.7);
        assert_eq!(config.word.min_similarity, 0.5);
        assert!(!config.section.searched);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_profiles() {
        let yu = CorpusProfile::Yugoslav.create_config();
        assert!(yu.normalizer.transliterate);
        assert_eq!(yu.normalizer.fallback_script, Script::Cyrillic);
        assert_eq!(yu.ignored_note_subtypes, vec!["latin".to_string()]);
        assert!(yu.collapse_chars.contains(&'.'));

        let dzk = CorpusProfile::Carniolan.create_config();
        assert!(dzk.crop_to_session);
        assert!(!dzk.segment.searched);
        assert!(dzk.noise_chars.contains(&'-'));
        assert_eq!(dzk.word.initial_buffer(7, true), 2);
        assert!(dzk.validate().is_ok());

        assert_eq!(CorpusProfile::Generic.create_config(), AlignerConfig::default());
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("Yugoslav".parse::<CorpusProfile>().unwrap(), CorpusProfile::Yugoslav);
        assert_eq!("dzk".parse::<CorpusProfile>().unwrap(), CorpusProfile::Carniolan);
        assert!("klingon".parse::<CorpusProfile>().is_err());
        assert_eq!(CorpusProfile::Carniolan.name(), "carniolan");
    }

    #[test]
    fn test_json_partial_config() {
        let config = AlignerConfig::from_json(
            r#"{"leading_resync": 0, "noise_chars": ["*"], "equivalences": [["m", "n"]]}"#,
        )
        .unwrap();
        assert_eq!(config.leading_resync, 0);
        assert_eq!(config.equivalences, vec![('m', 'n')]);
        assert_eq!(config.noise_chars, vec!['*']);
        assert_eq!(config.sentence, LevelConfig::sentence());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = AlignerConfig::from_json(r#"{"exact_threshold": 1.5}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let mut sentence = serde_json::to_value(LevelConfig::sentence()).unwrap();
        sentence["buffer_min"] = serde_json::json!(50);
        let json = serde_json::json!({ "sentence": sentence }).to_string();
        let err = AlignerConfig::from_json(&json).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        assert!(matches!(
            AlignerConfig::from_json(r#"{"word": {"min_similarity": 0.6}}"#),
            Err(Error::Json(_))
        ));
    }
}
