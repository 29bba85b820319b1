//! Writing systems and the static character tables between them.
//!
//! Transliteration here is a comparison lens, so every table maps exactly one
//! character to exactly one character. Serbian digraph letters (љ, њ, џ) have
//! no single-letter Latin counterpart and map to their first component.

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// A writing system text can be transliterated into before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    /// Latin alphabet (Serbian Gaj's Latin for transliteration purposes)
    Latin,
    /// Cyrillic alphabet (Serbian Cyrillic for transliteration purposes)
    Cyrillic,
}

impl Script {
    /// Map a character into this script, leaving it unchanged when the
    /// table has no entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_anchor::text::Script;
    ///
    /// assert_eq!(Script::Latin.transliterate('Р'), 'R');
    /// assert_eq!(Script::Cyrillic.transliterate('ž'), 'ж');
    /// assert_eq!(Script::Latin.transliterate('7'), '7');
    /// ```
    pub fn transliterate(self, c: char) -> char {
        let table = match self {
            Script::Latin => &CYRILLIC_TO_LATIN,
            Script::Cyrillic => &LATIN_TO_CYRILLIC,
        };
        table.get(&c).copied().unwrap_or(c)
    }

    /// Detect the script requested by a language tag's script subtag
    /// (`sr-Latn`, `sr-Cyrl`), if any.
    pub fn from_subtag(tag: &str) -> Option<Script> {
        tag.split(['-', '_']).skip(1).find_map(|sub| {
            if sub.eq_ignore_ascii_case("latn") {
                Some(Script::Latin)
            } else if sub.eq_ignore_ascii_case("cyrl") {
                Some(Script::Cyrillic)
            } else {
                None
            }
        })
    }
}

/// Fold a Latin letter with a diacritic to its base letter.
pub fn fold_diacritic(c: char) -> char {
    DIACRITIC_FOLDS.get(&c).copied().unwrap_or(c)
}

static CYRILLIC_TO_LATIN: phf::Map<char, char> = phf_map! {
    'а' => 'a', 'б' => 'b', 'в' => 'v', 'г' => 'g', 'д' => 'd',
    'ђ' => 'đ', 'е' => 'e', 'ж' => 'ž', 'з' => 'z', 'и' => 'i',
    'ј' => 'j', 'к' => 'k', 'л' => 'l', 'љ' => 'l', 'м' => 'm',
    'н' => 'n', 'њ' => 'n', 'о' => 'o', 'п' => 'p', 'р' => 'r',
    'с' => 's', 'т' => 't', 'ћ' => 'ć', 'у' => 'u', 'ф' => 'f',
    'х' => 'h', 'ц' => 'c', 'ч' => 'č', 'џ' => 'd', 'ш' => 'š',
    'А' => 'A', 'Б' => 'B', 'В' => 'V', 'Г' => 'G', 'Д' => 'D',
    'Ђ' => 'Đ', 'Е' => 'E', 'Ж' => 'Ž', 'З' => 'Z', 'И' => 'I',
    'Ј' => 'J', 'К' => 'K', 'Л' => 'L', 'Љ' => 'L', 'М' => 'M',
    'Н' => 'N', 'Њ' => 'N', 'О' => 'O', 'П' => 'P', 'Р' => 'R',
    'С' => 'S', 'Т' => 'T', 'Ћ' => 'Ć', 'У' => 'U', 'Ф' => 'F',
    'Х' => 'H', 'Ц' => 'C', 'Ч' => 'Č', 'Џ' => 'D', 'Ш' => 'Š',
};

static LATIN_TO_CYRILLIC: phf::Map<char, char> = phf_map! {
    'a' => 'а', 'b' => 'б', 'c' => 'ц', 'č' => 'ч', 'ć' => 'ћ',
    'd' => 'д', 'đ' => 'ђ', 'e' => 'е', 'f' => 'ф', 'g' => 'г',
    'h' => 'х', 'i' => 'и', 'j' => 'ј', 'k' => 'к', 'l' => 'л',
    'm' => 'м', 'n' => 'н', 'o' => 'о', 'p' => 'п', 'r' => 'р',
    's' => 'с', 'š' => 'ш', 't' => 'т', 'u' => 'у', 'v' => 'в',
    'z' => 'з', 'ž' => 'ж',
    'A' => 'А', 'B' => 'Б', 'C' => 'Ц', 'Č' => 'Ч', 'Ć' => 'Ћ',
    'D' => 'Д', 'Đ' => 'Ђ', 'E' => 'Е', 'F' => 'Ф', 'G' => 'Г',
    'H' => 'Х', 'I' => 'И', 'J' => 'Ј', 'K' => 'К', 'L' => 'Л',
    'M' => 'М', 'N' => 'Н', 'O' => 'О', 'P' => 'П', 'R' => 'Р',
    'S' => 'С', 'Š' => 'Ш', 'T' => 'Т', 'U' => 'У', 'V' => 'В',
    'Z' => 'З', 'Ž' => 'Ж',
};

static DIACRITIC_FOLDS: phf::Map<char, char> = phf_map! {
    'á' => 'a', 'à' => 'a', 'â' => 'a', 'ä' => 'a', 'ã' => 'a', 'å' => 'a',
    'ç' => 'c', 'č' => 'c', 'ć' => 'c',
    'ď' => 'd', 'đ' => 'd',
    'é' => 'e', 'è' => 'e', 'ê' => 'e', 'ë' => 'e', 'ě' => 'e',
    'í' => 'i', 'ì' => 'i', 'î' => 'i', 'ï' => 'i',
    'ľ' => 'l', 'ĺ' => 'l', 'ł' => 'l',
    'ñ' => 'n', 'ň' => 'n',
    'ó' => 'o', 'ò' => 'o', 'ô' => 'o', 'ö' => 'o', 'õ' => 'o',
    'ř' => 'r', 'ŕ' => 'r',
    'š' => 's', 'ś' => 's',
    'ť' => 't',
    'ú' => 'u', 'ù' => 'u', 'û' => 'u', 'ü' => 'u', 'ů' => 'u',
    'ý' => 'y', 'ÿ' => 'y',
    'ž' => 'z', 'ź' => 'z', 'ż' => 'z',
    'Á' => 'A', 'À' => 'A', 'Â' => 'A', 'Ä' => 'A', 'Ã' => 'A', 'Å' => 'A',
    'Ç' => 'C', 'Č' => 'C', 'Ć' => 'C',
    'Ď' => 'D', 'Đ' => 'D',
    'É' => 'E', 'È' => 'E', 'Ê' => 'E', 'Ë' => 'E', 'Ě' => 'E',
    'Í' => 'I', 'Ì' => 'I', 'Î' => 'I', 'Ï' => 'I',
    'Ľ' => 'L', 'Ĺ' => 'L', 'Ł' => 'L',
    'Ñ' => 'N', 'Ň' => 'N',
    'Ó' => 'O', 'Ò' => 'O', 'Ô' => 'O', 'Ö' => 'O', 'Õ' => 'O',
    'Ř' => 'R', 'Ŕ' => 'R',
    'Š' => 'S', 'Ś' => 'S',
    'Ť' => 'T',
    'Ú' => 'U', 'Ù' => 'U', 'Û' => 'U', 'Ü' => 'U', 'Ů' => 'U',
    'Ý' => 'Y',
    'Ž' => 'Z', 'Ź' => 'Z', 'Ż' => 'Z',
};
