//! Phonetic transliteration for logographic titles
//!
//! Chinese characters are spelled in pinyin so that "百度" can be found with
//! "baidu" or just "bd". Other scripts pass through untouched and contribute
//! nothing to the projection.

use pinyin::ToPinyin;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Transliteration failed: {0}")]
pub struct TransliterationError(pub String);

/// Replaceable text -> phonetic text engine
pub trait Transliterator: Send + Sync {
    /// Full spelling of every transliterable character
    fn full(&self, text: &str) -> Result<String, TransliterationError>;

    /// First letter of every transliterable character
    fn initials(&self, text: &str) -> Result<String, TransliterationError>;
}

/// Mandarin pinyin via the `pinyin` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct PinyinTransliterator;

impl Transliterator for PinyinTransliterator {
    fn full(&self, text: &str) -> Result<String, TransliterationError> {
        Ok(text
            .to_pinyin()
            .flatten()
            .map(|p| p.plain())
            .collect::<Vec<_>>()
            .join(""))
    }

    fn initials(&self, text: &str) -> Result<String, TransliterationError> {
        Ok(text
            .to_pinyin()
            .flatten()
            .map(|p| p.first_letter())
            .collect::<Vec<_>>()
            .join(""))
    }
}

/// For deployments without logographic content
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransliterator;

impl Transliterator for NoopTransliterator {
    fn full(&self, _text: &str) -> Result<String, TransliterationError> {
        Ok(String::new())
    }

    fn initials(&self, _text: &str) -> Result<String, TransliterationError> {
        Ok(String::new())
    }
}

fn fold_diacritic(c: char) -> char {
    match c {
        'ā' | 'á' | 'ǎ' | 'à' | 'â' | 'ä' => 'a',
        'ē' | 'é' | 'ě' | 'è' | 'ê' | 'ë' => 'e',
        'ī' | 'í' | 'ǐ' | 'ì' | 'î' | 'ï' => 'i',
        'ō' | 'ó' | 'ǒ' | 'ò' | 'ô' | 'ö' => 'o',
        'ū' | 'ú' | 'ǔ' | 'ù' | 'û' | 'ü' | 'ǖ' | 'ǘ' | 'ǚ' | 'ǜ' => 'u',
        'ń' | 'ň' | 'ǹ' => 'n',
        'ḿ' => 'm',
        _ => c,
    }
}

/// Lowercase, strip diacritics and drop all whitespace
pub fn normalize_phonetic(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .collect()
}

/// Full and initials-only spelling of one text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhoneticProjection {
    pub full: String,
    pub initials: String,
}

impl PhoneticProjection {
    /// A failing engine yields `text` itself, unmodified
    pub fn of(engine: &dyn Transliterator, text: &str) -> Self {
        Self {
            full: run(engine.full(text), text),
            initials: run(engine.initials(text), text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty() && self.initials.is_empty()
    }
}

fn run(result: Result<String, TransliterationError>, original: &str) -> String {
    match result {
        Ok(phonetic) => normalize_phonetic(&phonetic),
        Err(e) => {
            log::warn!("{}, indexing original text", e);
            original.to_string()
        }
    }
}
