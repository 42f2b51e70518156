//! Fuzzy card search with pinyin support

pub mod fuzzy;
mod index;
mod transliterate;

pub use index::{group_by_collection, SearchField, SearchHit, SearchIndex};
pub use transliterate::{
    normalize_phonetic, NoopTransliterator, PhoneticProjection, PinyinTransliterator,
    TransliterationError, Transliterator,
};
