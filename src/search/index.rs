//! Search Index
//!
//! Per-card projection over five fields, scored with [`fuzzy::score`]. Built once
//! per card set and thrown away when the selected space or snapshot changes.

use std::collections::HashMap;

use super::fuzzy;
use super::transliterate::{PhoneticProjection, Transliterator};
use crate::domain::{Card, CollectionWithCards, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Description,
    Url,
    TitlePhonetic,
    DescriptionPhonetic,
}

/// One indexed field; phonetic fields carry both the full spelling and the initials
struct FieldText {
    field: SearchField,
    variants: Vec<Vec<char>>,
}

impl FieldText {
    fn plain(field: SearchField, text: &str) -> Self {
        Self {
            field,
            variants: vec![fuzzy::prepare(text)],
        }
    }

    fn phonetic(field: SearchField, projection: PhoneticProjection) -> Self {
        let variants = [projection.full, projection.initials]
            .iter()
            .filter(|v| !v.is_empty())
            .map(|v| fuzzy::prepare(v))
            .collect();
        Self { field, variants }
    }

    fn score(&self, pattern: &[char]) -> f64 {
        self.variants
            .iter()
            .map(|v| fuzzy::score(pattern, v))
            .fold(f64::INFINITY, f64::min)
    }
}

struct Entry {
    card: Card,
    fields: [FieldText; 5],
}

impl Entry {
    fn best(&self, pattern: &[char]) -> (f64, SearchField) {
        let mut best = (f64::INFINITY, SearchField::Title);
        for field in &self.fields {
            let s = field.score(pattern);
            if s < best.0 {
                best = (s, field.field);
            }
        }
        best
    }
}

/// A ranked hit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub card: Card,
    pub score: f64,
    pub field: SearchField,
}

pub struct SearchIndex {
    entries: Vec<Entry>,
    threshold: f64,
}

impl SearchIndex {
    /// Index every card of `collections` in tree order
    pub fn build(
        collections: &[CollectionWithCards],
        transliterator: &dyn Transliterator,
        threshold: f64,
    ) -> Self {
        let entries: Vec<Entry> = collections
            .iter()
            .flat_map(|c| c.cards.iter())
            .map(|card| {
                let title = card.effective_title();
                let description = card.effective_description();
                Entry {
                    fields: [
                        FieldText::plain(SearchField::Title, title),
                        FieldText::plain(SearchField::Description, description),
                        FieldText::plain(SearchField::Url, &card.url),
                        FieldText::phonetic(
                            SearchField::TitlePhonetic,
                            PhoneticProjection::of(transliterator, title),
                        ),
                        FieldText::phonetic(
                            SearchField::DescriptionPhonetic,
                            PhoneticProjection::of(transliterator, description),
                        ),
                    ],
                    card: card.clone(),
                }
            })
            .collect();

        log::debug!("search index built over {} cards", entries.len());
        Self {
            entries,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Whole query against its best field, or every word against its own best
    /// field (averaged), whichever scores lower. `None` when neither passes.
    fn score_entry(
        &self,
        entry: &Entry,
        whole: &[char],
        words: &[Vec<char>],
    ) -> Option<(f64, SearchField)> {
        let mut best = Some(entry.best(whole)).filter(|(s, _)| *s <= self.threshold);

        if words.len() > 1 {
            let per_word: Vec<_> = words.iter().map(|w| entry.best(w)).collect();
            if per_word.iter().all(|(s, _)| *s <= self.threshold) {
                let mean = per_word.iter().map(|(s, _)| s).sum::<f64>() / per_word.len() as f64;
                if best.map_or(true, |(s, _)| mean < s) {
                    best = Some((mean, per_word[0].1));
                }
            }
        }
        best
    }

    /// Ranked hits for a non-blank query; ties keep tree order
    pub fn hits(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let whole = fuzzy::prepare(query);
        let words: Vec<Vec<char>> = query.split_whitespace().map(fuzzy::prepare).collect();

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .filter_map(|entry| {
                self.score_entry(entry, &whole, &words)
                    .map(|(score, field)| SearchHit {
                        card: entry.card.clone(),
                        score,
                        field,
                    })
            })
            .collect();
        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits
    }

    /// Blank query: every card in tree order. Otherwise ranked matches.
    pub fn search(&self, query: &str) -> Vec<Card> {
        if query.trim().is_empty() {
            return self.entries.iter().map(|e| e.card.clone()).collect();
        }
        let hits = self.hits(query);
        log::debug!("search '{}': {} hits", query, hits.len());
        hits.into_iter().map(|h| h.card).collect()
    }

    /// [`search`](Self::search) regrouped for display. A blank query returns
    /// `collections` untouched, empty collections included.
    pub fn search_grouped(
        &self,
        query: &str,
        collections: &[CollectionWithCards],
    ) -> Vec<CollectionWithCards> {
        if query.trim().is_empty() {
            return collections.to_vec();
        }
        group_by_collection(&self.search(query), collections)
    }
}

/// Regroup matched cards under their collections.
///
/// Collections keep tree order and empty ones are omitted; cards keep the order
/// they were matched in.
pub fn group_by_collection(
    cards: &[Card],
    collections: &[CollectionWithCards],
) -> Vec<CollectionWithCards> {
    let mut by_collection: HashMap<RecordId, Vec<Card>> = HashMap::new();
    for card in cards {
        if let Some(collection_id) = card.collection_id {
            by_collection.entry(collection_id).or_default().push(card.clone());
        }
    }

    collections
        .iter()
        .filter_map(|c| {
            by_collection
                .remove(&c.collection.id)
                .map(|cards| CollectionWithCards {
                    collection: c.collection.clone(),
                    cards,
                    labels: c.labels.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Collection, Label};
    use crate::search::{NoopTransliterator, PinyinTransliterator};

    fn collection(id: RecordId, cards: Vec<Card>) -> CollectionWithCards {
        CollectionWithCards {
            collection: Collection::new(id, &format!("C{}", id), 1, 0.0),
            cards,
            labels: vec![Label::new(1, "l", "#fff")],
        }
    }

    fn sample() -> Vec<CollectionWithCards> {
        let mut docs = Card::new(3, 20, "Docs", "https://docs.rs");
        docs.custom_title = Some("Rust crate docs".to_string());
        let mut news = Card::new(4, 20, "Hacker News", "https://news.ycombinator.com");
        news.description = "Tech news".to_string();

        vec![
            collection(
                10,
                vec![
                    Card::new(1, 10, "百度一下", "https://www.baidu.com"),
                    Card::new(2, 10, "The Rust Programming Language", "https://doc.rust-lang.org/book"),
                ],
            ),
            collection(20, vec![docs, news]),
        ]
    }

    fn index() -> SearchIndex {
        SearchIndex::build(&sample(), &PinyinTransliterator, 0.4)
    }

    fn ids(cards: &[Card]) -> Vec<RecordId> {
        cards.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_blank_query_returns_all_in_tree_order() {
        let index = index();
        assert_eq!(ids(&index.search("")), vec![1, 2, 3, 4]);
        assert_eq!(ids(&index.search("   ")), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_initials_match_han_title() {
        let index = index();
        let hits = index.hits("bd");
        assert_eq!(hits[0].card.id, 1);
        assert_eq!(hits[0].score, 0.0);
        assert_eq!(hits[0].field, SearchField::TitlePhonetic);
    }

    #[test]
    fn test_full_pinyin_and_original_script() {
        let index = index();
        assert_eq!(ids(&index.search("baidu")), vec![1]);
        assert_eq!(ids(&index.search("百度")), vec![1]);
    }

    #[test]
    fn test_misspelling_tolerated() {
        let index = index();
        assert!(ids(&index.search("programing")).contains(&2));
        assert!(ids(&index.search("hacker nwes")).contains(&4));
    }

    #[test]
    fn test_out_of_order_words() {
        let index = index();
        let found = ids(&index.search("language rust"));
        assert_eq!(found[0], 2);
    }

    #[test]
    fn test_custom_title_and_description_are_indexed() {
        let index = index();
        assert_eq!(index.search("crate")[0].id, 3);
        assert_eq!(index.search("tech news")[0].id, 4);
    }

    #[test]
    fn test_ranked_best_first() {
        let index = index();
        let hits = index.hits("rust");
        assert!(hits.windows(2).all(|w| w[0].score <= w[1].score));
        // Both match exactly; tree order breaks the tie
        assert_eq!(hits[0].card.id, 2);
        assert_eq!(hits[1].card.id, 3);
    }

    #[test]
    fn test_results_carry_no_phonetic_fields() {
        let index = index();
        let card = &index.search("bd")[0];
        assert_eq!(card, &sample()[0].cards[0]);
    }

    #[test]
    fn test_nonsense_matches_nothing() {
        assert!(index().search("qqqqzzzz").is_empty());
    }

    #[test]
    fn test_noop_transliterator_disables_phonetics() {
        let index = SearchIndex::build(&sample(), &NoopTransliterator, 0.4);
        assert!(index.search("bd").is_empty());
        assert_eq!(ids(&index.search("百度")), vec![1]);
    }

    #[test]
    fn test_grouping_keeps_collection_order_and_drops_empty() {
        let collections = sample();
        let index = SearchIndex::build(&collections, &PinyinTransliterator, 0.4);

        let grouped = index.search_grouped("news", &collections);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].collection.id, 20);
        assert_eq!(ids(&grouped[0].cards), vec![4]);
        assert_eq!(grouped[0].labels, collections[1].labels);

        let all = index.search_grouped("", &collections);
        assert_eq!(all, collections);
    }

    #[test]
    fn test_blank_query_keeps_empty_collections() {
        let collections = vec![collection(30, vec![]), sample().remove(0)];
        let index = SearchIndex::build(&collections, &PinyinTransliterator, 0.4);

        let grouped = index.search_grouped(" ", &collections);
        let order: Vec<_> = grouped.iter().map(|c| c.collection.id).collect();
        assert_eq!(order, vec![30, 10]);

        let grouped = index.search_grouped("baidu", &collections);
        let order: Vec<_> = grouped.iter().map(|c| c.collection.id).collect();
        assert_eq!(order, vec![10]);
    }
}
