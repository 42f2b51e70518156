//! Domain Layer - Core Entity Trait
//!
//! Every snapshot record carries an integer id that is unique within one snapshot.

use std::collections::HashMap;

/// Identifier type shared by all snapshot records
pub type RecordId = i64;

/// Core trait for all snapshot records
pub trait Entity: Sized + Send + Sync + Clone {
    /// Returns the record's identifier
    fn id(&self) -> RecordId;
}

/// Index records by id. On duplicate ids the later record wins.
pub fn index_by_id<T: Entity>(records: &[T]) -> HashMap<RecordId, &T> {
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        index.insert(record.id(), record);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Label;

    #[test]
    fn test_index_last_write_wins() {
        let labels = vec![
            Label::new(1, "first", "#fff"),
            Label::new(2, "other", "#000"),
            Label::new(1, "second", "#f00"),
        ];

        let index = index_by_id(&labels);
        assert_eq!(index.len(), 2);
        assert_eq!(index[&1].title, "second");
    }
}
