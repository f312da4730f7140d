//! FILENAME: table-engine/src/cache.rs
//! Key Cache - interned representation of a table used for grouping.
//!
//! The cache is designed for:
//! - One O(n) build per table, shared read-only by every grouping pass
//! - Cheap group keys: each distinct value is stored once and rows refer to it by id
//! - Grouping any subset of rows (a complement, a filtered slice) without re-hashing values
//!
//! Ids are stable for the lifetime of the cache, so keys built from
//! different row subsets of the same table can be compared directly.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::column::Column;
use crate::error::TableError;
use crate::table::Table;
use crate::value::{KeyValue, Value};

/// A reference to an interned value within a field's unique value store.
pub type ValueId = u32;

/// Represents a missing value in the cache.
pub const VALUE_ID_NULL: ValueId = u32::MAX;

/// A combination of value ids, one per grouping field, in field order.
pub type GroupKey = SmallVec<[ValueId; 4]>;

// ============================================================================
// FIELD CACHE
// ============================================================================

/// Interned values for a single column.
#[derive(Debug, Clone)]
pub struct FieldCache {
    /// The column this cache represents.
    pub name: String,

    /// Map from value to its unique ID (for deduplication during build).
    value_to_id: FxHashMap<KeyValue, ValueId>,

    /// Unique values indexed by ValueId.
    id_to_value: Vec<Value>,

    /// ValueId of every row.
    ids: Vec<ValueId>,
}

impl FieldCache {
    pub fn build(column: &Column) -> Self {
        let mut field = FieldCache {
            name: column.name.clone(),
            value_to_id: FxHashMap::default(),
            id_to_value: Vec::new(),
            ids: Vec::with_capacity(column.len()),
        };
        for row in 0..column.len() {
            let id = field.intern(column.get(row));
            field.ids.push(id);
        }
        field
    }

    /// Interns a value and returns its ValueId.
    fn intern(&mut self, value: Value) -> ValueId {
        if value.is_null() {
            return VALUE_ID_NULL;
        }

        let key = KeyValue::from(&value);
        if let Some(&id) = self.value_to_id.get(&key) {
            return id;
        }

        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value);
        self.value_to_id.insert(key, id);
        id
    }

    /// ValueId stored for a row.
    pub fn id_at(&self, row: usize) -> ValueId {
        self.ids.get(row).copied().unwrap_or(VALUE_ID_NULL)
    }

    /// Gets the value for a given ID.
    pub fn get_value(&self, id: ValueId) -> Value {
        if id == VALUE_ID_NULL {
            return Value::Null;
        }
        self.id_to_value.get(id as usize).cloned().unwrap_or(Value::Null)
    }
}

// ============================================================================
// GROUPS
// ============================================================================

/// One group produced by [`TableCache::group_rows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: GroupKey,
    pub rows: Vec<usize>,
}

// ============================================================================
// TABLE CACHE
// ============================================================================

/// Interned view over every column of a table.
#[derive(Debug, Clone)]
pub struct TableCache {
    fields: Vec<FieldCache>,
    row_count: usize,
}

impl TableCache {
    pub fn build(table: &Table) -> Self {
        TableCache {
            fields: table.columns().iter().map(FieldCache::build).collect(),
            row_count: table.height(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn field(&self, index: usize) -> Option<&FieldCache> {
        self.fields.get(index)
    }

    /// Resolves column names to field indices.
    pub fn field_indices(&self, names: &[String]) -> Result<Vec<usize>, TableError> {
        names
            .iter()
            .map(|name| {
                self.fields
                    .iter()
                    .position(|f| &f.name == name)
                    .ok_or_else(|| TableError::ColumnNotFound(name.clone()))
            })
            .collect()
    }

    /// Builds the key of one row over the given fields.
    pub fn key_of(&self, row: usize, fields: &[usize]) -> GroupKey {
        fields
            .iter()
            .map(|&fi| self.fields.get(fi).map_or(VALUE_ID_NULL, |f| f.id_at(row)))
            .collect()
    }

    /// Groups the given rows by the given fields.
    /// Groups come out in the order their keys first appear; rows keep their
    /// input order within a group. With no fields every row lands in a single
    /// group (or none, when `rows` is empty).
    pub fn group_rows<I>(&self, fields: &[usize], rows: I) -> Vec<Group>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
        let mut groups: Vec<Group> = Vec::new();

        for row in rows {
            let key = self.key_of(row, fields);
            match index.get(&key) {
                Some(&g) => groups[g].rows.push(row),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(Group { key, rows: vec![row] });
                }
            }
        }

        groups
    }

    /// Every distinct key over the given fields present in the table.
    pub fn distinct_keys(&self, fields: &[usize]) -> FxHashSet<GroupKey> {
        (0..self.row_count).map(|row| self.key_of(row, fields)).collect()
    }

    /// Materializes a key back into values, one per field.
    pub fn key_values(&self, fields: &[usize], key: &GroupKey) -> Vec<Value> {
        fields
            .iter()
            .zip(key.iter())
            .map(|(&fi, &id)| self.fields.get(fi).map_or(Value::Null, |f| f.get_value(id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            &["name", "year", "grade"],
            vec![
                vec!["John".into(), "2019".into(), Value::Int(90)],
                vec!["Andy".into(), "2019".into(), Value::Int(70)],
                vec!["John".into(), "2020".into(), Value::Int(94)],
                vec!["Andy".into(), Value::Null, Value::Int(72)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn interning_dedupes_values() {
        let table = sample();
        let cache = TableCache::build(&table);
        let name = cache.field(0).unwrap();
        assert_eq!(name.id_at(0), name.id_at(2));
        assert_ne!(name.id_at(0), name.id_at(1));
        assert_eq!(name.get_value(name.id_at(1)), Value::from("Andy"));
        assert_eq!(cache.field(1).unwrap().id_at(3), VALUE_ID_NULL);
    }

    #[test]
    fn groups_follow_first_appearance() {
        let table = sample();
        let cache = TableCache::build(&table);
        let fields = cache.field_indices(&["name".to_string()]).unwrap();
        let groups = cache.group_rows(&fields, 0..cache.row_count());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].rows, vec![0, 2]);
        assert_eq!(groups[1].rows, vec![1, 3]);
        assert_eq!(cache.key_values(&fields, &groups[0].key), vec![Value::from("John")]);
    }

    #[test]
    fn grouping_a_subset() {
        let table = sample();
        let cache = TableCache::build(&table);
        let fields = cache.field_indices(&["year".to_string()]).unwrap();
        let groups = cache.group_rows(&fields, [1, 3]);

        assert_eq!(groups.len(), 2);
        assert_eq!(cache.key_values(&fields, &groups[1].key), vec![Value::Null]);
    }

    #[test]
    fn empty_field_list_is_one_group() {
        let table = sample();
        let cache = TableCache::build(&table);
        let groups = cache.group_rows(&[], 0..cache.row_count());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].rows.len(), 4);
        assert!(cache.group_rows(&[], std::iter::empty()).is_empty());
    }

    #[test]
    fn distinct_keys_cover_combinations() {
        let table = sample();
        let cache = TableCache::build(&table);
        let fields = cache
            .field_indices(&["name".to_string(), "year".to_string()])
            .unwrap();
        assert_eq!(cache.distinct_keys(&fields).len(), 4);
    }

    #[test]
    fn unknown_field_is_an_error() {
        let cache = TableCache::build(&sample());
        let err = cache.field_indices(&["missing".to_string()]).unwrap_err();
        assert_eq!(err, TableError::ColumnNotFound("missing".to_string()));
    }
}
