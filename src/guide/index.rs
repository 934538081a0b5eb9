//! Identifier normalization and the per-kind canonical entity index.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ErrorKind, IResult};
use crate::guide::types::RecordKind;
use crate::resources::HasNid;
use crate::resources::records::{ClassRecord, ItemRecord, SkillRecord, UnitRecord};

/// Trims, lowercases, turns spaces and hyphens into underscores and collapses
/// runs of underscores. `" Iron-Sword "` and `"iron__sword"` both become
/// `"iron_sword"`.
pub fn normalize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        let c = match c {
            ' ' | '-' => '_',
            c => c,
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// A record that can be de-duplicated by [`EntityIndex`].
pub trait IndexedRecord: HasNid + Clone + PartialEq {
    const KIND: RecordKind;

    fn with_nid(&self, nid: &str) -> Self;

    /// Equal in everything but the raw nid.
    fn same_content(&self, other: &Self) -> bool {
        *self == other.with_nid(self.nid())
    }
}

macro_rules! indexed_record {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(impl IndexedRecord for $ty {
            const KIND: RecordKind = $kind;

            fn with_nid(&self, nid: &str) -> Self {
                let mut record = self.clone();
                record.nid = nid.to_string();
                record
            }
        })*
    };
}

indexed_record!(
    SkillRecord => RecordKind::Skill,
    ItemRecord => RecordKind::Item,
    ClassRecord => RecordKind::Class,
    UnitRecord => RecordKind::Unit,
);

#[derive(Debug, Clone)]
pub struct Entry<T> {
    pub record: T,
    /// Raw nids that were merged into `record`.
    pub aliases: Vec<String>,
}

/// Normalized identifier to canonical record, for one record kind.
#[derive(Debug, Clone)]
pub struct EntityIndex<T> {
    entries: Vec<Entry<T>>,
    by_key: HashMap<String, usize>,
}

impl<T: IndexedRecord> EntityIndex<T> {
    /// Indexes `records` in order. A record whose normalized nid is already
    /// taken is merged into the first one when their content matches, and is
    /// a [`ErrorKind::DuplicateConflict`] otherwise.
    pub fn build(records: Vec<T>) -> IResult<Self> {
        let mut entries: Vec<Entry<T>> = Vec::with_capacity(records.len());
        let mut by_key = HashMap::with_capacity(records.len());

        for record in records {
            let key = normalize_identifier(record.nid());
            match by_key.get(&key) {
                Some(&idx) => {
                    let entry: &mut Entry<T> = &mut entries[idx];
                    if !entry.record.same_content(&record) {
                        return Err(ErrorKind::DuplicateConflict {
                            kind: T::KIND,
                            canonical_nid: entry.record.nid().to_string(),
                            conflicting_nid: record.nid().to_string(),
                        });
                    }
                    debug!(
                        kind = %T::KIND,
                        canonical = entry.record.nid(),
                        alias = record.nid(),
                        "merged duplicate record"
                    );
                    if record.nid() != entry.record.nid()
                        && !entry.aliases.iter().any(|alias| alias == record.nid())
                    {
                        entry.aliases.push(record.nid().to_string());
                    }
                }
                None => {
                    by_key.insert(key, entries.len());
                    entries.push(Entry {
                        record,
                        aliases: Vec::new(),
                    });
                }
            }
        }

        Ok(EntityIndex { entries, by_key })
    }

    pub fn get(&self, raw: &str) -> Option<&Entry<T>> {
        self.by_key
            .get(&normalize_identifier(raw))
            .map(|&idx| &self.entries[idx])
    }

    /// Canonical nid for `raw`, or a [`ErrorKind::Resolution`] naming the
    /// record that asked for it.
    pub fn resolve(&self, from_kind: RecordKind, from_nid: &str, raw: &str) -> IResult<&str> {
        self.get(raw)
            .map(|entry| entry.record.nid())
            .ok_or_else(|| ErrorKind::unresolved(from_kind, from_nid, T::KIND, raw))
    }

    /// Canonical entries in first-seen order.
    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| &entry.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn skill(nid: &str, desc: &str) -> SkillRecord {
        SkillRecord {
            nid: nid.to_string(),
            name: "Canto".to_string(),
            desc: desc.to_string(),
            icon_nid: None,
            hidden: false,
            active: false,
            aura: false,
        }
    }

    #[test]
    fn identifiers_normalize() {
        assert_eq!(normalize_identifier(" Iron-Sword "), "iron_sword");
        assert_eq!(normalize_identifier("Iron__Sword"), "iron_sword");
        assert_eq!(normalize_identifier("Iron - Sword"), "iron_sword");
        assert_eq!(normalize_identifier("T3_Male_Holy_Knight"), "t3_male_holy_knight");
    }

    #[test]
    fn identical_duplicates_merge_with_alias() {
        let index = EntityIndex::build(vec![
            skill("Canto", "Move again."),
            skill("canto", "Move again."),
            skill("Canto ", "Move again."),
        ])
        .unwrap();
        assert_eq!(index.len(), 1);
        let entry = index.get("CANTO").unwrap();
        assert_eq!(entry.record.nid, "Canto");
        assert_eq!(entry.aliases, vec!["canto".to_string(), "Canto ".to_string()]);
    }

    #[test]
    fn conflicting_duplicates_are_rejected() {
        let err = EntityIndex::build(vec![skill("Canto", "Move again."), skill("canto", "Other.")])
            .unwrap_err();
        match err {
            ErrorKind::DuplicateConflict {
                kind,
                canonical_nid,
                conflicting_nid,
            } => {
                assert_eq!(kind, RecordKind::Skill);
                assert_eq!(canonical_nid, "Canto");
                assert_eq!(conflicting_nid, "canto");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn resolve_names_both_ends() {
        let index = EntityIndex::build(vec![skill("Canto", "")]).unwrap();
        assert_eq!(index.resolve(RecordKind::Class, "Paladin", "canto").unwrap(), "Canto");
        match index.resolve(RecordKind::Class, "Paladin", "Galeforce") {
            Err(ErrorKind::Resolution {
                from_kind,
                from_nid,
                target_kind,
                target_nid,
            }) => {
                assert_eq!(from_kind, RecordKind::Class);
                assert_eq!(from_nid, "Paladin");
                assert_eq!(target_kind, RecordKind::Skill);
                assert_eq!(target_nid, "Galeforce");
            }
            other => panic!("expected resolution error, got {other:?}"),
        }
    }
}
