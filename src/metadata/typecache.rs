//! Module-wide name index.
//!
//! Built once while loading. Top-level `TypeDef`s are grouped by namespace and name in table
//! order; each group is the sequence of architecture variants of one type, its first entry the
//! head returned by lookups. Nested types are indexed by their enclosing type.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;

use crate::{
    metadata::{
        association::equal_range,
        streams::{Strings, TablesHeader},
        tables::TableId,
    },
    Result,
};

/// Top-level type groups and the nested type index of one image.
pub struct TypeCache<'a> {
    groups: HashMap<(&'a str, &'a str), Vec<u32>>,
    group_of: HashMap<u32, (&'a str, &'a str)>,
    namespaces: BTreeMap<&'a str, Vec<u32>>,
    nested: Vec<(u32, u32)>,
}

impl<'a> TypeCache<'a> {
    /// Index the `TypeDef` and `NestedClass` tables
    ///
    /// # Errors
    /// Returns an error if a row or a name cannot be read.
    pub fn build(tables: &TablesHeader<'a>, strings: Strings<'a>) -> Result<TypeCache<'a>> {
        let nested_table = tables.table(TableId::NestedClass);
        let mut nested = (1..=nested_table.row_count())
            .map(|rid| Ok((nested_table.value(rid, 1)?, nested_table.value(rid, 0)?)))
            .collect::<Result<Vec<(u32, u32)>>>()?;
        nested.sort_by_key(|(enclosing, _)| *enclosing);

        let type_defs = tables.table(TableId::TypeDef);
        let mut is_nested = vec![false; type_defs.row_count() as usize + 1];
        for (_, nested_rid) in &nested {
            match is_nested.get_mut(*nested_rid as usize) {
                Some(flag) => *flag = true,
                None => {
                    return Err(malformed_error!(
                        "NestedClass references TypeDef row {}",
                        nested_rid
                    ))
                }
            }
        }

        let names = (1..=type_defs.row_count())
            .into_par_iter()
            .filter(|rid| !is_nested[*rid as usize])
            .map(|rid| {
                let name = strings.get(type_defs.value(rid, 1)? as usize)?;
                let namespace = strings.get(type_defs.value(rid, 2)? as usize)?;
                Ok((rid, namespace, name))
            })
            .collect::<Result<Vec<(u32, &'a str, &'a str)>>>()?;

        let mut groups: HashMap<(&'a str, &'a str), Vec<u32>> = HashMap::new();
        let mut group_of = HashMap::with_capacity(names.len());
        let mut namespaces: BTreeMap<&'a str, Vec<u32>> = BTreeMap::new();
        for (rid, namespace, name) in names {
            groups.entry((namespace, name)).or_default().push(rid);
            group_of.insert(rid, (namespace, name));
            namespaces.entry(namespace).or_default().push(rid);
        }

        Ok(TypeCache {
            groups,
            group_of,
            namespaces,
            nested,
        })
    }

    /// The head of the group `namespace.name`
    #[must_use]
    pub fn find(&self, namespace: &str, name: &str) -> Option<u32> {
        self.groups
            .get(&(namespace, name))
            .and_then(|group| group.first().copied())
    }

    /// All rows of the group `namespace.name`, in table order
    #[must_use]
    pub fn group(&self, namespace: &str, name: &str) -> &[u32] {
        self.find(namespace, name)
            .and_then(|head| self.group_of(head))
            .unwrap_or(&[])
    }

    /// The group top-level row `rid` belongs to, `None` for nested types
    #[must_use]
    pub fn group_of(&self, rid: u32) -> Option<&[u32]> {
        let key = self.group_of.get(&rid)?;
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Top-level rows declared in `namespace`
    #[must_use]
    pub fn namespace(&self, namespace: &str) -> &[u32] {
        self.namespaces.get(namespace).map_or(&[], Vec::as_slice)
    }

    /// Every namespace with at least one top-level type, sorted
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().copied()
    }

    /// Rows of the types nested directly inside `enclosing`, in `NestedClass` order
    #[must_use]
    pub fn nested_types(&self, enclosing: u32) -> Vec<u32> {
        let nested = &self.nested;
        let Ok(range) = equal_range(nested.len() as u32, enclosing, |index| {
            Ok(nested[index as usize - 1].0)
        }) else {
            return Vec::new();
        };

        nested[range.start as usize - 1..range.end as usize - 1]
            .iter()
            .map(|(_, nested_rid)| *nested_rid)
            .collect()
    }

    /// Number of distinct top-level names
    #[must_use]
    pub fn name_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of nested types
    #[must_use]
    pub fn nested_count(&self) -> usize {
        self.nested.len()
    }
}
