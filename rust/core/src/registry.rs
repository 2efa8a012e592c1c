// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schema registry - the immutable result of a dictionary parse
//!
//! Object lookup is case-insensitive; declared case is preserved. The
//! reference and object-list cross indices are built once, after every object
//! is known, since fields may name lists declared further down the dictionary.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::schema::{FieldDefinition, ObjectDefinition};

pub use crate::patterns::{COMMENT_ONLY_OBJECT_NAME, COMMENT_ONLY_OBJECT_TEXT};

static NO_FIELDS: BTreeSet<FieldRef> = BTreeSet::new();

/// A field slot in a named object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FieldRef {
    pub object: String,
    pub field_index: usize,
}

/// Header metadata found at the top of the main dictionary source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DictionaryHeader {
    pub version: Option<String>,
    pub build: Option<String>,
    /// Raw header comment lines, newline terminated
    pub text: String,
}

/// Completed mapping from object-type name to definition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SchemaRegistry {
    header: DictionaryHeader,
    objects: Vec<ObjectDefinition>,
    #[cfg_attr(feature = "serde", serde(skip))]
    index: FxHashMap<String, usize>,
    /// Object-list name -> fields that point at it
    #[cfg_attr(feature = "serde", serde(skip))]
    referencers: FxHashMap<String, BTreeSet<FieldRef>>,
    /// Reference name -> fields whose values can be pointed at
    #[cfg_attr(feature = "serde", serde(skip))]
    reference_targets: FxHashMap<String, BTreeSet<FieldRef>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    groups: Vec<String>,
}

#[inline]
fn key(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

impl SchemaRegistry {
    /// Build the registry and its cross indices from parsed objects
    pub(crate) fn from_parts(header: DictionaryHeader, objects: Vec<ObjectDefinition>) -> Self {
        let mut index = FxHashMap::with_capacity_and_hasher(objects.len(), Default::default());
        let mut referencers: FxHashMap<String, BTreeSet<FieldRef>> = FxHashMap::default();
        let mut reference_targets: FxHashMap<String, BTreeSet<FieldRef>> = FxHashMap::default();
        let mut groups: Vec<String> = Vec::new();

        for (position, object) in objects.iter().enumerate() {
            index.insert(key(&object.name), position);

            if let Some(group) = &object.group {
                if !groups.iter().any(|g| g == group) {
                    groups.push(group.clone());
                }
            }

            for (field_index, field) in object.fields.iter().enumerate() {
                let slot = || FieldRef {
                    object: object.name.clone(),
                    field_index,
                };
                for list in &field.object_lists {
                    referencers.entry(key(list)).or_default().insert(slot());
                }
                for reference in &field.references {
                    reference_targets
                        .entry(key(reference))
                        .or_default()
                        .insert(slot());
                }
            }
        }

        Self {
            header,
            objects,
            index,
            referencers,
            reference_targets,
            groups,
        }
    }

    /// Look up an object definition by name (case-insensitive)
    pub fn find_object(&self, name: &str) -> Option<&ObjectDefinition> {
        self.index.get(&key(name)).map(|&i| &self.objects[i])
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&key(name))
    }

    /// Declared fields of an object, in order
    pub fn fields(&self, object_name: &str) -> Option<&[FieldDefinition]> {
        self.find_object(object_name).map(|o| o.fields.as_slice())
    }

    /// Field definition for an absolute index, following extensible
    /// repetition. `None` when the object is unknown or the index is out of
    /// range.
    pub fn field_at(&self, object_name: &str, index: usize) -> Option<&FieldDefinition> {
        self.find_object(object_name)?.field_at(index)
    }

    /// Fields declaring `\object-list name`, i.e. fields that may point at
    /// objects carrying that reference
    pub fn referencers(&self, name: &str) -> &BTreeSet<FieldRef> {
        self.referencers.get(&key(name)).unwrap_or(&NO_FIELDS)
    }

    /// Fields declaring `\reference name`
    pub fn reference_targets(&self, name: &str) -> &BTreeSet<FieldRef> {
        self.reference_targets.get(&key(name)).unwrap_or(&NO_FIELDS)
    }

    /// Object types an object-list field may point at
    pub fn object_list_targets(&self, object_name: &str, field_index: usize) -> Vec<&ObjectDefinition> {
        let Some(field) = self.field_at(object_name, field_index) else {
            return Vec::new();
        };

        let mut positions: BTreeSet<usize> = BTreeSet::new();
        for list in &field.object_lists {
            for target in self.reference_targets(list) {
                if let Some(&i) = self.index.get(&key(&target.object)) {
                    positions.insert(i);
                }
            }
        }
        positions.into_iter().map(|i| &self.objects[i]).collect()
    }

    /// All objects in declaration order
    pub fn objects(&self) -> impl Iterator<Item = &ObjectDefinition> {
        self.objects.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Group names in first-seen order
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn objects_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a ObjectDefinition> + 'a {
        self.objects
            .iter()
            .filter(move |o| o.group.as_deref().is_some_and(|g| g.eq_ignore_ascii_case(group)))
    }

    pub fn header(&self) -> &DictionaryHeader {
        &self.header
    }

    #[inline]
    pub fn version(&self) -> Option<&str> {
        self.header.version.as_deref()
    }

    #[inline]
    pub fn build(&self) -> Option<&str> {
        self.header.build.as_deref()
    }

    /// First object that looks like the dictionary's version object
    pub fn version_object(&self) -> Option<&ObjectDefinition> {
        self.objects.iter().find(|o| o.is_version_object())
    }

    /// The comment-only pseudo object, if injected
    pub fn comment_only_object(&self) -> Option<&ObjectDefinition> {
        self.find_object(COMMENT_ONLY_OBJECT_NAME)
    }
}
