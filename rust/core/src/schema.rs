// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dictionary schema types
//!
//! Object and field definitions as declared in an Input Data Dictionary.
//! Fields are stored once per declared slot; extensible repetition is
//! computed on lookup (see [`ObjectDefinition::field_at`]).

use smallvec::SmallVec;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::patterns;

/// Short list of names (references, object-lists) attached to a field
pub type NameList = SmallVec<[String; 2]>;

/// Letter class of a field slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldKind {
    /// `A<n>` slot
    Alpha,
    /// `N<n>` slot
    Numeric,
}

impl FieldKind {
    #[inline]
    pub fn letter(self) -> char {
        match self {
            FieldKind::Alpha => 'A',
            FieldKind::Numeric => 'N',
        }
    }

    /// Type used when a field declares no `\type`
    #[inline]
    pub fn default_type(self) -> FieldType {
        match self {
            FieldKind::Alpha => FieldType::Alpha,
            FieldKind::Numeric => FieldType::Real,
        }
    }
}

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldType {
    Integer,
    Real,
    Alpha,
    Choice,
    Node,
    ObjectList,
    ExternalList,
    Url,
    Handle,
}

impl FieldType {
    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Real)
    }

    /// Keyword used after `\type`
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Real => "real",
            FieldType::Alpha => "alpha",
            FieldType::Choice => "choice",
            FieldType::Node => "node",
            FieldType::ObjectList => "object-list",
            FieldType::ExternalList => "external-list",
            FieldType::Url => "url",
            FieldType::Handle => "handle",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a field within its letter class, e.g. `A3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldId {
    pub kind: FieldKind,
    pub number: u32,
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.number)
    }
}

/// Numeric bound as written in the dictionary
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Bound {
    Inclusive(String),
    Exclusive(String),
}

impl Bound {
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            Bound::Inclusive(v) | Bound::Exclusive(v) => v,
        }
    }

    #[inline]
    pub fn is_exclusive(&self) -> bool {
        matches!(self, Bound::Exclusive(_))
    }

    /// Bound value as a number, if it is one
    pub fn value(&self) -> Option<f64> {
        parse_number(self.text())
    }

    /// Whether `x` satisfies this bound used as a minimum
    pub fn admits_above(&self, x: f64) -> bool {
        match (self, self.value()) {
            (_, None) => true,
            (Bound::Inclusive(_), Some(min)) => x >= min,
            (Bound::Exclusive(_), Some(min)) => x > min,
        }
    }

    /// Whether `x` satisfies this bound used as a maximum
    pub fn admits_below(&self, x: f64) -> bool {
        match (self, self.value()) {
            (_, None) => true,
            (Bound::Inclusive(_), Some(max)) => x <= max,
            (Bound::Exclusive(_), Some(max)) => x < max,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Inclusive(v) => f.write_str(v),
            Bound::Exclusive(v) => write!(f, "{} (exclusive)", v),
        }
    }
}

/// Default value of a field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DefaultValue {
    /// Literal text, used as-is
    Literal(String),
    /// Autosize / autocalculate sentinel, resolved when the model is built
    Automatic(String),
}

impl DefaultValue {
    /// Classify default text from a `\default` property
    pub fn classify(text: &str) -> Self {
        if patterns::is_automatic_default(text) {
            DefaultValue::Automatic(text.to_string())
        } else {
            DefaultValue::Literal(text.to_string())
        }
    }

    #[inline]
    pub fn is_automatic(&self) -> bool {
        matches!(self, DefaultValue::Automatic(_))
    }

    #[inline]
    pub fn text(&self) -> &str {
        match self {
            DefaultValue::Literal(v) | DefaultValue::Automatic(v) => v,
        }
    }

    /// Literal default parsed as a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DefaultValue::Literal(v) => parse_number(v),
            DefaultValue::Automatic(_) => None,
        }
    }
}

/// One positional slot of an object definition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldDefinition {
    pub id: FieldId,
    pub name: Option<String>,
    pub field_type: FieldType,
    pub units: Option<String>,
    pub ip_units: Option<String>,
    pub units_based_on_field: Option<String>,
    pub minimum: Option<Bound>,
    pub maximum: Option<Bound>,
    pub default: Option<DefaultValue>,
    pub required: bool,
    pub autosizable: bool,
    pub autocalculatable: bool,
    pub retaincase: bool,
    /// Present when deprecated; holds the (possibly empty) reason
    pub deprecated: Option<String>,
    pub begin_extensible: bool,
    pub object_lists: NameList,
    pub external_lists: NameList,
    pub references: NameList,
    pub reference_class_names: NameList,
    pub keys: Vec<String>,
    pub notes: Vec<String>,
}

impl FieldDefinition {
    /// Create an empty field for a marker, typed by its letter class
    pub fn new(id: FieldId) -> Self {
        Self {
            id,
            name: None,
            field_type: id.kind.default_type(),
            units: None,
            ip_units: None,
            units_based_on_field: None,
            minimum: None,
            maximum: None,
            default: None,
            required: false,
            autosizable: false,
            autocalculatable: false,
            retaincase: false,
            deprecated: None,
            begin_extensible: false,
            object_lists: NameList::new(),
            external_lists: NameList::new(),
            references: NameList::new(),
            reference_class_names: NameList::new(),
            keys: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Declared name, falling back to the slot marker (`A3`)
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.id.to_string(),
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.field_type.is_numeric()
    }

    #[inline]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated.is_some()
    }

    /// Key matching `value` case-insensitively, in declared case
    pub fn find_key(&self, value: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|k| k.eq_ignore_ascii_case(value))
            .map(String::as_str)
    }
}

/// Object-level properties
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectProperties {
    /// Memo lines joined with newlines
    pub memo: String,
    pub notes: Vec<String>,
    pub unique: bool,
    pub required: bool,
    /// Present when obsolete; holds the (possibly empty) reason
    pub obsolete: Option<String>,
    pub has_url: bool,
    pub format: Option<String>,
    pub min_fields: usize,
    pub max_fields: Option<usize>,
    /// Size of the repeating tail group
    pub extensible: Option<usize>,
    /// Index of the field carrying `\begin-extensible`
    pub begin_extensible: Option<usize>,
}

/// A named object type and its ordered fields
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectDefinition {
    pub name: String,
    pub group: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub properties: ObjectProperties,
}

impl ObjectDefinition {
    pub fn new(name: impl Into<String>, group: Option<String>) -> Self {
        Self {
            name: name.into(),
            group,
            fields: Vec::new(),
            properties: ObjectProperties::default(),
        }
    }

    #[inline]
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Size of the repeating tail group, or 0 when not extensible
    #[inline]
    pub fn extensible_group_size(&self) -> usize {
        self.properties.extensible.unwrap_or(0)
    }

    #[inline]
    pub fn is_extensible(&self) -> bool {
        self.extensible_group_size() > 0
    }

    /// Number of leading fields outside the repeating unit
    pub fn non_extensible_count(&self) -> usize {
        self.fields.len() - self.extensible_group_size().min(self.fields.len())
    }

    /// Field definition for an absolute index, mapping indices past the
    /// declared fields into the repeating tail for extensible objects.
    pub fn field_at(&self, index: usize) -> Option<&FieldDefinition> {
        if let Some(field) = self.fields.get(index) {
            return Some(field);
        }
        let group = self.extensible_group_size();
        if group == 0 || self.fields.len() < group {
            return None;
        }
        let prefix = self.non_extensible_count();
        self.fields.get(prefix + (index - prefix) % group)
    }

    /// Index where extensible groups start: the `\begin-extensible` field if
    /// declared, otherwise the start of the last declared group
    pub fn first_extensible_index(&self) -> Option<usize> {
        if !self.is_extensible() {
            return None;
        }
        Some(
            self.properties
                .begin_extensible
                .unwrap_or_else(|| self.non_extensible_count()),
        )
    }

    /// Whether an absolute index falls in the repeating tail
    pub fn is_extensible_index(&self, index: usize) -> bool {
        self.is_extensible() && index >= self.non_extensible_count()
    }

    /// Index of the field with this name (case-insensitive)
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| {
            f.name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }

    #[inline]
    pub fn is_unique(&self) -> bool {
        self.properties.unique
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.properties.required
    }

    #[inline]
    pub fn is_obsolete(&self) -> bool {
        self.properties.obsolete.is_some()
    }

    /// Loose version-object check, see [`patterns::is_version_object_name`]
    #[inline]
    pub fn is_version_object(&self) -> bool {
        patterns::is_version_object_name(&self.name)
    }
}

/// Parse dictionary numeric text (`.5`, `1e-3`, `-40`)
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    fast_float::parse::<f64, _>(text).ok()
}
