// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data objects - generic, schema-driven field access
//!
//! A [`DataObject`] holds the raw text of each field of one object instance
//! and checks every write against its [`ObjectDefinition`]: numeric type,
//! bounds, choice keys and autosize/autocalculate permissions.

use std::fmt;

use crate::error::FieldError;
use crate::schema::{parse_number, FieldDefinition, FieldType, ObjectDefinition};

const AUTOSIZE: &str = "Autosize";
const AUTOCALCULATE: &str = "Autocalculate";

/// Width of the value column when writing IDF text
const VALUE_COLUMN: usize = 38;

/// One object instance bound to its definition
#[derive(Debug, Clone, PartialEq)]
pub struct DataObject<'d> {
    definition: &'d ObjectDefinition,
    values: Vec<Option<String>>,
}

impl<'d> DataObject<'d> {
    /// Create an object with `min-fields` empty slots
    pub fn new(definition: &'d ObjectDefinition) -> Self {
        Self {
            definition,
            values: vec![None; definition.properties.min_fields],
        }
    }

    #[inline]
    pub fn definition(&self) -> &'d ObjectDefinition {
        self.definition
    }

    /// Number of field slots currently held
    #[inline]
    pub fn num_fields(&self) -> usize {
        self.values.len()
    }

    fn field(&self, index: usize) -> Result<&'d FieldDefinition, FieldError> {
        self.definition
            .field_at(index)
            .ok_or_else(|| FieldError::OutOfRange {
                object: self.definition.name.clone(),
                index,
            })
    }

    /// Raw stored text, without defaults
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.values.get(index)?.as_deref()
    }

    /// Stored text, falling back to the field's default text
    pub fn get_string_or_default(&self, index: usize) -> Option<&str> {
        self.get_string(index).or_else(|| {
            self.definition
                .field_at(index)?
                .default
                .as_ref()
                .map(|d| d.text())
        })
    }

    /// Numeric value, falling back to a literal default. `None` when the
    /// value is missing, autosized or not a number.
    pub fn get_double(&self, index: usize) -> Option<f64> {
        match self.get_string(index) {
            Some(text) => parse_number(text),
            None => self.definition.field_at(index)?.default.as_ref()?.as_f64(),
        }
    }

    pub fn get_int(&self, index: usize) -> Option<i64> {
        let value = self.get_double(index)?;
        (value.fract() == 0.0).then_some(value as i64)
    }

    fn is_automatic(&self, index: usize, keyword: &str) -> bool {
        match self.get_string(index) {
            Some(text) => text.eq_ignore_ascii_case(keyword),
            None => self
                .definition
                .field_at(index)
                .and_then(|f| f.default.as_ref())
                .is_some_and(|d| d.is_automatic() && d.text().eq_ignore_ascii_case(keyword)),
        }
    }

    pub fn is_autosized(&self, index: usize) -> bool {
        self.is_automatic(index, AUTOSIZE)
    }

    pub fn is_autocalculated(&self, index: usize) -> bool {
        self.is_automatic(index, AUTOCALCULATE)
    }

    fn store(&mut self, index: usize, value: Option<String>) {
        if index >= self.values.len() {
            self.values.resize(index + 1, None);
        }
        self.values[index] = value;
    }

    /// Set a field from text, validated against its definition
    pub fn set_string(&mut self, index: usize, value: &str) -> Result<(), FieldError> {
        let field = self.field(index)?;
        let value = value.trim();

        if value.is_empty() {
            self.store(index, None);
            return Ok(());
        }

        let stored = match field.field_type {
            FieldType::Integer | FieldType::Real => {
                if field.autosizable && value.eq_ignore_ascii_case(AUTOSIZE) {
                    AUTOSIZE.to_string()
                } else if field.autocalculatable && value.eq_ignore_ascii_case(AUTOCALCULATE) {
                    AUTOCALCULATE.to_string()
                } else {
                    let number = parse_number(value).ok_or_else(|| FieldError::InvalidNumber {
                        field: field.display_name(),
                        value: value.to_string(),
                    })?;
                    check_numeric(field, number)?;
                    value.to_string()
                }
            }
            FieldType::Choice if !field.keys.is_empty() => field
                .find_key(value)
                .map(str::to_string)
                .ok_or_else(|| FieldError::InvalidKey {
                    field: field.display_name(),
                    value: value.to_string(),
                })?,
            _ => value.to_string(),
        };

        self.store(index, Some(stored));
        Ok(())
    }

    pub fn set_double(&mut self, index: usize, value: f64) -> Result<(), FieldError> {
        let field = self.field(index)?;
        if !field.is_numeric() {
            return Err(FieldError::NotNumeric {
                field: field.display_name(),
            });
        }
        check_numeric(field, value)?;
        self.store(index, Some(value.to_string()));
        Ok(())
    }

    pub fn set_int(&mut self, index: usize, value: i64) -> Result<(), FieldError> {
        self.set_double(index, value as f64)?;
        self.store(index, Some(value.to_string()));
        Ok(())
    }

    pub fn autosize(&mut self, index: usize) -> Result<(), FieldError> {
        let field = self.field(index)?;
        if !field.autosizable {
            return Err(FieldError::NotAutomatic {
                field: field.display_name(),
                kind: "autosizable",
            });
        }
        self.store(index, Some(AUTOSIZE.to_string()));
        Ok(())
    }

    pub fn autocalculate(&mut self, index: usize) -> Result<(), FieldError> {
        let field = self.field(index)?;
        if !field.autocalculatable {
            return Err(FieldError::NotAutomatic {
                field: field.display_name(),
                kind: "autocalculatable",
            });
        }
        self.store(index, Some(AUTOCALCULATE.to_string()));
        Ok(())
    }

    /// Clear a field back to empty
    pub fn reset(&mut self, index: usize) -> Result<(), FieldError> {
        self.field(index)?;
        if index < self.values.len() {
            self.values[index] = None;
        }
        Ok(())
    }

    pub fn num_extensible_groups(&self) -> usize {
        let (Some(start), group) = (
            self.definition.first_extensible_index(),
            self.definition.extensible_group_size(),
        ) else {
            return 0;
        };
        self.values.len().saturating_sub(start).div_ceil(group)
    }

    /// Append one extensible group; returns its group index. Nothing is
    /// stored if any value is rejected.
    pub fn push_extensible_group(&mut self, values: &[&str]) -> Result<usize, FieldError> {
        let Some(start) = self.definition.first_extensible_index() else {
            return Err(FieldError::NotExtensible {
                object: self.definition.name.clone(),
            });
        };
        let group = self.definition.extensible_group_size();
        if values.len() != group {
            return Err(FieldError::GroupSize {
                object: self.definition.name.clone(),
                expected: group,
                actual: values.len(),
            });
        }

        let group_index = self.num_extensible_groups();
        let first = start + group_index * group;
        let previous = self.values.clone();
        for (offset, value) in values.iter().enumerate() {
            if let Err(e) = self.set_string(first + offset, value) {
                self.values = previous;
                return Err(e);
            }
        }
        self.store_padding(first + group);
        Ok(group_index)
    }

    fn store_padding(&mut self, len: usize) {
        if self.values.len() < len {
            self.values.resize(len, None);
        }
    }

    /// Drop every extensible group
    pub fn clear_extensible_groups(&mut self) {
        if let Some(start) = self.definition.first_extensible_index() {
            self.values.truncate(start);
        }
    }

    /// Indices of required fields that have neither a value nor a default
    pub fn missing_required_fields(&self) -> Vec<usize> {
        let len = self.values.len().max(self.definition.properties.min_fields);
        (0..len)
            .filter(|&i| {
                self.definition.field_at(i).is_some_and(|f| {
                    f.required && f.default.is_none() && self.get_string(i).is_none()
                })
            })
            .collect()
    }
}

fn check_numeric(field: &FieldDefinition, value: f64) -> Result<(), FieldError> {
    if let Some(min) = &field.minimum {
        if !min.admits_above(value) {
            return Err(FieldError::BelowMinimum {
                field: field.display_name(),
                value,
                bound: min.to_string(),
            });
        }
    }
    if let Some(max) = &field.maximum {
        if !max.admits_below(value) {
            return Err(FieldError::AboveMaximum {
                field: field.display_name(),
                value,
                bound: max.to_string(),
            });
        }
    }
    if field.field_type == FieldType::Integer && value.fract() != 0.0 {
        return Err(FieldError::InvalidNumber {
            field: field.display_name(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// IDF text, one field per line with its name as a `!-` comment
impl fmt::Display for DataObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return writeln!(f, "{};", self.definition.name);
        }
        writeln!(f, "{},", self.definition.name)?;

        let last = self.values.len() - 1;
        for (i, value) in self.values.iter().enumerate() {
            let separator = if i == last { ';' } else { ',' };
            let cell = format!("{}{}", value.as_deref().unwrap_or(""), separator);
            let label = match self.definition.field_at(i) {
                Some(field) => match &field.units {
                    Some(units) => format!("{} {{{}}}", field.display_name(), units),
                    None => field.display_name(),
                },
                None => String::new(),
            };
            writeln!(f, "  {:<width$}!- {}", cell, label, width = VALUE_COLUMN)?;
        }
        Ok(())
    }
}
