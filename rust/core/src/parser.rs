// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dictionary parser
//!
//! Single pass over dictionary text, one physical line at a time. Each line
//! is stripped of its comment, then classified with [`crate::patterns`]
//! according to parser state:
//!
//! - between objects, plain content declares a new object and `\group`,
//!   `\include-file` and `\remove-object` directives are accepted;
//! - after `Object,` only field markers (`A1 ,`, `N2 ;`) are accepted until a
//!   `;` terminates the declaration;
//! - backslash properties attach to the most recent field while it is open,
//!   otherwise to the current object. The last field stays open after the
//!   closing `;` until the next object or directive.
//!
//! A parse either yields a complete [`SchemaRegistry`] or fails; there is no
//! partial result.

use rustc_hash::FxHashMap;

use crate::error::{Error, Location, Result};
use crate::patterns::{self, Directive, Property, COMMENT_ONLY_OBJECT_NAME, COMMENT_ONLY_OBJECT_TEXT};
use crate::registry::{DictionaryHeader, SchemaRegistry};
use crate::resolver::{IncludeResolver, NoIncludes};
use crate::schema::{Bound, DefaultValue, FieldDefinition, FieldId, FieldKind, ObjectDefinition};

/// Parser configuration
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum nesting of `\include-file` directives
    pub max_include_depth: usize,
    /// Reject unrecognized backslash properties instead of skipping them
    pub strict_properties: bool,
    /// Add the comment-only object when the dictionary lacks one
    pub inject_comment_only: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_include_depth: 16,
            strict_properties: true,
            inject_comment_only: true,
        }
    }
}

impl ParserConfig {
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn with_strict_properties(mut self, strict: bool) -> Self {
        self.strict_properties = strict;
        self
    }

    pub fn with_inject_comment_only(mut self, inject: bool) -> Self {
        self.inject_comment_only = inject;
        self
    }
}

/// Parse a self-contained dictionary with the default configuration
pub fn parse_dictionary(source_name: &str, text: &str) -> Result<SchemaRegistry> {
    DictionaryParser::new(&NoIncludes).parse(source_name, text)
}

/// Entry point for parsing dictionaries that may include other fragments
pub struct DictionaryParser<'r> {
    resolver: &'r dyn IncludeResolver,
    config: ParserConfig,
}

impl<'r> DictionaryParser<'r> {
    pub fn new(resolver: &'r dyn IncludeResolver) -> Self {
        Self {
            resolver,
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse `text` (and everything it includes) into a registry
    pub fn parse(&self, source_name: &str, text: &str) -> Result<SchemaRegistry> {
        let mut builder = Builder::new(self.resolver, &self.config);
        let header = builder.parse_fragment(source_name, text)?;
        let mut accumulated = builder.accumulated;

        if self.config.inject_comment_only && !accumulated.contains(COMMENT_ONLY_OBJECT_NAME) {
            let mut comment_only = Builder::new(&NoIncludes, &self.config);
            comment_only.parse_fragment(COMMENT_ONLY_OBJECT_NAME, COMMENT_ONLY_OBJECT_TEXT)?;
            accumulated.prepend(comment_only.accumulated.objects);
        }

        let registry = SchemaRegistry::from_parts(header, accumulated.objects);
        tracing::info!(
            source = source_name,
            objects = registry.len(),
            version = ?registry.version(),
            "Parsed dictionary"
        );
        Ok(registry)
    }
}

/// Objects collected across every fragment of one parse
#[derive(Default)]
struct Accumulated {
    objects: Vec<ObjectDefinition>,
    index: FxHashMap<String, usize>,
}

impl Accumulated {
    fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_uppercase())
    }

    fn insert(&mut self, object: ObjectDefinition, location: Location) -> Result<()> {
        let key = object.name.to_ascii_uppercase();
        if self.index.contains_key(&key) {
            return Err(Error::reference(
                location,
                format!("duplicate object '{}'", object.name),
            ));
        }
        self.index.insert(key, self.objects.len());
        self.objects.push(object);
        Ok(())
    }

    fn remove(&mut self, name: &str, location: Location) -> Result<()> {
        let Some(position) = self.index.get(&name.to_ascii_uppercase()).copied() else {
            return Err(Error::reference(
                location,
                format!("cannot remove '{}': no such object has been defined", name),
            ));
        };
        self.objects.remove(position);
        self.reindex();
        Ok(())
    }

    fn prepend(&mut self, objects: Vec<ObjectDefinition>) {
        self.objects.splice(0..0, objects);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, object) in self.objects.iter().enumerate() {
            self.index.insert(object.name.to_ascii_uppercase(), i);
        }
    }
}

/// Object under construction
struct PendingObject {
    definition: ObjectDefinition,
    line: usize,
    /// `;` seen; no more field markers
    terminated: bool,
    /// Last field still takes properties
    field_open: bool,
    field_line: usize,
    alpha_count: u32,
    numeric_count: u32,
}

impl PendingObject {
    fn new(definition: ObjectDefinition, line: usize, terminated: bool) -> Self {
        Self {
            definition,
            line,
            terminated,
            field_open: false,
            field_line: line,
            alpha_count: 0,
            numeric_count: 0,
        }
    }
}

/// Per-fragment parse state
struct FragmentState<'s> {
    source_name: &'s str,
    line: usize,
    group: Option<String>,
    current: Option<PendingObject>,
}

impl<'s> FragmentState<'s> {
    fn new(source_name: &'s str) -> Self {
        Self {
            source_name,
            line: 0,
            group: None,
            current: None,
        }
    }

    #[inline]
    fn location(&self) -> Location {
        Location::new(self.source_name, self.line)
    }

    #[inline]
    fn location_at(&self, line: usize) -> Location {
        Location::new(self.source_name, line)
    }

    /// Inside `Object, ...` before its terminating `;`
    #[inline]
    fn expecting_field(&self) -> bool {
        self.current.as_ref().is_some_and(|p| !p.terminated)
    }
}

struct Builder<'a> {
    resolver: &'a dyn IncludeResolver,
    config: &'a ParserConfig,
    accumulated: Accumulated,
    include_stack: Vec<String>,
}

impl<'a> Builder<'a> {
    fn new(resolver: &'a dyn IncludeResolver, config: &'a ParserConfig) -> Self {
        Self {
            resolver,
            config,
            accumulated: Accumulated::default(),
            include_stack: Vec::new(),
        }
    }

    fn parse_fragment(&mut self, source_name: &str, text: &str) -> Result<DictionaryHeader> {
        self.include_stack.push(source_name.to_string());

        let mut state = FragmentState::new(source_name);
        let mut header = DictionaryHeader::default();
        let mut in_header = true;

        for (i, raw) in text.lines().enumerate() {
            state.line = i + 1;

            if in_header {
                if raw.starts_with('!') {
                    if let Some(version) = patterns::version(raw) {
                        header.version = Some(version.to_string());
                    } else if let Some(build) = patterns::build(raw) {
                        header.build = Some(build.to_string());
                    }
                    header.text.push_str(raw);
                    header.text.push('\n');
                    continue;
                }
                in_header = false;
            }

            let (content, _comment) = patterns::split_comment(raw);
            self.process_content(&mut state, content)?;
        }

        self.finish_object(&mut state)?;
        self.include_stack.pop();
        Ok(header)
    }

    fn process_content(&mut self, state: &mut FragmentState<'_>, content: &str) -> Result<()> {
        let mut rest = content;
        loop {
            let text = rest.trim_start();
            if text.is_empty() {
                return Ok(());
            }
            if text.starts_with('\\') {
                return self.process_metadata(state, text);
            }
            rest = if state.expecting_field() {
                self.add_field(state, text)?
            } else {
                self.begin_object(state, text)?
            };
        }
    }

    fn begin_object<'t>(&mut self, state: &mut FragmentState<'_>, text: &'t str) -> Result<&'t str> {
        let split = patterns::separator(text).ok_or_else(|| {
            Error::syntax(
                state.location(),
                format!("expected an object declaration ending in ',' or ';', found '{}'", text.trim()),
            )
        })?;

        let name = split.before.trim();
        if name.is_empty() {
            return Err(Error::syntax(state.location(), "object declaration has no name"));
        }

        self.finish_object(state)?;

        if self.accumulated.contains(name) {
            return Err(Error::reference(
                state.location(),
                format!("duplicate object '{}'", name),
            ));
        }

        let definition = ObjectDefinition::new(name, state.group.clone());
        state.current = Some(PendingObject::new(
            definition,
            state.line,
            split.separator.ends_object(),
        ));
        Ok(split.after)
    }

    fn add_field<'t>(&mut self, state: &mut FragmentState<'_>, text: &'t str) -> Result<&'t str> {
        let marker = patterns::field_marker(text).ok_or_else(|| {
            Error::syntax(
                state.location(),
                format!(
                    "expected a field marker (A<n> or N<n>) followed by ',' or ';', found '{}'",
                    text.trim()
                ),
            )
        })?;

        self.close_field(state)?;

        let line = state.line;
        let location = state.location();
        let Some(pending) = state.current.as_mut() else {
            return Err(Error::syntax(location, "field marker outside of an object"));
        };

        let count = match marker.kind {
            FieldKind::Alpha => &mut pending.alpha_count,
            FieldKind::Numeric => &mut pending.numeric_count,
        };
        *count += 1;
        if marker.number != *count {
            return Err(Error::structural(
                location,
                format!(
                    "field {}{} in '{}' is out of sequence, expected {}{}",
                    marker.kind.letter(),
                    marker.number,
                    pending.definition.name,
                    marker.kind.letter(),
                    *count
                ),
            ));
        }

        pending.definition.fields.push(FieldDefinition::new(FieldId {
            kind: marker.kind,
            number: marker.number,
        }));
        pending.field_open = true;
        pending.field_line = line;
        if marker.separator.ends_object() {
            pending.terminated = true;
        }
        Ok(marker.rest)
    }

    fn process_metadata(&mut self, state: &mut FragmentState<'_>, text: &str) -> Result<()> {
        if let Some(directive) = patterns::directive(text) {
            return self.apply_directive(state, directive);
        }

        let mut rest = text;
        while let Some((body, remaining)) = patterns::metadata(rest) {
            if !body.trim().is_empty() {
                self.apply_property(state, body)?;
            }
            rest = remaining;
        }
        Ok(())
    }

    fn apply_directive(&mut self, state: &mut FragmentState<'_>, directive: Directive<'_>) -> Result<()> {
        if state.expecting_field() {
            return Err(Error::syntax(
                state.location(),
                "directives are only allowed between objects",
            ));
        }
        self.finish_object(state)?;

        match directive {
            Directive::Group(name) => {
                state.group = (!name.is_empty()).then(|| name.to_string());
            }
            Directive::IncludeFile(name) => {
                if name.is_empty() {
                    return Err(Error::syntax(state.location(), "include-file names no fragment"));
                }
                self.include(state, name)?;
            }
            Directive::RemoveObject(name) => {
                if name.is_empty() {
                    return Err(Error::syntax(state.location(), "remove-object names no object"));
                }
                self.accumulated.remove(name, state.location())?;
                tracing::debug!(object = name, source = state.source_name, "Removed object");
            }
        }
        Ok(())
    }

    fn include(&mut self, state: &mut FragmentState<'_>, name: &str) -> Result<()> {
        let depth = self.include_stack.len();
        if depth > self.config.max_include_depth {
            return Err(Error::include(
                state.location(),
                name,
                format!("include depth exceeds {}", self.config.max_include_depth).into(),
            ));
        }

        let fragment = self
            .resolver
            .resolve(name, state.source_name)
            .map_err(|cause| Error::include(state.location(), name, cause))?;

        if self
            .include_stack
            .iter()
            .any(|s| s.eq_ignore_ascii_case(&fragment.source_name))
        {
            return Err(Error::include(
                state.location(),
                name,
                format!("circular include of '{}'", fragment.source_name).into(),
            ));
        }

        tracing::debug!(
            fragment = %fragment.source_name,
            from = state.source_name,
            depth,
            "Including dictionary fragment"
        );
        self.parse_fragment(&fragment.source_name, &fragment.text)?;
        Ok(())
    }

    fn apply_property(&mut self, state: &mut FragmentState<'_>, body: &str) -> Result<()> {
        let Some(property) = patterns::classify_property(body) else {
            if self.config.strict_properties {
                return Err(Error::syntax(
                    state.location(),
                    format!("unrecognized property '\\{}'", body.trim()),
                ));
            }
            tracing::warn!(
                source = state.source_name,
                line = state.line,
                property = body.trim(),
                "Skipping unrecognized property"
            );
            return Ok(());
        };

        let location = state.location();
        let Some(pending) = state.current.as_mut() else {
            return Err(Error::syntax(
                location,
                format!("property '\\{}' has no object to attach to", property.keyword()),
            ));
        };

        if pending.field_open && !property.is_object_only() {
            let index = pending.definition.fields.len() - 1;
            let field = &mut pending.definition.fields[index];
            apply_field_property(field, property).map_err(|m| Error::structural(location, m))?;
            if matches!(property, Property::BeginExtensible) {
                pending.definition.properties.begin_extensible = Some(index);
            }
            return Ok(());
        }

        apply_object_property(&mut pending.definition, property).map_err(|m| Error::syntax(location, m))
    }

    fn close_field(&mut self, state: &mut FragmentState<'_>) -> Result<()> {
        let Some(pending) = state.current.as_mut() else {
            return Ok(());
        };
        if !pending.field_open {
            return Ok(());
        }
        pending.field_open = false;
        let line = pending.field_line;
        let object = pending.definition.name.clone();
        match pending.definition.fields.last() {
            Some(field) => validate_field(&object, field)
                .map_err(|m| Error::structural(state.location_at(line), m)),
            None => Ok(()),
        }
    }

    /// Validate and store the pending object
    fn finish_object(&mut self, state: &mut FragmentState<'_>) -> Result<()> {
        if state.current.is_none() {
            return Ok(());
        }
        self.close_field(state)?;

        let Some(pending) = state.current.take() else {
            return Ok(());
        };
        let location = state.location_at(pending.line);
        if !pending.terminated {
            return Err(Error::structural(
                location,
                format!("object '{}' is missing its terminating ';'", pending.definition.name),
            ));
        }

        validate_object(&pending.definition).map_err(|m| Error::structural(location.clone(), m))?;
        self.accumulated.insert(pending.definition, location)
    }
}

/// Why a bound could not be stored
enum BoundIssue {
    Missing,
    Conflict,
}

fn set_bound(slot: &mut Option<Bound>, bound: Bound) -> std::result::Result<(), BoundIssue> {
    if bound.text().is_empty() {
        return Err(BoundIssue::Missing);
    }
    match slot {
        Some(existing) if existing.is_exclusive() != bound.is_exclusive() => Err(BoundIssue::Conflict),
        _ => {
            *slot = Some(bound);
            Ok(())
        }
    }
}

fn describe_bound_issue(issue: BoundIssue, direction: &str, field: &FieldDefinition) -> String {
    match issue {
        BoundIssue::Missing => format!("{} of field '{}' has no value", direction, field.display_name()),
        BoundIssue::Conflict => format!(
            "field '{}' declares both an inclusive and an exclusive {}",
            field.display_name(),
            direction
        ),
    }
}

fn push_name(list: &mut crate::schema::NameList, value: &str) {
    if !value.is_empty() {
        list.push(value.to_string());
    }
}

fn apply_field_property(field: &mut FieldDefinition, property: Property<'_>) -> std::result::Result<(), String> {
    match property {
        Property::Field(name) => {
            field.name = (!name.is_empty()).then(|| name.to_string());
        }
        Property::Note(text) => field.notes.push(text.to_string()),
        Property::RequiredField => field.required = true,
        Property::Autosizable => field.autosizable = true,
        Property::Autocalculatable => field.autocalculatable = true,
        Property::Retaincase => field.retaincase = true,
        Property::Units(units) => field.units = Some(units.to_string()),
        Property::IpUnits(units) => field.ip_units = Some(units.to_string()),
        Property::UnitsBasedOnField(name) => field.units_based_on_field = Some(name.to_string()),
        Property::MinimumInclusive(v) => set_bound(&mut field.minimum, Bound::Inclusive(v.to_string()))
            .map_err(|issue| describe_bound_issue(issue, "minimum", field))?,
        Property::MinimumExclusive(v) => set_bound(&mut field.minimum, Bound::Exclusive(v.to_string()))
            .map_err(|issue| describe_bound_issue(issue, "minimum", field))?,
        Property::MaximumInclusive(v) => set_bound(&mut field.maximum, Bound::Inclusive(v.to_string()))
            .map_err(|issue| describe_bound_issue(issue, "maximum", field))?,
        Property::MaximumExclusive(v) => set_bound(&mut field.maximum, Bound::Exclusive(v.to_string()))
            .map_err(|issue| describe_bound_issue(issue, "maximum", field))?,
        Property::Deprecated(reason) => field.deprecated = Some(reason.to_string()),
        Property::Default(value) => {
            if value.is_empty() {
                return Err(format!("default of field '{}' has no value", field.display_name()));
            }
            field.default = Some(DefaultValue::classify(value));
        }
        Property::Type(field_type) => field.field_type = field_type,
        Property::Key(key) => {
            if !key.is_empty() {
                field.keys.push(key.to_string());
            }
        }
        Property::ObjectList(name) => push_name(&mut field.object_lists, name),
        Property::ExternalList(name) => push_name(&mut field.external_lists, name),
        Property::Reference(name) => push_name(&mut field.references, name),
        Property::ReferenceClassName(name) => push_name(&mut field.reference_class_names, name),
        Property::BeginExtensible => field.begin_extensible = true,
        other => {
            return Err(format!("'\\{}' is not a field property", other.keyword()));
        }
    }
    Ok(())
}

fn apply_object_property(object: &mut ObjectDefinition, property: Property<'_>) -> std::result::Result<(), String> {
    let props = &mut object.properties;
    match property {
        Property::Memo(text) => {
            if !props.memo.is_empty() {
                props.memo.push('\n');
            }
            props.memo.push_str(text);
        }
        Property::Note(text) => props.notes.push(text.to_string()),
        Property::UniqueObject => props.unique = true,
        Property::RequiredObject => props.required = true,
        Property::Obsolete(reason) => props.obsolete = Some(reason.to_string()),
        Property::UrlObject => props.has_url = true,
        Property::Extensible(size) => props.extensible = Some(size),
        Property::Format(format) => props.format = Some(format.to_string()),
        Property::MinFields(n) => props.min_fields = n,
        Property::MaxFields(n) => props.max_fields = Some(n),
        other => {
            return Err(format!(
                "field property '\\{}' appears before any field of '{}'",
                other.keyword(),
                object.name
            ));
        }
    }
    Ok(())
}

fn validate_field(object: &str, field: &FieldDefinition) -> std::result::Result<(), String> {
    if (field.autosizable || field.autocalculatable) && !field.is_numeric() {
        return Err(format!(
            "field '{}' of '{}' is autosizable or autocalculatable but has type {}",
            field.display_name(),
            object,
            field.field_type
        ));
    }
    if let (Some(min), Some(max)) = (
        field.minimum.as_ref().and_then(Bound::value),
        field.maximum.as_ref().and_then(Bound::value),
    ) {
        if min > max {
            return Err(format!(
                "field '{}' of '{}' has minimum {} above maximum {}",
                field.display_name(),
                object,
                min,
                max
            ));
        }
    }
    Ok(())
}

fn validate_object(object: &ObjectDefinition) -> std::result::Result<(), String> {
    let declared = object.fields.len();
    let props = &object.properties;

    if let Some(group) = props.extensible {
        if declared < group {
            return Err(format!(
                "'{}' is extensible:{} but declares only {} fields",
                object.name, group, declared
            ));
        }
        if let Some(begin) = props.begin_extensible {
            let tail = declared - begin;
            if tail % group != 0 {
                return Err(format!(
                    "'{}' declares {} extensible fields, not a multiple of {}",
                    object.name, tail, group
                ));
            }
        }
    } else {
        if props.begin_extensible.is_some() {
            return Err(format!(
                "'{}' marks begin-extensible without an extensible group size",
                object.name
            ));
        }
        if props.min_fields > declared {
            return Err(format!(
                "'{}' requires min-fields {} but declares only {} fields",
                object.name, props.min_fields, declared
            ));
        }
    }

    if let Some(max) = props.max_fields {
        if max < props.min_fields {
            return Err(format!(
                "'{}' has max-fields {} below min-fields {}",
                object.name, max, props.min_fields
            ));
        }
    }
    Ok(())
}
