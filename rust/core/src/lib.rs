// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IDD-Lite Core
//!
//! Parser and registry for IDD data dictionaries, the schema files that
//! describe every object type of an IDF building model. Line patterns are
//! built with [nom](https://docs.rs/nom); comment scanning uses
//! [memchr](https://docs.rs/memchr).
//!
//! ## Overview
//!
//! - **Patterns**: classification of one dictionary line (field markers,
//!   directives, backslash properties)
//! - **Parser**: line-oriented state machine producing object definitions,
//!   with `\include-file` / `\remove-object` composition
//! - **Registry**: case-insensitive lookup, extensible field repetition and
//!   reference / object-list cross indices
//! - **Data objects**: schema-checked field access for object instances
//!
//! ## Quick Start
//!
//! ```rust
//! use idd_lite_core::parse_dictionary;
//!
//! let idd = "\
//! Zone,
//!   A1 ; \\field Name
//!        \\required-field
//! ";
//! let registry = parse_dictionary("zone.idd", idd).unwrap();
//! let zone = registry.find_object("ZONE").unwrap();
//! assert_eq!(zone.fields[0].name.as_deref(), Some("Name"));
//! assert!(registry.comment_only_object().is_some());
//! ```
//!
//! ## Includes
//!
//! The parser does no I/O of its own. Fragments named by `\include-file` are
//! fetched through an [`IncludeResolver`]:
//!
//! ```rust
//! use idd_lite_core::{DictionaryParser, MemoryResolver};
//!
//! let resolver = MemoryResolver::new().with_fragment("base.idd", "Site;\nZone;\n");
//! let registry = DictionaryParser::new(&resolver)
//!     .parse("main.idd", "\\include-file base.idd\n\\remove-object Site\n")
//!     .unwrap();
//! assert!(registry.contains("zone"));
//! assert!(!registry.contains("site"));
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for definitions and the registry

pub mod error;
pub mod object;
pub mod parser;
pub mod patterns;
pub mod registry;
pub mod resolver;
pub mod schema;

pub use error::{Error, FieldError, Location, ResolveError, Result};
pub use object::DataObject;
pub use parser::{parse_dictionary, DictionaryParser, ParserConfig};
pub use registry::{
    DictionaryHeader, FieldRef, SchemaRegistry, COMMENT_ONLY_OBJECT_NAME, COMMENT_ONLY_OBJECT_TEXT,
};
pub use resolver::{FileResolver, Fragment, IncludeResolver, MemoryResolver, NoIncludes};
pub use schema::{
    Bound, DefaultValue, FieldDefinition, FieldId, FieldKind, FieldType, ObjectDefinition,
    ObjectProperties,
};
