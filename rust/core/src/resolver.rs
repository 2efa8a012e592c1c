// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Include-file resolution
//!
//! The parser never opens files itself. `\include-file` names are handed to
//! an [`IncludeResolver`], which returns the fragment text.

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;

/// Resolved dictionary fragment
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Name used in diagnostics and include-cycle detection
    pub source_name: String,
    pub text: String,
}

/// Turns an include name into fragment text
pub trait IncludeResolver {
    /// Resolve `name`, as written in `\include-file`, requested from
    /// `including_source`
    fn resolve(&self, name: &str, including_source: &str) -> Result<Fragment, ResolveError>;
}

/// Resolver for self-contained dictionaries; every include fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve(&self, name: &str, _including_source: &str) -> Result<Fragment, ResolveError> {
        Err(format!("includes are not supported here (requested '{}')", name).into())
    }
}

/// In-memory fragments keyed by include name (case-insensitive)
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    fragments: FxHashMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fragment(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.fragments
            .insert(name.into().to_ascii_uppercase(), text.into());
    }
}

impl IncludeResolver for MemoryResolver {
    fn resolve(&self, name: &str, _including_source: &str) -> Result<Fragment, ResolveError> {
        self.fragments
            .get(&name.to_ascii_uppercase())
            .map(|text| Fragment {
                source_name: name.to_string(),
                text: text.clone(),
            })
            .ok_or_else(|| format!("fragment '{}' not found", name).into())
    }
}

/// Filesystem resolver: names are looked up relative to the including file,
/// then in each search directory.
#[derive(Debug, Clone, Default)]
pub struct FileResolver {
    search_dirs: Vec<PathBuf>,
}

impl FileResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    fn candidates(&self, name: &str, including_source: &str) -> Vec<PathBuf> {
        let requested = Path::new(name);
        if requested.is_absolute() {
            return vec![requested.to_path_buf()];
        }
        let mut paths = Vec::with_capacity(self.search_dirs.len() + 1);
        if let Some(parent) = Path::new(including_source).parent() {
            paths.push(parent.join(requested));
        }
        paths.extend(self.search_dirs.iter().map(|dir| dir.join(requested)));
        paths
    }
}

impl IncludeResolver for FileResolver {
    fn resolve(&self, name: &str, including_source: &str) -> Result<Fragment, ResolveError> {
        for path in self.candidates(name, including_source) {
            if path.is_file() {
                let text = std::fs::read_to_string(&path)?;
                return Ok(Fragment {
                    source_name: path.display().to_string(),
                    text,
                });
            }
        }
        Err(format!("no file named '{}' in the search path", name).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_resolver_is_case_insensitive() {
        let resolver = MemoryResolver::new().with_fragment("Base.idd", "Zone;");
        let fragment = resolver.resolve("BASE.IDD", "main.idd").unwrap();
        assert_eq!(fragment.text, "Zone;");
        assert_eq!(fragment.source_name, "BASE.IDD");
        assert!(resolver.resolve("other.idd", "main.idd").is_err());
    }

    #[test]
    fn test_no_includes_always_fails() {
        assert!(NoIncludes.resolve("x.idd", "main.idd").is_err());
    }

    #[test]
    fn test_file_resolver_candidates() {
        let resolver = FileResolver::new().with_search_dir("/opt/idd");
        let paths = resolver.candidates("base.idd", "/work/model/main.idd");
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/work/model/base.idd"),
                PathBuf::from("/opt/idd/base.idd")
            ]
        );
    }
}
