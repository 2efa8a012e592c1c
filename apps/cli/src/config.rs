// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI configuration loaded from environment variables.

use idd_lite_core::{FileResolver, ParserConfig};
use std::path::PathBuf;

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Extra directories searched for `\include-file` fragments.
    pub include_dirs: Vec<PathBuf>,
    /// Maximum include nesting depth.
    pub max_include_depth: usize,
    /// Reject unrecognized backslash properties instead of skipping them.
    pub strict_properties: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = ParserConfig::default();
        Self {
            include_dirs: std::env::var_os("IDD_INCLUDE_DIR")
                .map(|dirs| std::env::split_paths(&dirs).collect())
                .unwrap_or_default(),
            max_include_depth: std::env::var("IDD_MAX_INCLUDE_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_include_depth),
            strict_properties: std::env::var("IDD_STRICT_PROPERTIES")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.strict_properties),
        }
    }

    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig::default()
            .with_max_include_depth(self.max_include_depth)
            .with_strict_properties(self.strict_properties)
    }

    /// Resolver searching the dictionary's own directory first, then
    /// `include_dirs` in order.
    pub fn resolver(&self) -> FileResolver {
        self.include_dirs
            .iter()
            .fold(FileResolver::new(), |resolver, dir| resolver.with_search_dir(dir))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
