// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IDD-Lite CLI - inspect IDD data dictionaries.
//!
//! # Commands
//!
//! - `idd-lite summary <idd>` - Version, build, groups and object counts
//! - `idd-lite object <idd> <name>` - Fields and properties of one object type
//! - `idd-lite refs <idd> <reference>` - Fields providing and consuming a reference
//! - `idd-lite dump <idd>` - Whole registry as JSON
//!
//! `\include-file` fragments are looked up next to the dictionary, then in
//! each directory of `IDD_INCLUDE_DIR` and `--include-dir`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use idd_lite_core::{DictionaryParser, FieldDefinition, ObjectDefinition, SchemaRegistry};
use std::io::Write;
use std::path::{Path, PathBuf};

mod config;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "idd-lite", version, about = "Inspect IDD data dictionaries")]
struct Cli {
    /// Additional directory searched for included fragments (repeatable)
    #[arg(long = "include-dir", global = true)]
    include_dirs: Vec<PathBuf>,

    /// Maximum include nesting depth
    #[arg(long, global = true)]
    max_include_depth: Option<usize>,

    /// Skip unrecognized properties with a warning instead of failing
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print version, build, groups and object counts
    Summary { idd: PathBuf },
    /// Print the fields of one object type
    Object { idd: PathBuf, name: String },
    /// Print fields that declare or consume a reference name
    Refs { idd: PathBuf, reference: String },
    /// Print the whole registry as JSON
    Dump { idd: PathBuf },
}

impl Command {
    fn idd(&self) -> &Path {
        match self {
            Command::Summary { idd }
            | Command::Object { idd, .. }
            | Command::Refs { idd, .. }
            | Command::Dump { idd } => idd,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,idd_lite_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    config.include_dirs.extend(cli.include_dirs.iter().cloned());
    if let Some(depth) = cli.max_include_depth {
        config.max_include_depth = depth;
    }
    if cli.lenient {
        config.strict_properties = false;
    }

    tracing::debug!(
        include_dirs = ?config.include_dirs,
        max_include_depth = config.max_include_depth,
        strict_properties = config.strict_properties,
        "Loaded configuration"
    );

    let registry = load(&config, cli.command.idd())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Summary { .. } => print_summary(&mut out, &registry)?,
        Command::Object { name, .. } => {
            let object = registry
                .find_object(name)
                .with_context(|| format!("no object named '{}' in the dictionary", name))?;
            print_object(&mut out, object)?;
        }
        Command::Refs { reference, .. } => print_refs(&mut out, &registry, reference)?,
        Command::Dump { .. } => {
            serde_json::to_writer_pretty(&mut out, &registry)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn load(config: &Config, path: &Path) -> Result<SchemaRegistry> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let resolver = config.resolver();
    let registry = DictionaryParser::new(&resolver)
        .with_config(config.parser_config())
        .parse(&path.display().to_string(), &text)?;
    Ok(registry)
}

fn print_summary(out: &mut impl Write, registry: &SchemaRegistry) -> Result<()> {
    writeln!(out, "version: {}", registry.version().unwrap_or("-"))?;
    writeln!(out, "build:   {}", registry.build().unwrap_or("-"))?;
    writeln!(out, "objects: {}", registry.len())?;
    for group in registry.groups() {
        writeln!(
            out,
            "  {:<50} {:>5}",
            group,
            registry.objects_in_group(group).count()
        )?;
    }
    let ungrouped = registry.objects().filter(|o| o.group.is_none()).count();
    if ungrouped > 0 {
        writeln!(out, "  {:<50} {:>5}", "(no group)", ungrouped)?;
    }
    Ok(())
}

fn print_object(out: &mut impl Write, object: &ObjectDefinition) -> Result<()> {
    writeln!(out, "{}", object.name)?;
    if let Some(group) = &object.group {
        writeln!(out, "  group: {}", group)?;
    }
    for line in object.properties.memo.lines() {
        writeln!(out, "  memo: {}", line)?;
    }
    let props = &object.properties;
    let mut flags = Vec::new();
    if props.unique {
        flags.push("unique".to_string());
    }
    if props.required {
        flags.push("required".to_string());
    }
    if let Some(replacement) = &props.obsolete {
        flags.push(format!("obsolete ({})", replacement));
    }
    if props.min_fields > 0 {
        flags.push(format!("min-fields {}", props.min_fields));
    }
    if let Some(max) = props.max_fields {
        flags.push(format!("max-fields {}", max));
    }
    if let Some(group) = props.extensible {
        flags.push(format!("extensible:{}", group));
    }
    if !flags.is_empty() {
        writeln!(out, "  {}", flags.join(", "))?;
    }

    for (index, field) in object.fields.iter().enumerate() {
        writeln!(out, "  {:>3} {:<5} {}", index, field.id.to_string(), describe_field(field))?;
    }
    Ok(())
}

fn describe_field(field: &FieldDefinition) -> String {
    let mut text = format!("{} [{}]", field.display_name(), field.field_type);
    if let Some(units) = &field.units {
        text.push_str(&format!(" {{{}}}", units));
    }
    if field.required {
        text.push_str(" required");
    }
    if let Some(min) = &field.minimum {
        text.push_str(&format!(" min {}", min));
    }
    if let Some(max) = &field.maximum {
        text.push_str(&format!(" max {}", max));
    }
    if let Some(default) = &field.default {
        text.push_str(&format!(" default {}", default.text()));
    }
    if !field.keys.is_empty() {
        text.push_str(&format!(" keys [{}]", field.keys.join("|")));
    }
    if !field.object_lists.is_empty() {
        text.push_str(&format!(" -> {}", field.object_lists.join(",")));
    }
    text
}

fn print_refs(out: &mut impl Write, registry: &SchemaRegistry, reference: &str) -> Result<()> {
    writeln!(out, "declared by:")?;
    for slot in registry.reference_targets(reference) {
        let name = registry
            .field_at(&slot.object, slot.field_index)
            .map(FieldDefinition::display_name)
            .unwrap_or_default();
        writeln!(out, "  {} #{} {}", slot.object, slot.field_index, name)?;
    }
    writeln!(out, "used by:")?;
    for slot in registry.referencers(reference) {
        let name = registry
            .field_at(&slot.object, slot.field_index)
            .map(FieldDefinition::display_name)
            .unwrap_or_default();
        writeln!(out, "  {} #{} {}", slot.object, slot.field_index, name)?;
    }
    Ok(())
}
