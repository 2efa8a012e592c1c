// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end parse of the sample dictionary in `tests/data`, including
//! fragment composition through the filesystem resolver.

use idd_lite_core::{
    parse_dictionary, DictionaryParser, Error, FieldRef, FieldType, FileResolver, SchemaRegistry,
    COMMENT_ONLY_OBJECT_NAME,
};
use std::fs;
use std::path::PathBuf;

fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn parse_file(name: &str) -> idd_lite_core::Result<SchemaRegistry> {
    let path = data_path(name);
    let text = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("fixture {} not readable: {}", path.display(), e));
    let resolver = FileResolver::new();
    DictionaryParser::new(&resolver).parse(&path.display().to_string(), &text)
}

fn sample() -> SchemaRegistry {
    parse_file("main.idd").expect("sample dictionary parses")
}

#[test]
fn header_is_captured() {
    let registry = sample();
    assert_eq!(registry.version(), Some("23.1.0"));
    assert_eq!(registry.build(), Some("87ed9199d4"));
    assert_eq!(registry.header().text.lines().count(), 4);
    assert!(registry
        .header()
        .text
        .contains("Schedules live in a separate fragment."));
}

#[test]
fn objects_keep_declaration_order() {
    let registry = sample();
    let names: Vec<&str> = registry.objects().map(|o| o.name.as_str()).collect();
    assert_eq!(
        names,
        [
            COMMENT_ONLY_OBJECT_NAME,
            "Version",
            "Schedule:Constant",
            "Zone",
            "BuildingSurface:Detailed",
        ]
    );
}

#[test]
fn included_objects_and_removal() {
    let registry = sample();
    assert!(registry.contains("schedule:constant"));
    assert!(!registry.contains("Schedule:Legacy"));

    // Only the surviving schedule carries the reference
    let targets: Vec<FieldRef> = registry
        .reference_targets("ScheduleNames")
        .iter()
        .cloned()
        .collect();
    assert_eq!(
        targets,
        vec![FieldRef {
            object: "Schedule:Constant".into(),
            field_index: 0,
        }]
    );
}

#[test]
fn groups_follow_fragments() {
    let registry = sample();
    assert_eq!(
        registry.groups(),
        [
            "Simulation Parameters",
            "Schedules",
            "Thermal Zones and Surfaces"
        ]
    );
    assert_eq!(
        registry.find_object("Schedule:Constant").unwrap().group.as_deref(),
        Some("Schedules")
    );
    assert!(registry.comment_only_object().unwrap().group.is_none());
    assert_eq!(registry.objects_in_group("Thermal Zones and Surfaces").count(), 2);
}

#[test]
fn zone_fields() {
    let registry = sample();
    let zone = registry.find_object("ZONE").unwrap();
    assert_eq!(zone.num_fields(), 4);
    assert!(!zone.is_extensible());
    assert_eq!(zone.properties.memo, "Defines a thermal zone of the building.");

    let name = &zone.fields[0];
    assert_eq!(name.display_name(), "Name");
    assert!(name.required);
    assert_eq!(name.field_type, FieldType::Alpha);

    let north = registry.field_at("Zone", 1).unwrap();
    assert_eq!(north.units.as_deref(), Some("deg"));
    assert_eq!(north.default.as_ref().and_then(|d| d.as_f64()), Some(0.0));

    let multiplier = &zone.fields[2];
    assert_eq!(multiplier.field_type, FieldType::Integer);
    assert_eq!(multiplier.minimum.as_ref().map(|b| b.text()), Some("1"));

    let height = &zone.fields[3];
    assert!(height.minimum.as_ref().unwrap().is_exclusive());
    assert!(height.autocalculatable);
    assert!(height.default.as_ref().unwrap().is_automatic());

    assert!(registry.field_at("Zone", 4).is_none());
}

#[test]
fn extensible_surface_vertices() {
    let registry = sample();
    let surface = registry.find_object("BuildingSurface:Detailed").unwrap();
    assert_eq!(surface.extensible_group_size(), 3);
    assert_eq!(surface.properties.begin_extensible, Some(5));
    assert_eq!(surface.properties.min_fields, 7);
    assert_eq!(surface.properties.format.as_deref(), Some("vertices"));

    // Vertex 4 Z-coordinate maps back onto the declared Z field
    let z = registry.field_at("BuildingSurface:Detailed", 5 + 3 * 3 + 2).unwrap();
    assert_eq!(z.display_name(), "Vertex 1 Z-coordinate");
    assert!(surface.is_extensible_index(100));
    assert!(!surface.is_extensible_index(4));

    let surface_type = &surface.fields[1];
    assert_eq!(surface_type.field_type, FieldType::Choice);
    assert_eq!(surface_type.find_key("roof"), Some("Roof"));
}

#[test]
fn object_list_cross_references() {
    let registry = sample();
    let zone_targets = registry.object_list_targets("BuildingSurface:Detailed", 2);
    assert_eq!(zone_targets.len(), 1);
    assert_eq!(zone_targets[0].name, "Zone");

    let referencers: Vec<&FieldRef> = registry.referencers("zonenames").iter().collect();
    assert_eq!(referencers.len(), 1);
    assert_eq!(referencers[0].object, "BuildingSurface:Detailed");
    assert_eq!(referencers[0].field_index, 2);

    let schedule_targets = registry.object_list_targets("BuildingSurface:Detailed", 3);
    assert_eq!(schedule_targets.len(), 1);
    assert_eq!(schedule_targets[0].name, "Schedule:Constant");
}

#[test]
fn version_object_and_properties() {
    let registry = sample();
    let version = registry.version_object().unwrap();
    assert_eq!(version.name, "Version");
    assert!(version.is_unique());
    assert_eq!(version.properties.format.as_deref(), Some("singleLine"));
}

#[test]
fn circular_include_is_reported() {
    let err = parse_file("cycle_a.idd").unwrap_err();
    match err {
        Error::IncludeResolution { location, name, .. } => {
            assert_eq!(name, "cycle_a.idd");
            assert!(location.source_name.ends_with("cycle_b.idd"));
            assert_eq!(location.line, 2);
        }
        other => panic!("expected an include error, got {other:?}"),
    }
}

#[test]
fn missing_include_is_reported() {
    let err = parse_dictionary("inline.idd", "\\include-file nowhere.idd\n").unwrap_err();
    assert!(matches!(err, Error::IncludeResolution { .. }));
    assert_eq!(err.location().line, 1);
}

#[test]
fn parsing_is_deterministic() {
    assert_eq!(sample(), sample());
}
