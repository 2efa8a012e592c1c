// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use idd_lite_core::{DataObject, DictionaryParser, FieldError, FileResolver, SchemaRegistry};
use std::fs;
use std::path::PathBuf;

fn sample() -> SchemaRegistry {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("main.idd");
    let text = fs::read_to_string(&path).expect("sample dictionary present");
    let resolver = FileResolver::new();
    DictionaryParser::new(&resolver)
        .parse(&path.display().to_string(), &text)
        .expect("sample dictionary parses")
}

#[test]
fn surface_with_vertices() {
    let registry = sample();
    let definition = registry.find_object("BuildingSurface:Detailed").unwrap();
    let mut surface = DataObject::new(definition);
    assert_eq!(surface.num_fields(), 7);
    assert_eq!(surface.missing_required_fields(), vec![0, 1, 2]);

    surface.set_string(0, "Floor 1").unwrap();
    surface.set_string(1, "FLOOR").unwrap();
    surface.set_string(2, "Office").unwrap();
    assert!(surface.missing_required_fields().is_empty());
    assert_eq!(surface.get_string(1), Some("Floor"));
    assert!(surface.is_autocalculated(4));

    // min-fields already opened the first vertex slot pair
    assert_eq!(surface.num_extensible_groups(), 1);
    surface.clear_extensible_groups();
    for vertex in [["0", "0", "0"], ["10", "0", "0"], ["10", "8.5", "0"], ["0", "8.5", "0"]] {
        surface.push_extensible_group(&vertex).unwrap();
    }
    assert_eq!(surface.num_extensible_groups(), 4);
    assert_eq!(surface.num_fields(), 5 + 12);
    assert_relative_eq!(surface.get_double(5 + 2 * 3 + 1).unwrap(), 8.5);

    surface.set_int(4, 4).unwrap();
    assert_eq!(surface.get_int(4), Some(4));
    assert!(matches!(
        surface.set_int(4, 2),
        Err(FieldError::BelowMinimum { .. })
    ));
}

#[test]
fn zone_idf_text() {
    let registry = sample();
    let mut zone = DataObject::new(registry.find_object("Zone").unwrap());
    zone.set_string(0, "Office").unwrap();
    zone.set_double(1, 15.0).unwrap();
    zone.set_int(2, 2).unwrap();
    zone.autocalculate(3).unwrap();

    let text = zone.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "Zone,");
    assert!(lines[2].starts_with("  15,"));
    assert!(lines[2].ends_with("!- Direction of Relative North {deg}"));
    assert!(lines[4].starts_with("  Autocalculate;"));
    assert!(lines[4].ends_with("!- Ceiling Height {m}"));
}

#[test]
fn defaults_fill_unset_fields() {
    let registry = sample();
    let zone = DataObject::new(registry.find_object("Zone").unwrap());
    assert_eq!(zone.num_fields(), 0);
    assert_relative_eq!(zone.get_double(1).unwrap(), 0.0);
    assert_eq!(zone.get_int(2), Some(1));
    assert_eq!(zone.get_string(2), None);
    assert_eq!(zone.get_string_or_default(3), Some("autocalculate"));
}
