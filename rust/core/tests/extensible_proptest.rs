// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-based tests for extensible field repetition and parse stability

use idd_lite_core::{parse_dictionary, patterns, FieldKind};
use proptest::prelude::*;

/// Build an extensible object with `alpha` leading alpha fields followed by
/// `groups` declared groups of `group` numeric fields.
fn extensible_dictionary(alpha: usize, group: usize, groups: usize) -> String {
    let numeric = group * groups;
    let total = alpha + numeric;
    let mut text = format!("Surface:Vertices,\n  \\extensible:{group}\n");
    for i in 0..total {
        let separator = if i + 1 == total { ';' } else { ',' };
        let (letter, number) = if i < alpha {
            ('A', i + 1)
        } else {
            ('N', i - alpha + 1)
        };
        text.push_str(&format!("  {letter}{number} {separator} \\field Field {i}\n"));
        if i == alpha {
            text.push_str("       \\begin-extensible\n");
        }
    }
    text
}

proptest! {
    #[test]
    fn tail_repeats_with_group_period(
        alpha in 0usize..4,
        group in 1usize..5,
        groups in 1usize..4,
        index in 0usize..200,
    ) {
        let text = extensible_dictionary(alpha, group, groups);
        let registry = parse_dictionary("generated.idd", &text).unwrap();
        let object = registry.find_object("surface:vertices").unwrap();
        let declared = object.num_fields();
        let prefix = declared - group;

        let field = registry.field_at("Surface:Vertices", index).unwrap();
        if index < declared {
            prop_assert_eq!(field, &object.fields[index]);
        } else {
            prop_assert_eq!(field, &object.fields[prefix + (index - prefix) % group]);
            prop_assert_eq!(field.id.kind, FieldKind::Numeric);
        }

        if index >= prefix {
            let next = registry.field_at("Surface:Vertices", index + group).unwrap();
            prop_assert_eq!(field.name.as_deref(), next.name.as_deref());
        }
    }

    #[test]
    fn reparsing_gives_the_same_registry(
        alpha in 0usize..4,
        group in 1usize..5,
        groups in 1usize..4,
    ) {
        let text = extensible_dictionary(alpha, group, groups);
        let first = parse_dictionary("generated.idd", &text).unwrap();
        let second = parse_dictionary("generated.idd", &text).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn field_markers_keep_their_number(number in 1u32..100_000, alpha in any::<bool>(), last in any::<bool>()) {
        let letter = if alpha { 'A' } else { 'N' };
        let separator = if last { ';' } else { ',' };
        let line = format!("{letter}{number} {separator} \\field Name");
        let marker = patterns::field_marker(&line).unwrap();
        prop_assert_eq!(marker.number, number);
        prop_assert_eq!(marker.separator.ends_object(), last);
    }

    #[test]
    fn comment_text_never_leaks_into_content(content in "[A-Za-z0-9 ,;:]{0,30}", comment in "[^\n]{0,30}") {
        let line = format!("{content}!{comment}");
        let (before, after) = patterns::split_comment(&line);
        prop_assert_eq!(before, content.as_str());
        prop_assert!(after.is_some());
    }
}
