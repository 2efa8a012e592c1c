// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dictionary line patterns using nom
//!
//! Stateless classification rules for Input Data Dictionary text. Each rule
//! looks at a line (or the remainder of one) and either rejects it or returns
//! the captured pieces. Keyword rules match case-insensitively.
//!
//! Rule order matters where one keyword is a prefix of another
//! (`reference-class-name` / `reference`, `unitsBasedOnField` / `units`) and
//! for the exclusive/inclusive forms of `\minimum` and `\maximum`.

use memchr::{memchr, memchr2};
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{char, digit1, multispace0, one_of, space0, space1},
    combinator::{map, map_res, not, rest, value, verify},
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use crate::schema::{FieldKind, FieldType};

/// Name of the comment-only object added to every registry
pub const COMMENT_ONLY_OBJECT_NAME: &str = "CommentOnly";

/// Canonical text of the comment-only object
pub const COMMENT_ONLY_OBJECT_TEXT: &str = "CommentOnly; ! Autogenerated comment only object.";

/// Field or object separator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `,` - more fields follow
    Comma,
    /// `;` - the object declaration ends here
    Semicolon,
}

impl Separator {
    #[inline]
    pub fn ends_object(self) -> bool {
        matches!(self, Separator::Semicolon)
    }
}

/// Content split around the first separator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separated<'a> {
    pub before: &'a str,
    pub separator: Separator,
    pub after: &'a str,
}

/// Field marker such as `A3 ,` or `N12;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMarker<'a> {
    pub kind: FieldKind,
    /// 1-based index within the marker's own letter class
    pub number: u32,
    pub separator: Separator,
    /// Text after the separator
    pub rest: &'a str,
}

/// Directives that are legal only between objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    Group(&'a str),
    IncludeFile(&'a str),
    RemoveObject(&'a str),
}

/// A backslash metadata property, classified by keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property<'a> {
    // Object properties
    Memo(&'a str),
    Note(&'a str),
    UniqueObject,
    RequiredObject,
    Obsolete(&'a str),
    UrlObject,
    Extensible(usize),
    Format(&'a str),
    MinFields(usize),
    MaxFields(usize),

    // Field properties
    Field(&'a str),
    RequiredField,
    Autosizable,
    Autocalculatable,
    Retaincase,
    UnitsBasedOnField(&'a str),
    IpUnits(&'a str),
    Units(&'a str),
    MinimumExclusive(&'a str),
    MinimumInclusive(&'a str),
    MaximumExclusive(&'a str),
    MaximumInclusive(&'a str),
    Deprecated(&'a str),
    Default(&'a str),
    Type(FieldType),
    Key(&'a str),
    ObjectList(&'a str),
    ExternalList(&'a str),
    ReferenceClassName(&'a str),
    Reference(&'a str),
    BeginExtensible,
}

impl Property<'_> {
    /// Properties that only make sense on an object
    pub fn is_object_only(&self) -> bool {
        matches!(
            self,
            Property::Memo(_)
                | Property::UniqueObject
                | Property::RequiredObject
                | Property::Obsolete(_)
                | Property::UrlObject
                | Property::Extensible(_)
                | Property::Format(_)
                | Property::MinFields(_)
                | Property::MaxFields(_)
        )
    }

    /// Keyword as written in dictionaries
    pub fn keyword(&self) -> &'static str {
        match self {
            Property::Memo(_) => "memo",
            Property::Note(_) => "note",
            Property::UniqueObject => "unique-object",
            Property::RequiredObject => "required-object",
            Property::Obsolete(_) => "obsolete",
            Property::UrlObject => "URL-object",
            Property::Extensible(_) => "extensible",
            Property::Format(_) => "format",
            Property::MinFields(_) => "min-fields",
            Property::MaxFields(_) => "max-fields",
            Property::Field(_) => "field",
            Property::RequiredField => "required-field",
            Property::Autosizable => "autosizable",
            Property::Autocalculatable => "autocalculatable",
            Property::Retaincase => "retaincase",
            Property::UnitsBasedOnField(_) => "unitsBasedOnField",
            Property::IpUnits(_) => "ip-units",
            Property::Units(_) => "units",
            Property::MinimumExclusive(_) | Property::MinimumInclusive(_) => "minimum",
            Property::MaximumExclusive(_) | Property::MaximumInclusive(_) => "maximum",
            Property::Deprecated(_) => "deprecated",
            Property::Default(_) => "default",
            Property::Type(_) => "type",
            Property::Key(_) => "key",
            Property::ObjectList(_) => "object-list",
            Property::ExternalList(_) => "external-list",
            Property::ReferenceClassName(_) => "reference-class-name",
            Property::Reference(_) => "reference",
            Property::BeginExtensible => "begin-extensible",
        }
    }
}

/// `!IDD_Version <token>` at the start of a line
pub fn version(line: &str) -> Option<&str> {
    header_token("!IDD_Version")(line).ok().map(|(_, v)| v)
}

/// `!IDD_BUILD <token>` at the start of a line
pub fn build(line: &str) -> Option<&str> {
    header_token("!IDD_BUILD")(line).ok().map(|(_, v)| v)
}

fn header_token<'a>(marker: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(
        pair(tag_no_case(marker), space1),
        take_while1(|c: char| !c.is_whitespace()),
    )
}

/// Line that holds nothing but a comment, optionally indented.
/// Returns the comment text after `!`.
pub fn comment_only_line(line: &str) -> Option<&str> {
    let parsed: IResult<&str, char> = preceded(multispace0, char('!'))(line);
    parsed.ok().map(|(comment, _)| comment)
}

/// Split a line at the first `!` into content and comment.
///
/// There is no escape for `!`; it starts a comment even inside quote-like
/// text.
#[inline]
pub fn split_comment(line: &str) -> (&str, Option<&str>) {
    match memchr(b'!', line.as_bytes()) {
        Some(pos) => (&line[..pos], Some(&line[pos + 1..])),
        None => (line, None),
    }
}

/// Locate the first `,` or `;` ahead of any comment marker
pub fn separator(content: &str) -> Option<Separated<'_>> {
    let bytes = content.as_bytes();
    let end = memchr(b'!', bytes).unwrap_or(bytes.len());
    let pos = memchr2(b',', b';', &bytes[..end])?;
    let separator = if bytes[pos] == b',' {
        Separator::Comma
    } else {
        Separator::Semicolon
    };
    Some(Separated {
        before: &content[..pos],
        separator,
        after: &content[pos + 1..],
    })
}

fn separator_char(input: &str) -> IResult<&str, Separator> {
    alt((
        value(Separator::Comma, char(',')),
        value(Separator::Semicolon, char(';')),
    ))(input)
}

/// Field marker: `A<n>` or `N<n>`, optional blanks, then `,` or `;`
pub fn field_marker(text: &str) -> Option<FieldMarker<'_>> {
    let parsed: IResult<&str, (FieldKind, u32, Separator)> = tuple((
        preceded(
            multispace0,
            map(one_of("AaNn"), |c: char| {
                if c.eq_ignore_ascii_case(&'A') {
                    FieldKind::Alpha
                } else {
                    FieldKind::Numeric
                }
            }),
        ),
        map_res(digit1, |d: &str| d.parse::<u32>()),
        preceded(space0, separator_char),
    ))(text);

    parsed
        .ok()
        .map(|(rest, (kind, number, separator))| FieldMarker {
            kind,
            number,
            separator,
            rest,
        })
}

/// Backslash metadata: returns the text after `\` up to the next `\`, and
/// everything from that next `\` on.
pub fn metadata(text: &str) -> Option<(&str, &str)> {
    let parsed: IResult<&str, &str> = preceded(
        pair(multispace0, char('\\')),
        take_while(|c: char| c != '\\'),
    )(text);
    parsed.ok().map(|(remaining, body)| (body, remaining))
}

/// `\group`, `\include-file` or `\remove-object` at the start of content
pub fn directive(content: &str) -> Option<Directive<'_>> {
    let parsed: IResult<&str, Directive> = preceded(
        pair(multispace0, char('\\')),
        alt((
            map(preceded(tag_no_case("group"), rest), |s: &str| {
                Directive::Group(s.trim())
            }),
            map(preceded(tag_no_case("include-file"), rest), |s: &str| {
                Directive::IncludeFile(s.trim())
            }),
            map(preceded(tag_no_case("remove-object"), rest), |s: &str| {
                Directive::RemoveObject(s.trim())
            }),
        )),
    )(content);
    parsed.ok().map(|(_, d)| d)
}

/// Keyword followed by free text to the end of the property
fn text_rule<'a>(
    keyword: &'static str,
    ctor: fn(&'a str) -> Property<'a>,
) -> impl FnMut(&'a str) -> IResult<&'a str, Property<'a>> {
    map(preceded(tag_no_case(keyword), rest), move |s: &'a str| {
        ctor(s.trim())
    })
}

/// Keyword followed by text that stops at a comment marker
fn value_rule<'a>(
    keyword: &'static str,
    ctor: fn(&'a str) -> Property<'a>,
) -> impl FnMut(&'a str) -> IResult<&'a str, Property<'a>> {
    map(
        preceded(tag_no_case(keyword), take_while(|c: char| c != '!')),
        move |s: &'a str| ctor(s.trim()),
    )
}

fn flag_rule<'a>(
    keyword: &'static str,
    property: Property<'a>,
) -> impl FnMut(&'a str) -> IResult<&'a str, Property<'a>> {
    value(property, tag_no_case(keyword))
}

fn count_rule<'a>(
    keyword: &'static str,
    ctor: fn(usize) -> Property<'a>,
) -> impl FnMut(&'a str) -> IResult<&'a str, Property<'a>> {
    map(
        preceded(
            pair(tag_no_case(keyword), space0),
            map_res(digit1, |d: &str| d.parse::<usize>()),
        ),
        ctor,
    )
}

fn extensible(input: &str) -> IResult<&str, Property<'_>> {
    map(
        preceded(
            tuple((tag_no_case("extensible"), space0, char(':'), space0)),
            map_res(verify(digit1, |d: &str| !d.starts_with('0')), |d: &str| {
                d.parse::<usize>()
            }),
        ),
        Property::Extensible,
    )(input)
}

fn minimum(input: &str) -> IResult<&str, Property<'_>> {
    let (input, _) = tag_no_case("minimum")(input)?;
    alt((
        map(
            preceded(pair(space0, char('>')), take_while(|c: char| c != '!')),
            |s: &str| Property::MinimumExclusive(s.trim()),
        ),
        map(
            terminated(take_while(|c: char| c != '>' && c != '!'), not(char('>'))),
            |s: &str| Property::MinimumInclusive(s.trim()),
        ),
    ))(input)
}

fn maximum(input: &str) -> IResult<&str, Property<'_>> {
    let (input, _) = tag_no_case("maximum")(input)?;
    alt((
        map(
            preceded(pair(space0, char('<')), take_while(|c: char| c != '!')),
            |s: &str| Property::MaximumExclusive(s.trim()),
        ),
        map(
            terminated(take_while(|c: char| c != '<' && c != '!'), not(char('<'))),
            |s: &str| Property::MaximumInclusive(s.trim()),
        ),
    ))(input)
}

fn field_type(input: &str) -> IResult<&str, Property<'_>> {
    map(
        preceded(
            pair(tag_no_case("type"), space0),
            alt((
                value(FieldType::Integer, tag_no_case("integer")),
                value(FieldType::Real, tag_no_case("real")),
                value(FieldType::Alpha, tag_no_case("alpha")),
                value(FieldType::Choice, tag_no_case("choice")),
                value(FieldType::Node, tag_no_case("node")),
                value(FieldType::ObjectList, tag_no_case("object-list")),
                value(FieldType::ExternalList, tag_no_case("external-list")),
                value(FieldType::Url, tag_no_case("url")),
                value(FieldType::Handle, tag_no_case("handle")),
            )),
        ),
        Property::Type,
    )(input)
}

fn object_property(input: &str) -> IResult<&str, Property<'_>> {
    alt((
        text_rule("memo", Property::Memo),
        text_rule("note", Property::Note),
        flag_rule("unique-object", Property::UniqueObject),
        flag_rule("required-object", Property::RequiredObject),
        text_rule("obsolete", Property::Obsolete),
        flag_rule("url-object", Property::UrlObject),
        extensible,
        value_rule("format", Property::Format),
        count_rule("min-fields", Property::MinFields),
        count_rule("max-fields", Property::MaxFields),
    ))(input)
}

fn field_property(input: &str) -> IResult<&str, Property<'_>> {
    alt((
        alt((
            value_rule("field", Property::Field),
            flag_rule("required-field", Property::RequiredField),
            flag_rule("autosizable", Property::Autosizable),
            flag_rule("autocalculatable", Property::Autocalculatable),
            flag_rule("retaincase", Property::Retaincase),
            value_rule("unitsBasedOnField", Property::UnitsBasedOnField),
            value_rule("ip-units", Property::IpUnits),
            value_rule("units", Property::Units),
            minimum,
            maximum,
        )),
        alt((
            text_rule("deprecated", Property::Deprecated),
            value_rule("default", Property::Default),
            field_type,
            text_rule("key", Property::Key),
            value_rule("object-list", Property::ObjectList),
            value_rule("external-list", Property::ExternalList),
            value_rule("reference-class-name", Property::ReferenceClassName),
            value_rule("reference", Property::Reference),
            flag_rule("begin-extensible", Property::BeginExtensible),
        )),
    ))(input)
}

/// Classify the body of a backslash property (the text after `\`)
pub fn classify_property(body: &str) -> Option<Property<'_>> {
    alt((object_property, field_property))(body.trim_start())
        .ok()
        .map(|(_, property)| property)
}

/// A default value mentioning autosize or autocalculate anywhere is resolved
/// when the model is built, not taken literally.
pub fn is_automatic_default(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.contains("autocalculate") || lower.contains("autosize")
}

/// Loose test for objects that declare a schema version.
///
/// Any name containing "version" (any case) passes, so names such as
/// `VersionControl:Settings` match as well.
pub fn is_version_object_name(name: &str) -> bool {
    name.to_ascii_lowercase().contains("version")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_and_build() {
        assert_eq!(version("!IDD_Version 9.0.1"), Some("9.0.1"));
        assert_eq!(build("!IDD_BUILD 7c3bbe4830"), Some("7c3bbe4830"));
        assert_eq!(version(" !IDD_Version 9.0.1"), None);
        assert_eq!(version("!IDD_Version"), None);
        assert_eq!(build("! IDD_BUILD abc"), None);
    }

    #[test]
    fn test_comment_only_line() {
        assert_eq!(comment_only_line("   ! hello"), Some(" hello"));
        assert_eq!(comment_only_line("!"), Some(""));
        assert_eq!(comment_only_line("Zone, ! hello"), None);
        assert_eq!(comment_only_line(""), None);
    }

    #[test]
    fn test_split_comment() {
        assert_eq!(split_comment("A1 , \\field Name"), ("A1 , \\field Name", None));
        assert_eq!(split_comment("Zone, ! the zone"), ("Zone, ", Some(" the zone")));
        // '!' inside quote-like text still starts a comment
        assert_eq!(
            split_comment("\\default \"Hi!\""),
            ("\\default \"Hi", Some("\""))
        );
    }

    #[test]
    fn test_separator() {
        let split = separator("Zone, A1 ;").unwrap();
        assert_eq!(split.before, "Zone");
        assert_eq!(split.separator, Separator::Comma);
        assert_eq!(split.after, " A1 ;");

        let split = separator("Lead Input;").unwrap();
        assert_eq!(split.before, "Lead Input");
        assert!(split.separator.ends_object());
        assert_eq!(split.after, "");

        assert!(separator("Zone ! a, b").is_none());
        assert!(separator("\\memo no separator here").is_none());
    }

    #[test]
    fn test_field_marker_terminators() {
        let more = field_marker("A3 ,").unwrap();
        let end = field_marker("A3 ;").unwrap();
        assert_eq!(more.kind, FieldKind::Alpha);
        assert_eq!(more.number, 3);
        assert_eq!(end.number, more.number);
        assert_eq!(more.separator, Separator::Comma);
        assert_eq!(end.separator, Separator::Semicolon);
    }

    #[test]
    fn test_field_marker_rest_and_rejects() {
        let marker = field_marker("  N12, \\field Height").unwrap();
        assert_eq!(marker.kind, FieldKind::Numeric);
        assert_eq!(marker.number, 12);
        assert_eq!(marker.rest, " \\field Height");

        assert!(field_marker("Ax ,").is_none());
        assert!(field_marker("A1 \\field Name").is_none());
        assert!(field_marker("Zone,").is_none());
    }

    #[test]
    fn test_metadata_splits_at_next_backslash() {
        let (body, rest) = metadata("   \\field Name \\required-field").unwrap();
        assert_eq!(body, "field Name ");
        assert_eq!(rest, "\\required-field");
        let (body, rest) = metadata(rest).unwrap();
        assert_eq!(body, "required-field");
        assert_eq!(rest, "");
        assert!(metadata("A1,").is_none());
    }

    #[test]
    fn test_directives() {
        assert_eq!(
            directive("\\group Simulation Parameters"),
            Some(Directive::Group("Simulation Parameters"))
        );
        assert_eq!(
            directive("\\Include-File base.idd"),
            Some(Directive::IncludeFile("base.idd"))
        );
        assert_eq!(
            directive("  \\remove-object Version"),
            Some(Directive::RemoveObject("Version"))
        );
        assert_eq!(directive("\\memo text"), None);
    }

    #[test]
    fn test_minimum_exclusive_vs_inclusive() {
        assert_eq!(
            classify_property("minimum> 0"),
            Some(Property::MinimumExclusive("0"))
        );
        assert_eq!(
            classify_property("minimum >0.5"),
            Some(Property::MinimumExclusive("0.5"))
        );
        assert_eq!(
            classify_property("minimum 0"),
            Some(Property::MinimumInclusive("0"))
        );
        assert_eq!(
            classify_property("maximum< 100"),
            Some(Property::MaximumExclusive("100"))
        );
        assert_eq!(
            classify_property("Maximum 100"),
            Some(Property::MaximumInclusive("100"))
        );
    }

    #[test]
    fn test_prefix_keywords_prefer_longer_rule() {
        assert_eq!(
            classify_property("reference-class-name validBranchEquipmentTypes"),
            Some(Property::ReferenceClassName("validBranchEquipmentTypes"))
        );
        assert_eq!(
            classify_property("reference ZoneNames"),
            Some(Property::Reference("ZoneNames"))
        );
        assert_eq!(
            classify_property("unitsBasedOnField A2"),
            Some(Property::UnitsBasedOnField("A2"))
        );
        assert_eq!(classify_property("units W/m2"), Some(Property::Units("W/m2")));
        assert_eq!(classify_property("ip-units in"), Some(Property::IpUnits("in")));
    }

    #[test]
    fn test_object_properties() {
        assert_eq!(classify_property("extensible:3 repeat vertices"), Some(Property::Extensible(3)));
        assert_eq!(classify_property("extensible : 12"), Some(Property::Extensible(12)));
        assert_eq!(classify_property("extensible:0"), None);
        assert_eq!(classify_property("min-fields 5"), Some(Property::MinFields(5)));
        assert_eq!(classify_property("Max-Fields 9"), Some(Property::MaxFields(9)));
        assert_eq!(classify_property("Unique-Object"), Some(Property::UniqueObject));
        assert_eq!(classify_property("URL-object"), Some(Property::UrlObject));
        assert_eq!(classify_property("format singleLine"), Some(Property::Format("singleLine")));
        assert!(classify_property("memo hello").unwrap().is_object_only());
        assert!(!classify_property("note hello").unwrap().is_object_only());
    }

    #[test]
    fn test_field_type_keywords() {
        assert_eq!(classify_property("type Real"), Some(Property::Type(FieldType::Real)));
        assert_eq!(
            classify_property("type object-list"),
            Some(Property::Type(FieldType::ObjectList))
        );
        assert_eq!(classify_property("type handle"), Some(Property::Type(FieldType::Handle)));
        assert_eq!(classify_property("type widget"), None);
    }

    #[test]
    fn test_unknown_property() {
        assert_eq!(classify_property("presentation hidden"), None);
    }

    #[test]
    fn test_automatic_default() {
        assert!(is_automatic_default("Autosize"));
        assert!(is_automatic_default("AUTOCALCULATE"));
        assert!(is_automatic_default("use autosize here"));
        assert!(!is_automatic_default("123.4"));
        assert_eq!(classify_property("default 123.4"), Some(Property::Default("123.4")));
    }

    #[test]
    fn test_version_object_heuristic_is_loose() {
        assert!(is_version_object_name("Version"));
        assert!(is_version_object_name("OS:Version"));
        assert!(is_version_object_name("VersionControl:Settings"));
        assert!(!is_version_object_name("Zone"));
    }

    #[test]
    fn test_comment_only_text_shape() {
        let (content, comment) = split_comment(COMMENT_ONLY_OBJECT_TEXT);
        let split = separator(content).unwrap();
        assert_eq!(split.before, COMMENT_ONLY_OBJECT_NAME);
        assert!(split.separator.ends_object());
        assert_eq!(comment, Some(" Autogenerated comment only object."));
    }
}
