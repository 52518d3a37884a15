//! Integration tests for line compilation: scanning, policy flags, the
//! blank-line sentinel, and the statement side-channel.

use rexbuild::{LineOptions, LinePattern, ReferenceTable, BLANK_LINE_PATTERN};

fn table() -> ReferenceTable {
    ReferenceTable::builtin().expect("baseline must load")
}

#[test]
fn literal_line_matches_itself() {
    let line = LinePattern::compile("cherry is delicious.", &LineOptions::default(), &table())
        .unwrap();
    assert!(line.regex().is_match("cherry is delicious."));
}

#[test]
fn case_marker_precedes_the_anchor() {
    let options = LineOptions {
        prepended_ws: true,
        ignore_case: true,
        ..LineOptions::default()
    };
    let line = LinePattern::compile("cherry is delicious.", &options, &table()).unwrap();
    assert!(line.pattern().starts_with("(?i)^ *"));
    assert!(line.regex().is_match("cherry is delicious."));
    assert!(line.regex().is_match("  CHERRY IS DELICIOUS."));
}

#[test]
fn blank_lines_yield_the_sentinel() {
    for input in ["", "   "] {
        let line = LinePattern::compile(input, &LineOptions::default(), &table()).unwrap();
        assert_eq!(line.pattern(), BLANK_LINE_PATTERN);
        assert!(line.regex().is_match(""));
        assert!(line.regex().is_match(" \t "));
    }
}

#[test]
fn interface_status_template_matches() {
    let line = LinePattern::compile(
        "mixed_word() is choice(up, down, administratively down)",
        &LineOptions::default(),
        &table(),
    )
    .unwrap();
    assert!(line
        .regex()
        .is_match("TenGigE0/0/0/1 is administratively down"));
}

#[test]
fn out_of_range_octet_does_not_match() {
    let line = LinePattern::compile("ipv4_address()", &LineOptions::default(), &table()).unwrap();
    assert!(!line.regex().is_match("Is 192.168.0.256 an IPv4 address?"));
    assert!(line.regex().is_match("Is 192.168.0.25 an IPv4 address?"));
}

#[test]
fn statement_replaces_bound_fragments_with_placeholders() {
    let line = LinePattern::compile(
        "phrase(var_subject) is digits(var_degree) degrees word(var_unit).",
        &LineOptions::default(),
        &table(),
    )
    .unwrap();
    assert_eq!(line.statement(), "${subject} is ${degree} degrees ${unit}.");
    assert_eq!(line.var_names(), ["subject", "degree", "unit"]);
}

#[test]
fn unbound_elements_keep_their_call_text_in_the_statement() {
    let line = LinePattern::compile(
        "state: choice(up, down) word(var_why)",
        &LineOptions::default(),
        &table(),
    )
    .unwrap();
    assert_eq!(line.statement(), "state: choice(up, down) ${why}");
}

#[test]
fn literal_parens_around_an_inner_call() {
    let line = LinePattern::compile(
        "ipv4_address(var_addr)(word(var_status))",
        &LineOptions::default(),
        &table(),
    )
    .unwrap();
    let caps = line.regex().captures("192.168.0.1(Preferred)").unwrap();
    assert_eq!(&caps["addr"], "192.168.0.1");
    assert_eq!(&caps["status"], "Preferred");
}

#[test]
fn optional_middle_element_matches_with_and_without() {
    let line = LinePattern::compile(
        "digits(var_v1) letters(var_v2, or_empty) digits(var_v3)",
        &LineOptions::default(),
        &table(),
    )
    .unwrap();

    let with_middle = line.regex().captures("123 abc 567").unwrap();
    assert_eq!(&with_middle["v1"], "123");
    assert_eq!(&with_middle["v2"], "abc");
    assert_eq!(&with_middle["v3"], "567");

    let without_middle = line.regex().captures("123 567").unwrap();
    assert_eq!(&without_middle["v1"], "123");
    assert_eq!(&without_middle["v2"], "");
    assert_eq!(&without_middle["v3"], "567");
}

#[test]
fn appended_ws_anchors_the_line_end() {
    let options = LineOptions {
        appended_ws: true,
        ..LineOptions::default()
    };
    let line = LinePattern::compile("done", &options, &table()).unwrap();
    assert!(line.pattern().ends_with(" *$"));
    assert!(line.regex().is_match("done  "));
    assert!(!line.regex().is_match("done and more"));
}

#[test]
fn whitespace_matcher_flavor_follows_used_space() {
    let spaced = LinePattern::compile("a b", &LineOptions::default(), &table()).unwrap();
    assert_eq!(spaced.pattern(), "a +b");

    let generic = LinePattern::compile(
        "a b",
        &LineOptions {
            used_space: false,
            ..LineOptions::default()
        },
        &table(),
    )
    .unwrap();
    assert_eq!(generic.pattern(), r"a\s+b");
    assert!(generic.regex().is_match("a\tb"));
}
