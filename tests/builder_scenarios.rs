//! End-to-end build/test scenarios against sample data, mirroring the kind
//! of log output the templates are written for.

use rexbuild::{ReferenceTable, RegexBuilder};

fn table() -> ReferenceTable {
    ReferenceTable::builtin().expect("baseline must load")
}

const TEMPERATURE_TEMPLATE: &str = "\
phrase(var_subject) is digits(var_degree) degrees word(var_unit).
   IPv4 Address. . . . . . . . . . . : ipv4_address(var_ipv4_addr)(word(var_status))";

const TEMPERATURE_SAMPLES: &str = "\
today temperature is 75 degrees fahrenheit.
the highest temperature ever recorded on Earth is 134 degrees fahrenheit.
   IPv4 Address. . . . . . . . . . . : 192.168.0.1(Preferred)";

#[test]
fn temperature_and_ipv4_templates_pass() {
    let table = table();
    let mut builder = RegexBuilder::new(&table);
    builder.build(TEMPERATURE_TEMPLATE).unwrap();
    let passed = builder.test(TEMPERATURE_SAMPLES).unwrap();

    assert!(passed);
    assert!(builder.test_result());
    assert_eq!(builder.line_patterns().len(), 2);
    assert_eq!(
        builder.line_patterns()[0].pattern(),
        r"(?P<subject>\w+(\s+\w+)+) +is +(?P<degree>\d+) +degrees +(?P<unit>\w+)\."
    );

    // the first pattern matched two samples, both with captures
    let first = &builder.matches()[0];
    assert_eq!(first.samples.len(), 2);
    assert_eq!(
        first.samples[0].captures,
        vec![
            ("subject".to_string(), "today temperature".to_string()),
            ("degree".to_string(), "75".to_string()),
            ("unit".to_string(), "fahrenheit".to_string()),
        ]
    );

    let second = &builder.matches()[1];
    assert_eq!(second.samples.len(), 1);
    assert_eq!(
        second.samples[0].captures,
        vec![
            ("ipv4_addr".to_string(), "192.168.0.1".to_string()),
            ("status".to_string(), "Preferred".to_string()),
        ]
    );
}

#[test]
fn report_echoes_data_and_matched_groups() {
    let table = table();
    let mut builder = RegexBuilder::new(&table);
    builder.build(TEMPERATURE_TEMPLATE).unwrap();
    builder.test(TEMPERATURE_SAMPLES).unwrap();

    let report = builder.test_report();
    assert!(report.starts_with("Test Data:\n---------\n"));
    assert!(report.contains("Matched Result:\n--------------\n"));
    assert!(report.contains("'subject': 'today temperature'"));
    assert!(report.contains("'degree': '134'"));
    assert!(report.contains("'ipv4_addr': '192.168.0.1'"));
    assert!(report.contains("'status': 'Preferred'"));
    assert!(!report.contains("matched: NO"));
}

#[test]
fn unmatched_pattern_fails_the_overall_result() {
    let table = table();
    let mut builder = RegexBuilder::new(&table);
    builder
        .build("digits(var_n) packets\nmac_address(var_mac)")
        .unwrap();
    let passed = builder.test("42 packets").unwrap();
    assert!(!passed);
    assert!(builder.test_report().contains("matched: NO"));
    assert!(builder.test_report().contains("matched: [{'n': '42'}]"));
}

#[test]
fn match_without_named_groups_reports_yes() {
    let table = table();
    let mut builder = RegexBuilder::new(&table);
    builder.build("word() packets").unwrap();
    builder.test("17 packets received").unwrap();
    assert!(builder.test_report().contains("matched: YES"));
}

#[test]
fn shared_optional_token_collapses_to_one_pattern() {
    let template = "digits(var_v1) letters(var_v2, or_empty) digits(var_v3)";
    let table = table();
    let mut builder = RegexBuilder::new(&table);
    builder
        .build(vec![template.to_string(), template.to_string()])
        .unwrap();
    assert_eq!(builder.line_patterns().len(), 1);

    let passed = builder.test("123 abc 567\n123 567").unwrap();
    assert!(passed);
    // both samples matched the same single compiled pattern
    assert_eq!(builder.matches()[0].samples.len(), 2);
}

#[test]
fn empty_test_data_is_a_soft_no_op() {
    let table = table();
    let mut builder = RegexBuilder::new(&table);
    builder.build("word(var_x)").unwrap();
    let passed = builder.test("").unwrap();
    assert!(!passed);
    assert_eq!(builder.test_report(), "CANT run test with an empty data.");
}

#[test]
fn retest_replaces_the_match_tables() {
    let table = table();
    let mut builder = RegexBuilder::new(&table);
    builder.build("digits(var_n)").unwrap();

    builder.test("12\n34").unwrap();
    assert_eq!(builder.matches()[0].samples.len(), 2);

    builder.test("56").unwrap();
    assert_eq!(builder.matches()[0].samples.len(), 1);
    assert_eq!(builder.matches()[0].samples[0].sample, "56");
}
