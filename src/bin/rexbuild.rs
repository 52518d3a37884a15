//! Command-line interface for rexbuild
//!
//! Compiles template text into regex patterns and optionally tests them
//! against sample data.
//!
//! Usage:
//!   rexbuild -u 'word(var_x) is digits(var_n)'               - print the pattern
//!   rexbuild -u <template> -d <samples> -t                   - run a match test
//!   rexbuild -u file::template.txt -d file::samples.txt -t   - read data from files
//!   rexbuild -u <template> --multiline -d <document>         - one cross-line pattern
//!
//! Data values accept `file::<path>` indirection. Errors print one line to
//! stderr and exit nonzero; a failed match test exits nonzero as well.

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::fs;
use std::process;

use rexbuild::{LineOptions, MultilinePattern, ReferenceTable, RegexBuilder};

fn main() {
    let matches = Command::new("rexbuild")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build regular expressions from text templates")
        .arg(
            Arg::new("user-data")
                .short('u')
                .long("user-data")
                .required(true)
                .help("Template text for pattern generation, or file::<path>"),
        )
        .arg(
            Arg::new("test-data")
                .short('d')
                .long("test-data")
                .help("Sample data to match against, or file::<path>"),
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .action(ArgAction::SetTrue)
                .help("Test the generated patterns against the sample data"),
        )
        .arg(
            Arg::new("ignore-case")
                .short('i')
                .long("ignore-case")
                .action(ArgAction::SetTrue)
                .help("Prefix patterns with the (?i) case-insensitivity marker"),
        )
        .arg(
            Arg::new("prepended-ws")
                .long("prepended-ws")
                .action(ArgAction::SetTrue)
                .help("Anchor each pattern at line start with optional whitespace"),
        )
        .arg(
            Arg::new("appended-ws")
                .long("appended-ws")
                .action(ArgAction::SetTrue)
                .help("Anchor each pattern at line end with optional whitespace"),
        )
        .arg(
            Arg::new("no-space")
                .long("no-space")
                .action(ArgAction::SetTrue)
                .help("Use \\s+ for whitespace runs instead of literal spaces"),
        )
        .arg(
            Arg::new("multiline")
                .short('m')
                .long("multiline")
                .action(ArgAction::SetTrue)
                .help("Compile the whole template as one cross-line pattern"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print test matches as JSON instead of the text report"),
        )
        .get_matches();

    match run(&matches) {
        Ok(passed) => {
            if !passed {
                process::exit(1);
            }
        }
        Err(message) => {
            eprintln!("rexbuild: {}", message);
            process::exit(1);
        }
    }
}

/// Returns whether the invocation "passed": always true unless a match test
/// ran and failed.
fn run(matches: &ArgMatches) -> Result<bool, String> {
    let user_data = matches
        .get_one::<String>("user-data")
        .map(|value| read_data(value))
        .transpose()?
        .unwrap_or_default();
    let test_data = matches
        .get_one::<String>("test-data")
        .map(|value| read_data(value))
        .transpose()?;

    let table = ReferenceTable::new().map_err(|error| error.to_string())?;
    let options = LineOptions {
        used_space: !matches.get_flag("no-space"),
        prepended_ws: matches.get_flag("prepended-ws"),
        appended_ws: matches.get_flag("appended-ws"),
        ignore_case: matches.get_flag("ignore-case"),
    };

    if matches.get_flag("multiline") {
        return run_multiline(&user_data, test_data.as_deref(), options.ignore_case, &table);
    }

    let mut builder = RegexBuilder::with_options(&table, options);
    builder.build(user_data).map_err(|error| error.to_string())?;

    if matches.get_flag("test") {
        let test_data = test_data.ok_or("--test requires --test-data")?;
        let passed = builder.test(test_data).map_err(|error| error.to_string())?;
        if matches.get_flag("json") {
            let rendered = serde_json::to_string_pretty(builder.matches())
                .map_err(|error| error.to_string())?;
            println!("{}", rendered);
        } else {
            println!("{}", builder.test_report());
        }
        return Ok(passed);
    }

    for line_pattern in builder.line_patterns() {
        println!("{}", line_pattern.pattern());
    }
    Ok(true)
}

fn run_multiline(
    user_data: &str,
    test_data: Option<&str>,
    ignore_case: bool,
    table: &ReferenceTable,
) -> Result<bool, String> {
    let compiled = MultilinePattern::compile(user_data, ignore_case, table)
        .map_err(|error| error.to_string())?;
    println!("{}", compiled.pattern());

    if let Some(document) = test_data {
        match compiled.captures(document) {
            Some(captures) => {
                let rendered =
                    serde_json::to_string_pretty(&captures).map_err(|error| error.to_string())?;
                println!("{}", rendered);
                return Ok(true);
            }
            None => {
                println!("no match");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Resolve a data value, following `file::<path>` indirection.
fn read_data(value: &str) -> Result<String, String> {
    match value.strip_prefix("file::") {
        Some(path) => fs::read_to_string(path)
            .map_err(|error| format!("cannot read {}: {}", path, error)),
        None => Ok(value.to_string()),
    }
}
