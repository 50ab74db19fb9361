use std::{fs, str};

use lox_common::diagnostic::{Diagnostics, LineReporter};
use pretty_assertions::assert_eq;
use test_generator::test_resources;

#[test_resources("res/examples/**/*.lox")]
fn lox(path: &str) {
    let source =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("could not read test file: {path}"));

    let mut exp_output = String::new();
    for line in source.lines() {
        const OUT_COMMENT: &str = "// out: ";
        if let Some(idx) = line.find(OUT_COMMENT) {
            exp_output += &line[idx + OUT_COMMENT.len()..];
            exp_output += "\n";
        }
    }

    let mut diagnostics = Diagnostics::new(path, &source, LineReporter::new(Vec::new()));
    let mut got_output = lox_interpreter::run(&source, Vec::new(), &mut diagnostics);
    got_output.extend(diagnostics.into_reporter().into_inner());
    let got_output = str::from_utf8(&got_output).expect("invalid UTF-8 in output");
    assert_eq!(exp_output, got_output);
}
