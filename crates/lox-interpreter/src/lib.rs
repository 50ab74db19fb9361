mod env;
mod interpreter;
mod object;
mod resolver;

use std::io::Write;

use lox_common::diagnostic::{Diagnostics, Reporter};
use lox_common::error::ErrorS;
use lox_syntax::ast::Program;

pub use crate::interpreter::{Interpreter, Locals};
pub use crate::resolver::Resolver;

/// Computes the distance table for `program` without running it.
pub fn resolve(program: &Program) -> (Locals, Vec<ErrorS>) {
    Resolver::default().resolve(program)
}

/// Parses, resolves and runs `source`, writing program output to `stdout`.
///
/// Syntax errors are reported and stop the run before resolution.
/// Resolution errors are reported but the program still runs; callers tell
/// the outcomes apart through [`Diagnostics::had_error`] and
/// [`Diagnostics::had_runtime_error`].
pub fn run<W: Write, R: Reporter>(source: &str, stdout: W, diagnostics: &mut Diagnostics<R>) -> W {
    let (program, errors) = lox_syntax::parse(source);
    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "not running program with syntax errors");
        diagnostics.report_all(&errors);
        return stdout;
    }

    let mut interpreter = Interpreter::new(stdout);
    interpreter.resolve(&program, diagnostics);
    interpreter.interpret(&program, diagnostics);
    interpreter.into_stdout()
}

#[cfg(test)]
mod tests {
    use super::*;

    use lox_common::diagnostic::LineReporter;
    use pretty_assertions::assert_eq;

    fn run_to_string(source: &str) -> (String, String, bool, bool) {
        let mut diagnostics = Diagnostics::new("test.lox", source, LineReporter::new(Vec::new()));
        let stdout = run(source, Vec::new(), &mut diagnostics);
        let (had_error, had_runtime_error) =
            (diagnostics.had_error(), diagnostics.had_runtime_error());
        let stderr = diagnostics.into_reporter().into_inner();
        (
            String::from_utf8(stdout).unwrap(),
            String::from_utf8(stderr).unwrap(),
            had_error,
            had_runtime_error,
        )
    }

    #[test]
    fn syntax_errors_stop_before_running() {
        let (stdout, stderr, had_error, had_runtime_error) =
            run_to_string("print \"ran\";\nprint 1 +;");
        assert_eq!(stdout, "");
        assert_eq!(stderr, "[line 2] Error at ';': SyntaxError: unexpected \";\", expected expression\n");
        assert!(had_error);
        assert!(!had_runtime_error);
    }

    #[test]
    fn runtime_error_sets_runtime_flag_only() {
        let (stdout, stderr, had_error, had_runtime_error) =
            run_to_string("print 1;\nprint -\"x\";\nprint 2;");
        assert_eq!(stdout, "1\n");
        assert_eq!(
            stderr,
            "[line 2] Error at '-': TypeError: operand of - must be a number, not \"string\"\n"
        );
        assert!(!had_error);
        assert!(had_runtime_error);
    }

    #[test]
    fn resolve_is_deterministic() {
        let (program, _) = lox_syntax::parse("{ var a; { fun f() { return a; } } }");
        assert_eq!(resolve(&program), resolve(&program));
        assert_eq!(resolve(&program).0.len(), 1);
    }
}
