use crate::error::{ErrorKind, ErrorS};
use crate::types::Span;

use codespan_reporting::files::{Files, SimpleFile};
use codespan_reporting::term;
use termcolor::WriteColor;

use std::io::Write;

pub type SourceFile<'src> = SimpleFile<&'src str, &'src str>;

/// Receives every error found while running a program.
pub trait Reporter {
    fn report_error(&mut self, line: usize, context: &str, message: &str);

    fn report(&mut self, file: &SourceFile, error: &ErrorS) {
        let (error, span) = error;
        let line = file.line_index((), span.start).map_or(1, |idx| idx + 1);
        self.report_error(line, &context(file.source(), span), &error.to_string());
    }
}

impl<F: FnMut(usize, &str, &str)> Reporter for F {
    fn report_error(&mut self, line: usize, context: &str, message: &str) {
        self(line, context, message)
    }
}

/// Describes where an error happened in terms of the offending lexeme.
fn context(source: &str, span: &Span) -> String {
    if span.start >= source.len() {
        return " at end".to_string();
    }
    match source.get(span.clone()) {
        Some(lexeme) if !lexeme.is_empty() => format!(" at '{lexeme}'"),
        _ => String::new(),
    }
}

/// Writes one `[line N] Error at 'x': message` line per error.
#[derive(Debug)]
pub struct LineReporter<W> {
    writer: W,
}

impl<W: Write> LineReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for LineReporter<W> {
    fn report_error(&mut self, line: usize, context: &str, message: &str) {
        if let Err(error) = writeln!(self.writer, "[line {line}] Error{context}: {message}") {
            tracing::debug!(%error, "unable to write diagnostic");
        }
    }
}

/// Renders errors as annotated source snippets.
pub struct CodespanReporter<W> {
    writer: W,
    config: term::Config,
}

impl<W: WriteColor> CodespanReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, config: term::Config::default() }
    }
}

impl<W: WriteColor> Reporter for CodespanReporter<W> {
    fn report_error(&mut self, line: usize, context: &str, message: &str) {
        if let Err(error) = writeln!(self.writer, "[line {line}] Error{context}: {message}") {
            tracing::debug!(%error, "unable to write diagnostic");
        }
    }

    fn report(&mut self, file: &SourceFile, error: &ErrorS) {
        let diagnostic = error.0.as_diagnostic(&error.1);
        if term::emit(&mut self.writer, &self.config, file, &diagnostic).is_err() {
            let line = file.line_index((), error.1.start).map_or(1, |idx| idx + 1);
            self.report_error(line, &context(file.source(), &error.1), &error.0.to_string());
        }
    }
}

/// Per-run error state. Tracks whether a static problem (syntax or
/// resolution) or a fatal runtime error has been reported, so the driver can
/// tell the two apart.
pub struct Diagnostics<'src, R> {
    file: SourceFile<'src>,
    reporter: R,
    had_error: bool,
    had_runtime_error: bool,
}

impl<'src, R: Reporter> Diagnostics<'src, R> {
    pub fn new(name: &'src str, source: &'src str, reporter: R) -> Self {
        Self {
            file: SimpleFile::new(name, source),
            reporter,
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn report(&mut self, error: &ErrorS) {
        match error.0.kind() {
            ErrorKind::Static => self.had_error = true,
            ErrorKind::Runtime => self.had_runtime_error = true,
        }
        self.reporter.report(&self.file, error);
    }

    pub fn report_all<'a>(&mut self, errors: impl IntoIterator<Item = &'a ErrorS>) {
        for error in errors {
            self.report(error);
        }
    }

    /// Whether a syntax or resolution error has been reported.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Whether an uncaught runtime error has been reported.
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, NameError, TypeError};

    use pretty_assertions::assert_eq;

    #[test]
    fn line_and_context_come_from_span() {
        let source = "var a = 1;\nprint b;\n";
        let mut diagnostics = Diagnostics::new("<script>", source, LineReporter::new(Vec::new()));
        diagnostics.report(&(Error::NameError(NameError::NotDefined { name: "b".to_string() }), 17..18));

        let got = String::from_utf8(diagnostics.into_reporter().into_inner()).unwrap();
        assert_eq!(got, "[line 2] Error at 'b': NameError: name \"b\" is not defined\n");
    }

    #[test]
    fn flags_track_error_kind() {
        let source = "f(1);";
        let mut lines = Vec::new();
        let mut diagnostics =
            Diagnostics::new("<script>", source, |line: usize, _: &str, message: &str| {
                lines.push(format!("{line}: {message}"));
            });
        diagnostics.report(&(
            Error::TypeError(TypeError::NotCallable { type_: "number".to_string() }),
            0..1,
        ));
        assert!(!diagnostics.had_error());
        assert!(diagnostics.had_runtime_error());

        diagnostics.report(&(Error::NameError(NameError::AlreadyDefined { name: "f".to_string() }), 0..1));
        assert!(diagnostics.had_error());
        drop(diagnostics);
        assert_eq!(lines.len(), 2);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_still_records_error() {
        let mut diagnostics = Diagnostics::new("<script>", "x;", LineReporter::new(BrokenPipe));
        diagnostics.report(&(Error::NameError(NameError::NotDefined { name: "x".to_string() }), 0..1));
        assert!(diagnostics.had_runtime_error());
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn context_at_end_of_input() {
        assert_eq!(context("print", &(5..5)), " at end");
        assert_eq!(context("print", &(0..5)), " at 'print'");
    }
}
