//! Compiler diagnostics
//!
//! The scanner, parser and analyzer never fail on a language error; they
//! *report* a [`Diagnostic`] to a [`DiagnosticSink`] and carry on. What happens
//! to the record afterwards (counting, printing, collecting for a test) is up
//! to the sink:
//!
//! - [`DiagnosticManager`]: a chain of handlers, the newest installed first
//! - [`DiagnosticBuffer`]: collects every record in order
//!
//! Sinks take `&self` so a single sink can be shared by every stage of one
//! compilation.
//!
//! Every [`Diag`] kind is an error; severity is implied by the kind.

pub mod render;

use crate::parser::lexer::Category;
use crate::source::Span;
use std::cell::{Cell, RefCell};
use std::fmt;

/// Diagnostic kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Diag {
    LexerBadNumber,
    LexerBadChar,
    LexerUnterminatedComment,

    ParserExpectedToken,
    ParserExpectedType,
    ParserExpectedExpression,
    ParserExpectedStatement,
    ParserNumberTooBig,

    SemaRedefinition,
    SemaUndeclaredIdentifier,
    SemaNotAVariable,
    SemaNotAFunction,
    SemaVarDeclaredVoid,
    SemaParamDeclaredVoid,
    SemaNotAnArray,
    SemaIndexNotInt,
    SemaOperandNotInt,
    SemaConditionNotInt,
    SemaArrayStatement,
    SemaVoidFunReturnsValue,
    SemaFunMustReturnValue,
    SemaIncompatibleReturnType,
    SemaTooFewArgs,
    SemaTooManyArgs,
    SemaVoidArgument,
    SemaArgTypeMismatch,
    SemaLastDeclNotMain,
    SemaMainHasParams,
}

impl Diag {
    /// Message template; `%N` is replaced by the N-th argument.
    pub fn template(self) -> &'static str {
        match self {
            Diag::LexerBadNumber => "invalid numeric literal '%0'",
            Diag::LexerBadChar => "unexpected character '%0'",
            Diag::LexerUnterminatedComment => "unterminated comment",

            Diag::ParserExpectedToken => "expected %0, found %1",
            Diag::ParserExpectedType => "expected type specifier, found %0",
            Diag::ParserExpectedExpression => "expected expression, found %0",
            Diag::ParserExpectedStatement => "expected statement, found %0",
            Diag::ParserNumberTooBig => "integer literal '%0' is too large",

            Diag::SemaRedefinition => "redefinition of '%0'",
            Diag::SemaUndeclaredIdentifier => "use of undeclared identifier '%0'",
            Diag::SemaNotAVariable => "'%0' is a function, not a variable",
            Diag::SemaNotAFunction => "called object '%0' is not a function",
            Diag::SemaVarDeclaredVoid => "variable '%0' declared void",
            Diag::SemaParamDeclaredVoid => "parameter '%0' declared void",
            Diag::SemaNotAnArray => "subscripted value '%0' is not an array",
            Diag::SemaIndexNotInt => "array subscript has type '%0', expected 'int'",
            Diag::SemaOperandNotInt => "invalid operand of type '%0' to binary '%1'",
            Diag::SemaConditionNotInt => "condition has type '%0', expected 'int'",
            Diag::SemaArrayStatement => "array expression used as a statement",
            Diag::SemaVoidFunReturnsValue => "void function '%0' should not return a value",
            Diag::SemaFunMustReturnValue => "non-void function '%0' should return a value",
            Diag::SemaIncompatibleReturnType => {
                "returning '%0' from a function with incompatible result type 'int'"
            }
            Diag::SemaTooFewArgs => {
                "too few arguments to function call, expected %0, have %1"
            }
            Diag::SemaTooManyArgs => {
                "too many arguments to function call, expected %0, have %1"
            }
            Diag::SemaVoidArgument => "argument %0 has type 'void'",
            Diag::SemaArgTypeMismatch => "argument %0 has type '%1', parameter expects '%2'",
            Diag::SemaLastDeclNotMain => "last declaration must be 'void main(void)'",
            Diag::SemaMainHasParams => "'main' must not take any parameters",
        }
    }
}

/// Typed argument for message interpolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagArg {
    Int(i64),
    Str(String),
    Category(Category),
}

impl fmt::Display for DiagArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagArg::Int(n) => write!(f, "{}", n),
            DiagArg::Str(s) => f.write_str(s),
            DiagArg::Category(c) => write!(f, "{}", c),
        }
    }
}

impl From<i64> for DiagArg {
    fn from(n: i64) -> Self {
        DiagArg::Int(n)
    }
}

impl From<usize> for DiagArg {
    fn from(n: usize) -> Self {
        DiagArg::Int(n as i64)
    }
}

impl From<&str> for DiagArg {
    fn from(s: &str) -> Self {
        DiagArg::Str(s.to_string())
    }
}

impl From<String> for DiagArg {
    fn from(s: String) -> Self {
        DiagArg::Str(s)
    }
}

impl From<Category> for DiagArg {
    fn from(c: Category) -> Self {
        DiagArg::Category(c)
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Byte offset the diagnostic points at.
    pub location: usize,
    pub kind: Diag,
    pub args: Vec<DiagArg>,
    /// Highlighted ranges; the first one is the primary range.
    pub ranges: Vec<Span>,
}

impl Diagnostic {
    pub fn new(location: usize, kind: Diag) -> Self {
        Diagnostic {
            location,
            kind,
            args: Vec::new(),
            ranges: Vec::new(),
        }
    }

    /// Appends an argument for replacement during message formatting.
    pub fn arg(mut self, arg: impl Into<DiagArg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a range to be highlighted.
    pub fn range(mut self, span: Span) -> Self {
        self.ranges.push(span);
        self
    }

    /// The interpolated message.
    pub fn message(&self) -> String {
        let template = self.kind.template();
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                out.push(ch);
                continue;
            }
            match chars.peek().and_then(|c| c.to_digit(10)) {
                Some(index) => {
                    chars.next();
                    match self.args.get(index as usize) {
                        Some(arg) => out.push_str(&arg.to_string()),
                        None => out.push_str("<?>"),
                    }
                }
                None => out.push('%'),
            }
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Receiver of diagnostics. Reporting is fire-and-forget.
pub trait DiagnosticSink {
    fn report(&self, diag: Diagnostic);
}

type Handler<'h> = Box<dyn FnMut(&Diagnostic) -> bool + 'h>;

/// Sink that forwards each diagnostic through a chain of handlers.
#[derive(Default)]
pub struct DiagnosticManager<'h> {
    handler: RefCell<Option<Handler<'h>>>,
    reported: Cell<usize>,
}

impl<'h> DiagnosticManager<'h> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a handler in front of the current one.
    ///
    /// The new handler sees every diagnostic first. If it returns `true` the
    /// previously installed handler is called as well.
    pub fn handler(&self, mut handler: impl FnMut(&Diagnostic) -> bool + 'h) {
        let previous = self.handler.borrow_mut().take();
        let chained: Handler<'h> = match previous {
            Some(mut previous) => {
                Box::new(move |diag: &Diagnostic| handler(diag) && previous(diag))
            }
            None => Box::new(move |diag: &Diagnostic| handler(diag)),
        };
        *self.handler.borrow_mut() = Some(chained);
    }

    /// Number of diagnostics reported so far.
    pub fn reported(&self) -> usize {
        self.reported.get()
    }

    pub fn has_errors(&self) -> bool {
        self.reported() > 0
    }
}

impl DiagnosticSink for DiagnosticManager<'_> {
    fn report(&self, diag: Diagnostic) {
        tracing::debug!(kind = ?diag.kind, location = diag.location, "diagnostic reported");
        self.reported.set(self.reported.get() + 1);
        // A handler must not report through the same manager.
        if let Some(handler) = self.handler.borrow_mut().as_mut() {
            handler(&diag);
        }
    }
}

/// Sink that keeps every diagnostic, in report order.
#[derive(Debug, Default)]
pub struct DiagnosticBuffer {
    diags: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.diags.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diags.borrow().is_empty()
    }

    /// Kinds of the collected diagnostics, in report order.
    pub fn kinds(&self) -> Vec<Diag> {
        self.diags.borrow().iter().map(|d| d.kind).collect()
    }

    pub fn count(&self, kind: Diag) -> usize {
        self.diags.borrow().iter().filter(|d| d.kind == kind).count()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diags.borrow_mut())
    }
}

impl DiagnosticSink for DiagnosticBuffer {
    fn report(&self, diag: Diagnostic) {
        tracing::debug!(kind = ?diag.kind, location = diag.location, "diagnostic reported");
        self.diags.borrow_mut().push(diag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_message_interpolation() {
        let diag = Diagnostic::new(0, Diag::SemaTooFewArgs).arg(2usize).arg(1usize);
        assert_eq!(
            diag.message(),
            "too few arguments to function call, expected 2, have 1"
        );

        let diag = Diagnostic::new(0, Diag::ParserExpectedToken)
            .arg(Category::Semicolon)
            .arg(Category::CloseCurly);
        assert_eq!(diag.message(), "expected ';', found '}'");
    }

    #[test]
    fn test_missing_argument_placeholder() {
        let diag = Diagnostic::new(0, Diag::SemaRedefinition);
        assert_eq!(diag.message(), "redefinition of '<?>'");
    }

    #[test]
    fn test_handler_chain() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let manager = DiagnosticManager::new();

        let first = Rc::clone(&order);
        manager.handler(move |_| {
            first.borrow_mut().push("first");
            true
        });
        let second = Rc::clone(&order);
        manager.handler(move |diag| {
            second.borrow_mut().push("second");
            diag.kind != Diag::LexerBadChar
        });

        manager.report(Diagnostic::new(0, Diag::LexerBadNumber));
        manager.report(Diagnostic::new(0, Diag::LexerBadChar));

        assert_eq!(*order.borrow(), vec!["second", "first", "second"]);
        assert_eq!(manager.reported(), 2);
        assert!(manager.has_errors());
    }

    #[test]
    fn test_manager_without_handler_counts() {
        let manager = DiagnosticManager::new();
        manager.report(Diagnostic::new(3, Diag::SemaArrayStatement));
        assert_eq!(manager.reported(), 1);
    }

    #[test]
    fn test_buffer_collects_in_order() {
        let buffer = DiagnosticBuffer::new();
        buffer.report(Diagnostic::new(1, Diag::SemaRedefinition));
        buffer.report(Diagnostic::new(2, Diag::SemaNotAnArray));
        assert_eq!(
            buffer.kinds(),
            vec![Diag::SemaRedefinition, Diag::SemaNotAnArray]
        );
        assert_eq!(buffer.count(Diag::SemaNotAnArray), 1);
        assert_eq!(buffer.take().len(), 2);
        assert!(buffer.is_empty());
    }
}
