//! Scanner (lexical analysis) for C- source code
//!
//! Converts raw source text into a stream of classified [`Word`]s, pulled one
//! at a time through the [`TokenStream`] trait. Words carry only a category and
//! a byte span; the text of identifiers and numbers is recovered from the
//! source when needed.
//!
//! The scanner never fails. Malformed input is reported to the diagnostic sink
//! and skipped, and once the input is exhausted every further call yields an
//! [`Category::Eof`] word.

use crate::diagnostics::{Diag, Diagnostic, DiagnosticSink};
use crate::source::Span;
use std::fmt;

/// Lexical class of a [`Word`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Identifier,
    Number,

    // Keywords
    Else,
    If,
    Int,
    Return,
    Void,
    While,

    // Operators
    Plus,         // +
    Minus,        // -
    Multiply,     // *
    Divide,       // /
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
    Equal,        // ==
    NotEqual,     // !=
    Assign,       // =

    // Punctuation
    Semicolon,    // ;
    Comma,        // ,
    OpenParen,    // (
    CloseParen,   // )
    OpenBracket,  // [
    CloseBracket, // ]
    OpenCurly,    // {
    CloseCurly,   // }

    Eof,
}

impl Category {
    /// Coarse group used by the token listing: `ID`, `NUM`, `KEY` or `SYM`.
    pub fn group(self) -> &'static str {
        match self {
            Category::Identifier => "ID",
            Category::Number => "NUM",
            Category::Else
            | Category::If
            | Category::Int
            | Category::Return
            | Category::Void
            | Category::While => "KEY",
            Category::Eof => "EOF",
            _ => "SYM",
        }
    }

    fn keyword(text: &str) -> Option<Category> {
        match text {
            "else" => Some(Category::Else),
            "if" => Some(Category::If),
            "int" => Some(Category::Int),
            "return" => Some(Category::Return),
            "void" => Some(Category::Void),
            "while" => Some(Category::While),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Category::Identifier => "identifier",
            Category::Number => "number",
            Category::Else => "'else'",
            Category::If => "'if'",
            Category::Int => "'int'",
            Category::Return => "'return'",
            Category::Void => "'void'",
            Category::While => "'while'",
            Category::Plus => "'+'",
            Category::Minus => "'-'",
            Category::Multiply => "'*'",
            Category::Divide => "'/'",
            Category::Less => "'<'",
            Category::LessEqual => "'<='",
            Category::Greater => "'>'",
            Category::GreaterEqual => "'>='",
            Category::Equal => "'=='",
            Category::NotEqual => "'!='",
            Category::Assign => "'='",
            Category::Semicolon => "';'",
            Category::Comma => "','",
            Category::OpenParen => "'('",
            Category::CloseParen => "')'",
            Category::OpenBracket => "'['",
            Category::CloseBracket => "']'",
            Category::OpenCurly => "'{'",
            Category::CloseCurly => "'}'",
            Category::Eof => "end of file",
        };
        f.write_str(text)
    }
}

/// A classified word: category plus the source range it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word {
    pub category: Category,
    pub span: Span,
}

impl Word {
    pub fn new(category: Category, span: Span) -> Self {
        Word { category, span }
    }

    /// Byte offset where this word starts.
    pub fn location(&self) -> usize {
        self.span.start
    }

    pub fn is(&self, category: Category) -> bool {
        self.category == category
    }

    pub fn is_any_of(&self, categories: &[Category]) -> bool {
        categories.contains(&self.category)
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.span.text(source)
    }
}

/// Pull source of words consumed by the parser.
///
/// Once the end of input is reached, implementations keep returning
/// [`Category::Eof`] words.
pub trait TokenStream {
    fn next_word(&mut self) -> Word;
}

/// Scanner over an in-memory source text.
pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    position: usize,
    diagnostics: &'a dyn DiagnosticSink,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, diagnostics: &'a dyn DiagnosticSink) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            position: 0,
            diagnostics,
        }
    }

    /// Scan the whole input, excluding the final `Eof` word.
    pub fn tokenize(&mut self) -> Vec<Word> {
        let mut words = Vec::new();
        loop {
            let word = self.next_word();
            if word.is(Category::Eof) {
                return words;
            }
            words.push(word);
        }
    }

    fn scan(&mut self) -> Word {
        loop {
            if !self.skip_whitespace_and_comments() {
                return self.eof();
            }

            let start = self.position;
            let Some(ch) = self.advance() else {
                return self.eof();
            };

            let category = match ch {
                b'0'..=b'9' => return self.number(start),
                b'a'..=b'z' | b'A'..=b'Z' => return self.identifier_or_keyword(start),

                b'+' => Category::Plus,
                b'-' => Category::Minus,
                b'*' => Category::Multiply,
                b'/' => Category::Divide,
                b'<' => self.with_equal(Category::LessEqual, Category::Less),
                b'>' => self.with_equal(Category::GreaterEqual, Category::Greater),
                b'=' => self.with_equal(Category::Equal, Category::Assign),
                b'!' if self.peek() == Some(b'=') => {
                    self.advance();
                    Category::NotEqual
                }
                b';' => Category::Semicolon,
                b',' => Category::Comma,
                b'(' => Category::OpenParen,
                b')' => Category::CloseParen,
                b'[' => Category::OpenBracket,
                b']' => Category::CloseBracket,
                b'{' => Category::OpenCurly,
                b'}' => Category::CloseCurly,

                _ => {
                    self.bad_char(start);
                    continue;
                }
            };

            return Word::new(category, Span::new(start, self.position));
        }
    }

    /// `NUM ::= digit digit*`. A digit run glued to letters (`12ab`) is a bad
    /// number; the whole run is reported and the digits alone are returned.
    fn number(&mut self, start: usize) -> Word {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.advance();
        }
        let digits_end = self.position;

        if matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
                self.advance();
            }
            let run = Span::new(start, self.position);
            self.diagnostics.report(
                Diagnostic::new(start, Diag::LexerBadNumber)
                    .arg(run.text(self.source))
                    .range(run),
            );
        }

        Word::new(Category::Number, Span::new(start, digits_end))
    }

    /// `ID ::= letter (letter | digit)*`, then keyword lookup.
    fn identifier_or_keyword(&mut self, start: usize) -> Word {
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            self.advance();
        }
        let span = Span::new(start, self.position);
        let category = Category::keyword(span.text(self.source)).unwrap_or(Category::Identifier);
        Word::new(category, span)
    }

    fn with_equal(&mut self, with: Category, without: Category) -> Category {
        if self.peek() == Some(b'=') {
            self.advance();
            with
        } else {
            without
        }
    }

    fn bad_char(&mut self, start: usize) {
        // Skip the rest of a multi-byte character as a unit.
        while self.position < self.bytes.len() && !self.source.is_char_boundary(self.position) {
            self.position += 1;
        }
        let span = Span::new(start, self.position);
        self.diagnostics.report(
            Diagnostic::new(start, Diag::LexerBadChar)
                .arg(span.text(self.source))
                .range(span),
        );
    }

    /// Skip whitespace and `/* ... */` comments. Returns `false` when an
    /// unterminated comment swallowed the rest of the input.
    fn skip_whitespace_and_comments(&mut self) -> bool {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | b'\x0b' | b'\x0c') => {
                    self.advance();
                }
                Some(b'/') if self.peek_ahead(1) == Some(b'*') => {
                    if !self.skip_block_comment() {
                        return false;
                    }
                }
                _ => return true,
            }
        }
    }

    fn skip_block_comment(&mut self) -> bool {
        let start = self.position;
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some(b'*') && self.peek_ahead(1) == Some(b'/') {
                self.advance();
                self.advance();
                return true;
            }
            self.advance();
        }

        self.diagnostics.report(
            Diagnostic::new(start, Diag::LexerUnterminatedComment).range(Span::new(start, start + 2)),
        );
        false
    }

    fn eof(&self) -> Word {
        let end = self.bytes.len();
        Word::new(Category::Eof, Span::new(end, end))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.bytes.len()
    }
}

impl TokenStream for Scanner<'_> {
    fn next_word(&mut self) -> Word {
        self.scan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticBuffer;

    fn categories(source: &str) -> Vec<Category> {
        let diags = DiagnosticBuffer::new();
        let mut scanner = Scanner::new(source, &diags);
        scanner.tokenize().iter().map(|w| w.category).collect()
    }

    #[test]
    fn test_simple_tokens() {
        use Category::*;
        assert_eq!(
            categories("void main(void) { return; }"),
            vec![Void, Identifier, OpenParen, Void, CloseParen, OpenCurly, Return, Semicolon, CloseCurly]
        );
    }

    #[test]
    fn test_operators() {
        use Category::*;
        assert_eq!(
            categories("+ - * / < <= > >= == != = ; , ( ) [ ] { }"),
            vec![
                Plus, Minus, Multiply, Divide, Less, LessEqual, Greater, GreaterEqual, Equal,
                NotEqual, Assign, Semicolon, Comma, OpenParen, CloseParen, OpenBracket,
                CloseBracket, OpenCurly, CloseCurly
            ]
        );
    }

    #[test]
    fn test_spans_and_text() {
        let diags = DiagnosticBuffer::new();
        let source = "int count1 = 42;";
        let mut scanner = Scanner::new(source, &diags);
        let words = scanner.tokenize();

        assert_eq!(words[1].category, Category::Identifier);
        assert_eq!(words[1].text(source), "count1");
        assert_eq!(words[3].category, Category::Number);
        assert_eq!(words[3].text(source), "42");
        assert_eq!(words[3].span, Span::new(13, 15));
    }

    #[test]
    fn test_comments() {
        use Category::*;
        assert_eq!(
            categories("int x; /* block\ncomment */ int y;"),
            vec![Int, Identifier, Semicolon, Int, Identifier, Semicolon]
        );
    }

    #[test]
    fn test_eof_repeats() {
        let diags = DiagnosticBuffer::new();
        let mut scanner = Scanner::new("x", &diags);
        assert_eq!(scanner.next_word().category, Category::Identifier);
        for _ in 0..3 {
            let word = scanner.next_word();
            assert_eq!(word.category, Category::Eof);
            assert_eq!(word.span, Span::new(1, 1));
        }
    }

    #[test]
    fn test_bad_number_reports_and_keeps_digits() {
        let diags = DiagnosticBuffer::new();
        let source = "x = 12ab;";
        let mut scanner = Scanner::new(source, &diags);
        let words = scanner.tokenize();

        assert_eq!(words[2].category, Category::Number);
        assert_eq!(words[2].text(source), "12");
        assert_eq!(words[3].category, Category::Semicolon);
        assert_eq!(diags.kinds(), vec![Diag::LexerBadNumber]);
    }

    #[test]
    fn test_bad_char_is_skipped() {
        use Category::*;
        let diags = DiagnosticBuffer::new();
        let mut scanner = Scanner::new("a @ ! b", &diags);
        let cats: Vec<_> = scanner.tokenize().iter().map(|w| w.category).collect();

        assert_eq!(cats, vec![Identifier, Identifier]);
        assert_eq!(diags.kinds(), vec![Diag::LexerBadChar, Diag::LexerBadChar]);
    }

    #[test]
    fn test_unterminated_comment() {
        let diags = DiagnosticBuffer::new();
        let mut scanner = Scanner::new("int /* never closed", &diags);
        let words = scanner.tokenize();

        assert_eq!(words.len(), 1);
        assert_eq!(diags.kinds(), vec![Diag::LexerUnterminatedComment]);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        use Category::*;
        assert_eq!(categories("integer iff voids"), vec![Identifier, Identifier, Identifier]);
    }

    #[test]
    fn test_category_groups() {
        assert_eq!(Category::Identifier.group(), "ID");
        assert_eq!(Category::Number.group(), "NUM");
        assert_eq!(Category::While.group(), "KEY");
        assert_eq!(Category::LessEqual.group(), "SYM");
    }
}
