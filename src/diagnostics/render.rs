//! Terminal rendering of diagnostics
//!
//! Produces clang-style output:
//!
//! ```text
//! prog.c:3:9: error: redefinition of 'x'
//!     int x;
//!         ^
//! ```
//!
//! Colour is applied with `crossterm` styling when requested.

use super::Diagnostic;
use crate::source::SourceFile;
use crossterm::style::{Color, Stylize};
use std::fmt::Write;

pub struct Theme {
    pub error: Color,
    pub location: Color,
    pub message: Color,
    pub caret: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    error: Color::Rgb {
        r: 243,
        g: 139,
        b: 168,
    },
    location: Color::Rgb {
        r: 205,
        g: 214,
        b: 244,
    },
    message: Color::Rgb {
        r: 249,
        g: 226,
        b: 175,
    },
    caret: Color::Rgb {
        r: 166,
        g: 227,
        b: 161,
    },
};

/// Render one diagnostic, including the offending source line and a caret
/// line under the primary range.
pub fn render(file: &SourceFile, diag: &Diagnostic, color: bool) -> String {
    let loc = file.location(diag.location);
    let header_loc = format!("{}:{}:", file.name(), loc);
    let message = diag.message();
    let line = file.line_text(loc.line);
    let marker = caret_line(file, diag, line);

    let mut out = String::new();
    if color {
        let theme = &DEFAULT_THEME;
        let _ = writeln!(
            out,
            "{} {} {}",
            header_loc.with(theme.location).bold(),
            "error:".with(theme.error).bold(),
            message.with(theme.message).bold()
        );
        let _ = writeln!(out, "{}", line);
        let _ = write!(out, "{}", marker.with(theme.caret).bold());
    } else {
        let _ = writeln!(out, "{} error: {}", header_loc, message);
        let _ = writeln!(out, "{}", line);
        let _ = write!(out, "{}", marker);
    }
    out
}

/// `    ^~~~` under the primary range, clipped to the end of the line.
fn caret_line(file: &SourceFile, diag: &Diagnostic, line: &str) -> String {
    let loc = file.location(diag.location);
    let column = loc.column - 1;
    let width = diag
        .ranges
        .first()
        .filter(|range| range.start == diag.location)
        .map(|range| range.len())
        .unwrap_or(1)
        .max(1);
    let available = line.len().saturating_sub(column).max(1);

    let mut marker: String = line
        .get(..column)
        .unwrap_or(line)
        .chars()
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    marker.push('^');
    for _ in 1..width.min(available) {
        marker.push('~');
    }
    marker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diag;
    use crate::source::Span;

    #[test]
    fn test_render_plain() {
        let file = SourceFile::new("prog.c", "int x;\nint x;\n");
        let diag = Diagnostic::new(11, Diag::SemaRedefinition)
            .arg("x")
            .range(Span::new(11, 12));
        let text = render(&file, &diag, false);
        assert_eq!(
            text,
            "prog.c:2:5: error: redefinition of 'x'\nint x;\n    ^"
        );
    }

    #[test]
    fn test_render_caret_after_multibyte_text() {
        // `é` is two bytes wide but one column on screen
        let file = SourceFile::new("prog.c", "/* é */ @");
        let diag = Diagnostic::new(9, Diag::LexerBadChar).arg("@");
        let text = render(&file, &diag, false);
        assert!(text.ends_with("\n/* é */ @\n        ^"), "{:?}", text);
    }

    #[test]
    fn test_render_range_underline() {
        let file = SourceFile::new("prog.c", "  x = 99999999999;");
        let diag = Diagnostic::new(6, Diag::ParserNumberTooBig)
            .arg("99999999999")
            .range(Span::new(6, 17));
        let text = render(&file, &diag, false);
        assert!(text.ends_with("      ^~~~~~~~~~~"));
    }

    #[test]
    fn test_render_color_contains_escape_codes() {
        let file = SourceFile::new("prog.c", "int x;");
        let diag = Diagnostic::new(0, Diag::SemaLastDeclNotMain);
        let text = render(&file, &diag, true);
        assert!(text.contains('\u{1b}'));
        assert!(text.contains("last declaration must be"));
    }
}
