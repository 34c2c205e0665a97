//! C++ code emitter - a text buffer with indentation tracking
//!
//! Every output stream (declarations, definitions, method bodies) is built with one [`CppEmitter`].

use std::fmt::Write;

/// A buffer for building C++ source with consistent indentation.
#[derive(Debug, Clone)]
pub struct CppEmitter {
    buffer: String,
    indent_level: usize,
    indent_str: String,
}

impl Default for CppEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl CppEmitter {
    pub fn new() -> Self {
        Self::with_indent(4)
    }

    /// Create an emitter indenting with `width` spaces per level.
    pub fn with_indent(width: usize) -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
            indent_str: " ".repeat(width),
        }
    }

    /// Get the generated code
    pub fn finish(self) -> String {
        self.buffer
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Write a line with current indentation
    pub fn line(&mut self, s: &str) {
        self.write_indent();
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write several lines, each at the current indentation. Embedded newlines start new lines.
    pub fn lines(&mut self, text: &str) {
        for l in text.lines() {
            if l.is_empty() {
                self.blank_line();
            } else {
                self.line(l);
            }
        }
    }

    /// Write text without newline
    pub fn write(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    /// Write formatted text
    pub fn writef(&mut self, args: std::fmt::Arguments<'_>) {
        let _ = self.buffer.write_fmt(args);
    }

    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    /// Write indentation only
    pub fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(&self.indent_str);
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    /// Write `header`, then a brace block on its own lines (C++ brace style).
    pub fn block<F>(&mut self, header: &str, f: F)
    where
        F: FnOnce(&mut Self),
    {
        if !header.is_empty() {
            self.line(header);
        }
        self.line("{");
        self.indent();
        f(self);
        self.dedent();
        self.line("}");
    }

    /// Like [`CppEmitter::block`] but closes with `};` (class bodies).
    pub fn class_block<F>(&mut self, header: &str, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.line(header);
        self.line("{");
        self.indent();
        f(self);
        self.dedent();
        self.line("};");
    }

    /// Append another emitter's output, re-indented to the current level.
    pub fn append(&mut self, other: &CppEmitter) {
        self.lines(other.as_str());
    }

    /// A fresh emitter with the same indent width, starting at level 0.
    pub fn sibling(&self) -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
            indent_str: self.indent_str.clone(),
        }
    }
}
