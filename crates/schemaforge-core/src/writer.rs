//! Indentation-aware text buffer for emitted source.

const INDENT: &str = "  ";

#[derive(Debug, Default)]
pub struct SourceWriter {
    buf: String,
    depth: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current indentation. Empty input writes a
    /// blank line without trailing whitespace.
    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    /// Write several lines, e.g. a multi-line decoration.
    pub fn lines(&mut self, text: &str) {
        for l in text.lines() {
            self.line(l);
        }
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// `header {` and indent.
    pub fn open(&mut self, header: &str) {
        self.line(&format!("{header} {{"));
        self.depth += 1;
    }

    /// Dedent and `}`.
    pub fn close(&mut self) {
        self.close_with("}");
    }

    /// Dedent and write a custom closing line such as `});`.
    pub fn close_with(&mut self, closing: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(closing);
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// `/** ... */` block for a description.
    pub fn doc_comment(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.line("/**");
        for l in text.lines() {
            let l = l.trim_end().replace("*/", "*\\/");
            if l.is_empty() {
                self.line(" *");
            } else {
                self.line(&format!(" * {l}"));
            }
        }
        self.line(" */");
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Line comments for a file header. Lines that already are comments are
/// kept as written.
pub fn comment_block(text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*') {
            out.push_str(line);
        } else if trimmed.is_empty() {
            out.push_str("//");
        } else {
            out.push_str("// ");
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
