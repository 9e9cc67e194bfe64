//! Splits a script into the batches that are sent to the engine one at a time.
//!
//! This is not a SQL parser. A small scanner tracks whether the current
//! position is plain text, a `--` comment, a `/* */` comment or a quoted
//! literal/identifier, which is all it takes to tell a real separator from
//! one that only looks like it.

use regex::Regex;

/// How a dialect marks batch boundaries.
#[derive(Debug, Clone)]
pub enum Separator {
    /// A token that must sit alone on its own line, e.g. `GO`. The regex is
    /// matched against the whole line without its line break.
    Line(Regex),
    /// A single character ending a statement, e.g. `;`. The character itself
    /// is dropped from the output.
    Terminator(char),
    /// No batching: the script is sent as-is.
    None,
}

impl Separator {
    /// Case-insensitive line token with optional surrounding spaces/tabs.
    pub fn line_token(token: &str) -> Result<Self, regex::Error> {
        let pattern = format!(r"(?i)^[ \t\f\v]*{}[ \t\f\v]*$", regex::escape(token));
        Ok(Separator::Line(Regex::new(&pattern)?))
    }

    /// The textual form of the separator, for diagnostics.
    pub fn pattern(&self) -> Option<String> {
        match self {
            Separator::Line(re) => Some(re.as_str().to_string()),
            Separator::Terminator(c) => Some(c.to_string()),
            Separator::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    LineComment,
    BlockComment(u32),
    /// Inside a quoted span; holds the closing character.
    Quoted(char),
}

#[derive(Debug, Clone)]
pub struct Splitter {
    separator: Separator,
    nested_block_comments: bool,
}

impl Splitter {
    pub fn new(separator: Separator) -> Self {
        Splitter { separator, nested_block_comments: false }
    }

    /// T-SQL allows `/* /* */ */`; most other engines end the comment at
    /// the first `*/`.
    pub fn with_nested_block_comments(mut self, nested: bool) -> Self {
        self.nested_block_comments = nested;
        self
    }

    pub fn separator(&self) -> &Separator {
        &self.separator
    }

    /// Ordered, non-empty, trimmed batches.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut batches = Vec::new();
        match &self.separator {
            Separator::None => push_batch(&mut batches, text),
            Separator::Line(re) => {
                let mut current = String::new();
                let mut state = State::Normal;
                for line in text.split_inclusive('\n') {
                    if state == State::Normal && re.is_match(strip_line_break(line)) {
                        push_batch(&mut batches, &current);
                        current.clear();
                        continue;
                    }
                    state = self.advance(state, line, None, |_| {});
                    current.push_str(line);
                }
                push_batch(&mut batches, &current);
            }
            Separator::Terminator(t) => {
                let mut start = 0;
                self.advance(State::Normal, text, Some(*t), |at| {
                    push_batch(&mut batches, &text[start..at]);
                    start = at + t.len_utf8();
                });
                push_batch(&mut batches, &text[start..]);
            }
        }
        batches
    }

    /// True when `text` holds at least one real separator.
    pub fn has_separator(&self, text: &str) -> bool {
        match &self.separator {
            Separator::None => false,
            Separator::Line(re) => {
                let mut state = State::Normal;
                for line in text.split_inclusive('\n') {
                    if state == State::Normal && re.is_match(strip_line_break(line)) {
                        return true;
                    }
                    state = self.advance(state, line, None, |_| {});
                }
                false
            }
            Separator::Terminator(t) => {
                let mut found = false;
                self.advance(State::Normal, text, Some(*t), |_| found = true);
                found
            }
        }
    }

    /// Walks `text` from `state`, reporting byte offsets of `terminator`
    /// seen in plain text, and returns the state at the end.
    fn advance(&self, mut state: State, text: &str, terminator: Option<char>, mut on_terminator: impl FnMut(usize)) -> State {
        let mut chars = text.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            let next = chars.peek().map(|&(_, n)| n);
            state = match state {
                State::Normal => match (c, next) {
                    ('-', Some('-')) => {
                        chars.next();
                        State::LineComment
                    }
                    ('/', Some('*')) => {
                        chars.next();
                        State::BlockComment(1)
                    }
                    ('\'', _) => State::Quoted('\''),
                    ('"', _) => State::Quoted('"'),
                    ('[', _) => State::Quoted(']'),
                    _ => {
                        if Some(c) == terminator {
                            on_terminator(i);
                        }
                        State::Normal
                    }
                },
                State::LineComment => {
                    if c == '\n' {
                        State::Normal
                    } else {
                        State::LineComment
                    }
                }
                State::BlockComment(depth) => match (c, next) {
                    ('*', Some('/')) => {
                        chars.next();
                        if depth <= 1 {
                            State::Normal
                        } else {
                            State::BlockComment(depth - 1)
                        }
                    }
                    ('/', Some('*')) if self.nested_block_comments => {
                        chars.next();
                        State::BlockComment(depth + 1)
                    }
                    _ => State::BlockComment(depth),
                },
                // A doubled quote closes and immediately reopens, which is
                // exactly the escape rule.
                State::Quoted(close) => {
                    if c == close {
                        State::Normal
                    } else {
                        State::Quoted(close)
                    }
                }
            };
        }
        state
    }
}

fn strip_line_break(line: &str) -> &str {
    line.trim_end_matches(|c| c == '\n' || c == '\r')
}

fn push_batch(batches: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        batches.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYMBOLS: &str = "`~!@#$%^&*()-_+=,.;:'\"[]\\/?<>";
    const WORDS: &str = "abcdefghijklmnopqrstuvwzyz0123456789 ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    fn go() -> Splitter {
        Splitter::new(Separator::line_token("GO").unwrap()).with_nested_block_comments(true)
    }

    #[test]
    fn splits_on_go_with_space() {
        assert!(go().has_separator(" GO "));
        assert_eq!(go().split("SELECT 1\n GO \nSELECT 2"), vec!["SELECT 1", "SELECT 2"]);
        assert!(go().split(" GO ").is_empty());
    }

    #[test]
    fn splits_on_go_with_tab_or_newline_or_end_of_text() {
        assert!(go().has_separator("GO\t"));
        assert!(go().has_separator(" GO\n"));
        assert!(go().has_separator(" GO"));
        assert!(go().has_separator(" \nGO\n"));
        assert!(go().has_separator("go\r\n"));
    }

    #[test]
    fn splits_on_go_after_line_comment_lines() {
        assert!(go().has_separator("--\nGO\n"));
        assert!(go().has_separator(&format!("-- {WORDS}\nGO\n")));
        assert!(go().has_separator(&format!("-- {SYMBOLS}\nGO\n")));
    }

    #[test]
    fn no_split_on_partial_tokens() {
        assert!(!go().has_separator(" G\n"));
        assert!(!go().has_separator(" O\n"));
        assert!(!go().has_separator("FOOGO\n"));
        assert!(!go().has_separator("GOFOO\n"));
        assert!(!go().has_separator(&format!("{WORDS}GO\n")));
        assert_eq!(go().split("FOOGO\n"), vec!["FOOGO"]);
    }

    #[test]
    fn no_split_when_line_is_shared() {
        assert!(!go().has_separator(&format!(" GO {WORDS}")));
        assert!(!go().has_separator(&format!(" GO {WORDS}{SYMBOLS}")));
        assert!(!go().has_separator(&format!("{WORDS} GO {WORDS}")));
        assert!(!go().has_separator(&format!("{WORDS}{SYMBOLS} GO BOB{SYMBOLS}")));
        assert!(!go().has_separator(&format!("{WORDS} GO\n")));
    }

    #[test]
    fn no_split_inside_line_comments() {
        for text in [
            "--GO\n".to_string(),
            "-- GO\n".to_string(),
            format!("-- GO {WORDS}\n"),
            format!("-- GO {SYMBOLS}\n"),
            "--\tGO\n".to_string(),
            format!("--\tGO {WORDS}\n"),
            format!("-- {WORDS} GO\n"),
            format!("--{SYMBOLS} GO\n"),
            format!("--{SYMBOLS}{WORDS} GO\n"),
        ] {
            assert!(!go().has_separator(&text), "split inside comment: {text:?}");
        }
    }

    #[test]
    fn no_split_inside_block_comments() {
        for text in [
            "/* GO */".to_string(),
            "/* GO \n*/".to_string(),
            format!("/* \n{WORDS} GO\n\n*/"),
            format!("/* \n{WORDS} \nGO\n\n*/"),
            format!("/* \n{WORDS} \nGO\n\n{WORDS}\n*/"),
            format!("/* \nGO\n\n{SYMBOLS} \n*/"),
        ] {
            assert!(!go().has_separator(&text), "split inside block comment: {text:?}");
        }
    }

    #[test]
    fn splits_around_comments_between_batches() {
        let sql = "BOB\nGO\n\n/* COMMENT BOB */\nBOB\nGO";
        assert_eq!(go().split(sql), vec!["BOB", "/* COMMENT BOB */\nBOB"]);
    }

    #[test]
    fn no_split_inside_string_literals() {
        let sql = "INSERT INTO t VALUES ('it''s\nGO\nstill text')\nGO\nSELECT 1";
        let batches = go().split(sql);
        assert_eq!(batches.len(), 2);
        assert!(batches[0].ends_with("still text')"));
    }

    #[test]
    fn no_split_inside_quoted_identifiers() {
        let sql = "CREATE TABLE [odd\nGO\nname] (id INT)";
        assert_eq!(go().split(sql).len(), 1);
    }

    #[test]
    fn nested_block_comments_follow_dialect_rule() {
        let sql = "/* outer /* inner */\nGO\n*/\nSELECT 1";
        assert_eq!(go().split(sql).len(), 1);
        let flat = Splitter::new(Separator::line_token("GO").unwrap());
        assert_eq!(flat.split(sql), vec!["/* outer /* inner */", "*/\nSELECT 1"]);
    }

    #[test]
    fn consecutive_separators_yield_no_empty_batches() {
        assert_eq!(go().split("GO\nGO\nSELECT 1\nGO\n\nGO\n"), vec!["SELECT 1"]);
    }

    #[test]
    fn terminator_splits_outside_comments_and_strings() {
        let s = Splitter::new(Separator::Terminator(';'));
        let sql = "CREATE TABLE a (x TEXT); -- not; here\nINSERT INTO a VALUES ('x;y');\n/* ; */ SELECT 1;;";
        assert_eq!(
            s.split(sql),
            vec!["CREATE TABLE a (x TEXT)", "-- not; here\nINSERT INTO a VALUES ('x;y')", "/* ; */ SELECT 1"]
        );
        assert!(s.has_separator("a;b"));
        assert!(!s.has_separator("'a;b'"));
    }

    #[test]
    fn no_separator_is_identity() {
        let s = Splitter::new(Separator::None);
        let sql = "SELECT 1\nGO\nSELECT 2;";
        assert_eq!(s.split(sql), vec![sql]);
        assert!(!s.has_separator(sql));
        assert!(s.split("  \n ").is_empty());
    }
}
