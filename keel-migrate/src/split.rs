//! Splitting migration content into individually executable statements.
//!
//! This is deliberately not a SQL parser. It only knows enough lexical
//! structure to find the semicolons that terminate statements: quoted
//! strings and identifiers, comments, PostgreSQL dollar-quoted bodies and
//! SQLite trigger bodies.

use crate::connection::Dialect;

/// Split `sql` into trimmed statements without their terminating `;`.
///
/// Fragments that contain nothing but whitespace and comments are dropped.
pub fn split_statements(sql: &str, dialect: Dialect) -> Vec<String> {
    Splitter::new(sql, dialect).run()
}

struct Splitter<'a> {
    sql: &'a str,
    bytes: &'a [u8],
    dialect: Dialect,
    statements: Vec<String>,
    start: usize,
    has_code: bool,
    leading_words: Vec<String>,
    in_trigger: bool,
    block_depth: usize,
}

impl<'a> Splitter<'a> {
    fn new(sql: &'a str, dialect: Dialect) -> Self {
        Self {
            sql,
            bytes: sql.as_bytes(),
            dialect,
            statements: Vec::new(),
            start: 0,
            has_code: false,
            leading_words: Vec::new(),
            in_trigger: false,
            block_depth: 0,
        }
    }

    fn run(mut self) -> Vec<String> {
        let len = self.bytes.len();
        let mut i = 0;

        while i < len {
            let b = self.bytes[i];
            let next = self.bytes.get(i + 1).copied();

            i = match b {
                b'\'' => {
                    self.has_code = true;
                    skip_quoted(self.bytes, i, b'\'', self.dialect == Dialect::MySql)
                }
                b'"' => {
                    self.has_code = true;
                    skip_quoted(self.bytes, i, b'"', self.dialect == Dialect::MySql)
                }
                b'`' if self.dialect != Dialect::Postgres => {
                    self.has_code = true;
                    skip_quoted(self.bytes, i, b'`', false)
                }
                b'[' if self.dialect == Dialect::Sqlite => {
                    self.has_code = true;
                    skip_past(self.bytes, i + 1, b"]")
                }
                b'-' if next == Some(b'-') => skip_past(self.bytes, i + 2, b"\n"),
                b'#' if self.dialect == Dialect::MySql => skip_past(self.bytes, i + 1, b"\n"),
                b'/' if next == Some(b'*') => skip_past(self.bytes, i + 2, b"*/"),
                b'$' if self.dialect == Dialect::Postgres => {
                    self.has_code = true;
                    match dollar_tag(self.bytes, i) {
                        Some(tag_end) => {
                            let tag = &self.bytes[i..tag_end];
                            skip_past(self.bytes, tag_end, tag)
                        }
                        None => i + 1,
                    }
                }
                b';' => {
                    if self.block_depth == 0 {
                        self.finish_statement(i);
                    }
                    i + 1
                }
                _ if is_word_start(b) => {
                    let end = word_end(self.bytes, i);
                    let word = &self.sql[i..end];
                    self.has_code = true;
                    self.observe_word(word);
                    // Postgres escape strings (E'...') honour backslash escapes.
                    if self.dialect == Dialect::Postgres
                        && word.eq_ignore_ascii_case("e")
                        && self.bytes.get(end) == Some(&b'\'')
                    {
                        skip_quoted(self.bytes, end, b'\'', true)
                    } else {
                        end
                    }
                }
                _ => {
                    if !b.is_ascii_whitespace() {
                        self.has_code = true;
                    }
                    i + 1
                }
            };
        }

        self.finish_statement(len);
        self.statements
    }

    fn observe_word(&mut self, word: &str) {
        let upper = word.to_ascii_uppercase();

        if self.leading_words.len() < 5 {
            self.leading_words.push(upper.clone());
            if self.dialect == Dialect::Sqlite
                && self.leading_words[0] == "CREATE"
                && upper == "TRIGGER"
            {
                self.in_trigger = true;
            }
        }

        if !self.in_trigger {
            return;
        }

        match upper.as_str() {
            "BEGIN" | "CASE" => self.block_depth += 1,
            "END" => self.block_depth = self.block_depth.saturating_sub(1),
            _ => {}
        }
    }

    fn finish_statement(&mut self, end: usize) {
        if self.has_code {
            let statement = self.sql[self.start..end].trim();
            if !statement.is_empty() {
                self.statements.push(statement.to_string());
            }
        }
        self.start = (end + 1).min(self.bytes.len());
        self.has_code = false;
        self.leading_words.clear();
        self.in_trigger = false;
        self.block_depth = 0;
    }
}

fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn word_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len()
        && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_' || bytes[end] >= 0x80)
    {
        end += 1;
    }
    end
}

/// Skip a quoted region starting at `start` (the opening quote). A doubled
/// quote is an escaped quote; with `backslash` a backslash escapes the next
/// byte. Returns the index just past the closing quote.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8, backslash: bool) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if backslash && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Return the index just past the first occurrence of `needle` at or after
/// `from`, or the end of input.
fn skip_past(bytes: &[u8], from: usize, needle: &[u8]) -> usize {
    if from >= bytes.len() {
        return bytes.len();
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map_or(bytes.len(), |pos| from + pos + needle.len())
}

/// If a dollar-quote tag (`$$` or `$name$`) starts at `start`, return the
/// index just past it.
fn dollar_tag(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    match bytes.get(i) {
        Some(b'$') => return Some(i + 1),
        Some(&b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return None,
    }
    while let Some(&b) = bytes.get(i) {
        if b == b'$' {
            return Some(i + 1);
        }
        if !(b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_statements() {
        let stmts = split_statements(
            "CREATE TABLE a (id INTEGER);\nINSERT INTO a VALUES (1);",
            Dialect::Sqlite,
        );
        assert_eq!(
            stmts,
            vec!["CREATE TABLE a (id INTEGER)", "INSERT INTO a VALUES (1)"]
        );
    }

    #[test]
    fn test_missing_trailing_semicolon() {
        let stmts = split_statements("SELECT 1; SELECT 2", Dialect::Sqlite);
        assert_eq!(stmts, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_semicolons_in_strings_and_comments() {
        let sql = "INSERT INTO t VALUES ('a;b', 'it''s; fine'); -- trailing; comment\n\
                   /* block; comment */ SELECT \"odd;name\" FROM t;";
        let stmts = split_statements(sql, Dialect::Sqlite);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "INSERT INTO t VALUES ('a;b', 'it''s; fine')");
        assert!(stmts[1].ends_with("SELECT \"odd;name\" FROM t"));
    }

    #[test]
    fn test_comment_only_fragments_dropped() {
        let stmts = split_statements("SELECT 1;\n-- nothing here\n;  \n", Dialect::Sqlite);
        assert_eq!(stmts, vec!["SELECT 1"]);
    }

    #[test]
    fn test_sqlite_trigger_body() {
        let sql = "CREATE TRIGGER touch AFTER UPDATE ON t BEGIN \
                       UPDATE t SET n = CASE WHEN n > 1 THEN 0 ELSE n END; \
                       UPDATE u SET x = 1; \
                   END;\
                   SELECT 1;";
        let stmts = split_statements(sql, Dialect::Sqlite);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].starts_with("CREATE TRIGGER touch"));
        assert!(stmts[0].ends_with("END"));
        assert_eq!(stmts[1], "SELECT 1");
    }

    #[test]
    fn test_postgres_dollar_quotes() {
        let sql = "CREATE FUNCTION f() RETURNS int AS $body$ SELECT 1; $body$ LANGUAGE sql;\n\
                   DO $$ BEGIN PERFORM 1; END $$;\n\
                   SELECT $1;";
        let stmts = split_statements(sql, Dialect::Postgres);
        assert_eq!(stmts.len(), 3);
        assert!(stmts[0].ends_with("LANGUAGE sql"));
        assert_eq!(stmts[1], "DO $$ BEGIN PERFORM 1; END $$");
        assert_eq!(stmts[2], "SELECT $1");
    }

    #[test]
    fn test_postgres_escape_string() {
        let stmts = split_statements(r"SELECT E'a\';b'; SELECT 2;", Dialect::Postgres);
        assert_eq!(stmts, vec![r"SELECT E'a\';b'", "SELECT 2"]);
    }

    #[test]
    fn test_sqlite_bracket_identifier() {
        let stmts = split_statements("SELECT [a;b] FROM t; SELECT 2", Dialect::Sqlite);
        assert_eq!(stmts, vec!["SELECT [a;b] FROM t", "SELECT 2"]);
    }

    #[test]
    fn test_begin_outside_trigger_is_plain_word() {
        let stmts = split_statements("SELECT 'begin'; SELECT 2;", Dialect::Sqlite);
        assert_eq!(stmts.len(), 2);
    }
}
