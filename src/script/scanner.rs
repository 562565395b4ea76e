//! Line-oriented statement scanner
//!
//! Splits a script into the statements it contains without splitting inside
//! `BEGIN … END;` procedural blocks or `$$ … $$` dollar-quoted bodies.
//!
//! The scanner works one line at a time:
//!
//! - blank lines and `--` comment lines are dropped, unless they sit inside a
//!   dollar-quoted body
//! - every `$$` toggles the dollar-quote state; text inside a dollar-quoted
//!   body is kept verbatim (line breaks included) and never interpreted
//! - outside dollar quotes, whitespace is collapsed and lines are joined with
//!   single spaces; every whole-word `BEGIN` outside literals and comments
//!   opens a block (except transaction control such as `BEGIN;` or
//!   `BEGIN TRANSACTION`) and a line ending in `END;` closes one
//! - a statement is complete when the outermost block closes, or when a line
//!   at depth zero ends with `;`

use super::statement::StatementUnit;
use std::fmt;
use thiserror::Error;

const DOLLAR_QUOTE: &str = "$$";
const LINE_COMMENT: &str = "--";
const TERMINATOR: char = ';';
const BLOCK_OPEN: &str = "BEGIN";
const BLOCK_CLOSE: &str = "END";

/// Words that turn a leading `BEGIN` into transaction control
const TRANSACTION_WORDS: &[&str] = &["TRANSACTION", "WORK", "NAME"];

/// Construct left open at end of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenConstruct {
    Block,
    DollarQuote,
}

impl fmt::Display for OpenConstruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenConstruct::Block => write!(f, "BEGIN block"),
            OpenConstruct::DollarQuote => write!(f, "$$ body"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Input ended inside a block or a dollar-quoted body
    #[error("unterminated {construct} opened at line {line}")]
    UnterminatedBlock { construct: OpenConstruct, line: usize },

    /// Input had content but no executable statement came out of it
    #[error("script contains text but no executable statements")]
    EmptyStatementSet,
}

/// Split script text into its executable statements, in source order.
///
/// Input without any statement text (only blank or comment lines) is
/// legitimately empty and yields an empty list.
pub fn scan(text: &str) -> Result<Vec<StatementUnit>, ScanError> {
    let mut state = ScanState::default();
    for (idx, line) in text.lines().enumerate() {
        state.step(idx + 1, line);
    }
    state.finish()
}

#[derive(Default)]
struct ScanState {
    buffer: String,
    depth: usize,
    in_dollar_quote: bool,
    /// The next line is joined with a line break because the previous one
    /// ended in a `--` comment
    join_with_newline: bool,
    statement_line: usize,
    block_line: usize,
    dollar_line: usize,
    saw_content: bool,
    units: Vec<StatementUnit>,
}

impl ScanState {
    fn step(&mut self, line_no: usize, raw: &str) {
        let starts_inside = self.in_dollar_quote;
        if !starts_inside {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with(LINE_COMMENT) {
                return;
            }
        }
        self.saw_content = true;

        let line = self.render_line(line_no, raw);
        let ends_inside = self.in_dollar_quote;

        let (code, has_comment) = match &line.last_outside {
            Some(segment) => {
                let (code, has_comment) = strip_line_comment(segment);
                (code.trim_end(), has_comment)
            }
            None => ("", false),
        };

        let opens = count_block_opens(strip_line_comment(&line.outside).0);
        let closes = !ends_inside && ends_with_block_close(code);

        if opens > 0 {
            if self.depth == 0 {
                self.block_line = line_no;
            }
            self.depth += opens;
        }

        let mut block_closed = false;
        if closes && self.depth > 0 {
            self.depth -= 1;
            block_closed = self.depth == 0;
        }

        self.append(line_no, &line.text, starts_inside);
        self.join_with_newline = !ends_inside && has_comment;

        let terminated = !ends_inside && code.ends_with(TERMINATOR);
        if block_closed || (self.depth == 0 && terminated) {
            self.flush();
        }
    }

    /// Render one retained line, toggling the dollar-quote state at every
    /// `$$` it contains.
    fn render_line(&mut self, line_no: usize, raw: &str) -> RenderedLine {
        let starts_inside = self.in_dollar_quote;
        let segments: Vec<&str> = raw.split(DOLLAR_QUOTE).collect();
        let last = segments.len() - 1;

        let mut text = String::with_capacity(raw.len());
        let mut outside = String::new();
        let mut last_outside = None;

        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                text.push_str(DOLLAR_QUOTE);
                self.in_dollar_quote = !self.in_dollar_quote;
                if self.in_dollar_quote {
                    self.dollar_line = line_no;
                }
            }

            if self.in_dollar_quote {
                text.push_str(segment);
                continue;
            }

            let collapsed = collapse_whitespace(segment);
            if !outside.is_empty() {
                outside.push(' ');
            }
            outside.push_str(collapsed.trim());
            if i == last {
                last_outside = Some(collapsed.trim().to_string());
            }
            text.push_str(&collapsed);
        }

        let mut text = text.as_str();
        if !starts_inside {
            text = text.trim_start();
        }
        if !self.in_dollar_quote {
            text = text.trim_end();
        }

        RenderedLine {
            text: text.to_string(),
            outside,
            last_outside,
        }
    }

    fn append(&mut self, line_no: usize, text: &str, starts_inside: bool) {
        if self.buffer.is_empty() {
            self.statement_line = line_no;
        } else if starts_inside || self.join_with_newline {
            self.buffer.push('\n');
        } else {
            self.buffer.push(' ');
        }
        self.buffer.push_str(text);
    }

    fn flush(&mut self) {
        let text = self.buffer.trim();
        let body = text.trim_end_matches(TERMINATOR).trim();
        if !body.is_empty() {
            let index = self.units.len() + 1;
            self.units
                .push(StatementUnit::new(index, self.statement_line, text));
        }
        self.buffer.clear();
        self.depth = 0;
        self.join_with_newline = false;
    }

    fn finish(mut self) -> Result<Vec<StatementUnit>, ScanError> {
        let open_block = (self.depth > 0).then_some(self.block_line);
        let open_quote = self.in_dollar_quote.then_some(self.dollar_line);

        match (open_block, open_quote) {
            (Some(block), Some(quote)) if quote < block => {
                return Err(ScanError::UnterminatedBlock {
                    construct: OpenConstruct::DollarQuote,
                    line: quote,
                });
            }
            (Some(line), _) => {
                return Err(ScanError::UnterminatedBlock {
                    construct: OpenConstruct::Block,
                    line,
                });
            }
            (None, Some(line)) => {
                return Err(ScanError::UnterminatedBlock {
                    construct: OpenConstruct::DollarQuote,
                    line,
                });
            }
            (None, None) => {}
        }

        if !self.buffer.trim().is_empty() {
            self.flush();
        }

        if self.units.is_empty() && self.saw_content {
            return Err(ScanError::EmptyStatementSet);
        }

        Ok(self.units)
    }
}

struct RenderedLine {
    text: String,
    /// Every segment outside dollar quotes, joined
    outside: String,
    /// Trailing segment, when the line ends outside a dollar quote
    last_outside: Option<String>,
}

/// Collapse whitespace runs to one space, leaving single-quoted literals alone
fn collapse_whitespace(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut in_literal = false;
    let mut pending_space = false;

    for ch in segment.chars() {
        if !in_literal && ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        if ch == '\'' {
            in_literal = !in_literal;
        }
        out.push(ch);
    }
    if pending_space {
        out.push(' ');
    }
    out
}

/// Split off a trailing `--` comment that is not inside a string literal
fn strip_line_comment(segment: &str) -> (&str, bool) {
    let bytes = segment.as_bytes();
    let mut in_literal = false;
    for (i, byte) in bytes.iter().enumerate() {
        match byte {
            b'\'' => in_literal = !in_literal,
            b'-' if !in_literal && bytes.get(i + 1) == Some(&b'-') => {
                return (&segment[..i], true);
            }
            _ => {}
        }
    }
    (segment, false)
}

/// Words and `;` terminators of a code fragment, skipping string literals.
/// Identifier characters include `.` and `"` so qualified or quoted names
/// such as `t.begin` stay one word.
fn code_words(code: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut in_literal = false;
    let mut start = None;

    for (i, ch) in code.char_indices() {
        if in_literal {
            if ch == '\'' {
                in_literal = false;
            }
            continue;
        }
        if ch.is_alphanumeric() || matches!(ch, '_' | '$' | '.' | '"') {
            if start.is_none() {
                start = Some(i);
            }
            continue;
        }
        if let Some(s) = start.take() {
            words.push(&code[s..i]);
        }
        match ch {
            '\'' => in_literal = true,
            TERMINATOR => words.push(&code[i..i + ch.len_utf8()]),
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push(&code[s..]);
    }
    words
}

/// Number of `BEGIN`s in `code` that open a procedural block.
///
/// `BEGIN;` and `BEGIN TRANSACTION|WORK|NAME` are transaction control.
fn count_block_opens(code: &str) -> usize {
    let words = code_words(code);
    words
        .iter()
        .enumerate()
        .filter(|(i, word)| {
            word.eq_ignore_ascii_case(BLOCK_OPEN)
                && !words.get(i + 1).is_some_and(|next| {
                    next.starts_with(TERMINATOR)
                        || TRANSACTION_WORDS.iter().any(|w| next.eq_ignore_ascii_case(w))
                })
        })
        .count()
}

fn ends_with_block_close(code: &str) -> bool {
    let Some(body) = code.strip_suffix(TERMINATOR) else {
        return false;
    };
    let body = body.trim_end();
    let word_start = body
        .char_indices()
        .rev()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    body[word_start..].eq_ignore_ascii_case(BLOCK_CLOSE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(units: &[StatementUnit]) -> Vec<&str> {
        units.iter().map(|u| u.text.as_str()).collect()
    }

    #[test]
    fn test_simple_statements_in_order() {
        let script = "USE DATABASE PROD_DB;\n\
                      -- create the schema\n\
                      CREATE SCHEMA IF NOT EXISTS core;\n\
                      \n\
                      CREATE TABLE core.orders (\n    id   INT,\n    total  NUMBER\n);\n";
        let units = scan(script).unwrap();
        assert_eq!(
            texts(&units),
            vec![
                "USE DATABASE PROD_DB;",
                "CREATE SCHEMA IF NOT EXISTS core;",
                "CREATE TABLE core.orders ( id INT, total NUMBER );",
            ]
        );
        assert_eq!(units[0].index, 1);
        assert_eq!(units[2].index, 3);
        assert_eq!(units[2].line, 5);
    }

    #[test]
    fn test_block_with_inner_semicolons_is_one_statement() {
        let script = "CREATE TASK t AS BEGIN\n  INSERT INTO a VALUES (1);\n  INSERT INTO b VALUES (2);\nEND;";
        let units = scan(script).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(
            units[0].text,
            "CREATE TASK t AS BEGIN INSERT INTO a VALUES (1); INSERT INTO b VALUES (2); END;"
        );
        assert_eq!(units[0].name.as_deref(), Some("TASK t"));
    }

    #[test]
    fn test_begin_on_its_own_line() {
        let script = "CREATE OR REPLACE TASK nightly\n  WAREHOUSE = WH\n  SCHEDULE = 'USING CRON 0 2 * * * UTC'\nAS\nbegin\n  CALL refresh();\n  DELETE FROM stale;\nend;\nALTER TASK nightly RESUME;";
        let units = scan(script).unwrap();
        assert_eq!(units.len(), 2);
        assert!(units[0].text.starts_with("CREATE OR REPLACE TASK nightly"));
        assert!(units[0].text.ends_with("end;"));
        assert_eq!(units[1].text, "ALTER TASK nightly RESUME;");
        assert_eq!(units[1].line, 9);
    }

    #[test]
    fn test_nested_blocks() {
        let script = "EXECUTE TASK wrapper;\nBEGIN\n  BEGIN\n    SELECT 1;\n  END;\n  SELECT 2;\nEND;\nSELECT 3;";
        let units = scan(script).unwrap();
        assert_eq!(
            texts(&units),
            vec![
                "EXECUTE TASK wrapper;",
                "BEGIN BEGIN SELECT 1; END; SELECT 2; END;",
                "SELECT 3;",
            ]
        );
    }

    #[test]
    fn test_single_line_block() {
        let units = scan("BEGIN INSERT INTO t VALUES (1); END;\nSELECT 1;").unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].text, "BEGIN INSERT INTO t VALUES (1); END;");
    }

    #[test]
    fn test_begin_mid_line_opens_block() {
        let script = "CREATE TASK t AS BEGIN INSERT INTO a VALUES (1);\n  INSERT INTO b VALUES (2);\nEND;";
        let units = scan(script).unwrap();
        assert_eq!(
            texts(&units),
            vec!["CREATE TASK t AS BEGIN INSERT INTO a VALUES (1); INSERT INTO b VALUES (2); END;"]
        );
    }

    #[test]
    fn test_begin_in_literal_or_comment_is_inert() {
        let script = "INSERT INTO log VALUES ('begin here');\nSELECT 1; -- BEGIN later\nSELECT 2;";
        let units = scan(script).unwrap();
        assert_eq!(units.len(), 3);
    }

    #[test]
    fn test_case_expression_end_closes_block() {
        // A bare `END;` always closes the innermost block, even when it ends
        // a CASE expression.
        let script = "BEGIN\n  LET y := CASE WHEN x THEN 1 ELSE 2 END;\n  SELECT 1;\nEND;";
        let units = scan(script).unwrap();
        assert_eq!(
            texts(&units),
            vec![
                "BEGIN LET y := CASE WHEN x THEN 1 ELSE 2 END;",
                "SELECT 1;",
                "END;",
            ]
        );

        let script = "BEGIN\n  LET y := (CASE WHEN x THEN 1 ELSE 2 END);\n  SELECT 1;\nEND;";
        assert_eq!(scan(script).unwrap().len(), 1);
    }

    #[test]
    fn test_transaction_control_is_not_a_block() {
        let script = "BEGIN TRANSACTION;\nINSERT INTO t VALUES (1);\nCOMMIT;\nBEGIN;\nSELECT 1;\nCOMMIT;";
        let units = scan(script).unwrap();
        assert_eq!(units.len(), 6);
        assert_eq!(units[0].text, "BEGIN TRANSACTION;");
        assert_eq!(units[3].text, "BEGIN;");
    }

    #[test]
    fn test_unterminated_block() {
        let script = "SELECT 1;\nCREATE TASK t AS BEGIN\n  INSERT INTO a VALUES (1);\n";
        assert_eq!(
            scan(script),
            Err(ScanError::UnterminatedBlock {
                construct: OpenConstruct::Block,
                line: 2,
            })
        );
    }

    #[test]
    fn test_dollar_quote_same_line() {
        let script = "CREATE PROCEDURE p() RETURNS INT LANGUAGE SQL AS $$ SELECT 1; SELECT 2; $$;\nSELECT 3;";
        let units = scan(script).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(
            units[0].text,
            "CREATE PROCEDURE p() RETURNS INT LANGUAGE SQL AS $$ SELECT 1; SELECT 2; $$;"
        );
        assert_eq!(units[0].name.as_deref(), Some("PROCEDURE p"));
    }

    #[test]
    fn test_dollar_quote_body_is_verbatim() {
        let script = "CREATE OR REPLACE PROCEDURE load()\nRETURNS STRING\nLANGUAGE JAVASCRIPT\nAS\n$$\n  var sql = \"DELETE FROM t;\";\n\n  -- not a comment line to the scanner\n  BEGIN\n  return   'done';\n$$;\nSELECT 1;";
        let units = scan(script).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(
            units[0].text,
            "CREATE OR REPLACE PROCEDURE load() RETURNS STRING LANGUAGE JAVASCRIPT AS $$\n  var sql = \"DELETE FROM t;\";\n\n  -- not a comment line to the scanner\n  BEGIN\n  return   'done';\n$$;"
        );
        assert_eq!(units[1].text, "SELECT 1;");
    }

    #[test]
    fn test_keywords_inside_dollar_quote_are_inert() {
        let script = "CREATE FUNCTION f() RETURNS STRING AS $$\nBEGIN\nEND;\n$$;";
        let units = scan(script).unwrap();
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn test_dollar_quoted_block_inside_execute_immediate() {
        let script = "EXECUTE IMMEDIATE $$\nBEGIN\n  CREATE TABLE a (id INT);\nEND;\n$$;";
        let units = scan(script).unwrap();
        assert_eq!(units.len(), 1);
        assert!(units[0].text.starts_with("EXECUTE IMMEDIATE $$\nBEGIN"));
    }

    #[test]
    fn test_unterminated_dollar_quote() {
        let script = "SELECT 1;\nCREATE PROCEDURE p() AS $$\n  return 1;\n";
        assert_eq!(
            scan(script),
            Err(ScanError::UnterminatedBlock {
                construct: OpenConstruct::DollarQuote,
                line: 2,
            })
        );
    }

    #[test]
    fn test_comment_lines_inside_block_dropped() {
        let script = "CREATE TASK t AS BEGIN\n  -- step one\n  SELECT 1;\nEND;";
        let units = scan(script).unwrap();
        assert_eq!(units[0].text, "CREATE TASK t AS BEGIN SELECT 1; END;");
    }

    #[test]
    fn test_inline_comment_kept_and_breaks_line() {
        let script = "SELECT a, -- the key\n       b\nFROM t;";
        let units = scan(script).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "SELECT a, -- the key\nb FROM t;");
    }

    #[test]
    fn test_terminator_before_inline_comment() {
        let units = scan("SELECT 1; -- first\nSELECT 2;").unwrap();
        assert_eq!(texts(&units), vec!["SELECT 1; -- first", "SELECT 2;"]);
    }

    #[test]
    fn test_string_literal_whitespace_preserved() {
        let units = scan("INSERT INTO t VALUES ('a   b',    'c');").unwrap();
        assert_eq!(units[0].text, "INSERT INTO t VALUES ('a   b', 'c');");
    }

    #[test]
    fn test_identifier_ending_in_end_does_not_close() {
        let script = "BEGIN\n  SELECT weekend;\n  SELECT 1;\nEND;";
        let units = scan(script).unwrap();
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn test_trailing_statement_without_terminator() {
        let units = scan("SELECT 1;\nSELECT 2").unwrap();
        assert_eq!(texts(&units), vec!["SELECT 1;", "SELECT 2"]);
    }

    #[test]
    fn test_empty_and_comment_only_input() {
        assert_eq!(scan(""), Ok(vec![]));
        assert_eq!(scan("  \n\t\n"), Ok(vec![]));
        assert_eq!(scan("-- nothing to deploy yet\n"), Ok(vec![]));
    }

    #[test]
    fn test_only_terminators_is_empty_statement_set() {
        assert_eq!(scan(";\n ;\n"), Err(ScanError::EmptyStatementSet));
    }

    #[test]
    fn test_scan_is_deterministic() {
        let script = "USE ROLE R;\nCREATE TASK t AS BEGIN\n SELECT 1;\nEND;\nCREATE PROCEDURE p() AS $$ x; $$;";
        assert_eq!(scan(script), scan(script));
    }

    #[test]
    fn test_crlf_line_endings() {
        let units = scan("SELECT 1;\r\nBEGIN\r\n  SELECT 2;\r\nEND;\r\n").unwrap();
        assert_eq!(texts(&units), vec!["SELECT 1;", "BEGIN SELECT 2; END;"]);
    }

    #[test]
    fn test_helpers() {
        assert_eq!(collapse_whitespace("a \t  b"), "a b");
        assert_eq!(strip_line_comment("x; -- y"), ("x; ", true));
        assert_eq!(strip_line_comment("'--' ;"), ("'--' ;", false));
        assert_eq!(count_block_opens("begin"), 1);
        assert_eq!(count_block_opens("CREATE TASK t AS BEGIN SELECT 1;"), 1);
        assert_eq!(count_block_opens("BEGIN WORK;"), 0);
        assert_eq!(count_block_opens("COMMIT; BEGIN;"), 0);
        assert_eq!(count_block_opens("BEGINNING;"), 0);
        assert_eq!(count_block_opens("SELECT 'begin', t.begin, \"BEGIN\" FROM t;"), 0);
        assert_eq!(count_block_opens("BEGIN BEGIN"), 2);
        assert_eq!(code_words("a.b := 'x y'; c"), vec!["a.b", ";", "c"]);
        assert!(ends_with_block_close("END;"));
        assert!(ends_with_block_close("end ;"));
        assert!(ends_with_block_close("x := 1; END;"));
        assert!(!ends_with_block_close("END IF;"));
        assert!(!ends_with_block_close("END"));
    }
}
