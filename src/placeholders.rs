//! Positional parameter marker scanning.

#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Bracketed,
    LineComment,
    BlockComment(u32),
}

fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// Byte offsets of every `?` parameter marker in `sql`.
///
/// Markers inside quoted literals, `[bracketed]` identifiers and comments are skipped.
/// The scan is a lightweight state machine, not a SQL parser.
#[must_use]
pub fn placeholder_positions(sql: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut state = State::Normal;
    let bytes = sql.as_bytes();
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'[' => state = State::Bracketed,
                b'?' => positions.push(idx),
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Bracketed => {
                if b == b']' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    positions
}

/// Number of `?` parameter markers in `sql`.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_positions(sql).len()
}
