//! # CIE Highlighter
//! Single-pass lexer over CIE notation that renders each token as a styled
//! `<span>`, the way an editor would colour code.
//!
//! Token classes (CSS class in parentheses):
//! - `$` symbol (`cf-symbol`), `▪` bullet (`cf-bullet`)
//! - `{...}` action code (`cf-action`), `[...]` bracket (`cf-bracket`)
//! - `/`, `\`, free-standing `x`/`X` operator (`cf-operator`)
//! - `<>`, `<`, `>` relation (`cf-relation-op`), `@` location (`cf-location-op`)
//! - `usa.hos`-style entity codes (`cf-entity`), `usa`-style country codes (`cf-country`)
//!
//! Anything else is plain text. All text is HTML-escaped; an unterminated
//! `{` or `[` is emitted as a plain character.

use serde::Serialize;

pub const BULLET: char = '▪';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Symbol,
    Bullet,
    ActionCode,
    Bracket,
    Operator,
    Relation,
    LocationOp,
    EntityCode,
    CountryCode,
    Text,
}

impl TokenKind {
    /// CSS class for styled kinds; `None` for plain text.
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            TokenKind::Symbol => Some("cf-symbol"),
            TokenKind::Bullet => Some("cf-bullet"),
            TokenKind::ActionCode => Some("cf-action"),
            TokenKind::Bracket => Some("cf-bracket"),
            TokenKind::Operator => Some("cf-operator"),
            TokenKind::Relation => Some("cf-relation-op"),
            TokenKind::LocationOp => Some("cf-location-op"),
            TokenKind::EntityCode => Some("cf-entity"),
            TokenKind::CountryCode => Some("cf-country"),
            TokenKind::Text => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw (unescaped) source text.
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn to_html(&self) -> String {
        let escaped = escape(&self.text);
        match self.kind.css_class() {
            Some(class) => format!(r#"<span class="{class}">{escaped}</span>"#),
            None => escaped,
        }
    }
}

/// Highlight multi-line CIE text.
///
/// Lines are processed independently; blank lines render empty and leading
/// whitespace is kept verbatim.
pub fn highlight_cie(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                return String::new();
            }
            let content = line.trim_start();
            let indent = &line[..line.len() - content.len()];
            format!("{indent}{}", highlight_line(content))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Highlight a single line (no newline handling).
pub fn highlight_line(line: &str) -> String {
    tokenize_line(line).iter().map(Token::to_html).collect()
}

/// Split one line into classified tokens, left to right.
pub fn tokenize_line(line: &str) -> Vec<Token> {
    let chars: Vec<char> = line.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '$' => {
                out.push(Token::new(TokenKind::Symbol, "$"));
                i += 1;
            }
            BULLET => {
                out.push(Token::new(TokenKind::Bullet, BULLET.to_string()));
                i += 1;
            }
            '{' | '[' => {
                let close = if c == '{' { '}' } else { ']' };
                match chars[i + 1..].iter().position(|&ch| ch == close) {
                    Some(off) => {
                        let end = i + 1 + off;
                        let kind = if c == '{' {
                            TokenKind::ActionCode
                        } else {
                            TokenKind::Bracket
                        };
                        out.push(Token::new(kind, collect(&chars[i..=end])));
                        i = end + 1;
                    }
                    None => {
                        out.push(Token::new(TokenKind::Text, c.to_string()));
                        i += 1;
                    }
                }
            }
            '/' | '\\' => {
                out.push(Token::new(TokenKind::Operator, c.to_string()));
                i += 1;
            }
            'x' | 'X' if is_free_standing(&chars, i) => {
                out.push(Token::new(TokenKind::Operator, c.to_string()));
                i += 1;
            }
            '<' if chars.get(i + 1) == Some(&'>') => {
                out.push(Token::new(TokenKind::Relation, "<>"));
                i += 2;
            }
            '<' | '>' => {
                out.push(Token::new(TokenKind::Relation, c.to_string()));
                i += 1;
            }
            '@' => {
                out.push(Token::new(TokenKind::LocationOp, "@"));
                i += 1;
            }
            c if c.is_alphanumeric() => {
                i = scan_word(&chars, i, &mut out);
            }
            _ => {
                out.push(Token::new(TokenKind::Text, c.to_string()));
                i += 1;
            }
        }
    }

    out
}

/// `x` with whitespace or a line boundary on both sides.
fn is_free_standing(chars: &[char], i: usize) -> bool {
    let prev_ok = i == 0 || chars[i - 1].is_whitespace();
    let next_ok = i + 1 == chars.len() || chars[i + 1].is_whitespace();
    prev_ok && next_ok
}

/// Greedy run of letters, digits, `.` and `-`; returns the next index.
fn scan_word(chars: &[char], start: usize, out: &mut Vec<Token>) -> usize {
    let mut i = start;
    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '.' || chars[i] == '-') {
        i += 1;
    }
    let word = collect(&chars[start..i]);
    let kind = classify_word(&word);
    out.push(Token::new(kind, word));
    i
}

/// Entity code, country code, or plain text.
pub fn classify_word(word: &str) -> TokenKind {
    if word.contains('.') {
        let parts_ok = word
            .split('.')
            .all(|p| !p.is_empty() && p.chars().all(char::is_alphanumeric));
        return if parts_ok {
            TokenKind::EntityCode
        } else {
            TokenKind::Text
        };
    }
    if word.chars().count() == 3 && word.chars().all(|c| c.is_alphabetic() && c.is_lowercase()) {
        return TokenKind::CountryCode;
    }
    TokenKind::Text
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

fn escape(s: &str) -> String {
    html_escape::encode_quoted_attribute(s).into_owned()
}
