//! Lexer for ECMAScript source code
//!
//! Converts source text into a stream of tokens. The parser pulls tokens on
//! demand and re-enters the lexer for template continuations.

use std::iter::Peekable;
use std::str::CharIndices;

use num_bigint::BigInt;

use crate::string_dict::StringDict;
use crate::value::JsString;

/// Source span information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// One piece of template text: the cooked value (absent when an escape
/// sequence is invalid, which only tagged templates tolerate) and the raw source
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePart {
    pub cooked: Option<JsString>,
    pub raw: JsString,
}

/// Token types for JavaScript
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(JsString),
    /// BigInt literal value in decimal digits (e.g. "255" for 0xFFn)
    BigInt(JsString),
    True,
    False,
    Null,

    // Identifiers & Keywords
    Identifier(JsString),
    /// `#name` in class bodies
    PrivateName(JsString),

    Let,
    Const,
    Var,
    Function,
    Return,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    Try,
    Catch,
    Finally,
    Throw,
    New,
    This,
    Super,
    Class,
    Extends,
    Static,
    Import,
    Export,
    Typeof,
    Instanceof,
    In,
    Of,
    Void,
    Delete,
    Yield,
    Await,
    Async,
    Debugger,
    With,
    Enum,

    // Operators
    Plus,             // +
    Minus,            // -
    Star,             // *
    Slash,            // /
    Percent,          // %
    StarStar,         // **
    PlusPlus,         // ++
    MinusMinus,       // --
    Eq,               // =
    EqEq,             // ==
    EqEqEq,           // ===
    BangEq,           // !=
    BangEqEq,         // !==
    Lt,               // <
    LtEq,             // <=
    Gt,               // >
    GtEq,             // >=
    LtLt,             // <<
    GtGt,             // >>
    GtGtGt,           // >>>
    Amp,              // &
    AmpAmp,           // &&
    Pipe,             // |
    PipePipe,         // ||
    Caret,            // ^
    Tilde,            // ~
    Bang,             // !
    Question,         // ?
    QuestionQuestion, // ??
    QuestionDot,      // ?.

    // Assignment Operators
    PlusEq,             // +=
    MinusEq,            // -=
    StarEq,             // *=
    SlashEq,            // /=
    PercentEq,          // %=
    StarStarEq,         // **=
    AmpEq,              // &=
    PipeEq,             // |=
    CaretEq,            // ^=
    LtLtEq,             // <<=
    GtGtEq,             // >>=
    GtGtGtEq,           // >>>=
    AmpAmpEq,           // &&=
    PipePipeEq,         // ||=
    QuestionQuestionEq, // ??=

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Dot,       // .
    DotDotDot, // ...
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;
    Arrow,     // =>

    // Template literals
    TemplateHead(TemplatePart),   // `...${
    TemplateMiddle(TemplatePart), // }...${
    TemplateTail(TemplatePart),   // }...`
    TemplateNoSub(TemplatePart),  // `...` (no substitutions)

    // Special
    Eof,
    Invalid(char),
    /// Unterminated string, template or comment
    Unterminated,
}

impl TokenKind {
    /// Source text of keyword tokens, which are valid property names
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Let => "let",
            TokenKind::Const => "const",
            TokenKind::Var => "var",
            TokenKind::Function => "function",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::Throw => "throw",
            TokenKind::New => "new",
            TokenKind::This => "this",
            TokenKind::Super => "super",
            TokenKind::Class => "class",
            TokenKind::Extends => "extends",
            TokenKind::Static => "static",
            TokenKind::Import => "import",
            TokenKind::Export => "export",
            TokenKind::Typeof => "typeof",
            TokenKind::Instanceof => "instanceof",
            TokenKind::In => "in",
            TokenKind::Of => "of",
            TokenKind::Void => "void",
            TokenKind::Delete => "delete",
            TokenKind::Yield => "yield",
            TokenKind::Await => "await",
            TokenKind::Async => "async",
            TokenKind::Debugger => "debugger",
            TokenKind::With => "with",
            TokenKind::Enum => "enum",
            _ => return None,
        };
        Some(text)
    }
}

/// A token with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(pos: usize, line: u32, column: u32) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(pos, pos, line, column),
        }
    }
}

/// Lexer state checkpoint for backtracking
#[derive(Clone)]
pub struct LexerCheckpoint {
    current_pos: usize,
    line: u32,
    column: u32,
    saw_newline: bool,
}

/// Lexer for tokenizing JavaScript source code
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    /// Offset of `chars` within `source` (non-zero after a restore)
    chars_base_offset: usize,
    current_pos: usize,
    line: u32,
    column: u32,
    start_pos: usize,
    start_line: u32,
    start_column: u32,
    /// Tracks if a line terminator preceded the current token (for ASI)
    saw_newline: bool,
    /// String dictionary for interning identifiers and strings
    string_dict: &'a mut StringDict,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, string_dict: &'a mut StringDict) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            chars_base_offset: 0,
            current_pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
            saw_newline: false,
            string_dict,
        }
    }

    pub fn intern(&mut self, s: &str) -> JsString {
        self.string_dict.get_or_insert(s)
    }

    /// Source text covered by a span
    pub fn slice(&self, span: Span) -> &'a str {
        self.source.get(span.start..span.end).unwrap_or("")
    }

    /// Create a checkpoint of the current lexer state for backtracking
    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            current_pos: self.current_pos,
            line: self.line,
            column: self.column,
            saw_newline: self.saw_newline,
        }
    }

    /// Restore the lexer state from a checkpoint
    pub fn restore(&mut self, checkpoint: LexerCheckpoint) {
        self.seek(checkpoint.current_pos, checkpoint.line, checkpoint.column);
        self.saw_newline = checkpoint.saw_newline;
    }

    fn seek(&mut self, pos: usize, line: u32, column: u32) {
        self.current_pos = pos;
        self.line = line;
        self.column = column;
        self.chars_base_offset = pos;
        self.chars = self.source.get(pos..).unwrap_or("").char_indices().peekable();
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Token {
        if !self.skip_whitespace_and_comments() {
            self.start_pos = self.current_pos;
            self.start_line = self.line;
            self.start_column = self.column;
            return Token::new(TokenKind::Unterminated, self.make_span());
        }

        self.start_pos = self.current_pos;
        self.start_line = self.line;
        self.start_column = self.column;

        let Some((_pos, ch)) = self.advance() else {
            return Token::eof(self.current_pos, self.line, self.column);
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,

            '.' => self.scan_dot(),
            '+' => self.scan_plus(),
            '-' => self.scan_minus(),
            '*' => self.scan_star(),
            '/' => self.scan_slash(),
            '%' => self.scan_percent(),
            '=' => self.scan_equals(),
            '!' => self.scan_bang(),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '&' => self.scan_ampersand(),
            '|' => self.scan_pipe(),
            '^' => self.scan_caret(),
            '?' => self.scan_question(),
            '#' => self.scan_private_name(),

            '"' | '\'' => self.scan_string(ch),
            '`' => self.scan_template(true),
            '0'..='9' => self.scan_number(ch),
            c if is_id_start(c) => self.scan_identifier(c),

            c => TokenKind::Invalid(c),
        };

        Token::new(kind, self.make_span())
    }

    /// Check if there was a line terminator before the most recent token
    pub fn had_newline_before(&self) -> bool {
        self.saw_newline
    }

    /// Continue a template literal after the `}` that closed a substitution
    pub fn rescan_template_continuation(&mut self, rbrace_span: Span) -> Token {
        self.seek(rbrace_span.end, rbrace_span.line, rbrace_span.column + 1);
        self.start_pos = rbrace_span.start;
        self.start_line = rbrace_span.line;
        self.start_column = rbrace_span.column;
        let kind = self.scan_template(false);
        Token::new(kind, self.make_span())
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = self.chars_base_offset + pos + ch.len_utf8();
            if is_line_terminator(ch) {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let slice = self.source.get(self.current_pos..)?;
        let mut iter = slice.chars();
        iter.next();
        iter.next()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn make_span(&self) -> Span {
        Span::new(
            self.start_pos,
            self.current_pos,
            self.start_line,
            self.start_column,
        )
    }

    /// Returns false on an unterminated block comment
    fn skip_whitespace_and_comments(&mut self) -> bool {
        self.saw_newline = false;

        loop {
            match self.peek() {
                Some(c) if is_line_terminator(c) || c == '\r' => {
                    self.saw_newline = true;
                    self.advance();
                }
                Some(c) if crate::value::is_js_whitespace(c) => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        while let Some(ch) = self.peek() {
                            if is_line_terminator(ch) {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        loop {
                            match self.advance() {
                                Some((_, '*')) if self.peek() == Some('/') => {
                                    self.advance();
                                    break;
                                }
                                Some((_, c)) if is_line_terminator(c) => {
                                    self.saw_newline = true;
                                }
                                Some(_) => {}
                                None => return false,
                            }
                        }
                    }
                    _ => return true,
                },
                _ => return true,
            }
        }
    }

    fn scan_dot(&mut self) -> TokenKind {
        if self.peek() == Some('.') && self.peek_next() == Some('.') {
            self.advance();
            self.advance();
            TokenKind::DotDotDot
        } else if matches!(self.peek(), Some('0'..='9')) {
            self.scan_number('.')
        } else {
            TokenKind::Dot
        }
    }

    fn scan_plus(&mut self) -> TokenKind {
        if self.match_char('+') {
            TokenKind::PlusPlus
        } else if self.match_char('=') {
            TokenKind::PlusEq
        } else {
            TokenKind::Plus
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        if self.match_char('-') {
            TokenKind::MinusMinus
        } else if self.match_char('=') {
            TokenKind::MinusEq
        } else {
            TokenKind::Minus
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        if self.match_char('*') {
            if self.match_char('=') {
                TokenKind::StarStarEq
            } else {
                TokenKind::StarStar
            }
        } else if self.match_char('=') {
            TokenKind::StarEq
        } else {
            TokenKind::Star
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::SlashEq
        } else {
            TokenKind::Slash
        }
    }

    fn scan_percent(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::PercentEq
        } else {
            TokenKind::Percent
        }
    }

    fn scan_equals(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::EqEqEq
            } else {
                TokenKind::EqEq
            }
        } else if self.match_char('>') {
            TokenKind::Arrow
        } else {
            TokenKind::Eq
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::BangEqEq
            } else {
                TokenKind::BangEq
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        if self.match_char('<') {
            if self.match_char('=') {
                TokenKind::LtLtEq
            } else {
                TokenKind::LtLt
            }
        } else if self.match_char('=') {
            TokenKind::LtEq
        } else {
            TokenKind::Lt
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        if self.match_char('>') {
            if self.match_char('>') {
                if self.match_char('=') {
                    TokenKind::GtGtGtEq
                } else {
                    TokenKind::GtGtGt
                }
            } else if self.match_char('=') {
                TokenKind::GtGtEq
            } else {
                TokenKind::GtGt
            }
        } else if self.match_char('=') {
            TokenKind::GtEq
        } else {
            TokenKind::Gt
        }
    }

    fn scan_ampersand(&mut self) -> TokenKind {
        if self.match_char('&') {
            if self.match_char('=') {
                TokenKind::AmpAmpEq
            } else {
                TokenKind::AmpAmp
            }
        } else if self.match_char('=') {
            TokenKind::AmpEq
        } else {
            TokenKind::Amp
        }
    }

    fn scan_pipe(&mut self) -> TokenKind {
        if self.match_char('|') {
            if self.match_char('=') {
                TokenKind::PipePipeEq
            } else {
                TokenKind::PipePipe
            }
        } else if self.match_char('=') {
            TokenKind::PipeEq
        } else {
            TokenKind::Pipe
        }
    }

    fn scan_caret(&mut self) -> TokenKind {
        if self.match_char('=') {
            TokenKind::CaretEq
        } else {
            TokenKind::Caret
        }
    }

    fn scan_question(&mut self) -> TokenKind {
        if self.match_char('?') {
            if self.match_char('=') {
                TokenKind::QuestionQuestionEq
            } else {
                TokenKind::QuestionQuestion
            }
        } else if self.peek() == Some('.') && !matches!(self.peek_next(), Some('0'..='9')) {
            // `a?.5:b` is a conditional, not an optional chain
            self.advance();
            TokenKind::QuestionDot
        } else {
            TokenKind::Question
        }
    }

    fn scan_private_name(&mut self) -> TokenKind {
        match self.peek() {
            Some(c) if is_id_start(c) => {
                self.advance();
                let mut name = String::new();
                name.push(c);
                while let Some(ch) = self.peek() {
                    if !is_id_continue(ch) {
                        break;
                    }
                    name.push(ch);
                    self.advance();
                }
                TokenKind::PrivateName(self.string_dict.get_or_insert(&name))
            }
            _ => TokenKind::Invalid('#'),
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) => {
                    if let Err(kind) = self.scan_escape(&mut value) {
                        return kind;
                    }
                }
                Some((_, '\n' | '\r')) | None => return TokenKind::Unterminated,
                Some((_, c)) => value.push(c),
            }
        }

        TokenKind::String(self.string_dict.get_or_insert(&value))
    }

    /// Escape sequence after a consumed backslash. Octal escapes and
    /// malformed hex/unicode escapes are rejected.
    fn scan_escape(&mut self, value: &mut String) -> Result<(), TokenKind> {
        match self.advance() {
            Some((_, 'n')) => value.push('\n'),
            Some((_, 'r')) => value.push('\r'),
            Some((_, 't')) => value.push('\t'),
            Some((_, 'b')) => value.push('\x08'),
            Some((_, 'f')) => value.push('\x0C'),
            Some((_, 'v')) => value.push('\x0B'),
            Some((_, '0')) if !matches!(self.peek(), Some('0'..='9')) => value.push('\0'),
            Some((_, '0'..='9')) => return Err(TokenKind::Invalid('\\')),
            Some((_, 'x')) => {
                let ch = self
                    .scan_hex_digits(2)
                    .and_then(char::from_u32)
                    .ok_or(TokenKind::Invalid('\\'))?;
                value.push(ch);
            }
            Some((_, 'u')) => {
                let code = self.scan_unicode_escape().ok_or(TokenKind::Invalid('\\'))?;
                push_code_unit(value, code, || self.peek_surrogate_pair());
            }
            // Line continuation
            Some((_, '\r')) => {
                self.match_char('\n');
            }
            Some((_, c)) if is_line_terminator(c) => {}
            Some((_, c)) => value.push(c),
            None => return Err(TokenKind::Unterminated),
        }
        Ok(())
    }

    /// Low half of a `😀` style surrogate pair following a high half
    fn peek_surrogate_pair(&mut self) -> Option<u32> {
        let rest = self.source.get(self.current_pos..)?;
        let hex = rest.strip_prefix("\\u")?.get(..4)?;
        let low = u32::from_str_radix(hex, 16).ok()?;
        if !(0xDC00..=0xDFFF).contains(&low) {
            return None;
        }
        for _ in 0..6 {
            self.advance();
        }
        Some(low)
    }

    fn scan_hex_digits(&mut self, count: usize) -> Option<u32> {
        let mut hex_str = String::new();
        for _ in 0..count {
            match self.peek() {
                Some(ch) if ch.is_ascii_hexdigit() => {
                    hex_str.push(ch);
                    self.advance();
                }
                _ => return None,
            }
        }
        u32::from_str_radix(&hex_str, 16).ok()
    }

    /// `\uNNNN` or `\u{N...}` after the `u`
    fn scan_unicode_escape(&mut self) -> Option<u32> {
        if self.match_char('{') {
            let mut hex_str = String::new();
            loop {
                match self.advance() {
                    Some((_, '}')) => break,
                    Some((_, ch)) if ch.is_ascii_hexdigit() => hex_str.push(ch),
                    _ => return None,
                }
            }
            let code = u32::from_str_radix(&hex_str, 16).ok()?;
            if code > 0x10FFFF { None } else { Some(code) }
        } else {
            self.scan_hex_digits(4)
        }
    }

    /// Template text up to the next `${` or closing backtick
    fn scan_template(&mut self, is_start: bool) -> TokenKind {
        let mut cooked = Some(String::new());
        let mut raw = String::new();

        loop {
            match self.advance() {
                Some((_, '`')) => {
                    let part = self.template_part(cooked, &raw);
                    return if is_start {
                        TokenKind::TemplateNoSub(part)
                    } else {
                        TokenKind::TemplateTail(part)
                    };
                }
                Some((_, '$')) if self.peek() == Some('{') => {
                    self.advance();
                    let part = self.template_part(cooked, &raw);
                    return if is_start {
                        TokenKind::TemplateHead(part)
                    } else {
                        TokenKind::TemplateMiddle(part)
                    };
                }
                Some((_, '\\')) => {
                    let escape_start = self.current_pos;
                    let mut escaped = String::new();
                    let ok = self.scan_escape(&mut escaped).is_ok();
                    raw.push('\\');
                    raw.push_str(self.source.get(escape_start..self.current_pos).unwrap_or(""));
                    match (&mut cooked, ok) {
                        (Some(c), true) => c.push_str(&escaped),
                        _ => cooked = None,
                    }
                    if self.current_pos == escape_start {
                        return TokenKind::Unterminated;
                    }
                }
                // CRLF and CR are normalized to LF in both cooked and raw text
                Some((_, '\r')) => {
                    self.match_char('\n');
                    raw.push('\n');
                    if let Some(c) = &mut cooked {
                        c.push('\n');
                    }
                }
                Some((_, c)) => {
                    raw.push(c);
                    if let Some(cooked) = &mut cooked {
                        cooked.push(c);
                    }
                }
                None => return TokenKind::Unterminated,
            }
        }
    }

    fn template_part(&mut self, cooked: Option<String>, raw: &str) -> TemplatePart {
        TemplatePart {
            cooked: cooked.map(|c| self.string_dict.get_or_insert(&c)),
            raw: self.string_dict.get_or_insert(raw),
        }
    }

    /// Digits of the given radix, with `_` separators dropped
    fn scan_digits(&mut self, radix: u32, out: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_digit(radix) {
                out.push(ch);
                self.advance();
            } else if ch == '_' && self.peek_next().is_some_and(|n| n.is_digit(radix)) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut num_str = String::new();

        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                // Legacy octal (0777) is not supported
                Some('0'..='9') => return TokenKind::Invalid('0'),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.scan_digits(radix, &mut num_str);
                if num_str.is_empty() {
                    return TokenKind::Invalid('0');
                }
                let Some(value) = BigInt::parse_bytes(num_str.as_bytes(), radix) else {
                    return TokenKind::Invalid('0');
                };
                if self.match_char('n') {
                    return TokenKind::BigInt(self.string_dict.get_or_insert(&value.to_string()));
                }
                return self.finish_number(crate::value::bigint_to_f64(&value));
            }
        }

        if first == '.' {
            num_str.push_str("0.");
            self.scan_digits(10, &mut num_str);
        } else {
            num_str.push(first);
            self.scan_digits(10, &mut num_str);

            if self.match_char('n') {
                return TokenKind::BigInt(self.string_dict.get_or_insert(&num_str));
            }

            if self.peek() == Some('.') {
                self.advance();
                num_str.push('.');
                self.scan_digits(10, &mut num_str);
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let next = self.peek_next();
            if matches!(next, Some('0'..='9' | '+' | '-')) {
                self.advance();
                num_str.push('e');
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    self.advance();
                    num_str.push(sign);
                }
                self.scan_digits(10, &mut num_str);
            }
        }

        self.finish_number(num_str.parse().unwrap_or(f64::NAN))
    }

    /// A numeric literal must not run straight into an identifier (`3in`)
    fn finish_number(&mut self, value: f64) -> TokenKind {
        match self.peek() {
            Some(c) if is_id_start(c) => TokenKind::Invalid(c),
            _ => TokenKind::Number(value),
        }
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::new();
        name.push(first);

        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match name.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "var" => TokenKind::Var,
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            "throw" => TokenKind::Throw,
            "new" => TokenKind::New,
            "this" => TokenKind::This,
            "super" => TokenKind::Super,
            "class" => TokenKind::Class,
            "extends" => TokenKind::Extends,
            "static" => TokenKind::Static,
            "import" => TokenKind::Import,
            "export" => TokenKind::Export,
            "typeof" => TokenKind::Typeof,
            "instanceof" => TokenKind::Instanceof,
            "in" => TokenKind::In,
            "of" => TokenKind::Of,
            "void" => TokenKind::Void,
            "delete" => TokenKind::Delete,
            "yield" => TokenKind::Yield,
            "await" => TokenKind::Await,
            "async" => TokenKind::Async,
            "debugger" => TokenKind::Debugger,
            "with" => TokenKind::With,
            "enum" => TokenKind::Enum,
            _ => TokenKind::Identifier(self.string_dict.get_or_insert(&name)),
        }
    }
}

/// Append a code point from a `\u` escape. Lone surrogates cannot live in a
/// Rust string and are replaced with U+FFFD.
fn push_code_unit(value: &mut String, code: u32, low_surrogate: impl FnOnce() -> Option<u32>) {
    if (0xD800..=0xDBFF).contains(&code) {
        if let Some(low) = low_surrogate() {
            let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
            value.push(char::from_u32(combined).unwrap_or('\u{FFFD}'));
            return;
        }
    }
    value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\u{2028}' | '\u{2029}')
}

/// Check if a character can start an identifier
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

/// Check if a character can continue an identifier
fn is_id_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || ch == '\u{200C}' || ch == '\u{200D}' || ch.is_alphanumeric()
}
