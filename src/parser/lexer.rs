//! Lexer (tokenizer) for TinyML source code
//!
//! Converts raw source text into a lazy stream of [`Token`]s consumed by the
//! parser. At each position the lexer tries, in order: whitespace, `(* ... *)`
//! comments, `#"c"` characters, `"..."` strings, `~?[0-9]+` integers,
//! identifiers (reclassified as keywords or booleans afterwards), type
//! variables, and finally punctuation with two-character symbols first.
//!
//! The first error ends the stream; there is no recovery. A fresh lexer can be
//! started at any byte offset with [`Lexer::starting_at`].

use super::ast::SourceLocation;
use log::trace;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::fmt;
use std::iter::FusedIterator;
use thiserror::Error;

/// Reserved words used by grammar productions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keyword {
    Val,
    Fun,
    If,
    Then,
    Else,
    Let,
    In,
    End,
    Fn,
    Int,
    Char,
    String,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Val => "val",
            Keyword::Fun => "fun",
            Keyword::If => "if",
            Keyword::Then => "then",
            Keyword::Else => "else",
            Keyword::Let => "let",
            Keyword::In => "in",
            Keyword::End => "end",
            Keyword::Fn => "fn",
            Keyword::Int => "int",
            Keyword::Char => "char",
            Keyword::String => "string",
        }
    }
}

/// Punctuation and operator symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Punct {
    Arrow,      // ->
    FatArrow,   // =>
    Le,         // <=
    Ge,         // >=
    LParen,     // (
    RParen,     // )
    Comma,      // ,
    Semicolon,  // ;
    Colon,      // :
    Eq,         // =
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Lt,         // <
    Gt,         // >
    LBracket,   // [
    RBracket,   // ]
    Bar,        // |
    Underscore, // _
}

impl Punct {
    pub fn as_str(self) -> &'static str {
        match self {
            Punct::Arrow => "->",
            Punct::FatArrow => "=>",
            Punct::Le => "<=",
            Punct::Ge => ">=",
            Punct::LParen => "(",
            Punct::RParen => ")",
            Punct::Comma => ",",
            Punct::Semicolon => ";",
            Punct::Colon => ":",
            Punct::Eq => "=",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Lt => "<",
            Punct::Gt => ">",
            Punct::LBracket => "[",
            Punct::RBracket => "]",
            Punct::Bar => "|",
            Punct::Underscore => "_",
        }
    }
}

/// All token variants produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Ident(String),
    /// `'a`, without the leading quote; may be empty
    TypeVar(String),
    /// `42` / `~42`; `value` is the magnitude
    IntLiteral { value: i64, negated: bool },
    CharLiteral(u8),
    StringLiteral(String),
    BoolLiteral(bool),
    Punct(Punct),
    Eof,
}

/// A token and the position of its first character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, location: SourceLocation) -> Self {
        Token { kind, location }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            TokenKind::Ident(s) => write!(f, "identifier '{}'", s),
            TokenKind::TypeVar(s) => write!(f, "type variable '{}", s),
            TokenKind::IntLiteral { value, negated } => {
                write!(f, "int literal {}{}", if *negated { "~" } else { "" }, value)
            }
            TokenKind::CharLiteral(c) => {
                if c.is_ascii_graphic() || *c == b' ' {
                    write!(f, "char literal #\"{}\"", *c as char)
                } else {
                    write!(f, "char literal #\"\\x{:02x}\"", c)
                }
            }
            TokenKind::StringLiteral(s) => write!(f, "string literal \"{}\"", s),
            TokenKind::BoolLiteral(b) => write!(f, "'{}'", b),
            TokenKind::Punct(p) => write!(f, "'{}'", p.as_str()),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Identifier spellings that are not identifiers
static RESERVED: Lazy<FxHashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let keywords = [
        Keyword::Val,
        Keyword::Fun,
        Keyword::If,
        Keyword::Then,
        Keyword::Else,
        Keyword::Let,
        Keyword::In,
        Keyword::End,
        Keyword::Fn,
        Keyword::Int,
        Keyword::Char,
        Keyword::String,
    ];
    let mut map: FxHashMap<&'static str, TokenKind> = keywords
        .into_iter()
        .map(|kw| (kw.as_str(), TokenKind::Keyword(kw)))
        .collect();
    map.insert("true", TokenKind::BoolLiteral(true));
    map.insert("false", TokenKind::BoolLiteral(false));
    map
});

/// What went wrong while lexing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated character literal")]
    UnterminatedChar,
    #[error("invalid character literal")]
    InvalidCharLiteral,
    #[error("unrecognized character {0:?}")]
    UnrecognizedCharacter(char),
    #[error("integer literal {0} does not fit in 64 bits")]
    IntegerOutOfRange(String),
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lexical error at {location}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub location: SourceLocation,
}

impl LexError {
    fn new(kind: LexErrorKind, location: SourceLocation) -> Self {
        LexError { kind, location }
    }
}

/// Lexer for TinyML source code
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Create a lexer that starts at byte `offset` of `input`, with line and
    /// column numbers computed from the text before it.
    ///
    /// An offset inside a multi-byte character is moved back to the start of
    /// that character; an offset past the end starts at the end.
    pub fn starting_at(input: &'a str, offset: usize) -> Self {
        let mut offset = offset.min(input.len());
        while !input.is_char_boundary(offset) {
            offset -= 1;
        }

        let prefix = &input[..offset];
        let line = 1 + prefix.matches('\n').count();
        let line_start = prefix.rfind('\n').map_or(0, |i| i + 1);
        let column = 1 + prefix[line_start..].chars().count();

        Self {
            input,
            position: offset,
            line,
            column,
            finished: false,
        }
    }

    /// Tokenize the entire input, ending with an EOF token
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        self.by_ref().collect()
    }

    /// Produce the next token, skipping whitespace and comments first
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments()?;

        let loc = self.current_location();
        let Some(ch) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, loc));
        };

        let kind = match ch {
            '#' if self.peek_ahead(1) == Some('"') => self.char_literal()?,
            '"' => self.string_literal()?,
            '0'..='9' => self.number_literal(false, loc)?,
            '~' if matches!(self.peek_ahead(1), Some('0'..='9')) => {
                self.advance();
                self.number_literal(true, loc)?
            }
            'a'..='z' | 'A'..='Z' => self.identifier_or_keyword(),
            '\'' => self.type_variable(),
            _ => self.punctuation(ch)?,
        };

        Ok(Token::new(kind, loc))
    }

    /// Parse character literal: `#"c"`
    fn char_literal(&mut self) -> Result<TokenKind, LexError> {
        let loc = self.current_location();
        self.advance(); // skip '#'
        self.advance(); // skip '"'

        let value = match self.peek() {
            None | Some('\r') | Some('\n') => {
                return Err(LexError::new(LexErrorKind::UnterminatedChar, loc));
            }
            Some('"') => {
                return Err(LexError::new(LexErrorKind::InvalidCharLiteral, loc));
            }
            Some(ch) if !ch.is_ascii() => {
                return Err(LexError::new(LexErrorKind::InvalidCharLiteral, loc));
            }
            Some(ch) => {
                self.advance();
                ch as u8
            }
        };

        match self.peek() {
            Some('"') => {
                self.advance();
                Ok(TokenKind::CharLiteral(value))
            }
            None | Some('\r') | Some('\n') => {
                Err(LexError::new(LexErrorKind::UnterminatedChar, loc))
            }
            Some(_) => Err(LexError::new(LexErrorKind::InvalidCharLiteral, loc)),
        }
    }

    /// Parse string literal; no escapes, no line breaks
    fn string_literal(&mut self) -> Result<TokenKind, LexError> {
        let loc = self.current_location();
        self.advance(); // skip opening quote
        let start = self.position;

        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    let contents = self.input[start..self.position].to_string();
                    self.advance();
                    return Ok(TokenKind::StringLiteral(contents));
                }
                '\r' | '\n' => break,
                _ => {
                    self.advance();
                }
            }
        }

        Err(LexError::new(LexErrorKind::UnterminatedString, loc))
    }

    /// Parse the digits of an integer literal; a `~` has already been consumed
    fn number_literal(
        &mut self,
        negated: bool,
        loc: SourceLocation,
    ) -> Result<TokenKind, LexError> {
        let start = self.position;

        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }

        let digits = &self.input[start..self.position];
        let value = digits.parse::<i64>().map_err(|_| {
            LexError::new(LexErrorKind::IntegerOutOfRange(digits.to_string()), loc)
        })?;

        Ok(TokenKind::IntLiteral { value, negated })
    }

    /// Parse identifier, then reclassify it if the spelling is reserved
    fn identifier_or_keyword(&mut self) -> TokenKind {
        let start = self.position;
        self.advance();
        self.skip_identifier_tail();

        let ident = &self.input[start..self.position];
        match RESERVED.get(ident) {
            Some(kind) => kind.clone(),
            None => TokenKind::Ident(ident.to_string()),
        }
    }

    /// Parse type variable: `'` followed by any identifier characters
    fn type_variable(&mut self) -> TokenKind {
        self.advance(); // skip '\''
        let start = self.position;
        self.skip_identifier_tail();
        TokenKind::TypeVar(self.input[start..self.position].to_string())
    }

    fn skip_identifier_tail(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '\'' || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn punctuation(&mut self, ch: char) -> Result<TokenKind, LexError> {
        let loc = self.current_location();
        let two = match (ch, self.peek_ahead(1)) {
            ('-', Some('>')) => Some(Punct::Arrow),
            ('=', Some('>')) => Some(Punct::FatArrow),
            ('<', Some('=')) => Some(Punct::Le),
            ('>', Some('=')) => Some(Punct::Ge),
            _ => None,
        };
        if let Some(punct) = two {
            self.advance();
            self.advance();
            return Ok(TokenKind::Punct(punct));
        }

        let punct = match ch {
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            ',' => Punct::Comma,
            ';' => Punct::Semicolon,
            ':' => Punct::Colon,
            '=' => Punct::Eq,
            '+' => Punct::Plus,
            '-' => Punct::Minus,
            '*' => Punct::Star,
            '/' => Punct::Slash,
            '<' => Punct::Lt,
            '>' => Punct::Gt,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            '|' => Punct::Bar,
            '_' => Punct::Underscore,
            _ => {
                return Err(LexError::new(
                    LexErrorKind::UnrecognizedCharacter(ch),
                    loc,
                ));
            }
        };
        self.advance();
        Ok(TokenKind::Punct(punct))
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('(') if self.peek_ahead(1) == Some('*') => {
                    self.skip_block_comment()?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip comment (* ... *); comments do not nest
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_loc = self.current_location();
        self.advance(); // skip '('
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some(')') {
                self.advance(); // skip '*'
                self.advance(); // skip ')'
                return Ok(());
            }
            self.advance();
        }

        Err(LexError::new(LexErrorKind::UnterminatedComment, start_loc))
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input[self.position..].chars().nth(n)
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.position, self.line, self.column)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    /// Yields tokens up to and including EOF, or up to the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.next_token();
        match &result {
            Ok(token) => {
                trace!("lexed {} at {}:{}", token, token.location.line, token.location.column);
                self.finished = token.is_eof();
            }
            Err(err) => {
                trace!("{}", err);
                self.finished = true;
            }
        }
        Some(result)
    }
}

impl FusedIterator for Lexer<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn lex_error(source: &str) -> LexError {
        Lexer::new(source).tokenize().unwrap_err()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("val x = f 1");

        assert_eq!(tokens[0], TokenKind::Keyword(Keyword::Val));
        assert!(matches!(tokens[1], TokenKind::Ident(ref s) if s == "x"));
        assert_eq!(tokens[2], TokenKind::Punct(Punct::Eq));
        assert!(matches!(tokens[3], TokenKind::Ident(ref s) if s == "f"));
        assert_eq!(
            tokens[4],
            TokenKind::IntLiteral {
                value: 1,
                negated: false
            }
        );
        assert_eq!(tokens[5], TokenKind::Eof);
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_multi_char_punctuation() {
        let tokens = kinds("-> => <= >= - = < > | _");

        let expected = [
            Punct::Arrow,
            Punct::FatArrow,
            Punct::Le,
            Punct::Ge,
            Punct::Minus,
            Punct::Eq,
            Punct::Lt,
            Punct::Gt,
            Punct::Bar,
            Punct::Underscore,
        ];
        for (token, punct) in tokens.iter().zip(expected) {
            assert_eq!(*token, TokenKind::Punct(punct));
        }
    }

    #[test]
    fn test_negated_integer() {
        let tokens = kinds("~42 42");
        assert_eq!(
            tokens[0],
            TokenKind::IntLiteral {
                value: 42,
                negated: true
            }
        );
        assert_eq!(
            tokens[1],
            TokenKind::IntLiteral {
                value: 42,
                negated: false
            }
        );
    }

    #[test]
    fn test_tilde_without_digits() {
        let err = lex_error("~ 1");
        assert_eq!(err.kind, LexErrorKind::UnrecognizedCharacter('~'));
        assert_eq!(err.location.column, 1);
    }

    #[test]
    fn test_integer_out_of_range() {
        let err = lex_error("99999999999999999999");
        assert!(matches!(err.kind, LexErrorKind::IntegerOutOfRange(_)));
    }

    #[test]
    fn test_keywords_after_maximal_munch() {
        let tokens = kinds("fn fnord true trueish int interval");

        assert_eq!(tokens[0], TokenKind::Keyword(Keyword::Fn));
        assert!(matches!(tokens[1], TokenKind::Ident(ref s) if s == "fnord"));
        assert_eq!(tokens[2], TokenKind::BoolLiteral(true));
        assert!(matches!(tokens[3], TokenKind::Ident(ref s) if s == "trueish"));
        assert_eq!(tokens[4], TokenKind::Keyword(Keyword::Int));
        assert!(matches!(tokens[5], TokenKind::Ident(ref s) if s == "interval"));
    }

    #[test]
    fn test_identifier_characters() {
        let tokens = kinds("x' foo_bar2 case");
        assert!(matches!(tokens[0], TokenKind::Ident(ref s) if s == "x'"));
        assert!(matches!(tokens[1], TokenKind::Ident(ref s) if s == "foo_bar2"));
        // not reserved
        assert!(matches!(tokens[2], TokenKind::Ident(ref s) if s == "case"));
    }

    #[test]
    fn test_type_variables() {
        let tokens = kinds("'a 'b2 ' ->");
        assert!(matches!(tokens[0], TokenKind::TypeVar(ref s) if s == "a"));
        assert!(matches!(tokens[1], TokenKind::TypeVar(ref s) if s == "b2"));
        assert!(matches!(tokens[2], TokenKind::TypeVar(ref s) if s.is_empty()));
        assert_eq!(tokens[3], TokenKind::Punct(Punct::Arrow));
    }

    #[test]
    fn test_standalone_underscore() {
        let tokens = kinds("_x");
        assert_eq!(tokens[0], TokenKind::Punct(Punct::Underscore));
        assert!(matches!(tokens[1], TokenKind::Ident(ref s) if s == "x"));
    }

    #[test]
    fn test_comments() {
        let tokens = kinds("val (* a comment\n spanning lines *) x (**) = 1");

        assert_eq!(tokens[0], TokenKind::Keyword(Keyword::Val));
        assert!(matches!(tokens[1], TokenKind::Ident(ref s) if s == "x"));
        assert_eq!(tokens[2], TokenKind::Punct(Punct::Eq));
    }

    #[test]
    fn test_comments_do_not_nest() {
        let tokens = kinds("(* outer (* inner *) x");
        assert!(matches!(tokens[0], TokenKind::Ident(ref s) if s == "x"));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = lex_error("val x = 1 (* never closed");
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
        assert_eq!(err.location.column, 11);
    }

    #[test]
    fn test_string_literal() {
        let tokens = kinds(r#""hello world" """#);
        assert!(matches!(tokens[0], TokenKind::StringLiteral(ref s) if s == "hello world"));
        assert!(matches!(tokens[1], TokenKind::StringLiteral(ref s) if s.is_empty()));
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(lex_error("\"abc").kind, LexErrorKind::UnterminatedString);
        assert_eq!(
            lex_error("\"abc\ndef\"").kind,
            LexErrorKind::UnterminatedString
        );
    }

    #[test]
    fn test_char_literal() {
        let tokens = kinds(r##"#"a" #" ""##);
        assert_eq!(tokens[0], TokenKind::CharLiteral(b'a'));
        assert_eq!(tokens[1], TokenKind::CharLiteral(b' '));
    }

    #[test]
    fn test_malformed_char_literals() {
        assert_eq!(lex_error(r##"#"""##).kind, LexErrorKind::InvalidCharLiteral);
        assert_eq!(lex_error(r##"#"ab""##).kind, LexErrorKind::InvalidCharLiteral);
        assert_eq!(lex_error(r##"#"a"##).kind, LexErrorKind::UnterminatedChar);
        assert_eq!(lex_error("#\"\n\"").kind, LexErrorKind::UnterminatedChar);
        assert_eq!(lex_error("#a").kind, LexErrorKind::UnrecognizedCharacter('#'));
    }

    #[test]
    fn test_unrecognized_character() {
        let err = lex_error("val x = 1\nval y = @");
        assert_eq!(err.kind, LexErrorKind::UnrecognizedCharacter('@'));
        assert_eq!(err.location, SourceLocation::new(18, 2, 9));
    }

    #[test]
    fn test_locations() {
        let tokens = Lexer::new("val\n  xs = []").tokenize().unwrap();
        assert_eq!(tokens[0].location, SourceLocation::new(0, 1, 1));
        assert_eq!(tokens[1].location, SourceLocation::new(6, 2, 3));
        assert_eq!(tokens[2].location, SourceLocation::new(9, 2, 6));
        assert_eq!(tokens[3].location, SourceLocation::new(11, 2, 8));
    }

    #[test]
    fn test_stream_stops_after_error() {
        let mut lexer = Lexer::new("a $ b");
        assert!(matches!(lexer.next(), Some(Ok(_))));
        assert!(matches!(lexer.next(), Some(Err(_))));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_stream_stops_after_eof() {
        let mut lexer = Lexer::new("");
        assert!(matches!(lexer.next(), Some(Ok(ref t)) if t.is_eof()));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_restart_at_offset() {
        let source = "val a = 1\nval b = 2";
        let tokens: Vec<Token> = Lexer::starting_at(source, 10)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Val));
        assert_eq!(tokens[0].location, SourceLocation::new(10, 2, 1));
        assert!(matches!(tokens[1].kind, TokenKind::Ident(ref s) if s == "b"));
        assert_eq!(tokens[1].location, SourceLocation::new(14, 2, 5));
    }
}
