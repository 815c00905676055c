//! Lexer for Bamboo
//!
//! Converts source code into a lazy stream of tokens. The lexer never
//! fails: characters it does not understand come out as `Illegal` tokens
//! and an unterminated string yields whatever text was consumed.

use crate::token::{lookup_ident, Span, Token, TokenKind};

/// The lexer state
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer from source code
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire source, including the trailing EOF token
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is(TokenKind::Eof);
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    /// Consume and return exactly one token. Once the input is exhausted
    /// every further call returns an EOF token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start_line = self.line;
        let start_column = self.column;

        let Some(&(start_pos, ch)) = self.chars.peek() else {
            let span = Span::new(self.current_pos, self.current_pos, start_line, start_column);
            return Token::new(TokenKind::Eof, "", span);
        };

        // String contents differ from the raw source slice (no quotes)
        let mut scanned = None;

        let kind = match ch {
            '+' => { self.advance(); TokenKind::Plus }
            '-' => { self.advance(); TokenKind::Minus }
            '*' => { self.advance(); TokenKind::Asterisk }
            '/' => { self.advance(); TokenKind::Slash }
            '<' => { self.advance(); TokenKind::Lt }
            '>' => { self.advance(); TokenKind::Gt }
            ',' => { self.advance(); TokenKind::Comma }
            ';' => { self.advance(); TokenKind::Semicolon }
            ':' => { self.advance(); TokenKind::Colon }
            '(' => { self.advance(); TokenKind::LeftParen }
            ')' => { self.advance(); TokenKind::RightParen }
            '{' => { self.advance(); TokenKind::LeftBrace }
            '}' => { self.advance(); TokenKind::RightBrace }
            '[' => { self.advance(); TokenKind::LeftBracket }
            ']' => { self.advance(); TokenKind::RightBracket }

            // Potentially two-character tokens
            '=' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }

            '"' => {
                scanned = Some(self.scan_string());
                TokenKind::String
            }

            c if c.is_ascii_digit() => {
                self.eat_while(|c| c.is_ascii_digit());
                TokenKind::Int
            }

            c if is_letter(c) => {
                self.eat_while(is_letter);
                lookup_ident(&self.source[start_pos..self.current_pos])
            }

            _ => {
                self.advance();
                TokenKind::Illegal
            }
        };

        let literal = match scanned {
            Some(content) => content,
            None => self.source[start_pos..self.current_pos].to_string(),
        };
        let span = Span::new(start_pos, self.current_pos, start_line, start_column);
        tracing::trace!(kind = %kind, literal = %literal, "token");

        Token::new(kind, literal, span)
    }

    /// Advance and return the current character
    fn advance(&mut self) -> Option<char> {
        let (pos, ch) = self.chars.next()?;
        self.current_pos = pos + ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Peek at the next character without advancing
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, ch)| ch)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&pred) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        self.eat_while(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    }

    /// Scan a string literal. The closing quote is optional: end of input
    /// terminates the literal silently.
    fn scan_string(&mut self) -> String {
        // Consume opening quote
        self.advance();
        let start = self.current_pos;

        while let Some(c) = self.peek_char() {
            if c == '"' {
                let value = self.source[start..self.current_pos].to_string();
                self.advance();
                return value;
            }
            self.advance();
        }

        self.source[start..self.current_pos].to_string()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        (!token.is(TokenKind::Eof)).then_some(token)
    }
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|t| t.kind).collect()
    }

    fn pairs(source: &str) -> Vec<(TokenKind, String)> {
        Lexer::new(source).map(|t| (t.kind, t.literal)).collect()
    }

    #[test]
    fn test_operators_and_delimiters() {
        let tokens = kinds("=+(){},;-!*/<>[]:");
        assert_eq!(tokens, vec![
            TokenKind::Assign,
            TokenKind::Plus,
            TokenKind::LeftParen,
            TokenKind::RightParen,
            TokenKind::LeftBrace,
            TokenKind::RightBrace,
            TokenKind::Comma,
            TokenKind::Semicolon,
            TokenKind::Minus,
            TokenKind::Bang,
            TokenKind::Asterisk,
            TokenKind::Slash,
            TokenKind::Lt,
            TokenKind::Gt,
            TokenKind::LeftBracket,
            TokenKind::RightBracket,
            TokenKind::Colon,
        ]);
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(pairs("10 == 10; 10 != 9; !x"), vec![
            (TokenKind::Int, "10".to_string()),
            (TokenKind::Eq, "==".to_string()),
            (TokenKind::Int, "10".to_string()),
            (TokenKind::Semicolon, ";".to_string()),
            (TokenKind::Int, "10".to_string()),
            (TokenKind::NotEq, "!=".to_string()),
            (TokenKind::Int, "9".to_string()),
            (TokenKind::Semicolon, ";".to_string()),
            (TokenKind::Bang, "!".to_string()),
            (TokenKind::Ident, "x".to_string()),
        ]);
    }

    #[test]
    fn test_keywords() {
        let tokens = kinds("fn func let true false if else return while");
        assert_eq!(tokens, vec![
            TokenKind::Function,
            TokenKind::Function,
            TokenKind::Let,
            TokenKind::True,
            TokenKind::False,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::Return,
            TokenKind::While,
        ]);
    }

    #[test]
    fn test_identifiers_exclude_digits() {
        assert_eq!(pairs("foo_bar x1 _private"), vec![
            (TokenKind::Ident, "foo_bar".to_string()),
            (TokenKind::Ident, "x".to_string()),
            (TokenKind::Int, "1".to_string()),
            (TokenKind::Ident, "_private".to_string()),
        ]);
    }

    #[test]
    fn test_strings() {
        assert_eq!(pairs(r#""foobar" "foo bar" """#), vec![
            (TokenKind::String, "foobar".to_string()),
            (TokenKind::String, "foo bar".to_string()),
            (TokenKind::String, String::new()),
        ]);
    }

    #[test]
    fn test_unterminated_string_is_silent() {
        assert_eq!(pairs(r#""hello wor"#), vec![
            (TokenKind::String, "hello wor".to_string()),
        ]);
    }

    #[test]
    fn test_illegal_characters() {
        assert_eq!(pairs("1 @ 2 $"), vec![
            (TokenKind::Int, "1".to_string()),
            (TokenKind::Illegal, "@".to_string()),
            (TokenKind::Int, "2".to_string()),
            (TokenKind::Illegal, "$".to_string()),
        ]);
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().kind, TokenKind::Ident);
        for _ in 0..3 {
            let token = lexer.next_token();
            assert_eq!(token.kind, TokenKind::Eof);
            assert_eq!(token.literal, "");
        }
    }

    #[test]
    fn test_tokenize_ends_with_single_eof() {
        let tokens = Lexer::new("let x = 5;").tokenize();
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = Lexer::new("let\n  x").tokenize();
        assert_eq!(tokens[0].span, Span::new(0, 3, 1, 1));
        assert_eq!(tokens[1].span, Span::new(6, 7, 2, 3));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_string_tokens_are_traced() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            Lexer::new(r#"len("bamboo")"#).tokenize();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("kind=STRING literal=bamboo"), "trace output: {}", output);
        assert!(output.contains("kind=IDENT literal=len"), "trace output: {}", output);
    }
}
