mod token;
pub use token::{Line, Literal, Token, TokenKind};

use TokenKind::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("Unexpected character.")]
    UnexpectedCharacter { character: char, line: Line },
    #[error("Unterminated string.")]
    UnterminatedString { line: Line },
}

impl ScanError {
    pub fn line(&self) -> Line {
        match self {
            ScanError::UnexpectedCharacter { line, .. } | ScanError::UnterminatedString { line } => {
                *line
            }
        }
    }
}

pub struct Scanner {
    start: usize,
    current: usize,
    line: usize,
    source: Vec<char>,
    tokens: Vec<Token>,
    errors: Vec<ScanError>,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self {
            start: 0,
            current: 0,
            line: 1,
            source: source.chars().collect(),
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.push_token(Token::new(kind, self.lexeme(), self.line));
    }

    fn add_literal_token(&mut self, kind: TokenKind, literal: Literal) {
        self.push_token(Token::new(kind, self.lexeme(), self.line).with_literal(literal));
    }

    fn push_token(&mut self, token: Token) {
        log::trace!("Scanned {} {:?} (line {})", token.kind, token.lexeme, token.line);
        self.tokens.push(token);
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.current + 1).copied()
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.current += 1;
        Some(c)
    }

    fn consume_if_matches(&mut self, expected: char) -> bool {
        match self.peek() {
            Some(c) if c == expected => {
                self.current += 1;
                true
            }
            _ => false,
        }
    }

    fn either(&mut self, expected: char, matched: TokenKind, otherwise: TokenKind) {
        let kind = if self.consume_if_matches(expected) { matched } else { otherwise };
        self.add_token(kind);
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, Vec<ScanError>> {
        while let Some(c) = self.consume() {
            self.start = self.current - 1;
            match c {
                '(' => self.add_token(LeftParen),
                ')' => self.add_token(RightParen),
                '{' => self.add_token(LeftBrace),
                '}' => self.add_token(RightBrace),
                ',' => self.add_token(Comma),
                '.' => self.add_token(Dot),
                '-' => self.add_token(Minus),
                '+' => self.add_token(Plus),
                ';' => self.add_token(Semicolon),
                '*' => self.add_token(Star),
                '?' => self.add_token(Question),
                ':' => self.add_token(Colon),

                '!' => self.either('=', BangEqual, Bang),
                '=' => self.either('=', EqualEqual, Equal),
                '<' => self.either('=', LessEqual, Less),
                '>' => self.either('=', GreaterEqual, Greater),

                '/' => {
                    if self.consume_if_matches('/') {
                        // Comment
                        while self.peek().is_some_and(|c| c != '\n') {
                            self.current += 1;
                        }
                    } else {
                        self.add_token(Slash)
                    }
                }

                '"' => self.string(),

                d if d.is_ascii_digit() => self.number(),

                a if is_alpha(a) => self.identifier(),

                ' ' | '\r' | '\t' => (),

                '\n' => self.line += 1,

                character => self
                    .errors
                    .push(ScanError::UnexpectedCharacter { character, line: Line(self.line) }),
            }
        }

        self.tokens.push(Token::new(Eof, "", self.line));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    fn string(&mut self) {
        loop {
            match self.consume() {
                Some('"') => break,
                Some('\n') => self.line += 1,
                Some(_) => (),
                None => {
                    self.errors.push(ScanError::UnterminatedString { line: Line(self.line) });
                    return;
                }
            }
        }

        let value = self.source[self.start + 1..self.current - 1].iter().collect();
        self.add_literal_token(Str, Literal::Str(value));
    }

    fn number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.current += 1;
        }

        // A trailing '.' without digits is not part of the number.
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.current += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.current += 1;
            }
        }

        let lexeme = self.lexeme();
        match lexeme.parse::<f64>() {
            Ok(n) => self.add_literal_token(Number, Literal::Number(n)),
            Err(_) => unreachable!("digits with an optional fraction always parse: {lexeme}"),
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(|c| is_alpha(c) || c.is_ascii_digit()) {
            self.current += 1;
        }

        let kind = TokenKind::keyword(&self.lexeme()).unwrap_or(Identifier);
        self.add_token(kind);
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source).scan_tokens().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn string_literals() {
        let tokens = Scanner::new("\"hello world\"").scan_tokens().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(Str, "\"hello world\"", 1)
                    .with_literal(Literal::Str("hello world".to_string())),
                Token::new(Eof, "", 1),
            ]
        );

        let errors = Scanner::new("\"hello world").scan_tokens().unwrap_err();
        assert_eq!(errors, vec![ScanError::UnterminatedString { line: Line(1) }]);
    }

    #[test]
    fn multiline_string_advances_line() {
        let tokens = Scanner::new("\"a\nb\" x").scan_tokens().unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Str("a\nb".to_string())));
        assert_eq!(tokens[1].line, Line(2));
    }

    #[test]
    fn two_char_tokens() {
        assert_eq!(
            kinds("! != = == < <= > >="),
            vec![Bang, BangEqual, Equal, EqualEqual, Less, LessEqual, Greater, GreaterEqual, Eof]
        );
    }

    #[test]
    fn single_char_tokens() {
        assert_eq!(
            kinds("=(){},.-+;*/!<>?:"),
            vec![
                Equal, LeftParen, RightParen, LeftBrace, RightBrace, Comma, Dot, Minus, Plus,
                Semicolon, Star, Slash, Bang, Less, Greater, Question, Colon, Eof
            ]
        );
    }

    #[test]
    fn numbers() {
        let tokens = Scanner::new("12 3.25 7.").scan_tokens().unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Number(12.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(3.25)));
        assert_eq!(tokens[2].literal, Some(Literal::Number(7.0)));
        assert_eq!(tokens[3].kind, Dot);
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            kinds("var _x1 = nil and orchid or while"),
            vec![Var, Identifier, Equal, Nil, And, Identifier, Or, While, Eof]
        );
    }

    #[test]
    fn comments() {
        let tokens = Scanner::new("a // comment\nb").scan_tokens().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(Identifier, "a", 1),
                Token::new(Identifier, "b", 2),
                Token::new(Eof, "", 2),
            ]
        );
    }

    #[test]
    fn keeps_scanning_after_errors() {
        let errors = Scanner::new("@\nvar $ = 1;").scan_tokens().unwrap_err();
        assert_eq!(
            errors,
            vec![
                ScanError::UnexpectedCharacter { character: '@', line: Line(1) },
                ScanError::UnexpectedCharacter { character: '$', line: Line(2) },
            ]
        );
        assert_eq!(errors[0].to_string(), "Unexpected character.");
    }
}
