use super::error::ParseError;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// Kinds of tokens produced by the condition tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    BeginningOfInput,
    EndOfInput,
    Invalid,
    Number,
    String,
    Keyword,
    LeftParen,
    RightParen,
    Dot,
    Comma,
    Minus,
    Not,
    And,
    Or,
    EqualTo,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Single-character punctuation tokens; anything else in printable ASCII is invalid
fn punctuation_kind(ch: char) -> Option<TokenKind> {
    match ch {
        '(' => Some(TokenKind::LeftParen),
        ')' => Some(TokenKind::RightParen),
        '.' => Some(TokenKind::Dot),
        ',' => Some(TokenKind::Comma),
        '!' => Some(TokenKind::Not),
        '-' => Some(TokenKind::Minus),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text of the token (string tokens keep their quotes)
    pub text: String,
    /// Byte offset of the token in the input
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

/// Hand-written tokenizer holding one token of lookahead
///
/// The current token is available through [`Tokenizer::token`];
/// [`Tokenizer::next_token`] replaces it with the following one.
pub struct Tokenizer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    current: Token,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer positioned on the first token of `input`
    pub fn new(input: &'a str) -> Result<Self, ParseError> {
        let mut tokenizer = Self {
            input,
            chars: input.char_indices().peekable(),
            current: Token::new(TokenKind::BeginningOfInput, "", 0),
        };
        tokenizer.next_token()?;
        Ok(tokenizer)
    }

    pub fn token(&self) -> &Token {
        &self.current
    }

    pub fn kind(&self) -> TokenKind {
        self.current.kind
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub fn is_eof(&self) -> bool {
        self.is(TokenKind::EndOfInput)
    }

    pub fn is_number(&self) -> bool {
        self.is(TokenKind::Number)
    }

    /// Keywords match case-insensitively
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.is(TokenKind::Keyword) && self.current.text.eq_ignore_ascii_case(keyword)
    }

    /// Value of the current string token with quotes removed and `''` unescaped
    pub fn string_value(&self) -> String {
        let text = &self.current.text;
        let inner = text
            .strip_prefix('\'')
            .and_then(|t| t.strip_suffix('\''))
            .unwrap_or(text);
        inner.replace("''", "'")
    }

    /// Consume the current token, which must be of the given kind
    pub fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.current.kind != kind {
            return Err(ParseError::ExpectedToken {
                expected: kind,
                actual: self.current.kind,
                text: self.current.text.clone(),
                position: self.current.position,
            });
        }
        self.next_token()?;
        Ok(())
    }

    /// Consume the current token, which must be a keyword, and return its text
    pub fn eat_keyword(&mut self) -> Result<String, ParseError> {
        if self.current.kind != TokenKind::Keyword {
            return Err(ParseError::IdentifierExpected {
                position: self.current.position,
            });
        }
        let keyword = std::mem::take(&mut self.current.text);
        self.next_token()?;
        Ok(keyword)
    }

    /// Next character of input without consuming it
    pub fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, ch)| ch)
    }

    /// Byte offset of the next unread character
    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn read_char(&mut self) -> Option<char> {
        self.chars.next().map(|(_, ch)| ch)
    }

    /// Read the next token from input and make it current
    pub fn next_token(&mut self) -> Result<&Token, ParseError> {
        if self.current.kind == TokenKind::EndOfInput {
            return Err(ParseError::PastEndOfInput);
        }

        self.skip_whitespace();
        let start = self.offset();

        let Some(ch) = self.peek_char() else {
            self.current = Token::new(TokenKind::EndOfInput, "", start);
            return Ok(&self.current);
        };

        self.current = if ch.is_ascii_digit() {
            self.read_number(start)
        } else if ch == '\'' {
            self.read_string(start)?
        } else if ch == '_' || ch.is_alphabetic() {
            self.read_keyword(start)
        } else if ch == '}' || ch == ':' {
            // condition embedded in an enclosing template ends here
            Token::new(TokenKind::EndOfInput, "", start)
        } else if let Some(token) = self.read_operator(ch, start)? {
            token
        } else if (' '..='\u{7f}').contains(&ch) {
            match punctuation_kind(ch) {
                Some(kind) => {
                    self.read_char();
                    Token::new(kind, ch.to_string(), start)
                }
                None => {
                    return Err(ParseError::InvalidPunctuation {
                        found: ch,
                        position: start,
                    });
                }
            }
        } else {
            return Err(ParseError::InvalidToken {
                found: ch,
                position: start,
            });
        };

        Ok(&self.current)
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.read_char();
        }
    }

    /// Digits with dot-separated fractional part; a second dot ends the number
    fn read_number(&mut self, start: usize) -> Token {
        let mut seen_dot = false;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.read_char();
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                self.read_char();
            } else {
                break;
            }
        }
        let end = self.offset();
        Token::new(TokenKind::Number, &self.input[start..end], start)
    }

    fn read_string(&mut self, start: usize) -> Result<Token, ParseError> {
        self.read_char();
        loop {
            match self.read_char() {
                None => return Err(ParseError::UnterminatedString { position: start }),
                Some('\'') if self.peek_char() == Some('\'') => {
                    self.read_char();
                }
                Some('\'') => break,
                Some(_) => {}
            }
        }
        let end = self.offset();
        Ok(Token::new(TokenKind::String, &self.input[start..end], start))
    }

    fn read_keyword(&mut self, start: usize) -> Token {
        self.read_char();
        while self
            .peek_char()
            .is_some_and(|ch| ch == '_' || ch == '-' || ch.is_alphanumeric())
        {
            self.read_char();
        }
        let end = self.offset();
        Token::new(TokenKind::Keyword, &self.input[start..end], start)
    }

    /// Comparison and logical operators, two-character forms first
    fn read_operator(&mut self, ch: char, start: usize) -> Result<Option<Token>, ParseError> {
        let (single, pairs): (Option<TokenKind>, &[(char, TokenKind)]) = match ch {
            '<' => (
                Some(TokenKind::Less),
                &[('>', TokenKind::NotEqual), ('=', TokenKind::LessOrEqual)],
            ),
            '>' => (Some(TokenKind::Greater), &[('=', TokenKind::GreaterOrEqual)]),
            '!' => (Some(TokenKind::Not), &[('=', TokenKind::NotEqual)]),
            '=' => (Some(TokenKind::EqualTo), &[('=', TokenKind::EqualTo)]),
            '&' => (None, &[('&', TokenKind::And)]),
            '|' => (None, &[('|', TokenKind::Or)]),
            _ => return Ok(None),
        };

        self.read_char();
        let next = self.peek_char();
        if let Some(&(second, kind)) = pairs.iter().find(|(second, _)| Some(*second) == next) {
            self.read_char();
            return Ok(Some(Token::new(kind, format!("{ch}{second}"), start)));
        }

        match single {
            Some(kind) => Ok(Some(Token::new(kind, ch.to_string(), start))),
            None => Err(ParseError::IncompleteOperator {
                expected: if ch == '&' { "&&" } else { "||" },
                found: ch,
                position: start,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut tokenizer = Tokenizer::new(input).unwrap();
        let mut kinds = vec![tokenizer.kind()];
        while !tokenizer.is_eof() {
            kinds.push(tokenizer.next_token().unwrap().kind);
        }
        kinds
    }

    #[test]
    fn test_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("< <= <> > >= = == != ! && ||"),
            vec![
                Less,
                LessOrEqual,
                NotEqual,
                Greater,
                GreaterOrEqual,
                EqualTo,
                EqualTo,
                NotEqual,
                Not,
                And,
                Or,
                EndOfInput
            ]
        );
    }

    #[test]
    fn test_number_stops_at_second_dot() {
        let mut tokenizer = Tokenizer::new("1.2.3").unwrap();
        assert_eq!(tokenizer.token().text, "1.2");
        assert_eq!(tokenizer.next_token().unwrap().kind, TokenKind::Dot);
        assert_eq!(tokenizer.next_token().unwrap().text, "3");
    }

    #[test]
    fn test_keywords_allow_hyphens_and_underscores() {
        let tokenizer = Tokenizer::new("starts-with").unwrap();
        assert_eq!(tokenizer.kind(), TokenKind::Keyword);
        assert_eq!(tokenizer.token().text, "starts-with");

        let tokenizer = Tokenizer::new("__check__").unwrap();
        assert_eq!(tokenizer.token().text, "__check__");
    }

    #[test]
    fn test_string_with_escaped_quote() {
        let tokenizer = Tokenizer::new("'d''Artagnan'").unwrap();
        assert_eq!(tokenizer.kind(), TokenKind::String);
        assert_eq!(tokenizer.token().text, "'d''Artagnan'");
        assert_eq!(tokenizer.string_value(), "d'Artagnan");
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            Tokenizer::new("'Hello world"),
            Err(ParseError::UnterminatedString { position: 0 })
        ));
    }

    #[test]
    fn test_single_ampersand_and_pipe_are_errors() {
        assert!(matches!(
            Tokenizer::new("&"),
            Err(ParseError::IncompleteOperator { expected: "&&", .. })
        ));
        assert!(matches!(
            Tokenizer::new("| x"),
            Err(ParseError::IncompleteOperator { expected: "||", .. })
        ));
    }

    #[test]
    fn test_invalid_characters() {
        assert!(matches!(
            Tokenizer::new("#"),
            Err(ParseError::InvalidPunctuation { found: '#', .. })
        ));
        assert!(matches!(
            Tokenizer::new("\u{0015}"),
            Err(ParseError::InvalidToken { .. })
        ));
        assert!(matches!(
            Tokenizer::new("\u{0090}"),
            Err(ParseError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_brace_and_colon_end_input() {
        assert_eq!(kinds("level } rest"), vec![TokenKind::Keyword, TokenKind::EndOfInput]);
        assert_eq!(kinds("true:x"), vec![TokenKind::Keyword, TokenKind::EndOfInput]);
    }

    #[test]
    fn test_cannot_read_past_end() {
        let mut tokenizer = Tokenizer::new("").unwrap();
        assert!(tokenizer.is_eof());
        assert!(matches!(
            tokenizer.next_token(),
            Err(ParseError::PastEndOfInput)
        ));
    }

    #[test]
    fn test_token_positions() {
        let mut tokenizer = Tokenizer::new("  level >= 'x'").unwrap();
        assert_eq!(tokenizer.token().position, 2);
        assert_eq!(tokenizer.next_token().unwrap().position, 8);
        assert_eq!(tokenizer.next_token().unwrap().position, 11);
    }
}
