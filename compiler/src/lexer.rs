use crate::error::LexError;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum TokenType {
    // type keywords
    Int,
    Float,
    String,

    Identifier(String),
    Number(i64),
    StringLiteral(String),

    Equal,
    Plus,
    Minus,
    Star,
    Slash,
    Greater,

    // Reserved for grammar extensions, the lexer never produces these.
    EqualEqual,
    BangEqual,
    LessEqual,
    GreaterEqual,
    And,
    Or,
    Bang,
    Char,

    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Semicolon,

    If,
    Else,
    Return,
    While,
    For,

    Eof,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use TokenType::*;
        match self {
            Int => write!(f, "keyword int"),
            Float => write!(f, "keyword float"),
            String => write!(f, "keyword string"),
            Char => write!(f, "keyword char"),
            Identifier(name) => write!(f, "identifier '{name}'"),
            Number(num) => write!(f, "number {num}"),
            StringLiteral(lexeme) => write!(f, "string \"{lexeme}\""),
            Equal => write!(f, "'='"),
            Plus => write!(f, "'+'"),
            Minus => write!(f, "'-'"),
            Star => write!(f, "'*'"),
            Slash => write!(f, "'/'"),
            Greater => write!(f, "'>'"),
            EqualEqual => write!(f, "'=='"),
            BangEqual => write!(f, "'!='"),
            LessEqual => write!(f, "'<='"),
            GreaterEqual => write!(f, "'>='"),
            And => write!(f, "'&&'"),
            Or => write!(f, "'||'"),
            Bang => write!(f, "'!'"),
            LeftParen => write!(f, "'('"),
            RightParen => write!(f, "')'"),
            LeftBrace => write!(f, "'{{'"),
            RightBrace => write!(f, "'}}'"),
            Semicolon => write!(f, "';'"),
            If => write!(f, "keyword if"),
            Else => write!(f, "keyword else"),
            Return => write!(f, "keyword return"),
            While => write!(f, "keyword while"),
            For => write!(f, "keyword for"),
            Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenType,
    pub lexeme: String,
    /// 0-based source line.
    pub line: usize,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}

impl Token {
    pub fn new(kind: TokenType, lexeme: &str, line: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    pub const fn is_identifier(&self) -> bool {
        matches!(self.kind, TokenType::Identifier(_))
    }
}

pub struct Lexer<'src> {
    cursor: Peekable<CharIndices<'src>>,
    tokens: Vec<Token>,
    line: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(text: &'src str) -> Self {
        Self {
            cursor: text.char_indices().peekable(),
            tokens: Vec::with_capacity(text.len() / 2),
            line: 0,
        }
    }

    /// Consumes the whole source. The returned sequence always ends with
    /// an `Eof` token.
    pub fn scan(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(&(_, c)) = self.cursor.peek() {
            match c {
                '=' | '+' | '-' | '*' | '>' | '(' | ')' | '{' | '}' | ';' => {
                    self.scan_single_token()
                }
                '/' => self.scan_slash(),
                '\n' => {
                    self.cursor.next();
                    self.line += 1;
                }
                '"' => {
                    let token = self.scan_string()?;
                    self.tokens.push(token);
                }
                _ if c.is_whitespace() => {
                    self.cursor.next();
                }
                _ if c.is_ascii_digit() => {
                    let token = self.scan_number()?;
                    self.tokens.push(token);
                }
                _ if c.is_ascii_alphabetic() => self.scan_identifier(),
                _ => {
                    return Err(LexError::UnexpectedCharacter {
                        character: c,
                        line: self.line,
                    })
                }
            }
        }
        self.tokens.push(Token::new(TokenType::Eof, "", self.line));
        Ok(self.tokens)
    }

    fn scan_single_token(&mut self) {
        let Some((_, c)) = self.cursor.next() else {
            return;
        };
        let kind = match c {
            '=' => TokenType::Equal,
            '+' => TokenType::Plus,
            '-' => TokenType::Minus,
            '*' => TokenType::Star,
            '>' => TokenType::Greater,
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            ';' => TokenType::Semicolon,
            _ => unreachable!(),
        };
        let mut buffer = [0; 4];
        self.tokens
            .push(Token::new(kind, c.encode_utf8(&mut buffer), self.line));
    }

    fn scan_slash(&mut self) {
        self.cursor.next();
        if self.cursor.next_if(|x| x.1 == '/').is_some() {
            // comment runs up to, not including, the newline
            while self.cursor.next_if(|x| x.1 != '\n').is_some() {}
        } else {
            self.tokens
                .push(Token::new(TokenType::Slash, "/", self.line));
        }
    }

    fn scan_string(&mut self) -> Result<Token, LexError> {
        let start_line = self.line;
        let mut lexeme = String::new();
        self.cursor.next(); // skip opening quotes
        while let Some((_, ch)) = self.cursor.next_if(|x| x.1 != '"') {
            if ch == '\n' {
                self.line += 1;
            }
            lexeme.push(ch);
        }
        if self.cursor.next_if(|x| x.1 == '"').is_some() {
            Ok(Token {
                kind: TokenType::StringLiteral(lexeme.clone()),
                lexeme,
                line: start_line,
            })
        } else {
            Err(LexError::UnterminatedString { line: start_line })
        }
    }

    fn scan_number(&mut self) -> Result<Token, LexError> {
        let mut lexeme = String::new();
        while let Some((_, num)) = self.cursor.next_if(|x| x.1.is_ascii_digit())
        {
            lexeme.push(num);
        }
        let num = lexeme.parse::<i64>().map_err(|_| LexError::InvalidNumber {
            lexeme: lexeme.clone(),
            line: self.line,
        })?;
        Ok(Token::new(TokenType::Number(num), &lexeme, self.line))
    }

    fn scan_identifier(&mut self) {
        let mut lexeme = String::new();
        while let Some((_, ch)) =
            self.cursor.next_if(|x| x.1.is_ascii_alphanumeric())
        {
            lexeme.push(ch);
        }
        let kind = match lexeme.as_str() {
            "int" => TokenType::Int,
            "float" => TokenType::Float,
            "string" => TokenType::String,
            "if" => TokenType::If,
            "else" => TokenType::Else,
            "return" => TokenType::Return,
            "while" => TokenType::While,
            "for" => TokenType::For,
            _ => TokenType::Identifier(lexeme.clone()),
        };
        self.tokens.push(Token::new(kind, &lexeme, self.line));
    }
}
