//! Turns source text into a flat token stream.
//!
//! Mirrors the original scanner rune-by-rune: single lookahead character to
//! disambiguate one- vs. two-character operators, raw copying of string
//! contents between matching quotes (no escape processing), and a
//! `DIGIT+ ('.' DIGIT+)?` number grammar.

use crate::error::ScanError;
use crate::token::{CodeLoc, Token, TokenKind};

struct Scanner {
    chars: Vec<char>,
    cur: usize,
    row: usize,
    col: i64,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            cur: 0,
            row: 0,
            col: 0,
        }
    }

    fn is_end(&self) -> bool {
        self.cur >= self.chars.len()
    }

    fn char(&self) -> char {
        self.chars.get(self.cur).copied().unwrap_or('\0')
    }

    fn peek(&self) -> char {
        self.chars.get(self.cur + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        self.col += 1;
        self.cur += 1;
    }

    fn loc(&self) -> CodeLoc {
        CodeLoc::new(self.row, self.col.max(0) as usize)
    }
}

/// Tokenizes `source`, always terminating the stream with a trailing `EOF`
/// token so downstream parsing never special-cases running off the end.
pub fn scan(source: &str) -> Result<Vec<Token>, ScanError> {
    let mut s = Scanner::new(source);
    let mut tokens = Vec::new();

    while !s.is_end() {
        let loc = s.loc();
        match s.char() {
            ' ' => {}
            '\n' => {
                s.row += 1;
                s.col = -1; // advance() below brings this back to 0
            }
            '(' => tokens.push(Token::new(TokenKind::LeftParen, "(", loc.row, loc.col)),
            ')' => tokens.push(Token::new(TokenKind::RightParen, ")", loc.row, loc.col)),
            '[' => tokens.push(Token::new(TokenKind::LeftBracket, "[", loc.row, loc.col)),
            ']' => tokens.push(Token::new(TokenKind::RightBracket, "]", loc.row, loc.col)),
            '{' => tokens.push(Token::new(TokenKind::LeftBrace, "{", loc.row, loc.col)),
            '}' => tokens.push(Token::new(TokenKind::RightBrace, "}", loc.row, loc.col)),
            ',' => tokens.push(Token::new(TokenKind::Comma, ",", loc.row, loc.col)),
            ';' => tokens.push(Token::new(TokenKind::Semicolon, ";", loc.row, loc.col)),
            '?' => tokens.push(Token::new(TokenKind::Question, "?", loc.row, loc.col)),
            '_' => tokens.push(Token::new(TokenKind::Underscore, "_", loc.row, loc.col)),
            '^' => tokens.push(Token::new(TokenKind::Caret, "^", loc.row, loc.col)),
            '~' => tokens.push(Token::new(TokenKind::Tilde, "~", loc.row, loc.col)),
            '/' => tokens.push(Token::new(TokenKind::Slash, "/", loc.row, loc.col)),
            '+' => tokens.push(Token::new(TokenKind::Plus, "+", loc.row, loc.col)),
            '<' => match s.peek() {
                '=' => {
                    tokens.push(Token::new(TokenKind::LessEqual, "<=", loc.row, loc.col));
                    s.advance();
                }
                '<' => {
                    tokens.push(Token::new(TokenKind::LessLess, "<<", loc.row, loc.col));
                    s.advance();
                }
                _ => tokens.push(Token::new(TokenKind::Less, "<", loc.row, loc.col)),
            },
            '>' => match s.peek() {
                '=' => {
                    tokens.push(Token::new(TokenKind::GreatEqual, ">=", loc.row, loc.col));
                    s.advance();
                }
                '>' => {
                    tokens.push(Token::new(TokenKind::GreatGreat, ">>", loc.row, loc.col));
                    s.advance();
                }
                _ => tokens.push(Token::new(TokenKind::Great, ">", loc.row, loc.col)),
            },
            '=' => match s.peek() {
                '=' => {
                    tokens.push(Token::new(TokenKind::EqualEqual, "==", loc.row, loc.col));
                    s.advance();
                }
                _ => tokens.push(Token::new(TokenKind::Equal, "=", loc.row, loc.col)),
            },
            '!' => match s.peek() {
                '=' => {
                    tokens.push(Token::new(TokenKind::BangEqual, "!=", loc.row, loc.col));
                    s.advance();
                }
                _ => tokens.push(Token::new(TokenKind::Bang, "!", loc.row, loc.col)),
            },
            '|' => match s.peek() {
                '|' => {
                    tokens.push(Token::new(TokenKind::StrokeStroke, "||", loc.row, loc.col));
                    s.advance();
                }
                '>' => {
                    tokens.push(Token::new(TokenKind::StrokeGreat, "|>", loc.row, loc.col));
                    s.advance();
                }
                _ => tokens.push(Token::new(TokenKind::Stroke, "|", loc.row, loc.col)),
            },
            '&' => match s.peek() {
                '&' => {
                    tokens.push(Token::new(
                        TokenKind::AmpersandAmpersand,
                        "&&",
                        loc.row,
                        loc.col,
                    ));
                    s.advance();
                }
                _ => tokens.push(Token::new(TokenKind::Ampersand, "&", loc.row, loc.col)),
            },
            '*' => match s.peek() {
                '*' => {
                    tokens.push(Token::new(
                        TokenKind::AsteriskAsterisk,
                        "**",
                        loc.row,
                        loc.col,
                    ));
                    s.advance();
                }
                _ => tokens.push(Token::new(TokenKind::Asterisk, "*", loc.row, loc.col)),
            },
            '-' => match s.peek() {
                '>' => {
                    tokens.push(Token::new(TokenKind::MinusGreat, "->", loc.row, loc.col));
                    s.advance();
                }
                _ => tokens.push(Token::new(TokenKind::Minus, "-", loc.row, loc.col)),
            },
            '.' => {
                if s.peek() == '.' {
                    s.advance();
                    if s.peek() == '.' {
                        s.advance();
                        tokens.push(Token::new(TokenKind::DotDotDot, "...", loc.row, loc.col));
                    } else {
                        return Err(ScanError::UnrecognizedSymbol { symbol: '.', loc });
                    }
                } else {
                    return Err(ScanError::UnrecognizedSymbol { symbol: '.', loc });
                }
            }
            '"' => scan_string(&mut s, &mut tokens, '"')?,
            '\'' => scan_string(&mut s, &mut tokens, '\'')?,
            c if c.is_ascii_digit() => scan_number(&mut s, &mut tokens)?,
            c if c.is_ascii_alphabetic() => scan_identifier(&mut s, &mut tokens),
            c => return Err(ScanError::UnrecognizedSymbol { symbol: c, loc }),
        }
        s.advance();
    }

    tokens.push(Token::new(TokenKind::Eof, "", s.row, s.col));
    Ok(tokens)
}

fn scan_string(s: &mut Scanner, tokens: &mut Vec<Token>, quote: char) -> Result<(), ScanError> {
    let loc = s.loc();
    let mut lexeme = String::new();
    lexeme.push(s.char());
    s.advance();

    while s.char() != quote {
        if s.is_end() {
            return Err(ScanError::UnterminatedString { loc });
        }
        lexeme.push(s.char());
        s.advance();
    }
    lexeme.push(s.char());

    tokens.push(Token::new(TokenKind::String, lexeme, loc.row, loc.col));
    Ok(())
}

fn scan_number(s: &mut Scanner, tokens: &mut Vec<Token>) -> Result<(), ScanError> {
    let loc = s.loc();
    let mut lexeme = String::new();
    lexeme.push(s.char());

    while s.peek() != '.' && s.peek().is_ascii_digit() {
        s.advance();
        lexeme.push(s.char());
    }

    if s.peek() == '.' {
        s.advance();
        lexeme.push(s.char());

        if !s.peek().is_ascii_digit() {
            return Err(ScanError::MalformedNumber { loc: s.loc() });
        }
    }

    while s.peek().is_ascii_digit() {
        s.advance();
        lexeme.push(s.char());
    }

    tokens.push(Token::new(TokenKind::Number, lexeme, loc.row, loc.col));
    Ok(())
}

fn scan_identifier(s: &mut Scanner, tokens: &mut Vec<Token>) {
    let loc = s.loc();
    let mut word = String::new();
    word.push(s.char());

    while s.peek().is_ascii_alphabetic() {
        s.advance();
        word.push(s.char());
    }

    let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier);
    tokens.push(Token::new(kind, word, loc.row, loc.col));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        scan(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn skips_whitespace_and_tracks_lines() {
        let tokens = scan("1\n  2").unwrap();
        assert_eq!(tokens[0].loc, CodeLoc::new(0, 0));
        assert_eq!(tokens[1].loc, CodeLoc::new(1, 2));
    }

    #[test]
    fn two_char_operators_win_over_one_char_prefix() {
        assert_eq!(
            kinds("<= << < >= >> > == != || |> | && & ** * ->"),
            vec![
                TokenKind::LessEqual,
                TokenKind::LessLess,
                TokenKind::Less,
                TokenKind::GreatEqual,
                TokenKind::GreatGreat,
                TokenKind::Great,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::StrokeStroke,
                TokenKind::StrokeGreat,
                TokenKind::Stroke,
                TokenKind::AmpersandAmpersand,
                TokenKind::Ampersand,
                TokenKind::AsteriskAsterisk,
                TokenKind::Asterisk,
                TokenKind::MinusGreat,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strings_retain_quotes_and_support_both_quote_chars() {
        let tokens = scan(r#""hi" 'yo'"#).unwrap();
        assert_eq!(tokens[0].lexeme, "\"hi\"");
        assert_eq!(tokens[1].lexeme, "'yo'");
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert_eq!(
            scan("\"abc"),
            Err(ScanError::UnterminatedString {
                loc: CodeLoc::new(0, 0)
            })
        );
    }

    #[test]
    fn numbers_allow_one_decimal_point() {
        let tokens = scan("123 4.5").unwrap();
        assert_eq!(tokens[0].lexeme, "123");
        assert_eq!(tokens[1].lexeme, "4.5");
    }

    #[test]
    fn trailing_dot_without_digit_is_an_error() {
        assert!(matches!(scan("4."), Err(ScanError::MalformedNumber { .. })));
    }

    #[test]
    fn keywords_are_recognized_and_identifiers_fall_through() {
        assert_eq!(
            kinds("let mut fn if else while return true false bottom me proto continue break for foo"),
            vec![
                TokenKind::Let,
                TokenKind::Mut,
                TokenKind::Fn,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Return,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Bottom,
                TokenKind::Me,
                TokenKind::Proto,
                TokenKind::Continue,
                TokenKind::Break,
                TokenKind::For,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rest_marker_scans_as_dot_dot_dot() {
        assert_eq!(kinds("..."), vec![TokenKind::DotDotDot, TokenKind::Eof]);
    }

    #[test]
    fn unrecognizable_symbol_is_an_error() {
        assert!(matches!(
            scan("@"),
            Err(ScanError::UnrecognizedSymbol { symbol: '@', .. })
        ));
    }

    #[test]
    fn empty_source_yields_only_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }
}
