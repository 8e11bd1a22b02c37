//! Tokens of a hex dump line

use nom::bytes::complete::{tag, take_till1, take_while};
use nom::character::complete::{char, hex_digit1, space0};
use nom::combinator::{all_consuming, opt, recognize, rest, value};
use nom::multi::many0;
use nom::sequence::{pair, preceded};
use nom::{IResult, Offset};

/// Prefix of directive lines
pub const DIRECTIVE: &str = "#TEXT2PCAP";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Exactly two hex digits
    Byte(u8),
    /// Other hex digits, or hex digits followed by `:`. The text is the digits only.
    ///
    /// A word holding more than that (for ex. a time `10:20:30`) is text.
    Offset,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte position of the token in the line
    pub start: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    /// Lines starting with `#`: ignored, and not even ending the current line of bytes
    Comment,
    Directive(&'a str),
    Tokens(Vec<Token<'a>>),
}

fn is_blank(c: char) -> bool {
    c.is_ascii_whitespace()
}

fn directive(i: &str) -> IResult<&str, &str> {
    preceded(space0, recognize(pair(tag(DIRECTIVE), rest)))(i)
}

fn comment(i: &str) -> IResult<&str, &str> {
    preceded(space0, preceded(char('#'), rest))(i)
}

// '>' markers of forwarded mail
fn mail_forward(i: &str) -> IResult<&str, ()> {
    value((), many0(preceded(space0, char('>'))))(i)
}

fn word(i: &str) -> IResult<&str, &str> {
    preceded(take_while(is_blank), take_till1(is_blank))(i)
}

fn hex_word(i: &str) -> IResult<&str, (&str, Option<char>)> {
    all_consuming(pair(hex_digit1, opt(char(':'))))(i)
}

fn classify<'a>(line: &'a str, w: &'a str) -> Token<'a> {
    let (kind, text) = match hex_word(w) {
        Ok((_, (digits, None))) if digits.len() == 2 => match u8::from_str_radix(digits, 16) {
            Ok(b) => (TokenKind::Byte(b), digits),
            Err(_) => (TokenKind::Text, w),
        },
        Ok((_, (digits, _))) => (TokenKind::Offset, digits),
        Err(_) => (TokenKind::Text, w),
    };
    Token {
        kind,
        text,
        start: line.offset(w),
    }
}

/// Split a line (without its end-of-line) into tokens
pub fn lex_line(line: &str) -> Line {
    if let Ok((_, text)) = directive(line) {
        return Line::Directive(text.trim_end());
    }
    if comment(line).is_ok() {
        return Line::Comment;
    }
    let mut input = match mail_forward(line) {
        Ok((rem, _)) => rem,
        Err(_) => line,
    };
    let mut tokens = Vec::new();
    while let Ok((rem, w)) = word(input) {
        tokens.push(classify(line, w));
        input = rem;
    }
    Line::Tokens(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<(TokenKind, &str)> {
        match lex_line(line) {
            Line::Tokens(tokens) => tokens.iter().map(|t| (t.kind, t.text)).collect(),
            l => panic!("unexpected line {:?}", l),
        }
    }

    #[test]
    fn lex_dump_line() {
        let line = "0010  de ad BE ef  ..x.";
        let tokens = match lex_line(line) {
            Line::Tokens(t) => t,
            l => panic!("unexpected line {:?}", l),
        };
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0].kind, TokenKind::Offset);
        assert_eq!(tokens[0].text, "0010");
        assert_eq!(tokens[1].kind, TokenKind::Byte(0xde));
        assert_eq!(tokens[1].start, 6);
        assert_eq!(tokens[3].kind, TokenKind::Byte(0xbe));
        assert_eq!(tokens[5].kind, TokenKind::Text);
        assert_eq!(tokens[5].start, 19);
    }

    #[test]
    fn lex_offsets() {
        assert_eq!(
            kinds("0000: AA bb: 0000:AA 10:20:30.5"),
            vec![
                (TokenKind::Offset, "0000"),
                (TokenKind::Byte(0xaa), "AA"),
                (TokenKind::Offset, "bb"),
                (TokenKind::Text, "0000:AA"),
                (TokenKind::Text, "10:20:30.5"),
            ]
        );
        assert_eq!(kinds("::"), vec![(TokenKind::Text, "::")]);
        assert_eq!(kinds("a 123"), vec![(TokenKind::Offset, "a"), (TokenKind::Offset, "123")]);
    }

    #[test]
    fn lex_special_lines() {
        assert_eq!(lex_line("# a comment 00 11"), Line::Comment);
        assert_eq!(lex_line("  #00"), Line::Comment);
        assert_eq!(
            lex_line("#TEXT2PCAP test \r"),
            Line::Directive("#TEXT2PCAP test")
        );
        assert_eq!(lex_line(""), Line::Tokens(Vec::new()));
        assert_eq!(lex_line(" \t\r"), Line::Tokens(Vec::new()));
    }

    #[test]
    fn lex_mail_forward() {
        assert_eq!(
            kinds("> > 0000 01"),
            vec![(TokenKind::Offset, "0000"), (TokenKind::Byte(1), "01")]
        );
    }
}
