//! ToUnicode CMap parsing
//!
//! Supports `codespacerange`, `bfchar` and both `bfrange` forms, which is
//! what font subsetters emit in practice.

use std::collections::HashMap;

/// Upper bound on codes expanded from a single `bfrange` entry
const MAX_RANGE_SPAN: u32 = 0x1_0000;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

/// Code-to-text table read from a font's `/ToUnicode` stream
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeMap {
    code_len: Option<usize>,
    map: HashMap<u32, String>,
}

impl ToUnicodeMap {
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut cmap = ToUnicodeMap::default();
        let mut iter = tokens.into_iter().peekable();

        while let Some(token) = iter.next() {
            let Token::Word(word) = token else { continue };
            match word.as_str() {
                "begincodespacerange" => {
                    while let Some(Token::Hex(low)) = iter.next_if(|t| matches!(t, Token::Hex(_))) {
                        let _high = iter.next_if(|t| matches!(t, Token::Hex(_)));
                        if cmap.code_len.is_none() && !low.is_empty() {
                            cmap.code_len = Some(low.len());
                        }
                    }
                }
                "beginbfchar" => {
                    while let Some(Token::Hex(src)) = iter.next_if(|t| matches!(t, Token::Hex(_))) {
                        if let Some(Token::Hex(dst)) = iter.next_if(|t| matches!(t, Token::Hex(_))) {
                            cmap.map.insert(code_of(&src), utf16_text(&dst));
                        }
                    }
                }
                "beginbfrange" => {
                    while let Some(Token::Hex(low)) = iter.next_if(|t| matches!(t, Token::Hex(_))) {
                        let Some(Token::Hex(high)) = iter.next_if(|t| matches!(t, Token::Hex(_))) else {
                            break;
                        };
                        let (low, high) = (code_of(&low), code_of(&high));
                        if high < low || high - low > MAX_RANGE_SPAN {
                            continue;
                        }
                        match iter.next() {
                            Some(Token::Hex(dst)) => cmap.insert_incrementing(low, high, &dst),
                            Some(Token::ArrayStart) => {
                                let mut code = low;
                                while let Some(Token::Hex(dst)) = iter.next_if(|t| matches!(t, Token::Hex(_))) {
                                    if code <= high {
                                        cmap.map.insert(code, utf16_text(&dst));
                                    }
                                    code += 1;
                                }
                                let _ = iter.next_if(|t| *t == Token::ArrayEnd);
                            }
                            _ => break,
                        }
                    }
                }
                _ => {}
            }
        }
        cmap
    }

    fn insert_incrementing(&mut self, low: u32, high: u32, dst: &[u8]) {
        let units = utf16_units(dst);
        let Some((last, head)) = units.split_last() else { return };
        for code in low..=high {
            let mut text = head.to_vec();
            text.push(last.wrapping_add((code - low) as u16));
            self.map.insert(code, String::from_utf16_lossy(&text));
        }
    }

    /// Byte length of a character code, from the first codespace range
    pub fn code_len(&self) -> Option<usize> {
        self.code_len
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect()
}

fn utf16_text(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let b = data[i];
        match b {
            b if b.is_ascii_whitespace() => i += 1,
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let start = i + 1;
                let end = data[start..]
                    .iter()
                    .position(|c| *c == b'>')
                    .map(|p| start + p)
                    .unwrap_or(data.len());
                tokens.push(Token::Hex(decode_hex(&data[start..end])));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'(' => {
                // literal strings only appear in CMap headers; skip them
                let mut depth = 0;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                i += 1;
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
            }
            _ => {
                let start = i;
                i += 1;
                while i < data.len() && !data[i].is_ascii_whitespace() && !is_delimiter(data[i]) {
                    i += 1;
                }
                if b != b'/' {
                    tokens.push(Token::Word(String::from_utf8_lossy(&data[start..i]).into_owned()));
                }
            }
        }
    }
    tokens
}

fn decode_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|c| (*c as char).to_digit(16).map(|d| d as u8))
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => (hi << 4) | lo,
            [hi] => hi << 4,
            _ => 0,
        })
        .collect()
}
