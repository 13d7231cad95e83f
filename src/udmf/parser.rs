//! Recursive-descent parser for the UDMF block grammar.
//!
//! ```text
//! translation_unit = ws item*
//! item             = identifier ws ( "=" ws value ws ";" | "{" ws item* "}" ) ws
//! identifier       = [A-Za-z_][A-Za-z0-9_]*
//! value            = float / integer / quoted_string / "true" / "false"
//! float            = [+-]? digits "." digits* ( [eE] [+-]? digits )?
//! integer          = [+-]? ( "0" | [1-9][0-9]* ) / "0x" hex_digits
//! ws               = ( space / "//" line / "/* ... */" )*
//! ```
//!
//! Alternatives are tried in the order above, so `1.5` is a float and `1`
//! an integer; an exponent without a decimal point (`1e5`) is not a float.
//! String escapes are stripped: `\"` yields `"`, `\\` yields `\`, and any
//! other escaped byte is kept verbatim.

use crate::error::{Error, Result};
use crate::udmf::{Block, Value};

/// Parse a UDMF translation unit into its block structure.
pub fn parse(text: &str) -> Result<Block> {
    let mut state = ParserState::new(text);
    state.skip_ws()?;
    let root = state.parse_items(false)?;
    if !state.at_end() {
        return Err(state.error("unexpected `}` outside any block"));
    }
    Ok(root)
}

/// Parser state tracks the byte position in the source text.
struct ParserState<'a> {
    src: &'a [u8],
    position: usize,
}

impl<'a> ParserState<'a> {
    fn new(text: &'a str) -> Self {
        ParserState {
            src: text.as_bytes(),
            position: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            position: self.position,
            message: message.into(),
        }
    }

    fn at_end(&self) -> bool {
        self.position >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.position += 1;
        Some(b)
    }

    /// Consume whitespace, `//` line comments and `/* */` block comments.
    fn skip_ws(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.position += 1;
                }
                Some(b'/') => match self.src.get(self.position + 1) {
                    Some(b'/') => {
                        while let Some(b) = self.peek() {
                            if b == b'\n' || b == b'\r' {
                                break;
                            }
                            self.position += 1;
                        }
                    }
                    Some(b'*') => {
                        let start = self.position;
                        self.position += 2;
                        loop {
                            match self.peek() {
                                Some(b'*') if self.src.get(self.position + 1) == Some(&b'/') => {
                                    self.position += 2;
                                    break;
                                }
                                Some(_) => self.position += 1,
                                None => {
                                    self.position = start;
                                    return Err(self.error("unterminated block comment"));
                                }
                            }
                        }
                    }
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    /// Parse items until end of input (`inside_block` false) or a closing
    /// brace (`inside_block` true). Leading whitespace must already be
    /// consumed.
    fn parse_items(&mut self, inside_block: bool) -> Result<Block> {
        let mut block = Block::new();
        loop {
            match self.peek() {
                None => {
                    if inside_block {
                        return Err(self.error("unbalanced block: missing `}`"));
                    }
                    return Ok(block);
                }
                Some(b'}') => return Ok(block),
                _ => {}
            }
            let key_position = self.position;
            let key = self.parse_identifier()?;
            self.skip_ws()?;
            match self.peek() {
                Some(b'=') => {
                    self.position += 1;
                    self.skip_ws()?;
                    let value = self.parse_value()?;
                    self.skip_ws()?;
                    self.expect(b';')?;
                    if !block.set_value(&key, value) {
                        self.position = key_position;
                        return Err(
                            self.error(format!("key `{}` is already a block list", key))
                        );
                    }
                }
                Some(b'{') => {
                    self.position += 1;
                    self.skip_ws()?;
                    let child = self.parse_items(true)?;
                    self.expect(b'}')?;
                    if !block.push_block(&key, child) {
                        self.position = key_position;
                        return Err(self.error(format!("key `{}` is already a value", key)));
                    }
                }
                _ => return Err(self.error("expected `=` or `{` after identifier")),
            }
            self.skip_ws()?;
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        if self.peek() == Some(expected) {
            self.position += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", expected as char)))
        }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
            _ => return Err(self.error("expected identifier")),
        }
        let start = self.position;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.position += 1;
            } else {
                break;
            }
        }
        Ok(String::from_utf8_lossy(&self.src[start..self.position]).into_owned())
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.peek() {
            Some(b'"') => self.parse_quoted_string(),
            Some(b) if b == b'+' || b == b'-' || b.is_ascii_digit() => self.parse_number(),
            Some(b) if b.is_ascii_alphabetic() => {
                let start = self.position;
                let word = self.parse_identifier()?;
                match word.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => {
                        self.position = start;
                        Err(self.error(format!("expected value, found `{}`", word)))
                    }
                }
            }
            _ => Err(self.error("expected value")),
        }
    }

    fn parse_quoted_string(&mut self) -> Result<Value> {
        let start = self.position;
        self.position += 1; // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\\') => match self.bump() {
                    // The escape is removed, the escaped byte kept verbatim.
                    Some(b) => bytes.push(b),
                    None => {
                        self.position = start;
                        return Err(self.error("unterminated string"));
                    }
                },
                Some(b) => bytes.push(b),
                None => {
                    self.position = start;
                    return Err(self.error("unterminated string"));
                }
            }
        }
        Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.position;
        match self.peek() {
            Some(b'-') | Some(b'+') => {
                self.position += 1;
            }
            _ => {}
        }

        // Hex form takes no sign and no decimal point.
        if self.position == start && self.src[self.position..].starts_with(b"0x") {
            self.position += 2;
            let digits_start = self.position;
            while let Some(b) = self.peek() {
                if b.is_ascii_hexdigit() {
                    self.position += 1;
                } else {
                    break;
                }
            }
            if self.position == digits_start {
                self.position = start;
                return Err(self.error("expected hex digits after `0x`"));
            }
            let digits = std::str::from_utf8(&self.src[digits_start..self.position])
                .unwrap_or_default();
            return match i64::from_str_radix(digits, 16) {
                Ok(v) => Ok(Value::Integer(v)),
                Err(_) => {
                    self.position = start;
                    Err(self.error("hex literal out of range"))
                }
            };
        }

        let int_start = self.position;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.position += 1;
            } else {
                break;
            }
        }
        if self.position == int_start {
            self.position = start;
            return Err(self.error("expected value"));
        }

        if self.peek() == Some(b'.') {
            // Float: mantissa digits, point, optional fraction and exponent.
            self.position += 1;
            while let Some(b) = self.peek() {
                if b.is_ascii_digit() {
                    self.position += 1;
                } else {
                    break;
                }
            }
            if matches!(self.peek(), Some(b'e') | Some(b'E')) {
                let exp_start = self.position;
                self.position += 1;
                if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                    self.position += 1;
                }
                let exp_digits = self.position;
                while let Some(b) = self.peek() {
                    if b.is_ascii_digit() {
                        self.position += 1;
                    } else {
                        break;
                    }
                }
                if self.position == exp_digits {
                    // Not part of the float after all; leave `e` for the
                    // caller to trip over, as the reference grammar does.
                    self.position = exp_start;
                }
            }
            let text = std::str::from_utf8(&self.src[start..self.position])
                .unwrap_or_default();
            return match text.parse::<f64>() {
                Ok(v) => Ok(Value::Float(v)),
                Err(_) => {
                    self.position = start;
                    Err(self.error("malformed float literal"))
                }
            };
        }

        // Integer: no leading zeros (`0` alone is fine).
        let digits = &self.src[int_start..self.position];
        if digits.len() > 1 && digits[0] == b'0' {
            self.position = start;
            return Err(self.error("integer literals may not have leading zeros"));
        }
        let text = std::str::from_utf8(&self.src[start..self.position]).unwrap_or_default();
        match text.parse::<i64>() {
            Ok(v) => Ok(Value::Integer(v)),
            Err(_) => {
                self.position = start;
                Err(self.error("integer literal out of range"))
            }
        }
    }
}
