//! Parameter Entities and Character References
//!
//! Parameter entities are kept as raw replacement text and expanded lazily
//! by the scanner. Character references come from CDATA entity literals
//! like `"&#160;"` and are decoded once at declaration time.

use std::collections::HashMap;

use memchr::memchr;

/// Parameter entity table: name -> replacement text
#[derive(Debug, Default)]
pub struct EntityTable {
    entities: HashMap<String, String>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter entity. An entity, once defined, can not be
    /// overridden; returns `false` when the name was already taken.
    pub fn add(&mut self, name: String, text: String) -> bool {
        if self.entities.contains_key(&name) {
            return false;
        }
        self.entities.insert(name, text);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Decode a character reference literal such as `&#160;` or `&#x3C;`.
///
/// XML DTDs escape the ampersand of the reference itself (`&#38;#60;`), so
/// that escape is resolved first. Returns `None` when the literal is not
/// exactly one numeric character reference.
pub fn parse_char_ref(literal: &str) -> Option<char> {
    let literal = literal.trim();
    let body = match literal.strip_prefix("&#38;#") {
        Some(escaped) => escaped,
        None => literal.strip_prefix("&#")?,
    };
    let semi = memchr(b';', body.as_bytes());
    let digits = match semi {
        Some(i) if i + 1 == body.len() => &body[..i],
        Some(_) => return None,
        None => body,
    };
    decode_numeric(digits)
}

/// Decode the digits of a numeric reference (`160`, `x3C`)
fn decode_numeric(digits: &str) -> Option<char> {
    let (digits, radix) = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16),
        None => (digits, 10),
    };
    // from_str_radix would also take a leading sign
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let codepoint = u32::from_str_radix(digits, radix).ok()?;
    char::from_u32(codepoint)
}
