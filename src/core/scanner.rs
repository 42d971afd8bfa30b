//! Push-back scanner for DTD text
//!
//! Parameter entities are expanded by pushing their replacement text in
//! front of the unread input. The scanner keeps a stack of frames; the
//! bottom frame is the DTD itself and every frame above it is either an
//! entity expansion or a single pushed-back byte.
//!
//! Uses memchr to skip comment bodies and ignored marked sections.

use memchr::{memchr, memchr2};

use super::error::{DtdError, Result};

struct Frame {
    data: Vec<u8>,
    pos: usize,
    /// Name of the parameter entity this frame expands, if any
    entity: Option<String>,
}

impl Frame {
    #[inline]
    fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    #[inline]
    fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}

/// Byte scanner with entity push-back
pub struct Scanner {
    frames: Vec<Frame>,
    max_entity_depth: usize,
}

impl Scanner {
    /// Create a scanner over the given DTD text
    pub fn new(input: impl Into<Vec<u8>>, max_entity_depth: usize) -> Self {
        Scanner {
            frames: vec![Frame {
                data: input.into(),
                pos: 0,
                entity: None,
            }],
            max_entity_depth,
        }
    }

    /// Pop frames that have been read to the end.
    ///
    /// Only reading pops frames; peeking looks through exhausted frames
    /// without removing them, so a reference at the very end of an entity's
    /// text still sees that entity as open.
    #[inline]
    fn drop_exhausted(&mut self) {
        while self.frames.last().is_some_and(Frame::is_exhausted) {
            self.frames.pop();
        }
    }

    /// Read the next byte
    #[inline]
    pub fn next(&mut self) -> Option<u8> {
        self.drop_exhausted();
        let frame = self.frames.last_mut()?;
        let b = frame.data[frame.pos];
        frame.pos += 1;
        Some(b)
    }

    /// Read the next byte, failing with a premature-end error
    #[inline]
    pub fn next_or_eof(&mut self, context: &'static str) -> Result<u8> {
        self.next().ok_or(DtdError::UnexpectedEof { context })
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    /// Peek at byte at offset from current position, across frames
    pub fn peek_at(&self, mut offset: usize) -> Option<u8> {
        for frame in self.frames.iter().rev() {
            let rest = frame.remaining();
            if offset < rest.len() {
                return Some(rest[offset]);
            }
            offset -= rest.len();
        }
        None
    }

    /// Check if input continues with a byte sequence
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        needle
            .iter()
            .enumerate()
            .all(|(i, &b)| self.peek_at(i) == Some(b))
    }

    /// Advance by n bytes
    pub fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.next();
        }
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.peek().is_none()
    }

    /// Push one byte back in front of the input
    pub fn unread(&mut self, b: u8) {
        if let Some(frame) = self.frames.last_mut() {
            if frame.pos > 0 && frame.data[frame.pos - 1] == b {
                frame.pos -= 1;
                return;
            }
        }
        self.frames.push(Frame {
            data: vec![b],
            pos: 0,
            entity: None,
        });
    }

    /// Push the replacement text of a parameter entity.
    ///
    /// Fails if the entity is already being expanded or the expansion
    /// nesting would exceed the configured limit.
    pub fn push_entity(&mut self, name: &str, text: &str) -> Result<()> {
        let mut depth = 0;
        for frame in &self.frames {
            if let Some(open) = &frame.entity {
                if open == name {
                    return Err(DtdError::RecursiveEntity(name.to_string()));
                }
                depth += 1;
            }
        }
        if depth >= self.max_entity_depth {
            return Err(DtdError::EntityDepthExceeded(self.max_entity_depth));
        }

        self.frames.push(Frame {
            data: text.as_bytes().to_vec(),
            pos: 0,
            entity: Some(name.to_string()),
        });
        Ok(())
    }

    /// Skip whitespace characters (space, tab, newline, carriage return)
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !is_whitespace(b) {
                break;
            }
            self.next();
        }
    }

    /// Read a name token. `#` is accepted as the first character so that
    /// `#PCDATA` and `#REQUIRED` come out as one token.
    pub fn read_name(&mut self) -> Option<String> {
        let mut name = Vec::new();
        if self.peek() == Some(b'#') {
            name.push(b'#');
            self.next();
        }
        while let Some(b) = self.peek() {
            if !is_name_char(b) {
                break;
            }
            name.push(b);
            self.next();
        }
        if name.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&name).into_owned())
        }
    }

    /// Read a quoted literal; the current byte must be `"` or `'`
    pub fn read_literal(&mut self, context: &'static str) -> Result<String> {
        let quote = self.next_or_eof(context)?;
        if quote != b'"' && quote != b'\'' {
            return Err(unexpected(quote, context));
        }
        let mut value = Vec::new();
        loop {
            self.drop_exhausted();
            let frame = self
                .frames
                .last_mut()
                .ok_or(DtdError::UnexpectedEof { context })?;
            let rest = frame.remaining();
            match memchr(quote, rest) {
                Some(i) => {
                    value.extend_from_slice(&rest[..i]);
                    frame.pos += i + 1;
                    return Ok(String::from_utf8_lossy(&value).into_owned());
                }
                None => {
                    value.extend_from_slice(rest);
                    frame.pos = frame.data.len();
                }
            }
        }
    }

    /// Eat everything up to and including the next `--`
    pub fn skip_comment_body(&mut self) -> Result<()> {
        loop {
            self.drop_exhausted();
            let frame = self
                .frames
                .last_mut()
                .ok_or(DtdError::UnexpectedEof { context: "comment" })?;
            match memchr(b'-', frame.remaining()) {
                Some(i) => {
                    frame.pos += i + 1;
                    if self.peek() == Some(b'-') {
                        self.next();
                        return Ok(());
                    }
                }
                None => frame.pos = frame.data.len(),
            }
        }
    }

    /// Skip the body of an ignored marked section, up to and including the
    /// `]]>` that closes it. Nested `<![` openers are counted.
    pub fn skip_ignored_section(&mut self) -> Result<()> {
        let mut depth = 1usize;
        loop {
            self.drop_exhausted();
            let frame = self.frames.last_mut().ok_or(DtdError::UnexpectedEof {
                context: "ignored section",
            })?;
            match memchr2(b'<', b']', frame.remaining()) {
                Some(i) => frame.pos += i,
                None => {
                    frame.pos = frame.data.len();
                    continue;
                }
            }
            if self.starts_with(b"<![") {
                depth += 1;
                self.advance(3);
            } else if self.starts_with(b"]]>") {
                self.advance(3);
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            } else {
                self.next();
            }
        }
    }

    /// Skip to just past the next `>` (used for declarations the engine
    /// does not model, like NOTATION and external general entities)
    pub fn skip_declaration(&mut self, context: &'static str) -> Result<()> {
        loop {
            match self.next_or_eof(context)? {
                b'>' => return Ok(()),
                q @ (b'"' | b'\'') => {
                    self.unread(q);
                    self.read_literal(context)?;
                }
                _ => {}
            }
        }
    }

    /// Skip a processing instruction body up to and including `?>`
    pub fn skip_processing_instruction(&mut self) -> Result<()> {
        loop {
            if self.next_or_eof("processing instruction")? == b'?' && self.peek() == Some(b'>') {
                self.next();
                return Ok(());
            }
        }
    }

    /// Consume the expected byte or fail
    pub fn expect(&mut self, expected: u8, context: &'static str) -> Result<()> {
        match self.next_or_eof(context)? {
            b if b == expected => Ok(()),
            other => Err(unexpected(other, context)),
        }
    }
}

/// Build an unexpected-character error for a raw byte
pub fn unexpected(b: u8, context: &'static str) -> DtdError {
    DtdError::UnexpectedChar {
        found: b as char,
        context,
    }
}

#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0C)
}

/// Letters, digits, `_ - . :` and any non-ASCII byte
#[inline]
pub fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':') || b >= 0x80
}
