/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::fmt::Display;
use std::io::BufRead;
use std::io::Read;

/// A position in the tokenizer input byte stream.
///
/// This struct is returned from the
/// [location()](crate::Tokenizer::location) method and gives you
/// the position of the last consumed byte in the input stream.
///
/// It is useful when printing error messages or if you want to
/// track location of parsed stanzas in the XML text.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Location {
    /// Byte position in the input stream.
    pub bytes: usize,
    /// How many lines have been consumed. Lines are separated by the newline character.
    pub lines: usize,
    /// How many bytes after the last newline character.
    pub column: usize,
}

impl Location {
    /// Creates a new location at the beginning of the input stream.
    pub fn new() -> Self {
        Location {
            bytes: 0,
            lines: 0,
            column: 0,
        }
    }

    fn advance(&mut self, c: u8) {
        self.bytes += 1;
        if c == b'\n' {
            self.lines += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::new()
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "byte: {}, line: {}, column: {}",
            self.bytes, self.lines, self.column
        )
    }
}

/// Reader adapter which keeps the location of the consumed bytes.
pub(super) struct Counted<R> {
    inner: R,
    location: Location,
}

impl<R> Counted<R> {
    pub(super) fn new(inner: R) -> Self {
        Counted {
            inner,
            location: Location::new(),
        }
    }

    pub(super) fn location(&self) -> Location {
        self.location
    }

    pub(super) fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Counted<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let size = self.inner.read(buf)?;
        for c in &buf[..size] {
            self.location.advance(*c);
        }
        Ok(size)
    }
}

impl<R: BufRead> BufRead for Counted<R> {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        // Consumed bytes are always inside the last filled buffer,
        // so this does not trigger a new read.
        if amt > 0
            && let Ok(buf) = self.inner.fill_buf()
        {
            for c in &buf[..amt.min(buf.len())] {
                self.location.advance(*c);
            }
        }
        self.inner.consume(amt);
    }
}
