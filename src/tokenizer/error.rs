/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::error::Error;
use std::fmt::Display;

use super::Location;

/// Malformed or disallowed input reported by a tokenizer.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct TokenError {
    /// Description of the problem.
    pub description: String,
    /// Position of the tokenizer when the problem was found.
    pub location: Location,
}

impl TokenError {
    pub fn new(description: impl Into<String>, location: Location) -> Self {
        TokenError {
            description: description.into(),
            location,
        }
    }
}

impl Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid XML syntax at {}: {}", self.location, self.description)
    }
}

impl Error for TokenError {}

pub(super) mod description {
    pub(in super::super) const DOCTYPE_NOT_ALLOWED: &str = "document type declarations are not allowed";
    pub(in super::super) const COMMENT_NOT_ALLOWED: &str = "comments are not allowed";
    pub(in super::super) const PI_NOT_ALLOWED: &str = "processing instructions are not allowed";
    pub(in super::super) const NAME_NOT_UTF8: &str = "name is not valid UTF-8";
    pub(in super::super) const CDATA_NOT_UTF8: &str = "character data section is not valid UTF-8";
}
