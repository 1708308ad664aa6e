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

use crate::Location;
use crate::TokenError;

/// Fatal problem which stops a [StreamParser](crate::StreamParser).
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum StreamError {
    /// Malformed input reported by the tokenizer.
    BadXml(TokenError),
    /// Well-formed tokens which break the stream framing rules.
    BadStream {
        description: &'static str,
        location: Location,
    },
    /// A handler callback returned an error or panicked.
    Handler(String),
}

impl Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::BadXml(err) => err.fmt(f),
            StreamError::BadStream {
                description,
                location,
            } => write!(f, "invalid stream protocol at {location}: {description}"),
            StreamError::Handler(msg) => write!(f, "stream handler failed: {msg}"),
        }
    }
}

impl Error for StreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StreamError::BadXml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TokenError> for StreamError {
    fn from(err: TokenError) -> Self {
        StreamError::BadXml(err)
    }
}

pub(super) mod description {
    pub(in super::super) const TAG_MISMATCH: &str = "end tag does not match the open element";
    pub(in super::super) const CLOSE_WITHOUT_OPEN: &str = "end tag without an open element";
    pub(in super::super) const STREAM_RESTART: &str = "stream start tag is not allowed here";
}
