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

/// Errors returned synchronously from element construction and editing.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ElementError {
    /// An element or attribute name is not a valid qualified XML name.
    BadName(&'static str),

    /// The requested edit would break the tree structure.
    BadTree(&'static str),
}

impl Display for ElementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementError::BadName(msg) => write!(f, "invalid XML name: {msg}"),
            ElementError::BadTree(msg) => write!(f, "invalid tree edit: {msg}"),
        }
    }
}

impl Error for ElementError {}

pub(crate) mod description {
    pub(crate) const NAME_EMPTY: &str = "name is empty";
    pub(crate) const NAME_BAD_START: &str = "name must start with a letter or underscore";
    pub(crate) const NAME_BAD_CHAR: &str = "name contains a character not allowed in XML names";
    pub(crate) const NAME_BAD_PREFIX: &str =
        "qualified name must have a non-empty prefix and local part around a single colon";
    pub(crate) const ADD_UNDER_ITSELF: &str =
        "element cannot be added under itself or one of its descendants";
}
