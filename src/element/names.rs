/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::error::ElementError;
use super::error::description;

// Character classes from the XML 1.0 fifth edition NameStartChar and
// NameChar productions, minus the colon which qualified names treat as
// the prefix separator.

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | '_'
        | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}'
    )
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

fn check_ncname(name: &str) -> Result<(), ElementError> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(ElementError::BadName(description::NAME_BAD_PREFIX)),
        Some(c) if !is_name_start_char(c) => {
            return Err(ElementError::BadName(description::NAME_BAD_START));
        }
        Some(_) => (),
    }
    if chars.all(is_name_char) {
        Ok(())
    } else {
        Err(ElementError::BadName(description::NAME_BAD_CHAR))
    }
}

/// A validated qualified name with its prefix separator position.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct QName {
    full: String,
    colon: Option<usize>,
}

impl QName {
    /// Validates `name` after trimming surrounding whitespace.
    pub(crate) fn new(name: &str) -> Result<QName, ElementError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ElementError::BadName(description::NAME_EMPTY));
        }
        let colon = name.find(':');
        match colon {
            None => check_ncname(name)?,
            Some(pos) => {
                check_ncname(&name[..pos])?;
                check_ncname(&name[pos + 1..])?;
            }
        }
        Ok(QName {
            full: name.to_string(),
            colon,
        })
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.full
    }

    pub(crate) fn prefix(&self) -> Option<&str> {
        self.colon.map(|pos| &self.full[..pos])
    }

    pub(crate) fn local_name(&self) -> &str {
        match self.colon {
            Some(pos) => &self.full[pos + 1..],
            None => &self.full,
        }
    }
}

/// Returns the prefix part of a qualified name without validating it.
pub(crate) fn prefix_of(name: &str) -> Option<&str> {
    name.find(':').map(|pos| &name[..pos])
}
