/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::fmt::Write;

pub mod predefined {
    pub const LT: &str = "&lt;";
    pub const GT: &str = "&gt;";
    pub const AMP: &str = "&amp;";
    pub const APOS: &str = "&apos;";
    pub const QUOT: &str = "&quot;";
    pub const SPACE: &str = "&#32;";
    pub const TAB: &str = "&#9;";
    pub const LF: &str = "&#10;";
    pub const CR: &str = "&#13;";
}

/// Escapes character data.
///
/// Carriage returns are written as references so that line end
/// normalization of the reading side cannot change the text. Text made
/// only of whitespace is written entirely as references, otherwise the
/// reading side would drop it as formatting.
pub fn escape_text(s: &str, out: &mut impl Write) -> std::fmt::Result {
    if is_whitespace(s.as_bytes()) {
        for c in s.chars() {
            out.write_str(match c {
                '\t' => predefined::TAB,
                '\n' => predefined::LF,
                '\r' => predefined::CR,
                _ => predefined::SPACE,
            })?;
        }
        return Ok(());
    }
    let mut start = 0;
    for (pos, c) in s.char_indices() {
        let entity = match c {
            '<' => predefined::LT,
            '>' => predefined::GT,
            '&' => predefined::AMP,
            '\r' => predefined::CR,
            _ => continue,
        };
        out.write_str(&s[start..pos])?;
        out.write_str(entity)?;
        start = pos + 1;
    }
    out.write_str(&s[start..])
}

/// Escapes an attribute value written between `quote` characters.
///
/// Whitespace other than the space is written as references, since
/// attribute value normalization would turn it into spaces.
pub fn escape_attribute(s: &str, quote: char, out: &mut impl Write) -> std::fmt::Result {
    let mut start = 0;
    for (pos, c) in s.char_indices() {
        let entity = match c {
            '<' => predefined::LT,
            '>' => predefined::GT,
            '&' => predefined::AMP,
            '\t' => predefined::TAB,
            '\n' => predefined::LF,
            '\r' => predefined::CR,
            '"' if quote == '"' => predefined::QUOT,
            '\'' if quote == '\'' => predefined::APOS,
            _ => continue,
        };
        out.write_str(&s[start..pos])?;
        out.write_str(entity)?;
        start = pos + 1;
    }
    out.write_str(&s[start..])
}

/// True for non-empty text made only of XML whitespace characters.
pub fn is_whitespace(s: &[u8]) -> bool {
    !s.is_empty()
        && s
            .iter()
            .all(|c| matches!(c, b' ' | b'\t' | b'\r' | b'\n'))
}
