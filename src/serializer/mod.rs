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

use crate::Element;
use crate::element::namespace_declaration;
use crate::entities::escape_attribute;
use crate::entities::escape_text;

/// Quote character used around attribute values.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum Quote {
    #[default]
    Double,
    Single,
}

impl Quote {
    fn as_char(self) -> char {
        match self {
            Quote::Double => '"',
            Quote::Single => '\'',
        }
    }
}

/// Converts element trees into XML text.
///
/// The compact form has no whitespace between tags and is what goes on the
/// wire. The indented form puts every child on its own line, which is handy
/// for logs. Elements carrying text, or inside an `xml:space="preserve"`
/// scope, are always written inline so that indentation never changes
/// their content.
///
/// When the serialized element is part of a bigger tree and uses a
/// namespace declared only by its ancestors, the declaration is repeated on
/// the output root so the text stands on its own.
///
/// # Examples
///
/// ```
/// use iks_stream::{Element, Quote, Serializer};
///
/// let iq = Element::new("iq")?;
/// iq.set_attribute("type", Some("get"))?;
/// iq.add_child(&Element::with_namespace("query", "jabber:iq:roster")?)?;
///
/// assert_eq!(
///     Serializer::compact().quote(Quote::Single).to_string(&iq),
///     "<iq type='get'><query xmlns='jabber:iq:roster'/></iq>"
/// );
/// assert_eq!(
///     Serializer::indented().to_string(&iq),
///     "<iq type=\"get\">\n  <query xmlns=\"jabber:iq:roster\"/>\n</iq>"
/// );
/// # Ok::<(), iks_stream::ElementError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Serializer {
    indent: Option<String>,
    quote: Quote,
    inherited_namespaces: bool,
}

impl Serializer {
    pub fn compact() -> Serializer {
        Serializer {
            indent: None,
            quote: Quote::Double,
            inherited_namespaces: true,
        }
    }

    /// Indented serializer using two spaces per level.
    pub fn indented() -> Serializer {
        Serializer {
            indent: Some("  ".to_string()),
            ..Serializer::compact()
        }
    }

    /// Switches to indented output with the given unit per depth level.
    pub fn indent(mut self, unit: &str) -> Serializer {
        self.indent = Some(unit.to_string());
        self
    }

    pub fn quote(mut self, quote: Quote) -> Serializer {
        self.quote = quote;
        self
    }

    /// Whether namespace declarations inherited from ancestors outside the
    /// serialized subtree are written on its root.
    pub fn inherited_namespaces(mut self, enabled: bool) -> Serializer {
        self.inherited_namespaces = enabled;
        self
    }

    pub fn to_string(&self, element: &Element) -> String {
        let mut buf = String::new();
        // Writing into a String cannot fail
        let _ = self.write(element, &mut buf);
        buf
    }

    pub fn write<W: Write>(&self, element: &Element, out: &mut W) -> std::fmt::Result {
        let inherited = if self.inherited_namespaces {
            inherited_declarations(element)
        } else {
            Vec::new()
        };
        let quote = self.quote.as_char();
        let mut pending = vec![Step::Open {
            element: element.clone(),
            depth: 0,
            pretty: self.indent.is_some(),
            newline: false,
        }];
        while let Some(step) = pending.pop() {
            let (element, depth, pretty, newline) = match step {
                Step::Open {
                    element,
                    depth,
                    pretty,
                    newline,
                } => (element, depth, pretty, newline),
                Step::Close {
                    element,
                    depth,
                    newline,
                } => {
                    if newline {
                        self.write_newline(depth, out)?;
                    }
                    out.write_str("</")?;
                    out.write_str(element.name())?;
                    out.write_char('>')?;
                    continue;
                }
            };
            if newline {
                self.write_newline(depth, out)?;
            }

            let attributes = element.attributes();
            let value = element.value();
            let children = element.children();
            let extra_attributes: &[(String, String)] = if depth == 0 { &inherited } else { &[] };

            out.write_char('<')?;
            out.write_str(element.name())?;
            for (name, value) in extra_attributes.iter().chain(attributes.iter()) {
                out.write_char(' ')?;
                out.write_str(name)?;
                out.write_char('=')?;
                out.write_char(quote)?;
                escape_attribute(value, quote, out)?;
                out.write_char(quote)?;
            }
            if value.is_none() && children.is_empty() {
                out.write_str("/>")?;
                continue;
            }
            out.write_char('>')?;

            let preserve = attributes
                .iter()
                .any(|(name, value)| name == "xml:space" && value == "preserve");
            let pretty = pretty && value.is_none() && !preserve;
            if let Some(value) = &value {
                escape_text(value, out)?;
            }
            pending.push(Step::Close {
                element,
                depth,
                newline: pretty && !children.is_empty(),
            });
            pending.extend(children.into_iter().rev().map(|child| Step::Open {
                element: child,
                depth: depth + 1,
                pretty,
                newline: pretty,
            }));
        }
        Ok(())
    }

    fn write_newline<W: Write>(&self, depth: usize, out: &mut W) -> std::fmt::Result {
        out.write_char('\n')?;
        if let Some(unit) = &self.indent {
            for _ in 0..depth {
                out.write_str(unit)?;
            }
        }
        Ok(())
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Serializer::compact()
    }
}

enum Step {
    Open {
        element: Element,
        depth: usize,
        pretty: bool,
        newline: bool,
    },
    Close {
        element: Element,
        depth: usize,
        newline: bool,
    },
}

/// Declarations the subtree needs from ancestors outside of it.
fn inherited_declarations(element: &Element) -> Vec<(String, String)> {
    let Some(parent) = element.parent() else {
        return Vec::new();
    };
    element
        .undeclared_prefixes()
        .into_iter()
        .filter_map(|prefix| {
            let uri = parent.lookup_namespace(prefix.as_deref())?;
            Some((namespace_declaration(prefix.as_deref()), uri))
        })
        .collect()
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Serializer::compact().write(self, f)
    }
}

#[cfg(test)]
mod tests;
