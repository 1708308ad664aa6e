/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod error;
mod location;

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use tracing::trace;

use crate::entities::is_whitespace;

pub use error::TokenError;
use error::description;
use location::Counted;
pub use location::Location;

/// A low level XML event consumed by the stream parser.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Token {
    /// A start tag or an empty element tag.
    ///
    /// Attribute values are already decoded. Duplicate attribute names are
    /// rejected by the tokenizer.
    Start {
        name: String,
        attributes: Vec<(String, String)>,
        empty: bool,
    },

    /// An end tag with its full name.
    End(String),

    /// Decoded character data, including CDATA sections.
    Text(String),

    /// Character data which consists only of literal whitespace. Text
    /// with whitespace character references is reported as [Token::Text].
    Whitespace(String),

    /// Declarations, comments, and processing instructions.
    Ignored,

    /// No more input.
    Eof,
}

/// Source of XML tokens.
///
/// The tokenizer is responsible for well-formedness of the individual
/// tokens, entity decoding, and rejecting disallowed constructs. The tag
/// structure is checked by the [StreamParser](crate::StreamParser).
pub trait Tokenizer {
    /// Reads the next token. Called again after [Token::Eof] it keeps
    /// returning [Token::Eof].
    fn next_token(&mut self) -> Result<Token, TokenError>;

    /// Position of the last consumed input byte.
    fn location(&self) -> Location;
}

/// Which XML constructs the tokenizer refuses.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TokenizerConfig {
    pub reject_doctype: bool,
    pub reject_comments: bool,
    pub reject_processing_instructions: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            reject_doctype: true,
            reject_comments: false,
            reject_processing_instructions: false,
        }
    }
}

/// Tokenizer reading UTF-8 XML text from a buffered reader.
///
/// Input in other encodings must be decoded to UTF-8 before it reaches
/// the reader. The encoding named in an XML declaration is not used.
pub struct XmlTokenizer<R> {
    reader: Reader<Counted<R>>,
    buffer: Vec<u8>,
    config: TokenizerConfig,
}

impl<R: BufRead> XmlTokenizer<R> {
    pub fn new(reader: R) -> Self {
        XmlTokenizer::with_config(reader, TokenizerConfig::default())
    }

    pub fn with_config(reader: R, config: TokenizerConfig) -> Self {
        let mut reader = Reader::from_reader(Counted::new(reader));
        let reader_config = reader.config_mut();
        reader_config.trim_text(false);
        // Tag structure is checked by the stream parser
        reader_config.check_end_names = false;
        reader_config.allow_unmatched_ends = true;
        reader_config.expand_empty_elements = false;
        XmlTokenizer {
            reader,
            buffer: Vec::new(),
            config,
        }
    }

    /// Gives back the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader.into_inner().into_inner()
    }
}

impl<R: BufRead> Tokenizer for XmlTokenizer<R> {
    fn next_token(&mut self) -> Result<Token, TokenError> {
        self.buffer.clear();
        let event = self.reader.read_event_into(&mut self.buffer);
        let location = self.reader.get_ref().location();
        let token = match event {
            Err(err) => return Err(TokenError::new(err.to_string(), location)),
            Ok(Event::Start(tag)) => start_token(&tag, false, location)?,
            Ok(Event::Empty(tag)) => start_token(&tag, true, location)?,
            Ok(Event::End(tag)) => Token::End(decode_name(tag.name().as_ref(), location)?),
            Ok(Event::Text(text)) => {
                // Whitespace written as character references is content
                let formatting = is_whitespace(&text);
                let text = text
                    .unescape()
                    .map_err(|err| TokenError::new(err.to_string(), location))?;
                if formatting {
                    Token::Whitespace(text.into_owned())
                } else {
                    Token::Text(text.into_owned())
                }
            }
            Ok(Event::CData(cdata)) => match String::from_utf8(cdata.into_inner().into_owned()) {
                Ok(text) => Token::Text(text),
                Err(_) => return Err(TokenError::new(description::CDATA_NOT_UTF8, location)),
            },
            Ok(Event::DocType(_)) if self.config.reject_doctype => {
                return Err(TokenError::new(description::DOCTYPE_NOT_ALLOWED, location));
            }
            Ok(Event::Comment(_)) if self.config.reject_comments => {
                return Err(TokenError::new(description::COMMENT_NOT_ALLOWED, location));
            }
            Ok(Event::PI(_)) if self.config.reject_processing_instructions => {
                return Err(TokenError::new(description::PI_NOT_ALLOWED, location));
            }
            Ok(Event::Eof) => Token::Eof,
            Ok(_) => Token::Ignored,
        };
        trace!(?token, %location, "token");
        Ok(token)
    }

    fn location(&self) -> Location {
        self.reader.get_ref().location()
    }
}

fn decode_name(name: &[u8], location: Location) -> Result<String, TokenError> {
    match std::str::from_utf8(name) {
        Ok(name) => Ok(name.to_string()),
        Err(_) => Err(TokenError::new(description::NAME_NOT_UTF8, location)),
    }
}

fn start_token(tag: &BytesStart, empty: bool, location: Location) -> Result<Token, TokenError> {
    let name = decode_name(tag.name().as_ref(), location)?;
    let mut attributes = Vec::new();
    for attribute in tag.attributes() {
        let attribute = attribute.map_err(|err| TokenError::new(err.to_string(), location))?;
        let key = decode_name(attribute.key.as_ref(), location)?;
        let value = attribute
            .unescape_value()
            .map_err(|err| TokenError::new(err.to_string(), location))?;
        attributes.push((key, value.into_owned()));
    }
    Ok(Token::Start {
        name,
        attributes,
        empty,
    })
}
