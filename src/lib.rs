/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Element streams for Jabber/XMPP.
//!
//! [StreamParser] reads a `<stream:stream>` framed XML stream and hands out
//! every complete top level element as an [Element] tree. [Serializer]
//! turns trees back into XML text, and [Jid] parses protocol addresses.

mod element;
mod entities;
mod serializer;
mod tokenizer;
mod xmpp;

pub use element::Element;
pub use element::ElementError;
pub use element::XML_NAMESPACE;
pub use element::XMLNS_NAMESPACE;

pub use serializer::Quote;
pub use serializer::Serializer;

pub use tokenizer::Location;
pub use tokenizer::Token;
pub use tokenizer::TokenError;
pub use tokenizer::Tokenizer;
pub use tokenizer::TokenizerConfig;
pub use tokenizer::XmlTokenizer;

pub use xmpp::Advance;
pub use xmpp::BadJid;
pub use xmpp::HandlerResult;
pub use xmpp::Jid;
pub use xmpp::Phase;
pub use xmpp::StreamError;
pub use xmpp::StreamEvent;
pub use xmpp::StreamHandler;
pub use xmpp::StreamParser;
pub use xmpp::StreamParserBuilder;
pub use xmpp::constants;
#[cfg(feature = "tokio")]
pub use xmpp::StreamOutcome;
#[cfg(feature = "tokio")]
pub use xmpp::StreamTask;
#[cfg(feature = "tokio")]
pub use xmpp::spawn_stream_task;
