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
mod handler;
#[cfg(feature = "tokio")]
mod task;

use std::any::Any;
use std::io::BufRead;
use std::panic;
use std::panic::AssertUnwindSafe;

use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::Element;
use crate::ElementError;
use crate::Location;
use crate::Token;
use crate::TokenError;
use crate::Tokenizer;
use crate::TokenizerConfig;
use crate::XmlTokenizer;
use crate::element::namespace_declaration;

use super::constants::STREAM_TAG;
use error::description;
pub use error::StreamError;
pub use handler::HandlerResult;
pub use handler::StreamEvent;
pub use handler::StreamHandler;
#[cfg(feature = "tokio")]
pub use task::StreamOutcome;
#[cfg(feature = "tokio")]
pub use task::StreamTask;
#[cfg(feature = "tokio")]
pub use task::spawn_stream_task;

/// Lifecycle of a [StreamParser].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Phase {
    /// No framing start tag yet. Top level elements are still reported
    /// as stanzas in this phase.
    Ready,
    /// Framing start tag was read.
    StreamOpen,
    /// Stream ended, closed, or failed. No more notifications.
    Closed,
}

/// Result of a single [advance](StreamParser::advance) step.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Advance {
    /// A token was consumed and more input may follow.
    Token,
    /// Input ended cleanly.
    Exhausted,
    /// Input ended inside an open stream or an open stanza.
    Truncated,
    /// The parser is closed.
    Closed,
}

#[derive(Debug, Clone)]
struct StreamConfig {
    framing_tag: String,
    leave_open: bool,
    inherit_namespaces: bool,
    channel_capacity: usize,
}

/// Configures and creates a [StreamParser].
///
/// ```
/// use iks_stream::{Advance, StreamEvent, StreamParser};
///
/// let mut parser = StreamParser::builder()
///     .framing_tag("wrapper")
///     .build_from_reader("<wrapper><a/></wrapper>".as_bytes());
/// let mut events: Vec<StreamEvent> = Vec::new();
/// assert_eq!(parser.run(&mut events)?, Advance::Closed);
/// assert_eq!(events.len(), 3);
/// # Ok::<(), iks_stream::StreamError>(())
/// ```
#[derive(Debug, Clone)]
pub struct StreamParserBuilder {
    config: StreamConfig,
    tokenizer_config: TokenizerConfig,
}

impl StreamParserBuilder {
    pub fn new() -> Self {
        StreamParserBuilder {
            config: StreamConfig {
                framing_tag: STREAM_TAG.to_string(),
                leave_open: false,
                inherit_namespaces: true,
                channel_capacity: 32,
            },
            tokenizer_config: TokenizerConfig::default(),
        }
    }

    /// Qualified name of the root element wrapping the stanzas.
    pub fn framing_tag(mut self, tag: &str) -> Self {
        self.config.framing_tag = tag.to_string();
        self
    }

    /// Keeps the tokenizer and its reader after the parser is closed so
    /// they can be taken back with `into_tokenizer` or `into_inner`.
    pub fn leave_open(mut self, leave_open: bool) -> Self {
        self.config.leave_open = leave_open;
        self
    }

    /// Copies the namespace declarations a stanza uses from the framing
    /// root onto the stanza, so it is complete on its own.
    pub fn inherit_namespaces(mut self, inherit: bool) -> Self {
        self.config.inherit_namespaces = inherit;
        self
    }

    /// Tokenizer settings used by `build_from_reader`.
    pub fn tokenizer_config(mut self, config: TokenizerConfig) -> Self {
        self.tokenizer_config = config;
        self
    }

    /// Size of the event channel of the background task.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity.max(1);
        self
    }

    pub fn build<T: Tokenizer>(self, tokenizer: T) -> StreamParser<T> {
        StreamParser {
            tokenizer: Some(tokenizer),
            config: self.config,
            phase: Phase::Ready,
            stack: Vec::new(),
            root: None,
            location: Location::new(),
        }
    }

    pub fn build_from_reader<R: BufRead>(self, reader: R) -> StreamParser<XmlTokenizer<R>> {
        let tokenizer = XmlTokenizer::with_config(reader, self.tokenizer_config);
        self.build(tokenizer)
    }
}

impl Default for StreamParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental parser for XMPP style element streams.
///
/// A stream is a long lived framing element, `<stream:stream>` by default,
/// wrapping complete top level elements called stanzas. The parser reads
/// one token at a time and builds each stanza as an [Element] tree, and
/// passes it to a [StreamHandler] as soon as its end tag is read. The
/// framing element itself is never completed in memory; it is only
/// reported through the `stream_started` and `stream_ended` callbacks.
///
/// Any error is fatal: the handler's `error` callback fires once, the
/// parser moves to [Phase::Closed], and a partially built stanza is
/// dropped.
///
/// # Examples
///
/// ```
/// use iks_stream::{StreamEvent, StreamParser};
///
/// let mut parser = StreamParser::from_bytes(
///     b"<stream:stream xmlns:stream='http://etherx.jabber.org/streams'>\
///       <message><body>Hi</body></message>\
///       </stream:stream>",
/// );
/// let mut events: Vec<StreamEvent> = Vec::new();
/// parser.run(&mut events)?;
/// match &events[1] {
///     StreamEvent::Stanza(stanza) => {
///         assert_eq!(stanza.to_string(), "<message><body>Hi</body></message>");
///     }
///     _ => unreachable!(),
/// }
/// # Ok::<(), iks_stream::StreamError>(())
/// ```
pub struct StreamParser<T> {
    tokenizer: Option<T>,
    config: StreamConfig,
    phase: Phase,
    stack: Vec<Element>,
    root: Option<Element>,
    location: Location,
}

impl StreamParser<()> {
    pub fn builder() -> StreamParserBuilder {
        StreamParserBuilder::new()
    }
}

impl<T: Tokenizer> StreamParser<T> {
    /// Creates a parser with the default settings.
    pub fn new(tokenizer: T) -> Self {
        StreamParserBuilder::new().build(tokenizer)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Position of the last consumed token.
    pub fn location(&self) -> Location {
        self.location
    }

    /// The framing element, once its start tag is read.
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Consumes one token and performs at most one transition.
    ///
    /// Returns [Advance::Closed] without reading anything once the
    /// parser is closed. Fatal errors are both passed to the handler and
    /// returned.
    pub fn advance<H: StreamHandler + ?Sized>(
        &mut self,
        handler: &mut H,
    ) -> Result<Advance, StreamError> {
        if self.phase == Phase::Closed {
            return Ok(Advance::Closed);
        }
        let Some(tokenizer) = self.tokenizer.as_mut() else {
            return Ok(Advance::Closed);
        };
        let token = tokenizer.next_token();
        self.location = tokenizer.location();
        let result = match token {
            Ok(token) => self.step(token, handler),
            Err(err) => Err(StreamError::BadXml(err)),
        };
        result.map_err(|err| self.fail(handler, err))
    }

    /// Calls [advance](StreamParser::advance) until the input ends or
    /// the parser closes.
    pub fn run<H: StreamHandler + ?Sized>(&mut self, handler: &mut H) -> Result<Advance, StreamError> {
        loop {
            match self.advance(handler)? {
                Advance::Token => (),
                done => return Ok(done),
            }
        }
    }

    /// Ends the stream from the consumer side.
    ///
    /// An open stream is ended normally and `stream_ended` fires. A stanza
    /// still under construction is dropped. Closing again does nothing.
    pub fn close<H: StreamHandler + ?Sized>(&mut self, handler: &mut H) -> Result<(), StreamError> {
        if self.phase == Phase::Closed {
            self.release();
            return Ok(());
        }
        let was_open = self.phase == Phase::StreamOpen;
        self.phase = Phase::Closed;
        self.stack.clear();
        debug!(was_open, "stream parser closed");
        let result = if was_open {
            let root = self.root.clone();
            notify(|| handler.stream_ended(root.as_ref()))
        } else {
            Ok(())
        };
        self.release();
        result.map_err(|err| self.fail(handler, err))
    }

    /// Closes the parser without any notification.
    pub fn abort(&mut self) {
        if self.phase != Phase::Closed {
            debug!("stream parser aborted");
        }
        self.phase = Phase::Closed;
        self.stack.clear();
        self.release();
    }

    /// Takes back the tokenizer, unless the parser was closed without
    /// the `leave_open` option.
    pub fn into_tokenizer(self) -> Option<T> {
        self.tokenizer
    }

    fn release(&mut self) {
        if !self.config.leave_open {
            self.tokenizer = None;
        }
    }

    fn fail<H: StreamHandler + ?Sized>(&mut self, handler: &mut H, err: StreamError) -> StreamError {
        warn!(error = %err, "stream parser failed");
        self.phase = Phase::Closed;
        self.stack.clear();
        if let Err(handler_err) = notify(|| handler.error(&err)) {
            warn!(error = %handler_err, "error handler failed");
        }
        self.release();
        err
    }

    fn bad_stream(&self, description: &'static str) -> StreamError {
        StreamError::BadStream {
            description,
            location: self.location,
        }
    }

    fn step<H: StreamHandler + ?Sized>(
        &mut self,
        token: Token,
        handler: &mut H,
    ) -> Result<Advance, StreamError> {
        match token {
            Token::Start {
                name,
                attributes,
                empty,
            } => self.start_tag(handler, &name, attributes, empty),
            Token::End(name) => self.end_tag(handler, &name),
            Token::Text(text) => {
                self.text(&text);
                Ok(Advance::Token)
            }
            Token::Whitespace(text) => {
                if self.preserve_space() {
                    self.text(&text);
                }
                Ok(Advance::Token)
            }
            Token::Ignored => Ok(Advance::Token),
            Token::Eof => {
                if self.phase == Phase::StreamOpen || !self.stack.is_empty() {
                    debug!(open = self.stack.len(), "input ended inside the stream");
                    Ok(Advance::Truncated)
                } else {
                    Ok(Advance::Exhausted)
                }
            }
        }
    }

    fn start_tag<H: StreamHandler + ?Sized>(
        &mut self,
        handler: &mut H,
        name: &str,
        attributes: Vec<(String, String)>,
        empty: bool,
    ) -> Result<Advance, StreamError> {
        let element =
            Element::from_parts(name, attributes).map_err(|err| self.bad_element(err))?;

        if name == self.config.framing_tag {
            if self.phase != Phase::Ready || !self.stack.is_empty() {
                return Err(self.bad_stream(description::STREAM_RESTART));
            }
            debug!(name, "stream started");
            self.phase = Phase::StreamOpen;
            self.root = Some(element.clone());
            notify(|| handler.stream_started(&element))?;
            if empty {
                return self.end_stream(handler);
            }
            return Ok(Advance::Token);
        }

        if let Some(parent) = self.stack.last() {
            parent.add_child(&element).map_err(|err| self.bad_element(err))?;
        }
        if !empty {
            self.stack.push(element);
        } else if self.stack.is_empty() {
            self.emit_stanza(handler, element)?;
        }
        Ok(Advance::Token)
    }

    fn end_tag<H: StreamHandler + ?Sized>(
        &mut self,
        handler: &mut H,
        name: &str,
    ) -> Result<Advance, StreamError> {
        if self.stack.is_empty() && name == self.config.framing_tag {
            if self.phase != Phase::StreamOpen {
                return Err(self.bad_stream(description::CLOSE_WITHOUT_OPEN));
            }
            return self.end_stream(handler);
        }

        let Some(element) = self.stack.pop() else {
            return Err(self.bad_stream(description::CLOSE_WITHOUT_OPEN));
        };
        if element.name() != name {
            return Err(self.bad_stream(description::TAG_MISMATCH));
        }
        if self.stack.is_empty() {
            self.emit_stanza(handler, element)?;
        }
        Ok(Advance::Token)
    }

    fn end_stream<H: StreamHandler + ?Sized>(&mut self, handler: &mut H) -> Result<Advance, StreamError> {
        debug!("stream ended");
        self.phase = Phase::Closed;
        let root = self.root.clone();
        let result = notify(|| handler.stream_ended(root.as_ref()));
        self.release();
        result.map(|()| Advance::Closed)
    }

    fn emit_stanza<H: StreamHandler + ?Sized>(
        &mut self,
        handler: &mut H,
        stanza: Element,
    ) -> Result<(), StreamError> {
        if self.config.inherit_namespaces
            && let Some(root) = &self.root
        {
            inherit_namespaces(root, &stanza).map_err(|err| self.bad_element(err))?;
        }
        trace!(name = stanza.name(), location = %self.location, "stanza");
        notify(|| handler.stanza(stanza))
    }

    fn text(&self, text: &str) {
        if let Some(element) = self.stack.last() {
            element.append_value(text);
        }
    }

    // The innermost xml:space declaration wins, the framing root included.
    fn preserve_space(&self) -> bool {
        !self.stack.is_empty()
            && self
                .stack
                .iter()
                .rev()
                .chain(self.root.iter())
                .find_map(|element| element.attribute("xml:space"))
                .is_some_and(|space| space == "preserve")
    }

    fn bad_element(&self, err: ElementError) -> StreamError {
        StreamError::BadXml(TokenError::new(err.to_string(), self.location))
    }
}

impl<'a> StreamParser<XmlTokenizer<&'a [u8]>> {
    /// Creates a parser with the default settings over a byte slice.
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        StreamParserBuilder::new().build_from_reader(bytes)
    }
}

impl<R: BufRead> StreamParser<XmlTokenizer<R>> {
    /// Creates a parser with the default settings over a reader.
    pub fn from_reader(reader: R) -> Self {
        StreamParserBuilder::new().build_from_reader(reader)
    }

    /// Takes back the reader, unless the parser was closed without the
    /// `leave_open` option.
    pub fn into_inner(self) -> Option<R> {
        self.tokenizer.map(XmlTokenizer::into_inner)
    }
}

fn inherit_namespaces(root: &Element, stanza: &Element) -> Result<(), ElementError> {
    for prefix in stanza.undeclared_prefixes() {
        if let Some(uri) = root.lookup_namespace(prefix.as_deref()) {
            stanza.set_attribute(&namespace_declaration(prefix.as_deref()), Some(&uri))?;
        }
    }
    Ok(())
}

fn notify<F: FnOnce() -> HandlerResult>(callback: F) -> Result<(), StreamError> {
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(StreamError::Handler(err.to_string())),
        Err(payload) => Err(StreamError::Handler(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}
