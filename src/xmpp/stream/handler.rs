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

use super::StreamError;
use crate::Element;

/// Return type of the handler callbacks.
pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Receiver of the stream notifications.
///
/// Callbacks run synchronously inside the parser step which produced
/// them. An error returned from a callback, or a panic inside one, stops
/// the parser and is reported back through [error](StreamHandler::error)
/// as [StreamError::Handler].
pub trait StreamHandler {
    /// The framing start tag was read. Fires at most once.
    fn stream_started(&mut self, _root: &Element) -> HandlerResult {
        Ok(())
    }

    /// A complete top level element was read.
    fn stanza(&mut self, stanza: Element) -> HandlerResult;

    /// The stream was ended by its end tag or by an explicit close.
    fn stream_ended(&mut self, _root: Option<&Element>) -> HandlerResult {
        Ok(())
    }

    /// The parser stopped with a fatal error. Nothing is notified after this.
    fn error(&mut self, _error: &StreamError) -> HandlerResult {
        Ok(())
    }
}

/// Notifications as values, for consumers reading them from a channel.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    StreamStarted(Element),
    Stanza(Element),
    StreamEnded(Option<Element>),
    Error(StreamError),
}

/// Collects the notifications in order.
impl StreamHandler for Vec<StreamEvent> {
    fn stream_started(&mut self, root: &Element) -> HandlerResult {
        self.push(StreamEvent::StreamStarted(root.clone()));
        Ok(())
    }

    fn stanza(&mut self, stanza: Element) -> HandlerResult {
        self.push(StreamEvent::Stanza(stanza));
        Ok(())
    }

    fn stream_ended(&mut self, root: Option<&Element>) -> HandlerResult {
        self.push(StreamEvent::StreamEnded(root.cloned()));
        Ok(())
    }

    fn error(&mut self, error: &StreamError) -> HandlerResult {
        self.push(StreamEvent::Error(error.clone()));
        Ok(())
    }
}
