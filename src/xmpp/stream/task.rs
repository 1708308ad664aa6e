/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Advance;
use super::HandlerResult;
use super::StreamError;
use super::StreamEvent;
use super::StreamHandler;
use super::StreamParser;
use crate::Element;
use crate::Tokenizer;

/// How a background stream task finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The input ended or the stream was closed.
    Finished(Advance),
    /// The parser stopped with an error, which was also sent as an event.
    Failed(StreamError),
    /// The token was cancelled or the receiver was dropped.
    Cancelled,
}

/// Handle of a parser running on a blocking task.
pub struct StreamTask {
    cancel: CancellationToken,
    join: JoinHandle<StreamOutcome>,
}

impl StreamTask {
    /// Asks the task to stop. It stops before reading the next token, or
    /// while waiting for room in the channel.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the task to finish.
    pub async fn wait(self) -> StreamOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(err) => StreamOutcome::Failed(StreamError::Handler(err.to_string())),
        }
    }
}

struct ChannelHandler {
    sender: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
    runtime: Handle,
}

impl ChannelHandler {
    fn publish(&mut self, event: StreamEvent) -> HandlerResult {
        let sender = &self.sender;
        let cancel = &self.cancel;
        let sent = self.runtime.block_on(async {
            tokio::select! {
                _ = cancel.cancelled() => false,
                result = sender.send(event) => result.is_ok(),
            }
        });
        if sent {
            Ok(())
        } else {
            Err("event channel is closed".into())
        }
    }

    fn stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.sender.is_closed()
    }
}

impl StreamHandler for ChannelHandler {
    fn stream_started(&mut self, root: &Element) -> HandlerResult {
        self.publish(StreamEvent::StreamStarted(root.clone()))
    }

    fn stanza(&mut self, stanza: Element) -> HandlerResult {
        self.publish(StreamEvent::Stanza(stanza))
    }

    fn stream_ended(&mut self, root: Option<&Element>) -> HandlerResult {
        self.publish(StreamEvent::StreamEnded(root.cloned()))
    }

    fn error(&mut self, error: &StreamError) -> HandlerResult {
        if self.stopped() {
            return Ok(());
        }
        self.publish(StreamEvent::Error(error.clone()))
    }
}

/// Runs the parser on a blocking task and sends its notifications to a
/// bounded channel.
///
/// The channel size comes from
/// [channel_capacity](crate::StreamParserBuilder::channel_capacity).
/// Dropping the receiver stops the task like a cancellation.
///
/// # Panics
///
/// Panics if called outside of a tokio runtime.
pub fn spawn_stream_task<T>(
    mut parser: StreamParser<T>,
    cancel: CancellationToken,
) -> (StreamTask, mpsc::Receiver<StreamEvent>)
where
    T: Tokenizer + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(parser.config.channel_capacity);
    let mut handler = ChannelHandler {
        sender,
        cancel: cancel.clone(),
        runtime: Handle::current(),
    };
    let join = tokio::task::spawn_blocking(move || {
        loop {
            if handler.stopped() {
                debug!("stream task cancelled");
                parser.abort();
                return StreamOutcome::Cancelled;
            }
            match parser.advance(&mut handler) {
                Ok(Advance::Token) => (),
                Ok(done) => return StreamOutcome::Finished(done),
                Err(_) if handler.stopped() => {
                    debug!("stream task cancelled");
                    return StreamOutcome::Cancelled;
                }
                Err(err) => return StreamOutcome::Failed(err),
            }
        }
    });
    (StreamTask { cancel, join }, receiver)
}
