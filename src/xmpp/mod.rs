/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

pub mod constants;
mod jid;
mod stream;

pub use jid::BadJid;
pub use jid::Jid;
pub use stream::Advance;
pub use stream::HandlerResult;
pub use stream::Phase;
pub use stream::StreamError;
pub use stream::StreamEvent;
pub use stream::StreamHandler;
pub use stream::StreamParser;
pub use stream::StreamParserBuilder;
#[cfg(feature = "tokio")]
pub use stream::StreamOutcome;
#[cfg(feature = "tokio")]
pub use stream::StreamTask;
#[cfg(feature = "tokio")]
pub use stream::spawn_stream_task;
