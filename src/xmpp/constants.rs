/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

/// Name of the framing element wrapping every stanza.
pub const STREAM_TAG: &str = "stream:stream";

pub const STREAM_NS: &str = "http://etherx.jabber.org/streams";

pub const CLIENT_NS: &str = "jabber:client";

pub const SERVER_NS: &str = "jabber:server";
