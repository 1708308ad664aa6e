/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

/// # Must not compile tests
///
/// Jid is not Eq, so it cannot be a set member:
/// ```compile_fail
/// use std::collections::HashSet;
/// use iks_stream::Jid;
/// let mut set = HashSet::new();
/// set.insert(Jid::new("juliet@example.com").unwrap());
/// ```
///
/// Jid is not Ord, so it cannot be sorted directly:
/// ```compile_fail
/// use iks_stream::Jid;
/// let mut jids = vec![Jid::new("b.com").unwrap(), Jid::new("a.com").unwrap()];
/// jids.sort();
/// ```
///
/// Sets can use the full form as the key instead:
/// ```
/// use std::collections::HashSet;
/// use iks_stream::Jid;
/// let mut set = HashSet::new();
/// set.insert(Jid::new("juliet@example.com").unwrap().full().to_string());
/// ```
///
#[cfg(doctest)]
struct MustNotCompileTests;
