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

use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::Hash;
use std::hash::Hasher;
use std::num::NonZero;
use std::str::FromStr;

pub use error::BadJid;
use error::description;

const MAX_PART_SIZE: usize = 1023;

fn check_local(local: &str) -> Result<String, BadJid> {
    if local.is_empty() {
        return Err(BadJid(description::LOCAL_EMPTY));
    }
    let local = local.to_lowercase();
    if local.len() > MAX_PART_SIZE {
        return Err(BadJid(description::LOCAL_TOO_LONG));
    }
    Ok(local)
}

fn check_domain(domain: &str) -> Result<String, BadJid> {
    let mut domain = domain.to_lowercase();
    if domain.ends_with('.') {
        // RFC 7622 section 3.2
        domain.pop();
    }
    if domain.trim().is_empty() {
        return Err(BadJid(description::DOMAIN_EMPTY));
    }
    if domain.len() > MAX_PART_SIZE {
        return Err(BadJid(description::DOMAIN_TOO_LONG));
    }
    Ok(domain)
}

fn check_resource(resource: &str) -> Result<&str, BadJid> {
    if resource.is_empty() {
        return Err(BadJid(description::RESOURCE_EMPTY));
    }
    if resource.len() > MAX_PART_SIZE {
        return Err(BadJid(description::RESOURCE_TOO_LONG));
    }
    Ok(resource)
}

/// The address of an entity in the XMPP protocol.
///
/// Each JID has three parts:
/// - Local part: Optionally identifies a local entity on the domain.
/// - Domain part: Identifies an XMPP server.
/// - Resource part: Optionally identifies a service or an object.
///
/// The local and domain parts are case insensitive and stored in lower
/// case, the resource part is kept as is. More details can be found in
/// [RFC7622](https://datatracker.ietf.org/doc/rfc7622/).
///
/// `Jid::default()` is an invalid placeholder value. It is not equal to
/// any JID, including itself, so `Jid` implements neither `Eq` nor `Ord`.
///
/// ```
/// use iks_stream::Jid;
///
/// let jid: Jid = "Juliet@Example.COM/Balcony".parse()?;
/// assert_eq!(jid.full(), "juliet@example.com/Balcony");
/// assert_eq!(jid.bare(), Jid::new("juliet@example.com")?);
/// assert!(Jid::default() != Jid::default());
/// # Ok::<(), iks_stream::BadJid>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Jid {
    full: String,
    slash_pos: Option<NonZero<u16>>,
    at_pos: Option<NonZero<u16>>,
}

impl Jid {
    /// Create a JID from a string.
    ///
    /// The local part ends at the first `@`, and the resource part starts
    /// at the first `/` after it.
    pub fn new(jid: &str) -> Result<Self, BadJid> {
        let (local, rest) = match jid.split_once('@') {
            Some((local, rest)) => (Some(local), rest),
            None => (None, jid),
        };
        let (domain, resource) = match rest.split_once('/') {
            Some((domain, resource)) => (domain, Some(resource)),
            None => (rest, None),
        };
        Jid::from_parts(local, domain, resource)
    }

    /// Create a JID from its separate components.
    pub fn from_parts(
        local: Option<&str>,
        domain: &str,
        resource: Option<&str>,
    ) -> Result<Self, BadJid> {
        let local = local.map(check_local).transpose()?;
        let domain = check_domain(domain)?;
        let resource = resource.map(check_resource).transpose()?;
        Ok(Jid::assemble(local.as_deref(), &domain, resource))
    }

    // Parts must be already validated and normalized.
    fn assemble(local: Option<&str>, domain: &str, resource: Option<&str>) -> Jid {
        let mut full_size = domain.len();
        if let Some(local) = local {
            full_size += local.len() + 1;
        }
        if let Some(resource) = resource {
            full_size += resource.len() + 1;
        }
        let mut full = String::with_capacity(full_size);
        let mut slash_pos = None;
        let mut at_pos = None;
        if let Some(local) = local {
            full.push_str(local);
            at_pos = Some(
                // SAFETY:
                // Invariant: full length cannot be zero.
                // Guard: local part is already pushed and verified to be
                // at least one character long by check_local.
                unsafe { NonZero::new_unchecked(full.len() as u16) },
            );
            full.push('@');
        }
        full.push_str(domain);
        if let Some(resource) = resource {
            slash_pos = Some(
                // SAFETY:
                // Invariant: full length cannot be zero.
                // Guard: domain part is already pushed and verified to be
                // at least one character long by check_domain.
                unsafe { NonZero::new_unchecked(full.len() as u16) },
            );
            full.push('/');
            full.push_str(resource);
        }

        Jid {
            full,
            slash_pos,
            at_pos,
        }
    }

    /// False for the `Jid::default()` placeholder.
    pub fn is_valid(&self) -> bool {
        !self.full.is_empty()
    }

    /// Full form of the JID with all the components.
    pub fn full(&self) -> &str {
        &self.full
    }

    /// Bare form of the JID without the resource part.
    pub fn bare(&self) -> Jid {
        Jid {
            full: self.bare_str().to_string(),
            slash_pos: None,
            at_pos: self.at_pos,
        }
    }

    /// Bare form as a string slice.
    pub fn bare_str(&self) -> &str {
        match self.slash_pos {
            Some(pos) => &self.full[..pos.get() as usize],
            None => &self.full,
        }
    }

    /// Only the local part of the JID.
    pub fn localpart(&self) -> Option<&str> {
        match self.at_pos {
            Some(pos) => self.full.get(..pos.get() as usize),
            None => None,
        }
    }

    /// Only the domain part of the JID.
    pub fn domainpart(&self) -> &str {
        let start = match self.at_pos {
            Some(pos) => pos.get() as usize + 1,
            None => 0,
        };
        let end = match self.slash_pos {
            Some(pos) => pos.get() as usize,
            None => self.full.len(),
        };
        &self.full[start..end]
    }

    /// Only the resource part of the JID.
    pub fn resourcepart(&self) -> Option<&str> {
        match self.slash_pos {
            Some(pos) => self.full.get(pos.get() as usize + 1..),
            None => None,
        }
    }

    /// True if the JID does not contain a resource part.
    pub fn is_bare(&self) -> bool {
        self.is_valid() && self.slash_pos.is_none()
    }

    /// True if the JID contains a resource part.
    pub fn is_full(&self) -> bool {
        self.slash_pos.is_some()
    }

    /// Compares only the bare forms.
    pub fn bare_eq(&self, other: &Jid) -> bool {
        self.is_valid() && other.is_valid() && self.bare_str() == other.bare_str()
    }

    /// Creates another JID by overriding the resource part.
    pub fn with_resource(self, resource: &str) -> Result<Jid, BadJid> {
        let resource = check_resource(resource)?;
        if !self.is_valid() {
            return Err(BadJid(description::DOMAIN_EMPTY));
        }
        Ok(Jid::assemble(
            self.localpart(),
            self.domainpart(),
            Some(resource),
        ))
    }
}

impl FromStr for Jid {
    type Err = BadJid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Jid::new(s)
    }
}

/// Writes the full form. Fails for the invalid placeholder.
impl Display for Jid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.is_valid() {
            return Err(std::fmt::Error);
        }
        f.write_str(&self.full)
    }
}

impl PartialEq for Jid {
    fn eq(&self, other: &Jid) -> bool {
        self.is_valid() && other.is_valid() && self.full == other.full
    }
}

impl PartialOrd for Jid {
    fn partial_cmp(&self, other: &Jid) -> Option<Ordering> {
        if self.is_valid() && other.is_valid() {
            Some(self.full.cmp(&other.full))
        } else {
            None
        }
    }
}

impl Hash for Jid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full.hash(state)
    }
}


mod nocompile;
