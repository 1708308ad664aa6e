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
mod names;

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::Weak;

use parking_lot::Mutex;
use parking_lot::RwLock;

pub use error::ElementError;
use error::description;
use names::QName;
pub(crate) use names::prefix_of;

/// Namespace URI permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace URI permanently bound to the `xmlns` prefix.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

struct Node {
    name: QName,
    attributes: RwLock<Vec<(String, String)>>,
    value: RwLock<Option<String>>,
    children: RwLock<Vec<Element>>,
    parent: Mutex<Weak<Node>>,
}

// Deep trees are unlinked level by level instead of by recursive drops.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = std::mem::take(self.children.get_mut());
        while let Some(child) = pending.pop() {
            if let Some(mut node) = Arc::into_inner(child.node) {
                pending.append(node.children.get_mut());
            }
        }
    }
}

// Held across the cycle check and the link in add_child.
static LINK_LOCK: Mutex<()> = Mutex::new(());

/// A shared handle to an XML element node.
///
/// Cloning the handle does not copy the element, both handles refer to the
/// same node. Use [deep_clone()](Element::deep_clone) for a structural copy.
///
/// Each node guards its attributes, text value, children, and parent link
/// with its own locks, so elements can be inspected and edited from several
/// threads at once. Accessors such as [attributes()](Element::attributes) and
/// [children()](Element::children) return point-in-time copies instead of
/// live views.
///
/// The text value is stored decoded. Escaping happens only when the element
/// is serialized.
///
/// # Examples
///
/// ```
/// use iks_stream::Element;
///
/// let message = Element::new("message")?;
/// message.set_attribute("to", Some("juliet@example.com"))?;
/// let body = Element::with_text("body", "Hello & welcome")?;
/// message.add_child(&body)?;
///
/// assert_eq!(
///     message.to_string(),
///     "<message to=\"juliet@example.com\"><body>Hello &amp; welcome</body></message>"
/// );
/// # Ok::<(), iks_stream::ElementError>(())
/// ```
#[derive(Clone)]
pub struct Element {
    node: Arc<Node>,
}

impl Element {
    /// Creates an empty element with the given qualified name.
    pub fn new(name: &str) -> Result<Element, ElementError> {
        let name = QName::new(name)?;
        Ok(Element {
            node: Arc::new(Node {
                name,
                attributes: RwLock::new(Vec::new()),
                value: RwLock::new(None),
                children: RwLock::new(Vec::new()),
                parent: Mutex::new(Weak::new()),
            }),
        })
    }

    /// Creates an element which declares the namespace of its own prefix.
    ///
    /// `<query xmlns='jabber:iq:roster'/>` is created with
    /// `Element::with_namespace("query", "jabber:iq:roster")`, and a prefixed
    /// name gets an `xmlns:prefix` declaration instead.
    pub fn with_namespace(name: &str, namespace: &str) -> Result<Element, ElementError> {
        let element = Element::new(name)?;
        let declaration = namespace_declaration(element.prefix());
        element.set_attribute(&declaration, Some(namespace))?;
        Ok(element)
    }

    /// Creates an element with a text value.
    pub fn with_text(name: &str, text: &str) -> Result<Element, ElementError> {
        let element = Element::new(name)?;
        element.set_value(Some(text));
        Ok(element)
    }

    pub(crate) fn from_parts(
        name: &str,
        attributes: Vec<(String, String)>,
    ) -> Result<Element, ElementError> {
        let element = Element::new(name)?;
        for (name, value) in attributes {
            element.set_attribute(&name, Some(&value))?;
        }
        Ok(element)
    }

    /// True if both handles refer to the same node.
    pub fn ptr_eq(a: &Element, b: &Element) -> bool {
        Arc::ptr_eq(&a.node, &b.node)
    }

    //
    // Name methods
    //

    /// Full qualified name of the element.
    pub fn name(&self) -> &str {
        self.node.name.as_str()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.node.name.prefix()
    }

    pub fn local_name(&self) -> &str {
        self.node.name.local_name()
    }

    /// Namespace URI of the element, resolved from its prefix.
    pub fn namespace(&self) -> Option<String> {
        self.lookup_namespace(self.prefix())
    }

    //
    // Attribute methods
    //

    /// Sets or removes an attribute.
    ///
    /// A `None` value removes the attribute. Setting an existing attribute
    /// replaces its value in place and keeps its position.
    pub fn set_attribute(&self, name: &str, value: Option<&str>) -> Result<(), ElementError> {
        let name = QName::new(name)?;
        let mut attributes = self.node.attributes.write();
        let existing = attributes.iter().position(|(key, _)| key == name.as_str());
        match (existing, value) {
            (Some(pos), Some(value)) => attributes[pos].1 = value.to_string(),
            (Some(pos), None) => {
                attributes.remove(pos);
            }
            (None, Some(value)) => attributes.push((name.as_str().to_string(), value.to_string())),
            (None, None) => (),
        }
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        let name = name.trim();
        self.node
            .attributes
            .read()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        let name = name.trim();
        self.node.attributes.read().iter().any(|(key, _)| key == name)
    }

    /// Removes an attribute and returns its old value.
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        let name = name.trim();
        let mut attributes = self.node.attributes.write();
        let pos = attributes.iter().position(|(key, _)| key == name)?;
        Some(attributes.remove(pos).1)
    }

    /// Snapshot of the attributes in insertion order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.node.attributes.read().clone()
    }

    //
    // Text methods
    //

    /// Decoded text content of the element.
    pub fn value(&self) -> Option<String> {
        self.node.value.read().clone()
    }

    /// Replaces the text content. An empty string clears it.
    pub fn set_value(&self, value: Option<&str>) {
        *self.node.value.write() = value.filter(|s| !s.is_empty()).map(str::to_string);
    }

    /// Concatenates text to the current content.
    pub fn append_value(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut value = self.node.value.write();
        match value.as_mut() {
            Some(old) => old.push_str(text),
            None => *value = Some(text.to_string()),
        }
    }

    //
    // Tree methods
    //

    /// Appends `child` as the last child, detaching it from any old parent.
    pub fn add_child(&self, child: &Element) -> Result<(), ElementError> {
        let _link = LINK_LOCK.lock();
        if Element::ptr_eq(self, child)
            || (child.has_children() && child.is_ancestor_of(self))
        {
            return Err(ElementError::BadTree(description::ADD_UNDER_ITSELF));
        }
        // Lock order is always LINK_LOCK, then the child's parent link, then
        // a parent's child list. Child lists are never held while taking
        // another lock.
        let mut parent_link = child.node.parent.lock();
        if let Some(old_parent) = parent_link.upgrade() {
            old_parent
                .children
                .write()
                .retain(|node| !Element::ptr_eq(node, child));
        }
        self.node.children.write().push(child.clone());
        *parent_link = Arc::downgrade(&self.node);
        Ok(())
    }

    /// Removes `child` from this element. Returns false if it is not a child.
    pub fn remove_child(&self, child: &Element) -> bool {
        let mut parent_link = child.node.parent.lock();
        match parent_link.upgrade() {
            Some(parent) if Arc::ptr_eq(&parent, &self.node) => {
                self.node
                    .children
                    .write()
                    .retain(|node| !Element::ptr_eq(node, child));
                *parent_link = Weak::new();
                true
            }
            _ => false,
        }
    }

    /// Detaches the element from its parent. Returns false if it had none.
    pub fn detach(&self) -> bool {
        let mut parent_link = self.node.parent.lock();
        match parent_link.upgrade() {
            Some(parent) => {
                parent
                    .children
                    .write()
                    .retain(|node| !Element::ptr_eq(node, self));
                *parent_link = Weak::new();
                true
            }
            None => false,
        }
    }

    pub fn parent(&self) -> Option<Element> {
        self.node
            .parent
            .lock()
            .upgrade()
            .map(|node| Element { node })
    }

    /// Snapshot of the children in document order.
    pub fn children(&self) -> Vec<Element> {
        self.node.children.read().clone()
    }

    pub fn child_count(&self) -> usize {
        self.node.children.read().len()
    }

    pub fn has_children(&self) -> bool {
        !self.node.children.read().is_empty()
    }

    fn is_ancestor_of(&self, other: &Element) -> bool {
        let mut current = other.parent();
        while let Some(element) = current {
            if Element::ptr_eq(&element, self) {
                return true;
            }
            current = element.parent();
        }
        false
    }

    //
    // Search methods
    //

    /// First descendant matching the predicate in depth-first document order.
    ///
    /// Only the direct children are checked unless `recursive` is set.
    pub fn find_first<P>(&self, predicate: P, recursive: bool) -> Option<Element>
    where
        P: Fn(&Element) -> bool,
    {
        let mut pending: Vec<Element> = self.children().into_iter().rev().collect();
        while let Some(element) = pending.pop() {
            if predicate(&element) {
                return Some(element);
            }
            if recursive {
                pending.extend(element.children().into_iter().rev());
            }
        }
        None
    }

    /// Every descendant matching the predicate in depth-first document order.
    pub fn find_all<P>(&self, predicate: P, recursive: bool) -> Vec<Element>
    where
        P: Fn(&Element) -> bool,
    {
        let mut found = Vec::new();
        let mut pending: Vec<Element> = self.children().into_iter().rev().collect();
        while let Some(element) = pending.pop() {
            if predicate(&element) {
                found.push(element.clone());
            }
            if recursive {
                pending.extend(element.children().into_iter().rev());
            }
        }
        found
    }

    /// First direct child with the given qualified name.
    pub fn find_child(&self, name: &str) -> Option<Element> {
        self.find_first(|child| child.name() == name, false)
    }

    //
    // Namespace methods
    //

    /// Resolves a namespace prefix, or the default namespace for `None`.
    ///
    /// Declarations on this element are checked first, then the parent
    /// chain. The reserved `xml` and `xmlns` prefixes always resolve to
    /// their fixed namespaces.
    pub fn lookup_namespace(&self, prefix: Option<&str>) -> Option<String> {
        match prefix {
            Some("xml") => return Some(XML_NAMESPACE.to_string()),
            Some("xmlns") => return Some(XMLNS_NAMESPACE.to_string()),
            _ => (),
        }
        let declaration = namespace_declaration(prefix);
        let mut current = Some(self.clone());
        while let Some(element) = current {
            if let Some(uri) = element.attribute(&declaration) {
                return Some(uri);
            }
            current = element.parent();
        }
        None
    }

    /// Prefixes used in this subtree which no element inside it declares.
    ///
    /// `None` stands for the default namespace of unprefixed element names.
    /// Unprefixed attributes are in no namespace and never reported, and
    /// the reserved prefixes are skipped.
    pub(crate) fn undeclared_prefixes(&self) -> Vec<Option<String>> {
        let mut found: Vec<Option<String>> = Vec::new();
        // Declarations in scope, tagged with the depth of the declaring element
        let mut declared: Vec<(usize, Option<String>)> = Vec::new();
        let mut pending = vec![(self.clone(), 0)];
        while let Some((element, depth)) = pending.pop() {
            while declared.last().is_some_and(|(level, _)| *level >= depth) {
                declared.pop();
            }
            let attributes = element.attributes();
            let mut used = vec![element.prefix().map(str::to_string)];
            for (name, _) in &attributes {
                if name == "xmlns" {
                    declared.push((depth, None));
                } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                    declared.push((depth, Some(prefix.to_string())));
                } else if let Some(prefix) = prefix_of(name) {
                    used.push(Some(prefix.to_string()));
                }
            }
            for prefix in used {
                if matches!(prefix.as_deref(), Some("xml") | Some("xmlns"))
                    || found.contains(&prefix)
                    || declared.iter().any(|(_, known)| *known == prefix)
                {
                    continue;
                }
                found.push(prefix);
            }
            pending.extend(
                element
                    .children()
                    .into_iter()
                    .rev()
                    .map(|child| (child, depth + 1)),
            );
        }
        found
    }

    //
    // Copy methods
    //

    /// Structural copy of the subtree with no parent.
    pub fn deep_clone(&self) -> Element {
        let copy = self.shallow_clone();
        let mut pending = vec![(self.clone(), copy.clone())];
        while let Some((source, target)) = pending.pop() {
            let mut children = Vec::new();
            for child in source.children() {
                let child_copy = child.shallow_clone();
                *child_copy.node.parent.lock() = Arc::downgrade(&target.node);
                children.push(child_copy.clone());
                pending.push((child, child_copy));
            }
            *target.node.children.write() = children;
        }
        copy
    }

    fn shallow_clone(&self) -> Element {
        Element {
            node: Arc::new(Node {
                name: self.node.name.clone(),
                attributes: RwLock::new(self.attributes()),
                value: RwLock::new(self.value()),
                children: RwLock::new(Vec::new()),
                parent: Mutex::new(Weak::new()),
            }),
        }
    }
}

/// Attribute name which declares the namespace of `prefix`.
pub(crate) fn namespace_declaration(prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => format!("xmlns:{prefix}"),
        None => "xmlns".to_string(),
    }
}

/// Structural equality on name, attributes, value, and children.
///
/// Attribute order does not matter, child order does.
impl PartialEq for Element {
    fn eq(&self, other: &Element) -> bool {
        let mut pending = vec![(self.clone(), other.clone())];
        while let Some((a, b)) = pending.pop() {
            if Element::ptr_eq(&a, &b) {
                continue;
            }
            if a.name() != b.name() || a.value() != b.value() {
                return false;
            }
            let attributes = a.attributes();
            let other_attributes = b.attributes();
            if attributes.len() != other_attributes.len()
                || !attributes
                    .iter()
                    .all(|attribute| other_attributes.contains(attribute))
            {
                return false;
            }
            let children = a.children();
            let other_children = b.children();
            if children.len() != other_children.len() {
                return false;
            }
            pending.extend(children.into_iter().zip(other_children));
        }
        true
    }
}

impl Eq for Element {}

/// Shows the element as compact XML.
impl Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Element")
            .field(&crate::Serializer::compact().to_string(self))
            .finish()
    }
}

#[cfg(test)]
mod tests;
