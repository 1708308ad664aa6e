/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::sync::Barrier;
use std::thread;

use super::*;

fn names(elements: &[Element]) -> Vec<&str> {
    elements.iter().map(|element| element.name()).collect()
}

#[test]
fn it_works() {
    let iq = Element::new("iq").unwrap();
    iq.set_attribute("type", Some("get")).unwrap();
    let query = Element::with_namespace("query", "jabber:iq:roster").unwrap();
    iq.add_child(&query).unwrap();

    assert_eq!(iq.name(), "iq");
    assert_eq!(iq.attribute("type").as_deref(), Some("get"));
    assert_eq!(query.attribute("xmlns").as_deref(), Some("jabber:iq:roster"));
    assert_eq!(query.namespace().as_deref(), Some("jabber:iq:roster"));
    assert!(Element::ptr_eq(&query.parent().unwrap(), &iq));
    assert_eq!(iq.child_count(), 1);
}

#[test]
fn bad_names() {
    assert_eq!(
        Element::new("").unwrap_err(),
        ElementError::BadName(description::NAME_EMPTY)
    );
    assert_eq!(
        Element::new("9lives").unwrap_err(),
        ElementError::BadName(description::NAME_BAD_START)
    );
    let element = Element::new("a").unwrap();
    assert_eq!(
        element.set_attribute("", Some("x")).unwrap_err(),
        ElementError::BadName(description::NAME_EMPTY)
    );
    assert_eq!(
        element.set_attribute("x y", Some("1")).unwrap_err(),
        ElementError::BadName(description::NAME_BAD_CHAR)
    );
}

#[test]
fn prefixed_names() {
    let features = Element::with_namespace("stream:features", "http://etherx.jabber.org/streams")
        .unwrap();
    assert_eq!(features.prefix(), Some("stream"));
    assert_eq!(features.local_name(), "features");
    assert_eq!(
        features.attribute("xmlns:stream").as_deref(),
        Some("http://etherx.jabber.org/streams")
    );
    assert_eq!(
        features.namespace().as_deref(),
        Some("http://etherx.jabber.org/streams")
    );
}

#[test]
fn attributes() {
    let element = Element::new("presence").unwrap();
    element.set_attribute("to", Some("a@b.c")).unwrap();
    element.set_attribute("type", Some("probe")).unwrap();
    element.set_attribute("id", Some("1")).unwrap();
    element.set_attribute("to", Some("d@e.f")).unwrap();
    assert_eq!(
        element.attributes(),
        vec![
            ("to".to_string(), "d@e.f".to_string()),
            ("type".to_string(), "probe".to_string()),
            ("id".to_string(), "1".to_string()),
        ]
    );

    assert!(element.has_attribute("type"));
    element.set_attribute("type", None).unwrap();
    assert!(!element.has_attribute("type"));
    assert_eq!(element.attribute("type"), None);
    // Removing an absent attribute is fine
    element.set_attribute("type", None).unwrap();

    assert_eq!(element.remove_attribute("id").as_deref(), Some("1"));
    assert_eq!(element.remove_attribute("id"), None);
    assert_eq!(element.attributes().len(), 1);

    // Keys are case sensitive
    element.set_attribute("TO", Some("x")).unwrap();
    assert_eq!(element.attribute("to").as_deref(), Some("d@e.f"));
    assert_eq!(element.attribute("TO").as_deref(), Some("x"));

    // Names are trimmed the same way on every access
    element.set_attribute(" lang\t", Some("en")).unwrap();
    assert_eq!(element.attribute("lang").as_deref(), Some("en"));
    assert_eq!(element.attribute(" lang ").as_deref(), Some("en"));
    assert!(element.has_attribute("\tlang"));
    assert_eq!(element.remove_attribute(" lang").as_deref(), Some("en"));
    assert!(!element.has_attribute("lang"));
}

#[test]
fn snapshot_is_a_copy() {
    let element = Element::new("a").unwrap();
    element.set_attribute("x", Some("1")).unwrap();
    let snapshot = element.attributes();
    element.set_attribute("y", Some("2")).unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(element.attributes().len(), 2);

    let child = Element::new("b").unwrap();
    let children = element.children();
    element.add_child(&child).unwrap();
    assert!(children.is_empty());
    assert_eq!(element.children().len(), 1);
}

#[test]
fn values() {
    let body = Element::new("body").unwrap();
    assert_eq!(body.value(), None);
    body.append_value("Hello");
    body.append_value(", ");
    body.append_value("");
    body.append_value("World");
    assert_eq!(body.value().as_deref(), Some("Hello, World"));
    body.set_value(Some("<raw & kept>"));
    assert_eq!(body.value().as_deref(), Some("<raw & kept>"));
    body.set_value(Some(""));
    assert_eq!(body.value(), None);
    let body = Element::with_text("body", "text").unwrap();
    assert_eq!(body.value().as_deref(), Some("text"));
    body.set_value(None);
    assert_eq!(body.value(), None);
}

#[test]
fn children_order_and_moves() {
    let first = Element::new("first").unwrap();
    let second = Element::new("second").unwrap();
    let a = Element::new("a").unwrap();
    let b = Element::new("b").unwrap();
    let c = Element::new("c").unwrap();
    first.add_child(&a).unwrap();
    first.add_child(&b).unwrap();
    first.add_child(&c).unwrap();
    assert_eq!(names(&first.children()), ["a", "b", "c"]);

    // Attaching to a new parent detaches from the old one
    second.add_child(&b).unwrap();
    assert_eq!(names(&first.children()), ["a", "c"]);
    assert_eq!(names(&second.children()), ["b"]);
    assert!(Element::ptr_eq(&b.parent().unwrap(), &second));

    assert!(!first.remove_child(&b));
    assert!(second.remove_child(&b));
    assert!(b.parent().is_none());
    assert!(!second.has_children());

    assert!(c.detach());
    assert!(!c.detach());
    assert!(c.parent().is_none());
    assert_eq!(names(&first.children()), ["a"]);
}

#[test]
fn cycles_are_rejected() {
    let a = Element::new("a").unwrap();
    let b = Element::new("b").unwrap();
    let c = Element::new("c").unwrap();
    a.add_child(&b).unwrap();
    b.add_child(&c).unwrap();

    assert_eq!(
        a.add_child(&a).unwrap_err(),
        ElementError::BadTree(description::ADD_UNDER_ITSELF)
    );
    assert_eq!(
        c.add_child(&a).unwrap_err(),
        ElementError::BadTree(description::ADD_UNDER_ITSELF)
    );
    // Tree is untouched after the rejected edits
    assert!(a.parent().is_none());
    assert_eq!(names(&a.children()), ["b"]);
}

#[test]
fn searching() {
    let doc = Element::new("doc").unwrap();
    let a = Element::new("item").unwrap();
    a.set_attribute("n", Some("1")).unwrap();
    let a1 = Element::new("item").unwrap();
    a1.set_attribute("n", Some("2")).unwrap();
    let b = Element::new("group").unwrap();
    let b1 = Element::new("item").unwrap();
    b1.set_attribute("n", Some("3")).unwrap();
    let c = Element::new("item").unwrap();
    c.set_attribute("n", Some("4")).unwrap();
    doc.add_child(&a).unwrap();
    a.add_child(&a1).unwrap();
    doc.add_child(&b).unwrap();
    b.add_child(&b1).unwrap();
    doc.add_child(&c).unwrap();

    let numbers = |elements: Vec<Element>| -> Vec<String> {
        elements
            .iter()
            .map(|element| element.attribute("n").unwrap())
            .collect()
    };
    let is_item = |element: &Element| element.name() == "item";

    assert_eq!(numbers(doc.find_all(is_item, false)), ["1", "4"]);
    assert_eq!(numbers(doc.find_all(is_item, true)), ["1", "2", "3", "4"]);

    let found = doc
        .find_first(|element| element.attribute("n").as_deref() == Some("3"), true)
        .unwrap();
    assert!(Element::ptr_eq(&found, &b1));
    assert!(
        doc.find_first(|element| element.attribute("n").as_deref() == Some("3"), false)
            .is_none()
    );
    assert!(Element::ptr_eq(&doc.find_child("group").unwrap(), &b));
    assert!(doc.find_child("nothing").is_none());
}

#[test]
fn namespace_lookup() {
    let grandparent = Element::new("grandparent").unwrap();
    grandparent
        .set_attribute("xmlns:p", Some("urn:example:p"))
        .unwrap();
    grandparent
        .set_attribute("xmlns", Some("urn:example:default"))
        .unwrap();
    let parent = Element::new("parent").unwrap();
    let child = Element::new("p:child").unwrap();
    grandparent.add_child(&parent).unwrap();
    parent.add_child(&child).unwrap();

    assert_eq!(
        child.lookup_namespace(Some("p")).as_deref(),
        Some("urn:example:p")
    );
    assert_eq!(child.namespace().as_deref(), Some("urn:example:p"));
    assert_eq!(
        child.lookup_namespace(None).as_deref(),
        Some("urn:example:default")
    );
    assert_eq!(child.lookup_namespace(Some("q")), None);
    assert_eq!(
        child.lookup_namespace(Some("xml")).as_deref(),
        Some(XML_NAMESPACE)
    );
    assert_eq!(
        child.lookup_namespace(Some("xmlns")).as_deref(),
        Some(XMLNS_NAMESPACE)
    );

    // Nearest declaration wins
    parent.set_attribute("xmlns:p", Some("urn:example:near")).unwrap();
    assert_eq!(
        child.lookup_namespace(Some("p")).as_deref(),
        Some("urn:example:near")
    );
    child.set_attribute("xmlns:p", Some("urn:example:self")).unwrap();
    assert_eq!(
        child.lookup_namespace(Some("p")).as_deref(),
        Some("urn:example:self")
    );

    // Detached subtrees lose inherited declarations
    assert!(parent.detach());
    assert_eq!(parent.lookup_namespace(None), None);
}

#[test]
fn undeclared_prefixes() {
    let root = Element::new("stream:stream").unwrap();
    root.set_attribute("xmlns", Some("jabber:client")).unwrap();
    let message = Element::new("message").unwrap();
    let body = Element::new("body").unwrap();
    let extension = Element::with_namespace("x:data", "urn:x").unwrap();
    let field = Element::new("x:field").unwrap();
    field.set_attribute("y:kind", Some("a")).unwrap();
    field.set_attribute("xml:lang", Some("en")).unwrap();
    field.set_attribute("plain", Some("b")).unwrap();
    root.add_child(&message).unwrap();
    message.add_child(&body).unwrap();
    message.add_child(&extension).unwrap();
    extension.add_child(&field).unwrap();

    assert_eq!(
        message.undeclared_prefixes(),
        vec![None, Some("y".to_string())]
    );
    assert_eq!(root.undeclared_prefixes(), vec![Some("stream".to_string()), Some("y".to_string())]);
}

#[test]
fn equality_and_deep_clone() {
    let a = Element::new("a").unwrap();
    a.set_attribute("x", Some("1")).unwrap();
    a.set_attribute("y", Some("2")).unwrap();
    let b = Element::with_text("b", "text").unwrap();
    a.add_child(&b).unwrap();

    let copy = a.deep_clone();
    assert!(!Element::ptr_eq(&a, &copy));
    assert_eq!(a, copy);
    let copied_child = copy.children().remove(0);
    assert!(Element::ptr_eq(&copied_child.parent().unwrap(), &copy));
    assert!(!Element::ptr_eq(&copied_child, &b));

    // Attribute order is not significant
    let other = Element::new("a").unwrap();
    other.set_attribute("y", Some("2")).unwrap();
    other.set_attribute("x", Some("1")).unwrap();
    other.add_child(&Element::with_text("b", "text").unwrap()).unwrap();
    assert_eq!(a, other);

    copied_child.set_value(Some("changed"));
    assert_ne!(a, copy);
    assert_eq!(b.value().as_deref(), Some("text"));
}

#[test]
fn concurrent_attribute_writes() {
    let element = Element::new("shared").unwrap();
    thread::scope(|scope| {
        for t in 0..8 {
            let element = element.clone();
            scope.spawn(move || {
                for i in 0..100 {
                    element
                        .set_attribute(&format!("t{t}-{i}"), Some(&i.to_string()))
                        .unwrap();
                    let snapshot = element.attributes();
                    // A snapshot never contains duplicate keys
                    let mut keys: Vec<&String> = snapshot.iter().map(|(key, _)| key).collect();
                    keys.sort();
                    keys.dedup();
                    assert_eq!(keys.len(), snapshot.len());
                }
            });
        }
    });
    assert_eq!(element.attributes().len(), 800);
    assert_eq!(element.attribute("t7-99").as_deref(), Some("99"));
}

#[test]
fn concurrent_moves() {
    let left = Element::new("left").unwrap();
    let right = Element::new("right").unwrap();
    let items: Vec<Element> = (0..50)
        .map(|i| Element::new(&format!("item{i}")).unwrap())
        .collect();
    thread::scope(|scope| {
        for (n, target) in [&left, &right].into_iter().enumerate() {
            let items = &items;
            scope.spawn(move || {
                for round in 0..20 {
                    for (i, item) in items.iter().enumerate() {
                        if (i + round + n) % 2 == 0 {
                            target.add_child(item).unwrap();
                        }
                    }
                }
            });
        }
    });
    // Every item ends up under exactly one parent
    assert_eq!(left.child_count() + right.child_count(), items.len());
    for item in &items {
        let parent = item.parent().unwrap();
        assert!(Element::ptr_eq(&parent, &left) || Element::ptr_eq(&parent, &right));
    }
}

#[test]
fn concurrent_cross_links() {
    for _ in 0..200 {
        let a = Element::new("a").unwrap();
        let b = Element::new("b").unwrap();
        let c = Element::new("c").unwrap();
        let d = Element::new("d").unwrap();
        a.add_child(&c).unwrap();
        b.add_child(&d).unwrap();
        let barrier = Barrier::new(2);
        let (first, second) = thread::scope(|scope| {
            let first = scope.spawn(|| {
                barrier.wait();
                d.add_child(&a)
            });
            let second = scope.spawn(|| {
                barrier.wait();
                c.add_child(&b)
            });
            (first.join().unwrap(), second.join().unwrap())
        });
        // One of the links must be refused, otherwise a and b would contain
        // each other
        assert!(first.is_err() || second.is_err());
        assert!(!(a.parent().is_some() && b.parent().is_some()));
    }
}

#[test]
fn deep_trees() {
    let depth = 100_000;
    let root = Element::new("a").unwrap();
    let mut last = root.clone();
    for i in 1..depth {
        let child = Element::new("a").unwrap();
        if i % 1000 == 0 {
            child.set_attribute("mark", Some(&i.to_string())).unwrap();
        }
        last.add_child(&child).unwrap();
        last = child;
    }
    last.set_value(Some("bottom"));

    let found = root.find_first(|element| element.value().is_some(), true);
    assert!(found.is_some_and(|element| Element::ptr_eq(&element, &last)));
    assert_eq!(root.find_all(|element| element.has_attribute("mark"), true).len(), 99);
    assert_eq!(root.find_all(|element| element.has_attribute("mark"), false).len(), 0);

    let copy = root.deep_clone();
    assert_eq!(copy, root);
    last.set_value(Some("changed"));
    assert_ne!(copy, root);
    assert_eq!(format!("{root:?}").len(), format!("{copy:?}").len() + 1);

    drop(last);
    drop(copy);
    drop(root);
}
