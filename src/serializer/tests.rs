/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::*;
use crate::StreamEvent;
use crate::StreamParser;

fn element(name: &str, attributes: &[(&str, &str)]) -> Element {
    let element = Element::new(name).unwrap();
    for &(name, value) in attributes {
        element.set_attribute(name, Some(value)).unwrap();
    }
    element
}

fn sample() -> Element {
    let message = element("message", &[("to", "juliet@example.com"), ("type", "chat")]);
    let body = Element::with_text("body", "Wherefore art thou, <Romeo> & \"co\"?\r\n").unwrap();
    message.add_child(&body).unwrap();
    let x = element("x", &[("xmlns", "jabber:x:data"), ("note", "a\tb\nc")]);
    x.add_child(&element("field", &[("var", "it's")])).unwrap();
    let title = Element::with_text("title", "  padded  ").unwrap();
    x.add_child(&title).unwrap();
    message.add_child(&x).unwrap();
    message
}

fn reparse(text: &str) -> Element {
    let mut parser = StreamParser::from_bytes(text.as_bytes());
    let mut events: Vec<StreamEvent> = Vec::new();
    parser.run(&mut events).unwrap();
    assert_eq!(events.len(), 1);
    match events.pop() {
        Some(StreamEvent::Stanza(stanza)) => stanza,
        _ => panic!("stanza expected"),
    }
}

#[test]
fn compact() {
    let iq = element("iq", &[("type", "get"), ("id", "1")]);
    assert_eq!(Serializer::compact().to_string(&iq), "<iq type=\"get\" id=\"1\"/>");
    let query = Element::with_namespace("query", "jabber:iq:roster").unwrap();
    iq.add_child(&query).unwrap();
    assert_eq!(
        Serializer::compact().to_string(&iq),
        "<iq type=\"get\" id=\"1\"><query xmlns=\"jabber:iq:roster\"/></iq>"
    );
    assert_eq!(iq.to_string(), Serializer::default().to_string(&iq));
}

#[test]
fn escaping() {
    assert_eq!(
        sample().to_string(),
        "<message to=\"juliet@example.com\" type=\"chat\">\
         <body>Wherefore art thou, &lt;Romeo&gt; &amp; \"co\"?&#13;\n</body>\
         <x xmlns=\"jabber:x:data\" note=\"a&#9;b&#10;c\">\
         <field var=\"it's\"/><title>  padded  </title></x>\
         </message>"
    );
}

#[test]
fn single_quotes() {
    let field = element("field", &[("var", "it's"), ("label", "\"q\"")]);
    assert_eq!(
        Serializer::compact().quote(Quote::Single).to_string(&field),
        "<field var='it&apos;s' label='\"q\"'/>"
    );
    assert_eq!(
        Serializer::compact().to_string(&field),
        "<field var=\"it's\" label=\"&quot;q&quot;\"/>"
    );
}

#[test]
fn indented() {
    let a = Element::new("a").unwrap();
    let b = Element::new("b").unwrap();
    b.add_child(&Element::new("c").unwrap()).unwrap();
    a.add_child(&b).unwrap();
    let d = Element::with_text("d", "text").unwrap();
    d.add_child(&Element::new("e").unwrap()).unwrap();
    a.add_child(&d).unwrap();

    assert_eq!(
        Serializer::indented().to_string(&a),
        "<a>\n  <b>\n    <c/>\n  </b>\n  <d>text<e/></d>\n</a>"
    );
    assert_eq!(
        Serializer::compact().indent("\t").to_string(&a),
        "<a>\n\t<b>\n\t\t<c/>\n\t</b>\n\t<d>text<e/></d>\n</a>"
    );
    assert_eq!(
        Serializer::indented().to_string(&Element::new("lone").unwrap()),
        "<lone/>"
    );
}

#[test]
fn indented_keeps_preserved_space() {
    let a = element("a", &[("xml:space", "preserve")]);
    let b = Element::new("b").unwrap();
    b.add_child(&Element::new("c").unwrap()).unwrap();
    a.add_child(&b).unwrap();
    let root = Element::new("root").unwrap();
    root.add_child(&a).unwrap();
    assert_eq!(
        Serializer::indented().to_string(&root),
        "<root>\n  <a xml:space=\"preserve\"><b><c/></b></a>\n</root>"
    );
}

#[test]
fn inherited_namespaces() {
    let root = element(
        "stream:stream",
        &[
            ("xmlns", "jabber:client"),
            ("xmlns:stream", "http://etherx.jabber.org/streams"),
            ("xmlns:p", "urn:p"),
        ],
    );
    let features = Element::new("stream:features").unwrap();
    let message = element("message", &[("p:hint", "1")]);
    message.add_child(&Element::new("body").unwrap()).unwrap();
    let own = Element::with_namespace("iq", "urn:own").unwrap();
    root.add_child(&features).unwrap();
    root.add_child(&message).unwrap();
    root.add_child(&own).unwrap();

    assert_eq!(
        features.to_string(),
        "<stream:features xmlns:stream=\"http://etherx.jabber.org/streams\"/>"
    );
    assert_eq!(
        message.to_string(),
        "<message xmlns=\"jabber:client\" xmlns:p=\"urn:p\" p:hint=\"1\"><body/></message>"
    );
    assert_eq!(own.to_string(), "<iq xmlns=\"urn:own\"/>");
    assert_eq!(
        Serializer::compact()
            .inherited_namespaces(false)
            .to_string(&message),
        "<message p:hint=\"1\"><body/></message>"
    );
    // Serializing never changes the tree
    assert_eq!(message.attributes().len(), 1);

    let unknown = Element::new("q:x").unwrap();
    root.add_child(&unknown).unwrap();
    assert_eq!(unknown.to_string(), "<q:x/>");
}

#[test]
fn fmt_write_sink() {
    let mut out = String::from("sent: ");
    Serializer::compact()
        .write(&Element::new("presence").unwrap(), &mut out)
        .unwrap();
    assert_eq!(out, "sent: <presence/>");
    assert_eq!(format!("[{}]", Element::new("a").unwrap()), "[<a/>]");
}

#[test]
fn round_trips() {
    let original = sample();
    for serializer in [
        Serializer::compact(),
        Serializer::indented(),
        Serializer::compact().quote(Quote::Single),
        Serializer::indented().indent("\t").quote(Quote::Single),
    ] {
        let text = serializer.to_string(&original);
        assert_eq!(reparse(&text), original, "{text}");
    }

    let preserved = element("pre", &[("xml:space", "preserve")]);
    let line = Element::with_text("line", " \n ").unwrap();
    preserved.add_child(&line).unwrap();
    let text = Serializer::indented().to_string(&preserved);
    assert_eq!(reparse(&text), preserved);
}

#[test]
fn whitespace_values() {
    for value in [" ", "\t", "\n", "  \t\r\n  "] {
        let body = Element::with_text("body", value).unwrap();
        let message = Element::new("message").unwrap();
        message.add_child(&body).unwrap();
        for serializer in [Serializer::compact(), Serializer::indented()] {
            let text = serializer.to_string(&message);
            let back = reparse(&text);
            assert_eq!(back, message, "{text}");
            assert_eq!(back.find_child("body").unwrap().value().as_deref(), Some(value));
        }
    }
    assert_eq!(
        Element::with_text("body", " \n").unwrap().to_string(),
        "<body>&#32;&#10;</body>"
    );
}

#[test]
fn deep_trees() {
    let depth = 100_000;
    let root = Element::new("a").unwrap();
    let mut last = root.clone();
    for _ in 1..depth {
        let child = Element::new("a").unwrap();
        last.add_child(&child).unwrap();
        last = child;
    }
    last.set_value(Some("x"));
    drop(last);

    let text = root.to_string();
    assert_eq!(text.len(), depth * "<a></a>".len() + 1);
    assert!(text.starts_with("<a><a><a>"));
    assert!(text.ends_with("x</a></a></a>"));
    assert_eq!(reparse(&text), root);
}
