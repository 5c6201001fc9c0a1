use crate::error::{Result, TallyError};
use crate::payload::{upsert, Payload, CONTENT_KEY};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// Root element wrapped around text that fails to parse on the first attempt.
pub const SYNTHETIC_ROOT: &str = "TALLYROOT";

struct OpenElement {
    tag: String,
    attributes: Vec<(String, Payload)>,
    children: Vec<(String, Payload)>,
    text: String,
}

impl OpenElement {
    fn from_start(start: &BytesStart) -> std::result::Result<Self, String> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| format!("bad attribute on <{}>: {}", tag, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| format!("bad attribute value on <{}>: {}", tag, e))?
                .into_owned();
            upsert(&mut attributes, key, Payload::Leaf(value));
        }
        Ok(Self {
            tag,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// Collapses the element: repeated child tags become lists, single ones nest directly.
    fn finish(self) -> (String, Payload) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for (tag, _) in &self.children {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }

        let has_children = !self.children.is_empty();
        let mut entries = self.attributes;

        for (tag, child) in self.children {
            if counts.get(&tag).copied().unwrap_or(0) > 1 {
                match entries.iter_mut().find(|(k, _)| *k == tag) {
                    Some((_, Payload::List(items))) => items.push(child),
                    Some(slot) => slot.1 = Payload::List(vec![child]),
                    None => entries.push((tag, Payload::List(vec![child]))),
                }
            } else {
                upsert(&mut entries, tag, child);
            }
        }

        let text = self.text.trim();
        if !text.is_empty() {
            if has_children || !entries.is_empty() {
                upsert(&mut entries, CONTENT_KEY, Payload::Leaf(text.to_string()));
            } else {
                return (self.tag, Payload::Leaf(text.to_string()));
            }
        }

        (self.tag, Payload::Node(entries))
    }
}

fn attach(
    stack: &mut [OpenElement],
    roots: &mut Vec<(String, Payload)>,
    tag: String,
    payload: Payload,
) {
    match stack.last_mut() {
        Some(parent) => parent.children.push((tag, payload)),
        None => roots.push((tag, payload)),
    }
}

fn parse_document(text: &str) -> std::result::Result<Payload, String> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut roots: Vec<(String, Payload)> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(OpenElement::from_start(&start)?),
            Ok(Event::Empty(start)) => {
                let (tag, payload) = OpenElement::from_start(&start)?.finish();
                attach(&mut stack, &mut roots, tag, payload);
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "closing tag without matching opening tag".to_string())?;
                let (tag, payload) = element.finish();
                attach(&mut stack, &mut roots, tag, payload);
            }
            Ok(Event::Text(raw)) => {
                let text = raw
                    .unescape()
                    .map_err(|e| format!("bad text content: {}", e))?;
                match stack.last_mut() {
                    Some(element) => element.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err("text outside of the root element".to_string()),
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "{} (near byte {})",
                    e,
                    reader.buffer_position()
                ))
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.tag));
    }
    match roots.len() {
        1 => Ok(roots.remove(0).1),
        0 => Err("document has no root element".to_string()),
        n => Err(format!("document has {} root elements", n)),
    }
}

/// Parses sanitized text into a [`Payload`] rooted at the document element's content.
///
/// A document that fails to parse is retried once wrapped in a synthetic root,
/// which repairs responses carrying several top-level elements.
pub fn parse(clean: &str) -> Result<Payload> {
    if clean.trim().is_empty() {
        return Err(TallyError::parse("empty response", clean));
    }

    match parse_document(clean) {
        Ok(payload) => Ok(payload),
        Err(first) => {
            debug!("XML parse failed ({}), retrying inside a synthetic root", first);
            let wrapped = format!("<{0}>{1}</{0}>", SYNTHETIC_ROOT, clean);
            parse_document(&wrapped).map_err(|second| {
                TallyError::parse(format!("{}; repair failed: {}", first, second), clean)
            })
        }
    }
}
