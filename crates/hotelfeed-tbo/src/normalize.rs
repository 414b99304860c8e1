//! HotelData XML normalization
//!
//! `GetHotelStaticData` embeds the hotel description as an XML string
//! inside the JSON body. This module converts that XML into a JSON tree:
//! element attributes land under `attributes`, character data under `text`
//! and `cdata`, and repeated sibling elements collapse into an array.

use anyhow::Context;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Value};

/// Convert an XML document into its cleaned JSON representation.
///
/// An empty input yields an empty object.
pub fn normalize(raw: &str) -> anyhow::Result<Value> {
    let tree = xml_to_value(raw)?;
    Ok(clean_keys(tree))
}

/// Parse XML into a JSON object mirroring the document structure.
///
/// Metadata keys carry a leading underscore at this stage: `_attributes`,
/// `_text`, `_cdata`, `_declaration`.
fn xml_to_value(raw: &str) -> anyhow::Result<Value> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);

    // Sentinel root; real elements stack on top of it
    let mut stack: Vec<(String, Map<String, Value>)> = vec![(String::new(), Map::new())];

    loop {
        match reader.read_event().context("malformed XML in hotel data")? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut element = Map::new();
                let attributes = collect_attributes(&e);
                if !attributes.is_empty() {
                    element.insert("_attributes".to_string(), Value::Object(attributes));
                }
                stack.push((name, element));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut element = Map::new();
                let attributes = collect_attributes(&e);
                if !attributes.is_empty() {
                    element.insert("_attributes".to_string(), Value::Object(attributes));
                }
                let parent = &mut stack.last_mut().expect("sentinel root present").1;
                attach_child(parent, name, Value::Object(element));
            }
            Event::End(_) => {
                // Mismatched end tags already failed in read_event, so the
                // sentinel is never popped here
                let (name, element) = stack.pop().expect("element stack underflow");
                let parent = &mut stack.last_mut().expect("sentinel root present").1;
                attach_child(parent, name, Value::Object(element));
            }
            Event::Text(e) => {
                let text = e.unescape().context("malformed XML in hotel data")?;
                if text.is_empty() {
                    continue;
                }
                let element = &mut stack.last_mut().expect("sentinel root present").1;
                append_text(element, "_text", &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                let element = &mut stack.last_mut().expect("sentinel root present").1;
                append_text(element, "_cdata", &text);
            }
            Event::Decl(d) => {
                let mut attributes = Map::new();
                if let Ok(version) = d.version() {
                    attributes.insert(
                        "version".to_string(),
                        Value::String(String::from_utf8_lossy(&version).into_owned()),
                    );
                }
                if let Some(Ok(encoding)) = d.encoding() {
                    attributes.insert(
                        "encoding".to_string(),
                        Value::String(String::from_utf8_lossy(&encoding).into_owned()),
                    );
                }
                let mut declaration = Map::new();
                declaration.insert("_attributes".to_string(), Value::Object(attributes));
                stack[0]
                    .1
                    .insert("_declaration".to_string(), Value::Object(declaration));
            }
            Event::Eof => break,
            // Comments, processing instructions and doctypes carry nothing
            // the record needs
            _ => {}
        }
    }

    // Fold any elements left open by a truncated document into the root
    while stack.len() > 1 {
        let (name, element) = stack.pop().expect("stack checked non-empty");
        let parent = &mut stack.last_mut().expect("sentinel root present").1;
        attach_child(parent, name, Value::Object(element));
    }
    let (_, root) = stack.pop().expect("sentinel root present");
    Ok(Value::Object(root))
}

fn collect_attributes(e: &quick_xml::events::BytesStart<'_>) -> Map<String, Value> {
    let mut attributes = Map::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        attributes.insert(key, Value::String(value));
    }
    attributes
}

/// Attach a finished child element, promoting repeated siblings to an array.
fn attach_child(parent: &mut Map<String, Value>, name: String, child: Value) {
    match parent.get_mut(&name) {
        Some(Value::Array(siblings)) => siblings.push(child),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, child]);
        }
        None => {
            parent.insert(name, child);
        }
    }
}

fn append_text(element: &mut Map<String, Value>, key: &str, text: &str) {
    match element.get_mut(key) {
        Some(Value::String(existing)) => existing.push_str(text),
        _ => {
            element.insert(key.to_string(), Value::String(text.to_string()));
        }
    }
}

/// Strip one leading underscore from every object key, recursively, and
/// trim surrounding whitespace. Values pass through untouched.
fn clean_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let cleaned = key.strip_prefix('_').unwrap_or(&key).trim().to_string();
                    (cleaned, clean_keys(value))
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(clean_keys).collect()),
        other => other,
    }
}
