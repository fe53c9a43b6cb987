//! Event-driven conversion from XML text to a generic object tree.
//!
//! Uses quick-xml's pull parser. Each open element keeps an accumulating
//! object on a stack; when the element closes, its object is attached to the
//! parent under the element's tag name.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

use crate::{TEXT_KEY, XmlConverter, XmlError};

/// An element whose end tag has not been seen yet.
struct Frame {
    name: String,
    object: Map<String, Value>,
}

pub(crate) fn convert(xml: &str, converter: &XmlConverter) -> Result<Value, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Map<String, Value> = Map::new();
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(&reader, e))?;

        match event {
            Event::Start(ref e) => {
                let frame = open_element(&reader, e, stack.is_empty(), &mut seen_root)?;
                stack.push(frame);
            }

            Event::Empty(ref e) => {
                let frame = open_element(&reader, e, stack.is_empty(), &mut seen_root)?;
                close_element(frame, &mut stack, &mut root, converter);
            }

            Event::End(_) => {
                // quick-xml has already matched the end name against the open tag
                let frame = stack.pop().ok_or_else(|| XmlError::Malformed {
                    position: reader.buffer_position() as u64,
                    message: "unexpected end tag".to_string(),
                })?;
                close_element(frame, &mut stack, &mut root, converter);
            }

            Event::Text(ref e) => {
                let text = e.unescape().map_err(|err| malformed(&reader, err))?;
                push_text(&text, &mut stack)?;
            }

            Event::CData(ref e) => {
                let text = String::from_utf8_lossy(e.as_ref());
                push_text(&text, &mut stack)?;
            }

            Event::Eof => break,

            // Declaration, comments, processing instructions and DOCTYPE
            // carry nothing for the object tree.
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }
    if !seen_root {
        return Err(XmlError::NoRoot);
    }

    tracing::trace!(bytes = xml.len(), "converted XML document");
    Ok(Value::Object(root))
}

fn malformed(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> XmlError {
    XmlError::Malformed {
        position: reader.buffer_position() as u64,
        message: err.to_string(),
    }
}

/// Build the frame for a newly opened element, copying its attributes.
fn open_element(
    reader: &Reader<&[u8]>,
    start: &BytesStart<'_>,
    at_top_level: bool,
    seen_root: &mut bool,
) -> Result<Frame, XmlError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    if at_top_level {
        if *seen_root {
            return Err(XmlError::MultipleRoots(name));
        }
        *seen_root = true;
    }

    let mut object = Map::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(reader, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| malformed(reader, e))?;
        object.insert(key, Value::String(value.into_owned()));
    }

    Ok(Frame { name, object })
}

/// Attach a finished element to its parent (or to the document object).
fn close_element(
    frame: Frame,
    stack: &mut [Frame],
    root: &mut Map<String, Value>,
    converter: &XmlConverter,
) {
    let parent = match stack.last_mut() {
        Some(parent) => &mut parent.object,
        None => root,
    };
    attach(parent, frame.name, Value::Object(frame.object), converter);
}

/// Insert `child` under `name`, promoting to an array on repetition.
///
/// An existing non-array member (including an attribute string that shares
/// the tag's name) becomes the first element of the new array. An empty
/// attribute string counts as absent and is replaced.
fn attach(parent: &mut Map<String, Value>, name: String, child: Value, converter: &XmlConverter) {
    match parent.get_mut(&name) {
        Some(Value::Array(items)) => items.push(child),
        Some(existing) if !is_empty_string(existing) => {
            let prior = existing.take();
            *existing = Value::Array(vec![prior, child]);
        }
        _ => {
            let value = if converter.is_array_tag(&name) {
                Value::Array(vec![child])
            } else {
                child
            };
            parent.insert(name, value);
        }
    }
}

fn is_empty_string(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.is_empty())
}

fn push_text(text: &str, stack: &mut [Frame]) -> Result<(), XmlError> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(frame) => {
            frame
                .object
                .insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
            Ok(())
        }
        None => Err(XmlError::TextOutsideRoot),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn convert_plain(xml: &str) -> Value {
        XmlConverter::new().convert(xml).unwrap()
    }

    #[test]
    fn test_attributes_and_text() {
        let xml = r#"<?xml version="1.0" encoding="US-ASCII"?>
<dblpperson name="Donald E. Knuth" pid="k/DonaldEKnuth" n="2">
  <person key="homepages/k/DonaldEKnuth" mdate="2020-01-01">
    <author pid="k/DonaldEKnuth">Donald E. Knuth</author>
  </person>
</dblpperson>"#;

        let value = convert_plain(xml);
        assert_eq!(
            value,
            json!({
                "dblpperson": {
                    "name": "Donald E. Knuth",
                    "pid": "k/DonaldEKnuth",
                    "n": "2",
                    "person": {
                        "key": "homepages/k/DonaldEKnuth",
                        "mdate": "2020-01-01",
                        "author": {
                            "pid": "k/DonaldEKnuth",
                            "#text": "Donald E. Knuth"
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_repeated_tag_promoted_in_order() {
        let xml = "<r><author>A</author><author>B</author><author>C</author></r>";
        let value = convert_plain(xml);
        assert_eq!(
            value["r"]["author"],
            json!([{"#text": "A"}, {"#text": "B"}, {"#text": "C"}])
        );
    }

    #[test]
    fn test_single_tag_not_promoted() {
        let value = convert_plain("<r><author>A</author></r>");
        assert!(value["r"]["author"].is_object());
    }

    #[test]
    fn test_array_tag_single_occurrence() {
        let converter = XmlConverter::with_array_tags(["author"]);
        let value = converter.convert("<r><author>A</author></r>").unwrap();
        assert_eq!(value["r"]["author"], json!([{"#text": "A"}]));
    }

    #[test]
    fn test_array_tag_on_root() {
        let converter = XmlConverter::with_array_tags(["r"]);
        let value = converter.convert("<r/>").unwrap();
        assert_eq!(value, json!({"r": [{}]}));
    }

    #[test]
    fn test_whitespace_text_ignored() {
        let value = convert_plain("<a>\n   <b/>\n  </a>");
        assert_eq!(value, json!({"a": {"b": {}}}));
    }

    #[test]
    fn test_text_stored_untrimmed() {
        let value = convert_plain("<a>  padded </a>");
        assert_eq!(value["a"]["#text"], "  padded ");
    }

    #[test]
    fn test_mixed_content_last_text_wins() {
        let value = convert_plain("<title>On the <i>k</i>-SAT Problem.</title>");
        assert_eq!(value["title"]["#text"], "-SAT Problem.");
        assert_eq!(value["title"]["i"]["#text"], "k");
    }

    #[test]
    fn test_attribute_then_child_collision_promotes() {
        let value = convert_plain(r#"<a note="attr"><note>child</note></a>"#);
        assert_eq!(value["a"]["note"], json!(["attr", {"#text": "child"}]));
    }

    #[test]
    fn test_empty_attribute_replaced_by_child() {
        let value = convert_plain(r#"<a note=""><note>child</note></a>"#);
        assert_eq!(value, json!({"a": {"note": {"#text": "child"}}}));

        let converter = XmlConverter::with_array_tags(["note"]);
        let value = converter
            .convert(r#"<a note=""><note>one</note><note>two</note></a>"#)
            .unwrap();
        assert_eq!(
            value["a"]["note"],
            json!([{"#text": "one"}, {"#text": "two"}])
        );
    }

    #[test]
    fn test_entities_and_cdata() {
        let value = convert_plain("<a x=\"1 &amp; 2\">Erd&#337;s <![CDATA[<raw>]]></a>");
        assert_eq!(value["a"]["x"], "1 & 2");
        // the CDATA run is the last non-blank text
        assert_eq!(value["a"]["#text"], "<raw>");
    }

    #[test]
    fn test_comments_and_doctype_ignored() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE dblpperson SYSTEM "dblpperson.dtd">
<!-- generated -->
<dblpperson><?pi data?><r/></dblpperson>"#;
        let value = convert_plain(xml);
        assert_eq!(value, json!({"dblpperson": {"r": {}}}));
    }

    #[test]
    fn test_mismatched_end_tag_fails() {
        let err = XmlConverter::new().convert("<a><b></a>").unwrap_err();
        assert!(matches!(err, XmlError::Malformed { .. }), "got {err:?}");
    }

    #[test]
    fn test_unclosed_element_fails() {
        let err = XmlConverter::new().convert("<a><b></b>").unwrap_err();
        assert!(
            matches!(err, XmlError::Unclosed(_) | XmlError::Malformed { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn test_empty_document_fails() {
        let err = XmlConverter::new().convert("  <!-- nothing -->  ").unwrap_err();
        assert!(matches!(err, XmlError::NoRoot));
    }

    #[test]
    fn test_multiple_roots_fail() {
        let err = XmlConverter::new().convert("<a/><b/>").unwrap_err();
        assert!(matches!(err, XmlError::MultipleRoots(ref name) if name == "b"));
    }

    #[test]
    fn test_text_outside_root_fails() {
        let err = XmlConverter::new().convert("<a/>trailing").unwrap_err();
        assert!(matches!(err, XmlError::TextOutsideRoot));
    }
}
