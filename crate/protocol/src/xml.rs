//! XML dialect of the gateway.
//!
//! Documents are a single root element (`<xml>`) whose children are leaf elements, one per
//! field. On the way out every value is wrapped in CDATA and no XML declaration is written.
//! On the way in the body must decode to a flat mapping of strings: nested elements and
//! repeated elements are rejected instead of being turned into objects or arrays.

use quick_xml::{
    Reader, Writer,
    events::{BytesCData, BytesEnd, BytesStart, Event},
};
use wxpay_logger::trace;

use crate::{FieldMapping, FieldValue, ProtocolError, error::result::ProtocolResult};

/// Root element used by the gateway for requests, responses and notifications.
pub const ROOT_TAG: &str = "xml";

/// Serialize under the default `<xml>` root.
pub fn to_xml(fields: &FieldMapping) -> ProtocolResult<Vec<u8>> {
    to_xml_with_root(fields, ROOT_TAG)
}

pub fn to_xml_with_root(fields: &FieldMapping, root: &str) -> ProtocolResult<Vec<u8>> {
    check_name(root)?;
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, root, fields)?;
    Ok(writer.into_inner())
}

fn write_element(w: &mut Writer<Vec<u8>>, tag: &str, fields: &FieldMapping) -> ProtocolResult<()> {
    write_event(w, Event::Start(BytesStart::new(tag)))?;
    for (key, value) in fields.iter() {
        check_name(key)?;
        match value {
            FieldValue::Nested(inner) => write_element(w, key, inner)?,
            scalar => {
                write_event(w, Event::Start(BytesStart::new(key)))?;
                write_cdata(w, &scalar.to_string())?;
                write_event(w, Event::End(BytesEnd::new(key)))?;
            }
        }
    }
    write_event(w, Event::End(BytesEnd::new(tag)))
}

/// A CDATA section cannot contain `]]>`: split the text so the terminator straddles two
/// sections, readers concatenate adjacent sections back.
fn write_cdata(w: &mut Writer<Vec<u8>>, text: &str) -> ProtocolResult<()> {
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        let (head, tail) = rest.split_at(pos + 2);
        write_event(w, Event::CData(BytesCData::new(head)))?;
        rest = tail;
    }
    write_event(w, Event::CData(BytesCData::new(rest)))
}

fn write_event(w: &mut Writer<Vec<u8>>, event: Event<'_>) -> ProtocolResult<()> {
    w.write_event(event)
        .map_err(|e| ProtocolError::XmlEncode(e.to_string()))
}

fn check_name(name: &str) -> ProtocolResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')) {
        Ok(())
    } else {
        Err(ProtocolError::XmlEncode(format!(
            "'{name}' is not a valid element name"
        )))
    }
}

/// Decode a gateway document into a flat mapping.
///
/// An empty (or whitespace only) body yields an empty mapping. Anything else that is not a
/// single root element with leaf children fails with [`ProtocolError::XmlDecode`].
pub fn from_xml(body: &[u8]) -> ProtocolResult<FieldMapping> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FieldMapping::new())
    }
    trace!("decoding XML body of {} bytes", body.len());

    let mut reader = Reader::from_reader(body);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut fields = FieldMapping::new();
    let mut root_seen = false;
    let mut root_closed = false;
    // key and accumulated text of the leaf element being read
    let mut current: Option<(String, String)> = None;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| decode_error(format!("at position {}: {e}", reader.buffer_position())))?
        {
            Event::Eof => break,
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Start(e) => {
                let name = String::from_utf8(e.name().as_ref().to_vec())?;
                if root_closed {
                    return Err(decode_error(format!("unexpected element <{name}> after root")))
                }
                if !root_seen {
                    root_seen = true;
                } else if let Some((parent, _)) = &current {
                    return Err(decode_error(format!(
                        "nested element <{name}> inside <{parent}>"
                    )))
                } else {
                    current = Some((name, String::new()));
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8(e.name().as_ref().to_vec())?;
                if root_closed {
                    return Err(decode_error(format!("unexpected element <{name}/> after root")))
                }
                if !root_seen {
                    // `<xml/>`: a document without fields
                    root_seen = true;
                    root_closed = true;
                } else if let Some((parent, _)) = &current {
                    return Err(decode_error(format!(
                        "nested element <{name}/> inside <{parent}>"
                    )))
                } else {
                    insert_unique(&mut fields, name, String::new())?;
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| decode_error(e.to_string()))?;
                push_text(current.as_mut(), &text)?;
            }
            Event::CData(c) => {
                let text = String::from_utf8(c.into_inner().into_owned())?;
                push_text(current.as_mut(), &text)?;
            }
            Event::End(_) => match current.take() {
                Some((key, value)) => insert_unique(&mut fields, key, value.trim().to_owned())?,
                None => root_closed = true,
            },
        }
        buf.clear();
    }

    if !root_seen {
        return Err(decode_error("no root element".to_owned()))
    }
    if !root_closed {
        return Err(decode_error("truncated document".to_owned()))
    }
    Ok(fields)
}

fn push_text(current: Option<&mut (String, String)>, text: &str) -> ProtocolResult<()> {
    match current {
        Some((_, value)) => {
            value.push_str(text);
            Ok(())
        }
        // trimmed text directly under the root (or outside of it)
        None if text.trim().is_empty() => Ok(()),
        None => Err(decode_error(format!("unexpected text '{text}'"))),
    }
}

fn insert_unique(fields: &mut FieldMapping, key: String, value: String) -> ProtocolResult<()> {
    if fields.contains_key(&key) {
        return Err(decode_error(format!("repeated element <{key}>")))
    }
    fields.insert(key, value);
    Ok(())
}

fn decode_error(msg: String) -> ProtocolError {
    ProtocolError::XmlDecode(msg)
}

#[cfg(test)]
mod tests {
    use super::{from_xml, to_xml, to_xml_with_root};
    use crate::{FieldMapping, FieldValue, ProtocolError, fields};

    #[test]
    fn test_to_xml_layout() {
        let m = fields! { "appid" => "wx123", "total_fee" => 101 };
        let xml = String::from_utf8(to_xml(&m).unwrap()).unwrap();
        assert_eq!(
            xml,
            "<xml><appid><![CDATA[wx123]]></appid><total_fee><![CDATA[101]]></total_fee></xml>"
        );
        assert!(!xml.starts_with("<?xml"));
    }

    #[test]
    fn test_custom_root_and_invalid_names() {
        let m = fields! { "a" => "1" };
        let xml = String::from_utf8(to_xml_with_root(&m, "root").unwrap()).unwrap();
        assert_eq!(xml, "<root><a><![CDATA[1]]></a></root>");

        let bad = fields! { "1abc" => "x" };
        assert!(matches!(to_xml(&bad), Err(ProtocolError::XmlEncode(_))));
        let bad = fields! { "a b" => "x" };
        assert!(matches!(to_xml(&bad), Err(ProtocolError::XmlEncode(_))));
    }

    #[test]
    fn test_round_trip_flat_mapping() {
        let m = fields! {
            "return_code" => "SUCCESS",
            "body" => "<b>&amp; \"quotes\"</b>",
            "tricky" => "a]]>b]]>c",
            "empty" => "",
            "unicode" => "商品描述",
        };
        let decoded = from_xml(&to_xml(&m).unwrap()).unwrap();
        assert_eq!(decoded, m);
    }

    #[test]
    fn test_from_xml_gateway_body() {
        let body = b"<?xml version=\"1.0\"?>\n<xml>\n  <return_code><![CDATA[SUCCESS]]></return_code>\n  \
                     <total_fee>1</total_fee>\n  <note>  a &amp; b  </note>\n  <empty/>\n</xml>\n";
        let m = from_xml(body).unwrap();
        assert_eq!(m.get_str("return_code"), Some("SUCCESS"));
        assert_eq!(m.get_str("total_fee"), Some("1"));
        assert_eq!(m.get_str("note"), Some("a & b"));
        assert_eq!(m.get("empty"), Some(&FieldValue::from("")));
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["return_code", "total_fee", "note", "empty"]);
    }

    #[test]
    fn test_from_xml_empty_body_is_empty_mapping() {
        assert_eq!(from_xml(b"").unwrap(), FieldMapping::new());
        assert_eq!(from_xml(b"  \r\n ").unwrap(), FieldMapping::new());
        assert_eq!(from_xml(b"<xml></xml>").unwrap(), FieldMapping::new());
        assert_eq!(from_xml(b"<xml/>").unwrap(), FieldMapping::new());
    }

    #[test]
    fn test_from_xml_rejects_malformed() {
        for body in [
            &b"not xml at all"[..],
            b"<xml><a>1</a>",
            b"<xml><a>1</b></xml>",
            b"<xml><a><b>1</b></a></xml>",
            b"<xml><a>1</a><a>2</a></xml>",
            b"<xml><a>1</a></xml><xml/>",
        ] {
            assert!(
                matches!(from_xml(body), Err(ProtocolError::XmlDecode(_))),
                "{}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_nested_values_are_written_as_elements() {
        let inner = fields! { "refund_id" => "R1" };
        let m = fields! { "return_code" => "SUCCESS", "req_info" => inner };
        let xml = String::from_utf8(to_xml(&m).unwrap()).unwrap();
        assert_eq!(
            xml,
            "<xml><return_code><![CDATA[SUCCESS]]></return_code><req_info><refund_id><![CDATA[R1]]></refund_id></req_info></xml>"
        );
    }
}
