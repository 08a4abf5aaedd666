use std::fmt::Write;

use domain::{BridgeError, BridgeResult, Operation, ReaderCommand};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const BARCODE_PATH: &[&str] = &["items", "item", "barcode"];
const IS_SECURE_PATH: &[&str] = &["is_secure"];

/// Translates between the library platform's RFID XML documents and bridge types
pub struct XmlTranslator;

impl XmlTranslator {
    /// Build the reader command for an operation from its request body.
    /// Operations without a body ignore `body`.
    pub fn parse_command(operation: Operation, body: &[u8]) -> Result<ReaderCommand, BridgeError> {
        match operation {
            Operation::GetItems => Ok(ReaderCommand::ReadTag),
            Operation::GetSecurity => Ok(ReaderCommand::GetSecurity),
            Operation::ItemUpdate => Self::parse_item_update(body),
            Operation::SetSecurity => Self::parse_set_security(body),
        }
    }

    /// `<items><item><barcode>...</barcode></item></items>`, either as the document
    /// root or wrapped in another element
    pub fn parse_item_update(body: &[u8]) -> Result<ReaderCommand, BridgeError> {
        let barcode = find_element_text(body, BARCODE_PATH)?
            .ok_or_else(|| invalid("items/item/barcode not found"))?;

        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Err(invalid("barcode is empty"));
        }

        Ok(ReaderCommand::WriteBarcode(barcode.to_string()))
    }

    /// `<is_secure>true|false</is_secure>` anywhere in the document
    pub fn parse_set_security(body: &[u8]) -> Result<ReaderCommand, BridgeError> {
        let flag = find_element_text(body, IS_SECURE_PATH)?
            .ok_or_else(|| invalid("is_secure not found"))?;

        match flag.trim() {
            "true" => Ok(ReaderCommand::SetSecurity { on: true }),
            "false" => Ok(ReaderCommand::SetSecurity { on: false }),
            other => Err(invalid(&format!("is_secure must be true or false, got '{}'", other))),
        }
    }

    pub fn render(result: &BridgeResult) -> String {
        let mut xml = String::from(XML_DECLARATION);
        match result {
            BridgeResult::Failure { message } => {
                xml.push_str("<rfid><ExceptionDetail><Message>");
                xml.push_str(&escape(message.as_str()));
                xml.push_str("</Message></ExceptionDetail></rfid>");
            }
            BridgeResult::ItemsFound {
                barcode,
                security_on,
            } => render_item(&mut xml, barcode, *security_on),
            BridgeResult::SecurityStatus { security_on } => {
                let _ = write!(xml, "<rfid><is_secure>{}</is_secure></rfid>", security_on);
            }
            BridgeResult::SecuritySet
            | BridgeResult::BarcodeWritten
            | BridgeResult::ScanningStopped => {
                xml.push_str("<rfid><success>true</success></rfid>");
            }
        }
        xml
    }
}

// Alma ignores material_type, library and location but requires them to be present.
// A single-part item is always complete. The barcode doubles as tag_id.
fn render_item(xml: &mut String, barcode: &str, security_on: bool) {
    let barcode = escape(barcode);
    let _ = write!(
        xml,
        "<rfid><items><item>\
         <barcode>{barcode}</barcode>\
         <is_secure>{security_on}</is_secure>\
         <is_complete>true</is_complete>\
         <total_num_of_parts>1</total_num_of_parts>\
         <tags><tag>\
         <tag_id>{barcode}</tag_id>\
         <part_num>1</part_num>\
         <material_type></material_type>\
         <library></library>\
         <location></location>\
         </tag></tags>\
         </item></items></rfid>"
    );
}

fn invalid(reason: &str) -> BridgeError {
    BridgeError::InvalidRequestXml(reason.to_string())
}

/// Text of the first element whose ancestry ends with `path`.
/// The element must hold text only; a child element inside it is rejected.
/// The whole document is read so that malformed input is always rejected.
fn find_element_text(body: &[u8], path: &[&str]) -> Result<Option<String>, BridgeError> {
    let text = std::str::from_utf8(body).map_err(|e| invalid(&e.to_string()))?;
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<String> = Vec::new();
    let mut capture: Option<(usize, String)> = None;
    let mut found: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if capture.is_some() {
                    return Err(mixed_content(path));
                }
                stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                if found.is_none() && ends_with(&stack, path) {
                    capture = Some((stack.len(), String::new()));
                }
            }
            Ok(Event::Empty(e)) => {
                if capture.is_some() {
                    return Err(mixed_content(path));
                }
                if found.is_none() {
                    stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    if ends_with(&stack, path) {
                        found = Some(String::new());
                    }
                    stack.pop();
                }
            }
            Ok(Event::Text(t)) => {
                if let Some((_, buf)) = capture.as_mut() {
                    let unescaped = t.unescape().map_err(|e| invalid(&e.to_string()))?;
                    buf.push_str(&unescaped);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some((_, buf)) = capture.as_mut() {
                    let raw = c.into_inner();
                    buf.push_str(std::str::from_utf8(&raw).map_err(|e| invalid(&e.to_string()))?);
                }
            }
            Ok(Event::End(_)) => {
                if capture
                    .as_ref()
                    .is_some_and(|(depth, _)| *depth == stack.len())
                {
                    found = capture.take().map(|(_, buf)| buf);
                }
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(invalid(&e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(invalid("document ended inside an element"));
    }

    Ok(found)
}

fn mixed_content(path: &[&str]) -> BridgeError {
    invalid(&format!("{} must contain text only", path.join("/")))
}

fn ends_with(stack: &[String], path: &[&str]) -> bool {
    stack.len() >= path.len()
        && stack[stack.len() - path.len()..]
            .iter()
            .zip(path)
            .all(|(name, expected)| name == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ends_with_matches_suffix_only() {
        let stack: Vec<String> = ["rfid", "items", "item", "barcode"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(ends_with(&stack, BARCODE_PATH));
        assert!(!ends_with(&stack[..3], BARCODE_PATH));
        assert!(!ends_with(&stack[2..], BARCODE_PATH));
    }

    #[test]
    fn test_comment_inside_text_is_skipped() {
        let text = find_element_text(b"<is_secure>tr<!-- c -->ue</is_secure>", IS_SECURE_PATH)
            .unwrap()
            .unwrap();
        assert_eq!(text, "true");
    }

    #[test]
    fn test_child_element_inside_target_is_rejected() {
        let err = find_element_text(b"<barcode>12<x>9</x>34</barcode>", &["barcode"]).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidRequestXml(_)));

        let err = find_element_text(b"<is_secure>true<flag/></is_secure>", IS_SECURE_PATH).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidRequestXml(_)));
    }
}
