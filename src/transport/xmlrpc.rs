//! XML-RPC `methodCall` encoder and `methodResponse` decoder.


use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use crate::marshalling::{Mapping, Value, WireDateTime};

#[derive(Debug, thiserror::Error)]
pub enum XmlRpcError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid UTF-8 in XML text: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("unexpected element <{found}>, expected {expected}")]
    UnexpectedElement {
        expected: &'static str,
        found: String,
    },

    #[error("missing element <{0}>")]
    MissingElement(&'static str),

    #[error("invalid {kind} value: {input:?}")]
    InvalidScalar { kind: &'static str, input: String },

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Fault { code: i64, message: String },
}

/// Serialize a call; every param becomes one `<param>`.
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        write_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>\n");
    out
}

fn write_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Nil => out.push_str("<nil/>"),
        Value::Bool(b) => {
            out.push_str(&format!("<boolean>{}</boolean>", u8::from(*b)));
        }
        Value::Int(i) => {
            if i32::try_from(*i).is_ok() {
                out.push_str(&format!("<int>{i}</int>"));
            } else {
                out.push_str(&format!("<i8>{i}</i8>"));
            }
        }
        Value::Double(d) => {
            out.push_str(&format!("<double>{d}</double>"));
        }
        Value::String(s) => {
            out.push_str(&format!("<string>{}</string>", escape(s.as_str())));
        }
        Value::DateTime(dt) => {
            out.push_str(&format!(
                "<dateTime.iso8601>{}</dateTime.iso8601>",
                escape(dt.as_str())
            ));
        }
        Value::Base64(bytes) => {
            out.push_str(&format!("<base64>{}</base64>", STANDARD.encode(bytes)));
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str(&format!("<member><name>{}</name>", escape(name.as_str())));
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn child(&self, name: &'static str) -> Result<&Node, XmlRpcError> {
        self.children
            .iter()
            .find(|c| c.name == name)
            .ok_or(XmlRpcError::MissingElement(name))
    }

    fn require(&self, name: &'static str) -> Result<&Node, XmlRpcError> {
        if self.name == name {
            Ok(self)
        } else {
            Err(XmlRpcError::UnexpectedElement {
                expected: name,
                found: self.name.clone(),
            })
        }
    }
}

fn parse_tree(xml: &str) -> Result<Node, XmlRpcError> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Node::default()];

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = std::str::from_utf8(start.name().as_ref())?.to_owned();
                stack.push(Node {
                    name,
                    ..Node::default()
                });
            }
            Event::Empty(start) => {
                let name = std::str::from_utf8(start.name().as_ref())?.to_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node {
                        name,
                        ..Node::default()
                    });
                }
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => return Err(XmlRpcError::MissingElement("methodResponse")),
                    }
                }
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data)?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    stack
        .into_iter()
        .next()
        .and_then(|mut document| document.children.pop())
        .ok_or(XmlRpcError::MissingElement("methodResponse"))
}

/// Parse a `methodResponse` body.
pub fn decode_response(xml: &str) -> Result<MethodResponse, XmlRpcError> {
    let root = parse_tree(xml)?;
    let root = root.require("methodResponse")?;

    if let Ok(fault) = root.child("fault") {
        let value = decode_value(fault.child("value")?)?;
        let code = value.get("faultCode").and_then(Value::as_i64).unwrap_or(0);
        let message = value
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        return Ok(MethodResponse::Fault { code, message });
    }

    let param = root.child("params")?.child("param")?;
    Ok(MethodResponse::Success(decode_value(param.child("value")?)?))
}

fn decode_value(node: &Node) -> Result<Value, XmlRpcError> {
    let node = node.require("value")?;
    let Some(typed) = node.children.first() else {
        // untyped <value> text is a string
        return Ok(Value::String(node.text.clone()));
    };

    let text = typed.text.trim();
    Ok(match typed.name.as_str() {
        "nil" => Value::Nil,
        "int" | "i4" | "i8" => Value::Int(text.parse().map_err(|_| invalid("int", text))?),
        "boolean" => Value::Bool(match text {
            "1" | "true" => true,
            "0" | "false" => false,
            _ => return Err(invalid("boolean", text)),
        }),
        "double" => Value::Double(text.parse().map_err(|_| invalid("double", text))?),
        "string" => Value::String(typed.text.clone()),
        "dateTime.iso8601" => Value::DateTime(WireDateTime::new(text)),
        "base64" => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            Value::Base64(STANDARD.decode(compact)?)
        }
        "array" => Value::Array(
            typed
                .child("data")?
                .children
                .iter()
                .map(decode_value)
                .collect::<Result<_, _>>()?,
        ),
        "struct" => {
            let mut members = Mapping::new();
            for member in &typed.children {
                let member = member.require("member")?;
                let name = member.child("name")?.text.clone();
                members.insert(name, decode_value(member.child("value")?)?);
            }
            Value::Struct(members)
        }
        other => {
            return Err(XmlRpcError::UnexpectedElement {
                expected: "value type",
                found: other.to_owned(),
            });
        }
    })
}

fn invalid(kind: &'static str, input: &str) -> XmlRpcError {
    XmlRpcError::InvalidScalar {
        kind,
        input: input.to_owned(),
    }
}
