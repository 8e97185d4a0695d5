//! Wire protocol message types.
//!
//! Every exchange between bridged endpoints is a single flat JSON record,
//! the [`Envelope`]. Field names, the three `postbridge` kind strings and
//! the `type` tag are the compatibility surface: two endpoints must agree
//! on them exactly to interoperate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag identifying messages that belong to this protocol. The shared channel
/// may carry unrelated traffic; anything without this tag is ignored.
pub const PROTOCOL_TAG: &str = "application/x-postbridge-v1+json";

/// Discriminant of the three message variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Fire-and-forget invocation, no return value.
    Call,
    /// Invocation expecting a correlated [`MessageKind::Response`].
    Request,
    /// Reply to a request, correlated by `destId` + `uid`.
    Response,
}

/// A wire protocol message (envelope), sent verbatim over the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message variant.
    #[serde(rename = "postbridge")]
    pub kind: MessageKind,
    /// Always [`PROTOCOL_TAG`]; distinguishes protocol traffic from
    /// everything else on the shared channel.
    #[serde(rename = "type")]
    pub protocol: String,
    /// Identity of the sending execution context, stable for its lifetime.
    #[serde(rename = "sourceId")]
    pub source_id: String,
    /// Present only on responses; the `sourceId` the original request
    /// carried, i.e. the original requester.
    #[serde(rename = "destId", default, skip_serializing_if = "Option::is_none")]
    pub dest_id: Option<String>,
    /// Correlation id, unique per sending bridge while a request is
    /// outstanding. Present on requests and responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u64>,
    /// Application-chosen method name.
    pub method: String,
    /// Application payload, present on calls and requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Handler result, present on responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Envelope {
    /// Build a fire-and-forget `call` envelope.
    pub fn call(source_id: &str, method: &str, params: Value) -> Self {
        Self {
            kind: MessageKind::Call,
            protocol: PROTOCOL_TAG.to_string(),
            source_id: source_id.to_string(),
            dest_id: None,
            uid: None,
            method: method.to_string(),
            params: Some(params),
            value: None,
        }
    }

    /// Build a `request` envelope carrying a correlation uid.
    pub fn request(source_id: &str, uid: u64, method: &str, params: Value) -> Self {
        Self {
            kind: MessageKind::Request,
            protocol: PROTOCOL_TAG.to_string(),
            source_id: source_id.to_string(),
            dest_id: None,
            uid: Some(uid),
            method: method.to_string(),
            params: Some(params),
            value: None,
        }
    }

    /// Build a `response` envelope addressed back to the requester.
    pub fn response(source_id: &str, dest_id: &str, uid: u64, method: &str, value: Value) -> Self {
        Self {
            kind: MessageKind::Response,
            protocol: PROTOCOL_TAG.to_string(),
            source_id: source_id.to_string(),
            dest_id: Some(dest_id.to_string()),
            uid: Some(uid),
            method: method.to_string(),
            params: None,
            value: Some(value),
        }
    }

    /// Parse a raw channel payload into an envelope.
    ///
    /// Returns `None` unless the payload carries the protocol tag and has
    /// the envelope shape. Foreign traffic is expected on the shared
    /// channel, so a `None` here is not an error.
    pub fn from_value(payload: &Value) -> Option<Self> {
        if payload.get("type")?.as_str()? != PROTOCOL_TAG {
            return None;
        }
        serde_json::from_value(payload.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_wire_field_names() {
        let msg = Envelope::call("ctx-a", "notify", json!({ "x": 1 }));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["postbridge"], "call");
        assert_eq!(json["type"], PROTOCOL_TAG);
        assert_eq!(json["sourceId"], "ctx-a");
        assert_eq!(json["method"], "notify");
        assert_eq!(json["params"]["x"], 1);
        // Absent fields are omitted, not null
        assert!(json.get("destId").is_none());
        assert!(json.get("uid").is_none());
        assert!(json.get("value").is_none());
    }

    #[test]
    fn test_request_carries_uid() {
        let msg = Envelope::request("ctx-a", 7, "double", json!(21));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["postbridge"], "request");
        assert_eq!(json["uid"], 7);
        assert!(json.get("destId").is_none());
    }

    #[test]
    fn test_response_addresses_requester() {
        let msg = Envelope::response("ctx-b", "ctx-a", 7, "double", json!(42));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["postbridge"], "response");
        assert_eq!(json["sourceId"], "ctx-b");
        assert_eq!(json["destId"], "ctx-a");
        assert_eq!(json["uid"], 7);
        assert_eq!(json["value"], 42);
        assert!(json.get("params").is_none());
    }

    #[test]
    fn test_from_value_roundtrip() {
        let msg = Envelope::request("ctx-a", 1, "double", json!(21));
        let payload = serde_json::to_value(&msg).unwrap();
        let parsed = Envelope::from_value(&payload).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_from_value_rejects_foreign_traffic() {
        assert!(Envelope::from_value(&json!({ "hello": "world" })).is_none());
        assert!(Envelope::from_value(&json!("just a string")).is_none());
        assert!(Envelope::from_value(&json!(null)).is_none());
        // Right shape, wrong tag
        let mut msg = serde_json::to_value(Envelope::call("a", "m", json!(null))).unwrap();
        msg["type"] = json!("application/x-other-protocol+json");
        assert!(Envelope::from_value(&msg).is_none());
    }

    #[test]
    fn test_from_value_rejects_tagged_but_malformed() {
        // Carries the tag but is missing required fields
        let payload = json!({ "type": PROTOCOL_TAG, "postbridge": "call" });
        assert!(Envelope::from_value(&payload).is_none());
    }
}
