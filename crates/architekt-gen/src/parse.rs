use serde_json::Value;

use architekt_core::{Diagram, GatewayError, ValidationReport};

/// Extract the outermost JSON object from raw model output (fences and prose around it
/// are dropped).
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

fn object(raw: &str) -> Result<Value, GatewayError> {
    let json = extract_json_object(raw)
        .ok_or_else(|| GatewayError::Malformed("no JSON object in reply".to_string()))?;
    serde_json::from_str(json).map_err(|e| GatewayError::Malformed(e.to_string()))
}

/// Parse a generation reply into a diagram. Accepts the bare `{nodes, edges}` object or
/// the `{"design": "<json>"}` envelope, whose payload may itself be a string or an object.
pub fn design(raw: &str) -> Result<Diagram, GatewayError> {
    let mut value = object(raw)?;

    let envelope = value.get_mut("design").map(Value::take);
    if let Some(inner) = envelope {
        value = match inner {
            Value::String(s) => object(&s)?,
            other => other,
        };
    }

    if value.get("nodes").is_none() {
        return Err(GatewayError::Malformed("reply has no \"nodes\" array".to_string()));
    }
    serde_json::from_value(value).map_err(|e| GatewayError::Malformed(e.to_string()))
}

/// Parse a validation reply `{isValid, validationFeedback}`.
pub fn report(raw: &str) -> Result<ValidationReport, GatewayError> {
    let value = object(raw)?;
    serde_json::from_value(value).map_err(|e| GatewayError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{"nodes":[{"id":"dnd-node_1","type":"default","position":{"x":0,"y":0},"data":{"label":"CDN","type":"cdn","config":{}}}],"edges":[]}"#;

    #[test]
    fn bare_object() {
        let d = design(BARE).unwrap();
        assert_eq!(d.nodes.len(), 1);
        assert!(d.edges.is_empty());
    }

    #[test]
    fn fenced_with_prose() {
        let raw = format!("Here is your design:\n```json\n{BARE}\n```\nEnjoy!");
        assert_eq!(design(&raw).unwrap(), design(BARE).unwrap());
    }

    #[test]
    fn string_envelope() {
        let raw = serde_json::json!({ "design": BARE }).to_string();
        assert_eq!(design(&raw).unwrap().nodes[0].id, "dnd-node_1");
    }

    #[test]
    fn object_envelope() {
        let inner: Value = serde_json::from_str(BARE).unwrap();
        let raw = serde_json::json!({ "design": inner }).to_string();
        assert_eq!(design(&raw).unwrap().nodes[0].data.component_type, "cdn");
    }

    #[test]
    fn garbage_is_malformed() {
        for raw in ["", "no json here", "{not json", "}{", r#"{"design": "nope"}"#, r#"{"edges": []}"#] {
            assert!(
                matches!(design(raw), Err(GatewayError::Malformed(_))),
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn nodes_missing_required_fields_are_malformed() {
        let raw = r#"{"nodes":[{"id":"a"}],"edges":[]}"#;
        assert!(matches!(design(raw), Err(GatewayError::Malformed(_))));
    }

    #[test]
    fn report_reply() {
        let r = report("```json\n{\"isValid\": false, \"validationFeedback\": \"Edge e1 dangles.\"}\n```").unwrap();
        assert!(!r.is_valid);
        assert_eq!(r.validation_feedback, "Edge e1 dangles.");
        assert!(report("{\"valid\": true}").is_err());
    }
}
