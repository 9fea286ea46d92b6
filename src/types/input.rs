use serde::{Deserialize, Serialize};

/// One input field inside a [`FormSpec`](super::FormSpec).
///
/// `name`, `kind`, `class_name` and `id` are attribute patterns the content
/// module uses to locate the element; `value` and `checked` are what gets
/// written into it. `focus` and `select` are presentation hints: enter
/// text-entry mode on the field after filling, or select its text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(rename = "className", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_field_names() {
        let input = InputSpec {
            name: Some("user".into()),
            kind: Some("text".into()),
            class_name: Some("login".into()),
            value: Some("alice".into()),
            ..InputSpec::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["name"], "user");
        assert_eq!(json["type"], "text");
        assert_eq!(json["className"], "login");
        assert_eq!(json["value"], "alice");
    }

    #[test]
    fn absent_fields_not_serialized() {
        let json = serde_json::to_string(&InputSpec::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn missing_fields_deserialize_to_none() {
        let input: InputSpec = serde_json::from_str(r#"{"name":"user"}"#).unwrap();
        assert_eq!(input.name.as_deref(), Some("user"));
        assert_eq!(input.kind, None);
        assert_eq!(input.checked, None);
    }
}
