use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::input::InputSpec;

/// How a form should be submitted after filling.
///
/// Omitted entirely on a [`FormSpec`] means "fill only, do not submit".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit {
    /// Call the form-level submit.
    Form,
    /// Click the nth submit-button candidate on the page (1-based).
    Button(u32),
}

/// One fillable form inside a rule.
///
/// `method`, `action`, `class_name` and `id` are attribute patterns used by
/// the content module to pick the matching form element on the page; `action`
/// is in the native pattern dialect by the time a compiled rule holds it.
/// A spec without a `profile` can be applied by fast fill but is never listed
/// in the interactive profile menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(rename = "className", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<Submit>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputSpec>,
}

impl FormSpec {
    /// Whether this spec may be offered in the interactive profile menu.
    #[must_use]
    pub fn is_profiled(&self) -> bool {
        self.profile.as_deref().is_some_and(|p| !p.is_empty())
    }
}

// On the wire `submit` is either `true` (form-level submit) or a positive
// 1-based button index, so Submit gets hand-written serde impls.

impl Serialize for Submit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Submit::Form => serializer.serialize_bool(true),
            Submit::Button(index) => serializer.serialize_u32(*index),
        }
    }
}

impl<'de> Deserialize<'de> for Submit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SubmitVisitor;

        impl Visitor<'_> for SubmitVisitor {
            type Value = Submit;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("`true` or a positive 1-based button index")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Submit, E> {
                if v {
                    Ok(Submit::Form)
                } else {
                    Err(E::invalid_value(de::Unexpected::Bool(v), &self))
                }
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Submit, E> {
                match u32::try_from(v) {
                    Ok(index) if index >= 1 => Ok(Submit::Button(index)),
                    _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Submit, E> {
                match u64::try_from(v) {
                    Ok(unsigned) => self.visit_u64(unsigned),
                    Err(_) => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
                }
            }
        }

        deserializer.deserialize_any(SubmitVisitor)
    }
}
