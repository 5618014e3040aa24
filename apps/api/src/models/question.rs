use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const MULTIPLE_CHOICE: &str = "multiple_choice";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QuestionKind {
    #[default]
    MultipleChoice,
    /// Any other kind the model chose to emit, kept verbatim.
    Other(String),
}

impl QuestionKind {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionKind::MultipleChoice => MULTIPLE_CHOICE,
            QuestionKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for QuestionKind {
    fn from(kind: &str) -> Self {
        if kind == MULTIPLE_CHOICE {
            QuestionKind::MultipleChoice
        } else {
            QuestionKind::Other(kind.to_string())
        }
    }
}

impl Serialize for QuestionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QuestionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let kind = String::deserialize(deserializer)?;
        Ok(QuestionKind::from(kind.as_str()))
    }
}

/// Canonical quiz question returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// 0-based index into `options`.
    pub correct_answer: usize,
}

/// A question exactly as the model sent it. Every field may be missing or
/// carry the wrong JSON type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestion {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub question: Option<Value>,
    #[serde(default, rename = "type")]
    pub kind: Option<Value>,
    #[serde(default)]
    pub options: Option<Value>,
    #[serde(default)]
    pub correct_answer: Option<Value>,
}
