use serde::{Deserialize, Serialize};

/// A fragment of an assistant reply.
///
/// `text` is appended to whatever the reply already holds; a delta never
/// replaces content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// Stable response id shared by every fragment of one reply
    pub id: String,
    /// Text to append, possibly empty
    pub text: String,
}

impl Delta {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}
