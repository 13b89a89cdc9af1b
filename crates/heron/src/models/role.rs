use serde::{Deserialize, Serialize};

/// Which side of the conversation a message belongs to.
///
/// Tool results ride inside user-role messages; the system prompt is not a
/// message at all but a field on the agent, handed to the provider on every
/// call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}
