use crate::model::{Id, user::UserId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct MessageMarker;

pub type MessageId = Id<MessageMarker>;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender: UserId,
    pub receiver: UserId,
    pub text: String,
    pub file_url: String,
    pub chat_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateMessage {
    pub sender: UserId,
    pub receiver: UserId,
    pub text: String,
    pub file_url: String,
}

/// Both participants of a conversation map to the same chat id.
#[must_use]
pub fn chat_id(a: UserId, b: UserId) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{low}_{high}")
}

impl CreateMessage {
    #[must_use]
    pub fn chat_id(&self) -> String {
        chat_id(self.sender, self.receiver)
    }
}
