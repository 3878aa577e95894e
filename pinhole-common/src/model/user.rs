use crate::model::Id;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;
use time::OffsetDateTime;

pub const USER_HANDLE_MAX_LEN: usize = 30;
pub const USER_BIO_MAX_LEN: usize = 150;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

pub type UserId = Id<UserMarker>;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub handle: UserHandle,
    pub name: String,
    pub bio: String,
    pub profile_pic: String,
    pub is_private: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The slice of a user embedded next to posts, comments and notifications.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub handle: UserHandle,
    pub name: String,
    pub profile_pic: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub handle: UserHandle,
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub is_private: Option<bool>,
    /// URL of an already stored picture.
    pub profile_pic: Option<String>,
}

impl User {
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            handle: self.handle.clone(),
            name: self.name.clone(),
            profile_pic: self.profile_pic.clone(),
        }
    }
}

/// A lowercase username, unique across users.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct UserHandle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The user handle is invalid: {0}")]
pub struct InvalidUserHandleError(String);

impl UserHandle {
    pub fn new(handle: String) -> Result<Self, InvalidUserHandleError> {
        let normalized = handle.trim().to_lowercase();
        let valid_chars = normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

        if !normalized.is_empty()
            && normalized.chars().count() <= USER_HANDLE_MAX_LEN
            && valid_chars
        {
            Ok(UserHandle(normalized))
        } else {
            Err(InvalidUserHandleError(handle))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for UserHandle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        UserHandle::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"UserHandle"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::user::UserHandle;

    #[test]
    fn handles_are_normalized() {
        assert_eq!(UserHandle::new(" Ada_L ".into()).unwrap().get(), "ada_l");
    }

    #[test]
    fn invalid_handles_are_rejected() {
        assert!(UserHandle::new(String::new()).is_err());
        assert!(UserHandle::new("has space".into()).is_err());
        assert!(UserHandle::new("x".repeat(31)).is_err());
    }

    #[test]
    fn deserialization_validates() {
        assert!(serde_json::from_str::<UserHandle>("\"ok.name\"").is_ok());
        assert!(serde_json::from_str::<UserHandle>("\"not ok\"").is_err());
    }
}
