use crate::{
    error::{Result, ServiceError},
    hooks::{PostCommitHooks, SocialEvent},
};
use pinhole_common::{
    model::{
        message::{CreateMessage, Message, chat_id},
        user::UserId,
    },
    pagination::{Page, PageRequest},
};
use pinhole_db::SharedStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct MessageService {
    store: SharedStore,
    hooks: Arc<PostCommitHooks>,
}

impl MessageService {
    #[must_use]
    pub fn new(store: SharedStore, hooks: Arc<PostCommitHooks>) -> Self {
        Self { store, hooks }
    }

    /// Sends a direct message. Either `text` or `file_url` must be non-empty.
    pub async fn send(
        &self,
        sender: UserId,
        receiver: UserId,
        text: &str,
        file_url: &str,
    ) -> Result<Message> {
        if sender == receiver {
            return Err(ServiceError::invalid_input("You cannot message yourself"));
        }
        let text = text.trim();
        let file_url = file_url.trim();
        if text.is_empty() && file_url.is_empty() {
            return Err(ServiceError::invalid_input(
                "A message needs text or a file",
            ));
        }

        if self.store.fetch_user(receiver).await?.is_none() {
            return Err(ServiceError::NotFound("User"));
        }

        let message = self
            .store
            .create_message(&CreateMessage {
                sender,
                receiver,
                text: text.to_owned(),
                file_url: file_url.to_owned(),
            })
            .await?;

        self.hooks
            .dispatch(&SocialEvent::MessageSent {
                sender,
                receiver,
                message: message.id,
            })
            .await;
        Ok(message)
    }

    /// The conversation between `actor` and `other`, newest first.
    pub async fn conversation(
        &self,
        actor: UserId,
        other: UserId,
        request: PageRequest,
    ) -> Result<Page<Message>> {
        if self.store.fetch_user(other).await?.is_none() {
            return Err(ServiceError::NotFound("User"));
        }

        let chat = chat_id(actor, other);
        let total = self.store.count_messages(&chat).await?;
        let messages = self.store.fetch_messages(&chat, request.window()).await?;
        Ok(Page::new(messages, request, total))
    }
}
