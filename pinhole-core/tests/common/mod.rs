#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use pinhole_common::model::{
    post::{CreatePost, Media, MediaKind, Post},
    user::{CreateUser, User, UserHandle, UserId},
};
use pinhole_core::{
    Services,
    media::{MediaError, MediaStore, SharedMediaStore, Upload},
};
use pinhole_db::{
    SharedStore,
    memory::MemoryStore,
    store::{GraphStore, PostStore, UserStore},
};
use std::sync::Arc;

/// Hands out predictable URLs and remembers what was deleted.
#[derive(Default)]
pub struct FakeMedia {
    stored: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeMedia {
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl MediaStore for FakeMedia {
    async fn store(&self, upload: &Upload) -> Result<String, MediaError> {
        let mut stored = self.stored.lock();
        let url = format!("/media/{}.{}", stored.len(), upload.extension());
        stored.push(url.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        self.deleted.lock().push(url.to_owned());
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub media: Arc<FakeMedia>,
    pub services: Services,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let media = Arc::new(FakeMedia::default());
    let shared_store: SharedStore = store.clone();
    let shared_media: SharedMediaStore = media.clone();

    Harness {
        services: Services::new(shared_store, shared_media),
        store,
        media,
    }
}

impl Harness {
    pub fn shared_store(&self) -> SharedStore {
        self.store.clone()
    }

    pub async fn user(&self, handle: &str) -> User {
        self.store
            .create_user(&CreateUser {
                handle: UserHandle::new(handle.to_owned()).unwrap(),
                name: handle.to_owned(),
                is_private: false,
            })
            .await
            .unwrap()
    }

    pub async fn private_user(&self, handle: &str) -> User {
        self.store
            .create_user(&CreateUser {
                handle: UserHandle::new(handle.to_owned()).unwrap(),
                name: handle.to_owned(),
                is_private: true,
            })
            .await
            .unwrap()
    }

    pub async fn follow(&self, follower: UserId, followee: UserId) {
        assert!(self.store.follow(follower, followee).await.unwrap());
    }

    pub async fn post(&self, creator: UserId, kind: MediaKind) -> Post {
        let media = vec![Media {
            url: format!("/media/{kind}"),
            kind,
        }];
        self.store
            .create_post(creator, &CreatePost::new(media, "caption", Vec::new()).unwrap())
            .await
            .unwrap()
    }

    pub async fn image_post(&self, creator: UserId) -> Post {
        self.post(creator, MediaKind::Image).await
    }
}

pub fn upload(content_type: &str) -> Upload {
    Upload {
        file_name: None,
        content_type: content_type.to_owned(),
        bytes: vec![1, 2, 3],
    }
}
