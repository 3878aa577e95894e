use crate::{
    comments::CommentService,
    engagement::EngagementService,
    feed::FeedComposer,
    graph::SocialGraph,
    hooks::{NotificationFanout, PostCommitHooks},
    media::SharedMediaStore,
    messages::MessageService,
    notifications::NotificationService,
    posts::PostService,
    stories::StoryService,
    users::UserService,
};
use pinhole_db::SharedStore;
use std::sync::Arc;

/// Every service, wired to one store, one media store and one hook list.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub graph: SocialGraph,
    pub feed: FeedComposer,
    pub posts: PostService,
    pub engagement: EngagementService,
    pub comments: CommentService,
    pub stories: StoryService,
    pub notifications: NotificationService,
    pub messages: MessageService,
}

impl Services {
    /// Wires the services with notification fan-out as the only hook.
    #[must_use]
    pub fn new(store: SharedStore, media: SharedMediaStore) -> Self {
        let hooks = PostCommitHooks::new().with(NotificationFanout::new(store.clone()));
        Self::with_hooks(store, media, hooks)
    }

    #[must_use]
    pub fn with_hooks(store: SharedStore, media: SharedMediaStore, hooks: PostCommitHooks) -> Self {
        let hooks = Arc::new(hooks);
        let graph = SocialGraph::new(store.clone(), hooks.clone());

        Self {
            users: UserService::new(store.clone(), media.clone()),
            feed: FeedComposer::new(store.clone(), graph.clone()),
            graph,
            posts: PostService::new(store.clone(), media.clone(), hooks.clone()),
            engagement: EngagementService::new(store.clone(), hooks.clone()),
            comments: CommentService::new(store.clone(), hooks.clone()),
            stories: StoryService::new(store.clone(), media, hooks.clone()),
            notifications: NotificationService::new(store.clone()),
            messages: MessageService::new(store, hooks),
        }
    }
}
