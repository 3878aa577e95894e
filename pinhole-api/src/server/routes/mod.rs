use crate::server::ServerRouter;

mod comments;
mod likes;
mod messages;
mod notifications;
mod posts;
mod saves;
mod stories;
mod users;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(posts::routes())
        .merge(users::routes())
        .merge(likes::routes())
        .merge(comments::routes())
        .merge(saves::routes())
        .merge(stories::routes())
        .merge(notifications::routes())
        .merge(messages::routes())
}
