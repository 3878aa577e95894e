use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use pinhole_api::server::{self, ServerState};
use pinhole_common::{
    model::{
        auth::{AuthToken, Authentication},
        post::{CreatePost, Media, MediaKind, Post},
        user::{CreateUser, User, UserHandle},
    },
    util::PositiveDuration,
};
use pinhole_core::{
    Services,
    media::{MediaError, MediaStore, Upload},
};
use pinhole_db::{
    SharedStore,
    memory::MemoryStore,
    store::{PostStore, UserStore},
};
use serde_json::{Value, json};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;

struct NullMedia;

#[async_trait]
impl MediaStore for NullMedia {
    async fn store(&self, upload: &Upload) -> Result<String, MediaError> {
        Ok(format!("/uploads/test.{}", upload.extension()))
    }

    async fn delete(&self, _url: &str) -> Result<(), MediaError> {
        Ok(())
    }
}

struct TestApp {
    store: Arc<MemoryStore>,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let shared: SharedStore = store.clone();
        let services = Services::new(shared.clone(), Arc::new(NullMedia));
        let router = server::routes().with_state(ServerState::new(shared, services));

        Self { store, router }
    }

    async fn user(&self, handle: &str) -> (User, String) {
        let user = self
            .store
            .create_user(&CreateUser {
                handle: UserHandle::new(handle.to_owned()).unwrap(),
                name: handle.to_owned(),
                is_private: false,
            })
            .await
            .unwrap();
        let token = self.token_for(&user, None);
        (user, token)
    }

    fn token_for(&self, user: &User, expires_after: Option<PositiveDuration>) -> String {
        let token = AuthToken::generate_random(user.id);
        self.store.insert_auth(Authentication {
            user: user.id,
            token_hash: token.hash().unwrap(),
            created_at: OffsetDateTime::now_utc() - Duration::hours(2),
            expires_after,
        });
        token.as_token_str()
    }

    async fn post(&self, user: &User) -> Post {
        let media = vec![Media {
            url: "/uploads/a.png".to_owned(),
            kind: MediaKind::Image,
        }];
        self.store
            .create_post(user.id, &CreatePost::new(media, "", Vec::new()).unwrap())
            .await
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn call(&self, method: Method, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn call_json(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: &Value,
    ) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Request::get("/posts").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn expired_tokens_are_unauthorized() {
    let app = TestApp::new();
    let (user, _) = app.user("ada").await;
    let expired = app.token_for(&user, PositiveDuration::new(Duration::hours(1)));

    let (status, _) = app.call(Method::GET, "/posts", &expired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let app = TestApp::new();
    let (_, token) = app.user("ada").await;
    app.store.reset_calls();

    let (status, body) = app.call(Method::GET, "/posts/not-a-number", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(app.store.total_calls(), 0);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = TestApp::new();
    let (_, token) = app.user("ada").await;

    let (status, body) = app.call(Method::GET, "/nowhere", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn feed_pages_are_reported() {
    let app = TestApp::new();
    let (ada, token) = app.user("ada").await;
    for _ in 0..25 {
        app.post(&ada).await;
    }

    let (status, body) = app.call(Method::GET, "/posts?page=2&limit=50", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 10);
    assert_eq!(body["currentPage"], 2);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["hasMore"], true);

    let (_, body) = app.call(Method::GET, "/posts?page=3", &token).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["hasMore"], false);
    assert_eq!(body["items"][0]["interactions"]["likeCount"], 0);
}

#[tokio::test]
async fn follow_toggles() {
    let app = TestApp::new();
    let (_, token) = app.user("ada").await;
    let (bob, _) = app.user("bob").await;
    let uri = format!("/users/{}/follow", bob.id);

    let (status, body) = app.call(Method::PUT, &uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["followed"], true);

    let (_, profile) = app
        .call(Method::GET, &format!("/users/{}", bob.id), &token)
        .await;
    assert_eq!(profile["followerCount"], 1);
    assert_eq!(profile["isFollowing"], true);

    let (_, body) = app.call(Method::PUT, &uri, &token).await;
    assert_eq!(body["followed"], false);
}

#[tokio::test]
async fn self_follow_is_a_bad_request() {
    let app = TestApp::new();
    let (ada, token) = app.user("ada").await;

    let (status, _) = app
        .call(Method::PUT, &format!("/users/{}/follow", ada.id), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn liking_twice_is_rejected() {
    let app = TestApp::new();
    let (ada, _) = app.user("ada").await;
    let (_, token) = app.user("bob").await;
    let post = app.post(&ada).await;
    let uri = format!("/likes/{}", post.id);

    let (status, body) = app.call(Method::POST, &uri, &token).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["likes"], 1);

    let (status, body) = app.call(Method::POST, &uri, &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Post already liked");

    let (_, body) = app
        .call(Method::GET, &format!("/likes/{}/count", post.id), &token)
        .await;
    assert_eq!(body["likes"], 1);

    let (status, _) = app.call(Method::DELETE, &uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn comments_are_guarded_by_author() {
    let app = TestApp::new();
    let (ada, ada_token) = app.user("ada").await;
    let (_, bob_token) = app.user("bob").await;
    let post = app.post(&ada).await;

    let (status, comment) = app
        .call_json(
            Method::POST,
            &format!("/comments/{}", post.id),
            &bob_token,
            &json!({ "text": "hello" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let comment_uri = format!("/comments/{}", comment["id"]);
    let (status, _) = app
        .call_json(Method::PUT, &comment_uri, &ada_token, &json!({ "text": "mine" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, page) = app
        .call(Method::GET, &format!("/comments/{}", post.id), &ada_token)
        .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["author"]["handle"], "bob");

    let (status, _) = app.call(Method::DELETE, &comment_uri, &bob_token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn multipart_posts_notify_followers() {
    let app = TestApp::new();
    let (ada, ada_token) = app.user("ada").await;
    let (_, bob_token) = app.user("bob").await;
    app.call(Method::PUT, &format!("/users/{}/follow", ada.id), &bob_token)
        .await;

    let boundary = "pinhole-boundary";
    let body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"caption\"\r\n\r\n\
        first light\r\n\
        --{boundary}\r\n\
        Content-Disposition: form-data; name=\"tags\"\r\n\r\n\
        Sky, sky ,sun\r\n\
        --{boundary}\r\n\
        Content-Disposition: form-data; name=\"media\"; filename=\"sky.png\"\r\n\
        Content-Type: image/png\r\n\r\n\
        not really a png\r\n\
        --{boundary}--\r\n"
    );
    let (status, post) = app
        .send(
            Request::post("/posts")
                .header(header::AUTHORIZATION, format!("Bearer {ada_token}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["caption"], "first light");
    assert_eq!(post["tags"], json!(["sky", "sun"]));
    assert_eq!(post["media"][0]["url"], "/uploads/test.png");

    let (_, notifications) = app.call(Method::GET, "/notifications", &bob_token).await;
    assert_eq!(notifications["total"], 1);
    assert_eq!(notifications["items"][0]["type"], "post");
    assert_eq!(notifications["items"][0]["from"]["handle"], "ada");

    let (_, marked) = app
        .call(Method::PUT, "/notifications/read-all", &bob_token)
        .await;
    assert_eq!(marked["updated"], 1);
}

#[tokio::test]
async fn posts_without_media_are_rejected() {
    let app = TestApp::new();
    let (_, token) = app.user("ada").await;

    let boundary = "pinhole-boundary";
    let body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"caption\"\r\n\r\n\
        nothing to see\r\n\
        --{boundary}--\r\n"
    );
    let (status, _) = app
        .send(
            Request::post("/posts")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn messages_form_one_conversation() {
    let app = TestApp::new();
    let (ada, ada_token) = app.user("ada").await;
    let (bob, bob_token) = app.user("bob").await;

    let (status, _) = app
        .call_json(
            Method::POST,
            &format!("/messages/{}", bob.id),
            &ada_token,
            &json!({ "text": "hi bob" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call_json(
            Method::POST,
            &format!("/messages/{}", ada.id),
            &ada_token,
            &json!({ "text": "hi me" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, conversation) = app
        .call(Method::GET, &format!("/messages/{}", ada.id), &bob_token)
        .await;
    assert_eq!(conversation["total"], 1);
    assert_eq!(conversation["items"][0]["text"], "hi bob");
}

#[tokio::test]
async fn uploads_must_be_multipart() {
    let app = TestApp::new();
    let (_, token) = app.user("ada").await;
    app.store.reset_calls();

    let (status, body) = app
        .call_json(Method::POST, "/posts", &token, &json!({ "caption": "hi" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(app.store.calls("create_post"), 0);
}

#[tokio::test]
async fn own_profile_is_read_updated_and_deleted() {
    let app = TestApp::new();
    let (ada, token) = app.user("ada").await;
    let (bob, bob_token) = app.user("bob").await;

    let (status, me) = app.call(Method::GET, "/users/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], json!(ada.id));
    assert_eq!(me["handle"], "ada");

    let boundary = "pinhole-boundary";
    let body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"bio\"\r\n\r\n\
        hello there\r\n\
        --{boundary}\r\n\
        Content-Disposition: form-data; name=\"isPrivate\"\r\n\r\n\
        true\r\n\
        --{boundary}\r\n\
        Content-Disposition: form-data; name=\"profilePic\"; filename=\"me.jpg\"\r\n\
        Content-Type: image/jpeg\r\n\r\n\
        not really a jpeg\r\n\
        --{boundary}--\r\n"
    );
    let (status, updated) = app
        .send(
            Request::put("/users/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["bio"], "hello there");
    assert_eq!(updated["isPrivate"], true);
    assert_eq!(updated["name"], "ada");
    assert_eq!(updated["profilePic"], "/uploads/test.jpg");

    app.call(Method::PUT, &format!("/users/{}/follow", ada.id), &bob_token)
        .await;
    let (status, _) = app.call(Method::DELETE, "/users/me", &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .call(Method::GET, &format!("/users/{}", ada.id), &bob_token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, following) = app
        .call(Method::GET, &format!("/users/{}/following", bob.id), &bob_token)
        .await;
    assert_eq!(following, json!([]));
}

#[tokio::test]
async fn private_flag_must_be_a_boolean() {
    let app = TestApp::new();
    let (_, token) = app.user("ada").await;

    let boundary = "pinhole-boundary";
    let body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"isPrivate\"\r\n\r\n\
        maybe\r\n\
        --{boundary}--\r\n"
    );
    let (status, _) = app
        .send(
            Request::put("/users/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn follower_listings_look_the_user_up_once() {
    let app = TestApp::new();
    let (ada, token) = app.user("ada").await;
    let (_, bob_token) = app.user("bob").await;
    app.call(Method::PUT, &format!("/users/{}/follow", ada.id), &bob_token)
        .await;
    app.store.reset_calls();

    let (status, followers) = app
        .call(Method::GET, &format!("/users/{}/followers", ada.id), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(followers[0]["handle"], "bob");
    assert_eq!(app.store.calls("fetch_user"), 1);

    let (status, body) = app
        .call(Method::GET, "/users/999/followers", &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}
