use crate::server::ServerError;
use axum::extract::{FromRequestParts, Query as AxumQuery};
use pinhole_common::pagination::PageRequest;
use serde::Deserialize;

#[derive(FromRequestParts, Debug, Clone, Copy, Default)]
#[from_request(via(AxumQuery), rejection(ServerError))]
pub struct Query<T>(pub T);

/// Raw `page` and `limit` values. Anything unparsable falls back to the
/// defaults instead of rejecting the request.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PageParams {
    page: Option<String>,
    limit: Option<String>,
}

impl PageParams {
    #[must_use]
    pub fn request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use crate::server::query::PageParams;
    use pinhole_common::pagination::PageRequest;

    #[test]
    fn garbage_falls_back_to_defaults() {
        let params = PageParams {
            page: Some("two".to_owned()),
            limit: Some("-5".to_owned()),
        };
        assert_eq!(params.request(), PageRequest::default());

        let params = PageParams {
            page: Some("3".to_owned()),
            limit: Some("500".to_owned()),
        };
        assert_eq!(params.request(), PageRequest::new(3, 100));
    }
}
