/// Transport module
///
/// HTTP access to the media server:
/// - Listing, stats, deletion and rescan requests
/// - Media and thumbnail URL construction
/// - Wire format conversion (wire.rs)

pub mod wire;

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};

use crate::error::{GalleryError, Result};
use crate::playback::MediaSource;
use crate::state::data::{MediaRecord, RecordId};
use wire::{VideoList, WireRecord};

/// Thin client over the server's JSON API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|err| GalleryError::Transport {
            status: None,
            message: format!("Invalid server URL {}: {}", base_url, err),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GalleryError::Transport {
                status: None,
                message: format!("Server URL {} cannot hold API paths", base_url),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append path segments to the base URL, keeping any base path prefix
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // validated in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn record_url(&self, segments: &[&str], id: &RecordId) -> Url {
        let mut url = self.endpoint(segments);
        url.query_pairs_mut().append_pair("video_id", id.as_str());
        url
    }

    /// Fetch every record, including stream metadata
    pub async fn fetch_records(&self) -> Result<Vec<MediaRecord>> {
        let response = self
            .client
            .get(self.endpoint(&["api", "videos"]))
            .query(&[("extras", "true")])
            .send()
            .await?;

        let list: VideoList = check(response).await?.json().await?;
        let records = list.into_records();
        tracing::info!("Fetched {} records from {}", records.len(), self.base_url());
        Ok(records)
    }

    /// Fetch a single record by id; unknown or vanished ids are `NotFound`
    pub async fn fetch_record(&self, id: &RecordId) -> Result<MediaRecord> {
        let response = self
            .client
            .get(self.record_url(&["api", "stats"], id))
            .query(&[("extras", "true")])
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND
        ) {
            tracing::debug!("Server has no record {} ({})", id, response.status());
            return Err(GalleryError::NotFound(id.clone()));
        }

        let record: WireRecord = check(response).await?.json().await?;
        Ok(MediaRecord::from(record))
    }

    /// Ask the server to delete a record on behalf of `user`
    pub async fn delete_record(&self, id: &RecordId, user: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.record_url(&["api", "video"], id))
            .header("user", user)
            .send()
            .await?;

        check(response).await?;
        tracing::info!("Deleted record {} as {}", id, user);
        Ok(())
    }

    /// Trigger a server-side rescan of the media directories
    pub async fn reload_library(&self) -> Result<()> {
        let response = self.client.post(self.endpoint(&["update"])).send().await?;
        check(response).await?;
        Ok(())
    }

    pub async fn fetch_thumbnail(&self, id: &RecordId) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.record_url(&["api", "thumbnail"], id))
            .send()
            .await?;
        let bytes = check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    pub fn media_url(&self, id: &RecordId) -> String {
        self.record_url(&["api", "video"], id).into()
    }

    pub fn thumbnail_url(&self, id: &RecordId) -> String {
        self.record_url(&["api", "thumbnail"], id).into()
    }

    pub fn media_source(&self, id: &RecordId) -> MediaSource {
        MediaSource {
            target: id.clone(),
            media_url: self.media_url(id),
            poster_url: self.thumbnail_url(id),
        }
    }
}

/// Map non-success statuses onto the error taxonomy
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(GalleryError::Unauthorized);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(GalleryError::Transport {
        status: Some(status.as_u16()),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn video_id(id: &str) -> Matcher {
        Matcher::UrlEncoded("video_id".into(), id.into())
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let transport = HttpTransport::new("http://media.local:8000/").unwrap();
        let id = RecordId::from("abc");

        assert_eq!(transport.base_url(), "http://media.local:8000");
        assert_eq!(
            transport.media_url(&id),
            "http://media.local:8000/api/video?video_id=abc"
        );
        assert_eq!(
            transport.thumbnail_url(&id),
            "http://media.local:8000/api/thumbnail?video_id=abc"
        );
    }

    #[test]
    fn test_media_source() {
        let transport = HttpTransport::new("http://localhost:8000").unwrap();
        let source = transport.media_source(&RecordId::from("7"));

        assert_eq!(source.target, RecordId::from("7"));
        assert!(source.media_url.ends_with("/api/video?video_id=7"));
        assert!(source.poster_url.ends_with("/api/thumbnail?video_id=7"));
    }

    #[test]
    fn test_record_ids_are_query_encoded() {
        let transport = HttpTransport::new("http://localhost:8000").unwrap();
        let id = RecordId::from("a b&c#d");

        assert_eq!(
            transport.media_url(&id),
            "http://localhost:8000/api/video?video_id=a+b%26c%23d"
        );
        assert_eq!(
            transport.thumbnail_url(&id),
            "http://localhost:8000/api/thumbnail?video_id=a+b%26c%23d"
        );
    }

    #[test]
    fn test_base_path_is_kept() {
        let transport = HttpTransport::new("http://host/gallery/").unwrap();
        assert_eq!(
            transport.media_url(&RecordId::from("1")),
            "http://host/gallery/api/video?video_id=1"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            HttpTransport::new("not a url"),
            Err(GalleryError::Transport { status: None, .. })
        ));
        assert!(matches!(
            HttpTransport::new("mailto:someone@example.com"),
            Err(GalleryError::Transport { status: None, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_records_parses_listing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/videos")
            .match_query(Matcher::UrlEncoded("extras".into(), "true".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"videos": [{"id": "a", "title": "First"}, {"id": 2, "title": "Second"}]}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url()).unwrap();
        let records = transport.fetch_records().await.unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "First");
        assert_eq!(records[1].id, RecordId::from("2"));
    }

    #[tokio::test]
    async fn test_delete_sends_user_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/video")
            .match_query(video_id("abc"))
            .match_header("user", "alice")
            .with_status(200)
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url()).unwrap();
        transport
            .delete_record(&RecordId::from("abc"), "alice")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/video")
            .match_query(video_id("abc"))
            .with_status(401)
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url()).unwrap();
        let result = transport.delete_record(&RecordId::from("abc"), "mallory").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(GalleryError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_delete_server_error_keeps_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/video")
            .match_query(video_id("abc"))
            .with_status(500)
            .with_body("disk on fire")
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url()).unwrap();
        let result = transport.delete_record(&RecordId::from("abc"), "alice").await;

        mock.assert_async().await;
        match result {
            Err(GalleryError::Transport { status, message }) => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "disk on fire");
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_record_by_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/stats")
            .match_query(video_id("a b"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "a b", "title": "Spaced", "duration": 90}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url()).unwrap();
        let record = transport.fetch_record(&RecordId::from("a b")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(record.id, RecordId::from("a b"));
        assert_eq!(record.title, "Spaced");
        assert_eq!(record.duration.total_seconds(), 90);
    }

    #[tokio::test]
    async fn test_fetch_record_missing_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let unknown = server
            .mock("GET", "/api/stats")
            .match_query(video_id("gone"))
            .with_status(404)
            .create_async()
            .await;
        let vanished = server
            .mock("GET", "/api/stats")
            .match_query(video_id("moved"))
            .with_status(400)
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url()).unwrap();
        let gone = transport.fetch_record(&RecordId::from("gone")).await;
        let moved = transport.fetch_record(&RecordId::from("moved")).await;

        unknown.assert_async().await;
        vanished.assert_async().await;
        assert!(matches!(gone, Err(GalleryError::NotFound(id)) if id == RecordId::from("gone")));
        assert!(matches!(moved, Err(GalleryError::NotFound(id)) if id == RecordId::from("moved")));
    }
}
