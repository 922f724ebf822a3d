use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header::HeaderMap};
use tokio::sync::Mutex;

use crate::{
    config::{Credentials, Settings},
    error::ExtractError,
    management::TokenManager,
    spotify::PlaylistSource,
    types::{ApiErrorResponse, PlaylistReference, PlaylistTracksPage},
};

// only what the extractor reads
const TRACK_FIELDS: &str = "items(track(id,is_local)),next,total";

/// An authenticated Spotify Web API session.
///
/// Built once by the caller and shared by reference across extractions.
pub struct SpotifySession {
    client: Client,
    api_url: Url,
    request_timeout: Duration,
    tokens: Mutex<TokenManager>,
}

impl SpotifySession {
    pub fn new(credentials: Credentials, settings: Settings) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ExtractError::Config(e.to_string()))?;
        Self::with_client(client, credentials, settings)
    }

    /// Builds a session around an already configured HTTP client.
    pub fn with_client(
        client: Client,
        credentials: Credentials,
        settings: Settings,
    ) -> Result<Self, ExtractError> {
        let api_url = Url::parse(&settings.api_url)
            .map_err(|e| ExtractError::Config(format!("invalid API url {}: {}", settings.api_url, e)))?;
        if api_url.cannot_be_a_base() {
            return Err(ExtractError::Config(format!(
                "API url cannot be a base: {}",
                settings.api_url
            )));
        }

        Ok(Self {
            client,
            api_url,
            request_timeout: settings.request_timeout,
            tokens: Mutex::new(TokenManager::new(credentials, settings.token_url)),
        })
    }

    fn tracks_url(&self, reference: &PlaylistReference) -> Result<Url, ExtractError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| ExtractError::Config("API url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([
                "users",
                reference.owner(),
                "playlists",
                reference.playlist_id(),
                "tracks",
            ]);
        Ok(url)
    }
}

#[async_trait]
impl PlaylistSource for SpotifySession {
    async fn fetch_page(
        &self,
        reference: &PlaylistReference,
        offset: u32,
        limit: u32,
    ) -> Result<PlaylistTracksPage, ExtractError> {
        let url = self.tracks_url(reference)?;
        let token = self
            .tokens
            .lock()
            .await
            .get_valid_token(&self.client, self.request_timeout)
            .await?;

        let response = self
            .client
            .get(url)
            .query(&[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
                ("fields", TRACK_FIELDS.to_string()),
            ])
            .bearer_auth(token)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                // revoked or expired early, don't reuse it
                self.tokens.lock().await.invalidate();
            }
            if status == StatusCode::BAD_REQUEST {
                // Spotify answers unknown or malformed ids with "Invalid base62 id"
                let reason = error_message(response.text().await.unwrap_or_default());
                return Err(ExtractError::NotFound(format!("{} ({})", reference, reason)));
            }
            let retry_after = retry_after(response.headers());
            return Err(ExtractError::from_status(
                status,
                retry_after,
                &reference.to_string(),
            ));
        }

        let body = response.text().await?;
        let page = serde_json::from_str::<PlaylistTracksPage>(&body)?;
        Ok(page)
    }
}

/// Pulls `error.message` out of a Spotify error body, or returns the raw
/// body when it has another shape.
fn error_message(body: String) -> String {
    match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body,
    }
}

/// Reads the `Retry-After` header as whole seconds.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        net::SocketAddr,
        sync::{
            Arc, Mutex as StdMutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use reqwest::header::HeaderValue;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };

    use super::*;
    use crate::extractor::{RetryPolicy, extract_track_ids};

    fn session(api_url: &str) -> SpotifySession {
        let credentials = Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            username: None,
        };
        let settings = Settings {
            api_url: api_url.to_string(),
            ..Settings::default()
        };
        SpotifySession::new(credentials, settings).unwrap()
    }

    #[test]
    fn test_tracks_url() {
        let session = session("https://api.spotify.com/v1");
        let reference = PlaylistReference::new("spotify", "37i9dQZF1DWSV3Tk4GO2fq").unwrap();
        assert_eq!(
            session.tracks_url(&reference).unwrap().as_str(),
            "https://api.spotify.com/v1/users/spotify/playlists/37i9dQZF1DWSV3Tk4GO2fq/tracks"
        );
    }

    #[test]
    fn test_tracks_url_escapes_segments() {
        let session = session("http://localhost:8080/v1/");
        let reference = PlaylistReference::new("some user", "abc").unwrap();
        assert_eq!(
            session.tracks_url(&reference).unwrap().as_str(),
            "http://localhost:8080/v1/users/some%20user/playlists/abc/tracks"
        );
    }

    #[test]
    fn test_invalid_api_url_is_config_error() {
        let credentials = Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            username: None,
        };
        let settings = Settings {
            api_url: "not a url".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            SpotifySession::new(credentials, settings),
            Err(ExtractError::Config(_))
        ));
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert("retry-after", HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert("retry-after", HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error":{"status":400,"message":"Invalid base62 id"}}"#;
        assert_eq!(error_message(body.to_string()), "Invalid base62 id");
        assert_eq!(error_message("Bad Request".to_string()), "Bad Request");
    }

    const TOKEN_BODY: &str = r#"{"access_token":"tok","token_type":"Bearer","expires_in":3600}"#;
    const PAGE_BODY: &str = r#"{
        "items": [{"track": {"id": "a"}}, {"track": null}, {"track": {"id": "b"}}],
        "next": "https://api.spotify.com/v1/users/u1/playlists/p/tracks?offset=103",
        "total": 250
    }"#;

    // Canned reply for one playlist request.
    struct Reply {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
        body: &'static str,
    }

    fn reply(status: u16, body: &'static str) -> Reply {
        Reply {
            status,
            headers: Vec::new(),
            body,
        }
    }

    // Loopback HTTP server: token POSTs always succeed, GETs are answered
    // with `replies` in order.
    struct Loopback {
        addr: SocketAddr,
        token_requests: Arc<AtomicUsize>,
        request_lines: Arc<StdMutex<Vec<String>>>,
    }

    impl Loopback {
        fn session(&self) -> SpotifySession {
            let credentials = Credentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
                username: None,
            };
            let settings = Settings {
                api_url: format!("http://{}/v1", self.addr),
                token_url: format!("http://{}/api/token", self.addr),
                request_timeout: Duration::from_secs(5),
                ..Settings::default()
            };
            let client = Client::builder().no_proxy().build().unwrap();
            SpotifySession::with_client(client, credentials, settings).unwrap()
        }
    }

    async fn loopback(replies: Vec<Reply>) -> Loopback {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let replies = Arc::new(StdMutex::new(VecDeque::from(replies)));
        let token_requests = Arc::new(AtomicUsize::new(0));
        let request_lines = Arc::new(StdMutex::new(Vec::new()));

        let server = Loopback {
            addr,
            token_requests: Arc::clone(&token_requests),
            request_lines: Arc::clone(&request_lines),
        };

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let request = read_request(&mut stream).await;
                let first_line = request.lines().next().unwrap_or_default().to_string();

                let answer = if first_line.starts_with("POST") {
                    token_requests.fetch_add(1, Ordering::SeqCst);
                    reply(200, TOKEN_BODY)
                } else {
                    request_lines.lock().unwrap().push(first_line);
                    replies
                        .lock()
                        .unwrap()
                        .pop_front()
                        .unwrap_or_else(|| reply(500, "{}"))
                };

                let mut out = format!(
                    "HTTP/1.1 {} Reply\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n",
                    answer.status,
                    answer.body.len()
                );
                for (name, value) in &answer.headers {
                    out.push_str(&format!("{}: {}\r\n", name, value));
                }
                out.push_str("\r\n");
                out.push_str(answer.body);

                let _ = stream.write_all(out.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        server
    }

    // Reads the request head plus a body of `content-length` bytes.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            buf.extend_from_slice(&chunk[..n]);

            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_string();
                let length = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).to_string()
    }

    fn playlist(id: &str) -> PlaylistReference {
        PlaylistReference::new("u1", id).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_page_decodes_listing() {
        let server = loopback(vec![reply(200, PAGE_BODY)]).await;
        let session = server.session();

        let page = session.fetch_page(&playlist("p"), 100, 100).await.unwrap();

        assert_eq!(page.items.len(), 3);
        assert!(page.items[1].track.is_none());
        assert!(page.next.is_some());
        assert_eq!(page.total, Some(250));
        assert_eq!(server.token_requests.load(Ordering::SeqCst), 1);

        let lines = server.request_lines.lock().unwrap().clone();
        assert!(lines[0].starts_with("GET /v1/users/u1/playlists/p/tracks?offset=100&limit=100&fields="));
    }

    #[tokio::test]
    async fn test_token_is_reused_between_pages() {
        let server = loopback(vec![reply(200, PAGE_BODY), reply(200, PAGE_BODY)]).await;
        let session = server.session();

        session.fetch_page(&playlist("p"), 0, 100).await.unwrap();
        session.fetch_page(&playlist("p"), 100, 100).await.unwrap();

        assert_eq!(server.token_requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_base62_id_is_not_found() {
        let body = r#"{"error":{"status":400,"message":"Invalid base62 id"}}"#;
        let server = loopback(vec![reply(400, body)]).await;
        let session = server.session();

        let result = extract_track_ids(
            &session,
            &playlist("does-not-exist"),
            &RetryPolicy::default(),
        )
        .await;

        match result {
            Err(ExtractError::NotFound(reason)) => assert!(reason.contains("Invalid base62 id")),
            other => panic!("expected NotFound, got {:?}", other),
        }
        // not retried
        assert_eq!(server.request_lines.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_playlist_is_not_found() {
        let body = r#"{"error":{"status":404,"message":"Not found."}}"#;
        let server = loopback(vec![reply(404, body)]).await;

        let result = server.session().fetch_page(&playlist("gone"), 0, 100).await;
        assert!(matches!(result, Err(ExtractError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_forbidden_is_authorization() {
        let server = loopback(vec![reply(403, "{}")]).await;

        let result = server.session().fetch_page(&playlist("private"), 0, 100).await;
        assert!(matches!(result, Err(ExtractError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let server = loopback(vec![Reply {
            status: 429,
            headers: vec![("retry-after", "7")],
            body: "{}",
        }])
        .await;

        let result = server.session().fetch_page(&playlist("busy"), 0, 100).await;
        assert_eq!(
            result.unwrap_err(),
            ExtractError::RateLimited {
                retry_after: Some(Duration::from_secs(7))
            }
        );
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = loopback(vec![reply(503, "{}")]).await;

        let result = server.session().fetch_page(&playlist("p"), 0, 100).await;
        assert!(matches!(result, Err(ExtractError::TransientNetwork(_))));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_malformed() {
        let server = loopback(vec![reply(200, "<html>oops</html>")]).await;

        let result = server.session().fetch_page(&playlist("p"), 0, 100).await;
        assert!(matches!(result, Err(ExtractError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_body_without_next_is_malformed() {
        let server = loopback(vec![reply(200, r#"{"items": [], "total": 0}"#)]).await;

        let result = server.session().fetch_page(&playlist("p"), 0, 100).await;
        assert!(matches!(result, Err(ExtractError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_unauthorized_drops_token() {
        let server = loopback(vec![reply(401, "{}"), reply(200, PAGE_BODY)]).await;
        let session = server.session();

        let first = session.fetch_page(&playlist("p"), 0, 100).await;
        assert!(matches!(first, Err(ExtractError::Authorization(_))));

        session.fetch_page(&playlist("p"), 0, 100).await.unwrap();
        assert_eq!(server.token_requests.load(Ordering::SeqCst), 2);
    }
}
