//! Background retrieval of package names from the remote release feed.
//!
//! One GET, one worker thread, no retry. The result crosses the thread
//! boundary over a channel so the caller can observe completion instead of
//! polling an unsynchronized field.

use std::fmt;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde::Deserialize;

/// Fixed feed query: package ids as JSON, most downloaded first, top 100.
pub const FEED_URL: &str = "https://www.myget.org/F/aspnetrelease/api/v2/Packages()?$select=Id&$format=json&orderby=DownloadCount&$top=100";

const USER_AGENT: &str = concat!("kterm/", env!("CARGO_PKG_VERSION"));

/// JSON envelope: `{"d": [{"Id": "..."}]}`.
#[derive(Deserialize)]
struct FeedEnvelope {
    d: Vec<FeedEntry>,
}

#[derive(Deserialize)]
struct FeedEntry {
    #[serde(rename = "Id")]
    id: String,
}

/// Why a fetch produced no package list. `Display` is the recorded message.
#[derive(Debug)]
pub enum FetchError {
    /// The feed answered with a non-success status.
    Http(u16),
    /// Connection, DNS, or timeout failure.
    Network(String),
    /// The body was not the expected JSON envelope.
    Parse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(code) => write!(f, "HTTP error {code} contacting the package feed"),
            FetchError::Network(reason) => {
                write!(f, "URL error {reason} contacting the package feed")
            }
            FetchError::Parse(reason) => {
                write!(f, "Unexpected package feed response: {reason}")
            }
        }
    }
}

impl std::error::Error for FetchError {}

/// One GET against `url`, decoding the feed envelope into an ordered list
/// of package ids. Exactly one attempt.
pub fn fetch_package_names(url: &str, timeout: Duration) -> Result<Vec<String>, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http(status.as_u16()));
    }

    let envelope: FeedEnvelope = response.json().map_err(|e| FetchError::Parse(e.to_string()))?;
    Ok(envelope.d.into_iter().map(|entry| entry.id).collect())
}

/// Handle to a fetch running on its own worker thread.
pub struct PackageFetch {
    rx: mpsc::Receiver<Result<Vec<String>, FetchError>>,
}

impl PackageFetch {
    /// Start one fetch against the fixed feed URL.
    pub fn spawn(timeout: Duration) -> Self {
        Self::spawn_against(FEED_URL.to_string(), timeout)
    }

    /// Start one fetch against an arbitrary URL (tests point this at a
    /// local server).
    pub fn spawn_against(url: String, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = fetch_package_names(&url, timeout);
            if let Err(ref e) = result {
                eprintln!("[feed] {e}");
            }
            // The receiver may be gone when the caller lost interest.
            let _ = tx.send(result);
        });
        Self { rx }
    }

    /// Non-blocking: the result, if the worker has finished.
    pub fn poll(&self) -> Option<Result<Vec<String>, FetchError>> {
        self.rx.try_recv().ok()
    }

    /// Block until the worker finishes.
    pub fn wait(self) -> Result<Vec<String>, FetchError> {
        self.rx.recv().unwrap_or_else(|_| {
            Err(FetchError::Network(
                "worker thread terminated without a result".into(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn well_formed_response_yields_ordered_ids() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/feed")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"d":[{"Id":"Foo"},{"Id":"Bar"}]}"#)
            .create();

        let names = fetch_package_names(&format!("{}/feed", server.url()), TIMEOUT).unwrap();
        assert_eq!(names, vec!["Foo", "Bar"]);
    }

    #[test]
    fn extra_envelope_fields_are_ignored() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/feed")
            .with_status(200)
            .with_body(r#"{"d":[{"Id":"Only","Version":"1.0.0"}],"next":"..."}"#)
            .create();

        let names = fetch_package_names(&format!("{}/feed", server.url()), TIMEOUT).unwrap();
        assert_eq!(names, vec!["Only"]);
    }

    #[test]
    fn http_error_is_recorded_with_its_status() {
        let mut server = mockito::Server::new();
        let _m = server.mock("GET", "/feed").with_status(500).create();

        let err = fetch_package_names(&format!("{}/feed", server.url()), TIMEOUT).unwrap_err();
        match err {
            FetchError::Http(code) => assert_eq!(code, 500),
            other => panic!("expected Http, got {other:?}"),
        }
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn connection_failure_is_a_network_error() {
        // Nothing listens on port 1.
        let err = fetch_package_names("http://127.0.0.1:1/feed", TIMEOUT).unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/feed")
            .with_status(200)
            .with_body("not json")
            .create();

        let err = fetch_package_names(&format!("{}/feed", server.url()), TIMEOUT).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn worker_hands_the_result_over_the_channel() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/feed")
            .with_status(200)
            .with_body(r#"{"d":[{"Id":"A"},{"Id":"B"},{"Id":"C"}]}"#)
            .create();

        let fetch = PackageFetch::spawn_against(format!("{}/feed", server.url()), TIMEOUT);
        let names = fetch.wait().unwrap();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn poll_eventually_sees_the_result() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("GET", "/feed")
            .with_status(200)
            .with_body(r#"{"d":[]}"#)
            .create();

        let fetch = PackageFetch::spawn_against(format!("{}/feed", server.url()), TIMEOUT);
        let mut result = None;
        for _ in 0..100 {
            if let Some(r) = fetch.poll() {
                result = Some(r);
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
        let names = result.expect("worker never finished").unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn failed_worker_surfaces_over_the_channel_too() {
        let fetch = PackageFetch::spawn_against("http://127.0.0.1:1/feed".into(), TIMEOUT);
        assert!(fetch.wait().is_err());
    }
}
