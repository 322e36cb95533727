//! Record-replay round trips through the public session API.
//!
//! Each test records against a fake live transport into a scratch directory,
//! then replays the written cassette with a live transport that must not be
//! touched.

use std::io::{BufRead, Read};
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tapedeck::cassette::format::{Cassette, FtpInteraction, Headers, Interaction, SourceType};
use tapedeck::cassette::store;
use tapedeck::ports::{
    AsyncHttpTransport, EasyOption, EasyTransfer, FtpClient, FtpError, HttpFuture, HttpRequest,
    HttpResponse, HttpTransport, SharedBuffer, Sink, TransportError,
};
use tapedeck::{
    FilterSpec, HookOutcome, RecordKind, RecordMode, RecordOptions, Recorder, RecorderError,
    TestId,
};

/// Answers every request with 200, the given body and a session header.
struct LiveQuotes {
    body: &'static str,
    calls: Arc<AtomicUsize>,
}

impl LiveQuotes {
    fn new(body: &'static str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { body, calls: Arc::clone(&calls) }, calls)
    }

    fn answer(&self, request: &HttpRequest) -> HttpResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut headers = Headers::new();
        headers.insert("Content-Type".into(), "application/json".into());
        headers.insert("authorization".into(), "Bearer echoed".into());
        HttpResponse {
            status: 200,
            reason: "OK".into(),
            headers,
            body: self.body.as_bytes().to_vec(),
            url: request.url.clone(),
        }
    }
}

impl HttpTransport for LiveQuotes {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        Ok(self.answer(&request))
    }
}

impl AsyncHttpTransport for LiveQuotes {
    fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
        let response = self.answer(&request);
        Box::pin(async move { Ok(response) })
    }
}

/// Fails the test if replay reaches the network.
struct Offline;

impl HttpTransport for Offline {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        panic!("replay made a live call to {}", request.url);
    }
}

impl AsyncHttpTransport for Offline {
    fn send(&self, request: HttpRequest) -> HttpFuture<'_> {
        panic!("replay made a live call to {}", request.url);
    }
}

fn recorder(dir: &Path, kind: RecordKind, options: RecordOptions) -> Recorder {
    let test = TestId::new(dir.join("quotes.rs"), "fetch").with_marker(kind);
    Recorder::new(options, test)
}

fn stored(path: &Path) -> Vec<Interaction> {
    store::load::<Cassette<Interaction>>(path).unwrap().interactions
}

#[test]
fn curl_get_is_captured_redacted_and_replayed_offline() {
    let dir = tempfile::tempdir().unwrap();
    let filters = || FilterSpec::default().filter_query_parameter("apikey", "MOCK");

    let capture = recorder(dir.path(), RecordKind::Curl, RecordOptions::recording(&[RecordKind::Curl]));
    let session = capture.curl(filters()).unwrap();
    assert_eq!(session.mode(), Some(RecordMode::Capture));
    let (live, calls) = LiveQuotes::new(r#"{"price":42}"#);
    let transport = session.wrap(Box::new(live));
    let response = transport.get("https://example.test/a?apikey=123").unwrap();
    assert_eq!(response.text(), r#"{"price":42}"#);
    let path = session.finish().unwrap().unwrap();
    assert!(path.ends_with("record/curl/quotes/fetch_curl.yaml"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let interactions = stored(&path);
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].request.uri, "https://example.test/a?apikey=MOCK");
    assert_eq!(interactions[0].source_type, SourceType::CurlSession);

    let replay = recorder(dir.path(), RecordKind::Curl, RecordOptions::default());
    let session = replay.curl(filters()).unwrap();
    assert_eq!(session.mode(), Some(RecordMode::Replay));
    let transport = session.wrap(Box::new(Offline));
    let response = transport.get("https://example.test/a?apikey=123").unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.text(), r#"{"price":42}"#);
    session.finish().unwrap();
}

/// Creates a resource and answers 201 with its id.
struct CreateOrder;

impl HttpTransport for CreateOrder {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut headers = Headers::new();
        headers.insert("Content-Type".into(), "application/json".into());
        Ok(HttpResponse {
            status: 201,
            reason: "Created".into(),
            headers,
            body: br#"{"id":5}"#.to_vec(),
            url: request.url,
        })
    }
}

#[test]
fn curl_post_created_keeps_its_body() {
    let dir = tempfile::tempdir().unwrap();
    let url = "https://example.test/orders";

    let capture = recorder(dir.path(), RecordKind::Curl, RecordOptions::recording(&[RecordKind::Curl]));
    let session = capture.curl(FilterSpec::default()).unwrap();
    let transport = session.wrap(Box::new(CreateOrder));
    let response = transport.post(url, br#"{"qty":1}"#.to_vec()).unwrap();
    assert_eq!(response.status, 201);
    let path = session.finish().unwrap().unwrap();

    let interactions = stored(&path);
    assert_eq!(interactions[0].response.status.code, 201);
    assert_eq!(interactions[0].response.body.string.as_deref(), Some(r#"{"id":5}"#));

    let replay = recorder(dir.path(), RecordKind::Curl, RecordOptions::default());
    let session = replay.curl(FilterSpec::default()).unwrap();
    let transport = session.wrap(Box::new(Offline));
    let response = transport.post(url, br#"{"qty":1}"#.to_vec()).unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.text(), r#"{"id":5}"#);
    session.finish().unwrap();
}

#[test]
fn capture_is_saved_when_the_test_panics() {
    let dir = tempfile::tempdir().unwrap();
    let capture = recorder(dir.path(), RecordKind::Http, RecordOptions::recording(&[RecordKind::Http]));
    let path = capture.cassette_path(RecordKind::Http);

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        let session = capture.http(FilterSpec::default()).unwrap();
        let (live, _) = LiveQuotes::new("before the failure");
        let transport = session.wrap(Box::new(live));
        transport.get("https://example.test/flaky").unwrap();
        panic!("assertion in the test body failed");
    }));

    assert!(outcome.is_err());
    let interactions = stored(&path);
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].response.body.string.as_deref(), Some("before the failure"));
}

#[test]
fn replay_consumes_each_interaction_once_unless_repeats_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let capture = recorder(dir.path(), RecordKind::Http, RecordOptions::recording(&[RecordKind::Http]));
    let session = capture.http(FilterSpec::default()).unwrap();
    let (live, _) = LiveQuotes::new("once");
    session.wrap(Box::new(live)).get("https://example.test/once").unwrap();
    session.finish().unwrap();

    let replay = recorder(dir.path(), RecordKind::Http, RecordOptions::default());
    let session = replay.http(FilterSpec::default()).unwrap();
    let transport = session.wrap(Box::new(Offline));
    transport.get("https://example.test/once").unwrap();
    let err = transport.get("https://example.test/once").unwrap_err();
    assert!(matches!(err, TransportError::Replay(RecorderError::NoMatchingInteraction { .. })));
    session.finish().unwrap();

    let session = replay.http(FilterSpec::default().allow_playback_repeats(true)).unwrap();
    let transport = session.wrap(Box::new(Offline));
    for _ in 0..5 {
        assert_eq!(transport.get("https://example.test/once").unwrap().text(), "once");
    }
    session.finish().unwrap();
}

#[test]
fn vetoed_responses_are_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let capture = recorder(dir.path(), RecordKind::Http, RecordOptions::recording(&[RecordKind::Http]));
    let filters = FilterSpec::default().before_record_response(|response| {
        if response.body.string.as_deref() == Some("private") {
            Ok(HookOutcome::Drop)
        } else {
            Ok(HookOutcome::Body("kept".into()))
        }
    });
    let session = capture.http(filters).unwrap();
    let (public, _) = LiveQuotes::new("public");
    let (private, _) = LiveQuotes::new("private");
    let public = session.wrap(Box::new(public));
    let private = session.wrap(Box::new(private));

    public.get("https://example.test/1").unwrap();
    assert_eq!(private.get("https://example.test/2").unwrap().text(), "private");
    public.get("https://example.test/3").unwrap();
    let path = session.finish().unwrap().unwrap();

    let interactions = stored(&path);
    assert_eq!(interactions.len(), 2);
    assert!(interactions.iter().all(|i| i.response.body.string.as_deref() == Some("kept")));
}

#[test]
fn authorization_never_reaches_the_cassette() {
    let dir = tempfile::tempdir().unwrap();
    let capture = recorder(dir.path(), RecordKind::Http, RecordOptions::recording(&[RecordKind::Http]));
    let session = capture.http(FilterSpec::default().filter_header("Authorization", None)).unwrap();
    let (live, _) = LiveQuotes::new("{}");
    let transport = session.wrap(Box::new(live));
    let request = HttpRequest::new("get", "https://example.test/me")
        .header("Authorization", "Bearer top-secret");
    transport.send(request).unwrap();
    let path = session.finish().unwrap().unwrap();

    let interaction = &stored(&path)[0];
    let has_auth = |headers: &Headers| headers.keys().any(|k| k.eq_ignore_ascii_case("authorization"));
    assert!(!has_auth(&interaction.request.headers));
    assert!(!has_auth(&interaction.response.headers));
    assert!(!std::fs::read_to_string(&path).unwrap().contains("top-secret"));
}

#[tokio::test]
async fn async_session_records_after_the_future_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let capture = recorder(dir.path(), RecordKind::Curl, RecordOptions::recording(&[RecordKind::Curl]));
    let session = capture.curl(FilterSpec::default()).unwrap();
    let (live, _) = LiveQuotes::new("async body");
    let transport = session.wrap_async(Box::new(live));
    transport.get("https://example.test/async").await.unwrap();
    let path = session.finish().unwrap().unwrap();
    assert_eq!(stored(&path)[0].source_type, SourceType::CurlAsync);

    let replay = recorder(dir.path(), RecordKind::Curl, RecordOptions::default());
    let session = replay.curl(FilterSpec::default()).unwrap();
    let transport = session.wrap_async(Box::new(Offline));
    let response = transport.get("https://example.test/async").await.unwrap();
    assert_eq!(response.text(), "async body");
    session.finish().unwrap();
}

/// Easy handle that writes a fixed header block and body.
#[derive(Default)]
struct LiveEasy {
    write: Option<Sink>,
    header: Option<Sink>,
    code: u16,
}

impl EasyTransfer for LiveEasy {
    fn setopt(&mut self, option: EasyOption) -> Result<(), TransportError> {
        match option {
            EasyOption::WriteFunction(callback) => self.write = Some(Sink::Callback(callback)),
            EasyOption::HeaderFunction(callback) => self.header = Some(Sink::Callback(callback)),
            _ => {}
        }
        Ok(())
    }

    fn perform(&mut self) -> Result<(), TransportError> {
        self.code = 200;
        if let Some(header) = self.header.as_mut() {
            header.deliver(b"HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\n\r\n");
        }
        if let Some(write) = self.write.as_mut() {
            write.deliver(b"sym,price\nABC,42\n");
        }
        Ok(())
    }

    fn response_code(&self) -> u16 {
        self.code
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[test]
fn easy_handle_round_trip_fills_caller_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let url = "https://example.test/prices.csv";

    let capture = recorder(dir.path(), RecordKind::Curl, RecordOptions::recording(&[RecordKind::Curl]));
    let session = capture.curl(FilterSpec::default()).unwrap();
    let mut easy = session.wrap_easy(Box::new(LiveEasy::default()));
    let body = SharedBuffer::new();
    easy.setopt(EasyOption::Url(url.into())).unwrap();
    easy.setopt(EasyOption::WriteData(Box::new(body.clone()))).unwrap();
    easy.perform().unwrap();
    assert_eq!(body.text(), "sym,price\nABC,42\n");
    drop(easy);
    session.finish().unwrap();

    let replay = recorder(dir.path(), RecordKind::Curl, RecordOptions::default());
    let session = replay.curl(FilterSpec::default()).unwrap();
    let mut easy = session.wrap_easy(Box::new(LiveEasy::default()));
    let body = SharedBuffer::new();
    easy.setopt(EasyOption::Url(url.into())).unwrap();
    easy.setopt(EasyOption::WriteData(Box::new(body.clone()))).unwrap();
    easy.perform().unwrap();
    assert_eq!(easy.response_code(), 200);
    assert_eq!(body.text(), "sym,price\nABC,42\n");
}

/// FTP server that accepts any login.
struct LiveFtp {
    live: bool,
}

impl LiveFtp {
    fn reply(&self, text: &str) -> Result<String, FtpError> {
        assert!(self.live, "replay reached the FTP server");
        Ok(text.to_string())
    }
}

impl FtpClient for LiveFtp {
    fn host(&self) -> String {
        "ftp.example.test".into()
    }

    fn login(&mut self, _user: &str, _passwd: &str) -> Result<String, FtpError> {
        self.reply("230 Login successful.")
    }

    fn cwd(&mut self, dirname: &str) -> Result<String, FtpError> {
        assert!(self.live, "replay reached the FTP server");
        Err(FtpError::Permanent(format!("550 {dirname}: No such directory.")))
    }

    fn mkd(&mut self, dirname: &str) -> Result<String, FtpError> {
        self.reply(dirname)
    }

    fn rmd(&mut self, _dirname: &str) -> Result<String, FtpError> {
        self.reply("250 Remove directory operation successful.")
    }

    fn delete(&mut self, _filename: &str) -> Result<String, FtpError> {
        self.reply("250 Delete operation successful.")
    }

    fn rename(&mut self, _from: &str, _to: &str) -> Result<String, FtpError> {
        self.reply("250 Rename successful.")
    }

    fn pwd(&mut self) -> Result<String, FtpError> {
        self.reply("/pub")
    }

    fn quit(&mut self) -> Result<String, FtpError> {
        self.reply("221 Goodbye.")
    }

    fn retrbinary(
        &mut self,
        _cmd: &str,
        callback: &mut dyn FnMut(&[u8]),
        _blocksize: usize,
    ) -> Result<String, FtpError> {
        callback(b"payload");
        self.reply("226 Transfer complete.")
    }

    fn retrlines(&mut self, _cmd: &str, callback: &mut dyn FnMut(&str)) -> Result<String, FtpError> {
        callback("readme.txt");
        self.reply("226 Directory send OK.")
    }

    fn storbinary(
        &mut self,
        _cmd: &str,
        reader: &mut dyn Read,
        _blocksize: usize,
    ) -> Result<String, FtpError> {
        std::io::copy(reader, &mut std::io::sink())?;
        self.reply("226 Transfer complete.")
    }

    fn storlines(&mut self, _cmd: &str, reader: &mut dyn BufRead) -> Result<String, FtpError> {
        std::io::copy(reader, &mut std::io::sink())?;
        self.reply("226 Transfer complete.")
    }
}

#[test]
fn ftp_login_is_redacted_and_replays_with_any_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let capture = recorder(dir.path(), RecordKind::Ftp, RecordOptions::recording(&[RecordKind::Ftp]));
    let session = capture.ftp(FilterSpec::default()).unwrap();
    let mut ftp = session.wrap(Box::new(LiveFtp { live: true }));
    ftp.login("user", "secret").unwrap();
    assert_eq!(ftp.pwd().unwrap(), "/pub");
    assert!(matches!(ftp.cwd("/missing"), Err(FtpError::Permanent(_))));
    drop(ftp);
    let path = session.finish().unwrap().unwrap();
    assert!(path.ends_with("record/ftp/quotes/fetch_ftp.yaml"));

    let entries = store::load::<Cassette<FtpInteraction>>(&path).unwrap().interactions;
    assert_eq!(entries[0].command, "login");
    assert_eq!(entries[0].args, vec!["[REDACTED]", "[REDACTED]"]);
    assert!(!std::fs::read_to_string(&path).unwrap().contains("secret"));

    let replay = recorder(dir.path(), RecordKind::Ftp, RecordOptions::default());
    let session = replay.ftp(FilterSpec::default()).unwrap();
    let mut ftp = session.wrap(Box::new(LiveFtp { live: false }));
    assert_eq!(ftp.login("someone-else", "whatever").unwrap(), "230 Login successful.");
    assert_eq!(ftp.pwd().unwrap(), "/pub");
    let err = ftp.cwd("/missing").unwrap_err();
    assert_eq!(err.to_string(), "550 /missing: No such directory.");
}

#[test]
fn object_record_with_extra_value_reports_length_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let capture = recorder(dir.path(), RecordKind::Object, RecordOptions::recording(&[RecordKind::Object]));
    let mut objects = capture.objects().unwrap();
    objects.add_verify(&vec![1, 2, 3]).unwrap();
    objects.add_verify(&"summary").unwrap();
    objects.finish().unwrap();

    let verify = recorder(dir.path(), RecordKind::Object, RecordOptions::default());
    let mut objects = verify.objects().unwrap();
    objects.add_verify(&vec![1, 2, 3]).unwrap();
    objects.add_verify(&"summary").unwrap();
    objects.add_verify(&"extra").unwrap();
    let err = objects.finish().unwrap_err();
    assert!(matches!(err, RecorderError::LengthMismatch { current: 3, loaded: 2, .. }));
}

#[test]
fn marked_kind_without_cassette_or_request_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let replay = recorder(dir.path(), RecordKind::Curl, RecordOptions::default());
    let err = replay.curl(FilterSpec::default()).err().unwrap();
    let message = err.to_string();
    assert!(message.contains("fetch_curl.yaml"));
    assert!(message.contains("--record curl"));
}
