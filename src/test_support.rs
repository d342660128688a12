// file: src/test_support.rs
// description: in-process fakes for provider, clone, inference and registry capabilities

use crate::discovery::{Emitter, Page, ProviderApi};
use crate::error::{ConnectError, Result};
use crate::models::{LanguageInfo, RepositoryRef, SyncPayload};
use crate::pipeline::{ProcessReport, Processor};
use crate::registry::Registry;
use crate::repository::{Cloner, MetadataInferrer};
use crate::utils::telemetry::Telemetry;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

fn paged<T: Clone>(pages: &[Vec<T>], page: u32) -> Page<T> {
    let index = page as usize - 1;
    let items = pages.get(index).cloned().unwrap_or_default();
    let next = (index + 1 < pages.len()).then_some(page + 1);
    Page::new(items, next)
}

#[derive(Default)]
pub struct FakeProvider {
    scopes: Vec<Vec<String>>,
    repositories: HashMap<String, Vec<Vec<String>>>,
    failing_scopes: HashSet<String>,
    fail_scope_listing: bool,
    pub scope_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scopes(mut self, pages: Vec<Vec<&str>>) -> Self {
        self.scopes = pages
            .into_iter()
            .map(|page| page.into_iter().map(String::from).collect())
            .collect();
        self
    }

    pub fn with_repositories(mut self, scope: &str, pages: Vec<Vec<&str>>) -> Self {
        let pages = pages
            .into_iter()
            .map(|page| page.into_iter().map(String::from).collect())
            .collect();
        self.repositories.insert(scope.to_string(), pages);
        self
    }

    pub fn with_failing_scope(mut self, scope: &str) -> Self {
        self.failing_scopes.insert(scope.to_string());
        self
    }

    pub fn with_failing_scope_listing(mut self) -> Self {
        self.fail_scope_listing = true;
        self
    }
}

#[async_trait]
impl ProviderApi for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn scope_kind(&self) -> &'static str {
        "organizations"
    }

    async fn list_scopes(&self, page: u32) -> Result<Page<String>> {
        self.scope_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_scope_listing {
            return Err(ConnectError::provider("fake", "401 Unauthorized"));
        }
        Ok(paged(&self.scopes, page))
    }

    async fn list_repositories(&self, scope: &str, page: u32) -> Result<Page<RepositoryRef>> {
        if self.failing_scopes.contains(scope) {
            return Err(ConnectError::provider("fake", format!("{scope} is gone")));
        }

        let pages = self.repositories.get(scope).cloned().unwrap_or_default();
        Ok(paged(&pages, page).map(RepositoryRef::new))
    }
}

/// An emitter whose channel is drained into a list of clone urls.
pub fn collecting_emitter(cancel: CancellationToken) -> (Emitter, JoinHandle<Vec<String>>) {
    let (tx, mut rx) = mpsc::channel::<RepositoryRef>(1);
    let collected = tokio::spawn(async move {
        let mut urls = Vec::new();
        while let Some(repository) = rx.recv().await {
            urls.push(repository.clone_url().to_string());
        }
        urls
    });
    (Emitter::new(tx, cancel), collected)
}

/// Writes a fixed file tree instead of cloning.
#[derive(Default)]
pub struct FakeCloner {
    files: Vec<(String, String)>,
    fail: bool,
    remove_destination: bool,
    depths: Mutex<Vec<u32>>,
}

impl FakeCloner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.push((path.to_string(), contents.to_string()));
        self
    }

    /// Writes the tree and then reports failure, like an interrupted clone.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Reports success but leaves nothing behind to walk.
    pub fn removing_destination(mut self) -> Self {
        self.remove_destination = true;
        self
    }

    pub fn depths(&self) -> Vec<u32> {
        self.depths.lock().unwrap().clone()
    }
}

impl Cloner for FakeCloner {
    fn clone_repository(&self, url: &str, destination: &Path, depth: u32) -> Result<()> {
        self.depths.lock().unwrap().push(depth);

        for (path, contents) in &self.files {
            let target = destination.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(target, contents)?;
        }

        if self.fail {
            return Err(ConnectError::Clone {
                url: url.to_string(),
                message: "remote hung up".to_string(),
            });
        }

        if self.remove_destination {
            fs::remove_dir_all(destination)?;
        }
        Ok(())
    }
}

pub struct FakeInferrer {
    result: Option<LanguageInfo>,
    removes: Option<String>,
}

impl FakeInferrer {
    pub fn language(language: &str, version: &str) -> Self {
        Self {
            result: Some(LanguageInfo::new(language, version)),
            removes: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            removes: None,
        }
    }

    /// Deletes `file_name` from every directory it is asked about.
    pub fn removing(mut self, file_name: &str) -> Self {
        self.removes = Some(file_name.to_string());
        self
    }
}

impl MetadataInferrer for FakeInferrer {
    fn infer(&self, dir: &Path) -> Result<LanguageInfo> {
        if let Some(file_name) = &self.removes {
            let target = dir.join(file_name);
            if target.is_file() {
                fs::remove_file(target)?;
            }
        }

        self.result.clone().ok_or_else(|| ConnectError::Metadata {
            path: dir.to_path_buf(),
            message: "unreadable".to_string(),
        })
    }
}

#[derive(Default)]
pub struct FakeRegistry {
    failing_paths: HashSet<String>,
    fail_detection: bool,
    attempted: Mutex<Vec<String>>,
    synced: Mutex<Vec<SyncPayload>>,
    detect_calls: AtomicUsize,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, file_path: &str) -> Self {
        self.failing_paths.insert(file_path.to_string());
        self
    }

    pub fn failing_detection(mut self) -> Self {
        self.fail_detection = true;
        self
    }

    pub fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }

    pub fn synced(&self) -> Vec<SyncPayload> {
        self.synced.lock().unwrap().clone()
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn sync(&self, payload: &SyncPayload) -> Result<()> {
        let file_path = payload
            .annotations
            .get(crate::models::payload::ANNOTATION_FILE_PATH)
            .cloned()
            .unwrap_or_default();
        self.attempted.lock().unwrap().push(file_path.clone());

        if self.failing_paths.contains(&file_path) {
            return Err(ConnectError::Registry(format!("{file_path} is invalid")));
        }

        self.synced.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn detect_services(&self, _repository: &RepositoryRef, workspace: &Path) -> Result<()> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        assert!(workspace.is_dir(), "detection must run before cleanup");

        if self.fail_detection {
            return Err(ConnectError::Registry("detection unavailable".to_string()));
        }
        Ok(())
    }
}

/// Records each repository it is handed and optionally sleeps to simulate
/// a slow clone.
#[derive(Default)]
pub struct RecordingProcessor {
    delay: Duration,
    failing: HashSet<String>,
    processed: Mutex<Vec<String>>,
    finished: AtomicUsize,
    started: Notify,
}

impl RecordingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_for(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn processed(&self) -> Vec<String> {
        self.processed.lock().unwrap().clone()
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub async fn wait_for_start(&self) {
        self.started.notified().await;
    }
}

#[async_trait]
impl Processor for RecordingProcessor {
    async fn process(&self, repository: &RepositoryRef, _telemetry: &Telemetry) -> Result<ProcessReport> {
        let url = repository.clone_url().to_string();
        self.processed.lock().unwrap().push(url.clone());
        self.started.notify_one();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.finished.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&url) {
            return Err(ConnectError::Clone {
                url,
                message: "authentication required".to_string(),
            });
        }
        Ok(ProcessReport::default())
    }
}

pub mod http {
    //! A one-connection-per-response HTTP server for exercising API clients.

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    pub struct CannedResponse {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
    }

    impl CannedResponse {
        pub fn ok(body: &str) -> Self {
            Self::status(200, body)
        }

        pub fn status(status: u16, body: &str) -> Self {
            Self {
                status,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: body.to_string(),
            }
        }

        pub fn header(mut self, name: &str, value: &str) -> Self {
            self.headers.push((name.to_string(), value.to_string()));
            self
        }
    }

    /// Binds a local port, builds the responses from the server's base url
    /// and answers one request per response. The handle yields the raw
    /// requests in arrival order.
    pub async fn serve<F>(build: F) -> (String, JoinHandle<Vec<String>>)
    where
        F: FnOnce(&str) -> Vec<CannedResponse>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let responses = build(&base);

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for response in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut stream).await);

                let mut raw = format!("HTTP/1.1 {} Canned\r\n", response.status);
                for (name, value) in &response.headers {
                    raw.push_str(&format!("{name}: {value}\r\n"));
                }
                raw.push_str(&format!(
                    "content-length: {}\r\nconnection: close\r\n\r\n{}",
                    response.body.len(),
                    response.body
                ));

                stream.write_all(raw.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            }
            requests
        });

        (base, handle)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let read = stream.read(&mut chunk).await.unwrap();
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..read]);

            let text = String::from_utf8_lossy(&buffer);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);

                if buffer.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buffer).into_owned()
    }
}
