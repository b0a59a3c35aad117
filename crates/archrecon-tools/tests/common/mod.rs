//! Shared harness for archrecon-tools integration tests.

use std::sync::{Arc, Mutex};

use archrecon_tools::{ToolContext, ToolSettings};
use archrecon_workspace::{WorkspaceContext, WorkspaceRoot};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A temp workspace with the standard layout.
///
/// The tempdir is removed when the harness is dropped.
#[allow(dead_code)]
pub struct WorkspaceHarness {
    /// Context positioned at the workspace root.
    pub ctx: ToolContext,
    _dir: TempDir,
}

#[allow(dead_code)]
impl WorkspaceHarness {
    /// Build a workspace whose tools talk to `plantuml_url`.
    pub fn new(plantuml_url: &str) -> Self {
        let dir = TempDir::new().expect("failed to create tempdir");
        let root = WorkspaceRoot::new(dir.path().to_str().expect("non-UTF-8 tempdir"));
        let settings = ToolSettings {
            plantuml_timeout_secs: 5,
            ..ToolSettings::default()
        }
        .with_plantuml_server(plantuml_url);
        let ctx = ToolContext::new(WorkspaceContext::new(root), settings);
        ctx.layout.setup().expect("failed to set up layout");
        Self { ctx, _dir: dir }
    }

    /// Create `repositories/<name>` with the given files.
    pub fn repository(&self, name: &str, files: &[(&str, &str)]) -> std::path::PathBuf {
        let repo = self.ctx.layout.repositories_dir().join(name);
        for (rel, content) in files {
            let path = repo.join(rel);
            std::fs::create_dir_all(path.parent().expect("file has a parent")).unwrap();
            std::fs::write(path, content).unwrap();
        }
        repo
    }
}

/// Minimal HTTP server standing in for PlantUML.
///
/// Answers every request with whatever the responder returns for its path,
/// and records the paths it saw.
#[allow(dead_code)]
pub struct PlantUmlStub {
    /// Base URL including the `/plantuml` prefix.
    pub url: String,
    /// Request paths, in arrival order.
    pub requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl PlantUmlStub {
    /// Start serving on an ephemeral port.
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let responder = Arc::new(responder);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let seen = Arc::clone(&seen);
                let responder = Arc::clone(&responder);
                tokio::spawn(async move {
                    let mut buf = vec![0_u8; 16 * 1024];
                    let mut len = 0;
                    while !buf[..len].windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf[len..]).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => len += n,
                        }
                    }
                    let head = String::from_utf8_lossy(&buf[..len]).into_owned();
                    let path = head
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();
                    seen.lock().unwrap().push(path.clone());

                    let (status, body) = responder(&path);
                    let reason = if status == 200 { "OK" } else { "Bad Request" };
                    let response = format!(
                        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            url: format!("http://{addr}/plantuml"),
            requests,
        }
    }

    /// Paths requested so far.
    pub fn seen(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}
