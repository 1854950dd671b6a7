//! Shared fixtures for the integration tests: scratch repositories, a fake
//! engine installation, zip payloads and a tiny HTTP server standing in for
//! Google Drive.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use zip::write::SimpleFileOptions;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("git should spawn");
    assert!(status.success(), "git {:?} failed in {}", args, dir.display());
}

/// `git init` plus one commit containing a plugin descriptor.
pub fn init_plugin_repo(dir: &Path, plugin: &str) {
    fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q"]);
    write_descriptor(dir, plugin);
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "initial"]);
}

pub fn write_descriptor(root: &Path, plugin: &str) -> PathBuf {
    let path = root.join(format!("{}.uplugin", plugin));
    fs::write(&path, r#"{ "FileVersion": 3, "Version": 1 }"#).unwrap();
    path
}

/// Engine layout whose `RunUAT.sh` records its arguments in
/// `<engine>/args.txt` and exits with `exit_code`.
#[cfg(unix)]
pub fn fake_engine(root: &Path, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let engine = root.join("UE_5.3");
    let batch = engine.join("Engine").join("Build").join("BatchFiles");
    fs::create_dir_all(&batch).unwrap();

    let script = batch.join("RunUAT.sh");
    let body = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"{}\"\nexit {}\n",
        engine.join("args.txt").display(),
        exit_code
    );
    fs::write(&script, body).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    engine
}

/// Arguments the fake `RunUAT.sh` was called with, one per entry.
pub fn recorded_args(engine: &Path) -> Vec<String> {
    fs::read_to_string(engine.join("args.txt"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// In-memory zip with the given `(path, contents)` files.
pub fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, contents) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn write_zip(path: &Path, files: &[(&str, &str)]) {
    File::create(path)
        .unwrap()
        .write_all(&zip_bytes(files))
        .unwrap();
}

/// Canned HTTP response.
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn zip(files: &[(&str, &str)]) -> Self {
        Self { status: 200, content_type: "application/zip", body: zip_bytes(files) }
    }

    pub fn html(page: String) -> Self {
        Self { status: 200, content_type: "text/html; charset=utf-8", body: page.into_bytes() }
    }

    pub fn not_found() -> Self {
        Self { status: 404, content_type: "text/plain", body: b"not found".to_vec() }
    }
}

/// Local HTTP server answering every request through `route`.
pub struct DriveStub {
    pub base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl DriveStub {
    /// `route` receives the request target (path plus query) and the
    /// server's own base address.
    pub fn start<F>(route: F) -> Self
    where
        F: Fn(&str, &str) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        let server_base = base.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                loop {
                    let mut header = String::new();
                    match reader.read_line(&mut header) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if header == "\r\n" || header == "\n" => break,
                        Ok(_) => {}
                    }
                }

                let target = request_line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();
                seen.lock().unwrap().push(target.clone());

                let reply = route(&target, &server_base);
                let reason = if reply.status == 200 { "OK" } else { "Error" };
                let head = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    reply.status,
                    reason,
                    reply.content_type,
                    reply.body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&reply.body);
                let _ = stream.flush();
            }
        });

        Self { base, requests }
    }

    /// Download endpoint, as configured in `download_url`.
    pub fn download_url(&self) -> String {
        format!("{}/uc", self.base)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Large-file interstitial pointing back at `<base>/download`.
pub fn interstitial(base: &str, id: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>Google Drive - Virus scan warning</title></head>
<body><p>Google Drive can't scan this file for viruses.</p>
<form id="download-form" action="{base}/download" method="get">
<input type="submit" id="uc-download-link" class="goog-inline-block jfk-button" value="Download anyway"/>
<input type="hidden" name="id" value="{id}">
<input type="hidden" name="export" value="download">
<input type="hidden" name="confirm" value="t">
<input type="hidden" name="uuid" value="0f1e2d3c">
</form></body></html>"#
    )
}
