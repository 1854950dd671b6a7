//! Remote payload archives: download from Google Drive, extract with `zip`.
//!
//! Drive serves small files directly. Large files get an HTML interstitial
//! ("can't scan this file for viruses") whose form carries the confirmation
//! token; the download is retried once with that token. There is no resume
//! and no checksum, so a truncated body fails later as an archive error.

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ArchiveSource;
use crate::error::{BuildError, Result};
use crate::tool_args::is_dry_run;
use crate::workspace::Workspace;

/// Google Drive's direct download endpoint.
pub const DRIVE_DOWNLOAD_URL: &str = "https://drive.google.com/uc";

/// Opaque Google Drive file identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriveFileId(String);

impl DriveFileId {
    pub fn parse(id: &str) -> Result<Self> {
        let id = Self(id.trim().to_string());
        id.validate()?;
        Ok(id)
    }

    /// For compile-time constants known to be valid.
    pub(crate) fn new_unchecked(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(BuildError::validation("drive file id is empty"));
        }
        if let Some(bad) = self
            .0
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(BuildError::validation(format!(
                "drive file id '{}' contains invalid character {:?}",
                self.0, bad
            )));
        }
        Ok(())
    }
}

impl fmt::Display for DriveFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a confirmed large-file download is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub action: String,
    pub params: Vec<(String, String)>,
}

/// Blocking Drive client shared by both archive downloads.
#[derive(Debug, Clone)]
pub struct DriveClient {
    http: Client,
    base_url: String,
}

impl DriveClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DRIVE_DOWNLOAD_URL, timeout)
    }

    /// Client against a different endpoint (mirrors, tests).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("uplugin-build/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url: base_url.into() })
    }

    /// Download the file `id` to `dest`, creating parent directories.
    ///
    /// Returns the number of bytes written.
    pub fn download_archive(&self, id: &DriveFileId, dest: &Path) -> Result<u64> {
        info!("Downloading drive file {} to {}", id, dest.display());

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("export", "download"), ("id", id.as_str())])
            .send()?;
        let response = check_status(response, id)?;

        let response = if is_html(&response) {
            let page = response.text()?;
            let confirmation = parse_confirmation(&page, &self.base_url, id).ok_or_else(|| {
                BuildError::download(format!(
                    "drive returned a page without a download link for {} (is the file shared?)",
                    id
                ))
            })?;
            debug!("Confirming large file download via {}", confirmation.action);
            let confirmed = self
                .http
                .get(&confirmation.action)
                .query(&confirmation.params)
                .send()?;
            let confirmed = check_status(confirmed, id)?;
            if is_html(&confirmed) {
                return Err(BuildError::download(format!(
                    "drive refused the confirmed download of {} (quota exceeded or access denied)",
                    id
                )));
            }
            confirmed
        } else {
            response
        };

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(dest)?;
        let mut response = response;
        let written = response.copy_to(&mut file)?;
        info!("Downloaded {} bytes", written);
        Ok(written)
    }
}

fn check_status(response: Response, id: &DriveFileId) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(BuildError::download(format!(
            "HTTP {} while downloading {} from {}",
            status,
            id,
            response.url()
        )))
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("text/html"))
}

/// Extract the confirmation request from a Drive interstitial page.
///
/// Handles the current form-based page (`<form id="download-form"
/// action=...>` with hidden inputs) and the older page that linked to
/// `uc?...&confirm=<token>`.
pub fn parse_confirmation(page: &str, base_url: &str, id: &DriveFileId) -> Option<Confirmation> {
    if let Some(form_start) = page.find("id=\"download-form\"") {
        let tag_start = page[..form_start].rfind("<form")?;
        let form = &page[tag_start..];
        let form_end = form.find("</form>").unwrap_or(form.len());
        let form = &form[..form_end];
        let tag_end = form.find('>')?;

        let action = attribute(&form[..tag_end], "action")?.replace("&amp;", "&");
        let mut params = Vec::new();
        let mut rest = &form[tag_end..];
        while let Some(pos) = rest.find("<input") {
            rest = &rest[pos..];
            let end = rest.find('>').unwrap_or(rest.len());
            let tag = &rest[..end];
            if attribute(tag, "type").as_deref() == Some("hidden") {
                if let Some(name) = attribute(tag, "name") {
                    params.push((name, attribute(tag, "value").unwrap_or_default()));
                }
            }
            rest = &rest[end..];
        }
        return Some(Confirmation { action, params });
    }

    let pos = page.find("confirm=")?;
    let token: String = page[pos + "confirm=".len()..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if token.is_empty() {
        return None;
    }
    Some(Confirmation {
        action: base_url.to_string(),
        params: vec![
            ("export".to_string(), "download".to_string()),
            ("confirm".to_string(), token),
            ("id".to_string(), id.as_str().to_string()),
        ],
    })
}

/// Value of `name="..."` inside a single tag
fn attribute(tag: &str, name: &str) -> Option<String> {
    let needle = format!(" {}=\"", name);
    let start = tag.find(&needle)? + needle.len();
    let len = tag[start..].find('"')?;
    Some(tag[start..start + len].to_string())
}

/// `<dest>.zip`, next to `dest`.
pub fn archive_path_for(dest: &Path) -> Result<PathBuf> {
    let dest = match dest.file_name() {
        Some(_) => dest.to_path_buf(),
        None => fs::canonicalize(dest)?,
    };
    let name = dest.file_name().ok_or_else(|| {
        BuildError::validation(format!("{} has no file name", dest.display()))
    })?;
    let mut archive_name = name.to_os_string();
    archive_name.push(".zip");
    Ok(dest.with_file_name(archive_name))
}

/// Extract every entry of `archive` into `dest`, creating it if missing.
///
/// Returns the number of entries in the archive.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize> {
    info!("Extracting {} into {}", archive.display(), dest.display());
    fs::create_dir_all(dest)?;
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    let entries = zip.len();
    zip.extract(dest)?;
    debug!("Extracted {} entries", entries);
    Ok(entries)
}

/// Download `source` into `<extract_to>.zip` and unpack it into
/// `<extract_to>`, both relative to the workspace.
pub fn download_and_extract(
    client: &DriveClient,
    source: &ArchiveSource,
    workspace: &Workspace,
) -> Result<PathBuf> {
    let dest = workspace.resolve(&source.extract_to);
    let archive = archive_path_for(&dest)?;

    if is_dry_run() {
        info!(
            "[DRY RUN] Would download {} to {} and extract into {}",
            source.file_id,
            archive.display(),
            dest.display()
        );
        return Ok(dest);
    }

    client.download_archive(&source.file_id, &archive)?;
    if let Err(e) = extract_archive(&archive, &dest) {
        warn!("Leaving {} in place for inspection", archive.display());
        return Err(e);
    }
    Ok(dest)
}
