//! Storage facade over the Google Drive v3 API.
//!
//! One `DriveStorage` value holds the authenticated client handle and
//! exposes the six operations: list, download, upload, remove, info,
//! create_folder. Each operation checks the handle, translates its
//! options into the request the API expects, and returns the normalized
//! result. Remote errors are forwarded verbatim; this layer never
//! retries and never logs.

use std::path::PathBuf;

use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::auth::{Authenticator, TokenSource};
use crate::error::{DriveError, Result};
use crate::models::{
    ApiErrorResponse, Credentials, FileInfo, FileListResponse, FileMetadata, RemoveAck,
};

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Upload URL for Google Drive API.
const UPLOAD_API_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Folder objects are files with this MIME type.
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Default local folder for downloads when no destination is given.
pub const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

/// Options for the `list` operation.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Restrict the listing to children of this folder id. When absent,
    /// all accessible objects are listed.
    pub parent: Option<String>,
}

/// Options for the `download` operation.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub file_id: String,
    /// Local name the file is saved with.
    pub file_name: String,
    /// Local folder to save into; defaults to `./downloads`.
    pub destination: Option<PathBuf>,
}

/// Options for the `upload` operation.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Path of the source file in local storage.
    pub file_path: PathBuf,
    /// Remote name; the content type is derived from this name's
    /// extension, not from `file_path`.
    pub file_name: String,
    /// Folder ids the file will be a child of.
    pub parents: Vec<String>,
}

/// Options for the `remove` operation.
#[derive(Debug, Clone)]
pub struct RemoveOptions {
    pub file_id: String,
}

/// Options for the `info` operation.
#[derive(Debug, Clone)]
pub struct InfoOptions {
    pub file_id: String,
}

/// Options for the `create_folder` operation.
#[derive(Debug, Clone)]
pub struct CreateFolderOptions {
    pub name: String,
    /// Folder ids the new folder will be a child of.
    pub parents: Vec<String>,
}

/// Facade over the Drive API, generic over the token source so tests can
/// substitute a stub for the authentication collaborator.
pub struct DriveStorage<A = Authenticator> {
    handle: Option<A>,
    http: Client,
    api_base: String,
    upload_base: String,
}

impl DriveStorage {
    /// Create an unauthenticated facade. Every operation fails with
    /// `DriveError::NotAuthenticated` until `auth` is called.
    pub fn new() -> Self {
        Self {
            handle: None,
            http: Client::new(),
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: UPLOAD_API_BASE.to_string(),
        }
    }

    /// Install the client handle from service-account credentials.
    ///
    /// `client_email` and `private_key` are expected to be non-empty.
    /// Nothing is validated here; malformed credentials surface as an
    /// error on the first operation that uses the handle.
    pub fn auth(&mut self, credentials: Credentials) {
        self.handle = Some(Authenticator::new(credentials));
    }
}

impl Default for DriveStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: TokenSource> DriveStorage<A> {
    /// Create a facade with an already-constructed token source.
    pub fn with_token_source(source: A) -> Self {
        Self {
            handle: Some(source),
            http: Client::new(),
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: UPLOAD_API_BASE.to_string(),
        }
    }

    /// Override the API endpoints, e.g. to point at a Drive-compatible
    /// proxy or a test server.
    pub fn with_endpoints(
        mut self,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.upload_base = upload_base.into();
        self
    }

    fn handle(&self) -> Result<&A> {
        self.handle.as_ref().ok_or(DriveError::NotAuthenticated)
    }

    async fn token(&self) -> Result<String> {
        self.handle()?.access_token().await
    }

    /// List objects, optionally restricted to the children of one folder.
    ///
    /// Returns a single page of results; when the collection is larger
    /// than one page the remainder is not fetched, and an empty
    /// collection is an empty vec, not an error.
    pub async fn list(&self, options: ListOptions) -> Result<Vec<FileMetadata>> {
        let token = self.token().await?;

        let mut request = self
            .http
            .get(format!("{}/files", self.api_base))
            .bearer_auth(&token)
            .query(&[("fields", "files(id, name, mimeType)")]);

        if let Some(parent) = &options.parent {
            let query = format!("'{}' in parents", parent);
            request = request.query(&[("q", query.as_str())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let list_response: FileListResponse = response.json().await?;
        Ok(list_response.files)
    }

    /// Download one object's content to `destination/file_name`.
    ///
    /// The destination directory is created if absent; the local file is
    /// created or overwritten. On a mid-stream error a truncated file
    /// may remain on disk; there is no cleanup pass.
    pub async fn download(&self, options: DownloadOptions) -> Result<()> {
        let token = self.token().await?;

        let dir = options
            .destination
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));
        let target = dir.join(&options.file_name);

        let response = self
            .http
            .get(format!("{}/files/{}", self.api_base, options.file_id))
            .bearer_auth(&token)
            .query(&[("alt", "media")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        fs::create_dir_all(&dir).await?;
        let mut file = File::create(&target).await?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(())
    }

    /// Upload a local file as a new remote object.
    ///
    /// The content type is derived from `file_name`'s extension; the
    /// local file is streamed, not buffered.
    pub async fn upload(&self, options: UploadOptions) -> Result<FileMetadata> {
        let token = self.token().await?;

        let mime_type = mime_guess::from_path(&options.file_name)
            .first_or_octet_stream()
            .to_string();

        let metadata = serde_json::json!({
            "name": options.file_name.as_str(),
            "mimeType": mime_type.as_str(),
            "parents": options.parents,
        });

        let metadata_part = Part::text(metadata.to_string()).mime_str("application/json")?;

        let source = File::open(&options.file_path).await?;
        let media_part = Part::stream(Body::wrap_stream(ReaderStream::new(source)))
            .file_name(options.file_name.clone())
            .mime_str(&mime_type)?;

        let form = Form::new()
            .part("metadata", metadata_part)
            .part("media", media_part);

        let response = self
            .http
            .post(format!("{}/files", self.upload_base))
            .bearer_auth(&token)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id, name, mimeType"),
            ])
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let created: FileMetadata = response.json().await?;
        Ok(created)
    }

    /// Delete one file or folder. Folder deletion is provider-defined
    /// and typically recursive.
    pub async fn remove(&self, options: RemoveOptions) -> Result<RemoveAck> {
        let token = self.token().await?;

        let response = self
            .http
            .delete(format!("{}/files/{}", self.api_base, options.file_id))
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(RemoveAck { ok: true })
    }

    /// Fetch id, name, and content type for one object.
    pub async fn info(&self, options: InfoOptions) -> Result<FileInfo> {
        let token = self.token().await?;

        let response = self
            .http
            .get(format!("{}/files/{}", self.api_base, options.file_id))
            .bearer_auth(&token)
            .query(&[("fields", "id, name, mimeType")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let info: FileInfo = response.json().await?;
        Ok(info)
    }

    /// Create a folder-type object with the given name and parents.
    pub async fn create_folder(&self, options: CreateFolderOptions) -> Result<FileMetadata> {
        let token = self.token().await?;

        let body = serde_json::json!({
            "name": options.name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": options.parents,
        });

        let response = self
            .http
            .post(format!("{}/files", self.api_base))
            .bearer_auth(&token)
            .query(&[("fields", "id, name, mimeType")])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let created: FileMetadata = response.json().await?;
        Ok(created)
    }
}

/// Turn a non-2xx response into an error, preserving the remote message.
/// Drive wraps errors in a JSON envelope; when the body is not that
/// envelope it is carried as-is.
async fn api_error(response: reqwest::Response) -> DriveError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(envelope) => DriveError::Api {
            status: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => DriveError::Api {
            status,
            message: body,
        },
    }
}
