use std::collections::HashMap;

use axum::{body::Bytes, debug_handler, extract::{Multipart, Path, State}, http::{header, HeaderValue}, response::{IntoResponse, Response}};
use base64::Engine as _;
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{res, AppResult, AppState, Shared};

/// A file picked in a browser file dialog.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Images the browser may show inline. SVG can carry script, so it doesn't count.
    pub fn is_inline_image(&self) -> bool {
        self.content_type.starts_with("image/") && !self.content_type.contains("svg")
    }

    /// Pulls the `file` field out of a multipart form, ignoring everything else.
    pub async fn from_multipart(multipart: &mut Multipart) -> AppResult<Option<Upload>> {
        while let Some(field) = multipart.next_field().await? {
            if field.name() != Some("file") {
                continue;
            }

            let name = field.file_name().unwrap_or("upload").to_owned();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let bytes = field.bytes().await?;

            return Ok(Some(Upload::new(name, content_type, bytes)));
        }

        Ok(None)
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// Base64 work runs on the blocking pool so large pictures don't stall the runtime.
    pub async fn decode_data_url(self) -> anyhow::Result<String> {
        Ok(tokio::task::spawn_blocking(move || self.to_data_url()).await?)
    }
}

/// Reference to a registered upload, usable as an image `src` or link `href`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRef {
    pub id: Uuid,
    pub name: String,
    pub size: usize,
    pub url: String,
}

#[derive(Default)]
pub struct ObjectStore {
    objects: HashMap<Uuid, Upload>,
}

impl ObjectStore {
    pub fn register(&mut self, upload: Upload) -> ObjectRef {
        let id = Uuid::now_v7();
        let object = ObjectRef {
            id,
            name: upload.name.clone(),
            size: upload.size(),
            url: format!("/files/{id}"),
        };
        tracing::debug!(%id, name = %object.name, size = object.size, "registered upload");

        self.objects.insert(id, upload);
        object
    }

    pub fn get(&self, id: &Uuid) -> Option<&Upload> {
        self.objects.get(id)
    }

    /// Forgets the object behind a `/files/{id}` url. Anything else is ignored.
    pub fn release(&mut self, url: &str) -> Option<Upload> {
        let id = url.strip_prefix("/files/")?.parse::<Uuid>().ok()?;
        let upload = self.objects.remove(&id)?;
        tracing::debug!(%id, name = %upload.name, "released upload");

        Some(upload)
    }
}

/// A background decode aimed at one specific draft instance.
pub struct DecodeTask {
    target: Uuid,
    handle: JoinHandle<()>,
}

impl DecodeTask {
    pub fn new(target: Uuid, handle: JoinHandle<()>) -> Self {
        Self { target, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(self) {
        tracing::debug!(target_draft = %self.target, "cancelling decode");
        self.handle.abort();
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn file(
    State(objects): State<Shared<ObjectStore>>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let objects = objects.lock().await;
    let Some(upload) = objects.get(&id) else {
        return res::sorry("file");
    };

    let mut response = (
        [(header::CONTENT_TYPE, upload.content_type.clone())],
        upload.bytes.clone(),
    ).into_response();

    let headers = response.headers_mut();
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    if !upload.is_inline_image() {
        headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static("attachment"));
    }

    Ok(response)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_data_url_uses_padded_base64() {
        let upload = Upload::new("dot.png", "image/png", b"hi!?".to_vec());

        assert_eq!(upload.to_data_url(), "data:image/png;base64,aGkhPw==");
        assert_eq!(upload.size(), 4);
    }

    #[test]
    fn test_register_hands_out_file_urls() {
        let mut objects = ObjectStore::default();
        let object = objects.register(Upload::new("notes.pdf", "application/pdf", vec![1, 2, 3]));

        assert_eq!(object.name, "notes.pdf");
        assert_eq!(object.size, 3);
        assert_eq!(object.url, format!("/files/{}", object.id));
        assert_eq!(objects.get(&object.id).map(|u| u.content_type.as_str()), Some("application/pdf"));
    }

    #[test]
    fn test_release_only_takes_file_urls() {
        let mut objects = ObjectStore::default();
        let object = objects.register(Upload::new("cat.jpg", "image/jpeg", vec![0xff]));

        assert!(objects.release("https://via.placeholder.com/150").is_none());
        assert!(objects.release("/files/not-a-uuid").is_none());
        assert_eq!(objects.release(&object.url).map(|u| u.name), Some("cat.jpg".to_string()));
        assert!(objects.get(&object.id).is_none());
        assert!(objects.release(&object.url).is_none());
    }

    #[test]
    fn test_only_raster_images_are_inline() {
        assert!(Upload::new("a.png", "image/png", vec![]).is_inline_image());
        assert!(!Upload::new("a.svg", "image/svg+xml", vec![]).is_inline_image());
        assert!(!Upload::new("a.html", "text/html", vec![]).is_inline_image());
    }

    #[tokio::test]
    async fn test_decode_runs_off_the_runtime() {
        let upload = Upload::new("a.txt", "text/plain", b"abc".to_vec());

        let url = upload.decode_data_url().await.unwrap();
        assert_eq!(url, "data:text/plain;base64,YWJj");
    }
}
