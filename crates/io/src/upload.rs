// Batched upload of matched images to a caller-supplied blob store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use shelfline_core::config::UploadConfig;

use crate::error::UploadError;
use crate::matcher::MatchedImage;

/// Opaque object storage. Returns the public URL of the stored object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, UploadError>;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    /// Code → URL for every successful upload.
    pub urls: BTreeMap<String, String>,
    /// Codes whose upload failed.
    pub failed: Vec<String>,
}

/// Object key for a product image.
pub fn object_key(prefix: &str, code: &str, extension: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("{}.{}", code, extension)
    } else {
        format!("{}/{}.{}", prefix, code, extension)
    }
}

/// Upload in fixed-width batches, each awaited in full before the next
/// starts. A failed upload is logged and left out of the URL map; it never
/// aborts the batch. `progress` receives `(completed, total)` after each batch.
pub async fn upload_matched<S, F>(
    store: &S,
    matched: &[MatchedImage],
    prefix: &str,
    cfg: &UploadConfig,
    mut progress: F,
) -> UploadReport
where
    S: BlobStore + ?Sized,
    F: FnMut(usize, usize),
{
    let total = matched.len();
    let width = cfg.concurrency.max(1);
    let mut report = UploadReport::default();
    let mut completed = 0;

    for batch in matched.chunks(width) {
        let futures: Vec<_> = batch
            .iter()
            .map(|m| {
                let key = object_key(prefix, &m.code, m.image.format.extension());
                async move {
                    let result = store.upload(&key, &m.image.bytes, m.image.format.content_type()).await;
                    (m.code.as_str(), result)
                }
            })
            .collect();

        for (code, result) in join_all(futures).await {
            match result {
                Ok(url) => {
                    report.urls.insert(code.to_string(), url);
                }
                Err(e) => {
                    log::warn!("image upload for {} failed, skipping: {}", code, e);
                    report.failed.push(code.to_string());
                }
            }
        }

        completed += batch.len();
        progress(completed, total);
    }

    log::info!(
        "uploaded {}/{} image(s) in {} batch(es), {} failed",
        report.urls.len(),
        total,
        total.div_ceil(width),
        report.failed.len()
    );
    report
}
