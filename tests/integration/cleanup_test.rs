//! Temp-file cleanup and transcode deadline tests

use super::fixtures::*;
use platter::error::ErrorKind;
use platter::metrics::UploadMetrics;
use platter::pipeline::{AssetCategory, UploadPipeline, UploadRequest};
use platter::transcode::{
    CodecError, DecodedImage, EncodeOptions, FitMode, ImageCodec, OutputFormat, RasterCodec,
};
use platter::UploadError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Raster codec that, while decoding, swaps every temp file for a non-empty
/// directory of the same name so the temp guard cannot remove it
struct PinningCodec {
    inner: RasterCodec,
    temp_dir: PathBuf,
}

impl ImageCodec for PinningCodec {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, CodecError> {
        for entry in fs::read_dir(&self.temp_dir).unwrap() {
            let path = entry.unwrap().path();
            fs::remove_file(&path).unwrap();
            fs::create_dir(&path).unwrap();
            fs::write(path.join("pinned"), b"x").unwrap();
        }
        self.inner.decode(data)
    }

    fn resize(
        &self,
        image: &DecodedImage,
        width: Option<u32>,
        height: Option<u32>,
        fit: FitMode,
    ) -> Result<DecodedImage, CodecError> {
        self.inner.resize(image, width, height, fit)
    }

    fn encode(
        &self,
        image: &DecodedImage,
        format: OutputFormat,
        options: EncodeOptions,
    ) -> Result<Vec<u8>, CodecError> {
        self.inner.encode(image, format, options)
    }

    fn dimensions(&self, data: &[u8]) -> Result<(u32, u32), CodecError> {
        self.inner.dimensions(data)
    }
}

fn read_all(dir: &Path) -> Vec<(String, Vec<u8>)> {
    files_in(dir)
        .into_iter()
        .map(|name| {
            let bytes = fs::read(dir.join(&name)).unwrap();
            (name, bytes)
        })
        .collect()
}

async fn publish_cover(pipeline: &UploadPipeline) {
    pipeline
        .process(
            UploadRequest::new(
                valid_jpeg(600, 400, 90),
                "cover.jpg",
                "image/jpeg",
                AssetCategory::Recipe,
            )
            .with_base_name("recipe_17_cover"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_temp_file_removed_after_success() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));

    pipeline
        .process(UploadRequest::new(
            valid_jpeg(320, 240, 90),
            "photo.jpg",
            "image/jpeg",
            AssetCategory::Avatar,
        ))
        .await
        .unwrap();

    let temp = uploads(dir.path()).join("temp");
    assert!(temp.exists());
    assert!(files_in(&temp).is_empty());
}

#[tokio::test]
async fn test_temp_file_removed_after_transcode_failure() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));

    let err = pipeline
        .process(UploadRequest::new(
            undecodable_jpeg(),
            "photo.jpg",
            "image/jpeg",
            AssetCategory::Recipe,
        ))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TranscodeFailure);
    assert!(matches!(err, UploadError::Transcode(_)));
    assert_eq!(err.to_http_status(), 422);
    assert!(!err.public_message().contains("temp"));

    assert!(files_in(&uploads(dir.path()).join("temp")).is_empty());
    assert!(files_in(&uploads(dir.path()).join("recipes")).is_empty());
}

#[tokio::test]
async fn test_image_bomb_is_transcode_failure() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.pipeline.max_source_pixels = 10_000;
    let pipeline = UploadPipeline::new(config);

    let err = pipeline
        .process(UploadRequest::new(
            valid_jpeg(200, 200, 90),
            "photo.jpg",
            "image/jpeg",
            AssetCategory::Avatar,
        ))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TranscodeFailure);
    assert!(files_in(&uploads(dir.path()).join("temp")).is_empty());
}

#[tokio::test]
async fn test_deadline_exceeded_is_transcode_failure_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));

    // large, cheap to ship, expensive to decode
    let data = encode_jpeg(&gradient(3000, 2000), 90);

    let err = pipeline
        .process(
            UploadRequest::new(data, "big.jpg", "image/jpeg", AssetCategory::Recipe)
                .with_deadline(Duration::from_millis(1)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Timeout { timeout_ms: 1 }));
    assert_eq!(err.kind(), ErrorKind::TranscodeFailure);
    assert!(files_in(&uploads(dir.path()).join("temp")).is_empty());

    // the abandoned transcode's output is discarded once it finishes
    let recipes = uploads(dir.path()).join("recipes");
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if files_in(&recipes).is_empty() {
            break;
        }
    }
    assert!(files_in(&recipes).is_empty());
}

#[tokio::test]
async fn test_configured_timeout_applies_without_request_deadline() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.pipeline.transcode_timeout_ms = Some(1);
    let pipeline = UploadPipeline::new(config);

    let err = pipeline
        .process(UploadRequest::new(
            encode_jpeg(&gradient(3000, 2000), 90),
            "big.jpg",
            "image/jpeg",
            AssetCategory::Avatar,
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Timeout { .. }));
    assert_eq!(err.to_http_status(), 504);
}

#[tokio::test]
async fn test_generous_deadline_does_not_interfere() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));

    let result = pipeline
        .process(
            UploadRequest::new(
                valid_jpeg(320, 240, 90),
                "photo.jpg",
                "image/jpeg",
                AssetCategory::Avatar,
            )
            .with_deadline(Duration::from_secs(60)),
        )
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cancelled_request_still_removes_temp_file() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));

    let request = UploadRequest::new(
        encode_jpeg(&gradient(3000, 2000), 90),
        "big.jpg",
        "image/jpeg",
        AssetCategory::Recipe,
    );

    // dropping the future drops the temp guard with it; a write still on
    // the blocking pool drops its guard as soon as it finishes
    let outcome = tokio::time::timeout(Duration::from_millis(5), pipeline.process(request)).await;
    assert!(outcome.is_err());

    let temp = uploads(dir.path()).join("temp");
    let recipes = uploads(dir.path()).join("recipes");
    for _ in 0..100 {
        if files_in(&temp).is_empty() && files_in(&recipes).is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(files_in(&temp).is_empty());
    assert!(files_in(&recipes).is_empty());
}

#[tokio::test]
async fn test_failed_reupload_keeps_published_asset() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));
    let recipes = uploads(dir.path()).join("recipes");

    publish_cover(&pipeline).await;
    let published = read_all(&recipes);
    assert_eq!(
        files_in(&recipes),
        vec!["recipe_17_cover.jpg", "recipe_17_cover_thumb.jpg"]
    );

    let err = pipeline
        .process(
            UploadRequest::new(
                undecodable_jpeg(),
                "cover.jpg",
                "image/jpeg",
                AssetCategory::Recipe,
            )
            .with_base_name("recipe_17_cover"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TranscodeFailure);

    assert_eq!(read_all(&recipes), published);
}

#[tokio::test]
async fn test_timed_out_reupload_keeps_published_asset() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.pipeline.max_concurrent_transcodes = 1;
    let pipeline = UploadPipeline::new(config);
    let recipes = uploads(dir.path()).join("recipes");

    publish_cover(&pipeline).await;
    let published = read_all(&recipes);

    let err = pipeline
        .process(
            UploadRequest::new(
                encode_jpeg(&gradient(3000, 2000), 90),
                "cover.jpg",
                "image/jpeg",
                AssetCategory::Recipe,
            )
            .with_base_name("recipe_17_cover")
            .with_deadline(Duration::from_millis(1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Timeout { .. }));

    // the single permit is held until the abandoned transcode finishes
    pipeline
        .process(UploadRequest::new(
            valid_jpeg(320, 240, 90),
            "me.jpg",
            "image/jpeg",
            AssetCategory::Avatar,
        ))
        .await
        .unwrap();

    for _ in 0..50 {
        if files_in(&recipes).iter().all(|name| !name.starts_with('.')) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(read_all(&recipes), published);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_uploads_sharing_a_base_name() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));

    let good = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { publish_cover(&pipeline).await })
    };
    let bad = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline
                .process(
                    UploadRequest::new(
                        undecodable_jpeg(),
                        "cover.jpg",
                        "image/jpeg",
                        AssetCategory::Recipe,
                    )
                    .with_base_name("recipe_17_cover"),
                )
                .await
        })
    };

    good.await.unwrap();
    assert!(bad.await.unwrap().is_err());

    assert_eq!(
        files_in(&uploads(dir.path()).join("recipes")),
        vec!["recipe_17_cover.jpg", "recipe_17_cover_thumb.jpg"]
    );
}

#[tokio::test]
async fn test_undeletable_temp_file_does_not_fail_the_upload() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());
    let temp_dir = config.storage.temp_dir();
    let codec = PinningCodec {
        inner: RasterCodec::new(),
        temp_dir: temp_dir.clone(),
    };
    let pipeline = UploadPipeline::with_codec(config, codec);

    let failures = &UploadMetrics::global().temp_cleanup_failures;
    let before = failures.get();

    let result = pipeline
        .process(UploadRequest::new(
            valid_jpeg(320, 240, 90),
            "photo.jpg",
            "image/jpeg",
            AssetCategory::Avatar,
        ))
        .await;

    assert!(result.is_ok(), "{:?}", result.err());
    assert!(failures.get() > before);
    // the pinned entry is still there; the upload reported success anyway
    assert_eq!(files_in(&temp_dir).len(), 1);
    assert_eq!(files_in(&uploads(dir.path()).join("avatars")).len(), 1);
}
