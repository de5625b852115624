//! Stored-asset management: directory setup, URL parsing, deletion

use super::fixtures::*;
use platter::error::ErrorKind;
use platter::pipeline::{AssetCategory, UploadPipeline, UploadRequest};
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_ensure_directories_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));

    pipeline.ensure_directories().await.unwrap();
    let root = uploads(dir.path());
    for sub in ["temp", "avatars", "recipes"] {
        assert!(root.join(sub).is_dir(), "{} missing", sub);
    }

    fs::write(root.join("avatars").join("keep.jpg"), b"x").unwrap();
    pipeline.ensure_directories().await.unwrap();
    assert!(root.join("avatars").join("keep.jpg").exists());
}

#[tokio::test]
async fn test_issued_url_round_trips_to_delete() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));

    let result = pipeline
        .process(UploadRequest::new(
            valid_jpeg(600, 400, 90),
            "dish.jpg",
            "image/jpeg",
            AssetCategory::Recipe,
        ))
        .await
        .unwrap();

    let recipes = uploads(dir.path()).join("recipes");
    assert_eq!(files_in(&recipes).len(), 2);

    let file_name = pipeline.filename_from_url(&result.optimized_url).unwrap();
    pipeline
        .delete_asset(AssetCategory::Recipe, &file_name)
        .await
        .unwrap();

    assert!(files_in(&recipes).is_empty());
}

#[tokio::test]
async fn test_avatar_delete_leaves_thumb_named_sibling() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));
    pipeline.ensure_directories().await.unwrap();

    let avatars = uploads(dir.path()).join("avatars");
    fs::write(avatars.join("u1.jpg"), b"x").unwrap();
    fs::write(avatars.join("u1_thumb.jpg"), b"x").unwrap();

    pipeline
        .delete_asset(AssetCategory::Avatar, "u1.jpg")
        .await
        .unwrap();

    assert_eq!(files_in(&avatars), vec!["u1_thumb.jpg".to_string()]);
}

#[tokio::test]
async fn test_delete_missing_asset_is_ok() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));
    pipeline.ensure_directories().await.unwrap();

    pipeline
        .delete_asset(AssetCategory::Recipe, "never_uploaded.jpg")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_rejects_escaping_names() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));

    for name in ["../config.yaml", "a/b.jpg", ".hidden", ""] {
        let err = pipeline
            .delete_asset(AssetCategory::Avatar, name)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FilenameInvalid, "{:?}", name);
    }
}

#[test]
fn test_foreign_urls_are_not_ours() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));

    assert_eq!(
        pipeline.filename_from_url("https://example.com/images/avatar/x.jpg"),
        None
    );
    assert_eq!(
        pipeline.filename_from_url("http://localhost:3000/api/v1/uploads/avatar/.."),
        None
    );
}
