//! Concurrent uploads through one shared pipeline

use super::fixtures::*;
use platter::pipeline::{AssetCategory, UploadPipeline, UploadRequest};
use std::collections::HashSet;
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_uploads_get_distinct_outputs() {
    let dir = TempDir::new().unwrap();
    let pipeline = UploadPipeline::new(config_in(dir.path()));
    let photo = valid_jpeg(640, 480, 90);

    let mut handles = Vec::new();
    for i in 0..6 {
        let pipeline = pipeline.clone();
        let data = photo.clone();
        let category = if i % 2 == 0 {
            AssetCategory::Recipe
        } else {
            AssetCategory::Avatar
        };
        handles.push(tokio::spawn(async move {
            pipeline
                .process(UploadRequest::new(data, "photo.jpg", "image/jpeg", category))
                .await
        }));
    }

    let mut urls = HashSet::new();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert!(urls.insert(result.optimized_url));
    }
    assert_eq!(urls.len(), 6);

    let root = uploads(dir.path());
    assert!(files_in(&root.join("temp")).is_empty());
    assert_eq!(files_in(&root.join("avatars")).len(), 3);
    // main + thumbnail per recipe
    assert_eq!(files_in(&root.join("recipes")).len(), 6);
}
