//! Upload orchestration
//!
//! Validation, temp storage, transcoding, URL publication and cleanup for a
//! single upload. Requests share nothing mutable; the pipeline is cheap to
//! clone and can be driven from any number of tasks at once.

pub mod request;
pub mod storage;
pub mod urls;

pub use request::{AssetCategory, Dimensions, OptimizedPublicResult, UploadRequest};
pub use storage::TempUpload;
pub use urls::{filename_from_url, public_url};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::metrics::UploadMetrics;
use crate::transcode::{ImageCodec, OptimizedImageResult, RasterCodec, Transcoder};
use crate::validation::{
    check_base_name, check_stored_name, ValidationOutcome, ValidationPolicy, Validator,
};

/// `{utc millis}_{uuid}`: unique per request, sortable by arrival
pub fn generate_request_id() -> String {
    format!(
        "{}_{}",
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// Ingestion pipeline for untrusted image uploads
pub struct UploadPipeline<C: ImageCodec + 'static = RasterCodec> {
    config: Arc<UploadConfig>,
    validator: Arc<Validator>,
    transcoder: Arc<Transcoder<C>>,
    transcode_permits: Arc<Semaphore>,
}

impl<C: ImageCodec + 'static> Clone for UploadPipeline<C> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            validator: Arc::clone(&self.validator),
            transcoder: Arc::clone(&self.transcoder),
            transcode_permits: Arc::clone(&self.transcode_permits),
        }
    }
}

impl UploadPipeline<RasterCodec> {
    /// Pipeline backed by the default raster codec
    pub fn new(config: UploadConfig) -> Self {
        let codec = RasterCodec::new().with_max_pixels(config.pipeline.max_source_pixels);
        Self::with_codec(config, codec)
    }
}

impl<C: ImageCodec + 'static> UploadPipeline<C> {
    pub fn with_codec(config: UploadConfig, codec: C) -> Self {
        let permits = config.pipeline.max_concurrent_transcodes.max(1);
        Self {
            validator: Arc::new(Validator::new(ValidationPolicy::from(&config.limits))),
            transcoder: Arc::new(Transcoder::new(codec)),
            transcode_permits: Arc::new(Semaphore::new(permits)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Run validation alone; touches nothing on disk
    pub fn validate_only(&self, request: &UploadRequest) -> ValidationOutcome {
        self.validator.validate(
            &request.data,
            &request.filename,
            &request.mime,
            request.size(),
        )
    }

    /// Create the storage root, temp and category directories if missing
    pub async fn ensure_directories(&self) -> Result<(), UploadError> {
        let storage = &self.config.storage;
        for dir in [
            storage.root().to_path_buf(),
            storage.temp_dir(),
            storage.avatars_dir(),
            storage.recipes_dir(),
        ] {
            storage::ensure_dir(&dir).await?;
        }
        Ok(())
    }

    /// Validate, transcode and publish one upload.
    ///
    /// The temp copy of the upload is gone by the time this returns, whatever
    /// the outcome.
    pub async fn process(
        &self,
        request: UploadRequest,
    ) -> Result<OptimizedPublicResult, UploadError> {
        let request_id = generate_request_id();
        let category = request.category;
        let span = tracing::info_span!(
            "upload",
            request_id = %request_id,
            category = %category
        );

        let result = self.run(request_id, request).instrument(span).await;

        let metrics = UploadMetrics::global();
        match &result {
            Ok(published) => {
                metrics.record_outcome(category.as_str(), "success");
                metrics.record_savings(
                    category.as_str(),
                    published.original_size,
                    published.optimized_size,
                );
            }
            Err(e) if e.is_client_error() => {
                metrics.record_outcome(category.as_str(), "rejected");
                metrics.record_rejection(e.kind().as_str());
            }
            Err(_) => metrics.record_outcome(category.as_str(), "failed"),
        }

        result
    }

    async fn run(
        &self,
        request_id: String,
        request: UploadRequest,
    ) -> Result<OptimizedPublicResult, UploadError> {
        let format = self.validate_only(&request).map_err(|rejection| {
            tracing::warn!(
                kind = rejection.label(),
                size = request.size(),
                reason = %rejection,
                "Upload rejected"
            );
            UploadError::from(rejection)
        })?;

        let base_name = match &request.base_name {
            Some(name) => {
                check_base_name(name).map_err(UploadError::InvalidName)?;
                name.clone()
            }
            None => request_id.clone(),
        };

        tracing::info!(
            size = request.size(),
            format = %format,
            "Upload accepted"
        );

        let temp = TempUpload::write(
            &self.config.storage.temp_dir(),
            &format!("{}.{}", request_id, format.extension()),
            request.data.clone(),
        )
        .await?;

        let category = request.category;
        let dest_dir = category.directory(&self.config.storage);
        storage::ensure_dir(&dest_dir).await?;

        let outcome = self
            .transcode(
                temp.path().to_path_buf(),
                dest_dir,
                &request_id,
                &base_name,
                category,
                request.deadline,
            )
            .await;
        drop(temp);

        let optimized = outcome.map_err(|e| {
            tracing::error!(error = %e, kind = %e.kind(), "Transcode failed");
            e
        })?;

        let published = self.publish(category, &base_name, optimized);
        tracing::info!(
            original_size = published.original_size,
            optimized_size = published.optimized_size,
            compression_ratio = published.compression_ratio,
            width = published.dimensions.width,
            height = published.dimensions.height,
            "Upload processed"
        );
        Ok(published)
    }

    /// Run the transcoder on the blocking pool, bounded by the permit
    /// semaphore and the request (or configured) deadline.
    ///
    /// Derivatives are rendered under a request-unique staging name and
    /// renamed onto `base_name` only once the whole transform succeeded in
    /// time, so a failed upload never touches files already published under
    /// that name.
    async fn transcode(
        &self,
        source: PathBuf,
        dest_dir: PathBuf,
        request_id: &str,
        base_name: &str,
        category: AssetCategory,
        deadline: Option<Duration>,
    ) -> Result<OptimizedImageResult, UploadError> {
        let permit = Arc::clone(&self.transcode_permits)
            .acquire_owned()
            .await
            .map_err(|e| UploadError::WorkerFailed(e.to_string()))?;

        let profile = category.profile();
        let staging = storage::staging_base_name(request_id);
        let transcoder = Arc::clone(&self.transcoder);
        let started = Instant::now();

        let mut handle: JoinHandle<Result<OptimizedImageResult, UploadError>> = {
            let dest_dir = dest_dir.clone();
            let staging = staging.clone();
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let result = transcoder
                    .transform_with_thumbnail(&source, &dest_dir, &staging, profile)
                    .and_then(|optimized| {
                        // temp guard already dropped: nobody is waiting for this output
                        if source.exists() {
                            Ok(optimized)
                        } else {
                            Err(UploadError::WorkerFailed("request abandoned".to_string()))
                        }
                    });
                if result.is_err() {
                    storage::remove_derivatives(&dest_dir, &staging, profile);
                }
                result
            })
        };

        let joined = match deadline.or_else(|| self.config.pipeline.transcode_timeout()) {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    // blocking work cannot be interrupted; discard its output once it lands
                    let dest_dir = dest_dir.clone();
                    tokio::spawn(async move {
                        if let Ok(Ok(_)) = handle.await {
                            let _ = tokio::task::spawn_blocking(move || {
                                storage::remove_derivatives(&dest_dir, &staging, profile)
                            })
                            .await;
                        }
                    });
                    return Err(UploadError::Timeout {
                        timeout_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => handle.await,
        };

        let mut optimized = joined.map_err(|e| UploadError::WorkerFailed(e.to_string()))??;
        UploadMetrics::global()
            .observe_transcode(category.as_str(), started.elapsed().as_secs_f64());

        let published = base_name.to_string();
        let commit_dir = dest_dir.clone();
        tokio::task::spawn_blocking(move || {
            storage::commit_derivatives(&commit_dir, &staging, &published, profile)
        })
        .await
        .map_err(|e| UploadError::WorkerFailed(e.to_string()))??;

        optimized.main_path = dest_dir.join(profile.output_filename(base_name));
        optimized.thumbnail_path = profile
            .thumbnail
            .filter(|_| optimized.thumbnail_path.is_some())
            .map(|thumb| dest_dir.join(thumb.output_filename(base_name)));
        Ok(optimized)
    }

    fn publish(
        &self,
        category: AssetCategory,
        base_name: &str,
        optimized: OptimizedImageResult,
    ) -> OptimizedPublicResult {
        let base_url = self.config.public_url.base_url();
        let profile = category.profile();

        OptimizedPublicResult {
            optimized_url: public_url(&base_url, category, &profile.output_filename(base_name)),
            thumbnail_url: profile
                .thumbnail
                .filter(|_| optimized.thumbnail_path.is_some())
                .map(|thumb| public_url(&base_url, category, &thumb.output_filename(base_name))),
            original_size: optimized.original_size,
            optimized_size: optimized.optimized_size,
            compression_ratio: optimized.compression_ratio,
            dimensions: Dimensions {
                width: optimized.width,
                height: optimized.height,
            },
        }
    }

    /// Stored file name for a URL previously returned by [`Self::process`].
    ///
    /// The URL path must end in `{path_prefix}/{category}/{file_name}`;
    /// query strings and fragments are ignored.
    pub fn filename_from_url(&self, url: &str) -> Option<String> {
        let path = urls::url_path(url);
        let (dir, file_name) = path.rsplit_once('/')?;
        let (parent, category) = dir.rsplit_once('/')?;

        let prefix = self.config.public_url.path_prefix.trim_end_matches('/');
        let known = [AssetCategory::Avatar, AssetCategory::Recipe]
            .iter()
            .any(|c| c.as_str() == category);
        if !known || !parent.ends_with(prefix) {
            return None;
        }
        filename_from_url(file_name)
    }

    /// Delete a stored asset and, when its category has one, the thumbnail
    /// next to it. Missing files are not an error.
    pub async fn delete_asset(
        &self,
        category: AssetCategory,
        file_name: &str,
    ) -> Result<(), UploadError> {
        check_stored_name(file_name).map_err(UploadError::InvalidName)?;

        let dir = category.directory(&self.config.storage);
        let mut targets = vec![dir.join(file_name)];
        if let Some(thumbnail) = category.profile().thumbnail {
            targets.push(dir.join(storage::thumbnail_name(file_name, thumbnail.suffix)));
        }

        tokio::task::spawn_blocking(move || {
            for path in &targets {
                let removed = storage::remove_if_exists(path)
                    .map_err(|e| UploadError::io("deleting asset", e))?;
                tracing::debug!(path = %path.display(), removed, "Asset delete");
            }
            Ok::<(), UploadError>(())
        })
        .await
        .map_err(|e| UploadError::WorkerFailed(e.to_string()))?
    }
}
