// Constants module - centralized default values for configuration
//
// Limits, directory names and URL fragments used as defaults by the
// config layer. Call sites read them through `UploadConfig`, never directly.

// =============================================================================
// Upload limits
// =============================================================================

/// Smallest accepted upload (1 KiB); anything below is treated as empty/corrupt
pub const DEFAULT_MIN_FILE_SIZE: usize = 1024;

/// Largest accepted upload (5 MiB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Number of leading bytes inspected by the malicious text-pattern scan
pub const DEFAULT_TEXT_SCAN_WINDOW: usize = 8 * 1024;

/// Maximum filename length in characters
pub const DEFAULT_MAX_FILENAME_LENGTH: usize = 255;

// =============================================================================
// Storage layout
// =============================================================================

/// Root of the upload tree
pub const DEFAULT_STORAGE_ROOT: &str = "./uploads";

/// Scratch directory for in-flight uploads, relative to the root
pub const TEMP_DIR_NAME: &str = "temp";

/// Avatar derivatives, relative to the root
pub const AVATARS_DIR_NAME: &str = "avatars";

/// Recipe derivatives (main + thumbnail), relative to the root
pub const RECIPES_DIR_NAME: &str = "recipes";

// =============================================================================
// Public URLs
// =============================================================================

/// Path under which stored assets are served
pub const DEFAULT_PUBLIC_PATH_PREFIX: &str = "/api/v1/uploads";

/// Origin used when running locally
pub const DEFAULT_DEVELOPMENT_ORIGIN: &str = "http://localhost:3000";

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log level when RUST_LOG is not set
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Transcoding
// =============================================================================

/// Decoded pixel ceiling (decompression bomb protection, 100 megapixels)
pub const DEFAULT_MAX_SOURCE_PIXELS: u64 = 100_000_000;
