// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "datarecord";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "datarecord.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "DATARECORD_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "DATARECORD_LOG";

/// Environment variable for the database file (unset = in-memory)
pub const ENV_DATABASE: &str = "DATARECORD_DATABASE";

/// Environment variable for the reconciliation scan cap
pub const ENV_MAX_SCAN_ROWS: &str = "DATARECORD_MAX_SCAN_ROWS";

// =============================================================================
// Record Storage
// =============================================================================

/// Primary key field added to every class that does not declare one
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Column holding the JSON blob for metadata-stored fields
pub const METADATA_COLUMN: &str = "metadata";

// =============================================================================
// Filter Engine
// =============================================================================

/// Default cap on rows fetched by one reconciliation run
pub const DEFAULT_MAX_SCAN_ROWS: usize = 100_000;

/// Smallest SQL window used once a reconciliation run needs another round
pub const RECONCILE_MIN_WINDOW: usize = 1000;

/// Maximum size of filter JSON in bytes (64KB)
pub const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum nesting of sub-filters inside InFilter conditions
pub const MAX_SUBFILTER_DEPTH: usize = 8;
