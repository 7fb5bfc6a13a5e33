//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Geometry used when a button is created from the UI
pub mod layout {
    /// Default width of a freshly created button
    pub const DEFAULT_WIDTH: f64 = 100.0;

    /// Default height of a freshly created button
    pub const DEFAULT_HEIGHT: f64 = 50.0;

    /// Left offset of the column new buttons spawn in
    pub const SPAWN_X: f64 = 50.0;

    /// Vertical step between new buttons (y = id * step)
    pub const SPAWN_Y_STEP: f64 = 50.0;
}

/// Button labels
pub mod labels {
    /// Placeholder label prefix, followed by the button id
    pub const PLACEHOLDER_PREFIX: &str = "Drag/Resize";

    /// Separator between label and annotation in the list view
    pub const LIST_SEPARATOR: &str = " - ";
}

/// Identifier wire format
pub mod ids {
    /// Legacy key shape written by older clients ("dynamic-button-<id>")
    pub const LEGACY_PREFIX: &str = "dynamic-button-";
}

/// Persistence file locations
pub mod storage {
    /// Application directory under the platform data dir
    pub const APP_DIR: &str = "map-markers";

    /// File holding every button record
    pub const FILENAME: &str = "buttons_data.json";

    /// Extension appended when a corrupt file is set aside
    pub const BACKUP_SUFFIX: &str = "bak";

    /// Extension of the sibling file written before the atomic rename
    pub const TEMP_SUFFIX: &str = "tmp";
}

/// HTTP server defaults and messages
pub mod http {
    /// Default bind address
    pub const DEFAULT_BIND: &str = "127.0.0.1";

    /// Default port
    pub const DEFAULT_PORT: u16 = 8050;

    /// Error reported when a sync request carries no usable JSON object
    pub const NO_DATA_MESSAGE: &str = "No JSON data provided";

    /// Upper bound on a sync request body (1 MB)
    pub const MAX_BODY_SIZE: usize = 1024 * 1024;
}
