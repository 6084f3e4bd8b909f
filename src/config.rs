use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "RxPad";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filename of the header banner drawn at the top of every prescription.
pub const HEADER_BANNER_FILE: &str = "pre-header.png";

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Get the application data directory
/// ~/RxPad/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("RxPad")
}

/// Get the assets directory (header banner)
pub fn assets_dir() -> PathBuf {
    app_data_dir().join("assets")
}

/// Path of the header banner image. Its absence is a configuration
/// error surfaced at load time, not at export time.
pub fn header_banner_path() -> PathBuf {
    assets_dir().join(HEADER_BANNER_FILE)
}

/// Get the exports directory for generated prescriptions
pub fn exports_dir() -> PathBuf {
    app_data_dir().join("exports")
}
