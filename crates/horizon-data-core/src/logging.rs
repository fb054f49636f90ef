//! Logging facilities for Horizon Data.
//!
//! Horizon Data uses the `tracing` crate for instrumentation. The library
//! never installs a subscriber; to see logs, install one in your
//! application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_data=debug")
//!         .init();
//! }
//! ```
//!
//! The constants below name the targets and spans used across the
//! workspace so they can be used in filter directives.

/// Span names used throughout Horizon Data for tracing.
pub mod span_names {
    /// Size recomputation span.
    pub const SIZE_REFRESH: &str = "horizon_data::size_refresh";
    /// Paged item fetch span.
    pub const FETCH: &str = "horizon_data::fetch";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core primitives target.
    pub const CORE: &str = "horizon_data_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_data_core::signal";
    /// Data provider target.
    pub const PROVIDER: &str = "horizon_data::provider";
    /// Data component (binding, filter, listener) target.
    pub const COMPONENT: &str = "horizon_data::component";
    /// Data view target.
    pub const VIEW: &str = "horizon_data::view";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_are_prefixed() {
        for target in [
            targets::SIGNAL,
            targets::PROVIDER,
            targets::COMPONENT,
            targets::VIEW,
        ] {
            assert!(target.starts_with("horizon_data"));
        }
        assert!(targets::SIGNAL.starts_with(targets::CORE));
    }
}
