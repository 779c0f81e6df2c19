//! Compile-time build metadata exposed to CLI surfaces.

/// Semver package version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// VCS commit hash captured at build time.
pub const GIT_COMMIT: &str = env!("BBCLI_BUILD_GIT_HASH");

/// OAuth consumer id baked in by the release build (empty for dev builds).
pub(crate) const DEFAULT_CLIENT_ID: &str = env!("BBCLI_DEFAULT_CLIENT_ID");

/// OAuth consumer secret baked in by the release build (empty for dev builds).
pub(crate) const DEFAULT_CLIENT_SECRET: &str = env!("BBCLI_DEFAULT_CLIENT_SECRET");

/// Version line printed by `bbcli --version`.
pub const CLI_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("BBCLI_BUILD_GIT_HASH"),
    ")"
);
