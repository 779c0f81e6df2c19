//! Subcommand handlers.

/// `bbcli login`.
pub(crate) mod login;
/// `bbcli logout`.
pub(crate) mod logout;
/// `bbcli refresh`.
pub(crate) mod refresh;
/// `bbcli status`.
pub(crate) mod status;
/// `bbcli whoami`.
pub(crate) mod whoami;
