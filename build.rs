//! Build-script metadata injection for CLI/version surfaces and the OAuth
//! consumer credentials baked into release binaries.
//!
//! When git tooling or the credential variables are unavailable we fall back
//! to "unknown" markers and empty credentials respectively.

use std::env;
use std::fs;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    emit_head_ref_watch();
    println!("cargo:rerun-if-env-changed=BBCLI_BUILD_GIT_HASH");
    println!("cargo:rerun-if-env-changed=BBCLI_DEFAULT_CLIENT_ID");
    println!("cargo:rerun-if-env-changed=BBCLI_DEFAULT_CLIENT_SECRET");

    let git_hash = env::var("BBCLI_BUILD_GIT_HASH").unwrap_or_else(|_| git_short_hash());
    println!("cargo:rustc-env=BBCLI_BUILD_GIT_HASH={git_hash}");

    // Release pipelines export these so users do not need their own OAuth consumer.
    let client_id = env::var("BBCLI_DEFAULT_CLIENT_ID").unwrap_or_default();
    let client_secret = env::var("BBCLI_DEFAULT_CLIENT_SECRET").unwrap_or_default();
    println!("cargo:rustc-env=BBCLI_DEFAULT_CLIENT_ID={}", client_id.trim());
    println!(
        "cargo:rustc-env=BBCLI_DEFAULT_CLIENT_SECRET={}",
        client_secret.trim()
    );
}

fn emit_head_ref_watch() {
    // Track the current branch ref so commit-hash changes trigger rebuilds.
    let Ok(head) = fs::read_to_string(".git/HEAD") else {
        return;
    };
    let trimmed = head.trim();
    let Some(reference) = trimmed.strip_prefix("ref: ") else {
        return;
    };
    println!("cargo:rerun-if-changed=.git/{reference}");
}

fn git_short_hash() -> String {
    run_cmd("git", &["rev-parse", "--short=12", "HEAD"]).unwrap_or_else(|| "unknown".to_string())
}

fn run_cmd(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
