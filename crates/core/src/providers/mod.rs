pub mod traits;

// Log source implementations
#[cfg(not(target_arch = "wasm32"))]
pub mod file;
pub mod http;

/// Join a candidate base and a file name with exactly one `/` between them.
/// An empty base yields the bare file name; `/` yields a root-relative path.
pub fn join_path(base: &str, file: &str) -> String {
    let file = file.trim_start_matches('/');
    if base.is_empty() {
        return file.to_string();
    }
    format!("{}/{file}", base.trim_end_matches('/'))
}
