#![allow(dead_code)]

use http::Method;
use routeschema::envelope::DefaultWrapper;
use routeschema::registry::Registry;
use routeschema::typed::HandlerResponse;
use routeschema::SchemaRequest;

pub fn demo_registry() -> Registry {
    routeschema::cli::demo::registry().unwrap()
}

/// Serve `req` through the operation registered at `method pattern`, with
/// path parameters matched against `pattern`.
pub fn serve(registry: &Registry, method: Method, pattern: &str, req: SchemaRequest) -> HandlerResponse {
    let op = registry
        .operation(&method, pattern)
        .unwrap_or_else(|| panic!("no operation {} {}", method, pattern));
    op.serve_with(req.route(pattern), &DefaultWrapper)
        .expect("operation has a handler")
}

pub mod temp_files {
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// A path inside a fresh temporary directory. Keep the guard alive for
    /// as long as the file is needed.
    pub fn temp_path(file_name: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name);
        (dir, path)
    }
}
