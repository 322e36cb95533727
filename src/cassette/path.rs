//! Maps a test and a record kind to its cassette file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::kind::RecordKind;

/// Identity of one test: the source file it lives in, its name, and the
/// record kinds it opted into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestId {
    module_path: PathBuf,
    test_name: String,
    markers: BTreeSet<RecordKind>,
}

impl TestId {
    /// Creates an unmarked test identity. `module_path` is usually `file!()`.
    pub fn new(module_path: impl Into<PathBuf>, test_name: impl Into<String>) -> Self {
        Self { module_path: module_path.into(), test_name: test_name.into(), markers: BTreeSet::new() }
    }

    /// Opts the test into recording `kind`.
    #[must_use]
    pub fn with_marker(mut self, kind: RecordKind) -> Self {
        self.markers.insert(kind);
        self
    }

    /// Whether sessions of `kind` are active for this test.
    #[must_use]
    pub fn is_marked(&self, kind: RecordKind) -> bool {
        !kind.requires_marker() || self.markers.contains(&kind)
    }

    /// Source file of the test.
    #[must_use]
    pub fn module_path(&self) -> &Path {
        &self.module_path
    }

    /// Name of the test function.
    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Cassette path of this test for `kind`.
    #[must_use]
    pub fn cassette_path(&self, kind: RecordKind, hashed: bool) -> PathBuf {
        resolve(&self.module_path, &self.test_name, kind, hashed)
    }
}

/// Resolves `<module dir>/record/<folder>/<module stem>/<test><suffix>.<ext>`.
///
/// `hashed` only affects object and screen records, which keep digests in a
/// separate `<kind>_hash` folder.
#[must_use]
pub fn resolve(module_path: &Path, test_name: &str, kind: RecordKind, hashed: bool) -> PathBuf {
    let module_dir = module_path.parent().unwrap_or_else(|| Path::new(""));
    let module_stem = module_path
        .file_stem()
        .map_or_else(|| "module".to_string(), |stem| stem.to_string_lossy().into_owned());

    let folder = match kind {
        RecordKind::Object | RecordKind::Screen if hashed => format!("{kind}_hash"),
        _ => kind.to_string(),
    };

    let file_name = format!("{}{}.{}", sanitize(test_name), suffix(kind), extension(kind));

    module_dir.join("record").join(folder).join(module_stem).join(file_name)
}

fn suffix(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Curl => "_curl",
        RecordKind::Ftp => "_ftp",
        _ => "",
    }
}

fn extension(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Http | RecordKind::Curl | RecordKind::Ftp => "yaml",
        _ => "json",
    }
}

/// Test names from `module_path!()`-style paths contain `::`.
fn sanitize(test_name: &str) -> String {
    test_name
        .replace("::", "_")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_cassette_is_yaml_under_kind_folder() {
        let path = resolve(Path::new("tests/net.rs"), "fetch_page", RecordKind::Http, true);
        assert_eq!(path, PathBuf::from("tests/record/http/net/fetch_page.yaml"));
    }

    #[test]
    fn curl_and_ftp_carry_a_suffix() {
        let curl = resolve(Path::new("tests/net.rs"), "get", RecordKind::Curl, false);
        let ftp = resolve(Path::new("tests/net.rs"), "get", RecordKind::Ftp, false);
        assert_eq!(curl, PathBuf::from("tests/record/curl/net/get_curl.yaml"));
        assert_eq!(ftp, PathBuf::from("tests/record/ftp/net/get_ftp.yaml"));
    }

    #[test]
    fn hashed_object_records_use_their_own_folder() {
        let hashed = resolve(Path::new("tests/objects.rs"), "t", RecordKind::Object, true);
        let plain = resolve(Path::new("tests/objects.rs"), "t", RecordKind::Object, false);
        assert_eq!(hashed, PathBuf::from("tests/record/object_hash/objects/t.json"));
        assert_eq!(plain, PathBuf::from("tests/record/object/objects/t.json"));
    }

    #[test]
    fn hashing_does_not_move_transport_cassettes() {
        let a = resolve(Path::new("tests/a.rs"), "t", RecordKind::Time, true);
        let b = resolve(Path::new("tests/a.rs"), "t", RecordKind::Time, false);
        assert_eq!(a, b);
        assert_eq!(a, PathBuf::from("tests/record/time/a/t.json"));
    }

    #[test]
    fn kinds_never_collide() {
        let paths: BTreeSet<PathBuf> = RecordKind::ALL
            .into_iter()
            .map(|kind| resolve(Path::new("tests/a.rs"), "t", kind, false))
            .collect();
        assert_eq!(paths.len(), RecordKind::ALL.len());
    }

    #[test]
    fn test_names_are_sanitized() {
        let path = resolve(Path::new("tests/a.rs"), "suite::case one", RecordKind::Http, false);
        assert_eq!(path, PathBuf::from("tests/record/http/a/suite_case_one.yaml"));
    }

    #[test]
    fn object_kind_is_always_marked() {
        let test = TestId::new("tests/a.rs", "t").with_marker(RecordKind::Curl);
        assert!(test.is_marked(RecordKind::Object));
        assert!(test.is_marked(RecordKind::Curl));
        assert!(!test.is_marked(RecordKind::Http));
    }
}
