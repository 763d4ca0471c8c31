#![allow(dead_code)]

use poja::config::RawOptions;
use std::path::{Path, PathBuf};

pub fn template_root() -> PathBuf {
    PathBuf::from(poja::constants::BUILD_TEMPLATE_ROOT)
}

pub fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

pub fn raw(pairs: &[(&str, &str)]) -> RawOptions {
    let mut options = RawOptions::default();
    for (key, value) in pairs {
        options.set(key, *value).unwrap();
    }
    options
}

pub fn own_vpc() -> [(&'static str, &'static str); 4] {
    [
        ("with_own_vpc", "true"),
        ("ssm_sg_id", "/poja/sg/id"),
        ("ssm_subnet1_id", "/poja/subnet/private1/id"),
        ("ssm_subnet2_id", "/poja/subnet/private2/id"),
    ]
}

/// Relative paths of every file under `root`, sorted.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    files.sort();
    files
}

pub fn read(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative)).unwrap()
}

/// Writes a throwaway template tree; `.poja-catalog.yml` may be one of the files.
pub fn template_tree(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let target = dir.path().join(path);
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(target, content).unwrap();
    }
    dir
}

#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).unwrap().permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}
