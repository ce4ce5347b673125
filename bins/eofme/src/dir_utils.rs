use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Returns every `.json` file under `path`, or `path` itself if it is a json file.
pub fn find_all_json_tests(path: &Path) -> Vec<PathBuf> {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "json")
                .unwrap_or(false)
        })
        .map(DirEntry::into_path)
        .collect::<Vec<PathBuf>>()
}
