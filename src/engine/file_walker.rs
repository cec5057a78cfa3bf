use std::path::{Path, PathBuf};

use anyhow::Result;
use ignore::overrides::{Override, OverrideBuilder};
use ignore::WalkBuilder;
use tracing::{debug, warn};

/// Directories holding generated or third-party assets; nothing inside them
/// is first-party web code.
const VENDORED_DIRS: &[&str] = &[
    "node_modules",
    "bower_components",
    "vendor",
    "dist",
    "build",
    ".git",
    ".next",
    ".nuxt",
    ".output",
    "coverage",
    ".nyc_output",
    ".cache",
    ".idea",
    ".vscode",
    ".vs",
    "__pycache__",
];

/// Extensions with no scannable text behind them.
const OPAQUE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "woff", "woff2", "ttf", "otf", "eot",
    "mp3", "mp4", "avi", "mov", "mkv", "wav", "flac", "zip", "tar", "gz", "bz2", "xz", "7z",
    "rar", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "exe", "dll", "so", "dylib",
    "bin", "obj", "o", "a", "lib", "wasm", "class", "pyc", "pyo", "db", "sqlite", "sqlite3",
];

/// Collect the files under `root` worth checking. Gitignore rules apply,
/// vendored directories and opaque assets are dropped, user include/exclude
/// globs are honored, and files over `max_file_size` are skipped.
pub fn walk_files(
    root: &Path,
    include: &[String],
    exclude: &[String],
    max_file_size: u64,
) -> Result<Vec<PathBuf>> {
    let mut walker = WalkBuilder::new(root);
    walker
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .max_filesize(Some(max_file_size))
        .overrides(build_overrides(root, exclude)?);

    let files = walker
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Walk error: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            if !has_scannable_extension(path) {
                debug!("Opaque asset skipped: {}", path.display());
                return false;
            }
            include.is_empty() || matches_include(path, include)
        })
        .collect();

    Ok(files)
}

/// Vendored directories and user exclude globs become negated overrides, so
/// the walker itself prunes matching paths (and never descends into a
/// vendored directory at all).
fn build_overrides(root: &Path, exclude: &[String]) -> Result<Override> {
    let mut overrides = OverrideBuilder::new(root);
    for dir in VENDORED_DIRS {
        overrides.add(&format!("!**/{dir}"))?;
        overrides.add(&format!("!**/{dir}/**"))?;
    }
    for pattern in exclude {
        if let Err(e) = overrides.add(&format!("!{pattern}")) {
            warn!("Invalid exclude pattern '{}': {}", pattern, e);
        }
    }
    Ok(overrides.build()?)
}

fn has_scannable_extension(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => !OPAQUE_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => true,
    }
}

/// An include pattern keeps a file when it names the file's extension
/// (".css", "*.css" or "css" all work) or appears in the file name.
fn matches_include(path: &Path, include: &[String]) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    include.iter().any(|pattern| {
        let wanted = pattern.trim_start_matches('*').trim_start_matches('.').to_lowercase();
        ext == wanted || name.contains(&pattern.to_lowercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walk_skips_opaque_assets_and_vendored_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.css"), "div:has(> img) {}").unwrap();
        fs::write(dir.path().join("logo.png"), [0u8, 1, 2]).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "x").unwrap();

        let files = walk_files(dir.path(), &[], &[], 1_048_576).unwrap();
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect();
        assert_eq!(names, vec!["app.css"]);
    }

    #[test]
    fn exclude_patterns_drop_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.css"), "body {}").unwrap();
        fs::write(dir.path().join("app.test.css"), "body {}").unwrap();

        let files =
            walk_files(dir.path(), &[], &["*.test.css".to_string()], 1_048_576).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].to_string_lossy().ends_with("app.css"));
    }

    #[test]
    fn include_patterns_keep_only_matching_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.css"), "body {}").unwrap();
        fs::write(dir.path().join("main.js"), "let x = 1").unwrap();

        let files = walk_files(dir.path(), &[".css".to_string()], &[], 1_048_576).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].to_string_lossy().ends_with("app.css"));
    }
}
