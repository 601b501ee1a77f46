//! Extension-based directory organizer.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{CollabResult, FileOrganizer, OrganizeStats};
use crate::error::CollabError;

/// Category folders and the extensions that land in them.
pub const CATEGORIES: &[(&str, &[&str])] = &[
    ("Documents", &["pdf", "doc", "docx", "txt", "rtf", "odt", "pages", "tex", "wpd"]),
    ("Spreadsheets", &["xls", "xlsx", "csv", "ods", "numbers"]),
    ("Presentations", &["ppt", "pptx", "odp", "key"]),
    ("Images", &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "svg", "webp", "ico", "raw"]),
    ("Videos", &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "3gp"]),
    ("Audio", &["mp3", "wav", "flac", "aac", "ogg", "wma", "m4a"]),
    ("Archives", &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"]),
    ("Software", &["exe", "msi", "dmg", "pkg", "deb", "rpm", "appx"]),
    ("Code", &["py", "js", "html", "css", "cpp", "c", "java", "php", "rb", "go", "rs"]),
    ("Fonts", &["ttf", "otf", "woff", "woff2", "eot"]),
    ("eBooks", &["epub", "mobi", "azw", "azw3", "fb2"]),
];

pub const OTHER_CATEGORY: &str = "Other";

const SYSTEM_FILES: &[&str] = &["desktop.ini", "thumbs.db", ".ds_store"];

/// Files above this size are left alone.
const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Category for a file name, by extension.
pub fn categorize(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return OTHER_CATEGORY;
    };
    let ext = ext.to_lowercase();
    CATEGORIES
        .iter()
        .find(|(_, exts)| exts.contains(&ext.as_str()))
        .map_or(OTHER_CATEGORY, |(name, _)| *name)
}

/// `dir/name`, or `dir/stem_N.ext` with the smallest free N.
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
    let ext = name.extension().and_then(|e| e.to_str());

    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem}_{n}.{ext}")),
            None => dir.join(format!("{stem}_{n}")),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Sorts files into category folders on the local filesystem.
///
/// Relative paths resolve against `base_dir`. Category folders are created
/// under `output_root` when set, otherwise inside the directory being
/// organized.
#[derive(Debug, Clone)]
pub struct DirectoryOrganizer {
    base_dir: PathBuf,
    output_root: Option<PathBuf>,
}

impl DirectoryOrganizer {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            output_root: None,
        }
    }

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = Some(root.into());
        self
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn should_skip(path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return true;
        };
        if name.starts_with('.') || SYSTEM_FILES.contains(&name.to_lowercase().as_str()) {
            return true;
        }
        match fs::metadata(path) {
            Ok(meta) if meta.len() > MAX_FILE_SIZE => {
                warn!(file = %path.display(), "skipping large file");
                true
            }
            Ok(_) => false,
            Err(_) => true,
        }
    }

    fn move_into_category(&self, file: &Path, root: &Path, category: &str) -> CollabResult<PathBuf> {
        let dest_dir = root.join(category);
        fs::create_dir_all(&dest_dir)?;
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CollabError::failed("move", "file name is not valid UTF-8"))?;
        let dest = unique_destination(&dest_dir, name);
        fs::rename(file, &dest)?;
        Ok(dest)
    }
}

impl FileOrganizer for DirectoryOrganizer {
    fn organize_directory(&self, path: &Path) -> CollabResult<OrganizeStats> {
        let source = self.resolve(path);
        if !source.is_dir() {
            return Err(CollabError::NotFound(source.display().to_string()));
        }
        let root = self.output_root.clone().unwrap_or_else(|| source.clone());
        info!(source = %source.display(), root = %root.display(), "organizing directory");

        // Non-recursive: only files directly in the directory
        let files: Vec<PathBuf> = fs::read_dir(&source)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();

        let mut stats = OrganizeStats {
            total_files: files.len(),
            ..OrganizeStats::default()
        };

        for file in files {
            if Self::should_skip(&file) {
                stats.skipped_files += 1;
                continue;
            }
            let category = categorize(&file);
            match self.move_into_category(&file, &root, category) {
                Ok(dest) => {
                    debug!(from = %file.display(), to = %dest.display(), "moved");
                    stats.organized_files += 1;
                    *stats.per_category.entry(category.to_string()).or_default() += 1;
                }
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "failed to organize file");
                    stats.errors += 1;
                }
            }
        }

        info!(?stats, "organization complete");
        Ok(stats)
    }

    fn move_path(&self, source: &Path, destination: &Path) -> CollabResult<()> {
        let source = self.resolve(source);
        if !source.exists() {
            return Err(CollabError::NotFound(source.display().to_string()));
        }
        let mut dest = self.resolve(destination);
        // Moving into an existing folder keeps the file name
        if dest.is_dir() {
            let name = source
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| CollabError::failed("move", "file name is not valid UTF-8"))?;
            dest = unique_destination(&dest, name);
        } else if dest.exists() {
            let parent = dest.parent().map(Path::to_path_buf).unwrap_or_default();
            let name = dest.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            dest = unique_destination(&parent, &name);
        } else if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&source, &dest)?;
        info!(from = %source.display(), to = %dest.display(), "moved");
        Ok(())
    }

    fn delete_path(&self, path: &Path) -> CollabResult<()> {
        let path = self.resolve(path);
        let meta = fs::metadata(&path).map_err(|_| CollabError::NotFound(path.display().to_string()))?;
        if meta.is_dir() {
            fs::remove_dir(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        info!(path = %path.display(), "deleted");
        Ok(())
    }

    fn rename_path(&self, path: &Path, new_name: &str) -> CollabResult<()> {
        let path = self.resolve(path);
        if !path.exists() {
            return Err(CollabError::NotFound(path.display().to_string()));
        }
        let target = path.with_file_name(new_name);
        if target.exists() {
            return Err(CollabError::failed(
                "rename",
                format!("{} already exists", target.display()),
            ));
        }
        fs::rename(&path, &target)?;
        Ok(())
    }

    fn create_folder(&self, path: &Path) -> CollabResult<()> {
        let path = self.resolve(path);
        fs::create_dir_all(&path)?;
        info!(path = %path.display(), "created folder");
        Ok(())
    }
}
