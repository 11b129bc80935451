//! Portfolio loading — turn a directory of media into pages and chapters.
//!
//! Files directly in the root form the first chapter; every immediate
//! subdirectory forms one more.  The walker respects `.gitignore` rules and
//! hidden files via the [`ignore`] crate.  Nothing here knows about
//! rendering: the loader only hands a page count to the engine and a chapter
//! list to the tab strip.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ignore::WalkBuilder;
use thiserror::Error;
use tracing::{debug, info};

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff", "ico",
];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi", "m4v"];

/// Chapter tab colours, assigned in order and cycled.
pub const CHAPTER_PALETTE: &[[u8; 3]] = &[
    [229, 115, 115],
    [255, 183, 77],
    [129, 199, 132],
    [100, 181, 246],
    [186, 104, 200],
    [77, 208, 225],
];

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("no images or videos found under {}", .0.display())]
    Empty(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify by extension, falling back to content sniffing.
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        if let Some(ext) = ext.as_deref() {
            if IMAGE_EXTENSIONS.contains(&ext) {
                return Some(MediaKind::Image);
            }
            if VIDEO_EXTENSIONS.contains(&ext) {
                return Some(MediaKind::Video);
            }
        }
        let mime = tree_magic_mini::from_filepath(path)?;
        if mime.starts_with("image/") {
            Some(MediaKind::Image)
        } else if mime.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// One sheet of the notebook.
#[derive(Debug, Clone)]
pub struct Page {
    pub name: String,
    pub path: PathBuf,
    pub kind: MediaKind,
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// Index into [`Portfolio::chapters`].
    pub chapter: usize,
}

/// Chapter marker, read-only for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    pub start_page: usize,
    pub color: [u8; 3],
}

#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub show_hidden: bool,
    pub respect_gitignore: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            show_hidden: false,
            respect_gitignore: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Portfolio {
    pub root: PathBuf,
    pub pages: Vec<Page>,
    pub chapters: Vec<Chapter>,
}

impl Portfolio {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Chapter containing `page`.
    pub fn chapter_of(&self, page: usize) -> Option<&Chapter> {
        self.pages.get(page).and_then(|p| self.chapters.get(p.chapter))
    }

    /// Page range covered by chapter `index`.
    pub fn chapter_range(&self, index: usize) -> Range<usize> {
        let Some(chapter) = self.chapters.get(index) else {
            return 0..0;
        };
        let end = self
            .chapters
            .get(index + 1)
            .map_or(self.pages.len(), |next| next.start_page);
        chapter.start_page..end
    }
}

#[cfg(test)]
impl Portfolio {
    /// In-memory portfolio of `n` image pages split into two chapters.
    pub(crate) fn sample(n: usize) -> Self {
        let split = n / 2;
        let pages = (0..n)
            .map(|i| Page {
                name: format!("{i:02}.png"),
                path: PathBuf::from(format!("/tmp/book/{i:02}.png")),
                kind: MediaKind::Image,
                size: 1,
                modified: None,
                chapter: usize::from(i >= split),
            })
            .collect();
        Portfolio {
            root: PathBuf::from("/tmp/book"),
            pages,
            chapters: vec![
                Chapter {
                    title: "first".into(),
                    start_page: 0,
                    color: CHAPTER_PALETTE[0],
                },
                Chapter {
                    title: "second".into(),
                    start_page: split,
                    color: CHAPTER_PALETTE[1],
                },
            ],
        }
    }
}

/// Load every image and video under `root`.
pub fn load_portfolio(root: &Path, config: &LoadConfig) -> Result<Portfolio, ContentError> {
    if !root.exists() {
        return Err(ContentError::Missing(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ContentError::NotADirectory(root.to_path_buf()));
    }

    let mut loose = Vec::new();
    let mut subdirs = Vec::new();
    for entry in walker(root, config).max_depth(Some(1)).build().flatten() {
        let path = entry.path();
        if path == root {
            continue;
        }
        match entry.file_type() {
            Some(ft) if ft.is_dir() => subdirs.push(path.to_path_buf()),
            Some(ft) if ft.is_file() => loose.push(path.to_path_buf()),
            _ => {}
        }
    }
    subdirs.sort_by_key(|p| sort_key(p));

    let mut portfolio = Portfolio {
        root: root.to_path_buf(),
        pages: Vec::new(),
        chapters: Vec::new(),
    };
    let root_title = display_name(root);
    add_chapter(&mut portfolio, root_title, loose);
    for dir in subdirs {
        let files: Vec<PathBuf> = walker(&dir, config)
            .build()
            .flatten()
            .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
            .map(|e| e.into_path())
            .collect();
        add_chapter(&mut portfolio, display_name(&dir), files);
    }

    if portfolio.pages.is_empty() {
        return Err(ContentError::Empty(root.to_path_buf()));
    }
    info!(
        root = %root.display(),
        pages = portfolio.pages.len(),
        chapters = portfolio.chapters.len(),
        "portfolio loaded"
    );
    Ok(portfolio)
}

fn walker(dir: &Path, config: &LoadConfig) -> WalkBuilder {
    let mut builder = WalkBuilder::new(dir);
    builder
        .hidden(!config.show_hidden)
        .git_ignore(config.respect_gitignore)
        .require_git(false);
    builder
}

/// Append a chapter made of the media among `files`.  Chapters without media
/// are dropped.
fn add_chapter(portfolio: &mut Portfolio, title: String, mut files: Vec<PathBuf>) {
    files.sort_by_key(|p| sort_key(p));
    let chapter = portfolio.chapters.len();
    let start_page = portfolio.pages.len();
    for path in files {
        let Some(kind) = MediaKind::detect(&path) else {
            debug!(path = %path.display(), "skipping non-media file");
            continue;
        };
        let meta = std::fs::metadata(&path).ok();
        portfolio.pages.push(Page {
            name: display_name(&path),
            kind,
            size: meta.as_ref().map_or(0, |m| m.len()),
            modified: meta.and_then(|m| m.modified().ok()),
            chapter,
            path,
        });
    }
    if portfolio.pages.len() > start_page {
        portfolio.chapters.push(Chapter {
            title,
            start_page,
            color: CHAPTER_PALETTE[chapter % CHAPTER_PALETTE.len()],
        });
    }
}

fn sort_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
