//! Directory-tree classification.
//!
//! The [`Classifier`] walks a routes directory one level at a time, assigns every file a
//! [`FileRole`] and attaches every subdirectory as a child node of the [`DirectoryTree`].

use crate::error::BuildError;
use crate::options::BuildOptions;
use crate::tree::{DirectoryTree, NodeId};
use regex::Regex;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

pub const HANDLER_STEM: &str = "index";
pub const LAYOUT_STEM: &str = "layout";
pub const MIDDLEWARE_STEM: &str = "_middleware";
pub const ERROR_PAGE_STEM: &str = "_500";
pub const NOT_FOUND_STEM: &str = "_404";

const TRANSLATIONS_MARKER: &str = "translations";
const TYPES_MARKER: &str = "types";

/// What a file is for, decided once at classification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileRole {
    Handler,
    Layout,
    Middleware,
    ErrorPage,
    NotFound,
    Translation,
    TypeDescriptor,
    Asset,
    Other,
}

impl FileRole {
    /// Roles of which a directory may hold at most one file.
    pub fn is_reserved(self) -> bool {
        matches!(self, Self::Handler | Self::Layout | Self::Middleware | Self::ErrorPage | Self::NotFound)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Handler => "handler",
            Self::Layout => "layout",
            Self::Middleware => "middleware",
            Self::ErrorPage => "error-page",
            Self::NotFound => "not-found",
            Self::Translation => "translation",
            Self::TypeDescriptor => "type-descriptor",
            Self::Asset => "asset",
            Self::Other => "other",
        }
    }
}

impl Display for FileRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified file, immutable after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    relative_path: String,
    role: FileRole,
    extension: String,
}

impl FileEntry {
    pub fn new(relative_path: impl Into<String>, role: FileRole, extension: impl Into<String>) -> Self {
        Self { relative_path: relative_path.into(), role, extension: extension.into() }
    }

    /// Path relative to the routes root, always `/` separated.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn role(&self) -> FileRole {
        self.role
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn file_name(&self) -> &str {
        self.relative_path.rsplit('/').next().unwrap_or(&self.relative_path)
    }
}

/// Classifies a single file name.
///
/// Reserved stems only count with a source extension, `translations` and `types` markers
/// count with any extension, anything else without a source extension is an asset.
pub fn classify_file(file_name: &str, options: &BuildOptions) -> FileRole {
    let (stem, extension) = split_extension(file_name);
    let is_source = extension.is_some_and(|ext| options.is_source_extension(ext));

    if is_source {
        let reserved = match stem {
            HANDLER_STEM => Some(FileRole::Handler),
            LAYOUT_STEM => Some(FileRole::Layout),
            MIDDLEWARE_STEM => Some(FileRole::Middleware),
            ERROR_PAGE_STEM => Some(FileRole::ErrorPage),
            NOT_FOUND_STEM => Some(FileRole::NotFound),
            _ => None,
        };
        if let Some(role) = reserved {
            return role;
        }
    }

    if stem.split('.').any(|part| part == TRANSLATIONS_MARKER) {
        return FileRole::Translation;
    }
    if stem.split('.').any(|part| part == TYPES_MARKER) {
        return FileRole::TypeDescriptor;
    }
    if !is_source {
        return FileRole::Asset;
    }
    FileRole::Other
}

/// Classifies a file by its path relative to the routes root.
///
/// Like [`classify_file`], and a non-reserved file below a `translations` directory is a
/// translation too.
pub fn classify_path(relative_path: &str, options: &BuildOptions) -> FileRole {
    let (dirs, file_name) = relative_path.rsplit_once('/').unwrap_or(("", relative_path));
    let role = classify_file(file_name, options);
    if !role.is_reserved() && dirs.split('/').any(|dir| dir == TRANSLATIONS_MARKER) {
        return FileRole::Translation;
    }
    role
}

fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => (&file_name[..dot], Some(&file_name[dot + 1..])),
        _ => (file_name, None),
    }
}

/// Builds a [`DirectoryTree`] from a routes directory.
#[derive(Debug)]
pub struct Classifier<'a> {
    options: &'a BuildOptions,
    ignore: Option<Regex>,
}

impl<'a> Classifier<'a> {
    pub fn new(options: &'a BuildOptions) -> Result<Self, BuildError> {
        Ok(Self { options, ignore: options.compile_ignore()? })
    }

    /// Classifies `root` and everything below it.
    ///
    /// Children are attached in file name order; the specificity sorter reorders them later.
    pub fn classify<P: AsRef<Path>>(&self, root: P) -> Result<DirectoryTree, BuildError> {
        let root = root.as_ref();
        let metadata = fs::metadata(root).map_err(|e| BuildError::read_dir(root, e))?;
        if !metadata.is_dir() {
            return Err(BuildError::read_dir(root, io::Error::new(io::ErrorKind::NotADirectory, "not a directory")));
        }

        let mut tree = DirectoryTree::new();
        self.classify_dir(&mut tree, NodeId::ROOT, root, "")?;
        debug!(nodes = tree.node_count(), files = tree.file_count(), root = %root.display(), "classified route tree");
        Ok(tree)
    }

    fn classify_dir(&self, tree: &mut DirectoryTree, node: NodeId, dir: &Path, relative: &str) -> Result<(), BuildError> {
        let entries = WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false).sort_by_file_name();

        for entry in entries {
            let entry = entry.map_err(|e| BuildError::read_dir(dir, e))?;
            let Some(name) = entry.file_name().to_str() else {
                debug!(path = %entry.path().display(), "skip entry with a non utf-8 name");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let relative_path = if relative.is_empty() { name.to_string() } else { format!("{relative}/{name}") };
            if self.is_ignored(&relative_path) {
                trace!(path = %relative_path, "skip ignored entry");
                continue;
            }

            if entry.file_type().is_dir() {
                if name.starts_with('_') {
                    trace!(path = %relative_path, "skip private directory");
                    continue;
                }
                let child = tree.add_directory(node, name);
                self.classify_dir(tree, child, entry.path(), &relative_path)?;
            } else {
                let role = classify_path(&relative_path, self.options);
                let extension = split_extension(name).1.unwrap_or_default();
                trace!(path = %relative_path, %role, "classified file");
                tree.add_file(node, FileEntry::new(relative_path, role, extension));
            }
        }

        check_directory(tree, node)
    }

    fn is_ignored(&self, relative_path: &str) -> bool {
        self.ignore.as_ref().is_some_and(|ignore| ignore.is_match(relative_path))
    }
}

/// Rejects a directory holding two files of the same reserved role, or two catch-all children.
fn check_directory(tree: &DirectoryTree, id: NodeId) -> Result<(), BuildError> {
    let node = tree.node(id);
    let dir = tree.path_of(id);

    for (role, files) in node.files().iter() {
        if role.is_reserved() && files.len() > 1 {
            return Err(BuildError::ConflictingFiles {
                dir,
                role,
                first: tree.file(files[0]).relative_path().to_string(),
                second: tree.file(files[1]).relative_path().to_string(),
            });
        }
    }

    let mut catch_alls = node.children().iter().map(|child| tree.node(*child)).filter(|c| c.segment().swallows_rest());
    if let (Some(first), Some(second)) = (catch_alls.next(), catch_alls.next()) {
        return Err(BuildError::AmbiguousCatchAll {
            dir,
            first: first.name().to_string(),
            second: second.name().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    #[test]
    fn test_classify_file_roles() {
        let options = BuildOptions::default();
        assert_eq!(classify_file("index.ts", &options), FileRole::Handler);
        assert_eq!(classify_file("layout.tsx", &options), FileRole::Layout);
        assert_eq!(classify_file("_middleware.js", &options), FileRole::Middleware);
        assert_eq!(classify_file("_500.tsx", &options), FileRole::ErrorPage);
        assert_eq!(classify_file("_404.tsx", &options), FileRole::NotFound);
        assert_eq!(classify_file("translations.json", &options), FileRole::Translation);
        assert_eq!(classify_file("en.translations.ts", &options), FileRole::Translation);
        assert_eq!(classify_file("types.ts", &options), FileRole::TypeDescriptor);
        assert_eq!(classify_file("user.types.ts", &options), FileRole::TypeDescriptor);
        assert_eq!(classify_file("logo.png", &options), FileRole::Asset);
        assert_eq!(classify_file("README", &options), FileRole::Asset);
        assert_eq!(classify_file("helpers.ts", &options), FileRole::Other);
    }

    #[test]
    fn test_translations_directory() {
        let options = BuildOptions::default();
        assert_eq!(classify_path("translations/en.ts", &options), FileRole::Translation);
        assert_eq!(classify_path("admin/translations/de/messages.json", &options), FileRole::Translation);
        assert_eq!(classify_path("translations/index.ts", &options), FileRole::Handler);
        assert_eq!(classify_path("translation/en.ts", &options), FileRole::Other);
        assert_eq!(classify_path("en.translations.ts", &options), FileRole::Translation);

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "translations/en.ts");
        touch(dir.path(), "translations/fr.json");
        let tree = Classifier::new(&options).unwrap().classify(dir.path()).unwrap();
        let translations = tree.node(tree.node(tree.root()).children()[0]);
        let roles: Vec<_> = translations.files().iter().map(|(role, files)| (role, files.len())).collect();
        assert_eq!(roles, vec![(FileRole::Translation, 2)]);
    }

    #[test]
    fn test_reserved_stem_needs_source_extension() {
        let options = BuildOptions::default();
        assert_eq!(classify_file("index.css", &options), FileRole::Asset);
        assert_eq!(classify_file("index.test.ts", &options), FileRole::Other);
        assert_eq!(classify_file("index.rs", &options.clone().with_extensions(["rs"])), FileRole::Handler);
    }

    #[test]
    fn test_classify_tree() {
        let dir = TempDir::new().unwrap();
        for path in [
            "index.ts",
            "layout.ts",
            "logo.svg",
            "books/index.ts",
            "books/[id]/index.ts",
            "books/[id]/index.test.ts",
            "books/_drafts/index.ts",
            "docs/[[slug]]/index.ts",
            ".hidden/index.ts",
        ] {
            touch(dir.path(), path);
        }

        let options = BuildOptions::default();
        let tree = Classifier::new(&options).unwrap().classify(dir.path()).unwrap();

        let root = tree.node(tree.root());
        let names: Vec<_> = root.children().iter().map(|id| tree.node(*id).name()).collect();
        assert_eq!(names, vec!["books", "docs"]);
        assert!(root.files().contains(FileRole::Handler));
        assert!(root.files().contains(FileRole::Layout));
        assert!(root.files().contains(FileRole::Asset));

        let books = tree.node(root.children()[0]);
        assert_eq!(books.children().len(), 1, "private directories are skipped");
        let id = tree.node(books.children()[0]);
        assert!(id.is_dynamic());
        assert_eq!(id.files().get(FileRole::Handler).len(), 1, "ignored test files are skipped");
        assert_eq!(tree.file(id.files().get(FileRole::Handler)[0]).relative_path(), "books/[id]/index.ts");

        let slug = tree.node(tree.node(root.children()[1]).children()[0]);
        assert!(slug.is_optional_catch_all());
        assert!(slug.is_dynamic());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let options = BuildOptions::default();
        let result = Classifier::new(&options).unwrap().classify(dir.path().join("missing"));
        assert!(matches!(result, Err(BuildError::ReadDir { .. })));
    }

    #[test]
    fn test_conflicting_handlers() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "books/index.ts");
        touch(dir.path(), "books/index.tsx");

        let options = BuildOptions::default();
        let result = Classifier::new(&options).unwrap().classify(dir.path());
        assert!(matches!(result, Err(BuildError::ConflictingFiles { role: FileRole::Handler, .. })));
    }

    #[test]
    fn test_two_catch_all_siblings() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "docs/[...a]/index.ts");
        touch(dir.path(), "docs/[[b]]/index.ts");

        let options = BuildOptions::default();
        let result = Classifier::new(&options).unwrap().classify(dir.path());
        assert!(matches!(result, Err(BuildError::AmbiguousCatchAll { dir, .. }) if dir == "docs"));
    }
}
