use std::fs;
use std::io;
use tempfile::TempDir;

#[derive(Debug, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    files: Vec<String>,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, files: Vec<String>) -> Self {
        Self { name, group, files }
    }

    pub fn small(name: &'static str, files: Vec<String>) -> Self {
        Self::new(name, TestGroup::Small, files)
    }

    pub fn normal(name: &'static str, files: Vec<String>) -> Self {
        Self::new(name, TestGroup::Normal, files)
    }

    pub fn large(name: &'static str, files: Vec<String>) -> Self {
        Self::new(name, TestGroup::Large, files)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    /// Route files relative to the routes root.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Writes the route files into a fresh temporary directory.
    pub fn write_tree(&self) -> io::Result<TempDir> {
        let dir = TempDir::new()?;
        for file in &self.files {
            let path = dir.path().join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, "export default function page() {}\n")?;
        }
        Ok(dir)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

/// `width` sibling sections, each with a handler, a detail page and a layout.
pub fn wide_tree(width: usize) -> Vec<String> {
    let mut files = vec!["_middleware.ts".to_string(), "layout.ts".to_string(), "index.ts".to_string(), "_404.ts".to_string()];
    for i in 0..width {
        files.push(format!("section{i}/index.ts"));
        files.push(format!("section{i}/layout.ts"));
        files.push(format!("section{i}/[id]/index.ts"));
    }
    files.push("[...rest]/index.ts".to_string());
    files
}

/// One chain of `depth` nested dynamic directories with a handler at every level.
pub fn deep_tree(depth: usize) -> Vec<String> {
    let mut files = vec!["index.ts".to_string()];
    let mut dir = String::new();
    for i in 0..depth {
        dir.push_str(&format!("level{i}/[p{i}]/"));
        files.push(format!("{dir}index.ts"));
        files.push(format!("{dir}_middleware.ts"));
    }
    files
}

/// A request path that reaches the deepest handler of [`deep_tree`].
pub fn deep_path(depth: usize) -> String {
    (0..depth).map(|i| format!("/level{i}/v{i}")).collect()
}
