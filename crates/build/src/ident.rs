//! Code-safe identifiers for discovered files.
//!
//! ```text
//! foo/bar.ts             foo_bar
//! foo/[id]/bar.ts        foo_id_bar
//! foo/[...all]/bar.ts    foo_all_bar
//! data.json.ts           data
//! 404/index.ts           _404_index
//! _middleware.ts         _middleware
//! [id]/index.ts          _id_index
//! new.ts                 _new
//! ```

use std::collections::HashSet;

/// Hands out unique identifiers for one build.
///
/// The set of used names lives as long as the generator, so two files anywhere in the tree
/// never share an identifier. A collision gets `_1`, `_2`, ... in first-seen order.
#[derive(Debug, Default)]
pub struct IdentifierGenerator {
    used: HashSet<String>,
}

impl IdentifierGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identifier for `relative_path` and records it as used.
    pub fn assign(&mut self, relative_path: &str) -> String {
        let base = base_identifier(relative_path);
        if self.used.insert(base.clone()) {
            return base;
        }

        let mut suffix = 1usize;
        loop {
            let candidate = format!("{base}_{suffix}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    pub fn is_used(&self, identifier: &str) -> bool {
        self.used.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

/// Words that cannot name an `import * as` binding in a generated module, sorted.
const RESERVED_WORDS: [&str; 46] = [
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "eval", "export", "extends", "false", "finally", "for", "function", "if", "implements",
    "import", "in", "instanceof", "interface", "let", "new", "null", "package", "private", "protected", "public",
    "return", "static", "super", "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while",
];

/// The identifier of a path before collision handling.
pub fn base_identifier(relative_path: &str) -> String {
    let (dir, file_name) = match relative_path.rfind('/') {
        Some(slash) => (&relative_path[..=slash], &relative_path[slash + 1..]),
        None => ("", relative_path),
    };

    let mut identifier = String::with_capacity(relative_path.len() + 1);
    for c in dir.chars().chain(strip_extensions(file_name).chars()) {
        if c.is_ascii_alphanumeric() {
            identifier.push(c);
        } else if !identifier.ends_with('_') {
            identifier.push('_');
        }
    }

    if identifier.is_empty()
        || identifier.starts_with(|c: char| c.is_ascii_digit())
        || RESERVED_WORDS.binary_search(&identifier.as_str()).is_ok()
    {
        identifier.insert(0, '_');
    }
    identifier
}

/// Drops every `.ext` suffix of a file name, `data.json.ts` becomes `data`.
fn strip_extensions(file_name: &str) -> &str {
    let mut stem = file_name;
    while let Some(dot) = stem.rfind('.') {
        let (prefix, suffix) = (&stem[..dot], &stem[dot + 1..]);
        let is_extension = !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !is_extension || prefix.is_empty() || prefix.ends_with('.') {
            break;
        }
        stem = prefix;
    }
    stem
}
