//! Compiles a directory tree of route files into an ordered route table.
//!
//! ```text
//! routes/
//! ├── layout.ts            wraps every page
//! ├── _middleware.ts       runs before every page
//! ├── index.ts             /
//! ├── books/
//! │   ├── index.ts         /books
//! │   ├── new/index.ts     /books/new
//! │   └── [id]/index.ts    /books/:id
//! └── docs/
//!     └── [...slug]/index.ts   /docs/:slug+
//! ```
//!
//! A [`Builder`] walks the tree with the [`Classifier`], orders siblings so literal names
//! beat dynamic names which beat catch-alls, flattens the tree into [`RouteEntry`]s and
//! assigns every file a collision-free identifier. The result is an immutable [`Build`]
//! carrying the route table and the generated [`Manifest`].
//!
//! # Example
//!
//! ```no_run
//! use arbor_build::{BuildOptions, Builder};
//!
//! let options = BuildOptions::default();
//! let build = Builder::new(&options).build("routes")?;
//! for route in build.routes() {
//!     println!("{} -> {}", route.pattern(), build.file(route.handler()).relative_path());
//! }
//! # Ok::<(), arbor_build::BuildError>(())
//! ```

mod builder;
mod classify;
mod config;
mod error;
mod exports;
mod flatten;
mod ident;
mod manifest;
mod options;
mod pattern;
mod segment;
mod sort;
mod tree;

pub use builder::Build;
pub use builder::Builder;
pub use classify::Classifier;
pub use classify::FileEntry;
pub use classify::FileRole;
pub use classify::classify_file;
pub use classify::classify_path;
pub use config::ConfigSource;
pub use config::NoRouteConfigs;
pub use config::RouteConfig;
pub use config::StaticRouteConfigs;
pub use error::BuildError;
pub use exports::ExportScanner;
pub use exports::NoExports;
pub use exports::SourceExportScanner;
pub use flatten::ChainLink;
pub use flatten::OverrideFlags;
pub use flatten::RouteEntry;
pub use flatten::flatten;
pub use ident::IdentifierGenerator;
pub use ident::base_identifier;
pub use manifest::Manifest;
pub use manifest::ManifestFile;
pub use manifest::ManifestRoute;
pub use manifest::file_order;
pub use options::BuildOptions;
pub use options::DEFAULT_EXTENSIONS;
pub use options::DEFAULT_IGNORE;
pub use options::DynamicTieBreak;
pub use pattern::Constraint;
pub use pattern::ParamValue;
pub use pattern::PathPattern;
pub use pattern::PatternSegment;
pub use segment::SegmentKind;
pub use sort::compare_segments;
pub use sort::sort_names;
pub use sort::sort_tree;
pub use tree::DirectoryNode;
pub use tree::DirectoryTree;
pub use tree::FileGroups;
pub use tree::FileId;
pub use tree::NodeId;
