//! Finding and parsing the source files of a module.
//!
//! A module path names either a single `.pea` file or a directory; a
//! directory module is all of its `.pea` files in name order. Test files
//! (`*_test.pea`) are only included when asked for.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::ast::{File, Mod};
use crate::error::SyntaxError;
use crate::parser::parse_source;

const EXT: &str = "pea";
const TEST_SUFFIX: &str = "_test.pea";

/// Failure to produce a module AST from disk.
#[derive(Debug)]
pub enum LoadError {
    /// Nothing at the module path.
    NotFound(PathBuf),
    Io { path: PathBuf, error: io::Error },
    Syntax(SyntaxError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotFound(path) => write!(f, "{} not found", path.display()),
            LoadError::Io { path, error } => write!(f, "{}: {error}", path.display()),
            LoadError::Syntax(err) => write!(f, "{}: {err}", err.loc()),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { error, .. } => Some(error),
            LoadError::Syntax(err) => Some(err),
            LoadError::NotFound(_) => None,
        }
    }
}

impl From<SyntaxError> for LoadError {
    fn from(err: SyntaxError) -> Self {
        LoadError::Syntax(err)
    }
}

/// Lists the source files making up the module at `path`.
///
/// # Errors
///
/// Fails if the directory cannot be read.
pub fn source_files(path: &Path, tests: bool) -> io::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let file = entry?.path();
        let is_source = file.is_file() && file.extension().is_some_and(|ext| ext == EXT);
        let is_test = file
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(TEST_SUFFIX));
        if is_source && (tests || !is_test) {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}

/// Loads and parses module `mod_path` relative to `root`.
///
/// The module path may name a directory or, with or without the `.pea`
/// extension, a single file.
///
/// # Errors
///
/// See [`LoadError`].
pub fn load_mod(root: &Path, mod_path: &str, tests: bool) -> Result<Mod, LoadError> {
    let dir = root.join(mod_path);
    let file = root.join(format!("{mod_path}.{EXT}"));
    let path = if dir.exists() {
        dir
    } else if file.is_file() {
        file
    } else {
        return Err(LoadError::NotFound(dir));
    };

    let paths = source_files(&path, tests).map_err(|error| LoadError::Io {
        path: path.clone(),
        error,
    })?;
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let source = fs::read_to_string(&path).map_err(|error| LoadError::Io {
            path: path.clone(),
            error,
        })?;
        files.push(parse_source(&path.to_string_lossy(), &source)?);
    }
    pea_log::debug!("loaded {} ({} files)", mod_path, files.len());
    Ok(Mod::new(mod_path, files))
}

/// Parses in-memory `(file name, source)` pairs as one module.
///
/// # Errors
///
/// Returns the first syntax error.
pub fn parse_mod(mod_path: &str, sources: &[(&str, &str)]) -> Result<Mod, SyntaxError> {
    let files = sources
        .iter()
        .map(|(name, source)| parse_source(name, source))
        .collect::<Result<Vec<File>, _>>()?;
    Ok(Mod::new(mod_path, files))
}

/// The import paths of every file of a module, deduplicated in order of
/// first appearance.
#[must_use]
pub fn scan_imports(module: &Mod) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for import in module.files.iter().flat_map(File::imports) {
        if !paths.contains(&import.path) {
            paths.push(import.path.clone());
        }
    }
    paths
}
