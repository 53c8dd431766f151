//! Resolving imports.
//!
//! An import path is loaded through the session's [`Loader`], checked like
//! the main module and frozen: its definitions drop their ASTs and are
//! cached by path. Failures are cached too, so a module that failed once
//! is not loaded again.
//!
//! The paths being imported form a stack; importing a path already on it
//! is a cycle.

use std::path::PathBuf;
use std::rc::Rc;

use pea_syntax::ast;
use pea_syntax::loader::{self, LoadError};

use crate::check::check_module;
use crate::context::{FxMap, State};
use crate::error::ImportError;
use crate::types::{Def, Store};

/// Produces the AST of an imported module.
pub trait Loader {
    /// Loads the module at import path `path`.
    ///
    /// # Errors
    ///
    /// [`ImportError::NotFound`] when nothing is at the path, other
    /// variants when it cannot be read or parsed.
    fn load(&self, path: &str) -> Result<ast::Mod, ImportError>;
}

/// Loads modules from a source tree.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    root: PathBuf,
    tests: bool,
}

impl SourceLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SourceLoader {
            root: root.into(),
            tests: false,
        }
    }

    /// Includes `*_test.pea` files.
    #[must_use]
    pub fn with_tests(mut self, tests: bool) -> Self {
        self.tests = tests;
        self
    }
}

impl Loader for SourceLoader {
    fn load(&self, path: &str) -> Result<ast::Mod, ImportError> {
        loader::load_mod(&self.root, path, self.tests).map_err(|err| match err {
            LoadError::NotFound(_) => ImportError::NotFound(path.to_string()),
            LoadError::Io { path, error } => ImportError::Io {
                path: path.display().to_string(),
                message: error.to_string(),
            },
            LoadError::Syntax(err) => ImportError::Check(vec![err.into()]),
        })
    }
}

/// Serves modules from memory.
///
/// ```
/// use pea_check::{Loader, MemLoader};
///
/// let loader = MemLoader::new().with_module("geo", &[("geo.pea", "type Point { x: Int y: Int }")]);
/// assert_eq!(loader.load("geo").map(|m| m.files.len()), Ok(1));
/// assert!(loader.load("nope").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemLoader {
    modules: FxMap<String, Vec<(String, String)>>,
}

impl MemLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds module `path` made of `(file name, source)` pairs.
    #[must_use]
    pub fn with_module(mut self, path: &str, files: &[(&str, &str)]) -> Self {
        self.add_module(path, files);
        self
    }

    pub fn add_module(&mut self, path: &str, files: &[(&str, &str)]) {
        let files = files
            .iter()
            .map(|&(name, source)| (name.to_string(), source.to_string()))
            .collect();
        self.modules.insert(path.to_string(), files);
    }
}

impl Loader for MemLoader {
    fn load(&self, path: &str) -> Result<ast::Mod, ImportError> {
        let files = self
            .modules
            .get(path)
            .ok_or_else(|| ImportError::NotFound(path.to_string()))?;
        let sources: Vec<(&str, &str)> = files
            .iter()
            .map(|(name, source)| (name.as_str(), source.as_str()))
            .collect();
        loader::parse_mod(path, &sources).map_err(|err| ImportError::Check(vec![err.into()]))
    }
}

/// The import stack and the cache of imported modules.
#[derive(Debug, Default)]
pub(crate) struct ImportState {
    /// Paths being imported, outermost first.
    pub stack: Vec<String>,
    /// `None` records a failed import.
    pub cache: FxMap<String, Option<Rc<[Def]>>>,
}

/// Drops the ASTs of frozen definitions.
pub(crate) fn strip_sources(store: &mut Store, defs: &[Def]) {
    for &def in defs {
        match def {
            Def::Val(val) => store.vals[val].src = None,
            Def::Fun(fun) => store.funs[fun].src = None,
            Def::Type(ty) => store.types[ty].src = None,
        }
    }
}

/// The definitions of the module at `path`, importing it on first use.
pub(crate) fn import_module(state: &mut State, path: &str) -> Result<Rc<[Def]>, ImportError> {
    if state.imports.stack.iter().any(|p| p == path) {
        let mut cycle = state.imports.stack.clone();
        cycle.push(path.to_string());
        return Err(ImportError::Cycle(cycle));
    }
    if let Some(cached) = state.imports.cache.get(path) {
        pea_log::debug!("import {:?} cached", path);
        return cached.clone().ok_or_else(|| ImportError::Failed(path.to_string()));
    }

    let _trace = state
        .tracer
        .enabled()
        .then(|| state.tracer.enter(format_args!("import {path:?}")));

    state.imports.stack.push(path.to_string());
    let result = load_and_check(state, path);
    state.imports.stack.pop();

    state
        .imports
        .cache
        .insert(path.to_string(), result.as_ref().ok().cloned());
    result
}

fn load_and_check(state: &mut State, path: &str) -> Result<Rc<[Def]>, ImportError> {
    let module = state.loader.load(path)?;

    let traced = state.tracer.set_enabled(false);
    let checked = check_module(state, &module);
    state.tracer.set_enabled(traced);

    let module = checked.map_err(ImportError::Check)?;
    strip_sources(&mut state.store, &module.defs);
    pea_log::debug!("imported {:?} ({} definitions)", path, module.defs.len());
    Ok(Rc::from(module.defs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn state(loader: MemLoader) -> State {
        State::new(Config::default().with_loader(loader))
    }

    #[test]
    fn test_cycle_lists_stack() {
        let mut state = state(MemLoader::new());
        state.imports.stack = vec!["foo".into(), "bar".into()];
        let err = import_module(&mut state, "foo").unwrap_err();
        assert_eq!(err, ImportError::Cycle(vec!["foo".into(), "bar".into(), "foo".into()]));
    }

    #[test]
    fn test_failures_are_cached() {
        let mut state = state(MemLoader::new());
        assert_eq!(import_module(&mut state, "geo").unwrap_err(), ImportError::NotFound("geo".into()));
        assert_eq!(import_module(&mut state, "geo").unwrap_err(), ImportError::Failed("geo".into()));
        assert!(state.imports.stack.is_empty());
    }

    #[test]
    fn test_syntax_errors_become_diagnostics() {
        let loader = MemLoader::new().with_module("bad", &[("bad.pea", "type {")]);
        match loader.load("bad") {
            Err(ImportError::Check(diags)) => assert_eq!(diags.len(), 1),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_source_loader_missing_module() {
        let loader = SourceLoader::new(std::env::temp_dir().join("pea-no-such-root"));
        assert_eq!(loader.load("nothing").unwrap_err(), ImportError::NotFound("nothing".into()));
    }
}
