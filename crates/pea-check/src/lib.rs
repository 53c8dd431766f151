//! Pea semantic core.
//!
//! Takes the modules `pea-syntax` parses and produces a checked definition
//! graph: every name resolved, every generic use specialized to a canonical
//! instance, and the implicit methods of or-types and virtual types
//! synthesized. Checked modules can be written to a compact binary form
//! and read back.
//!
//! # Modules
//!
//! - [`types`] - the checked graph: types, functions, values, variables
//! - [`context`] - lookup scopes, the mutable checking state, substitution
//! - [`infer`] - instantiation and call-site inference
//! - [`builtin`] - the universal module
//! - [`codec`] - binary export and import
//!
//! A [`Session`] owns everything: the universal module, the node store
//! shared by all modules it checks, and the import cache. Imports are
//! served by the [`Loader`] in its [`Config`].
//!
//! # Examples
//!
//! ```
//! use pea_check::{Config, MemLoader, Session};
//!
//! let loader = MemLoader::new().with_module(
//!     "opt",
//!     &[("opt.pea", "type (T) Option { none | some: T }")],
//! );
//! let mut session = Session::new(Config::default().with_loader(loader)).expect("universe");
//!
//! let module = session
//!     .check_source(
//!         "main",
//!         "import \"opt\"\nfunc [first ^Int #opt Option | ^{Int #opt Option | some: 1}]",
//!     )
//!     .expect("checks");
//! assert_eq!(module.defs.len(), 1);
//! ```

pub mod builtin;
mod check;
pub mod codec;
mod config;
pub mod context;
mod error;
mod import;
pub mod infer;
pub mod types;

pub use check::Session;
pub use config::{Config, FloatSize, IntSize};
pub use context::{State, subst};
pub use error::{Defect, ImportError, Result};
pub use import::{Loader, MemLoader, SourceLoader};
pub use infer::inst;
pub use types::{Def, Mod, Store};
