//! Checking context.
//!
//! - **env**: the chained, immutable lookup scopes (type variables, then
//!   the module, then its imports, then the universal module)
//! - **state**: the one mutable block threaded through every checking
//!   function: the node store, memo tables, diagnostics and trace flag
//! - **subst**: the substitution engine

pub mod env;
pub mod state;
pub mod subst;

pub use env::{Env, FileScope, Imported, ModScope};
pub use state::{Builtins, State, TypeKey};

use fxhash::FxBuildHasher;

/// Hash map with the Fx hasher; all memo and marker tables use it.
pub type FxMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

pub type FxSet<K> = hashbrown::HashSet<K, FxBuildHasher>;
