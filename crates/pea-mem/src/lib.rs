//! Memory management infrastructure for the Pea checker.
//!
//! The checker's definition graph is full of cycles: a type's fields refer
//! back to the type, a generic knows all of its instances, and every
//! instance points at the generic it came from. Rather than reference
//! counting, every node lives in an [`Arena`] and nodes refer to each other
//! through copyable [`Id`] handles.
//!
//! # Examples
//!
//! ```
//! use pea_mem::{Arena, Id};
//!
//! let mut arena: Arena<&str> = Arena::new();
//! let a: Id<&str> = arena.alloc("a");
//! let b = arena.alloc("b");
//!
//! assert_ne!(a, b);
//! assert_eq!(arena[a], "a");
//! assert_eq!(arena.len(), 2);
//! ```

pub mod arena;

pub use arena::{Arena, Id};
