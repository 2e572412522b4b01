//! # relaxis Core Library
//!
//! A library for organizing NMR relaxation data onto a structural hierarchy
//! of molecules, residues, and atomic spins, addressed through a compact
//! identification-string grammar with boolean combinators.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict two-layer architecture to keep the
//! grammar and data model reusable and independently testable.
//!
//! - **[`core`]: The Foundation.** Contains the stateless entity model (the
//!   molecule-residue-spin containers with their placeholder and uniqueness
//!   invariants) and the pure parsing machinery: the identification-string
//!   tokenizer, the element parser, and the boolean `Selection` object.
//!
//! - **[`engine`]: The Operations.** This layer applies selections to a
//!   concrete hierarchy: generator-style loops, unique-result lookups,
//!   positional index queries, and the mutating operations (create, copy,
//!   delete, rename, renumber, select) that every other subsystem of an
//!   analysis builds on.
//!
//! ## The identification string
//!
//! An entity is addressed by up to three tokens: `#molecule`, `:residue`,
//! and `@spin`, in that order. Tokens hold comma-separated numbers, names
//! (with `*`/`?` wildcards), or inclusive numeric ranges, and whole strings
//! combine with `&` and `|`:
//!
//! ```text
//! #ubi:1-10@N,HN        the N and HN spins of residues 1-10 of molecule ubi
//! :2 | :4               residues 2 and 4 of every molecule
//! ```

pub mod core;
pub mod engine;
