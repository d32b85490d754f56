//! Shared primitives: conventions, errors, embedded templates, and the
//! small amount of git plumbing both halves of the tool need.

pub mod assets;
pub mod config;
pub mod error;
pub mod git;
