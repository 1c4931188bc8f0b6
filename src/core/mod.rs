//! Core logic – table engine, product draft reducer, schema validation.
//!
//! Nothing in this module depends on any TUI or rendering crate, so every
//! rule here is testable without a terminal.

pub mod catalog;
pub mod form;
pub mod image;
pub mod product;
pub mod submit;
pub mod table;
pub mod validation;
