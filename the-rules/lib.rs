//! Pattern-triggered text transformations for a rope-backed editor.
//!
//! The crate contains a small host model (documents with marks, change sets,
//! invertible transforms, editor state with plugins and a view that receives
//! text input) and the [`input_rules`] engine that plugs into it.

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod commands;
pub mod config;
pub mod document;
pub mod history;
pub mod input_rules;
pub mod schedule;
pub mod selection;
pub mod state;
pub mod transaction;
pub mod transform;
pub mod view;

pub type Tendril = SmartString<LazyCompact>;
