//! Marker parsing and partial evaluation
//!
//! This module builds expression trees from marker strings like
//! `python_version >= "3.8" and os_name == "nt"` and folds them against an
//! `Environment`.

mod builder;
pub mod cache;
mod evaluator;
pub mod lexer;
mod node;
mod token;


pub use builder::*;
pub use cache::*;
pub use evaluator::*;
pub use lexer::*;
pub use node::*;
pub use token::MarkerItem;
