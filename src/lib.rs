//! Diaglot - draw.io label translation
//!
//! Detects the dominant language of each page in a .drawio file and augments
//! every text-bearing node with per-language label attributes
//! (`label_de` / `label-de`, ...) on a UserObject wrapper, so diagrams.net
//! can display and switch between them.

pub mod cli;
pub mod codec;
pub mod config;
pub mod detect;
pub mod document;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod translate;
pub mod workflow;
pub mod writer;
