//! Compile orchestration for stylepress.
//!
//! This crate resolves options, computes artifact paths, runs preprocessors,
//! drives a [`renderer::Renderer`], writes artifacts, and classifies failures
//! into diagnostics.

pub mod command;
pub mod diagnostics;
pub mod directives;
pub mod output_path;
pub mod pipeline;
pub mod preprocess;
pub mod renderer;
pub mod resolver;
pub mod writer;
