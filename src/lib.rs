//! # phylocfg: tool configuration for phylogenetic pipelines
//!
//! A phylogenetic pipeline runs a fixed chain of external programs: a database
//! builder, a homology mapper, a multiple sequence aligner, an optional
//! trimmer, gene-tree builders and species-tree builders. This crate writes
//! the configuration file that tells the pipeline which executable to run at
//! every stage and how to lay out its command line.
//!
//! ## Overview
//!
//! - [`binary_finder`]: finds executables in `PATH` by a case-insensitive name
//!   fragment, falling back to a generic build when the preferred one is
//!   missing
//! - [`stages`]: the table of supported tools and the options of each
//! - [`options`]: option maps and `#key#` command-line templates
//! - [`selection`]: the user's choice of tools and its validation
//! - [`emitter`]: INI output
//!
//! ## Example Usage
//!
//! ```no_run
//! # use anyhow::Result;
//! # fn main() -> Result<()> {
//! use phylocfg::{generate, DataType, DatabaseChoice, Locator, Selection};
//! use phylocfg::stages::{DbDnaTool, MapDnaTool, MsaTool, Tree1Tool};
//! use std::path::Path;
//!
//! let mut selection = Selection::new(
//!     DataType::Nucleotide,
//!     DatabaseChoice::Nucleotide(DbDnaTool::Makeblastdb),
//!     MsaTool::Muscle,
//!     Tree1Tool::Fasttree,
//! );
//! selection.map_dna = Some(MapDnaTool::Blastn);
//!
//! let config = generate(&selection, Path::new("pipeline.cfg"), false, &Locator::from_env())?;
//! println!("{}", config.to_ini_string());
//! # Ok(())
//! # }
//! ```

pub mod binary_finder;
pub mod cli;
pub mod emitter;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod selection;
pub mod stages;

use std::path::Path;

pub use binary_finder::{Locator, Resolution};
pub use error::{PhyloCfgError, Result};
pub use options::{CommandLine, OptionKey, StageOptions};
pub use pipeline::{build_pipeline, PipelineConfig};
pub use selection::{DatabaseChoice, Selection};
pub use stages::{DataType, Stage, StageTool};

/// Validates the selection, resolves every stage and writes the file.
///
/// Nothing is written unless every stage resolved. The output path is checked
/// before any executable search.
pub fn generate(
    selection: &Selection,
    output: &Path,
    overwrite: bool,
    locator: &Locator,
) -> Result<PipelineConfig> {
    selection::check_output(output, overwrite)?;
    selection.validate()?;

    let config = build_pipeline(selection, locator)?;
    emitter::emit(&config, output, overwrite)?;
    Ok(config)
}
