//! User tool selection and its validation.

use crate::error::{PhyloCfgError, Result};
use crate::stages::{
    DataType, DbAaTool, DbDnaTool, GeneTree1Tool, GeneTree2Tool, MapAaTool, MapDnaTool, MsaTool,
    StageTool, Tree1Tool, Tree2Tool, TrimTool,
};
use std::path::Path;

/// Exactly one database builder is used per pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseChoice {
    Nucleotide(DbDnaTool),
    AminoAcid(DbAaTool),
}

/// The tools picked for every stage of the pipeline.
///
/// Optional stages left as `None` are not written to the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub data_type: DataType,
    pub database: DatabaseChoice,
    pub map_dna: Option<MapDnaTool>,
    pub map_aa: Option<MapAaTool>,
    pub msa: MsaTool,
    pub trim: Option<TrimTool>,
    pub gene_tree1: Option<GeneTree1Tool>,
    pub gene_tree2: Option<GeneTree2Tool>,
    pub tree1: Tree1Tool,
    pub tree2: Option<Tree2Tool>,
}

impl Selection {
    /// Creates a selection with only the mandatory stages set.
    pub fn new(
        data_type: DataType,
        database: DatabaseChoice,
        msa: MsaTool,
        tree1: Tree1Tool,
    ) -> Self {
        Self {
            data_type,
            database,
            map_dna: None,
            map_aa: None,
            msa,
            trim: None,
            gene_tree1: None,
            gene_tree2: None,
            tree1,
            tree2: None,
        }
    }

    /// Checks that the combination of stages is usable.
    ///
    /// # Errors
    /// [`PhyloCfgError::Configuration`] when no mapping tool is selected.
    pub fn validate(&self) -> Result<()> {
        if self.map_dna.is_none() && self.map_aa.is_none() {
            return Err(PhyloCfgError::Configuration(
                "at least one of --map_dna and --map_aa must be specified".to_string(),
            ));
        }
        Ok(())
    }

    /// Selected tools in stage order.
    pub fn tools(&self) -> Vec<&dyn StageTool> {
        let mut tools: Vec<&dyn StageTool> = Vec::with_capacity(10);
        match &self.database {
            DatabaseChoice::Nucleotide(tool) => tools.push(tool),
            DatabaseChoice::AminoAcid(tool) => tools.push(tool),
        }
        if let Some(tool) = &self.map_dna {
            tools.push(tool);
        }
        if let Some(tool) = &self.map_aa {
            tools.push(tool);
        }
        tools.push(&self.msa);
        if let Some(tool) = &self.trim {
            tools.push(tool);
        }
        if let Some(tool) = &self.gene_tree1 {
            tools.push(tool);
        }
        if let Some(tool) = &self.gene_tree2 {
            tools.push(tool);
        }
        tools.push(&self.tree1);
        if let Some(tool) = &self.tree2 {
            tools.push(tool);
        }
        tools
    }
}

/// Refuses an existing output file unless `overwrite` is set.
///
/// A directory at `path` is always refused.
pub fn check_output(path: &Path, overwrite: bool) -> Result<()> {
    if path.is_dir() {
        return Err(PhyloCfgError::Configuration(format!(
            "output path {} is a directory",
            path.display()
        )));
    }
    if path.is_file() && !overwrite {
        return Err(PhyloCfgError::OutputExists(path.to_path_buf()));
    }
    Ok(())
}
