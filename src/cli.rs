//! Command-line arguments of the `phylocfg` binary.

use crate::error::{PhyloCfgError, Result};
use crate::selection::{DatabaseChoice, Selection};
use crate::stages::{
    DataType, DbAaTool, DbDnaTool, GeneTree1Tool, GeneTree2Tool, MapAaTool, MapDnaTool, MsaTool,
    Tree1Tool, Tree2Tool, TrimTool,
};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "phylocfg",
    version,
    about = "Write the tool configuration file of a phylogenetic pipeline",
    long_about = "Looks up the executables of the selected tools in your PATH and writes, for every \
                  pipeline stage, the program to run, its parameters and the command line template \
                  the pipeline uses to invoke it."
)]
#[command(group(ArgGroup::new("database").required(true).args(["db_dna", "db_aa"])))]
pub struct Cli {
    /// Output file for the configuration. An existing file is never overwritten
    /// unless --overwrite is given
    #[arg(short, long)]
    pub output: PathBuf,

    /// Type of the database: 'n' for nucleotides, 'a' for amino acids
    #[arg(short = 'd', long = "db_type", value_enum)]
    pub db_type: DataType,

    /// Program building the nucleotide database
    #[arg(long = "db_dna", value_enum)]
    pub db_dna: Option<DbDnaTool>,

    /// Program building the amino-acid database
    #[arg(long = "db_aa", value_enum)]
    pub db_aa: Option<DbAaTool>,

    /// Program mapping genomes against the database
    #[arg(long = "map_dna", value_enum)]
    pub map_dna: Option<MapDnaTool>,

    /// Program mapping proteomes against the database
    #[arg(long = "map_aa", value_enum)]
    pub map_aa: Option<MapAaTool>,

    /// Multiple sequence alignment program
    #[arg(long, value_enum)]
    pub msa: MsaTool,

    /// Add the trim section
    #[arg(long, value_enum)]
    pub trim: Option<TrimTool>,

    /// Add the gene_tree1 section
    #[arg(long = "gene_tree1", value_enum)]
    pub gene_tree1: Option<GeneTree1Tool>,

    /// Add the gene_tree2 section
    #[arg(long = "gene_tree2", value_enum)]
    pub gene_tree2: Option<GeneTree2Tool>,

    /// Program building the species tree
    #[arg(long, value_enum)]
    pub tree1: Tree1Tool,

    /// Add the tree2 section
    #[arg(long, value_enum)]
    pub tree2: Option<Tree2Tool>,

    /// Overwrite the output file if it exists
    #[arg(long)]
    pub overwrite: bool,

    /// Print more details
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Converts the parsed arguments into a tool selection.
    pub fn selection(&self) -> Result<Selection> {
        let database = match (self.db_dna, self.db_aa) {
            (Some(tool), None) => DatabaseChoice::Nucleotide(tool),
            (None, Some(tool)) => DatabaseChoice::AminoAcid(tool),
            _ => {
                return Err(PhyloCfgError::Configuration(
                    "exactly one of --db_dna and --db_aa must be specified".to_string(),
                ))
            }
        };

        Ok(Selection {
            data_type: self.db_type,
            database,
            map_dna: self.map_dna,
            map_aa: self.map_aa,
            msa: self.msa,
            trim: self.trim,
            gene_tree1: self.gene_tree1,
            gene_tree2: self.gene_tree2,
            tree1: self.tree1,
            tree2: self.tree2,
        })
    }
}
