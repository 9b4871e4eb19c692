//! Tool table for every pipeline stage.
//!
//! Each stage has a closed set of supported tools. A tool knows which
//! executable to look for and how to lay out its options; the option map is a
//! pure function of the tool, the data type and the discovered executable.

use crate::binary_finder::Locator;
use crate::error::Result;
use crate::options::{OptionKey as K, StageOptions};
use clap::ValueEnum;
use std::fmt;
use tracing::debug;

const DIAMOND_SEARCH_PARAMS: &str =
    "--quiet --threads 1 --outfmt 6 --more-sensitive --id 50 --max-hsps 35 -k 0";
const FASTTREE_PARAMS: &str = "-quiet -mlacc 2 -slownni -spr 4 -fastest -mlnni 4 -no2nd";
const RAXML_SEED: &str = "-p 1989";
const UPP_PARAMS: &str = "-x 1 -M -1 -T 0.66 -B 999999999";

/// ASTRAL is a jar, invoked through a fixed java command line.
pub const ASTRAL_PROGRAM: &str = "java -jar /CM/tools/astral-4.11.1/astral.4.11.1.jar";

/// Thread count handed to the multithreaded FastTree build.
pub const FASTTREE_OMP_THREADS: &str = "3";

/// Kind of sequences the pipeline works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DataType {
    /// Nucleotides
    #[value(name = "n")]
    Nucleotide,
    /// Amino acids
    #[value(name = "a")]
    AminoAcid,
}

impl DataType {
    fn pick<'a>(self, nucleotide: &'a str, amino_acid: &'a str) -> &'a str {
        match self {
            DataType::Nucleotide => nucleotide,
            DataType::AminoAcid => amino_acid,
        }
    }
}

/// Pipeline stages, in the order they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    DbDna,
    DbAa,
    MapDna,
    MapAa,
    Msa,
    Trim,
    GeneTree1,
    GeneTree2,
    Tree1,
    Tree2,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::DbDna,
        Stage::DbAa,
        Stage::MapDna,
        Stage::MapAa,
        Stage::Msa,
        Stage::Trim,
        Stage::GeneTree1,
        Stage::GeneTree2,
        Stage::Tree1,
        Stage::Tree2,
    ];

    /// Section name in the configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::DbDna => "db_dna",
            Stage::DbAa => "db_aa",
            Stage::MapDna => "map_dna",
            Stage::MapAa => "map_aa",
            Stage::Msa => "msa",
            Stage::Trim => "trim",
            Stage::GeneTree1 => "gene_tree1",
            Stage::GeneTree2 => "gene_tree2",
            Stage::Tree1 => "tree1",
            Stage::Tree2 => "tree2",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == name)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tool's program name is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramSource {
    /// Search the path for `primary`, then for `fallback`
    Discover {
        primary: &'static str,
        fallback: Option<&'static str>,
    },
    /// Use a fixed command, no search
    Literal(&'static str),
}

impl ProgramSource {
    const fn exact(primary: &'static str) -> Self {
        ProgramSource::Discover {
            primary,
            fallback: None,
        }
    }

    const fn or(primary: &'static str, fallback: &'static str) -> Self {
        ProgramSource::Discover {
            primary,
            fallback: Some(fallback),
        }
    }
}

/// The program chosen for a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub name: String,
    /// `false` when the generic fallback binary was picked
    pub primary_found: bool,
}

impl Program {
    pub fn primary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_found: true,
        }
    }

    pub fn fallback(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_found: false,
        }
    }
}

/// A tool that can run one pipeline stage.
pub trait StageTool: fmt::Debug {
    /// Stage this tool belongs to.
    fn stage(&self) -> Stage;

    /// Name used on the command line of this crate.
    fn name(&self) -> &'static str;

    fn program_source(&self) -> ProgramSource;

    /// Lays out the options for an already chosen program.
    fn options(&self, data_type: DataType, program: &Program) -> Result<StageOptions>;

    /// Finds the program (if needed) and builds the stage options.
    fn resolve(&self, data_type: DataType, locator: &Locator) -> Result<StageOptions> {
        let program = match self.program_source() {
            ProgramSource::Discover { primary, fallback } => {
                let found = locator.locate(primary, fallback)?;
                Program {
                    name: found.name,
                    primary_found: found.primary_found,
                }
            }
            ProgramSource::Literal(command) => Program::primary(command),
        };
        debug!(
            "[{}] {} -> {} (primary: {})",
            self.stage(),
            self.name(),
            program.name,
            program.primary_found
        );
        self.options(data_type, &program)
    }
}

macro_rules! tool_names {
    ($ty:ty, $stage:expr, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl $ty {
            pub const STAGE: Stage = $stage;
        }
    };
}

/// Builder of the nucleotide database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DbDnaTool {
    Makeblastdb,
}

/// Builder of the amino-acid database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DbAaTool {
    Usearch,
    Diamond,
}

/// Mapper of genomes (nucleotide input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MapDnaTool {
    Blastn,
    Tblastn,
    Diamond,
}

/// Mapper of proteomes (amino-acid input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MapAaTool {
    Usearch,
    Diamond,
}

/// Multiple sequence aligner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MsaTool {
    Muscle,
    Mafft,
    Opal,
    Upp,
}

/// Alignment trimmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TrimTool {
    Trimal,
}

/// First pass of per-gene tree building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneTree1Tool {
    Fasttree,
    Raxml,
}

/// Refinement of gene trees, starting from the first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneTree2Tool {
    Raxml,
}

/// Species tree, first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tree1Tool {
    Fasttree,
    Raxml,
    Astral,
    Astrid,
}

/// Species tree refinement, starting from the first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tree2Tool {
    Raxml,
}

tool_names!(DbDnaTool, Stage::DbDna, { Makeblastdb => "makeblastdb" });
tool_names!(DbAaTool, Stage::DbAa, { Usearch => "usearch", Diamond => "diamond" });
tool_names!(MapDnaTool, Stage::MapDna, { Blastn => "blastn", Tblastn => "tblastn", Diamond => "diamond" });
tool_names!(MapAaTool, Stage::MapAa, { Usearch => "usearch", Diamond => "diamond" });
tool_names!(MsaTool, Stage::Msa, { Muscle => "muscle", Mafft => "mafft", Opal => "opal", Upp => "upp" });
tool_names!(TrimTool, Stage::Trim, { Trimal => "trimal" });
tool_names!(GeneTree1Tool, Stage::GeneTree1, { Fasttree => "fasttree", Raxml => "raxml" });
tool_names!(GeneTree2Tool, Stage::GeneTree2, { Raxml => "raxml" });
tool_names!(Tree1Tool, Stage::Tree1, { Fasttree => "fasttree", Raxml => "raxml", Astral => "astral", Astrid => "astrid" });
tool_names!(Tree2Tool, Stage::Tree2, { Raxml => "raxml" });

impl StageTool for DbDnaTool {
    fn stage(&self) -> Stage {
        Self::STAGE
    }

    fn name(&self) -> &'static str {
        DbDnaTool::name(self)
    }

    fn program_source(&self) -> ProgramSource {
        ProgramSource::exact("makeblastdb")
    }

    fn options(&self, _data_type: DataType, program: &Program) -> Result<StageOptions> {
        StageOptions::builder(Self::STAGE.as_str())
            .program_name(&program.name)
            .params("-parse_seqids -dbtype nucl")
            .input("-in")
            .output("-out")
            .version("-version")
            .command_line(&[K::ProgramName, K::Params, K::Input, K::Output])
            .build()
    }
}

impl StageTool for DbAaTool {
    fn stage(&self) -> Stage {
        Self::STAGE
    }

    fn name(&self) -> &'static str {
        DbAaTool::name(self)
    }

    fn program_source(&self) -> ProgramSource {
        match self {
            DbAaTool::Usearch => ProgramSource::exact("usearch"),
            DbAaTool::Diamond => ProgramSource::exact("diamond"),
        }
    }

    fn options(&self, _data_type: DataType, program: &Program) -> Result<StageOptions> {
        let builder = StageOptions::builder(Self::STAGE.as_str()).program_name(&program.name);
        let builder = match self {
            DbAaTool::Usearch => builder
                .params("-quiet")
                .input("-makeudb_ublast")
                .output("-output")
                .version("-version")
                .command_line(&[K::ProgramName, K::Params, K::Input, K::Output]),
            DbAaTool::Diamond => builder
                .params("makedb")
                .threads("--threads")
                .input("--in")
                .output("--db")
                .version("version")
                .command_line(&[K::ProgramName, K::Params, K::Threads, K::Input, K::Output]),
        };
        builder.build()
    }
}

impl StageTool for MapDnaTool {
    fn stage(&self) -> Stage {
        Self::STAGE
    }

    fn name(&self) -> &'static str {
        MapDnaTool::name(self)
    }

    fn program_source(&self) -> ProgramSource {
        match self {
            MapDnaTool::Blastn => ProgramSource::exact("blastn"),
            MapDnaTool::Tblastn => ProgramSource::exact("tblastn"),
            MapDnaTool::Diamond => ProgramSource::exact("diamond"),
        }
    }

    fn options(&self, _data_type: DataType, program: &Program) -> Result<StageOptions> {
        let builder = StageOptions::builder(Self::STAGE.as_str()).program_name(&program.name);
        let builder = match self {
            MapDnaTool::Blastn => builder
                .params("-outfmt 6 -max_target_seqs 1000000")
                .input("-query")
                .database("-db")
                .output("-out")
                .version("-version"),
            MapDnaTool::Tblastn => builder
                .params(concat!(
                    "-outfmt \"6 saccver qaccver pident length mismatch gapopen ",
                    "sstart send qstart qend evalue bitscore\" ",
                    "-evalue 1e-50 -max_target_seqs 1000000"
                ))
                .input("-subject")
                .database("-query")
                .output("-out")
                .version("-version"),
            MapDnaTool::Diamond => builder
                .params(format!("blastx {DIAMOND_SEARCH_PARAMS}"))
                .input("--query")
                .database("--db")
                .output("--out")
                .version("version"),
        };
        builder
            .command_line(&[K::ProgramName, K::Params, K::Input, K::Database, K::Output])
            .build()
    }
}

impl StageTool for MapAaTool {
    fn stage(&self) -> Stage {
        Self::STAGE
    }

    fn name(&self) -> &'static str {
        MapAaTool::name(self)
    }

    fn program_source(&self) -> ProgramSource {
        match self {
            MapAaTool::Usearch => ProgramSource::exact("usearch"),
            MapAaTool::Diamond => ProgramSource::exact("diamond"),
        }
    }

    fn options(&self, _data_type: DataType, program: &Program) -> Result<StageOptions> {
        let builder = StageOptions::builder(Self::STAGE.as_str()).program_name(&program.name);
        let builder = match self {
            MapAaTool::Usearch => builder
                .params("-quiet -evalue 1e-10 -maxaccepts 8 -maxrejects 32")
                .threads("-threads")
                .input("-ublast")
                .database("-db")
                .output("-blast6out")
                .version("-version")
                .command_line(&[
                    K::ProgramName,
                    K::Params,
                    K::Threads,
                    K::Input,
                    K::Database,
                    K::Output,
                ]),
            // diamond takes its thread count inside params
            MapAaTool::Diamond => builder
                .params(format!("blastp {DIAMOND_SEARCH_PARAMS}"))
                .input("--query")
                .database("--db")
                .output("--out")
                .version("version")
                .command_line(&[K::ProgramName, K::Params, K::Input, K::Database, K::Output]),
        };
        builder.build()
    }
}

impl StageTool for MsaTool {
    fn stage(&self) -> Stage {
        Self::STAGE
    }

    fn name(&self) -> &'static str {
        MsaTool::name(self)
    }

    fn program_source(&self) -> ProgramSource {
        match self {
            MsaTool::Muscle => ProgramSource::exact("muscle"),
            MsaTool::Mafft => ProgramSource::exact("mafft"),
            MsaTool::Opal => ProgramSource::exact("opal"),
            MsaTool::Upp => ProgramSource::or("run-upp.sh", "upp"),
        }
    }

    fn options(&self, data_type: DataType, program: &Program) -> Result<StageOptions> {
        let builder = StageOptions::builder(Self::STAGE.as_str()).program_name(&program.name);
        let builder = match self {
            MsaTool::Muscle => builder
                .params("-quiet -maxiters 2")
                .input("-in")
                .output("-out")
                .version("-version")
                .command_line(&[K::ProgramName, K::Params, K::Input, K::Output]),
            // mafft reads the input positionally and writes to stdout
            MsaTool::Mafft => builder
                .params("--quiet --anysymbol --auto")
                .environment(&[("TMPDIR", "/local-storage")])
                .version("--version")
                .positional_input()
                .positional_output()
                .command_template(format!(
                    "{} {} {} > {}",
                    K::ProgramName.placeholder(),
                    K::Params.placeholder(),
                    K::Input.placeholder(),
                    K::Output.placeholder()
                )),
            MsaTool::Opal => builder
                .params(data_type.pick("--quiet", "--quiet --protein"))
                .input("--in")
                .output("--out")
                .command_line(&[K::ProgramName, K::Params, K::Input, K::Output]),
            MsaTool::Upp => builder
                .params(format!(
                    "{UPP_PARAMS} {}",
                    data_type.pick("-m dna", "-m amino")
                ))
                .input("-s")
                .output("-o")
                .output_path("-d")
                .version("--version")
                .command_line(&[K::ProgramName, K::Params, K::Input, K::OutputPath, K::Output]),
        };
        builder.build()
    }
}

impl StageTool for TrimTool {
    fn stage(&self) -> Stage {
        Self::STAGE
    }

    fn name(&self) -> &'static str {
        TrimTool::name(self)
    }

    fn program_source(&self) -> ProgramSource {
        ProgramSource::exact("trimal")
    }

    fn options(&self, _data_type: DataType, program: &Program) -> Result<StageOptions> {
        StageOptions::builder(Self::STAGE.as_str())
            .program_name(&program.name)
            .params("-gappyout")
            .input("-in")
            .output("-out")
            .version("--version")
            .command_line(&[K::ProgramName, K::Params, K::Input, K::Output])
            .build()
    }
}

fn fasttree_params(data_type: DataType) -> String {
    format!(
        "{FASTTREE_PARAMS} {}",
        data_type.pick("-gtr -nt", "-lg")
    )
}

fn raxml_model(data_type: DataType) -> &'static str {
    data_type.pick("-m GTRCAT", "-m PROTCATLG")
}

/// RAxML gene trees: nucleotide folds the model into `params`, amino acid
/// passes it as a separate `model` option placed first.
fn raxml_gene_tree(
    stage: Stage,
    data_type: DataType,
    program: &Program,
    starting_tree: bool,
) -> Result<StageOptions> {
    let mut layout = vec![K::ProgramName];
    let builder = StageOptions::builder(stage.as_str())
        .program_name(&program.name)
        .input("-s")
        .output_path("-w")
        .output("-n")
        .version("-v");

    let builder = match data_type {
        DataType::Nucleotide => builder.params(format!("{RAXML_SEED} {}", raxml_model(data_type))),
        DataType::AminoAcid => {
            layout.push(K::Model);
            builder.params(RAXML_SEED).model(raxml_model(data_type))
        }
    };
    layout.push(K::Params);

    let builder = if starting_tree {
        layout.push(K::Database);
        builder.database("-t")
    } else {
        builder
    };
    layout.extend([K::OutputPath, K::Input, K::Output]);

    builder.command_line(&layout).build()
}

/// Multithreaded RAxML species trees; `-T` only when the pthreads build is
/// available.
fn raxml_species_tree(
    stage: Stage,
    data_type: DataType,
    program: &Program,
    starting_tree: bool,
) -> Result<StageOptions> {
    let mut layout = vec![K::ProgramName, K::Params];
    let mut builder = StageOptions::builder(stage.as_str())
        .program_name(&program.name)
        .params(format!("{RAXML_SEED} {}", raxml_model(data_type)))
        .input("-s")
        .output_path("-w")
        .output("-n")
        .version("-v");

    if program.primary_found {
        layout.push(K::Threads);
        builder = builder.threads("-T");
    }
    if starting_tree {
        layout.push(K::Database);
        builder = builder.database("-t");
    }
    layout.extend([K::OutputPath, K::Input, K::Output]);

    builder.command_line(&layout).build()
}

impl StageTool for GeneTree1Tool {
    fn stage(&self) -> Stage {
        Self::STAGE
    }

    fn name(&self) -> &'static str {
        GeneTree1Tool::name(self)
    }

    fn program_source(&self) -> ProgramSource {
        match self {
            GeneTree1Tool::Fasttree => ProgramSource::or("FastTree-2.1.9-SSE3", "fasttree"),
            GeneTree1Tool::Raxml => ProgramSource::or("raxmlHPC", "raxml"),
        }
    }

    fn options(&self, data_type: DataType, program: &Program) -> Result<StageOptions> {
        match self {
            GeneTree1Tool::Fasttree => StageOptions::builder(Self::STAGE.as_str())
                .program_name(&program.name)
                .params(fasttree_params(data_type))
                .output("-out")
                .positional_input()
                .command_line(&[K::ProgramName, K::Params, K::Output, K::Input])
                .build(),
            GeneTree1Tool::Raxml => raxml_gene_tree(Self::STAGE, data_type, program, false),
        }
    }
}

impl StageTool for GeneTree2Tool {
    fn stage(&self) -> Stage {
        Self::STAGE
    }

    fn name(&self) -> &'static str {
        GeneTree2Tool::name(self)
    }

    fn program_source(&self) -> ProgramSource {
        ProgramSource::or("raxmlHPC", "raxml")
    }

    fn options(&self, data_type: DataType, program: &Program) -> Result<StageOptions> {
        raxml_gene_tree(Self::STAGE, data_type, program, true)
    }
}

impl StageTool for Tree1Tool {
    fn stage(&self) -> Stage {
        Self::STAGE
    }

    fn name(&self) -> &'static str {
        Tree1Tool::name(self)
    }

    fn program_source(&self) -> ProgramSource {
        match self {
            Tree1Tool::Fasttree => ProgramSource::or("FastTreeMP-2.1.9-SSE3", "fasttree"),
            Tree1Tool::Raxml => ProgramSource::or("raxmlHPC-PTHREADS-SSE3", "raxml"),
            Tree1Tool::Astral => ProgramSource::Literal(ASTRAL_PROGRAM),
            Tree1Tool::Astrid => ProgramSource::exact("ASTRID"),
        }
    }

    fn options(&self, data_type: DataType, program: &Program) -> Result<StageOptions> {
        let builder = StageOptions::builder(Self::STAGE.as_str()).program_name(&program.name);
        match self {
            Tree1Tool::Fasttree => {
                let builder = builder
                    .params(fasttree_params(data_type))
                    .output("-out")
                    .positional_input()
                    .command_line(&[K::ProgramName, K::Params, K::Output, K::Input]);
                let builder = if program.primary_found {
                    builder.environment(&[("OMP_NUM_THREADS", FASTTREE_OMP_THREADS)])
                } else {
                    builder
                };
                builder.build()
            }
            Tree1Tool::Raxml => raxml_species_tree(Self::STAGE, data_type, program, false),
            Tree1Tool::Astral => builder
                .input("-i")
                .output("-o")
                .command_line(&[K::ProgramName, K::Input, K::Output])
                .build(),
            Tree1Tool::Astrid => builder
                .input("-i")
                .params("-m auto")
                .output("-o")
                .version("--help")
                .command_line(&[K::ProgramName, K::Input, K::Params, K::Output])
                .build(),
        }
    }
}

impl StageTool for Tree2Tool {
    fn stage(&self) -> Stage {
        Self::STAGE
    }

    fn name(&self) -> &'static str {
        Tree2Tool::name(self)
    }

    fn program_source(&self) -> ProgramSource {
        ProgramSource::or("raxmlHPC-PTHREADS-SSE3", "raxml")
    }

    fn options(&self, data_type: DataType, program: &Program) -> Result<StageOptions> {
        raxml_species_tree(Self::STAGE, data_type, program, true)
    }
}
