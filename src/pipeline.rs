//! Assembly of the whole pipeline configuration.

use crate::binary_finder::Locator;
use crate::error::Result;
use crate::options::StageOptions;
use crate::selection::Selection;
use crate::stages::Stage;
use indexmap::IndexMap;
use tracing::info;

/// Option maps of every requested stage, in stage order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    stages: IndexMap<Stage, StageOptions>,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stage. A stage added twice keeps its first position.
    pub fn insert(&mut self, stage: Stage, options: StageOptions) {
        self.stages.insert(stage, options);
    }

    pub fn get(&self, stage: Stage) -> Option<&StageOptions> {
        self.stages.get(&stage)
    }

    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.stages.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &StageOptions)> {
        self.stages.iter().map(|(stage, opts)| (*stage, opts))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Resolves every selected tool into its stage options.
///
/// Stops at the first stage whose executable cannot be found; nothing is
/// returned for the stages already resolved.
pub fn build_pipeline(selection: &Selection, locator: &Locator) -> Result<PipelineConfig> {
    selection.validate()?;

    let mut config = PipelineConfig::new();
    for tool in selection.tools() {
        let options = tool.resolve(selection.data_type, locator)?;
        info!(
            "[{}] {}: {}",
            tool.stage(),
            options.program_name(),
            options.command_line()
        );
        config.insert(tool.stage(), options);
    }
    Ok(config)
}
