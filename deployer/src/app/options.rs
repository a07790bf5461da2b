//! Batch run options

use crate::deploy::controller::PollSettings;
use crate::models::deployment::DeploymentFlags;
use crate::models::tool::ToolName;

/// Options for a deployment run over the enumerated tools
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Only deploy this tool; errors then abort the run
    pub target_tool: Option<ToolName>,

    /// Flags sent with every start request
    pub flags: DeploymentFlags,

    /// Poll loop settings
    pub poll: PollSettings,
}

impl DeployOptions {
    /// Whether the run is restricted to a single tool
    pub fn is_single_tool(&self) -> bool {
        self.target_tool.is_some()
    }
}
