//! Deployment run over a set of tools
//!
//! Tools are processed one after another in enumeration order. In batch mode
//! a failing tool is recorded and the run moves on; with a target tool the
//! first error is returned.

use tracing::{error, info};

use crate::app::options::DeployOptions;
use crate::authn::token_mngr::TokenProvider;
use crate::deploy::clock::Clock;
use crate::deploy::controller::DeploymentController;
use crate::errors::DeployerError;
use crate::http::deployments::DeploymentApi;
use crate::models::deployment::DeploymentOutcome;
use crate::models::tool::ToolName;

/// Result for one tool
#[derive(Debug)]
pub enum ToolResult {
    /// The controller ran to a terminal outcome
    Completed(DeploymentOutcome),

    /// Token resolution or the controller failed
    Errored(DeployerError),
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Completed(outcome) if outcome.is_success())
    }
}

/// Results of a run, in processing order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<(ToolName, ToolResult)>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|(_, result)| result.is_success())
    }

    /// Whether the run should end with a failing exit status
    ///
    /// Only a single-tool run fails on an unsuccessful outcome; a batch run
    /// reports failures and still exits cleanly.
    pub fn should_fail(&self, single_tool: bool) -> bool {
        single_tool && !self.all_succeeded()
    }

    /// Tools whose deployment did not succeed
    pub fn unsuccessful(&self) -> Vec<&ToolName> {
        self.results
            .iter()
            .filter(|(_, result)| !result.is_success())
            .map(|(tool, _)| tool)
            .collect()
    }
}

/// Apply the target filter to the enumerated tools
pub fn select_tools(
    tools: Vec<ToolName>,
    target: Option<&ToolName>,
) -> Result<Vec<ToolName>, DeployerError> {
    match target {
        None => Ok(tools),
        Some(target) => {
            if tools.contains(target) {
                Ok(vec![target.clone()])
            } else {
                Err(DeployerError::NotFound(format!(
                    "no component config for target tool {}",
                    target
                )))
            }
        }
    }
}

/// Deploy every selected tool
pub async fn deploy_tools<T, A, C>(
    tools: Vec<ToolName>,
    token_provider: &T,
    api: &A,
    clock: &C,
    options: &DeployOptions,
) -> Result<BatchReport, DeployerError>
where
    T: TokenProvider,
    A: DeploymentApi,
    C: Clock,
{
    let tools = select_tools(tools, options.target_tool.as_ref())?;
    let controller = DeploymentController::new(api, clock, options.poll.clone());
    let mut report = BatchReport::default();

    for tool in tools {
        info!("Deploying {}", tool);

        let result = match token_provider.get_token(&tool).await {
            Ok(token) => controller.run_deployment(&tool, &token, options.flags).await,
            Err(e) => Err(e),
        };

        let result = match result {
            Ok(outcome) => {
                info!("{}: {}", tool, outcome);
                ToolResult::Completed(outcome)
            }
            Err(e) if options.is_single_tool() => return Err(e),
            Err(e) => {
                error!("Deployment of {} failed: {}", tool, e);
                ToolResult::Errored(e)
            }
        };
        report.results.push((tool, result));
    }

    Ok(report)
}
