use psrp_protocol::{CommandParameter, PsValue};

use crate::runspace_pool::PsInvocationState;

/// Represents a single parameter for a command
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Named { name: String, value: PsValue },
    Positional { value: PsValue },
    Switch { name: String, value: bool },
}

/// Represents a single PowerShell command in business logic terms
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineCommand {
    pub command_text: String,
    pub is_script: bool,
    pub parameters: Vec<Parameter>,
}

impl PipelineCommand {
    pub fn new_script(script: String) -> Self {
        Self {
            command_text: script,
            is_script: true,
            parameters: Vec::new(),
        }
    }

    pub fn new_command(command: String) -> Self {
        Self {
            command_text: command,
            is_script: false,
            parameters: Vec::new(),
        }
    }

    pub fn add_parameter(&mut self, params: Parameter) {
        self.parameters.push(params);
    }

    pub fn with_parameter(mut self, params: Parameter) -> Self {
        self.parameters.push(params);
        self
    }

    pub fn new_output_stream() -> PipelineCommand {
        let mut command = PipelineCommand::new_command("Out-String".to_string());
        command.add_parameter(Parameter::Switch {
            name: "Stream".to_string(),
            value: true,
        });
        command
    }
}

/// A pipeline's commands, ready to be created and invoked in one step by
/// `RunspacePool::invoke_spec`.
#[derive(Debug, Clone, Default)]
pub struct PipelineSpec {
    pub commands: Vec<PipelineCommand>,
}

/// Represents execution results in business terms
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub error_messages: Vec<String>,
    pub warning_messages: Vec<String>,
    pub debug_messages: Vec<String>,
    pub information_messages: Vec<String>,
    pub progress_records: Vec<psrp_protocol::ProgressRecord>,
    pub information_records: Vec<psrp_protocol::InformationRecord>,
}

/// Where a `Pipeline` entry came from: a fresh `CreatePipeline` issued by this client, or a
/// pipeline adopted from a shell this client did not originally open (discovered via
/// `runspace_pool::get_runspace_pools` and connected to, or surfaced by the server as already
/// running on `Reconnect`/`Connect`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOrigin {
    Local,
    Reconnected,
}

/// Internal representation of a PowerShell pipeline's state and configuration.
/// This is owned and managed by the `RunspacePool`.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub(crate) state: PsInvocationState,
    pub(crate) commands: Vec<PipelineCommand>,
    pub(crate) results: ExecutionResult,
    pub(crate) origin: PipelineOrigin,
    pub(crate) is_nested: bool,
    /// The currently running nested pipeline invoked against this pipeline, if any. A pipeline
    /// can host at most one nested invocation at a time, mirroring the single nested-pipeline
    /// slot PowerShell itself exposes per running pipeline.
    pub(crate) nested: Option<Box<Pipeline>>,
}

impl Pipeline {
    pub(crate) fn new() -> Self {
        Self {
            state: PsInvocationState::NotStarted,
            commands: Vec::new(),
            results: ExecutionResult::default(),
            origin: PipelineOrigin::Local,
            is_nested: false,
            nested: None,
        }
    }

    pub(crate) fn add_information_record(&mut self, record: psrp_protocol::InformationRecord) {
        self.results.information_records.push(record);
    }

    pub(crate) fn add_progress_record(&mut self, record: psrp_protocol::ProgressRecord) {
        self.results.progress_records.push(record);
    }

    pub(crate) fn add_command(&mut self, command: PipelineCommand) {
        self.commands.push(command);
    }

    /// Guards a nested-pipeline invocation against this pipeline as the parent: it must be a
    /// `Running` pipeline created locally by this client, not one adopted from a shell this
    /// client did not open.
    pub(crate) fn invoke_nested(&self) -> Result<(), crate::PwshCoreError> {
        if self.origin == PipelineOrigin::Reconnected {
            return Err(crate::PwshCoreError::InvalidOperation(
                "cannot start a nested pipeline on a pipeline connected to remotely",
            ));
        }

        if self.state != PsInvocationState::Running {
            return Err(crate::PwshCoreError::InvalidState(
                "parent pipeline must be Running to invoke a nested pipeline",
            ));
        }

        if self.nested.is_some() {
            return Err(crate::PwshCoreError::InvalidState(
                "pipeline already has a nested pipeline running",
            ));
        }

        Ok(())
    }
}

impl Pipeline {
    /// Convert the business-level pipeline to a protocol-level PowerShellPipeline
    pub(crate) fn to_protocol_pipeline(
        &self,
    ) -> Result<psrp_protocol::messages::create_pipeline::PowerShellPipeline, crate::PwshCoreError>
    {
        use psrp_protocol::Command;

        // Convert all commands to protocol commands
        let protocol_commands: Vec<Command> = self
            .commands
            .iter()
            .map(|cmd| {
                psrp_protocol::Command::builder()
                    .cmd(cmd.command_text.clone())
                    .is_script(cmd.is_script)
                    .args(
                        cmd.parameters
                            .iter()
                            .map(|param| match param {
                                Parameter::Named { name, value } => {
                                    CommandParameter::named(name.to_string(), value.clone())
                                }
                                Parameter::Positional { value } => {
                                    CommandParameter::positional(value.clone())
                                }
                                Parameter::Switch { name, value } => {
                                    CommandParameter::named(name.to_string(), *value)
                                }
                            })
                            .collect(),
                    )
                    .build()
            })
            .collect();

        Ok(
            psrp_protocol::messages::create_pipeline::PowerShellPipeline::builder()
                .is_nested(self.is_nested)
                .redirect_shell_error_output_pipe(true)
                .cmds(protocol_commands)
                .build(),
        )
    }
}
