// Scripted command runner for unit and workflow tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use super::{CommandOutput, CommandRunner, DelegatedCommand};

struct Rule {
    needle: String,
    /// Outputs are consumed front to back; the last one repeats.
    outputs: VecDeque<CommandOutput>,
}

/// Records every command and answers with the first rule whose needle occurs in the
/// command line. Unmatched commands succeed with empty output.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<DelegatedCommand>>,
    missing_tools: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            ..CommandOutput::default()
        }
    }

    pub(crate) fn failure(code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code: Some(code),
            stderr: stderr.to_string(),
            ..CommandOutput::default()
        }
    }

    pub(crate) fn on(&self, needle: &str, output: CommandOutput) {
        self.on_sequence(needle, vec![output]);
    }

    pub(crate) fn on_sequence(&self, needle: &str, outputs: Vec<CommandOutput>) {
        self.rules.lock().expect("rules lock").push(Rule {
            needle: needle.to_string(),
            outputs: outputs.into(),
        });
    }

    /// Make `locate` report `program` as absent.
    pub(crate) fn without_tool(&self, program: &str) {
        self.missing_tools
            .lock()
            .expect("tools lock")
            .push(program.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<DelegatedCommand> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.command_line()).collect()
    }

    pub(crate) fn count(&self, needle: &str) -> usize {
        self.command_lines()
            .iter()
            .filter(|l| l.contains(needle))
            .count()
    }

    /// Index of the first call containing `needle`.
    pub(crate) fn position(&self, needle: &str) -> Option<usize> {
        self.command_lines().iter().position(|l| l.contains(needle))
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &DelegatedCommand) -> Result<CommandOutput> {
        self.calls.lock().expect("calls lock").push(command.clone());
        let line = command.command_line();

        let mut rules = self.rules.lock().expect("rules lock");
        for rule in rules.iter_mut() {
            if line.contains(&rule.needle) {
                let out = if rule.outputs.len() > 1 {
                    rule.outputs.pop_front()
                } else {
                    rule.outputs.front().cloned()
                };
                return Ok(out.unwrap_or_else(|| ScriptedRunner::ok("")));
            }
        }
        Ok(ScriptedRunner::ok(""))
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        let missing = self.missing_tools.lock().expect("tools lock");
        if missing.iter().any(|p| p == program) {
            None
        } else {
            Some(PathBuf::from("/usr/bin").join(program))
        }
    }
}
