//! Scriptable executor for unit tests.

use std::cell::RefCell;
use std::collections::HashSet;

use super::{ExecutionError, Executor, Identity, Invocation};

type Responder = Box<dyn Fn(&Invocation) -> Result<(), ExecutionError>>;

/// Records every invocation; outcomes come from an optional responder.
pub struct RecordingExecutor {
    calls: RefCell<Vec<Invocation>>,
    responder: Option<Responder>,
    captures: Vec<(String, String)>,
    programs: HashSet<String>,
    dry_run: bool,
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingExecutor {
    /// Every command succeeds.
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            responder: None,
            captures: Vec::new(),
            programs: HashSet::new(),
            dry_run: false,
        }
    }

    /// Decide each command's outcome with `responder`.
    pub fn responding<F>(responder: F) -> Self
    where
        F: Fn(&Invocation) -> Result<(), ExecutionError> + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    /// Stdout returned by `capture` for a command line starting with `prefix`.
    pub fn with_capture(mut self, prefix: &str, stdout: &str) -> Self {
        self.captures.push((prefix.to_string(), stdout.to_string()));
        self
    }

    /// Programs reported as present on PATH.
    pub fn with_program(mut self, program: &str) -> Self {
        self.programs.insert(program.to_string());
        self
    }

    /// Report itself as a dry-run executor.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(Invocation::command_line).collect()
    }

    pub fn count_matching(&self, prefix: &str) -> usize {
        self.command_lines()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    pub fn identities_for(&self, program: &str) -> Vec<Identity> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.program == program)
            .map(|call| call.identity.clone())
            .collect()
    }
}

/// Failure helper for responders.
pub fn fail(invocation: &Invocation) -> Result<(), ExecutionError> {
    Err(ExecutionError::Failed {
        command: invocation.command_line(),
        code: Some(1),
    })
}

impl Executor for RecordingExecutor {
    fn run(&self, invocation: &Invocation) -> Result<(), ExecutionError> {
        self.calls.borrow_mut().push(invocation.clone());
        match &self.responder {
            Some(responder) => responder(invocation),
            None => Ok(()),
        }
    }

    fn capture(&self, invocation: &Invocation) -> Result<String, ExecutionError> {
        let line = invocation.command_line();
        self.captures
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, stdout)| stdout.clone())
            .ok_or_else(|| ExecutionError::Failed {
                command: line,
                code: Some(1),
            })
    }

    fn has_program(&self, program: &str) -> bool {
        self.programs.contains(program)
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
