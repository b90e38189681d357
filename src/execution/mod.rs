//! Running external commands as root or as the target user.
//!
//! Every installation backend goes through [`Executor`]. Output of `run` is
//! discarded; callers only see success or failure. `capture` is reserved for
//! read-only queries whose stdout is needed (package lists).

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ui::prelude::*;

pub mod identity;

#[cfg(test)]
pub mod testing;

pub use identity::TargetUser;

/// Who a command runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Root,
    User(TargetUser),
}

impl Identity {
    pub fn label(&self) -> &str {
        match self {
            Identity::Root => "root",
            Identity::User(user) => &user.name,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("`{command}` exited with {}", exit_label(.code))]
    Failed { command: String, code: Option<i32> },

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

impl ExecutionError {
    pub fn code(&self) -> Option<i32> {
        match self {
            ExecutionError::Failed { code, .. } => *code,
            ExecutionError::Spawn { .. } => None,
        }
    }
}

/// A single external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub identity: Identity,
    pub dir: Option<PathBuf>,
}

impl Invocation {
    /// A command run as root in the current directory.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            identity: Identity::Root,
            dir: None,
        }
    }

    /// Build from a shell-style command line, e.g. `make install PREFIX=/usr`.
    pub fn from_command_line(line: &str) -> Result<Self, shell_words::ParseError> {
        let words = shell_words::split(line)?;
        let mut words = words.into_iter();
        let program = words.next().unwrap_or_default();
        Ok(Self::new(program).args(words))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn as_user(self, user: &TargetUser) -> Self {
        self.identity(Identity::User(user.clone()))
    }

    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// The command line as a copy-pasteable string.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_word)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn expression(&self) -> duct::Expression {
        let mut expr = duct::cmd(self.program.as_str(), &self.args);
        if let Some(dir) = &self.dir {
            expr = expr.dir(dir);
        }
        if let Identity::User(user) = &self.identity {
            let (uid, gid) = (user.uid, user.gid);
            expr = expr
                .env("HOME", &user.home)
                .env("USER", &user.name)
                .env("LOGNAME", &user.name)
                .before_spawn(move |command| {
                    use std::os::unix::process::CommandExt;
                    command.gid(gid).uid(uid);
                    Ok(())
                });
        }
        expr
    }
}

/// Single-quote a word unless it only holds characters the shell leaves alone.
fn quote_word(word: &str) -> Cow<'_, str> {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=/.:,@+%".contains(c));
    if plain {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', r"'\''")))
    }
}

pub trait Executor {
    /// Run a command with its output discarded.
    fn run(&self, invocation: &Invocation) -> Result<(), ExecutionError>;

    /// Run a side-effect free command and return its stdout.
    fn capture(&self, invocation: &Invocation) -> Result<String, ExecutionError>;

    /// Whether `program` can be found on PATH.
    fn has_program(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    /// Filesystem changes made outside of commands are skipped when true.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Runs commands for real through duct.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, invocation: &Invocation) -> Result<(), ExecutionError> {
        let command = invocation.command_line();
        emit(
            Level::Debug,
            "exec.run",
            &format!(
                "{} (as {}) {}",
                char::from(NerdFont::Terminal),
                invocation.identity.label(),
                command
            ),
            None,
        );

        let output = invocation
            .expression()
            .stdout_null()
            .stderr_null()
            .stdin_null()
            .unchecked()
            .run()
            .map_err(|source| ExecutionError::Spawn {
                command: command.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ExecutionError::Failed {
                command,
                code: output.status.code(),
            })
        }
    }

    fn capture(&self, invocation: &Invocation) -> Result<String, ExecutionError> {
        let command = invocation.command_line();
        let output = invocation
            .expression()
            .stdout_capture()
            .stderr_null()
            .stdin_null()
            .unchecked()
            .run()
            .map_err(|source| ExecutionError::Spawn {
                command: command.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(ExecutionError::Failed {
                command,
                code: output.status.code(),
            })
        }
    }
}

/// Prints mutating commands instead of running them.
///
/// Queries still hit the real system so dry runs show accurate skip decisions.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunExecutor {
    inner: SystemExecutor,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn describe(invocation: &Invocation) -> String {
        let mut line = format!(
            "[DRY RUN] (as {}) {}",
            invocation.identity.label(),
            invocation.command_line()
        );
        if let Some(dir) = &invocation.dir {
            line.push_str(&format!("  [in {}]", dir.display()));
        }
        line
    }
}

impl Executor for DryRunExecutor {
    fn run(&self, invocation: &Invocation) -> Result<(), ExecutionError> {
        emit(Level::Info, "exec.dry_run", &Self::describe(invocation), None);
        Ok(())
    }

    fn capture(&self, invocation: &Invocation) -> Result<String, ExecutionError> {
        self.inner.capture(invocation)
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
