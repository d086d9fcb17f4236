//! Shell command execution.

use crate::error::Result;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
        }
    }

    /// One-line description of a failure for error messages.
    ///
    /// Uses the last non-empty stderr line when output was captured.
    pub fn failure_summary(&self) -> String {
        let code = match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        match self.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(line) => format!("{}: {}", code, line.trim()),
            None => code,
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Data written to the command's stdin.
    pub stdin: Option<String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,
}

impl CommandOptions {
    /// Options that capture both output streams.
    pub fn captured() -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }

    /// Set the working directory.
    pub fn in_dir(mut self, cwd: &Path) -> Self {
        self.cwd = Some(cwd.to_path_buf());
        self
    }

    /// Feed `input` to the command's stdin.
    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }
}

/// Execute a command line through `/bin/sh -c`.
pub fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c");
    cmd.arg(command);

    // Set working directory
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    // Set environment
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    // Configure stdio
    if options.stdin.is_some() {
        cmd.stdin(Stdio::piped());
    }

    if options.capture_stdout {
        cmd.stdout(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit());
    }

    if options.capture_stderr {
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stderr(Stdio::inherit());
    }

    tracing::debug!("Running: {}", command);
    let mut child = cmd.spawn()?;

    if let Some(input) = &options.stdin {
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes())?;
        }
    }

    let output = child.wait_with_output()?;
    let duration = start.elapsed();

    let stdout = if options.capture_stdout {
        String::from_utf8_lossy(&output.stdout).to_string()
    } else {
        String::new()
    };

    let stderr = if options.capture_stderr {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::new()
    };

    if output.status.success() {
        Ok(CommandResult::success(stdout, stderr, duration))
    } else {
        Ok(CommandResult::failure(
            output.status.code(),
            stdout,
            stderr,
            duration,
        ))
    }
}

/// Quote `arg` for `/bin/sh` when it contains anything but safe characters.
pub fn quote_arg(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+=:@%,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Find an executable named `name` in a `PATH`-style list of directories.
pub fn find_program_in(name: &str, path_var: &str) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// Whether `path` is a file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_successful_command() {
        let result = execute("echo hello", &CommandOptions::captured()).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    fn execute_failing_command() {
        let result = execute("exit 3", &CommandOptions::captured()).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn quote_arg_leaves_plain_paths_alone() {
        let rules = "/etc/udev/rules.d/11-panda.rules";
        assert_eq!(quote_arg(rules), rules);
        assert_eq!(quote_arg("/Users/me/My Project"), "'/Users/me/My Project'");
        assert_eq!(quote_arg("it's"), r"'it'\''s'");
        assert_eq!(quote_arg(""), "''");
    }

    #[test]
    fn quoted_arg_survives_the_shell() {
        let quoted = quote_arg("a b 'c'");
        let command = format!("printf %s {}", quoted);
        let result = execute(&command, &CommandOptions::captured()).unwrap();
        assert_eq!(result.stdout, "a b 'c'");
    }

    #[test]
    fn execute_with_env() {
        let options = CommandOptions::captured().with_env("MY_VAR", "my_value");

        let result = execute("echo $MY_VAR", &options).unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("my_value"));
    }

    #[test]
    fn execute_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = CommandOptions::captured().in_dir(temp.path());

        let result = execute("pwd", &options).unwrap();

        assert!(result.success);
        let name = temp.path().file_name().unwrap().to_string_lossy();
        assert!(result.stdout.contains(name.as_ref()));
    }

    #[test]
    fn execute_pipes_stdin() {
        let options = CommandOptions::captured().with_stdin("line one\nline two\n");

        let result = execute("wc -l", &options).unwrap();

        assert!(result.success);
        assert_eq!(result.stdout.trim(), "2");
    }

    #[test]
    fn failure_summary_uses_last_stderr_line() {
        let result = CommandResult::failure(
            Some(100),
            String::new(),
            "E: first\nE: Unable to locate package foo\n\n".to_string(),
            Duration::ZERO,
        );
        assert_eq!(
            result.failure_summary(),
            "exit code 100: E: Unable to locate package foo"
        );
    }

    #[test]
    fn failure_summary_without_output() {
        let result = CommandResult::failure(None, String::new(), String::new(), Duration::ZERO);
        assert_eq!(result.failure_summary(), "terminated by signal");
    }

    #[cfg(unix)]
    #[test]
    fn find_program_in_respects_exec_bit() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let tool = temp.path().join("tool");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();

        let path_var = temp.path().to_string_lossy().to_string();
        assert!(find_program_in("tool", &path_var).is_none());

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(find_program_in("tool", &path_var), Some(tool));
    }

    #[test]
    fn find_program_in_empty_path() {
        assert!(find_program_in("sh", "").is_none());
    }
}
