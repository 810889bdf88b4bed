//! External command execution.
//!
//! Commands are spawned directly from an argv list; no shell is involved, so
//! arguments such as commit messages reach the child process verbatim.

use crate::log;
use anyhow::{Context, Result, anyhow, bail};
use portable_pty::{CommandBuilder, NativePtySystem, PtySize, PtySystem};
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::OsString,
    io::Read,
    path::Path,
    process::{Command, Output},
    sync::OnceLock,
};

// ============================================================================
// Macros
// ============================================================================

/// Run an external command with arguments.
///
/// # Examples
/// ```ignore
/// exec!(["git"]; "status", "-s")?;
/// exec!(root; ["git"]; "add", "docs")?;
/// exec!(pty=true; root; ["git"]; "push", "origin", "main")?;
/// exec!(filter=&QUIET; root; &config.builder.command;)?;
/// ```
#[macro_export]
macro_rules! exec {
    ($($tt:tt)*) => {
        $crate::exec_internal!(@parse_pty $($tt)*)
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! exec_internal {
    (@parse_pty pty=$pty:expr; $($rest:tt)*) => {
        $crate::exec_internal!(@parse_filter $pty; $($rest)*)
    };
    (@parse_pty $($rest:tt)*) => {
        $crate::exec_internal!(@parse_filter false; $($rest)*)
    };

    (@parse_filter $pty:expr; filter=$filter:expr; $($rest:tt)*) => {
        $crate::exec_internal!(@parse_root $pty; $filter; $($rest)*)
    };
    (@parse_filter $pty:expr; $($rest:tt)*) => {
        $crate::exec_internal!(@parse_root $pty; &$crate::utils::exec::EMPTY_FILTER; $($rest)*)
    };

    (@parse_root $pty:expr; $filter:expr; $root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec(
            Some($root),
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $filter,
            $pty,
        )
    };
    (@parse_root $pty:expr; $filter:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec(
            None,
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $filter,
            $pty,
        )
    };
}

// ============================================================================
// Argument Conversion
// ============================================================================

#[doc(hidden)]
pub mod internal {
    use std::ffi::OsString;

    #[inline]
    pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
        s.into()
    }

    pub trait ToCmd {
        fn to_cmd(self) -> Vec<OsString>;
    }

    impl<const N: usize> ToCmd for [&str; N] {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.into_iter().map(OsString::from).collect()
        }
    }

    impl ToCmd for &[String] {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.iter().map(OsString::from).collect()
        }
    }

    impl ToCmd for &Vec<String> {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.iter().map(OsString::from).collect()
        }
    }

    #[inline]
    pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
        cmd.to_cmd()
    }

    /// Drop empty args.
    #[inline]
    pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
        args.iter().filter(|a| !a.is_empty()).cloned().collect()
    }
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a command and capture its output.
///
/// # Errors
/// Returns error if the command cannot be spawned or exits non-zero.
pub fn exec(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
    filter: &FilterRule,
    pty: bool,
) -> Result<Output> {
    if pty {
        exec_with_pty(root, cmd, args, filter)
    } else {
        exec_no_pty(root, cmd, args, filter)
    }
}

fn exec_no_pty(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
    filter: &FilterRule,
) -> Result<Output> {
    let (name, mut command) = prepare(root, cmd, args)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    log_output(&name, &output, filter)?;
    Ok(output)
}

/// Execute a command attached to a pseudo-terminal.
///
/// For commands that change behavior when not attached to a terminal.
/// The master end is only read, so the child cannot be answered if it
/// prompts. Output is read on a separate thread because the read only
/// reaches EOF once the master end is dropped after the child exits.
fn exec_with_pty(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
    filter: &FilterRule,
) -> Result<Output> {
    let (name, builder) = prepare_pty(root, cmd, args)?;

    let pair = NativePtySystem::default().openpty(PtySize {
        rows: 24,
        cols: 80,
        pixel_width: 0,
        pixel_height: 0,
    })?;

    let mut child = pair
        .slave
        .spawn_command(builder)
        .with_context(|| format!("Failed to execute `{name}`"))?;
    // The child holds its own handle to the slave end.
    drop(pair.slave);

    let mut reader = pair.master.try_clone_reader()?;
    let reader_handle = std::thread::spawn(move || {
        let mut collected = String::new();
        let _ = reader.read_to_string(&mut collected);
        collected
    });

    let status = child.wait()?;
    drop(pair.master);

    let collected = reader_handle
        .join()
        .map_err(|_| anyhow!("Failed to join output reader thread"))?;

    if !status.success() {
        bail!(
            "Command `{name}` failed with exit code {}\n{}",
            status.exit_code(),
            collected.trim()
        );
    }

    filter.log(&name, &collected);

    #[cfg(unix)]
    #[allow(clippy::cast_possible_wrap)]
    let status = {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw((status.exit_code() as i32) << 8)
    };
    #[cfg(windows)]
    let status = {
        use std::os::windows::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(status.exit_code())
    };

    Ok(Output {
        status,
        stdout: collected.into_bytes(),
        stderr: Vec::new(),
    })
}

fn command_name(cmd: &[OsString]) -> Result<String> {
    cmd.first()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
        .context("Empty command")
}

fn prepare(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let name = command_name(cmd)?;

    let mut command = Command::new(&cmd[0]);
    command.args(&cmd[1..]).args(args);
    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

fn prepare_pty(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
) -> Result<(String, CommandBuilder)> {
    let name = command_name(cmd)?;

    let mut builder = CommandBuilder::new(&cmd[0]);
    builder.args(cmd[1..].iter().chain(args));
    if let Some(dir) = root {
        builder.cwd(dir);
    }

    Ok((name, builder))
}

/// Render an argv list the way it would be typed, for logging only.
pub fn display_command<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|arg| {
            let arg = arg.as_ref();
            if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
                format!("\"{}\"", arg.replace('"', "\\\""))
            } else {
                arg.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Output Filtering
// ============================================================================

fn strip_ansi(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    match RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").ok()) {
        Some(re) => re.replace_all(s, ""),
        None => Cow::Borrowed(s),
    }
}

/// Prefix-based filter for command output written to the log.
#[derive(Debug)]
pub struct FilterRule {
    /// Lines starting with any of these prefixes are skipped.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    fn log(&self, name: &str, output: &str) {
        let lines: Vec<&str> = output
            .lines()
            .filter(|line| !self.should_skip(strip_ansi(line).trim()))
            .collect();

        if !lines.is_empty() {
            log!(name; "{}", lines.join("\n"));
        }
    }
}

/// No skipping.
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Git reports progress on stderr even on success.
pub const GIT_FILTER: FilterRule = FilterRule::new(&[
    "Enumerating objects:",
    "Counting objects:",
    "Delta compression",
    "Compressing objects:",
    "Writing objects:",
    "Total ",
    "remote: Resolving deltas:",
]);

/// On success only stderr is logged; stdout is the command's business.
fn log_output(name: &str, output: &Output, filter: &FilterRule) -> Result<()> {
    if !output.status.success() {
        bail!(format_error(name, output, filter));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    filter.log(name, stderr.trim());
    Ok(())
}

fn format_error(name: &str, output: &Output, filter: &FilterRule) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let error_msg = filter
        .skip_prefixes
        .iter()
        .filter(|p| !p.is_empty())
        .fold(stderr.trim(), |s, p| s.trim_start_matches(p).trim_start());

    let mut msg = format!("Command `{name}` failed with {}\n", output.status);
    if !error_msg.is_empty() {
        msg.push_str(error_msg);
    }

    let stdout = stdout.trim();
    if !stdout.is_empty() {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout);
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::internal::*;
    use super::*;

    #[test]
    fn test_to_cmd_vec() {
        let cmd = to_cmd_vec(["git", "push"]);
        assert_eq!(cmd, vec![OsString::from("git"), OsString::from("push")]);

        let owned = vec!["make".to_string(), "html".to_string()];
        assert_eq!(to_cmd_vec(&owned).len(), 2);
        assert_eq!(to_cmd_vec(owned.as_slice())[1], OsString::from("html"));
    }

    #[test]
    fn test_filter_args() {
        let args = [OsString::from("-m"), OsString::new(), OsString::from("msg")];
        assert_eq!(filter_args(&args), vec![OsString::from("-m"), OsString::from("msg")]);
    }

    #[test]
    fn test_prepare_empty() {
        assert!(prepare(None, &[], &[]).is_err());
    }

    #[test]
    fn test_prepare_keeps_message_as_single_arg() {
        let cmd = to_cmd_vec(["git", "commit", "-m"]);
        let args = [OsString::from(r#"say "hi"; rm -rf /"#)];
        let (name, command) = prepare(None, &cmd, &args).unwrap();
        assert_eq!(name, "git");

        let argv: Vec<_> = command.get_args().collect();
        assert_eq!(argv.len(), 3);
        assert_eq!(argv[2], r#"say "hi"; rm -rf /"#);
    }

    #[test]
    fn test_display_command() {
        assert_eq!(display_command(&["git", "add", "docs"]), "git add docs");
        assert_eq!(
            display_command(&["git", "commit", "-m", "fix typo"]),
            "git commit -m \"fix typo\""
        );
        assert_eq!(display_command(&["echo", "a\"b"]), "echo \"a\\\"b\"");
    }

    #[test]
    fn test_filter_rule_should_skip() {
        assert!(GIT_FILTER.should_skip("Writing objects: 100% (3/3)"));
        assert!(!GIT_FILTER.should_skip("To github.com:user/notes.git"));
        assert!(EMPTY_FILTER.should_skip(""));
        assert!(!EMPTY_FILTER.should_skip("anything"));
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_ansi("\x1b[1;32mbuild succeeded\x1b[0m."), "build succeeded.");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_reports_failure() {
        let err = exec!(["false"];).unwrap_err();
        assert!(err.to_string().contains("Command `false` failed"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_runs_in_root() {
        let dir = tempfile::tempdir().unwrap();
        let output = exec!(dir.path(); ["pwd"];).unwrap();
        let printed = String::from_utf8_lossy(&output.stdout);
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(printed.trim()).canonicalize().unwrap(), expected);
    }
}
