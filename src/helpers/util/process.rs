//! Shell command execution
//!
//! Two modes, both synchronous:
//!
//! - pass-through: the child inherits our stdio, nothing is captured
//! - bounded capture: stdout and stderr share one pipe drained by a reader
//!   thread into a ring buffer of the last `max_lines` lines
//!
//! Captured bytes are decoded as code page 437. Every byte maps to exactly one
//! char so decoding never fails; output in other encodings comes back garbled
//! rather than as an error.

use crate::core::error::{BootstrapError, Result};
use std::collections::{BTreeMap, VecDeque};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Longest single line the reader buffers before splitting it.
const MAX_LINE_BYTES: u64 = 64 * 1024;

#[cfg(windows)]
const SHELL: (&str, &str) = ("cmd", "/C");
#[cfg(not(windows))]
const SHELL: (&str, &str) = ("sh", "-c");

/// Outcome of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub command: String,
    pub exit_code: i32,
    pub success: bool,
    /// Retained output, empty in pass-through mode.
    pub output: String,
}

/// Builder for a shell command.
///
/// ```ignore
/// let result = ProcessRunner::new("make -j4")
///     .dir("/tmp/build")
///     .env("PREFIX", "/usr/local")
///     .run_capture_limited(10)?;
/// ```
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cmd: String,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl ProcessRunner {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    /// Set the working directory for the command.
    pub fn dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set an environment variable for the command.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set multiple environment variables at once.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    pub fn command(&self) -> &str {
        &self.cmd
    }

    fn build_command(&self) -> Command {
        let (shell, flag) = SHELL;
        let mut cmd = Command::new(shell);
        cmd.arg(flag);
        // cmd.exe does its own quote parsing and does not understand the
        // `\"` escapes std would add. The command goes in verbatim inside one
        // extra pair of quotes, which /C strips again.
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.raw_arg(format!("\"{}\"", self.cmd));
        }
        #[cfg(not(windows))]
        cmd.arg(&self.cmd);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> BootstrapError {
        let path = self.cwd.clone().unwrap_or_else(|| PathBuf::from(SHELL.0));
        BootstrapError::io(path, e)
    }

    /// Run with inherited stdio and wait for exit.
    ///
    /// A non-zero exit is reported through the result, not as an error.
    pub fn run(&self) -> Result<CommandResult> {
        let status = self
            .build_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| self.spawn_error(e))?;

        Ok(self.finish(status, String::new()))
    }

    /// Run with stdout and stderr merged into one pipe, keeping only the last
    /// `max_lines` lines. `max_lines == 0` keeps nothing.
    pub fn run_capture_limited(&self, max_lines: usize) -> Result<CommandResult> {
        let (reader, writer) = std::io::pipe().map_err(|e| self.spawn_error(e))?;
        let stderr_writer = writer.try_clone().map_err(|e| self.spawn_error(e))?;

        let mut command = self.build_command();
        command
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer);
        let mut child = command.spawn().map_err(|e| self.spawn_error(e))?;
        // The command holds our copies of the write end; the reader only sees
        // end-of-stream once they are gone.
        drop(command);

        let drain = std::thread::spawn(move || tail_lines(reader, max_lines));

        let status = child.wait().map_err(|e| self.spawn_error(e))?;
        let lines = drain
            .join()
            .map_err(|_| self.spawn_error(std::io::Error::other("output reader panicked")))?
            .map_err(|e| self.spawn_error(e))?;

        let output: String = lines.into_iter().collect();
        Ok(self.finish(status, output))
    }

    fn finish(&self, status: ExitStatus, output: String) -> CommandResult {
        let exit_code = exit_code(status);
        CommandResult {
            command: self.cmd.clone(),
            exit_code,
            success: exit_code == 0,
            output,
        }
    }
}

/// Read `source` to end-of-stream, keeping the last `max_lines` lines.
fn tail_lines(source: impl Read, max_lines: usize) -> std::io::Result<VecDeque<String>> {
    let mut reader = BufReader::new(source);
    let mut lines = VecDeque::with_capacity(max_lines.min(1024));
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = (&mut reader).take(MAX_LINE_BYTES).read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        if max_lines == 0 {
            continue;
        }
        if lines.len() == max_lines {
            lines.pop_front();
        }
        lines.push_back(decode_cp437(&buf));
    }

    Ok(lines)
}

/// Exit code of a finished child. On Unix a signal-terminated child reports
/// the negated signal number.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

/// Decode bytes as code page 437.
pub fn decode_cp437(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                CP437_HIGH[(b - 0x80) as usize]
            }
        })
        .collect()
}

#[rustfmt::skip]
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];
