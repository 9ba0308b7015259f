//! Internal utilities for draining command output.
//!
//! stdout is captured (provisioners parse it, e.g. `/etc/os-release`) and
//! echoed at DEBUG level; stderr is only logged, at WARN level.

use std::io::{BufRead, BufReader, Read};

/// Type of output stream for logging purposes.
#[derive(Clone, Copy)]
pub(super) enum StreamType {
    Stdout,
    Stderr,
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Extracts a human-readable message from a thread panic.
pub(super) fn panic_message(err: &(dyn std::any::Any + Send)) -> &str {
    err.downcast_ref::<&str>()
        .copied()
        .or_else(|| err.downcast_ref::<String>().map(|s| s.as_str()))
        .unwrap_or("unknown panic")
}

/// Reads a pipe to EOF, logging each line and returning the stdout text.
///
/// - Binary data uses lossy UTF-8 conversion
/// - I/O errors stop reading but don't fail command execution;
///   success is determined by exit status
/// - stderr content is not retained; the returned string is empty
pub(super) fn drain_pipe<R: Read>(pipe: Option<R>, stream_type: StreamType) -> String {
    let Some(pipe) = pipe else {
        tracing::error!(
            stream = %stream_type,
            "pipe was None (unexpected: Stdio::piped() was set), no output will be captured"
        );
        return String::new();
    };

    let mut reader = BufReader::new(pipe);
    let mut line_buf = Vec::new();
    let mut captured = String::new();

    loop {
        line_buf.clear();
        match reader.read_until(b'\n', &mut line_buf) {
            Ok(0) => break, // EOF
            Ok(_) => {
                let text = String::from_utf8_lossy(&line_buf);
                let line = text.trim_end_matches('\n').trim_end_matches('\r');
                match stream_type {
                    StreamType::Stdout => {
                        tracing::debug!(stream = %stream_type, "{}", line);
                        captured.push_str(line);
                        captured.push('\n');
                    }
                    StreamType::Stderr => tracing::warn!(stream = %stream_type, "{}", line),
                }
            }
            Err(e) => {
                tracing::error!(stream = %stream_type, error = %e, "I/O error, stopping read");
                break;
            }
        }
    }

    captured
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_stdout_captures_lines() {
        let input: &[u8] = b"NAME=\"Ubuntu\"\r\nID=ubuntu\n";
        let out = drain_pipe(Some(input), StreamType::Stdout);
        assert_eq!(out, "NAME=\"Ubuntu\"\nID=ubuntu\n");
    }

    #[test]
    fn test_drain_stderr_is_not_captured() {
        let input: &[u8] = b"Warning: Permanently added host\n";
        assert_eq!(drain_pipe(Some(input), StreamType::Stderr), "");
    }

    #[test]
    fn test_drain_missing_pipe() {
        assert_eq!(drain_pipe(None::<&[u8]>, StreamType::Stdout), "");
    }
}
