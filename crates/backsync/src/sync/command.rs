//! Construction of the rsync-over-ssh command line for one directory.

use std::path::{Path, PathBuf};

use super::types::DirectorySpec;

/// Remote shell settings shared by every job of a run.
#[derive(Debug, Clone)]
pub struct SshTransport {
    /// `user@host` of the source server.
    pub server: String,
    /// Private key passed to `ssh -i`.
    pub key_path: PathBuf,
    /// Value for `-o StrictHostKeyChecking=`.
    pub strict_host_key_checking: String,
}

impl SshTransport {
    pub fn new(server: impl Into<String>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            server: server.into(),
            key_path: key_path.into(),
            strict_host_key_checking: "no".to_string(),
        }
    }

    /// Renders the `-e` argument for rsync.
    ///
    /// `BatchMode` keeps ssh from prompting for a passphrase or password on a
    /// terminal that nobody watches.
    pub fn remote_shell(&self) -> String {
        format!(
            "ssh -i {} -o StrictHostKeyChecking={} -o BatchMode=yes",
            shell_quote_path(&self.key_path),
            self.strict_host_key_checking
        )
    }
}

/// Quotes a path for the remote-shell string rsync hands to `sh`.
pub fn shell_quote_path(path: &Path) -> String {
    let display = path.display().to_string();
    let escaped = display.replace('\'', "'\\''");
    if escaped.starts_with('-') {
        format!("'./{}'", escaped)
    } else {
        format!("'{}'", escaped)
    }
}

/// Program and argument vector for one sync job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SyncCommand {
    /// Builds the rsync invocation: archive, compression, itemized changes,
    /// stats block and deletion of extraneous files, pulling
    /// `server:source/` into `dest/`.
    pub fn for_directory(program: &str, spec: &DirectorySpec, transport: &SshTransport) -> Self {
        let mut args: Vec<String> = ["-avz", "--stats", "--itemize-changes", "--delete"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        args.push("-e".to_string());
        args.push(transport.remote_shell());

        for pattern in &spec.exclusions {
            args.push("--exclude".to_string());
            args.push(pattern.clone());
        }

        args.push(format!(
            "{}:{}",
            transport.server,
            with_trailing_slash(&spec.source_path)
        ));
        args.push(with_trailing_slash(&spec.dest_path));

        Self {
            program: program.to_string(),
            args,
        }
    }

    /// Arbitrary command, used to drive the runner with other tools.
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Single-line rendering for logs.
    pub fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                out.push('"');
                out.push_str(&arg.replace('"', "\\\""));
                out.push('"');
            } else {
                out.push_str(arg);
            }
        }
        out
    }
}

fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}
