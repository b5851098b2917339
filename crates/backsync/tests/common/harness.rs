//! Isolated environment for end-to-end runs against a scripted rsync.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use backsync::config::{load_config_from_str, Config};
use backsync::{Notifier, NotifyError};

/// Output of a successful transfer: two additions, one update, one deletion
/// and an rsync 3.2 style stats block.
const SUCCESS_OUTPUT: &str = r#"receiving incremental file list
cd+++++++++ albums/
>f+++++++++ albums/beach.jpg
>f+++++++++ albums/city.jpg
>f.st...... notes.txt
*deleting   old/report.pdf

Number of files: 1,234 (reg: 1,200, dir: 34)
Number of created files: 2 (reg: 2)
Number of deleted files: 1 (reg: 1)
Number of regular files transferred: 3
Total file size: 2.10G bytes
Total transferred file size: 450.20M bytes
Literal data: 450.20M bytes
Matched data: 0 bytes
File list size: 12.34K
File list generation time: 0.001 seconds
File list transfer time: 0.000 seconds
Total bytes sent: 1.50K
Total bytes received: 450.31M

sent 1.50K bytes  received 450.31M bytes  9.01M bytes/sec
total size is 2.10G  speedup is 4.66"#;

/// Temporary workspace with a fake `rsync` executable.
///
/// The script appends its arguments to `invocations.log` and then behaves
/// according to the source directory it was asked to sync:
///
/// - `*/denied/` fails like an ssh authentication error
/// - `*/slow/` hangs until killed
/// - `*/broken/` succeeds without printing anything
/// - anything else succeeds with [`SUCCESS_OUTPUT`]
pub struct TestHarness {
    temp_dir: TempDir,
    pub rsync_path: PathBuf,
    pub invocations_path: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let rsync_path = temp_dir.path().join("fake-rsync");
        let invocations_path = temp_dir.path().join("invocations.log");
        let output_path = temp_dir.path().join("success-output.txt");

        std::fs::write(&output_path, format!("{}\n", SUCCESS_OUTPUT))
            .expect("Failed to write canned output");

        let script = format!(
            r#"#!/bin/sh
echo "$*" >> '{log}'
case "$*" in
  *:/srv/denied/*)
    echo "rsync: connection unexpectedly closed (0 bytes received so far) [Receiver]" >&2
    echo "backup@nas.local: Permission denied (publickey)." >&2
    exit 255
    ;;
  *:/srv/slow/*)
    exec sleep 30
    ;;
  *:/srv/broken/*)
    exit 0
    ;;
esac
cat '{output}'
"#,
            log = invocations_path.display(),
            output = output_path.display(),
        );
        write_executable(&rsync_path, &script);

        Self {
            temp_dir,
            rsync_path,
            invocations_path,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Builds a config syncing `/srv/<name>/` for each name, in order.
    pub fn config(&self, names: &[&str], timeout_secs: u64) -> Config {
        let directories: Vec<_> = names
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "source_path": format!("/srv/{}", name),
                    "dest_path": self.path().join("dest").join(name).display().to_string(),
                    "exclusions": ["*.tmp", ".cache/"],
                })
            })
            .collect();

        let config = json!({
            "source_server": "backup@nas.local",
            "ssh_key_path": self.path().join("id_ed25519").display().to_string(),
            "timeout": timeout_secs,
            "rsync_path": self.rsync_path.display().to_string(),
            "log_file": self.path().join("backup_sync.log").display().to_string(),
            "telegram": { "bot_token": "123456:TEST", "chat_id": "-1001" },
            "directories": directories,
        });

        load_config_from_str(&config.to_string()).expect("Harness config must be valid")
    }

    /// Argument lines the fake rsync was called with, in call order.
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(&self.invocations_path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(unix)]
fn write_executable(path: &Path, content: &str) {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    {
        let mut file = std::fs::File::create(path).expect("Failed to create script");
        file.write_all(content.as_bytes())
            .expect("Failed to write script");
        file.sync_all().expect("Failed to sync script");
    }
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
}

/// Notifier that keeps every message in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(NotifyError::Request("simulated outage".to_string()));
        }
        Ok(())
    }
}
