use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{NeoError, NeoResult};
use crate::project::{NeoConfig, ProjectLayout};

const HEADLESS_NAME: &str = if cfg!(windows) { "analyzeHeadless.bat" } else { "analyzeHeadless" };

/// Resolve the analyzeHeadless executable.
///
/// Precedence:
/// - `analyzer_path` (also set from `GHIDRA_ANALYZE_HEADLESS`).
/// - `ghidra_install_dir` (also set from `GHIDRA_INSTALL_DIR`), trying
///   `support/analyzeHeadless` and then the install root itself.
/// - `analyzeHeadless` on `PATH`.
pub fn resolve_headless_path(config: &NeoConfig) -> NeoResult<PathBuf> {
    if let Some(path) = &config.analyzer_path {
        if is_executable(path) {
            return Ok(path.clone());
        }
        return Err(NeoError::ToolNotFound(format!(
            "{} is not an executable file",
            path.display()
        )));
    }

    if let Some(dir) = &config.ghidra_install_dir {
        for candidate in [dir.join("support").join(HEADLESS_NAME), dir.join(HEADLESS_NAME)] {
            if is_executable(&candidate) {
                return Ok(candidate);
            }
        }
    }

    if let Ok(path) = which::which(HEADLESS_NAME) {
        return Ok(path);
    }

    Err(NeoError::ToolNotFound(
        "set GHIDRA_INSTALL_DIR or GHIDRA_ANALYZE_HEADLESS, or put analyzeHeadless on PATH"
            .to_string(),
    ))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Arguments for one headless import + post-script run.
pub fn headless_args(layout: &ProjectLayout, project_name: &str, binary: &Path) -> Vec<OsString> {
    vec![
        layout.project_dir.clone().into_os_string(),
        project_name.into(),
        "-import".into(),
        binary.as_os_str().to_os_string(),
        "-overwrite".into(),
        "-scriptPath".into(),
        layout.scripts_dir.clone().into_os_string(),
        "-postScript".into(),
        layout.script_name.clone().into(),
    ]
}

/// Captured result of a finished analyzer process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code, or `None` when terminated by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// stdout followed by stderr, the stream searched for the payload.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Run `program` to completion, killing it if it outlives `timeout`.
///
/// One deadline covers the exit and both output streams. On unix the analyzer
/// leads its own process group, and on expiry the whole group is killed so the
/// JVM that `analyzeHeadless` launches does not outlive it. The child is then
/// reaped before returning.
pub async fn run_with_timeout(
    program: &Path,
    args: &[OsString],
    timeout: Duration,
) -> NeoResult<ProcessOutput> {
    debug!(program = %program.display(), ?args, "spawning analyzer");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            NeoError::ToolNotFound(format!("failed to spawn {}: {e}", program.display()))
        }
        _ => NeoError::Io(format!("failed to spawn {}: {e}", program.display())),
    })?;
    let pid = child.id();

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| NeoError::Io("analyzer stdout was not captured".to_string()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| NeoError::Io("analyzer stderr was not captured".to_string()))?;

    let mut stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).await.map(|_| buf)
    });
    let mut stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr.read_to_end(&mut buf).await.map(|_| buf)
    });

    let finished = tokio::time::timeout(timeout, async {
        let status = child.wait().await?;
        let stdout = join_output(&mut stdout_task).await?;
        let stderr = join_output(&mut stderr_task).await?;
        Ok::<_, NeoError>((status, stdout, stderr))
    })
    .await;

    let (status, stdout, stderr) = match finished {
        Ok(done) => done?,
        Err(_) => {
            warn!(program = %program.display(), secs = timeout.as_secs(), "analyzer timed out; killing");
            kill_tree(&mut child, pid).await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(NeoError::Timeout(timeout));
        }
    };

    Ok(ProcessOutput {
        code: status.code(),
        success: status.success(),
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}

/// Kill the analyzer and everything it started, then reap it.
async fn kill_tree(child: &mut Child, pid: Option<u32>) {
    if let Some(pid) = pid {
        kill_group(pid);
    }
    // The leader may have exited already while a descendant held the pipes.
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    if let Err(e) = child.kill().await {
        warn!("failed to kill analyzer: {e}");
    }
}

/// SIGKILL the process group led by `pid`. The group outlives its leader
/// while any member is still running.
#[cfg(unix)]
fn kill_group(pid: u32) {
    if unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) } != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!(pid, "failed to kill analyzer process group: {err}");
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}

async fn join_output(
    task: &mut tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
) -> NeoResult<Vec<u8>> {
    task.await.map_err(|e| NeoError::Io(format!("output reader failed: {e}")))?.map_err(NeoError::from)
}
