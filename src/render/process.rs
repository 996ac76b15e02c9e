use std::{
    io::Read,
    process::{Child, Command, ExitStatus, Stdio},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use crate::error::{MatvizError, MatvizResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exit status and captured output of a finished tool run.
#[derive(Clone, Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

fn drain(mut src: impl Read + Send + 'static) -> Drain {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        src.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_drain(handle: Option<Drain>, stream: &str) -> MatvizResult<String> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| anyhow::anyhow!("{stream} drain thread panicked"))?
        .map_err(|e| anyhow::anyhow!("{stream} read failed: {e}"))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

/// Run `cmd` to completion, capturing stdout and stderr, and kill it once `timeout` elapses.
///
/// A program that cannot be found maps to [`MatvizError::ToolMissing`].
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> MatvizResult<Captured> {
    let program = program_name(&cmd);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MatvizError::ToolMissing(vec![program.clone()]),
        _ => MatvizError::Other(anyhow::anyhow!("failed to spawn {program}: {e}")),
    })?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let Some(status) = wait_deadline(&mut child, timeout)? else {
        tracing::warn!(%program, timeout_secs = timeout.as_secs(), "killing tool after timeout");
        let _ = child.kill();
        let _ = child.wait();
        // Grandchildren may still hold the pipes open; the drain threads are left detached.
        return Err(MatvizError::Timeout(timeout));
    };

    Ok(Captured {
        status,
        stdout: join_drain(stdout, "stdout")?,
        stderr: join_drain(stderr, "stderr")?,
    })
}

fn wait_deadline(child: &mut Child, timeout: Duration) -> MatvizResult<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        let polled = child
            .try_wait()
            .map_err(|e| anyhow::anyhow!("failed to wait for child process: {e}"))?;
        if let Some(status) = polled {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
