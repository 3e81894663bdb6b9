use crate::error::RelayError;
use crate::playback::{PlaybackSink, PlayerCommand};
use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Grace period between SIGTERM and SIGKILL when the player will not exit.
const TERMINATE_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

type SharedChild = Arc<Mutex<Option<Child>>>;

/// External player fed through its stdin pipe.
///
/// The child stays behind a mutex until it is reaped, so a [`PlayerHandle`]
/// never signals a pid that has already been recycled.
pub struct ProcessSink {
    program: String,
    child: SharedChild,
    stdin: Option<ChildStdin>,
    drain_timeout: Duration,
}

/// Stops the player from another thread, e.g. the Ctrl-C handler.
#[derive(Clone)]
pub struct PlayerHandle {
    program: String,
    child: SharedChild,
}

impl ProcessSink {
    /// Spawns the player in its own process group, so a terminal Ctrl-C
    /// reaches only the relay, which then stops the player itself.
    pub fn spawn(command: &PlayerCommand, drain_timeout: Duration) -> Result<Self, RelayError> {
        let launch_error = |source: std::io::Error| RelayError::Launch {
            program: command.program.clone(),
            source,
        };

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).stdin(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(launch_error)?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(launch_error(std::io::Error::other("cannot take player stdin")));
        };

        info!(program = %command.program, args = ?command.args, pid = child.id(), "player started");

        Ok(Self {
            program: command.program.clone(),
            child: Arc::new(Mutex::new(Some(child))),
            stdin: Some(stdin),
            drain_timeout,
        })
    }

    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle {
            program: self.program.clone(),
            child: self.child.clone(),
        }
    }
}

impl PlayerHandle {
    /// Asks the player to exit. A write blocked on its full pipe then fails
    /// with EPIPE. No-op once the player has exited or been reaped.
    pub fn terminate(&self) {
        if let Some(child) = lock(&self.child).as_mut() {
            send_terminate(child, &self.program);
        }
    }
}

impl PlaybackSink for ProcessSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), RelayError> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            RelayError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "player input already closed",
            ))
        })?;
        stdin.write_all(chunk).map_err(RelayError::Write)?;
        stdin.flush().map_err(RelayError::Write)
    }

    /// Closes stdin and reaps the player. It gets `drain_timeout` to play out
    /// what is buffered, then SIGTERM, then SIGKILL.
    fn close(&mut self) {
        // EOF lets the player drain what it has and exit on its own
        drop(self.stdin.take());

        let started = Instant::now();
        let mut terminated = false;
        loop {
            {
                let mut guard = lock(&self.child);
                let Some(child) = guard.as_mut() else {
                    return;
                };

                match child.try_wait() {
                    Ok(Some(status)) => {
                        debug!(program = %self.program, %status, "player exited");
                        guard.take();
                        return;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(program = %self.program, "cannot reap player: {e}");
                        guard.take();
                        return;
                    }
                }

                let elapsed = started.elapsed();
                if elapsed >= self.drain_timeout + TERMINATE_TIMEOUT {
                    warn!(program = %self.program, "player ignored SIGTERM, killing");
                    let _ = child.kill();
                    let _ = child.wait();
                    guard.take();
                    return;
                }
                if elapsed >= self.drain_timeout && !terminated {
                    warn!(program = %self.program, "player still running after input closed");
                    send_terminate(child, &self.program);
                    terminated = true;
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for ProcessSink {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock(child: &SharedChild) -> MutexGuard<'_, Option<Child>> {
    match child.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn send_terminate(child: &mut Child, program: &str) {
    // exited children must not be signalled, their pid may be reused once reaped
    if !matches!(child.try_wait(), Ok(None)) {
        return;
    }

    #[cfg(unix)]
    {
        let pid = child.id();
        // SAFETY: pid belongs to our own unreaped Child, guarded by the mutex.
        let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
        if ret != 0 {
            let err = std::io::Error::last_os_error();
            warn!(program, pid, error = %err, "failed to send SIGTERM");
        } else {
            debug!(program, pid, "sent SIGTERM to player");
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = child.kill() {
            warn!(program, "failed to stop player: {e}");
        }
    }
}
