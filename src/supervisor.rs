// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawns a driver process per target, waits for it to come up, performs the
//! connect handshake, and watches the child for the rest of its life.

use std::net::TcpListener as StdTcpListener;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::state::{driver_stdio, Registry, Status, TargetState};
use crate::upstream::client::DriverClient;

/// Spacing between `/status` poll attempts while waiting for a driver to
/// come up.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Maximum number of ready-poll attempts before giving up on this spawn.
const READY_POLL_ATTEMPTS: u32 = 50;
/// Delay before auto-reconnecting a target whose driver crashed.
const CRASH_RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Delay before retrying a target stuck in the `error` state.
const ERROR_BACKOFF: Duration = Duration::from_secs(30);
/// Grace period between SIGTERM and SIGKILL on disconnect.
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// Reserve an ephemeral loopback port for a driver's control-plane server by
/// binding then immediately releasing it. There is an inherent TOCTOU gap
/// between release and the driver's own bind; in practice this window is
/// far shorter than the race with any other process also using
/// bind-to-port-0.
fn reserve_port() -> anyhow::Result<u16> {
    let listener = StdTcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// Connect a single target: spawn its driver, wait for readiness, and
/// perform the handshake. Returns once the target reaches `connected` or
/// `error`; the crash watcher is spawned as a detached background task
/// before this function returns on success.
pub async fn connect(target: Arc<TargetState>) {
    // A second concurrent caller observes `connecting` and returns
    // immediately without contending for `connect_lock`.
    {
        let fields = target.fields.read().await;
        if fields.status == Status::Connecting {
            return;
        }
    }

    let _guard = target.connect_lock.lock().await;

    // Re-check after acquiring the lock: another attempt may have completed
    // while we were waiting.
    {
        let fields = target.fields.read().await;
        if fields.status == Status::Connecting || fields.status == Status::Connected {
            return;
        }
    }

    let (generation, attempt_cancel) = {
        let mut fields = target.fields.write().await;
        fields.status = Status::Connecting;
        fields.error = None;
        fields.generation += 1;
        let cancel = target.cancel_root.child_token();
        fields.cancel = cancel.clone();
        (fields.generation, cancel)
    };

    match spawn_and_handshake(&target).await {
        Ok((child, pid, info)) => {
            let cancel = target.cancel_root.child_token();
            {
                let mut fields = target.fields.write().await;
                if fields.generation != generation {
                    // A newer attempt superseded us while we were connecting;
                    // leave the child running under the watcher it spawned
                    // and abandon this one's bookkeeping.
                    return;
                }
                fields.process = Some(child);
                fields.pid = Some(pid);
                fields.cancel = cancel.clone();
                fields.connection = info;
                fields.status = Status::Connected;
            }
            spawn_crash_watcher(Arc::clone(&target), generation, cancel);
        }
        Err(e) => {
            tracing::warn!(target = %target.config.id, err = %e, "driver connect failed");
            {
                let mut fields = target.fields.write().await;
                if fields.generation == generation {
                    fields.status = Status::Error;
                    fields.error = Some(e.to_string());
                }
            }
            spawn_error_backoff(Arc::clone(&target), generation, attempt_cancel);
        }
    }
}

async fn spawn_and_handshake(
    target: &Arc<TargetState>,
) -> anyhow::Result<(tokio::process::Child, u32, crate::model::ConnectionInfo)> {
    let port = reserve_port()?;
    let control_url = format!("http://127.0.0.1:{port}");

    let (stdin, stdout, stderr) = driver_stdio();
    let mut cmd = tokio::process::Command::new("sh");
    cmd.args(["-c", &target.config.driver_cmd]);
    cmd.env("OPSNOTEBOOK_CONTROL_PORT", port.to_string());
    cmd.stdin(stdin);
    cmd.stdout(stdout);
    cmd.stderr(stderr);
    // Detach into its own process group so the driver and anything it
    // spawns survive this process's own restarts and can be torn down as a
    // unit.
    cmd.process_group(0);

    let mut child = cmd.spawn()?;
    let pid = child.id().unwrap_or(0);

    let client = DriverClient::new(control_url.clone());
    let mut ready = false;
    for _ in 0..READY_POLL_ATTEMPTS {
        if let Ok(exit) = try_wait(&mut child) {
            if let Some(status) = exit {
                anyhow::bail!("driver exited during startup: {status}");
            }
        }
        match client.poll_ready().await {
            Ok(true) => {
                ready = true;
                break;
            }
            _ => sleep(READY_POLL_INTERVAL).await,
        }
    }
    if !ready {
        let _ = child.start_kill();
        anyhow::bail!("driver failed to start http server");
    }

    let mut info = client.connect().await.map_err(|e| anyhow::anyhow!("{e}"))?;
    info.control_url = control_url;

    Ok((child, pid, info))
}

fn try_wait(child: &mut tokio::process::Child) -> std::io::Result<Option<std::process::ExitStatus>> {
    child.try_wait()
}

/// Watch a connected target's driver process; on exit, reconnect after a
/// short delay unless the target has since been superseded or cancelled.
fn spawn_crash_watcher(target: Arc<TargetState>, generation: u64, cancel: CancellationToken) {
    tokio::spawn(async move {
        let exit = {
            let mut fields = target.fields.write().await;
            match fields.process.take() {
                Some(mut child) => {
                    drop(fields);
                    child.wait().await
                }
                None => return,
            }
        };

        if cancel.is_cancelled() {
            return;
        }

        {
            let fields = target.fields.read().await;
            if fields.generation != generation {
                return;
            }
        }

        tracing::warn!(target = %target.config.id, exit = ?exit, "driver process exited, reconnecting");
        {
            let mut fields = target.fields.write().await;
            fields.status = Status::Disconnected;
            fields.process = None;
        }

        sleep(CRASH_RECONNECT_DELAY).await;
        connect(target).await;
    });
}

/// Disconnect a target: signal its process group to terminate, escalate to
/// SIGKILL after a grace period, and cancel its watcher.
pub async fn disconnect(target: &Arc<TargetState>) {
    target.fields.read().await.cancel.cancel();

    let pid = {
        let mut fields = target.fields.write().await;
        let pid = fields.pid.take();
        fields.process = None;
        fields.status = Status::Disconnected;
        fields.connection = crate::model::ConnectionInfo::default();
        pid
    };

    let Some(pid) = pid else { return };
    terminate_process_group(pid).await;
}

#[cfg(unix)]
async fn terminate_process_group(pid: u32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let group = Pid::from_raw(-(pid as i32));
    let _ = kill(group, Signal::SIGTERM);
    sleep(TERMINATE_GRACE).await;
    let _ = kill(group, Signal::SIGKILL);
}

#[cfg(not(unix))]
async fn terminate_process_group(_pid: u32) {}

/// Connect every target in the registry concurrently, used at startup.
pub async fn connect_all(registry: &Registry) {
    let targets = registry.all().await;
    let handles: Vec<_> = targets.into_iter().map(|t| tokio::spawn(connect(t))).collect();
    for handle in handles {
        let _ = handle.await;
    }
}

/// Disconnect every target in the registry, used on shutdown.
pub async fn shutdown(registry: &Registry) {
    let targets = registry.all().await;
    for target in &targets {
        disconnect(target).await;
    }
}

/// One-shot retry for a target that just landed in `error`: sleeps the
/// fixed backoff window anchored to this error transition, then calls
/// `connect()` again, unless `cancel` (the same per-attempt token this
/// failed attempt set) trips first — e.g. because `disconnect()` ran in the
/// meantime — or a newer attempt has since superseded this one.
fn spawn_error_backoff(target: Arc<TargetState>, generation: u64, cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = sleep(ERROR_BACKOFF) => {}
        }
        if should_retry_after_error(&target, generation).await {
            connect(target).await;
        }
    });
}

/// Whether a backoff-expired `error` attempt is still current and should
/// retry: the target must still be in `error`, and no newer attempt (a
/// manual reconnect, or another backoff) may have superseded this one.
async fn should_retry_after_error(target: &Arc<TargetState>, generation: u64) -> bool {
    let fields = target.fields.read().await;
    fields.status == Status::Error && fields.generation == generation
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
