//! Reaction to an expired session: alert the operator, then stop the
//! recurring trigger so the job does not keep failing against dead cookies.
//!
//! Both steps are attempted every time and independently. Neither outcome
//! changes the run's exit code; the caller always reports an auth failure.

use anyhow::Context;
use pulse_scraper::WebhookNotifier;

/// Capability to halt whatever keeps invoking this job.
pub(crate) trait TriggerControl {
    fn name(&self) -> &str;

    async fn stop(&self) -> anyhow::Result<()>;
}

/// Stops a systemd timer unit with `systemctl stop <unit>`.
pub(crate) struct SystemdTimer {
    program: String,
    unit: String,
}

impl SystemdTimer {
    pub(crate) fn new(unit: &str) -> Self {
        Self {
            program: "systemctl".to_string(),
            unit: unit.to_string(),
        }
    }

    #[cfg(test)]
    fn with_program(program: &str, unit: &str) -> Self {
        Self {
            program: program.to_string(),
            unit: unit.to_string(),
        }
    }
}

impl TriggerControl for SystemdTimer {
    fn name(&self) -> &str {
        &self.unit
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let output = tokio::process::Command::new(&self.program)
            .arg("stop")
            .arg(&self.unit)
            .output()
            .await
            .with_context(|| format!("failed to run {} stop {}", self.program, self.unit))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} stop {} exited with {}: {}",
                self.program,
                self.unit,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResponderState {
    Idle,
    Notifying,
    Disabling,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NotifyOutcome {
    Delivered,
    Failed(String),
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResponderReport {
    pub notify: NotifyOutcome,
    pub trigger_stopped: bool,
    /// States entered after `Idle`, in order.
    pub trail: Vec<ResponderState>,
}

pub(crate) struct FailureResponder<'a, T> {
    notifier: Option<&'a WebhookNotifier>,
    webhook_url: Option<&'a str>,
    trigger: &'a T,
}

impl<'a, T: TriggerControl> FailureResponder<'a, T> {
    pub(crate) fn new(
        notifier: Option<&'a WebhookNotifier>,
        webhook_url: Option<&'a str>,
        trigger: &'a T,
    ) -> Self {
        Self {
            notifier,
            webhook_url,
            trigger,
        }
    }

    /// Walks `Idle -> Notifying -> Disabling -> Done`. Sub-step failures are
    /// logged and recorded in the report, never propagated.
    pub(crate) async fn respond(&self) -> ResponderReport {
        tracing::error!("authorization failed: session cookies have expired");

        let mut state = ResponderState::Idle;
        let mut trail = Vec::with_capacity(3);
        let mut notify = NotifyOutcome::NotConfigured;
        let mut trigger_stopped = false;

        loop {
            state = match state {
                ResponderState::Idle => ResponderState::Notifying,
                ResponderState::Notifying => {
                    notify = self.notify().await;
                    ResponderState::Disabling
                }
                ResponderState::Disabling => {
                    trigger_stopped = self.disable().await;
                    ResponderState::Done
                }
                ResponderState::Done => break,
            };
            tracing::debug!(?state, "auth failure responder advanced");
            trail.push(state);
        }

        self.log_operator_guidance();

        ResponderReport {
            notify,
            trigger_stopped,
            trail,
        }
    }

    async fn notify(&self) -> NotifyOutcome {
        let Some(url) = self.webhook_url else {
            tracing::warn!("no error_webhook configured; skipping alert");
            return NotifyOutcome::NotConfigured;
        };
        let Some(notifier) = self.notifier else {
            tracing::warn!("alert client unavailable; skipping alert");
            return NotifyOutcome::Failed("alert client unavailable".to_string());
        };

        tracing::info!("sending auth failure alert");
        match notifier.notify(url).await {
            Ok(()) => {
                tracing::info!("alert webhook delivered");
                NotifyOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!(error = %e, "alert webhook failed");
                NotifyOutcome::Failed(e.to_string())
            }
        }
    }

    async fn disable(&self) -> bool {
        let unit = self.trigger.name();
        tracing::info!(%unit, "stopping recurring trigger");
        match self.trigger.stop().await {
            Ok(()) => {
                tracing::info!(%unit, "recurring trigger stopped");
                true
            }
            Err(e) => {
                tracing::warn!(%unit, error = %format!("{e:#}"), "could not stop recurring trigger");
                false
            }
        }
    }

    fn log_operator_guidance(&self) {
        let unit = self.trigger.name();
        tracing::error!("operator action required to resume measurements:");
        tracing::error!("  1. log in to the community site again in a browser");
        tracing::error!("  2. copy the fresh session cookies from the browser dev tools");
        tracing::error!("  3. update `cookies` in the job config file");
        tracing::error!("  4. restart the schedule: sudo systemctl start {unit}");
    }
}
