//! # Code Ticker
//!
//! Live countdown and rotation for time-stepped one-time codes. The
//! actual code computation happens in the crypto engine behind the
//! bridge; this store decides *when* to ask.
//!
//! Two rules keep it honest under slow backends and suspended processes:
//!
//! - Step and countdown are recomputed on every tick straight from the
//!   wall clock (`current_time_ms`), never by counting elapsed ticks, so
//!   missed ticks self-correct instead of drifting.
//! - The current step is recorded *before* the computation call is
//!   issued, and issuing is single-flight. A slow response can therefore
//!   neither trigger a duplicate computation for its own step nor pile
//!   up concurrent calls.
//!
//! A failed computation blanks the code to the placeholder and keeps the
//! loop running; the next step boundary retries on its own.

use keywarden_core::{Observable, Watcher};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::bridge::{BoxedVaultBridge, VaultBridge};

/// Observable state of the ticker.
///
/// `code == None` renders as the placeholder; the ticker never leaves
/// the display empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeState {
    /// Current code, or `None` for the placeholder
    pub code: Option<String>,
    /// Seconds until the code rotates
    pub countdown_secs: u64,
    /// Rotation period of the armed secret
    pub period_secs: u64,
    /// Digit count of the armed secret
    pub digits: u32,
    /// Whether a secret is armed
    pub armed: bool,
    /// Last transient computation error
    pub last_error: Option<String>,
}

struct TickerInner {
    bridge: BoxedVaultBridge,
    state: Observable<CodeState>,
    /// Bumped on every arm and disarm; completions that captured an
    /// older generation are discarded instead of touching state.
    arm_generation: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Reactive store over [`CodeState`].
#[derive(Clone)]
pub struct CodeTicker {
    inner: Arc<TickerInner>,
}

impl CodeTicker {
    /// Create an idle ticker.
    pub fn new(bridge: BoxedVaultBridge) -> Self {
        Self {
            inner: Arc::new(TickerInner {
                bridge,
                state: Observable::new(CodeState::default()),
                arm_generation: AtomicU64::new(0),
                task: Mutex::new(None),
            }),
        }
    }

    /// Clone out the current state.
    pub fn state(&self) -> CodeState {
        self.inner.state.get()
    }

    /// Watch code-state changes.
    pub fn watch(&self) -> Watcher<CodeState> {
        self.inner.state.watch()
    }

    /// Whether a secret is currently armed.
    pub fn is_armed(&self) -> bool {
        self.inner.state.read(|s| s.armed)
    }

    /// Arm the ticker for a secret.
    ///
    /// Stops any previous timer, resets the display to the placeholder
    /// immediately (the first computation has not resolved yet), and
    /// starts the once-per-second tick loop. An empty secret or a zero
    /// period disarms instead.
    pub fn arm(&self, secret: impl Into<String>, period_secs: u64, digits: u32) {
        let secret = secret.into();
        if secret.is_empty() || period_secs == 0 {
            self.disarm();
            return;
        }

        self.stop_task();
        let generation = self.inner.arm_generation.fetch_add(1, Ordering::AcqRel) + 1;

        let now_secs = self.inner.bridge.current_time_ms() / 1_000;
        self.inner.state.set(CodeState {
            code: None,
            countdown_secs: period_secs - (now_secs % period_secs),
            period_secs,
            digits,
            armed: true,
            last_error: None,
        });

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let in_flight = Arc::new(AtomicBool::new(false));
            let mut last_step = u64::MAX;
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let now_secs = inner.bridge.current_time_ms() / 1_000;
                let step = now_secs / period_secs;
                let countdown = period_secs - (now_secs % period_secs);
                inner.state.mutate(|s| s.countdown_secs = countdown);

                if step == last_step {
                    continue;
                }
                // Record the step before issuing the call: a slow
                // response must not let a later tick recompute the same
                // step.
                last_step = step;

                if in_flight.swap(true, Ordering::AcqRel) {
                    continue;
                }
                let inner = inner.clone();
                let secret = secret.clone();
                let in_flight = in_flight.clone();
                tokio::spawn(async move {
                    let result = inner.bridge.generate_totp(&secret).await;
                    in_flight.store(false, Ordering::Release);
                    // The view closed or re-armed while we were out.
                    if inner.arm_generation.load(Ordering::Acquire) != generation {
                        return;
                    }
                    match result {
                        Ok(code) => inner.state.mutate(|s| {
                            s.code = Some(code);
                            s.last_error = None;
                        }),
                        Err(err) => {
                            tracing::warn!(error = %err, "code computation failed, blanking code");
                            inner.state.mutate(|s| {
                                s.code = None;
                                s.last_error = Some(err.to_string());
                            });
                        }
                    }
                });
            }
        });
        *self.inner.task.lock() = Some(handle);
    }

    /// Stop the timer and reset the display to the placeholder.
    pub fn disarm(&self) {
        self.inner.arm_generation.fetch_add(1, Ordering::AcqRel);
        self.stop_task();
        self.inner.state.set(CodeState::default());
    }

    fn stop_task(&self) {
        if let Some(handle) = self.inner.task.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedVault;

    const PERIOD: u64 = 30;

    async fn tick(vault: &Arc<ScriptedVault>, secs: u64) {
        // Advance the backend clock first so the next timer tick reads
        // the new time, then let the paused tokio clock reach the tick.
        vault.advance_clock(Duration::from_secs(secs));
        tokio::time::sleep(Duration::from_millis(secs * 1_000 + 10)).await;
    }

    fn armed_ticker(vault: &Arc<ScriptedVault>) -> CodeTicker {
        let ticker = CodeTicker::new(vault.clone());
        ticker.arm("JBSWY3DPEHPK3PXP", PERIOD, 6);
        ticker
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_shows_placeholder_then_code() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_clock(Duration::from_secs(95));
        vault.push_totp(0, Ok("111111".into()));

        let ticker = armed_ticker(&vault);
        // Placeholder before the first computation resolves.
        let state = ticker.state();
        assert!(state.armed);
        assert_eq!(state.code, None);
        assert_eq!(state.countdown_secs, PERIOD - 5);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(ticker.state().code.as_deref(), Some("111111"));
        assert_eq!(vault.totp_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_computation_per_step() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_clock(Duration::from_secs(90));
        let ticker = armed_ticker(&vault);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(vault.totp_calls(), 1);

        // A handful of ticks inside the same step: countdown moves, no
        // recomputation.
        for expected in [29, 28, 27] {
            tick(&vault, 1).await;
            let state = ticker.state();
            assert_eq!(state.countdown_secs, expected);
            assert!(state.countdown_secs <= PERIOD);
        }
        assert_eq!(vault.totp_calls(), 1);

        // Crossing the boundary issues exactly one more.
        tick(&vault, 27).await;
        assert_eq!(vault.totp_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_self_corrects_after_suspend() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_clock(Duration::from_secs(95));
        let ticker = armed_ticker(&vault);
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The process slept through 7 seconds of wall clock; the next
        // tick recomputes from the clock instead of drifting.
        tick(&vault, 7).await;
        assert_eq!(ticker.state().countdown_secs, PERIOD - 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_computation_is_single_flight() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_clock(Duration::from_secs(10));
        // First computation takes 5 wall seconds; step length is 1.
        vault.push_totp(5_000, Ok("111111".into()));

        let ticker = CodeTicker::new(vault.clone());
        ticker.arm("JBSWY3DPEHPK3PXP", 1, 6);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(vault.totp_calls(), 1);

        // Step boundaries pass while the call is pending: skipped.
        tick(&vault, 1).await;
        tick(&vault, 1).await;
        assert_eq!(vault.totp_calls(), 1);

        // After the slow call lands, the next boundary issues again.
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(ticker.state().code.as_deref(), Some("111111"));
        tick(&vault, 1).await;
        assert_eq!(vault.totp_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_computation_blanks_code_and_keeps_ticking() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_clock(Duration::from_secs(30));
        vault.push_totp(0, Ok("111111".into()));
        vault.push_totp(0, Err("engine gone".into()));
        vault.push_totp(0, Ok("222222".into()));

        let ticker = CodeTicker::new(vault.clone());
        ticker.arm("JBSWY3DPEHPK3PXP", 1, 6);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(ticker.state().code.as_deref(), Some("111111"));

        tick(&vault, 1).await;
        let state = ticker.state();
        assert_eq!(state.code, None);
        assert!(state.last_error.as_deref().unwrap().contains("engine gone"));
        assert!(state.armed);

        // The loop kept running and recovered at the next boundary.
        tick(&vault, 1).await;
        let state = ticker.state();
        assert_eq!(state.code.as_deref(), Some("222222"));
        assert_eq!(state.last_error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_stops_timer_and_resets_display() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_clock(Duration::from_secs(90));
        let ticker = armed_ticker(&vault);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(vault.totp_calls(), 1);

        ticker.disarm();
        assert_eq!(ticker.state(), CodeState::default());

        // No further ticks, no further computations.
        tick(&vault, 60).await;
        assert_eq!(vault.totp_calls(), 1);
        assert_eq!(ticker.state(), CodeState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_completion_after_disarm_is_discarded() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_clock(Duration::from_secs(10));
        vault.push_totp(1_000, Ok("111111".into()));

        let ticker = CodeTicker::new(vault.clone());
        ticker.arm("JBSWY3DPEHPK3PXP", PERIOD, 6);
        tokio::time::sleep(Duration::from_millis(10)).await;

        ticker.disarm();
        tokio::time::sleep(Duration::from_secs(2)).await;

        // The in-flight computation resolved after disarm: dropped.
        assert_eq!(ticker.state(), CodeState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_resets_to_placeholder() {
        let vault = Arc::new(ScriptedVault::new());
        vault.set_clock(Duration::from_secs(90));
        vault.push_totp(0, Ok("111111".into()));
        vault.push_totp(500, Ok("999999".into()));

        let ticker = armed_ticker(&vault);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(ticker.state().code.as_deref(), Some("111111"));

        ticker.arm("OTHERSECRET23456", PERIOD, 6);
        // Old code is gone before the new computation resolves.
        assert_eq!(ticker.state().code, None);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(ticker.state().code.as_deref(), Some("999999"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_secret_disarms() {
        let vault = Arc::new(ScriptedVault::new());
        let ticker = armed_ticker(&vault);
        ticker.arm("", PERIOD, 6);
        assert!(!ticker.is_armed());
    }
}
