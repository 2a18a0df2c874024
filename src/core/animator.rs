//! Cosmetic "agent" terminal.
//!
//! Plays a fixed script of lines per phase. Lines are not tied to backend
//! progress in any way; they only give the user something to watch.

use crate::config::pacing::{ScriptLine, Scripts};
use crate::domain::model::Phase;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const LINE_PREFIX: &str = "> ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusView {
    pub phase: Option<Phase>,
    pub process_id: Option<String>,
    pub lines: Vec<String>,
}

/// Number of script lines visible `elapsed` after the phase started.
pub fn lines_due(lines: &[ScriptLine], elapsed: Duration) -> usize {
    lines.iter().take_while(|line| line.offset() <= elapsed).count()
}

struct Playback {
    phase: Phase,
    token: CancellationToken,
}

pub struct StatusAnimator {
    scripts: Scripts,
    view: Arc<watch::Sender<StatusView>>,
    playback: Mutex<Option<Playback>>,
    plays: AtomicU64,
}

impl StatusAnimator {
    pub fn new(scripts: Scripts) -> Self {
        let (view, _) = watch::channel(StatusView::default());
        Self {
            scripts,
            view: Arc::new(view),
            playback: Mutex::new(None),
            plays: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> StatusView {
        self.view.borrow().clone()
    }

    pub fn follow(&self, phase: Option<Phase>, parent: &CancellationToken) {
        match phase {
            Some(phase) => self.play(phase, parent),
            None => self.stop(),
        }
    }

    /// Starts `phase` from its first line. Replaying the phase already on
    /// screen is a no-op; switching phase cancels the previous playback.
    pub fn play(&self, phase: Phase, parent: &CancellationToken) {
        let mut playback = match self.playback.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(current) = playback.as_ref() {
            if current.phase == phase && !current.token.is_cancelled() {
                return;
            }
            current.token.cancel();
        }

        let token = parent.child_token();
        let play = self.plays.fetch_add(1, Ordering::Relaxed);
        self.view.send_replace(StatusView {
            phase: Some(phase),
            process_id: Some(process_id(play)),
            lines: Vec::new(),
        });
        tracing::debug!("Status terminal playing {} script", phase);

        tokio::spawn(run_script(
            self.scripts.for_phase(phase).to_vec(),
            Arc::clone(&self.view),
            token.clone(),
        ));
        *playback = Some(Playback { phase, token });
    }

    pub fn stop(&self) {
        let mut playback = match self.playback.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(current) = playback.take() {
            current.token.cancel();
        }
        self.view.send_replace(StatusView::default());
    }
}

impl Drop for StatusAnimator {
    fn drop(&mut self) {
        if let Ok(mut playback) = self.playback.lock() {
            if let Some(current) = playback.take() {
                current.token.cancel();
            }
        }
    }
}

async fn run_script(
    lines: Vec<ScriptLine>,
    view: Arc<watch::Sender<StatusView>>,
    token: CancellationToken,
) {
    let started = Instant::now();

    for line in lines {
        let deadline = started + line.offset();
        if Instant::now() < deadline {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep_until(deadline) => {}
            }
        }

        // Checked under the channel lock; a restart cancels before it replaces the view.
        let pushed = view.send_if_modified(|status| {
            if token.is_cancelled() {
                return false;
            }
            status.lines.push(format!("{}{}", LINE_PREFIX, line.text));
            true
        });
        if !pushed {
            return;
        }
    }
}

fn process_id(play: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let nanos = chrono::Utc::now().timestamp_subsec_nanos() as u64;
    let mut state = nanos ^ play.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ 0xD1B5_4A32_D192_ED03;
    (0..9)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            DIGITS[(state % 36) as usize] as char
        })
        .collect()
}
