use crate::config::pacing::{Delays, PacingConfig};
use crate::core::animator::{StatusAnimator, StatusView};
use crate::core::state::{reduce, Action, Session, TaskId};
use crate::domain::model::{CompletedTask, UploadedFile};
use crate::domain::ports::CleaningApi;
use crate::utils::error::{Result, SanctError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

struct Shared<A: CleaningApi> {
    api: Arc<A>,
    delays: Delays,
    store: watch::Sender<Session>,
    animator: StatusAnimator,
}

impl<A: CleaningApi> Shared<A> {
    /// Returns false when the action belonged to a replaced task and was
    /// dropped; the status terminal is left alone in that case.
    fn dispatch(&self, action: Action, token: &CancellationToken) -> bool {
        let mut applied = None;
        self.store.send_if_modified(|session| {
            if !session.accepts(&action) {
                tracing::debug!("Dropping stale {:?} for {:?}", action.task(), session.task);
                return false;
            }

            let before = session.state;
            *session = reduce(std::mem::take(session), action);
            if session.state != before {
                tracing::debug!("Session {} -> {}", before, session.state);
            }
            applied = Some(session.state.phase());
            true
        });

        match applied {
            Some(phase) => {
                self.animator.follow(phase, token);
                true
            }
            None => false,
        }
    }
}

/// Drives one upload at a time through analyze and clean.
///
/// Each task runs under its own cancellation token. A new upload or a reset
/// cancels the previous token, so its pending delays and requests are dropped.
pub struct AppController<A: CleaningApi> {
    shared: Arc<Shared<A>>,
    current: Mutex<Option<CancellationToken>>,
    next_task: AtomicU64,
}

impl<A: CleaningApi> AppController<A> {
    pub fn new(api: A, pacing: PacingConfig) -> Self {
        Self::with_api(Arc::new(api), pacing)
    }

    pub fn with_api(api: Arc<A>, pacing: PacingConfig) -> Self {
        let (store, _) = watch::channel(Session::default());
        Self {
            shared: Arc::new(Shared {
                api,
                delays: pacing.delays,
                store,
                animator: StatusAnimator::new(pacing.scripts),
            }),
            current: Mutex::new(None),
            next_task: AtomicU64::new(0),
        }
    }

    pub fn api(&self) -> &A {
        &self.shared.api
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.shared.store.subscribe()
    }

    pub fn status(&self) -> watch::Receiver<StatusView> {
        self.shared.animator.subscribe()
    }

    pub fn session(&self) -> Session {
        self.shared.store.borrow().clone()
    }

    pub fn completed(&self) -> Option<CompletedTask> {
        self.shared.store.borrow().completed()
    }

    fn current(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new task for `file`, abandoning any task still in flight.
    pub fn handle_upload(&self, file: UploadedFile) -> TaskId {
        let task = TaskId(self.next_task.fetch_add(1, Ordering::Relaxed) + 1);
        let token = CancellationToken::new();

        if let Some(previous) = self.current().replace(token.clone()) {
            if !previous.is_cancelled() {
                tracing::debug!("Abandoning previous task for {}", task);
            }
            previous.cancel();
        }

        tracing::info!("📤 {} uploading {}", task, file.file_name);
        self.shared.dispatch(
            Action::FileSelected {
                task,
                file_name: file.file_name.clone(),
            },
            &token,
        );

        tokio::spawn(run_task(Arc::clone(&self.shared), task, file, token));
        task
    }

    /// "New Task": drops the current task and every result it produced.
    pub fn reset(&self) {
        if let Some(token) = self.current().take() {
            token.cancel();
        }
        self.shared.dispatch(Action::Reset, &CancellationToken::new());
    }

    /// Resolves once the current task is done or failed. Call only after
    /// `handle_upload`; an idle controller never settles.
    pub async fn wait_settled(&self) -> Session {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|session| session.state.is_settled()).await {
            Ok(session) => session.clone(),
            Err(_) => self.session(),
        };
        settled
    }
}

impl<A: CleaningApi> Drop for AppController<A> {
    fn drop(&mut self) {
        if let Some(token) = self.current().take() {
            token.cancel();
        }
    }
}

async fn run_task<A: CleaningApi>(
    shared: Arc<Shared<A>>,
    task: TaskId,
    file: UploadedFile,
    token: CancellationToken,
) {
    let outcome = tokio::select! {
        _ = token.cancelled() => {
            tracing::debug!("{} cancelled", task);
            return;
        }
        outcome = drive(&shared, task, file, &token) => outcome,
    };

    if let Err(e) = outcome {
        tracing::error!("❌ {} failed: {}", task, e);
        if !token.is_cancelled() {
            shared.dispatch(
                Action::RequestFailed {
                    task,
                    message: e.to_string(),
                },
                &token,
            );
        }
    }
}

async fn drive<A: CleaningApi>(
    shared: &Shared<A>,
    task: TaskId,
    file: UploadedFile,
    token: &CancellationToken,
) -> Result<()> {
    let delays = shared.delays;

    let request = shared.api.analyze(&file);
    shared.dispatch(Action::AnalyzeSent { task }, token);
    let analysis = request.await?;
    drop(file);

    if analysis.file_id.is_empty() {
        return Err(SanctError::invalid_response("analysis response has no file_id"));
    }
    tracing::info!(
        "🔍 {} analyzed {} as {} ({} reasoning steps)",
        task,
        analysis.file_id,
        analysis.kind,
        analysis.plan.reasoning.len()
    );

    let file_id = analysis.file_id.clone();
    shared.dispatch(Action::AnalyzeSucceeded { task, analysis }, token);

    tokio::time::sleep(delays.analyze_display()).await;
    shared.dispatch(Action::CleaningStarted { task }, token);

    tokio::time::sleep(delays.clean_request()).await;
    let result = shared.api.clean(&file_id).await?;
    tracing::info!(
        "🧹 {} cleaned: {} rows removed, asset at {}",
        task,
        result.stats.removed_rows,
        result.download_url
    );
    shared.dispatch(Action::CleanSucceeded { task, result }, token);

    tokio::time::sleep(delays.finish_display()).await;
    shared.dispatch(Action::Finished { task }, token);
    Ok(())
}
