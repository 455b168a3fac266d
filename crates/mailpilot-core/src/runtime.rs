//! Executes store effects on tokio.
//!
//! The [`Runtime`] owns the [`Store`] and turns the effects it emits into
//! gateway or AI calls, each in its own task. Completions come back as
//! [`Event`]s through a [`JoinSet`] and are applied in completion order,
//! which need not be dispatch order; the store's tokens make that safe.
//!
//! Every job is guarded: a panicking or cancelled job still yields its
//! completion event, carrying [`ServiceError::Unexpected`], so in-flight
//! flags are always reset.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error};

use crate::error::ServiceError;
use crate::gateway::{AiSuggestionService, MutationGateway, Session};
use crate::model::MessageId;
use crate::mutation::MutationKind;
use crate::store::{Action, Effect, Event, Store};

/// Aborts the wrapped task when dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Drives a [`Store`] against a gateway and an AI service.
pub struct Runtime<G, A> {
    store: Store,
    gateway: Arc<G>,
    ai: Arc<A>,
    ai_timeout: Duration,
    tasks: JoinSet<Event>,
    host_effects: VecDeque<Effect>,
}

impl<G, A> std::fmt::Debug for Runtime<G, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("store", &self.store)
            .field("ai_timeout", &self.ai_timeout)
            .field("in_flight", &self.tasks.len())
            .field("host_effects", &self.host_effects)
            .finish_non_exhaustive()
    }
}

impl<G, A> Runtime<G, A>
where
    G: MutationGateway,
    A: AiSuggestionService,
{
    /// Creates a runtime.
    #[must_use]
    pub fn new(store: Store, gateway: Arc<G>, ai: Arc<A>, ai_timeout: Duration) -> Self {
        Self {
            store,
            gateway,
            ai,
            ai_timeout,
            tasks: JoinSet::new(),
            host_effects: VecDeque::new(),
        }
    }

    /// The interaction state.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Replaces the session.
    pub fn set_session(&mut self, session: Option<Session>) {
        self.store.set_session(session);
    }

    /// Number of jobs still running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Dispatches an action and starts the work it asks for.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, action: Action) {
        let effects = self.store.dispatch(action);
        self.execute(effects);
    }

    /// Waits for the next job to finish and applies its event.
    ///
    /// Returns false when nothing is in flight.
    pub async fn step(&mut self) -> bool {
        match self.tasks.join_next().await {
            Some(Ok(event)) => {
                let effects = self.store.apply(event);
                self.execute(effects);
                true
            }
            Some(Err(err)) => {
                // Only reachable if the guard itself was aborted.
                error!(error = %err, "job supervisor failed");
                true
            }
            None => false,
        }
    }

    /// Applies completions until no job is left.
    pub async fn run_until_idle(&mut self) {
        while self.step().await {}
    }

    /// Drains effects the host must handle (navigation, sign-out, theme).
    pub fn take_host_effects(&mut self) -> Vec<Effect> {
        self.host_effects.drain(..).collect()
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SendMessage { token, payload } => {
                    let gateway = Arc::clone(&self.gateway);
                    self.spawn_guarded(
                        async move { gateway.send_message(payload).await },
                        move |result| Event::SendFinished { token, result },
                    );
                }
                Effect::Mutate { token, kind, ids } => {
                    let gateway = Arc::clone(&self.gateway);
                    self.spawn_guarded(mutate(gateway, kind, ids), move |result| {
                        Event::MutationFinished { token, result }
                    });
                }
                Effect::RequestAi {
                    token,
                    message_id,
                    tone,
                } => {
                    let ai = Arc::clone(&self.ai);
                    let bound = self.ai_timeout;
                    self.spawn_guarded(
                        async move {
                            tokio::time::timeout(bound, ai.suggest(message_id, tone))
                                .await
                                .unwrap_or(Err(ServiceError::TimedOut))
                        },
                        move |result| Event::AiFinished { token, result },
                    );
                }
                Effect::Sync => {
                    let gateway = Arc::clone(&self.gateway);
                    self.spawn_guarded(async move { gateway.sync().await }, |result| {
                        Event::SyncFinished {
                            result,
                            at: Utc::now(),
                        }
                    });
                }
                host => {
                    debug!(effect = ?host, "queued for host");
                    self.host_effects.push_back(host);
                }
            }
        }
    }

    /// Runs `job` in its own task and reports its outcome through `finish`,
    /// turning a panic or cancellation into `ServiceError::Unexpected`.
    fn spawn_guarded<F, T, D>(&mut self, job: F, finish: D)
    where
        F: Future<Output = Result<T, ServiceError>> + Send + 'static,
        T: Send + 'static,
        D: FnOnce(Result<T, ServiceError>) -> Event + Send + 'static,
    {
        self.tasks.spawn(async move {
            let mut guard = AbortOnDrop(tokio::spawn(job));
            let result = match (&mut guard.0).await {
                Ok(result) => result,
                Err(err) if err.is_panic() => {
                    error!("job panicked");
                    Err(ServiceError::Unexpected("job panicked".to_string()))
                }
                Err(err) => {
                    error!(error = %err, "job cancelled");
                    Err(ServiceError::Unexpected(err.to_string()))
                }
            };
            finish(result)
        });
    }
}

async fn mutate<G: MutationGateway>(
    gateway: Arc<G>,
    kind: MutationKind,
    ids: Vec<MessageId>,
) -> Result<(), ServiceError> {
    let single = <[MessageId; 1]>::try_from(ids);
    match (kind, single) {
        (MutationKind::Archive, Ok([id])) => gateway.archive_message(id).await,
        (MutationKind::Archive, Err(ids)) => gateway.archive_messages(ids).await,
        (MutationKind::Delete, Ok([id])) => gateway.delete_message(id).await,
        (MutationKind::Delete, Err(ids)) => gateway.delete_messages(ids).await,
        (MutationKind::Star(value), Ok([id])) => gateway.star_message(id, value).await,
        (MutationKind::Star(value), Err(ids)) => gateway.star_messages(ids, value).await,
        (MutationKind::MarkRead(read), Ok(ids)) => gateway.mark_read(Vec::from(ids), read).await,
        (MutationKind::MarkRead(read), Err(ids)) => gateway.mark_read(ids, read).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::compose::ComposeOptions;
    use crate::model::{OutgoingMessage, SentMessage, Tone};

    /// Gateway whose every call panics.
    struct Panicking;

    impl MutationGateway for Panicking {
        async fn send_message(&self, _: OutgoingMessage) -> Result<SentMessage, ServiceError> {
            panic!("send exploded")
        }
        async fn archive_messages(&self, _: Vec<MessageId>) -> Result<(), ServiceError> {
            panic!("archive exploded")
        }
        async fn delete_messages(&self, _: Vec<MessageId>) -> Result<(), ServiceError> {
            panic!("delete exploded")
        }
        async fn star_messages(&self, _: Vec<MessageId>, _: bool) -> Result<(), ServiceError> {
            panic!("star exploded")
        }
        async fn mark_read(&self, _: Vec<MessageId>, _: bool) -> Result<(), ServiceError> {
            panic!("mark exploded")
        }
        async fn sync(&self) -> Result<(), ServiceError> {
            panic!("sync exploded")
        }
    }

    /// AI service that never answers.
    struct Silent;

    impl AiSuggestionService for Silent {
        async fn suggest(&self, _: MessageId, _: Tone) -> Result<String, ServiceError> {
            std::future::pending().await
        }
    }

    fn runtime() -> Runtime<Panicking, Silent> {
        Runtime::new(
            Store::default(),
            Arc::new(Panicking),
            Arc::new(Silent),
            Duration::from_secs(30),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_request_times_out() {
        let mut runtime = runtime();
        runtime.dispatch(Action::OpenCompose {
            options: ComposeOptions::new_message(),
        });
        runtime.dispatch(Action::RequestAiSuggestion {
            message_id: MessageId::new("m1"),
            tone: Tone::Casual,
        });
        assert!(runtime.store().snapshot().compose.is_generating_ai);

        runtime.run_until_idle().await;

        let ai = &runtime.store().compose().active().unwrap().ai;
        assert!(!ai.is_generating());
        assert_eq!(
            ai.error.as_deref(),
            Some("The request took too long. Please try again.")
        );
    }

    #[tokio::test]
    async fn test_panicking_job_resets_flag() {
        let mut runtime = runtime();
        runtime.dispatch(Action::Sync);
        assert!(runtime.store().is_syncing());
        assert_eq!(runtime.in_flight(), 1);

        runtime.run_until_idle().await;

        assert!(!runtime.store().is_syncing());
        assert_eq!(runtime.in_flight(), 0);
        assert_eq!(
            runtime.store().ui().notices()[0].text,
            "Sync failed: Something went wrong. Please try again."
        );
    }

    #[tokio::test]
    async fn test_host_effects_are_queued() {
        let mut runtime = runtime();
        runtime.dispatch(Action::RunCommand {
            id: "digest".into(),
        });
        runtime.dispatch(Action::RunCommand {
            id: "logout".into(),
        });

        let effects = runtime.take_host_effects();
        assert_eq!(effects.len(), 2);
        assert!(effects.iter().all(Effect::is_host));
        assert!(runtime.take_host_effects().is_empty());
        assert_eq!(runtime.in_flight(), 0);
    }
}
