//! Combined session projection.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::auth::Identity;
use crate::documents::{Collection, Customer, DocumentStore};

use super::Session;

/// Background projection of the current session.
///
/// Joins the auth provider's identity stream with the login-validity flag;
/// while both a user is present and validity holds, a live subscription to
/// that user's profile document feeds [`Session::profile`]. Everything else
/// projects to `None`. Consecutive identical values are suppressed.
pub struct SessionProjection {
    receiver: watch::Receiver<Option<Session>>,
    shutdown: CancellationToken,
}

impl SessionProjection {
    /// Spawn the projection task.
    #[must_use]
    pub fn spawn(
        store: Arc<dyn DocumentStore>,
        identity: watch::Receiver<Option<Identity>>,
        validity: watch::Receiver<bool>,
    ) -> Self {
        let (sender, receiver) = watch::channel(None);
        let shutdown = CancellationToken::new();
        tokio::spawn(run(store, identity, validity, sender, shutdown.clone()));
        Self { receiver, shutdown }
    }

    /// Live view of the projected session.
    #[must_use]
    pub fn session(&self) -> watch::Receiver<Option<Session>> {
        self.receiver.clone()
    }

    /// Current snapshot.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.receiver.borrow().clone()
    }

    /// Stop the projection task and release the profile subscription.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for SessionProjection {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct Inputs {
    identity: watch::Receiver<Option<Identity>>,
    validity: watch::Receiver<bool>,
    shutdown: CancellationToken,
}

impl Inputs {
    /// Wait for either input to change. `false` means the projection is
    /// done: shutdown fired or an input channel closed.
    async fn changed(&mut self) -> bool {
        tokio::select! {
            () = self.shutdown.cancelled() => false,
            changed = self.identity.changed() => changed.is_ok(),
            changed = self.validity.changed() => changed.is_ok(),
        }
    }
}

async fn run(
    store: Arc<dyn DocumentStore>,
    identity: watch::Receiver<Option<Identity>>,
    validity: watch::Receiver<bool>,
    sender: watch::Sender<Option<Session>>,
    shutdown: CancellationToken,
) {
    let mut inputs = Inputs {
        identity,
        validity,
        shutdown,
    };

    loop {
        let user = inputs.identity.borrow_and_update().clone();
        let valid = *inputs.validity.borrow_and_update();

        let keep_running = match user {
            Some(user) if valid => project_signed_in(&store, &user, &sender, &mut inputs).await,
            _ => {
                emit(&sender, None);
                inputs.changed().await
            }
        };

        if !keep_running {
            return;
        }
    }
}

/// Hold the profile subscription for one signed-in stretch. Returns once an
/// input changes; dropping the watch releases the subscription. `false`
/// means stop the projection entirely.
async fn project_signed_in(
    store: &Arc<dyn DocumentStore>,
    user: &Identity,
    sender: &watch::Sender<Option<Session>>,
    inputs: &mut Inputs,
) -> bool {
    let watch = match store
        .subscribe(Collection::Customers, user.uid.as_str())
        .await
    {
        Ok(watch) => watch,
        Err(error) => {
            tracing::warn!(%error, customer = %user.uid, "profile subscription failed");
            emit(
                sender,
                Some(Session {
                    identity: user.clone(),
                    profile: None,
                }),
            );
            return inputs.changed().await;
        }
    };

    let mut snapshots = watch.receiver();
    loop {
        let profile = snapshots
            .borrow_and_update()
            .clone()
            .and_then(|value| match serde_json::from_value::<Customer>(value) {
                Ok(profile) => Some(profile),
                Err(error) => {
                    tracing::warn!(%error, customer = %user.uid, "malformed profile document");
                    None
                }
            });
        emit(
            sender,
            Some(Session {
                identity: user.clone(),
                profile,
            }),
        );

        tokio::select! {
            () = inputs.shutdown.cancelled() => return false,
            changed = snapshots.changed() => {
                // Subscription ended; hold the last session until an input
                // changes rather than resubscribing in a tight loop.
                if changed.is_err() {
                    return inputs.changed().await;
                }
            }
            changed = inputs.identity.changed() => return changed.is_ok(),
            changed = inputs.validity.changed() => return changed.is_ok(),
        }
    }
}

fn emit(sender: &watch::Sender<Option<Session>>, next: Option<Session>) {
    sender.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}
