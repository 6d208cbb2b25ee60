//! The harness session: one control panel attached to the embedding boundary.
//!
//! A [`Harness`] owns the held state (message log and configuration), the
//! form fields the operator edits, and a [`CommandDispatcher`].  Mounting it
//! on a [`MessageHub`] registers its inbound handler and asks the configurator
//! to publish its configuration; unmounting releases the registration.

use std::path::Path;
use std::sync::Arc;

use configurator_core::application::FormState;
use configurator_core::{CommandDispatcher, CommandSender, DispatchOptions, HarnessState, SendError};
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::info;

use crate::application::hub::{MessageHub, Subscription};
use crate::infrastructure::image_reader::{read_data_url, ImageError};

/// Host-side harness around an embedded configurator.
pub struct Harness<S> {
    state: Arc<Mutex<HarnessState>>,
    dispatcher: CommandDispatcher<S>,
    forms: FormState,
    subscription: Option<Subscription>,
    /// Number of payloads handled so far.
    received: Arc<watch::Sender<usize>>,
}

impl<S: CommandSender> Harness<S> {
    pub fn new(sender: S, options: DispatchOptions) -> Self {
        let (received, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(HarnessState::new())),
            dispatcher: CommandDispatcher::new(sender, options),
            forms: FormState::default(),
            subscription: None,
            received: Arc::new(received),
        }
    }

    /// Subscribes to `hub` and requests the current configuration.
    ///
    /// Any previous subscription is released first, so remounting never
    /// leaves two handlers registered.
    ///
    /// # Parameters
    ///
    /// - `hub` – Delivery point for payloads from the embedding page.  Each
    ///   delivered payload is recorded in the held [`HarnessState`] and bumps
    ///   the counter that [`Harness::wait_for_messages`] watches.
    ///
    /// # Errors
    ///
    /// Returns the sender's error if the trigger cannot be sent.  The
    /// subscription stays in place either way.
    pub async fn mount(&mut self, hub: &MessageHub) -> Result<(), SendError> {
        // ── Step 1: Release the previous subscription ─────────────────────────
        self.unmount();

        // ── Step 2: Subscribe the state handler ───────────────────────────────
        let state = Arc::clone(&self.state);
        let received = Arc::clone(&self.received);
        let subscription = hub.subscribe(move |payload| {
            let state = Arc::clone(&state);
            let received = Arc::clone(&received);
            async move {
                let mut guard = state.lock().await;
                guard.receive(payload);
                drop(guard);
                received.send_modify(|n| *n += 1);
            }
        });

        info!("harness mounted (subscription {})", subscription.id());
        self.subscription = Some(subscription);

        // ── Step 3: Ask the configurator for its current configuration ────────
        self.dispatcher.trigger_configuration_updated().await
    }

    /// Releases the hub subscription, if any.
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            info!("harness unmounted (subscription {})", subscription.id());
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Locks the held state for reading.
    pub async fn state(&self) -> MutexGuard<'_, HarnessState> {
        self.state.lock().await
    }

    /// Waits until at least `count` payloads have been handled in total.
    pub async fn wait_for_messages(&self, count: usize) {
        let mut rx = self.received.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|n| *n >= count).await;
    }

    pub fn forms(&self) -> &FormState {
        &self.forms
    }

    pub fn forms_mut(&mut self) -> &mut FormState {
        &mut self.forms
    }

    /// Reads `path` into the image form as a data URL.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError`] if the file cannot be read; the form keeps its
    /// previous image.
    pub async fn load_image(&mut self, path: &Path) -> Result<(), ImageError> {
        let url = read_data_url(path).await?;
        self.forms.image_value.image = Some(url);
        Ok(())
    }

    async fn configuration_id(&self) -> Option<String> {
        self.state.lock().await.configuration_id().map(str::to_string)
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    pub async fn trigger_configuration_updated(&self) -> Result<(), SendError> {
        self.dispatcher.trigger_configuration_updated().await
    }

    pub async fn update_requirement(&self) -> Result<(), SendError> {
        let id = self.configuration_id().await;
        self.dispatcher
            .update_requirement(&self.forms.requirement, id.as_deref())
            .await
    }

    pub async fn update_requirements(&self) -> Result<(), SendError> {
        let id = self.configuration_id().await;
        self.dispatcher
            .update_requirements(&self.forms.requirements, id.as_deref())
            .await
    }

    pub async fn update_text_value(&self) -> Result<(), SendError> {
        let id = self.configuration_id().await;
        self.dispatcher
            .update_text_value(&self.forms.text_value, id.as_deref())
            .await
    }

    pub async fn update_image_value(&self) -> Result<(), SendError> {
        let id = self.configuration_id().await;
        self.dispatcher
            .update_image_value(&self.forms.image_value, id.as_deref())
            .await
    }

    pub async fn update_linked_configuration_cardinality(&self) -> Result<(), SendError> {
        let id = self.configuration_id().await;
        self.dispatcher
            .update_linked_configuration_cardinality(&self.forms.cardinality, id.as_deref())
            .await
    }

    pub async fn remove_linked_configuration(&self) -> Result<(), SendError> {
        self.dispatcher
            .remove_linked_configuration(&self.forms.remove_linked)
            .await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
