//! Event loop hosting the update controller.
//!
//! [`UpdateRuntime::init`] wires the controller to the provider's events and
//! the web content's check trigger, all feeding one queue that a single task
//! drains in arrival order. [`UpdateRuntime::dispose`] detaches everything
//! and hands the controller back.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::controller::{UpdateController, UpdateEvent};
use crate::provider::{CheckTrigger, EventSink, ProviderEvent, SubscriptionId, UpdateProvider};
use crate::window::AppWindow;

enum Envelope {
    Event(UpdateEvent),
    Shutdown,
}

struct Subscriptions {
    provider: Arc<dyn UpdateProvider>,
    provider_id: SubscriptionId,
    trigger: Arc<dyn CheckTrigger>,
    trigger_id: SubscriptionId,
}

impl Subscriptions {
    fn detach(self) {
        self.provider.unsubscribe(self.provider_id);
        self.trigger.unsubscribe(self.trigger_id);
    }
}

/// Running updater
pub struct UpdateRuntime {
    queue: mpsc::UnboundedSender<Envelope>,
    task: Option<JoinHandle<UpdateController>>,
    subscriptions: Option<Subscriptions>,
}

impl UpdateRuntime {
    /// Attach `controller` to `main_window` and start processing events.
    ///
    /// Must be called from within a tokio runtime. When the configuration asks
    /// for it, a startup check is queued right away.
    pub fn init(
        mut controller: UpdateController,
        main_window: &Arc<dyn AppWindow>,
        trigger: Arc<dyn CheckTrigger>,
    ) -> Self {
        controller.attach(main_window);
        let provider = controller.provider();
        let (queue, mut rx) = mpsc::unbounded_channel::<Envelope>();

        let provider_queue = queue.clone();
        let provider_id = provider.subscribe(EventSink::new(move |event: ProviderEvent| {
            provider_queue
                .send(Envelope::Event(UpdateEvent::Provider(event)))
                .is_ok()
        }));
        let trigger_queue = queue.clone();
        let trigger_id = trigger.subscribe(EventSink::new(move |_: ()| {
            trigger_queue
                .send(Envelope::Event(UpdateEvent::CheckRequested))
                .is_ok()
        }));

        if controller.check_on_startup() {
            let _ = queue.send(Envelope::Event(UpdateEvent::CheckRequested));
        }

        let task = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                match envelope {
                    Envelope::Event(event) => controller.handle(event).await,
                    Envelope::Shutdown => break,
                }
            }
            tracing::debug!("Update event loop stopped");
            controller
        });

        tracing::info!("Updater started");
        Self {
            queue,
            task: Some(task),
            subscriptions: Some(Subscriptions {
                provider,
                provider_id,
                trigger,
                trigger_id,
            }),
        }
    }

    /// Queue an event. Returns `false` after the loop has stopped.
    pub fn dispatch(&self, event: UpdateEvent) -> bool {
        self.queue.send(Envelope::Event(event)).is_ok()
    }

    /// Queue a check, e.g. from a "Check for Updates..." menu item
    pub fn check_for_updates(&self, user_initiated: bool) -> bool {
        self.dispatch(UpdateEvent::CheckForUpdates { user_initiated })
    }

    /// Detach from the provider and trigger, finish queued events and return
    /// the controller. Returns `None` if the loop task panicked.
    pub async fn dispose(mut self) -> Option<UpdateController> {
        if let Some(subscriptions) = self.subscriptions.take() {
            subscriptions.detach();
        }
        let _ = self.queue.send(Envelope::Shutdown);

        let task = self.task.take()?;
        match task.await {
            Ok(mut controller) => {
                controller.detach();
                tracing::info!("Updater stopped");
                Some(controller)
            }
            Err(e) => {
                tracing::error!("Update event loop failed: {}", e);
                None
            }
        }
    }
}

impl Drop for UpdateRuntime {
    fn drop(&mut self) {
        if let Some(subscriptions) = self.subscriptions.take() {
            tracing::debug!("Updater dropped without dispose, detaching");
            subscriptions.detach();
            let _ = self.queue.send(Envelope::Shutdown);
        }
    }
}
