//! System runner: the receive, handle and acknowledge loop.
//!
//! The runner owns one system and its subscription on a dedicated task. For
//! every delivery it calls [`System::handle`] and then acknowledges. When the
//! bus closes the inbox the loop ends and the system is handed back through
//! [`SystemHandle::join`], which is how callers inspect its final state.

use std::panic::AssertUnwindSafe;

use engine_bus::Subscription;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{error, info, trace};
use uuid::Uuid;

use crate::System;
use crate::error::SystemError;

/// Runs a [`System`] against its [`Subscription`].
#[derive(Debug)]
pub struct SystemRunner<S> {
    /// The system being driven.
    system: S,
    /// The system's inbox.
    subscription: Subscription,
    /// Unique instance identifier, for log correlation.
    instance_id: Uuid,
}

impl<S: System> SystemRunner<S> {
    /// Pair a system with its inbox.
    #[must_use]
    pub fn new(system: S, subscription: Subscription) -> Self {
        Self {
            system,
            subscription,
            instance_id: Uuid::new_v4(),
        }
    }

    /// Returns the unique instance ID for this runner.
    #[must_use]
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Returns the system name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.system.name()
    }

    /// Run the loop until the inbox closes and return the system.
    ///
    /// If the handler panics the delivery is poisoned before it is
    /// acknowledged, so the publisher reports the failure, and the panic then
    /// continues to unwind this task.
    pub async fn run(self) -> S {
        let SystemRunner {
            mut system,
            mut subscription,
            instance_id,
        } = self;
        let name = system.name().to_owned();
        info!(system = name, %instance_id, "system starting");

        let mut handled = 0u64;
        while let Some(delivery) = subscription.recv().await {
            trace!(
                system = name,
                sequence = delivery.sequence(),
                event = delivery.event().name(),
                "handling"
            );

            let outcome = AssertUnwindSafe(system.handle(&delivery))
                .catch_unwind()
                .await;
            if let Err(panic) = outcome {
                error!(
                    system = name,
                    sequence = delivery.sequence(),
                    event = delivery.event().name(),
                    "handler panicked"
                );
                delivery.poison();
                delivery.done();
                std::panic::resume_unwind(panic);
            }

            delivery.done();
            handled += 1;
        }

        info!(system = name, %instance_id, handled, "inbox closed, system stopping");
        system
    }

    /// Run the loop on a new tokio task.
    pub fn spawn(self) -> SystemHandle<S> {
        let name = self.name().to_owned();
        let instance_id = self.instance_id;
        SystemHandle {
            name,
            instance_id,
            task: tokio::spawn(self.run()),
        }
    }
}

/// A running system. Join it after shutdown to get the system back.
#[derive(Debug)]
pub struct SystemHandle<S> {
    name: String,
    instance_id: Uuid,
    task: JoinHandle<S>,
}

impl<S> SystemHandle<S> {
    /// The system's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The runner's instance ID.
    #[must_use]
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Returns `true` once the system's loop has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end and take the system back.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Panicked`] if a handler panicked and
    /// [`SystemError::Cancelled`] if the task was aborted.
    pub async fn join(self) -> Result<S, SystemError> {
        self.task.await.map_err(|err| {
            if err.is_panic() {
                SystemError::Panicked(self.name.clone())
            } else {
                SystemError::Cancelled(self.name.clone())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use engine_bus::{BusConfig, Delivery, Event, EventBus, UserEvent};

    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl UserEvent for Boom {
        const NAME: &'static str = "Boom";
    }

    /// Counts events and emits one follow-up for `Setup`.
    #[derive(Default)]
    struct Counter {
        seen: Vec<&'static str>,
    }

    impl System for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        async fn handle(&mut self, delivery: &Delivery) {
            self.seen.push(delivery.event().name());
            if matches!(delivery.event(), Event::Setup) {
                delivery.emit(Event::BeginFrame { delta: 0.0 });
            }
        }
    }

    struct Fragile;

    impl System for Fragile {
        fn name(&self) -> &str {
            "fragile"
        }

        async fn handle(&mut self, delivery: &Delivery) {
            if delivery.event().downcast::<Boom>().is_some() {
                panic!("cannot handle boom");
            }
        }
    }

    #[tokio::test]
    async fn test_runner_returns_system_after_close() {
        let mut bus = EventBus::new(BusConfig::default()).unwrap();
        let runner = SystemRunner::new(Counter::default(), bus.subscribe("counter").unwrap());
        assert_eq!(runner.name(), "counter");
        let handle = runner.spawn();
        assert_eq!(handle.name(), "counter");

        bus.publish(Event::Setup).await;
        bus.publish(Event::EndFrame { delta: 0.0 }).await;
        bus.close();

        let counter = handle.join().await.unwrap();
        assert_eq!(counter.seen, vec!["Setup", "BeginFrame", "EndFrame"]);
    }

    #[tokio::test]
    async fn test_instance_ids_are_unique() {
        let mut bus = EventBus::new(BusConfig::default()).unwrap();
        let a = SystemRunner::new(Counter::default(), bus.subscribe("a").unwrap());
        let b = SystemRunner::new(Counter::default(), bus.subscribe("b").unwrap());
        assert_ne!(a.instance_id(), b.instance_id());
    }

    #[tokio::test]
    #[should_panic(expected = "subscriber `fragile` failed while handling Boom #1")]
    async fn test_handler_panic_poisons_the_publish() {
        let mut bus = EventBus::new(BusConfig::default()).unwrap();
        SystemRunner::new(Fragile, bus.subscribe("fragile").unwrap()).spawn();
        bus.publish(Event::user(Boom)).await;
    }

    #[tokio::test]
    async fn test_join_reports_panicked_system() {
        let mut bus = EventBus::new(BusConfig::default()).unwrap();
        let handle = SystemRunner::new(Fragile, bus.subscribe("fragile").unwrap()).spawn();
        let publish = std::panic::AssertUnwindSafe(bus.publish(Event::user(Boom)))
            .catch_unwind()
            .await;
        assert!(publish.is_err());
        assert!(matches!(handle.join().await, Err(SystemError::Panicked(name)) if name == "fragile"));
    }
}
