//! Frame scheduler.
//!
//! Every tick runs three phases, each a single publish on the bus that
//! returns only once every subscriber (and every immediate follow-up) has
//! finished:
//!
//! 1. **Begin**: measure the frame delta and publish `BeginFrame`.
//! 2. **Drain**: rotate the next-frame queue into the current one, then
//!    publish queued events one at a time until the current queue is empty.
//!    Events scheduled for "this frame" during the drain join the same pass.
//! 3. **End**: publish `EndFrame` with the same delta.
//!
//! `Setup` is published once, before the first tick.

use std::sync::Arc;
use std::time::{Duration, Instant};

use engine_bus::{BusError, Event, EventBus, FrameQueues};
use engine_component::EntityAllocator;
use engine_system::{Commands, RunFlag, System, SystemHandle, SystemRunner};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::registry::{SystemInfo, SystemRegistry};

/// Configuration for the tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Target ticks per second (0 = uncapped).
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    /// The time budget of one tick, if the rate is capped.
    #[must_use]
    pub fn budget(&self) -> Option<Duration> {
        (self.tick_rate > 0.0).then(|| Duration::from_secs_f64(1.0 / self.tick_rate))
    }
}

/// The tick loop: owns the bus, the frame queues and the attached systems.
#[derive(Debug)]
pub struct TickLoop {
    /// Current tick counter.
    tick_id: u64,
    /// Tick configuration.
    config: TickConfig,
    /// The event bus every phase publishes on.
    bus: EventBus,
    /// "This frame" and "next frame" queues.
    queues: Arc<FrameQueues>,
    /// Entity id source shared by every command handle.
    allocator: Arc<EntityAllocator>,
    /// Cleared to stop the loop before its next tick.
    run: RunFlag,
    /// Systems attached so far.
    registry: SystemRegistry,
    /// When the previous frame began.
    last_frame: Instant,
    /// Whether `Setup` has been published.
    set_up: bool,
}

impl TickLoop {
    /// Create a tick loop with an empty bus.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ZeroCapacity`] if the bus configuration is invalid.
    pub fn new(config: EngineConfig) -> Result<Self, BusError> {
        Ok(Self {
            tick_id: 0,
            config: config.tick,
            bus: EventBus::new(config.bus)?,
            queues: Arc::new(FrameQueues::new()),
            allocator: Arc::new(EntityAllocator::new()),
            run: RunFlag::new(),
            registry: SystemRegistry::new(),
            last_frame: Instant::now(),
            set_up: false,
        })
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Returns a reference to the system registry.
    #[must_use]
    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    /// Returns the bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Returns the loop's run flag.
    #[must_use]
    pub fn run_flag(&self) -> &RunFlag {
        &self.run
    }

    /// A command handle bound to this loop's queues, allocator and run flag.
    #[must_use]
    pub fn commands(&self) -> Commands {
        Commands::new(
            Arc::clone(&self.queues),
            Arc::clone(&self.allocator),
            self.run.clone(),
        )
    }

    /// Subscribe `system` to the bus and start its runner.
    ///
    /// Systems receive every event in the order they are added here.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::AlreadyStarted`] once the loop has published
    /// anything, and [`BusError::Closed`] after shutdown.
    pub fn add_system<S: System>(&mut self, system: S) -> Result<SystemHandle<S>, BusError> {
        let subscription = self.bus.subscribe(system.name())?;
        let index = subscription.index();
        let runner = SystemRunner::new(system, subscription);
        let info = SystemInfo {
            name: runner.name().to_owned(),
            index,
            instance_id: runner.instance_id(),
        };
        info!(system = info.name, index, instance_id = %info.instance_id, "system attached");
        self.registry.register(info);
        Ok(runner.spawn())
    }

    /// Publish `Setup` if it has not been published yet.
    pub async fn setup(&mut self) {
        if self.set_up {
            return;
        }
        self.set_up = true;
        info!(systems = self.registry.system_count(), "publishing setup");
        self.bus.publish(Event::Setup).await;
        self.last_frame = Instant::now();
    }

    /// Run one frame: Begin, Drain, End.
    ///
    /// Publishes `Setup` first if this is the loop's first tick.
    pub async fn tick(&mut self) {
        self.setup().await;

        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f64();
        self.last_frame = now;
        self.tick_id += 1;
        debug!(tick_id = self.tick_id, delta, "tick start");

        self.bus.publish(Event::BeginFrame { delta }).await;

        self.queues.rotate();
        let mut drained = 0u64;
        while let Some(event) = self.queues.pop_current() {
            self.bus.publish(event).await;
            drained += 1;
        }

        self.bus.publish(Event::EndFrame { delta }).await;
        debug!(tick_id = self.tick_id, drained, "tick end");
    }

    /// Run until the run flag is cleared or `max_ticks` is reached, then shut
    /// down.
    pub async fn run(&mut self) {
        let budget = self.config.budget();
        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        self.setup().await;

        let mut tick_count = 0u64;
        while self.run.is_running() {
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick limit reached");
                break;
            }

            let start = Instant::now();
            self.tick().await;
            tick_count += 1;

            let Some(budget) = budget else {
                continue;
            };
            let elapsed = start.elapsed();
            if elapsed < budget {
                tokio::time::sleep(budget - elapsed).await;
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = budget.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }

        self.shutdown();
    }

    /// Close the queues and the bus. Every system loop ends once it has
    /// drained its inbox; join their handles to get them back.
    pub fn shutdown(&mut self) {
        let discarded = self.queues.close();
        self.bus.close();
        info!(ticks = self.tick_id, discarded, "tick loop shut down");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine_bus::{Delivery, UserEvent};
    use engine_component::{Component, Entity, InterestSet, bundle};
    use parking_lot::Mutex;

    use super::*;

    fn fast() -> EngineConfig {
        EngineConfig {
            tick: TickConfig {
                tick_rate: 0.0,
                max_ticks: 0,
            },
            ..EngineConfig::default()
        }
    }

    #[derive(Debug)]
    struct Ping(u32);

    impl UserEvent for Ping {
        const NAME: &'static str = "Ping";
    }

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records the name (and ping payload) of everything it sees.
    struct Recorder {
        log: Log,
    }

    impl System for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn handle(&mut self, delivery: &Delivery) {
            let event = delivery.event();
            let entry = match event.downcast::<Ping>() {
                Some(Ping(n)) => format!("Ping({n})"),
                None => event.name().to_owned(),
            };
            self.log.lock().push(entry);
        }
    }

    /// Reschedules a countdown within the same frame until it hits zero.
    struct Countdown {
        commands: Commands,
    }

    impl System for Countdown {
        fn name(&self) -> &str {
            "countdown"
        }

        async fn handle(&mut self, delivery: &Delivery) {
            if let Some(Ping(n)) = delivery.event().downcast::<Ping>()
                && *n > 0
            {
                self.commands.schedule_this_frame(Event::user(Ping(n - 1)));
            }
        }
    }

    #[tokio::test]
    async fn test_setup_is_published_once_before_the_first_frame() {
        let log = Log::default();
        let mut tick_loop = TickLoop::new(fast()).unwrap();
        let handle = tick_loop.add_system(Recorder { log: Arc::clone(&log) }).unwrap();

        tick_loop.setup().await;
        tick_loop.tick().await;
        tick_loop.tick().await;
        tick_loop.shutdown();
        handle.join().await.unwrap();

        assert_eq!(
            *log.lock(),
            vec!["Setup", "BeginFrame", "EndFrame", "BeginFrame", "EndFrame"]
        );
        assert_eq!(tick_loop.tick_id(), 2);
    }

    #[tokio::test]
    async fn test_drain_runs_to_quiescence() {
        let log = Log::default();
        let mut tick_loop = TickLoop::new(fast()).unwrap();
        let commands = tick_loop.commands();
        let countdown = tick_loop.add_system(Countdown { commands: commands.clone() }).unwrap();
        let recorder = tick_loop.add_system(Recorder { log: Arc::clone(&log) }).unwrap();

        commands.schedule_next_frame(Event::user(Ping(3)));
        tick_loop.tick().await;
        tick_loop.shutdown();
        countdown.join().await.unwrap();
        recorder.join().await.unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                "Setup", "BeginFrame", "Ping(3)", "Ping(2)", "Ping(1)", "Ping(0)", "EndFrame"
            ]
        );
    }

    #[tokio::test]
    async fn test_next_frame_events_wait_a_frame() {
        let log = Log::default();
        let mut tick_loop = TickLoop::new(fast()).unwrap();
        let commands = tick_loop.commands();
        let recorder = tick_loop.add_system(Recorder { log: Arc::clone(&log) }).unwrap();

        tick_loop.tick().await;
        commands.schedule_next_frame(Event::user(Ping(1)));
        commands.schedule_this_frame(Event::user(Ping(2)));
        tick_loop.tick().await;
        tick_loop.shutdown();
        recorder.join().await.unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                "Setup", "BeginFrame", "EndFrame", "BeginFrame", "Ping(1)", "Ping(2)", "EndFrame"
            ]
        );
    }

    #[derive(Debug, Clone)]
    struct Position;

    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[derive(Debug, Clone)]
    struct Wallet;

    impl Component for Wallet {
        fn type_name() -> &'static str {
            "Wallet"
        }
    }

    /// Tracks entities with both a position and a wallet.
    #[derive(Debug, Default)]
    struct Accounts {
        tracked: InterestSet<(Position, Wallet)>,
    }

    impl System for Accounts {
        fn name(&self) -> &str {
            "accounts"
        }

        async fn handle(&mut self, delivery: &Delivery) {
            delivery.event().track(&mut self.tracked);
        }
    }

    #[tokio::test]
    async fn test_interest_membership_follows_create_and_destroy() {
        let mut tick_loop = TickLoop::new(fast()).unwrap();
        let commands = tick_loop.commands();
        let accounts = tick_loop.add_system(Accounts::default()).unwrap();

        let rich = commands.create(bundle![Position, Wallet]);
        let poor = commands.create(bundle![Position]);
        let purse = commands.create(bundle![Wallet]);
        assert_eq!(commands.entities().created(), 3);

        tick_loop.tick().await;
        let late = commands.create(bundle![Wallet, Position]);
        commands.destroy(rich);
        tick_loop.tick().await;
        tick_loop.shutdown();

        let accounts = accounts.join().await.unwrap();
        let tracked: Vec<Entity> = accounts.tracked.entities().collect();
        assert_eq!(tracked, vec![late]);
        assert!(!accounts.tracked.contains(poor));
        assert!(!accounts.tracked.contains(purse));
    }

    /// Stops the loop on the third frame.
    struct Stopper {
        commands: Commands,
        frames: u32,
    }

    impl System for Stopper {
        fn name(&self) -> &str {
            "stopper"
        }

        async fn handle(&mut self, delivery: &Delivery) {
            if let Event::BeginFrame { .. } = delivery.event() {
                self.frames += 1;
                if self.frames == 3 {
                    self.commands.stop();
                }
            }
        }
    }

    #[tokio::test]
    async fn test_run_stops_on_flag_and_closes_everything() {
        let mut tick_loop = TickLoop::new(fast()).unwrap();
        let commands = tick_loop.commands();
        let stopper = tick_loop
            .add_system(Stopper {
                commands: commands.clone(),
                frames: 0,
            })
            .unwrap();

        tick_loop.run().await;
        assert_eq!(tick_loop.tick_id(), 3);
        assert!(!tick_loop.run_flag().is_running());
        assert!(tick_loop.bus().is_closed());

        commands.schedule_next_frame(Event::Setup);
        assert_eq!(stopper.join().await.unwrap().frames, 3);
    }

    #[tokio::test]
    async fn test_run_limited_ticks() {
        let config = EngineConfig {
            tick: TickConfig {
                tick_rate: 1000.0,
                max_ticks: 5,
            },
            ..EngineConfig::default()
        };
        let mut tick_loop = TickLoop::new(config).unwrap();
        tick_loop.run().await;
        assert_eq!(tick_loop.tick_id(), 5);
    }

    /// Records `(begin, delta)` for every frame boundary it sees.
    struct FrameClock {
        deltas: Arc<Mutex<Vec<(bool, f64)>>>,
    }

    impl System for FrameClock {
        fn name(&self) -> &str {
            "frame-clock"
        }

        async fn handle(&mut self, delivery: &Delivery) {
            match *delivery.event() {
                Event::BeginFrame { delta } => self.deltas.lock().push((true, delta)),
                Event::EndFrame { delta } => self.deltas.lock().push((false, delta)),
                _ => {}
            }
        }
    }

    #[tokio::test]
    async fn test_end_frame_repeats_the_begin_frame_delta() {
        let deltas = Arc::new(Mutex::new(Vec::new()));
        let mut tick_loop = TickLoop::new(fast()).unwrap();
        let handle = tick_loop
            .add_system(FrameClock {
                deltas: Arc::clone(&deltas),
            })
            .unwrap();

        tick_loop.tick().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        tick_loop.tick().await;
        tick_loop.shutdown();
        handle.join().await.unwrap();

        let deltas = deltas.lock().clone();
        assert_eq!(deltas.len(), 4);
        assert_eq!(
            deltas.iter().map(|(begin, _)| *begin).collect::<Vec<_>>(),
            vec![true, false, true, false]
        );
        assert_eq!(deltas[0].1, deltas[1].1);
        assert_eq!(deltas[2].1, deltas[3].1);
        assert!(deltas[0].1 >= 0.0 && deltas[0].1 < 0.05);
        assert!(deltas[2].1 >= 0.05);
    }

    #[tokio::test]
    async fn test_systems_cannot_join_after_start() {
        let mut tick_loop = TickLoop::new(fast()).unwrap();
        tick_loop.tick().await;
        let err = tick_loop.add_system(Accounts::default()).unwrap_err();
        assert!(matches!(err, BusError::AlreadyStarted(_)));
    }

    #[test]
    fn test_budget() {
        assert_eq!(TickConfig::default().budget(), Some(Duration::from_secs_f64(1.0 / 60.0)));
        let uncapped = TickConfig {
            tick_rate: 0.0,
            max_ticks: 0,
        };
        assert!(uncapped.budget().is_none());
    }
}
