//! # sandbox
//!
//! A small world built on the event-bus engine. Every collaborator is an
//! ordinary bus subscriber:
//!
//! - [`TransformSystem`] — authoritative positions, parent/child movement.
//! - [`PhysicsSystem`] — velocity, floor and walls.
//! - [`ParticleSystem`] — sparks that fall, shrink and expire.
//! - [`BalanceSystem`] — wallets.
//! - [`InteractiveSystem`] — scripted conversations.
//! - [`Autopilot`] — stands in for player input.
//! - [`ReportSystem`] — logs what a renderer would draw.

pub mod autopilot;
pub mod balance;
pub mod components;
pub mod dialog;
pub mod events;
pub mod interactive;
pub mod particle;
pub mod physics;
pub mod report;
pub mod scene;
pub mod transform;

use engine_app::TickLoop;
use engine_bus::BusError;
use engine_system::{SystemError, SystemHandle};

pub use autopilot::{Autopilot, Visit};
pub use balance::{BalanceBook, BalanceSystem};
pub use interactive::InteractiveSystem;
pub use particle::{ParticleSystem, particle_system};
pub use physics::{Bounds, PhysicsSystem};
pub use report::ReportSystem;
pub use transform::TransformSystem;

/// Handles of every sandbox system attached to a tick loop.
#[derive(Debug)]
pub struct Sandbox {
    pub transform: SystemHandle<TransformSystem>,
    pub physics: SystemHandle<PhysicsSystem>,
    pub particle: SystemHandle<ParticleSystem>,
    pub balance: SystemHandle<BalanceSystem>,
    pub interactive: SystemHandle<InteractiveSystem>,
    pub autopilot: SystemHandle<Autopilot>,
    pub report: SystemHandle<ReportSystem>,
}

/// The systems a sandbox run ends with.
#[derive(Debug)]
pub struct Finished {
    pub transform: TransformSystem,
    pub balance: BalanceSystem,
    pub autopilot: Autopilot,
    pub report: ReportSystem,
}

impl Sandbox {
    /// Attach every sandbox system, in delivery order.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the loop has already started.
    pub fn attach(
        tick_loop: &mut TickLoop,
        book: BalanceBook,
        itinerary: Vec<Visit>,
        report_every: u64,
    ) -> Result<Self, BusError> {
        let commands = tick_loop.commands();
        Ok(Self {
            transform: tick_loop.add_system(TransformSystem::new())?,
            physics: tick_loop.add_system(PhysicsSystem::default())?,
            particle: tick_loop.add_system(particle_system(commands.clone()))?,
            balance: tick_loop.add_system(BalanceSystem::new(book))?,
            interactive: tick_loop.add_system(InteractiveSystem::default())?,
            autopilot: tick_loop.add_system(Autopilot::new(commands, itinerary))?,
            report: tick_loop.add_system(ReportSystem::new(report_every))?,
        })
    }

    /// Wait for every system to stop after shutdown.
    ///
    /// # Errors
    ///
    /// Returns the first [`SystemError`] among the systems.
    pub async fn join(self) -> Result<Finished, SystemError> {
        let transform = self.transform.join().await?;
        self.physics.join().await?;
        self.particle.join().await?;
        let balance = self.balance.join().await?;
        self.interactive.join().await?;
        let autopilot = self.autopilot.join().await?;
        let report = self.report.join().await?;
        Ok(Finished {
            transform,
            balance,
            autopilot,
            report,
        })
    }
}
