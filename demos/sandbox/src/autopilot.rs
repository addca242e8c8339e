//! Scripted stand-in for player input.
//!
//! The autopilot walks the player to each stop of an itinerary, starts a
//! conversation there and answers every question from a fixed list. Once the
//! itinerary is done it stops the tick loop.

use std::collections::VecDeque;

use engine_bus::{Delivery, Event};
use engine_component::{Entity, InterestSet, interest};
use engine_math::{DVec2, Transform2D};
use engine_system::{Commands, System};
use tracing::{info, warn};

use crate::components::Player;
use crate::events::{ApplyVelocity, Choose, DialogClosed, DialogPrompt, Interact, Translate};

/// Distance to a stop at which the player tries to talk.
const ARRIVE_DISTANCE: f64 = 40.0;
/// Acceleration towards the next stop, in units per second squared.
const THRUST: f64 = 800.0;

/// One stop of the itinerary.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub target: DVec2,
    /// Answers to give, in order. Missing answers pick the first choice.
    pub answers: Vec<usize>,
}

interest! {
    #[derive(Debug)]
    pub struct Pilot {
        pub transform: Transform2D,
        pub player: Player,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Travelling,
    /// `Interact` sent; a prompt should arrive before the frame ends.
    Knocking,
    Talking,
    Done,
}

/// Drives the player through an itinerary.
#[derive(Debug)]
pub struct Autopilot {
    commands: Commands,
    pilots: InterestSet<Pilot>,
    itinerary: VecDeque<Visit>,
    answers: VecDeque<usize>,
    leg: Leg,
    visited: usize,
}

impl Autopilot {
    #[must_use]
    pub fn new(commands: Commands, itinerary: Vec<Visit>) -> Self {
        Self {
            commands,
            pilots: InterestSet::new(),
            itinerary: itinerary.into(),
            answers: VecDeque::new(),
            leg: Leg::Travelling,
            visited: 0,
        }
    }

    /// Number of stops completed.
    #[must_use]
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// Returns `true` once the itinerary is done.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.leg == Leg::Done
    }

    fn pilot(&self) -> Option<(Entity, &Pilot)> {
        self.pilots.iter().next()
    }

    fn steer(&mut self, delta: f64, delivery: &Delivery) {
        let Some((player, pilot)) = self.pilot() else {
            return;
        };
        let Some(visit) = self.itinerary.front() else {
            self.leg = Leg::Done;
            info!(visited = self.visited, "itinerary complete");
            self.commands.stop();
            return;
        };

        let to_target = visit.target - pilot.transform.position;
        if to_target.length() <= ARRIVE_DISTANCE {
            self.answers = visit.answers.iter().copied().collect();
            self.leg = Leg::Knocking;
            delivery.emit(Event::user(Interact { interactor: player }));
        } else {
            delivery.emit(Event::user(ApplyVelocity {
                entity: player,
                velocity: to_target.normalize() * THRUST * delta,
            }));
        }
    }

    fn next_stop(&mut self) {
        self.itinerary.pop_front();
        self.answers.clear();
        self.visited += 1;
        self.leg = Leg::Travelling;
    }

    fn answer(&mut self, prompt: &DialogPrompt) {
        self.leg = Leg::Talking;
        let last = prompt.choices.len().saturating_sub(1);
        let choice = self.answers.pop_front().unwrap_or(0).min(last);
        info!(
            speaker = prompt.speaker,
            text = prompt.text,
            answer = prompt.choices.get(choice).map_or("", String::as_str),
            "answering"
        );
        self.commands.schedule_next_frame(Event::user(Choose {
            interactor: prompt.interactor,
            choice,
        }));
    }

    fn is_pilot(&self, entity: Entity) -> bool {
        self.pilots.contains(entity)
    }
}

impl System for Autopilot {
    fn name(&self) -> &str {
        "autopilot"
    }

    async fn handle(&mut self, delivery: &Delivery) {
        let event = delivery.event();
        if event.track(&mut self.pilots) {
            return;
        }
        match *event {
            Event::BeginFrame { delta } if self.leg == Leg::Travelling => {
                self.steer(delta, delivery);
            }
            Event::EndFrame { .. } if self.leg == Leg::Knocking => {
                warn!("nobody answered, skipping stop");
                self.next_stop();
            }
            _ => {}
        }

        if let Some(translate) = event.downcast::<Translate>()
            && let Some(pilot) = self.pilots.get_mut(translate.entity)
        {
            translate.apply(&mut pilot.transform);
        } else if let Some(prompt) = event.downcast::<DialogPrompt>()
            && self.is_pilot(prompt.interactor)
        {
            self.answer(prompt);
        } else if let Some(closed) = event.downcast::<DialogClosed>()
            && self.is_pilot(closed.interactor)
        {
            info!(speaker = closed.speaker, "conversation over");
            self.next_stop();
        }
    }
}
