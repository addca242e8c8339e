//! Text report of the world, standing in for a renderer.

use engine_bus::{Delivery, Event};
use engine_component::InterestSet;
use engine_math::Transform2D;
use engine_system::System;
use tracing::{debug, info};

use crate::events::{DialogClosed, DialogPrompt, Translate};

/// Logs dialog traffic as it happens and a summary of every positioned
/// entity every `every` frames.
#[derive(Debug)]
pub struct ReportSystem {
    every: u64,
    frames: u64,
    positions: InterestSet<(Transform2D,)>,
    transcript: Vec<String>,
}

impl ReportSystem {
    /// Report every `every` frames; 0 disables the periodic summary.
    #[must_use]
    pub fn new(every: u64) -> Self {
        Self {
            every,
            frames: 0,
            positions: InterestSet::new(),
            transcript: Vec::new(),
        }
    }

    /// Frames seen so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Every dialog line shown, as `speaker: text`.
    #[must_use]
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    fn summarize(&self) {
        info!(frame = self.frames, entities = self.positions.len(), "frame report");
        for (entity, (transform,)) in self.positions.iter() {
            debug!(
                %entity,
                x = transform.position.x,
                y = transform.position.y,
                parent = %transform.parent,
                "position"
            );
        }
    }
}

impl System for ReportSystem {
    fn name(&self) -> &str {
        "report"
    }

    async fn handle(&mut self, delivery: &Delivery) {
        let event = delivery.event();
        if event.track(&mut self.positions) {
            return;
        }
        if let Event::EndFrame { .. } = event {
            self.frames += 1;
            if self.every > 0 && self.frames % self.every == 0 {
                self.summarize();
            }
        } else if let Some(translate) = event.downcast::<Translate>() {
            if let Some((transform,)) = self.positions.get_mut(translate.entity) {
                translate.apply(transform);
            }
        } else if let Some(prompt) = event.downcast::<DialogPrompt>() {
            info!(speaker = prompt.speaker, choices = ?prompt.choices, "{}", prompt.text);
            self.transcript.push(format!("{}: {}", prompt.speaker, prompt.text));
        } else if let Some(closed) = event.downcast::<DialogClosed>() {
            info!(speaker = closed.speaker, "dialog closed");
        }
    }
}
