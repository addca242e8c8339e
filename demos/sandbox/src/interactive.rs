//! Conversations between interactors and interactives.
//!
//! An [`Interact`] event opens the script of the nearest interactive within
//! range of the interactor; [`Choose`] answers the question currently shown.
//! Every question goes out as a [`DialogPrompt`] follow-up and the end of a
//! conversation as [`DialogClosed`].

use std::collections::BTreeMap;

use engine_bus::{Delivery, Event};
use engine_component::{Entity, InterestSet, interest};
use engine_math::Transform2D;
use engine_system::System;
use tracing::{debug, info, warn};

use crate::components::{Interactive, Interactor};
use crate::dialog::{Dialog, Prompt};
use crate::events::{Choose, DialogClosed, DialogPrompt, Interact, Translate};

/// Default interaction range.
pub const INTERACT_RANGE: f64 = 100.0;

interest! {
    #[derive(Debug)]
    pub struct Talker {
        pub transform: Transform2D,
        pub interactor: Interactor,
    }
}

interest! {
    #[derive(Debug)]
    pub struct Talkable {
        pub transform: Transform2D,
        pub interactive: Interactive,
    }
}

#[derive(Debug)]
struct Conversation {
    speaker: String,
    dialog: Dialog,
}

/// Runs dialog scripts on behalf of interactors.
#[derive(Debug)]
pub struct InteractiveSystem {
    talkers: InterestSet<Talker>,
    talkables: InterestSet<Talkable>,
    conversations: BTreeMap<Entity, Conversation>,
    range: f64,
}

impl Default for InteractiveSystem {
    fn default() -> Self {
        Self::new(INTERACT_RANGE)
    }
}

impl InteractiveSystem {
    #[must_use]
    pub fn new(range: f64) -> Self {
        Self {
            talkers: InterestSet::new(),
            talkables: InterestSet::new(),
            conversations: BTreeMap::new(),
            range,
        }
    }

    /// Returns `true` while `interactor` has a conversation open.
    #[must_use]
    pub fn in_conversation(&self, interactor: Entity) -> bool {
        self.conversations.contains_key(&interactor)
    }

    /// The closest interactive within range of `position`. Ties go to the
    /// lowest entity id.
    fn nearest(&self, position: Transform2D) -> Option<(Entity, &Talkable)> {
        self.talkables
            .iter()
            .map(|(entity, talkable)| {
                let distance = talkable.transform.position.distance(position.position);
                (distance, entity, talkable)
            })
            .filter(|(distance, ..)| *distance < self.range)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, entity, talkable)| (entity, talkable))
    }

    fn follow(&mut self, translate: &Translate) {
        if let Some(talker) = self.talkers.get_mut(translate.entity) {
            translate.apply(&mut talker.transform);
        }
        if let Some(talkable) = self.talkables.get_mut(translate.entity) {
            translate.apply(&mut talkable.transform);
        }
    }

    async fn interact(&mut self, interactor: Entity, delivery: &Delivery) {
        if self.in_conversation(interactor) {
            debug!(%interactor, "already in a conversation");
            return;
        }
        let position = self.talkers.require(interactor, "interact").transform;
        let Some((target, talkable)) = self.nearest(position) else {
            debug!(%interactor, "nothing in range");
            return;
        };
        let speaker = talkable.interactive.name.clone();
        let script = talkable.interactive.script.clone();
        info!(%interactor, %target, speaker, "conversation started");

        let (dialog, prompt) = Dialog::start(&script, delivery).await;
        self.conversations.insert(interactor, Conversation { speaker, dialog });
        self.show(interactor, prompt, delivery);
    }

    async fn choose(&mut self, choose: &Choose, delivery: &Delivery) {
        let Some(conversation) = self.conversations.get_mut(&choose.interactor) else {
            warn!(interactor = %choose.interactor, "choice without a conversation ignored");
            return;
        };
        if choose.choice >= conversation.dialog.open_choices() {
            warn!(
                interactor = %choose.interactor,
                choice = choose.choice,
                open = conversation.dialog.open_choices(),
                "choice out of range ignored"
            );
            return;
        }
        let prompt = conversation.dialog.answer(choose.choice, delivery).await;
        self.show(choose.interactor, prompt, delivery);
    }

    /// Publish the next question, or close the conversation.
    fn show(&mut self, interactor: Entity, prompt: Option<Prompt>, delivery: &Delivery) {
        match prompt {
            Some(Prompt { text, choices }) => {
                let speaker = self
                    .conversations
                    .get(&interactor)
                    .map(|conversation| conversation.speaker.clone())
                    .unwrap_or_default();
                delivery.emit(Event::user(DialogPrompt {
                    interactor,
                    speaker,
                    text,
                    choices,
                }));
            }
            None => {
                if let Some(conversation) = self.conversations.remove(&interactor) {
                    info!(%interactor, speaker = conversation.speaker, "conversation closed");
                    delivery.emit(Event::user(DialogClosed {
                        interactor,
                        speaker: conversation.speaker,
                    }));
                }
            }
        }
    }
}

impl System for InteractiveSystem {
    fn name(&self) -> &str {
        "interactive"
    }

    async fn handle(&mut self, delivery: &Delivery) {
        let event = delivery.event();
        match event {
            Event::EntityAdded { .. } => {
                event.track(&mut self.talkers);
                event.track(&mut self.talkables);
            }
            Event::EntityRemoved { entity } => {
                event.track(&mut self.talkers);
                event.track(&mut self.talkables);
                if self.conversations.remove(entity).is_some() {
                    debug!(interactor = %entity, "conversation dropped with its interactor");
                }
            }
            _ => {
                if let Some(translate) = event.downcast::<Translate>() {
                    self.follow(translate);
                } else if let Some(interact) = event.downcast::<Interact>() {
                    self.interact(interact.interactor, delivery).await;
                } else if let Some(choose) = event.downcast::<Choose>() {
                    self.choose(choose, delivery).await;
                }
            }
        }
    }
}
