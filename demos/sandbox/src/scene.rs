//! The demo world: a player, two characters to talk to and some sparks.

use engine_bus::Event;
use engine_component::{Entity, bundle};
use engine_math::{DVec2, Transform2D};
use engine_system::Commands;

use crate::autopilot::Visit;
use crate::balance::BalanceBook;
use crate::components::{Interactive, Interactor, Label, Particle, Physics, Player, Wallet};
use crate::dialog::{DialogScript, Prompter, script};
use crate::events::BalanceChange;

/// Money the player starts with.
pub const STARTING_BALANCE: i64 = 100;
/// Price of a meal at the shop.
pub const MEAL_PRICE: i64 = 20;
/// What the shopkeeper hands out when asked for money.
pub const HANDOUT: i64 = 50;

/// Entities created by [`populate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scene {
    pub player: Entity,
    pub nameplate: Entity,
    pub greeter: Entity,
    pub shopkeeper: Entity,
}

impl Scene {
    /// Visit the greeter, then buy a meal and ask for money at the shop.
    #[must_use]
    pub fn itinerary(&self) -> Vec<Visit> {
        vec![
            Visit {
                target: GREETER_AT,
                answers: vec![1, 0, 0],
            },
            Visit {
                target: SHOP_AT,
                answers: vec![1, 0, 0, 0, 2],
            },
        ]
    }
}

const PLAYER_AT: DVec2 = DVec2::new(20.0, 20.0);
const GREETER_AT: DVec2 = DVec2::new(200.0, 200.0);
const SHOP_AT: DVec2 = DVec2::new(500.0, 300.0);

/// A short chat about names.
#[must_use]
pub fn greeter_script() -> DialogScript {
    script(|mut prompter: Prompter| async move {
        match prompter.prompt("Hello there! What's your name?", &["Sam", "Alice"]).await? {
            0 => {
                prompter.prompt("Nice to meet you, Sam.", &["Likewise."]).await?;
            }
            _ => {
                let reply = prompter
                    .prompt("No way, mine too!", &["Small world.", "Are you sure?"])
                    .await?;
                let last = if reply == 0 {
                    "It really is."
                } else {
                    "Quite sure, thank you."
                };
                prompter.prompt(last, &["Bye!"]).await?;
            }
        }
        Some(())
    })
}

/// A shop that sells meals to `customer` and occasionally gives money away.
#[must_use]
pub fn shop_script(customer: Entity, book: BalanceBook) -> DialogScript {
    script(move |mut prompter: Prompter| {
        let book = book.clone();
        async move {
            loop {
                let choice = prompter
                    .prompt(
                        "What can I get you?",
                        &["Some money!", "A meal.", "Nothing, bye."],
                    )
                    .await?;
                match choice {
                    0 => {
                        prompter
                            .emit(Event::user(BalanceChange {
                                entity: customer,
                                change: HANDOUT,
                            }))
                            .await?;
                        prompter.prompt("Fine, take this.", &["Thanks!"]).await?;
                    }
                    1 => {
                        let balance = book.balance(customer).unwrap_or(0);
                        if balance >= MEAL_PRICE {
                            prompter
                                .emit(Event::user(BalanceChange {
                                    entity: customer,
                                    change: -MEAL_PRICE,
                                }))
                                .await?;
                            let text = format!("Enjoy! You have ${} left.", balance - MEAL_PRICE);
                            prompter.prompt(text, &["Delicious."]).await?;
                        } else {
                            prompter.prompt("You can't afford it.", &["Oh."]).await?;
                        }
                    }
                    _ => return Some(()),
                }
            }
        }
    })
}

/// Create the demo world. Everything appears on the first frame.
pub fn populate(commands: &Commands, book: &BalanceBook) -> Scene {
    let player = commands.create(bundle![
        Transform2D::at(PLAYER_AT.x, PLAYER_AT.y),
        Wallet {
            balance: STARTING_BALANCE
        },
        Physics::default(),
        Player,
        Interactor,
    ]);
    let nameplate = commands.create(bundle![
        Transform2D::at(PLAYER_AT.x, PLAYER_AT.y + 40.0).with_parent(player),
        Label {
            text: "Player".to_owned()
        },
    ]);
    let greeter = commands.create(bundle![
        Transform2D::at(GREETER_AT.x, GREETER_AT.y),
        Interactive {
            name: "Alice".to_owned(),
            prompt: "[space] Talk".to_owned(),
            script: greeter_script(),
        },
    ]);
    let shopkeeper = commands.create(bundle![
        Transform2D::at(SHOP_AT.x, SHOP_AT.y),
        Interactive {
            name: "Rod".to_owned(),
            prompt: "[space] Shop".to_owned(),
            script: shop_script(player, book.clone()),
        },
    ]);

    for i in 0..8u32 {
        let angle = f64::from(i) * std::f64::consts::FRAC_PI_4;
        commands.create(bundle![
            Transform2D::at(GREETER_AT.x, GREETER_AT.y),
            Physics {
                velocity: DVec2::from_angle(angle) * 300.0
            },
            Particle::new(),
        ]);
    }

    Scene {
        player,
        nameplate,
        greeter,
        shopkeeper,
    }
}
