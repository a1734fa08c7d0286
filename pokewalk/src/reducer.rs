use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::capture::{berry_increment, draw_creature, resolve_throw, roll_capture_rewards, Rewards};
use crate::creature::{display_name, Species};
use crate::effect::Effect;
use crate::encounter::{Encounter, EncounterTimer, MenuItem};
use crate::reveal::ViewMode;
use crate::session::{Account, LoginOutcome};
use crate::state::{AppState, CatalogStatus, Screen, SyncStatus};
use crate::zones::ZoneCategory;

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            let mut effects = vec![Effect::LoadCatalog];
            if let Some(player_id) = state.account.player_id() {
                effects.push(Effect::Login { player_id });
            }
            if state.view == ViewMode::Fog {
                reveal_around_actor(state);
            }
            DispatchResult::changed_with_many(effects)
        }

        Action::UiTerminalResize(width, height) => {
            state.terminal_size = (width, height);
            DispatchResult::changed()
        }

        Action::Frame { now_ms } => on_frame(state, now_ms),

        Action::MoveKeyDown(direction) => {
            if state.screen != Screen::Walk {
                return DispatchResult::unchanged();
            }
            let pressed = state.input.press(direction, state.now_ms);
            let started = state.game_loop.start();
            if pressed || started {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::MoveKeyUp(direction) => {
            if state.input.release(direction) {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::ViewToggle => {
            state.view = state.view.toggled();
            if state.view == ViewMode::Fog {
                state.revealed.clear();
                reveal_around_actor(state);
                return DispatchResult::changed_with(Effect::SaveRevealed {
                    keys: state.revealed.keys(),
                });
            }
            DispatchResult::changed()
        }

        Action::PokedexToggle => match state.screen {
            Screen::Walk => open_pokedex(state),
            Screen::Pokedex => {
                state.screen = Screen::Walk;
                DispatchResult::changed()
            }
            Screen::Encounter => DispatchResult::unchanged(),
        },

        Action::PokedexClose => {
            if state.screen != Screen::Pokedex {
                return DispatchResult::unchanged();
            }
            state.screen = Screen::Walk;
            DispatchResult::changed()
        }

        Action::PokedexSelect(index) => {
            if index < state.pokedex().len() && index != state.pokedex_selected {
                state.pokedex_selected = index;
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::PokedexRelease => release_selected(state),

        Action::EncounterMenuNext => match state.encounter.as_mut() {
            Some(encounter) if encounter.is_ready() => {
                encounter.select_next();
                DispatchResult::changed()
            }
            _ => DispatchResult::unchanged(),
        },

        Action::EncounterMenuPrev => match state.encounter.as_mut() {
            Some(encounter) if encounter.is_ready() => {
                encounter.select_prev();
                DispatchResult::changed()
            }
            _ => DispatchResult::unchanged(),
        },

        Action::EncounterConfirm => encounter_confirm(state),

        Action::EncounterRun => {
            if state.encounter.is_none() {
                return DispatchResult::unchanged();
            }
            state.notify("Got away safely.");
            end_encounter(state)
        }

        Action::EncounterDismiss => {
            if state.encounter.as_ref().is_some_and(Encounter::is_caught) {
                end_encounter(state)
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::CatalogDidLoad(species) => {
            if !species.is_empty() {
                tracing::info!(species = species.len(), "catalog loaded");
                install_catalog(state, species, CatalogStatus::Remote);
                return DispatchResult::changed();
            }
            tracing::warn!("remote catalog is empty, drawing random creatures per encounter");
            state.catalog.clear();
            state.catalog_status = CatalogStatus::RandomOnly;
            if waiting_for_creature(state) {
                DispatchResult::changed_with(Effect::FetchRandomCreature)
            } else {
                DispatchResult::changed()
            }
        }

        Action::CatalogDidError(error) => {
            tracing::warn!(%error, "catalog unavailable, using fallback roster");
            use_fallback_catalog(state);
            state.notify("Catalog unavailable, using the bundled roster.");
            DispatchResult::changed()
        }

        Action::RandomCreatureDidLoad(species) => match state.encounter.as_mut() {
            Some(encounter) if encounter.creature.is_none() => {
                encounter.appear(species);
                DispatchResult::changed()
            }
            _ => DispatchResult::unchanged(),
        },

        Action::RandomCreatureDidError(error) => {
            tracing::warn!(%error, "random creature unavailable, using fallback roster");
            use_fallback_catalog(state);
            state.notify("No creature from the server, using the bundled roster.");
            DispatchResult::changed()
        }

        Action::LoginDidFinish(outcome) => {
            match &outcome {
                LoginOutcome::Bound(player) => {
                    state.notify(format!("Signed in as {}.", player.name));
                }
                LoginOutcome::Stale(id) => {
                    state.notify(format!("Account #{id} no longer exists, playing as guest."));
                }
                LoginOutcome::Unreachable { reason, .. } => {
                    state.notify(format!("Server unreachable ({reason}), playing offline."));
                }
            }
            bind_account(state, outcome.account());
            match outcome {
                LoginOutcome::Bound(player) => start_sync(state, player.id),
                _ => DispatchResult::changed(),
            }
        }

        Action::SyncRequest => {
            let Some(player_id) = state.account.player_id() else {
                state.notify("Sign in with --account to sync.");
                return DispatchResult::changed();
            };
            if state.sync == SyncStatus::Running {
                return DispatchResult::unchanged();
            }
            start_sync(state, player_id)
        }

        Action::SyncTick => match state.account.player_id() {
            Some(player_id) if state.sync == SyncStatus::Idle => start_sync(state, player_id),
            Some(player_id) if matches!(state.sync, SyncStatus::Done(_)) => {
                start_sync(state, player_id)
            }
            _ => DispatchResult::unchanged(),
        },

        Action::SyncDidFinish(report) => {
            let summary = report.summary();
            if !report.is_clean() {
                state.notify(format!("Sync incomplete: {summary}"));
            }
            state.sync = SyncStatus::Done(summary);
            DispatchResult::changed()
        }

        Action::SyncDidError { message, stale } => {
            if stale {
                state.notify("Account no longer exists, playing as guest.");
                bind_account(state, Account::Guest);
            } else {
                state.notify(format!("Sync failed: {message}"));
            }
            state.sync = SyncStatus::Failed(message);
            DispatchResult::changed()
        }

        Action::CheckpointDidSave => DispatchResult::unchanged(),

        Action::CheckpointDidError(error) => {
            tracing::warn!(%error, "checkpoint failed");
            DispatchResult::unchanged()
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

fn on_frame(state: &mut AppState, now_ms: u64) -> DispatchResult<Effect> {
    state.now_ms = now_ms;
    let mut changed = state.expire_notices();
    changed |= state.input.expire(now_ms, state.config.key_hold_ms);

    if state.encounter.is_some() {
        return advance_encounter(state, now_ms, changed);
    }
    if !state.game_loop.is_running() {
        return changed_if(changed);
    }

    let snapshot = state.input.snapshot();
    let result = state.game_loop.tick(
        &mut state.actor,
        &snapshot,
        now_ms,
        &state.world,
        &state.config.movement,
        &mut state.rng,
    );
    let Some(step) = result.step else {
        return changed_if(changed);
    };

    if step.moved && state.view == ViewMode::Fog {
        reveal_around_actor(state);
    }

    let mut effects = Vec::new();
    if result.checkpoint {
        tracing::debug!(
            x = state.actor.position.x,
            y = state.actor.position.y,
            "position checkpoint"
        );
        effects.push(Effect::SavePosition {
            position: state.actor.position,
        });
        if state.view == ViewMode::Fog {
            effects.push(Effect::SaveRevealed {
                keys: state.revealed.keys(),
            });
        }
    }

    if let Some(zone) = step.encounter {
        effects.extend(start_encounter(state, zone));
    }

    DispatchResult::changed_with_many(effects)
}

fn changed_if(changed: bool) -> DispatchResult<Effect> {
    if changed {
        DispatchResult::changed()
    } else {
        DispatchResult::unchanged()
    }
}

fn reveal_around_actor(state: &mut AppState) -> usize {
    let radius = state.reveal_radius();
    state.revealed.reveal_around(state.actor.position, radius)
}

/// Opens the encounter screen. Returns a fetch when the creature has to come
/// from the remote.
fn start_encounter(state: &mut AppState, zone: ZoneCategory) -> Option<Effect> {
    state.input.clear();
    state.game_loop.stop();
    state.screen = Screen::Encounter;

    let mut encounter = Encounter::new(zone);
    if let Some(species) = draw_creature(
        &state.catalog,
        zone,
        state.config.roster_retry_cap,
        &mut state.rng,
    ) {
        encounter.appear(species);
    }
    tracing::debug!(zone = zone.label(), "encounter started");
    state.encounter = Some(encounter);

    (waiting_for_creature(state) && state.catalog_status == CatalogStatus::RandomOnly)
        .then_some(Effect::FetchRandomCreature)
}

fn waiting_for_creature(state: &AppState) -> bool {
    state
        .encounter
        .as_ref()
        .is_some_and(|encounter| encounter.creature.is_none())
}

fn end_encounter(state: &mut AppState) -> DispatchResult<Effect> {
    state.encounter = None;
    state.actor.in_encounter = false;
    state.input.clear();
    state.game_loop.stop();
    state.screen = Screen::Walk;
    DispatchResult::changed()
}

fn advance_encounter(state: &mut AppState, now_ms: u64, changed: bool) -> DispatchResult<Effect> {
    let timer = state
        .encounter
        .as_mut()
        .and_then(|encounter| encounter.advance(now_ms));
    match timer {
        Some(EncounterTimer::ThrowLanded) => {
            land_throw(state);
            DispatchResult::changed()
        }
        Some(EncounterTimer::Recovered) => DispatchResult::changed(),
        None => changed_if(changed),
    }
}

fn land_throw(state: &mut AppState) {
    let now_ms = state.now_ms;
    let recover_ms = state.config.escape_recover_ms;
    let Some(encounter) = state.encounter.as_mut() else {
        return;
    };
    let Some(species) = encounter.creature.clone() else {
        return;
    };

    let result = resolve_throw(&species, &encounter.bonus, &mut state.rng);
    let mut rewards = Rewards::default();
    if result.caught {
        state.inventory.capture(&species);
        rewards = roll_capture_rewards(
            &state.config.capture,
            state.inventory.inventory().pokeballs,
            &mut state.rng,
        );
        state.inventory.add_rewards(rewards);
    }
    encounter.land_throw(result, rewards, now_ms, recover_ms);
    tracing::debug!(
        creature = %species.name,
        caught = result.caught,
        roll = result.roll,
        difficulty = result.difficulty,
        "throw landed"
    );

    let name = display_name(&species.name);
    if result.caught {
        state.notify(format!("Gotcha! {name} was caught!"));
    } else {
        state.notify(format!("Oh no! {name} broke free!"));
    }
}

fn encounter_confirm(state: &mut AppState) -> DispatchResult<Effect> {
    let Some((selected, caught, ready)) = state
        .encounter
        .as_ref()
        .map(|encounter| (encounter.selected, encounter.is_caught(), encounter.is_ready()))
    else {
        return DispatchResult::unchanged();
    };
    if caught {
        return end_encounter(state);
    }
    if !ready {
        return DispatchResult::unchanged();
    }

    match selected {
        MenuItem::Ball => {
            if !state.inventory.use_pokeball() {
                state.notify("No pokeballs left!");
                return DispatchResult::changed();
            }
            let (now_ms, delay_ms) = (state.now_ms, state.config.throw_delay_ms);
            if let Some(encounter) = state.encounter.as_mut() {
                encounter.begin_throw(now_ms, delay_ms);
            }
            DispatchResult::changed()
        }
        MenuItem::Berry => {
            if !state.inventory.use_berry() {
                state.notify("No berries left!");
                return DispatchResult::changed();
            }
            let increment = berry_increment(&state.config.capture, &mut state.rng);
            let cap = state.config.capture.bonus_cap;
            let bonus = state
                .encounter
                .as_mut()
                .map_or(0.0, |encounter| encounter.feed_berry(increment, cap));
            state.notify(format!("Berry eaten, catch bonus {:.0}%.", bonus * 100.0));
            DispatchResult::changed()
        }
        MenuItem::Run => {
            state.notify("Got away safely.");
            end_encounter(state)
        }
    }
}

fn open_pokedex(state: &mut AppState) -> DispatchResult<Effect> {
    state.screen = Screen::Pokedex;
    state.input.clear();
    state.game_loop.stop();
    let len = state.pokedex().len();
    if state.pokedex_selected >= len {
        state.pokedex_selected = len.saturating_sub(1);
    }
    DispatchResult::changed_with(Effect::SavePosition {
        position: state.actor.position,
    })
}

fn release_selected(state: &mut AppState) -> DispatchResult<Effect> {
    if state.screen != Screen::Pokedex {
        return DispatchResult::unchanged();
    }
    let Some(name) = state.selected_creature().map(|creature| creature.name.clone()) else {
        return DispatchResult::unchanged();
    };
    let Some(release) = state
        .inventory
        .release(&name, &state.config.capture, &mut state.rng)
    else {
        return DispatchResult::unchanged();
    };

    let len = state.pokedex().len();
    if state.pokedex_selected >= len {
        state.pokedex_selected = len.saturating_sub(1);
    }
    state.notify(format!(
        "Released {}: +{} pokeballs, +{} berries.",
        display_name(&release.name),
        release.rewards.pokeballs,
        release.rewards.berries
    ));
    DispatchResult::changed()
}

fn install_catalog(state: &mut AppState, species: Vec<Species>, status: CatalogStatus) {
    state.catalog = species;
    state.catalog_status = status;

    let retry_cap = state.config.roster_retry_cap;
    if let Some(encounter) = state.encounter.as_mut() {
        if encounter.creature.is_none() {
            if let Some(species) =
                draw_creature(&state.catalog, encounter.zone, retry_cap, &mut state.rng)
            {
                encounter.appear(species);
            }
        }
    }
}

fn use_fallback_catalog(state: &mut AppState) {
    let roster = state.config.fallback_roster.clone();
    install_catalog(state, roster, CatalogStatus::Fallback);
}

fn bind_account(state: &mut AppState, account: Account) {
    state.inventory.bind(account.cache_key());
    state.account = account;
    state.pokedex_selected = 0;
}

fn start_sync(state: &mut AppState, player_id: u64) -> DispatchResult<Effect> {
    state.sync = SyncStatus::Running;
    DispatchResult::changed_with(Effect::Sync {
        player_id,
        inventory: state.inventory.inventory().clone(),
    })
}
