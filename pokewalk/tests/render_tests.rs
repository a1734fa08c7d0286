//! Plain-text render checks for each screen.

use pokewalk::creature::Species;
use pokewalk::encounter::Encounter;
use pokewalk::reveal::ViewMode;
use pokewalk::state::{AppState, Screen};
use pokewalk::ui;
use pokewalk::zones::ZoneCategory;
use tui_dispatch::testing::*;

fn render(state: &AppState, width: u16, height: u16) -> String {
    let mut render = RenderHarness::new(width, height);
    render.render_to_string_plain(|frame| {
        let area = frame.area();
        ui::draw(frame, area, state);
    })
}

#[test]
fn walk_screen_shows_inventory_and_view() {
    let state = AppState::default();
    let output = render(&state, 100, 40);

    assert!(output.contains("Balls 30"), "header shows pokeballs:\n{output}");
    assert!(output.contains("Berries 5"));
    assert!(output.contains(" full view "));
}

#[test]
fn fog_view_is_labelled() {
    let mut state = AppState::default();
    state.view = ViewMode::Fog;
    let output = render(&state, 100, 40);

    assert!(output.contains(" fog view "));
}

#[test]
fn empty_pokedex_says_so() {
    let mut state = AppState::default();
    state.screen = Screen::Pokedex;
    let output = render(&state, 100, 40);

    assert!(output.contains("POKEDEX"));
    assert!(output.contains("Nothing caught yet."));
}

#[test]
fn pokedex_lists_captures() {
    let mut state = AppState::default();
    state
        .inventory
        .capture(&Species::new("pikachu", "25.png", &["electric"]));
    state.screen = Screen::Pokedex;
    let output = render(&state, 100, 40);

    assert!(output.contains("Pikachu"));
    assert!(!output.contains("Nothing caught yet."));
}

#[test]
fn encounter_panel_names_the_creature() {
    let mut state = AppState::default();
    let mut encounter = Encounter::new(ZoneCategory::Common);
    encounter.appear(Species::new("pikachu", "25.png", &["electric"]));
    state.encounter = Some(encounter);
    state.screen = Screen::Encounter;
    let output = render(&state, 100, 40);

    assert!(output.contains("A wild Pikachu appeared!"));
    assert!(output.contains("electric"));
}

#[test]
fn encounter_waits_for_creature() {
    let mut state = AppState::default();
    state.encounter = Some(Encounter::new(ZoneCategory::Aquatic));
    state.screen = Screen::Encounter;
    let output = render(&state, 100, 40);

    assert!(output.contains("Something stirs..."));
}

#[test]
fn tiny_terminal_shows_warning() {
    let output = render(&AppState::default(), 20, 8);
    assert!(output.contains("Terminal"));
}
