use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{block::Title, Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::{EventKind, EventOutcome, RenderContext};
use tui_map::prelude::{
    Camera, MapRead, MapRenderer, MapSize, TileKind, TilePalette, TileTheme, ViewScale,
};

use crate::action::Action;
use crate::capture::catch_chance;
use crate::creature::display_name;
use crate::encounter::{EncounterStage, MenuItem};
use crate::game_loop::camera_origin;
use crate::geometry::Point;
use crate::input::Direction;
use crate::map::WorldMap;
use crate::reveal::{RevealedAreas, ViewMode};
use crate::state::{AppState, CatalogStatus, Screen, SyncStatus};

const BG_BASE: Color = Color::Rgb(24, 36, 26);
const BG_PANEL: Color = Color::Rgb(34, 58, 38);
const BG_PANEL_ALT: Color = Color::Rgb(28, 48, 32);
const BG_HEADER: Color = Color::Rgb(26, 46, 34);
const TEXT_MAIN: Color = Color::Rgb(228, 236, 214);
const TEXT_DIM: Color = Color::Rgb(172, 186, 160);
const ACCENT_GREEN: Color = Color::Rgb(104, 204, 120);
const ACCENT_GOLD: Color = Color::Rgb(222, 196, 120);
const ACCENT_RED: Color = Color::Rgb(220, 96, 88);
const HIGHLIGHT_BG: Color = ACCENT_GREEN;
const HIGHLIGHT_TEXT: Color = Color::Rgb(16, 26, 18);
const BORDER_ACCENT: Color = Color::Rgb(74, 98, 82);
const FOG: Color = Color::Rgb(10, 12, 14);

const HELP_WALK: &str = "Arrows/WASD move  |  Enter pokedex  |  v view  |  y sync  |  q quit";
const HELP_POKEDEX: &str = "Up/Down select  |  x release  |  Enter/Esc close";
const HELP_ENCOUNTER: &str = "Arrows choose  |  Enter confirm  |  r run";

fn map_theme() -> TileTheme {
    TileTheme::builder()
        .tile(
            TileKind::Ground,
            TilePalette::textured(
                Color::Rgb(156, 132, 76),
                Color::Rgb(150, 128, 74),
                ['.', ':', '\''],
                6,
            ),
        )
        .tile(
            TileKind::Grass,
            TilePalette::textured(
                Color::Rgb(34, 112, 58),
                Color::Rgb(38, 120, 64),
                ['"', '\'', '`'],
                3,
            ),
        )
        .tile(
            TileKind::Water,
            TilePalette::textured(
                Color::Rgb(48, 86, 146),
                Color::Rgb(52, 92, 150),
                ['~', '-', '.'],
                4,
            ),
        )
        .tile(
            TileKind::Rock,
            TilePalette::textured(
                Color::Rgb(120, 104, 92),
                Color::Rgb(112, 98, 88),
                ['^', '.', ','],
                4,
            ),
        )
        .tile(
            TileKind::Wall,
            TilePalette::textured(
                Color::Rgb(66, 74, 66),
                Color::Rgb(60, 68, 60),
                ['#', '+', '.'],
                8,
            ),
        )
        .hidden(FOG)
        .build()
}

/// World map as seen through the fog: cells whose center was never revealed
/// are hidden.
struct FogView<'a> {
    world: &'a WorldMap,
    revealed: &'a RevealedAreas,
}

impl MapRead for FogView<'_> {
    fn map_size(&self) -> MapSize {
        self.world.map_size()
    }

    fn tile_kind(&self, x: u16, y: u16) -> TileKind {
        self.world.tile_kind(x, y)
    }

    fn is_visible(&self, x: u16, y: u16) -> bool {
        self.revealed
            .is_revealed(self.world.layout.cell_rect(x, y).center())
    }
}

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, _ctx: RenderContext) {
    draw(frame, area, state);
}

/// Draws the whole screen for `state`.
pub fn draw(frame: &mut Frame, area: Rect, state: &AppState) {
    frame.render_widget(Block::default().style(Style::default().bg(BG_BASE)), area);

    if area.width < 30 || area.height < 12 {
        let warning = Paragraph::new("Terminal too small - expand window.")
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(warning, area);
        return;
    }

    let layout = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(4),
        ])
        .split(area);

    render_header(frame, layout[0], state);
    render_map(frame, layout[1], state);
    render_status(frame, layout[2], state);

    match state.screen {
        Screen::Walk => {}
        Screen::Pokedex => render_pokedex(frame, centered(layout[1], 48, 18), state),
        Screen::Encounter => render_encounter(frame, centered(layout[1], 46, 12), state),
    }
}

pub fn handle_event(event: &EventKind, state: &AppState) -> EventOutcome<Action> {
    match event {
        EventKind::Resize(width, height) => {
            EventOutcome::action(Action::UiTerminalResize(*width, *height)).with_render()
        }
        EventKind::Key(key) => handle_key(*key, state),
        _ => EventOutcome::ignored(),
    }
}

fn handle_key(key: KeyEvent, state: &AppState) -> EventOutcome<Action> {
    if let Some(direction) = movement_key(key.code) {
        if state.screen == Screen::Walk || key.kind == KeyEventKind::Release {
            return if key.kind == KeyEventKind::Release {
                EventOutcome::action(Action::MoveKeyUp(direction))
            } else {
                EventOutcome::action(Action::MoveKeyDown(direction))
            };
        }
    }
    if key.kind == KeyEventKind::Release {
        return EventOutcome::ignored();
    }

    match state.screen {
        Screen::Walk => handle_walk_key(key),
        Screen::Pokedex => handle_pokedex_key(key, state),
        Screen::Encounter => handle_encounter_key(key, state),
    }
}

fn movement_key(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') => Some(Direction::Right),
        _ => None,
    }
}

fn handle_walk_key(key: KeyEvent) -> EventOutcome<Action> {
    let action = match key.code {
        KeyCode::Enter => Some(Action::PokedexToggle),
        KeyCode::Char('v') => Some(Action::ViewToggle),
        KeyCode::Char('y') => Some(Action::SyncRequest),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    };
    EventOutcome::from(action)
}

fn handle_pokedex_key(key: KeyEvent, state: &AppState) -> EventOutcome<Action> {
    let len = state.pokedex().len();
    match key.code {
        KeyCode::Enter => EventOutcome::action(Action::PokedexToggle),
        KeyCode::Esc => EventOutcome::action(Action::PokedexClose),
        KeyCode::Char('x') => EventOutcome::action(Action::PokedexRelease),
        KeyCode::Char('y') => EventOutcome::action(Action::SyncRequest),
        KeyCode::Up | KeyCode::Char('k') if len > 0 => {
            let idx = if state.pokedex_selected == 0 {
                len - 1
            } else {
                state.pokedex_selected - 1
            };
            EventOutcome::action(Action::PokedexSelect(idx))
        }
        KeyCode::Down | KeyCode::Char('j') if len > 0 => {
            let idx = if state.pokedex_selected + 1 >= len {
                0
            } else {
                state.pokedex_selected + 1
            };
            EventOutcome::action(Action::PokedexSelect(idx))
        }
        KeyCode::Char('q') => EventOutcome::action(Action::Quit),
        _ => EventOutcome::ignored(),
    }
}

fn handle_encounter_key(key: KeyEvent, state: &AppState) -> EventOutcome<Action> {
    let Some(encounter) = state.encounter.as_ref() else {
        return EventOutcome::ignored();
    };
    if encounter.is_caught() {
        return EventOutcome::action(Action::EncounterDismiss);
    }

    let action = match key.code {
        KeyCode::Char('r') | KeyCode::Esc => Some(Action::EncounterRun),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Action::EncounterConfirm),
        KeyCode::Up | KeyCode::Left | KeyCode::Char('k') => Some(Action::EncounterMenuPrev),
        KeyCode::Down | KeyCode::Right | KeyCode::Char('j') => Some(Action::EncounterMenuNext),
        _ => None,
    };
    EventOutcome::from(action)
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = panel_block(" POKEWALK ", BG_HEADER);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let inventory = state.inventory.inventory();
    let line = Line::from(vec![
        Span::styled(
            state.world.name.to_ascii_uppercase(),
            Style::default()
                .fg(ACCENT_GREEN)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  •  "),
        Span::styled(
            format!("Balls {}  Berries {}", inventory.pokeballs, inventory.berries),
            Style::default().fg(TEXT_MAIN),
        ),
        Span::raw("  •  "),
        Span::styled(
            format!("Pokedex {}", inventory.total_captured()),
            Style::default().fg(TEXT_MAIN),
        ),
        Span::raw("  •  "),
        Span::styled(
            format!("{} / {}", state.account.label(), sync_label(&state.sync)),
            Style::default().fg(TEXT_DIM),
        ),
    ]);
    let paragraph = Paragraph::new(Text::from(vec![line])).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

fn render_map(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = format!(" {} view ", state.view.label());
    let block = panel_block(title, BG_PANEL_ALT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width < 8 || inner.height < 4 {
        let warning = Paragraph::new("Resize for map view.")
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center);
        frame.render_widget(warning, inner);
        return;
    }

    let world = &state.world;
    let viewport = world.layout.viewport;
    let origin = camera_origin(state.view, &state.actor, viewport);
    let focus = Point::new(
        origin.x + viewport.width / 2.0,
        origin.y + viewport.height / 2.0,
    );
    let (focus_x, focus_y) = world.layout.cell_at(focus).unwrap_or((0, 0));
    let camera = Camera { focus_x, focus_y };

    let result = match state.view {
        ViewMode::Full => MapRenderer::new(map_theme()).render_base(frame, inner, world, camera),
        ViewMode::Fog => {
            let fog = FogView {
                world,
                revealed: &state.revealed,
            };
            MapRenderer::new(map_theme())
                .with_scale(ViewScale::Tiles {
                    cols_per_tile: 2,
                    rows_per_tile: 1,
                })
                .render_base(frame, inner, &fog, camera)
        }
    };

    let center = state.actor.rect(state.config.movement.sprite_frame).center();
    let marker = world
        .layout
        .cell_at(center)
        .and_then(|(col, row)| result.marker_cell(col, row));
    if let Some((x, y)) = marker {
        if let Some(cell) = frame.buffer_mut().cell_mut((x, y)) {
            cell.set_char(actor_glyph(state.actor.facing))
                .set_fg(ACCENT_GOLD)
                .set_style(Style::default().add_modifier(Modifier::BOLD));
        }
    }
}

fn actor_glyph(facing: Direction) -> char {
    match facing {
        Direction::Up => '^',
        Direction::Down => 'v',
        Direction::Left => '<',
        Direction::Right => '>',
    }
}

fn render_status(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = panel_block("STATUS", BG_PANEL_ALT);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let message = state
        .notices
        .back()
        .map(|notice| notice.text.as_str())
        .unwrap_or(match state.catalog_status {
            CatalogStatus::Loading => "Loading creatures...",
            _ => "Wander the grass to find Pokemon.",
        });
    let help = match state.screen {
        Screen::Walk => HELP_WALK,
        Screen::Pokedex => HELP_POKEDEX,
        Screen::Encounter => HELP_ENCOUNTER,
    };
    let lines = vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(TEXT_MAIN))),
        Line::from(Span::styled(help, Style::default().fg(TEXT_DIM))),
    ];
    let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

fn render_pokedex(frame: &mut Frame, area: Rect, state: &AppState) {
    frame.render_widget(Clear, area);
    let block = panel_block(" POKEDEX ", BG_PANEL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let inventory = state.inventory.inventory();
    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "Captured {} of {} species  |  {} total",
                inventory.total_captured(),
                state.total_species(),
                inventory.total_quantity()
            ),
            Style::default().fg(ACCENT_GOLD),
        )),
        Line::from(""),
    ];

    let creatures = state.pokedex();
    if creatures.is_empty() {
        lines.push(Line::from(Span::styled(
            "Nothing caught yet.",
            Style::default().fg(TEXT_DIM),
        )));
    }
    let visible = inner.height.saturating_sub(2).max(1) as usize;
    let skip = state.pokedex_selected.saturating_sub(visible.saturating_sub(1));
    for (idx, creature) in creatures.iter().enumerate().skip(skip).take(visible) {
        let label = format!(
            "{:<14} x{:<3} {}",
            display_name(&creature.name),
            creature.quantity,
            creature.types
        );
        lines.push(menu_line(&label, idx == state.pokedex_selected));
    }

    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn render_encounter(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(encounter) = state.encounter.as_ref() else {
        return;
    };
    frame.render_widget(Clear, area);
    let title = format!(" WILD ENCOUNTER - {} ", encounter.zone.label());
    let block = panel_block(title, BG_PANEL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(species) = encounter.creature.as_ref() else {
        let loading = Paragraph::new("Something stirs...")
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center);
        frame.render_widget(loading, inner);
        return;
    };

    let name = display_name(&species.name);
    let chance = catch_chance(species, encounter.bonus.value());
    let mut lines = vec![
        Line::from(Span::styled(
            format!("A wild {name} appeared!"),
            Style::default()
                .fg(ACCENT_GREEN)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{}  |  {}", species.types, species.tier().label()),
            Style::default().fg(TEXT_DIM),
        )),
        Line::from(format!(
            "Catch chance {:.0}%  (berry bonus {:.0}%)",
            chance * 100.0,
            encounter.bonus.value() * 100.0
        )),
        Line::from(""),
    ];

    match &encounter.stage {
        EncounterStage::Loading => {}
        EncounterStage::Ready => {
            let inventory = state.inventory.inventory();
            for item in MenuItem::ALL {
                let label = match item {
                    MenuItem::Ball => format!("{} ({})", item.label(), inventory.pokeballs),
                    MenuItem::Berry => format!("{} ({})", item.label(), inventory.berries),
                    MenuItem::Run => item.label().to_string(),
                };
                lines.push(menu_line(&label, item == encounter.selected));
            }
        }
        EncounterStage::Throwing { .. } => {
            lines.push(Line::from(Span::styled(
                "The ball wobbles...",
                Style::default().fg(ACCENT_GOLD),
            )));
        }
        EncounterStage::Escaped { .. } => {
            lines.push(Line::from(Span::styled(
                format!("{name} broke free!"),
                Style::default().fg(ACCENT_RED),
            )));
        }
        EncounterStage::Caught { rewards } => {
            lines.push(Line::from(Span::styled(
                format!("Gotcha! {name} was caught!"),
                Style::default()
                    .fg(ACCENT_GREEN)
                    .add_modifier(Modifier::BOLD),
            )));
            if !rewards.is_empty() {
                lines.push(Line::from(format!(
                    "Found {} pokeballs and {} berries.",
                    rewards.pokeballs, rewards.berries
                )));
            }
            lines.push(Line::from(Span::styled(
                "Press any key to continue.",
                Style::default().fg(TEXT_DIM),
            )));
        }
    }

    let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

fn sync_label(status: &SyncStatus) -> String {
    match status {
        SyncStatus::Idle => "not synced".to_string(),
        SyncStatus::Running => "syncing...".to_string(),
        SyncStatus::Done(summary) => format!("synced: {summary}"),
        SyncStatus::Failed(error) => format!("sync failed: {error}"),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn panel_block<'a, T>(title: T, bg: Color) -> Block<'a>
where
    T: Into<Title<'a>>,
{
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title)
        .style(Style::default().bg(bg).fg(TEXT_MAIN))
        .border_style(Style::default().fg(BORDER_ACCENT))
}

fn menu_line(label: &str, selected: bool) -> Line<'static> {
    let style = if selected {
        Style::default()
            .fg(HIGHLIGHT_TEXT)
            .bg(HIGHLIGHT_BG)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_MAIN)
    };
    Line::from(Span::styled(label.to_string(), style))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn key(code: KeyCode, kind: KeyEventKind) -> EventKind {
        EventKind::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn arrow_press_and_release_map_to_move_actions() {
        let state = AppState::default();
        let down = handle_event(&key(KeyCode::Left, KeyEventKind::Press), &state);
        assert_eq!(down.actions.first(), Some(&Action::MoveKeyDown(Direction::Left)));
        let up = handle_event(&key(KeyCode::Left, KeyEventKind::Release), &state);
        assert_eq!(up.actions.first(), Some(&Action::MoveKeyUp(Direction::Left)));
    }

    #[test]
    fn enter_opens_pokedex_while_walking() {
        let state = AppState::default();
        let outcome = handle_event(&key(KeyCode::Enter, KeyEventKind::Press), &state);
        assert_eq!(outcome.actions.first(), Some(&Action::PokedexToggle));
    }

    #[test]
    fn pokedex_ignores_walk_keys_and_closes_on_esc() {
        let state = AppState {
            screen: Screen::Pokedex,
            ..AppState::default()
        };
        let outcome = handle_event(&key(KeyCode::Char('w'), KeyEventKind::Press), &state);
        assert!(outcome.actions.is_empty());
        let esc = handle_event(&key(KeyCode::Esc, KeyEventKind::Press), &state);
        assert_eq!(esc.actions.first(), Some(&Action::PokedexClose));
    }
}
