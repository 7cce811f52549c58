//! Layout and drawing: menu, the tile board, round break, mode handoff,
//! name entry, game over.

use crate::app::{MenuItem, Screen, Session};
use crate::engine::{Mode, RoundOutcome};
use crate::grid::TileKind;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Tile footprint in terminal cells; one-cell gutters keep mouse clicks on
/// the gaps from resolving to a tile.
const TILE_W: u16 = 6;
const TILE_H: u16 = 3;
const TILE_GAP: u16 = 1;

const SIDEBAR_WIDTH: u16 = 26;

/// Duration of the game-over fade (TachyonFX) in ms.
const OUTCOME_FADE_MS: u32 = 600;

/// Board size in terminal cells, border included, for an n x n grid.
fn board_pixel_size(size: u16) -> (u16, u16) {
    let bw = size * TILE_W + size.saturating_sub(1) * TILE_GAP;
    let bh = size * TILE_H + size.saturating_sub(1) * TILE_GAP;
    (bw + 2, bh + 2)
}

/// Inner board rect (tiles only, no border) for the given terminal area;
/// matches the draw_game layout so mouse hit-testing lines up with drawing.
pub fn board_rect(area: Rect, size: usize) -> Rect {
    let (pw, ph) = board_pixel_size(size as u16);
    let total_w = pw + 1 + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    Rect {
        x: x + 1,
        y: y + 1,
        width: (pw - 2).min(area.width.saturating_sub(2)),
        height: (ph - 2).min(area.height.saturating_sub(2)),
    }
}

/// Map a terminal position to the tile under it, if any. Positions on the
/// border or in the gutters between tiles resolve to None.
pub fn grid_cell_at(area: Rect, size: usize, col: u16, row: u16) -> Option<(usize, usize)> {
    let board = board_rect(area, size);
    if col < board.x || row < board.y {
        return None;
    }
    let dx = col - board.x;
    let dy = row - board.y;
    let cell_x = (dx / (TILE_W + TILE_GAP)) as usize;
    let cell_y = (dy / (TILE_H + TILE_GAP)) as usize;
    if dx % (TILE_W + TILE_GAP) >= TILE_W || dy % (TILE_H + TILE_GAP) >= TILE_H {
        return None;
    }
    if cell_x >= size || cell_y >= size {
        return None;
    }
    Some((cell_x, cell_y))
}

fn tile_rect(board: Rect, x: usize, y: usize) -> Rect {
    Rect {
        x: board.x + x as u16 * (TILE_W + TILE_GAP),
        y: board.y + y as u16 * (TILE_H + TILE_GAP),
        width: TILE_W,
        height: TILE_H,
    }
}

fn fill_rect(frame: &mut Frame, rect: Rect, style: Style) {
    let buf = frame.buffer_mut();
    let max_x = buf.area.right();
    let max_y = buf.area.bottom();
    for y in rect.y..(rect.y + rect.height).min(max_y) {
        for x in rect.x..(rect.x + rect.width).min(max_x) {
            buf[(x, y)].set_symbol(" ").set_style(style);
        }
    }
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Draw the current screen. `outcome_effect` / `effect_time` carry the
/// game-over fade state across frames.
#[allow(clippy::too_many_arguments)]
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    session: Option<&Session>,
    theme: &Theme,
    cursor: (usize, usize),
    menu_selected: MenuItem,
    name_input: &str,
    scores_text: &str,
    last_outcome: Option<RoundOutcome>,
    outcome_effect: &mut Option<Effect>,
    effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    fill_rect(frame, area, Style::default().bg(theme.bg));
    match screen {
        Screen::Menu => draw_menu(frame, theme, menu_selected, area),
        Screen::Scores => draw_scores(frame, theme, scores_text, area),
        Screen::Playing => {
            if let Some(session) = session {
                draw_game(frame, session, theme, Some(cursor), area, now);
            }
        }
        Screen::RoundBreak => {
            if let Some(session) = session {
                draw_game(frame, session, theme, None, area, now);
                draw_round_break(frame, session, theme, area);
            }
        }
        Screen::Handoff => draw_handoff(frame, theme, area),
        Screen::NameEntry => {
            if let Some(session) = session {
                draw_game(frame, session, theme, None, area, now);
            }
            draw_name_entry(frame, theme, last_outcome, name_input, area);
        }
        Screen::GameOver => {
            draw_game_over(frame, session, theme, last_outcome, area, now);
            let popup = centered_popup(area, 44, 12);
            apply_outcome_fade(frame, theme, popup, outcome_effect, effect_time, now);
        }
    }
}

fn draw_menu(frame: &mut Frame, theme: &Theme, selected: MenuItem, area: Rect) {
    let popup = centered_popup(area, 44, 18);

    let title = Line::from(vec![
        Span::styled(" tile ", Style::default().fg(theme.tile[2]).bold()),
        Span::styled(" tui ", Style::default().fg(theme.main_fg).bold()),
    ]);

    let highlight = Style::default().fg(theme.bg).bg(theme.title).bold();
    let normal = Style::default().fg(theme.main_fg);
    let item = |label: &str, this: MenuItem| {
        Span::styled(
            format!(" {label} "),
            if selected == this { highlight } else { normal },
        )
    };

    let lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(Span::styled(
            " click the white tiles, dodge the black ",
            Style::default().fg(theme.inactive_fg),
        )),
        Line::from(""),
        Line::from(""),
        Line::from(item("PLAY", MenuItem::Play)),
        Line::from(""),
        Line::from(item("SCORES", MenuItem::Scores)),
        Line::from(""),
        Line::from(item("QUIT", MenuItem::Quit)),
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ↕ ", Style::default().fg(theme.title)),
            Span::from("NAVIGATE   "),
            Span::styled(" ENTER ", Style::default().fg(theme.title)),
            Span::from("SELECT"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            " [Q] QUIT ",
            Style::default().fg(theme.tile[3]),
        )),
    ];

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

/// Read-only view of the scores file, newest block last; shows the tail
/// that fits the popup.
fn draw_scores(frame: &mut Frame, theme: &Theme, scores_text: &str, area: Rect) {
    let popup = centered_popup(area, 50, area.height.min(26));
    let visible = popup.height.saturating_sub(4) as usize;
    let all: Vec<&str> = scores_text.lines().collect();
    let tail = &all[all.len().saturating_sub(visible)..];

    let mut lines: Vec<Line> = tail
        .iter()
        .map(|l| Line::from(Span::styled((*l).to_string(), Style::default().fg(theme.main_fg))))
        .collect();
    lines.push(Line::from(""));
    lines.push(
        Line::from(Span::styled(
            " any key — menu    q — quit ",
            Style::default().fg(theme.inactive_fg),
        ))
        .alignment(Alignment::Center),
    );

    fill_rect(frame, popup, Style::default().bg(theme.bg));
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
                .title(Span::styled(" Scores ", Style::default().fg(theme.title))),
        )
        .render(popup, frame.buffer_mut());
}

/// Board plus sidebar, centered. `cursor` is None on screens where the board
/// is shown frozen behind an overlay.
fn draw_game(
    frame: &mut Frame,
    session: &Session,
    theme: &Theme,
    cursor: Option<(usize, usize)>,
    area: Rect,
    now: Instant,
) {
    let engine = &session.engine;
    let size = engine.grid().size();
    let (pw, ph) = board_pixel_size(size as u16);
    let total_w = pw + 1 + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    let board_outer = Rect {
        x,
        y,
        width: pw.min(area.width),
        height: ph.min(area.height),
    };

    let mode_tag = match engine.profile().mode {
        Mode::Easy => " tiletui — easy ",
        Mode::Hard => " tiletui — hard ",
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(mode_tag, Style::default().fg(theme.title)))
        .render(board_outer, frame.buffer_mut());

    let board = board_rect(area, size);
    for (tx, ty, tile) in engine.grid().cells() {
        let rect = tile_rect(board, tx, ty);
        if tile.enabled {
            let color = theme.tile_color(tile.kind);
            fill_rect(frame, rect, Style::default().bg(color));
            // The black tile gets a visible edge so it never melts into the
            // board background.
            if tile.kind == TileKind::Black {
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.div_line).bg(color))
                    .render(rect, frame.buffer_mut());
            }
        } else {
            fill_rect(frame, rect, Style::default().bg(theme.bg));
            let dot = Rect {
                x: rect.x + rect.width / 2,
                y: rect.y + rect.height / 2,
                width: 1,
                height: 1,
            };
            Paragraph::new("·")
                .style(Style::default().fg(theme.inactive_fg).bg(theme.bg))
                .render(dot, frame.buffer_mut());
        }
        if cursor == Some((tx, ty)) {
            let bg = if tile.enabled {
                theme.tile_color(tile.kind)
            } else {
                theme.bg
            };
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.title).bg(bg))
                .render(rect, frame.buffer_mut());
        }
    }

    let sidebar = Rect {
        x: board_outer.x + pw + 1,
        y: board_outer.y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(pw + 1)),
        height: ph.min(area.height),
    };
    draw_sidebar(frame, session, theme, sidebar, now);
}

fn draw_sidebar(frame: &mut Frame, session: &Session, theme: &Theme, area: Rect, now: Instant) {
    let engine = &session.engine;
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);

    // --- Clock (own border): gauge + one-decimal readout ---
    let clock_outer = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 4.min(area.height),
    };
    let remaining = engine.clock().remaining();
    let start = engine.clock().start_value();
    let ratio = if start > 0.0 {
        (remaining / start).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let bar_color = if ratio > 0.5 {
        theme.tile[2]
    } else if ratio > 0.25 {
        theme.title
    } else {
        theme.tile[3]
    };
    Gauge::default()
        .ratio(ratio)
        .label(Span::styled(format!("{remaining:.1} s"), fg_style.bold()))
        .gauge_style(Style::default().fg(bar_color).bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Clock ", title_style)),
        )
        .render(clock_outer, frame.buffer_mut());

    // --- Progress (own border): round counter or survival gauge ---
    let progress_outer = Rect {
        x: area.x,
        y: area.y + 5,
        width: area.width,
        height: 4.min(area.height.saturating_sub(5)),
    };
    match (engine.profile().rounds_max, engine.profile().survival_goal) {
        (Some(rounds_max), _) => {
            let lines = vec![
                Line::from(vec![
                    Span::styled("Round: ", title_style),
                    Span::styled(format!("{} / {rounds_max}", engine.round()), fg_style),
                ]),
                Line::from(vec![
                    Span::styled("Whites: ", title_style),
                    Span::styled(engine.white_clicked().to_string(), fg_style),
                ]),
            ];
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border_style)
                        .title(Span::styled(" Progress ", title_style)),
                )
                .render(progress_outer, frame.buffer_mut());
        }
        (None, Some(goal)) => {
            let survived = engine.seconds_survived(now);
            Gauge::default()
                .ratio((survived / goal).clamp(0.0, 1.0))
                .label(Span::styled(
                    format!("{survived:.1} / {goal:.0} s"),
                    fg_style.bold(),
                ))
                .gauge_style(Style::default().fg(theme.tile[2]).bg(theme.bg))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border_style)
                        .title(Span::styled(" Survive ", title_style)),
                )
                .render(progress_outer, frame.buffer_mut());
        }
        (None, None) => {}
    }

    // --- Help ---
    let help_outer = Rect {
        x: area.x,
        y: area.y + 10,
        width: area.width,
        height: 6.min(area.height.saturating_sub(10)),
    };
    let help = vec![
        Line::from(Span::styled("arrows/hjkl  move", fg_style)),
        Line::from(Span::styled("enter/space  click", fg_style)),
        Line::from(Span::styled("mouse        click", fg_style)),
        Line::from(Span::styled("esc menu   q quit", fg_style)),
    ];
    Paragraph::new(help)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Keys ", title_style)),
        )
        .render(help_outer, frame.buffer_mut());
}

fn draw_round_break(frame: &mut Frame, session: &Session, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 40, 7);
    let rounds_max = session.engine.profile().rounds_max.unwrap_or(1);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Round clear! ",
            Style::default().fg(theme.bg).bg(theme.tile[2]).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                " Round {} of {rounds_max} is up next ",
                session.engine.round()
            ),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            " press any key ",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    render_popup(frame, theme, popup, lines);
}

fn draw_handoff(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 48, 10);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Easy mode cleared! ",
            Style::default().fg(theme.bg).bg(theme.tile[2]).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Survival is next: the board mutates on ",
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            " its own. Green buys time, red burns it. ",
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            " Last 30 seconds and you win. ",
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " press any key ",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    render_popup(frame, theme, popup, lines);
}

fn outcome_banner(theme: &Theme, outcome: Option<RoundOutcome>) -> Span<'static> {
    match outcome {
        Some(RoundOutcome::Win) => Span::styled(
            " You won! ",
            Style::default().fg(theme.bg).bg(theme.tile[2]).bold(),
        ),
        Some(RoundOutcome::FailBlackTile) => Span::styled(
            " Black tile! ",
            Style::default().fg(theme.tile[0]).bg(theme.tile[3]).bold(),
        ),
        Some(RoundOutcome::FailTimeout) => Span::styled(
            " Out of time! ",
            Style::default().fg(theme.tile[0]).bg(theme.tile[3]).bold(),
        ),
        _ => Span::styled(" Round over ", Style::default().fg(theme.main_fg).bold()),
    }
}

fn draw_name_entry(
    frame: &mut Frame,
    theme: &Theme,
    outcome: Option<RoundOutcome>,
    name_input: &str,
    area: Rect,
) {
    let popup = centered_popup(area, 44, 9);
    let lines = vec![
        Line::from(""),
        Line::from(outcome_banner(theme, outcome)),
        Line::from(""),
        Line::from(Span::styled(
            " Enter your name for the scores file: ",
            Style::default().fg(theme.main_fg),
        )),
        Line::from(vec![
            Span::styled(
                format!(" {name_input}"),
                Style::default().fg(theme.main_fg),
            ),
            Span::styled("▏", Style::default().fg(theme.title)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            " ENTER saves ",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    render_popup(frame, theme, popup, lines);
}

fn draw_game_over(
    frame: &mut Frame,
    session: Option<&Session>,
    theme: &Theme,
    outcome: Option<RoundOutcome>,
    area: Rect,
    now: Instant,
) {
    let popup = centered_popup(area, 44, 12);
    let mut lines = vec![
        Line::from(""),
        Line::from(outcome_banner(theme, outcome)),
        Line::from(""),
    ];
    if let Some(session) = session {
        let engine = &session.engine;
        lines.push(Line::from(vec![
            Span::styled(" White tiles clicked: ", Style::default().fg(theme.title)),
            Span::styled(
                engine.white_clicked().to_string(),
                Style::default().fg(theme.main_fg),
            ),
        ]));
        lines.push(Line::from(vec![
            Span::styled(" Time survived: ", Style::default().fg(theme.title)),
            Span::styled(
                format!("{:.2} s", engine.seconds_survived(now)),
                Style::default().fg(theme.main_fg),
            ),
        ]));
        if engine.profile().mode == Mode::Hard {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                " result saved to the scores file ",
                Style::default().fg(theme.inactive_fg),
            )));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " any key — menu    q — quit ",
        Style::default().fg(theme.main_fg),
    )));
    render_popup(frame, theme, popup, lines);
}

fn render_popup(frame: &mut Frame, theme: &Theme, popup: Rect, lines: Vec<Line<'_>>) {
    fill_rect(frame, popup, Style::default().bg(theme.bg));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

/// Create or update the game-over fade and process it (TachyonFX: the popup
/// fades in from the board background).
fn apply_outcome_fade(
    frame: &mut Frame,
    theme: &Theme,
    popup: Rect,
    outcome_effect: &mut Option<Effect>,
    effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = effect_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *effect_time = Some(now);

    if outcome_effect.is_none() {
        let bg = theme.bg;
        let effect =
            fx::fade_from(bg, bg, (OUTCOME_FADE_MS, Interpolation::Linear)).with_area(popup);
        *outcome_effect = Some(effect);
    }

    if let Some(effect) = outcome_effect {
        frame.render_effect(effect, popup, tfx_delta);
    }
}
