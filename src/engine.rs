//! Round engine: mode profiles, click resolution, the mutation policy, and
//! win/fail detection for both the 5x5 easy rounds and the 6x6 survival round.
//!
//! The engine is single-threaded: two periodic triggers (a ~60 Hz fast tick
//! for clock/timeout checks and a 1 Hz ambient tick for grid mutation) plus
//! click events all run on one sequential context, so no locking is needed.
//! Every entry point returns the events it produced; once a terminal outcome
//! is emitted, all further ticks and clicks are no-ops.

use crate::clock::Clock;
use crate::grid::{EASY_SPAWN, Grid, GridError, HARD_SPAWN, SpawnTable, TileKind};
use rand::Rng;
use std::time::Instant;

/// Clock shift applied when a green (+) or red (−) tile resolves.
pub const CLOCK_ADJUST_SECS: f64 = 0.5;

/// Tiles mutated per ambient tick, chosen uniformly with replacement.
pub const AMBIENT_MUTATIONS_PER_TICK: u32 = 2;

/// The two round shapes the game ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Easy,
    Hard,
}

/// Everything that distinguishes the two modes, as data rather than
/// subclassing: grid size, clock start, spawn thresholds, whether tiles
/// mutate, and the completion predicate (round count or survival goal).
#[derive(Debug, Clone, Copy)]
pub struct ModeProfile {
    pub mode: Mode,
    pub grid_size: usize,
    pub start_time: f64,
    pub spawn: SpawnTable,
    pub mutates: bool,
    /// Easy mode: number of sub-rounds before the mode is complete.
    pub rounds_max: Option<u32>,
    /// Hard mode: wall-clock seconds to survive for a win.
    pub survival_goal: Option<f64>,
}

impl ModeProfile {
    /// Five timed 5x5 rounds, 10 seconds each, no ambient mutation.
    pub fn easy() -> Self {
        Self {
            mode: Mode::Easy,
            grid_size: 5,
            start_time: 10.0,
            spawn: EASY_SPAWN,
            mutates: false,
            rounds_max: Some(5),
            survival_goal: None,
        }
    }

    /// One 6x6 survival round: 12 seconds on the clock, survive 30.
    pub fn hard() -> Self {
        Self {
            mode: Mode::Hard,
            grid_size: 6,
            start_time: 12.0,
            spawn: HARD_SPAWN,
            mutates: true,
            rounds_max: None,
            survival_goal: Some(30.0),
        }
    }
}

/// Per-kind mutation probabilities (white, green, red, black), applied in
/// that cumulative order. Black is rare from every row but reachable from
/// every row, so mutation never settles into a safe grid.
fn mutation_row(kind: TileKind) -> [f64; 4] {
    match kind {
        TileKind::White => [0.35, 0.35, 0.13, 0.17],
        TileKind::Black => [0.60, 0.20, 0.10, 0.10],
        TileKind::Green => [0.40, 0.36, 0.10, 0.14],
        TileKind::Red => [0.25, 0.45, 0.15, 0.15],
    }
}

/// Map one uniform draw r in [0, 1) to the kind a tile mutates into.
pub fn mutate(kind: TileKind, r: f64) -> TileKind {
    let [white, green, red, _] = mutation_row(kind);
    if r <= white {
        TileKind::White
    } else if r <= white + green {
        TileKind::Green
    } else if r <= white + green + red {
        TileKind::Red
    } else {
        TileKind::Black
    }
}

/// Produced exactly once per terminal transition (or once per easy-mode
/// round advance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Easy mode: round complete, next round index already populated.
    Advance(u32),
    /// Easy mode: all five rounds cleared. Hard mode: survived the goal.
    Win,
    FailBlackTile,
    FailTimeout,
}

impl RoundOutcome {
    /// Terminal outcomes end the round; `Advance` keeps it going.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Advance(_))
    }
}

/// Engine → presentation events, in the order they occurred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    TileChanged {
        x: usize,
        y: usize,
        kind: TileKind,
        enabled: bool,
    },
    ClockChanged(f64),
    /// Easy-mode round advance replaced the whole grid.
    GridRepopulated,
    Outcome(RoundOutcome),
}

/// The round state machine. Owns the grid and the clock; the presentation
/// layer only gets read-only views and the event stream.
#[derive(Debug)]
pub struct RoundEngine<R: Rng> {
    profile: ModeProfile,
    grid: Grid,
    clock: Clock,
    rng: R,
    /// Easy-mode sub-round index, 1-based.
    round: u32,
    /// Seeded at actual-white-count + 1 so a fresh grid is never already
    /// complete; completion fires at white_clicked == white_total - 1.
    white_total: u32,
    white_clicked: u32,
    started_at: Instant,
    finished: Option<RoundOutcome>,
    survived_secs: f64,
}

impl<R: Rng> RoundEngine<R> {
    /// Populate the first grid and start the round at `now`. A failed
    /// allocation aborts cleanly with no partial grid.
    pub fn new(profile: ModeProfile, mut rng: R, now: Instant) -> Result<Self, GridError> {
        let grid = Grid::populate(profile.grid_size, &profile.spawn, &mut rng)?;
        let white_total = grid.count(TileKind::White) + 1;
        Ok(Self {
            clock: Clock::new(profile.start_time),
            profile,
            grid,
            rng,
            round: 1,
            white_total,
            white_clicked: 0,
            started_at: now,
            finished: None,
            survived_secs: 0.0,
        })
    }

    pub fn profile(&self) -> &ModeProfile {
        &self.profile
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn white_clicked(&self) -> u32 {
        self.white_clicked
    }

    pub fn finished(&self) -> Option<RoundOutcome> {
        self.finished
    }

    /// Wall-clock seconds from round start to the terminal outcome, or to
    /// `now` while the round is still running.
    pub fn seconds_survived(&self, now: Instant) -> f64 {
        if self.finished.is_some() {
            self.survived_secs
        } else {
            now.duration_since(self.started_at).as_secs_f64()
        }
    }

    pub fn elapsed(&self, now: Instant) -> f64 {
        now.duration_since(self.started_at).as_secs_f64()
    }

    /// Resolve a click on cell (x, y). Clicks on disabled tiles are no-ops,
    /// not errors; out-of-bounds coordinates are a logic defect surfaced as
    /// `GridError::OutOfBounds`.
    pub fn handle_click(
        &mut self,
        x: usize,
        y: usize,
        now: Instant,
    ) -> Result<Vec<EngineEvent>, GridError> {
        let mut events = Vec::new();
        if self.finished.is_some() {
            return Ok(events);
        }
        let size = self.grid.size();
        let tile = *self
            .grid
            .get(x, y)
            .ok_or(GridError::OutOfBounds { x, y, size })?;
        if !tile.enabled {
            return Ok(events);
        }

        // Black terminates immediately and preempts everything else: no
        // mutation, no win check.
        if tile.kind == TileKind::Black {
            self.set_tile(x, y, tile.kind, false, &mut events);
            self.finish(RoundOutcome::FailBlackTile, now, &mut events);
            return Ok(events);
        }

        self.set_tile(x, y, tile.kind, false, &mut events);
        match tile.kind {
            TileKind::White => self.white_clicked += 1,
            TileKind::Green => {
                self.clock.adjust(CLOCK_ADJUST_SECS);
                events.push(EngineEvent::ClockChanged(self.clock.remaining()));
            }
            TileKind::Red => {
                self.clock.adjust(-CLOCK_ADJUST_SECS);
                events.push(EngineEvent::ClockChanged(self.clock.remaining()));
            }
            TileKind::Black => unreachable!("handled above"),
        }

        if self.profile.mutates {
            // Hard mode: the resolved tile mutates in place and comes back
            // clickable; the survival check runs right after the mutation.
            self.mutate_at(x, y, &mut events);
            self.check_survival(now, &mut events);
        } else if tile.kind == TileKind::White {
            self.check_round_completion(now, &mut events)?;
        }
        Ok(events)
    }

    /// Fast tick (~16 ms): decrement the clock and check for timeout.
    pub fn fast_tick(&mut self, now: Instant) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.finished.is_some() {
            return events;
        }
        self.clock.tick();
        events.push(EngineEvent::ClockChanged(self.clock.remaining()));
        if self.clock.expired() {
            self.clock.freeze_at_timeout();
            events.push(EngineEvent::ClockChanged(self.clock.remaining()));
            self.finish(RoundOutcome::FailTimeout, now, &mut events);
        }
        events
    }

    /// Ambient tick (1 Hz, hard mode only): mutate two cells chosen
    /// uniformly with replacement, enabled or not, while time remains.
    pub fn ambient_tick(&mut self, now: Instant) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.finished.is_some() || !self.profile.mutates || self.clock.expired() {
            return events;
        }
        for _ in 0..AMBIENT_MUTATIONS_PER_TICK {
            let x = self.rng.random_range(0..self.grid.size());
            let y = self.rng.random_range(0..self.grid.size());
            self.mutate_at(x, y, &mut events);
            if self.check_survival(now, &mut events) {
                break;
            }
        }
        events
    }

    /// Mutate the tile at (x, y) per the policy table and re-enable it. The
    /// tile passes through a disabled micro-state first so a click landing
    /// mid-resolution cannot double-fire.
    fn mutate_at(&mut self, x: usize, y: usize, events: &mut Vec<EngineEvent>) {
        let Some(tile) = self.grid.get_mut(x, y) else {
            return;
        };
        tile.enabled = false;
        let old = tile.kind;
        let new_kind = mutate(old, self.rng.random::<f64>());
        let Some(tile) = self.grid.get_mut(x, y) else {
            return;
        };
        tile.kind = new_kind;
        tile.enabled = true;
        events.push(EngineEvent::TileChanged {
            x,
            y,
            kind: new_kind,
            enabled: true,
        });
    }

    /// Hard-mode win: survived past the goal. Evaluated on resolution and
    /// mutation events, never on a bare fast tick.
    fn check_survival(&mut self, now: Instant, events: &mut Vec<EngineEvent>) -> bool {
        let Some(goal) = self.profile.survival_goal else {
            return false;
        };
        if self.finished.is_none() && self.elapsed(now) >= goal {
            self.finish(RoundOutcome::Win, now, events);
            return true;
        }
        false
    }

    /// Easy-mode completion: all real white tiles clicked. Not the final
    /// round: repopulate, reset counters and clock, emit `Advance`. Final
    /// round: emit `Win` (the mode handoff is the caller's job).
    fn check_round_completion(
        &mut self,
        now: Instant,
        events: &mut Vec<EngineEvent>,
    ) -> Result<(), GridError> {
        if self.white_clicked != self.white_total.saturating_sub(1) {
            return Ok(());
        }
        let rounds_max = self.profile.rounds_max.unwrap_or(1);
        if self.round >= rounds_max {
            self.finish(RoundOutcome::Win, now, events);
            return Ok(());
        }
        self.round += 1;
        self.white_clicked = 0;
        self.grid = Grid::populate(self.profile.grid_size, &self.profile.spawn, &mut self.rng)?;
        self.white_total = self.grid.count(TileKind::White) + 1;
        self.clock.reset();
        events.push(EngineEvent::GridRepopulated);
        events.push(EngineEvent::ClockChanged(self.clock.remaining()));
        events.push(EngineEvent::Outcome(RoundOutcome::Advance(self.round)));
        Ok(())
    }

    fn set_tile(
        &mut self,
        x: usize,
        y: usize,
        kind: TileKind,
        enabled: bool,
        events: &mut Vec<EngineEvent>,
    ) {
        if let Some(tile) = self.grid.get_mut(x, y) {
            tile.kind = kind;
            tile.enabled = enabled;
            events.push(EngineEvent::TileChanged {
                x,
                y,
                kind,
                enabled,
            });
        }
    }

    /// Record the terminal outcome and freeze the engine: every subsequent
    /// tick or click observes `finished` and returns without touching state.
    fn finish(&mut self, outcome: RoundOutcome, now: Instant, events: &mut Vec<EngineEvent>) {
        self.survived_secs = self.elapsed(now);
        self.finished = Some(outcome);
        events.push(EngineEvent::Outcome(outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::ScriptRng;
    use std::time::Duration;

    fn outcomes(events: &[EngineEvent]) -> Vec<RoundOutcome> {
        events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Outcome(o) => Some(*o),
                _ => None,
            })
            .collect()
    }

    fn find_tile<R: Rng>(engine: &RoundEngine<R>, kind: TileKind) -> Option<(usize, usize)> {
        engine
            .grid()
            .cells()
            .find(|(_, _, t)| t.kind == kind && t.enabled)
            .map(|(x, y, _)| (x, y))
    }

    /// Easy engine over a grid drawn entirely from one uniform value.
    fn easy_engine(draw: f64) -> RoundEngine<ScriptRng> {
        RoundEngine::new(ModeProfile::easy(), ScriptRng::constant(draw), Instant::now()).unwrap()
    }

    #[test]
    fn mutation_rows_are_closed() {
        for kind in TileKind::ALL {
            let row = mutation_row(kind);
            let sum: f64 = row.iter().sum();
            assert!(
                (sum - 1.0).abs() < 1e-12,
                "row for {kind:?} sums to {sum}, not 1.0"
            );
        }
    }

    #[test]
    fn mutate_always_returns_a_kind() {
        // Sweep the unit interval; every draw must land on one of the four
        // kinds for every current kind (no dead zones at the thresholds).
        for kind in TileKind::ALL {
            for i in 0..=1000 {
                let r = f64::from(i) / 1000.0;
                let out = mutate(kind, r);
                assert!(TileKind::ALL.contains(&out));
            }
        }
    }

    #[test]
    fn mutate_thresholds_match_table() {
        assert_eq!(mutate(TileKind::White, 0.30), TileKind::White);
        assert_eq!(mutate(TileKind::White, 0.50), TileKind::Green);
        assert_eq!(mutate(TileKind::White, 0.75), TileKind::Red);
        assert_eq!(mutate(TileKind::White, 0.90), TileKind::Black);
        assert_eq!(mutate(TileKind::Black, 0.59), TileKind::White);
        assert_eq!(mutate(TileKind::Black, 0.95), TileKind::Black);
        assert_eq!(mutate(TileKind::Red, 0.60), TileKind::Green);
        assert_eq!(mutate(TileKind::Green, 0.78), TileKind::Red);
    }

    #[test]
    fn duplicate_click_on_disabled_tile_is_noop() {
        let mut engine = easy_engine(0.1); // all white + seeded black
        let now = Instant::now();
        let (x, y) = find_tile(&engine, TileKind::White).unwrap();
        let first = engine.handle_click(x, y, now).unwrap();
        assert!(!first.is_empty());
        let clicked = engine.white_clicked();
        let second = engine.handle_click(x, y, now).unwrap();
        assert!(second.is_empty());
        assert_eq!(engine.white_clicked(), clicked);
    }

    #[test]
    fn white_total_is_real_count_plus_one() {
        let engine = easy_engine(0.1);
        let whites = engine.grid().count(TileKind::White);
        assert_eq!(engine.white_total, whites + 1);
        // A fresh round is never already complete.
        assert_ne!(engine.white_clicked, engine.white_total - 1);
    }

    #[test]
    fn easy_round_completes_on_last_white_click() {
        let mut engine = easy_engine(0.1);
        let now = Instant::now();
        let whites = engine.grid().count(TileKind::White);
        let mut advanced = Vec::new();
        for i in 0..whites {
            let (x, y) = find_tile(&engine, TileKind::White).unwrap();
            let events = engine.handle_click(x, y, now).unwrap();
            advanced.extend(outcomes(&events));
            if i + 1 < whites {
                assert!(
                    advanced.is_empty(),
                    "round advanced after {} of {} whites",
                    i + 1,
                    whites
                );
            }
        }
        // Exactly one advance, on the last click, moving round 1 -> 2.
        assert_eq!(advanced, vec![RoundOutcome::Advance(2)]);
        assert_eq!(engine.round(), 2);
        assert_eq!(engine.white_clicked(), 0);
        assert_eq!(engine.clock().remaining(), 10.0);
    }

    #[test]
    fn easy_mode_completes_after_final_round() {
        let mut engine = easy_engine(0.1);
        let now = Instant::now();
        for round in 1..=5u32 {
            assert_eq!(engine.round(), round);
            let whites = engine.grid().count(TileKind::White);
            for _ in 0..whites {
                let (x, y) = find_tile(&engine, TileKind::White).unwrap();
                engine.handle_click(x, y, now).unwrap();
            }
        }
        assert_eq!(engine.finished(), Some(RoundOutcome::Win));
    }

    #[test]
    fn black_click_fails_immediately_in_easy_mode() {
        let mut engine = easy_engine(0.1);
        let now = Instant::now();
        let (x, y) = find_tile(&engine, TileKind::Black).unwrap();
        let events = engine.handle_click(x, y, now).unwrap();
        assert_eq!(outcomes(&events), vec![RoundOutcome::FailBlackTile]);
        assert_eq!(engine.finished(), Some(RoundOutcome::FailBlackTile));
    }

    #[test]
    fn black_click_preempts_survival_win() {
        // Past the 30 s goal, but the black click must still fail the round.
        let start = Instant::now();
        let mut engine =
            RoundEngine::new(ModeProfile::hard(), ScriptRng::constant(0.5), start).unwrap();
        let (x, y) = find_tile(&engine, TileKind::Black).unwrap();
        let late = start + Duration::from_secs(31);
        let events = engine.handle_click(x, y, late).unwrap();
        assert_eq!(outcomes(&events), vec![RoundOutcome::FailBlackTile]);
    }

    #[test]
    fn green_and_red_adjust_clock() {
        let start = Instant::now();
        // Draw 0.8 spawns Green everywhere (plus forced seeds); the same
        // draw then mutates the clicked Green into a Red per the table.
        let mut engine =
            RoundEngine::new(ModeProfile::hard(), ScriptRng::constant(0.8), start).unwrap();
        let before = engine.clock().remaining();
        let (x, y) = find_tile(&engine, TileKind::Green).unwrap();
        engine.handle_click(x, y, start).unwrap();
        assert_eq!(engine.clock().remaining(), before + 0.5);
        assert_eq!(engine.grid().get(x, y).unwrap().kind, TileKind::Red);
        engine.handle_click(x, y, start).unwrap();
        assert_eq!(engine.clock().remaining(), before);
    }

    #[test]
    fn hard_click_remutates_the_resolved_tile() {
        let start = Instant::now();
        // Draw 0.5 spawns Black everywhere, so the forced White seed sits at
        // the centre; the same draw then mutates White -> Green per the table.
        let mut engine =
            RoundEngine::new(ModeProfile::hard(), ScriptRng::constant(0.5), start).unwrap();
        let (x, y) = find_tile(&engine, TileKind::White).unwrap();
        let events = engine.handle_click(x, y, start).unwrap();
        let tile = engine.grid().get(x, y).unwrap();
        assert!(tile.enabled, "mutated tile must come back clickable");
        assert_eq!(tile.kind, TileKind::Green);
        assert_eq!(engine.white_clicked(), 1);
        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::TileChanged { enabled: true, .. }
        )));
    }

    #[test]
    fn hard_timeout_scenario() {
        let start = Instant::now();
        let mut engine =
            RoundEngine::new(ModeProfile::hard(), ScriptRng::constant(0.5), start).unwrap();
        assert_eq!(engine.clock().remaining(), 12.0);
        // 12.0 / 0.016 = 750 fast ticks to expiry.
        let mut seen = Vec::new();
        for i in 0..1000 {
            let now = start + Duration::from_millis(16 * (i + 1));
            seen.extend(outcomes(&engine.fast_tick(now)));
        }
        assert_eq!(seen, vec![RoundOutcome::FailTimeout]);
        assert_eq!(engine.finished(), Some(RoundOutcome::FailTimeout));
        assert_eq!(engine.white_clicked(), 0);
        // Clock frozen at the display value that renders as "0.0".
        assert_eq!(engine.clock().remaining(), crate::clock::TIMEOUT_DISPLAY);
        // Ambient mutation is dead after termination.
        let after = engine.ambient_tick(start + Duration::from_secs(60));
        assert!(after.is_empty());
    }

    #[test]
    fn hard_survival_win_on_click_past_goal() {
        let start = Instant::now();
        let mut engine =
            RoundEngine::new(ModeProfile::hard(), ScriptRng::constant(0.5), start).unwrap();
        let (x, y) = find_tile(&engine, TileKind::White).unwrap();
        let late = start + Duration::from_secs(30);
        let events = engine.handle_click(x, y, late).unwrap();
        assert_eq!(outcomes(&events), vec![RoundOutcome::Win]);
        assert!(engine.seconds_survived(late) >= 30.0);
    }

    #[test]
    fn ambient_tick_mutates_two_cells_and_checks_win() {
        use rand::SeedableRng;
        let start = Instant::now();
        let mut engine = RoundEngine::new(
            ModeProfile::hard(),
            rand::rngs::SmallRng::seed_from_u64(7),
            start,
        )
        .unwrap();
        let events = engine.ambient_tick(start + Duration::from_secs(1));
        let changed = events
            .iter()
            .filter(|e| matches!(e, EngineEvent::TileChanged { .. }))
            .count();
        assert_eq!(changed, AMBIENT_MUTATIONS_PER_TICK as usize);
        // Same tick past the goal wins without any click.
        let events = engine.ambient_tick(start + Duration::from_secs(31));
        assert!(outcomes(&events).contains(&RoundOutcome::Win));
    }

    #[test]
    fn ambient_tick_is_idle_while_clock_expired() {
        use rand::SeedableRng;
        let start = Instant::now();
        let mut engine = RoundEngine::new(
            ModeProfile::hard(),
            rand::rngs::SmallRng::seed_from_u64(7),
            start,
        )
        .unwrap();
        engine.clock.adjust(-20.0);
        assert!(engine.clock().expired());
        assert!(engine.ambient_tick(start + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn no_events_after_termination() {
        let mut engine = easy_engine(0.1);
        let now = Instant::now();
        let (x, y) = find_tile(&engine, TileKind::Black).unwrap();
        engine.handle_click(x, y, now).unwrap();
        assert!(engine.fast_tick(now).is_empty());
        assert!(engine.ambient_tick(now).is_empty());
        let (wx, wy) = find_tile(&engine, TileKind::White).unwrap();
        assert!(engine.handle_click(wx, wy, now).unwrap().is_empty());
    }

    #[test]
    fn out_of_bounds_click_is_an_error() {
        let mut engine = easy_engine(0.5);
        let err = engine.handle_click(9, 0, Instant::now()).unwrap_err();
        assert!(matches!(err, GridError::OutOfBounds { x: 9, y: 0, size: 5 }));
    }
}
