//! Tiletui — tile-clicking survival game in the terminal.
//!
//! Five timed 5x5 rounds of clearing white tiles, then a 6x6 survival round
//! where the grid mutates under you. Green tiles buy time, red tiles cost
//! it, and a single black tile ends the run.

mod app;
mod clock;
mod engine;
mod grid;
mod input;
mod scores;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let mut app = App::new(args, theme);
    app.run()?;
    Ok(())
}

/// Tile-clicking survival game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tiletui",
    version,
    about = "Tile-clicking survival game: clear the white tiles, dodge the black ones.",
    long_about = "Tiletui is a terminal tile game.\n\n\
        EASY: five 5x5 rounds, 10 seconds each. Click every white tile before the clock \
        runs out. Green tiles add half a second, red tiles take it away, black tiles end \
        the run on the spot.\n\n\
        HARD: one 6x6 survival round. Tiles change colour on their own and every tile you \
        click changes again; keep the 12-second clock alive with green tiles and survive \
        for 30 seconds to win. Survival results are appended to a scores file.\n\n\
        CONTROLS:\n  Arrows / hjkl   Move cursor     Enter / Space   Click tile\n  \
        Mouse           Click tiles     Esc             Back    q    Quit"
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]="value"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Skip main menu and start the easy rounds immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Scores file for survival results (default: config dir / tiletui / scores.txt).
    #[arg(long, value_name = "FILE")]
    pub scores_file: Option<std::path::PathBuf>,

    /// Pre-fill the player name asked for when a survival round ends.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
