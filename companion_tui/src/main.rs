use anyhow::{Context, Result};
use clap::Parser;
use companion_core::{
    Color as AgentColor, ItemKind, Position,
    environment::Episode,
    game::Game,
    policy::{Policy, RandomPolicy},
    registry::load_game,
    world::{CellType, World},
};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Watch seeded random policies play a companion game.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Game to load, e.g. `companion_synchro(rows=8,cols=8,players=4)`
    #[arg(short, long, default_value = "companion_simple")]
    game: String,

    /// Seed for the random policies
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Milliseconds between turns
    #[arg(short, long, default_value_t = 250)]
    tick_ms: u64,

    /// Where log output goes, so it does not end up on the terminal UI
    #[arg(short, long, value_name = "LOG_FILE", default_value = "companion_tui.log")]
    log_file: PathBuf,
}

struct App {
    game: Game,
    seed: u64,
    /// The episode being played.
    episode: Episode,
    /// One policy per player, indexed by player.
    policies: Vec<Box<dyn Policy>>,
    /// Episodes started so far, used to vary the seed on restart.
    episodes: u64,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(game: Game, seed: u64) -> Result<Self> {
        let episode = game.new_initial_state()?;
        let mut app = App {
            game,
            seed,
            episode,
            policies: Vec::new(),
            episodes: 1,
            should_quit: false,
        };
        app.policies = app.make_policies();
        Ok(app)
    }

    fn make_policies(&self) -> Vec<Box<dyn Policy>> {
        (0..self.game.num_players() as u64)
            .map(|player| {
                let seed = self.seed + self.episodes * 1000 + player;
                Box::new(RandomPolicy::new(seed)) as Box<dyn Policy>
            })
            .collect()
    }

    /// Plays one turn unless the episode is over.
    fn tick(&mut self) {
        if self.episode.is_terminal() {
            return;
        }
        self.episode.step_with_policies(&mut self.policies);
        if self.episode.is_terminal() {
            info!(
                timestep = self.episode.timestep(),
                returns = ?self.episode.returns(),
                "episode finished"
            );
        }
    }

    /// Starts a fresh episode with new policy seeds.
    fn restart(&mut self) -> Result<()> {
        self.episodes += 1;
        self.episode = self.game.new_initial_state()?;
        self.policies = self.make_policies();
        Ok(())
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let game = load_game(&args.game).with_context(|| format!("Loading game '{}'", args.game))?;
    info!(%game, seed = args.seed, "starting viewer");
    let mut app = App::new(game, args.seed)?;

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));

    // Restore the terminal state even if the loop failed
    restore_terminal(&mut terminal)?;

    result
}

/// Installs a `tracing` subscriber writing to `path`. Filtered by `RUST_LOG`.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("companion_core=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char('r') => app.restart()?,
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(65), // Area for the map
            Constraint::Percentage(25), // Area for agents
            Constraint::Percentage(10), // Area for status/help
        ])
        .split(frame.area());

    render_map(frame, main_layout[0], app);
    render_agents(frame, main_layout[1], &app.episode);

    let state = if app.episode.is_terminal() {
        "finished, 'r' to restart"
    } else {
        "running"
    };
    let status = format!(
        "Turn {}/{} | episode {} {} | 'q'/'Esc' quit, 'r' restart",
        app.episode.timestep(),
        app.episode.horizon(),
        app.episodes,
        state
    );
    let help_text = Paragraph::new(status)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

fn agent_color(color: AgentColor) -> Color {
    match color {
        AgentColor::Red => Color::Red,
        AgentColor::Blue => Color::Blue,
        AgentColor::Green => Color::Green,
        AgentColor::Yellow => Color::Yellow,
        AgentColor::Purple => Color::Magenta,
        AgentColor::Orange => Color::LightRed,
        AgentColor::Cyan => Color::Cyan,
        AgentColor::Pink => Color::LightMagenta,
    }
}

fn item_span(kind: ItemKind, color: AgentColor) -> Span<'static> {
    let glyph = match kind {
        ItemKind::Key => "k",
        ItemKind::Treasure => "t",
    };
    Span::styled(glyph, Style::default().fg(agent_color(color)))
}

/// Lists every player: position, return so far and carried items by kind.
fn render_agents(frame: &mut Frame, area: Rect, episode: &Episode) {
    let rows: Vec<ListItem> = (0..episode.num_players())
        .map(|player| {
            let ret = episode.returns()[player];
            let Some(agent) = episode.world().agent(player) else {
                return ListItem::from(Line::from(Span::styled(
                    format!("Agent {player}: dead | return {ret:.0}"),
                    Style::default().fg(Color::DarkGray),
                )));
            };
            let mut spans = vec![
                Span::styled(
                    format!("Agent {player}"),
                    Style::default().fg(agent_color(agent.color)).bold(),
                ),
                Span::raw(format!(
                    " at ({}, {}) | return {ret:.0} | {} keys, {} treasures: ",
                    agent.position.row,
                    agent.position.col,
                    agent.count_of(ItemKind::Key),
                    agent.count_of(ItemKind::Treasure)
                )),
            ];
            spans.extend(
                agent
                    .inventory
                    .iter()
                    .map(|item| item_span(item.kind, item.color)),
            );
            ListItem::from(Line::from(spans))
        })
        .collect();

    let agents_widget =
        List::new(rows).block(Block::default().borders(Borders::ALL).title("Agents"));
    frame.render_widget(agents_widget, area);
}

/// Draws one cell: agents over doors over items over the cell type.
fn cell_span(world: &World, pos: Position) -> Span<'static> {
    if let Some(agent) = world.agent_at(pos) {
        return Span::styled(
            agent.direction.glyph().to_string(),
            Style::default().fg(agent_color(agent.color)).bold(),
        );
    }
    if let Some(door) = world.door_at(pos) {
        let glyph = if door.open { "/" } else { "+" };
        return Span::styled(glyph, Style::default().fg(agent_color(door.color)));
    }
    if let Some(ground) = world.ground_items_at(pos).next() {
        return item_span(ground.item.kind, ground.item.color);
    }
    let cell = world.cell(pos);
    let style = match cell {
        CellType::Empty => Style::default().fg(Color::DarkGray),
        CellType::Wall => Style::default().fg(Color::Gray),
        CellType::Lava => Style::default().fg(Color::LightRed),
        CellType::Goal => Style::default().fg(Color::Green).bold(),
        CellType::Synchro => Style::default().fg(Color::Cyan).bold(),
    };
    Span::styled(cell.glyph().to_string(), style)
}

/// Renders the episode grid onto the frame.
fn render_map(frame: &mut Frame, area: Rect, app: &App) {
    let world = app.episode.world();
    let lines: Vec<Line> = (0..world.rows())
        .map(|row| {
            let spans: Vec<Span> = (0..world.cols())
                .map(|col| cell_span(world, Position::new(row, col)))
                .collect();
            Line::from(spans)
        })
        .collect();

    let map_paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(format!("{} | {}", app.game.long_name(), app.game))
                .borders(Borders::ALL),
        )
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}
