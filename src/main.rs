use std::{
    cell::RefCell,
    fs::File,
    io::{self, stdout, Stdout},
    path::PathBuf,
    rc::Rc,
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tracing_subscriber::filter::LevelFilter;

use playfield::{
    Cell, Direction, Grid, Piece, Playfield, PlayfieldConfig, PlayfieldError, RandomFeed,
    Renderer, EMPTY,
};

/// Terminal front-end for the playfield engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of rows
    #[arg(long, default_value_t = playfield::config::DEFAULT_ROWS)]
    rows: usize,

    /// Number of columns
    #[arg(long, default_value_t = playfield::config::DEFAULT_COLUMNS)]
    columns: usize,

    /// Gravity interval in milliseconds
    #[arg(long, default_value_t = 800)]
    tick_ms: u64,

    /// Seed for the piece generator
    #[arg(long)]
    seed: Option<u64>,

    /// Write debug logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";

// ============================================================================
// Pieces
// ============================================================================

/// The seven tetrominoes, each tagged with its own cell value.
fn tetrominoes() -> playfield::Result<Vec<Piece>> {
    [
        vec![vec![1, 1, 1, 1]],
        vec![vec![2, 2], vec![2, 2]],
        vec![vec![0, 3, 0], vec![3, 3, 3]],
        vec![vec![0, 4, 4], vec![4, 4, 0]],
        vec![vec![5, 5, 0], vec![0, 5, 5]],
        vec![vec![6, 0, 0], vec![6, 6, 6]],
        vec![vec![0, 0, 7], vec![7, 7, 7]],
    ]
    .into_iter()
    .map(Piece::new)
    .collect()
}

fn cell_color(value: Cell) -> Color {
    match value {
        1 => Color::Cyan,
        2 => Color::Yellow,
        3 => Color::Magenta,
        4 => Color::Green,
        5 => Color::Red,
        6 => Color::Blue,
        7 => Color::Rgb(255, 165, 0),
        _ => Color::White,
    }
}

// ============================================================================
// Frame Sink
// ============================================================================

/// Keeps the latest snapshot for the draw loop.
struct FrameSink {
    frame: Rc<RefCell<Grid>>,
}

impl Renderer for FrameSink {
    fn render(&mut self, grid: &Grid) {
        self.frame.replace(grid.clone());
    }
}

struct Screen<'a> {
    frame: &'a Grid,
    lines_cleared: usize,
    paused: bool,
    game_over: bool,
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, screen: &Screen) {
    let area = frame.size();
    render_game(frame, screen, area);

    if screen.game_over {
        render_popup(
            frame,
            area,
            " Game Over ",
            vec![
                Line::from(""),
                Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
                Line::from(""),
                Line::from(format!("Lines: {}", screen.lines_cleared)),
                Line::from(""),
                Line::from(Span::styled(
                    "R: restart | ESC: quit",
                    Style::default().fg(Color::DarkGray),
                )),
            ],
        );
    } else if screen.paused {
        render_popup(
            frame,
            area,
            " Paused ",
            vec![
                Line::from(""),
                Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
                Line::from(""),
                Line::from(Span::styled(
                    "Press P to continue",
                    Style::default().fg(Color::DarkGray),
                )),
            ],
        );
    }
}

fn render_game(frame: &mut Frame, screen: &Screen, area: Rect) {
    let grid_display_width = (screen.frame.columns() as u16 * CELL_WIDTH) + 2;
    let grid_display_height = screen.frame.rows() as u16 + 2;
    let info_width = 14;
    let total_width = grid_display_width + info_width + 2;
    let total_height = grid_display_height + 3;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    let game_row = vertical[0];

    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(info_width),
    ])
    .split(game_row);

    render_grid(frame, screen.frame, horizontal[0]);
    render_info(frame, screen, horizontal[1]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 2,
    };

    if controls_area.y + 1 < area.height {
        let controls = Paragraph::new(vec![Line::from(
            "A/D: Move | S: Down | W/Space: Drop | P: Pause | R: Restart | Q/ESC: Quit",
        )])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, grid: &Grid, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Playfield ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = (0..grid.rows())
        .map(|row| {
            let spans: Vec<Span> = grid
                .row(row)
                .iter()
                .map(|&value| {
                    if value == EMPTY {
                        Span::raw(EMPTY_CHAR)
                    } else {
                        Span::styled(BLOCK_CHAR, Style::default().fg(cell_color(value)))
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, screen: &Screen, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", screen.lines_cleared)),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_popup(frame: &mut Frame, area: Rect, title: &str, text: Vec<Line>) {
    let height = text.len() as u16 + 2;
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    let popup_area = centered_rect(26, height, area);
    frame.render_widget(paragraph, popup_area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Main Loop
// ============================================================================

/// Swallows game over, which the screen reports on its own.
fn absorb_game_over<T>(result: playfield::Result<T>) -> anyhow::Result<()> {
    match result {
        Ok(_) | Err(PlayfieldError::GameOver) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    field: &mut Playfield,
    frame: &RefCell<Grid>,
    tick_duration: Duration,
) -> anyhow::Result<()> {
    let mut paused = false;
    let mut last_tick = Instant::now();

    absorb_game_over(field.spawn())?;

    loop {
        {
            let snapshot = frame.borrow();
            let screen = Screen {
                frame: &snapshot,
                lines_cleared: field.lines_cleared(),
                paused,
                game_over: field.is_game_over(),
            };
            terminal.draw(|f| render(f, &screen))?;
        }

        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => break,
                        KeyCode::Char('p') | KeyCode::Char('P') if !field.is_game_over() => {
                            paused = !paused;
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            field.reset();
                            paused = false;
                            absorb_game_over(field.spawn())?;
                        }
                        _ if !paused && !field.is_game_over() => {
                            let direction = match key.code {
                                KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => {
                                    Some(Direction::Left)
                                }
                                KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Right => {
                                    Some(Direction::Right)
                                }
                                KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Down => {
                                    Some(Direction::Down)
                                }
                                KeyCode::Char('w')
                                | KeyCode::Char('W')
                                | KeyCode::Char(' ') => Some(Direction::HardDrop),
                                _ => None,
                            };
                            if let Some(direction) = direction {
                                absorb_game_over(field.step(direction))?;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_duration {
            if !paused && !field.is_game_over() {
                absorb_game_over(field.tick())?;
            }
            last_tick = Instant::now();
        }

        for event in field.take_events() {
            tracing::trace!("{:?}", event);
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_max_level(LevelFilter::DEBUG)
            .init();
    }

    let config = PlayfieldConfig::new()
        .with_rows(args.rows)
        .with_columns(args.columns);
    config.validate()?;
    let pieces = tetrominoes()?;
    let feed = match args.seed {
        Some(seed) => RandomFeed::seeded(pieces, seed),
        None => RandomFeed::new(pieces),
    };

    let frame = Rc::new(RefCell::new(Grid::new(config.rows, config.columns)));
    let sink = FrameSink {
        frame: Rc::clone(&frame),
    };
    let mut field = Playfield::new(config, Box::new(feed), Box::new(sink))?;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(
        &mut terminal,
        &mut field,
        &frame,
        Duration::from_millis(args.tick_ms),
    );

    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    result
}
