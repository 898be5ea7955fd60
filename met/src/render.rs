//! Terminal rendering of a [`Projection`].
//!
//! Nothing here looks at viewer state directly. [`draw`] formats whatever
//! the projector hands it, so a frame can be produced against any ratatui
//! backend, including the in-memory one used by the tests.

use std::{
    fmt,
    io::{self, Stdout},
    time::Duration,
};

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
};

use crate::project::{Delta, Graph, Pagination, Projection};

const HELP: &str = "q/Esc/Ctrl+C quit, Up/Down or k/j select, PgUp/PgDn page";
const EMPTY: &str = "No metrics matched filters or still fetching...";
const PLACEHOLDER: &str = "--";
const GRAPH_HEIGHT: u16 = 14;

/// The heading line, naming the endpoint and poll interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    endpoint: String,
    interval: Duration,
}

impl Banner {
    /// Create a new [`Banner`] instance
    #[must_use]
    pub fn new(endpoint: &str, interval: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            interval,
        }
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Prometheus metrics from {} (every {})",
            self.endpoint,
            humantime::format_duration(self.interval)
        )
    }
}

/// Draw one frame.
pub fn draw(frame: &mut Frame<'_>, banner: &Banner, projection: &Projection<'_>) {
    let graph_height = if projection.graph.is_some() {
        GRAPH_HEIGHT
    } else {
        0
    };
    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(graph_height),
            Constraint::Length(2),
        ])
        .split(frame.area());

    frame.render_widget(
        Paragraph::new(banner.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        areas[0],
    );

    if projection.rows.is_empty() {
        frame.render_widget(Paragraph::new(EMPTY), areas[1]);
    } else {
        frame.render_widget(table(projection), areas[1]);
    }

    if let Some(graph) = &projection.graph {
        draw_graph(frame, graph, areas[2]);
    }

    let mut footer = vec![Line::from(format!(
        "{}  {HELP}",
        pagination(projection.pagination)
    ))];
    if let Some(error) = projection.error {
        footer.push(Line::styled(
            format!("Error: {error}"),
            Style::default().fg(Color::Red),
        ));
    }
    frame.render_widget(Paragraph::new(footer), areas[3]);
}

fn table<'a>(projection: &Projection<'a>) -> Table<'a> {
    let header = Row::new(["Key", "Value", "Inc Diff", "Total Diff"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = projection.rows.iter().map(|row| {
        let cursor = if row.selected { ">" } else { " " };
        let total = row
            .total
            .map_or_else(|| PLACEHOLDER.to_string(), |total| format!("{total:.2}"));
        let style = if row.selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        Row::new([
            Cell::from(format!("{cursor} {}", row.key)),
            Cell::from(format!("{:.2}", row.value)),
            Cell::from(delta(row.delta)),
            Cell::from(total),
        ])
        .style(style)
    });

    Table::new(rows, [
        Constraint::Min(30),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(16),
    ])
    .header(header)
    .block(Block::default().borders(Borders::ALL))
}

fn delta(delta: Delta) -> Span<'static> {
    match delta {
        Delta::Increase(value) => {
            Span::styled(format!("+{value:.2}"), Style::default().fg(Color::Green))
        }
        Delta::Unchanged => Span::raw("0.00"),
        Delta::NotApplicable => Span::raw(PLACEHOLDER),
    }
}

fn pagination(pagination: Pagination) -> String {
    let Pagination { first, last, total } = pagination;
    format!("rows {first}-{last} of {total}")
}

fn draw_graph(frame: &mut Frame<'_>, graph: &Graph, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(graph.title.as_str());
    if graph.history.is_empty() {
        frame.render_widget(Paragraph::new("(no data)").block(block), area);
        return;
    }

    let points: Vec<(f64, f64)> = graph
        .history
        .iter()
        .enumerate()
        .map(|(i, value)| (i as f64, *value))
        .collect();
    let (mut low, mut high) = graph
        .history
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), v| {
            (low.min(*v), high.max(*v))
        });
    if (high - low).abs() < f64::EPSILON {
        low -= 1.0;
        high += 1.0;
    }
    let width = (points.len().saturating_sub(1)).max(1) as f64;

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(Axis::default().bounds([0.0, width]))
        .y_axis(
            Axis::default()
                .bounds([low, high])
                .labels([format!("{low:.2}"), format!("{high:.2}")]),
        );
    frame.render_widget(chart, area);
}

/// Undoes the terminal modes switched on through it, when dropped. Each mode
/// is recorded as soon as it is on, so an early return leaves nothing behind.
#[derive(Debug)]
struct Restore<W: io::Write> {
    out: W,
    raw: bool,
    alternate: bool,
}

impl<W: io::Write> Restore<W> {
    fn new(out: W) -> Self {
        Self {
            out,
            raw: false,
            alternate: false,
        }
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        self.raw = true;
        Ok(())
    }

    fn enter_alternate_screen(&mut self) -> io::Result<()> {
        execute!(self.out, EnterAlternateScreen)?;
        self.alternate = true;
        Ok(())
    }
}

impl<W: io::Write> Drop for Restore<W> {
    fn drop(&mut self) {
        if self.alternate {
            let _ = execute!(self.out, LeaveAlternateScreen);
        }
        if self.raw {
            let _ = disable_raw_mode();
        }
    }
}

/// The real terminal, in raw mode on the alternate screen. Both are undone on
/// drop, including when unwinding.
#[derive(Debug)]
pub struct Screen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    _restore: Restore<Stdout>,
}

impl Screen {
    /// Take over stdout.
    ///
    /// # Errors
    ///
    /// Function will error if the terminal cannot be put into raw mode, the
    /// alternate screen cannot be entered or the terminal size cannot be
    /// read. The terminal is left as it was found.
    pub fn enter() -> io::Result<Self> {
        let mut restore = Restore::new(io::stdout());
        restore.enable_raw_mode()?;
        restore.enter_alternate_screen()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;
        Ok(Self {
            terminal,
            _restore: restore,
        })
    }

    /// The terminal to draw on.
    pub fn terminal(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}
