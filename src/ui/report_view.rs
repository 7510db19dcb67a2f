//! Four-panel results figure
//!
//! Renders the aggregate views of a `Report` as bar charts in a 2x2 grid.

use std::io;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::report::Report;

/// Ratings are charted in tenths of a star so bars can use integer values
const RATING_SCALE: f64 = 10.0;

/// Takes over the terminal, draws the figure, and returns on the first key press
pub fn show(report: &Report, title: &str) -> io::Result<()> {
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    draw_until_key(&mut terminal, report, title)
}

/// Leaves raw mode and the alternate screen, ignoring failures
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Restores the terminal when dropped, including during unwinding
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn draw_until_key<B: Backend>(
    terminal: &mut Terminal<B>,
    report: &Report,
    title: &str,
) -> io::Result<()> {
    loop {
        terminal.draw(|frame| render(frame, report, title))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(());
            }
        }
    }
}

/// Renders the figure into `frame`
pub fn render(frame: &mut Frame, report: &Report, title: &str) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
            Constraint::Length(1),
        ])
        .split(area);

    let heading = Paragraph::new(format!("Restaurant results for {}", title))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    frame.render_widget(heading, rows[0]);

    let top = split_columns(rows[1]);
    let bottom = split_columns(rows[2]);

    let averages: Vec<Bar> = report
        .average_rating_by_category
        .iter()
        .map(|(category, average)| {
            Bar::default()
                .label(Line::from(category.as_str()))
                .value((average * RATING_SCALE).round() as u64)
                .text_value(format!("{:.1}", average))
        })
        .collect();
    frame.render_widget(
        horizontal_chart(" Average rating by category ", &averages)
            .max((5.0 * RATING_SCALE) as u64),
        top[0],
    );

    let prices: Vec<Bar> = report
        .price_counts
        .iter()
        .map(|(price, count)| count_bar(price, *count))
        .collect();
    frame.render_widget(vertical_chart(" Price tiers ", &prices, 5), top[1]);

    let histogram: Vec<Bar> = report
        .rating_histogram
        .iter()
        .map(|(rating, count)| count_bar(&format!("{:.1}", rating), *count))
        .collect();
    frame.render_widget(vertical_chart(" Rating histogram ", &histogram, 3), bottom[0]);

    let categories: Vec<Bar> = report
        .category_counts
        .iter()
        .map(|(category, count)| count_bar(category, *count))
        .collect();
    frame.render_widget(
        horizontal_chart(" Restaurants by category ", &categories),
        bottom[1],
    );

    let footer = Paragraph::new(format!("{} restaurants  |  Press any key to continue", report.total()))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, rows[3]);
}

fn split_columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

fn count_bar(label: &str, count: u64) -> Bar<'static> {
    Bar::default()
        .label(Line::from(label.to_string()))
        .value(count)
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

fn horizontal_chart<'a>(title: &'a str, bars: &[Bar<'a>]) -> BarChart<'a> {
    BarChart::default()
        .block(panel(title))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::Yellow))
        .value_style(Style::default().fg(Color::Black).bg(Color::Yellow))
        .data(BarGroup::default().bars(bars))
}

fn vertical_chart<'a>(title: &'a str, bars: &[Bar<'a>], bar_width: u16) -> BarChart<'a> {
    BarChart::default()
        .block(panel(title))
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Green))
        .value_style(Style::default().fg(Color::Black).bg(Color::Green))
        .data(BarGroup::default().bars(bars))
}
