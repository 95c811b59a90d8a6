pub mod layout;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;
use waterquest::{DifficultyLevel, TargetKind, VerdictStatus};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const PALETTE: [Color; 7] = [
    Color::Cyan,
    Color::LightBlue,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::LightCyan,
    Color::White,
];

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(&self.state).render(self, area, buf);
    }
}

pub fn render_menu(app: &App, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(2), // title
            Constraint::Length(2), // rules
            Constraint::Length(DifficultyLevel::ALL.len() as u16 + 1),
            Constraint::Length(2), // hints
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled("💧 WATER QUEST 💧", bold.fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new("Tap the jerry cans 💧 before they vanish. Avoid the pollutants 🛢.")
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let rows: Vec<Line> = DifficultyLevel::ALL
        .iter()
        .enumerate()
        .map(|(i, level)| {
            let p = level.profile();
            let text = format!(
                "{}. {:<7} {}s, win at {} points",
                i + 1,
                p.label,
                p.duration_seconds,
                p.win_score_threshold
            );
            if *level == app.selected {
                Line::from(Span::styled(format!("▶ {text}"), bold.fg(Color::Yellow)))
            } else {
                Line::from(Span::styled(format!("  {text}"), dim))
            }
        })
        .collect();
    Paragraph::new(rows)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    let sound = if app.muted { "🔇" } else { "🔊" };
    Paragraph::new(Span::styled(
        format!("(←/→ or 1-3) choose  (enter) start  (s)ound {sound}  (esc)ape"),
        dim.add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);
}

pub fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let (hud, field) = layout::split(area);
    let inner = layout::field_inner(area);
    let machine = &app.machine;
    let profile = machine.difficulty();

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let time_style = if machine.current_time_remaining() <= 5 {
        bold.fg(Color::Red)
    } else {
        bold
    };

    let mut spans = vec![
        Span::styled(format!("Score {}", machine.current_score()), bold.fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(format!("Time {}s", machine.current_time_remaining()), time_style),
        Span::raw("   "),
        Span::styled(
            format!("{} · goal {}", profile.label, profile.win_score_threshold),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ];
    if machine.is_paused() {
        spans.push(Span::styled(
            "   PAUSED - press any key",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ));
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM))
        .render(hud, buf);

    Block::default()
        .borders(Borders::ALL)
        .title(" Water Quest ")
        .border_style(Style::default().fg(Color::Blue))
        .render(field, buf);

    for target in machine.live_targets() {
        let rect = layout::target_rect(inner, &target);
        if rect.width < 2 || rect.height < 2 {
            continue;
        }
        let (colour, icon) = match target.kind {
            TargetKind::Good => (Color::Cyan, "💧"),
            TargetKind::Bad => (Color::Red, "🛢"),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colour).add_modifier(Modifier::BOLD));
        let label_area = block.inner(rect);
        block.render(rect, buf);
        if label_area.height > 0 {
            let middle = Rect::new(
                label_area.x,
                label_area.y + label_area.height / 2,
                label_area.width,
                1,
            );
            Paragraph::new(icon)
                .alignment(Alignment::Center)
                .render(middle, buf);
        }
    }

    for bubble in &app.feedback {
        let (col, row) = layout::point_to_cell(inner, bubble.x, bubble.y);
        let width = (bubble.text.width() as u16).min(inner.right().saturating_sub(col));
        let style = if bubble.good {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        };
        Paragraph::new(Span::styled(bubble.text.as_str(), style))
            .render(Rect::new(col, row, width, 1).intersection(inner), buf);
    }
}

pub fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(verdict) = app.machine.verdict() else {
        return;
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let (headline, colour) = match verdict.status {
        VerdictStatus::Win => ("YOU WIN! The village has clean water.", Color::Green),
        VerdictStatus::Lose => ("Not quite. Try again!", Color::Red),
    };

    let mut lines = vec![
        Line::from(Span::styled(headline, bold.fg(colour))),
        Line::from(""),
        Line::from(vec![
            Span::raw("Final score "),
            Span::styled(verdict.final_score.to_string(), bold.fg(Color::Cyan)),
            Span::raw(format!(" / goal {} on {}", verdict.threshold, verdict.label)),
        ]),
    ];
    if let Some(finished_at) = app.finished_at {
        lines.push(Line::from(Span::styled(
            format!("Finished at {}", finished_at.format("%H:%M:%S")),
            dim,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "(r)eplay  (m)enu  (esc)ape",
        dim.add_modifier(Modifier::ITALIC),
    )));

    // frozen playfield stays behind the verdict panel
    render_playing(app, area, buf);

    let width = lines
        .iter()
        .map(|l| l.width() as u16)
        .max()
        .unwrap_or(0)
        .saturating_add(4)
        .min(area.width);
    let height = (lines.len() as u16).saturating_add(2).min(area.height);
    let panel = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    Clear.render(panel, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colour)),
        )
        .render(panel, buf);

    if app.celebration.is_active {
        for p in &app.celebration.particles {
            if p.x < 0.0 || p.y < 0.0 {
                continue;
            }
            let (x, y) = (p.x as u16, p.y as u16);
            if x < area.right() && y < area.bottom() {
                let style = Style::default()
                    .fg(PALETTE[p.color_index % PALETTE.len()])
                    .add_modifier(Modifier::BOLD);
                buf.set_string(x, y, p.symbol.to_string(), style);
            }
        }
    }
}
