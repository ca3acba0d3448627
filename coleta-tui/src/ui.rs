use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};

use coleta_core::{AggregatedSchedule, CollectionSlot, LookupResponse};

use crate::app::{App, ResultState};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, input, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, input_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new("coleta – waste collection schedules")
        .block(Block::default().borders(Borders::ALL).title("Coleta"));
    frame.render_widget(header, *header_area);

    let input_title = if app.is_searching {
        "Address or `lat, lon` (searching…)"
    } else {
        "Address or `lat, lon`"
    };
    let input = Paragraph::new(app.input.as_str())
        .block(Block::default().borders(Borders::ALL).title(input_title))
        .wrap(Wrap { trim: true });
    frame.render_widget(input, *input_area);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(*content_area);

    let [suggestions_area, result_area] = content_chunks.as_ref() else {
        return;
    };

    draw_suggestions(frame, app, *suggestions_area);
    draw_result(frame, &app.result, *result_area);

    let nav_hint = "Type to search · ↑/↓ move · Enter look up · Esc clear/quit · Ctrl-C quit";
    let (status_text, status_style) = match &app.status_message {
        Some(msg) => (format!("{msg} · {nav_hint}"), Style::default().fg(Color::Yellow)),
        None => (nav_hint.to_owned(), Style::default()),
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_suggestions(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = if app.suggestions.is_empty() {
        vec![ListItem::new("No suggestions yet.")]
    } else {
        app.suggestions
            .iter()
            .map(|candidate| ListItem::new(candidate.display_label.clone()))
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Suggestions (↑/↓, Enter)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.suggestions.is_empty() {
        state.select(Some(app.suggestion_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_result(frame: &mut Frame<'_>, result: &ResultState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Collection schedule");

    let message = match result {
        ResultState::Idle => {
            "Pick an address suggestion or type coordinates as `lat, lon` and press Enter.".to_owned()
        }
        ResultState::Loading => "Looking up collection zones…".to_owned(),
        ResultState::NoZone { resolved_address } => {
            format!("No collection zone covers {resolved_address}.")
        }
        ResultState::DatasetUnavailable(reason) => {
            let paragraph = Paragraph::new(format!("Collection zones could not be loaded: {reason}"))
                .block(block)
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }
        ResultState::Found {
            response,
            schedule,
            looked_up_at,
        } => {
            let consulted = looked_up_at.format("%d/%m/%Y %H:%M").to_string();
            draw_schedule(frame, response, schedule, &consulted, block, area);
            return;
        }
    };

    let paragraph = Paragraph::new(message).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_schedule(
    frame: &mut Frame<'_>,
    response: &LookupResponse,
    schedule: &AggregatedSchedule,
    consulted: &str,
    block: Block<'_>,
    area: Rect,
) {
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(inner);

    let [summary_area, table_area] = layout_chunks.as_ref() else {
        return;
    };

    let summary = Paragraph::new(vec![
        Line::from(response.resolved_address.clone()).bold(),
        Line::from(format!("Neighborhood: {} · Sector: {}", schedule.neighborhood, schedule.sector)),
        Line::from(format!("Zones found: {}", response.result_count)),
        Line::from(format!("Consulted at {consulted}")).dim(),
    ])
    .wrap(Wrap { trim: true });
    frame.render_widget(summary, *summary_area);

    let rows = schedule
        .selective
        .iter()
        .map(|slot| slot_row("Selective", slot, Color::Green))
        .chain(schedule.general.iter().map(|slot| slot_row("General", slot, Color::Gray)));

    let column_widths = [
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Length(12),
        Constraint::Min(14),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Type", "Frequency", "Shift", "Time"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .column_spacing(1);

    frame.render_widget(table, *table_area);
}

fn slot_row<'a>(category: &'a str, slot: &'a CollectionSlot, color: Color) -> Row<'a> {
    Row::new(vec![
        Cell::from(category),
        Cell::from(slot.frequency.as_str()),
        Cell::from(slot.shift_label.as_str()),
        Cell::from(slot.time_window.as_str()),
    ])
    .style(Style::default().fg(color))
}
