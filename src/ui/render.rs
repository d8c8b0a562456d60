use super::app::{App, FormField, Mode, StatusKind};
use super::common::{centered_rect, first_line};
use crate::cascade::{InputGrab, MenuEntry};
use crate::hotkey::{TRIGGER_CASCADE, TRIGGER_SEARCH};
use crate::selection::SelectionSink;
use crate::tree::NodeId;
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const KEY_HINTS: &str =
    "Enter copy  n new  f folder  e edit  d delete  K/J reorder  m move  / filter  s search  o menu  ? help  q quit";

fn highlight_style() -> Style {
    Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

pub fn draw<B: Backend, G: InputGrab, S: SelectionSink>(f: &mut Frame<B>, app: &mut App<G, S>) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(5),    // Tree and preview
            Constraint::Length(1), // Status
            Constraint::Length(1), // Key hints
        ])
        .split(size);

    draw_title(f, app, chunks[0]);
    draw_body(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
    f.render_widget(
        Paragraph::new(KEY_HINTS).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );

    match app.mode() {
        Mode::Form(_) => draw_form(f, app, size),
        Mode::ConfirmDelete(id) => draw_confirm(f, app, *id, size),
        Mode::MovePicker {
            targets, selected, ..
        } => draw_move_picker(f, app, targets, *selected, size),
        Mode::Help => draw_help(f, app, size),
        Mode::Browse | Mode::Filter => {}
    }

    if app.quick_search().is_some() {
        draw_quick_search(f, app, size);
    }

    let areas = if app.cascade().is_open() {
        draw_cascade(f, app, size)
    } else {
        Vec::new()
    };
    app.set_menu_areas(areas);
}

fn draw_title<B: Backend, G: InputGrab, S: SelectionSink>(
    f: &mut Frame<B>,
    app: &App<G, S>,
    area: Rect,
) {
    let hotkeys = if app.hotkeys_available() {
        format!(
            "search {}  menu {}",
            app.config().hotkey(TRIGGER_SEARCH).unwrap_or("-"),
            app.config().hotkey(TRIGGER_CASCADE).unwrap_or("-"),
        )
    } else {
        "global hotkeys unavailable".to_string()
    };
    let title = Line::from(vec![
        Span::styled(
            format!(" paster v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} ", hotkeys), Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(title), area);
}

fn draw_body<B: Backend, G: InputGrab, S: SelectionSink>(
    f: &mut Frame<B>,
    app: &App<G, S>,
    area: Rect,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let tree = app.tree();
    let items: Vec<ListItem> = app
        .rows()
        .iter()
        .map(|row| {
            let is_folder = tree.get(row.id).map_or(false, |n| n.is_folder());
            let marker = match (is_folder, app.is_collapsed(row.id)) {
                (true, true) => "▸ ",
                (true, false) => "▾ ",
                (false, _) => "  ",
            };
            let style = if is_folder {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(
                format!("{}{}{}", "  ".repeat(row.depth), marker, row.label),
                style,
            )))
        })
        .collect();

    let title = match app.mode() {
        Mode::Filter => format!(" Templates (filter: {}▏) ", app.filter()),
        _ if !app.filter().is_empty() => format!(" Templates (filter: {}) ", app.filter()),
        _ => " Templates ".to_string(),
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(highlight_style());
    let mut state = ListState::default();
    if !app.rows().is_empty() {
        state.select(Some(app.selected_index()));
    }
    f.render_stateful_widget(list, columns[0], &mut state);

    let selected = app.selected_id().and_then(|id| tree.get(id).map(|n| (id, n)));
    let (preview_title, preview) = match selected {
        Some((id, node)) if node.is_folder() => (
            format!(" /{} ", tree.path_of(id)),
            format!("Folder with {} item(s)", node.children().len()),
        ),
        Some((id, node)) => (format!(" /{} ", tree.path_of(id)), node.content().to_string()),
        None => (
            " Preview ".to_string(),
            "No templates yet. Press 'n' to create one.".to_string(),
        ),
    };
    f.render_widget(
        Paragraph::new(preview)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(preview_title)),
        columns[1],
    );
}

fn draw_status<B: Backend, G: InputGrab, S: SelectionSink>(
    f: &mut Frame<B>,
    app: &App<G, S>,
    area: Rect,
) {
    if let Some((message, kind)) = app.status() {
        let color = match kind {
            StatusKind::Info => Color::Green,
            StatusKind::Error => Color::Red,
        };
        f.render_widget(
            Paragraph::new(format!(" {}", message)).style(Style::default().fg(color)),
            area,
        );
    }
}

fn draw_form<B: Backend, G: InputGrab, S: SelectionSink>(
    f: &mut Frame<B>,
    app: &App<G, S>,
    size: Rect,
) {
    let form = match app.mode() {
        Mode::Form(form) => form,
        _ => return,
    };
    let area = centered_rect(70, 70, size);
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(form.title())
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(inner);

    let field_style = |field: FormField| {
        if form.field == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    let with_cursor = |text: &str, field: FormField| {
        if form.field == field {
            format!("{}▏", text)
        } else {
            text.to_string()
        }
    };

    f.render_widget(
        Paragraph::new(with_cursor(&form.name, FormField::Name)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Name ")
                .border_style(field_style(FormField::Name)),
        ),
        chunks[0],
    );
    if form.has_content {
        f.render_widget(
            Paragraph::new(with_cursor(&form.content, FormField::Content))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Content ")
                        .border_style(field_style(FormField::Content)),
                ),
            chunks[1],
        );
    }
    let hint = if form.has_content {
        "Tab switch field  Ctrl+S save  Esc cancel"
    } else {
        "Enter save  Esc cancel"
    };
    f.render_widget(
        Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        chunks[2],
    );
}

fn draw_confirm<B: Backend, G: InputGrab, S: SelectionSink>(
    f: &mut Frame<B>,
    app: &App<G, S>,
    id: NodeId,
    size: Rect,
) {
    let area = centered_rect(50, 20, size);
    f.render_widget(Clear, area);
    let text = format!(
        "Delete '/{}' and everything in it?\n\n(y)es / (n)o",
        app.tree().path_of(id)
    );
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Delete ")),
        area,
    );
}

fn draw_move_picker<B: Backend, G: InputGrab, S: SelectionSink>(
    f: &mut Frame<B>,
    app: &App<G, S>,
    targets: &[NodeId],
    selected: usize,
    size: Rect,
) {
    let area = centered_rect(60, 60, size);
    f.render_widget(Clear, area);
    let items: Vec<ListItem> = targets
        .iter()
        .map(|id| ListItem::new(format!("/{}", app.tree().path_of(*id))))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Move to folder (Enter move, Esc cancel) "),
        )
        .highlight_style(highlight_style());
    let mut state = ListState::default();
    state.select(Some(selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_help<B: Backend, G: InputGrab, S: SelectionSink>(
    f: &mut Frame<B>,
    app: &App<G, S>,
    size: Rect,
) {
    let area = centered_rect(60, 80, size);
    f.render_widget(Clear, area);

    let key = |k: &str, what: &str| {
        Line::from(vec![
            Span::styled(format!("{:>12}  ", k), Style::default().fg(Color::Yellow)),
            Span::raw(what.to_string()),
        ])
    };
    let mut lines = vec![
        Line::from(Span::styled(
            "Global hotkeys",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    for (trigger, descriptor) in &app.config().hotkeys {
        lines.push(key(descriptor, trigger));
    }
    if !app.hotkeys_available() {
        lines.push(Line::from(Span::styled(
            "  (not available in this session)",
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(""));
    lines.extend([
        Line::from(Span::styled(
            "Templates",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        key("↑ ↓", "select"),
        key("← →", "collapse / expand"),
        key("Enter, c", "copy template"),
        key("n / f", "new template / folder"),
        key("e", "edit name and content"),
        key("d", "delete"),
        key("K / J", "move up / down"),
        key("m", "move to folder"),
        key("/", "filter by name"),
        key("s", "quick search"),
        key("o", "cascade menu"),
        key("a", "toggle auto-paste"),
        key("q", "quit"),
        Line::from(""),
        Line::from(format!(
            "Auto-paste after menu selection: {}",
            if app.config().features.auto_paste {
                "on"
            } else {
                "off"
            }
        )),
    ]);

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help (any key to close) "),
        ),
        area,
    );
}

fn draw_quick_search<B: Backend, G: InputGrab, S: SelectionSink>(
    f: &mut Frame<B>,
    app: &App<G, S>,
    size: Rect,
) {
    let search = match app.quick_search() {
        Some(search) => search,
        None => return,
    };
    let area = centered_rect(60, 50, size);
    f.render_widget(Clear, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    f.render_widget(
        Paragraph::new(format!("{}▏", search.query())).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Quick search ")
                .border_style(Style::default().fg(Color::Cyan)),
        ),
        chunks[0],
    );

    let tree = app.tree();
    let items: Vec<ListItem> = search
        .results()
        .iter()
        .filter_map(|id| tree.get(*id).map(|node| (id, node)))
        .map(|(id, node)| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("/{}", tree.path_of(*id))),
                Span::styled(
                    format!("  {}", first_line(node.content(), 40)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();
    let title = format!(" {} match(es), Enter copy, Esc close ", search.results().len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(highlight_style());
    let mut state = ListState::default();
    if !search.results().is_empty() {
        state.select(Some(search.selected_index()));
    }
    f.render_stateful_widget(list, chunks[1], &mut state);
}

/// Draw the open menu as cascading columns and return the area of each.
fn draw_cascade<B: Backend, G: InputGrab, S: SelectionSink>(
    f: &mut Frame<B>,
    app: &App<G, S>,
    size: Rect,
) -> Vec<(Rect, usize)> {
    let columns = app.cascade().columns();
    let cursor = app.cascade().cursor();
    let mut areas = Vec::with_capacity(columns.len());
    let mut x = size.x.saturating_add(2);
    let mut y = size.y.saturating_add(1);

    for (depth, entries) in columns.iter().enumerate() {
        let widest = entries
            .iter()
            .map(|e| e.label().chars().count() + 2)
            .max()
            .unwrap_or(0);
        let width = (widest as u16).saturating_add(4).max(14);
        let width = width.min(size.right().saturating_sub(x));
        let height = (entries.len() as u16)
            .saturating_add(2)
            .max(3)
            .min(size.bottom().saturating_sub(y));
        if width < 4 || height < 3 {
            break;
        }
        let area = Rect::new(x, y, width, height);

        let inner_width = usize::from(width.saturating_sub(2));
        let items: Vec<ListItem> = if entries.is_empty() {
            vec![ListItem::new(Span::styled(
                "(empty)",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            entries
                .iter()
                .map(|entry| match entry {
                    MenuEntry::Separator => ListItem::new(Span::styled(
                        "─".repeat(inner_width),
                        Style::default().fg(Color::DarkGray),
                    )),
                    MenuEntry::Submenu { label, .. } => ListItem::new(Span::styled(
                        format!("{} ▸", label),
                        Style::default().fg(Color::Yellow),
                    )),
                    MenuEntry::Item { label, .. } => ListItem::new(label.clone()),
                })
                .collect()
        };

        f.render_widget(Clear, area);
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .highlight_style(highlight_style());
        let mut state = ListState::default();
        let highlighted = cursor.get(depth).copied();
        if !entries.is_empty() {
            state.select(highlighted);
        }
        f.render_stateful_widget(list, area, &mut state);
        let offset = state.offset();
        areas.push((area, offset));

        // Next column lines up with the highlighted row as it appears on screen.
        let row = highlighted.unwrap_or(0).saturating_sub(offset);
        x = x.saturating_add(width);
        y = y.saturating_add(row as u16);
    }
    areas
}
