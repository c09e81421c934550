use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Terminal,
};
use std::time::{Duration, Instant};
use anyhow::Result;
use crate::project_index::{Level, ProjectIndex};
use crate::search::matching_names;
use std::sync::Arc;
use tracing::debug;

const PAGE_SIZE: usize = 30;
const LIST_SIZE: usize = 50;
const FRAME_MS: u64 = 16;

pub struct AppState {
    input: String,
    filtered_projects: Arc<Vec<String>>,
    selected_idx: usize,
    tree: Vec<(Level, String)>,
    tree_scroll: usize,
    focus: Focus,
    index: Arc<ProjectIndex>,
    list_scroll: usize,
    visible_list_range: (usize, usize),
}

enum Focus {
    ProjectList,
    Tree,
}

pub async fn run_tui(index: ProjectIndex) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let index = Arc::new(index);
    let projects: Vec<String> = index.project_names().into_iter().map(String::from).collect();

    let mut app = AppState {
        input: String::new(),
        filtered_projects: Arc::new(projects),
        selected_idx: 0,
        tree: Vec::new(),
        tree_scroll: 0,
        focus: Focus::ProjectList,
        index,
        list_scroll: 0,
        visible_list_range: (0, 0),
    };
    load_selected_tree(&mut app);

    loop {
        let now = Instant::now();

        terminal.draw(|f| render_ui(f, &mut app))?;

        if event::poll(Duration::from_millis(FRAME_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    KeyCode::Char('q') if matches!(app.focus, Focus::Tree) => break,
                    KeyCode::Esc if app.input.is_empty() && matches!(app.focus, Focus::ProjectList) => break,
                    KeyCode::Tab => toggle_focus(&mut app),
                    _ => handle_key(&mut app, key.code),
                }
            }
        }

        let elapsed = now.elapsed();
        if elapsed < Duration::from_millis(FRAME_MS) {
            tokio::time::sleep(Duration::from_millis(FRAME_MS) - elapsed).await;
        }
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn toggle_focus(app: &mut AppState) {
    app.focus = match app.focus {
        Focus::ProjectList => Focus::Tree,
        Focus::Tree => Focus::ProjectList,
    };
}

fn handle_key(app: &mut AppState, key: KeyCode) {
    match app.focus {
        Focus::ProjectList => handle_project_list_keys(app, key),
        Focus::Tree => handle_tree_keys(app, key),
    }
}

fn handle_project_list_keys(app: &mut AppState, key: KeyCode) {
    match key {
        KeyCode::Char(c) => {
            app.input.push(c);
            filter_projects(app);
        }
        KeyCode::Backspace => {
            app.input.pop();
            filter_projects(app);
        }
        KeyCode::Esc => {
            app.input.clear();
            filter_projects(app);
        }
        _ => {}
    }

    let projects_len = app.filtered_projects.len();
    if projects_len == 0 {
        return;
    }

    let previous = app.selected_idx;
    match key {
        KeyCode::Up => app.selected_idx = app.selected_idx.saturating_sub(1),
        KeyCode::Down => app.selected_idx = (app.selected_idx + 1).min(projects_len - 1),
        KeyCode::PageUp => app.selected_idx = app.selected_idx.saturating_sub(LIST_SIZE),
        KeyCode::PageDown => app.selected_idx = (app.selected_idx + LIST_SIZE).min(projects_len - 1),
        _ => {}
    }
    if previous != app.selected_idx {
        update_list_scroll(app);
        load_selected_tree(app);
    }
}

fn update_list_scroll(app: &mut AppState) {
    let visible_height = app.visible_list_range.1 - app.visible_list_range.0;

    if app.selected_idx < app.list_scroll {
        app.list_scroll = app.selected_idx;
    } else if visible_height > 0 && app.selected_idx >= app.list_scroll + visible_height {
        app.list_scroll = app.selected_idx - visible_height + 1;
    }
}

/// Re-filters the project list through a fresh trie on every keystroke.
fn filter_projects(app: &mut AppState) {
    let projects = app.index.project_names();
    let filtered = matching_names(&projects, &app.input);
    debug!(query = %app.input, matches = filtered.len(), "project filter");

    app.filtered_projects = Arc::new(filtered);
    app.selected_idx = 0;
    app.list_scroll = 0;
    load_selected_tree(app);
}

fn load_selected_tree(app: &mut AppState) {
    app.tree_scroll = 0;
    app.tree = app
        .filtered_projects
        .get(app.selected_idx)
        .and_then(|project| app.index.walk(project))
        .map(|nodes| {
            nodes
                .into_iter()
                .map(|(level, name)| (level, name.to_string()))
                .collect()
        })
        .unwrap_or_default();
}

fn handle_tree_keys(app: &mut AppState, key: KeyCode) {
    let max_scroll = app.tree.len().saturating_sub(1);
    match key {
        KeyCode::Up => app.tree_scroll = app.tree_scroll.saturating_sub(1),
        KeyCode::Down => app.tree_scroll = (app.tree_scroll + 1).min(max_scroll),
        KeyCode::PageUp => app.tree_scroll = app.tree_scroll.saturating_sub(PAGE_SIZE),
        KeyCode::PageDown => app.tree_scroll = (app.tree_scroll + PAGE_SIZE).min(max_scroll),
        KeyCode::Esc => app.focus = Focus::ProjectList,
        _ => {}
    }
}

fn render_ui<B: tui::backend::Backend>(f: &mut tui::Frame<B>, app: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(10),
            ]
                .as_ref(),
        )
        .split(f.size());

    render_status_bar(f, app, chunks[0]);
    render_input(f, app, chunks[1]);
    render_main_content(f, app, chunks[2]);
}

fn render_status_bar<B: tui::backend::Backend>(f: &mut tui::Frame<B>, app: &AppState, area: Rect) {
    let status = match app.focus {
        Focus::ProjectList => "PROJECTS [type to filter, Tab:Tree, Esc:Clear/Quit]",
        Focus::Tree => "HIERARCHY [Up/Down:Scroll, Tab:Projects, q:Quit]",
    };

    let status_bar = Paragraph::new(status)
        .block(Block::default())
        .style(Style::default().bg(Color::DarkGray));

    f.render_widget(status_bar, area);
}

fn render_input<B: tui::backend::Backend>(f: &mut tui::Frame<B>, app: &AppState, area: Rect) {
    let input_text = format!("> {}", app.input);

    let input = Paragraph::new(input_text.as_str())
        .block(Block::default().borders(Borders::ALL).title("Search"))
        .style(Style::default().fg(Color::Yellow));

    f.render_widget(input, area);
}

fn render_main_content<B: tui::backend::Backend>(f: &mut tui::Frame<B>, app: &mut AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(area);

    render_project_list(f, app, chunks[0]);
    render_tree(f, app, chunks[1]);
}

fn render_project_list<B: tui::backend::Backend>(f: &mut tui::Frame<B>, app: &mut AppState, area: Rect) {
    let height = area.height.saturating_sub(2) as usize;
    app.visible_list_range = (app.list_scroll, app.list_scroll + height);

    let end = std::cmp::min(app.list_scroll + height, app.filtered_projects.len());
    let start = std::cmp::min(app.list_scroll, end);
    let visible_projects = &app.filtered_projects[start..end];

    let items: Vec<ListItem> = visible_projects
        .iter()
        .map(|project| ListItem::new(project.as_str()))
        .collect();

    let title = format!("Projects ({})", app.filtered_projects.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    if !app.filtered_projects.is_empty() {
        state.select(Some(app.selected_idx.saturating_sub(start)));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Project => Color::Yellow,
        Level::Group => Color::Cyan,
        Level::Item => Color::White,
        Level::Task => Color::Green,
    }
}

fn render_tree<B: tui::backend::Backend>(f: &mut tui::Frame<B>, app: &AppState, area: Rect) {
    let lines: Vec<Spans> = if app.tree.is_empty() {
        vec![Spans::from(Span::raw("No projects found"))]
    } else {
        app.tree
            .iter()
            .skip(app.tree_scroll)
            .map(|(level, name)| {
                Spans::from(vec![
                    Span::raw("  ".repeat(level.depth())),
                    Span::styled(name.as_str(), Style::default().fg(level_color(*level))),
                    Span::styled(format!("  ({level})"), Style::default().fg(Color::DarkGray)),
                ])
            })
            .collect()
    };

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Project → Group → Item → Task"));

    f.render_widget(paragraph, area);
}
