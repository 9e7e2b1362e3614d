use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::App;
use crate::config::ColorConfig;
use crate::diff::{HunkNavigator, LineTag, ResourceOpener};
use crate::labels::LabelProvider;
use crate::model::{NodeId, NodeKind};
use crate::provider::Provider;
use crate::view::VisibleItem;

pub fn draw<P, O>(frame: &mut Frame, app: &App<P, O>)
where
    P: Provider,
    O: ResourceOpener<Editor = HunkNavigator>,
{
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);

    draw_tree(frame, app, panes[0]);
    draw_diff(frame, app, panes[1]);
    draw_status_bar(frame, app, rows[1]);
}

fn row_text(item: &VisibleItem) -> String {
    let indent = " ".repeat(item.depth * 2);
    match item.kind {
        NodeKind::Group | NodeKind::Folder => {
            let expand_char = if item.is_expanded { "▾" } else { "▸" };
            format!("{}{} {} ({})", indent, expand_char, item.name, item.count)
        }
        NodeKind::Leaf => format!(
            "{}{} {} {}",
            indent,
            item.letter.unwrap_or(' '),
            item.icon,
            item.name
        ),
    }
}

fn draw_tree<P: Provider, O: ResourceOpener>(frame: &mut Frame, app: &App<P, O>, area: Rect) {
    let colors = &app.config.colors;
    let model = app.view.build_view_model(&app.labels);

    let block = Block::default()
        .title(format!(" SCM [{}] ", model.view_mode.as_str()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ColorConfig::parse(&colors.active_border)));

    if model.items.is_empty() {
        let paragraph = Paragraph::new("No pending changes")
            .block(block)
            .style(Style::default().fg(ratatui::style::Color::Gray));
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = model
        .items
        .iter()
        .map(|item| {
            let style = match item.kind {
                NodeKind::Group => Style::default()
                    .fg(ColorConfig::parse(&colors.group))
                    .add_modifier(Modifier::BOLD),
                NodeKind::Folder => Style::default().fg(ColorConfig::parse(&colors.folder)),
                NodeKind::Leaf => item
                    .color
                    .as_deref()
                    .map(|color| Style::default().fg(ColorConfig::parse(color)))
                    .unwrap_or_default(),
            };
            ListItem::new(Line::from(Span::styled(row_text(item), style)))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(ColorConfig::parse(&colors.selected_fg))
            .bg(ColorConfig::parse(&colors.selected_bg))
            .add_modifier(Modifier::BOLD),
    );

    let mut list_state = ListState::default();
    list_state.select(model.items.iter().position(|item| item.is_selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_diff<P, O>(frame: &mut Frame, app: &App<P, O>, area: Rect)
where
    P: Provider,
    O: ResourceOpener<Editor = HunkNavigator>,
{
    let colors = &app.config.colors;
    let Some(editor) = app.view.cursor().editor() else {
        let paragraph = Paragraph::new("No file open")
            .block(Block::default().title(" Diff ").borders(Borders::ALL))
            .style(Style::default().fg(ratatui::style::Color::Gray));
        frame.render_widget(paragraph, area);
        return;
    };

    let block = Block::default()
        .title(diff_title(app, &editor.node, &editor.source_uri))
        .borders(Borders::ALL);

    let navigator = &editor.navigator;
    if navigator.hunks().is_empty() {
        frame.render_widget(Paragraph::new("No changes").block(block), area);
        return;
    }

    let current = navigator.current();
    let mut lines = Vec::new();
    let mut current_line = 0;
    for (index, hunk) in navigator.hunks().iter().enumerate() {
        let is_current = current == Some(index);
        if is_current {
            current_line = lines.len();
        }
        let mut header_style = Style::default().fg(ColorConfig::parse(&colors.hunk_header));
        if is_current {
            header_style = header_style
                .bg(ColorConfig::parse(&colors.current_hunk_bg))
                .add_modifier(Modifier::BOLD);
        }
        lines.push(Line::from(Span::styled(hunk.header(), header_style)));
        for line in &hunk.lines {
            let (prefix, style) = match line.tag {
                LineTag::Context => (' ', Style::default()),
                LineTag::Added => ('+', Style::default().fg(ColorConfig::parse(&colors.added_line))),
                LineTag::Removed => ('-', Style::default().fg(ColorConfig::parse(&colors.removed_line))),
            };
            lines.push(Line::from(Span::styled(format!("{}{}", prefix, line.text), style)));
        }
    }

    // Keep the current hunk in view
    let visible_height = area.height.saturating_sub(2) as usize;
    let scroll = if current_line >= visible_height { current_line } else { 0 };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
    frame.render_widget(paragraph, area);
}

fn draw_status_bar<P: Provider, O: ResourceOpener>(frame: &mut Frame, app: &App<P, O>, area: Rect) {
    let colors = &app.config.colors;
    let status_line = Line::from(vec![
        Span::raw(app.status_message.clone()),
        Span::raw(" | "),
        Span::raw(app.stats_line()),
    ]);

    let paragraph = Paragraph::new(status_line).style(
        Style::default()
            .fg(ColorConfig::parse(&colors.status_bar_fg))
            .bg(ColorConfig::parse(&colors.status_bar_bg)),
    );
    frame.render_widget(paragraph, area);
}

/// File name plus the group it was opened from
fn diff_title<P, O>(app: &App<P, O>, node: &NodeId, source_uri: &str) -> String
where
    P: Provider,
    O: ResourceOpener,
{
    let name = app.labels.get_name(source_uri);
    match app.view.controller().resource_for(node) {
        Some((group, _)) => format!(" {} ({}) ", name, group.label),
        None => format!(" {} ", name),
    }
}
