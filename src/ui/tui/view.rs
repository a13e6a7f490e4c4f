use super::{BrowserTui, Focus, GRID_COLUMNS};
use crate::api::types::{Metadata, DEFAULT_TAG_SERVICE};
use crate::browse::pagination::PagerButton;
use crate::browse::search::SearchResult;
use crate::browse::tags::{TagGroups, TagKind};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

// Pager shows at most this many page buttons around the current page
const PAGER_WINDOW: usize = 15;

pub(super) fn render(f: &mut Frame, tui: &BrowserTui) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Search bar
            Constraint::Min(0),    // Results or viewer
            Constraint::Length(1), // Pager
            Constraint::Length(2), // Footer (border + text)
        ])
        .split(size);

    render_title(f, tui, chunks[0]);
    render_search_bar(f, tui, chunks[1]);

    match tui.shell.open_item() {
        Some(item) if tui.focus == Focus::Viewer => render_viewer(f, tui, item, chunks[2]),
        _ => render_grid(f, tui, chunks[2]),
    }

    let pager = tui.shell.store().pager();
    if !pager.is_empty() {
        let line = pager_line(&pager, tui.shell.store().current_page());
        f.render_widget(Paragraph::new(line).alignment(Alignment::Center), chunks[3]);
    }

    render_footer(f, tui, chunks[4]);
}

fn render_title(f: &mut Frame, tui: &BrowserTui, area: Rect) {
    let version = match tui.shell.api_version() {
        Some(v) => format!("  API ver: {}  Hydrus ver: {}", v.version, v.hydrus_version),
        None => "  not connected".to_string(),
    };
    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "hydrus-browser",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(version, Style::default().fg(Color::DarkGray)),
    ]));
    f.render_widget(title, area);
}

fn render_search_bar(f: &mut Frame, tui: &BrowserTui, area: Rect) {
    let typing = tui.focus == Focus::Search;
    let border = if typing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };

    let value = tui.shell.search_value();
    let text = if value.is_empty() {
        Span::styled("search tags (e.g.: bunny_ears)", Style::default().fg(Color::DarkGray))
    } else if typing {
        Span::styled(format!("{}_", value), Style::default().fg(Color::White))
    } else {
        Span::styled(value.to_string(), Style::default().fg(Color::White))
    };

    let bar = Paragraph::new(Line::from(text)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled("Search", Style::default().add_modifier(Modifier::BOLD))),
    );
    f.render_widget(bar, area);
}

fn render_grid(f: &mut Frame, tui: &BrowserTui, area: Rect) {
    let store = tui.shell.store();
    let page = store.page();

    let title = if store.is_empty() {
        "Results".to_string()
    } else {
        format!(
            "Results ({} found, page {}/{})",
            store.len(),
            store.current_page(),
            store.total_pages()
        )
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title);

    if page.is_empty() {
        let message = if tui.shell.is_searching() {
            "Searching..."
        } else if tui.shell.last_submitted().is_empty() {
            "Enter tags above to search your client"
        } else {
            "No results found. Try different tags."
        };
        let empty = Paragraph::new(vec![Line::from(""), Line::from(message)])
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(empty, area);
        return;
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = page.len().div_ceil(GRID_COLUMNS);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(inner);

    for (row, row_area) in row_areas.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
            .split(*row_area);

        for (col, cell) in cells.iter().enumerate() {
            let index = row * GRID_COLUMNS + col;
            if let Some(result) = page.get(index) {
                let selected = tui.focus == Focus::Grid && index == tui.selected;
                f.render_widget(thumbnail_cell(result, selected), *cell);
            }
        }
    }
}

fn thumbnail_cell(result: &SearchResult, selected: bool) -> Paragraph<'static> {
    let border = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let id = result.id().map(|id| format!("#{}", id)).unwrap_or_default();
    let mut lines = Vec::new();

    if let Some(metadata) = &result.metadata {
        lines.push(Line::from(Span::styled(
            metadata.mime.clone(),
            Style::default().fg(Color::Cyan),
        )));
        lines.push(Line::from(dimensions(metadata)));
    }

    let thumb = match (&result.thumbnail, result.thumbnail_attempted) {
        (Some(bytes), _) => Span::styled(
            format!("thumb {}", format_size(bytes.len() as u64)),
            Style::default().fg(Color::Green),
        ),
        (None, true) => Span::styled("no thumbnail", Style::default().fg(Color::Red)),
        (None, false) => Span::styled("loading...", Style::default().fg(Color::DarkGray)),
    };
    lines.push(Line::from(thumb));

    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(id),
    )
}

fn render_viewer(f: &mut Frame, tui: &BrowserTui, item: &SearchResult, area: Rect) {
    let Some(metadata) = &item.metadata else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let tags = metadata.display_tags(DEFAULT_TAG_SERVICE);
    let groups = TagGroups::from_tags(tags);
    let mut lines = Vec::new();
    let mut position = 0;
    for (kind, section) in groups.sections() {
        lines.push(Line::from(Span::styled(
            kind.label(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )));
        for tag in section {
            let style = if position == tui.tag_selected {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(tag_color(kind))
            };
            lines.push(Line::from(Span::styled(format!("  {}", tag.text), style)));
            position += 1;
        }
    }

    let tag_list = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!("Tags ({})", tags.len())),
    );
    f.render_widget(tag_list, chunks[0]);
    f.render_widget(details(tui, item, metadata), chunks[1]);
}

fn details<'a>(tui: &BrowserTui, item: &SearchResult, metadata: &'a Metadata) -> Paragraph<'a> {
    let label = |name: &'static str| {
        Span::styled(name, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    };

    let mut lines = vec![
        Line::from(vec![label("File: "), Span::raw(format!("#{}", metadata.file_id))]),
        Line::from(vec![label("Hash: "), Span::raw(metadata.hash.as_str())]),
        Line::from(vec![
            label("Type: "),
            Span::raw(format!("{} ({})", metadata.mime, metadata.ext)),
        ]),
        Line::from(vec![label("Size: "), Span::raw(metadata.size.map(format_size).unwrap_or_default())]),
        Line::from(vec![label("Dimensions: "), Span::raw(dimensions(metadata))]),
    ];

    if let Some(duration) = metadata.duration {
        lines.push(Line::from(vec![
            label("Duration: "),
            Span::raw(format_duration(duration)),
            Span::raw(if metadata.has_audio { "  (audio)" } else { "" }),
        ]));
    }
    if let Some(frames) = metadata.num_frames {
        lines.push(Line::from(vec![label("Frames: "), Span::raw(frames.to_string())]));
    }

    let mut flags = Vec::new();
    if metadata.is_inbox {
        flags.push("inbox");
    }
    if metadata.is_trashed {
        flags.push("trashed");
    }
    if !metadata.is_local {
        flags.push("remote");
    }
    if !flags.is_empty() {
        lines.push(Line::from(vec![label("Flags: "), Span::raw(flags.join(", "))]));
    }

    if let Some(bytes) = &item.thumbnail {
        lines.push(Line::from(vec![
            label("Thumbnail: "),
            Span::raw(format_size(bytes.len() as u64)),
        ]));
    }

    if metadata.is_video() {
        if let Some(url) = tui.shell.stream_url(metadata.file_id) {
            lines.push(Line::from(""));
            lines.push(Line::from(label("Stream URL:")));
            lines.push(Line::from(Span::styled(url, Style::default().fg(Color::White))));
        }
    }

    if !metadata.known_urls.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(label("Known URLs:")));
        for url in &metadata.known_urls {
            lines.push(Line::from(Span::raw(format!("  {}", url))));
        }
    }

    if let Some(status) = tui.shell.status() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(Color::DarkGray),
        )));
    }

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title("Details"),
        )
        .wrap(Wrap { trim: false })
}

fn render_footer(f: &mut Frame, tui: &BrowserTui, area: Rect) {
    let key = |k: &'static str, color: Color| {
        Span::styled(k, Style::default().fg(color).add_modifier(Modifier::BOLD))
    };

    let mut spans = match tui.focus {
        Focus::Search => vec![
            key("Enter", Color::Green),
            Span::raw(": Search  "),
            key("Esc", Color::Yellow),
            Span::raw(": Results  "),
            key("Ctrl+U", Color::Cyan),
            Span::raw(": Clear  "),
            key("Ctrl+C", Color::Red),
            Span::raw(": Quit"),
        ],
        Focus::Grid => vec![
            key("←↑↓→", Color::Cyan),
            Span::raw(": Move  "),
            key("n/p", Color::Cyan),
            Span::raw(": Page  "),
            key("Enter", Color::Green),
            Span::raw(": View  "),
            key("/", Color::Yellow),
            Span::raw(": Search  "),
            key("q", Color::Red),
            Span::raw(": Quit"),
        ],
        Focus::Viewer => vec![
            key("↑↓", Color::Cyan),
            Span::raw(": Tag  "),
            key("Enter", Color::Green),
            Span::raw(": Search tag  "),
            key("s", Color::Magenta),
            Span::raw(": Save  "),
            key("Esc", Color::Yellow),
            Span::raw(": Close  "),
            key("q", Color::Red),
            Span::raw(": Quit"),
        ],
    };

    if tui.focus != Focus::Viewer {
        if let Some(status) = tui.shell.status() {
            spans.push(Span::raw(format!("   {}", status)));
        }
    }

    let footer = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    f.render_widget(footer, area);
}

fn pager_line(buttons: &[PagerButton], current: usize) -> Line<'static> {
    let mut spans = Vec::new();
    let window = pager_window(buttons.len(), current, PAGER_WINDOW);

    if window.start > 0 {
        spans.push(Span::raw("… "));
    }
    for button in &buttons[window.clone()] {
        let style = if button.selected {
            Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!(" {} ", button.number), style));
    }
    if window.end < buttons.len() {
        spans.push(Span::raw(" …"));
    }
    Line::from(spans)
}

/// Index range of the pager buttons to show: at most `width` buttons,
/// keeping the current page (1-based) roughly centered.
fn pager_window(total: usize, current: usize, width: usize) -> std::ops::Range<usize> {
    if total <= width {
        return 0..total;
    }
    let half = width / 2;
    let start = current.saturating_sub(1).saturating_sub(half).min(total - width);
    start..start + width
}

fn tag_color(kind: TagKind) -> Color {
    match kind {
        TagKind::Creator => Color::Red,
        TagKind::Series => Color::Magenta,
        TagKind::Character => Color::Green,
        TagKind::Namespaced => Color::LightBlue,
        TagKind::General => Color::White,
    }
}

fn dimensions(metadata: &Metadata) -> String {
    match (metadata.width, metadata.height) {
        (Some(w), Some(h)) => format!("{}x{}", w, h),
        _ => String::new(),
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Milliseconds as `m:ss`
fn format_duration(millis: u64) -> String {
    let secs = millis / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pager_window() {
        assert_eq!(pager_window(4, 2, 15), 0..4);
        assert_eq!(pager_window(40, 1, 15), 0..15);
        assert_eq!(pager_window(40, 20, 15), 12..27);
        assert_eq!(pager_window(40, 40, 15), 25..40);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(65_000), "1:05");
        assert_eq!(format_duration(999), "0:00");
    }
}
