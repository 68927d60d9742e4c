//! ljos-telemetry — TUI viewer for the tiled light index.
//!
//! Listens for the JSON snapshots `ljos` sends with the `diagnostics` feature
//! and shows build times, capacity use, a per-tile light-count heatmap and
//! captured logs in a btop-style terminal dashboard using ratatui.
//!
//! Run the demo with `cargo run -p ljos --example maze_lights`, then run
//! `cargo run -p ljos-telemetry`.

use std::collections::VecDeque;
use std::io;
use std::net::UdpSocket;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Sparkline};
use serde::Deserialize;

const LISTEN_ADDR: &str = "127.0.0.1:9110";

// ── Wire types (must match ljos's JSON format) ──────────────────────────

#[derive(Deserialize, Clone, Default)]
struct LutSnapshot {
    elapsed_secs: f32,
    stats: BuildStats,
    counters: Counters,
    capacity: Capacity,
    #[serde(default)]
    grid: Option<[u32; 2]>,
    #[serde(default)]
    origin: Option<TileOrigin>,
    #[serde(default)]
    tile_counts: Option<Vec<u32>>,
    #[serde(default)]
    logs: Vec<LogEntryInfo>,
}

/// Which screen edge tile row 0 sits on.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum TileOrigin {
    #[default]
    TopLeft,
    BottomLeft,
}

#[derive(Deserialize, Clone, Default)]
struct BuildStats {
    lights_submitted: usize,
    lights_rejected: usize,
    lights_stored: usize,
    lights_dropped: usize,
    tiles: usize,
    tile_light_pairs: usize,
    tile_overflow: usize,
    index_overflow: usize,
    max_tile_lights: usize,
    build_us: u64,
}

#[derive(Deserialize, Clone, Default)]
struct Counters {
    builds: u64,
    lights_dropped: u64,
    lights_rejected: u64,
    tile_overflow: u64,
    index_overflow: u64,
    overflowed_builds: u64,
}

#[derive(Deserialize, Clone, Default)]
struct Capacity {
    max_lights: usize,
    max_lights_per_tile: u32,
    index_capacity: usize,
    cell_capacity: usize,
    table_width: usize,
    table_height: usize,
}

#[derive(Deserialize, Clone, Default)]
struct LogEntryInfo {
    level: String,
    target: String,
    message: String,
    timestamp_secs: f32,
}

// ── Tabs ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Tab {
    Overview,
    Tiles,
    Logs,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Overview, Tab::Tiles, Tab::Logs];

    fn next(self) -> Self {
        match self {
            Tab::Overview => Tab::Tiles,
            Tab::Tiles => Tab::Logs,
            Tab::Logs => Tab::Overview,
        }
    }

    fn prev(self) -> Self {
        match self {
            Tab::Overview => Tab::Logs,
            Tab::Tiles => Tab::Overview,
            Tab::Logs => Tab::Tiles,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Tiles => "Tiles",
            Tab::Logs => "Logs",
        }
    }
}

// ── Log level filter ────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LogFilter {
    All,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogFilter {
    fn next(self) -> Self {
        match self {
            LogFilter::All => LogFilter::Debug,
            LogFilter::Debug => LogFilter::Info,
            LogFilter::Info => LogFilter::Warn,
            LogFilter::Warn => LogFilter::Error,
            LogFilter::Error => LogFilter::All,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LogFilter::All => "ALL",
            LogFilter::Debug => "DEBUG+",
            LogFilter::Info => "INFO+",
            LogFilter::Warn => "WARN+",
            LogFilter::Error => "ERROR",
        }
    }

    fn passes(self, level: &str) -> bool {
        match self {
            LogFilter::All => true,
            LogFilter::Debug => level != "TRACE",
            LogFilter::Info => matches!(level, "INFO" | "WARN" | "ERROR"),
            LogFilter::Warn => matches!(level, "WARN" | "ERROR"),
            LogFilter::Error => level == "ERROR",
        }
    }
}

// ── App state ────────────────────────────────────────────────────────────

const HISTORY_CAP: usize = 1200;
const LOG_CAP: usize = 2000;

struct App {
    latest: LutSnapshot,
    build_history: VecDeque<u64>,
    pairs_history: VecDeque<u64>,
    active_tab: Tab,
    paused: bool,
    connected: bool,

    // Logs tab state
    log_entries: Vec<LogEntryInfo>,
    log_filter: LogFilter,
    log_auto_scroll: bool,
    log_scroll_offset: usize,
}

impl App {
    fn new() -> Self {
        Self {
            latest: LutSnapshot::default(),
            build_history: VecDeque::with_capacity(HISTORY_CAP),
            pairs_history: VecDeque::with_capacity(HISTORY_CAP),
            active_tab: Tab::Overview,
            paused: false,
            connected: false,
            log_entries: Vec::new(),
            log_filter: LogFilter::Info,
            log_auto_scroll: true,
            log_scroll_offset: 0,
        }
    }

    fn push_snapshot(&mut self, snap: LutSnapshot) {
        if self.paused {
            return;
        }

        push_capped(&mut self.build_history, snap.stats.build_us);
        push_capped(&mut self.pairs_history, snap.stats.tile_light_pairs as u64);

        self.log_entries.extend(snap.logs.iter().cloned());
        if self.log_entries.len() > LOG_CAP {
            let excess = self.log_entries.len() - LOG_CAP;
            self.log_entries.drain(..excess);
        }

        self.latest = snap;
        self.connected = true;
    }

    fn log_counts(&self) -> (usize, usize, usize, usize, usize) {
        let (mut t, mut d, mut i, mut w, mut e) = (0, 0, 0, 0, 0);
        for log in &self.log_entries {
            match log.level.as_str() {
                "TRACE" => t += 1,
                "DEBUG" => d += 1,
                "INFO" => i += 1,
                "WARN" => w += 1,
                "ERROR" => e += 1,
                _ => {}
            }
        }
        (t, d, i, w, e)
    }

    fn filtered_logs(&self) -> Vec<&LogEntryInfo> {
        self.log_entries
            .iter()
            .filter(|e| self.log_filter.passes(&e.level))
            .collect()
    }
}

fn push_capped(history: &mut VecDeque<u64>, value: u64) {
    if history.len() >= HISTORY_CAP {
        history.pop_front();
    }
    history.push_back(value);
}

// ── Main ─────────────────────────────────────────────────────────────────

fn main() -> io::Result<()> {
    let socket = UdpSocket::bind(LISTEN_ADDR).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("failed to bind {LISTEN_ADDR} (is another ljos-telemetry running?): {e}"),
        )
    })?;
    socket.set_nonblocking(true)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let mut buf = vec![0u8; 65536];

    let result = run(&mut terminal, &mut app, &socket, &mut buf);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    socket: &UdpSocket,
    buf: &mut [u8],
) -> io::Result<()> {
    loop {
        // Drain all pending datagrams.
        while let Ok(n) = socket.recv(buf) {
            if let Ok(snap) = serde_json::from_slice::<LutSnapshot>(&buf[..n]) {
                app.push_snapshot(snap);
            }
        }

        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if handle_key(app, key) {
                    return Ok(());
                }
            }
        }
    }
}

// ── Key handling ─────────────────────────────────────────────────────────

/// Returns `true` if the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('p') => app.paused = !app.paused,

        KeyCode::Char('1') => app.active_tab = Tab::Overview,
        KeyCode::Char('2') => app.active_tab = Tab::Tiles,
        KeyCode::Char('3') => app.active_tab = Tab::Logs,

        KeyCode::Tab => app.active_tab = app.active_tab.next(),
        KeyCode::BackTab => app.active_tab = app.active_tab.prev(),

        // Logs tab keys.
        KeyCode::Char('l') if app.active_tab == Tab::Logs => {
            app.log_filter = app.log_filter.next();
        }
        KeyCode::Char('g') if app.active_tab == Tab::Logs => {
            app.log_auto_scroll = !app.log_auto_scroll;
        }
        KeyCode::Up if app.active_tab == Tab::Logs => {
            app.log_auto_scroll = false;
            app.log_scroll_offset = app.log_scroll_offset.saturating_sub(1);
        }
        KeyCode::Down if app.active_tab == Tab::Logs => {
            app.log_auto_scroll = false;
            app.log_scroll_offset += 1;
        }

        _ => {}
    }
    false
}

// ── UI rendering ─────────────────────────────────────────────────────────

fn ui(f: &mut ratatui::Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // tab bar
            Constraint::Min(6),    // tab content
            Constraint::Length(1), // help bar
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_tab_bar(f, app, chunks[1]);

    match app.active_tab {
        Tab::Overview => draw_overview_tab(f, app, chunks[2]),
        Tab::Tiles => draw_tiles_tab(f, app, chunks[2]),
        Tab::Logs => draw_logs_tab(f, app, chunks[2]),
    }

    draw_help_bar(f, app, chunks[3]);
}

fn draw_header(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let s = &app.latest;
    let (status, status_color) = if app.paused {
        (" PAUSED ", Color::Yellow)
    } else if app.connected {
        (" LIVE ", Color::Green)
    } else {
        (" WAITING ", Color::DarkGray)
    };
    let grid = s
        .grid
        .map_or_else(|| "-".to_string(), |[w, h]| format!("{w}x{h}"));

    let text = Line::from(vec![
        Span::styled(
            format!(" {status} "),
            Style::default().bg(status_color).fg(Color::Black),
        ),
        Span::raw("  "),
        Span::styled("Build: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{}us", s.stats.build_us),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled("Builds: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{}", s.counters.builds), Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled("Grid: ", Style::default().fg(Color::DarkGray)),
        Span::styled(grid, Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled("Table: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{}x{}", s.capacity.table_width, s.capacity.table_height),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled("Up: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format_uptime(s.elapsed_secs), Style::default().fg(Color::White)),
    ]);

    let block = Block::default()
        .title(" ljos-telemetry ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_tab_bar(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        let num = format!(" {} ", i + 1);
        let label = format!("{} ", tab.label());
        if *tab == app.active_tab {
            spans.push(Span::styled(
                num,
                Style::default().bg(Color::Cyan).fg(Color::Black).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                label,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(num, Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(label, Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::raw("  "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── Overview Tab ─────────────────────────────────────────────────────────

fn draw_overview_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // sparklines
            Constraint::Length(6), // capacity
            Constraint::Min(4),    // counters
        ])
        .split(area);

    draw_sparklines(f, app, chunks[0]);
    draw_capacity(f, app, chunks[1]);
    draw_counters(f, app, chunks[2]);
}

fn draw_sparklines(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let build_data: Vec<u64> = app.build_history.iter().copied().collect();
    let (b_min, b_avg, b_max) = stats(&build_data);
    draw_sparkline(
        f,
        chunks[0],
        " Build Time ",
        &build_data,
        Color::Green,
        format!("min: {b_min:.0}us  avg: {b_avg:.0}us  max: {b_max:.0}us"),
    );

    let pairs_data: Vec<u64> = app.pairs_history.iter().copied().collect();
    let (p_min, p_avg, p_max) = stats(&pairs_data);
    draw_sparkline(
        f,
        chunks[1],
        " Tile/Light Pairs ",
        &pairs_data,
        Color::Yellow,
        format!("min: {p_min:.0}  avg: {p_avg:.0}  max: {p_max:.0}"),
    );
}

fn draw_sparkline(
    f: &mut ratatui::Frame,
    area: Rect,
    title: &str,
    data: &[u64],
    color: Color,
    summary: String,
) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 2 {
        return;
    }
    let spark_area = Rect { height: inner.height - 1, ..inner };
    let stats_area = Rect {
        y: inner.y + inner.height - 1,
        height: 1,
        ..inner
    };
    // Show the most recent samples that fit.
    let start = data.len().saturating_sub(spark_area.width as usize);
    let sparkline = Sparkline::default()
        .data(&data[start..])
        .style(Style::default().fg(color));
    f.render_widget(sparkline, spark_area);
    f.render_widget(
        Paragraph::new(Span::styled(summary, Style::default().fg(Color::DarkGray))),
        stats_area,
    );
}

fn draw_capacity(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let s = &app.latest;
    let block = Block::default()
        .title(" Capacity ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let bar_width = (inner.width as usize).saturating_sub(40).clamp(10, 60);
    let rows = [
        ("Lights", s.stats.lights_stored, s.capacity.max_lights),
        ("Index slots", s.stats.tile_light_pairs, s.capacity.index_capacity),
        ("Tiles", s.stats.tiles, s.capacity.cell_capacity),
        (
            "Busiest tile",
            s.stats.max_tile_lights,
            s.capacity.max_lights_per_tile as usize,
        ),
    ];
    let lines: Vec<Line> = rows
        .iter()
        .map(|&(name, used, total)| {
            let ratio = if total == 0 { 0.0 } else { used as f64 / total as f64 };
            Line::from(vec![
                Span::styled(format!("  {name:<13}"), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    usage_bar(ratio, bar_width),
                    Style::default().fg(usage_color(ratio)),
                ),
                Span::styled(
                    format!(" {used:>7} / {total:<7} {:>5.1}%", ratio * 100.0),
                    Style::default().fg(Color::White),
                ),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_counters(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let s = &app.latest;
    let block = Block::default()
        .title(" Counters ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let warn = |n: u64| {
        if n > 0 {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        }
    };
    let label = Style::default().fg(Color::DarkGray);

    let lines = vec![
        Line::from(vec![
            Span::styled("  Last build:   ", label),
            Span::styled("submitted ", label),
            Span::raw(format!("{}", s.stats.lights_submitted)),
            Span::styled("  rejected ", label),
            Span::styled(format!("{}", s.stats.lights_rejected), warn(s.stats.lights_rejected as u64)),
            Span::styled("  dropped ", label),
            Span::styled(format!("{}", s.stats.lights_dropped), warn(s.stats.lights_dropped as u64)),
            Span::styled("  tile overflow ", label),
            Span::styled(format!("{}", s.stats.tile_overflow), warn(s.stats.tile_overflow as u64)),
            Span::styled("  index overflow ", label),
            Span::styled(format!("{}", s.stats.index_overflow), warn(s.stats.index_overflow as u64)),
        ]),
        Line::from(vec![
            Span::styled("  Total:        ", label),
            Span::styled("builds ", label),
            Span::raw(format!("{}", s.counters.builds)),
            Span::styled("  rejected ", label),
            Span::styled(format!("{}", s.counters.lights_rejected), warn(s.counters.lights_rejected)),
            Span::styled("  dropped ", label),
            Span::styled(format!("{}", s.counters.lights_dropped), warn(s.counters.lights_dropped)),
            Span::styled("  tile overflow ", label),
            Span::styled(format!("{}", s.counters.tile_overflow), warn(s.counters.tile_overflow)),
            Span::styled("  index overflow ", label),
            Span::styled(format!("{}", s.counters.index_overflow), warn(s.counters.index_overflow)),
        ]),
        Line::from(vec![
            Span::styled("  Overflowing builds: ", label),
            Span::styled(
                format!("{}", s.counters.overflowed_builds),
                warn(s.counters.overflowed_builds),
            ),
        ]),
    ];
    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ── Tiles Tab ────────────────────────────────────────────────────────────

fn draw_tiles_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let s = &app.latest;
    let block = Block::default()
        .title(format!(
            " Tiles  max {} per tile  (cap {}) ",
            s.stats.max_tile_lights, s.capacity.max_lights_per_tile
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let (Some([gw, gh]), Some(counts)) = (s.grid, s.tile_counts.as_ref()) else {
        let text = Span::styled(
            "  No tile data (grid too large or no build yet)",
            Style::default().fg(Color::DarkGray),
        );
        f.render_widget(Paragraph::new(text), inner);
        return;
    };
    if inner.height < 2 || inner.width < 2 {
        return;
    }

    let map_area = Rect { height: inner.height - 1, ..inner };
    let legend_area = Rect {
        y: inner.y + inner.height - 1,
        height: 1,
        ..inner
    };

    let origin = s.origin.unwrap_or_default();
    let heat = screen_rows(
        heatmap(
            counts,
            gw as usize,
            gh as usize,
            map_area.width as usize,
            map_area.height as usize,
        ),
        origin,
    );
    let peak = heat.iter().flatten().copied().max().unwrap_or(0).max(1);
    let lines: Vec<Line> = heat
        .iter()
        .map(|row| {
            Line::from(
                row.iter()
                    .map(|&c| {
                        let (glyph, color) = heat_cell(c, peak);
                        Span::styled(glyph, Style::default().fg(color))
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    f.render_widget(Paragraph::new(lines), map_area);

    let legend = Line::from(vec![
        Span::styled("  \u{00b7} 0  ", Style::default().fg(Color::DarkGray)),
        Span::styled("\u{2591} low  ", Style::default().fg(Color::Blue)),
        Span::styled("\u{2592} mid  ", Style::default().fg(Color::Green)),
        Span::styled("\u{2593} high  ", Style::default().fg(Color::Yellow)),
        Span::styled(format!("\u{2588} {peak}"), Style::default().fg(Color::Red)),
        Span::styled(origin_label(origin), Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(legend), legend_area);
}

/// Downsample a `gw × gh` row-major grid of counts to fit `max_w × max_h`
/// cells, keeping the largest count in each block.
fn heatmap(counts: &[u32], gw: usize, gh: usize, max_w: usize, max_h: usize) -> Vec<Vec<u32>> {
    if gw == 0 || gh == 0 || max_w == 0 || max_h == 0 {
        return Vec::new();
    }
    let sx = gw.div_ceil(max_w);
    let sy = gh.div_ceil(max_h);
    let (w, h) = (gw.div_ceil(sx), gh.div_ceil(sy));

    let mut out = vec![vec![0u32; w]; h];
    for ty in 0..gh {
        for tx in 0..gw {
            let count = counts.get(ty * gw + tx).copied().unwrap_or(0);
            let cell = &mut out[ty / sy][tx / sx];
            *cell = (*cell).max(count);
        }
    }
    out
}

/// Put heatmap rows in screen order, top row first.
fn screen_rows(mut heat: Vec<Vec<u32>>, origin: TileOrigin) -> Vec<Vec<u32>> {
    if origin == TileOrigin::BottomLeft {
        heat.reverse();
    }
    heat
}

fn origin_label(origin: TileOrigin) -> &'static str {
    match origin {
        TileOrigin::TopLeft => "   row 0 at top",
        TileOrigin::BottomLeft => "   row 0 at bottom",
    }
}

fn heat_cell(count: u32, peak: u32) -> (&'static str, Color) {
    if count == 0 {
        return ("\u{00b7}", Color::DarkGray);
    }
    let ratio = count as f64 / peak as f64;
    if ratio < 0.25 {
        ("\u{2591}", Color::Blue)
    } else if ratio < 0.5 {
        ("\u{2592}", Color::Green)
    } else if ratio < 0.75 {
        ("\u{2593}", Color::Yellow)
    } else {
        ("\u{2588}", Color::Red)
    }
}

// ── Logs Tab ─────────────────────────────────────────────────────────────

fn draw_logs_tab(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let (t, d, i, w, e) = app.log_counts();
    let scroll_label = if app.log_auto_scroll { "auto" } else { "manual" };

    let block = Block::default()
        .title(format!(
            " Logs [{}]  T:{} D:{} I:{} W:{} E:{}  scroll:{} ",
            app.log_filter.label(),
            t,
            d,
            i,
            w,
            e,
            scroll_label,
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let filtered = app.filtered_logs();
    if filtered.is_empty() {
        let text = Span::styled("  No log messages", Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(text), inner);
        return;
    }

    let visible = inner.height as usize;
    let total = filtered.len();
    let offset = if app.log_auto_scroll {
        total.saturating_sub(visible)
    } else {
        app.log_scroll_offset.min(total.saturating_sub(visible))
    };

    let lines: Vec<Line> = filtered
        .iter()
        .skip(offset)
        .take(visible)
        .map(|entry| {
            let level_color = match entry.level.as_str() {
                "TRACE" => Color::DarkGray,
                "DEBUG" => Color::Gray,
                "INFO" => Color::Cyan,
                "WARN" => Color::Yellow,
                "ERROR" => Color::Red,
                _ => Color::White,
            };
            Line::from(vec![
                Span::styled(
                    format!("  [{:>6.1}s] ", entry.timestamp_secs),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<5} ", entry.level),
                    Style::default().fg(level_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{}: ", entry.target), Style::default().fg(Color::DarkGray)),
                Span::styled(entry.message.clone(), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

// ── Help bar ─────────────────────────────────────────────────────────────

fn draw_help_bar(f: &mut ratatui::Frame, app: &App, area: Rect) {
    let key = Style::default().fg(Color::Cyan);
    let mut spans = vec![
        Span::styled(" [1-3]", key),
        Span::raw(" tab  "),
        Span::styled("[Tab]", key),
        Span::raw(" next  "),
    ];

    if app.active_tab == Tab::Logs {
        spans.push(Span::styled("[l]", key));
        spans.push(Span::raw(" filter  "));
        spans.push(Span::styled("[g]", key));
        spans.push(Span::raw(" auto-scroll  "));
        spans.push(Span::styled("[\u{2191}\u{2193}]", key));
        spans.push(Span::raw(" scroll  "));
    }

    spans.push(Span::styled("[p]", key));
    spans.push(Span::raw(" pause  "));
    spans.push(Span::styled("[q]", key));
    spans.push(Span::raw(" quit"));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn stats(data: &[u64]) -> (f64, f64, f64) {
    let (Some(&min), Some(&max)) = (data.iter().min(), data.iter().max()) else {
        return (0.0, 0.0, 0.0);
    };
    let avg = data.iter().sum::<u64>() as f64 / data.len() as f64;
    (min as f64, avg, max as f64)
}

fn usage_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "\u{2588}".repeat(filled), "\u{2591}".repeat(width - filled))
}

fn usage_color(ratio: f64) -> Color {
    if ratio >= 1.0 {
        Color::Red
    } else if ratio >= 0.8 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn format_uptime(secs: f32) -> String {
    let total = secs as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{secs:.1}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heatmap_keeps_small_grids_as_is() {
        let counts = [0, 1, 2, 3, 4, 5];
        let heat = heatmap(&counts, 3, 2, 80, 20);
        assert_eq!(heat, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn heatmap_downsamples_with_max() {
        // 4x2 grid into 2 columns, 1 row.
        let counts = [1, 0, 0, 7, 2, 0, 3, 0];
        let heat = heatmap(&counts, 4, 2, 2, 1);
        assert_eq!(heat, vec![vec![2, 7]]);
    }

    #[test]
    fn bottom_left_grids_are_flipped_to_screen_order() {
        let json = r#"{
            "elapsed_secs": 0.5,
            "stats": {"lights_submitted": 1, "lights_rejected": 0, "lights_stored": 1,
                      "lights_dropped": 0, "tiles": 4, "tile_light_pairs": 1,
                      "tile_overflow": 0, "index_overflow": 0, "max_tile_lights": 1,
                      "build_us": 3},
            "counters": {"builds": 1, "lights_dropped": 0, "lights_rejected": 0,
                         "tile_overflow": 0, "index_overflow": 0, "overflowed_builds": 0},
            "capacity": {"max_lights": 256, "max_lights_per_tile": 128,
                         "index_capacity": 568320, "cell_capacity": 40960,
                         "table_width": 640, "table_height": 256},
            "grid": [2, 2],
            "origin": "BottomLeft",
            "tile_counts": [1, 0, 0, 0]
        }"#;
        let snap: LutSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.origin, Some(TileOrigin::BottomLeft));

        let counts = snap.tile_counts.unwrap();
        let heat = screen_rows(heatmap(&counts, 2, 2, 80, 20), TileOrigin::BottomLeft);
        assert_eq!(heat, vec![vec![0, 0], vec![1, 0]], "row 0 drawn last");
        assert_eq!(origin_label(TileOrigin::BottomLeft).trim(), "row 0 at bottom");

        let heat = screen_rows(heatmap(&counts, 2, 2, 80, 20), TileOrigin::TopLeft);
        assert_eq!(heat, vec![vec![1, 0], vec![0, 0]]);
    }

    #[test]
    fn snapshot_parses_without_optional_fields() {
        let json = r#"{
            "elapsed_secs": 1.0,
            "stats": {"lights_submitted": 3, "lights_rejected": 0, "lights_stored": 3,
                      "lights_dropped": 0, "tiles": 80, "tile_light_pairs": 90,
                      "tile_overflow": 0, "index_overflow": 0, "max_tile_lights": 2,
                      "build_us": 41},
            "counters": {"builds": 1, "lights_dropped": 0, "lights_rejected": 0,
                         "tile_overflow": 0, "index_overflow": 0, "overflowed_builds": 0},
            "capacity": {"max_lights": 256, "max_lights_per_tile": 128,
                         "index_capacity": 568320, "cell_capacity": 40960,
                         "table_width": 640, "table_height": 256}
        }"#;
        let snap: LutSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.stats.build_us, 41);
        assert!(snap.grid.is_none() && snap.tile_counts.is_none());
        assert!(snap.logs.is_empty());

        let mut app = App::new();
        app.push_snapshot(snap);
        assert!(app.connected);
        assert_eq!(app.build_history.back(), Some(&41));
    }

    #[test]
    fn paused_app_ignores_snapshots() {
        let mut app = App::new();
        app.paused = true;
        app.push_snapshot(LutSnapshot::default());
        assert!(!app.connected);
        assert!(app.build_history.is_empty());
    }

    #[test]
    fn tab_keys_cycle() {
        let mut app = App::new();
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert!(!handle_key(&mut app, press(KeyCode::Char('2'))));
        assert_eq!(app.active_tab, Tab::Tiles);
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.active_tab, Tab::Logs);
        handle_key(&mut app, press(KeyCode::Char('l')));
        assert_eq!(app.log_filter, LogFilter::Warn);
        assert!(handle_key(&mut app, press(KeyCode::Char('q'))));
    }

    #[test]
    fn usage_bar_is_clamped() {
        assert_eq!(usage_bar(2.0, 4), "\u{2588}".repeat(4));
        assert_eq!(usage_bar(0.0, 3), "\u{2591}".repeat(3));
    }
}
