// SPDX-License-Identifier: GPL-3.0-only

//! Terminal scanning session
//!
//! Renders the camera feed with Unicode half-block characters next to the
//! page gallery. Notices from the session show up in the bottom line.

use crate::app::{Message, Notice, NoticeLevel, SessionModel, SessionRuntime};
use crate::backends::camera::types::CameraFrame;
use crate::config::Config;
use crate::constants::timing;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Widget},
};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Width of the gallery column
const GALLERY_WIDTH: u16 = 36;

/// Run the terminal scanning session
///
/// `config_path` is where camera and filter choices are remembered.
pub fn run(config: Config, config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let mut session = SessionRuntime::from_config(&config, rt.handle().clone())?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut session, config, config_path);

    // Release the camera before leaving
    session.dispatch(Message::StopCamera);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Terminal-side state that is not part of the session
struct ViewState {
    show_help: bool,
    selected_page: usize,
    notice: Option<Notice>,
    last_frame_at: Option<Instant>,
    mirror: bool,
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut SessionRuntime,
    mut config: Config,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    session.dispatch(Message::Init);

    let mut view = ViewState {
        show_help: false,
        selected_page: 0,
        notice: None,
        last_frame_at: None,
        mirror: config.mirror_preview,
    };
    let mut frame_widget = FrameWidget::new(view.mirror);

    loop {
        session.drain();

        // Feed new preview frames to the black-frame monitor
        let frame = session.model().latest_frame();
        if let Some(frame) = &frame
            && view.last_frame_at != Some(frame.captured_at)
        {
            view.last_frame_at = Some(frame.captured_at);
            session.dispatch(Message::PreviewFrame {
                mean_luma: frame.mean_luma(),
            });
        }
        frame_widget.frame = frame;
        frame_widget.flash = session.model().is_flashing();
        if session.model().capture_flash.is_some() && !frame_widget.flash {
            session.dispatch(Message::ClearCaptureFlash);
        }

        if let Some(notice) = session.model_mut().take_notices().pop() {
            view.notice = Some(notice);
        }
        if view
            .notice
            .as_ref()
            .is_some_and(|n| n.at.elapsed() > timing::NOTICE_DISPLAY)
        {
            view.notice = None;
        }

        let page_count = session.model().gallery().page_count();
        view.selected_page = view.selected_page.min(page_count.saturating_sub(1));

        remember_choices(session.model(), &mut config, config_path.as_deref());

        terminal.draw(|f| {
            let area = f.area();
            let [main, status, notice] = Layout::vertical([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);
            let [camera_area, gallery_area] =
                Layout::horizontal([Constraint::Min(10), Constraint::Length(GALLERY_WIDTH)])
                    .areas(main);

            f.render_widget(&frame_widget, camera_area);

            let (list, mut state) = gallery_list(session.model(), view.selected_page);
            f.render_stateful_widget(list, gallery_area, &mut state);

            let status_message = build_status_message(session.model());
            f.render_widget(
                StatusBar {
                    message: &status_message,
                    style: Style::default().fg(Color::White).bg(Color::DarkGray),
                },
                status,
            );

            let (message, style) = if view.show_help {
                (build_help_message(), Style::default().fg(Color::White))
            } else if let Some(n) = &view.notice {
                (n.message.clone(), notice_style(n.level))
            } else {
                (String::new(), Style::default())
            };
            f.render_widget(
                StatusBar {
                    message: &message,
                    style,
                },
                notice,
            );
        })?;

        // Handle input with timeout for frame updates
        if event::poll(timing::TERMINAL_POLL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if handle_key(key, session, &mut view) {
                break;
            }
        }
    }

    Ok(())
}

/// Apply a key press; true when the user asked to quit
fn handle_key(key: KeyEvent, session: &mut SessionRuntime, view: &mut ViewState) -> bool {
    // Ctrl+C to quit
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char(' ') | KeyCode::Char('p') => session.dispatch(Message::Capture),
        KeyCode::Char('s') => session.dispatch(Message::FlipCamera),
        KeyCode::Char('f') => session.dispatch(Message::CycleFilter),
        KeyCode::Char('r') => session.dispatch(Message::RefreshDevices),
        KeyCode::Char('c') => session.dispatch(Message::Compile),
        KeyCode::Char('h') => view.show_help = !view.show_help,
        KeyCode::Char(digit @ '1'..='9') => {
            let index = digit as usize - '1' as usize;
            let id = session.model().devices().get(index).map(|d| d.id.clone());
            match id {
                Some(id) => session.dispatch(Message::SelectDevice(id)),
                None => info!(index, "No camera at this position"),
            }
        }
        KeyCode::Up => view.selected_page = view.selected_page.saturating_sub(1),
        KeyCode::Down => view.selected_page += 1,
        KeyCode::Char('d') | KeyCode::Delete => {
            let filename = session
                .model()
                .gallery()
                .get(view.selected_page)
                .map(|p| p.filename.clone());
            if let Some(filename) = filename {
                session.dispatch(Message::RemovePage(filename));
            }
        }
        _ => {}
    }
    false
}

/// Persist the active camera and filter when they change
fn remember_choices(model: &SessionModel, config: &mut Config, path: Option<&std::path::Path>) {
    let active = model.active_device().map(|d| d.id.clone());
    let changed_camera = active.is_some() && active != config.last_camera_id;
    let changed_filter = model.filter() != config.scan_filter;
    if !changed_camera && !changed_filter {
        return;
    }

    if changed_camera {
        config.last_camera_id = active;
    }
    config.scan_filter = model.filter();

    if let Some(path) = path
        && let Err(e) = config.save(path)
    {
        warn!(error = %e, "Failed to save config");
    }
}

fn gallery_list(model: &SessionModel, selected: usize) -> (List<'static>, ListState) {
    let items: Vec<ListItem> = model
        .gallery()
        .pages()
        .enumerate()
        .map(|(i, page)| {
            let marker = if page.detected { ' ' } else { '?' };
            ListItem::new(format!("{:>2} {} {}", i + 1, marker, page.filename))
        })
        .collect();

    let controls = model.controls();
    let title = if controls.compile_busy {
        " Pages (compiling...) ".to_string()
    } else {
        format!(" Pages ({}) ", controls.page_count)
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::LEFT).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    if !controls.empty {
        state.select(Some(selected));
    }
    (list, state)
}

fn build_status_message(model: &SessionModel) -> String {
    let camera = model
        .active_device()
        .map(|d| d.label.as_str())
        .unwrap_or("no camera");
    let controls = model.controls();

    let mut msg = format!("{} | {}", camera, model.filter());
    if controls.capture_busy {
        msg.push_str(" | processing...");
    }
    msg.push_str(" | 'space' capture");
    if model.devices().len() > 1 {
        msg.push_str(" | 's' switch camera");
    }
    if controls.compile_enabled {
        msg.push_str(" | 'c' compile");
    }
    msg.push_str(" | 'h' help | 'q' quit");
    msg
}

fn build_help_message() -> String {
    String::from(
        "space/p: Capture | s: Switch | 1-9: Camera | r: Rescan | f: Filter | ↑/↓: Page | d: Remove | c: Compile | q: Quit",
    )
}

fn notice_style(level: NoticeLevel) -> Style {
    let bg = match level {
        NoticeLevel::Info => Color::DarkGray,
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Warning => Color::Yellow,
        NoticeLevel::Error => Color::Red,
    };
    Style::default().fg(Color::Black).bg(bg)
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    frame: Option<CameraFrame>,
    mirror: bool,
    flash: bool,
}

impl FrameWidget {
    fn new(mirror: bool) -> Self {
        Self {
            frame: None,
            mirror,
            flash: false,
        }
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.flash {
            for y in area.y..area.y + area.height {
                for x in area.x..area.x + area.width {
                    if let Some(cell) = buf.cell_mut((x, y)) {
                        cell.set_char(' ');
                        cell.set_bg(Color::White);
                    }
                }
            }
            return;
        }

        let Some(frame) = &self.frame else {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };
        if frame.width == 0 || frame.height == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                let src_tx = if self.mirror {
                    display_width - 1 - tx
                } else {
                    tx
                };
                let src_x = (src_tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.pixel_rgb(src_x, src_y_top);
                let top_color = Color::Rgb(r, g, b);
                let (r, g, b) = frame.pixel_rgb(src_x, src_y_bottom);
                let bottom_color = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top_color);
                    cell.set_bg(bottom_color);
                }
            }
        }
    }
}

/// Single-line bar widget
struct StatusBar<'a> {
    message: &'a str,
    style: Style,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_style(self.style);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(area.x, area.y, text, self.style);
    }
}
