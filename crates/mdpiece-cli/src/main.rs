use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{info, warn};
use mdpiece_config::{Config, LayoutConfig};
use mdpiece_engine::{
    Document, EditError, Editor, Instruction, IoError, LayoutSettings, MonospaceLayout, Motion,
    Painter, Parser, Point, io, layout::TextStyle, render::Fill,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

fn layout_settings(config: &LayoutConfig) -> LayoutSettings {
    LayoutSettings {
        max_width: config.max_width,
        cell_width: config.cell_width,
        line_height: config.line_height,
        block_spacing: config.block_spacing,
        image_width: config.image_width,
        image_height: config.image_height,
    }
}

struct App {
    path: PathBuf,
    config: Config,
    editor: Editor,
    /// First document row shown in the view.
    scroll: f32,
    /// Editor area from the last draw, for mapping mouse clicks.
    view: Rect,
    dirty: bool,
    confirm_quit: bool,
    status: String,
}

impl App {
    fn new(path: PathBuf, config: Config) -> Result<Self> {
        let (text, status) = match io::read_file(&path) {
            Ok(text) => {
                info!("loaded {}", path.display());
                (text, format!("Opened {}", path.display()))
            }
            Err(IoError::NotFound(_)) => (String::new(), format!("New file {}", path.display())),
            Err(e) => return Err(e.into()),
        };

        let layout = MonospaceLayout::new(layout_settings(&config.layout));
        let document = Document::with_layout(&text, Parser::default(), Box::new(layout));
        let editor = Editor::with_options(
            document,
            config.editor.undo_limit,
            config.editor.auto_pair_brackets,
        );

        Ok(Self {
            path,
            config,
            editor,
            scroll: 0.0,
            view: Rect::default(),
            dirty: false,
            confirm_quit: false,
            status,
        })
    }

    fn save(&mut self) {
        match io::write_file(&self.path, &self.editor.to_markdown()) {
            Ok(()) => {
                info!("saved {}", self.path.display());
                self.dirty = false;
                self.status = format!("Saved {}", self.path.display());
                self.remember_file();
            }
            Err(e) => {
                warn!("save failed: {e}");
                self.status = format!("Error saving file: {e}");
            }
        }
    }

    fn remember_file(&mut self) {
        let path = self.path.canonicalize().unwrap_or_else(|_| self.path.clone());
        if self.config.last_file.as_ref() == Some(&path) {
            return;
        }
        self.config.last_file = Some(path);
        if let Err(e) = self.config.save() {
            warn!("could not update config: {e}");
        }
    }

    fn edit(&mut self, result: Result<(), EditError>) {
        match result {
            Ok(()) => self.dirty = true,
            Err(e) => {
                warn!("edit failed: {e}");
                self.status = format!("Edit failed: {e}");
            }
        }
    }

    fn history(&mut self, result: Result<bool, EditError>, what: &str) {
        match result {
            Ok(true) => self.dirty = true,
            Ok(false) => self.status = format!("Nothing to {what}"),
            Err(e) => {
                warn!("{what} failed: {e}");
                self.status = format!("Could not {what}: {e}");
            }
        }
    }

    /// Handles a key press. Returns false when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let quitting = matches!(key.code, KeyCode::Esc)
            || (ctrl && matches!(key.code, KeyCode::Char('q')));
        if quitting {
            if !self.dirty || self.confirm_quit {
                return false;
            }
            self.confirm_quit = true;
            self.status = "Unsaved changes: press again to quit, Ctrl-S to save".to_string();
            return true;
        }
        self.confirm_quit = false;

        match key.code {
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Char('z') if ctrl => {
                let result = self.editor.undo();
                self.history(result, "undo");
            }
            KeyCode::Char('y') if ctrl => {
                let result = self.editor.redo();
                self.history(result, "redo");
            }
            KeyCode::Home if ctrl => self.editor.move_cursor(Motion::DocumentStart),
            KeyCode::End if ctrl => self.editor.move_cursor(Motion::DocumentEnd),
            KeyCode::Home => self.editor.move_cursor(Motion::LineStart),
            KeyCode::End => self.editor.move_cursor(Motion::LineEnd),
            KeyCode::Left => self.editor.move_cursor(Motion::Left),
            KeyCode::Right => self.editor.move_cursor(Motion::Right),
            KeyCode::Up => self.editor.move_cursor(Motion::Up),
            KeyCode::Down => self.editor.move_cursor(Motion::Down),
            KeyCode::Enter => {
                let result = self.editor.insert_line_break();
                self.edit(result);
            }
            KeyCode::Backspace => {
                let result = self.editor.remove_text();
                self.edit(result);
            }
            KeyCode::Char(c) if !ctrl => {
                let result = self.editor.insert_text(c.encode_utf8(&mut [0; 4]));
                self.edit(result);
            }
            _ => {}
        }
        true
    }

    fn click(&mut self, column: u16, row: u16) {
        let inside = column >= self.view.x
            && row >= self.view.y
            && column < self.view.right()
            && row < self.view.bottom();
        if inside {
            let x = f32::from(column - self.view.x);
            let y = f32::from(row - self.view.y) + self.scroll;
            self.editor.click(Point::new(x, y));
        }
    }

    /// Scrolls so the caret is inside a view `height` rows tall.
    fn follow_cursor(&mut self, height: f32) {
        let Some((at, caret)) = self.editor.cursor().position(self.editor.document()) else {
            return;
        };
        if at.y < self.scroll {
            self.scroll = at.y;
        } else if at.y + caret > self.scroll + height {
            self.scroll = at.y + caret - height;
        }
    }
}

/// Draws engine paint instructions into a ratatui buffer. Document units are
/// terminal cells; rows above `scroll` are skipped.
struct TerminalPainter<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    scroll: f32,
}

impl TerminalPainter<'_> {
    /// Terminal cell for a document point, if it is visible.
    fn cell(&self, at: Point) -> Option<(u16, u16)> {
        let row = at.y - self.scroll;
        if at.x < 0.0 || row < 0.0 {
            return None;
        }
        let (x, y) = (at.x as u16, row as u16);
        (x < self.area.width && y < self.area.height).then(|| (self.area.x + x, self.area.y + y))
    }

    fn put(&mut self, at: Point, text: &str, style: Style) {
        if let Some((x, y)) = self.cell(at) {
            let room = usize::from(self.area.right() - x);
            self.buf.set_stringn(x, y, text, room, style);
        }
    }

    fn fill(&mut self, at: Point, width: f32, height: f32, symbol: Option<&str>, style: Style) {
        let rows = height.ceil().max(1.0) as usize;
        let cols = width.ceil().max(1.0) as usize;
        for row in 0..rows {
            for col in 0..cols {
                let point = Point::new(at.x + col as f32, at.y + row as f32);
                if let Some((x, y)) = self.cell(point) {
                    let cell = &mut self.buf[(x, y)];
                    cell.set_style(style);
                    if let Some(symbol) = symbol {
                        cell.set_symbol(symbol);
                    }
                }
            }
        }
    }
}

fn text_style(style: &TextStyle) -> Style {
    let mut out = Style::default();
    if style.bold || style.heading.is_some() {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.italic {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.strikeout {
        out = out.add_modifier(Modifier::CROSSED_OUT);
    }
    if style.link {
        out = out.fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
    }
    if style.code {
        out = out.fg(Color::Green);
    }
    if style.heading.is_some() {
        out = out.fg(Color::Cyan);
    }
    out
}

impl Painter for TerminalPainter<'_> {
    fn execute(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::DrawText { at, text, style } => self.put(*at, text, text_style(style)),
            Instruction::DrawImage { at, width, src, .. } => {
                let label = format!("[{src}]");
                let room = (*width as usize).max(1);
                let label: String = label.chars().take(room).collect();
                self.put(*at, &label, Style::default().fg(Color::Magenta));
            }
            Instruction::FillRect {
                at,
                width,
                height,
                fill,
            } => match fill {
                Fill::CodeBackground => {
                    self.fill(*at, *width, *height, None, Style::default().bg(Color::Black))
                }
                Fill::LatexBackground => self.fill(
                    *at,
                    *width,
                    *height,
                    None,
                    Style::default().bg(Color::Rgb(40, 30, 10)),
                ),
                Fill::QuoteBar => {
                    self.fill(*at, 1.0, *height, Some("▎"), Style::default().fg(Color::Gray))
                }
                Fill::Rule => {
                    self.fill(*at, *width, 1.0, Some("─"), Style::default().fg(Color::Gray))
                }
            },
            Instruction::DrawLatex { at, source, .. } => {
                let style = Style::default().fg(Color::Yellow);
                for (i, line) in source.lines().enumerate() {
                    self.put(Point::new(at.x, at.y + i as f32), line, style);
                }
            }
        }
    }
}

struct DocumentView<'a> {
    instructions: &'a [Instruction],
    scroll: f32,
}

impl Widget for DocumentView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut painter = TerminalPainter {
            buf,
            area,
            scroll: self.scroll,
        };
        painter.execute_all(self.instructions);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let path = match args.len() {
        2 => PathBuf::from(&args[1]),
        1 => match &config.last_file {
            Some(path) => path.clone(),
            None => {
                eprintln!("Error: No file given and no last_file in config");
                eprintln!("Usage: {} <file.md>", args[0]);
                eprintln!("Or set last_file in {}", config_path.display());
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage: {} [file.md]", args[0]);
            process::exit(1);
        }
    };

    let mut app = match App::new(path, config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if !app.handle_key(key) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                app.click(mouse.column, mouse.row);
            }
            _ => {}
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let title = format!(
        "{}{}",
        app.path.display(),
        if app.dirty { " [+]" } else { "" }
    );
    let frame = Block::default().borders(Borders::ALL).title(title);
    let view = frame.inner(chunks[0]);
    f.render_widget(frame, chunks[0]);

    app.view = view;
    app.follow_cursor(f32::from(view.height));

    let instructions = app.editor.document().paint();
    f.render_widget(
        DocumentView {
            instructions: &instructions,
            scroll: app.scroll,
        },
        view,
    );

    if let Some((at, _)) = app.editor.cursor().position(app.editor.document()) {
        let row = at.y - app.scroll;
        if row >= 0.0 && row < f32::from(view.height) && at.x < f32::from(view.width) {
            f.set_cursor_position((view.x + at.x as u16, view.y + row as u16));
        }
    }

    let help = Line::from(vec![
        Span::styled(app.status.clone(), Style::default().fg(Color::Yellow)),
        Span::raw("  Ctrl-S: Save | Ctrl-Z/Y: Undo/Redo | Esc: Quit"),
    ]);
    f.render_widget(Paragraph::new(help), chunks[1]);
}
