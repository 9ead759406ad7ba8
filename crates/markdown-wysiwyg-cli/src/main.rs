use anyhow::{Context, Result, bail};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use markdown_wysiwyg_config::Config;
use markdown_wysiwyg_engine::{Document, EditorSession, Selection, render_preview_html};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    env, fs,
    io::stdout,
    path::{Path, PathBuf},
    process,
};

mod view;

enum Mode {
    View(PathBuf),
    Decorations { path: PathBuf, cursor: usize },
    Preview(PathBuf),
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <file.md>");
    eprintln!("       {program} --decorations <file.md> [--cursor <offset>]");
    eprintln!("       {program} --preview <file.md>");
    process::exit(1);
}

fn parse_args(args: &[String]) -> Result<Mode> {
    match args {
        [_, flag, path] if flag == "--preview" => Ok(Mode::Preview(PathBuf::from(path))),
        [_, flag, path] if flag == "--decorations" => Ok(Mode::Decorations {
            path: PathBuf::from(path),
            cursor: 0,
        }),
        [_, flag, path, cursor_flag, cursor] if flag == "--decorations" && cursor_flag == "--cursor" => {
            let cursor = cursor
                .parse()
                .with_context(|| format!("Invalid cursor offset '{cursor}'"))?;
            Ok(Mode::Decorations {
                path: PathBuf::from(path),
                cursor,
            })
        }
        [_, path] if !path.starts_with("--") => Ok(Mode::View(PathBuf::from(path))),
        _ => bail!("unrecognised arguments"),
    }
}

/// Relative paths that do not exist locally are looked up under the configured documents folder.
fn resolve_path(path: PathBuf, config: &Config) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path;
    }
    match &config.documents_path {
        Some(root) => root.join(path),
        None => path,
    }
}

fn load_document(path: &Path) -> Result<Document> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    Document::from_bytes(&bytes).with_context(|| format!("Failed to parse '{}'", path.display()))
}

struct App {
    path: PathBuf,
    document: Document,
    session: EditorSession,
    /// 1-based line holding the caret.
    cursor_line: usize,
    scroll: usize,
}

impl App {
    fn new(path: PathBuf, config: &Config) -> Result<Self> {
        let document = load_document(&path)?;
        let mut session = EditorSession::new(config);
        session.set_document_path(Some(path.clone()));

        let mut app = Self {
            path,
            document,
            session,
            cursor_line: 1,
            scroll: 0,
        };
        app.move_to(1);
        Ok(app)
    }

    fn line_count(&self) -> usize {
        self.document.lines().line_count()
    }

    fn move_to(&mut self, number: usize) {
        let number = number.clamp(1, self.line_count());
        if let Some(line) = self.document.lines().line(number) {
            self.cursor_line = number;
            self.document.set_selection(Selection::caret(line.from));
        }
    }

    fn move_by(&mut self, delta: isize) {
        self.move_to(self.cursor_line.saturating_add_signed(delta));
    }

    /// Keep `row` inside a viewport of `height` rows.
    fn follow(&mut self, row: usize, height: usize) {
        if row < self.scroll {
            self.scroll = row;
        } else if height > 0 && row >= self.scroll + height {
            self.scroll = row + 1 - height;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("markdown-wysiwyg-cli");
    let mode = match parse_args(&args) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {e}");
            usage(program);
        }
    };

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file '{}': {e}", Config::config_path().display());
            process::exit(1);
        }
    };

    match mode {
        Mode::Preview(path) => {
            let path = resolve_path(path, &config);
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            print!("{}", render_preview_html(&text));
            Ok(())
        }
        Mode::Decorations { path, cursor } => {
            let path = resolve_path(path, &config);
            let mut document = load_document(&path)?;
            document.set_selection(Selection::caret(cursor));
            let set = EditorSession::new(&config).build_for(&document);
            log::info!("{} decorations for '{}'", set.len(), path.display());
            print!("{set}");
            Ok(())
        }
        Mode::View(path) => run_viewer(resolve_path(path, &config), &config),
    }
}

fn run_viewer(path: PathBuf, config: &Config) -> Result<()> {
    let mut app = App::new(path, config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.move_by(1),
                KeyCode::Up | KeyCode::Char('k') => app.move_by(-1),
                KeyCode::PageDown => app.move_by(20),
                KeyCode::PageUp => app.move_by(-20),
                KeyCode::Home | KeyCode::Char('g') => app.move_to(1),
                KeyCode::End | KeyCode::Char('G') => app.move_to(app.line_count()),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let text = app.document.text();
    let set = app.session.build_for(&app.document);
    let rendered = view::render_document(&text, app.document.lines(), &set, app.cursor_line);

    // Borders take two rows.
    let height = usize::from(chunks[0].height.saturating_sub(2));
    app.follow(rendered.cursor_row, height);

    let title = app
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| app.path.display().to_string());
    let content = Paragraph::new(rendered.rows)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((u16::try_from(app.scroll).unwrap_or(u16::MAX), 0));
    f.render_widget(content, chunks[0]);

    let help = Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("↑/k ↓/j: Move | "),
        Span::raw("PgUp/PgDn | g/G: Top/Bottom | "),
        Span::styled(
            format!("line {}/{}", app.cursor_line, app.line_count()),
            Style::default().fg(Color::Yellow),
        ),
    ]);
    f.render_widget(Paragraph::new(help), chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // ============ Arguments ============

    #[test]
    fn test_plain_path_opens_viewer() {
        let mode = parse_args(&args(&["cli", "notes.md"])).unwrap();
        assert!(matches!(mode, Mode::View(path) if path == Path::new("notes.md")));
    }

    #[test]
    fn test_decorations_with_cursor() {
        let mode = parse_args(&args(&["cli", "--decorations", "a.md", "--cursor", "12"])).unwrap();
        assert!(matches!(mode, Mode::Decorations { cursor: 12, .. }));
    }

    #[test]
    fn test_bad_cursor_is_rejected() {
        assert!(parse_args(&args(&["cli", "--decorations", "a.md", "--cursor", "x"])).is_err());
        assert!(parse_args(&args(&["cli", "--bogus"])).is_err());
    }

    #[test]
    fn test_missing_relative_path_uses_documents_folder() {
        let config = Config {
            documents_path: Some(PathBuf::from("/srv/docs")),
            ..Config::default()
        };
        assert_eq!(
            resolve_path(PathBuf::from("no-such-file-here.md"), &config),
            PathBuf::from("/srv/docs/no-such-file-here.md")
        );
    }
}
