// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use grapher::{
    eval::{Binding, EvalErr, EvalErrKind},
    parse::{ParseErr, ParseErrKind},
    render::{sample_x, Surface},
    shell::{self, Command},
    stdlib,
    store::ExpressionStore,
    sync::{FragmentStore, SyncController, TextInput},
    Number, Point, SurfaceSize, SAMPLE_COUNT,
};
use log::{info, warn};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::{
    fs,
    io::{stdout, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
    thread,
    time::Duration,
};

/// The terminal stand-in for the page's location fragment.
const FRAGMENT_PATH: &str = "grapher.fragment";

const SURFACE_SIZE: SurfaceSize = SurfaceSize {
    width: 72,
    height: 24,
};

/// Pacing for `play`; the shell is the frame scheduler here.
const FRAME_DELAY: Duration = Duration::from_millis(33);

const DEFAULT_PLAY_FRAMES: u32 = 60;

/// Segments whose endpoints land absurdly far outside the surface are not
/// worth rasterizing cell by cell.
const MAX_DRAW_COORD: Number = 1e6;

fn output_data_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_curve-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "data"
    )
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

/// Fragment store backed by a small file, so the current expression
/// survives across runs the way a URL fragment survives bookmarking.
struct FileFragment {
    path: PathBuf,
}

impl FragmentStore for FileFragment {
    fn get(&self) -> Option<String> {
        fs::read_to_string(&self.path)
            .ok()
            .map(|text| text.trim_end().to_string())
    }

    fn set(&mut self, value: &str) {
        // fragment writes are assumed to succeed; a failure only costs the
        // bookmark, not the session
        if let Err(err) = fs::write(&self.path, value) {
            warn!(
                "failed to write fragment file {path}: {err}",
                path = self.path.display()
            );
        }
    }
}

/// Line-input stand-in for the page's text field: holds the last text the
/// user typed, and receives programmatic writes on navigation.
#[derive(Default)]
struct PromptInput {
    text: String,
}

impl PromptInput {
    fn edit(&mut self, text: String) {
        self.text = text;
    }
}

impl TextInput for PromptInput {
    fn value(&self) -> String {
        self.text.clone()
    }

    fn set_value(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

/// Character-cell drawing surface. Stroking rasterizes each polyline
/// segment with Bresenham; segments with a non-finite endpoint simply
/// leave no cells behind, matching what a real canvas does with them.
struct TermSurface {
    size: SurfaceSize,
    cells: Vec<u8>,
}

impl TermSurface {
    fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            cells: vec![b' '; size.width as usize * size.height as usize],
        }
    }

    fn plot(&mut self, x: i64, y: i64) {
        if (0..i64::from(self.size.width)).contains(&x)
            && (0..i64::from(self.size.height)).contains(&y)
        {
            self.cells[y as usize * self.size.width as usize + x as usize] = b'*';
        }
    }

    fn segment(&mut self, a: Point<Number>, b: Point<Number>) {
        let drawable = |p: Point<Number>| {
            p.x.is_finite() && p.y.is_finite() && p.x.abs() < MAX_DRAW_COORD && p.y.abs() < MAX_DRAW_COORD
        };
        if !drawable(a) || !drawable(b) {
            return;
        }

        let (mut x0, mut y0) = (a.x.round() as i64, a.y.round() as i64);
        let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.plot(x0, y0);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn present<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        let width = self.size.width as usize;
        writeln!(out, "+{}+", "-".repeat(width))?;
        for row in self.cells.chunks(width) {
            out.write_all(b"|")?;
            out.write_all(row)?;
            out.write_all(b"|\n")?;
        }
        writeln!(out, "+{}+", "-".repeat(width))?;
        Ok(())
    }

    /// Rows printed by `present`, for rewinding the cursor between frames.
    fn presented_rows(&self) -> u32 {
        self.size.height + 2
    }
}

impl Surface for TermSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn clear(&mut self) {
        self.cells.fill(b' ');
    }

    fn stroke(&mut self, path: &[Point<Number>]) {
        for pair in path.windows(2) {
            self.segment(pair[0], pair[1]);
        }
    }
}

fn try_main() -> anyhow::Result<()> {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("failed to initialize logging")?;

    let mut fragment = FileFragment {
        path: PathBuf::from(FRAGMENT_PATH),
    };
    let mut input = PromptInput::default();
    let mut surface = TermSurface::new(SURFACE_SIZE);
    let mut controller = SyncController::new();

    controller.startup(&mut fragment, &mut input, &mut surface);
    info!("expression restored: {}", controller.expression());

    let mut stdout = BufWriter::new(stdout());
    surface.present(&mut stdout)?;

    loop {
        writeln!(stdout, "f(x, t) = {}", controller.expression())?;

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::SetExpr => {
                    set_expr(&mut stdout, &mut controller, &mut input, &mut fragment)?
                }

                Command::Reload => reload(&mut stdout, &mut controller, &fragment, &mut input)?,

                Command::Frame => {
                    controller.tick(&mut surface);
                    surface.present(&mut stdout)?;
                    report_probe(&mut stdout, &mut controller)?;
                }

                Command::Play => play(&mut stdout, &mut controller, &mut surface)?,

                Command::Show => {
                    writeln!(stdout, "f(x, t) = {}", controller.expression())?;
                    writeln!(stdout, "t = {}", controller.clock())?;
                    writeln!(stdout, "window = {:#}", controller.window())?;
                }

                Command::Export => export(&mut stdout, &mut controller)?,

                Command::PrintProg => {
                    shell::dump_program(
                        &mut stdout,
                        controller.store().program(),
                        format_args!("program"),
                    )?;
                }
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn set_expr<W: Write>(
    mut out: W,
    controller: &mut SyncController,
    input: &mut PromptInput,
    fragment: &mut FileFragment,
) -> anyhow::Result<()> {
    let text = shell::input(&mut out, "f(x, t) = ")?;
    if text.is_empty() {
        return Ok(());
    }

    input.edit(text);
    match controller.text_edited(input, fragment) {
        Ok(()) => {
            info!("expression set: {}", controller.expression());
            report_probe(&mut out, controller)?;
        }
        Err(err) => report_parse_err(&mut out, &err)?,
    }
    Ok(())
}

fn reload<W: Write>(
    mut out: W,
    controller: &mut SyncController,
    fragment: &FileFragment,
    input: &mut PromptInput,
) -> anyhow::Result<()> {
    match controller.fragment_changed(fragment, input) {
        Ok(()) => {
            info!("expression reloaded: {}", controller.expression());
        }
        Err(err) => report_parse_err(&mut out, &err)?,
    }
    Ok(())
}

fn play<W: Write>(
    mut out: W,
    controller: &mut SyncController,
    surface: &mut TermSurface,
) -> anyhow::Result<()> {
    let frames = match shell::read_fromstr::<_, u32>(
        &mut out,
        format_args!("?frames (default {DEFAULT_PLAY_FRAMES}) = "),
        true,
    )? {
        Ok(Some(frames)) => frames,
        Ok(None) => DEFAULT_PLAY_FRAMES,
        Err(_) => return Ok(()),
    };

    for frame in 0..frames {
        controller.tick(surface);
        if frame > 0 {
            // rewind over the previous frame so the curve animates in place
            write!(out, "\x1b[{}A", surface.presented_rows())?;
        }
        surface.present(&mut out)?;
        out.flush()?;
        thread::sleep(FRAME_DELAY);
    }
    report_probe(&mut out, controller)?;
    Ok(())
}

fn export<W: Write>(mut out: W, controller: &mut SyncController) -> anyhow::Result<()> {
    let path = output_data_filename(Local::now());
    let mut data = BufWriter::new(
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .context("failed to open output data file")?,
    );

    let clock = controller.clock();
    let window = controller.window().clone();
    for i in 0..SAMPLE_COUNT {
        let x = sample_x(i, &window);
        let y = controller
            .store_mut()
            .evaluate(x, clock)
            .unwrap_or(Number::NAN);
        writeln!(data, "{x} {y}").context("failed to write to output data file")?;
    }
    data.flush()?;

    info!("wrote {path}");
    writeln!(out, "wrote {SAMPLE_COUNT} samples to {path}")?;
    Ok(())
}

/// Evaluates once at the window's center x so expression problems that
/// only show up at evaluation (undefined names, misused functions) get a
/// diagnostic instead of a silently empty curve.
fn report_probe<W: Write>(mut out: W, controller: &mut SyncController) -> anyhow::Result<()> {
    let window = controller.window();
    let x = (window.x.start + window.x.end) / 2.0;
    let clock = controller.clock();
    if let Err(err) = controller.store_mut().evaluate(x, clock) {
        report_eval_err(&mut out, controller.store(), &err)?;
    }
    Ok(())
}

fn report_parse_err<W: Write>(mut out: W, err: &ParseErr) -> anyhow::Result<()> {
    writeln!(out)?;
    shell::underline(&mut out, &err.span)?;
    writeln!(out, "parse error: {err}")?;
    match err.kind {
        ParseErrKind::Lex => {
            writeln!(
                out,
                "note: available tokens are numbers, alphabetic identifiers, and symbols +-*/^,()"
            )?;
        }
        ParseErrKind::ParseNum(_) => {
            writeln!(out, "note: parsing as floating point number")?;
        }
        ParseErrKind::TrailingOperands { .. } => {
            writeln!(
                out,
                "note: implicit multiplication is not supported, so for example '5x' would be '5*x'"
            )?;
        }
        ParseErrKind::ParenMismatch
        | ParseErrKind::Empty
        | ParseErrKind::MissingOperands { .. } => {}
    }
    Ok(())
}

fn report_eval_err<W: Write>(
    mut out: W,
    store: &ExpressionStore,
    err: &EvalErr,
) -> anyhow::Result<()> {
    writeln!(out)?;
    match &err.span {
        Some(span) => shell::underline(&mut out, span)?,
        None => {
            let text = Arc::new(store.text().to_string());
            let len = text.len();
            shell::underline(&mut out, &grapher::lex::Span::new(text, len, 1))?;
        }
    }
    writeln!(out, "evaluation error: {err}")?;

    if let EvalErrKind::UndefinedIdent { name } = &err.kind {
        suggest_similar(&mut out, store, name)?;
    }
    Ok(())
}

fn suggest_similar<W: Write>(
    mut out: W,
    store: &ExpressionStore,
    name: &str,
) -> anyhow::Result<()> {
    let known = store
        .bindings()
        .iter()
        .map(|(key, binding)| {
            let kind = match binding {
                Binding::Const(_) => "constant",
                Binding::Fun(_) => "function",
            };
            (*key, kind)
        })
        .chain([(stdlib::X, "variable"), (stdlib::T, "variable")]);

    let needle = name.to_ascii_lowercase();
    let most_similar = known
        .map(|(key, kind)| {
            (
                strsim::normalized_damerau_levenshtein(&needle, &key.to_ascii_lowercase()),
                (key, kind),
            )
        })
        .reduce(|acc, elem| if elem.0 > acc.0 { elem } else { acc });

    if let Some((sim, (key, kind))) = most_similar {
        if sim > 0.3 {
            writeln!(out, "note: {kind} '{key}' has a similar name")?;
        }
    }
    Ok(())
}
