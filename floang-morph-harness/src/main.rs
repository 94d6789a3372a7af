use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Paragraph};
use tracing_subscriber::EnvFilter;

use floang_morph::debug::ThresholdOverrides;
use floang_morph::golden::GoldenDiff;
use floang_morph::{
    Anomaly, Debugger, GoldenRegistry, LabConfig, MorphAnimation, MorphComparison, MorphParams, Shape,
};

const SAMPLES_PER_EDGE: usize = 48;
const FRAME_EXPORT: &str = "floang-frames.json";
const COMPARISON_SVG: &str = "floang-snapshots.svg";

#[derive(Parser)]
#[command(name = "floang-morph-harness", about = "Interactive lab for n → n+1 polygon morphs")]
struct Cli {
    /// JSON lab config (canvas, params, thresholds, tolerance)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file; the terminal belongs to the UI
    #[arg(long, default_value = "floang-morph.log")]
    log: PathBuf,

    /// Golden snapshot store, loaded at startup and written on capture
    #[arg(long, default_value = "floang-golden.json")]
    golden: PathBuf,

    /// Pause capture as soon as an anomaly is detected
    #[arg(long)]
    auto_detect: bool,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = match &cli.config {
        Some(path) => LabConfig::load(path).map_err(io::Error::other)?,
        None => LabConfig::default(),
    };

    let mut lab = Lab::new(config, &cli);

    enable_raw_mode()?;
    crossterm::execute!(io::stdout(), EnterAlternateScreen)?;

    let result = run(&mut lab);

    disable_raw_mode()?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen)?;

    result
}

fn init_logging(cli: &Cli) -> io::Result<()> {
    let file = File::create(&cli.log)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

/// Lab state. `clock` is virtual milliseconds and only advances while the
/// debugger is not paused, so a paused morph resumes where it stopped.
struct Lab {
    config: LabConfig,
    shape: Shape,
    morph: MorphAnimation,
    debugger: Debugger,
    comparison: MorphComparison,
    golden: GoldenRegistry,
    golden_path: PathBuf,
    clock: f64,
    auto_detect: bool,
    diff: Option<GoldenDiff>,
    status: String,
}

impl Lab {
    fn new(config: LabConfig, cli: &Cli) -> Self {
        let mut debugger = Debugger::with_thresholds(config.thresholds);
        debugger.enable();
        debugger.on_frame_captured(log_frame);
        debugger.on_anomaly_detected(log_anomalies);
        if cli.auto_detect {
            debugger.enable_auto_detect(ThresholdOverrides::default());
        }

        let mut golden = GoldenRegistry::new();
        let status = match golden.load_from(&cli.golden) {
            Ok(count) => format!("loaded {count} golden snapshot(s)"),
            Err(err) => {
                tracing::debug!(%err, "no golden snapshots loaded");
                String::from("ready")
            }
        };

        Self {
            shape: config.params.rest_shape(&config.canvas),
            config,
            morph: MorphAnimation::new(),
            debugger,
            comparison: MorphComparison::default(),
            golden,
            golden_path: cli.golden.clone(),
            clock: 0.0,
            auto_detect: cli.auto_detect,
            diff: None,
            status,
        }
    }

    fn params(&self) -> MorphParams {
        MorphParams {
            sides: self.shape.len(),
            ..self.config.params
        }
    }

    fn golden_name(&self) -> String {
        format!("{}-gon", self.shape.len())
    }

    fn tick(&mut self, elapsed: Duration) {
        if self.debugger.is_paused() || !self.morph.is_active() {
            return;
        }

        self.clock += elapsed.as_secs_f64() * 1000.0;

        let Some(shape) = self.morph.update(self.clock) else {
            return;
        };

        let params = *self.morph.params();
        let progress = self.morph.progress();
        let anomalies = self
            .debugger
            .capture_frame(&shape, &params, progress, self.clock)
            .map_or(0, |f| f.anomalies.len());

        if self.comparison.observe(&shape, &params, progress) {
            if let Err(err) = self.comparison.write_svg(COMPARISON_SVG) {
                tracing::warn!(%err, "comparison sheet not written");
            }
        }

        if anomalies > 0 && self.debugger.is_paused() {
            self.status = format!("paused: {anomalies} anomal(y/ies) at {:.0}%", progress * 100.0);
        }

        self.shape = shape;

        if !self.morph.is_active() {
            let frames = self.debugger.stop_capture().len();
            self.status = format!("morph complete, {frames} frame(s) captured, sheet in {COMPARISON_SVG}");
        }
    }

    fn start_morph(&mut self) {
        let params = self.params();
        let to = params.target_shape(&self.config.canvas);

        match self.morph.start(&self.shape, to, params, self.clock) {
            Ok(()) => {
                self.comparison.begin(&self.shape, &params);
                if self.debugger.is_enabled() {
                    self.debugger.start_capture();
                }
                self.diff = None;
                self.status = format!("morphing {} → {}", params.sides, params.sides + 1);
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn toggle_pause(&mut self) {
        if self.debugger.is_paused() {
            self.debugger.resume();
            self.status = String::from("resumed");
        } else {
            self.debugger.pause();
            self.status = String::from("paused");
        }
    }

    fn show_frame(&mut self, step: fn(&mut Debugger) -> Option<&floang_morph::Frame>) {
        if !self.debugger.is_paused() {
            self.status = String::from("pause first to step frames");
            return;
        }

        let Some(frame) = step(&mut self.debugger) else {
            return;
        };

        self.status = format!("frame {} at {:.1}%", frame.index, frame.progress * 100.0);
        self.shape = frame.to_shape();
    }

    fn toggle_debug(&mut self) {
        if self.debugger.is_enabled() {
            self.debugger.stop_capture();
            self.debugger.resume();
            self.debugger.disable();
            self.status = String::from("debugger off");
        } else {
            self.debugger.enable();
            if self.auto_detect {
                self.debugger.enable_auto_detect(ThresholdOverrides::default());
            }
            self.status = String::from("debugger on, capture starts with the next morph");
        }
    }

    fn write_comparison(&mut self) {
        self.status = match self.comparison.write_svg(COMPARISON_SVG) {
            Ok(()) => format!("wrote {COMPARISON_SVG}"),
            Err(err) => format!("comparison failed: {err}"),
        };
    }

    /// Anomalies of the frame on screen, only while paused.
    fn highlighted(&self) -> &[Anomaly] {
        if !self.debugger.is_paused() {
            return &[];
        }

        self.debugger.current_frame().map(|f| f.anomalies.as_slice()).unwrap_or_default()
    }

    fn reset(&mut self) {
        self.morph.cancel();
        self.debugger.stop_capture();
        self.debugger.resume();
        self.shape = self.config.params.rest_shape(&self.config.canvas);
        self.diff = None;
        self.status = String::from("reset");
    }

    fn capture_golden(&mut self) {
        let name = self.golden_name();
        let params = self.params();
        self.golden.capture(name.as_str(), &self.shape, &params);

        self.status = match self.golden.save_to(&self.golden_path) {
            Ok(()) => format!("captured golden '{name}'"),
            Err(err) => format!("captured '{name}' but not saved: {err}"),
        };
    }

    fn compare_golden(&mut self) {
        let name = self.golden_name();
        self.diff = self.golden.compare(&name, &self.shape, &self.config.tolerance);

        self.status = match &self.diff {
            Some(diff) if diff.within_tolerance => format!("'{name}' within tolerance"),
            Some(_) => format!("'{name}' outside tolerance"),
            None => format!("no golden '{name}'"),
        };
    }

    fn export_frames(&mut self) {
        self.status = match self.debugger.write_export(FRAME_EXPORT) {
            Ok(()) => format!("exported {} frame(s) to {FRAME_EXPORT}", self.debugger.frames().len()),
            Err(err) => format!("export failed: {err}"),
        };
    }
}

fn log_frame(frame: &floang_morph::Frame) {
    tracing::trace!(
        frame = frame.index,
        progress = frame.progress,
        symmetry = frame.metrics.symmetry,
        "frame"
    );
}

fn log_anomalies(frame: &floang_morph::Frame, anomalies: &[Anomaly]) {
    for anomaly in anomalies {
        tracing::warn!(frame = frame.index, kind = ?anomaly.kind, delta = anomaly.delta, "{}", anomaly.message);
    }
}

fn run(lab: &mut Lab) -> io::Result<()> {
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    let mut last = Instant::now();

    loop {
        let now = Instant::now();
        lab.tick(now - last);
        last = now;

        terminal.draw(|f| draw(f, lab))?;

        if !event::poll(Duration::from_millis(16))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('m') | KeyCode::Enter => lab.start_morph(),
                KeyCode::Char(' ') => lab.toggle_pause(),
                KeyCode::Right => lab.show_frame(Debugger::step_forward),
                KeyCode::Left => lab.show_frame(Debugger::step_backward),
                KeyCode::Home => lab.show_frame(Debugger::rewind),
                KeyCode::Char('r') => lab.reset(),
                KeyCode::Char('g') => lab.capture_golden(),
                KeyCode::Char('c') => lab.compare_golden(),
                KeyCode::Char('e') => lab.export_frames(),
                KeyCode::Char('s') => lab.write_comparison(),
                KeyCode::Char('d') => lab.toggle_debug(),
                _ => {}
            }
        }
    }

    Ok(())
}

fn header(f: &mut Frame, area: Rect) {
    f.render_widget(
        Paragraph::new(
            "floang  [m morph]  [space pause]  [←/→ step]  [home rewind]  [r reset]  [g golden]  [c compare]  [e export]  [s sheet]  [d debug]  [q quit]",
        )
        .style(Style::new().fg(Color::DarkGray)),
        area,
    );
}

fn split_main(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .split(area)
}

fn draw(f: &mut Frame, lab: &Lab) {
    let chunks = split_main(f.area());
    header(f, chunks[0]);

    let cols = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(36),
    ])
    .split(chunks[1]);

    draw_shape(f, cols[0], lab);
    draw_panel(f, cols[1], lab);

    f.render_widget(
        Paragraph::new(lab.status.as_str()).style(Style::new().fg(Color::Yellow)),
        chunks[2],
    );
}

fn draw_shape(f: &mut Frame, area: Rect, lab: &Lab) {
    let canvas = lab.config.canvas;
    let flip = |y: f64| canvas.height - y;
    let shape = &lab.shape;
    let color = if lab.debugger.is_paused() { Color::Rgb(255, 160, 80) } else { Color::Rgb(80, 200, 255) };
    let alert = Color::Rgb(255, 60, 60);

    let flagged = lab.highlighted();
    let flagged_edge = |i: usize| flagged.iter().any(|a| a.edge_index == Some(i));
    let flagged_anchor = |i: usize| flagged.iter().any(|a| a.anchor_index == Some(i));

    let (mut bad, mut good) = (Vec::new(), Vec::new());
    for (i, anchor) in shape.anchors.iter().enumerate() {
        let point = (anchor.position.x, flip(anchor.position.y));
        if flagged_anchor(i) { bad.push(point) } else { good.push(point) }
    }

    let widget = Canvas::default()
        .block(Block::bordered().title(format!(" {} anchors ", shape.len())))
        .marker(Marker::Braille)
        .x_bounds([0.0, canvas.width])
        .y_bounds([0.0, canvas.height])
        .paint(move |ctx| {
            for i in 0..shape.len() {
                let segment = shape.edge_segment(i);
                let stroke = if flagged_edge(i) { alert } else { color };
                let mut prev = segment.p0;

                for s in 1..=SAMPLES_PER_EDGE {
                    let p = segment.evaluate(s as f64 / SAMPLES_PER_EDGE as f64);
                    ctx.draw(&CanvasLine::new(prev.x, flip(prev.y), p.x, flip(p.y), stroke));
                    prev = p;
                }
            }

            ctx.layer();

            let mut tips = Vec::with_capacity(shape.len() * 2);
            for anchor in &shape.anchors {
                let p = anchor.position;
                for tip in [anchor.handle_in_absolute(), anchor.handle_out_absolute()] {
                    ctx.draw(&CanvasLine::new(p.x, flip(p.y), tip.x, flip(tip.y), Color::DarkGray));
                    tips.push((tip.x, flip(tip.y)));
                }
            }

            ctx.draw(&Points {
                coords: &tips,
                color: Color::Gray,
            });
            ctx.draw(&Points {
                coords: &good,
                color: Color::White,
            });
            ctx.draw(&Points {
                coords: &bad,
                color: alert,
            });
        });

    f.render_widget(widget, area);
}

fn draw_panel(f: &mut Frame, area: Rect, lab: &Lab) {
    let mut lines = vec![
        format!("progress   {:>6.1}%", lab.morph.progress() * 100.0),
        format!("clock      {:>8.0} ms", lab.clock),
        format!("symmetry   {:>10.4}", lab.shape.calculate_symmetry()),
        format!("anchors    {:>6}", lab.shape.len()),
        format!(
            "frame      {:>6} / {}",
            lab.debugger.current_frame_index(),
            lab.debugger.frames().len()
        ),
        format!("paused     {:>6}", lab.debugger.is_paused()),
        format!(
            "debug      {:>6}",
            match (lab.debugger.is_enabled(), lab.debugger.is_auto_detect_enabled()) {
                (false, _) => "off",
                (true, false) => "on",
                (true, true) => "auto",
            }
        ),
        format!("capturing  {:>6}", lab.debugger.is_capturing()),
        String::new(),
        format!("anomalies  {:>6}", lab.debugger.anomalies().len()),
    ];

    lines.extend(lab.debugger.anomalies().iter().rev().take(6).map(|a| format!(" {}", a.message)));

    if let Some(diff) = &lab.diff {
        lines.push(String::new());
        lines.push(format!("golden '{}'", diff.name));
        lines.push(format!(" within     {}", diff.within_tolerance));
        lines.push(format!(" Δsymmetry  {:.4}", diff.symmetry.diff));
        lines.push(format!(" max Δangle {:.3}°", diff.max_angle_diff));
        lines.push(format!(" max Δpos   {:.3}", diff.max_position_delta));
    }

    f.render_widget(
        Paragraph::new(lines.join("\n"))
            .block(Block::bordered().title(" Debug "))
            .style(Style::new().fg(Color::Rgb(200, 200, 200))),
        area,
    );
}
