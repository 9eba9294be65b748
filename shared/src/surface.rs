use crate::color::Color;

/// The subset of the canvas 2D context the map and legend draw with.
pub trait Surface {
    /// Size the backing store for `width`×`height` CSS pixels at `dpr`, scale by `dpr` and
    /// clear it.
    fn reset(&mut self, width: f64, height: f64, dpr: f64);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn scale(&mut self, x: f64, y: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn set_fill_style(&mut self, color: Color);
    fn set_stroke_style(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);
    fn set_global_alpha(&mut self, alpha: f64);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Reset { width: f64, height: f64, dpr: f64 },
    Save,
    Restore,
    Translate(f64, f64),
    Scale(f64, f64),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    ClosePath,
    Fill,
    Stroke,
    FillRect { x: f64, y: f64, width: f64, height: f64 },
    FillStyle(Color),
    StrokeStyle(Color),
    LineWidth(f64),
    GlobalAlpha(f64),
}

/// Style in effect when a fill, stroke or rect was issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub alpha: f64,
    pub line_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct State {
    fill: Color,
    stroke: Color,
    line_width: f64,
    alpha: f64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            alpha: 1.0,
        }
    }
}

/// Headless surface that records every call, for tests and offline inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    state: State,
    stack: Vec<State>,
    fills: Vec<Paint>,
    strokes: Vec<Paint>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// One entry per `fill()` or `fill_rect()`, in call order.
    pub fn fills(&self) -> &[Paint] {
        &self.fills
    }

    pub fn strokes(&self) -> &[Paint] {
        &self.strokes
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn paint(&self, color: Color) -> Paint {
        Paint {
            color,
            alpha: self.state.alpha,
            line_width: self.state.line_width,
        }
    }
}

impl Surface for RecordingSurface {
    fn reset(&mut self, width: f64, height: f64, dpr: f64) {
        self.commands.clear();
        self.fills.clear();
        self.strokes.clear();
        self.stack.clear();
        self.state = State::default();
        self.commands.push(DrawCommand::Reset { width, height, dpr });
    }

    fn save(&mut self) {
        self.stack.push(self.state);
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::Translate(x, y));
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::Scale(x, y));
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::LineTo(x, y));
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn fill(&mut self) {
        self.fills.push(self.paint(self.state.fill));
        self.commands.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.strokes.push(self.paint(self.state.stroke));
        self.commands.push(DrawCommand::Stroke);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.fills.push(self.paint(self.state.fill));
        self.commands.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    fn set_fill_style(&mut self, color: Color) {
        self.state.fill = color;
        self.commands.push(DrawCommand::FillStyle(color));
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.state.stroke = color;
        self.commands.push(DrawCommand::StrokeStyle(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
        self.commands.push(DrawCommand::LineWidth(width));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
        self.commands.push(DrawCommand::GlobalAlpha(alpha));
    }
}
