use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::config::{LEGEND_INSET_PX, LegendOptions};
use crate::data::Domain;
use crate::scale::ColorScale;
use crate::surface::Surface;
use crate::tooltip::format_number;

/// Fraction digits on legend tick labels.
pub const LEGEND_FRACTION_DIGITS: usize = 1;

/// Corner of the map the legend panel is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegendPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl LegendPosition {
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::TopLeft => "Top left",
            Self::TopRight => "Top right",
            Self::BottomLeft => "Bottom left",
            Self::BottomRight => "Bottom right",
        }
    }

    /// Absolute-positioning declarations for the panel.
    pub fn css(self) -> String {
        let vertical = match self {
            Self::TopLeft | Self::TopRight => "top",
            Self::BottomLeft | Self::BottomRight => "bottom",
        };
        let horizontal = match self {
            Self::TopLeft | Self::BottomLeft => "left",
            Self::TopRight | Self::BottomRight => "right",
        };
        format!("{vertical}: {LEGEND_INSET_PX}px; {horizontal}: {LEGEND_INSET_PX}px;")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendTick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LegendModel {
    /// One color per pixel column, left (domain min) to right (domain max).
    Gradient {
        columns: Vec<Color>,
        height: f64,
        ticks: Vec<LegendTick>,
    },
    /// Categorical palette, in palette order.
    Swatches(Vec<Color>),
}

impl LegendModel {
    pub fn build(scale: &ColorScale, domain: Domain, options: &LegendOptions) -> Self {
        if let Some(palette) = scale.palette() {
            return Self::Swatches(palette.to_vec());
        }

        let width = options.width.round().max(1.0) as usize;
        let last = (width - 1).max(1) as f64;
        let columns = (0..width)
            .map(|i| {
                let t = i as f64 / last;
                scale
                    .color(domain.min + t * domain.span())
                    .unwrap_or(Color::TRANSPARENT)
            })
            .collect();

        Self::Gradient {
            columns,
            height: options.height,
            ticks: tick_values(domain, options.ticks)
                .into_iter()
                .map(|value| LegendTick {
                    value,
                    label: format_number(value, LEGEND_FRACTION_DIGITS),
                })
                .collect(),
        }
    }

    pub fn ticks(&self) -> &[LegendTick] {
        match self {
            Self::Gradient { ticks, .. } => ticks,
            Self::Swatches(_) => &[],
        }
    }

    /// Paint the gradient strip. Swatches are plain DOM boxes and draw nothing here.
    pub fn draw_gradient(&self, surface: &mut dyn Surface, device_pixel_ratio: f64) {
        let Self::Gradient {
            columns, height, ..
        } = self
        else {
            return;
        };
        surface.reset(columns.len() as f64, *height, device_pixel_ratio);
        for (i, color) in columns.iter().enumerate() {
            surface.set_fill_style(*color);
            surface.fill_rect(i as f64, 0.0, 1.0, *height);
        }
    }
}

/// `count` evenly spaced values across the domain, both ends included.
pub fn tick_values(domain: Domain, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![domain.min],
        n => {
            let step = domain.span() / (n - 1) as f64;
            (0..n).map(|i| domain.min + i as f64 * step).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::NamedScheme;
    use crate::scale::{ColorSchemeKind, Interpolator};
    use crate::surface::{DrawCommand, RecordingSurface};

    fn sequential(domain: Domain) -> ColorScale {
        ColorScale::new(
            ColorSchemeKind::Sequential,
            Interpolator::named(NamedScheme::Blues),
            domain,
            None,
            None,
        )
    }

    #[test]
    fn ticks_span_the_domain() {
        assert_eq!(tick_values(Domain::new(0.0, 100.0), 5), vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(tick_values(Domain::new(3.0, 9.0), 1), vec![3.0]);
        assert!(tick_values(Domain::new(3.0, 9.0), 0).is_empty());
    }

    #[test]
    fn gradient_columns_follow_the_scale() {
        let domain = Domain::new(0.0, 2500.0);
        let scale = sequential(domain);
        let options = LegendOptions {
            width: 11.0,
            ..LegendOptions::default()
        };
        let model = LegendModel::build(&scale, domain, &options);
        let LegendModel::Gradient { columns, ticks, .. } = &model else {
            panic!("expected gradient, got {model:?}");
        };
        assert_eq!(columns.len(), 11);
        assert_eq!(columns[0], NamedScheme::Blues.sample(0.0));
        assert_eq!(columns[10], NamedScheme::Blues.sample(1.0));
        let labels: Vec<&str> = ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, ["0", "625", "1,250", "1,875", "2,500"]);
    }

    #[test]
    fn categorical_scale_gives_swatches() {
        let palette = [Color::rgb(255, 0, 0), Color::rgb(0, 0, 255)];
        let scale = ColorScale::new(
            ColorSchemeKind::Categorical,
            Interpolator::named(NamedScheme::Blues),
            Domain::FALLBACK,
            Some(&palette),
            None,
        );
        let model = LegendModel::build(&scale, Domain::FALLBACK, &LegendOptions::default());
        assert_eq!(model, LegendModel::Swatches(palette.to_vec()));
        assert!(model.ticks().is_empty());

        let mut surface = RecordingSurface::new();
        model.draw_gradient(&mut surface, 1.0);
        assert!(surface.is_empty());
    }

    #[test]
    fn draws_one_rect_per_column() {
        let domain = Domain::new(0.0, 1.0);
        let options = LegendOptions {
            width: 4.0,
            height: 12.0,
            ..LegendOptions::default()
        };
        let model = LegendModel::build(&sequential(domain), domain, &options);
        let mut surface = RecordingSurface::new();
        model.draw_gradient(&mut surface, 2.0);
        assert_eq!(surface.fills().len(), 4);
        assert_eq!(
            surface.commands().last(),
            Some(&DrawCommand::FillRect {
                x: 3.0,
                y: 0.0,
                width: 1.0,
                height: 12.0
            })
        );
    }

    #[test]
    fn position_css_and_serde() {
        assert_eq!(LegendPosition::default(), LegendPosition::BottomRight);
        assert_eq!(LegendPosition::TopLeft.css(), "top: 10px; left: 10px;");
        assert_eq!(
            serde_json::to_string(&LegendPosition::BottomLeft).expect("serializes"),
            "\"bottom-left\""
        );
    }
}
