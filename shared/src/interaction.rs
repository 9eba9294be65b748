use serde::{Deserialize, Serialize};

/// Which pointer gestures drive the active feature and tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipMode {
    /// Hover shows; click pins until an empty click or a press outside.
    #[default]
    Combined,
    Hover,
    /// Click toggles.
    Click,
    None,
}

impl TooltipMode {
    fn uses_clicks(self) -> bool {
        matches!(self, Self::Click | Self::Combined)
    }
}

/// Notification the host forwards to its callbacks. Indices refer to features in the current
/// geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionEvent {
    /// Hover state changed; `None` when the pointer left every region.
    Hover(Option<usize>),
    Click(usize),
}

/// Hover/click state machine behind the highlight and tooltip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionCoordinator {
    mode: TooltipMode,
    hovered: Option<usize>,
    clicked: Option<usize>,
    tooltip_position: Option<[f64; 2]>,
}

impl InteractionCoordinator {
    pub fn new(mode: TooltipMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> TooltipMode {
        self.mode
    }

    /// Switching modes keeps hover state but drops a pinned click.
    pub fn set_mode(&mut self, mode: TooltipMode) {
        if mode != self.mode {
            self.mode = mode;
            self.clicked = None;
        }
    }

    /// Forget everything, e.g. when the geometry the indices refer to is replaced.
    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn clicked(&self) -> Option<usize> {
        self.clicked
    }

    /// `client` is the pointer in viewport coordinates, where the tooltip is anchored.
    pub fn pointer_move(&mut self, hit: Option<usize>, client: [f64; 2]) -> Vec<RegionEvent> {
        let mut events = Vec::new();
        if hit != self.hovered {
            self.hovered = hit;
            events.push(RegionEvent::Hover(hit));
        }
        let follows_pointer = match self.mode {
            TooltipMode::Hover => true,
            TooltipMode::Combined => self.clicked.is_none(),
            TooltipMode::Click | TooltipMode::None => false,
        };
        if hit.is_some() && follows_pointer {
            self.tooltip_position = Some(client);
        }
        events
    }

    pub fn pointer_leave(&mut self) -> Vec<RegionEvent> {
        if self.hovered.take().is_some() {
            vec![RegionEvent::Hover(None)]
        } else {
            Vec::new()
        }
    }

    pub fn click(&mut self, hit: Option<usize>, client: [f64; 2]) -> Vec<RegionEvent> {
        if self.mode.uses_clicks() {
            match hit {
                Some(index) => {
                    let same = self.clicked == Some(index);
                    self.clicked = match self.mode {
                        TooltipMode::Click if same => None,
                        _ => Some(index),
                    };
                    self.tooltip_position = Some(client);
                }
                None => self.clicked = None,
            }
        }
        hit.map(RegionEvent::Click).into_iter().collect()
    }

    /// A press anywhere outside the widget unpins the clicked feature.
    pub fn press_outside(&mut self) -> bool {
        self.mode.uses_clicks() && self.clicked.take().is_some()
    }

    pub fn active_feature(&self) -> Option<usize> {
        match self.mode {
            TooltipMode::Click => self.clicked,
            TooltipMode::Hover => self.hovered,
            TooltipMode::Combined => self.clicked.or(self.hovered),
            TooltipMode::None => None,
        }
    }

    pub fn tooltip_position(&self) -> Option<[f64; 2]> {
        self.tooltip_position
    }

    pub fn show_tooltip(&self) -> bool {
        self.mode != TooltipMode::None
            && self.active_feature().is_some()
            && self.tooltip_position.is_some()
    }
}
