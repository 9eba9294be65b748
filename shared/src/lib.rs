pub mod animation;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod hit;
pub mod interaction;
pub mod legend;
pub mod map;
pub mod memo;
pub mod projection;
pub mod render;
pub mod scale;
pub mod spherical;
pub mod surface;
pub mod theme;
pub mod tooltip;
pub mod zoom;

pub use animation::{AnimationDriver, FrameTick};
pub use color::{Color, NamedScheme};
pub use config::ChoroplethOptions;
pub use data::{DataPoint, Domain};
pub use error::ChoroplethError;
pub use frame::{FrameHandle, FrameScheduler};
pub use geometry::{Feature, FeatureCollection};
pub use interaction::TooltipMode;
pub use legend::{LegendModel, LegendPosition};
pub use map::{ActiveTooltip, ChoroplethMap, PointerUpdate, RegionNotification};
pub use projection::{Projection, ProjectionKind};
pub use scale::{ColorScale, ColorSchemeKind, Interpolator};
pub use surface::Surface;
pub use theme::ColorMode;
pub use zoom::{WheelDeltaMode, ZoomTransform};
