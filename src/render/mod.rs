/// Watch-phase frame planning.
pub mod frames;
/// Deterministic frame rasterization.
pub mod raster;

pub use frames::{FrameDescriptor, WatchTiming, watch_plan};
pub use raster::render_frame;
