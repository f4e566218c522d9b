// src/lib.rs
//
// Lane-boundary detection service. The per-frame pipeline (warp -> mask ->
// windows -> fit -> unwarp) lives in `pipeline`, temporal smoothing in
// `smoother`, and the HTTP surface in `server`. The `detection`, `tracker`
// and `video` modules back the standalone `detector` binary.

pub mod config;
pub mod detection;
pub mod fit;
pub mod mask;
pub mod pipeline;
pub mod server;
pub mod smoother;
pub mod tracker;
pub mod types;
pub mod video;
pub mod warp;
pub mod windows;

pub use pipeline::LaneAnalyzer;
pub use smoother::CoordinateSmoother;
pub use types::{Config, Frame, LaneCoords};
