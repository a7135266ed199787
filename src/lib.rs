pub mod detect;
pub mod track;

pub use detect::{prepare_frame, CascadeDetector};
pub use track::{draw_track_marker, FaceStep, TrackReport, TrackState, Tracker};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("cascade model file not found: {0}")]
    ModelNotFound(String),
    #[error("cascade model {0} loaded empty")]
    EmptyModel(String),
}
