pub mod detection;
pub mod keypoint;
pub mod landmark;

pub use detection::{select_best, BoundingBox};
pub use keypoint::{CoordinateSpace, Hand, ImageFrame, Keypoint, KeypointSet, Pose};
pub use landmark::{BodyLandmark, BodySide, HandLandmark, Landmark};
