mod aruco;
mod backend;
mod hit;
mod stub;

pub use aruco::ArucoBackend;
pub use backend::{DictKey, MarkerDetector};
pub use hit::MarkerHit;
pub use stub::StubDetector;
