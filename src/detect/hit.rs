use opencv::core::Point2f;

/// Single marker located in one frame.
#[derive(Clone, Debug)]
pub struct MarkerHit {
    /// Dictionary ID encoded by the marker pattern.
    pub id: i32,
    /// Corners in native frame coordinates, ordered top-left, top-right,
    /// bottom-right, bottom-left.
    pub corners: [Point2f; 4],
}
