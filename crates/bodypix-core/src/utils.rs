//! Geometric helper functions used by the decoders.

use crate::types::{Keypoint, Pose, Vector2D};

/// Clamps `value` to `[min, max]`.
///
/// Works for any partially ordered type so it serves both pixel indices and
/// float coordinates.
#[must_use]
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        return min;
    }
    if value > max {
        return max;
    }
    value
}

/// Squared Euclidean distance between `(y1, x1)` and `(y2, x2)`.
#[must_use]
pub fn squared_distance(y1: f32, x1: f32, y2: f32, x2: f32) -> f32 {
    let dy = y2 - y1;
    let dx = x2 - x1;
    dy * dy + dx * dx
}

/// Returns a vector of `size` copies of `element`.
#[must_use]
pub fn fill_array<T: Clone>(element: T, size: usize) -> Vec<T> {
    vec![element; size]
}

/// Mirrors a pose left-to-right inside an image of width `image_width`.
///
/// Keypoint types are swapped with their mirrored counterparts so a left
/// wrist stays a left wrist from the viewer's perspective.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn flip_pose_horizontal(pose: &Pose, image_width: usize) -> Pose {
    let max_x = image_width.saturating_sub(1) as f32;
    let keypoints = pose
        .keypoints
        .iter()
        .map(|k| Keypoint {
            part: k.part.mirrored(),
            position: Vector2D::new(k.position.y, max_x - k.position.x),
            score: k.score,
        })
        .collect();
    Pose::new(pose.score, keypoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeypointType;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-3, 0, 10), 0);
        assert_eq!(clamp(12, 0, 10), 10);
        assert_eq!(clamp(4, 0, 10), 4);
        assert_abs_diff_eq!(clamp(2.5_f32, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_squared_distance() {
        assert_abs_diff_eq!(squared_distance(1.0, 1.0, 0.0, 0.0), 2.0);
        assert_abs_diff_eq!(squared_distance(1.0, 1.0, 3.0, 3.0), 8.0);
        assert_abs_diff_eq!(squared_distance(0.0, 0.0, 3.0, 4.0), 25.0);
    }

    #[test]
    fn test_fill_array() {
        assert_eq!(fill_array(-1_i32, 3), vec![-1, -1, -1]);
        assert!(fill_array(0_u8, 0).is_empty());
    }

    #[test]
    fn test_flip_pose_horizontal() {
        let pose = Pose::new(
            0.9,
            vec![
                Keypoint::new(KeypointType::Nose, 5.0, 10.0, 0.8),
                Keypoint::new(KeypointType::LeftWrist, 7.0, 0.0, 0.6),
            ],
        );
        let flipped = flip_pose_horizontal(&pose, 101);
        assert_abs_diff_eq!(flipped.keypoints[0].position.x, 90.0);
        assert_abs_diff_eq!(flipped.keypoints[0].position.y, 5.0);
        assert_eq!(flipped.keypoints[1].part, KeypointType::RightWrist);
        assert_abs_diff_eq!(flipped.keypoints[1].position.x, 100.0);
        assert_abs_diff_eq!(flipped.score, 0.9);
    }
}
