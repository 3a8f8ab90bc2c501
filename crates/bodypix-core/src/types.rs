//! Core data types shared by the decode and render crates.
//!
//! # Overview
//!
//! - **Pose types**: [`Pose`], [`Keypoint`], [`KeypointType`] as produced by an
//!   upstream PoseNet-style estimator, in original-image pixel coordinates.
//! - **Geometry types**: [`Dimensions`], [`Padding`], [`Vector2D`].
//! - **Segmentation results**: [`PersonSegmentation`], [`PartSegmentation`].

use crate::error::{CoreError, CoreResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// Geometry
// =============================================================================

/// A 2D point or displacement in `(y, x)` order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vector2D {
    /// Row coordinate
    pub y: f32,
    /// Column coordinate
    pub x: f32,
}

impl Vector2D {
    /// Creates a new vector.
    #[must_use]
    pub fn new(y: f32, x: f32) -> Self {
        Self { y, x }
    }
}

/// Height and width of an image, tensor plane or output grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dimensions {
    /// Number of rows
    pub height: usize,
    /// Number of columns
    pub width: usize,
}

impl Dimensions {
    /// Creates new dimensions.
    #[must_use]
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Total number of pixels.
    #[must_use]
    pub fn area(&self) -> usize {
        self.height * self.width
    }

    /// Width divided by height.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }
}

/// Padding applied around an image before it was resized to network input.
///
/// For a resized-and-padded input of size `H x W`, the unpadded resized image
/// is `(H - top - bottom) x (W - left - right)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Padding {
    /// Rows added above
    pub top: usize,
    /// Rows added below
    pub bottom: usize,
    /// Columns added to the left
    pub left: usize,
    /// Columns added to the right
    pub right: usize,
}

impl Padding {
    /// Creates new padding amounts.
    #[must_use]
    pub fn new(top: usize, bottom: usize, left: usize, right: usize) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Padding of zero on every side.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns `true` when no side is padded.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.top == 0 && self.bottom == 0 && self.left == 0 && self.right == 0
    }

    /// Total rows added.
    #[must_use]
    pub fn vertical(&self) -> usize {
        self.top + self.bottom
    }

    /// Total columns added.
    #[must_use]
    pub fn horizontal(&self) -> usize {
        self.left + self.right
    }

    /// Dimensions of the content inside a padded area of size `padded`.
    ///
    /// # Errors
    ///
    /// Returns an error if the padding does not fit inside `padded`.
    pub fn inner(&self, padded: Dimensions) -> CoreResult<Dimensions> {
        if self.vertical() >= padded.height || self.horizontal() >= padded.width {
            return Err(CoreError::validation(format!(
                "padding {self:?} leaves no content inside {}x{}",
                padded.height, padded.width
            )));
        }
        Ok(Dimensions::new(
            padded.height - self.vertical(),
            padded.width - self.horizontal(),
        ))
    }
}

// =============================================================================
// Pose types
// =============================================================================

/// The 17 PoseNet keypoints, in PoseNet index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[repr(u8)]
pub enum KeypointType {
    /// Nose
    Nose = 0,
    /// Left eye
    LeftEye = 1,
    /// Right eye
    RightEye = 2,
    /// Left ear
    LeftEar = 3,
    /// Right ear
    RightEar = 4,
    /// Left shoulder
    LeftShoulder = 5,
    /// Right shoulder
    RightShoulder = 6,
    /// Left elbow
    LeftElbow = 7,
    /// Right elbow
    RightElbow = 8,
    /// Left wrist
    LeftWrist = 9,
    /// Right wrist
    RightWrist = 10,
    /// Left hip
    LeftHip = 11,
    /// Right hip
    RightHip = 12,
    /// Left knee
    LeftKnee = 13,
    /// Right knee
    RightKnee = 14,
    /// Left ankle
    LeftAnkle = 15,
    /// Right ankle
    RightAnkle = 16,
}

impl KeypointType {
    /// Number of keypoint types.
    pub const COUNT: usize = 17;

    /// All keypoint types in index order.
    pub const ALL: [KeypointType; 17] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// Returns the keypoint type for an index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the index of this keypoint type.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The keypoint on the opposite side of the body.
    ///
    /// Center keypoints map to themselves.
    #[must_use]
    pub fn mirrored(self) -> Self {
        match self {
            Self::Nose => Self::Nose,
            Self::LeftEye => Self::RightEye,
            Self::RightEye => Self::LeftEye,
            Self::LeftEar => Self::RightEar,
            Self::RightEar => Self::LeftEar,
            Self::LeftShoulder => Self::RightShoulder,
            Self::RightShoulder => Self::LeftShoulder,
            Self::LeftElbow => Self::RightElbow,
            Self::RightElbow => Self::LeftElbow,
            Self::LeftWrist => Self::RightWrist,
            Self::RightWrist => Self::LeftWrist,
            Self::LeftHip => Self::RightHip,
            Self::RightHip => Self::LeftHip,
            Self::LeftKnee => Self::RightKnee,
            Self::RightKnee => Self::LeftKnee,
            Self::LeftAnkle => Self::RightAnkle,
            Self::RightAnkle => Self::LeftAnkle,
        }
    }

    /// PoseNet part name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "leftEye",
            Self::RightEye => "rightEye",
            Self::LeftEar => "leftEar",
            Self::RightEar => "rightEar",
            Self::LeftShoulder => "leftShoulder",
            Self::RightShoulder => "rightShoulder",
            Self::LeftElbow => "leftElbow",
            Self::RightElbow => "rightElbow",
            Self::LeftWrist => "leftWrist",
            Self::RightWrist => "rightWrist",
            Self::LeftHip => "leftHip",
            Self::RightHip => "rightHip",
            Self::LeftKnee => "leftKnee",
            Self::RightKnee => "rightKnee",
            Self::LeftAnkle => "leftAnkle",
            Self::RightAnkle => "rightAnkle",
        }
    }
}

/// A single detected keypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    /// Which body joint this is
    pub part: KeypointType,
    /// Position in original-image pixels
    pub position: Vector2D,
    /// Detection confidence
    pub score: f32,
}

impl Keypoint {
    /// Creates a new keypoint.
    #[must_use]
    pub fn new(part: KeypointType, y: f32, x: f32, score: f32) -> Self {
        Self {
            part,
            position: Vector2D::new(y, x),
            score,
        }
    }

    /// Returns `true` if the score reaches `threshold`.
    #[must_use]
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.score >= threshold
    }
}

/// A detected person pose.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Overall pose confidence
    pub score: f32,
    /// Keypoints, indexed the same way as the long-offset channels
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    /// Creates a new pose.
    #[must_use]
    pub fn new(score: f32, keypoints: Vec<Keypoint>) -> Self {
        Self { score, keypoints }
    }

    /// Returns the keypoint at `index`.
    #[must_use]
    pub fn keypoint(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }

    /// Returns the first keypoint of the given type.
    #[must_use]
    pub fn keypoint_by_type(&self, part: KeypointType) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.part == part)
    }
}

// =============================================================================
// Segmentation results
// =============================================================================

/// A binary person mask at original-image resolution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PersonSegmentation {
    /// Row-major mask, `1` where the pixel belongs to the person
    pub data: Vec<u8>,
    /// Mask width
    pub width: usize,
    /// Mask height
    pub height: usize,
    /// Pose the mask was decoded for, if any
    pub pose: Option<Pose>,
    /// Per-pixel part ids (`-1` outside the person), if decoded
    pub part_data: Option<Vec<i32>>,
}

impl PersonSegmentation {
    /// Creates a person segmentation, checking the buffer size.
    ///
    /// # Errors
    ///
    /// Returns an error if `data.len() != width * height`.
    pub fn new(data: Vec<u8>, dims: Dimensions, pose: Option<Pose>) -> CoreResult<Self> {
        if data.len() != dims.area() {
            return Err(CoreError::dimension_mismatch(dims.area(), data.len()));
        }
        Ok(Self {
            data,
            width: dims.width,
            height: dims.height,
            pose,
            part_data: None,
        })
    }

    /// Attaches per-pixel part ids.
    ///
    /// # Errors
    ///
    /// Returns an error if `part_data` has a different length than the mask.
    pub fn with_part_data(mut self, part_data: Vec<i32>) -> CoreResult<Self> {
        if part_data.len() != self.data.len() {
            return Err(CoreError::dimension_mismatch(
                self.data.len(),
                part_data.len(),
            ));
        }
        self.part_data = Some(part_data);
        Ok(self)
    }

    /// Mask dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.height, self.width)
    }

    /// Number of pixels set in the mask.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// A part-labeled person mask at original-image resolution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartSegmentation {
    /// Row-major part ids, `-1` where the pixel is not part of the person
    pub data: Vec<i32>,
    /// Mask width
    pub width: usize,
    /// Mask height
    pub height: usize,
    /// Pose the mask was decoded for, if any
    pub pose: Option<Pose>,
}

impl PartSegmentation {
    /// Creates a part segmentation, checking the buffer size.
    ///
    /// # Errors
    ///
    /// Returns an error if `data.len() != width * height`.
    pub fn new(data: Vec<i32>, dims: Dimensions, pose: Option<Pose>) -> CoreResult<Self> {
        if data.len() != dims.area() {
            return Err(CoreError::dimension_mismatch(dims.area(), data.len()));
        }
        Ok(Self {
            data,
            width: dims.width,
            height: dims.height,
            pose,
        })
    }

    /// Mask dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.height, self.width)
    }

    /// Number of pixels carrying a part id.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.data.iter().filter(|&&v| v >= 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_inner() {
        let padding = Padding::new(25, 25, 0, 0);
        let inner = padding.inner(Dimensions::new(100, 100)).unwrap();
        assert_eq!(inner, Dimensions::new(50, 100));

        assert!(Padding::new(50, 50, 0, 0)
            .inner(Dimensions::new(100, 100))
            .is_err());
    }

    #[test]
    fn test_keypoint_type_roundtrip() {
        for (i, kp) in KeypointType::ALL.iter().enumerate() {
            assert_eq!(kp.index(), i);
            assert_eq!(KeypointType::from_index(i), Some(*kp));
            assert_eq!(kp.mirrored().mirrored(), *kp);
        }
        assert_eq!(KeypointType::from_index(17), None);
        assert_eq!(KeypointType::LeftWrist.mirrored(), KeypointType::RightWrist);
    }

    #[test]
    fn test_person_segmentation_size_check() {
        let dims = Dimensions::new(2, 3);
        assert!(PersonSegmentation::new(vec![0; 6], dims, None).is_ok());
        assert_eq!(
            PersonSegmentation::new(vec![0; 5], dims, None),
            Err(CoreError::dimension_mismatch(6, 5))
        );

        let seg = PersonSegmentation::new(vec![1, 0, 1, 0, 0, 0], dims, None).unwrap();
        assert_eq!(seg.pixel_count(), 2);
        assert!(seg.clone().with_part_data(vec![-1; 4]).is_err());
        let seg = seg.with_part_data(vec![3, -1, 4, -1, -1, -1]).unwrap();
        assert_eq!(seg.part_data.as_ref().map(Vec::len), Some(6));
    }

    #[test]
    fn test_pose_lookup() {
        let pose = Pose::new(
            0.8,
            vec![
                Keypoint::new(KeypointType::Nose, 10.0, 20.0, 0.9),
                Keypoint::new(KeypointType::LeftEye, 8.0, 22.0, 0.4),
            ],
        );
        assert_eq!(pose.keypoint(1).map(|k| k.part), Some(KeypointType::LeftEye));
        assert!(pose.keypoint(2).is_none());
        let eye = pose.keypoint_by_type(KeypointType::LeftEye).unwrap();
        assert!(eye.is_confident(0.3));
        assert!(!eye.is_confident(0.5));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_segmentation_json() {
        let pose = Pose::new(
            0.75,
            vec![
                Keypoint::new(KeypointType::Nose, 1.5, 2.0, 0.9),
                Keypoint::new(KeypointType::LeftEye, 1.0, 2.5, 0.25),
            ],
        );
        let seg = PersonSegmentation::new(vec![1, 0, 0, 1], Dimensions::new(2, 2), Some(pose))
            .unwrap()
            .with_part_data(vec![0, -1, -1, 23])
            .unwrap();

        let json = serde_json::to_string(&seg).unwrap();
        assert!(json.contains("\"leftEye\""));

        let back: PersonSegmentation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, seg);
        assert_eq!(back.pose.unwrap().keypoint(0).unwrap().part, KeypointType::Nose);
    }
}
