//! Body-part channels of the part segmentation head.
//!
//! Part ids index [`PART_CHANNELS`]; `-1` marks pixels outside any body.

/// Number of body-part channels.
pub const NUM_PART_CHANNELS: usize = 24;

/// Sentinel part id for pixels that belong to no person.
pub const NO_PART: i32 = -1;

/// Part channel names in channel order.
pub const PART_CHANNELS: [&str; NUM_PART_CHANNELS] = [
    "left_face",
    "right_face",
    "right_upper_leg_front",
    "right_lower_leg_back",
    "right_upper_leg_back",
    "left_lower_leg_front",
    "left_upper_leg_front",
    "left_upper_leg_back",
    "left_lower_leg_back",
    "right_feet",
    "right_lower_leg_front",
    "left_feet",
    "torso_front",
    "torso_back",
    "right_upper_arm_front",
    "right_upper_arm_back",
    "right_lower_arm_back",
    "left_lower_arm_front",
    "left_upper_arm_front",
    "left_upper_arm_back",
    "left_lower_arm_back",
    "right_hand",
    "right_lower_arm_front",
    "left_hand",
];

/// Body part labels, one per part channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum BodyPart {
    LeftFace = 0,
    RightFace = 1,
    RightUpperLegFront = 2,
    RightLowerLegBack = 3,
    RightUpperLegBack = 4,
    LeftLowerLegFront = 5,
    LeftUpperLegFront = 6,
    LeftUpperLegBack = 7,
    LeftLowerLegBack = 8,
    RightFeet = 9,
    RightLowerLegFront = 10,
    LeftFeet = 11,
    TorsoFront = 12,
    TorsoBack = 13,
    RightUpperArmFront = 14,
    RightUpperArmBack = 15,
    RightLowerArmBack = 16,
    LeftLowerArmFront = 17,
    LeftUpperArmFront = 18,
    LeftUpperArmBack = 19,
    LeftLowerArmBack = 20,
    RightHand = 21,
    RightLowerArmFront = 22,
    LeftHand = 23,
}

impl BodyPart {
    const ALL: [BodyPart; NUM_PART_CHANNELS] = [
        Self::LeftFace,
        Self::RightFace,
        Self::RightUpperLegFront,
        Self::RightLowerLegBack,
        Self::RightUpperLegBack,
        Self::LeftLowerLegFront,
        Self::LeftUpperLegFront,
        Self::LeftUpperLegBack,
        Self::LeftLowerLegBack,
        Self::RightFeet,
        Self::RightLowerLegFront,
        Self::LeftFeet,
        Self::TorsoFront,
        Self::TorsoBack,
        Self::RightUpperArmFront,
        Self::RightUpperArmBack,
        Self::RightLowerArmBack,
        Self::LeftLowerArmFront,
        Self::LeftUpperArmFront,
        Self::LeftUpperArmBack,
        Self::LeftLowerArmBack,
        Self::RightHand,
        Self::RightLowerArmFront,
        Self::LeftHand,
    ];

    /// Get body part from a part id; negative ids map to `None`.
    #[must_use]
    pub fn from_id(id: i32) -> Option<Self> {
        usize::try_from(id).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Part id of this body part.
    #[must_use]
    pub fn id(self) -> i32 {
        i32::from(self as u8)
    }

    /// Channel name
    #[must_use]
    pub fn name(self) -> &'static str {
        PART_CHANNELS[self as usize]
    }
}
