//! Landmark data model and the leg/foot classifier.
//!
//! The estimator emits up to 33 points in a fixed skeletal order. Ids 23
//! through 32 cover hips, knees, ankles, heels, and toes; `classify` relabels
//! those into per-side groups without touching anything else.

use serde::Serialize;

/// Fixed 33-point skeletal convention used by the pose estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::Nose),
            1 => Some(Self::LeftEyeInner),
            2 => Some(Self::LeftEye),
            3 => Some(Self::LeftEyeOuter),
            4 => Some(Self::RightEyeInner),
            5 => Some(Self::RightEye),
            6 => Some(Self::RightEyeOuter),
            7 => Some(Self::LeftEar),
            8 => Some(Self::RightEar),
            9 => Some(Self::MouthLeft),
            10 => Some(Self::MouthRight),
            11 => Some(Self::LeftShoulder),
            12 => Some(Self::RightShoulder),
            13 => Some(Self::LeftElbow),
            14 => Some(Self::RightElbow),
            15 => Some(Self::LeftWrist),
            16 => Some(Self::RightWrist),
            17 => Some(Self::LeftPinky),
            18 => Some(Self::RightPinky),
            19 => Some(Self::LeftIndex),
            20 => Some(Self::RightIndex),
            21 => Some(Self::LeftThumb),
            22 => Some(Self::RightThumb),
            23 => Some(Self::LeftHip),
            24 => Some(Self::RightHip),
            25 => Some(Self::LeftKnee),
            26 => Some(Self::RightKnee),
            27 => Some(Self::LeftAnkle),
            28 => Some(Self::RightAnkle),
            29 => Some(Self::LeftHeel),
            30 => Some(Self::RightHeel),
            31 => Some(Self::LeftFootIndex),
            32 => Some(Self::RightFootIndex),
            _ => None,
        }
    }
}

/// Single detected landmark. `x`/`y` are normalized to [0, 1] relative to the
/// frame, `z` is relative depth, `visibility` a confidence score in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LandmarkPoint {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LegJoints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hip: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knee: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ankle: Option<LandmarkPoint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FootPoints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heel: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toe: Option<LandmarkPoint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Legs {
    pub left_leg: LegJoints,
    pub right_leg: LegJoints,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Feet {
    pub left_foot: FootPoints,
    pub right_foot: FootPoints,
}

/// Complete classified pose result for one processed frame. Derived data
/// only: every group entry is a copy of a point in the flat list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoseSnapshot {
    #[serde(rename = "pose")]
    pub points: Vec<LandmarkPoint>,
    pub legs: Legs,
    pub feet: Feet,
}

/// Group leg and foot joints by body side.
///
/// Pure relabeling: no interpolation, no smoothing, no errors for missing
/// ids. Points whose id is outside 23..=32 stay in the flat list only.
pub fn classify(points: Vec<LandmarkPoint>) -> PoseSnapshot {
    let mut legs = Legs::default();
    let mut feet = Feet::default();

    for point in &points {
        match LandmarkIndex::from_id(point.id) {
            Some(LandmarkIndex::LeftHip) => legs.left_leg.hip = Some(*point),
            Some(LandmarkIndex::LeftKnee) => legs.left_leg.knee = Some(*point),
            Some(LandmarkIndex::LeftAnkle) => legs.left_leg.ankle = Some(*point),
            Some(LandmarkIndex::LeftHeel) => feet.left_foot.heel = Some(*point),
            Some(LandmarkIndex::LeftFootIndex) => feet.left_foot.toe = Some(*point),
            Some(LandmarkIndex::RightHip) => legs.right_leg.hip = Some(*point),
            Some(LandmarkIndex::RightKnee) => legs.right_leg.knee = Some(*point),
            Some(LandmarkIndex::RightAnkle) => legs.right_leg.ankle = Some(*point),
            Some(LandmarkIndex::RightHeel) => feet.right_foot.heel = Some(*point),
            Some(LandmarkIndex::RightFootIndex) => feet.right_foot.toe = Some(*point),
            _ => {}
        }
    }

    PoseSnapshot { points, legs, feet }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: u32, x: f32) -> LandmarkPoint {
        LandmarkPoint {
            id,
            x,
            y: x + 0.1,
            z: 0.0,
            visibility: 0.9,
        }
    }

    #[test]
    fn index_table_is_complete() {
        assert_eq!(LandmarkIndex::COUNT, 33);
        assert_eq!(LandmarkIndex::from_id(0), Some(LandmarkIndex::Nose));
        assert_eq!(
            LandmarkIndex::from_id(32),
            Some(LandmarkIndex::RightFootIndex)
        );
        assert_eq!(LandmarkIndex::from_id(33), None);
    }

    #[test]
    fn empty_input_yields_empty_groups() {
        let snapshot = classify(Vec::new());
        assert!(snapshot.points.is_empty());
        assert_eq!(snapshot.legs, Legs::default());
        assert_eq!(snapshot.feet, Feet::default());
    }

    #[test]
    fn left_hip_is_the_exact_input_point() {
        let hip = point(23, 0.1);
        let snapshot = classify(vec![hip]);
        assert_eq!(snapshot.legs.left_leg.hip, Some(hip));
        assert_eq!(snapshot.legs.left_leg.knee, None);
        assert_eq!(snapshot.legs.right_leg, LegJoints::default());
    }

    #[test]
    fn hip_and_ankle_without_knee() {
        let hip = point(23, 0.1);
        let ankle = LandmarkPoint {
            id: 27,
            x: 0.1,
            y: 0.5,
            z: 0.0,
            visibility: 0.8,
        };
        let snapshot = classify(vec![hip, ankle]);
        assert_eq!(snapshot.legs.left_leg.hip, Some(hip));
        assert_eq!(snapshot.legs.left_leg.ankle, Some(ankle));
        assert_eq!(snapshot.legs.left_leg.knee, None);
        assert_eq!(snapshot.feet.left_foot, FootPoints::default());
    }

    #[test]
    fn non_leg_ids_stay_in_the_flat_list_only() {
        let nose = point(0, 0.4);
        let wrist = point(15, 0.6);
        let snapshot = classify(vec![nose, wrist]);
        assert_eq!(snapshot.points.len(), 2);
        assert_eq!(snapshot.legs, Legs::default());
        assert_eq!(snapshot.feet, Feet::default());
    }

    #[test]
    fn classification_is_idempotent() {
        let points: Vec<_> = (23..=32).map(|id| point(id, id as f32 / 100.0)).collect();
        let first = classify(points);
        let second = classify(first.points.clone());
        assert_eq!(first, second);
    }

    #[test]
    fn snapshot_serializes_with_stable_field_names() {
        let snapshot = classify(vec![point(23, 0.1)]);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("pose").is_some());
        assert!(json.get("cmas").is_none());
        assert_eq!(json["legs"]["left_leg"]["hip"]["id"], 23);
        assert_eq!(json["legs"]["right_leg"], serde_json::json!({}));
        assert_eq!(json["feet"]["left_foot"], serde_json::json!({}));
    }

    #[test]
    fn empty_snapshot_serializes_to_the_documented_default() {
        let json = serde_json::to_value(PoseSnapshot::default()).unwrap();
        assert_eq!(json["pose"], serde_json::json!([]));
        assert_eq!(
            json["legs"],
            serde_json::json!({"left_leg": {}, "right_leg": {}})
        );
        assert_eq!(
            json["feet"],
            serde_json::json!({"left_foot": {}, "right_foot": {}})
        );
    }
}
