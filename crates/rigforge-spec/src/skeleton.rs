//! Source skeleton types and the built-in biped preset.
//!
//! A source skeleton is the deform hierarchy the synthesizer consumes. It
//! carries guide positions only; the synthesizer never mutates it. The
//! `BipedV1` preset ships the canonical humanoid bone set with guide
//! positions so tests and the CLI have a reference input.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Marks how far along the rig pipeline a skeleton is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigStamp {
    /// The skeleton is laid out for this synthesizer and may be rigged.
    Generatable,
    /// A control rig has already been generated from this skeleton.
    Generated,
}

/// One bone of the source deform skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceBone {
    /// Bone name, unique within the skeleton.
    pub name: String,
    /// Head position in armature space.
    pub head: [f32; 3],
    /// Tail position in armature space.
    pub tail: [f32; 3],
    /// Roll around the head-to-tail axis, radians.
    #[serde(default)]
    pub roll: f32,
    /// Parent bone name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl SourceBone {
    /// Creates a bone with the given endpoints and no parent.
    pub fn new(name: impl Into<String>, head: [f32; 3], tail: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            head,
            tail,
            roll: 0.0,
            parent: None,
        }
    }

    /// Sets the parent bone name.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets the roll, radians.
    pub fn with_roll(mut self, roll: f32) -> Self {
        self.roll = roll;
        self
    }

    /// Head position as a vector.
    pub fn head_vec(&self) -> Vec3 {
        Vec3::from_array(self.head)
    }

    /// Tail position as a vector.
    pub fn tail_vec(&self) -> Vec3 {
        Vec3::from_array(self.tail)
    }

    /// Head-to-tail length.
    pub fn length(&self) -> f32 {
        (self.tail_vec() - self.head_vec()).length()
    }
}

/// A source deform skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSkeleton {
    /// Skeleton name.
    pub name: String,
    /// Pipeline stamp. Synthesis requires `Generatable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp: Option<RigStamp>,
    /// Object-level scale. Synthesis requires identity.
    #[serde(default = "identity_scale")]
    pub object_scale: [f32; 3],
    /// Bones in definition order. Parents must precede children.
    pub bones: Vec<SourceBone>,
}

fn identity_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl SourceSkeleton {
    /// Creates an empty skeleton with the given name, stamped generatable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stamp: Some(RigStamp::Generatable),
            object_scale: identity_scale(),
            bones: Vec::new(),
        }
    }

    /// Looks up a bone by name.
    pub fn bone(&self, name: &str) -> Option<&SourceBone> {
        self.bones.iter().find(|b| b.name == name)
    }

    /// Returns true if a bone with this name exists.
    pub fn has_bone(&self, name: &str) -> bool {
        self.bone(name).is_some()
    }

    /// All bone names in definition order.
    pub fn bone_names(&self) -> Vec<&str> {
        self.bones.iter().map(|b| b.name.as_str()).collect()
    }
}

/// Left or right half of a mirrored bone pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides, left first.
    pub fn both() -> [Side; 2] {
        [Side::Left, Side::Right]
    }

    /// The name suffix for this side.
    pub fn suffix(&self) -> &'static str {
        match self {
            Side::Left => "_l",
            Side::Right => "_r",
        }
    }

    /// Mirror sign applied to X coordinates and side-dependent angles.
    pub fn sign(&self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    /// Appends this side's suffix to a base name.
    pub fn bone(&self, base: &str) -> String {
        format!("{}{}", base, self.suffix())
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Core bones every biped source skeleton must carry.
pub fn required_core_bones() -> Vec<String> {
    let mut names: Vec<String> = ["hips", "spine_1", "spine_2", "spine_3", "neck", "head"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for side in Side::both() {
        for base in [
            "shoulder", "upperarm", "forearm", "hand", "thigh", "shin", "foot", "toes",
        ] {
            names.push(side.bone(base));
        }
    }
    names
}

/// Finger base names, thumb first.
pub const FINGER_BASES: [&str; 5] = ["thumb", "pointer", "middle", "ring", "pinky"];

/// Finger bones for one side, three segments per finger.
pub fn finger_bones(side: Side) -> Vec<String> {
    let mut names = Vec::new();
    for base in FINGER_BASES {
        for seg in 1..=3 {
            names.push(side.bone(&format!("{}_{}", base, seg)));
        }
    }
    names
}

/// Sided face detail bone bases used by the full face tier.
pub const FACE_DETAIL_SIDED: [&str; 10] = [
    "eyebrow_1",
    "eyebrow_2",
    "eyebrow_3",
    "eyelid_upper",
    "eyelid_lower",
    "cheek",
    "nostril",
    "mouth_corner",
    "lip_upper",
    "lip_lower",
];

/// Central face detail bones used by the full face tier.
pub const FACE_DETAIL_CENTRAL: [&str; 2] = ["lip_upper_mid", "lip_lower_mid"];

/// Bones the eye tier requires.
pub fn eye_bones() -> Vec<String> {
    Side::both().iter().map(|s| s.bone("eye")).collect()
}

/// Bones the jaw tier requires beyond the eye tier.
pub fn jaw_bones() -> Vec<String> {
    vec![
        "jaw".to_string(),
        "teeth_upper".to_string(),
        "teeth_lower".to_string(),
        "tongue_1".to_string(),
        "tongue_2".to_string(),
    ]
}

/// Bones the full face tier requires beyond the jaw tier.
pub fn face_detail_bones() -> Vec<String> {
    let mut names = Vec::new();
    for side in Side::both() {
        for base in FACE_DETAIL_SIDED {
            names.push(side.bone(base));
        }
    }
    for name in FACE_DETAIL_CENTRAL {
        names.push(name.to_string());
    }
    names
}

/// Built-in source skeleton presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkeletonPreset {
    /// Humanoid biped, ~1.75 units tall, Z up, facing -Y.
    BipedV1,
}

impl SkeletonPreset {
    /// Returns the preset name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkeletonPreset::BipedV1 => "biped_v1",
        }
    }

    /// All presets.
    pub fn all() -> Vec<SkeletonPreset> {
        vec![SkeletonPreset::BipedV1]
    }

    /// Builds the full source skeleton for this preset, including fingers
    /// and the complete face detail set.
    pub fn source_skeleton(&self) -> SourceSkeleton {
        match self {
            SkeletonPreset::BipedV1 => biped_v1(),
        }
    }
}

impl std::fmt::Display for SkeletonPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SkeletonPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "biped_v1" => Ok(SkeletonPreset::BipedV1),
            _ => Err(format!("unknown skeleton preset: {}", s)),
        }
    }
}

fn mirror_x(p: [f32; 3], side: Side) -> [f32; 3] {
    [p[0] * side.sign(), p[1], p[2]]
}

fn biped_v1() -> SourceSkeleton {
    let mut skel = SourceSkeleton::new("biped_v1");
    let bones = &mut skel.bones;

    // Spine column.
    bones.push(SourceBone::new("hips", [0.0, 0.0, 1.00], [0.0, 0.0, 1.10]));
    bones.push(SourceBone::new("spine_1", [0.0, 0.0, 1.10], [0.0, 0.0, 1.22]).with_parent("hips"));
    bones.push(SourceBone::new("spine_2", [0.0, 0.0, 1.22], [0.0, 0.0, 1.35]).with_parent("spine_1"));
    bones.push(SourceBone::new("spine_3", [0.0, 0.0, 1.35], [0.0, 0.0, 1.48]).with_parent("spine_2"));
    bones.push(SourceBone::new("neck", [0.0, 0.0, 1.48], [0.0, 0.0, 1.58]).with_parent("spine_3"));
    bones.push(SourceBone::new("head", [0.0, 0.0, 1.58], [0.0, 0.0, 1.75]).with_parent("neck"));

    for side in Side::both() {
        let m = |p: [f32; 3]| mirror_x(p, side);
        // Arm bones roll so local Z faces the back of the character,
        // mirrored per side.
        let arm_roll = -side.sign() * std::f32::consts::FRAC_PI_2;

        // Arm chain. The elbow sits slightly behind the shoulder-wrist line
        // so the IK plane is never degenerate at rest.
        bones.push(
            SourceBone::new(side.bone("shoulder"), m([0.02, 0.01, 1.44]), m([0.16, 0.01, 1.46]))
                .with_parent("spine_3"),
        );
        bones.push(
            SourceBone::new(side.bone("upperarm"), m([0.16, 0.01, 1.46]), m([0.42, 0.03, 1.44]))
                .with_parent(side.bone("shoulder"))
                .with_roll(arm_roll),
        );
        bones.push(
            SourceBone::new(side.bone("forearm"), m([0.42, 0.03, 1.44]), m([0.66, 0.0, 1.43]))
                .with_parent(side.bone("upperarm"))
                .with_roll(arm_roll),
        );
        bones.push(
            SourceBone::new(side.bone("hand"), m([0.66, 0.0, 1.43]), m([0.74, -0.01, 1.42]))
                .with_parent(side.bone("forearm"))
                .with_roll(arm_roll),
        );

        // Leg chain. Knee slightly forward, ankle slightly back.
        bones.push(
            SourceBone::new(side.bone("thigh"), m([0.09, 0.0, 1.00]), m([0.095, -0.02, 0.52]))
                .with_parent("hips"),
        );
        bones.push(
            SourceBone::new(side.bone("shin"), m([0.095, -0.02, 0.52]), m([0.10, 0.02, 0.08]))
                .with_parent(side.bone("thigh")),
        );
        bones.push(
            SourceBone::new(side.bone("foot"), m([0.10, 0.02, 0.08]), m([0.10, -0.10, 0.02]))
                .with_parent(side.bone("shin")),
        );
        bones.push(
            SourceBone::new(side.bone("toes"), m([0.10, -0.10, 0.02]), m([0.10, -0.17, 0.02]))
                .with_parent(side.bone("foot")),
        );

        // Fingers fan out from the hand tail along -Y offsets.
        push_fingers(bones, side);
    }

    // Face.
    bones.push(SourceBone::new("jaw", [0.0, -0.02, 1.62], [0.0, -0.09, 1.59]).with_parent("head"));
    bones.push(
        SourceBone::new("teeth_upper", [0.0, -0.08, 1.63], [0.0, -0.10, 1.63]).with_parent("head"),
    );
    bones.push(
        SourceBone::new("teeth_lower", [0.0, -0.08, 1.60], [0.0, -0.10, 1.60]).with_parent("jaw"),
    );
    bones.push(
        SourceBone::new("tongue_1", [0.0, -0.04, 1.61], [0.0, -0.06, 1.61]).with_parent("jaw"),
    );
    bones.push(
        SourceBone::new("tongue_2", [0.0, -0.06, 1.61], [0.0, -0.08, 1.61]).with_parent("tongue_1"),
    );
    for side in Side::both() {
        let m = |p: [f32; 3]| mirror_x(p, side);
        bones.push(
            SourceBone::new(side.bone("eye"), m([0.03, -0.06, 1.67]), m([0.03, -0.09, 1.67]))
                .with_parent("head"),
        );
    }
    push_face_detail(bones);

    skel
}

fn push_fingers(bones: &mut Vec<SourceBone>, side: Side) {
    // Base point and per-segment step for each finger, left side values.
    let layout: [(&str, [f32; 3], [f32; 3]); 5] = [
        ("thumb", [0.68, -0.03, 1.41], [0.018, -0.018, -0.006]),
        ("pointer", [0.745, -0.025, 1.425], [0.024, -0.004, -0.002]),
        ("middle", [0.75, -0.01, 1.43], [0.026, -0.002, -0.002]),
        ("ring", [0.748, 0.005, 1.428], [0.024, 0.0, -0.002]),
        ("pinky", [0.74, 0.02, 1.425], [0.018, 0.002, -0.002]),
    ];
    for (base, start, step) in layout {
        let mut head = mirror_x(start, side);
        let step = mirror_x(step, side);
        let mut parent = side.bone("hand");
        for seg in 1..=3 {
            let tail = [head[0] + step[0], head[1] + step[1], head[2] + step[2]];
            let name = side.bone(&format!("{}_{}", base, seg));
            bones.push(SourceBone::new(&name, head, tail).with_parent(&parent));
            parent = name;
            head = tail;
        }
    }
}

fn push_face_detail(bones: &mut Vec<SourceBone>) {
    // Guide points for the sided detail set, left side values.
    let sided: [(&str, [f32; 3], &str); 10] = [
        ("eyebrow_1", [0.015, -0.085, 1.70], "head"),
        ("eyebrow_2", [0.035, -0.08, 1.705], "head"),
        ("eyebrow_3", [0.05, -0.07, 1.70], "head"),
        ("eyelid_upper", [0.03, -0.085, 1.68], "head"),
        ("eyelid_lower", [0.03, -0.085, 1.66], "head"),
        ("cheek", [0.045, -0.07, 1.63], "head"),
        ("nostril", [0.012, -0.095, 1.645], "head"),
        ("mouth_corner", [0.025, -0.08, 1.605], "head"),
        ("lip_upper", [0.012, -0.09, 1.61], "head"),
        ("lip_lower", [0.012, -0.09, 1.60], "jaw"),
    ];
    for side in Side::both() {
        for (base, p, parent) in sided {
            let head = mirror_x(p, side);
            let tail = [head[0], head[1] - 0.012, head[2]];
            bones.push(SourceBone::new(side.bone(base), head, tail).with_parent(parent));
        }
    }
    let central: [(&str, [f32; 3], &str); 2] = [
        ("lip_upper_mid", [0.0, -0.095, 1.61], "head"),
        ("lip_lower_mid", [0.0, -0.095, 1.60], "jaw"),
    ];
    for (name, head, parent) in central {
        let tail = [head[0], head[1] - 0.012, head[2]];
        bones.push(SourceBone::new(name, head, tail).with_parent(parent));
    }
}
