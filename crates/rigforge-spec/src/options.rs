//! Generator options.
//!
//! Field defaults reproduce the original generator panel: full face rig,
//! fingers and springs on, twist counts 3/3/3/1, neck twist on.

use serde::{Deserialize, Serialize};

/// Face rig tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceTier {
    /// No face rig.
    None,
    /// Eye controls and look target only.
    Eyes,
    /// Eyes plus jaw, teeth, and tongue.
    EyesJaw,
    /// Eyes, jaw, and the full detail control set.
    Full,
}

impl FaceTier {
    /// Returns the tier name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FaceTier::None => "none",
            FaceTier::Eyes => "eyes",
            FaceTier::EyesJaw => "eyes_jaw",
            FaceTier::Full => "full",
        }
    }

    /// True if the tier includes eye controls.
    pub fn has_eyes(&self) -> bool {
        !matches!(self, FaceTier::None)
    }

    /// True if the tier includes the jaw set.
    pub fn has_jaw(&self) -> bool {
        matches!(self, FaceTier::EyesJaw | FaceTier::Full)
    }

    /// True if the tier includes the detail control set.
    pub fn has_detail(&self) -> bool {
        matches!(self, FaceTier::Full)
    }
}

impl std::fmt::Display for FaceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options controlling which modules are synthesized and their tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigOptions {
    /// Face rig tier.
    #[serde(default = "default_face")]
    pub face: FaceTier,
    /// Build finger modules.
    #[serde(default = "default_true")]
    pub fingers: bool,
    /// Build spring corrective joints.
    #[serde(default = "default_true")]
    pub springs: bool,
    /// Upper arm twist joint count, 0..=3.
    #[serde(default = "default_three")]
    pub twist_upperarm: u8,
    /// Forearm twist joint count, 0..=3.
    #[serde(default = "default_three")]
    pub twist_forearm: u8,
    /// Thigh twist joint count, 0..=3.
    #[serde(default = "default_three")]
    pub twist_thigh: u8,
    /// Shin twist joint count, 0..=3.
    #[serde(default = "default_one")]
    pub twist_shin: u8,
    /// Build the single neck twist joint.
    #[serde(default = "default_true")]
    pub twist_neck: bool,
    /// Distance from the mid joint to the IK pole target.
    #[serde(default = "default_pole_distance")]
    pub pole_target_distance: f32,
    /// Elbow hyperextension allowance, degrees.
    #[serde(default = "default_bend_back")]
    pub forearm_bend_back_limit: f32,
    /// Knee hyperextension allowance, degrees.
    #[serde(default = "default_bend_back")]
    pub shin_bend_back_limit: f32,
}

fn default_face() -> FaceTier {
    FaceTier::Full
}

fn default_true() -> bool {
    true
}

fn default_three() -> u8 {
    3
}

fn default_one() -> u8 {
    1
}

fn default_pole_distance() -> f32 {
    0.5
}

fn default_bend_back() -> f32 {
    30.0
}

impl Default for RigOptions {
    fn default() -> Self {
        Self {
            face: default_face(),
            fingers: true,
            springs: true,
            twist_upperarm: 3,
            twist_forearm: 3,
            twist_thigh: 3,
            twist_shin: 1,
            twist_neck: true,
            pole_target_distance: default_pole_distance(),
            forearm_bend_back_limit: default_bend_back(),
            shin_bend_back_limit: default_bend_back(),
        }
    }
}

impl RigOptions {
    /// Sets the face tier.
    pub fn with_face(mut self, face: FaceTier) -> Self {
        self.face = face;
        self
    }

    /// Enables or disables finger modules.
    pub fn with_fingers(mut self, fingers: bool) -> Self {
        self.fingers = fingers;
        self
    }

    /// Enables or disables spring correctives.
    pub fn with_springs(mut self, springs: bool) -> Self {
        self.springs = springs;
        self
    }

    /// Sets all four limb twist counts at once.
    pub fn with_twist_counts(mut self, upperarm: u8, forearm: u8, thigh: u8, shin: u8) -> Self {
        self.twist_upperarm = upperarm;
        self.twist_forearm = forearm;
        self.twist_thigh = thigh;
        self.twist_shin = shin;
        self
    }

    /// Enables or disables the neck twist joint.
    pub fn with_twist_neck(mut self, twist_neck: bool) -> Self {
        self.twist_neck = twist_neck;
        self
    }

    /// A bare rig: no face, no fingers, no springs, no twists.
    pub fn minimal() -> Self {
        Self::default()
            .with_face(FaceTier::None)
            .with_fingers(false)
            .with_springs(false)
            .with_twist_counts(0, 0, 0, 0)
            .with_twist_neck(false)
    }
}
