//! The generated rig document.
//!
//! `ControlRig` is what synthesis hands back: the full joint graph plus
//! module records, drivers, and display metadata. It serializes to JSON
//! and round-trips, so downstream tools (snap, lint, exporters) consume
//! it without touching the builder.

use serde::{Deserialize, Serialize};

use rigforge_spec::RigStamp;

use crate::drivers::{Driver, PropertyDef};
use crate::graph::Joint;

/// Bone group color themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTheme {
    Gray,
    Red,
    Blue,
    Green,
    Yellow,
    Orange,
    Purple,
    Pink,
    Teal,
}

/// A display group joints can belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneGroup {
    pub name: String,
    pub theme: ColorTheme,
}

impl BoneGroup {
    pub fn new(name: impl Into<String>, theme: ColorTheme) -> Self {
        Self {
            name: name.into(),
            theme,
        }
    }
}

/// Stock group names.
pub mod groups {
    use rigforge_spec::Side;

    pub const BASE: &str = "base";
    pub const FK: &str = "fk";
    pub const CENTRAL_IK: &str = "ik_c";
    pub const LEFT_IK: &str = "ik_l";
    pub const RIGHT_IK: &str = "ik_r";
    pub const TWIST: &str = "twist";
    pub const SPRING: &str = "spring";
    pub const IK_PROP: &str = "ik_prop";
    pub const FACE: &str = "face";
    pub const TARGET: &str = "target";

    /// IK group for one body side.
    pub fn side_ik(side: Side) -> &'static str {
        match side {
            Side::Left => LEFT_IK,
            Side::Right => RIGHT_IK,
        }
    }
}

/// The default group registry.
pub fn default_groups() -> Vec<BoneGroup> {
    vec![
        BoneGroup::new(groups::BASE, ColorTheme::Gray),
        BoneGroup::new(groups::FK, ColorTheme::Green),
        BoneGroup::new(groups::CENTRAL_IK, ColorTheme::Yellow),
        BoneGroup::new(groups::LEFT_IK, ColorTheme::Red),
        BoneGroup::new(groups::RIGHT_IK, ColorTheme::Blue),
        BoneGroup::new(groups::TWIST, ColorTheme::Purple),
        BoneGroup::new(groups::SPRING, ColorTheme::Orange),
        BoneGroup::new(groups::IK_PROP, ColorTheme::Teal),
        BoneGroup::new(groups::FACE, ColorTheme::Pink),
        BoneGroup::new(groups::TARGET, ColorTheme::Gray),
    ]
}

/// Extra snap slots a leg adds on top of the limb record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootSnap {
    /// FK-space duplicate of the IK main control, snapped to in IK->FK.
    pub snap_target: String,
    /// The IK main foot control.
    pub ik_main: String,
    /// The roll dial.
    pub roll_main: String,
}

/// Snap record for a three-joint limb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimbSnap {
    pub fk_chain: [String; 3],
    pub ik_chain: [String; 3],
    pub pole: String,
    pub ik_target: String,
    pub fk_end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foot: Option<FootSnap>,
}

impl LimbSnap {
    /// The stable 12-slot layout the snap tool reads: FK chain, IK chain,
    /// pole, IK target, FK end, then the three foot slots when present.
    pub fn slots(&self) -> [Option<&str>; 12] {
        let mut slots: [Option<&str>; 12] = [None; 12];
        for (i, name) in self.fk_chain.iter().enumerate() {
            slots[i] = Some(name);
        }
        for (i, name) in self.ik_chain.iter().enumerate() {
            slots[3 + i] = Some(name);
        }
        slots[6] = Some(&self.pole);
        slots[7] = Some(&self.ik_target);
        slots[8] = Some(&self.fk_end);
        if let Some(foot) = &self.foot {
            slots[9] = Some(&foot.snap_target);
            slots[10] = Some(&foot.ik_main);
            slots[11] = Some(&foot.roll_main);
        }
        slots
    }
}

/// Snap metadata attached to a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapInfo {
    /// A limb with the 12-slot record.
    ThreeJointLimb(LimbSnap),
    /// Plain (fk, ik) joint pairs, one per chain link.
    JointPairs { pairs: Vec<(String, String)> },
}

/// One built module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: String,
    /// Joint holding this module's animator properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prop_joint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDef>,
    /// Joints animators interact with, in presentation order.
    pub relevant_joints: Vec<String>,
    /// A module can carry several snap records, e.g. a limb record plus
    /// a toe pair record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snap: Vec<SnapInfo>,
    /// True when the module exposes an FK/IK/bind switch.
    #[serde(default)]
    pub switchable: bool,
}

/// A property definition together with the joint that holds it.
///
/// Most properties sit on module prop holders, but limit toggles live on
/// the control joints themselves; this table covers both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyBinding {
    pub holder: String,
    #[serde(flatten)]
    pub def: PropertyDef,
}

/// The synthesized rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRig {
    /// Rig name, derived from the source skeleton name.
    pub name: String,
    /// Name of the skeleton this was generated from.
    pub source_skeleton: String,
    /// Canonical hash of the inputs that produced this rig.
    pub input_hash: String,
    pub stamp: RigStamp,
    pub joints: Vec<Joint>,
    pub modules: Vec<ModuleRecord>,
    /// Every animator property, including ones held outside module prop
    /// joints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyBinding>,
    pub drivers: Vec<Driver>,
    pub groups: Vec<BoneGroup>,
    /// Layers left visible for the animator.
    pub visible_layers: Vec<u8>,
    /// Non-fatal observations from the build (missed sizing rays and the
    /// like).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl ControlRig {
    /// Canonical BLAKE3 hash of the serialized document. Two rigs built
    /// from identical inputs hash identically.
    pub fn canonical_hash(&self) -> Result<String, rigforge_spec::SpecError> {
        let value = serde_json::to_value(self)?;
        rigforge_spec::hash::canonical_value_hash(&value)
    }

    /// Looks up a joint by name.
    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.name == name)
    }

    /// Looks up a property definition by holder joint and name.
    pub fn property(&self, holder: &str, name: &str) -> Option<&PropertyDef> {
        self.properties
            .iter()
            .find(|p| p.holder == holder && p.def.name == name)
            .map(|p| &p.def)
    }

    /// Looks up a module by name.
    pub fn module(&self, name: &str) -> Option<&ModuleRecord> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// All joints tagged with a module name.
    pub fn joints_of_module<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a Joint> {
        self.joints
            .iter()
            .filter(move |j| j.module.as_deref() == Some(module))
    }
}
