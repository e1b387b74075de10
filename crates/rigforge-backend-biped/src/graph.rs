//! The joint graph.
//!
//! Joints are created in a flat name-indexed store; parent links form a
//! forest that must stay acyclic. All mutation goes through the graph so
//! name collisions, dangling references, and cycles are caught at build
//! time instead of surfacing in the exported document.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use rigforge_spec::SourceSkeleton;

use crate::constants::layers;
use crate::constraint::Constraint;
use crate::error::{RigError, RigResult};
use crate::math;
use crate::shapes::ShapeBinding;

/// What a joint is for, written into the document for downstream tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointRole {
    /// Deforming joint carried over from the source skeleton.
    Base,
    /// FK layer control.
    Fk,
    /// IK layer joint.
    Ik,
    /// General control.
    Ctrl,
    /// Twist deform joint.
    Twist,
    /// Spring corrective deform joint.
    Spring,
    /// Face joint.
    Face,
    /// Touch re-anchor control.
    Touch,
    /// Prop attachment joint.
    IkProp,
}

/// Transform channel locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformLocks {
    pub location: [bool; 3],
    pub rotation: [bool; 3],
    pub scale: [bool; 3],
}

impl TransformLocks {
    /// Nothing locked.
    pub fn none() -> Self {
        Self::default()
    }

    /// Everything locked.
    pub fn all() -> Self {
        Self::from_flags(true, true, true)
    }

    /// Locks whole channel triples.
    pub fn from_flags(location: bool, rotation: bool, scale: bool) -> Self {
        Self {
            location: [location; 3],
            rotation: [rotation; 3],
            scale: [scale; 3],
        }
    }
}

/// Per-axis IK degree-of-freedom restrictions, applied by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IkDof {
    /// X rotation range, radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_x: Option<(f32, f32)>,
    /// Lock Y rotation.
    #[serde(default)]
    pub lock_y: bool,
    /// Lock Z rotation.
    #[serde(default)]
    pub lock_z: bool,
}

/// One joint of the control rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    pub head: Vec3,
    pub tail: Vec3,
    #[serde(default)]
    pub roll: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// The one armature layer this joint lives on.
    pub layer: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub deform: bool,
    #[serde(default)]
    pub locks: TransformLocks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<JointRole>,
    /// Module that created or claimed this joint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ik_dof: Option<IkDof>,
    /// Hidden by default; visibility drivers flip this at runtime.
    #[serde(default)]
    pub hide: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
}

impl Joint {
    /// Head-to-tail vector.
    pub fn vector(&self) -> Vec3 {
        self.tail - self.head
    }

    /// Joint length.
    pub fn length(&self) -> f32 {
        self.vector().length()
    }

    /// Midpoint between head and tail.
    pub fn center(&self) -> Vec3 {
        (self.head + self.tail) * 0.5
    }

    /// Orientation basis of this joint.
    pub fn matrix(&self) -> glam::Mat3 {
        math::bone_matrix(self.head, self.tail, self.roll)
    }

    /// Local X axis.
    pub fn x_axis(&self) -> Vec3 {
        self.matrix().x_axis
    }

    /// Local Z axis.
    pub fn z_axis(&self) -> Vec3 {
        self.matrix().z_axis
    }

    /// Rest-pose world transform, basis plus head translation.
    pub fn world_matrix(&self) -> glam::Mat4 {
        let m = self.matrix();
        glam::Mat4::from_cols(
            m.x_axis.extend(0.0),
            m.y_axis.extend(0.0),
            m.z_axis.extend(0.0),
            self.head.extend(1.0),
        )
    }

    /// Looks up a constraint by name.
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }
}

/// Parent of a newly duplicated joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentSpec<'a> {
    /// Same parent as the source joint.
    SourceParent,
    /// An explicit joint.
    Joint(&'a str),
    /// No parent.
    Unparented,
}

/// Length of a duplicated joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMode {
    /// Same endpoints as the source.
    Full,
    /// Tail pulled back to the source midpoint.
    Half,
}

/// How subdivision joints are parented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubdivideParent {
    /// Every sub-joint parents to the source joint.
    Source,
    /// Sub-joints chain: the first to the source, the rest to the previous.
    Chain,
}

/// The joint store.
#[derive(Debug, Clone, Default)]
pub struct JointGraph {
    joints: Vec<Joint>,
    index: HashMap<String, usize>,
}

impl JointGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a graph from a source skeleton. Source joints arrive as
    /// deforming base-layer joints with their hierarchy intact; modules
    /// claim and configure them later.
    pub fn from_source(skeleton: &SourceSkeleton) -> RigResult<Self> {
        let mut graph = Self::new();
        for bone in &skeleton.bones {
            let joint = graph.create(
                &bone.name,
                bone.head_vec(),
                bone.tail_vec(),
                bone.roll,
                bone.parent.as_deref(),
            )?;
            joint.layer = layers::BASE;
            joint.deform = true;
        }
        Ok(graph)
    }

    /// Number of joints.
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// True when the graph holds no joints.
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// True if a joint with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Joints in creation order.
    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.iter()
    }

    /// Joint names in creation order.
    pub fn names(&self) -> Vec<&str> {
        self.joints.iter().map(|j| j.name.as_str()).collect()
    }

    /// Looks up a joint.
    pub fn joint(&self, name: &str) -> RigResult<&Joint> {
        self.index
            .get(name)
            .map(|&i| &self.joints[i])
            .ok_or_else(|| RigError::unknown_joint(name))
    }

    /// Looks up a joint mutably.
    pub fn joint_mut(&mut self, name: &str) -> RigResult<&mut Joint> {
        match self.index.get(name) {
            Some(&i) => Ok(&mut self.joints[i]),
            None => Err(RigError::unknown_joint(name)),
        }
    }

    /// Direct children of a joint, in creation order.
    pub fn children_of(&self, name: &str) -> Vec<&str> {
        self.joints
            .iter()
            .filter(|j| j.parent.as_deref() == Some(name))
            .map(|j| j.name.as_str())
            .collect()
    }

    /// Creates a joint. The new joint starts non-deforming on the misc
    /// layer; callers configure it afterwards.
    pub fn create(
        &mut self,
        name: &str,
        head: Vec3,
        tail: Vec3,
        roll: f32,
        parent: Option<&str>,
    ) -> RigResult<&mut Joint> {
        if self.contains(name) {
            return Err(RigError::duplicate_name(name));
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(RigError::unknown_joint(parent));
            }
        }
        let joint = Joint {
            name: name.to_string(),
            head,
            tail,
            roll,
            parent: parent.map(str::to_string),
            layer: layers::MISC,
            group: None,
            deform: false,
            locks: TransformLocks::none(),
            role: None,
            module: None,
            shape: None,
            ik_dof: None,
            hide: false,
            constraints: Vec::new(),
        };
        self.index.insert(name.to_string(), self.joints.len());
        self.joints.push(joint);
        Ok(self.joints.last_mut().expect("just pushed"))
    }

    /// Duplicates `source` as `new_name`. The duplicate copies endpoints
    /// and roll only; constraints, shape, and settings do not carry over.
    pub fn duplicate(
        &mut self,
        source: &str,
        new_name: &str,
        parent: ParentSpec,
        length: LengthMode,
    ) -> RigResult<&mut Joint> {
        let src = self.joint(source)?;
        let head = src.head;
        let tail = match length {
            LengthMode::Full => src.tail,
            LengthMode::Half => src.center(),
        };
        let roll = src.roll;
        let src_parent = src.parent.clone();

        let parent_name = match parent {
            ParentSpec::SourceParent => src_parent,
            ParentSpec::Joint(p) => Some(p.to_string()),
            ParentSpec::Unparented => None,
        };
        self.create(new_name, head, tail, roll, parent_name.as_deref())
    }

    /// Splits `source` into `n` equal sub-joints named
    /// `{prefix}_{index}_{source}` and keeps `keep` of them.
    ///
    /// Forward numbering runs 1..=n from the head and keeps the joints
    /// nearest the head; reversed numbering runs n..=1 so index 1 sits at
    /// the tail and the kept joints cluster there. Kept names come back
    /// ordered by index. With `delete_source`, children of the source move
    /// to the kept joint nearest the source tail.
    #[allow(clippy::too_many_arguments)]
    pub fn subdivide(
        &mut self,
        source: &str,
        n: u8,
        keep: u8,
        reversed: bool,
        prefix: &str,
        parenting: SubdivideParent,
        delete_source: bool,
    ) -> RigResult<Vec<String>> {
        if n == 0 || keep == 0 {
            return Ok(Vec::new());
        }
        let keep = keep.min(n);
        let src = self.joint(source)?;
        let head = src.head;
        let tail = src.tail;
        let roll = src.roll;
        let src_parent = src.parent.clone();

        // (index, segment head, segment tail), segment k covers
        // [k/n, (k+1)/n] of the source span.
        let mut kept: Vec<(u8, Vec3, Vec3)> = Vec::new();
        for k in 0..n {
            let index = if reversed { n - k } else { k + 1 };
            if index > keep {
                continue;
            }
            let a = math::nth_point(head, tail, k as f32 / n as f32);
            let b = math::nth_point(head, tail, (k + 1) as f32 / n as f32);
            kept.push((index, a, b));
        }
        kept.sort_by_key(|(index, _, _)| *index);

        let base_parent = if delete_source { src_parent.clone() } else { Some(source.to_string()) };
        let mut names = Vec::with_capacity(kept.len());
        let mut previous: Option<String> = None;
        for (index, a, b) in &kept {
            let name = format!("{}_{}_{}", prefix, index, source);
            let parent = match parenting {
                SubdivideParent::Source => base_parent.clone(),
                SubdivideParent::Chain => previous.clone().or_else(|| base_parent.clone()),
            };
            self.create(&name, *a, *b, roll, parent.as_deref())?;
            previous = Some(name.clone());
            names.push(name);
        }

        if delete_source {
            // The kept joint geometrically nearest the source tail adopts
            // the source's children.
            let adopter = kept
                .iter()
                .max_by(|x, y| {
                    let dx = (x.2 - tail).length_squared();
                    let dy = (y.2 - tail).length_squared();
                    dy.partial_cmp(&dx).unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(index, _, _)| format!("{}_{}_{}", prefix, index, source));
            if let Some(adopter) = adopter {
                let children: Vec<String> =
                    self.children_of(source).into_iter().map(str::to_string).collect();
                for child in children {
                    self.set_parent(&child, Some(&adopter))?;
                }
            }
            self.remove(source)?;
        }

        Ok(names)
    }

    /// Reparents a joint, rejecting cycles.
    pub fn set_parent(&mut self, child: &str, parent: Option<&str>) -> RigResult<()> {
        if !self.contains(child) {
            return Err(RigError::unknown_joint(child));
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(RigError::unknown_joint(parent));
            }
            // Walk up from the requested parent; meeting the child means
            // the new edge would close a loop.
            let mut current = Some(parent.to_string());
            while let Some(name) = current {
                if name == child {
                    return Err(RigError::ParentCycle {
                        child: child.to_string(),
                        parent: parent.to_string(),
                    });
                }
                current = self.joint(&name)?.parent.clone();
            }
        }
        self.joint_mut(child)?.parent = parent.map(str::to_string);
        Ok(())
    }

    /// Removes a childless joint and returns it.
    pub fn remove(&mut self, name: &str) -> RigResult<Joint> {
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| RigError::unknown_joint(name))?;
        if !self.children_of(name).is_empty() {
            return Err(RigError::JointHasChildren { name: name.to_string() });
        }
        let joint = self.joints.remove(i);
        self.index.remove(name);
        for (_, slot) in self.index.iter_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Ok(joint)
    }

    /// Mirrors a joint through a pivot point.
    pub fn mirror_to_point(&mut self, name: &str, pivot: Vec3) -> RigResult<()> {
        let joint = self.joint_mut(name)?;
        joint.head = math::mirror_point(joint.head, pivot);
        joint.tail = math::mirror_point(joint.tail, pivot);
        Ok(())
    }

    /// Translates a joint's endpoints.
    pub fn translate(&mut self, name: &str, offset: Vec3) -> RigResult<()> {
        let joint = self.joint_mut(name)?;
        joint.head += offset;
        joint.tail += offset;
        Ok(())
    }

    /// Appends a constraint to a joint.
    pub fn add_constraint(&mut self, joint: &str, constraint: Constraint) -> RigResult<()> {
        if let Some(target) = constraint.target.as_deref() {
            if !self.contains(target) {
                return Err(RigError::unknown_joint(target));
            }
        }
        self.joint_mut(joint)?.constraints.push(constraint);
        Ok(())
    }

    /// Verifies the whole parent forest is acyclic.
    pub fn verify_acyclic(&self) -> RigResult<()> {
        for joint in &self.joints {
            let mut steps = 0usize;
            let mut current = joint.parent.as_deref();
            while let Some(name) = current {
                steps += 1;
                if steps > self.joints.len() {
                    return Err(RigError::ParentCycle {
                        child: joint.name.clone(),
                        parent: name.to_string(),
                    });
                }
                current = self.joint(name)?.parent.as_deref();
            }
        }
        Ok(())
    }

    /// Consumes the graph into its joint list.
    pub fn into_joints(self) -> Vec<Joint> {
        self.joints
    }
}
