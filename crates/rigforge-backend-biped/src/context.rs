//! Shared build state.
//!
//! `RigBuildContext` carries the joint graph, the surface probe, the
//! options, and everything accumulated while modules run: records,
//! drivers, registered properties, and notes. Modules receive it
//! mutably and never touch globals.

use rigforge_spec::{RigStamp, SourceSkeleton};

use crate::constants::{layers, MODULE_PROP_BONE_SIZE};
use crate::drivers::{expr, Driver, DriverTarget, LockAttribute, PropRef, PropertyDef};
use crate::error::{RigError, RigResult};
use crate::graph::{JointGraph, JointRole, TransformLocks};
use crate::naming;
use crate::raycast::SurfaceProbe;
use crate::rig::{default_groups, ControlRig, ModuleRecord, PropertyBinding};
use crate::shapes::{self, ReferencePoint, ShapeBinding, ShapeSizing, ShapeSpec};

use rigforge_spec::RigOptions;

/// One-call joint configuration, applied after a joint is created or
/// duplicated.
#[derive(Debug, Clone, Default)]
pub struct JointSettings {
    pub layer: u8,
    pub group: Option<String>,
    pub deform: bool,
    pub lock_location: bool,
    pub lock_rotation: bool,
    pub lock_scale: bool,
    pub role: Option<JointRole>,
    pub shape: Option<ShapeSpec>,
}

impl JointSettings {
    pub fn on_layer(layer: u8) -> Self {
        Self {
            layer,
            ..Self::default()
        }
    }

    pub fn group(mut self, name: &str) -> Self {
        self.group = Some(name.to_string());
        self
    }

    pub fn deforming(mut self) -> Self {
        self.deform = true;
        self
    }

    /// Locks whole channel triples.
    pub fn lock(mut self, location: bool, rotation: bool, scale: bool) -> Self {
        self.lock_location = location;
        self.lock_rotation = rotation;
        self.lock_scale = scale;
        self
    }

    pub fn lock_all(self) -> Self {
        self.lock(true, true, true)
    }

    pub fn role(mut self, role: JointRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn shape(mut self, spec: ShapeSpec) -> Self {
        self.shape = Some(spec);
        self
    }
}

/// Constraint attribute a property can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintAttr {
    Influence,
    Mute,
}

/// Name flavor of a module's middle visibility category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlStyle {
    Ik,
    Ctrl,
}

impl CtrlStyle {
    fn token(self) -> &'static str {
        match self {
            CtrlStyle::Ik => "ik",
            CtrlStyle::Ctrl => "ctrl",
        }
    }
}

/// Build state threaded through every module.
pub struct RigBuildContext<'a> {
    skeleton: &'a SourceSkeleton,
    pub options: &'a RigOptions,
    probe: &'a dyn SurfaceProbe,
    pub graph: JointGraph,
    modules: Vec<ModuleRecord>,
    drivers: Vec<Driver>,
    props: Vec<(PropRef, PropertyDef)>,
    notes: Vec<String>,
    /// Layers the finalize step leaves visible.
    pub visible_layers: Vec<u8>,
}

impl<'a> RigBuildContext<'a> {
    /// Seeds the context from validated inputs.
    pub fn new(
        skeleton: &'a SourceSkeleton,
        options: &'a RigOptions,
        probe: &'a dyn SurfaceProbe,
    ) -> RigResult<Self> {
        Ok(Self {
            skeleton,
            options,
            probe,
            graph: JointGraph::from_source(skeleton)?,
            modules: Vec::new(),
            drivers: Vec::new(),
            props: Vec::new(),
            notes: Vec::new(),
            visible_layers: Vec::new(),
        })
    }

    pub fn skeleton(&self) -> &SourceSkeleton {
        self.skeleton
    }

    pub fn probe(&self) -> &dyn SurfaceProbe {
        self.probe
    }

    /// Records a non-fatal build observation.
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    /// Applies layer, group, locks, role, and shape to a joint.
    pub fn apply_settings(&mut self, joint: &str, settings: &JointSettings) -> RigResult<()> {
        // Resolve the shape first; sizing reads the joint immutably.
        let resolved_shape = match &settings.shape {
            Some(spec) => Some(self.resolve_shape(joint, *spec)?),
            None => None,
        };

        let j = self.graph.joint_mut(joint)?;
        j.layer = settings.layer;
        j.group = settings.group.clone();
        j.deform = settings.deform;
        j.locks = TransformLocks::from_flags(
            settings.lock_location,
            settings.lock_rotation,
            settings.lock_scale,
        );
        if settings.role.is_some() {
            j.role = settings.role;
        }
        if resolved_shape.is_some() {
            j.shape = resolved_shape;
        }
        Ok(())
    }

    /// Sizes a shape spec against the skin and creates the anchor leaf
    /// when the proxy is decoupled from the joint's head.
    fn resolve_shape(&mut self, joint: &str, spec: ShapeSpec) -> RigResult<ShapeBinding> {
        let j = self.graph.joint(joint)?;
        let head = j.head;
        let tail = j.tail;
        let roll = j.roll;
        let basis = j.matrix();

        let scale = match spec.sizing {
            ShapeSizing::Manual { scale } => scale,
            ShapeSizing::Auto { offset } => {
                let origin = spec.reference.position(head, tail);
                let sized = shapes::auto_shape_scale(self.probe, origin, basis, offset);
                if sized.missed {
                    self.note(format!(
                        "geometry query miss while sizing '{joint}', fallback scale used"
                    ));
                }
                sized.scale
            }
        };

        let anchor = if spec.reference == ReferencePoint::Head {
            None
        } else {
            let name = format!("shape_{joint}");
            let (a, b) = shapes::anchor_endpoints(head, tail, spec.reference);
            self.graph.create(&name, a, b, roll, Some(joint))?;
            self.apply_settings(&name, &JointSettings::on_layer(layers::MISC).lock_all())?;
            Some(name)
        };

        Ok(ShapeBinding {
            style: spec.style,
            scale,
            anchor,
        })
    }

    /// Creates the hidden property holder joint for a module.
    pub fn create_module_prop_joint(&mut self, module: &str) -> RigResult<String> {
        let name = naming::module_props(module);
        let parent = self.graph.contains("root").then_some("root");
        self.graph.create(
            &name,
            glam::Vec3::ZERO,
            glam::Vec3::new(0.0, MODULE_PROP_BONE_SIZE, 0.0),
            0.0,
            parent,
        )?;
        self.apply_settings(
            &name,
            &JointSettings::on_layer(layers::MODULE_PROP).lock_all(),
        )?;
        Ok(name)
    }

    /// Registers a finished module.
    pub fn register_module(&mut self, record: ModuleRecord) {
        self.modules.push(record);
    }

    /// First registration of a property wins; later calls reuse it.
    fn register_prop(&mut self, holder: &str, prop: PropertyDef) -> PropRef {
        let key = PropRef::new(holder, prop.name.clone());
        if !self.props.iter().any(|(k, _)| *k == key) {
            self.props.push((key.clone(), prop));
        }
        key
    }

    /// Wires a property to a constraint attribute on a joint.
    pub fn prop_to_drive_constraint(
        &mut self,
        holder: &str,
        prop: PropertyDef,
        joint: &str,
        constraint: &str,
        attribute: ConstraintAttr,
        expression: &str,
    ) -> RigResult<()> {
        if !self.graph.contains(holder) {
            return Err(RigError::unknown_joint(holder));
        }
        let j = self.graph.joint(joint)?;
        if j.constraint(constraint).is_none() {
            return Err(RigError::unknown_constraint(joint, constraint));
        }
        let prop = self.register_prop(holder, prop);
        let target = match attribute {
            ConstraintAttr::Influence => DriverTarget::ConstraintInfluence {
                joint: joint.to_string(),
                constraint: constraint.to_string(),
            },
            ConstraintAttr::Mute => DriverTarget::ConstraintMute {
                joint: joint.to_string(),
                constraint: constraint.to_string(),
            },
        };
        self.drivers.push(Driver::new(prop, expression, target));
        Ok(())
    }

    /// Wires a property to one slot of a lock triple.
    pub fn prop_to_drive_lock_channel(
        &mut self,
        holder: &str,
        prop: PropertyDef,
        joint: &str,
        attribute: LockAttribute,
        index: u8,
        expression: &str,
    ) -> RigResult<()> {
        if !self.graph.contains(holder) {
            return Err(RigError::unknown_joint(holder));
        }
        if !self.graph.contains(joint) {
            return Err(RigError::unknown_joint(joint));
        }
        let prop = self.register_prop(holder, prop);
        self.drivers.push(Driver::new(
            prop,
            expression,
            DriverTarget::LockChannel {
                joint: joint.to_string(),
                attribute,
                index,
            },
        ));
        Ok(())
    }

    /// Wires a property to a joint's hide flag.
    pub fn prop_to_drive_hide(
        &mut self,
        holder: &str,
        prop: PropertyDef,
        joint: &str,
        expression: &str,
    ) -> RigResult<()> {
        if !self.graph.contains(holder) {
            return Err(RigError::unknown_joint(holder));
        }
        if !self.graph.contains(joint) {
            return Err(RigError::unknown_joint(joint));
        }
        let prop = self.register_prop(holder, prop);
        self.drivers.push(Driver::new(
            prop,
            expression,
            DriverTarget::JointHide {
                joint: joint.to_string(),
            },
        ));
        Ok(())
    }

    /// Exposes visibility toggles for a module's animator-facing joints.
    ///
    /// Relevant joints partition by role into fk, ik-or-ctrl, and touch
    /// categories; each non-empty category gets one boolean property
    /// whose hide drivers invert it.
    pub fn bone_visibility(
        &mut self,
        holder: &str,
        module: &str,
        relevant: &[String],
        style: CtrlStyle,
    ) -> RigResult<()> {
        let mut fk_joints = Vec::new();
        let mut mid_joints = Vec::new();
        let mut touch_joints = Vec::new();
        for name in relevant {
            match self.graph.joint(name)?.role {
                Some(JointRole::Fk) => fk_joints.push(name.clone()),
                Some(JointRole::Touch) => touch_joints.push(name.clone()),
                Some(JointRole::Ik) | Some(JointRole::Ctrl) | Some(JointRole::IkProp) => {
                    mid_joints.push(name.clone())
                }
                _ => {}
            }
        }

        let categories = [
            (format!("visible_fk_{module}"), fk_joints),
            (format!("visible_{}_{module}", style.token()), mid_joints),
            (format!("visible_touch_{module}"), touch_joints),
        ];
        for (prop_name, joints) in categories {
            for joint in &joints {
                let prop = PropertyDef::new(
                    &prop_name,
                    0.0,
                    1.0,
                    1.0,
                    format!("show {module} controls"),
                );
                self.prop_to_drive_hide(holder, prop, joint, expr::INVERTED)?;
            }
        }
        Ok(())
    }

    /// Tags joints with the module that owns them.
    pub fn set_module_on_joints(&mut self, module: &str, joints: &[String]) -> RigResult<()> {
        for name in joints {
            self.graph.joint_mut(name)?.module = Some(module.to_string());
        }
        Ok(())
    }

    /// Seals the build into a rig document.
    pub fn finish(self, input_hash: String) -> RigResult<ControlRig> {
        self.graph.verify_acyclic()?;

        let mut modules = self.modules;
        for module in &mut modules {
            if let Some(holder) = &module.prop_joint {
                module.properties = self
                    .props
                    .iter()
                    .filter(|(key, _)| key.holder == *holder)
                    .map(|(_, def)| def.clone())
                    .collect();
            }
        }

        let properties = self
            .props
            .into_iter()
            .map(|(key, def)| PropertyBinding {
                holder: key.holder,
                def,
            })
            .collect();

        Ok(ControlRig {
            name: format!("{}_rig", self.skeleton.name),
            source_skeleton: self.skeleton.name.clone(),
            input_hash,
            stamp: RigStamp::Generated,
            joints: self.graph.into_joints(),
            modules,
            properties,
            drivers: self.drivers,
            groups: default_groups(),
            visible_layers: self.visible_layers,
            notes: self.notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Constraint;
    use crate::raycast::NullProbe;
    use rigforge_spec::SkeletonPreset;

    fn test_context(
        skeleton: &SourceSkeleton,
        options: &RigOptions,
    ) -> RigBuildContext<'static> {
        // Tests only need 'a to outlive the call, so leak the fixtures.
        let skeleton: &'static SourceSkeleton = Box::leak(Box::new(skeleton.clone()));
        let options: &'static RigOptions = Box::leak(Box::new(options.clone()));
        RigBuildContext::new(skeleton, options, &NullProbe).unwrap()
    }

    #[test]
    fn test_apply_settings_with_anchored_shape() {
        let skeleton = SkeletonPreset::BipedV1.source_skeleton();
        let options = RigOptions::default();
        let mut ctx = test_context(&skeleton, &options);

        let settings = JointSettings::on_layer(layers::FK)
            .group("fk")
            .shape(ShapeSpec::manual(crate::shapes::ShapeStyle::Circle, 0.2));
        ctx.apply_settings("hips", &settings).unwrap();

        let hips = ctx.graph.joint("hips").unwrap();
        assert_eq!(hips.layer, layers::FK);
        let binding = hips.shape.as_ref().expect("shape bound");
        assert_eq!(binding.anchor.as_deref(), Some("shape_hips"));

        let anchor = ctx.graph.joint("shape_hips").unwrap();
        assert_eq!(anchor.layer, layers::MISC);
        assert!(anchor.locks.location.iter().all(|l| *l));
        assert!(!anchor.deform);
    }

    #[test]
    fn test_auto_sizing_miss_records_note() {
        let skeleton = SkeletonPreset::BipedV1.source_skeleton();
        let options = RigOptions::default();
        let mut ctx = test_context(&skeleton, &options);

        let settings = JointSettings::on_layer(layers::CTRL_IK).shape(
            ShapeSpec::auto(crate::shapes::ShapeStyle::Cube, 0.05).at(ReferencePoint::Head),
        );
        ctx.apply_settings("hips", &settings).unwrap();

        let rig = ctx.finish("hash".into()).unwrap();
        assert!(rig.notes.iter().any(|n| n.contains("geometry query miss")));
        let hips = rig.joint("hips").unwrap();
        let binding = hips.shape.as_ref().unwrap();
        assert!(binding.anchor.is_none());
        assert_eq!(binding.scale, crate::constants::FALLBACK_SHAPE_SCALE);
    }

    #[test]
    fn test_prop_drivers_validate_targets() {
        let skeleton = SkeletonPreset::BipedV1.source_skeleton();
        let options = RigOptions::default();
        let mut ctx = test_context(&skeleton, &options);

        let holder = ctx.create_module_prop_joint("leg_l").unwrap();
        assert_eq!(holder, "module_props__leg_l");

        // No such constraint yet.
        let err = ctx
            .prop_to_drive_constraint(
                &holder,
                PropertyDef::new("switch_leg_l", 0.0, 2.0, 0.0, "0:fk, 1:ik, 2:base"),
                "toes_l",
                "bind_to_fk_1",
                ConstraintAttr::Mute,
                expr::FK_MUTE,
            )
            .unwrap_err();
        assert!(matches!(err, RigError::UnknownConstraint { .. }));

        ctx.graph
            .add_constraint("toes_l", Constraint::copy_rotation("bind_to_fk_1", "hips"))
            .unwrap();
        ctx.prop_to_drive_constraint(
            &holder,
            PropertyDef::new("switch_leg_l", 0.0, 2.0, 0.0, "0:fk, 1:ik, 2:base"),
            "toes_l",
            "bind_to_fk_1",
            ConstraintAttr::Mute,
            expr::FK_MUTE,
        )
        .unwrap();
        assert_eq!(ctx.drivers().len(), 1);
    }

    #[test]
    fn test_bone_visibility_splits_by_role() {
        let skeleton = SkeletonPreset::BipedV1.source_skeleton();
        let options = RigOptions::default();
        let mut ctx = test_context(&skeleton, &options);

        let holder = ctx.create_module_prop_joint("arm_l").unwrap();
        ctx.graph.joint_mut("upperarm_l").unwrap().role = Some(JointRole::Fk);
        ctx.graph.joint_mut("forearm_l").unwrap().role = Some(JointRole::Touch);
        ctx.graph.joint_mut("hand_l").unwrap().role = Some(JointRole::Ik);
        let relevant = vec![
            "upperarm_l".to_string(),
            "forearm_l".to_string(),
            "hand_l".to_string(),
        ];
        ctx.bone_visibility(&holder, "arm_l", &relevant, CtrlStyle::Ik)
            .unwrap();

        let props: Vec<&str> = ctx
            .drivers()
            .iter()
            .map(|d| d.prop.property.as_str())
            .collect();
        assert_eq!(
            props,
            vec!["visible_fk_arm_l", "visible_ik_arm_l", "visible_touch_arm_l"]
        );
        assert!(ctx.drivers().iter().all(|d| d.expression == expr::INVERTED));
    }

    #[test]
    fn test_property_registration_first_wins() {
        let skeleton = SkeletonPreset::BipedV1.source_skeleton();
        let options = RigOptions::default();
        let mut ctx = test_context(&skeleton, &options);

        let holder = ctx.create_module_prop_joint("arm_l").unwrap();
        for default in [0.3, 0.9] {
            ctx.prop_to_drive_hide(
                &holder,
                PropertyDef::new("fixate_arm_l", 0.0, 1.0, default, "first wins"),
                "hips",
                expr::DIRECT,
            )
            .unwrap();
        }
        let record = ModuleRecord {
            name: "arm_l".into(),
            prop_joint: Some(holder),
            properties: Vec::new(),
            relevant_joints: Vec::new(),
            snap: Vec::new(),
            switchable: false,
        };
        ctx.register_module(record);
        let rig = ctx.finish("hash".into()).unwrap();
        let module = rig.module("arm_l").unwrap();
        assert_eq!(module.properties.len(), 1);
        assert_eq!(module.properties[0].default, 0.3);
    }
}
