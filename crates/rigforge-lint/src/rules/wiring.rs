//! Constraint and driver wiring rules.
//!
//! The document stores targets by name, so a renamed or deleted joint
//! leaves dangling edges the host engine will reject or silently skip.
//! The switch rule goes further and evaluates the mute expressions of
//! each FK/IK bind pair over a value grid to prove the regions never
//! drive both binds at once.

use std::collections::{BTreeMap, HashSet};

use crate::report::{LintIssue, Severity};
use crate::rules::RigLintRule;
use rigforge_backend_biped::constraint::ConstraintKind;
use rigforge_backend_biped::drivers::{evaluate, Driver, DriverTarget};
use rigforge_backend_biped::ControlRig;

/// Grid resolution for the switch overlap sweep.
const SWITCH_GRID_STEPS: usize = 20;

/// Returns all wiring rules.
pub fn all_rules() -> Vec<Box<dyn RigLintRule>> {
    vec![
        Box::new(DanglingConstraint),
        Box::new(DanglingDriver),
        Box::new(SwitchOverlap),
    ]
}

/// Every constraint target names an existing joint.
struct DanglingConstraint;

impl RigLintRule for DanglingConstraint {
    fn id(&self) -> &'static str {
        "wiring/dangling-constraint"
    }

    fn description(&self) -> &'static str {
        "Every constraint target and IK pole target names an existing joint"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, rig: &ControlRig) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let names: HashSet<&str> = rig.joints.iter().map(|j| j.name.as_str()).collect();

        for joint in &rig.joints {
            for constraint in &joint.constraints {
                let location = format!("joint:{} constraint:{}", joint.name, constraint.name);
                if let Some(target) = constraint.target.as_deref() {
                    if !names.contains(target) {
                        issues.push(
                            LintIssue::new(
                                self.id(),
                                self.default_severity(),
                                format!(
                                    "'{}' on '{}' targets missing joint '{target}'",
                                    constraint.name, joint.name
                                ),
                                "Point the constraint at an existing joint",
                            )
                            .at(location.clone()),
                        );
                    }
                }
                if let ConstraintKind::Ik {
                    pole_target: Some(pole),
                    ..
                } = &constraint.kind
                {
                    if !names.contains(pole.as_str()) {
                        issues.push(
                            LintIssue::new(
                                self.id(),
                                self.default_severity(),
                                format!(
                                    "IK solver on '{}' poles to missing joint '{pole}'",
                                    joint.name
                                ),
                                "Point the pole target at an existing joint",
                            )
                            .at(location),
                        );
                    }
                }
            }
        }
        issues
    }
}

/// Every driver reads a declared property and writes an existing
/// attribute.
struct DanglingDriver;

impl RigLintRule for DanglingDriver {
    fn id(&self) -> &'static str {
        "wiring/dangling-driver"
    }

    fn description(&self) -> &'static str {
        "Every driver reads a declared property and writes an existing attribute"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, rig: &ControlRig) -> Vec<LintIssue> {
        let mut issues = Vec::new();

        for (index, driver) in rig.drivers.iter().enumerate() {
            let location = format!("driver[{index}]");

            if rig.joint(&driver.prop.holder).is_none() {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!(
                            "driver reads '{}' on missing holder '{}'",
                            driver.prop.property, driver.prop.holder
                        ),
                        "Point the driver at an existing prop holder",
                    )
                    .at(location.clone()),
                );
            } else if rig
                .property(&driver.prop.holder, &driver.prop.property)
                .is_none()
            {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!(
                            "driver reads undeclared property '{}' on '{}'",
                            driver.prop.property, driver.prop.holder
                        ),
                        "Declare the property in the rig's property table",
                    )
                    .at(location.clone()),
                );
            }

            let joint_name = driver.target.joint();
            let Some(target_joint) = rig.joint(joint_name) else {
                issues.push(
                    LintIssue::new(
                        self.id(),
                        self.default_severity(),
                        format!("driver writes to missing joint '{joint_name}'"),
                        "Point the driver at an existing joint",
                    )
                    .at(location),
                );
                continue;
            };

            if let Some(constraint) = driver.target.constraint() {
                if target_joint.constraint(constraint).is_none() {
                    issues.push(
                        LintIssue::new(
                            self.id(),
                            self.default_severity(),
                            format!(
                                "driver writes to missing constraint '{constraint}' on '{joint_name}'"
                            ),
                            "Point the driver at an existing constraint",
                        )
                        .at(location.clone()),
                    );
                }
            }

            if let DriverTarget::LockChannel { index: channel, .. } = &driver.target {
                if *channel >= 3 {
                    issues.push(
                        LintIssue::new(
                            self.id(),
                            self.default_severity(),
                            format!("driver writes lock channel {channel} on '{joint_name}'"),
                            "Lock channels index the XYZ triple",
                        )
                        .at(location)
                        .with_actual_value(channel.to_string())
                        .with_expected_range("[0, 3)"),
                    );
                }
            }
        }
        issues
    }
}

/// FK/IK bind pairs must never drive both binds at the same switch
/// value.
struct SwitchOverlap;

impl RigLintRule for SwitchOverlap {
    fn id(&self) -> &'static str {
        "wiring/switch-overlap"
    }

    fn description(&self) -> &'static str {
        "Mute expressions of a switch-driven bind pair leave at most one bind active at any property value"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, rig: &ControlRig) -> Vec<LintIssue> {
        let mut issues = Vec::new();

        // Bind pairs: mute drivers sharing a source property and an
        // owning joint.
        let mut groups: BTreeMap<(&str, &str, &str), Vec<&Driver>> = BTreeMap::new();
        for driver in &rig.drivers {
            if let DriverTarget::ConstraintMute { joint, .. } = &driver.target {
                groups
                    .entry((
                        driver.prop.holder.as_str(),
                        driver.prop.property.as_str(),
                        joint.as_str(),
                    ))
                    .or_default()
                    .push(driver);
            }
        }

        for ((holder, property, joint), drivers) in groups {
            if drivers.len() < 2 {
                continue;
            }
            let (min, max) = rig
                .property(holder, property)
                .map(|def| (def.min, def.max))
                .unwrap_or((0.0, 2.0));

            for step in 0..=SWITCH_GRID_STEPS {
                let v = min + (max - min) * step as f32 / SWITCH_GRID_STEPS as f32;
                let mut active: Vec<String> = Vec::new();
                let mut broken = false;
                for driver in &drivers {
                    match evaluate(&driver.expression, v) {
                        // Nonzero mutes, so zero means the bind is live.
                        Ok(value) if value < 0.5 => {
                            let name = driver.target.constraint().unwrap_or("?");
                            active.push(format!("'{name}'"));
                        }
                        Ok(_) => {}
                        Err(err) => {
                            issues.push(
                                LintIssue::new(
                                    self.id(),
                                    self.default_severity(),
                                    format!(
                                        "mute expression '{}' on '{joint}' does not evaluate: {err}",
                                        driver.expression
                                    ),
                                    "Fix the expression so the switch sweep can run",
                                )
                                .at(format!("joint:{joint}")),
                            );
                            broken = true;
                        }
                    }
                }
                if broken {
                    break;
                }
                if active.len() > 1 {
                    issues.push(
                        LintIssue::new(
                            self.id(),
                            self.default_severity(),
                            format!(
                                "{} stay active together on '{joint}' at {property}={v:.2}",
                                active.join(" and ")
                            ),
                            "Adjust the mute expressions so the switch regions do not overlap",
                        )
                        .at(format!("joint:{joint}"))
                        .with_actual_value(format!("{} active", active.len()))
                        .with_expected_range("at most 1 active"),
                    );
                    break;
                }
            }
        }
        issues
    }
}
