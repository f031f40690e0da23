//! Calibration interaction state machine
//!
//! Every action moves `Idle -> Armed -> Idle`: arming registers a single
//! click capture, the next click on the image fires it exactly once and
//! disarms it. With [`ArmPolicy::Concurrent`] several actions can be armed at
//! the same time and one click resolves all of them, each independently and
//! in the order they were armed.

use crate::config::{CalibrationConfig, ConfigDocument};
use crate::domain::{
    CalibrationAction, Point, PointerPos, angle_from_center, normalize_angle_lower_bound,
    normalize_angle_ordering, to_relative,
};
use crate::error::Result;

/// Whether arming one action disarms the others
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArmPolicy {
    /// Any number of actions may wait for the same click
    #[default]
    Concurrent,
    /// Arming an action replaces whatever was armed before
    Exclusive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmState {
    Idle,
    /// Armed actions in registration order
    Armed(Vec<CalibrationAction>),
}

/// The field an action wrote
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldUpdate {
    CropTopLeft(Point),
    CropBottomRight(Point),
    Center(Point),
    StartAngle(f64),
    EndAngle(f64),
}

/// Outcome of one armed action resolved by a click
#[derive(Debug)]
pub struct Firing {
    pub action: CalibrationAction,
    pub outcome: Result<FieldUpdate>,
}

/// Fields that must already be calibrated before `action` makes sense
///
/// Each action needs what the one before it needs plus that action's own
/// field, so the earliest missing field is the one reported.
pub fn check_prerequisites(action: CalibrationAction, config: &CalibrationConfig) -> Result<()> {
    match action {
        CalibrationAction::CropStart | CalibrationAction::CropEnd => Ok(()),
        CalibrationAction::Center => config.crop_origin().map(|_| ()),
        CalibrationAction::StartAngle => {
            check_prerequisites(CalibrationAction::Center, config)?;
            config.require_center().map(|_| ())
        }
        CalibrationAction::EndAngle => {
            check_prerequisites(CalibrationAction::StartAngle, config)?;
            config.require_start_angle().map(|_| ())
        }
    }
}

/// Compute the field `action` owns from a click and write it into `config`
///
/// Only that one field is touched.
pub fn apply_click(
    action: CalibrationAction,
    click: PointerPos,
    config: &mut CalibrationConfig,
) -> Result<FieldUpdate> {
    check_prerequisites(action, config)?;
    let update = match action {
        CalibrationAction::CropStart => {
            let corner = click.round();
            config.crop_mut().top_left = Some(corner);
            FieldUpdate::CropTopLeft(corner)
        }
        CalibrationAction::CropEnd => {
            let corner = click.round();
            config.crop_mut().bottom_right = Some(corner);
            FieldUpdate::CropBottomRight(corner)
        }
        CalibrationAction::Center => {
            let center = to_relative(click, config.crop_origin()?);
            config.center = Some(center);
            FieldUpdate::Center(center)
        }
        CalibrationAction::StartAngle => {
            let relative = click.offset_by(config.crop_origin()?);
            let angle =
                normalize_angle_lower_bound(angle_from_center(relative, config.require_center()?));
            config.start_angle = Some(angle);
            FieldUpdate::StartAngle(angle)
        }
        CalibrationAction::EndAngle => {
            let relative = click.offset_by(config.crop_origin()?);
            let raw =
                normalize_angle_lower_bound(angle_from_center(relative, config.require_center()?));
            let angle = normalize_angle_ordering(raw, config.require_start_angle()?);
            config.end_angle = Some(angle);
            FieldUpdate::EndAngle(angle)
        }
    };
    Ok(update)
}

#[derive(Debug, Clone, Default)]
pub struct CalibrationController {
    armed: Vec<CalibrationAction>,
    policy: ArmPolicy,
}

impl CalibrationController {
    pub fn new(policy: ArmPolicy) -> Self {
        Self {
            armed: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> ArmPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ArmPolicy) {
        self.policy = policy;
        if policy == ArmPolicy::Exclusive && self.armed.len() > 1 {
            // keep the most recently armed one
            self.armed.drain(..self.armed.len() - 1);
        }
    }

    pub fn state(&self) -> ArmState {
        if self.armed.is_empty() {
            ArmState::Idle
        } else {
            ArmState::Armed(self.armed.clone())
        }
    }

    pub fn armed(&self) -> &[CalibrationAction] {
        &self.armed
    }

    pub fn is_armed(&self, action: CalibrationAction) -> bool {
        self.armed.contains(&action)
    }

    /// Register a single click capture for `action`
    ///
    /// Prerequisites are checked against `config` now and again when the
    /// click arrives. Arming an already armed action is a no-op.
    pub fn arm(&mut self, action: CalibrationAction, config: &CalibrationConfig) -> Result<()> {
        check_prerequisites(action, config)?;
        if self.is_armed(action) {
            log::debug!("{action} already armed");
            return Ok(());
        }
        if self.policy == ArmPolicy::Exclusive {
            self.armed.clear();
        }
        self.armed.push(action);
        log::debug!("Armed {action}, waiting for a click ({} armed)", self.armed.len());
        Ok(())
    }

    /// Returns whether `action` was armed
    pub fn disarm(&mut self, action: CalibrationAction) -> bool {
        let before = self.armed.len();
        self.armed.retain(|armed| *armed != action);
        let removed = self.armed.len() != before;
        if removed {
            log::debug!("Disarmed {action}");
        }
        removed
    }

    pub fn disarm_all(&mut self) {
        if !self.armed.is_empty() {
            log::debug!("Disarming {} action(s)", self.armed.len());
        }
        self.armed.clear();
    }

    /// Resolve every armed action with one click on the image
    ///
    /// Each action reads the document at click time, writes its own field and
    /// is disarmed whether or not it succeeded. Returns one firing per action
    /// in registration order; an empty vec means the click was not captured.
    pub fn handle_click(&mut self, click: PointerPos, document: &mut ConfigDocument) -> Vec<Firing> {
        let armed = std::mem::take(&mut self.armed);
        armed
            .into_iter()
            .map(|action| {
                let outcome = document.update(|config| apply_click(action, click, config));
                match &outcome {
                    Ok(update) => log::info!("{action} at ({}, {}) -> {update:?}", click.x, click.y),
                    Err(err) => log::warn!("{action} failed: {err}"),
                }
                Firing { action, outcome }
            })
            .collect()
    }
}
