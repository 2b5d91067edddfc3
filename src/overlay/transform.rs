// SPDX-License-Identifier: GPL-3.0-only

//! Gesture-driven placement of the overlay mask
//!
//! Pan, pinch and rotation are independent gesture families that may run at
//! the same time. Each one keeps its own phase:
//!
//! ```text
//! Idle ──changed──▶ Active { baseline } ──changed──▶ Active { baseline }
//!   ▲                                                     │
//!   └──────────────────────── ended ──────────────────────┘
//! ```
//!
//! While active, the live value for that axis is `combine(baseline, delta)`,
//! where `baseline` is the axis value when the gesture started. Ending the
//! gesture commits the live value as the new resting state.

/// 2-D offset in view points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Vector2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Overlay placement: offset, uniform scale and rotation (radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub translation: Vector2,
    /// Never negative
    pub scale: f32,
    pub rotation: f32,
}

impl TransformState {
    pub const IDENTITY: Self = Self {
        translation: Vector2::ZERO,
        scale: 1.0,
        rotation: 0.0,
    };
}

impl Default for TransformState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Phase of one gesture family
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GesturePhase<T> {
    #[default]
    Idle,
    Active {
        baseline: T,
    },
}

impl<T: Copy> GesturePhase<T> {
    /// Baseline of the running gesture, starting one from `current` if idle
    fn baseline_or_start(&mut self, current: T) -> T {
        match *self {
            GesturePhase::Active { baseline } => baseline,
            GesturePhase::Idle => {
                *self = GesturePhase::Active { baseline: current };
                current
            }
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, GesturePhase::Active { .. })
    }
}

/// Translation gestures add
pub fn combine_translation(baseline: Vector2, delta: Vector2) -> Vector2 {
    baseline + delta
}

/// Pinch gestures multiply; the result is clamped at zero
pub fn combine_scale(baseline: f32, magnification: f32) -> f32 {
    let scale = baseline * magnification;
    if scale.is_nan() { baseline } else { scale.max(0.0) }
}

/// Rotation gestures add
pub fn combine_rotation(baseline: f32, delta: f32) -> f32 {
    baseline + delta
}

/// Persistent overlay transform driven by gesture deltas
#[derive(Debug, Clone, Default)]
pub struct TransformModel {
    state: TransformState,
    pan: GesturePhase<Vector2>,
    pinch: GesturePhase<f32>,
    rotate: GesturePhase<f32>,
}

impl TransformModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live transform, including any gestures in progress
    pub fn state(&self) -> TransformState {
        self.state
    }

    /// Pan moved; `translation` is the total since the pan began
    pub fn pan_changed(&mut self, translation: Vector2) {
        let baseline = self.pan.baseline_or_start(self.state.translation);
        self.state.translation = combine_translation(baseline, translation);
    }

    pub fn pan_ended(&mut self) {
        self.pan = GesturePhase::Idle;
    }

    /// Pinch changed; `magnification` is relative to the pinch start
    pub fn pinch_changed(&mut self, magnification: f32) {
        let baseline = self.pinch.baseline_or_start(self.state.scale);
        self.state.scale = combine_scale(baseline, magnification);
    }

    pub fn pinch_ended(&mut self) {
        self.pinch = GesturePhase::Idle;
    }

    /// Rotation changed; `angle` (radians) is the total since it began
    pub fn rotation_changed(&mut self, angle: f32) {
        let baseline = self.rotate.baseline_or_start(self.state.rotation);
        self.state.rotation = combine_rotation(baseline, angle);
    }

    pub fn rotation_ended(&mut self) {
        self.rotate = GesturePhase::Idle;
    }

    /// Back to identity, dropping any gesture in progress
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether any gesture family is mid-gesture
    pub fn is_interacting(&self) -> bool {
        self.pan.is_active() || self.pinch.is_active() || self.rotate.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pans_accumulate_across_gestures() {
        let mut model = TransformModel::new();
        model.pan_changed(Vector2::new(4.0, 4.0));
        model.pan_changed(Vector2::new(10.0, 10.0));
        model.pan_ended();
        model.pan_changed(Vector2::new(5.0, -5.0));
        model.pan_ended();

        assert_eq!(model.state().translation, Vector2::new(15.0, 5.0));
    }

    #[test]
    fn test_updates_combine_with_baseline_not_live_value() {
        let mut model = TransformModel::new();
        model.pinch_changed(2.0);
        model.pinch_changed(2.0);
        assert_eq!(model.state().scale, 2.0);
        model.pinch_ended();
        model.pinch_changed(1.5);
        assert_eq!(model.state().scale, 3.0);
    }

    #[test]
    fn test_simultaneous_gestures_touch_only_their_axis() {
        let mut model = TransformModel::new();
        model.pan_changed(Vector2::new(3.0, 0.0));
        model.pinch_changed(2.0);
        model.rotation_changed(0.5);
        model.pan_changed(Vector2::new(6.0, 1.0));
        model.rotation_ended();
        model.pinch_changed(0.5);

        let state = model.state();
        assert_eq!(state.translation, Vector2::new(6.0, 1.0));
        assert_eq!(state.scale, 0.5);
        assert_eq!(state.rotation, 0.5);
        assert!(model.is_interacting());
    }

    #[test]
    fn test_scale_never_negative() {
        let mut model = TransformModel::new();
        model.pinch_changed(-3.0);
        assert_eq!(model.state().scale, 0.0);
        assert_eq!(combine_scale(2.0, f32::NAN), 2.0);
    }

    #[test]
    fn test_reset_restores_identity_and_clears_baselines() {
        let mut model = TransformModel::new();
        model.pan_changed(Vector2::new(20.0, 20.0));
        model.pinch_changed(3.0);
        model.rotation_changed(1.0);

        model.reset();
        assert_eq!(model.state(), TransformState::IDENTITY);
        assert!(!model.is_interacting());

        // A new pan starts from zero, not from the abandoned baseline
        model.pan_changed(Vector2::new(1.0, 2.0));
        assert_eq!(model.state().translation, Vector2::new(1.0, 2.0));
    }
}
