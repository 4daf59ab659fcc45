//! Animation-state selector handed to the presentation layer.

use serde::{Deserialize, Serialize};

use crate::knockback::Tint;

/// Top-level animation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnimState {
    /// Standing still.
    #[default]
    Idle,
    /// Moving (walking, patrolling, chasing, dashing).
    Walk,
    /// Swinging.
    Attack,
    /// Dead.
    Die,
}

impl AnimState {
    /// Boolean animator parameter driven by this state.
    #[must_use]
    pub fn parameter_name(self) -> &'static str {
        match self {
            Self::Idle => "isIdleing",
            Self::Walk => "isMoving",
            Self::Attack => "isAttacking",
            Self::Die => "isDieing",
        }
    }

    /// All states, in animator order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Idle, Self::Walk, Self::Attack, Self::Die]
    }
}

/// Everything the animator needs for one actor on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationParams {
    /// Active state.
    pub state: AnimState,
    /// Horizontal blend parameter.
    pub move_x: f32,
    /// Vertical blend parameter.
    pub move_y: f32,
    /// Combo step shown by attack animations.
    pub combo_step: i32,
    /// Sprite mirrored horizontally (facing left).
    pub flip_x: bool,
    /// Sprite mirrored vertically (death pose).
    pub flip_y: bool,
    /// Current tint.
    pub tint: Tint,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            state: AnimState::Idle,
            move_x: 0.0,
            move_y: 0.0,
            combo_step: 0,
            flip_x: false,
            flip_y: false,
            tint: Tint::WHITE,
        }
    }
}

impl AnimationParams {
    /// Animator booleans as `(name, value)` pairs; exactly one is `true`.
    #[must_use]
    pub fn state_flags(&self) -> [(&'static str, bool); 4] {
        AnimState::all().map(|s| (s.parameter_name(), s == self.state))
    }
}
