//! Fog.
//!
//! Classic fixed-function fog: a factor derived from fragment depth
//! blends the fragment toward the fog color. Applied per fragment when
//! the fog enable bit is set, or over a whole framebuffer by
//! [`fog_process`](crate::context::Context::fog_process).

use crate::color::{lerp, Color};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FogMode {
    Linear,
    Exp,
    Exp2,
}

/// Parameter selector for the fog verbs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FogParam {
    Mode,
    Density,
    Start,
    End,
    Color,
}

#[derive(Copy, Clone, Debug)]
pub struct Fog {
    pub mode: FogMode,
    pub density: f32,
    pub start: f32,
    pub end: f32,
    pub color: Color,
}

impl Default for Fog {
    fn default() -> Fog {
        Fog {
            mode: FogMode::Linear,
            density: 1.0,
            start: 0.0,
            end: 1.0,
            color: Color::BLACK,
        }
    }
}

impl Fog {
    /// Blend factor in `[0, 1]`; 1 means untouched fragment, 0 means
    /// full fog color.
    pub fn factor(&self, depth: f32) -> f32 {
        let f = match self.mode {
            FogMode::Linear => {
                let span = self.end - self.start;
                if span <= 0.0 {
                    return if depth < self.end { 1.0 } else { 0.0 };
                }
                (self.end - depth) / span
            }
            FogMode::Exp => (-self.density * depth).exp(),
            FogMode::Exp2 => {
                let d = self.density * depth;
                (-(d * d)).exp()
            }
        };
        f.max(0.0).min(1.0)
    }

    /// Applies the factor for `depth` to one fragment.
    #[inline]
    pub fn apply(&self, fragment: Color, depth: f32) -> Color {
        if !depth.is_finite() {
            // Background (cleared) depth stays untouched.
            return fragment;
        }
        let f = self.factor(depth);
        let mut out = lerp(self.color, fragment, f);
        out.a = fragment.a;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::rgba;

    #[test]
    fn linear_factor_endpoints() {
        let fog = Fog {
            start: 1.0,
            end: 3.0,
            ..Fog::default()
        };
        assert_eq!(fog.factor(1.0), 1.0);
        assert_eq!(fog.factor(3.0), 0.0);
        assert_eq!(fog.factor(2.0), 0.5);
    }

    #[test]
    fn exp_decreases_with_depth() {
        let fog = Fog {
            mode: FogMode::Exp,
            density: 0.5,
            ..Fog::default()
        };
        assert!(fog.factor(1.0) > fog.factor(2.0));
    }

    #[test]
    fn apply_preserves_alpha_and_background() {
        let fog = Fog {
            color: rgba(100, 100, 100, 255),
            start: 0.0,
            end: 1.0,
            ..Fog::default()
        };
        let fragment = rgba(0, 0, 0, 37);
        assert_eq!(fog.apply(fragment, 1.0).r, 100);
        assert_eq!(fog.apply(fragment, 1.0).a, 37);
        assert_eq!(fog.apply(fragment, f32::INFINITY), fragment);
    }
}
