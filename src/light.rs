//! Per-fragment lighting.
//!
//! Materials, the bounded light table with its intrusive active list, and
//! the shading accumulation itself. The arithmetic is carried per channel
//! in 8-bit integers; only directions and attenuation run in float.
//!
//! The specular term is Blinn-Phong, or Phong when the `phong-specular`
//! feature is enabled.

use crate::color::{rgba, Color};
use crate::math::Vec3;

/// Size of the light table.
pub const MAX_LIGHTS: usize = 8;

/// Per-face surface properties.
#[derive(Copy, Clone, Debug)]
pub struct Material {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub emission: Color,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            ambient: Color::WHITE,
            diffuse: Color::WHITE,
            specular: Color::BLACK,
            emission: rgba(0, 0, 0, 255),
            shininess: 8.0,
        }
    }
}

/// Parameter selector for the material verbs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MaterialParam {
    AmbientAndDiffuse,
    Ambient,
    Diffuse,
    Specular,
    Emission,
    Shininess,
}

/// Parameter selector for the light verbs.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LightParam {
    Position,
    SpotDirection,
    SpotInnerCutoff,
    SpotOuterCutoff,
    ConstantAttenuation,
    LinearAttenuation,
    QuadraticAttenuation,
    Ambient,
    Diffuse,
    Specular,
}

/// One entry of the light table. `next` threads the enabled entries into
/// a list in the order they were switched on.
#[derive(Copy, Clone, Debug)]
pub struct Light {
    pub position: Vec3,
    pub direction: Vec3,
    /// Spot cone control; a value `>= PI` means the light is not a spot.
    pub inner_cutoff: f32,
    pub outer_cutoff: f32,
    pub attenuation_constant: f32,
    pub attenuation_linear: f32,
    pub attenuation_quadratic: f32,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub active: bool,
    pub next: Option<usize>,
}

impl Default for Light {
    fn default() -> Light {
        Light {
            position: Vec3::ZERO,
            direction: Vec3 { x: 0.0, y: 0.0, z: -1.0 },
            inner_cutoff: std::f32::consts::PI,
            outer_cutoff: std::f32::consts::PI,
            attenuation_constant: 1.0,
            attenuation_linear: 0.0,
            attenuation_quadratic: 0.0,
            ambient: Color::BLACK,
            diffuse: Color::WHITE,
            specular: Color::WHITE,
            active: false,
            next: None,
        }
    }
}

#[inline]
fn min255(v: u32) -> u8 {
    v.min(255) as u8
}

/// Shades one fragment.
///
/// `fragment` is the interpolated color already modulated by the face
/// material diffuse upstream. Every active light contributes; the output
/// alpha is the fragment alpha, untouched.
pub fn shade(
    lights: &[Light; MAX_LIGHTS],
    head: Option<usize>,
    material: &Material,
    fragment: Color,
    view_pos: Vec3,
    frag_pos: Vec3,
    normal: Vec3,
) -> Color {
    // Emission seeds the accumulator, added once per fragment.
    let mut out_r = material.emission.r as u32;
    let mut out_g = material.emission.g as u32;
    let mut out_b = material.emission.b as u32;

    // Ambient reflectance, pre-modulated by the fragment color.
    let amb_r = (material.ambient.r as u32 * fragment.r as u32) / 255;
    let amb_g = (material.ambient.g as u32 * fragment.g as u32) / 255;
    let amb_b = (material.ambient.b as u32 * fragment.b as u32) / 255;

    let view_dir = Vec3::direction(frag_pos, view_pos);
    let specular = material.specular;
    let shininess = material.shininess;

    let mut cursor = head;
    while let Some(index) = cursor {
        let light = &lights[index];
        cursor = light.next;

        let mut lit_r = 0u32;
        let mut lit_g = 0u32;
        let mut lit_b = 0u32;

        let to_light = light.position - frag_pos;
        let dist_sq = to_light.length_squared();
        let dist = dist_sq.sqrt();
        let light_dir = if dist_sq != 0.0 {
            to_light * (1.0 / dist)
        } else {
            to_light
        };

        // Spotlight soft edge.
        let mut intensity = 255u32;
        if light.inner_cutoff < std::f32::consts::PI {
            let theta = light_dir.dot(-light.direction);
            let epsilon = light.inner_cutoff - light.outer_cutoff;
            intensity =
                ((255.0 * (theta - light.outer_cutoff) / epsilon) as i32).clamp(0, 255) as u32;
        }

        // Attenuation, skipped while both distance terms are zero.
        let mut attenuation = 255u32;
        if light.attenuation_linear != 0.0 || light.attenuation_quadratic != 0.0 {
            let denom = light.attenuation_constant
                + light.attenuation_linear * dist
                + light.attenuation_quadratic * dist_sq;
            attenuation = ((255.0 / denom) as i32).clamp(0, 255) as u32;
        }

        if intensity > 0 && attenuation > 0 {
            let factor = (intensity * attenuation) / 255;

            // Diffuse reflection.
            let diff = ((255.0 * normal.dot(light_dir)) as i32).max(0) as u32;
            lit_r += (fragment.r as u32 * light.diffuse.r as u32 * diff) / (255 * 255);
            lit_g += (fragment.g as u32 * light.diffuse.g as u32 * diff) / (255 * 255);
            lit_b += (fragment.b as u32 * light.diffuse.b as u32 * diff) / (255 * 255);

            #[cfg(not(feature = "phong-specular"))]
            let spec = {
                let halfway = (light_dir + view_dir).normalized();
                (255.0 * normal.dot(halfway).max(0.0).powf(shininess)) as u32
            };
            #[cfg(feature = "phong-specular")]
            let spec = {
                let reflected = (-light_dir).reflect(normal);
                (255.0 * reflected.dot(view_dir).max(0.0).powf(shininess)) as u32
            };

            lit_r += (specular.r as u32 * light.specular.r as u32 * spec) / (255 * 255);
            lit_g += (specular.g as u32 * light.specular.g as u32 * spec) / (255 * 255);
            lit_b += (specular.b as u32 * light.specular.b as u32 * spec) / (255 * 255);

            lit_r = (lit_r.min(255) * factor) / 255;
            lit_g = (lit_g.min(255) * factor) / 255;
            lit_b = (lit_b.min(255) * factor) / 255;
        }

        // The light's ambient term applies even when the cone or the
        // attenuation zeroed out the direct terms.
        out_r = min255(out_r + lit_r + (amb_r * light.ambient.r as u32) / 255) as u32;
        out_g = min255(out_g + lit_g + (amb_g * light.ambient.g as u32) / 255) as u32;
        out_b = min255(out_b + lit_b + (amb_b * light.ambient.b as u32) / 255) as u32;
    }

    rgba(out_r as u8, out_g as u8, out_b as u8, fragment.a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec3;

    fn table_with(light: Light) -> [Light; MAX_LIGHTS] {
        let mut table = [Light::default(); MAX_LIGHTS];
        table[0] = Light { active: true, ..light };
        table
    }

    #[test]
    fn head_on_light_keeps_diffuse() {
        let lights = table_with(Light {
            position: vec3(0.0, 0.0, 1.0),
            ..Light::default()
        });
        let out = shade(
            &lights,
            Some(0),
            &Material::default(),
            rgba(200, 100, 50, 128),
            vec3(0.0, 0.0, 1.0),
            Vec3::ZERO,
            vec3(0.0, 0.0, 1.0),
        );
        // N.L == 1: diffuse passes through a white light, minus rounding.
        assert!(out.r >= 198 && out.r <= 200, "r = {}", out.r);
        assert_eq!(out.a, 128);
    }

    #[test]
    fn facing_away_gets_no_diffuse() {
        let lights = table_with(Light {
            position: vec3(0.0, 0.0, 1.0),
            ..Light::default()
        });
        let out = shade(
            &lights,
            Some(0),
            &Material::default(),
            rgba(200, 100, 50, 255),
            vec3(0.0, 0.0, 1.0),
            Vec3::ZERO,
            vec3(0.0, 0.0, -1.0),
        );
        assert_eq!((out.r, out.g, out.b), (0, 0, 0));
        assert_eq!(out.a, 255);
    }

    #[test]
    fn emission_is_unconditional() {
        let lights = table_with(Light {
            position: vec3(0.0, 0.0, 1.0),
            ..Light::default()
        });
        let material = Material {
            emission: rgba(10, 20, 30, 255),
            ..Material::default()
        };
        let out = shade(
            &lights,
            Some(0),
            &material,
            rgba(0, 0, 0, 255),
            vec3(0.0, 0.0, 1.0),
            Vec3::ZERO,
            vec3(0.0, 0.0, -1.0),
        );
        assert_eq!((out.r, out.g, out.b), (10, 20, 30));
    }

    #[test]
    fn spot_cone_cuts_off() {
        // Narrow spot pointing down -z; fragment is off to the side.
        let lights = table_with(Light {
            position: vec3(0.0, 0.0, 1.0),
            direction: vec3(0.0, 0.0, -1.0),
            inner_cutoff: 0.99,
            outer_cutoff: 0.95,
            ..Light::default()
        });
        let inside = shade(
            &lights,
            Some(0),
            &Material::default(),
            rgba(255, 255, 255, 255),
            vec3(0.0, 0.0, 1.0),
            Vec3::ZERO,
            vec3(0.0, 0.0, 1.0),
        );
        let outside = shade(
            &lights,
            Some(0),
            &Material::default(),
            rgba(255, 255, 255, 255),
            vec3(0.0, 0.0, 1.0),
            vec3(10.0, 0.0, 0.0),
            vec3(0.0, 0.0, 1.0),
        );
        assert!(inside.r > outside.r);
        assert_eq!(outside.r, 0);
    }

    #[test]
    fn no_active_light_leaves_emission_only() {
        let lights = [Light::default(); MAX_LIGHTS];
        let out = shade(
            &lights,
            None,
            &Material::default(),
            rgba(50, 60, 70, 200),
            Vec3::ZERO,
            Vec3::ZERO,
            vec3(0.0, 0.0, 1.0),
        );
        assert_eq!((out.r, out.g, out.b, out.a), (0, 0, 0, 200));
    }
}
