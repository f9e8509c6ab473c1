//! Texture units: image bindings and fixed-function unit state.

use std::rc::Rc;

use glam::{Mat4, Vec4};

use crate::render::native::{NativeApi, NativeCall};
use crate::render::resource::Texture;
use crate::render::state::{RenderState, same_handle};
use crate::render::types::CombineMode;

use super::RenderDevice;

impl<A: NativeApi> RenderDevice<A> {
    /// Binds `texture` to image unit `unit`, or unbinds it with `None`.
    pub fn set_texture(&mut self, unit: usize, texture: Option<Rc<Texture>>) {
        debug_assert!(
            unit < self.caps.num_textures,
            "texture unit {unit} out of range (backend has {})",
            self.caps.num_textures
        );
        if unit >= self.caps.num_textures {
            log::error!("texture unit {unit} out of range; ignored");
            return;
        }
        if same_handle(&self.state.texture_image_units[unit], &texture) {
            return;
        }

        self.major_state_change();
        self.state.touch_texture_unit(unit);
        self.select_texture_unit(unit);

        let fixed = unit < self.caps.num_texture_units;
        if fixed {
            self.emit(NativeCall::DisableAllTextures(unit));
        }
        let bound = texture.is_some();
        self.emit(NativeCall::BindTexture(texture.clone()));
        if fixed && bound {
            self.emit(NativeCall::EnableTexture(unit));
        }
        self.state.texture_image_units[unit] = texture;
    }

    #[inline]
    pub fn texture(&self, unit: usize) -> Option<&Rc<Texture>> {
        self.state.texture(unit)
    }

    pub fn set_texture_matrix(&mut self, unit: usize, matrix: Mat4) {
        if !self.check_fixed_unit(unit) || self.state.texture_units[unit].texture_matrix == matrix {
            return;
        }
        self.minor_state_change();
        self.state.touch_texture_unit(unit);
        self.state.texture_units[unit].texture_matrix = matrix;
        self.select_texture_unit(unit);
        self.emit(NativeCall::TextureMatrix(matrix));
    }

    pub fn set_texture_combine_mode(&mut self, unit: usize, mode: CombineMode) {
        if !self.check_fixed_unit(unit) {
            return;
        }
        let mode = if mode == CombineMode::Current {
            self.state.texture_units[unit].combine_mode
        } else {
            mode
        };
        if self.state.texture_units[unit].combine_mode == mode {
            return;
        }
        self.minor_state_change();
        self.state.touch_texture_unit(unit);
        self.state.texture_units[unit].combine_mode = mode;
        self.select_texture_unit(unit);
        self.emit(NativeCall::TexEnvCombine(mode));
    }

    pub fn set_texture_lod_bias(&mut self, unit: usize, bias: f32) {
        if !self.check_fixed_unit(unit) || self.state.texture_units[unit].lod_bias == bias {
            return;
        }
        self.minor_state_change();
        self.state.touch_texture_unit(unit);
        self.state.texture_units[unit].lod_bias = bias;
        self.select_texture_unit(unit);
        self.emit(NativeCall::TextureLodBias(bias));
    }

    /// Sets the constant texture coordinate of coordinate set `unit`.
    pub fn set_tex_coord(&mut self, unit: usize, coord: Vec4) {
        debug_assert!(
            unit < self.caps.num_texture_coords,
            "texture coordinate set {unit} out of range (backend has {})",
            self.caps.num_texture_coords
        );
        if unit >= self.caps.num_texture_coords || self.state.texture_units[unit].tex_coord == coord {
            return;
        }
        self.minor_state_change();
        self.state.touch_texture_unit(unit);
        self.state.texture_units[unit].tex_coord = coord;
        self.emit(NativeCall::MultiTexCoord { unit, coord });
    }

    fn check_fixed_unit(&self, unit: usize) -> bool {
        debug_assert!(
            unit < self.caps.num_texture_units,
            "fixed-function texture unit {unit} out of range (backend has {})",
            self.caps.num_texture_units
        );
        unit < self.caps.num_texture_units
    }

    /// Makes `unit` the active unit if it is not already.
    pub(super) fn select_texture_unit(&mut self, unit: usize) {
        if self.active_texture != Some(unit) {
            self.active_texture = Some(unit);
            self.emit(NativeCall::ActiveTexture(unit));
        }
    }

    /// Replays the setters for one unit of `saved` during a pop.
    pub(super) fn restore_texture_unit(&mut self, unit: usize, saved: &RenderState) {
        if unit < self.caps.num_textures {
            self.set_texture(unit, saved.texture_image_units[unit].clone());
        }
        if unit < self.caps.num_texture_units {
            let tu = saved.texture_units[unit].clone();
            if tu != self.state.texture_units[unit] {
                self.set_texture_combine_mode(unit, tu.combine_mode);
                self.set_texture_matrix(unit, tu.texture_matrix);
                self.set_texture_lod_bias(unit, tu.lod_bias);
            }
        }
        if unit < self.caps.num_texture_coords {
            self.set_tex_coord(unit, saved.texture_units[unit].tex_coord);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3, Vec4};

    use crate::render::device::test_support::*;
    use crate::render::native::NativeCall;
    use crate::render::resource::Texture;
    use crate::render::types::CombineMode;

    fn tex(name: &str) -> std::rc::Rc<Texture> {
        Texture::from_rgba8(name, 1, 1, vec![255; 4])
    }

    // ── bindings ──────────────────────────────────────────────────────────

    #[test]
    fn binding_same_handle_twice_is_noop() {
        let mut rd = device();
        let t = tex("a");
        rd.set_texture(0, Some(t.clone()));
        let before = rd.stats().native_calls();
        rd.set_texture(0, Some(t));
        assert_eq!(rd.stats().native_calls(), before);
    }

    #[test]
    fn binding_different_handle_emits() {
        let mut rd = device();
        rd.set_texture(0, Some(tex("a")));
        let before = rd.stats().native_calls();
        rd.set_texture(0, Some(tex("b")));
        assert!(rd.stats().native_calls() > before);
    }

    #[test]
    fn fixed_unit_bind_sequence() {
        let mut rd = device();
        let t = tex("a");
        rd.set_texture(2, Some(t.clone()));
        assert_eq!(
            drain(&mut rd),
            vec![
                NativeCall::ActiveTexture(2),
                NativeCall::DisableAllTextures(2),
                NativeCall::BindTexture(Some(t)),
                NativeCall::EnableTexture(2),
            ]
        );
    }

    #[test]
    fn image_only_unit_skips_fixed_function_calls() {
        let mut rd = device();
        rd.set_texture(6, Some(tex("a")));
        let calls = drain(&mut rd);
        assert!(!calls.iter().any(|c| matches!(c, NativeCall::EnableTexture(_) | NativeCall::DisableAllTextures(_))));
    }

    #[test]
    fn active_unit_is_not_reselected() {
        let mut rd = device();
        rd.set_texture_lod_bias(1, 0.5);
        drain(&mut rd);
        rd.set_texture_matrix(1, Mat4::from_scale(Vec3::splat(2.0)));
        let calls = drain(&mut rd);
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], NativeCall::TextureMatrix(_)));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn unit_out_of_range_panics_in_debug() {
        let mut rd = device();
        rd.set_texture(8, None);
    }

    // ── push / pop ────────────────────────────────────────────────────────

    #[test]
    fn nested_pop_restores_only_touched_units() {
        let mut rd = device();
        rd.push_state();
        rd.push_state();
        rd.set_texture(0, Some(tex("a")));
        rd.pop_state();
        rd.pop_state();
        let calls = drain(&mut rd);
        assert!(calls.contains(&NativeCall::BindTexture(None)));
        assert!(!calls.iter().any(|c| matches!(c, NativeCall::ActiveTexture(u) if *u > 0)));
        assert!(rd.texture(0).is_none());
    }

    #[test]
    fn pop_restores_unit_state() {
        let mut rd = device();
        rd.push_state();
        rd.set_texture_combine_mode(1, CombineMode::Add);
        rd.set_tex_coord(1, Vec4::ONE);
        rd.pop_state();
        assert_eq!(rd.state().texture_units[1].combine_mode, CombineMode::Modulate);
        assert_eq!(rd.state().texture_units[1].tex_coord, Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn current_combine_mode_is_noop() {
        let mut rd = device();
        rd.set_texture_combine_mode(0, CombineMode::Current);
        assert!(drain(&mut rd).is_empty());
    }
}
