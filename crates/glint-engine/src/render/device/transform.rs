//! Camera, object and projection transforms.

use glam::Mat4;

use crate::render::native::{NativeApi, NativeCall};

use super::RenderDevice;

impl<A: NativeApi> RenderDevice<A> {
    pub fn set_object_to_world_matrix(&mut self, m: Mat4) {
        if self.state.matrices.object_to_world == m {
            return;
        }
        self.minor_state_change();
        self.state.matrices.object_to_world = m;
        self.state.matrices.changed = true;
        self.load_model_view();
    }

    /// Sets the camera frame. Moving the camera is counted as a major change.
    pub fn set_camera_to_world_matrix(&mut self, m: Mat4) {
        if self.state.matrices.camera_to_world == m {
            return;
        }
        self.major_state_change();
        self.state.matrices.camera_to_world = m;
        self.state.matrices.changed = true;
        self.load_model_view();
    }

    /// Sets the projection. Projections map the top of the viewport to NDC -1;
    /// see [`projection`](crate::render::projection).
    pub fn set_projection_matrix(&mut self, p: Mat4) {
        if self.state.matrices.projection == p {
            return;
        }
        self.force_set_projection_matrix(p);
    }

    pub fn set_projection_and_camera_matrix(&mut self, projection: Mat4, camera_to_world: Mat4) {
        self.set_projection_matrix(projection);
        self.set_camera_to_world_matrix(camera_to_world);
    }

    pub(super) fn force_set_projection_matrix(&mut self, p: Mat4) {
        self.minor_state_change();
        self.state.matrices.projection = p;
        self.state.matrices.changed = true;
        let native = self.state.matrices.invert_y_matrix() * p;
        self.emit(NativeCall::LoadProjectionMatrix(native));
    }

    pub(super) fn load_model_view(&mut self) {
        let mv = self.state.matrices.model_view();
        self.emit(NativeCall::LoadModelViewMatrix(mv));
    }

    #[inline]
    pub fn object_to_world_matrix(&self) -> Mat4 {
        self.state.matrices.object_to_world
    }

    #[inline]
    pub fn camera_to_world_matrix(&self) -> Mat4 {
        self.state.matrices.camera_to_world
    }

    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        self.state.matrices.projection
    }

    #[inline]
    pub fn model_view_matrix(&self) -> Mat4 {
        self.state.matrices.model_view()
    }

    /// Projection times model-view, in the logical (top-down) convention.
    pub fn model_view_projection_matrix(&self) -> Mat4 {
        self.state.matrices.projection * self.state.matrices.model_view()
    }

    /// The Y correction applied to projections on the current target.
    #[inline]
    pub fn invert_y_matrix(&self) -> Mat4 {
        self.state.matrices.invert_y_matrix()
    }
}
