use std::rc::Rc;

use crate::render::{NativeApi, RenderDevice};

/// Something posed for the current frame that draws itself in world space.
pub trait Surface<A: NativeApi> {
    fn name(&self) -> &str;

    /// Draws with the device's current camera and projection.
    fn render(&self, rd: &mut RenderDevice<A>);
}

/// Something posed for the current frame that draws in pixel space.
pub trait Surface2D<A: NativeApi> {
    /// Larger values are farther away and draw first.
    fn depth(&self) -> f32 {
        0.0
    }

    fn render(&self, rd: &mut RenderDevice<A>);
}

pub type Posed3D<A> = Rc<dyn Surface<A>>;
pub type Posed2D<A> = Rc<dyn Surface2D<A>>;

/// Renders 2D surfaces back to front.
pub fn sort_and_render_2d<A: NativeApi>(rd: &mut RenderDevice<A>, posed: &[Posed2D<A>]) {
    let mut sorted: Vec<&Posed2D<A>> = posed.iter().collect();
    sorted.sort_by(|a, b| b.depth().total_cmp(&a.depth()));
    for s in sorted {
        s.render(rd);
    }
}
