/// Linear RGBA color.
///
/// Values are expected in linear space. sRGB conversion is handled by render targets
/// and/or shaders depending on pipeline policy.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4 {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    #[inline]
    pub const fn clear() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn rgb(self) -> Color3 {
        Color3::new(self.r, self.g, self.b)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Color4> for wgpu::Color {
    fn from(c: Color4) -> Self {
        wgpu::Color { r: c.r as f64, g: c.g as f64, b: c.b as f64, a: c.a as f64 }
    }
}

/// Linear RGB color, used for light and material parameters.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color3 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color3 {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Fully saturated color at hue `t` in `[0, 1)`.
    pub fn rainbow(t: f32) -> Self {
        let h = t.rem_euclid(1.0) * 6.0;
        let x = 1.0 - (h % 2.0 - 1.0).abs();
        match h as u32 {
            0 => Self::new(1.0, x, 0.0),
            1 => Self::new(x, 1.0, 0.0),
            2 => Self::new(0.0, 1.0, x),
            3 => Self::new(0.0, x, 1.0),
            4 => Self::new(x, 0.0, 1.0),
            _ => Self::new(1.0, 0.0, x),
        }
    }

    #[inline]
    pub fn with_alpha(self, a: f32) -> Color4 {
        Color4::new(self.r, self.g, self.b, a)
    }
}

impl core::ops::Mul<f32> for Color3 {
    type Output = Color3;
    #[inline]
    fn mul(self, rhs: f32) -> Color3 {
        Color3::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}
