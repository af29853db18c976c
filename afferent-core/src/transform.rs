// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal 2-D affine transform.
//!
//! Motion events carry two of these: the *cooked* transform mapping device
//! coordinates into the target window, and the *raw* transform mapping into
//! display space. This type covers exactly what the transport needs
//! (identity, wire order, point mapping) without pulling in a linear-algebra
//! crate.

use core::ops::Mul;

/// A row-major 2-D affine transform.
///
/// The six coefficients render as the matrix
///
/// ```text
/// [ dsdx dtdx tx ]
/// [ dtdy dsdy ty ]
/// [  0    0    1 ]
/// ```
///
/// and travel on the wire in slot order `(dsdx, dtdx, tx, dtdy, dsdy, ty)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2d {
    /// X scale.
    pub dsdx: f32,
    /// X skew.
    pub dtdx: f32,
    /// X translation.
    pub tx: f32,
    /// Y skew.
    pub dtdy: f32,
    /// Y scale.
    pub dsdy: f32,
    /// Y translation.
    pub ty: f32,
}

impl Transform2d {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        dsdx: 1.0,
        dtdx: 0.0,
        tx: 0.0,
        dtdy: 0.0,
        dsdy: 1.0,
        ty: 0.0,
    };

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(tx: f32, ty: f32) -> Self {
        Self {
            dsdx: 1.0,
            dtdx: 0.0,
            tx,
            dtdy: 0.0,
            dsdy: 1.0,
            ty,
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f32, sy: f32) -> Self {
        Self {
            dsdx: sx,
            dtdx: 0.0,
            tx: 0.0,
            dtdy: 0.0,
            dsdy: sy,
            ty: 0.0,
        }
    }

    /// Creates a transform from wire slot order
    /// `(dsdx, dtdx, tx, dtdy, dsdy, ty)`.
    #[inline]
    #[must_use]
    pub const fn from_wire(slots: [f32; 6]) -> Self {
        Self {
            dsdx: slots[0],
            dtdx: slots[1],
            tx: slots[2],
            dtdy: slots[3],
            dsdy: slots[4],
            ty: slots[5],
        }
    }

    /// Returns the coefficients in wire slot order.
    #[inline]
    #[must_use]
    pub const fn to_wire(self) -> [f32; 6] {
        [self.dsdx, self.dtdx, self.tx, self.dtdy, self.dsdy, self.ty]
    }

    /// Maps a point through this transform.
    #[inline]
    #[must_use]
    pub fn map_point(self, x: f32, y: f32) -> (f32, f32) {
        (
            self.dsdx * x + self.dtdx * y + self.tx,
            self.dtdy * x + self.dsdy * y + self.ty,
        )
    }
}

impl Default for Transform2d {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform2d {
    type Output = Self;

    /// Composes two transforms; `(a * b).map_point(p) == a.map_point(b.map_point(p))`.
    fn mul(self, rhs: Self) -> Self {
        Self {
            dsdx: self.dsdx * rhs.dsdx + self.dtdx * rhs.dtdy,
            dtdx: self.dsdx * rhs.dtdx + self.dtdx * rhs.dsdy,
            tx: self.dsdx * rhs.tx + self.dtdx * rhs.ty + self.tx,
            dtdy: self.dtdy * rhs.dsdx + self.dsdy * rhs.dtdy,
            dsdy: self.dtdy * rhs.dtdx + self.dsdy * rhs.dsdy,
            ty: self.dtdy * rhs.tx + self.dsdy * rhs.ty + self.ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Transform2d;

    #[test]
    fn identity_maps_points_unchanged() {
        assert_eq!(Transform2d::IDENTITY.map_point(3.5, -2.0), (3.5, -2.0));
    }

    #[test]
    fn wire_order_round_trips() {
        let slots = [2.0, 0.5, 10.0, -0.5, 3.0, 20.0];
        assert_eq!(Transform2d::from_wire(slots).to_wire(), slots);
    }

    #[test]
    fn translation_offsets_points() {
        let t = Transform2d::from_translation(100.0, -50.0);
        assert_eq!(t.map_point(1.0, 2.0), (101.0, -48.0));
    }

    #[test]
    fn composition_applies_right_then_left() {
        let scale = Transform2d::from_scale(2.0, 2.0);
        let translate = Transform2d::from_translation(10.0, 0.0);

        // scale ∘ translate: translate first, then scale.
        let st = scale * translate;
        assert_eq!(st.map_point(1.0, 1.0), (22.0, 2.0));

        // translate ∘ scale: scale first, then translate.
        let ts = translate * scale;
        assert_eq!(ts.map_point(1.0, 1.0), (12.0, 2.0));
    }
}
