use crate::shape::Mask;

/// Horizontal kicks tried, in order, when the plain rotation collides.
pub const KICK_OFFSETS: [i32; 4] = [-1, 1, -2, 2];

/// Quarter turn clockwise: cell (r, c) moves to (c, size - 1 - r).
pub fn rotate(mask: &Mask) -> Mask {
    let size = mask.size();
    let mut out = Mask::empty(size);
    for (r, c) in mask.cells() {
        out.set(c, size - 1 - r, true);
    }
    out
}
