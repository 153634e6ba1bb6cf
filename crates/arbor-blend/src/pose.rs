use crate::Transform;

/// Blends two poses bone by bone into `out`.
///
/// `weight` is clamped to `[0, 1]` (NaN counts as 0). At 0 `out` is an exact copy of `source`,
/// at 1 an exact copy of `target`; in between rotations are slerped and translations lerped.
///
/// # Panics
/// If the three slices differ in length.
pub fn blend(weight: f32, source: &[Transform], target: &[Transform], out: &mut [Transform]) {
    assert_eq!(source.len(), out.len(), "source pose and output differ in bone count");
    assert_eq!(target.len(), out.len(), "target pose and output differ in bone count");

    let weight = if weight.is_nan() {
        0.0
    } else {
        weight.clamp(0.0, 1.0)
    };
    if weight == 0.0 {
        out.copy_from_slice(source);
    } else if weight == 1.0 {
        out.copy_from_slice(target);
    } else {
        for ((out, source), target) in out.iter_mut().zip(source).zip(target) {
            *out = source.interpolate(*target, weight);
        }
    }
}

/// Allocating form of [`blend`].
pub fn blended(weight: f32, source: &[Transform], target: &[Transform]) -> Vec<Transform> {
    let mut out = vec![Transform::IDENTITY; source.len()];
    blend(weight, source, target, &mut out);
    out
}
