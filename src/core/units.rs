pub const MILLIMETRES_IN_METRE: u32 = 1_000;

pub(crate) fn millimetres_to_metres(length_mm: f64) -> f64 {
    length_mm / MILLIMETRES_IN_METRE as f64
}
