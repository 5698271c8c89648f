//! Formatting helpers for trace-level logging.

use itertools::Itertools;

pub(crate) fn format_f64_vec(v: &[f64]) -> String {
    format!("[{}]", v.iter().map(|x| format!("{:.6}", x)).join(", "))
}

/// Formats magnitudes and angles (radians) as `|V|∠deg` pairs.
pub(crate) fn format_polar_vec(vm: &[f64], va: &[f64]) -> String {
    format!(
        "[{}]",
        vm.iter()
            .zip(va)
            .map(|(m, a)| format!("{:.6}∠{:.4}°", m, a.to_degrees()))
            .join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_vectors() {
        assert_eq!(format_f64_vec(&[1.0, -0.5]), "[1.000000, -0.500000]");
        assert_eq!(
            format_polar_vec(&[1.0], &[std::f64::consts::PI]),
            "[1.000000∠180.0000°]"
        );
    }
}
