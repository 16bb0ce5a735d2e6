/// Compute X and Y bounds for a series chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let mut highest = 0.0;
    for &(_, y) in points {
        if y > highest {
            highest = y;
        }
    }

    let mut span = match points.last() {
        Some(p) => p.0,
        None => 1.0,
    };
    if span < 1.0 {
        span = 1.0;
    }

    (span, highest.max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[]);
        assert_eq!(x, 1.0);
        assert_eq!(y, 1.0);
    }

    #[test]
    fn test_compute_chart_params_bounds() {
        let (x, y) = compute_chart_params(&[(0.0, 2.0), (1.0, 8.0), (2.0, 4.0)]);
        assert_eq!(x, 2.0);
        assert_eq!(y, 8.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
