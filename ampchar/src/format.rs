//! Human-readable rendering of measured quantities.

const PREFIXES: [(i32, &str); 8] = [
    (-12, "p"),
    (-9, "n"),
    (-6, "µ"),
    (-3, "m"),
    (0, ""),
    (3, "k"),
    (6, "M"),
    (9, "G"),
];

/// Tick label for a logarithmic frequency axis.
///
/// Whole multiples of 1 MHz render as `"<n>M"`, whole multiples of 1 kHz as
/// `"<n>k"`; anything else uses plain real-number notation.
///
/// ```
/// use ampchar::format::format_frequency_tick;
///
/// assert_eq!(format_frequency_tick(2.0e6), "2M");
/// assert_eq!(format_frequency_tick(10.0e3), "10k");
/// assert_eq!(format_frequency_tick(1500.5), "1500.5");
/// assert_eq!(format_frequency_tick(100.0), "100");
/// ```
pub fn format_frequency_tick(value: f64) -> String {
    if value != 0.0 && value.is_finite() {
        if (value / 1e6).fract() == 0.0 {
            return format!("{}M", value / 1e6);
        }
        if (value / 1e3).fract() == 0.0 {
            return format!("{}k", value / 1e3);
        }
    }
    general(value)
}

// Like C's `%g`: exponent notation only for very large or very small values.
fn general(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 || !value.is_finite() || (1e-4..1e15).contains(&magnitude) {
        format!("{value}")
    } else {
        format!("{value:e}")
    }
}

/// Render `value` with an engineering prefix and `digits` decimals.
///
/// `NaN` renders as `"N/A"`. Prefixes run from `p` to `G`; values outside
/// that range keep the nearest prefix.
///
/// ```
/// use ampchar::format::format_eng;
///
/// assert_eq!(format_eng(1.5e-6, "s", 2), "1.50 µs");
/// assert_eq!(format_eng(2.2e6, "Hz", 1), "2.2 MHz");
/// assert_eq!(format_eng(-0.0125, "V", 3), "-12.500 mV");
/// assert_eq!(format_eng(f64::NAN, "s", 3), "N/A");
/// ```
pub fn format_eng(value: f64, unit: &str, digits: usize) -> String {
    if value.is_nan() {
        return "N/A".to_string();
    }
    if value == 0.0 || value.is_infinite() {
        return format!("{value:.digits$} {unit}");
    }

    let mut idx = prefix_index(value);
    let mut text = scaled(value, idx, digits);
    // Rounding can carry into the next prefix, e.g. 999.96 -> "1000.0".
    if idx + 1 < PREFIXES.len() && text.trim_start_matches('-').starts_with("1000") {
        idx += 1;
        text = scaled(value, idx, digits);
    }
    format!("{text} {}{unit}", PREFIXES[idx].1)
}

fn prefix_index(value: f64) -> usize {
    let exponent = value.abs().log10().floor() as i32;
    let engineering = exponent.div_euclid(3) * 3;
    PREFIXES
        .iter()
        .rposition(|&(e, _)| e <= engineering)
        .unwrap_or(0)
}

fn scaled(value: f64, idx: usize, digits: usize) -> String {
    let factor = 10f64.powi(PREFIXES[idx].0);
    format!("{:.digits$}", value / factor)
}
