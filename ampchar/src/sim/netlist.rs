use super::value::SpiceValue;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Analysis directive appended to the test bench.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Analysis {
    /// `.tran <stop>`.
    Transient {
        /// Stop time.
        stop: SpiceValue,
    },
    /// `.ac dec <points_per_decade> <start> <stop>`.
    Ac {
        /// Frequency points per decade.
        points_per_decade: u32,
        /// Start frequency.
        start: SpiceValue,
        /// Stop frequency.
        stop: SpiceValue,
    },
}

impl Analysis {
    /// `.tran 5u`, long enough for two periods of the input pulse.
    pub fn default_transient() -> Self {
        Analysis::Transient {
            stop: lit("5u", 5e-6),
        }
    }

    /// `.ac dec 100 1K 20000K`.
    pub fn default_ac() -> Self {
        Analysis::Ac {
            points_per_decade: 100,
            start: lit("1K", 1e3),
            stop: lit("20000K", 20e6),
        }
    }

    /// SPICE directive line.
    pub fn directive(&self) -> String {
        match self {
            Analysis::Transient { stop } => format!(".tran {stop}"),
            Analysis::Ac {
                points_per_decade,
                start,
                stop,
            } => format!(".ac dec {points_per_decade} {start} {stop}"),
        }
    }
}

impl Default for Analysis {
    fn default() -> Self {
        Self::default_transient()
    }
}

/// Component values of the non-inverting LM7171 test bench.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CircuitParams {
    /// Input resistor between the pulse source and the non-inverting input.
    pub r1: SpiceValue,
    /// Load resistor.
    pub r3: SpiceValue,
    /// Feedback resistor.
    pub r9: SpiceValue,
    /// Feedback capacitor.
    pub c1: SpiceValue,
    /// Model library; `None` includes `lm7171.lib` from the working directory.
    pub lib_path: Option<PathBuf>,
}

impl Default for CircuitParams {
    fn default() -> Self {
        Self {
            r1: lit("500", 500.0),
            r3: lit("1k", 1e3),
            r9: lit("1k", 1e3),
            c1: lit("5p", 5e-12),
            lib_path: None,
        }
    }
}

impl CircuitParams {
    /// Render the complete netlist for `analysis`.
    ///
    /// ```
    /// use ampchar::sim::{Analysis, CircuitParams};
    ///
    /// let netlist = CircuitParams::default().netlist(&Analysis::default());
    /// assert!(netlist.contains("R1 N003 N002 500\n"));
    /// assert!(netlist.contains("\n.tran 5u\n"));
    /// assert!(netlist.ends_with(".end\n"));
    /// ```
    pub fn netlist(&self, analysis: &Analysis) -> String {
        let include = match &self.lib_path {
            None => ".include lm7171.lib".to_string(),
            Some(path) => {
                let posix = path.to_string_lossy().replace('\\', "/");
                format!(".include \"{posix}\"")
            }
        };

        let mut out = String::new();
        let lines = [
            "* ampchar op-amp step-response bench".to_string(),
            "V4 VCC 0 12".to_string(),
            "V5 -VCC 0 -12".to_string(),
            format!("R9 Vout N001 {}", self.r9),
            "XU2 N003 N001 VCC -VCC Vout LM7171".to_string(),
            format!("R3 Vout 0 {}", self.r3),
            "V1 N002 0 PULSE(0 1 0 1n 1n 1u 2u)".to_string(),
            format!("R1 N003 N002 {}", self.r1),
            format!("C1 Vout N001 {}", self.c1),
            include,
            analysis.directive(),
            ".backanno".to_string(),
            ".end".to_string(),
        ];
        for line in lines {
            // Writing to a String cannot fail.
            let _ = writeln!(out, "{line}");
        }
        log::debug!("rendered netlist with {}", analysis.directive());
        out
    }
}

fn lit(text: &str, value: f64) -> SpiceValue {
    text.parse().unwrap_or_else(|_| SpiceValue::from(value))
}
