use ampchar::kernel::KernelLifecycle;
use ampchar::signal::spectral::{SpectrumConfig, SpectrumKernel, DEFAULT_BAND};
use ampchar::signal::traits::{SpectrumAnalyze1D, TransientCharacterize1D, WindowStats1D};
use ampchar::signal::transient::{TransientConfig, TransientKernel};
use ampchar::signal::window_stats::{WindowStatsConfig, WindowStatsKernel, XWindow};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

const DEFAULT_PYTHON_BIN: &str = "python";

const PY_MEASURE_SCRIPT: &str = r#"
import json
import sys
import time
import numpy as np

env = json.loads(sys.stdin.read())
op = env["op"]
iters = int(env["iters"])
p = env["payload"]

def _as_array(key):
    return np.asarray(p[key], dtype=float)

def _window_stats():
    x = _as_array("x")
    y = _as_array("y")
    lo, hi = sorted((float(p["lo"]), float(p["hi"])))
    mask = (x >= lo) & (x <= hi)
    xs, ys = x[mask], y[mask]
    i_max, i_min = int(np.argmax(ys)), int(np.argmin(ys))
    return [ys[i_max] - ys[i_min], xs[i_max], ys[i_max], xs[i_min], ys[i_min]]

def _crossing(t, v, th, start):
    for i in range(start, len(v) - 1):
        if v[i] <= th <= v[i + 1]:
            return float(np.interp(th, [v[i], v[i + 1]], [t[i], t[i + 1]])), i
    return None, None

def _transient():
    t = _as_array("time")
    v = _as_array("voltage")
    lo, hi = v.min(), v.max()
    swing = hi - lo
    v10, v20, v80, v90 = (lo + f * swing for f in (0.1, 0.2, 0.8, 0.9))
    t10, i10 = _crossing(t, v, v10, 0)
    t20, i20 = _crossing(t, v, v20, 0)
    t90 = _crossing(t, v, v90, i10)[0] if i10 is not None else None
    t80 = _crossing(t, v, v80, i20)[0] if i20 is not None else None

    def rate(vl, vh, tl, th):
        if tl is None or th is None or th <= tl:
            return float("nan")
        return (vh - vl) / (th - tl)

    settle = float("nan")
    g = np.abs(np.gradient(v, t))
    gmax = g.max()
    if gmax > 0 and t90 is not None:
        quiet = 0.01 * gmax
        for k in range(int(np.argmax(t >= t90)), len(t)):
            if np.all(g[k:k + 5] < quiet):
                settle = t[k] - t90
                break
    return [rate(v10, v90, t10, t90), rate(v20, v80, t20, t80), settle]

def _spectrum():
    t = _as_array("time")
    v = _as_array("voltage")
    n = len(t)
    tu = np.linspace(t[0], t[-1], n)
    vu = np.interp(tu, t, v)
    vu = (vu - vu.mean()) * np.hanning(n)
    nfft = 1 << (n - 1).bit_length()
    mag = np.abs(np.fft.rfft(vu, nfft)) * (2.0 / n) / np.sqrt(2.0)
    db = 20.0 * np.log10(mag + np.finfo(float).eps)
    f = np.arange(nfft // 2 + 1) / (nfft * (t[-1] - t[0]) / (n - 1))
    f, db = f[1:], db[1:]
    keep = (f >= float(p["lo"])) & (f <= float(p["hi"]))
    return np.concatenate([f[keep], db[keep]])

def _compute():
    if op == "window_stats":
        return _window_stats()
    if op == "transient":
        return _transient()
    if op == "spectrum":
        return _spectrum()
    raise RuntimeError(f"unsupported op: {op}")

y = np.asarray(_compute(), dtype=float).reshape(-1)

t0 = time.perf_counter_ns()
for _ in range(iters):
    _compute()
t1 = time.perf_counter_ns()

print(json.dumps({
    "output": [None if np.isnan(v) else float(v) for v in y],
    "avg_ns": (t1 - t0) / max(iters, 1),
    "python_version": sys.version.split()[0],
    "numpy_version": np.__version__
}))
"#;

#[derive(Debug, Serialize, Deserialize, Clone)]
struct PythonEval {
    output: Vec<Option<f64>>,
    avg_ns: f64,
    python_version: String,
    numpy_version: String,
}

impl PythonEval {
    fn values(&self) -> Vec<f64> {
        self.output.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ContractRow {
    case_id: String,
    max_abs: f64,
    max_rel: f64,
    tolerance: f64,
    passed: bool,
    rust_ns: f64,
    python_ns: f64,
    speedup_vs_python: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContractBundle {
    generated_epoch_seconds: u64,
    python_executable: String,
    python_version: String,
    numpy_version: String,
    rows: Vec<ContractRow>,
}

/// One engine run on fixed input, paired with its numpy reference.
struct Case<'a> {
    id: &'a str,
    op: &'a str,
    payload: serde_json::Value,
    tolerance: f64,
    // Values below this are clamped on both sides before comparing.
    floor: Option<f64>,
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("contracts") => run_contracts(),
        _ => {
            eprintln!("Usage:");
            eprintln!("  cargo run -p xtask -- contracts");
            Ok(())
        }
    }
}

fn run_contracts() -> Result<()> {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let out_dir = PathBuf::from(format!("target/contracts/{ts}"));
    fs::create_dir_all(&out_dir).context("creating contract output directory")?;

    let python_bin = detect_python_bin();
    let mut rows = Vec::new();

    // Window statistics
    {
        let x = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let y = vec![0.0, 1.0, 0.0, -1.0, 0.5];
        for (case_id, window) in [
            ("window_stats_full", (0.0, 4.0)),
            ("window_stats_zoom", (0.5, 2.5)),
            ("window_stats_reversed", (2.5, 0.5)),
        ] {
            let kernel = WindowStatsKernel::try_new(WindowStatsConfig {
                window: XWindow::from(window),
            })?;
            let run = || {
                kernel
                    .run(&x, &y)
                    .map_err(|e| anyhow!("{case_id} execution failed: {e}"))
            };
            let (vpp, t_max, v_max, t_min, v_min) = run()?.as_tuple();
            let rust_ns = benchmark_avg_ns(2000, || run().map(|_| ()))?;
            rows.push(check_case(
                &python_bin,
                Case {
                    id: case_id,
                    op: "window_stats",
                    payload: json!({ "x": x, "y": y, "lo": window.0, "hi": window.1 }),
                    tolerance: 0.0,
                    floor: None,
                },
                vec![vpp, t_max, v_max, t_min, v_min],
                rust_ns,
            )?);
        }
    }

    // Transient characterization
    {
        let kernel = TransientKernel::try_new(TransientConfig::default())?;
        for (case_id, (time, voltage)) in [
            ("transient_ramp_flat", ramp_then_flat(201, 50e-9)),
            ("transient_first_order", first_order_step(4000, 100e-9)),
            ("transient_damped_ring", damped_ring(3000)),
        ] {
            let run = || {
                kernel
                    .run(&time, &voltage)
                    .map_err(|e| anyhow!("{case_id} execution failed: {e}"))
            };
            let (sr_90_10, sr_80_20, settling) = run()?.as_tuple();
            let rust_ns = benchmark_avg_ns(200, || run().map(|_| ()))?;
            rows.push(check_case(
                &python_bin,
                Case {
                    id: case_id,
                    op: "transient",
                    payload: json!({ "time": time, "voltage": voltage }),
                    tolerance: 1e-9,
                    floor: None,
                },
                vec![sr_90_10, sr_80_20, settling],
                rust_ns,
            )?);
        }
    }

    // Spectral analysis
    {
        let kernel = SpectrumKernel::try_new(SpectrumConfig::default())?;
        for (case_id, (time, voltage)) in [
            ("spectrum_tone_pow2", tone(1024, 1e-8, 41.0 / (1024.0 * 1e-8))),
            ("spectrum_tone_padded", tone(1000, 1e-8, 5e6)),
            ("spectrum_jittered_ring", damped_ring(3000)),
        ] {
            let run = || {
                kernel
                    .run_alloc(&time, &voltage)
                    .map_err(|e| anyhow!("{case_id} execution failed: {e}"))
            };
            let spectrum = run()?;
            let mut candidate = spectrum.frequencies.clone();
            candidate.extend_from_slice(&spectrum.magnitude_db);
            let rust_ns = benchmark_avg_ns(100, || run().map(|_| ()))?;
            rows.push(check_case(
                &python_bin,
                Case {
                    id: case_id,
                    op: "spectrum",
                    payload: json!({
                        "time": time,
                        "voltage": voltage,
                        "lo": DEFAULT_BAND.0,
                        "hi": DEFAULT_BAND.1
                    }),
                    tolerance: 1e-6,
                    // Bins at the epsilon floor differ by rounding noise only.
                    floor: Some(-200.0),
                },
                candidate,
                rust_ns,
            )?);
        }
    }

    let versions = python_signal_eval(
        &python_bin,
        "window_stats",
        json!({ "x": [0.0], "y": [0.0], "lo": 0.0, "hi": 0.0 }),
        0,
    )?;
    let bundle = ContractBundle {
        generated_epoch_seconds: ts,
        python_executable: python_bin.to_string_lossy().into_owned(),
        python_version: versions.python_version,
        numpy_version: versions.numpy_version,
        rows,
    };

    let summary_json = out_dir.join("summary.json");
    fs::write(
        &summary_json,
        serde_json::to_vec_pretty(&bundle).context("serializing summary")?,
    )
    .with_context(|| format!("writing {}", summary_json.display()))?;
    write_summary_csv(&out_dir.join("summary.csv"), &bundle.rows)?;

    let failed: Vec<&str> = bundle
        .rows
        .iter()
        .filter(|r| !r.passed)
        .map(|r| r.case_id.as_str())
        .collect();

    println!("Contract artifacts:");
    println!("  - {}", out_dir.join("summary.csv").display());
    println!("  - {}", summary_json.display());
    println!("  - cases: {} ({} failed)", bundle.rows.len(), failed.len());

    if !failed.is_empty() {
        bail!("contract cases outside tolerance: {}", failed.join(", "));
    }
    Ok(())
}

fn check_case(
    python_bin: &Path,
    case: Case<'_>,
    mut candidate: Vec<f64>,
    rust_ns: f64,
) -> Result<ContractRow> {
    let py = python_signal_eval(python_bin, case.op, case.payload, 20)?;
    let mut reference = py.values();
    ensure_same_length(case.id, &candidate, &reference)?;
    if let Some(floor) = case.floor {
        for v in candidate.iter_mut().chain(reference.iter_mut()) {
            *v = v.max(floor);
        }
    }

    let max_abs = max_abs_error(&candidate, &reference);
    let max_rel = max_rel_error(&candidate, &reference);
    Ok(ContractRow {
        case_id: case.id.to_string(),
        max_abs,
        max_rel,
        tolerance: case.tolerance,
        passed: max_rel <= case.tolerance && same_nan_pattern(&candidate, &reference),
        rust_ns,
        python_ns: py.avg_ns,
        speedup_vs_python: py.avg_ns / rust_ns,
    })
}

fn ramp_then_flat(n: usize, rise: f64) -> (Vec<f64>, Vec<f64>) {
    let dt = 1e-9;
    let time: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
    let voltage = time.iter().map(|&t| (t / rise).min(1.0)).collect();
    (time, voltage)
}

fn first_order_step(n: usize, tau: f64) -> (Vec<f64>, Vec<f64>) {
    let stop = 20.0 * tau;
    let time: Vec<f64> = (0..n).map(|i| stop * i as f64 / (n - 1) as f64).collect();
    let voltage = time.iter().map(|&t| 1.0 - (-t / tau).exp()).collect();
    (time, voltage)
}

// Slewing edge followed by a damped 40 MHz ring, on a deterministic jittered grid.
fn damped_ring(n: usize) -> (Vec<f64>, Vec<f64>) {
    let rise = 40e-9;
    let mut time: Vec<f64> = Vec::with_capacity(n);
    let mut t = 0.0;
    for i in 0..n {
        time.push(t);
        t += 0.5e-9 * (1.0 + 0.3 * ((i as f64) * 0.7).sin());
    }
    let voltage = time
        .iter()
        .map(|&t| {
            if t < rise {
                t / rise
            } else {
                let s = t - rise;
                1.0 + 0.05 * (-s / 30e-9).exp() * (2.0 * std::f64::consts::PI * s / 25e-9).sin()
            }
        })
        .collect();
    (time, voltage)
}

fn tone(n: usize, dt: f64, freq: f64) -> (Vec<f64>, Vec<f64>) {
    let time: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
    let voltage = time
        .iter()
        .map(|&t| std::f64::consts::SQRT_2 * (2.0 * std::f64::consts::PI * freq * t).sin())
        .collect();
    (time, voltage)
}

fn detect_python_bin() -> PathBuf {
    PathBuf::from(DEFAULT_PYTHON_BIN)
}

fn python_signal_eval(
    python_bin: &Path,
    op: &str,
    payload: serde_json::Value,
    iters: usize,
) -> Result<PythonEval> {
    run_python_eval(
        python_bin,
        PY_MEASURE_SCRIPT,
        json!({
            "op": op,
            "iters": iters,
            "payload": payload
        }),
    )
}

fn run_python_eval(
    python_bin: &Path,
    script: &str,
    payload: serde_json::Value,
) -> Result<PythonEval> {
    let mut child = Command::new(python_bin)
        .arg("-c")
        .arg(script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning python interpreter at {}", python_bin.display()))?;

    {
        let stdin = child.stdin.as_mut().context("opening python stdin")?;
        let payload_bytes = serde_json::to_vec(&payload).context("serializing python payload")?;
        stdin
            .write_all(&payload_bytes)
            .context("writing payload to python stdin")?;
    }

    let output = child
        .wait_with_output()
        .context("waiting for python process")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("python execution failed: {stderr}");
    }
    let stdout = String::from_utf8(output.stdout).context("parsing python stdout utf8")?;
    let parsed: PythonEval = serde_json::from_str(stdout.trim()).context("parsing python json")?;
    Ok(parsed)
}

fn ensure_same_length(case_id: &str, a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        bail!(
            "case {case_id} has mismatched output lengths: left={}, right={}",
            a.len(),
            b.len()
        );
    }
    Ok(())
}

fn benchmark_avg_ns<F>(iters: usize, mut f: F) -> Result<f64>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    for _ in 0..iters {
        f()?;
    }
    Ok(start.elapsed().as_nanos() as f64 / iters as f64)
}

fn same_nan_pattern(a: &[f64], b: &[f64]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x.is_nan() == y.is_nan())
}

// NaN pairs are compared by `same_nan_pattern` and skipped here.
fn finite_pairs<'a>(a: &'a [f64], b: &'a [f64]) -> impl Iterator<Item = (f64, f64)> + 'a {
    a.iter()
        .copied()
        .zip(b.iter().copied())
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
}

fn max_abs_error(a: &[f64], b: &[f64]) -> f64 {
    finite_pairs(a, b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

fn max_rel_error(a: &[f64], b: &[f64]) -> f64 {
    finite_pairs(a, b)
        .map(|(x, y)| (x - y).abs() / x.abs().max(y.abs()).max(f64::MIN_POSITIVE))
        .fold(0.0, f64::max)
}

fn write_summary_csv(path: &Path, rows: &[ContractRow]) -> Result<()> {
    let mut out = String::new();
    out.push_str("case_id,max_abs,max_rel,tolerance,passed,rust_ns,python_ns,speedup_vs_python\n");
    for row in rows {
        out.push_str(&format!(
            "{},{:.12e},{:.12e},{:e},{},{:.3},{:.3},{:.6}\n",
            row.case_id,
            row.max_abs,
            row.max_rel,
            row.tolerance,
            row.passed,
            row.rust_ns,
            row.python_ns,
            row.speedup_vs_python
        ));
    }
    fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}
