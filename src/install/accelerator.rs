// src/install/accelerator.rs

//! Accelerator selection: which PyTorch wheel variant and which dependency
//! set to install.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// PyTorch wheel variants published on the download index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TorchVariant {
    Cuda118,
    Cuda124,
    Cuda126,
    Cuda128,
    Cpu,
}

impl TorchVariant {
    /// CUDA releases we know a wheel index for, in detection priority order.
    pub const CUDA: [TorchVariant; 4] = [
        TorchVariant::Cuda118,
        TorchVariant::Cuda124,
        TorchVariant::Cuda126,
        TorchVariant::Cuda128,
    ];

    /// Path segment appended to the wheel index URL.
    pub fn index_suffix(self) -> &'static str {
        match self {
            TorchVariant::Cuda118 => "cu118",
            TorchVariant::Cuda124 => "cu124",
            TorchVariant::Cuda126 => "cu126",
            TorchVariant::Cuda128 => "cu128",
            TorchVariant::Cpu => "cpu",
        }
    }

    /// CUDA release number, `None` for the CPU build.
    pub fn cuda_release(self) -> Option<&'static str> {
        match self {
            TorchVariant::Cuda118 => Some("11.8"),
            TorchVariant::Cuda124 => Some("12.4"),
            TorchVariant::Cuda126 => Some("12.6"),
            TorchVariant::Cuda128 => Some("12.8"),
            TorchVariant::Cpu => None,
        }
    }

    /// Interpret an answer to the manual selection menu.
    ///
    /// Empty means the first entry; anything unrecognised falls back to
    /// CUDA 11.8.
    pub fn from_menu(answer: &str) -> Self {
        match answer.trim() {
            "" | "1" => TorchVariant::Cuda118,
            "2" => TorchVariant::Cuda124,
            "3" => TorchVariant::Cuda126,
            "4" => TorchVariant::Cpu,
            _ => TorchVariant::Cuda118,
        }
    }

    pub const MENU: [&'static str; 4] = ["CUDA 11.8", "CUDA 12.4", "CUDA 12.6", "CPU (no CUDA)"];
}

impl fmt::Display for TorchVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cuda_release() {
            Some(release) => write!(f, "CUDA {release}"),
            None => f.write_str("CPU"),
        }
    }
}

impl FromStr for TorchVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "11.8" | "cu118" => Ok(TorchVariant::Cuda118),
            "12.4" | "cu124" => Ok(TorchVariant::Cuda124),
            "12.6" | "cu126" => Ok(TorchVariant::Cuda126),
            "12.8" | "cu128" => Ok(TorchVariant::Cuda128),
            "cpu" => Ok(TorchVariant::Cpu),
            other => Err(format!(
                "invalid torch variant: {other} (expected 11.8, 12.4, 12.6, 12.8 or cpu)"
            )),
        }
    }
}

/// GPU vendor, which decides the requirements file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuVendor {
    #[default]
    Nvidia,
    Amd,
}

impl GpuVendor {
    pub const MENU: [&'static str; 2] = ["Nvidia (default)", "AMD"];

    /// Interpret an answer to the vendor menu.
    ///
    /// Returns `None` for an answer that is neither empty nor a listed entry;
    /// the caller falls back to the default vendor.
    pub fn from_menu(answer: &str) -> Option<Self> {
        match answer.trim() {
            "" | "1" => Some(GpuVendor::Nvidia),
            "2" => Some(GpuVendor::Amd),
            _ => None,
        }
    }
}

impl fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuVendor::Nvidia => f.write_str("Nvidia"),
            GpuVendor::Amd => f.write_str("AMD"),
        }
    }
}

impl FromStr for GpuVendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nvidia" => Ok(GpuVendor::Nvidia),
            "amd" | "dml" => Ok(GpuVendor::Amd),
            other => Err(format!(
                "invalid gpu vendor: {other} (expected \"nvidia\" or \"amd\")"
            )),
        }
    }
}

static RELEASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"release ([^,]*)").expect("static regex"));

/// Find a supported CUDA release in `nvcc --version` output.
///
/// Looks at every line carrying a `release X.Y` marker (case-insensitive).
/// An exact match wins; otherwise a release that starts with a supported
/// version, or a line mentioning `vX.Y`, maps to that version.
pub fn parse_cuda_release(output: &str) -> Option<TorchVariant> {
    let lowered = output.to_lowercase();

    for line in lowered.lines() {
        let Some(caps) = RELEASE_RE.captures(line) else {
            continue;
        };
        let release = caps[1].trim();

        if let Some(variant) = TorchVariant::CUDA
            .into_iter()
            .find(|v| v.cuda_release() == Some(release))
        {
            return Some(variant);
        }

        for variant in TorchVariant::CUDA {
            let Some(version) = variant.cuda_release() else {
                continue;
            };
            if release.starts_with(version) || line.contains(&format!("v{version}")) {
                return Some(variant);
            }
        }
    }

    None
}
