//! Compute device selection.
//!
//! An explicit preference wins; otherwise accelerators are probed in a fixed
//! order with CPU as the fallback: CUDA (NVIDIA) → MPS (Apple Silicon) → CPU.

use tracing::{debug, info};

use tts_core::Device;

/// Reports which accelerators the runtime environment offers.
pub trait DeviceProbe: Send + Sync {
    /// Whether a CUDA device can be opened.
    fn cuda_available(&self) -> bool;
    /// Whether a Metal (MPS) device can be opened.
    fn mps_available(&self) -> bool;
}

/// Probe backed by the compiled `candle-core` backends.
///
/// Without the `cuda` / `metal` features both probes report `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl DeviceProbe for SystemProbe {
    fn cuda_available(&self) -> bool {
        candle_core::utils::cuda_is_available() && candle_core::Device::new_cuda(0).is_ok()
    }

    fn mps_available(&self) -> bool {
        candle_core::utils::metal_is_available() && candle_core::Device::new_metal(0).is_ok()
    }
}

/// Select the compute device using the system probe.
///
/// An explicit preference is returned verbatim without checking that the
/// device exists; the caller is responsible for a sensible override.
pub fn select_device(explicit_preference: Option<Device>) -> Device {
    select_device_with(explicit_preference, &SystemProbe)
}

/// Select the compute device using a custom probe.
pub fn select_device_with(explicit_preference: Option<Device>, probe: &dyn DeviceProbe) -> Device {
    if let Some(device) = explicit_preference {
        info!(device = %device, "Using configured device (forced)");
        return device;
    }

    if probe.cuda_available() {
        info!(device = "cuda", "Auto-selected CUDA GPU (NVIDIA)");
        return Device::Cuda;
    }
    debug!("CUDA GPU not available");

    if probe.mps_available() {
        info!(device = "mps", "Auto-selected Metal GPU (Apple Silicon)");
        return Device::Mps;
    }
    debug!("Metal GPU not available");

    info!(device = "cpu", "Using CPU device (no GPU available)");
    Device::Cpu
}

/// Get device name for logging/display.
pub fn device_name(device: Device) -> &'static str {
    match device {
        Device::Cpu => "CPU",
        Device::Cuda => "CUDA GPU",
        Device::Mps => "Metal GPU",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe {
        cuda: bool,
        mps: bool,
    }

    impl DeviceProbe for FixedProbe {
        fn cuda_available(&self) -> bool {
            self.cuda
        }

        fn mps_available(&self) -> bool {
            self.mps
        }
    }

    #[test]
    fn test_explicit_cpu_ignores_accelerators() {
        let probe = FixedProbe {
            cuda: true,
            mps: true,
        };
        assert_eq!(select_device_with(Some(Device::Cpu), &probe), Device::Cpu);
    }

    #[test]
    fn test_explicit_preference_is_not_validated() {
        let probe = FixedProbe {
            cuda: false,
            mps: false,
        };
        assert_eq!(select_device_with(Some(Device::Cuda), &probe), Device::Cuda);
    }

    #[test]
    fn test_probe_order() {
        let both = FixedProbe {
            cuda: true,
            mps: true,
        };
        assert_eq!(select_device_with(None, &both), Device::Cuda);

        let mps_only = FixedProbe {
            cuda: false,
            mps: true,
        };
        assert_eq!(select_device_with(None, &mps_only), Device::Mps);

        let none = FixedProbe {
            cuda: false,
            mps: false,
        };
        assert_eq!(select_device_with(None, &none), Device::Cpu);
    }

    #[test]
    fn test_select_auto() {
        // Should always succeed (falls back to CPU)
        let device = select_device(None);
        assert!(matches!(device, Device::Cpu | Device::Cuda | Device::Mps));
    }

    #[test]
    fn test_device_name() {
        assert_eq!(device_name(Device::Cpu), "CPU");
        assert_eq!(device_name(Device::Mps), "Metal GPU");
    }
}
