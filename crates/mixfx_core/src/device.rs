//! Output Route Diagnostics
//!
//! Renders the platform's output devices as a short text report, one line
//! per device. Diagnostics only; the effect chain never depends on it.

use mixfx_platform::{OutputDevice, OutputDeviceKind};

/// Line used when the platform reports no output at all
pub const NO_OUTPUT_LINE: &str = "- (no output device detected)";

/// Short uppercase label for a device kind
pub fn route_label(kind: OutputDeviceKind) -> String {
    let label = match kind {
        OutputDeviceKind::Speaker => "SPEAKER",
        OutputDeviceKind::WiredHeadphones => "WIRED_HEADPHONES",
        OutputDeviceKind::WiredHeadset => "WIRED_HEADSET",
        OutputDeviceKind::UsbDevice => "USB_DEVICE",
        OutputDeviceKind::UsbHeadset => "USB_HEADSET",
        OutputDeviceKind::BluetoothA2dp => "BT_A2DP",
        OutputDeviceKind::BluetoothSco => "BT_SCO",
        OutputDeviceKind::Other(code) => return format!("TYPE_{}", code),
    };
    label.to_string()
}

/// `- KIND | name | address` per device, newline separated
pub fn describe_output_routes(devices: &[OutputDevice]) -> String {
    if devices.is_empty() {
        return NO_OUTPUT_LINE.to_string();
    }

    devices
        .iter()
        .map(|device| {
            format!(
                "- {} | {} | {}",
                route_label(device.kind),
                device.name,
                device.address
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
