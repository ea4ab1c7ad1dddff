//! Bluetooth UUIDs and attribute handles for the ATC thermometer.
//!
//! The target sensor is a Xiaomi LYWSD03MMC running the ATC custom
//! firmware. Its GATT table (captured from a live device):
//!
//! ```text
//! Characteristic: ebe0ccc1-7a0a-4b0c-8a1a-6ff2997da3a6, Property: 0x12 (NR), Handle(0x35), VHandle(0x36)
//!     Descriptor: 2901 Characteristic User Description, Handle(0x37)
//!     Descriptor: 2902 Client Characteristic Configuration, Handle(0x38)
//! ```

use uuid::{Uuid, uuid};

// --- Advertisement service UUIDs ---

/// Environmental Sensing service. The ATC firmware broadcasts its custom
/// sensor payload as service data under this UUID.
pub const ENVIRONMENTAL_SENSING_SERVICE: Uuid = uuid!("0000181a-0000-1000-8000-00805f9b34fb");

/// 16-bit form of the Environmental Sensing service UUID.
pub const ENVIRONMENTAL_SENSING_UUID16: u16 = 0x181A;

// --- GATT characteristic UUIDs ---

/// Temperature and humidity characteristic (notify).
pub const TEMP_HUMIDITY_CHARACTERISTIC: Uuid = uuid!("ebe0ccc1-7a0a-4b0c-8a1a-6ff2997da3a6");

// --- Descriptor UUIDs and handles ---

/// Client Characteristic Configuration descriptor.
pub const CCC_DESCRIPTOR: Uuid = uuid!("00002902-0000-1000-8000-00805f9b34fb");

/// Attribute handle of the CCC descriptor on the notifiable
/// temperature/humidity characteristic. The session identifies the right
/// characteristic by this handle rather than by UUID, matching the
/// sensor's fixed GATT layout.
pub const CCC_DESCRIPTOR_HANDLE: u16 = 0x38;
