//! Библиотека форматов REGATA
//!
//! Эталонная реализация wire-формата широковещательных GPS пакетов и
//! JSON-формата лог-записей трекера.
//!
//! # Быстрый старт
//!
//! ```
//! use regata_types::{GpsFix, GpsPacket};
//! use regata_core::{GpsPacketExt, PACKET_SIZE};
//!
//! let mut fix = GpsFix::default();
//! fix.latitude = 43.2965;
//! fix.longitude = 5.3698;
//! fix.valid = true;
//!
//! let packet = GpsPacket::from_fix(&fix, "REGATA-01", 1);
//! let frame = packet.serialize();
//! assert_eq!(frame.len(), PACKET_SIZE);
//!
//! let decoded = GpsPacket::deserialize(&frame)?;
//! assert_eq!(decoded, packet);
//! # Ok::<(), regata_types::RegataError>(())
//! ```

pub mod naming;
pub mod record;
pub mod time;
pub mod wire;

pub use naming::*;
pub use record::*;
pub use time::*;
pub use wire::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert_eq!(PACKET_SIZE, 44);
        assert_eq!(NAME_FIELD_LEN, 18);
    }
}
