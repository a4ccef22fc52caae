//! Пример: сборка и сериализация широковещательного пакета
//!
//! Демонстрирует:
//! - заполнение GpsFix вручную
//! - вычисление epoch из календарных полей
//! - сериализацию в 44-байтовый кадр

use regata_core::{epoch_from_calendar, GpsPacketExt, PACKET_SIZE};
use regata_types::{GpsFix, GpsPacket};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut fix = GpsFix {
        latitude: 43.296_5,
        longitude: 5.369_8,
        speed_knots: 4.5,
        course_deg: 285.0,
        satellites: 8,
        hdop: 0.9,
        year: 2025,
        month: 8,
        day: 6,
        hour: 12,
        minute: 35,
        second: 19,
        valid: true,
        ..Default::default()
    };
    fix.epoch = epoch_from_calendar(fix.year, fix.month, fix.day, fix.hour, fix.minute, fix.second)?;

    let packet = GpsPacket::from_fix(&fix, "REGATA-01", 1);
    let frame = packet.serialize();

    println!("Packet: {packet:#?}");
    println!("\nFrame ({PACKET_SIZE} bytes):");
    for chunk in frame.chunks(16) {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02X}")).collect();
        println!("  {}", hex.join(" "));
    }

    Ok(())
}
