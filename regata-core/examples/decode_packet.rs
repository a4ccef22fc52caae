//! Пример: приём и декодирование пакетов из UDP
//!
//! Слушает порт и печатает каждый декодированный пакет — минимальный
//! аналог приёмника Display.
//!
//! Запуск: cargo run --example decode_packet -- [порт]

use std::net::UdpSocket;

use regata_core::{GpsPacketExt, PACKET_SIZE};
use regata_types::GpsPacket;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port: u16 = std::env::args()
        .nth(1)
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(4210);

    let socket = UdpSocket::bind(("0.0.0.0", port))?;
    println!("Listening on 0.0.0.0:{port} ...");

    let mut buf = [0u8; 128];
    loop {
        let (n, from) = socket.recv_from(&mut buf)?;

        if n < PACKET_SIZE {
            eprintln!("Short datagram from {from}: {n} bytes");
            continue;
        }

        match GpsPacket::deserialize(&buf[..n]) {
            Ok(p) => println!(
                "[{}] #{} {}: {:.6},{:.6} ({:.1}kts, {:.0}°, {} sats)",
                p.gps_timestamp,
                p.sequence_number,
                p.name,
                p.latitude,
                p.longitude,
                p.speed,
                p.heading,
                p.satellites,
            ),
            Err(e) => eprintln!("Decode error from {from}: {e}"),
        }
    }
}
