//! Спецификация wire-формата широковещательного GPS пакета, версия 1.0
//!
//! Бинарное представление пакета, передаваемого по широковещательной
//! среде. Раскладка фиксированная, 44 байта, без неявных выравниваний:
//! отправитель и приёмник обязаны упаковывать поля побайтово одинаково.
//! Все многобайтовые числа хранятся в порядке little-endian.
//!
//! | смещение | размер | поле           |
//! |----------|--------|----------------|
//! | 0        | 1      | messageType    |
//! | 1        | 18     | name (UTF-8, NUL-терминировано) |
//! | 19       | 4      | sequenceNumber |
//! | 23       | 4      | gpsTimestamp   |
//! | 27       | 4      | latitude (f32) |
//! | 31       | 4      | longitude (f32)|
//! | 35       | 4      | speed (f32)    |
//! | 39       | 4      | heading (f32)  |
//! | 43       | 1      | satellites     |

use regata_types::{GpsFix, GpsPacket, RegataError, RegataResult};

/// Полный размер пакета в байтах
pub const PACKET_SIZE: usize = 44;

/// Размер поля имени (17 видимых байт + гарантированный NUL)
pub const NAME_FIELD_LEN: usize = 18;

/// Максимум видимых байт имени
pub const NAME_MAX_VISIBLE: usize = NAME_FIELD_LEN - 1;

/// Тип сообщения: GPS данные лодки
pub const MESSAGE_TYPE_BOAT: i8 = 1;

/// Тип сообщения: анемометр
pub const MESSAGE_TYPE_ANEMOMETER: i8 = 2;

/// Сериализация/десериализация [`GpsPacket`] в фиксированную раскладку.
pub trait GpsPacketExt: Sized {
    /// Собирает пакет из снимка фиксации и метаданных транспорта.
    fn from_fix(fix: &GpsFix, name: &str, sequence_number: u32) -> Self;

    /// Сериализует пакет в 44 байта.
    fn serialize(&self) -> [u8; PACKET_SIZE];

    /// Десериализует пакет из байтового среза.
    fn deserialize(buf: &[u8]) -> RegataResult<Self>;
}

impl GpsPacketExt for GpsPacket {
    fn from_fix(
        fix: &GpsFix,
        name: &str,
        sequence_number: u32,
    ) -> Self {
        GpsPacket {
            message_type: MESSAGE_TYPE_BOAT,
            name: truncate_name(name).to_string(),
            sequence_number,
            gps_timestamp: fix.epoch,
            latitude: fix.latitude as f32,
            longitude: fix.longitude as f32,
            speed: fix.speed_knots,
            heading: fix.course_deg,
            satellites: fix.satellites,
        }
    }

    fn serialize(&self) -> [u8; PACKET_SIZE] {
        let mut buf = [0u8; PACKET_SIZE];

        buf[0] = self.message_type as u8;

        // Имя: до 17 байт, остаток поля — нули (NUL гарантирован)
        let name = truncate_name(&self.name).as_bytes();
        buf[1..1 + name.len()].copy_from_slice(name);

        let mut off = 1 + NAME_FIELD_LEN;
        write_u32_local(&mut buf, &mut off, self.sequence_number);
        write_u32_local(&mut buf, &mut off, self.gps_timestamp);
        write_u32_local(&mut buf, &mut off, self.latitude.to_bits());
        write_u32_local(&mut buf, &mut off, self.longitude.to_bits());
        write_u32_local(&mut buf, &mut off, self.speed.to_bits());
        write_u32_local(&mut buf, &mut off, self.heading.to_bits());

        buf[off] = self.satellites;

        buf
    }

    fn deserialize(buf: &[u8]) -> RegataResult<Self> {
        if buf.len() < PACKET_SIZE {
            return Err(RegataError::Truncated {
                expected: PACKET_SIZE,
                got: buf.len(),
            });
        }

        let message_type = buf[0] as i8;
        if message_type != MESSAGE_TYPE_BOAT && message_type != MESSAGE_TYPE_ANEMOMETER {
            return Err(RegataError::UnknownMessageType(message_type));
        }

        // Имя — байты до первого NUL внутри 18-байтового поля
        let name_field = &buf[1..1 + NAME_FIELD_LEN];
        let name_len = name_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_MAX_VISIBLE);
        let name = std::str::from_utf8(&name_field[..name_len])?.to_string();

        let mut off = 1 + NAME_FIELD_LEN;
        let sequence_number = read_u32_local(buf, &mut off);
        let gps_timestamp = read_u32_local(buf, &mut off);
        let latitude = f32::from_bits(read_u32_local(buf, &mut off));
        let longitude = f32::from_bits(read_u32_local(buf, &mut off));
        let speed = f32::from_bits(read_u32_local(buf, &mut off));
        let heading = f32::from_bits(read_u32_local(buf, &mut off));
        let satellites = buf[off];

        Ok(GpsPacket {
            message_type,
            name,
            sequence_number,
            gps_timestamp,
            latitude,
            longitude,
            speed,
            heading,
            satellites,
        })
    }
}

/// Обрезает имя до 17 видимых байт по границе UTF-8 символа.
pub fn truncate_name(name: &str) -> &str {
    if name.len() <= NAME_MAX_VISIBLE {
        return name;
    }

    let mut end = NAME_MAX_VISIBLE;
    while !name.is_char_boundary(end) {
        end -= 1;
    }

    &name[..end]
}

fn write_u32_local(
    buf: &mut [u8; PACKET_SIZE],
    off: &mut usize,
    val: u32,
) {
    buf[*off..*off + 4].copy_from_slice(&val.to_le_bytes());
    *off += 4;
}

fn read_u32_local(
    buf: &[u8],
    off: &mut usize,
) -> u32 {
    let b = [buf[*off], buf[*off + 1], buf[*off + 2], buf[*off + 3]];
    *off += 4;
    u32::from_le_bytes(b)
}
