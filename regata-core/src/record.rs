//! JSON лог-запись трекера
//!
//! Формат совместим с replay-файлами приёмника Display: одна
//! самодостаточная JSON-строка на запись, append-only.
//!
//! ```json
//! {"timestamp":1754483719,"type":1,"boat":{"messageType":1,
//!  "sequenceNumber":42,"gpsTimestamp":1754483719,"latitude":43.296500,
//!  "longitude":5.369800,"speed":4.5,"heading":285.0,"satellites":8}}
//! ```

use serde::{Deserialize, Serialize};

use regata_types::GpsFix;

use crate::wire::MESSAGE_TYPE_BOAT;

/// Одна запись лога (одна JSON-строка в файле).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogRecord {
    /// Unix timestamp записи (секунды)
    pub timestamp: u32,
    /// Тип записи (1 = лодка)
    #[serde(rename = "type")]
    pub kind: u8,
    /// Вложенные данные лодки
    pub boat: BoatRecord,
}

/// Вложенный объект с данными фиксации.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoatRecord {
    pub message_type: u8,
    /// Порядковый номер, присвоенный при передаче
    pub sequence_number: u32,
    pub gps_timestamp: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f32,
    pub heading: f32,
    pub satellites: u8,
}

impl LogRecord {
    /// Собирает запись из снимка фиксации и номера пакета.
    pub fn from_fix(
        fix: &GpsFix,
        sequence_number: u32,
    ) -> Self {
        LogRecord {
            timestamp: fix.epoch,
            kind: MESSAGE_TYPE_BOAT as u8,
            boat: BoatRecord {
                message_type: MESSAGE_TYPE_BOAT as u8,
                sequence_number,
                gps_timestamp: fix.epoch,
                latitude: fix.latitude,
                longitude: fix.longitude,
                speed: fix.speed_knots,
                heading: fix.course_deg,
                satellites: fix.satellites,
            },
        }
    }

    /// Сериализует запись в одну JSON-строку (без завершающего `\n`).
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
