/// Широковещательный GPS пакет (выровнен со структурой приёмника Display)
#[derive(Debug, Clone, PartialEq)]
pub struct GpsPacket {
    /// Тип сообщения (1 = лодка, 2 = анемометр)
    pub message_type: i8,
    /// Имя лодки или MAC-адрес (на проводе 18 байт, NUL-терминировано)
    pub name: String,
    /// Порядковый номер пакета (для обнаружения потерь приёмником)
    pub sequence_number: u32,
    /// GPS timestamp (Unix секунды)
    pub gps_timestamp: u32,
    /// Широта в градусах
    pub latitude: f32,
    /// Долгота в градусах
    pub longitude: f32,
    /// Скорость в узлах
    pub speed: f32,
    /// Курс в градусах (0=N, 90=E, 180=S, 270=W)
    pub heading: f32,
    /// Количество видимых спутников
    pub satellites: u8,
}
