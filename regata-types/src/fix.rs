/// Одна фиксация местоположения (GPS fix)
///
/// Инвариант: `valid == true` тогда и только тогда, когда декодер отметил
/// позицию валидной И `satellites >= 4`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsFix {
    /// Широта в градусах
    pub latitude: f64,
    /// Долгота в градусах
    pub longitude: f64,
    /// Скорость в узлах
    pub speed_knots: f32,
    /// Курс в градусах (0 = север)
    pub course_deg: f32,
    /// Количество спутников в решении
    pub satellites: u8,
    /// HDOP — горизонтальный фактор снижения точности (меньше — лучше)
    pub hdop: f32,
    /// Возраст фиксации в миллисекундах
    pub age_ms: u32,
    /// Год GPS (UTC)
    pub year: u16,
    /// Месяц GPS (1-12)
    pub month: u8,
    /// День GPS (1-31)
    pub day: u8,
    /// Час GPS (0-23)
    pub hour: u8,
    /// Минута GPS (0-59)
    pub minute: u8,
    /// Секунда GPS (0-59)
    pub second: u8,
    /// Unix timestamp (секунды), производный от календарных полей
    pub epoch: u32,
    /// Флаг валидности данных
    pub valid: bool,
}
