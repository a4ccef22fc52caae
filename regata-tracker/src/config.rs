use std::path::PathBuf;

/// Тип источника NMEA байт (выбор при старте).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Встроенный симулятор (не требует железа).
    Simulated,
    /// Воспроизведение NMEA лога из файла.
    Replay,
}

/// Полная конфигурация сессии трекера.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Источник NMEA байт
    pub source: SourceKind,
    /// Путь к NMEA файлу (для `Replay`)
    pub input_path: Option<PathBuf>,
    /// Имя лодки — идентификатор в пакетах и именах лог-файлов
    pub boat_name: String,
    /// UDP порт широковещательной передачи
    pub udp_port: u16,
    /// Явный адрес получателя вместо broadcast (отладка/тесты)
    pub target_addr: Option<String>,
    /// Дополнительных попыток передачи после первой
    pub retries: u8,
    /// Пауза между попытками (миллисекунды)
    pub backoff_ms: u64,
    /// Период цикла конвейера (миллисекунды)
    pub cycle_interval_ms: u64,
    /// Включена ли запись на носитель
    pub storage_enabled: bool,
    /// Каталог лог-файлов
    pub storage_dir: PathBuf,
    /// Порог ротации по размеру файла (байты)
    pub max_file_bytes: u64,
    /// Порог ротации по числу записей
    pub max_records: u32,
    /// Интервал вывода статуса (секунды)
    pub stats_interval_secs: u64,
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для SourceKind, TrackerConfig
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for SourceKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            SourceKind::Simulated => write!(f, "sim"),
            SourceKind::Replay => write!(f, "replay"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sim" | "simulated" => Ok(SourceKind::Simulated),
            "replay" | "file" => Ok(SourceKind::Replay),
            _ => Err(format!("Unknown source type: '{s}'. Use: sim, replay")),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Simulated,
            input_path: None,
            boat_name: "REGATA-01".to_string(),
            udp_port: 4210,
            target_addr: None,
            retries: 2,
            backoff_ms: 50,
            cycle_interval_ms: 1_000,
            storage_enabled: true,
            storage_dir: PathBuf::from("gps_logs"),
            max_file_bytes: 10 * 1024 * 1024,
            max_records: 10_000,
            stats_interval_secs: 5,
        }
    }
}

/// Парсит `udp://host:port` или просто `host:port`.
pub fn parse_udp_target(s: &str) -> Result<String, String> {
    let addr = s.strip_prefix("udp://").unwrap_or(s);
    addr.parse::<std::net::SocketAddr>()
        .map(|a| a.to_string())
        .map_err(|e| format!("Invalid UDP address '{s}': {e}"))
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
