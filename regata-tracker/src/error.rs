use thiserror::Error;

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Источник NMEA байт недоступен или сломан
    #[error("GPS source error: {0}")]
    Source(String),

    /// Все попытки передачи отклонены радио-слоем
    #[error("Broadcast exhausted after {attempts} attempts")]
    TransportExhausted { attempts: u32 },

    /// Носитель хранилища недоступен
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Ошибка формата REGATA
    #[error("REGATA error: {0}")]
    Regata(#[from] regata_types::RegataError),

    /// Ошибка ввода/вывода
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
