use thiserror::Error;

/// Результат для операций REGATA
pub type RegataResult<T> = std::result::Result<T, RegataError>;

/// Типы ошибок формата REGATA.
#[derive(Debug, Error)]
pub enum RegataError {
    /// Буфер короче фиксированной длины пакета
    #[error("Truncated packet: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    /// Неизвестный тип сообщения
    #[error("Unknown message type: {0}")]
    UnknownMessageType(i8),

    /// Идентификатор в пакете не является валидным UTF-8
    #[error("Invalid identifier: {0}")]
    InvalidName(#[from] std::str::Utf8Error),

    /// Календарные поля вне допустимого диапазона
    #[error("Invalid calendar timestamp: {0}")]
    InvalidTimestamp(String),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegataError {
    /// Удобные конструкторы
    pub fn invalid_timestamp<S: Into<String>>(s: S) -> Self {
        Self::InvalidTimestamp(s.into())
    }
}
