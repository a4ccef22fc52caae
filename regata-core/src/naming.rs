//! Именование лог-файлов
//!
//! Имя выводится из идентификатора устройства и календарного времени
//! фиксации в момент создания/ротации файла:
//! `gps_<ident>_<YYYY-MM-DD_HH-MM-SS>.json`. Коллизии разрешаются
//! числовым суффиксом перед расширением.

use regata_types::GpsFix;

/// Префикс имени лог-файла
pub const FILE_PREFIX: &str = "gps_";

/// Расширение лог-файла
pub const FILE_EXTENSION: &str = ".json";

/// Верхняя граница перебора суффиксов при коллизии имён
pub const MAX_NAME_COLLISIONS: u32 = 100;

/// Оставляет в идентификаторе только `[A-Za-z0-9_-]`.
///
/// MAC-адрес `D0:CF:13:0F:D9:DC` превращается в `D0CF130FD9DC`.
pub fn sanitize_identifier(ident: &str) -> String {
    ident
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Базовое имя файла для данной фиксации.
pub fn log_file_name(
    ident: &str,
    fix: &GpsFix,
) -> String {
    format!(
        "{}{}_{:04}-{:02}-{:02}_{:02}-{:02}-{:02}{}",
        FILE_PREFIX,
        sanitize_identifier(ident),
        fix.year,
        fix.month,
        fix.day,
        fix.hour,
        fix.minute,
        fix.second,
        FILE_EXTENSION,
    )
}

/// Имя файла с числовым суффиксом (разрешение коллизий).
pub fn log_file_name_with_suffix(
    ident: &str,
    fix: &GpsFix,
    suffix: u32,
) -> String {
    format!(
        "{}{}_{:04}-{:02}-{:02}_{:02}-{:02}-{:02}_{}{}",
        FILE_PREFIX,
        sanitize_identifier(ident),
        fix.year,
        fix.month,
        fix.day,
        fix.hour,
        fix.minute,
        fix.second,
        suffix,
        FILE_EXTENSION,
    )
}
