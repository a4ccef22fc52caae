//! Ротируемое JSON хранилище фиксаций
//!
//! Файл создаётся лениво — при первой валидной фиксации, чтобы не
//! плодить пустые логи. Пороги ротации проверяются ПЕРЕД записью;
//! сработавший порог закрывает текущий файл и открывает новый с именем
//! от timestamp-а текущей фиксации. Каждая запись сбрасывается на
//! носитель сразу: отключение питания теряет максимум одну строку.
//!
//! Ошибки носителя никогда не фатальны: недоступное при `begin`
//! хранилище отключается до конца сессии, ошибки записи роняют только
//! конкретную строку.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::PathBuf,
};

use log::{info, warn};

use regata_core::{log_file_name, log_file_name_with_suffix, LogRecord, MAX_NAME_COLLISIONS};
use regata_types::GpsFix;

use crate::TrackerResult;

/// Хранилище лог-файлов. Единолично владеет текущим файлом.
pub struct LogStore {
    root: PathBuf,
    max_file_bytes: u64,
    max_records: u32,
    available: bool,
    file: Option<File>,
    file_name: Option<String>,
    file_size: u64,
    record_count: u32,
}

impl LogStore {
    pub fn new(
        root: PathBuf,
        max_file_bytes: u64,
        max_records: u32,
    ) -> Self {
        Self {
            root,
            max_file_bytes,
            max_records,
            available: false,
            file: None,
            file_name: None,
            file_size: 0,
            record_count: 0,
        }
    }

    /// Монтирует хранилище.
    ///
    /// При недоступном носителе запись отключается до конца сессии —
    /// повторных попыток монтирования не делается.
    pub fn begin(
        &mut self,
        enabled: bool,
    ) {
        if !enabled {
            info!("Storage disabled");
            return;
        }

        match fs::create_dir_all(&self.root) {
            Ok(()) => {
                self.available = true;
                info!("Storage mounted: {:?}", self.root);
                info!("Waiting for first valid GPS fix to create log file...");
            }
            Err(e) => {
                self.available = false;
                warn!("Storage unavailable ({e}) — logging disabled for this session");
            }
        }
    }

    /// Добавляет одну запись.
    ///
    /// `Ok(true)` — строка записана, `Ok(false)` — пропущена (хранилище
    /// выключено или валидной фиксации ещё не было), `Err` — ошибка
    /// носителя (не фатальна для вызывающего).
    pub fn write(
        &mut self,
        fix: &GpsFix,
        ident: &str,
        sequence_number: u32,
    ) -> TrackerResult<bool> {
        if !self.available {
            return Ok(false);
        }

        // Файл создаётся только первой валидной фиксацией
        if self.file.is_none() {
            if !fix.valid {
                return Ok(false);
            }
            self.create_file(ident, fix)?;
        }

        // Пороги проверяются до записи
        if self.needs_rotation() {
            info!("Rotating storage file...");
            self.create_file(ident, fix)?;
        }

        let record = LogRecord::from_fix(fix, sequence_number);
        let written = self.append(&record)?;

        self.file_size += written;
        self.record_count += 1;

        Ok(true)
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Имя текущего файла (None до первой валидной фиксации).
    pub fn current_file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Закрывает текущий файл, фиксируя итоговую статистику в логе.
    pub fn close(&mut self) {
        if let Some(file) = self.file.take() {
            drop(file);
            info!(
                "Storage file closed: {} ({} records, {} bytes)",
                self.file_name.as_deref().unwrap_or("?"),
                self.record_count,
                self.file_size,
            );
        }
    }

    fn needs_rotation(&self) -> bool {
        self.file_size >= self.max_file_bytes || self.record_count >= self.max_records
    }

    fn create_file(
        &mut self,
        ident: &str,
        fix: &GpsFix,
    ) -> io::Result<()> {
        self.close();

        // Имя из идентификатора и календарного времени фиксации;
        // коллизии закрываются числовым суффиксом
        let mut name = log_file_name(ident, fix);
        let mut suffix = 1;

        while self.root.join(&name).exists() {
            if suffix >= MAX_NAME_COLLISIONS {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("too many name collisions for {name}"),
                ));
            }
            name = log_file_name_with_suffix(ident, fix, suffix);
            suffix += 1;
        }

        let path = self.root.join(&name);

        // create_new исключает перезапись чужого файла при гонке имён
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)?;

        info!("Log file created: {name}");

        self.file = Some(file);
        self.file_name = Some(name);
        self.file_size = 0;
        self.record_count = 0;

        Ok(())
    }

    fn append(
        &mut self,
        record: &LogRecord,
    ) -> io::Result<u64> {
        let line = record
            .to_json_line()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };

        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_data()?;

        Ok(line.len() as u64 + 1)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
