// Симулятор имитирует реальный NMEA поток: пара GGA+RMC раз в секунду,
// лодка ходит по окружности с небольшим дрожанием курса, контрольные
// суммы предложений корректны — конвейер видит данные почти как с
// настоящего приёмника. ReplaySource проигрывает записанный NMEA лог
// построчно с тем же темпом.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    time::{Duration, Instant},
};

use chrono::{Datelike, Timelike, Utc};
use log::info;
use rand::Rng;

use crate::{SourceKind, TrackerConfig, TrackerError, TrackerResult};

/// Источник сырых NMEA байт.
// Реализации: [`SimulatedGps`], [`ReplaySource`]; железный UART —
// забота внешнего слоя, сюда он входит через тот же трейт.
pub trait GpsSource {
    /// Имя источника для логов.
    fn name(&self) -> &str;

    /// Читает доступные байты в `buf`. `Ok(0)` — данных пока нет.
    fn poll(&mut self, buf: &mut [u8]) -> TrackerResult<usize>;
}

/// Симулятор GPS приёмника: круговой галс вокруг базовой точки.
pub struct SimulatedGps {
    /// Центр окружности, широта (градусы)
    pub base_lat: f64,
    /// Центр окружности, долгота (градусы)
    pub base_lon: f64,
    /// Радиус окружности (градусы, ~100 м)
    pub radius_deg: f64,
    /// Скорость лодки (узлы)
    pub speed_knots: f32,
    /// Спутников в решении
    pub satellites: u8,

    angle_deg: f64,
    pending: Vec<u8>,
    last_emit: Option<Instant>,
    emit_interval: Duration,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SimulatedGps {
    pub fn new() -> Self {
        Self {
            // Марсельская бухта — старт учебной регаты
            base_lat: 43.296_5,
            base_lon: 5.369_8,
            radius_deg: 0.001,
            speed_knots: 4.5,
            satellites: 10,
            angle_deg: 0.0,
            pending: Vec::new(),
            last_emit: None,
            emit_interval: Duration::from_secs(1),
        }
    }

    /// Генерирует пару предложений GGA+RMC для текущей позиции.
    fn generate(&mut self) {
        let now = Utc::now();

        let rad = self.angle_deg.to_radians();
        let lat = self.base_lat + self.radius_deg * rad.cos();
        let lon = self.base_lon + self.radius_deg * rad.sin();

        // Курс касательной к окружности + дрожание
        let jitter: f64 = rand::thread_rng().gen_range(-2.0..2.0);
        let course = (self.angle_deg + 90.0 + jitter).rem_euclid(360.0);

        let hms = format!("{:02}{:02}{:02}", now.hour(), now.minute(), now.second());
        let dmy = format!(
            "{:02}{:02}{:02}",
            now.day(),
            now.month(),
            now.year() % 100
        );

        let (lat_str, lat_hemi) = format_lat(lat);
        let (lon_str, lon_hemi) = format_lon(lon);

        let gga = format!(
            "GPGGA,{hms},{lat_str},{lat_hemi},{lon_str},{lon_hemi},1,{:02},1.0,12.0,M,46.9,M,,",
            self.satellites
        );
        let rmc = format!(
            "GPRMC,{hms},A,{lat_str},{lat_hemi},{lon_str},{lon_hemi},{:05.1},{course:05.1},{dmy},,",
            self.speed_knots
        );

        self.pending.extend_from_slice(sentence(&gga).as_bytes());
        self.pending.extend_from_slice(sentence(&rmc).as_bytes());

        self.angle_deg = (self.angle_deg + 2.0).rem_euclid(360.0);
    }
}

impl Default for SimulatedGps {
    fn default() -> Self {
        Self::new()
    }
}

impl GpsSource for SimulatedGps {
    fn name(&self) -> &str {
        "Simulated GPS"
    }

    fn poll(
        &mut self,
        buf: &mut [u8],
    ) -> TrackerResult<usize> {
        let due = self
            .last_emit
            .map_or(true, |t| t.elapsed() >= self.emit_interval);

        if self.pending.is_empty() && due {
            self.generate();
            self.last_emit = Some(Instant::now());
        }

        Ok(drain_pending(&mut self.pending, buf))
    }
}

/// Воспроизведение записанного NMEA лога: одна строка за интервал.
pub struct ReplaySource {
    reader: BufReader<File>,
    display_name: String,
    pending: Vec<u8>,
    last_emit: Option<Instant>,
    emit_interval: Duration,
    eof: bool,
    lines_played: u64,
}

impl ReplaySource {
    pub fn open(
        path: &std::path::Path,
        emit_interval: Duration,
    ) -> TrackerResult<Self> {
        let file = File::open(path)?;

        Ok(Self {
            reader: BufReader::new(file),
            display_name: format!("Replay {path:?}"),
            pending: Vec::new(),
            last_emit: None,
            emit_interval,
            eof: false,
            lines_played: 0,
        })
    }
}

impl GpsSource for ReplaySource {
    fn name(&self) -> &str {
        &self.display_name
    }

    fn poll(
        &mut self,
        buf: &mut [u8],
    ) -> TrackerResult<usize> {
        if !self.pending.is_empty() {
            return Ok(drain_pending(&mut self.pending, buf));
        }

        if self.eof {
            return Ok(0);
        }

        let due = self
            .last_emit
            .map_or(true, |t| t.elapsed() >= self.emit_interval);
        if !due {
            return Ok(0);
        }

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            self.eof = true;
            info!("Replay finished: {} sentences", self.lines_played);
            return Ok(0);
        }

        self.lines_played += 1;
        self.last_emit = Some(Instant::now());
        self.pending.extend_from_slice(line.as_bytes());

        Ok(drain_pending(&mut self.pending, buf))
    }
}

/// Создаёт источник по конфигурации.
pub fn create_source(config: &TrackerConfig) -> TrackerResult<Box<dyn GpsSource>> {
    match config.source {
        SourceKind::Simulated => Ok(Box::new(SimulatedGps::new())),
        SourceKind::Replay => {
            let path = config.input_path.as_ref().ok_or_else(|| {
                TrackerError::Source("replay source requires --input <file>".to_string())
            })?;

            let source = ReplaySource::open(path, Duration::from_millis(500))?;
            Ok(Box::new(source))
        }
    }
}

fn drain_pending(
    pending: &mut Vec<u8>,
    buf: &mut [u8],
) -> usize {
    let n = pending.len().min(buf.len());
    buf[..n].copy_from_slice(&pending[..n]);
    pending.drain(..n);
    n
}

/// XOR контрольная сумма тела предложения (между `$` и `*`).
fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

/// Оборачивает тело в полное NMEA предложение с CRLF.
fn sentence(body: &str) -> String {
    format!("${body}*{:02X}\r\n", checksum(body))
}

/// ddmm.mmm + полусфера для широты.
fn format_lat(lat: f64) -> (String, char) {
    let hemi = if lat >= 0.0 { 'N' } else { 'S' };
    let abs = lat.abs();
    let deg = abs.trunc();
    let min = (abs - deg) * 60.0;

    (format!("{:02}{:06.3}", deg as u32, min), hemi)
}

/// dddmm.mmm + полусфера для долготы.
fn format_lon(lon: f64) -> (String, char) {
    let hemi = if lon >= 0.0 { 'E' } else { 'W' };
    let abs = lon.abs();
    let deg = abs.trunc();
    let min = (abs - deg) * 60.0;

    (format!("{:03}{:06.3}", deg as u32, min), hemi)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
