//! Приём и валидация GPS данных
//!
//! Байты NMEA потока прогоняются через парсер `nmea0183`; при каждом
//! обновлении позиции пересчитываются поля текущей фиксации и её
//! валидность: позиция подтверждена декодером И спутников >= 4.
//! Гистерезиса нет — валидность может меняться от цикла к циклу.
//!
//! Epoch пересчитывается только из RMC: это единственное предложение с
//! полной парой дата+время. GGA несёт лишь время суток, и пересчёт по
//! нему смешал бы свежее время со старой датой.

use std::time::Instant;

use log::debug;
use nmea0183::{ParseResult, Parser, GGA, RMC};

use regata_core::epoch_from_calendar;
use regata_types::GpsFix;

/// Фронтенд GPS приёмника.
///
/// Владеет текущей фиксацией единолично; наружу выдаются только копии.
pub struct GpsFrontend {
    parser: Parser,
    fix: GpsFix,
    position_valid: bool,
    last_update: Option<Instant>,
    parse_errors: u64,
}

impl GpsFrontend {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            fix: GpsFix::default(),
            position_valid: false,
            last_update: None,
            parse_errors: 0,
        }
    }

    /// Скармливает парсеру порцию байт потока.
    ///
    /// Возвращает `true`, если фиксация была обновлена. Мусор на входе
    /// не приводит к ошибке: битые предложения только считаются.
    pub fn feed(
        &mut self,
        bytes: &[u8],
    ) -> bool {
        let mut updated = false;

        for &byte in bytes {
            if let Some(result) = self.parser.parse_from_byte(byte) {
                match result {
                    Ok(ParseResult::RMC(Some(rmc))) => {
                        self.apply_rmc(&rmc);
                        updated = true;
                    }
                    Ok(ParseResult::RMC(None)) => {
                        // Приёмник явно сообщил: позиция невалидна
                        self.position_valid = false;
                        updated = true;
                    }
                    Ok(ParseResult::GGA(Some(gga))) => {
                        self.apply_gga(&gga);
                        updated = true;
                    }
                    Ok(ParseResult::GGA(None)) => {
                        self.position_valid = false;
                        updated = true;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        self.parse_errors += 1;
                        debug!("NMEA parse error: {e}");
                    }
                }
            }
        }

        if updated {
            self.fix.valid = self.position_valid && self.fix.satellites >= 4;
        }

        updated
    }

    /// Текущая фиксация (immutable snapshot).
    pub fn fix(&self) -> GpsFix {
        let mut fix = self.fix.clone();

        fix.age_ms = match self.last_update {
            Some(t) => t.elapsed().as_millis().min(u32::MAX as u128) as u32,
            None => u32::MAX,
        };

        fix
    }

    pub fn is_valid(&self) -> bool {
        self.fix.valid
    }

    pub fn satellites(&self) -> u8 {
        self.fix.satellites
    }

    pub fn hdop(&self) -> f32 {
        self.fix.hdop
    }

    /// Количество битых NMEA предложений с начала сессии.
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors
    }

    fn apply_rmc(
        &mut self,
        rmc: &RMC,
    ) {
        self.fix.latitude = rmc.latitude.as_f64();
        self.fix.longitude = rmc.longitude.as_f64();
        self.fix.speed_knots = rmc.speed.as_knots();

        if let Some(course) = &rmc.course {
            self.fix.course_deg = course.degrees;
        }

        self.fix.year = rmc.datetime.date.year;
        self.fix.month = rmc.datetime.date.month;
        self.fix.day = rmc.datetime.date.day;
        self.fix.hour = rmc.datetime.time.hours;
        self.fix.minute = rmc.datetime.time.minutes;
        self.fix.second = rmc.datetime.time.seconds as u8;

        // Полная пара дата+время — единственный момент пересчёта epoch.
        // Несуществующая дата оставляет предыдущее значение.
        if let Ok(epoch) = epoch_from_calendar(
            self.fix.year,
            self.fix.month,
            self.fix.day,
            self.fix.hour,
            self.fix.minute,
            self.fix.second,
        ) {
            self.fix.epoch = epoch;
        }

        self.position_valid = true;
        self.last_update = Some(Instant::now());
    }

    fn apply_gga(
        &mut self,
        gga: &GGA,
    ) {
        self.fix.latitude = gga.latitude.as_f64();
        self.fix.longitude = gga.longitude.as_f64();
        self.fix.satellites = gga.sat_in_use;
        self.fix.hdop = gga.hdop;

        self.position_valid = true;
        self.last_update = Some(Instant::now());
    }
}

impl Default for GpsFrontend {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
