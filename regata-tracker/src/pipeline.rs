use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use crate::{
    broadcast::{BroadcastLink, BroadcastMedium},
    gps::GpsFrontend,
    metrics::TrackerMetrics,
    source::GpsSource,
    store::LogStore,
    TrackerConfig, TrackerResult,
};

/// Оркестрирует цикл трекера: приём → валидация → передача → запись.
///
/// Данные текут строго в одну сторону: байты сенсора → фиксация →
/// {пакет, лог-запись}. Компоненты владеют своим состоянием единолично,
/// между циклами ничего не разделяется.
pub struct TrackerPipeline<M: BroadcastMedium> {
    config: TrackerConfig,
    frontend: GpsFrontend,
    link: BroadcastLink<M>,
    store: LogStore,
    metrics: Arc<TrackerMetrics>,
    stop_flag: Arc<AtomicBool>,
}

impl<M: BroadcastMedium> TrackerPipeline<M> {
    /// Создаёт конвейер. Возвращает также shared-ссылку на метрики.
    pub fn new(
        config: TrackerConfig,
        medium: M,
    ) -> (Self, Arc<TrackerMetrics>) {
        let metrics = TrackerMetrics::new();

        let link = BroadcastLink::new(
            medium,
            Duration::from_millis(config.backoff_ms),
            metrics.clone(),
        );
        let store = LogStore::new(
            config.storage_dir.clone(),
            config.max_file_bytes,
            config.max_records,
        );

        let p = Self {
            config,
            frontend: GpsFrontend::new(),
            link,
            store,
            metrics: metrics.clone(),
            stop_flag: Arc::new(AtomicBool::new(false)),
        };

        (p, metrics)
    }

    /// Флаг остановки. Установить в `true` для graceful shutdown.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Монтирует хранилище согласно конфигурации.
    pub fn mount_storage(&mut self) {
        self.store.begin(self.config.storage_enabled);
    }

    /// Один цикл конвейера.
    ///
    /// Вычитывает все доступные байты источника, и если фиксация
    /// валидна — передаёт её и добавляет в лог. Ошибки передачи и
    /// хранилища не прерывают работу.
    pub fn step(
        &mut self,
        source: &mut dyn GpsSource,
    ) -> TrackerResult<()> {
        self.metrics.cycles.fetch_add(1, Ordering::Relaxed);

        let mut buf = [0u8; 512];
        loop {
            let n = source.poll(&mut buf)?;
            if n == 0 {
                break;
            }
            self.frontend.feed(&buf[..n]);
        }

        let fix = self.frontend.fix();

        if !fix.valid {
            self.metrics.invalid_fixes.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Waiting for GPS fix... (sats: {}, HDOP: {:.1})",
                self.frontend.satellites(),
                self.frontend.hdop()
            );
            return Ok(());
        }

        self.metrics.valid_fixes.fetch_add(1, Ordering::Relaxed);

        match self
            .link
            .broadcast(&fix, &self.config.boat_name, self.config.retries)
        {
            Ok(()) => {
                let seq = self.link.sequence_number();

                info!(
                    "[{}] GPS: {:.6},{:.6} | {:.1}kts {:.0}° | {} sats | seq={}",
                    fix.epoch,
                    fix.latitude,
                    fix.longitude,
                    fix.speed_knots,
                    fix.course_deg,
                    fix.satellites,
                    seq,
                );

                match self.store.write(&fix, &self.config.boat_name, seq) {
                    Ok(true) => {
                        self.metrics.records_written.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(false) => {}
                    Err(e) => {
                        self.metrics.write_errors.fetch_add(1, Ordering::Relaxed);
                        warn!("Log write failed: {e}");
                        // Не прерываем — строка потеряна, конвейер работает
                    }
                }
            }
            Err(e) => {
                // Счётчик обновлён передатчиком
                warn!("{e}");
            }
        }

        Ok(())
    }

    /// Запускает цикл с заданным периодом. Блокируется до `stop_flag`.
    pub fn run(
        mut self,
        source: &mut dyn GpsSource,
    ) -> TrackerResult<()> {
        self.mount_storage();

        let cycle = Duration::from_millis(self.config.cycle_interval_ms);
        let stats_interval = Duration::from_secs(self.config.stats_interval_secs);
        let session_start = Instant::now();
        let mut last_stats = Instant::now();

        info!("Tracker started: {} @ {} ms cycle", source.name(), cycle.as_millis());

        while !self.stop_flag.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            if let Err(e) = self.step(source) {
                warn!("Cycle error: {e}");
            }

            if last_stats.elapsed() >= stats_interval {
                self.log_status(&session_start);
                last_stats = Instant::now();
            }

            let elapsed = cycle_start.elapsed();
            if cycle > elapsed {
                thread::sleep(cycle - elapsed);
            }
        }

        info!("Stop signal received. Finalizing...");
        self.store.close();

        Ok(())
    }

    fn log_status(
        &self,
        start: &Instant,
    ) {
        let m = &self.metrics;

        info!(
            "[ {:.0}s ] fix={} sats={} hdop={:.1} sent={} failed={} records={}",
            start.elapsed().as_secs_f64(),
            if self.frontend.is_valid() { "VALID" } else { "INVALID" },
            self.frontend.satellites(),
            self.frontend.hdop(),
            m.packets_sent.load(Ordering::Relaxed),
            m.broadcasts_failed.load(Ordering::Relaxed),
            m.records_written.load(Ordering::Relaxed),
        );

        match self.store.current_file_name() {
            Some(name) if self.store.is_available() => {
                info!("  Storage: {name} ({} records)", self.store.record_count());
            }
            _ if self.store.is_available() => info!("  Storage: waiting for GPS fix..."),
            _ => debug!("  Storage: disabled"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io;

    use tempfile::TempDir;

    use super::*;

    const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC: &[u8] = b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,060825,003.1,W*6C\r\n";
    const GGA_3_SATS: &[u8] =
        b"$GPGGA,123519,4807.038,N,01131.000,E,1,03,0.9,545.4,M,46.9,M,,*4C\r\n";

    /// Источник, отдающий заготовленные пачки байт по одной на цикл.
    struct ScriptedSource {
        batches: Vec<Vec<u8>>,
        next: usize,
        emitted_this_cycle: bool,
    }

    impl ScriptedSource {
        fn new(batches: Vec<Vec<u8>>) -> Self {
            Self {
                batches,
                next: 0,
                emitted_this_cycle: false,
            }
        }

        fn rewind_cycle(&mut self) {
            self.emitted_this_cycle = false;
        }
    }

    impl GpsSource for ScriptedSource {
        fn name(&self) -> &str {
            "Scripted"
        }

        fn poll(
            &mut self,
            buf: &mut [u8],
        ) -> TrackerResult<usize> {
            if self.emitted_this_cycle || self.next >= self.batches.len() {
                return Ok(0);
            }

            let batch = &self.batches[self.next];
            self.next += 1;
            self.emitted_this_cycle = true;

            buf[..batch.len()].copy_from_slice(batch);
            Ok(batch.len())
        }
    }

    /// Среда, принимающая всё и копящая кадры.
    struct SinkMedium {
        frames: Vec<Vec<u8>>,
    }

    impl BroadcastMedium for SinkMedium {
        fn send(
            &mut self,
            frame: &[u8],
        ) -> io::Result<()> {
            self.frames.push(frame.to_vec());
            Ok(())
        }
    }

    fn make_config(dir: &TempDir) -> TrackerConfig {
        TrackerConfig {
            boat_name: "TEST-BOAT".to_string(),
            storage_enabled: true,
            storage_dir: dir.path().to_path_buf(),
            backoff_ms: 0,
            max_records: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_fix_broadcast_and_logged() {
        let dir = TempDir::new().unwrap();
        let (mut pipeline, metrics) =
            TrackerPipeline::new(make_config(&dir), SinkMedium { frames: Vec::new() });
        pipeline.mount_storage();

        let mut source =
            ScriptedSource::new(vec![[GGA, RMC].concat()]);

        pipeline.step(&mut source).unwrap();

        assert_eq!(metrics.valid_fixes.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.packets_sent.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.records_written.load(Ordering::Relaxed), 1);
        assert_eq!(pipeline.link.sequence_number(), 1);

        // Ровно один лог-файл с одной записью
        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_invalid_fix_not_broadcast() {
        let dir = TempDir::new().unwrap();
        let (mut pipeline, metrics) =
            TrackerPipeline::new(make_config(&dir), SinkMedium { frames: Vec::new() });
        pipeline.mount_storage();

        let mut source = ScriptedSource::new(vec![GGA_3_SATS.to_vec()]);

        pipeline.step(&mut source).unwrap();

        assert_eq!(metrics.invalid_fixes.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.packets_sent.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.records_written.load(Ordering::Relaxed), 0);

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(files.is_empty(), "без валидной фиксации файлов нет");
    }

    #[test]
    fn test_cached_fix_rebroadcast_each_cycle() {
        // Источник замолкает после первой пачки — фиксация остаётся
        // валидной и передаётся в каждом цикле со своим номером
        let dir = TempDir::new().unwrap();
        let (mut pipeline, metrics) =
            TrackerPipeline::new(make_config(&dir), SinkMedium { frames: Vec::new() });
        pipeline.mount_storage();

        let mut source = ScriptedSource::new(vec![[GGA, RMC].concat()]);

        for _ in 0..3 {
            source.rewind_cycle();
            pipeline.step(&mut source).unwrap();
        }

        assert_eq!(metrics.packets_sent.load(Ordering::Relaxed), 3);
        assert_eq!(pipeline.link.sequence_number(), 3);
        assert_eq!(metrics.records_written.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_storage_failure_does_not_stop_broadcast() {
        // Хранилище недоступно — каталог под существующим файлом
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let mut config = make_config(&dir);
        config.storage_dir = blocker.join("logs");

        let (mut pipeline, metrics) =
            TrackerPipeline::new(config, SinkMedium { frames: Vec::new() });
        pipeline.mount_storage();

        let mut source = ScriptedSource::new(vec![[GGA, RMC].concat()]);
        pipeline.step(&mut source).unwrap();

        // Передача прошла, записей нет, ошибок записи тоже нет (no-op)
        assert_eq!(metrics.packets_sent.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.records_written.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.write_errors.load(Ordering::Relaxed), 0);
    }
}
