use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

/// Счётчики сессии трекера.
///
/// Атомики — чтобы обработчик Ctrl+C и финальная сводка могли читать их
/// через общий `Arc`; сам конвейер однопоточный.
#[derive(Debug, Default)]
pub struct TrackerMetrics {
    /// Циклов конвейера
    pub cycles: AtomicU64,
    /// Циклов с валидной фиксацией
    pub valid_fixes: AtomicU64,
    /// Циклов без валидной фиксации
    pub invalid_fixes: AtomicU64,
    /// Всего попыток передачи (включая повторы)
    pub send_attempts: AtomicU64,
    /// Попыток, отклонённых радио-слоем
    pub send_rejected: AtomicU64,
    /// Пакетов, принятых радио-слоем
    pub packets_sent: AtomicU64,
    /// Передач, исчерпавших все попытки
    pub broadcasts_failed: AtomicU64,
    /// Записей, добавленных в лог
    pub records_written: AtomicU64,
    /// Ошибок записи лога
    pub write_errors: AtomicU64,
}

/// Снимок метрик для отображения / тестирования.
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub duration_secs: f64,
    pub cycles: u64,
    pub valid_fixes: u64,
    pub invalid_fixes: u64,
    pub send_attempts: u64,
    pub send_rejected: u64,
    pub packets_sent: u64,
    pub broadcasts_failed: u64,
    pub records_written: u64,
    pub write_errors: u64,
    pub reject_rate_pct: f64,
}

impl TrackerMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Процент отклонённых попыток передачи (0.0-100.0).
    pub fn reject_rate_pct(&self) -> f64 {
        let attempts = self.send_attempts.load(Ordering::Relaxed);
        let rejected = self.send_rejected.load(Ordering::Relaxed);

        if attempts == 0 {
            0.0
        } else {
            rejected as f64 / attempts as f64 * 100.0
        }
    }

    /// Итоговая сводка для вывода в конце сессии.
    pub fn summary(
        &self,
        elapsed: &Instant,
    ) -> MetricsSummary {
        MetricsSummary {
            duration_secs: elapsed.elapsed().as_secs_f64(),
            cycles: self.cycles.load(Ordering::Relaxed),
            valid_fixes: self.valid_fixes.load(Ordering::Relaxed),
            invalid_fixes: self.invalid_fixes.load(Ordering::Relaxed),
            send_attempts: self.send_attempts.load(Ordering::Relaxed),
            send_rejected: self.send_rejected.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            broadcasts_failed: self.broadcasts_failed.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            reject_rate_pct: self.reject_rate_pct(),
        }
    }
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(f, "  Duration       : {:.1}s", self.duration_secs)?;
        writeln!(f, "  Cycles         : {}", self.cycles)?;
        writeln!(
            f,
            "  Fixes          : {} valid, {} invalid",
            self.valid_fixes, self.invalid_fixes
        )?;
        writeln!(f, "  Packets sent   : {}", self.packets_sent)?;
        writeln!(
            f,
            "  Send attempts  : {} ({} rejected, {:.2}%)",
            self.send_attempts, self.send_rejected, self.reject_rate_pct
        )?;
        writeln!(f, "  Bcast failures : {}", self.broadcasts_failed)?;
        writeln!(f, "  Records        : {}", self.records_written)?;
        writeln!(f, "  Write errors   : {}", self.write_errors)?;
        write!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_initial_metrics_zero() {
        let metrics = TrackerMetrics::new();
        let start = Instant::now();
        let summary = metrics.summary(&start);

        assert_eq!(summary.cycles, 0);
        assert_eq!(summary.valid_fixes, 0);
        assert_eq!(summary.packets_sent, 0);
        assert_eq!(summary.send_attempts, 0);
        assert_eq!(summary.records_written, 0);
        assert_eq!(summary.reject_rate_pct, 0.0);
    }

    #[test]
    fn test_reject_rate_calculation() {
        let metrics = TrackerMetrics::new();

        metrics.send_attempts.store(10, Ordering::Relaxed);
        metrics.send_rejected.store(3, Ordering::Relaxed);

        assert!((metrics.reject_rate_pct() - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_summary_snapshot_consistency() {
        let metrics = TrackerMetrics::new();
        metrics.cycles.store(100, Ordering::Relaxed);
        metrics.valid_fixes.store(80, Ordering::Relaxed);
        metrics.invalid_fixes.store(20, Ordering::Relaxed);
        metrics.packets_sent.store(78, Ordering::Relaxed);
        metrics.records_written.store(78, Ordering::Relaxed);
        metrics.write_errors.store(2, Ordering::Relaxed);

        let start = Instant::now() - Duration::from_secs(1);
        let summary = metrics.summary(&start);

        assert_eq!(summary.cycles, 100);
        assert_eq!(summary.valid_fixes, 80);
        assert_eq!(summary.invalid_fixes, 20);
        assert_eq!(summary.packets_sent, 78);
        assert_eq!(summary.records_written, 78);
        assert_eq!(summary.write_errors, 2);
        assert!(summary.duration_secs > 0.0);
    }
}
