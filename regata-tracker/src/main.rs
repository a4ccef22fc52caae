use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use clap::Parser;
use log::{error, info, warn};
use regata_tracker::{
    create_source, parse_udp_target, SourceKind, TrackerConfig, TrackerPipeline, UdpMedium,
};

#[derive(Parser, Debug)]
#[command(
    name = "regata-tracker",
    version = env!("CARGO_PKG_VERSION"),
    about = "Broadcast GPS fixes over UDP and log them to rotating JSON files",
    long_about = None,
)]
struct Cli {
    /// Источник NMEA: sim, replay
    #[arg(short, long, default_value = "sim")]
    source: String,
    /// Путь к NMEA файлу (для --source replay)
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Имя лодки (до 17 символов в пакете)
    #[arg(short, long, default_value = "REGATA-01")]
    name: String,
    /// UDP порт широковещания
    #[arg(short, long, default_value = "4210")]
    port: u16,
    /// Явный адрес получателя (host:port) вместо broadcast
    #[arg(long)]
    target: Option<String>,
    /// Дополнительных попыток передачи после первой
    #[arg(short, long, default_value = "2")]
    retries: u8,
    /// Пауза между попытками, мс
    #[arg(long, default_value = "50")]
    backoff: u64,
    /// Период цикла, мс
    #[arg(long, default_value = "1000")]
    interval: u64,
    /// Отключить запись лог-файлов
    #[arg(long)]
    no_storage: bool,
    /// Каталог лог-файлов
    #[arg(long, default_value = "gps_logs")]
    storage_dir: PathBuf,
    /// Порог ротации по размеру файла, байты
    #[arg(long, default_value = "10485760")]
    max_file_bytes: u64,
    /// Порог ротации по числу записей
    #[arg(long, default_value = "10000")]
    max_records: u32,
    /// Интервал вывода статуса, секунды
    #[arg(long, default_value = "5")]
    stats_interval: u64,
    /// Тихий режим (только ошибки)
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet { "error" } else { "info" };

    env_logger::Builder::new()
        .filter_level(level.parse().unwrap())
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let source_kind: SourceKind = match cli.source.parse() {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let target_addr = match cli.target.as_deref().map(parse_udp_target).transpose() {
        Ok(t) => t,
        Err(e) => {
            error!("--target: {e}");
            std::process::exit(1);
        }
    };

    let config = TrackerConfig {
        source: source_kind,
        input_path: cli.input.clone(),
        boat_name: cli.name.clone(),
        udp_port: cli.port,
        target_addr: target_addr.clone(),
        retries: cli.retries,
        backoff_ms: cli.backoff,
        cycle_interval_ms: cli.interval,
        storage_enabled: !cli.no_storage,
        storage_dir: cli.storage_dir.clone(),
        max_file_bytes: cli.max_file_bytes,
        max_records: cli.max_records,
        stats_interval_secs: cli.stats_interval,
    };

    let mut source = match create_source(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open source: {e}");
            std::process::exit(1);
        }
    };

    let medium = match &target_addr {
        Some(addr) => UdpMedium::to_target(addr.as_str()),
        None => UdpMedium::broadcast(cli.port),
    };
    let medium = match medium {
        Ok(m) => m,
        Err(e) => {
            error!("Failed to open UDP socket: {e}");
            std::process::exit(1);
        }
    };

    let (pipeline, metrics) = TrackerPipeline::new(config, medium);
    let stop_flag: Arc<AtomicBool> = pipeline.stop_flag();

    let stop_ctrlc = stop_flag.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        if stop_ctrlc.swap(true, Ordering::SeqCst) {
            // Второй Ctrl+C — принудительный выход
            warn!("Force exit");
            std::process::exit(130);
        }
        warn!("Ctrl+C received — finishing current cycle and closing log file...");
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }

    // Выводим конфигурацию
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Boat          : {}", cli.name);
    info!("  Source        : {}", cli.source);
    match &target_addr {
        Some(addr) => info!("  Target        : {addr}"),
        None => info!("  Target        : 255.255.255.255:{}", cli.port),
    }
    info!("  Retries       : {} (+{} ms backoff)", cli.retries, cli.backoff);
    info!("  Cycle         : {} ms", cli.interval);
    if cli.no_storage {
        info!("  Storage       : disabled");
    } else {
        info!(
            "  Storage       : {:?} (rotate at {} B / {} records)",
            cli.storage_dir, cli.max_file_bytes, cli.max_records
        );
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let session_start = Instant::now();

    if let Err(e) = pipeline.run(source.as_mut()) {
        error!("Tracker failed: {e}");
        std::process::exit(1);
    }

    // --- Итоговая статистика ---
    let summary = metrics.summary(&session_start);
    info!("\n{summary}");

    if metrics.broadcasts_failed.load(Ordering::Relaxed) > 0 {
        warn!(
            "⚠ {} broadcasts exhausted all attempts ({:.2}% attempts rejected). \
             Broadcast medium gives no delivery guarantee — receivers rely on sequence gaps.",
            metrics.broadcasts_failed.load(Ordering::Relaxed),
            summary.reject_rate_pct,
        );
    }

    if metrics.write_errors.load(Ordering::Relaxed) > 0 {
        warn!(
            "⚠ {} log records lost to write errors. Check storage medium and free space.",
            metrics.write_errors.load(Ordering::Relaxed)
        );
    }

    info!("✓ Session complete: {} packets broadcast", summary.packets_sent);
}
