//! Широковещательная передача GPS пакетов
//!
//! ВАЖНО: широковещательная среда не даёт подтверждений от приёмников.
//! Успех `send` означает только, что кадр принят локальным радио-слоем,
//! а не что его кто-то получил. Повторные попытки повышают вероятность
//! приёма, но не гарантируют его — это ограничение среды, а не реализации.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    sync::{atomic::Ordering, Arc},
    thread,
    time::Duration,
};

use log::{debug, warn};

use regata_core::GpsPacketExt;
use regata_types::{GpsFix, GpsPacket};

use crate::{metrics::TrackerMetrics, TrackerError, TrackerResult};

/// Абстракция широковещательной среды передачи.
///
/// Среда — объект экземпляра, а не процесса: несколько передатчиков
/// могут сосуществовать и тестироваться независимо.
pub trait BroadcastMedium {
    /// Отправляет один кадр. `Ok` подтверждает приём кадра локальным
    /// радио-слоем, но не доставку.
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;
}

/// UDP broadcast среда (аналог радио-broadcast на FF:FF:FF:FF:FF:FF).
pub struct UdpMedium {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpMedium {
    /// Среда, вещающая на 255.255.255.255:`port`.
    pub fn broadcast(port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_broadcast(true)?;

        Ok(Self {
            socket,
            target: SocketAddr::from((Ipv4Addr::BROADCAST, port)),
        })
    }

    /// Среда с явным адресом получателя (отладка, тесты).
    pub fn to_target<A: ToSocketAddrs>(target: A) -> io::Result<Self> {
        let target = target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty target address"))?;

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_broadcast(true)?;

        Ok(Self { socket, target })
    }
}

impl BroadcastMedium for UdpMedium {
    fn send(
        &mut self,
        frame: &[u8],
    ) -> io::Result<()> {
        self.socket.send_to(frame, self.target).map(|_| ())
    }
}

/// Передатчик пакетов с нумерацией и ограниченными повторами.
///
/// Машина состояний одного вызова:
/// `Idle → Sending(attempt=0) → {Accepted ⇒ Done | Rejected → Backoff →
/// Sending(attempt+1)} → ... → Done(failure)` после исчерпания попыток.
pub struct BroadcastLink<M: BroadcastMedium> {
    medium: M,
    sequence: u32,
    backoff: Duration,
    metrics: Arc<TrackerMetrics>,
}

impl<M: BroadcastMedium> BroadcastLink<M> {
    pub fn new(
        medium: M,
        backoff: Duration,
        metrics: Arc<TrackerMetrics>,
    ) -> Self {
        Self {
            medium,
            sequence: 0,
            backoff,
            metrics,
        }
    }

    /// Передаёт одну фиксацию.
    ///
    /// Номер пакета присваивается один раз на вызов, не на попытку;
    /// первый пакет сессии получает номер 1. Попытка 0 уходит сразу,
    /// каждая отклонённая попытка ждёт backoff, всего попыток
    /// `1 + retries`. `Ok` — хотя бы одна попытка принята радио-слоем.
    pub fn broadcast(
        &mut self,
        fix: &GpsFix,
        name: &str,
        retries: u8,
    ) -> TrackerResult<()> {
        self.sequence = self.sequence.wrapping_add(1);

        let packet = GpsPacket::from_fix(fix, name, self.sequence);
        let frame = packet.serialize();
        let max_attempts = retries as u32 + 1;

        for attempt in 0..max_attempts {
            self.metrics.send_attempts.fetch_add(1, Ordering::Relaxed);

            match self.medium.send(&frame) {
                Ok(()) => {
                    self.metrics.packets_sent.fetch_add(1, Ordering::Relaxed);

                    if attempt > 0 {
                        debug!("Broadcast #{} accepted on attempt {}", self.sequence, attempt + 1);
                    }

                    return Ok(());
                }
                Err(e) => {
                    self.metrics.send_rejected.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "Broadcast #{} attempt {}/{} rejected: {e}",
                        self.sequence,
                        attempt + 1,
                        max_attempts
                    );

                    if attempt + 1 < max_attempts {
                        thread::sleep(self.backoff);
                    }
                }
            }
        }

        self.metrics.broadcasts_failed.fetch_add(1, Ordering::Relaxed);

        Err(TrackerError::TransportExhausted {
            attempts: max_attempts,
        })
    }

    /// Номер, присвоенный последнему вызову `broadcast`.
    pub fn sequence_number(&self) -> u32 {
        self.sequence
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    /// Среда по сценарию: i-й вызов send принимается, если script[i].
    /// После конца сценария — всегда принимается.
    struct ScriptedMedium {
        script: Vec<bool>,
        calls: usize,
        frames: Vec<Vec<u8>>,
    }

    impl ScriptedMedium {
        fn new(script: Vec<bool>) -> Self {
            Self {
                script,
                calls: 0,
                frames: Vec::new(),
            }
        }
    }

    impl BroadcastMedium for ScriptedMedium {
        fn send(
            &mut self,
            frame: &[u8],
        ) -> io::Result<()> {
            let accept = self.script.get(self.calls).copied().unwrap_or(true);
            self.calls += 1;

            if accept {
                self.frames.push(frame.to_vec());
                Ok(())
            } else {
                Err(io::Error::new(io::ErrorKind::Other, "radio busy"))
            }
        }
    }

    fn make_fix() -> GpsFix {
        GpsFix {
            latitude: 48.1173,
            longitude: 11.516_666,
            speed_knots: 22.4,
            course_deg: 84.4,
            satellites: 8,
            epoch: 1_754_483_719,
            valid: true,
            ..Default::default()
        }
    }

    fn make_link(script: Vec<bool>) -> BroadcastLink<ScriptedMedium> {
        BroadcastLink::new(
            ScriptedMedium::new(script),
            Duration::ZERO,
            TrackerMetrics::new(),
        )
    }

    #[test]
    fn test_sequence_starts_at_one() {
        let mut link = make_link(vec![]);

        link.broadcast(&make_fix(), "BOAT", 0).unwrap();
        assert_eq!(link.sequence_number(), 1);
    }

    #[test]
    fn test_sequence_increments_once_per_call() {
        // Второй вызов трижды отклоняется — номер всё равно растёт на 1
        let mut link = make_link(vec![true, false, false, true]);

        link.broadcast(&make_fix(), "BOAT", 2).unwrap();
        assert_eq!(link.sequence_number(), 1);

        link.broadcast(&make_fix(), "BOAT", 2).unwrap();
        assert_eq!(link.sequence_number(), 2);

        link.broadcast(&make_fix(), "BOAT", 2).unwrap();
        assert_eq!(link.sequence_number(), 3);
    }

    #[test]
    fn test_zero_retries_single_attempt() {
        let mut link = make_link(vec![false]);

        let result = link.broadcast(&make_fix(), "BOAT", 0);

        assert!(matches!(
            result,
            Err(TrackerError::TransportExhausted { attempts: 1 })
        ));
        assert_eq!(link.medium.calls, 1, "ровно одна попытка при retries=0");
    }

    #[test]
    fn test_success_on_last_attempt() {
        let mut link = make_link(vec![false, false, true]);

        link.broadcast(&make_fix(), "BOAT", 2).unwrap();
        assert_eq!(link.medium.calls, 3);
        assert_eq!(link.medium.frames.len(), 1);
    }

    #[test]
    fn test_exhausted_after_all_rejections() {
        let mut link = make_link(vec![false, false, false]);

        let result = link.broadcast(&make_fix(), "BOAT", 2);

        assert!(matches!(
            result,
            Err(TrackerError::TransportExhausted { attempts: 3 })
        ));
        assert_eq!(link.medium.calls, 3);

        // Сеанс продолжается: следующий вызов получает следующий номер
        link.broadcast(&make_fix(), "BOAT", 0).unwrap();
        assert_eq!(link.sequence_number(), 2);
    }

    #[test]
    fn test_stops_at_first_acceptance() {
        let mut link = make_link(vec![true, true, true]);

        link.broadcast(&make_fix(), "BOAT", 2).unwrap();
        assert_eq!(link.medium.calls, 1, "после успеха попытки прекращаются");
    }

    #[test]
    fn test_every_attempt_observable() {
        let metrics = TrackerMetrics::new();
        let mut link = BroadcastLink::new(
            ScriptedMedium::new(vec![false, true]),
            Duration::ZERO,
            metrics.clone(),
        );

        link.broadcast(&make_fix(), "BOAT", 2).unwrap();

        assert_eq!(metrics.send_attempts.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.send_rejected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.packets_sent.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.broadcasts_failed.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_frame_carries_fix_and_sequence() {
        let mut link = make_link(vec![]);

        link.broadcast(&make_fix(), "REGATA-01", 0).unwrap();

        let frame = &link.medium.frames[0];
        let packet = GpsPacket::deserialize(frame).unwrap();

        assert_eq!(packet.name, "REGATA-01");
        assert_eq!(packet.sequence_number, 1);
        assert_eq!(packet.gps_timestamp, 1_754_483_719);
        assert_eq!(packet.satellites, 8);
        assert!((packet.speed - 22.4).abs() < 1e-6);
    }

    #[test]
    fn test_udp_medium_delivers_frame() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let addr = listener.local_addr().unwrap();

        let medium = UdpMedium::to_target(addr).unwrap();
        let mut link = BroadcastLink::new(medium, Duration::ZERO, TrackerMetrics::new());

        link.broadcast(&make_fix(), "REGATA-01", 0).unwrap();

        let mut buf = [0u8; 128];
        let n = listener.recv(&mut buf).unwrap();
        let packet = GpsPacket::deserialize(&buf[..n]).unwrap();

        assert_eq!(packet.name, "REGATA-01");
        assert_eq!(packet.sequence_number, 1);
    }
}
