//! Render throttling: a minimum interval between renders, with a shorter
//! coalescing window for high-frequency ticks layered on top.

use std::time::{Duration, Instant};

/// Why a render is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRequest {
    /// A regular update, throttled by the render interval.
    Normal,
    /// A tick for a high-frequency category; coalesced.
    HighFrequency,
    /// User action; renders now and drops any scheduled render.
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Scheduled(Instant),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderDecision {
    RenderNow,
    Scheduled(Instant),
    AlreadyScheduled(Instant),
}

/// State machine `Idle -> Scheduled -> fired (Idle)`.
///
/// Time is passed in by the caller so the scheduler stays deterministic.
#[derive(Debug, Clone)]
pub struct RenderScheduler {
    interval: Duration,
    coalesce_window: Duration,
    last_render: Option<Instant>,
    state: RenderState,
}

impl RenderScheduler {
    pub fn new(interval: Duration, coalesce_window: Duration) -> Self {
        Self {
            interval,
            coalesce_window,
            last_render: None,
            state: RenderState::Idle,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn last_render(&self) -> Option<Instant> {
        self.last_render
    }

    pub fn request(&mut self, request: RenderRequest, now: Instant) -> RenderDecision {
        match request {
            RenderRequest::Immediate => self.fire(now),
            RenderRequest::Normal => {
                let due = self.interval_due();
                match (due, self.state) {
                    (None, _) => self.fire(now),
                    (Some(due), _) if due <= now => self.fire(now),
                    (_, RenderState::Scheduled(at)) => RenderDecision::AlreadyScheduled(at),
                    (Some(due), RenderState::Idle) => self.schedule(due),
                }
            }
            RenderRequest::HighFrequency => {
                if let RenderState::Scheduled(at) = self.state {
                    return RenderDecision::AlreadyScheduled(at);
                }
                let coalesced = now + self.coalesce_window;
                let due = self
                    .interval_due()
                    .map_or(coalesced, |interval_due| interval_due.max(coalesced));
                self.schedule(due)
            }
        }
    }

    /// Fires the scheduled render when it is due. Returns whether a render
    /// should happen now.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            RenderState::Scheduled(at) if at <= now => {
                self.fire(now);
                true
            }
            _ => false,
        }
    }

    /// Drops a scheduled render without rendering.
    pub fn cancel(&mut self) {
        self.state = RenderState::Idle;
    }

    fn interval_due(&self) -> Option<Instant> {
        self.last_render.map(|last| last + self.interval)
    }

    fn schedule(&mut self, at: Instant) -> RenderDecision {
        self.state = RenderState::Scheduled(at);
        RenderDecision::Scheduled(at)
    }

    fn fire(&mut self, now: Instant) -> RenderDecision {
        self.state = RenderState::Idle;
        self.last_render = Some(now);
        RenderDecision::RenderNow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> RenderScheduler {
        RenderScheduler::new(Duration::from_millis(5000), Duration::from_millis(1000))
    }

    #[test]
    fn test_first_request_renders_now() {
        let mut s = scheduler();
        let t0 = Instant::now();
        assert_eq!(s.request(RenderRequest::Normal, t0), RenderDecision::RenderNow);
        assert_eq!(s.last_render(), Some(t0));
    }

    #[test]
    fn test_normal_requests_are_throttled() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.request(RenderRequest::Normal, t0);

        let t1 = t0 + Duration::from_millis(1000);
        let due = t0 + Duration::from_millis(5000);
        assert_eq!(s.request(RenderRequest::Normal, t1), RenderDecision::Scheduled(due));
        assert_eq!(
            s.request(RenderRequest::Normal, t1 + Duration::from_millis(10)),
            RenderDecision::AlreadyScheduled(due)
        );

        assert!(!s.poll(due - Duration::from_millis(1)));
        assert!(s.poll(due));
        assert_eq!(s.state(), RenderState::Idle);
        assert!(!s.poll(due + Duration::from_millis(1)));
    }

    #[test]
    fn test_high_frequency_ticks_are_coalesced() {
        let mut s = scheduler();
        let t0 = Instant::now();
        // No render yet: the coalescing window alone applies
        let first = s.request(RenderRequest::HighFrequency, t0);
        assert_eq!(first, RenderDecision::Scheduled(t0 + Duration::from_millis(1000)));
        for ms in [100, 200, 900] {
            assert!(matches!(
                s.request(RenderRequest::HighFrequency, t0 + Duration::from_millis(ms)),
                RenderDecision::AlreadyScheduled(_)
            ));
        }
        assert!(s.poll(t0 + Duration::from_millis(1000)));

        // After a render, the interval dominates the window
        let t1 = t0 + Duration::from_millis(1500);
        assert_eq!(
            s.request(RenderRequest::HighFrequency, t1),
            RenderDecision::Scheduled(t0 + Duration::from_millis(6000))
        );
    }

    #[test]
    fn test_immediate_supersedes_schedule() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.request(RenderRequest::Normal, t0);
        s.request(RenderRequest::Normal, t0 + Duration::from_millis(10));
        assert!(matches!(s.state(), RenderState::Scheduled(_)));

        let t1 = t0 + Duration::from_millis(20);
        assert_eq!(s.request(RenderRequest::Immediate, t1), RenderDecision::RenderNow);
        assert_eq!(s.state(), RenderState::Idle);
        assert!(!s.poll(t0 + Duration::from_millis(6000)));
    }

    #[test]
    fn test_cancel_drops_scheduled_render() {
        let mut s = scheduler();
        let t0 = Instant::now();
        s.request(RenderRequest::Normal, t0);
        s.request(RenderRequest::Normal, t0 + Duration::from_millis(10));
        assert!(matches!(s.state(), RenderState::Scheduled(_)));

        s.cancel();
        assert_eq!(s.state(), RenderState::Idle);
        assert!(!s.poll(t0 + Duration::from_millis(6000)));
        assert_eq!(s.last_render(), Some(t0));
    }
}
