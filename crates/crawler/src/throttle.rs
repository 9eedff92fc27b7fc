use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

// Per-host politeness delay. Each host gets a reservation chain: a
// caller atomically claims the next request slot (last slot + delay) and
// sleeps until its turn. Distinct hosts never throttle each other, and
// no lock is held across the sleep.
#[derive(Default)]
pub struct HostThrottle {
    slots: Mutex<HashMap<String, Instant>>,
}

impl HostThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn wait_turn(&self, host: &str, delay: Duration) {
        if delay.is_zero() {
            return;
        }

        let turn = {
            let mut slots = self.slots.lock().expect("throttle lock poisoned");
            let now = Instant::now();
            let turn = match slots.get(host) {
                Some(last) => (*last + delay).max(now),
                None => now,
            };
            slots.insert(host.to_string(), turn);
            turn
        };

        if turn > Instant::now() {
            debug!("waiting politeness delay for {}", host);
            tokio::time::sleep_until(turn).await;
        }
    }
}
