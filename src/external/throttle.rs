use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

/// Hard sequential rate limit: callers queue on a lock and each one sleeps
/// the full delay before its request goes out.
pub struct Throttle {
    delay: Duration,
    gate: Mutex<()>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            gate: Mutex::new(()),
        }
    }

    /// Hold the returned guard until the request has completed.
    pub async fn wait(&self) -> MutexGuard<'_, ()> {
        let guard = self.gate.lock().await;
        tokio::time::sleep(self.delay).await;
        guard
    }
}

#[test]
fn concurrent_callers_are_serialized() {
    use std::time::Instant;
    use tokio_test::block_on;

    let throttle = Throttle::new(Duration::from_millis(30));

    let elapsed = block_on(async {
        let start = Instant::now();
        let first = async {
            let _turn = throttle.wait().await;
        };
        let second = async {
            let _turn = throttle.wait().await;
        };
        futures::join!(first, second);
        start.elapsed()
    });

    assert!(elapsed >= Duration::from_millis(60));
}
