//! Wall-clock pacing of the virtual-clock driver

use crate::frame::Frame;
use crate::runner::Driver;
use log::info;
use shared::Timestamp;
use std::future::Future;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Advances `driver` by one tick per `pace` of wall-clock time.
///
/// Stops once the virtual clock reaches `until` or `shutdown` completes,
/// whichever happens first, and returns the virtual time reached. `on_frame`
/// sees the roles' latest snapshots after every paced step.
pub async fn run_paced<F, R>(
    driver: &mut Driver,
    until: Timestamp,
    pace: Duration,
    shutdown: F,
    mut on_frame: R,
) -> Timestamp
where
    F: Future,
    R: FnMut(&Frame),
{
    let step = driver.tick_size();
    let mut ticker = interval(pace);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    while driver.now() < until {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested at {}", driver.now());
                break;
            }
            _ = ticker.tick() => {
                let target = (driver.now() + step).min(until);
                driver.run_until(target);
                on_frame(&driver.frame());
            }
        }
    }

    driver.now()
}
