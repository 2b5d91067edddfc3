// SPDX-License-Identifier: GPL-3.0-only

//! Device orientation tracking from the accelerometer
//!
//! The tracker classifies the latest acceleration sample into one of three
//! discrete orientations and publishes it through a watch channel. Capture
//! reads the value synchronously at the moment the shutter fires; no history
//! is kept.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Shortest polling interval; `tokio::time::interval` rejects zero
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Discrete device orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrientationSample {
    /// Upright, or no sensor data
    #[default]
    Portrait,
    /// Rotated so the top of the device points left
    LandscapeLeft,
    /// Rotated so the top of the device points right
    LandscapeRight,
}

impl std::fmt::Display for OrientationSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrientationSample::Portrait => write!(f, "portrait"),
            OrientationSample::LandscapeLeft => write!(f, "landscape-left"),
            OrientationSample::LandscapeRight => write!(f, "landscape-right"),
        }
    }
}

/// Raw accelerometer reading in g
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Map two accelerometer axes to an orientation
///
/// Landscape wins only when the horizontal magnitude is strictly larger;
/// the sign of `y` never matters.
pub fn classify(x: f64, y: f64) -> OrientationSample {
    if x.abs() > y.abs() {
        if x > 0.0 {
            OrientationSample::LandscapeRight
        } else {
            OrientationSample::LandscapeLeft
        }
    } else {
        OrientationSample::Portrait
    }
}

/// Source of accelerometer readings
pub trait MotionSensor: Send + 'static {
    /// Check if the hardware can deliver readings at all
    fn is_available(&self) -> bool;

    /// Latest reading, `None` if nothing new is available
    fn acceleration(&mut self) -> Option<Acceleration>;
}

/// Owner of the current orientation value
pub struct OrientationTracker {
    sample: Arc<watch::Sender<OrientationSample>>,
}

impl Default for OrientationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationTracker {
    /// Create a tracker starting at portrait
    pub fn new() -> Self {
        let (sample, _) = watch::channel(OrientationSample::default());
        Self {
            sample: Arc::new(sample),
        }
    }

    /// Classify a reading and publish it
    pub fn update(&self, acceleration: Acceleration) -> OrientationSample {
        publish(&self.sample, acceleration)
    }

    /// Latest orientation
    pub fn current(&self) -> OrientationSample {
        *self.sample.borrow()
    }

    /// Read-only handle for other components
    pub fn handle(&self) -> OrientationHandle {
        OrientationHandle {
            sample: self.sample.subscribe(),
        }
    }

    /// Start polling `sensor` every `interval`
    ///
    /// Returns `None` without spawning anything when the sensor is not
    /// available; the orientation then stays at its default. Polling stops
    /// when the returned [`MotionUpdates`] is dropped.
    pub fn start<S: MotionSensor>(
        &self,
        mut sensor: S,
        interval: Duration,
    ) -> Option<MotionUpdates> {
        if !sensor.is_available() {
            info!("Motion sensor unavailable, orientation stays portrait");
            return None;
        }

        let interval = interval.max(MIN_POLL_INTERVAL);
        let sample = Arc::clone(&self.sample);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Some(acceleration) = sensor.acceleration() {
                    publish(&sample, acceleration);
                }
            }
        });

        debug!(interval_ms = interval.as_millis() as u64, "Motion updates started");
        Some(MotionUpdates { task })
    }
}

fn publish(
    sender: &watch::Sender<OrientationSample>,
    acceleration: Acceleration,
) -> OrientationSample {
    let next = classify(acceleration.x, acceleration.y);
    sender.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        debug!(from = %current, to = %next, "Orientation changed");
        *current = next;
        true
    });
    next
}

/// Cheap read-only view of the tracker's value
#[derive(Clone)]
pub struct OrientationHandle {
    sample: watch::Receiver<OrientationSample>,
}

impl OrientationHandle {
    /// Latest orientation
    pub fn current(&self) -> OrientationSample {
        *self.sample.borrow()
    }

    /// Receiver notified on every orientation change
    pub fn subscribe(&self) -> watch::Receiver<OrientationSample> {
        self.sample.clone()
    }
}

/// Running motion feed; polling stops on drop
pub struct MotionUpdates {
    task: JoinHandle<()>,
}

impl MotionUpdates {
    /// Stop polling now; equivalent to dropping the handle
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for MotionUpdates {
    fn drop(&mut self) {
        self.task.abort();
        debug!("Motion updates stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSensor {
        available: bool,
        reading: Acceleration,
    }

    impl MotionSensor for FixedSensor {
        fn is_available(&self) -> bool {
            self.available
        }

        fn acceleration(&mut self) -> Option<Acceleration> {
            Some(self.reading)
        }
    }

    #[test]
    fn test_classify_landscape_when_horizontal_dominates() {
        assert_eq!(classify(0.9, 0.1), OrientationSample::LandscapeRight);
        assert_eq!(classify(-0.9, 0.1), OrientationSample::LandscapeLeft);
        assert_eq!(classify(-0.9, -0.5), OrientationSample::LandscapeLeft);
    }

    #[test]
    fn test_classify_portrait_regardless_of_vertical_sign() {
        assert_eq!(classify(0.1, -0.9), OrientationSample::Portrait);
        assert_eq!(classify(0.1, 0.9), OrientationSample::Portrait);
        // Ties go to portrait
        assert_eq!(classify(0.5, -0.5), OrientationSample::Portrait);
        assert_eq!(classify(0.0, 0.0), OrientationSample::Portrait);
    }

    #[test]
    fn test_handle_sees_latest_update() {
        let tracker = OrientationTracker::new();
        let handle = tracker.handle();
        assert_eq!(handle.current(), OrientationSample::Portrait);

        tracker.update(Acceleration { x: -1.0, y: 0.0, z: 0.0 });
        assert_eq!(handle.current(), OrientationSample::LandscapeLeft);

        tracker.update(Acceleration { x: 0.0, y: -1.0, z: 0.0 });
        assert_eq!(handle.current(), OrientationSample::Portrait);
    }

    #[tokio::test]
    async fn test_unavailable_sensor_leaves_default() {
        let tracker = OrientationTracker::new();
        let sensor = FixedSensor {
            available: false,
            reading: Acceleration { x: 1.0, y: 0.0, z: 0.0 },
        };
        assert!(tracker.start(sensor, Duration::from_millis(1)).is_none());
        assert_eq!(tracker.current(), OrientationSample::Portrait);
    }

    #[tokio::test]
    async fn test_polling_publishes_sensor_readings() {
        let tracker = OrientationTracker::new();
        let mut changes = tracker.handle().subscribe();
        let sensor = FixedSensor {
            available: true,
            reading: Acceleration { x: 1.0, y: 0.2, z: 0.0 },
        };

        let updates = tracker.start(sensor, Duration::from_millis(5));
        assert!(updates.is_some());

        tokio::time::timeout(Duration::from_secs(2), changes.changed())
            .await
            .expect("orientation update")
            .expect("tracker alive");
        assert_eq!(tracker.current(), OrientationSample::LandscapeRight);
    }

    #[tokio::test]
    async fn test_zero_interval_still_polls_and_stop_ends_polling() {
        let tracker = OrientationTracker::new();
        let mut changes = tracker.handle().subscribe();
        let sensor = FixedSensor {
            available: true,
            reading: Acceleration { x: -1.0, y: 0.0, z: 0.0 },
        };

        let updates = tracker.start(sensor, Duration::ZERO).expect("polling started");
        tokio::time::timeout(Duration::from_secs(2), changes.changed())
            .await
            .expect("orientation update")
            .expect("tracker alive");
        assert_eq!(tracker.current(), OrientationSample::LandscapeLeft);

        updates.stop();
        tokio::task::yield_now().await;
        tracker.update(Acceleration { x: 0.0, y: -1.0, z: 0.0 });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(tracker.current(), OrientationSample::Portrait);
    }
}
