// End-to-end gesture detection through the public API, driven by a scripted
// sample source.

use std::sync::{Arc, Mutex};
use std::thread;

use plastiwatch_gestures::{
    Channel, GestureCoordinator, GestureEvent, GestureListener, SampleSource, SharedCoordinator,
    SharedListener, WristGestureDetector,
};

const MS: u64 = 1_000_000;

/// Replays a fixed trace into the coordinator once started.
#[derive(Default)]
struct ScriptedSource {
    sink: Option<SharedCoordinator>,
    trace: Vec<(Channel, u64, [f32; 3])>,
    no_gyro: bool,
}

impl ScriptedSource {
    fn new(trace: Vec<(Channel, u64, [f32; 3])>) -> Self {
        Self { trace, ..Default::default() }
    }

    /// Deliver the whole trace, returning every emitted event with its timestamp.
    fn replay(&self) -> Vec<(u64, GestureEvent)> {
        let sink = self.sink.as_ref().expect("source not started");
        self.trace
            .iter()
            .filter_map(|&(channel, t, values)| sink.on_sample(channel, t, values).map(|e| (t, e)))
            .collect()
    }
}

impl SampleSource for ScriptedSource {
    fn is_available(&self, channel: Channel) -> bool {
        !(self.no_gyro && channel == Channel::Rotation)
    }

    fn start(&mut self, _channel: Channel, sink: SharedCoordinator) -> anyhow::Result<()> {
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self, _channel: Channel) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Counter {
    wrist_in: Mutex<u32>,
    wrist_out: Mutex<u32>,
    arm_up: Mutex<u32>,
    arm_down: Mutex<u32>,
}

impl Counter {
    fn counts(&self) -> [u32; 4] {
        [
            *self.wrist_in.lock().unwrap(),
            *self.wrist_out.lock().unwrap(),
            *self.arm_up.lock().unwrap(),
            *self.arm_down.lock().unwrap(),
        ]
    }
}

impl GestureListener for Counter {
    fn on_wrist_in(&self) -> anyhow::Result<()> {
        *self.wrist_in.lock().unwrap() += 1;
        Ok(())
    }

    fn on_wrist_out(&self) -> anyhow::Result<()> {
        *self.wrist_out.lock().unwrap() += 1;
        Ok(())
    }

    fn on_arm_up(&self) -> anyhow::Result<()> {
        *self.arm_up.lock().unwrap() += 1;
        Ok(())
    }

    fn on_arm_down(&self) -> anyhow::Result<()> {
        *self.arm_down.lock().unwrap() += 1;
        Ok(())
    }
}

fn rot(x: f32) -> [f32; 3] {
    [x, 0.0, 0.0]
}

fn acc(z: f32) -> [f32; 3] {
    [0.0, 0.0, z]
}

/// Small deterministic generator so the invariant tests cover varied traces.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn value(&mut self) -> f32 {
        (self.next() % 4000) as f32 / 100.0 - 20.0 // -20.0 .. 20.0
    }
}

fn random_trace(seed: u64, len: usize) -> Vec<(Channel, u64, [f32; 3])> {
    let mut rng = Lcg(seed);
    let mut t = 0;
    (0..len)
        .map(|_| {
            t += rng.next() % (300 * MS);
            let channel = if rng.next() % 2 == 0 { Channel::Rotation } else { Channel::Acceleration };
            let values = [rng.value(), rng.value(), rng.value()];
            (channel, t, values)
        })
        .collect()
}

#[test]
fn test_opposite_wrist_pair_then_throttle_then_new_phase() {
    let mut detector = WristGestureDetector::new(ScriptedSource::new(vec![
        (Channel::Rotation, 0, rot(12.0)),
        (Channel::Rotation, 500 * MS, rot(-12.0)),
        (Channel::Rotation, 600 * MS, rot(15.0)),
        (Channel::Rotation, 1300 * MS, rot(15.0)),
        (Channel::Rotation, 1700 * MS, rot(15.0)),
    ]));
    let counter = Arc::new(Counter::default());
    detector.add_listener(counter.clone());
    detector.register().unwrap();

    let events = detector.source().replay();

    // 12.0 + -12.0 sums to zero, which resolves to wrist-in.
    assert_eq!(events, vec![(500 * MS, GestureEvent::WristIn)]);
    assert_eq!(counter.counts(), [1, 0, 0, 0]);

    // 600 ms and 1300 ms are both within 1200 ms of the gesture at 500 ms;
    // 1700 ms is the first reading allowed to arm a new stroke.
    let coordinator = detector.coordinator().lock();
    assert_eq!(coordinator.stats().throttled, 2);
    assert_eq!(
        coordinator.detector(Channel::Rotation).phase(),
        plastiwatch_gestures::AxisPhase::Armed { start: 15.0 }
    );
}

#[test]
fn test_sample_inside_throttle_window_leaves_detector_idle() {
    let mut detector = WristGestureDetector::new(ScriptedSource::new(vec![
        (Channel::Rotation, 0, rot(12.0)),
        (Channel::Rotation, 500 * MS, rot(-12.0)),
        (Channel::Rotation, 1300 * MS, rot(15.0)),
    ]));
    detector.register().unwrap();
    detector.source().replay();

    let coordinator = detector.coordinator().lock();
    assert_eq!(coordinator.stats().throttled, 1);
    assert!(!coordinator.detector(Channel::Rotation).is_armed());
}

#[test]
fn test_arm_gestures_reach_arm_hooks() {
    let mut detector = WristGestureDetector::new(ScriptedSource::new(vec![
        (Channel::Acceleration, 0, acc(8.0)),
        (Channel::Acceleration, 100 * MS, acc(7.0)),
        (Channel::Acceleration, 2000 * MS, acc(-8.0)),
        (Channel::Acceleration, 2100 * MS, acc(9.0)),
    ]));
    let counter = Arc::new(Counter::default());
    detector.add_listener(counter.clone());
    detector.register().unwrap();

    let events = detector.source().replay();

    assert_eq!(
        events,
        vec![(100 * MS, GestureEvent::ArmUp), (2100 * MS, GestureEvent::ArmDown)]
    );
    assert_eq!(counter.counts(), [0, 0, 1, 1]);
}

#[test]
fn test_missing_gyroscope_never_reports_wrist() {
    let source = ScriptedSource {
        no_gyro: true,
        ..ScriptedSource::new(vec![
            (Channel::Rotation, 0, rot(20.0)),
            (Channel::Rotation, 10 * MS, rot(20.0)),
            (Channel::Acceleration, 20 * MS, acc(9.0)),
            (Channel::Acceleration, 30 * MS, acc(9.0)),
        ])
    };
    let mut detector = WristGestureDetector::new(source);
    assert!(!detector.can_detect_wrist_gestures());
    assert!(detector.can_detect_arm_gestures());
    detector.register().unwrap();

    assert_eq!(detector.source().replay(), vec![(30 * MS, GestureEvent::ArmUp)]);
}

#[test]
fn test_no_two_gestures_inside_throttle_window() {
    for seed in 1..=20 {
        let mut detector = WristGestureDetector::new(ScriptedSource::new(random_trace(seed, 400)));
        detector.register().unwrap();

        let events = detector.source().replay();
        assert!(!events.is_empty(), "seed {} produced no gestures", seed);
        for pair in events.windows(2) {
            assert!(
                pair[1].0 - pair[0].0 >= 1200 * MS,
                "seed {}: gestures at {} and {}",
                seed,
                pair[0].0,
                pair[1].0
            );
        }
    }
}

#[test]
fn test_armed_axis_is_never_disturbed_by_the_other() {
    for seed in 100..120 {
        let mut coordinator = GestureCoordinator::default();
        for (channel, t, values) in random_trace(seed, 400) {
            let before = coordinator.detector(channel.other()).phase();
            let other_was_armed = coordinator.detector(channel.other()).is_armed();
            let event = coordinator.on_sample(channel, t, values);

            assert_eq!(coordinator.detector(channel.other()).phase(), before);
            if other_was_armed {
                assert_eq!(event, None);
                assert!(!coordinator.detector(channel).is_armed());
            }
            assert!(
                !(coordinator.detector(Channel::Rotation).is_armed()
                    && coordinator.detector(Channel::Acceleration).is_armed())
            );
        }
    }
}

#[test]
fn test_listener_can_unregister_itself_during_callback() {
    struct OneShot {
        coordinator: SharedCoordinator,
        me: Mutex<Option<SharedListener>>,
        calls: Mutex<u32>,
    }

    impl GestureListener for OneShot {
        fn on_gesture(&self, _event: GestureEvent) -> anyhow::Result<()> {
            *self.calls.lock().unwrap() += 1;
            if let Some(me) = self.me.lock().unwrap().take() {
                self.coordinator.remove_listener(&me);
            }
            Ok(())
        }
    }

    let coordinator = SharedCoordinator::default();
    let one_shot = Arc::new(OneShot {
        coordinator: coordinator.clone(),
        me: Mutex::new(None),
        calls: Mutex::new(0),
    });
    let listener: SharedListener = one_shot.clone();
    *one_shot.me.lock().unwrap() = Some(listener.clone());
    coordinator.add_listener(listener);

    for (i, t) in [0, 10, 2000, 2010].iter().enumerate() {
        coordinator.on_sample(Channel::Rotation, t * MS, rot(if i % 2 == 0 { 12.0 } else { 13.0 }));
    }

    assert_eq!(coordinator.stats().gestures, 2);
    assert_eq!(*one_shot.calls.lock().unwrap(), 1);
    assert!(coordinator.listeners().is_empty());
}

#[test]
fn test_concurrent_channels_are_serialized() {
    let coordinator = SharedCoordinator::default();
    let delivered = Arc::new(Mutex::new(0u64));
    let sink = Arc::clone(&delivered);
    coordinator.add_listener(Arc::new(move |_: GestureEvent| *sink.lock().unwrap() += 1));

    let workers: Vec<_> = Channel::ALL
        .into_iter()
        .map(|channel| {
            let coordinator = coordinator.clone();
            thread::spawn(move || {
                for i in 0..2000u64 {
                    let v = if i % 3 == 0 { -25.0 } else { 25.0 };
                    let values = match channel {
                        Channel::Rotation => rot(v),
                        Channel::Acceleration => acc(v),
                    };
                    coordinator.on_sample(channel, i * 50 * MS, values);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let stats = coordinator.stats();
    assert_eq!(stats.samples, 4000);
    assert_eq!(*delivered.lock().unwrap(), stats.gestures);
    assert!(stats.gestures > 0);
    let guard = coordinator.lock();
    assert!(
        !(guard.detector(Channel::Rotation).is_armed() && guard.detector(Channel::Acceleration).is_armed())
    );
}
