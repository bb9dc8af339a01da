//! Time-bounded attribute interpolation.
//!
//! The layout transitions are driven by [`Tween`]s: a start and end triple,
//! a duration, and a shared ease-out curve. Tweens are keyed by a
//! `(target, channel)` pair; scheduling onto a key that is already animating
//! replaces the old tween outright (last write wins, no queue). On
//! completion the final value snaps exactly to the end value so repeated
//! transitions never accumulate drift.
//!
//! A tween may carry a per-tick hook that observes every interpolated value;
//! the background tint uses this to re-derive its colour each frame instead
//! of receiving a single final assignment.

use std::collections::HashMap;

use instant::Duration;

/// Attribute group a tween writes. Tweens on different channels of the same
/// target run independently.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Channel {
    Position,
    Tilt,
    Tint,
}

/// Per-tick side effect observing each interpolated value.
pub type TickHook = Box<dyn FnMut([f32; 3])>;

struct Tween {
    from: [f32; 3],
    to: [f32; 3],
    duration: f32,
    elapsed: f32,
    hook: Option<TickHook>,
}

/// The single monotonic ease-out curve used for every transition: fast
/// start, slow finish.
pub fn ease_out(t: f32) -> f32 {
    let u = 1.0 - t.clamp(0.0, 1.0);
    1.0 - u * u
}

/// Owns all in-flight tweens and applies them once per frame.
#[derive(Default)]
pub struct Animator {
    tweens: HashMap<(u32, Channel), Tween>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a tween. `from` should be the target attribute's value at
    /// schedule time so a mid-flight re-trigger restarts from the current
    /// value instead of snapping backward.
    pub fn schedule(&mut self, target: u32, channel: Channel, from: [f32; 3], to: [f32; 3], duration: f32) {
        self.schedule_with(target, channel, from, to, duration, None);
    }

    pub fn schedule_with(
        &mut self,
        target: u32,
        channel: Channel,
        from: [f32; 3],
        to: [f32; 3],
        duration: f32,
        hook: Option<TickHook>,
    ) {
        let replaced = self.tweens.insert(
            (target, channel),
            Tween {
                from,
                to,
                duration,
                elapsed: 0.0,
                hook,
            },
        );
        if replaced.is_some() {
            log::debug!("replacing in-flight {channel:?} tween on target {target}");
        }
    }

    /// Whether a tween currently owns the given attribute. While this holds,
    /// no other writer may touch that attribute.
    pub fn is_active(&self, target: u32, channel: Channel) -> bool {
        self.tweens.contains_key(&(target, channel))
    }

    /// Advance every tween by `dt` and hand each interpolated value to
    /// `apply`. Completed tweens report their exact end value, then drop out.
    /// A zero-duration tween snaps immediately.
    pub fn advance(&mut self, dt: Duration, mut apply: impl FnMut(u32, Channel, [f32; 3])) {
        let dt = dt.as_secs_f32();
        self.tweens.retain(|&(target, channel), tween| {
            tween.elapsed += dt;
            let done = tween.elapsed >= tween.duration;
            let value = if done {
                tween.to
            } else {
                let k = ease_out(tween.elapsed / tween.duration);
                [
                    tween.from[0] + (tween.to[0] - tween.from[0]) * k,
                    tween.from[1] + (tween.to[1] - tween.from[1]) * k,
                    tween.from[2] + (tween.to[2] - tween.from[2]) * k,
                ]
            };
            if let Some(hook) = tween.hook.as_mut() {
                hook(value);
            }
            apply(target, channel, value);
            !done
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn step(animator: &mut Animator, secs: f32) -> Vec<(u32, Channel, [f32; 3])> {
        let mut out = Vec::new();
        animator.advance(Duration::from_secs_f32(secs), |target, channel, value| {
            out.push((target, channel, value));
        });
        out
    }

    #[test]
    fn converges_to_exact_end_value() {
        let mut animator = Animator::new();
        animator.schedule(7, Channel::Position, [0.0, 0.0, 0.0], [5.0, 0.0, -0.3], 1.0);
        let _ = step(&mut animator, 0.4);
        let _ = step(&mut animator, 0.4);
        let last = step(&mut animator, 0.4);
        assert_eq!(last, vec![(7, Channel::Position, [5.0, 0.0, -0.3])]);
        assert!(!animator.is_active(7, Channel::Position));
    }

    #[test]
    fn interpolation_is_monotonic() {
        let mut animator = Animator::new();
        animator.schedule(1, Channel::Position, [0.0; 3], [10.0, 0.0, 0.0], 1.0);
        let mut previous = 0.0;
        for _ in 0..11 {
            for (_, _, value) in step(&mut animator, 0.1) {
                assert!(value[0] >= previous);
                previous = value[0];
            }
        }
        assert_eq!(previous, 10.0);
    }

    #[test]
    fn rescheduling_replaces_in_flight_tween() {
        let mut animator = Animator::new();
        animator.schedule(1, Channel::Position, [0.0; 3], [10.0, 0.0, 0.0], 1.0);
        let mid = step(&mut animator, 0.5);
        let reached = mid[0].2[0];
        // Restart from the instantaneous value toward a new goal.
        animator.schedule(1, Channel::Position, [reached, 0.0, 0.0], [-4.0, 0.0, 0.0], 1.0);
        let samples = step(&mut animator, 2.0);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].2, [-4.0, 0.0, 0.0]);
    }

    #[test]
    fn channels_run_independently() {
        let mut animator = Animator::new();
        animator.schedule(1, Channel::Position, [0.0; 3], [1.0, 0.0, 0.0], 1.0);
        animator.schedule(1, Channel::Tilt, [0.0; 3], [-0.1, 0.0, 0.0], 0.5);
        assert!(animator.is_active(1, Channel::Position));
        assert!(animator.is_active(1, Channel::Tilt));
        let _ = step(&mut animator, 0.6);
        assert!(animator.is_active(1, Channel::Position));
        assert!(!animator.is_active(1, Channel::Tilt));
    }

    #[test]
    fn zero_duration_snaps_immediately() {
        let mut animator = Animator::new();
        animator.schedule(3, Channel::Tilt, [-0.1, 0.0, 0.0], [0.0; 3], 0.0);
        let samples = step(&mut animator, 0.0);
        assert_eq!(samples, vec![(3, Channel::Tilt, [0.0, 0.0, 0.0])]);
        assert!(!animator.is_active(3, Channel::Tilt));
    }

    #[test]
    fn hook_observes_every_tick_and_the_end_value() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut animator = Animator::new();
        animator.schedule_with(
            9,
            Channel::Tint,
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            1.0,
            Some(Box::new(move |value| sink.borrow_mut().push(value))),
        );
        for _ in 0..4 {
            let _ = step(&mut animator, 0.3);
        }
        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert_eq!(*seen.last().unwrap(), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn ease_out_hits_both_endpoints() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert!(ease_out(0.5) > 0.5);
        assert_eq!(ease_out(-1.0), 0.0);
        assert_eq!(ease_out(2.0), 1.0);
    }
}
