//! Scripted player for headless runs.

use glam::Vec3;
use lurk_ai::PlayerView;
use lurk_common::{flatten, within_cone};

use crate::config::PlayerScript;

/// Flashlight beam aperture in degrees.
const BEAM_ANGLE: f32 = 40.0;

/// What the player did this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerActions {
    /// Where the player is and faces
    pub view: PlayerView,
    /// Camera flashes fired this tick
    pub flashes: u32,
    /// Footstep landed this tick
    pub footstep: Option<Vec3>,
}

/// Walks a looping route and fires scheduled actions.
#[derive(Debug, Clone)]
pub struct ScriptedPlayer {
    script: PlayerScript,
    position: Vec3,
    forward: Vec3,
    next: usize,
    since_step: f32,
    elapsed: f32,
    flashes_fired: usize,
}

impl ScriptedPlayer {
    /// Places the player at the first route point.
    #[must_use]
    pub fn new(mut script: PlayerScript) -> Self {
        script.flashes.sort_by(f32::total_cmp);
        let position = script.route.first().copied().unwrap_or(Vec3::ZERO);
        let next = 1 % script.route.len().max(1);
        Self {
            script,
            position,
            forward: Vec3::Z,
            next,
            since_step: 0.0,
            elapsed: 0.0,
            flashes_fired: 0,
        }
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current view for the AI.
    #[must_use]
    pub fn view(&self) -> PlayerView {
        PlayerView::at(self.position).facing(self.forward)
    }

    /// Seconds since the run started.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Footstep loudness.
    #[must_use]
    pub fn loudness(&self) -> f32 {
        self.script.footstep_loudness
    }

    /// Whether the flashlight is switched on.
    #[must_use]
    pub fn flashlight_on(&self) -> bool {
        self.script
            .flashlight
            .iter()
            .any(|&(start, end)| (start..=end).contains(&self.elapsed))
    }

    /// Whether `target` is within flashlight or camera reach.
    #[must_use]
    pub fn in_reach(&self, target: Vec3) -> bool {
        let offset = flatten(target - self.position);
        if offset.length() > self.script.flashlight_range {
            return false;
        }
        offset
            .try_normalize()
            .map_or(true, |dir| within_cone(self.forward, dir, BEAM_ANGLE))
    }

    /// Whether the beam is on `target` right now.
    #[must_use]
    pub fn lights(&self, target: Vec3) -> bool {
        self.flashlight_on() && self.in_reach(target)
    }

    /// Moves along the route and reports this tick's actions.
    pub fn advance(&mut self, dt: f32) -> PlayerActions {
        self.elapsed += dt;
        let moved = self.walk(dt);

        let mut footstep = None;
        if moved && self.script.footstep_interval > 0.0 {
            self.since_step += dt;
            if self.since_step >= self.script.footstep_interval {
                self.since_step -= self.script.footstep_interval;
                footstep = Some(self.position);
            }
        }

        let mut flashes = 0;
        while self
            .script
            .flashes
            .get(self.flashes_fired)
            .is_some_and(|&at| at <= self.elapsed)
        {
            self.flashes_fired += 1;
            flashes += 1;
        }

        PlayerActions {
            view: self.view(),
            flashes,
            footstep,
        }
    }

    fn walk(&mut self, dt: f32) -> bool {
        let Some(&target) = self.script.route.get(self.next) else {
            return false;
        };
        let offset = flatten(target - self.position);
        let distance = offset.length();
        let step = self.script.speed * dt;
        if distance <= f32::EPSILON || step <= 0.0 {
            self.next = (self.next + 1) % self.script.route.len();
            return false;
        }
        self.forward = offset / distance;
        if distance <= step + 1e-4 {
            self.position = target;
            self.next = (self.next + 1) % self.script.route.len();
        } else {
            self.position += self.forward * step;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> PlayerScript {
        PlayerScript {
            route: vec![
                Vec3::ZERO,
                Vec3::new(4.0, 0.0, 0.0),
                Vec3::new(4.0, 0.0, 4.0),
                Vec3::new(0.0, 0.0, 4.0),
            ],
            speed: 2.0,
            footstep_interval: 0.5,
            ..PlayerScript::default()
        }
    }

    #[test]
    fn test_route_loops() {
        let mut player = ScriptedPlayer::new(square());
        // perimeter 16 at speed 2
        for _ in 0..32 {
            player.advance(0.25);
        }
        assert!(player.position().distance(Vec3::ZERO) < 1e-3);
    }

    #[test]
    fn test_footsteps_spaced() {
        let mut player = ScriptedPlayer::new(square());
        let steps = (0..20)
            .filter(|_| player.advance(0.25).footstep.is_some())
            .count();
        assert_eq!(steps, 10);
    }

    #[test]
    fn test_standing_still_is_silent() {
        let mut player = ScriptedPlayer::new(PlayerScript {
            route: vec![Vec3::ZERO],
            ..PlayerScript::default()
        });
        for _ in 0..20 {
            assert_eq!(player.advance(0.1).footstep, None);
        }
    }

    #[test]
    fn test_flashes_fire_once() {
        let mut player = ScriptedPlayer::new(PlayerScript {
            flashes: vec![0.25, 0.2, 1.0],
            ..square()
        });
        let total: u32 = (0..30).map(|_| player.advance(0.1).flashes).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_flashlight_window_and_beam() {
        let mut player = ScriptedPlayer::new(PlayerScript {
            flashlight: vec![(0.5, 1.0)],
            ..square()
        });
        player.advance(0.1);
        let ahead = player.position() + Vec3::new(5.0, 0.0, 0.0);
        assert!(!player.lights(ahead));
        for _ in 0..5 {
            player.advance(0.1);
        }
        assert!(player.flashlight_on());
        assert!(player.lights(ahead));
        assert!(!player.lights(player.position() - Vec3::new(5.0, 0.0, 0.0)));
    }
}
