//! Concrete behaviors.
//!
//! Each behavior owns its tuning (a serde config with defaults) and its
//! runtime scratch, and only touches the world through [`StateContext`].
//! When a behavior finishes it falls back through a fixed priority list of
//! slots, skipping any the entity does not support.
//!
//! [`StateContext`]: crate::state::StateContext

pub mod caught;
pub mod disappear;
pub mod freeze;
pub mod idle;
pub mod investigate;
pub mod patrol;
pub mod retreat;
pub mod search;
pub mod sleep;
pub mod stalk;
pub mod stun;

pub use caught::*;
pub use disappear::*;
pub use freeze::*;
pub use idle::*;
pub use investigate::*;
pub use patrol::*;
pub use retreat::*;
pub use search::*;
pub use sleep::*;
pub use stalk::*;
pub use stun::*;

#[cfg(test)]
pub(crate) mod testing {
    //! Fixture shared by behavior tests.

    use glam::Vec3;
    use lurk_common::EntityId;

    use crate::body::Body;
    use crate::host::{Host, MockSpatial, OpenFloor, PlayerView, SimulatedAgent};
    use crate::level::Level;
    use crate::state::{Capabilities, State, StateContext, StateSlot, Transition};

    pub(crate) struct Rig {
        pub body: Body,
        pub level: Level,
        pub floor: OpenFloor,
        pub spatial: MockSpatial,
        pub rng: fastrand::Rng,
        pub player: Option<PlayerView>,
        pub capabilities: Capabilities,
        pub entity: EntityId,
    }

    impl Rig {
        pub(crate) fn at(position: Vec3) -> Self {
            Self {
                body: Body::new(Box::new(
                    SimulatedAgent::new(position).with_motion(5.0, 50.0),
                )),
                level: Level::new(),
                floor: OpenFloor::new(),
                spatial: MockSpatial::new(),
                rng: fastrand::Rng::with_seed(42),
                player: None,
                capabilities: Capabilities::all(),
                entity: EntityId::from_raw(7),
            }
        }

        pub(crate) fn ctx(&mut self, dt: f32) -> StateContext<'_> {
            StateContext {
                entity: self.entity,
                body: &mut self.body,
                level: &mut self.level,
                host: Host::new(&self.floor, &self.spatial),
                player: self.player,
                rng: &mut self.rng,
                dt,
                capabilities: self.capabilities,
            }
        }

        /// Integrates then updates, like one physics step plus one frame.
        pub(crate) fn step(&mut self, state: &mut dyn State, dt: f32) -> Transition {
            self.body.motor.integrate(dt);
            let mut ctx = self.ctx(dt);
            state.frame_update(&mut ctx)
        }

        /// Steps until a transition or `max_steps` elapse.
        pub(crate) fn run(
            &mut self,
            state: &mut dyn State,
            dt: f32,
            max_steps: usize,
        ) -> Option<StateSlot> {
            for _ in 0..max_steps {
                if let Transition::To(next) = self.step(state, dt) {
                    return Some(next);
                }
            }
            None
        }
    }
}
