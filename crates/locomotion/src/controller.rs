use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};
use tracing::{debug, error, info, warn};
use westward_common::EntityId;
use westward_input::{DeliveryMode, InputDispatcher, StandardAction, Subscription, UnknownActionError};

use crate::host::{CameraBasisSource, MotionPrimitive};
use crate::settings::LocomotionSettings;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocomotionError {
    #[error("critical: no input dispatcher available; the actor cannot be controlled")]
    NoInputSource,
    #[error("invalid locomotion settings: {0}")]
    InvalidSettings(String),
    #[error("controller is already attached")]
    AlreadyAttached,
    #[error("controller has been released")]
    Released,
    #[error(transparent)]
    Subscribe(#[from] UnknownActionError),
}

/// No camera-follow node is bound; movement continues without rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("non-critical: actor {actor} has no camera-follow node; rotation suppressed")]
pub struct DegradedBindingWarning {
    pub actor: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Constructed, not yet subscribed to input.
    Uninitialized,
    Active,
    /// Running without a camera-follow node; look input is discarded.
    Degraded,
    /// Subscriptions released; ticks do nothing.
    Destroyed,
}

/// The pivot the viewpoint tracks. Carries the actor's pitch as a local rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFollow {
    /// Offset from the actor origin, in the actor's local space.
    pub offset: Vec3,
    local_rotation: Quat,
}

impl CameraFollow {
    pub fn at_height(eye_height: f32) -> Self {
        Self {
            offset: Vec3::new(0.0, eye_height, 0.0),
            local_rotation: Quat::IDENTITY,
        }
    }

    pub fn local_rotation(&self) -> Quat {
        self.local_rotation
    }

    /// World position of the pivot for a body at `position` facing `rotation`.
    pub fn world_position(&self, position: Vec3, rotation: Quat) -> Vec3 {
        position + rotation * self.offset
    }
}

impl Default for CameraFollow {
    fn default() -> Self {
        Self::at_height(1.5)
    }
}

/// What one tick did. Displacements are exactly what was submitted to the host.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// Ground contact sampled at the start of the tick.
    pub grounded: bool,
    /// Horizontal displacement, when move input was outside the dead zone.
    pub horizontal: Option<Vec3>,
    pub vertical: Vec3,
    /// Ground contact reported by the vertical move.
    pub landed: bool,
    pub rotated: bool,
    /// No camera-follow node was bound this tick.
    pub degraded: bool,
}

/// Buffers written by input callbacks and drained by `tick`.
#[derive(Debug, Default)]
struct Motor {
    move_input: Vec2,
    look_input: Vec2,
    vertical_velocity: f32,
    grounded: bool,
}

/// First-person locomotion for one actor.
///
/// Input arrives through dispatcher callbacks between ticks; `tick` turns the
/// buffered intent into host moves and camera rotation.
pub struct LocomotionController {
    actor: EntityId,
    settings: LocomotionSettings,
    state: ControllerState,
    motor: Rc<RefCell<Motor>>,
    rotation: Quat,
    pitch: f32,
    follow: Option<CameraFollow>,
    subscriptions: Vec<Subscription>,
    degraded_ticks: u64,
}

impl LocomotionController {
    pub fn new(settings: LocomotionSettings) -> Result<Self, LocomotionError> {
        settings.validate()?;
        Ok(Self {
            actor: EntityId::new(),
            settings,
            state: ControllerState::Uninitialized,
            motor: Rc::default(),
            rotation: Quat::IDENTITY,
            pitch: 0.0,
            follow: None,
            subscriptions: Vec::new(),
            degraded_ticks: 0,
        })
    }

    /// Subscribe to Move, Look and Jump and bind the camera-follow node.
    ///
    /// Without a dispatcher the controller stays uninitialized. Without a
    /// follow node it runs degraded.
    pub fn attach(
        &mut self,
        dispatcher: Option<&InputDispatcher>,
        follow: Option<CameraFollow>,
    ) -> Result<(), LocomotionError> {
        match self.state {
            ControllerState::Uninitialized => {}
            ControllerState::Destroyed => return Err(LocomotionError::Released),
            _ => return Err(LocomotionError::AlreadyAttached),
        }
        let Some(dispatcher) = dispatcher else {
            error!(actor = %self.actor, "{}", LocomotionError::NoInputSource);
            return Err(LocomotionError::NoInputSource);
        };

        let motor = self.motor.clone();
        let on_move = dispatcher.subscribe(StandardAction::Move.name(), DeliveryMode::OnChange, move |v| {
            motor.borrow_mut().move_input = v.as_vec2();
        })?;

        let motor = self.motor.clone();
        let on_look = dispatcher.subscribe(StandardAction::Look.name(), DeliveryMode::OnChange, move |v| {
            motor.borrow_mut().look_input = v.as_vec2();
        })?;

        let motor = self.motor.clone();
        let launch = self.settings.jump_velocity();
        let on_jump = dispatcher.subscribe(StandardAction::Jump.name(), DeliveryMode::OnEdge, move |_| {
            let mut motor = motor.borrow_mut();
            if motor.grounded {
                motor.vertical_velocity = launch;
                debug!(velocity = launch, "jump");
            }
        })?;

        self.subscriptions = vec![on_move, on_look, on_jump];
        self.follow = follow;
        self.state = if self.follow.is_some() {
            ControllerState::Active
        } else {
            warn!("{}", DegradedBindingWarning { actor: self.actor });
            ControllerState::Degraded
        };
        info!(actor = %self.actor, state = ?self.state, "locomotion attached");
        Ok(())
    }

    pub fn bind_camera_follow(&mut self, follow: CameraFollow) {
        let mut follow = follow;
        follow.local_rotation = Quat::from_rotation_x(self.pitch.to_radians());
        self.follow = Some(follow);
        if self.state == ControllerState::Degraded {
            self.state = ControllerState::Active;
            info!(actor = %self.actor, "camera-follow node bound");
        }
    }

    pub fn unbind_camera_follow(&mut self) -> Option<CameraFollow> {
        if self.state == ControllerState::Active {
            self.state = ControllerState::Degraded;
        }
        self.follow.take()
    }

    /// Release every input subscription. The controller does nothing afterwards.
    pub fn release(&mut self) {
        if self.state == ControllerState::Destroyed {
            return;
        }
        self.subscriptions.clear();
        *self.motor.borrow_mut() = Motor::default();
        self.state = ControllerState::Destroyed;
        debug!(actor = %self.actor, "locomotion released");
    }

    /// Advance one frame of `dt` seconds.
    pub fn tick(
        &mut self,
        dt: f32,
        motion: &mut dyn MotionPrimitive,
        camera: &dyn CameraBasisSource,
    ) -> TickReport {
        if !matches!(self.state, ControllerState::Active | ControllerState::Degraded) {
            return TickReport::default();
        }
        let _span = tracing::trace_span!("locomotion_tick", actor = %self.actor, dt).entered();
        let settings = &self.settings;
        let mut motor = self.motor.borrow_mut();
        let mut report = TickReport::default();

        motor.grounded = motion.is_grounded();
        if motor.grounded && motor.vertical_velocity < 0.0 {
            motor.vertical_velocity = settings.grounded_velocity;
        }
        report.grounded = motor.grounded;

        let input = motor.move_input;
        if input.length_squared() > settings.move_dead_zone {
            let direction = match camera.camera_basis() {
                Some(basis) => {
                    let (forward, right) = basis.horizontal();
                    forward * input.y + right * input.x
                }
                None => Vec3::new(input.x, 0.0, input.y),
            };
            let displacement = direction * settings.move_speed * dt;
            motion.move_by(displacement);
            report.horizontal = Some(displacement);
        }

        motor.vertical_velocity += settings.gravity * dt;
        report.vertical = Vec3::new(0.0, motor.vertical_velocity * dt, 0.0);
        report.landed = motion.move_by(report.vertical);

        match self.follow.as_mut() {
            Some(follow) => {
                let look = motor.look_input;
                if look.length_squared() > settings.look_dead_zone {
                    let yaw = Quat::from_axis_angle(Vec3::Y, (look.x * settings.rotation_power).to_radians());
                    self.rotation = (self.rotation * yaw).normalize();
                    self.pitch = (self.pitch - look.y * settings.rotation_power)
                        .clamp(settings.min_pitch, settings.max_pitch);
                    follow.local_rotation = Quat::from_rotation_x(self.pitch.to_radians());
                    report.rotated = true;
                }
            }
            None => {
                self.degraded_ticks += 1;
                report.degraded = true;
                warn!(tick = self.degraded_ticks, "{}", DegradedBindingWarning { actor: self.actor });
            }
        }

        motor.look_input = Vec2::ZERO;
        tracing::trace!(?report, vertical_velocity = motor.vertical_velocity, pitch = self.pitch, "tick");
        report
    }

    /// Override the vertical velocity, e.g. for knockback or a host teleport.
    pub fn set_vertical_velocity(&mut self, velocity: f32) {
        self.motor.borrow_mut().vertical_velocity = velocity;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    pub fn actor(&self) -> EntityId {
        self.actor
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn settings(&self) -> &LocomotionSettings {
        &self.settings
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Vertical look angle in degrees. Positive looks down.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.motor.borrow().vertical_velocity
    }

    pub fn is_grounded(&self) -> bool {
        self.motor.borrow().grounded
    }

    pub fn move_input(&self) -> Vec2 {
        self.motor.borrow().move_input
    }

    pub fn look_input(&self) -> Vec2 {
        self.motor.borrow().look_input
    }

    pub fn camera_follow(&self) -> Option<&CameraFollow> {
        self.follow.as_ref()
    }

    pub fn degraded_ticks(&self) -> u64 {
        self.degraded_ticks
    }

    /// Body yaw followed by the pivot pitch.
    pub fn view_rotation(&self) -> Quat {
        self.rotation * Quat::from_rotation_x(self.pitch.to_radians())
    }

    pub fn view_forward(&self) -> Vec3 {
        self.view_rotation() * Vec3::Z
    }
}

impl Drop for LocomotionController {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for LocomotionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocomotionController")
            .field("actor", &self.actor)
            .field("state", &self.state)
            .field("pitch", &self.pitch)
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NoCamera;
    use westward_common::CameraBasis;
    use westward_input::{BindingSet, DeviceFamily, DeviceQueue, DispatcherConfig, RawInput};

    const DT: f32 = 1.0 / 60.0;

    #[derive(Default)]
    struct RecordingBody {
        grounded: bool,
        moves: Vec<Vec3>,
    }

    impl MotionPrimitive for RecordingBody {
        fn move_by(&mut self, displacement: Vec3) -> bool {
            self.moves.push(displacement);
            self.grounded
        }

        fn is_grounded(&self) -> bool {
            self.grounded
        }
    }

    fn rig(follow: Option<CameraFollow>) -> (InputDispatcher, DeviceQueue, LocomotionController) {
        let queue = DeviceQueue::new();
        let mut dispatcher = InputDispatcher::new(DispatcherConfig::default(), queue.clone());
        dispatcher.activate(Some(Rc::new(BindingSet::standard()))).unwrap();
        let mut controller = LocomotionController::new(LocomotionSettings::default()).unwrap();
        controller.attach(Some(&dispatcher), follow).unwrap();
        (dispatcher, queue, controller)
    }

    fn look(queue: &DeviceQueue, delta: Vec2) {
        queue.push(RawInput::vector(DeviceFamily::Pointer, "delta", delta));
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn invalid_settings_rejected() {
        let settings = LocomotionSettings {
            gravity: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            LocomotionController::new(settings),
            Err(LocomotionError::InvalidSettings(_))
        ));
    }

    #[test]
    fn missing_dispatcher_leaves_controller_inert() {
        let mut controller = LocomotionController::new(LocomotionSettings::default()).unwrap();
        assert_eq!(
            controller.attach(None, Some(CameraFollow::default())),
            Err(LocomotionError::NoInputSource)
        );
        assert_eq!(controller.state(), ControllerState::Uninitialized);

        let mut body = RecordingBody::default();
        assert_eq!(controller.tick(DT, &mut body, &NoCamera), TickReport::default());
        assert!(body.moves.is_empty());
    }

    #[test]
    fn attach_twice_rejected() {
        let (dispatcher, _queue, mut controller) = rig(None);
        assert_eq!(
            controller.attach(Some(&dispatcher), None),
            Err(LocomotionError::AlreadyAttached)
        );
    }

    #[test]
    fn follow_binding_drives_state() {
        let (_d, _q, mut controller) = rig(None);
        assert_eq!(controller.state(), ControllerState::Degraded);
        controller.bind_camera_follow(CameraFollow::default());
        assert_eq!(controller.state(), ControllerState::Active);
        assert!(controller.unbind_camera_follow().is_some());
        assert_eq!(controller.state(), ControllerState::Degraded);
    }

    #[test]
    fn late_follow_binding_restores_rotation() {
        let (mut dispatcher, queue, mut controller) = rig(None);
        let mut body = RecordingBody::default();

        look(&queue, Vec2::new(30.0, -50.0));
        dispatcher.poll();
        let report = controller.tick(DT, &mut body, &NoCamera);
        assert!(report.degraded);
        assert!(!report.rotated);
        assert_eq!(controller.rotation(), Quat::IDENTITY);
        assert_eq!(controller.pitch(), 0.0);

        controller.bind_camera_follow(CameraFollow::default());
        look(&queue, Vec2::new(30.0, -50.0));
        dispatcher.poll();
        let report = controller.tick(DT, &mut body, &NoCamera);
        assert!(!report.degraded);
        assert!(report.rotated);
        assert!(approx(controller.pitch(), 10.0));
        assert!(controller.rotation().angle_between(Quat::IDENTITY) > 0.05);
        let follow = controller.camera_follow().unwrap();
        assert!(follow
            .local_rotation()
            .abs_diff_eq(Quat::from_rotation_x(10f32.to_radians()), 1e-5));
        assert_eq!(controller.degraded_ticks(), 1);
    }

    #[test]
    fn pointer_motion_within_one_frame_adds_up() {
        let (mut dispatcher, queue, mut controller) = rig(Some(CameraFollow::default()));
        let mut body = RecordingBody::default();
        for _ in 0..4 {
            look(&queue, Vec2::new(0.0, -25.0));
        }
        dispatcher.poll();
        assert!(controller.tick(DT, &mut body, &NoCamera).rotated);
        assert!(approx(controller.pitch(), 20.0), "pitch {}", controller.pitch());
    }

    #[test]
    fn jump_from_ground_sets_launch_velocity() {
        let (mut dispatcher, queue, mut controller) = rig(Some(CameraFollow::default()));
        let mut body = RecordingBody {
            grounded: true,
            ..Default::default()
        };
        controller.tick(DT, &mut body, &NoCamera);

        queue.push(RawInput::key("space", true));
        dispatcher.poll();
        assert!((controller.vertical_velocity() - 6.264).abs() < 1e-3);
    }

    #[test]
    fn jump_in_air_is_ignored() {
        let (mut dispatcher, queue, mut controller) = rig(Some(CameraFollow::default()));
        let mut body = RecordingBody::default();
        controller.tick(DT, &mut body, &NoCamera);
        let before = controller.vertical_velocity();

        queue.push(RawInput::key("space", true));
        dispatcher.poll();
        assert_eq!(controller.vertical_velocity(), before);
    }

    #[test]
    fn grounded_velocity_then_gravity() {
        let (_d, _q, mut controller) = rig(Some(CameraFollow::default()));
        let mut body = RecordingBody {
            grounded: true,
            ..Default::default()
        };
        controller.set_vertical_velocity(-2.0);
        let report = controller.tick(DT, &mut body, &NoCamera);

        assert!(approx(controller.vertical_velocity(), -2.1635));
        assert!(approx(report.vertical.y, -0.03606));
        assert!(report.horizontal.is_none());
        assert_eq!(body.moves, vec![report.vertical]);
    }

    #[test]
    fn resting_velocity_snaps_when_grounded() {
        let (_d, _q, mut controller) = rig(Some(CameraFollow::default()));
        let mut body = RecordingBody {
            grounded: true,
            ..Default::default()
        };
        controller.set_vertical_velocity(-30.0);
        controller.tick(DT, &mut body, &NoCamera);
        assert!(approx(controller.vertical_velocity(), -2.0 - 9.81 * DT));
    }

    #[test]
    fn pitch_stays_clamped() {
        let (mut dispatcher, queue, mut controller) = rig(Some(CameraFollow::default()));
        let mut body = RecordingBody::default();

        for _ in 0..5 {
            look(&queue, Vec2::new(0.0, -1000.0));
            dispatcher.poll();
            controller.tick(DT, &mut body, &NoCamera);
            assert!(controller.pitch() <= 40.0 && controller.pitch() >= -40.0);
        }
        assert_eq!(controller.pitch(), 40.0);

        look(&queue, Vec2::new(0.0, 1000.0));
        dispatcher.poll();
        controller.tick(DT, &mut body, &NoCamera);
        assert_eq!(controller.pitch(), -40.0);

        let expected = Quat::from_rotation_x((-40.0f32).to_radians());
        let follow = controller.camera_follow().unwrap();
        assert!(follow.local_rotation().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn yaw_accumulates_on_body() {
        let (mut dispatcher, queue, mut controller) = rig(Some(CameraFollow::default()));
        let mut body = RecordingBody::default();
        look(&queue, Vec2::new(450.0, 0.0));
        dispatcher.poll();
        let report = controller.tick(DT, &mut body, &NoCamera);

        assert!(report.rotated);
        let expected = Quat::from_axis_angle(Vec3::Y, 90f32.to_radians());
        assert!(controller.rotation().abs_diff_eq(expected, 1e-5));
        assert!(controller.view_forward().abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn look_buffer_consumed_by_one_tick() {
        let (mut dispatcher, queue, mut controller) = rig(Some(CameraFollow::default()));
        let mut body = RecordingBody::default();
        look(&queue, Vec2::new(10.0, 5.0));
        dispatcher.poll();

        assert!(controller.tick(DT, &mut body, &NoCamera).rotated);
        assert_eq!(controller.look_input(), Vec2::ZERO);
        let pitch = controller.pitch();
        assert!(!controller.tick(DT, &mut body, &NoCamera).rotated);
        assert_eq!(controller.pitch(), pitch);
    }

    #[test]
    fn degraded_tick_discards_look() {
        let (mut dispatcher, queue, mut controller) = rig(None);
        let mut body = RecordingBody::default();
        look(&queue, Vec2::new(10.0, 5.0));
        dispatcher.poll();

        let report = controller.tick(DT, &mut body, &NoCamera);
        assert!(report.degraded);
        assert!(!report.rotated);
        assert_eq!(controller.rotation(), Quat::IDENTITY);
        assert_eq!(controller.look_input(), Vec2::ZERO);
        assert_eq!(controller.degraded_ticks(), 1);
        // movement still runs
        assert_eq!(body.moves.len(), 1);
    }

    #[test]
    fn movement_follows_camera_basis() {
        let (mut dispatcher, queue, mut controller) = rig(Some(CameraFollow::default()));
        let mut body = RecordingBody::default();
        queue.push(RawInput::key("w", true));
        dispatcher.poll();

        let quarter_turn = CameraBasis::from_rotation(Quat::from_rotation_y(90f32.to_radians()));
        let report = controller.tick(DT, &mut body, &quarter_turn);
        let step = report.horizontal.unwrap();
        assert!(step.abs_diff_eq(Vec3::X * 5.0 * DT, 1e-5));
        assert_eq!(body.moves.len(), 2);
    }

    #[test]
    fn movement_without_camera_uses_world_axes() {
        let (mut dispatcher, queue, mut controller) = rig(Some(CameraFollow::default()));
        let mut body = RecordingBody::default();
        queue.push(RawInput::key("d", true));
        dispatcher.poll();

        let step = controller.tick(DT, &mut body, &NoCamera).horizontal.unwrap();
        assert!(step.abs_diff_eq(Vec3::X * 5.0 * DT, 1e-5));
    }

    #[test]
    fn release_of_move_stops_walking() {
        let (mut dispatcher, queue, mut controller) = rig(Some(CameraFollow::default()));
        let mut body = RecordingBody::default();
        queue.push(RawInput::key("w", true));
        dispatcher.poll();
        assert!(controller.tick(DT, &mut body, &NoCamera).horizontal.is_some());

        queue.push(RawInput::key("w", false));
        dispatcher.poll();
        assert_eq!(controller.move_input(), Vec2::ZERO);
        assert!(controller.tick(DT, &mut body, &NoCamera).horizontal.is_none());
    }

    #[test]
    fn release_drops_subscriptions() {
        let (dispatcher, _queue, mut controller) = rig(Some(CameraFollow::default()));
        assert_eq!(dispatcher.total_subscribers(), 3);
        controller.release();
        assert_eq!(dispatcher.total_subscribers(), 0);
        assert_eq!(controller.state(), ControllerState::Destroyed);
        assert_eq!(controller.attach(Some(&dispatcher), None), Err(LocomotionError::Released));
    }

    #[test]
    fn drop_releases_subscriptions() {
        let (dispatcher, _queue, controller) = rig(None);
        drop(controller);
        assert_eq!(dispatcher.total_subscribers(), 0);
    }
}
