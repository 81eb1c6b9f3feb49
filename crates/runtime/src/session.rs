use std::rc::Rc;

use glam::Vec3;
use tracing::{debug, info, trace, warn};
use westward_common::{DuplicateInstanceWarning, InstanceSlot, Shared};
use westward_host::{GroundPlane, HeadCamera, KinematicBody};
use westward_input::{BindingSet, ConfigurationError, DeviceQueue, InputDispatcher};
use westward_locomotion::{CameraFollow, LocomotionController, LocomotionError, TickReport};

use crate::config::RuntimeConfig;
use crate::script::InputScript;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    DuplicateDispatcher(#[from] DuplicateInstanceWarning),
    #[error("input bindings rejected: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("locomotion setup failed: {0}")]
    Locomotion(#[from] LocomotionError),
}

/// One controlled actor in a single-threaded frame loop.
pub struct Session {
    config: RuntimeConfig,
    dispatcher: Shared<InputDispatcher>,
    device: DeviceQueue,
    controller: LocomotionController,
    body: KinematicBody,
    camera: HeadCamera,
    frames: u64,
}

impl Session {
    /// Install the process dispatcher into `slot`, activate `bindings` and
    /// spawn the actor.
    pub fn new(
        config: RuntimeConfig,
        bindings: Rc<BindingSet>,
        slot: &mut InstanceSlot<InputDispatcher>,
    ) -> Result<Self, SessionError> {
        let device = DeviceQueue::new();
        let dispatcher = slot
            .try_install(InputDispatcher::new(config.dispatcher.clone(), device.clone()))
            .inspect_err(|e| warn!("{e}"))?;
        dispatcher.borrow_mut().activate(Some(bindings))?;

        let mut controller = LocomotionController::new(config.locomotion)?;
        controller.attach(
            Some(&*dispatcher.borrow()),
            Some(CameraFollow::at_height(config.eye_height)),
        )?;

        let body = KinematicBody::new(config.spawn, GroundPlane { height: config.ground_height });
        let mut camera = HeadCamera::default();
        camera.sync(body.position() + Vec3::Y * config.eye_height, controller.view_rotation());

        info!(actor = %controller.actor(), spawn = ?body.position(), "session started");
        Ok(Self {
            config,
            dispatcher,
            device,
            controller,
            body,
            camera,
            frames: 0,
        })
    }

    /// Capture side of the dispatcher's device source.
    pub fn device(&self) -> DeviceQueue {
        self.device.clone()
    }

    /// Advance one frame: poll input, tick locomotion, follow with the camera.
    pub fn frame(&mut self, dt: f32) -> TickReport {
        let dt = dt.clamp(0.0, self.config.max_frame_dt);
        let stats = self.dispatcher.borrow_mut().poll();
        let report = self.controller.tick(dt, &mut self.body, &self.camera);

        let rotation = self.controller.rotation();
        self.body.set_rotation(rotation);
        let position = self.body.position();
        let eye = match self.controller.camera_follow() {
            Some(follow) => follow.world_position(position, rotation),
            None => position + Vec3::Y * self.config.eye_height,
        };
        self.camera.sync(eye, self.controller.view_rotation());

        self.frames += 1;
        trace!(
            frame = self.frames,
            dt,
            inputs = stats.inputs,
            deliveries = stats.deliveries,
            position = ?position,
            grounded = report.grounded,
            "frame"
        );
        report
    }

    /// Feed `script` frame by frame and collect every tick report.
    pub fn play(&mut self, script: &InputScript) -> Vec<TickReport> {
        let mut reports = Vec::with_capacity(script.frame_count() as usize);
        for frame in &script.frames {
            self.device.extend(frame.inputs.iter().cloned());
            let dt = frame.dt.unwrap_or(script.dt);
            for _ in 0..frame.repeat {
                reports.push(self.frame(dt));
            }
        }
        debug!(frames = reports.len(), "script played");
        reports
    }

    /// Stop input, then release the actor's subscriptions.
    pub fn shutdown(&mut self) {
        self.dispatcher.borrow_mut().deactivate();
        self.controller.release();
        info!(frames = self.frames, "session ended");
    }

    pub fn dispatcher(&self) -> Shared<InputDispatcher> {
        self.dispatcher.clone()
    }

    pub fn controller(&self) -> &LocomotionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut LocomotionController {
        &mut self.controller
    }

    pub fn body(&self) -> &KinematicBody {
        &self.body
    }

    pub fn camera(&self) -> &HeadCamera {
        &self.camera
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
