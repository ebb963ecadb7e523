//! The actuator task proper: cadence, settings cache, safety state machine.

use embassy_time::{with_timeout, Duration, Instant, Timer};

use milan_config::{
    ActuatorSettings, AirframeType, ChannelType, AXIS_COUNT, CHANNEL_COUNT, FAILSAFE_TIMEOUT_MS,
    INTERLOCK_POLL_MS, INTERLOCK_STOP_HOLD_MS,
};
use milan_error::MilanResult;
use milan_mixer::output::{apply_channel_types, failsafe_value, fit_gain_offset, scale_channel, shape_motor};
use milan_mixer::{ActuatorCommand, AxisCurves, InputNormalizer, MixerMatrix};

use crate::objects::{ActuatorBus, Interlock};
use crate::pwm::ServoDriver;
use crate::supervisor::{AlarmSink, Watchdog};

#[cfg(feature = "mixer-status")]
use crate::objects::MixerStatus;

/// Geometric tilt applied to motor rows when the matrix is compiled.
// TODO: derive this from a tilt-servo channel once tilt geometry lands in
// ActuatorSettings; until then the rotors are treated as upright.
const ROTOR_TILT_RAD: f32 = 0.0;

/// Owns every piece of mutable state derived from the shared objects. Runs
/// as a single dedicated task at the highest priority the runtime offers and
/// suspends only on the demand queue and the interlock poll sleep.
pub struct ActuatorTask<'a, S, W, A> {
    bus: &'a ActuatorBus,
    servo: S,
    watchdog: W,
    alarms: A,
    settings: ActuatorSettings,
    airframe: AirframeType,
    matrix: MixerMatrix,
    curves: AxisCurves,
    normalizer: InputNormalizer,
    desired_vect: [f32; AXIS_COUNT],
    last_systime: Instant,
    dt_seconds: f32,
}

impl<'a, S, W, A> ActuatorTask<'a, S, W, A>
where
    S: ServoDriver,
    W: Watchdog,
    A: AlarmSink,
{
    pub fn new(bus: &'a ActuatorBus, servo: S, watchdog: W, alarms: A) -> Self {
        Self {
            bus,
            servo,
            watchdog,
            alarms,
            settings: ActuatorSettings::new(),
            airframe: AirframeType::QuadX,
            matrix: MixerMatrix::new(),
            curves: AxisCurves::new(),
            normalizer: InputNormalizer::new(),
            desired_vect: [0.0; AXIS_COUNT],
            last_systime: Instant::from_ticks(0),
            dt_seconds: 0.0,
        }
    }

    /// Run forever. Equivalent to [`ActuatorTask::start`] followed by
    /// [`ActuatorTask::tick`] in a loop; split out so a firmware can embed
    /// the tick in its own supervision scheme.
    pub async fn run(&mut self) -> ! {
        self.start();
        loop {
            self.tick().await;
        }
    }

    /// Start-up: register the watchdog slot, load the output calibration,
    /// program the banks and park everything in failsafe until the first
    /// demand arrives.
    pub fn start(&mut self) {
        self.watchdog.register();

        self.bus.actuator_settings.take_dirty();
        self.settings = self.bus.actuator_settings.get();
        self.program_banks();
        self.set_failsafe();

        self.last_systime = Instant::now();
        info!("actuator task started, outputs in failsafe");
    }

    /// One loop iteration: settings refresh, demand wait, interlock check,
    /// mix and commit.
    pub async fn tick(&mut self) {
        self.watchdog.feed();

        if self.bus.actuator_settings.take_dirty() {
            self.settings = self.bus.actuator_settings.get();
            self.program_banks();
        }

        if self.bus.mixer_settings.take_dirty() {
            let mixer = self.bus.mixer_settings.get();
            self.airframe = self.bus.system_settings.get().airframe_type;
            self.matrix = MixerMatrix::build(&mixer, ROTOR_TILT_RAD);
            self.curves = AxisCurves::from_settings(&mixer);
            debug!("mixer rebuilt");
        }

        // The demand queue is the single cadence anchor. Starvation is not
        // fatal: drive failsafe and keep ticking so recovery is automatic.
        let timeout = Duration::from_millis(FAILSAFE_TIMEOUT_MS);
        if with_timeout(timeout, self.bus.trigger.receive()).await.is_err() {
            warn!("no demand for {} ms, driving failsafe", FAILSAFE_TIMEOUT_MS);
            self.set_failsafe();
            return;
        }

        let now = Instant::now();
        if now > self.last_systime {
            self.dt_seconds = (now - self.last_systime).as_micros() as f32 / 1_000_000.0;
        }
        // A non-advancing clock reuses the previous dT; it is not an error.
        self.last_systime = now;

        if self.bus.interlock.get() != Interlock::Ok {
            self.hold_for_interlock(now).await;
            return;
        }

        self.mix_and_commit(now);
    }

    /// Park in failsafe while an external agent holds the interlock.
    ///
    /// A STOPREQUEST held for [`INTERLOCK_STOP_HOLD_MS`] latches STOPPED;
    /// the agent must wait for that before touching the timers, and only it
    /// sets the word back to OK. The banks are reprogrammed on release
    /// because the agent may have reconfigured the hardware.
    async fn hold_for_interlock(&mut self, entered: Instant) {
        info!("interlock asserted, holding failsafe");
        let stop_deadline = entered + Duration::from_millis(INTERLOCK_STOP_HOLD_MS);

        while self.bus.interlock.get() != Interlock::Ok {
            if self.bus.interlock.get() == Interlock::StopRequest {
                self.set_failsafe();
                if Instant::now() >= stop_deadline {
                    self.bus.interlock.set(Interlock::Stopped);
                    info!("interlock stopped");
                }
            }

            Timer::after(Duration::from_millis(INTERLOCK_POLL_MS)).await;
            self.watchdog.feed();
        }

        info!("interlock released, reprogramming banks");
        self.program_banks();
    }

    fn mix_and_commit(&mut self, now: Instant) {
        let desired = self.bus.desired.get();
        let flight_status = self
            .bus
            .flight_status
            .take_dirty()
            .then(|| self.bus.flight_status.get());
        let manual = self
            .bus
            .manual_control
            .take_dirty()
            .then(|| self.bus.manual_control.get());

        let arm = self.normalizer.normalize(
            now,
            &desired,
            flight_status,
            manual,
            &self.settings,
            self.airframe,
            &self.curves,
            &mut self.desired_vect,
        );

        let mut motor_vect = self.matrix.mix(&self.desired_vect);

        #[cfg(feature = "mixer-status")]
        self.bus.mixer_status.store(MixerStatus {
            mixer_vals: motor_vect,
        });

        let camera = self.bus.camera_desired.get();
        let stats = apply_channel_types(&mut motor_vect, self.matrix.types(), camera.as_ref());
        let (gain, offset) = fit_gain_offset(
            &stats,
            self.settings.low_power_stabilization_max_power_add,
        );

        let mut command = self.bus.command.get();
        for ch in 0..CHANNEL_COUNT {
            let mut value = motor_vect[ch];
            if self.matrix.channel_type(ch) == ChannelType::Motor {
                value = shape_motor(
                    value,
                    &arm,
                    gain,
                    offset,
                    self.settings.motor_input_output_curve_fit,
                );
            }
            command.channel[ch] = scale_channel(
                value,
                self.settings.channel_min[ch],
                self.settings.channel_neutral[ch],
                self.settings.channel_max[ch],
            );
        }

        command.update_time = 1000.0 * self.dt_seconds;
        if command.update_time > command.max_update_time {
            command.max_update_time = command.update_time;
        }

        if self.bus.command_read_only() {
            // A ground station owns the command object during servo
            // configuration; mirror its values so they reach the hardware.
            command = self.bus.command.get();
        } else {
            self.bus.command.store(command);
        }

        match self.commit_channels(&command) {
            Ok(()) => self.alarms.clear(),
            Err(err) => {
                error!("servo backend rejected the commit ({}), driving failsafe", err);
                self.set_failsafe();
            }
        }
    }

    /// Program and latch one batch of pulses.
    fn commit_channels(&mut self, command: &ActuatorCommand) -> MilanResult<()> {
        for (ch, pulse) in command.channel.iter().enumerate() {
            self.servo.set(ch, *pulse)?;
        }
        self.servo.update()?;
        Ok(())
    }

    /// Commit the failsafe table and raise the Critical alarm. Best effort
    /// on the hardware side: a failing backend must not keep us from parking
    /// whatever channels still listen.
    fn set_failsafe(&mut self) {
        self.alarms.raise_critical();

        let mut command = self.bus.command.get();
        for ch in 0..CHANNEL_COUNT {
            let value = failsafe_value(
                self.matrix.channel_type(ch),
                self.settings.channel_min[ch],
                self.settings.channel_neutral[ch],
            );
            command.channel[ch] = value;
            let _ = self.servo.set(ch, value);
        }
        let _ = self.servo.update();

        self.bus.command.store(command);
    }

    fn program_banks(&mut self) {
        if self
            .servo
            .set_mode(
                &self.settings.timer_update_freq,
                &self.settings.channel_max,
                &self.settings.channel_min,
            )
            .is_err()
        {
            error!("failed to program output banks");
            self.alarms.raise_critical();
        }
    }
}
