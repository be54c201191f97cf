//! The single owned context the firmware control loop drives.

use log::{debug, error, info};

use crate::{
    clock::LocalDateTime,
    command::Command,
    config::AppConfig,
    connectivity::{Reconnect, Supervisor},
    display::{DisplayController, DisplayMode, DisplaySettings},
    error::FatalError,
    event::Event,
    outbox::{BufferedOutbox, PublishRequest},
    pomodoro::PomodoroEngine,
    render::Rendered,
    router::Router,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    RenderRequested,
}

#[derive(Debug)]
pub struct App {
    supervisor: Supervisor,
    router: Router,
    display: DisplayController,
    pomodoro: PomodoroEngine,
    outbox: BufferedOutbox,
    last_second: Option<i64>,
    rendered: Option<Rendered>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            supervisor: Supervisor::new(config.retry_delay_ms()),
            router: Router::new(),
            display: DisplayController::new(DisplaySettings::new(
                config.initial_mode(),
                config.initial_color(),
                config.initial_brightness(),
            )),
            pomodoro: PomodoroEngine::new(config.pomodoro_minutes()),
            outbox: BufferedOutbox::new(),
            last_second: None,
            rendered: None,
        }
    }

    pub const fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub const fn router(&self) -> &Router {
        &self.router
    }

    pub const fn display(&self) -> &DisplayController {
        &self.display
    }

    pub const fn pomodoro(&self) -> &PomodoroEngine {
        &self.pomodoro
    }

    /// Last frame produced by [`App::tick`]; `None` means the panel should be dark.
    pub fn rendered(&self) -> Option<&Rendered> {
        self.rendered.as_ref()
    }

    pub fn start(&mut self) {
        info!(
            "app: starting, mode={} subscribe={}",
            self.display.mode().as_str(),
            self.router.filter()
        );
        self.supervisor.start();
    }

    /// Feeds one worker event into the context.
    ///
    /// Link loss is absorbed by the supervisor; an `Err` means the device must
    /// restart.
    pub fn handle_event(&mut self, event: Event, now_ms: u64) -> Result<(), FatalError> {
        debug!("app: event {}", event.as_str());

        match event {
            Event::NetworkUp => self.supervisor.on_network_up(),
            Event::NetworkDown => {
                self.router.on_session_down();
                self.supervisor.on_network_down(now_ms);
            }
            Event::SessionUp => self.supervisor.on_session_up(),
            Event::SessionDown => {
                self.router.on_session_down();
                self.supervisor.on_session_down(now_ms);
            }
            Event::Subscribed { ok } => self.router.on_subscribed(ok)?,
            Event::Message(message) => {
                if let Some(command) = self.router.dispatch(&message)? {
                    self.apply(command);
                }
            }
            Event::MessageOverflow => {
                error!("app: inbound message exceeded the receive buffer");
                return Err(FatalError::OversizedMessage);
            }
        }

        Ok(())
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::SetMode(mode) => self.display.set_mode(mode),
            Command::SetColor(color) => self.display.set_color(color),
            Command::SetBrightness(brightness) => self.display.set_brightness(brightness),
            Command::SetPomodoroDuration { phase, minutes } => {
                self.pomodoro.set_duration(phase, minutes)
            }
            Command::ResetPomodoro => self.pomodoro.reset(&mut self.outbox),
        }
    }

    pub fn poll_links(&mut self, now_ms: u64) -> Reconnect {
        self.supervisor.poll(now_ms)
    }

    /// Runs the active renderer once per wall-clock second.
    pub fn tick(&mut self, local_time: &LocalDateTime) -> TickResult {
        if self.last_second == Some(local_time.local_seconds) {
            return TickResult::NoRender;
        }
        self.last_second = Some(local_time.local_seconds);

        let rendered = self
            .display
            .tick(local_time, &mut self.pomodoro, &mut self.outbox);

        if rendered.is_none() && self.rendered.is_none() {
            return TickResult::NoRender;
        }

        self.rendered = rendered;
        TickResult::RenderRequested
    }

    pub fn has_publishes(&self) -> bool {
        !self.outbox.is_empty()
    }

    pub fn drain_publishes(&mut self) -> impl Iterator<Item = PublishRequest> + '_ {
        self.outbox.drain()
    }

    pub const fn mode(&self) -> DisplayMode {
        self.display.mode()
    }
}
