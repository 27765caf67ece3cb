//! Hardware bring-up and the top-level run
//!
//! Everything claimed here is released by scope: the receiver and engine
//! stop on drop and the panel guard shuts the panel down, on every exit
//! path including errors and unwinding. A forced exit skips all of that, so
//! the panel shutdown is also registered as the forced-exit cleanup. The
//! kernel releases the receiver lines when the process goes.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use linux_embedded_hal::Delay;
use marquee_core::config::MarqueeConfig;
use marquee_core::traits::{MediaService, NetworkStatus};
use marquee_display::{lock_frame, AnimationEngine, FrameBuffer, SharedFrame};
use marquee_drivers::{InputDispatcher, PanelDriver, RemoteReceiver, Target};
use tracing::info;

use crate::channels::EventQueue;
use crate::collaborators::{CommandMediaService, CommandNetworkStatus};
use crate::controller::EventLoop;
use crate::error::Error;
use crate::hw::CdevProvider;
use crate::screens::{PlayerSelection, Ui};
use crate::signals::Shutdown;

/// Loading indicator steps per animation period
const LOADING_STEP_PERIODS: u32 = 2;

/// Shuts the panel down when dropped
struct PanelGuard(SharedFrame);

impl Drop for PanelGuard {
    fn drop(&mut self) {
        lock_frame(&self.0).shutdown();
        info!("Panel released");
    }
}

/// Bring up the panel and receiver and run navigation until it ends
pub fn run(config: &MarqueeConfig, shutdown: Arc<Shutdown>) -> Result<(), Error> {
    let provider = CdevProvider::open(&config.panel.chip)?;
    let mut driver = PanelDriver::new(provider, Delay, config.panel.clone());
    driver.initialize(false)?;

    let frame = FrameBuffer::new(Box::new(driver))?.into_shared();
    let _panel = PanelGuard(frame.clone());
    let forced = frame.clone();
    shutdown.on_forced_exit(move || lock_frame(&forced).shutdown());
    let engine = Arc::new(AnimationEngine::start(frame, &config.animation));

    let queue = Arc::new(EventQueue::new());
    let dispatcher = Arc::new(InputDispatcher::new(Duration::from_millis(
        config.remote.debounce_ms,
    )));
    let producer = queue.clone();
    dispatcher.subscribe(Target::Any, move |event| {
        producer.push(event);
    })?;
    let mut remote = CdevProvider::open(&config.remote.chip)?;
    let _receiver = RemoteReceiver::start(&mut remote, &config.remote.pins, dispatcher)?;

    let ui = Ui::new(
        engine.clone(),
        config.ui,
        config.animation.period() * LOADING_STEP_PERIODS,
        shutdown.clone(),
    );
    let media: Rc<dyn MediaService> = Rc::new(CommandMediaService::from_config(&config.collaborators));
    let network: Rc<dyn NetworkStatus> = Rc::new(CommandNetworkStatus::from_config(&config.collaborators));

    let mut event_loop = EventLoop::new(queue, config.ui.loop_interval(), shutdown);
    let result = event_loop.run(Box::new(PlayerSelection::screen(ui, media, network)));

    drop(event_loop);
    engine.shutdown();
    result.map_err(Error::from)
}
