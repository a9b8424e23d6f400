//! The supervisor tying C3 → C4 → C5 together into one per-frame call (§4.6).
//! Everything else in this crate is a component; this is the thing an embedding
//! host actually drives.

use tracing::warn;

use crate::config::PipelineConfig;
use crate::events::{PointerCoastEvent, PointerEvent, PointerUpdateEvent, StateChangeEvent};
use crate::fabric::{FabricConfig, MappedLandmarks, PointerFabric};
use crate::hand_state::HandState;
use crate::highlander::{HighlanderConfig, HighlanderMutex};
use crate::landmark::FrameEvent;
use crate::router::HandRouter;
use crate::surface::{FixedScreenMapper, ScreenMapper, Surface};

/// Everything one `on_frame` call produces, in emission order: FSM
/// transitions, then the per-hand `POINTER_UPDATE`s, then the pointer events
/// (coast-triggered teardown first, then this frame's live hands), then the
/// mapped landmark passthrough, then the raw coast signals for anyone who
/// wants them without re-deriving from pointer events.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub state_changes: Vec<StateChangeEvent>,
    pub pointer_updates: Vec<PointerUpdateEvent>,
    pub pointer_events: Vec<PointerEvent>,
    pub mapped_landmarks: Vec<MappedLandmarks>,
    pub coast_events: Vec<PointerCoastEvent>,
}

/// Owns one [`HandRouter`], an optional [`HighlanderMutex`], and one
/// [`PointerFabric`]. The Highlander stage is opt-in: a `None` here means
/// every live hand gets its own pointer.
pub struct Pipeline {
    config: PipelineConfig,
    router: HandRouter,
    highlander: Option<HighlanderMutex>,
    fabric: PointerFabric,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        highlander: Option<HighlanderConfig>,
        surface_size: (f64, f64),
    ) -> Self {
        let fabric_config = FabricConfig::from(&config);
        let (width, height) = surface_size;
        Self {
            router: HandRouter::new(config.clone()),
            highlander: highlander.map(HighlanderMutex::new),
            fabric: PointerFabric::new(fabric_config, Box::new(FixedScreenMapper { width, height })),
            config,
        }
    }

    pub fn add_surface(&mut self, surface: Box<dyn Surface>) {
        self.fabric.add_surface(surface);
    }

    /// Convenience over [`Self::set_screen_mapper`] for the common fixed-size case.
    pub fn set_surface_size(&mut self, width: f64, height: f64) {
        self.fabric
            .set_screen_mapper(Box::new(FixedScreenMapper { width, height }));
    }

    /// Swap in a dynamic [`ScreenMapper`], e.g. one backed by a host window that
    /// can resize between frames.
    pub fn set_screen_mapper(&mut self, screen: Box<dyn ScreenMapper>) {
        self.fabric.set_screen_mapper(screen);
    }

    /// Hot-swap the tunables. An invalid config is rejected and the previous
    /// one is retained, since there is always a previously-valid config to
    /// fall back on once the pipeline is running (unlike `PipelineConfig::from_toml_str`
    /// at startup, where there isn't).
    pub fn apply_config(&mut self, new_config: PipelineConfig) {
        if let Err(err) = new_config.validate() {
            warn!(error = %err, "rejected config reload, retaining previous config");
            return;
        }
        self.router.reconfigure(new_config.clone());
        self.fabric.reconfigure(FabricConfig::from(&new_config));
        self.config = new_config;
    }

    /// Swap the Highlander arbitration policy independently of `apply_config`,
    /// since it is not one of `PipelineConfig`'s shared tunables.
    pub fn apply_highlander_config(&mut self, config: HighlanderConfig) {
        if let Some(highlander) = &mut self.highlander {
            highlander.reconfigure(config);
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Advance the whole pipeline by one capture instant.
    pub fn on_frame(&mut self, frame: &FrameEvent) -> PipelineOutput {
        let router_output = self.router.on_frame(frame);

        let mut pointer_events = Vec::new();
        for coast in &router_output.coast_events {
            if coast.destroy {
                if let Some(event) = self.fabric.retire(coast.hand_id) {
                    pointer_events.push(event);
                }
            }
        }

        let routed: Vec<HandState> = match &mut self.highlander {
            Some(mutex) => mutex.filter(&router_output.hand_states).into_iter().collect(),
            None => router_output.hand_states,
        };
        let fabric_output = self.fabric.process(&routed);
        pointer_events.extend(fabric_output.pointer_events);

        PipelineOutput {
            state_changes: router_output.state_changes,
            pointer_updates: router_output.pointer_updates,
            pointer_events,
            mapped_landmarks: fabric_output.mapped_landmarks,
            coast_events: router_output.coast_events,
        }
    }

    /// Release every live FSM and pointer. Any pointer that was down gets a
    /// closing `pointerup` before its entry is dropped.
    pub fn shutdown(&mut self) -> Vec<PointerEvent> {
        self.fabric.shutdown()
    }
}
