//! Demo binary: reads a JSON Lines stream of `FrameEvent`s from stdin (or a
//! file given as the first argument), drives them through a [`Pipeline`], and
//! prints the resulting bus events (`STATE_CHANGE`, `POINTER_UPDATE`) to
//! stdout. The dispatched pointer events themselves are fanned out through a
//! registered [`LocalSurface`], the same path a real embedding host would use.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use gesture_pointer_core::landmark::FrameEvent;
use gesture_pointer_core::surface::{LocalDispatch, LocalSurface};
use gesture_pointer_core::{Pipeline, PipelineConfig, PointerEvent};

/// Dispatches a synthetic pointer event by printing it as a JSON line. A real
/// embedding host would instead resolve the DOM element under the mapped
/// point and dispatch there.
struct StdoutLocalDispatch;

impl LocalDispatch for StdoutLocalDispatch {
    fn dispatch_local(&mut self, event: &PointerEvent) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string(event)?);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let reader: Box<dyn BufRead> = match args.next() {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut pipeline = Pipeline::new(PipelineConfig::default(), None, (1920.0, 1080.0));
    pipeline.add_surface(Box::new(LocalSurface::new(StdoutLocalDispatch)));

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: FrameEvent = serde_json::from_str(&line)?;
        let output = pipeline.on_frame(&frame);

        for change in &output.state_changes {
            println!("{}", serde_json::to_string(change)?);
        }
        for update in &output.pointer_updates {
            println!("{}", serde_json::to_string(update)?);
        }
    }

    pipeline.shutdown();

    Ok(())
}
