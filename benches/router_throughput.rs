use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gesture_pointer_core::landmark::{FrameEvent, Gesture, RawHand};
use gesture_pointer_core::router::HandRouter;
use gesture_pointer_core::PipelineConfig;

const HAND_COUNT: u64 = 8;

fn make_frame(t: f64) -> FrameEvent {
    let hands = (0..HAND_COUNT)
        .map(|hand_id| RawHand {
            hand_id,
            gesture: if t as u64 % 2 == 0 {
                Gesture::OpenPalm
            } else {
                Gesture::PointerUp
            },
            confidence: 0.9,
            fingertip_x: 0.5,
            fingertip_y: 0.5,
            landmarks: Vec::new(),
            frame_time_ms: t,
        })
        .collect();
    FrameEvent {
        capture_time_ms: t,
        hands,
    }
}

fn router_throughput(c: &mut Criterion) {
    c.bench_function("hand_router_on_frame_8_hands", |b| {
        let mut router = HandRouter::new(PipelineConfig::default());
        let mut t = 0.0;
        let dt = 1000.0 / 60.0;
        b.iter(|| {
            t += dt;
            let frame = make_frame(t);
            black_box(router.on_frame(&frame));
        });
    });
}

criterion_group!(benches, router_throughput);
criterion_main!(benches);
