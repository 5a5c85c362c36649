#![no_main]

use acbridge::models::Model;
use acbridge::protocol::{FrameReceiver, protocol_for};
use libfuzzer_sys::fuzz_target;
use std::time::{Duration, Instant};

fuzz_target!(|data: &[u8]| {
    let now = Instant::now();
    for model in Model::ALL {
        let proto = protocol_for(model);
        let mut rx = FrameReceiver::new(proto.framing(), Duration::from_millis(100));
        for frame in rx.feed(data, now) {
            let _ = proto.decode(&frame);
        }
        // Decoders must also cope with arbitrary unframed input
        let _ = proto.decode(data);
    }
});
