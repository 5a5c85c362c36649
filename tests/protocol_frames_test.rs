use acbridge::entities::{ClimateMode, FanMode};
use acbridge::models::Model;
use acbridge::protocol::{AcState, FrameReceiver, protocol_for};
use acbridge::protocol::{cnt, type_c};
use std::time::{Duration, Instant};

fn receiver_for(model: Model) -> FrameReceiver {
    FrameReceiver::new(protocol_for(model).framing(), Duration::from_millis(100))
}

#[test]
fn cnt_report_through_noisy_stream() {
    let proto = protocol_for(Model::GreeAc);
    let mut payload = [0u8; cnt::PAYLOAD_LEN];
    payload[3] = 0x80 | (4 << 4);
    payload[4] = 8 << 4;
    payload[8] = 2;
    let frame = cnt::build_frame(cnt::CMD_REPORT, &payload).unwrap();

    let mut stream = vec![0x00, 0xFF, 0x7E];
    stream.extend_from_slice(&frame);
    stream.extend_from_slice(&[0x7E, 0x7E]);

    let mut rx = receiver_for(Model::GreeAc);
    let frames = rx.feed(&stream, Instant::now());
    assert_eq!(frames.len(), 1);
    let report = proto.decode(&frames[0]).unwrap().unwrap();
    assert_eq!(report.mode, Some(ClimateMode::Heat));
    assert_eq!(report.target_temperature, Some(24.0));
    assert_eq!(report.fan_mode, Some(FanMode::Low));
}

#[test]
fn asc18_status_frame_decodes() {
    let proto = protocol_for(Model::SinclairAsc18);
    let mut frame = vec![0x7E, 0x7E];
    let mut body = [0u8; 64];
    body[0x1A] = 23;
    body[0x2D] = 4;
    frame.extend_from_slice(&body);

    let mut rx = receiver_for(Model::SinclairAsc18);
    let frames = rx.feed(&frame, Instant::now());
    assert_eq!(frames.len(), 1);
    let report = proto.decode(&frames[0]).unwrap().unwrap();
    assert_eq!(report.target_temperature, Some(23.0));
    assert_eq!(report.fan_mode, Some(FanMode::MiddleHigh));
    assert_eq!(report.mode, None);
    assert_eq!(report.current_temperature, None);
}

#[test]
fn type_c_status_and_unknown_command() {
    let proto = protocol_for(Model::SinclairC);
    let mut body = vec![0u8; 57];
    body[0] = 0x7E;
    body[2] = type_c::CMD_STATUS_SHORT;
    body[14] = 27;
    body[20] = 0x01;
    let frame = type_c::seal(body);
    assert_eq!(frame.len(), 59);

    let mut stream = vec![0x7E, 0x00, 0x55, 0x01, 0x02];
    stream.extend_from_slice(&frame);

    let mut rx = receiver_for(Model::SinclairC);
    let frames = rx.feed(&stream, Instant::now());
    assert_eq!(frames.len(), 1);
    assert_eq!(rx.stats().unknown_commands, 1);
    let report = proto.decode(&frames[0]).unwrap().unwrap();
    assert_eq!(report.mode, Some(ClimateMode::Cool));
    assert_eq!(report.current_temperature, Some(27.0));
}

#[test]
fn control_frames_per_platform() {
    let state = AcState {
        mode: ClimateMode::Cool,
        target_temperature: 22.0,
        ..AcState::default()
    };

    let cnt_frame = protocol_for(Model::SinclairAc).encode(&state).unwrap();
    assert_eq!(&cnt_frame[..4], &[0x7E, 0x7E, cnt::SET_LEN_BYTE, cnt::CMD_SET]);

    let asc18 = protocol_for(Model::SinclairAsc18).encode(&state).unwrap();
    assert_eq!(asc18.len(), 48);
    assert_eq!(asc18[2 + 0x16], 0x01);
    assert_eq!(asc18[2 + 0x17], 22);
    let lo = asc18[46];
    assert_eq!(asc18[47], !lo);

    let type_c_frame = protocol_for(Model::SinclairC).encode(&state).unwrap();
    assert_eq!(&type_c_frame[..5], &[0x7E, 0x7E, 0x2F, 0x01, 22]);
    assert!(type_c::verify_crc(&type_c_frame).is_ok());
}
