//! Log output of session and handle lifecycles

use tracing_test::traced_test;
use walkie_codec_core::{CodecConfig, DecoderHandle, DecoderSession, EncoderHandle, EncoderSession};

#[test]
#[traced_test]
fn test_successful_init_logs_zero_code() {
    let encoder = EncoderSession::initialize(CodecConfig::default()).unwrap();
    let decoder = DecoderSession::initialize(CodecConfig::default()).unwrap();

    assert!(logs_contain("Initialized encoder with ErrorCode: 0"));
    assert!(logs_contain("Initialized decoder with ErrorCode: 0"));

    encoder.release();
    decoder.release();
    assert!(logs_contain("Releasing encoder after 0 frames"));
    assert!(logs_contain("Releasing decoder after 0 frames"));
}

#[test]
#[traced_test]
fn test_failed_init_logs_status_code() {
    let encoder = EncoderHandle::new();
    assert!(!encoder.initialize(16000, 1, 7));
    assert!(logs_contain("Initialized encoder with ErrorCode: -103"));
}

#[test]
#[traced_test]
fn test_encode_logs_frame_parameters() {
    let encoder = EncoderHandle::new();
    assert!(encoder.initialize(16000, 1, 320));

    let mut packet = [0u8; 4000];
    assert!(encoder.encode(&[0i16; 320], &mut packet) > 0);
    assert!(logs_contain(
        "Opus encoding: FrameSize: 320 - SamplingRate: 16000 - Channels: 1"
    ));
    assert!(logs_contain("Length of encoded data:"));
}

#[test]
#[traced_test]
fn test_short_buffer_is_logged() {
    let decoder = DecoderHandle::new();
    assert!(decoder.initialize(16000, 1, 320));

    let mut encoder = EncoderSession::initialize(CodecConfig::default()).unwrap();
    let packet = encoder.encode_to_vec(&[0i16; 320]).unwrap();

    let mut pcm = [0i16; 100];
    assert_eq!(decoder.decode(&packet, &mut pcm), -1);
    assert!(logs_contain("too small for 320 decoded samples"));
}

#[test]
#[traced_test]
fn test_release_without_session_is_logged() {
    let decoder = DecoderHandle::new();
    assert!(decoder.release());
    assert!(logs_contain("Decoder release with no live session"));
}
