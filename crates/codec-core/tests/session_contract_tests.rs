//! Session contract tests
//!
//! These run against the default engine backend of the build and check the
//! per-frame contract: counts, the buffer-too-small sentinel, engine codes
//! passing through and the round trip between independent sessions.

use proptest::prelude::*;
use walkie_codec_core::{
    CodecConfig, CodecError, DecoderHandle, DecoderSession, EncoderHandle, EncoderSession,
    EngineBackend, HandleState, SampleRate, MAX_PAYLOAD_BYTES,
};

/// Frame durations in 2.5 ms units: 2.5, 5, 10, 20, 40 and 60 ms
const FRAME_UNITS: [usize; 6] = [1, 2, 4, 8, 16, 24];

fn ptt_config() -> CodecConfig {
    CodecConfig::new(16000, 1, 320).unwrap()
}

/// Whether the configured backend can carry one frame in a single payload.
///
/// The PCM backend ships frames uncompressed and refuses, at init, frames
/// larger than the payload limit.
fn backend_accepts(config: &CodecConfig) -> bool {
    config.backend != EngineBackend::Pcm || config.samples_per_frame() * 2 <= MAX_PAYLOAD_BYTES
}

fn config_for(rate: SampleRate, channels: u8, units: usize) -> CodecConfig {
    CodecConfig::new(rate.hz(), channels, units * rate.hz() as usize / 400).unwrap()
}

/// Encode one frame of silence with a fresh encoder
fn silence_packet(config: &CodecConfig) -> Vec<u8> {
    let mut encoder = EncoderSession::initialize(config.clone()).unwrap();
    let packet = encoder
        .encode_to_vec(&vec![0i16; config.samples_per_frame()])
        .unwrap();
    assert!(encoder.release());
    packet
}

mod scenario_tests {
    use super::*;

    #[test]
    fn test_push_to_talk_frame_round_trip() {
        let config = ptt_config();
        let mut encoder = EncoderSession::initialize(config.clone()).unwrap();
        let mut decoder = DecoderSession::initialize(config).unwrap();

        let mut packet = [0u8; 4000];
        let len = encoder.encode(&[0i16; 320], &mut packet).unwrap();
        assert!(len > 0 && len <= 4000);

        let mut pcm = [1i16; 320];
        let samples = decoder.decode(&packet[..len], &mut pcm).unwrap();
        assert_eq!(samples, 320);

        assert!(encoder.release());
        assert!(decoder.release());
    }

    #[test]
    fn test_decode_into_short_buffer_returns_sentinel() {
        let config = ptt_config();
        let packet = silence_packet(&config);

        let decoder = DecoderHandle::new();
        assert!(decoder.initialize(16000, 1, 320));

        let mut pcm = [1234i16; 100];
        assert_eq!(decoder.decode(&packet, &mut pcm), -1);
        assert!(pcm.iter().all(|&s| s == 1234));
        assert!(decoder.release());
    }

    #[test]
    fn test_encode_into_short_buffer_returns_sentinel() {
        let config = ptt_config();
        let needed = silence_packet(&config).len();

        let encoder = EncoderHandle::new();
        assert!(encoder.initialize(16000, 1, 320));

        // One byte short of what a fresh encoder produces for the same frame
        let mut packet = vec![0x5Au8; needed - 1];
        assert_eq!(encoder.encode(&[0i16; 320], &mut packet), -1);
        assert!(packet.iter().all(|&b| b == 0x5A));

        let mut nothing: [u8; 0] = [];
        assert_eq!(encoder.encode(&[0i16; 320], &mut nothing), -1);
        assert!(encoder.release());
    }

    #[test]
    fn test_buffer_too_small_reports_sizes() {
        let config = ptt_config();
        let packet = silence_packet(&config);
        let mut decoder = DecoderSession::initialize(config).unwrap();

        let mut pcm = [0i16; 100];
        match decoder.decode(&packet, &mut pcm) {
            Err(CodecError::BufferTooSmall { needed, actual }) => {
                assert_eq!(needed, 320);
                assert_eq!(actual, 100);
            }
            other => panic!("expected BufferTooSmall, got {other:?}"),
        }

        // A correctly sized retry on the same session succeeds
        let mut pcm = [0i16; 320];
        assert_eq!(decoder.decode(&packet, &mut pcm).unwrap(), 320);
    }

    #[test]
    fn test_garbage_packet_returns_engine_code() {
        let mut decoder = DecoderSession::initialize(ptt_config()).unwrap();
        let mut pcm = [7i16; 320];
        // Code 3 TOC with a zero frame count, also an odd length for PCM
        let err = decoder.decode(&[0x03, 0x00, 0x00], &mut pcm).unwrap_err();

        assert!(matches!(err, CodecError::Engine { .. }));
        assert!(err.status_code() < 0 && err.status_code() >= -7);
        assert!(pcm.iter().all(|&s| s == 7));
    }

    #[test]
    fn test_wrong_frame_length_is_rejected() {
        let mut encoder = EncoderSession::initialize(ptt_config()).unwrap();
        let mut packet = [0u8; 4000];
        for len in [0, 160, 319, 321, 640] {
            let err = encoder.encode(&vec![0i16; len], &mut packet).unwrap_err();
            assert!(matches!(
                err,
                CodecError::InvalidFrameLength { expected: 320, actual } if actual == len
            ));
        }
        assert_eq!(encoder.frames_processed(), 0);
    }

    #[test]
    fn test_repeated_release_does_not_crash() {
        let encoder = EncoderHandle::new();
        let decoder = DecoderHandle::new();
        for _ in 0..3 {
            assert!(encoder.release());
            assert!(decoder.release());
        }
        assert!(encoder.initialize(16000, 1, 320));
        assert!(decoder.initialize(16000, 1, 320));
        for _ in 0..3 {
            assert!(encoder.release());
            assert!(decoder.release());
        }
    }

    #[test]
    fn test_independent_sessions_coexist() {
        let narrow = CodecConfig::new(8000, 1, 160).unwrap();
        let full = CodecConfig::new(48000, 2, 960).unwrap();

        let mut narrow_enc = EncoderSession::initialize(narrow.clone()).unwrap();
        let mut full_enc = EncoderSession::initialize(full.clone()).unwrap();
        let mut narrow_dec = DecoderSession::initialize(narrow).unwrap();
        let mut full_dec = DecoderSession::initialize(full).unwrap();

        for _ in 0..5 {
            let a = narrow_enc.encode_to_vec(&[0i16; 160]).unwrap();
            let b = full_enc.encode_to_vec(&[0i16; 1920]).unwrap();
            assert_eq!(narrow_dec.decode_to_vec(&a).unwrap().len(), 160);
            assert_eq!(full_dec.decode_to_vec(&b).unwrap().len(), 1920);
        }
        assert_eq!(full_enc.frames_processed(), 5);
        assert_eq!(narrow_dec.frames_processed(), 5);
    }

    #[test]
    fn test_every_valid_config_initializes_or_transforms() {
        let mut refused = Vec::new();
        for rate in SampleRate::ALL {
            for channels in 1..=2u8 {
                for units in FRAME_UNITS {
                    let config = config_for(rate, channels, units);
                    assert!(config.validate().is_ok());

                    let encoder = EncoderHandle::new();
                    match encoder.initialize_with(config.clone()) {
                        Ok(()) => {
                            let mut packet = [0u8; MAX_PAYLOAD_BYTES];
                            let pcm = vec![0i16; config.samples_per_frame()];
                            let status = encoder.encode(&pcm, &mut packet);
                            assert!(status >= -1, "{config} returned {status}");
                        }
                        Err(err) => {
                            assert!(!backend_accepts(&config), "{config} refused: {err}");
                            assert!(matches!(err, CodecError::InvalidConfig { .. }));
                            assert_eq!(encoder.state(), HandleState::Uninitialized);
                            refused.push((rate.hz(), channels, config.frame_size));
                        }
                    }
                    assert!(encoder.release());
                }
            }
        }

        if CodecConfig::default().backend == EngineBackend::Pcm {
            refused.sort_unstable();
            assert_eq!(
                refused,
                vec![(24000, 2, 1440), (48000, 1, 2880), (48000, 2, 1920), (48000, 2, 2880)]
            );
        } else {
            assert!(refused.is_empty());
        }
    }

    #[test]
    fn test_handles_serialize_concurrent_callers() {
        use std::sync::Arc;

        let encoder = Arc::new(EncoderHandle::new());
        assert!(encoder.initialize(16000, 1, 320));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let encoder = Arc::clone(&encoder);
                std::thread::spawn(move || {
                    let mut packet = [0u8; 4000];
                    (0..25)
                        .map(|_| encoder.encode(&[0i16; 320], &mut packet))
                        .all(|status| status > 0)
                })
            })
            .collect();

        for worker in workers {
            assert!(worker.join().unwrap());
        }
        assert!(encoder.release());
    }
}

fn valid_config() -> impl Strategy<Value = CodecConfig> {
    (
        prop::sample::select(SampleRate::ALL.to_vec()),
        1u8..=2,
        prop::sample::select(FRAME_UNITS.to_vec()),
    )
        .prop_map(|(rate, channels, units)| config_for(rate, channels, units))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_init_then_transform_never_below_sentinel(config in valid_config()) {
        prop_assert!(config.validate().is_ok());

        let encoder = EncoderHandle::new();
        let decoder = DecoderHandle::new();
        if !backend_accepts(&config) {
            prop_assert!(
                matches!(
                    encoder.initialize_with(config.clone()),
                    Err(CodecError::InvalidConfig { .. })
                ),
                "encoder init should be refused for {}",
                config
            );
            prop_assert!(
                matches!(
                    decoder.initialize_with(config.clone()),
                    Err(CodecError::InvalidConfig { .. })
                ),
                "decoder init should be refused for {}",
                config
            );
            return Ok(());
        }
        prop_assert!(encoder.initialize_with(config.clone()).is_ok());
        prop_assert!(decoder.initialize_with(config.clone()).is_ok());

        let mut packet = vec![0u8; MAX_PAYLOAD_BYTES];
        let status = encoder.encode(&vec![0i16; config.samples_per_frame()], &mut packet);
        prop_assert!(status >= -1);
        prop_assert!(status > 0 && status as usize <= MAX_PAYLOAD_BYTES);

        let mut pcm = vec![0i16; config.samples_per_frame()];
        let decoded = decoder.decode(&packet[..status as usize], &mut pcm);
        prop_assert_eq!(decoded as usize, config.frame_size);

        prop_assert!(encoder.release());
        prop_assert!(decoder.release());
    }

    #[test]
    fn prop_undersized_decode_output_is_sentinel(config in valid_config(), short_by in 1usize..64) {
        prop_assume!(backend_accepts(&config));
        let packet = silence_packet(&config);
        let mut decoder = DecoderSession::initialize(config.clone()).unwrap();

        let capacity = config.samples_per_frame().saturating_sub(short_by);
        let mut pcm = vec![99i16; capacity];
        let err = decoder.decode(&packet, &mut pcm).unwrap_err();
        prop_assert_eq!(err.status_code(), -1);
        prop_assert!(pcm.iter().all(|&s| s == 99));
    }
}
