//! FIFO batch decoding and sample dispatch.

use crate::calibration::CalibrationEstimator;
use crate::data::scale::{gbias_to_mdps, gravity_to_mg, qvar_to_mv};
use crate::data::{FifoTag, FifoWord, FifoWordIterator, Quaternion, RawVector, ScaleSelection};
use crate::data::{Vector3, timestamp_ticks_to_ns};
use crate::fsm::FSM_SLOT_COUNT;
use crate::handler::{FsmEvent, SampleHandler};

/// Counters for one decoded batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeSummary {
    /// Words read from the FIFO.
    pub words: u16,
    /// Sensor samples dropped by the post-configuration discard counter.
    pub discarded: u16,
    /// Words with a tag this driver does not decode.
    pub skipped: u16,
    /// A calibration session completed during this batch.
    pub calibration_done: bool,
}

/// Decodes FIFO words against the sensor context and forwards samples.
pub(crate) struct FifoDecoder<'a, H> {
    pub(crate) scale: &'a ScaleSelection,
    pub(crate) discard: &'a mut u8,
    pub(crate) gbias: &'a mut Vector3,
    pub(crate) estimator: &'a mut CalibrationEstimator,
    pub(crate) handler: &'a mut H,
}

impl<H: SampleHandler> FifoDecoder<'_, H> {
    /// Decodes every complete word in `buffer`.
    pub(crate) fn decode(&mut self, buffer: &[u8]) -> DecodeSummary {
        let mut summary = DecodeSummary::default();
        for word in FifoWordIterator::new(buffer) {
            summary.words = summary.words.saturating_add(1);
            self.dispatch(word, &mut summary);
        }
        summary
    }

    fn dispatch(&mut self, word: FifoWord, summary: &mut DecodeSummary) {
        match word.tag {
            FifoTag::Timestamp => {
                self.handler
                    .on_timestamp(timestamp_ticks_to_ns(word.timestamp_ticks()));
            }
            FifoTag::Accel => {
                if self.take_discard(summary) {
                    return;
                }
                let raw = RawVector::from_bytes(word.payload);
                self.handler.on_accel(raw.scaled(|v| self.scale.accel(v)));
            }
            FifoTag::Gyro => {
                if self.take_discard(summary) {
                    return;
                }
                let raw = RawVector::from_bytes(word.payload);
                let sample = raw.scaled(|v| self.scale.gyro(v)).sub(*self.gbias);
                self.handler.on_gyro(sample);
            }
            FifoTag::Qvar => {
                if self.take_discard(summary) {
                    return;
                }
                self.handler.on_qvar(qvar_to_mv(word.first_i16()));
            }
            FifoTag::GyroBias => {
                let bias = RawVector::from_bytes(word.payload).scaled(gbias_to_mdps);
                if self.estimator.is_active() {
                    self.feed_calibration(bias, summary);
                } else {
                    self.handler.on_gyro_bias(bias);
                }
            }
            FifoTag::GameRotation => {
                self.handler
                    .on_game_rotation(Quaternion::from_sflp_bytes(word.payload));
            }
            FifoTag::Gravity => {
                let gravity = RawVector::from_bytes(word.payload).scaled(gravity_to_mg);
                self.handler.on_gravity(gravity);
            }
            FifoTag::Unknown(_) => {
                summary.skipped = summary.skipped.saturating_add(1);
            }
        }
    }

    fn take_discard(&mut self, summary: &mut DecodeSummary) -> bool {
        if *self.discard == 0 {
            return false;
        }
        *self.discard -= 1;
        summary.discarded = summary.discarded.saturating_add(1);
        true
    }

    fn feed_calibration(&mut self, bias: Vector3, summary: &mut DecodeSummary) {
        let Some(result) = self.estimator.feed(bias) else {
            return;
        };
        // The correction is in place before anyone hears about the result.
        if let Ok(average) = result {
            *self.gbias = average;
        }
        summary.calibration_done = true;
        self.handler.on_calibration_result(result);
    }
}

/// Reports embedded-function events: significant motion, then, when at
/// least one armed FSM slot fired, one [`FsmEvent`] per armed slot in
/// ascending order.
pub(crate) fn dispatch_embedded_events<H: SampleHandler>(
    handler: &mut H,
    significant_motion: bool,
    fsm_status: u8,
    armed: u8,
) {
    if significant_motion {
        handler.on_significant_motion();
    }
    if fsm_status & armed == 0 {
        return;
    }
    for slot in 0..FSM_SLOT_COUNT as u8 {
        let bit = 1u8 << slot;
        if armed & bit != 0 {
            handler.on_fsm_event(FsmEvent {
                slot,
                fired: fsm_status & bit != 0,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::calibration::{CalibrationConfig, CalibrationError};
    use crate::config::{AccelRange, GyroRange};
    use crate::data::{convert_accel, convert_gyro};
    use crate::testing::{RecordingHandler, fifo_word};

    struct Fixture {
        scale: ScaleSelection,
        discard: u8,
        gbias: Vector3,
        estimator: CalibrationEstimator,
        handler: RecordingHandler,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                scale: ScaleSelection::new(AccelRange::G2, GyroRange::Dps125),
                discard: 0,
                gbias: Vector3::ZERO,
                estimator: CalibrationEstimator::new(),
                handler: RecordingHandler::default(),
            }
        }

        fn decode(&mut self, words: &[[u8; 7]]) -> DecodeSummary {
            let buffer: Vec<u8> = words.iter().flatten().copied().collect();
            FifoDecoder {
                scale: &self.scale,
                discard: &mut self.discard,
                gbias: &mut self.gbias,
                estimator: &mut self.estimator,
                handler: &mut self.handler,
            }
            .decode(&buffer)
        }
    }

    #[test]
    fn dispatches_by_tag_with_unit_conversion() {
        let mut fx = Fixture::new();
        let mut ts = fifo_word(0x04, 0, 0, 0);
        ts[1..5].copy_from_slice(&1000u32.to_le_bytes());

        let summary = fx.decode(&[ts, fifo_word(0x02, 100, -100, 0), fifo_word(0x01, 8, 0, -8)]);

        assert_eq!(summary.words, 3);
        assert_eq!(fx.handler.timestamps, [21_750_000]);
        assert_eq!(
            fx.handler.accel,
            [Vector3::new(
                convert_accel(100, AccelRange::G2),
                convert_accel(-100, AccelRange::G2),
                0.0
            )]
        );
        assert_eq!(
            fx.handler.gyro,
            [Vector3::new(
                convert_gyro(8, GyroRange::Dps125),
                0.0,
                convert_gyro(-8, GyroRange::Dps125)
            )]
        );
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let mut fx = Fixture::new();
        let summary = fx.decode(&[fifo_word(0x0E, 1, 2, 3), fifo_word(0x02, 1, 1, 1)]);
        assert_eq!(summary.skipped, 1);
        assert_eq!(fx.handler.accel.len(), 1);
    }

    #[test]
    fn leading_samples_are_discarded() {
        let mut fx = Fixture::new();
        fx.discard = 2;
        let summary = fx.decode(&[
            fifo_word(0x02, 1, 1, 1),
            fifo_word(0x04, 0, 0, 0),
            fifo_word(0x01, 1, 1, 1),
            fifo_word(0x02, 2, 2, 2),
        ]);
        assert_eq!(summary.discarded, 2);
        assert_eq!(fx.discard, 0);
        // Timestamps are not sensor samples and are never discarded.
        assert_eq!(fx.handler.timestamps.len(), 1);
        assert_eq!(fx.handler.accel.len(), 1);
        assert!(fx.handler.gyro.is_empty());
    }

    #[test]
    fn gyro_is_bias_corrected() {
        let mut fx = Fixture::new();
        fx.gbias = Vector3::new(4.375, 0.0, -4.375);
        fx.decode(&[fifo_word(0x01, 1, 1, 1)]);
        assert_eq!(fx.handler.gyro, [Vector3::new(0.0, 4.375, 8.75)]);
    }

    #[test]
    fn gyro_bias_goes_to_estimator_while_calibrating() {
        let mut fx = Fixture::new();
        fx.estimator.start(CalibrationConfig::new(1, 2));

        let words = [fifo_word(0x16, 100, 100, 100), fifo_word(0x16, 2, 4, 6), fifo_word(0x16, 2, 4, 6)];
        let summary = fx.decode(&words);

        assert!(summary.calibration_done);
        assert!(fx.handler.gyro_bias.is_empty());
        let expected = Vector3::new(8.75, 17.5, 26.25);
        assert_eq!(fx.handler.calibration, [Ok(expected)]);
        assert_eq!(fx.gbias, expected);

        // Once idle the bias stream reaches the handler again.
        fx.decode(&[fifo_word(0x16, 1, 1, 1)]);
        assert_eq!(fx.handler.gyro_bias.len(), 1);
    }

    #[test]
    fn empty_calibration_keeps_previous_bias() {
        let mut fx = Fixture::new();
        fx.gbias = Vector3::new(1.0, 2.0, 3.0);
        fx.estimator.start(CalibrationConfig::new(0, 0));

        fx.decode(&[fifo_word(0x16, 5, 5, 5)]);

        assert_eq!(fx.handler.calibration, [Err(CalibrationError::NoSamples)]);
        assert_eq!(fx.gbias, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn sflp_outputs_are_forwarded() {
        let mut fx = Fixture::new();
        let mut rotation = [0x13 << 3, 0, 0, 0, 0, 0, 0];
        rotation[1..3].copy_from_slice(&0x3800u16.to_le_bytes());
        fx.decode(&[rotation, fifo_word(0x17, 0, 0, 16_393), fifo_word(0x1F, 78, 0, 0)]);

        assert_eq!(fx.handler.game_rotation.len(), 1);
        assert!((fx.handler.game_rotation[0].x - 0.5).abs() < 1e-6);
        assert!((fx.handler.gravity[0].z - 1000.0).abs() < 0.1);
        assert_eq!(fx.handler.qvar, [1.0]);
    }

    #[test]
    fn fsm_events_cover_armed_slots_only() {
        let mut handler = RecordingHandler::default();
        dispatch_embedded_events(&mut handler, true, 0b0000_0100, 0b0000_0110);

        assert_eq!(handler.significant_motion, 1);
        assert_eq!(
            handler.fsm,
            [
                FsmEvent { slot: 1, fired: false },
                FsmEvent { slot: 2, fired: true },
            ]
        );
    }

    #[test]
    fn significant_motion_alone_reports_no_fsm_events() {
        let mut handler = RecordingHandler::default();
        dispatch_embedded_events(&mut handler, true, 0, 0b0000_0110);
        // Unarmed slot bits are ignored too.
        dispatch_embedded_events(&mut handler, false, 0b1000_0000, 0b0000_0110);

        assert_eq!(handler.significant_motion, 1);
        assert!(handler.fsm.is_empty());
    }
}
