use super::GlideSample;

pub(crate) fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

/// Trail left behind by a finished or cancelled glide. The radius is a pure
/// function of elapsed time, so nothing has to tick while it fades.
#[derive(Clone, Debug, PartialEq)]
pub struct FadingTrail {
    samples: std::vec::Vec<GlideSample>,
    started_ms: u64,
    duration_ms: u64,
    radius_px: f32,
}

impl FadingTrail {
    pub fn new(
        samples: std::vec::Vec<GlideSample>,
        started_ms: u64,
        duration_ms: u64,
        radius_px: f32,
    ) -> Self {
        Self {
            samples,
            started_ms,
            duration_ms,
            radius_px,
        }
    }

    pub fn samples(&self) -> &[GlideSample] {
        &self.samples
    }

    pub fn radius_at(&self, now_ms: u64) -> Option<f32> {
        let elapsed_ms = now_ms.saturating_sub(self.started_ms);
        if self.duration_ms == 0 || elapsed_ms >= self.duration_ms {
            return None;
        }
        let progress = elapsed_ms as f32 / self.duration_ms as f32;
        Some(self.radius_px * (1.0 - ease_out_cubic(progress)))
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.radius_at(now_ms).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn trail() -> FadingTrail {
        FadingTrail::new(
            std::vec![GlideSample {
                point: Point::new(1.0, 2.0),
                t_ms: 0,
            }],
            1_000,
            200,
            8.0,
        )
    }

    #[test]
    fn easing_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(-3.0), 0.0);
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn radius_decays_to_none() {
        let trail = trail();
        assert_eq!(trail.radius_at(1_000), Some(8.0));
        let mid = trail.radius_at(1_100).expect("still fading");
        assert!(mid > 0.0 && mid < 8.0);
        assert_eq!(trail.radius_at(1_200), None);
        assert!(trail.is_expired(5_000));
    }

    #[test]
    fn radius_is_deterministic() {
        let trail = trail();
        assert_eq!(trail.radius_at(1_050), trail.radius_at(1_050));
        assert!(trail.radius_at(1_050) > trail.radius_at(1_150));
    }
}
