use std::sync::Arc;

use crate::envelope::builder::envelopebuilder::EnvelopeBuilder;
use crate::envelope::envelope::Envelope;
use crate::envelope::envelopeerror::EnvelopeResult;
use crate::envelope::part::envelopepart::EnvelopePart;

/// Builds the most restrictive speed profile out of constant speed limits.
///
/// Each limit is a single constant step. The result has one part per interval
/// between consecutive limit edges, at the lowest speed of the limits covering
/// it, carrying that limit's attributes. Adjacent intervals are never merged.
#[derive(Debug, Default)]
pub struct MRSPEnvelopeBuilder {
    limits: Vec<Arc<EnvelopePart>>
}

impl MRSPEnvelopeBuilder {
    pub fn new() -> MRSPEnvelopeBuilder {
        MRSPEnvelopeBuilder::default()
    }

    pub fn add_part(&mut self, limit: Arc<EnvelopePart>) -> &mut MRSPEnvelopeBuilder {
        assert_eq!(limit.step_count(), 1, "speed limits are single steps");
        assert_eq!(limit.begin_speed(), limit.end_speed(), "speed limits are constant");
        self.limits.push(limit);
        self
    }

    pub fn add_parts(&mut self, limits: impl IntoIterator<Item = Arc<EnvelopePart>>) -> &mut MRSPEnvelopeBuilder {
        for limit in limits {
            self.add_part(limit);
        }
        self
    }

    pub fn try_build(self) -> EnvelopeResult<Envelope> {
        // (position, limit, is_begin)
        let mut events: Vec<(f64, usize, bool)> = Vec::with_capacity(self.limits.len() * 2);
        for (index, limit) in self.limits.iter().enumerate() {
            events.push((limit.begin_pos(), index, true));
            events.push((limit.end_pos(), index, false));
        }
        events.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut builder = EnvelopeBuilder::new();
        let mut active: Vec<usize> = Vec::new();
        let mut previous: Option<f64> = None;
        let mut event_index = 0;
        while event_index < events.len() {
            let position = events[event_index].0;

            if let Some(previous) = previous {
                let winner = active
                    .iter()
                    .copied()
                    .reduce(|best, candidate| {
                        if self.limits[candidate].begin_speed() < self.limits[best].begin_speed() { candidate } else { best }
                    });
                if let Some(winner) = winner {
                    let limit = &self.limits[winner];
                    let speed = limit.begin_speed();
                    let part = EnvelopePart::try_generate_times(
                        Arc::clone(limit.attrs()),
                        vec![previous, position],
                        vec![speed, speed]
                    )?;
                    builder.add_part(Arc::new(part));
                }
            }

            while event_index < events.len() && events[event_index].0 == position {
                let (_, limit, is_begin) = events[event_index];
                if is_begin {
                    active.push(limit);
                } else {
                    active.retain(|active_limit| *active_limit != limit);
                }
                event_index += 1;
            }
            previous = Some(position);
        }

        tracing::debug!(limits = self.limits.len(), parts = builder.len(), "built most restrictive speed profile");
        builder.try_build()
    }

    pub fn build(self) -> Envelope {
        self.try_build().unwrap_or_else(|err| panic!("{}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::part::envelopeattrs::{
        EnvelopeAttrs,
        LimitKind
    };

    fn limit(begin: f64, end: f64, speed: f64, kind: LimitKind) -> Arc<EnvelopePart> {
        let attrs = EnvelopeAttrs::new().with_limit_kind(kind).shared();
        EnvelopePart::generate_times(attrs, vec![begin, end], vec![speed, speed]).shared()
    }

    #[test]
    fn lowest_limit_wins_on_each_interval() {
        let mut builder = MRSPEnvelopeBuilder::new();
        builder
            .add_part(limit(0.0, 100.0, 30.0, LimitKind::TrainLimit))
            .add_part(limit(50.0, 150.0, 20.0, LimitKind::SpeedLimit));
        let mrsp = builder.build();

        assert_eq!(mrsp.size(), 3);
        let expected = [(0.0, 50.0, 30.0), (50.0, 100.0, 20.0), (100.0, 150.0, 20.0)];
        for (part, (begin, end, speed)) in mrsp.iter().zip(expected) {
            assert_eq!(part.begin_pos(), begin);
            assert_eq!(part.end_pos(), end);
            assert_eq!(part.begin_speed(), speed);
        }
        assert_eq!(mrsp.get(0).attrs().limit_kind(), Some(LimitKind::TrainLimit));
        assert_eq!(mrsp.get(1).attrs().limit_kind(), Some(LimitKind::SpeedLimit));
        assert!(!mrsp.is_continuous());
        assert!(mrsp.is_space_continuous());
    }

    #[test]
    fn uncovered_intervals_leave_gaps() {
        let mut builder = MRSPEnvelopeBuilder::new();
        builder
            .add_part(limit(0.0, 10.0, 5.0, LimitKind::SpeedLimit))
            .add_part(limit(20.0, 30.0, 5.0, LimitKind::SpeedLimit));
        let mrsp = builder.build();
        assert_eq!(mrsp.size(), 2);
        assert!(!mrsp.is_space_continuous());
    }

    #[test]
    fn no_limit_means_no_profile() {
        assert!(MRSPEnvelopeBuilder::new().try_build().is_err());
    }
}
