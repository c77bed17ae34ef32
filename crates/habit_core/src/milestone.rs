use tracing::info;

use crate::calendar::WeekId;

/// Receives the one-time "every weekly goal met" signal.
pub trait MilestoneSink: Send + Sync {
    fn milestone_reached(&self, week: &WeekId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneTransition {
    Shown,
    Retracted,
    Unchanged,
}

/// Decides when the congratulations modal is visible. A week that has been
/// acknowledged is never surfaced again, including after a reload, because
/// the acknowledged identifier is part of the persisted snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneTracker {
    week: WeekId,
    acknowledged: WeekId,
    visible: bool,
}

impl MilestoneTracker {
    pub fn new(acknowledged: WeekId) -> Self {
        Self {
            week: WeekId::none(),
            acknowledged,
            visible: false,
        }
    }

    pub fn week(&self) -> &WeekId {
        &self.week
    }

    pub fn acknowledged(&self) -> &WeekId {
        &self.acknowledged
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Re-evaluates after checks, habits or the anchored week changed.
    pub fn evaluate(&mut self, week: WeekId, all_met: bool) -> MilestoneTransition {
        self.week = week;
        let was_visible = self.visible;
        self.visible = all_met && self.week != self.acknowledged;

        match (was_visible, self.visible) {
            (false, true) => {
                info!(week = %self.week, "all weekly goals met");
                MilestoneTransition::Shown
            }
            (true, false) => MilestoneTransition::Retracted,
            _ => MilestoneTransition::Unchanged,
        }
    }

    /// User dismissal. Records the current week so it cannot trigger again.
    /// Returns false when there was nothing visible to dismiss.
    pub fn acknowledge(&mut self) -> bool {
        if !self.visible {
            return false;
        }
        self.acknowledged = self.week.clone();
        self.visible = false;
        info!(week = %self.acknowledged, "milestone acknowledged");
        true
    }
}
