//! crates/travel_planner_core/src/plan_state.rs
//!
//! The in-memory itinerary model: the active plans, the selected tab, and the
//! mutations the user and the orchestrator apply to them.

use serde::Serialize;
use crate::domain::TravelPlan;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanState {
    plans: Vec<TravelPlan>,
    active_index: usize,
}

impl PlanState {
    pub fn plans(&self) -> &[TravelPlan] {
        &self.plans
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_plan(&self) -> Option<&TravelPlan> {
        self.plans.get(self.active_index)
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn clear(&mut self) {
        self.plans.clear();
        self.active_index = 0;
    }

    /// Commits a fresh set of plans and selects the first one.
    pub fn replace_all(&mut self, plans: Vec<TravelPlan>) {
        self.plans = plans;
        self.active_index = 0;
    }

    /// Replaces one plan in place. Returns `false` if `index` no longer exists.
    pub fn replace_at(&mut self, index: usize, plan: TravelPlan) -> bool {
        match self.plans.get_mut(index) {
            Some(slot) => {
                *slot = plan;
                true
            }
            None => false,
        }
    }

    /// Selects a plan tab. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.plans.len() {
            self.active_index = index;
            true
        } else {
            false
        }
    }

    /// Flips the like flag of one activity of the active plan.
    ///
    /// Returns `false`, leaving the state untouched, when either index is out
    /// of range.
    pub fn toggle_like(&mut self, day_index: usize, activity_index: usize) -> bool {
        let Some(activity) = self
            .plans
            .get_mut(self.active_index)
            .and_then(|plan| plan.plan.get_mut(day_index))
            .and_then(|day| day.activities.get_mut(activity_index))
        else {
            return false;
        };
        activity.is_liked = Some(!activity.is_liked());
        true
    }

    /// Liked activities of the active plan as `"<place> (<time>)"`, day by day.
    pub fn liked_activity_labels(&self) -> Vec<String> {
        self.active_plan()
            .map(|plan| {
                plan.activities()
                    .filter(|activity| activity.is_liked())
                    .map(|activity| activity.liked_label())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Stably orders generated plans by the order the user requested the modes in.
///
/// A plan matches a requested mode when its label contains the mode name
/// (case-insensitively). Plans matching nothing keep their relative order at the end.
pub fn order_by_requested_modes(mut plans: Vec<TravelPlan>, requested: &[String]) -> Vec<TravelPlan> {
    if requested.len() < 2 {
        return plans;
    }
    let requested: Vec<String> = requested.iter().map(|mode| mode.to_lowercase()).collect();
    plans.sort_by_key(|plan| {
        let label = plan.transportation_mode.to_lowercase();
        requested
            .iter()
            .position(|mode| label.contains(mode.as_str()))
            .unwrap_or(requested.len())
    });
    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Activity, DailyPlan};

    fn activity(place: &str, time: &str, liked: bool) -> Activity {
        Activity {
            place_name: place.into(),
            time: time.into(),
            is_liked: liked.then_some(true),
            ..Default::default()
        }
    }

    fn state_with(activities: Vec<Activity>) -> PlanState {
        let mut state = PlanState::default();
        state.replace_all(vec![TravelPlan {
            transportation_mode: "Train".into(),
            plan: vec![DailyPlan {
                day: 1,
                activities,
                ..Default::default()
            }],
            ..Default::default()
        }]);
        state
    }

    #[test]
    fn toggling_twice_leaves_activity_explicitly_unliked() {
        let mut state = state_with(vec![activity("Shrine", "09:00", false)]);
        let liked = |state: &PlanState| state.active_plan().unwrap().plan[0].activities[0].is_liked;
        assert_eq!(liked(&state), None);

        assert!(state.toggle_like(0, 0));
        assert_eq!(liked(&state), Some(true));
        assert!(state.toggle_like(0, 0));
        // an untouched activity has no flag; a toggled-off one carries `false`
        assert_eq!(liked(&state), Some(false));
        assert!(!state.active_plan().unwrap().has_likes());
        assert!(state.liked_activity_labels().is_empty());
    }

    #[test]
    fn out_of_range_toggle_is_a_no_op() {
        let mut state = state_with(vec![activity("Shrine", "09:00", false)]);
        let before = state.clone();

        assert!(!state.toggle_like(5, 0));
        assert!(!state.toggle_like(0, 9));
        assert_eq!(state, before);

        let mut empty = PlanState::default();
        assert!(!empty.toggle_like(0, 0));
    }

    #[test]
    fn liked_labels_keep_day_then_activity_order() {
        let state = state_with(vec![
            activity("Shrine", "09:00", true),
            activity("Cafe", "11:00", false),
        ]);
        assert_eq!(state.liked_activity_labels(), vec!["Shrine (09:00)"]);
    }

    #[test]
    fn replace_at_keeps_other_plans() {
        let mut state = PlanState::default();
        state.replace_all(vec![
            TravelPlan { transportation_mode: "Train".into(), ..Default::default() },
            TravelPlan { transportation_mode: "Plane".into(), ..Default::default() },
        ]);
        assert!(state.select(1));
        assert!(state.replace_at(1, TravelPlan { transportation_mode: "Plane v2".into(), ..Default::default() }));
        assert!(!state.replace_at(7, TravelPlan::default()));

        assert_eq!(state.plans()[0].transportation_mode, "Train");
        assert_eq!(state.active_plan().unwrap().transportation_mode, "Plane v2");
        assert!(!state.select(2));
        assert_eq!(state.active_index(), 1);
    }

    #[test]
    fn plans_follow_requested_mode_order() {
        let plans = vec![
            TravelPlan { transportation_mode: "Plane plan".into(), ..Default::default() },
            TravelPlan { transportation_mode: "Other".into(), ..Default::default() },
            TravelPlan { transportation_mode: "Shinkansen plan".into(), ..Default::default() },
        ];
        let ordered = order_by_requested_modes(plans, &["Shinkansen".into(), "Plane".into()]);
        let labels: Vec<_> = ordered.iter().map(|p| p.transportation_mode.as_str()).collect();
        assert_eq!(labels, vec!["Shinkansen plan", "Plane plan", "Other"]);
    }
}
