use ppm_sentinel::domain::models::{Roster, RosterEntry};
use ppm_sentinel::services::group_remediation::{plan, RemediationPlan};
use proptest::prelude::*;

const SELF_ID: &str = "1000";

fn roster(values: &[u32], group: bool) -> Roster {
    Roster {
        entries: values
            .iter()
            .enumerate()
            .map(|(i, v)| RosterEntry {
                identity: (1000 + i).to_string(),
                display_name: format!("member{i}"),
                is_leader: i == 0,
                value: f64::from(*v),
            })
            .collect(),
        group_id: group.then(|| "En:1:1".to_string()),
        group_name: group.then(|| "En".to_string()),
    }
}

proptest! {
    /// Property: a group is closed only when every member is at zero.
    #[test]
    fn prop_close_requires_all_zero(
        values in proptest::collection::vec(0u32..3, 1..10),
        force in any::<bool>(),
    ) {
        let r = roster(&values, true);
        let all_zero = values.iter().all(|v| *v == 0);

        match plan(&r, Some(SELF_ID), force) {
            RemediationPlan::CloseGroup { group_id, .. } => {
                prop_assert!(all_zero && !force);
                prop_assert_eq!(group_id, "En:1:1");
            }
            RemediationPlan::StopMembers(_) | RemediationPlan::Nothing => {
                prop_assert!(!all_zero || force);
            }
        }
    }

    /// Property: individual stops target exactly the zero members other
    /// than ourselves.
    #[test]
    fn prop_stops_exclude_self(values in proptest::collection::vec(0u32..3, 1..10)) {
        let r = roster(&values, false);
        let expected: Vec<String> = values
            .iter()
            .enumerate()
            .filter(|(i, v)| **v == 0 && *i != 0)
            .map(|(i, _)| (1000 + i).to_string())
            .collect();

        match plan(&r, Some(SELF_ID), false) {
            RemediationPlan::StopMembers(members) => {
                let ids: Vec<String> = members.into_iter().map(|m| m.identity).collect();
                prop_assert_eq!(ids, expected);
            }
            RemediationPlan::Nothing => prop_assert!(expected.is_empty()),
            RemediationPlan::CloseGroup { .. } => prop_assert!(false, "no group id to close"),
        }
    }
}

#[test]
fn test_single_non_zero_member_blocks_close() {
    let r = roster(&[0, 0, 4, 0], true);
    match plan(&r, Some(SELF_ID), false) {
        RemediationPlan::StopMembers(members) => {
            let ids: Vec<&str> = members.iter().map(|m| m.identity.as_str()).collect();
            assert_eq!(ids, vec!["1001", "1003"]);
        }
        other => panic!("expected individual stops, got {other:?}"),
    }
}

#[test]
fn test_single_zero_entry_with_group_closes() {
    let r = roster(&[0], true);
    assert!(matches!(
        plan(&r, Some(SELF_ID), false),
        RemediationPlan::CloseGroup { .. }
    ));
}

#[test]
fn test_single_zero_self_without_group_does_nothing() {
    let r = roster(&[0], false);
    assert_eq!(plan(&r, Some(SELF_ID), false), RemediationPlan::Nothing);
}

#[test]
fn test_unknown_self_stops_everyone_at_zero() {
    let r = roster(&[0, 2, 0], false);
    match plan(&r, None, false) {
        RemediationPlan::StopMembers(members) => assert_eq!(members.len(), 2),
        other => panic!("expected individual stops, got {other:?}"),
    }
}
