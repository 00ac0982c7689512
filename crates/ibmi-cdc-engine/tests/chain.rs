use chrono::NaiveDate;
use ibmi_cdc_engine::{
    available_receivers, find_chain_containing, last_joined, link_chain, ChainError,
};
use ibmi_cdc_model::{
    BigUint, DetailedJournalReceiver, JournalReceiver, JournalReceiverInfo, JournalStatus,
};

fn receiver(name: &str, day: u32, status: JournalStatus, next: Option<&str>) -> DetailedJournalReceiver {
    DetailedJournalReceiver {
        info: JournalReceiverInfo {
            receiver: JournalReceiver::new(name, "JRNLIB"),
            attach_time: NaiveDate::from_ymd_opt(2024, 3, day).and_then(|d| d.and_hms_opt(12, 0, 0)),
            status,
            chain_position: None,
        },
        start: BigUint::from(day * 10_000),
        end: BigUint::from(day * 10_000 + 9_999),
        next_receiver: next.map(|n| JournalReceiver::new(n, "JRNLIB")),
        max_entry_length: 0,
        entry_count: BigUint::from(10_000u32),
    }
}

fn names(chain: &[DetailedJournalReceiver]) -> Vec<String> {
    chain.iter().map(|r| r.receiver().name.to_string()).collect()
}

fn permutations(items: &[DetailedJournalReceiver]) -> Vec<Vec<DetailedJournalReceiver>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let first = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first.clone());
            out.push(tail);
        }
    }
    out
}

fn three_linked() -> Vec<DetailedJournalReceiver> {
    vec![
        receiver("R1", 1, JournalStatus::OnlineSavedDetached, Some("R2")),
        receiver("R2", 2, JournalStatus::SavedDetachedNotFreed, Some("R3")),
        receiver("R3", 3, JournalStatus::Attached, None),
    ]
}

#[test]
fn chain_order_does_not_depend_on_listing_order() {
    for listing in permutations(&three_linked()) {
        for needle in ["R1", "R2", "R3"] {
            let chain =
                find_chain_containing(&listing, &JournalReceiver::new(needle, "JRNLIB")).unwrap();
            assert_eq!(names(&chain), vec!["R1", "R2", "R3"]);
        }
    }
}

#[test]
fn absent_receiver_has_no_chain() {
    let chain =
        find_chain_containing(&three_linked(), &JournalReceiver::new("R9", "JRNLIB")).unwrap();
    assert!(chain.is_empty());
}

#[test]
fn two_receiver_loop_is_a_cycle() {
    let all = vec![
        receiver("R1", 1, JournalStatus::OnlineSavedDetached, Some("R2")),
        receiver("R2", 2, JournalStatus::OnlineSavedDetached, Some("R1")),
    ];
    assert!(matches!(
        link_chain(available_receivers(&all)),
        Err(ChainError::Cycle { .. })
    ));
}

#[test]
fn loop_next_to_a_healthy_chain_is_a_cycle() {
    let all = vec![
        receiver("A1", 1, JournalStatus::OnlineSavedDetached, Some("A2")),
        receiver("A2", 2, JournalStatus::Attached, None),
        receiver("B1", 3, JournalStatus::OnlineSavedDetached, Some("B2")),
        receiver("B2", 4, JournalStatus::OnlineSavedDetached, Some("B3")),
        receiver("B3", 5, JournalStatus::OnlineSavedDetached, Some("B1")),
    ];
    assert!(matches!(
        find_chain_containing(&all, &JournalReceiver::new("A1", "JRNLIB")),
        Err(ChainError::Cycle { .. })
    ));
}

#[test]
fn last_joined_with_every_receiver_joined_is_the_sorted_listing() {
    for listing in permutations(&three_linked()) {
        assert_eq!(names(&last_joined(&listing).unwrap()), vec!["R1", "R2", "R3"]);
    }
}

#[test]
fn last_joined_starts_after_the_last_gap() {
    let all = vec![
        receiver("R1", 1, JournalStatus::OnlineSavedDetached, Some("R2")),
        receiver("R2", 2, JournalStatus::SavedDetachedFreed, Some("R3")),
        receiver("R3", 3, JournalStatus::OnlineSavedDetached, Some("R4")),
        receiver("R4", 4, JournalStatus::Attached, None),
    ];
    for listing in permutations(&all) {
        assert_eq!(names(&last_joined(&listing).unwrap()), vec!["R3", "R4"]);
    }
}

#[test]
fn last_joined_without_usable_receivers_fails() {
    assert_eq!(last_joined(&[]), Err(ChainError::NoUsableReceivers));

    let all = vec![
        receiver("R1", 1, JournalStatus::OnlineSavedDetached, None),
        receiver("R2", 2, JournalStatus::Partial, None),
    ];
    assert_eq!(last_joined(&all), Err(ChainError::NoUsableReceivers));
}
