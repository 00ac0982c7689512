use chrono::NaiveDate;
use ibmi_cdc_model::{
    BigUint, DetailedJournalReceiver, JournalPosition, JournalProcessedPosition, JournalReceiver,
    JournalReceiverInfo, JournalStatus,
};
use serde_json::json;

#[test]
fn pending_checkpoint_serializes_to_golden_json() {
    let checkpoint = JournalProcessedPosition::unprocessed(JournalPosition::new(
        JournalReceiver::new("RCV0001", "JRNLIB"),
        1234u32,
    ));

    assert_eq!(
        serde_json::to_string(&checkpoint).unwrap(),
        r#"{"receiver":{"name":"RCV0001","library":"JRNLIB"},"offset":"1234","last_processed_time":null,"processed":false}"#
    );
}

#[test]
fn checkpoint_offset_survives_beyond_u64() {
    let huge = "98765432109876543210987654321";
    let value = json!({
        "receiver": { "name": "RCV0002", "library": "JRNLIB" },
        "offset": huge,
        "last_processed_time": "2024-01-02T03:04:05Z",
        "processed": true
    });

    let checkpoint: JournalProcessedPosition = serde_json::from_value(value).unwrap();
    assert_eq!(checkpoint.offset().to_str_radix(10), huge);
    assert!(checkpoint.processed);
    assert!(checkpoint.last_processed_time.is_some());

    let back = serde_json::to_value(&checkpoint).unwrap();
    assert_eq!(back["offset"], huge);
    assert_eq!(back["receiver"]["name"], "RCV0002");
}

#[test]
fn checkpoint_rejects_numeric_offset() {
    let value = json!({
        "receiver": { "name": "RCV0002", "library": "JRNLIB" },
        "offset": "12x",
        "last_processed_time": null,
        "processed": false
    });
    assert!(serde_json::from_value::<JournalProcessedPosition>(value).is_err());
}

#[test]
fn detailed_receiver_matches_expected_shape() {
    let receiver = DetailedJournalReceiver {
        info: JournalReceiverInfo {
            receiver: JournalReceiver::new("RCV0001", "JRNLIB"),
            attach_time: Some(
                NaiveDate::from_ymd_opt(2024, 1, 2)
                    .unwrap()
                    .and_hms_opt(3, 4, 5)
                    .unwrap(),
            ),
            status: JournalStatus::OnlineSavedDetached,
            chain_position: Some(1),
        },
        start: BigUint::from(1u32),
        end: BigUint::from(500u32),
        next_receiver: Some(JournalReceiver::new("RCV0002", "JRNLIB")),
        max_entry_length: 512,
        entry_count: BigUint::from(500u32),
    };

    let value = serde_json::to_value(&receiver).unwrap();
    assert_eq!(value["info"]["status"], "OnlineSavedDetached");
    assert_eq!(value["info"]["attach_time"], "2024-01-02T03:04:05");
    assert_eq!(value["start"], "1");
    assert_eq!(value["end"], "500");
    assert_eq!(value["next_receiver"]["name"], "RCV0002");

    let back: DetailedJournalReceiver = serde_json::from_value(value).unwrap();
    assert_eq!(back, receiver);
}
