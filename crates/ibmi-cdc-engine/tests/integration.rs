use ibmi_cdc_engine::{
    CancellationToken, ChangeEvent, CheckpointFile, EngineError, EngineOptions, EngineState,
    EntrySink, FileFilter, Heartbeat, HostConnection, HostError, IncludeFilter, PollOutcome,
    RetrievalEngine, SinkError, Watchdog,
};
use ibmi_cdc_journal::testing::{BufferBuilder, EntrySpec};
use ibmi_cdc_journal::{Ccsid, JournalEntryType, RetrievalRequest};
use ibmi_cdc_model::{
    BigUint, DetailedJournalReceiver, JournalId, JournalPosition, JournalProcessedPosition,
    JournalReceiver, JournalReceiverInfo, JournalStatus,
};
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::VecDeque;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn rcv(name: &str) -> JournalReceiver {
    JournalReceiver::new(name, "JRNLIB")
}

fn journal() -> JournalId {
    JournalId::new("QSQJRN", "APPDATA")
}

fn detail(
    name: &str,
    day: u32,
    status: JournalStatus,
    range: (u32, u32),
    next: Option<&str>,
) -> DetailedJournalReceiver {
    DetailedJournalReceiver {
        info: JournalReceiverInfo {
            receiver: rcv(name),
            attach_time: NaiveDate::from_ymd_opt(2024, 3, day).and_then(|d| d.and_hms_opt(8, 0, 0)),
            status,
            chain_position: None,
        },
        start: BigUint::from(range.0),
        end: BigUint::from(range.1),
        next_receiver: next.map(rcv),
        max_entry_length: 512,
        entry_count: BigUint::from(range.1 - range.0 + 1),
    }
}

fn processed(name: &str, offset: u32) -> JournalProcessedPosition {
    JournalProcessedPosition::processed_at(JournalPosition::new(rcv(name), offset), None)
}

/// Serves queued responses, then `NO_DATA` forever.
struct FakeHost {
    responses: VecDeque<Result<Vec<u8>, HostError>>,
    requests: Vec<RetrievalRequest>,
    receivers: Vec<DetailedJournalReceiver>,
    current: JournalPosition,
}

impl FakeHost {
    fn new(current: &str) -> Self {
        Self {
            responses: VecDeque::new(),
            requests: Vec::new(),
            receivers: Vec::new(),
            current: JournalPosition::new(rcv(current), 0u32),
        }
    }

    fn respond(mut self, builder: BufferBuilder) -> Self {
        self.responses.push_back(Ok(builder.build().unwrap()));
        self
    }

    fn fail(mut self, error: HostError) -> Self {
        self.responses.push_back(Err(error));
        self
    }

    fn with_receivers(mut self, receivers: Vec<DetailedJournalReceiver>) -> Self {
        self.receivers = receivers;
        self
    }
}

impl HostConnection for FakeHost {
    fn retrieve_entries(
        &mut self,
        _journal: &JournalId,
        request: &RetrievalRequest,
    ) -> Result<Vec<u8>, HostError> {
        self.requests.push(request.clone());
        match self.responses.pop_front() {
            Some(response) => response,
            None => Ok(BufferBuilder::new(Ccsid::Ebcdic37).build().unwrap()),
        }
    }

    fn list_receivers(
        &mut self,
        _journal: &JournalId,
    ) -> Result<Vec<DetailedJournalReceiver>, HostError> {
        Ok(self.receivers.clone())
    }

    fn current_position(&mut self, _journal: &JournalId) -> Result<JournalPosition, HostError> {
        Ok(self.current.clone())
    }
}

struct RejectAt {
    sequence: u64,
    accepted: Vec<ChangeEvent>,
}

impl EntrySink for RejectAt {
    fn accept(&mut self, event: &ChangeEvent) -> Result<(), SinkError> {
        if event.sequence_number == self.sequence {
            return Err(SinkError::Rejected {
                sequence: event.sequence_number,
                reason: "constraint violation".to_string(),
            });
        }
        self.accepted.push(event.clone());
        Ok(())
    }
}

fn row(sequence: u64, entry_type: &str, file: &str) -> EntrySpec {
    EntrySpec::row("R", entry_type, sequence, "APPDATA", file)
        .receiver(rcv("RCV0001"))
        .data(format!("row-{}", sequence).as_bytes())
}

/// A row entry without a receiver record (zero receiver displacement).
fn bare(sequence: u64, entry_type: &str, file: &str) -> EntrySpec {
    EntrySpec::row("R", entry_type, sequence, "APPDATA", file)
        .data(format!("row-{}", sequence).as_bytes())
}

fn engine(host: FakeHost, checkpoint: JournalProcessedPosition) -> RetrievalEngine<FakeHost> {
    RetrievalEngine::new(host, journal(), checkpoint, EngineOptions::default())
}

#[test]
fn two_no_data_polls_are_caught_up() {
    let checkpoint = processed("RCV0001", 50);
    let mut engine = engine(FakeHost::new("RCV0001"), checkpoint.clone());
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert_eq!(engine.poll(&mut events).unwrap(), PollOutcome::CaughtUp);
    assert_eq!(engine.poll(&mut events).unwrap(), PollOutcome::CaughtUp);

    assert_eq!(engine.checkpoint(), &checkpoint);
    assert_eq!(engine.state(), EngineState::Exhausted);
    assert!(events.is_empty());
    let requests = &engine.host().requests;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].start, JournalPosition::new(rcv("RCV0001"), 51u32));
}

#[test]
fn pages_follow_the_continuation() {
    let continuation =
        JournalProcessedPosition::unprocessed(JournalPosition::new(rcv("RCV0001"), 3u32));
    let host = FakeHost::new("RCV0001")
        .respond(
            BufferBuilder::new(Ccsid::Ebcdic37)
                .entry(row(1, "PT", "ORDERS"))
                .entry(row(2, "UP", "ORDERS"))
                .continuation(continuation),
        )
        .respond(BufferBuilder::new(Ccsid::Ebcdic37).entry(row(3, "DL", "ORDERS")));
    let mut engine = engine(host, JournalProcessedPosition::start_of_journal());
    let mut events: Vec<ChangeEvent> = Vec::new();

    let outcome = engine.poll(&mut events).unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Advanced {
            entries_emitted: 3,
            entries_skipped: 0,
            more_available: false
        }
    );

    let sequences: Vec<u64> = events.iter().map(|e| e.sequence_number).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(events[0].entry_type, JournalEntryType::AddRow);
    assert_eq!(events[0].row_bytes, b"row-1");
    assert_eq!(events[2].table.as_deref(), Some("APPDATA.ORDERS"));
    assert_eq!(events[2].checkpoint, processed("RCV0001", 3));
    assert_eq!(engine.checkpoint(), &processed("RCV0001", 3));

    let requests = &engine.host().requests;
    assert_eq!(requests.len(), 2);
    assert!(requests[0].start.is_start_of_journal());
    assert_eq!(requests[1].start, JournalPosition::new(rcv("RCV0001"), 3u32));
}

#[test]
fn page_cap_reports_more_available() {
    let continuation =
        JournalProcessedPosition::unprocessed(JournalPosition::new(rcv("RCV0001"), 3u32));
    let host = FakeHost::new("RCV0001").respond(
        BufferBuilder::new(Ccsid::Ebcdic37)
            .entry(row(1, "PT", "ORDERS"))
            .entry(row(2, "PT", "ORDERS"))
            .continuation(continuation.clone()),
    );
    let options = EngineOptions {
        max_pages_per_poll: 1,
        ..EngineOptions::default()
    };
    let mut engine = RetrievalEngine::new(
        host,
        journal(),
        JournalProcessedPosition::start_of_journal(),
        options,
    );
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert_eq!(
        engine.poll(&mut events).unwrap(),
        PollOutcome::Advanced {
            entries_emitted: 2,
            entries_skipped: 0,
            more_available: true
        }
    );
    assert_eq!(engine.checkpoint(), &continuation);
    assert_eq!(engine.host().requests.len(), 1);
}

#[test]
fn include_list_filters_tables_but_not_control_entries() {
    let host = FakeHost::new("RCV0001").respond(
        BufferBuilder::new(Ccsid::Ebcdic37)
            .entry(row(10, "PT", "ORDERS"))
            .entry(row(11, "PT", "USERS"))
            .entry(EntrySpec::control("F", "MM", 12).receiver(rcv("RCV0001")))
            .entry(EntrySpec::control("C", "CM", 13).receiver(rcv("RCV0001"))),
    );
    let mut engine = engine(host, processed("RCV0001", 9))
        .with_include(IncludeFilter::new(vec![FileFilter::new("APPDATA", "ORDERS")]));
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert_eq!(
        engine.poll(&mut events).unwrap(),
        PollOutcome::Advanced {
            entries_emitted: 2,
            entries_skipped: 2,
            more_available: false
        }
    );
    let types: Vec<_> = events.iter().map(|e| e.entry_type).collect();
    assert_eq!(types, vec![JournalEntryType::AddRow, JournalEntryType::Commit]);
    // Skipped entries still move the checkpoint.
    assert_eq!(engine.checkpoint(), &processed("RCV0001", 13));

    let request = &engine.host().requests[0];
    assert_eq!(request.files.len(), 1);
    assert_eq!(request.files[0].file, "ORDERS");
    assert_eq!(request.start, JournalPosition::new(rcv("RCV0001"), 10u32));
}

#[test]
fn position_unavailable_is_a_lost_journal() {
    let checkpoint = processed("RCV0001", 77);
    let host = FakeHost::new("RCV0004").fail(HostError::PositionUnavailable {
        position: JournalPosition::new(rcv("RCV0001"), 78u32),
        reason: "CPF7062".to_string(),
    });
    let mut engine = engine(host, checkpoint.clone());
    let mut events: Vec<ChangeEvent> = Vec::new();

    let PollOutcome::LostJournal(report) = engine.poll(&mut events).unwrap() else {
        panic!("expected a lost journal");
    };
    assert_eq!(report.checkpoint, checkpoint);
    assert_eq!(report.attached, Some(rcv("RCV0004")));
    assert!(report.diverged);
    assert!(report.reason.contains("CPF7062"));
    assert!(engine.checkpoint().is_start_of_journal());
    assert_eq!(engine.state(), EngineState::LostJournal);

    assert!(matches!(engine.poll(&mut events), Err(EngineError::ResyncRequired)));
    assert_eq!(engine.host().requests.len(), 1);

    engine.acknowledge_resync();
    assert_eq!(engine.poll(&mut events).unwrap(), PollOutcome::CaughtUp);
    assert!(engine.host().requests[1].start.is_start_of_journal());
}

#[test]
fn missing_receiver_is_a_lost_journal() {
    let checkpoint = processed("RCV0001", 120);
    let host = FakeHost::new("RCV0003").with_receivers(vec![
        detail("RCV0001", 1, JournalStatus::SavedDetachedFreed, (100, 199), Some("RCV0002")),
        detail("RCV0002", 2, JournalStatus::OnlineSavedDetached, (200, 299), Some("RCV0003")),
        detail("RCV0003", 3, JournalStatus::Attached, (300, 350), None),
    ]);
    let mut engine = engine(host, checkpoint.clone());
    let mut events: Vec<ChangeEvent> = Vec::new();

    let PollOutcome::LostJournal(report) = engine.poll(&mut events).unwrap() else {
        panic!("expected a lost journal");
    };
    assert_eq!(report.checkpoint, checkpoint);
    assert_eq!(report.attached, Some(rcv("RCV0003")));
    assert!(report.diverged);
    assert!(engine.checkpoint().is_start_of_journal());
}

#[test]
fn drained_receiver_rolls_to_its_successor() {
    let receivers = vec![
        detail("RCV0002", 2, JournalStatus::Attached, (200, 250), None),
        detail("RCV0001", 1, JournalStatus::OnlineSavedDetached, (100, 199), Some("RCV0002")),
    ];
    let host = FakeHost::new("RCV0002").with_receivers(receivers);
    let mut engine = engine(host, processed("RCV0001", 199));
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert_eq!(
        engine.poll(&mut events).unwrap(),
        PollOutcome::Rolled {
            from: rcv("RCV0001"),
            to: rcv("RCV0002")
        }
    );
    assert_eq!(
        engine.checkpoint(),
        &JournalProcessedPosition::unprocessed(JournalPosition::new(rcv("RCV0002"), 200u32))
    );

    assert_eq!(engine.poll(&mut events).unwrap(), PollOutcome::CaughtUp);
    let requests = &engine.host().requests;
    assert_eq!(requests[1].start, JournalPosition::new(rcv("RCV0002"), 200u32));
}

#[test]
fn undrained_receiver_does_not_roll() {
    let receivers = vec![
        detail("RCV0001", 1, JournalStatus::OnlineSavedDetached, (100, 199), Some("RCV0002")),
        detail("RCV0002", 2, JournalStatus::Attached, (200, 250), None),
    ];
    let host = FakeHost::new("RCV0002").with_receivers(receivers);
    let checkpoint = processed("RCV0001", 150);
    let mut engine = engine(host, checkpoint.clone());
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert_eq!(engine.poll(&mut events).unwrap(), PollOutcome::CaughtUp);
    assert_eq!(engine.checkpoint(), &checkpoint);
}

#[test]
fn rejected_entry_keeps_the_checkpoint_before_it() {
    let host = FakeHost::new("RCV0001").respond(
        BufferBuilder::new(Ccsid::Ebcdic37)
            .entry(row(1, "PT", "ORDERS"))
            .entry(row(2, "PT", "ORDERS"))
            .entry(row(3, "PT", "ORDERS")),
    );
    let mut engine = engine(host, JournalProcessedPosition::start_of_journal());
    let mut sink = RejectAt {
        sequence: 2,
        accepted: Vec::new(),
    };

    assert!(matches!(
        engine.poll(&mut sink),
        Err(EngineError::Sink(SinkError::Rejected { sequence: 2, .. }))
    ));
    assert_eq!(sink.accepted.len(), 1);
    assert_eq!(engine.checkpoint(), &processed("RCV0001", 1));
}

#[test]
fn cancelled_token_stops_before_calling_the_host() {
    let token = CancellationToken::new();
    token.cancel();
    let mut engine = engine(FakeHost::new("RCV0001"), processed("RCV0001", 5))
        .with_cancellation(token.clone(), Heartbeat::new());
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert!(matches!(engine.poll(&mut events), Err(EngineError::Cancelled)));
    assert!(engine.host().requests.is_empty());
    assert_eq!(engine.checkpoint(), &processed("RCV0001", 5));

    token.reset();
    assert_eq!(engine.poll(&mut events).unwrap(), PollOutcome::CaughtUp);
}

#[test]
fn healthy_poll_under_a_watchdog() {
    let watchdog = Watchdog::spawn(Duration::from_secs(30)).unwrap();
    let host = FakeHost::new("RCV0001")
        .respond(BufferBuilder::new(Ccsid::Ebcdic37).entry(row(1, "PT", "ORDERS")));
    let mut engine = engine(host, JournalProcessedPosition::start_of_journal())
        .with_watchdog(&watchdog);
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert!(matches!(
        engine.poll(&mut events).unwrap(),
        PollOutcome::Advanced { entries_emitted: 1, .. }
    ));
    assert!(!watchdog.token().is_cancelled());
    watchdog.stop();
}

#[test]
fn malformed_buffer_is_dumped() {
    let dir = TempDir::new().unwrap();
    let dumps = dir.path().join("dumps");
    let mut host = FakeHost::new("RCV0001");
    host.responses.push_back(Ok(vec![0xC1; 10]));
    let options = EngineOptions {
        dump_folder: Some(dumps.clone()),
        ..EngineOptions::default()
    };
    let checkpoint = processed("RCV0001", 5);
    let mut engine = RetrievalEngine::new(host, journal(), checkpoint.clone(), options);
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert!(matches!(engine.poll(&mut events), Err(EngineError::Decode(_))));
    assert_eq!(engine.checkpoint(), &checkpoint);

    let mut names: Vec<String> = fs::read_dir(&dumps)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with("retrieve-") && names[0].ends_with(".bin"));
    assert!(names[1].ends_with(".txt"));
}

#[test]
fn poll_and_persist_writes_the_checkpoint() {
    let dir = TempDir::new().unwrap();
    let file = CheckpointFile::new(dir.path().join("orders.json"));
    let host = FakeHost::new("RCV0001").respond(
        BufferBuilder::new(Ccsid::Ebcdic37)
            .entry(row(7, "PT", "ORDERS"))
            .entry(row(8, "DL", "ORDERS")),
    );
    let mut engine = engine(host, file.load_or_start().unwrap());
    let mut events: Vec<ChangeEvent> = Vec::new();

    engine.poll_and_persist(&mut events, &file).unwrap();
    assert_eq!(file.load().unwrap(), Some(processed("RCV0001", 8)));
}

#[test]
fn entries_without_receiver_records_resolve_from_the_listing() {
    let host = FakeHost::new("RCV0001")
        .with_receivers(vec![detail("RCV0001", 1, JournalStatus::Attached, (1, 100), None)])
        .respond(
            BufferBuilder::new(Ccsid::Ebcdic37)
                .entry(bare(1, "PT", "ORDERS"))
                .entry(bare(2, "PT", "ORDERS")),
        );
    let mut engine = engine(host, JournalProcessedPosition::start_of_journal());
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert!(matches!(
        engine.poll(&mut events).unwrap(),
        PollOutcome::Advanced { entries_emitted: 2, .. }
    ));
    assert_eq!(engine.checkpoint(), &processed("RCV0001", 2));
    assert!(!engine.checkpoint().is_start_of_journal());

    assert_eq!(engine.poll(&mut events).unwrap(), PollOutcome::CaughtUp);
    assert_eq!(engine.poll(&mut events).unwrap(), PollOutcome::CaughtUp);

    let sequences: Vec<u64> = events.iter().map(|e| e.sequence_number).collect();
    assert_eq!(sequences, vec![1, 2]);
    let requests = &engine.host().requests;
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].start, JournalPosition::new(rcv("RCV0001"), 3u32));
    assert_eq!(requests[2].start, JournalPosition::new(rcv("RCV0001"), 3u32));
}

#[test]
fn successor_entries_without_receiver_records_are_not_replayed() {
    let host = FakeHost::new("RCV0002")
        .with_receivers(vec![
            detail("RCV0001", 1, JournalStatus::OnlineSavedDetached, (100, 199), Some("RCV0002")),
            detail("RCV0002", 2, JournalStatus::Attached, (200, 250), None),
        ])
        .respond(
            BufferBuilder::new(Ccsid::Ebcdic37)
                .entry(bare(199, "PT", "ORDERS"))
                .entry(bare(200, "UP", "ORDERS"))
                .entry(bare(201, "DL", "ORDERS")),
        );
    let mut engine = engine(host, processed("RCV0001", 198));
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert!(matches!(
        engine.poll(&mut events).unwrap(),
        PollOutcome::Advanced { entries_emitted: 3, .. }
    ));
    assert_eq!(events[0].checkpoint, processed("RCV0001", 199));
    assert_eq!(events[1].checkpoint, processed("RCV0002", 200));
    assert_eq!(engine.checkpoint(), &processed("RCV0002", 201));

    assert_eq!(engine.poll(&mut events).unwrap(), PollOutcome::CaughtUp);
    assert_eq!(engine.poll(&mut events).unwrap(), PollOutcome::CaughtUp);

    let sequences: Vec<u64> = events.iter().map(|e| e.sequence_number).collect();
    assert_eq!(sequences, vec![199, 200, 201]);
    assert_eq!(
        engine.host().requests[1].start,
        JournalPosition::new(rcv("RCV0002"), 202u32)
    );
}

#[test]
fn rollover_keeps_an_offset_already_inside_the_successor() {
    let host = FakeHost::new("RCV0002").with_receivers(vec![
        detail("RCV0001", 1, JournalStatus::OnlineSavedDetached, (100, 199), Some("RCV0002")),
        detail("RCV0002", 2, JournalStatus::Attached, (200, 250), None),
    ]);
    let mut engine = engine(host, processed("RCV0001", 201));
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert_eq!(
        engine.poll(&mut events).unwrap(),
        PollOutcome::Rolled {
            from: rcv("RCV0001"),
            to: rcv("RCV0002")
        }
    );
    assert_eq!(engine.checkpoint(), &processed("RCV0002", 201));

    assert_eq!(engine.poll(&mut events).unwrap(), PollOutcome::CaughtUp);
    assert_eq!(
        engine.host().requests[1].start,
        JournalPosition::new(rcv("RCV0002"), 202u32)
    );
    assert!(events.is_empty());
}

#[test]
fn unlisted_sequence_without_receiver_record_fails() {
    let host = FakeHost::new("RCV0001")
        .respond(BufferBuilder::new(Ccsid::Ebcdic37).entry(bare(5, "PT", "ORDERS")));
    let mut engine = engine(host, JournalProcessedPosition::start_of_journal());
    let mut events: Vec<ChangeEvent> = Vec::new();

    assert!(matches!(
        engine.poll(&mut events),
        Err(EngineError::UnresolvedReceiver { sequence: 5 })
    ));
    assert!(events.is_empty());
    assert!(engine.checkpoint().is_start_of_journal());
}

#[test]
fn entry_without_timestamp_keeps_the_last_processed_time() {
    let stamped = Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap();
    let host = FakeHost::new("RCV0001").respond(
        BufferBuilder::new(Ccsid::Ebcdic37)
            .entry(row(1, "PT", "ORDERS").timestamp(stamped))
            .entry(row(2, "PT", "ORDERS")),
    );
    let mut engine = engine(host, JournalProcessedPosition::start_of_journal());
    let mut events: Vec<ChangeEvent> = Vec::new();

    engine.poll(&mut events).unwrap();
    assert_eq!(events[0].timestamp, Some(stamped));
    assert_eq!(events[1].timestamp, None);
    assert_eq!(engine.checkpoint().last_processed_time, Some(stamped));
    assert_eq!(engine.checkpoint().offset(), &BigUint::from(2u32));
}
