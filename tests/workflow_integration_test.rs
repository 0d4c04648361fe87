use anyhow::Result;
use async_trait::async_trait;
use circuit_portal::{
    AddressList, ChannelNotifier, CircuitRecord, CircuitRepository, Field, FieldKey,
    InMemoryCircuitRepository, IpMode, NotificationKind, RepositoryError, WorkflowController,
    WorkflowError, WorkflowState,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// 包裝記憶體 Repository，save 會停在閘門前直到測試放行
struct GatedRepository {
    inner: InMemoryCircuitRepository,
    gate: Notify,
    save_calls: AtomicUsize,
}

impl GatedRepository {
    fn new() -> Self {
        Self {
            inner: InMemoryCircuitRepository::demo(),
            gate: Notify::new(),
            save_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CircuitRepository for GatedRepository {
    async fn find(&self, id: &str) -> Result<Option<CircuitRecord>, RepositoryError> {
        self.inner.find(id).await
    }

    async fn save(&self, record: CircuitRecord) -> Result<CircuitRecord, RepositoryError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        self.inner.save(record).await
    }
}

/// find 停在閘門前直到測試放行
struct GatedFindRepository {
    inner: InMemoryCircuitRepository,
    gate: Notify,
    find_calls: AtomicUsize,
}

impl GatedFindRepository {
    fn new() -> Self {
        Self {
            inner: InMemoryCircuitRepository::demo(),
            gate: Notify::new(),
            find_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CircuitRepository for GatedFindRepository {
    async fn find(&self, id: &str) -> Result<Option<CircuitRecord>, RepositoryError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        self.inner.find(id).await
    }

    async fn save(&self, record: CircuitRecord) -> Result<CircuitRecord, RepositoryError> {
        self.inner.save(record).await
    }
}

/// save 可切換為失敗
struct FlakyRepository {
    inner: InMemoryCircuitRepository,
    fail_saves: AtomicBool,
    fail_finds: AtomicBool,
}

impl FlakyRepository {
    fn new() -> Self {
        Self {
            inner: InMemoryCircuitRepository::demo(),
            fail_saves: AtomicBool::new(false),
            fail_finds: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CircuitRepository for FlakyRepository {
    async fn find(&self, id: &str) -> Result<Option<CircuitRecord>, RepositoryError> {
        if self.fail_finds.load(Ordering::SeqCst) {
            return Err(RepositoryError::backend("connection reset"));
        }
        self.inner.find(id).await
    }

    async fn save(&self, record: CircuitRecord) -> Result<CircuitRecord, RepositoryError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepositoryError::backend("database unavailable"));
        }
        self.inner.save(record).await
    }
}

async fn wait_for_state<R: CircuitRepository, N: circuit_portal::NotificationSink>(
    controller: &WorkflowController<R, N>,
    expected: WorkflowState,
) {
    for _ in 0..200 {
        if controller.state().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("controller never reached {}", expected);
}

#[tokio::test]
async fn test_search_hit_and_miss() -> Result<()> {
    let (notifier, mut notifications) = ChannelNotifier::channel();
    let controller = WorkflowController::new(InMemoryCircuitRepository::demo(), notifier);

    let record = controller.search("svc001").await?;
    assert_eq!(record.service_number, "SVC001");
    assert_eq!(controller.state().await, WorkflowState::Viewing);

    let hit = notifications.recv().await.unwrap();
    assert_eq!(hit.kind, NotificationKind::Success);
    assert_eq!(hit.title, "Circuit Found");
    assert_eq!(hit.message, "Circuit details loaded for Acme Corporation");

    controller.back_to_search().await?;
    let err = controller.search("svc999").await.unwrap_err();
    assert_eq!(
        err,
        WorkflowError::NotFound {
            query: "svc999".to_string()
        }
    );
    assert_eq!(controller.state().await, WorkflowState::Idle);
    assert!(controller.committed().await.is_none());

    let miss = notifications.recv().await.unwrap();
    assert_eq!(miss.kind, NotificationKind::Error);
    assert_eq!(miss.message, "No circuit found with service number: svc999");
    Ok(())
}

#[tokio::test]
async fn test_edit_commit_replaces_record_and_persists() -> Result<()> {
    let (notifier, mut notifications) = ChannelNotifier::channel();
    let controller = WorkflowController::new(InMemoryCircuitRepository::demo(), notifier);

    let original = controller.search("SVC002").await?;
    controller.begin_edit().await?;
    controller.update_draft(Field::Bandwidth, "1 Gbps").await?;
    controller.update_draft(Field::Vlan, "250").await?;

    let saved = controller.commit().await?;

    assert_eq!(controller.state().await, WorkflowState::Viewing);
    assert_eq!(saved.bandwidth, "1 Gbps");
    assert_eq!(saved.vlan, "250");
    assert_ne!(saved.last_updated, original.last_updated);
    assert_eq!(controller.committed().await, Some(saved.clone()));
    assert!(controller.draft().await.is_none());

    // 讀後寫一致
    let reread = controller.repository().find("svc002").await?.unwrap();
    assert_eq!(reread, saved);

    notifications.recv().await.unwrap();
    let updated = notifications.recv().await.unwrap();
    assert_eq!(updated.title, "Circuit Updated");
    Ok(())
}

#[tokio::test]
async fn test_cancel_edit_keeps_committed_record() -> Result<()> {
    let (notifier, _notifications) = ChannelNotifier::channel();
    let controller = WorkflowController::new(InMemoryCircuitRepository::demo(), notifier);

    let original = controller.search("SVC003").await?;
    controller.begin_edit().await?;
    controller.update_draft(Field::Location, "Detroit, MI").await?;
    controller.cancel().await?;

    assert_eq!(controller.state().await, WorkflowState::Viewing);
    assert_eq!(controller.committed().await, Some(original.clone()));
    assert_eq!(
        controller.repository().find("SVC003").await?.unwrap(),
        original
    );
    Ok(())
}

#[tokio::test]
async fn test_failed_save_leaves_committed_record_untouched() -> Result<()> {
    let (notifier, mut notifications) = ChannelNotifier::channel();
    let controller = WorkflowController::new(FlakyRepository::new(), notifier);

    let original = controller.search("SVC001").await?;
    controller.begin_edit().await?;
    controller.update_draft(Field::ClientName, "Acme Holdings").await?;
    controller.repository().fail_saves.store(true, Ordering::SeqCst);

    let err = controller.commit().await.unwrap_err();

    assert!(matches!(err, WorkflowError::Repository(RepositoryError::Backend { .. })));
    assert_eq!(controller.state().await, WorkflowState::Editing);
    assert_eq!(controller.committed().await, Some(original));
    // 草稿保留以便重試
    assert_eq!(
        controller.draft().await.unwrap().record().client_name,
        "Acme Holdings"
    );

    notifications.recv().await.unwrap();
    let failure = notifications.recv().await.unwrap();
    assert_eq!(failure.kind, NotificationKind::Error);
    assert_eq!(failure.message, "Save failed: repository backend failure: database unavailable");

    controller.repository().fail_saves.store(false, Ordering::SeqCst);
    let saved = controller.commit().await?;
    assert_eq!(saved.client_name, "Acme Holdings");
    assert_eq!(controller.state().await, WorkflowState::Viewing);
    Ok(())
}

#[tokio::test]
async fn test_failed_search_returns_to_prior_state() -> Result<()> {
    let (notifier, _notifications) = ChannelNotifier::channel();
    let controller = WorkflowController::new(FlakyRepository::new(), notifier);

    let viewing = controller.search("SVC001").await?;
    controller.repository().fail_finds.store(true, Ordering::SeqCst);

    let err = controller.search("SVC002").await.unwrap_err();

    assert!(matches!(err, WorkflowError::Repository(_)));
    assert_eq!(controller.state().await, WorkflowState::Viewing);
    assert_eq!(controller.committed().await, Some(viewing));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_commit_is_rejected_while_saving() -> Result<()> {
    let (notifier, _notifications) = ChannelNotifier::channel();
    let controller = Arc::new(WorkflowController::new(GatedRepository::new(), notifier));

    controller.search("SVC001").await?;
    controller.begin_edit().await?;
    controller.update_draft(Field::PortId, "PORT-99").await?;

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.commit().await })
    };
    wait_for_state(&controller, WorkflowState::Saving).await;

    let second = controller.commit().await.unwrap_err();
    assert_eq!(
        second,
        WorkflowError::Busy {
            state: WorkflowState::Saving
        }
    );
    // 鎖定期間其他操作同樣被拒絕
    assert!(matches!(
        controller.update_draft(Field::PortId, "PORT-00").await,
        Err(WorkflowError::Busy { .. })
    ));
    assert!(matches!(
        controller.search("SVC002").await,
        Err(WorkflowError::Busy { .. })
    ));

    controller.repository().gate.notify_one();
    let saved = first.await??;

    assert_eq!(saved.port_id, "PORT-99");
    assert_eq!(controller.repository().save_calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.state().await, WorkflowState::Viewing);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_search_is_rejected_while_searching() -> Result<()> {
    let (notifier, _notifications) = ChannelNotifier::channel();
    let controller = Arc::new(WorkflowController::new(GatedFindRepository::new(), notifier));

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.search("SVC001").await })
    };
    wait_for_state(&controller, WorkflowState::Searching).await;

    let busy = WorkflowError::Busy {
        state: WorkflowState::Searching,
    };
    assert_eq!(controller.search("SVC002").await.unwrap_err(), busy);
    assert_eq!(controller.begin_registration().await.unwrap_err(), busy);
    assert_eq!(controller.back_to_search().await.unwrap_err(), busy);
    assert_eq!(controller.state().await, WorkflowState::Searching);

    controller.repository().gate.notify_one();
    let found = first.await??;

    assert_eq!(found.service_number, "SVC001");
    assert_eq!(controller.repository().find_calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.state().await, WorkflowState::Viewing);
    Ok(())
}

#[tokio::test]
async fn test_register_both_mode_projects_client_ip() -> Result<()> {
    let (notifier, mut notifications) = ChannelNotifier::channel();
    let controller = WorkflowController::new(InMemoryCircuitRepository::demo(), notifier);

    controller.begin_registration().await?;
    controller.select_ip_mode(IpMode::Both).await?;
    controller.set_address(AddressList::Lan, 0, "10.0.0.1").await?;
    let second = controller.add_address(AddressList::Lan).await?;
    controller.set_address(AddressList::Lan, second, "10.0.0.2").await?;
    controller.set_address(AddressList::Wan, 0, "203.0.113.5").await?;
    for (field, value) in [
        (Field::CircuitId, "CIR-004-BOS"),
        (Field::ClientName, "Beacon Labs"),
        (Field::Gateway, "10.0.0.254"),
        (Field::Vlan, "400"),
        (Field::Bandwidth, "250 Mbps"),
        (Field::Location, "Boston, MA"),
        (Field::MuxId, "MUX-BOS-001"),
        (Field::PortId, "PORT-01"),
    ] {
        controller.update_draft(field, value).await?;
    }

    let saved = controller.commit().await?;

    assert_eq!(saved.client_ip, "LAN: 10.0.0.1, 10.0.0.2, WAN: 203.0.113.5");
    assert!(saved.service_number.starts_with("SVC-"));
    assert_eq!(saved.subnet, "255.255.255.0");
    assert_eq!(saved.dns, "8.8.8.8, 8.8.4.4");
    assert!(saved.last_updated.is_some());
    assert_eq!(controller.state().await, WorkflowState::Viewing);
    assert_eq!(controller.committed().await, Some(saved.clone()));

    let found = controller.repository().find(&saved.service_number).await?;
    assert_eq!(found, Some(saved));

    let done = notifications.recv().await.unwrap();
    assert_eq!(done.title, "Registration Complete");
    assert_eq!(done.message, "New circuit registered for Beacon Labs");
    Ok(())
}

#[tokio::test]
async fn test_register_validation_reports_each_bad_entry() -> Result<()> {
    let (notifier, mut notifications) = ChannelNotifier::channel();
    let controller = WorkflowController::new(InMemoryCircuitRepository::demo(), notifier);

    controller.begin_registration().await?;
    controller.select_ip_mode(IpMode::Lan).await?;
    controller.set_address(AddressList::Lan, 0, "10.0.0").await?;
    controller.add_address(AddressList::Lan).await?;
    controller.add_address(AddressList::Lan).await?;
    controller.set_address(AddressList::Lan, 1, "10.0.0.9").await?;

    let err = controller.commit().await.unwrap_err();
    let errors = match err {
        WorkflowError::Validation(errors) => errors,
        other => panic!("unexpected error: {:?}", other),
    };

    assert!(errors.contains(&FieldKey::Indexed(AddressList::Lan, 0)));
    assert!(!errors.contains(&FieldKey::Indexed(AddressList::Lan, 1)));
    assert!(errors.contains(&FieldKey::Indexed(AddressList::Lan, 2)));
    assert!(errors.field(Field::ClientIp).is_none());
    assert!(errors.field(Field::CircuitId).is_some());
    assert_eq!(controller.state().await, WorkflowState::Registering);
    assert_eq!(controller.repository().len().await, 3);

    let note = notifications.recv().await.unwrap();
    assert_eq!(note.title, "Validation Error");
    Ok(())
}

#[tokio::test]
async fn test_cancel_registration_returns_to_viewing() -> Result<()> {
    let (notifier, _notifications) = ChannelNotifier::channel();
    let controller = WorkflowController::new(InMemoryCircuitRepository::demo(), notifier);

    let viewing = controller.search("SVC001").await?;
    controller.begin_registration().await?;
    controller.update_draft(Field::ClientName, "Scratch").await?;
    controller.cancel().await?;

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.state, WorkflowState::Viewing);
    assert_eq!(snapshot.committed, Some(viewing));
    assert!(snapshot.draft.is_none());
    assert!(snapshot.errors.is_empty());
    assert_eq!(controller.repository().len().await, 3);
    Ok(())
}
