//! 查詢 / 檢視 / 編輯 / 註冊 的工作流程狀態機。
//!
//! 控制器持有已提交的紀錄與草稿；草稿只在 `Editing` / `Registering` 可見，
//! 已提交紀錄只會在成功提交後整筆替換。`Searching` 與 `Saving` 為鎖定狀態，
//! 期間的重複查詢或提交會被直接拒絕，不排隊。

use crate::core::validator::{project_client_ip, validate};
use crate::domain::model::{
    AddressList, CircuitRecord, ErrorMap, Field, IpAddressConfig, IpMode, Notification,
};
use crate::domain::ports::{CircuitRepository, NotificationSink};
use crate::utils::error::{RepositoryError, WorkflowError};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Searching,
    Viewing,
    Editing,
    Registering,
    Saving,
}

impl WorkflowState {
    /// 有操作進行中，介面應停用重新送出
    pub fn is_locked(self) -> bool {
        matches!(self, WorkflowState::Searching | WorkflowState::Saving)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Searching => "searching",
            WorkflowState::Viewing => "viewing",
            WorkflowState::Editing => "editing",
            WorkflowState::Registering => "registering",
            WorkflowState::Saving => "saving",
        };
        f.write_str(name)
    }
}

/// 尚未提交的工作副本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Draft {
    Edit {
        record: CircuitRecord,
    },
    Registration {
        record: CircuitRecord,
        ip_config: IpAddressConfig,
    },
}

impl Draft {
    pub fn record(&self) -> &CircuitRecord {
        match self {
            Draft::Edit { record } | Draft::Registration { record, .. } => record,
        }
    }

    fn record_mut(&mut self) -> &mut CircuitRecord {
        match self {
            Draft::Edit { record } | Draft::Registration { record, .. } => record,
        }
    }

    pub fn ip_config(&self) -> Option<&IpAddressConfig> {
        match self {
            Draft::Edit { .. } => None,
            Draft::Registration { ip_config, .. } => Some(ip_config),
        }
    }

    fn is_registration(&self) -> bool {
        matches!(self, Draft::Registration { .. })
    }

    /// 驗證通過後實際交給 Repository 的紀錄
    fn to_commit_record(&self) -> CircuitRecord {
        match self {
            Draft::Edit { record } => record.clone(),
            Draft::Registration { record, ip_config } => {
                let mut record = record.clone();
                record.client_ip = project_client_ip(&record, ip_config);
                // 服務編號由 Repository 指派
                record.service_number.clear();
                record.last_updated = None;
                record
            }
        }
    }
}

/// 某一時刻的控制器狀態 (供介面層呈現)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSnapshot {
    pub state: WorkflowState,
    pub committed: Option<CircuitRecord>,
    pub draft: Option<Draft>,
    pub errors: ErrorMap,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowSettings {
    /// 每次 find/save 的逾時；`None` 表示交由 Repository 自行處理
    pub repository_timeout: Option<Duration>,
}

struct Session {
    state: WorkflowState,
    committed: Option<CircuitRecord>,
    draft: Option<Draft>,
    errors: ErrorMap,
}

impl Session {
    fn transition(&mut self, next: WorkflowState) {
        tracing::debug!(from = %self.state, to = %next, "workflow transition");
        self.state = next;
    }

    /// 目前狀態必須在 `allowed` 之中；鎖定狀態回報 Busy
    fn ensure(&self, allowed: &[WorkflowState], action: &'static str) -> Result<(), WorkflowError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else if self.state.is_locked() {
            Err(WorkflowError::Busy { state: self.state })
        } else {
            Err(WorkflowError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    /// 沒有進行中的草稿時應回到的狀態
    fn resting_state(&self) -> WorkflowState {
        if self.committed.is_some() {
            WorkflowState::Viewing
        } else {
            WorkflowState::Idle
        }
    }

    fn draft_mut(&mut self) -> Result<&mut Draft, WorkflowError> {
        let state = self.state;
        self.draft.as_mut().ok_or(WorkflowError::InvalidTransition {
            from: state,
            action: "edit draft",
        })
    }

    fn registration_config_mut(&mut self) -> Result<&mut IpAddressConfig, WorkflowError> {
        match self.draft_mut()? {
            Draft::Registration { ip_config, .. } => Ok(ip_config),
            Draft::Edit { .. } => Err(WorkflowError::InvalidTransition {
                from: WorkflowState::Editing,
                action: "change addressing",
            }),
        }
    }
}

pub struct WorkflowController<R: CircuitRepository, N: NotificationSink> {
    repository: R,
    notifier: N,
    settings: WorkflowSettings,
    session: Mutex<Session>,
}

impl<R: CircuitRepository, N: NotificationSink> WorkflowController<R, N> {
    pub fn new(repository: R, notifier: N) -> Self {
        Self::with_settings(repository, notifier, WorkflowSettings::default())
    }

    pub fn with_settings(repository: R, notifier: N, settings: WorkflowSettings) -> Self {
        Self {
            repository,
            notifier,
            settings,
            session: Mutex::new(Session {
                state: WorkflowState::Idle,
                committed: None,
                draft: None,
                errors: ErrorMap::new(),
            }),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn state(&self) -> WorkflowState {
        self.session.lock().await.state
    }

    pub async fn committed(&self) -> Option<CircuitRecord> {
        self.session.lock().await.committed.clone()
    }

    pub async fn draft(&self) -> Option<Draft> {
        self.session.lock().await.draft.clone()
    }

    /// 最近一次驗證的結果
    pub async fn errors(&self) -> ErrorMap {
        self.session.lock().await.errors.clone()
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        let session = self.session.lock().await;
        WorkflowSnapshot {
            state: session.state,
            committed: session.committed.clone(),
            draft: session.draft.clone(),
            errors: session.errors.clone(),
        }
    }

    async fn call_repository<T>(
        &self,
        call: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, RepositoryError> {
        match self.settings.repository_timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .unwrap_or(Err(RepositoryError::Timeout { after })),
            None => call.await,
        }
    }

    fn report_repository_failure(&self, operation: &str, error: &RepositoryError) {
        tracing::warn!("{} failed: {}", operation, error);
        self.notifier
            .notify(Notification::error("Error", format!("{} failed: {}", operation, error)));
    }

    /// 以服務編號查詢 (不分大小寫)。命中後進入 `Viewing`；查無資料回到 `Idle`。
    pub async fn search(&self, query: &str) -> Result<CircuitRecord, WorkflowError> {
        let query = query.trim().to_string();
        {
            let mut session = self.session.lock().await;
            session.ensure(&[WorkflowState::Idle, WorkflowState::Viewing], "search")?;
            if query.is_empty() {
                self.notifier.notify(Notification::error(
                    "Error",
                    "Please enter a service number to search.",
                ));
                return Err(WorkflowError::EmptyQuery);
            }
            session.transition(WorkflowState::Searching);
        }

        tracing::info!("🔍 Searching for circuit {}", query);
        let outcome = self.call_repository(self.repository.find(&query)).await;

        let mut session = self.session.lock().await;
        match outcome {
            Ok(Some(record)) => {
                session.committed = Some(record.clone());
                session.transition(WorkflowState::Viewing);
                self.notifier.notify(Notification::success(
                    "Circuit Found",
                    format!("Circuit details loaded for {}", record.client_name),
                ));
                Ok(record)
            }
            Ok(None) => {
                session.committed = None;
                session.transition(WorkflowState::Idle);
                self.notifier.notify(Notification::error(
                    "Not Found",
                    format!("No circuit found with service number: {}", query),
                ));
                Err(WorkflowError::NotFound { query })
            }
            Err(e) => {
                let prior = session.resting_state();
                session.transition(prior);
                self.report_repository_failure("Search", &e);
                Err(e.into())
            }
        }
    }

    /// 離開檢視畫面回到查詢
    pub async fn back_to_search(&self) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure(&[WorkflowState::Viewing], "go back to search")?;
        session.committed = None;
        session.transition(WorkflowState::Idle);
        Ok(())
    }

    pub async fn begin_edit(&self) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure(&[WorkflowState::Viewing], "edit")?;
        let record = session.committed.clone().ok_or(WorkflowError::InvalidTransition {
            from: session.state,
            action: "edit",
        })?;
        session.draft = Some(Draft::Edit { record });
        session.errors = ErrorMap::new();
        session.transition(WorkflowState::Editing);
        Ok(())
    }

    pub async fn begin_registration(&self) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure(&[WorkflowState::Idle, WorkflowState::Viewing], "register")?;
        session.draft = Some(Draft::Registration {
            record: CircuitRecord::registration_defaults(),
            ip_config: IpAddressConfig::default(),
        });
        session.errors = ErrorMap::new();
        session.transition(WorkflowState::Registering);
        Ok(())
    }

    pub async fn update_draft(
        &self,
        field: Field,
        value: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure(
            &[WorkflowState::Editing, WorkflowState::Registering],
            "edit draft",
        )?;
        if field.is_read_only() {
            return Err(WorkflowError::ReadOnlyField(field));
        }
        session.draft_mut()?.record_mut().set(field, value);
        Ok(())
    }

    /// 切換定址模式：清單重設，並丟棄與定址相關的錯誤
    pub async fn select_ip_mode(&self, mode: IpMode) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure(&[WorkflowState::Registering], "change addressing")?;
        session.registration_config_mut()?.select_mode(mode);
        session.errors.discard_addressing();
        Ok(())
    }

    pub async fn set_address(
        &self,
        list: AddressList,
        index: usize,
        value: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure(&[WorkflowState::Registering], "change addressing")?;
        session
            .registration_config_mut()?
            .set_address(list, index, value)
    }

    pub async fn add_address(&self, list: AddressList) -> Result<usize, WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure(&[WorkflowState::Registering], "change addressing")?;
        Ok(session.registration_config_mut()?.add_address(list))
    }

    pub async fn remove_address(&self, list: AddressList, index: usize) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure(&[WorkflowState::Registering], "change addressing")?;
        session.registration_config_mut()?.remove_address(list, index)
    }

    /// 驗證並提交目前草稿。
    ///
    /// 驗證失敗時草稿保留、狀態不變；Repository 失敗時回到提交前的狀態，
    /// 已提交紀錄不受影響。`Saving` 期間的第二次提交直接回傳 `Busy`。
    pub async fn commit(&self) -> Result<CircuitRecord, WorkflowError> {
        let (prior, is_registration, record) = {
            let mut session = self.session.lock().await;
            session.ensure(
                &[WorkflowState::Editing, WorkflowState::Registering],
                "commit",
            )?;
            let prior = session.state;
            let draft = session.draft_mut()?.clone();

            let errors = validate(draft.record(), draft.ip_config());
            session.errors = errors.clone();
            if !errors.is_empty() {
                tracing::warn!("Validation failed for {} field(s)", errors.len());
                self.notifier.notify(Notification::error(
                    "Validation Error",
                    "Please correct the errors in the form before submitting.",
                ));
                return Err(WorkflowError::Validation(errors));
            }

            session.transition(WorkflowState::Saving);
            (prior, draft.is_registration(), draft.to_commit_record())
        };

        let outcome = self.call_repository(self.repository.save(record)).await;

        let mut session = self.session.lock().await;
        match outcome {
            Ok(saved) => {
                session.committed = Some(saved.clone());
                session.draft = None;
                session.errors = ErrorMap::new();
                session.transition(WorkflowState::Viewing);

                let notification = if is_registration {
                    tracing::info!("✅ Registered circuit {}", saved.service_number);
                    Notification::success(
                        "Registration Complete",
                        format!("New circuit registered for {}", saved.client_name),
                    )
                } else {
                    tracing::info!("✅ Updated circuit {}", saved.service_number);
                    Notification::success(
                        "Circuit Updated",
                        "Circuit configuration has been saved successfully.",
                    )
                };
                self.notifier.notify(notification);
                Ok(saved)
            }
            Err(e) => {
                session.transition(prior);
                self.report_repository_failure("Save", &e);
                Err(e.into())
            }
        }
    }

    /// 丟棄草稿，回到先前的 `Viewing` 或 `Idle`
    pub async fn cancel(&self) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure(
            &[WorkflowState::Editing, WorkflowState::Registering],
            "cancel",
        )?;
        session.draft = None;
        session.errors = ErrorMap::new();
        let next = session.resting_state();
        session.transition(next);
        Ok(())
    }
}
