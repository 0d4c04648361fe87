use crate::domain::model::CircuitRecord;
use crate::domain::ports::CircuitRepository;
use crate::utils::error::RepositoryError;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// 查詢時比對的欄位
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKey {
    #[default]
    ServiceNumber,
    CircuitId,
    Either,
}

impl MatchKey {
    fn matches(self, record: &CircuitRecord, needle: &str) -> bool {
        let eq = |value: &str| value.trim().to_lowercase() == needle;
        match self {
            MatchKey::ServiceNumber => eq(&record.service_number),
            MatchKey::CircuitId => eq(&record.circuit_id),
            MatchKey::Either => eq(&record.service_number) || eq(&record.circuit_id),
        }
    }
}

/// 記憶體內的電路資料 (測試與示範用)。
///
/// `save` 直接在原位置替換，因此後續的 `find` 一定看得到最新內容。
#[derive(Debug, Clone, Default)]
pub struct InMemoryCircuitRepository {
    records: Arc<RwLock<Vec<CircuitRecord>>>,
    match_key: MatchKey,
    latency: Option<Duration>,
}

impl InMemoryCircuitRepository {
    pub fn new(records: Vec<CircuitRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
            ..Default::default()
        }
    }

    /// 內建的三筆示範電路
    pub fn demo() -> Self {
        Self::new(demo_circuits())
    }

    pub fn with_match_key(mut self, match_key: MatchKey) -> Self {
        self.match_key = match_key;
        self
    }

    /// 模擬後端延遲
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn records(&self) -> Vec<CircuitRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn mint_service_number(existing: &[CircuitRecord]) -> String {
    loop {
        let hex = Uuid::new_v4().simple().to_string().to_uppercase();
        let candidate = format!("SVC-{}", &hex[..12]);
        if !existing
            .iter()
            .any(|r| r.service_number.eq_ignore_ascii_case(&candidate))
        {
            return candidate;
        }
    }
}

fn commit_timestamp() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

#[async_trait]
impl CircuitRepository for InMemoryCircuitRepository {
    async fn find(&self, service_identifier: &str) -> Result<Option<CircuitRecord>, RepositoryError> {
        self.simulate_latency().await;
        let needle = service_identifier.trim().to_lowercase();
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|record| self.match_key.matches(record, &needle))
            .cloned())
    }

    async fn save(&self, mut record: CircuitRecord) -> Result<CircuitRecord, RepositoryError> {
        self.simulate_latency().await;
        let mut records = self.records.write().await;

        if record.service_number.trim().is_empty() {
            record.service_number = mint_service_number(&records);
            tracing::debug!("Assigned service number {}", record.service_number);
        }
        record.last_updated = Some(commit_timestamp());

        match records
            .iter_mut()
            .find(|r| r.service_number.eq_ignore_ascii_case(&record.service_number))
        {
            Some(slot) => *slot = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(record)
    }
}

fn at(date: (i32, u32, u32), time: (u32, u32, u32)) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(date.0, date.1, date.2)?.and_hms_opt(time.0, time.1, time.2)
}

#[allow(clippy::too_many_arguments)]
fn circuit(
    service_number: &str,
    circuit_id: &str,
    client_name: &str,
    client_ip: &str,
    subnet: &str,
    gateway: &str,
    dns: &str,
    vlan: &str,
    bandwidth: &str,
    location: &str,
    mux_id: &str,
    port_id: &str,
    last_updated: Option<NaiveDateTime>,
) -> CircuitRecord {
    CircuitRecord {
        service_number: service_number.to_string(),
        circuit_id: circuit_id.to_string(),
        client_name: client_name.to_string(),
        client_ip: client_ip.to_string(),
        subnet: subnet.to_string(),
        gateway: gateway.to_string(),
        dns: dns.to_string(),
        vlan: vlan.to_string(),
        bandwidth: bandwidth.to_string(),
        location: location.to_string(),
        mux_id: mux_id.to_string(),
        port_id: port_id.to_string(),
        last_updated,
    }
}

pub fn demo_circuits() -> Vec<CircuitRecord> {
    vec![
        circuit(
            "SVC001",
            "CIR-001-NYC",
            "Acme Corporation",
            "192.168.1.100",
            "255.255.255.0",
            "192.168.1.1",
            "8.8.8.8, 8.8.4.4",
            "100",
            "100 Mbps",
            "New York, NY",
            "MUX-NY-001",
            "PORT-12",
            at((2024, 6, 15), (14, 30, 0)),
        ),
        circuit(
            "SVC002",
            "CIR-002-LA",
            "TechStart Inc.",
            "10.0.1.50",
            "255.255.255.0",
            "10.0.1.1",
            "1.1.1.1, 1.0.0.1",
            "200",
            "500 Mbps",
            "Los Angeles, CA",
            "MUX-LA-003",
            "PORT-08",
            at((2024, 6, 14), (9, 15, 0)),
        ),
        circuit(
            "SVC003",
            "CIR-003-CHI",
            "Global Finance Ltd.",
            "172.16.10.25",
            "255.255.255.128",
            "172.16.10.1",
            "8.8.8.8, 1.1.1.1",
            "300",
            "1 Gbps",
            "Chicago, IL",
            "MUX-CHI-002",
            "PORT-24",
            at((2024, 6, 16), (11, 45, 0)),
        ),
    ]
}
