use crate::utils::error::WorkflowError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// `last_updated` 的字串格式 (精確到秒)
pub const LAST_UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 一筆電路佈建紀錄
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitRecord {
    #[serde(default, alias = "service_no")]
    pub service_number: String,
    pub circuit_id: String,
    pub client_name: String,
    /// 單一位址，或註冊時由 LAN/WAN 清單合成的摘要字串
    pub client_ip: String,
    pub subnet: String,
    pub gateway: String,
    /// 逗號分隔的 DNS 清單
    pub dns: String,
    pub vlan: String,
    pub bandwidth: String,
    pub location: String,
    pub mux_id: String,
    pub port_id: String,
    #[serde(
        default,
        with = "last_updated_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<NaiveDateTime>,
}

impl CircuitRecord {
    /// 新註冊草稿的預設值
    pub fn registration_defaults() -> Self {
        Self {
            subnet: "255.255.255.0".to_string(),
            dns: "8.8.8.8, 8.8.4.4".to_string(),
            ..Default::default()
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::ServiceNumber => &self.service_number,
            Field::CircuitId => &self.circuit_id,
            Field::ClientName => &self.client_name,
            Field::ClientIp => &self.client_ip,
            Field::Subnet => &self.subnet,
            Field::Gateway => &self.gateway,
            Field::Dns => &self.dns,
            Field::Vlan => &self.vlan,
            Field::Bandwidth => &self.bandwidth,
            Field::Location => &self.location,
            Field::MuxId => &self.mux_id,
            Field::PortId => &self.port_id,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::ServiceNumber => self.service_number = value,
            Field::CircuitId => self.circuit_id = value,
            Field::ClientName => self.client_name = value,
            Field::ClientIp => self.client_ip = value,
            Field::Subnet => self.subnet = value,
            Field::Gateway => self.gateway = value,
            Field::Dns => self.dns = value,
            Field::Vlan => self.vlan = value,
            Field::Bandwidth => self.bandwidth = value,
            Field::Location => self.location = value,
            Field::MuxId => self.mux_id = value,
            Field::PortId => self.port_id = value,
        }
    }

    pub fn last_updated_display(&self) -> Option<String> {
        self.last_updated
            .map(|ts| ts.format(LAST_UPDATED_FORMAT).to_string())
    }
}

mod last_updated_format {
    use super::LAST_UPDATED_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_some(&ts.format(LAST_UPDATED_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            NaiveDateTime::parse_from_str(&s, LAST_UPDATED_FORMAT).map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

/// 可編輯的紀錄欄位 (`last_updated` 由系統維護，不在此列)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    ServiceNumber,
    CircuitId,
    ClientName,
    ClientIp,
    Subnet,
    Gateway,
    Dns,
    Vlan,
    Bandwidth,
    Location,
    MuxId,
    PortId,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::ServiceNumber,
        Field::CircuitId,
        Field::ClientName,
        Field::ClientIp,
        Field::Subnet,
        Field::Gateway,
        Field::Dns,
        Field::Vlan,
        Field::Bandwidth,
        Field::Location,
        Field::MuxId,
        Field::PortId,
    ];

    /// 錯誤表使用的鍵名
    pub fn key(self) -> &'static str {
        match self {
            Field::ServiceNumber => "serviceNumber",
            Field::CircuitId => "circuitId",
            Field::ClientName => "clientName",
            Field::ClientIp => "clientIp",
            Field::Subnet => "subnet",
            Field::Gateway => "gateway",
            Field::Dns => "dns",
            Field::Vlan => "vlan",
            Field::Bandwidth => "bandwidth",
            Field::Location => "location",
            Field::MuxId => "muxId",
            Field::PortId => "portId",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::ServiceNumber => "Service number",
            Field::CircuitId => "Circuit ID",
            Field::ClientName => "Client name",
            Field::ClientIp => "Client IP",
            Field::Subnet => "Subnet",
            Field::Gateway => "Gateway",
            Field::Dns => "DNS",
            Field::Vlan => "VLAN ID",
            Field::Bandwidth => "Bandwidth",
            Field::Location => "Location",
            Field::MuxId => "MUX ID",
            Field::PortId => "Port ID",
        }
    }

    /// 僅供系統指派，草稿不可修改
    pub fn is_read_only(self) -> bool {
        matches!(self, Field::ServiceNumber)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = String;

    /// 接受 camelCase 或 snake_case 名稱
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "").to_ascii_lowercase();
        if normalized == "serviceno" {
            return Ok(Field::ServiceNumber);
        }
        Field::ALL
            .into_iter()
            .find(|field| field.key().to_ascii_lowercase() == normalized)
            .ok_or_else(|| format!("unknown field: {}", s))
    }
}

/// 註冊時選擇的定址模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpMode {
    #[default]
    Single,
    Lan,
    Wan,
    Both,
}

impl IpMode {
    pub fn activates(self, list: AddressList) -> bool {
        matches!(
            (self, list),
            (IpMode::Lan, AddressList::Lan)
                | (IpMode::Wan, AddressList::Wan)
                | (IpMode::Both, _)
        )
    }
}

impl fmt::Display for IpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IpMode::Single => "single",
            IpMode::Lan => "lan",
            IpMode::Wan => "wan",
            IpMode::Both => "both",
        };
        f.write_str(name)
    }
}

impl FromStr for IpMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(IpMode::Single),
            "lan" => Ok(IpMode::Lan),
            "wan" => Ok(IpMode::Wan),
            "both" => Ok(IpMode::Both),
            other => Err(format!("unknown ip mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressList {
    Lan,
    Wan,
}

impl AddressList {
    pub fn key_prefix(self) -> &'static str {
        match self {
            AddressList::Lan => "lanAddress",
            AddressList::Wan => "wanAddress",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AddressList::Lan => "LAN",
            AddressList::Wan => "WAN",
        }
    }
}

impl fmt::Display for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

/// 註冊流程專用的定址設定。
///
/// 兩份清單永遠至少保留一筆 (可為空字串)，未選用的清單內容不參與驗證。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpAddressConfig {
    mode: IpMode,
    lan_addresses: Vec<String>,
    wan_addresses: Vec<String>,
}

impl Default for IpAddressConfig {
    fn default() -> Self {
        Self::new(IpMode::Single)
    }
}

impl IpAddressConfig {
    pub fn new(mode: IpMode) -> Self {
        Self {
            mode,
            lan_addresses: vec![String::new()],
            wan_addresses: vec![String::new()],
        }
    }

    /// 直接以清單建立；空清單會補上一筆空字串
    pub fn with_addresses(mode: IpMode, lan: Vec<String>, wan: Vec<String>) -> Self {
        let ensure_one = |mut list: Vec<String>| {
            if list.is_empty() {
                list.push(String::new());
            }
            list
        };
        Self {
            mode,
            lan_addresses: ensure_one(lan),
            wan_addresses: ensure_one(wan),
        }
    }

    pub fn mode(&self) -> IpMode {
        self.mode
    }

    pub fn addresses(&self, list: AddressList) -> &[String] {
        match list {
            AddressList::Lan => &self.lan_addresses,
            AddressList::Wan => &self.wan_addresses,
        }
    }

    fn addresses_mut(&mut self, list: AddressList) -> &mut Vec<String> {
        match list {
            AddressList::Lan => &mut self.lan_addresses,
            AddressList::Wan => &mut self.wan_addresses,
        }
    }

    /// 切換模式：兩份清單都重設為單一空白項目
    pub fn select_mode(&mut self, mode: IpMode) {
        *self = Self::new(mode);
    }

    pub fn set_address(
        &mut self,
        list: AddressList,
        index: usize,
        value: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        let entry = self
            .addresses_mut(list)
            .get_mut(index)
            .ok_or(WorkflowError::AddressIndex { list, index })?;
        *entry = value.into();
        Ok(())
    }

    /// 新增一筆空白項目，回傳其索引
    pub fn add_address(&mut self, list: AddressList) -> usize {
        let entries = self.addresses_mut(list);
        entries.push(String::new());
        entries.len() - 1
    }

    /// 移除指定項目；僅剩一筆時改為清空內容
    pub fn remove_address(&mut self, list: AddressList, index: usize) -> Result<(), WorkflowError> {
        let entries = self.addresses_mut(list);
        if index >= entries.len() {
            return Err(WorkflowError::AddressIndex { list, index });
        }
        if entries.len() == 1 {
            entries[0].clear();
        } else {
            entries.remove(index);
        }
        Ok(())
    }
}

/// 錯誤表的鍵：具名欄位，或位址清單中的某一項
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Named(Field),
    Indexed(AddressList, usize),
}

impl FieldKey {
    /// 與定址模式相關的鍵 (切換模式時需丟棄)
    pub fn is_addressing(&self) -> bool {
        matches!(self, FieldKey::Indexed(..) | FieldKey::Named(Field::ClientIp))
    }
}

impl From<Field> for FieldKey {
    fn from(field: Field) -> Self {
        FieldKey::Named(field)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Named(field) => write!(f, "{}", field),
            FieldKey::Indexed(list, index) => write!(f, "{}#{}", list, index),
        }
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 一次驗證所產生的完整欄位錯誤集合。鍵存在即代表該欄位無效。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorMap(BTreeMap<FieldKey, String>);

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<FieldKey>, message: impl Into<String>) {
        self.0.insert(key.into(), message.into());
    }

    pub fn get(&self, key: &FieldKey) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn field(&self, field: Field) -> Option<&str> {
        self.get(&FieldKey::Named(field))
    }

    pub fn contains(&self, key: &FieldKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &str)> {
        self.0.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn discard_addressing(&mut self) {
        self.0.retain(|key, _| !key.is_addressing());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// 提供給介面層顯示的通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}
